//! Artifact naming and reuse lookup.
//!
//! Artifacts are named `<prefix>_<YYYYMMDD_HHMMSS>.<ext>`, or
//! `<prefix>_<key>_<YYYYMMDD_HHMMSS>.<ext>` under the keyed policy, and the
//! same pattern is the lookup key: among matching files the most recently
//! modified one wins.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

/// How previously generated artifacts are matched for reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Any artifact with the right prefix and extension; newest wins.
    #[default]
    Newest,
    /// Only artifacts generated from the same inputs and parameters.
    Keyed,
}

impl FromStr for CachePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "keyed" => Ok(Self::Keyed),
            _ => Err(format!("Unknown cache policy '{}'. Use newest or keyed.", s)),
        }
    }
}

/// Build the path for a new artifact.
pub fn artifact_path(
    output_dir: &Path,
    prefix: &str,
    key: Option<&str>,
    extension: &str,
    now: DateTime<Local>,
) -> PathBuf {
    let timestamp = now.format("%Y%m%d_%H%M%S");
    let name = match key {
        Some(k) => format!("{}_{}_{}.{}", prefix, k, timestamp, extension),
        None => format!("{}_{}.{}", prefix, timestamp, extension),
    };
    output_dir.join(name)
}

/// Find the newest artifact matching the naming pattern, if any.
pub fn find_cached(
    output_dir: &Path,
    prefix: &str,
    key: Option<&str>,
    extension: &str,
) -> Result<Option<PathBuf>> {
    if !output_dir.exists() {
        return Ok(None);
    }

    let head = match key {
        Some(k) => format!("{}_{}_", prefix, k),
        None => format!("{}_", prefix),
    };
    let tail = format!(".{}", extension);

    let mut newest: Option<(SystemTime, PathBuf)> = None;

    for entry in fs::read_dir(output_dir)
        .with_context(|| format!("Failed to read {}", output_dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if !name.starts_with(&head)
            || !name.ends_with(&tail)
            || name.len() <= head.len() + tail.len()
        {
            continue;
        }
        if !path.is_file() {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        let is_newer = match &newest {
            Some((best, best_path)) => modified > *best || (modified == *best && path > *best_path),
            None => true,
        };
        if is_newer {
            newest = Some((modified, path));
        }
    }

    Ok(newest.map(|(_, path)| path))
}

/// Hash the inputs and parameters that determine an artifact's content.
///
/// Returns the first 16 hex characters of a SHA-256 over the bytes of each
/// input file followed by each parameter.
pub fn request_key(files: &[&Path], params: &[&str]) -> Result<String> {
    let mut hasher = Sha256::new();
    for file in files {
        hash_file(&mut hasher, file)?;
    }
    for param in params {
        hasher.update([0u8]);
        hasher.update(param.as_bytes());
    }

    let hash = hasher.finalize();
    Ok(format!("{:x}", hash)[..16].to_string())
}

fn hash_file(hasher: &mut Sha256, path: &Path) -> Result<()> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(path: &Path, age_secs: u64) {
        fs::write(path, b"audio").unwrap();
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
    }

    #[test]
    fn test_artifact_path_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let path = artifact_path(Path::new("out"), "book_tts", None, "wav", now);
        assert_eq!(path, PathBuf::from("out/book_tts_20240309_070501.wav"));

        let keyed = artifact_path(Path::new("out"), "book_tts", Some("abc"), "mp3", now);
        assert_eq!(keyed, PathBuf::from("out/book_tts_abc_20240309_070501.mp3"));
    }

    #[test]
    fn test_find_cached_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert_eq!(find_cached(&missing, "tts", None, "wav").unwrap(), None);
    }

    #[test]
    fn test_find_cached_picks_newest() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        touch(&dir.join("tts_20240101_000000.wav"), 300);
        touch(&dir.join("tts_20240102_000000.wav"), 10);
        touch(&dir.join("tts_20240103_000000.wav"), 100);

        let found = find_cached(dir, "tts", None, "wav").unwrap();
        assert_eq!(found, Some(dir.join("tts_20240102_000000.wav")));
    }

    #[test]
    fn test_find_cached_ignores_other_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        touch(&dir.join("tts_20240101_000000.mp3"), 0);
        touch(&dir.join("other_20240101_000000.wav"), 0);
        touch(&dir.join("tts.wav"), 0);
        touch(&dir.join("chunk_0.wav"), 0);

        assert_eq!(find_cached(dir, "tts", None, "wav").unwrap(), None);
    }

    #[test]
    fn test_find_cached_keyed_only_matches_key() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        touch(&dir.join("tts_aaaa_20240101_000000.wav"), 100);
        touch(&dir.join("tts_bbbb_20240101_000000.wav"), 0);

        let found = find_cached(dir, "tts", Some("aaaa"), "wav").unwrap();
        assert_eq!(found, Some(dir.join("tts_aaaa_20240101_000000.wav")));
        assert_eq!(find_cached(dir, "tts", Some("cccc"), "wav").unwrap(), None);
    }

    #[test]
    fn test_request_key_depends_on_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let pdf = temp_dir.path().join("book.pdf");
        let voice = temp_dir.path().join("voice.wav");
        fs::write(&pdf, b"pdf bytes").unwrap();
        fs::write(&voice, b"voice bytes").unwrap();

        let a = request_key(&[&pdf, &voice], &["1-10", "2000"]).unwrap();
        let b = request_key(&[&pdf, &voice], &["1-10", "2000"]).unwrap();
        let c = request_key(&[&pdf, &voice], &["1-11", "2000"]).unwrap();
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_eq!(a, b);
        assert_ne!(a, c);

        fs::write(&voice, b"other voice").unwrap();
        let d = request_key(&[&pdf, &voice], &["1-10", "2000"]).unwrap();
        assert_ne!(a, d);

        let pdf_only = request_key(&[&pdf], &["1-10", "2000"]).unwrap();
        assert_ne!(a, pdf_only);
    }

    #[test]
    fn test_cache_policy_parse() {
        assert_eq!("Keyed".parse::<CachePolicy>(), Ok(CachePolicy::Keyed));
        assert_eq!("newest".parse::<CachePolicy>(), Ok(CachePolicy::Newest));
        let err = "lru".parse::<CachePolicy>().unwrap_err();
        assert!(err.contains("lru"));
    }
}
