//! Character-set normalization for TTS input.

use once_cell::sync::Lazy;
use regex::Regex;

/// Everything outside letters, digits, whitespace and `.,!?'"-`.
static DISALLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[^a-zA-Z0-9\s.,!?'"-]"#).expect("static character-class regex is valid")
});

/// Typographic characters with a plain ASCII spelling inside the allowed set.
const TYPOGRAPHY: &[(char, &str)] = &[
    ('\u{2018}', "'"),   // Left single quote
    ('\u{2019}', "'"),   // Right single quote
    ('\u{201c}', "\""),  // Left double quote
    ('\u{201d}', "\""),  // Right double quote
    ('\u{2013}', "-"),   // En dash
    ('\u{2014}', "-"),   // Em dash
    ('\u{2011}', "-"),   // Non-breaking hyphen
    ('\u{2026}', "..."), // Ellipsis
    ('\u{00ab}', "\""),  // Left-pointing double angle quote
    ('\u{00bb}', "\""),  // Right-pointing double angle quote
];

/// Normalize extracted text to the allowed character set.
///
/// With `fold_typography`, curly quotes, long dashes and ellipses are first
/// rewritten to their ASCII forms so they survive the filter instead of
/// being dropped.
pub fn normalize_text(text: &str, fold_typography: bool) -> String {
    if fold_typography {
        let folded = fold(text);
        DISALLOWED.replace_all(&folded, "").into_owned()
    } else {
        DISALLOWED.replace_all(text, "").into_owned()
    }
}

fn fold(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match TYPOGRAPHY.iter().find(|(ch, _)| *ch == c) {
            Some((_, r)) => result.push_str(r),
            None => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_hash() {
        assert_eq!(
            normalize_text("Hello, World! #3000", false),
            "Hello, World! 3000"
        );
    }

    #[test]
    fn test_keeps_allowed_punctuation() {
        let text = "Is it \"done\"? Yes - it's done, really.";
        assert_eq!(normalize_text(text, false), text);
    }

    #[test]
    fn test_keeps_whitespace() {
        assert_eq!(normalize_text("a\tb\nc  d", false), "a\tb\nc  d");
    }

    #[test]
    fn test_strips_symbols_and_accents() {
        assert_eq!(normalize_text("café (50%) @home; x:y", false), "caf 50 home xy");
    }

    #[test]
    fn test_smart_quotes_dropped_without_folding() {
        let text = "\u{201c}Hello,\u{201d} said John. It\u{2019}s nice.";
        assert_eq!(normalize_text(text, false), "Hello, said John. Its nice.");
    }

    #[test]
    fn test_smart_quotes_folded() {
        let text = "\u{201c}Hello,\u{201d} said John. It\u{2019}s nice\u{2026}";
        assert_eq!(
            normalize_text(text, true),
            "\"Hello,\" said John. It's nice..."
        );
    }

    #[test]
    fn test_dashes_folded() {
        assert_eq!(normalize_text("one\u{2013}two\u{2014}three", true), "one-two-three");
    }
}
