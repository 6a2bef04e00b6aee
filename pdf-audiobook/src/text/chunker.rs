//! Fixed-window text chunking for TTS processing.

use super::TextChunk;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 2000;

/// Split text into consecutive windows of `chunk_size` characters.
///
/// Boundaries are purely positional: words and sentences may be cut.
/// The last chunk may be shorter; empty text yields no chunks.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<TextChunk> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (byte_idx, _) in text.char_indices() {
        if count == chunk_size {
            chunks.push(TextChunk::new(chunks.len(), text[start..byte_idx].to_string()));
            start = byte_idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(TextChunk::new(chunks.len(), text[start..].to_string()));
    }

    chunks
}
