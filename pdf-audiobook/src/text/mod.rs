//! Text processing for TTS: normalization and chunking.

pub mod chunker;
mod normalizer;

pub use chunker::chunk_text;
pub use normalizer::normalize_text;

/// A contiguous slice of normalized text submitted to a backend in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position of this chunk in the sequence
    pub index: usize,
    /// The text content
    pub text: String,
}

impl TextChunk {
    /// Create a new text chunk.
    pub fn new(index: usize, text: String) -> Self {
        Self { index, text }
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_chunk_creation() {
        let chunk = TextChunk::new(1, "Hello world".to_string());
        assert_eq!(chunk.index, 1);
        assert_eq!(chunk.text, "Hello world");
        assert_eq!(chunk.char_len(), 11);
    }
}
