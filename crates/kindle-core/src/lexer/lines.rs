//! Byte offset to source line mapping

#![allow(clippy::cast_possible_truncation)] // Sources larger than 4GB are unsupported

/// Maps byte offsets to 1-based line numbers
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offsets where each line starts
    line_starts: Vec<u32>,
}

impl LineIndex {
    /// Build a line index from source code
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self { line_starts }
    }

    /// The 1-based line containing `offset`
    #[must_use]
    pub fn line(&self, offset: usize) -> u32 {
        let offset = offset as u32;
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        (line + 1) as u32
    }
}
