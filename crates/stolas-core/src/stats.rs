//! Compression size statistics.

use serde::Serialize;

/// Compression ratio metrics.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CompressionRatio {
    /// Original uncompressed size in bytes.
    pub original_size: usize,
    /// Compressed size in bytes.
    pub compressed_size: usize,
}

impl CompressionRatio {
    /// Create new ratio from sizes.
    pub fn new(original: usize, compressed: usize) -> Self {
        CompressionRatio {
            original_size: original,
            compressed_size: compressed,
        }
    }

    /// Ratio as original / compressed; 0 when the compressed size is 0.
    pub fn ratio(&self) -> f64 {
        if self.compressed_size == 0 {
            0.0
        } else {
            self.original_size as f64 / self.compressed_size as f64
        }
    }

    /// Compressed size as a percentage of the original.
    pub fn percent_of_original(&self) -> f64 {
        if self.original_size == 0 {
            0.0
        } else {
            100.0 * self.compressed_size as f64 / self.original_size as f64
        }
    }

    /// True when the output grew past the input.
    pub fn is_inflated(&self) -> bool {
        self.compressed_size > self.original_size
    }
}
