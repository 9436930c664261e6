//! Shared foundation for the stolas lossy compressor.
//!
//! This crate carries everything the pipeline stages agree on without
//! depending on each other: the error type, shape and integer-width types,
//! the fixed 128-byte archive header, the compression context, the device
//! buffer/stream model, and size statistics.
//!
//! The stages themselves live in sibling crates (`stolas-huffman`,
//! `stolas-sparse`) and in the `stolas` umbrella crate.

pub mod config;
pub mod device;
pub mod error;
pub mod header;
pub mod stats;
pub mod types;

pub use config::CompressContext;
pub use device::{DeviceBuffer, Stream};
pub use error::{Error, Result};
pub use header::{ArchiveHeader, Subfile, ARCHIVE_MAGIC, CODEC_HUFFMAN, HEADER_NBYTE};
pub use stats::CompressionRatio;
pub use types::{Dim3, EbMode, HuffWord, Predictor, QuantCode};
