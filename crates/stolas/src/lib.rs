//! Stolas: error-bounded lossy compression for dense scientific arrays.
//!
//! Given a 1-, 2-, or 3-dimensional f32 array and an absolute (or
//! range-relative) error bound, the compressor produces a single archive
//! blob from which every sample reconstructs within the bound. The pipeline
//! runs three stages over shared device buffers:
//!
//! 1. a dual-output Lorenzo predictor-quantizer (`predict`),
//! 2. a CSR gather of the sparse outlier plane (`stolas-sparse`),
//! 3. a coarse-grained canonical Huffman codec over the quant codes
//!    (`stolas-huffman`), retried once at a wider code word when the
//!    narrow book overflows.
//!
//! The archive orchestrators live in `pipeline`; `analysis` holds the
//! data-range pre-pass that resolves range-relative bounds.
//!
//! ```no_run
//! use stolas::pipeline::{Compressor, Decompressor};
//! use stolas_core::{CompressContext, DeviceBuffer, Dim3, Stream};
//!
//! # fn main() -> stolas_core::Result<()> {
//! let data = vec![0.5f32; 64 * 64];
//! let ctx = CompressContext::new(Dim3::d2(64, 64), 1e-4);
//! let stream = Stream::default();
//!
//! let input = DeviceBuffer::from_host(&data);
//! let mut compressor = Compressor::new(&ctx)?;
//! let archive = compressor.compress(&input, stream)?.to_vec();
//!
//! let mut output = DeviceBuffer::<f32>::alloc(data.len());
//! Decompressor::new().decompress(&archive, &mut output, stream)?;
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod pipeline;
pub mod predict;

pub use analysis::{analyze_range, RangeReport};
pub use pipeline::{Compressor, Decompressor};
