//! Sparse outlier gather/scatter.
//!
//! The predictor leaves a dense outlier plane with one real value per
//! sample, zero wherever the sample quantized. This crate compacts that
//! plane into a CSR triple over an `m x m` square view (`m = ceil(sqrt(N))`,
//! trailing cells implicit zeros), serializes it as the archive's sparse
//! subfile, and scatters it back during decompression.
//!
//! The gatherer's workspace is sized by the expected sparsity: more than
//! `N / density_factor` non-zeros is a capacity failure the orchestrator
//! reports as fatal.

mod csr;

pub use csr::{gather, parse, scatter, serialize, serialized_nbyte, CsrTriple};
