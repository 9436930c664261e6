//! Compression context: the configuration object handed to the orchestrator.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Dim3, EbMode, Predictor};

/// Default quantizer radius; half the quant-code alphabet size.
pub const DEFAULT_RADIUS: i32 = 512;

/// Default symbols per Huffman chunk when `pardeg` is left at 0.
pub const DEFAULT_SUBLEN: usize = 32 * 1024;

/// Default inverse sparsity of the outlier plane.
pub const DEFAULT_DENSITY_FACTOR: i32 = 4;

/// Everything the pipeline needs to know about one compression call.
///
/// External collaborators (CLI, probes) translate user input into this
/// struct; the orchestrator validates it once and trusts it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressContext {
    pub dims: Dim3,
    pub mode: EbMode,
    /// Error bound. In `r2r` mode the caller resolves it against the data
    /// range (see `resolve_eb`) before constructing the compressor.
    pub eb: f64,
    pub radius: i32,
    /// Parallel chunk count for the Huffman codec; 0 derives one chunk per
    /// `DEFAULT_SUBLEN` symbols.
    pub pardeg: i32,
    pub predictor: Predictor,
    /// Starting Huffman word width in bytes, 4 or 8.
    pub huff_nbyte: i32,
    pub nz_density_factor: i32,
}

impl CompressContext {
    /// Context with defaults for everything but shape and bound.
    pub fn new(dims: Dim3, eb: f64) -> Self {
        CompressContext {
            dims,
            mode: EbMode::Abs,
            eb,
            radius: DEFAULT_RADIUS,
            pardeg: 0,
            predictor: Predictor::Lorenzo,
            huff_nbyte: 4,
            nz_density_factor: DEFAULT_DENSITY_FACTOR,
        }
    }

    /// Reject contexts no stage could run with.
    pub fn validate(&self) -> Result<()> {
        if self.dims.is_empty() {
            return Err(Error::config("dimensions must be non-zero"));
        }
        if !(self.eb > 0.0) || !self.eb.is_finite() {
            return Err(Error::config(format!(
                "error bound must be positive and finite, got {}",
                self.eb
            )));
        }
        if self.radius <= 0 {
            return Err(Error::config(format!(
                "radius must be positive, got {}",
                self.radius
            )));
        }
        // Codes live in [0, 2 * radius) and must fit the 2-byte quant width.
        if self.radius > 32768 {
            return Err(Error::config(format!(
                "radius {} overflows the quant-code alphabet",
                self.radius
            )));
        }
        if self.pardeg < 0 {
            return Err(Error::config(format!(
                "pardeg must be non-negative, got {}",
                self.pardeg
            )));
        }
        if self.huff_nbyte != 4 && self.huff_nbyte != 8 {
            return Err(Error::config(format!(
                "huff_nbyte must be 4 or 8, got {}",
                self.huff_nbyte
            )));
        }
        if self.nz_density_factor <= 1 {
            return Err(Error::config(format!(
                "nz_density_factor must exceed 1, got {}",
                self.nz_density_factor
            )));
        }
        Ok(())
    }

    /// Effective chunk count: the configured value, or one chunk per
    /// `DEFAULT_SUBLEN` symbols.
    pub fn resolved_pardeg(&self) -> i32 {
        if self.pardeg > 0 {
            self.pardeg
        } else {
            self.dims.len().div_ceil(DEFAULT_SUBLEN).max(1) as i32
        }
    }

    /// Resolve the bound against the observed data range.
    ///
    /// Absolute mode passes through; range-relative mode scales by the
    /// range, falling back to the raw bound when the range is degenerate.
    pub fn resolve_eb(&self, range: f64) -> f64 {
        match self.mode {
            EbMode::Abs => self.eb,
            EbMode::R2r => {
                if range > 0.0 {
                    self.eb * range
                } else {
                    self.eb
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_validates() {
        let ctx = CompressContext::new(Dim3::d2(64, 64), 1e-4);
        assert!(ctx.validate().is_ok());
        assert_eq!(ctx.radius, DEFAULT_RADIUS);
        assert_eq!(ctx.nz_density_factor, DEFAULT_DENSITY_FACTOR);
    }

    #[test]
    fn zero_dims_and_bad_bounds_are_rejected() {
        let mut ctx = CompressContext::new(Dim3::d1(0), 1e-4);
        assert!(ctx.validate().is_err());

        ctx.dims = Dim3::d1(100);
        ctx.eb = 0.0;
        assert!(ctx.validate().is_err());
        ctx.eb = f64::NAN;
        assert!(ctx.validate().is_err());

        ctx.eb = 1e-4;
        ctx.radius = 0;
        assert!(ctx.validate().is_err());
        ctx.radius = 40000;
        assert!(ctx.validate().is_err());

        ctx.radius = 512;
        ctx.huff_nbyte = 6;
        assert!(ctx.validate().is_err());
    }

    #[test]
    fn pardeg_defaults_to_32k_chunks() {
        let ctx = CompressContext::new(Dim3::d1(100_000), 1e-4);
        assert_eq!(ctx.resolved_pardeg(), 4);

        let small = CompressContext::new(Dim3::d1(10), 1e-4);
        assert_eq!(small.resolved_pardeg(), 1);

        let mut fixed = CompressContext::new(Dim3::d1(100_000), 1e-4);
        fixed.pardeg = 7;
        assert_eq!(fixed.resolved_pardeg(), 7);
    }

    #[test]
    fn r2r_scales_by_range() {
        let mut ctx = CompressContext::new(Dim3::d1(10), 1e-3);
        ctx.mode = EbMode::R2r;
        assert!((ctx.resolve_eb(100.0) - 0.1).abs() < 1e-12);
        // Degenerate range falls back to the raw bound.
        assert_eq!(ctx.resolve_eb(0.0), 1e-3);

        ctx.mode = EbMode::Abs;
        assert_eq!(ctx.resolve_eb(100.0), 1e-3);
    }
}
