//! Data-range pre-pass.
//!
//! Range-relative bounds resolve against the observed value range before
//! the pipeline runs; this sweep is the only pass that reads the input
//! twice.

use rayon::prelude::*;
use serde::Serialize;

/// Observed value extremes of an input array.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RangeReport {
    pub min: f32,
    pub max: f32,
}

impl RangeReport {
    /// Value range; 0 for constant or empty input.
    pub fn range(&self) -> f64 {
        (self.max as f64 - self.min as f64).max(0.0)
    }
}

/// Parallel min/max reduction over the input.
pub fn analyze_range(input: &[f32]) -> RangeReport {
    if input.is_empty() {
        return RangeReport { min: 0.0, max: 0.0 };
    }
    let (min, max) = input
        .par_iter()
        .fold(
            || (f32::INFINITY, f32::NEG_INFINITY),
            |(lo, hi), &v| (lo.min(v), hi.max(v)),
        )
        .reduce(
            || (f32::INFINITY, f32::NEG_INFINITY),
            |(a, b), (c, d)| (a.min(c), b.max(d)),
        );
    RangeReport { min, max }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stolas_core::{CompressContext, Dim3, EbMode};

    #[test]
    fn finds_the_extremes() {
        let data = [3.0f32, -7.5, 0.0, 12.25, 1.0];
        let r = analyze_range(&data);
        assert_eq!(r.min, -7.5);
        assert_eq!(r.max, 12.25);
        assert!((r.range() - 19.75).abs() < 1e-12);
    }

    #[test]
    fn constant_input_reports_zero_range() {
        let data = vec![5.0f32; 1000];
        let r = analyze_range(&data);
        assert_eq!(r.range(), 0.0);

        // r2r over a constant array keeps the raw bound.
        let mut ctx = CompressContext::new(Dim3::d1(1000), 1e-3);
        ctx.mode = EbMode::R2r;
        assert_eq!(ctx.resolve_eb(r.range()), 1e-3);
    }

    #[test]
    fn large_input_reduces_across_chunks() {
        let data: Vec<f32> = (0..500_000).map(|i| (i as f32 * 0.37).sin()).collect();
        let r = analyze_range(&data);
        assert!(r.min >= -1.0 && r.max <= 1.0);
        assert!(r.range() > 1.9);
    }
}
