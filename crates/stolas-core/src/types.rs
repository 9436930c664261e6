//! Core type definitions: array extents, bound modes, and integer widths.

use serde::{Deserialize, Serialize};

/// Extent of a dense array over up to three dimensions.
///
/// Unused trailing dimensions are 1, so `len` is always `x * y * z` and the
/// rank is derived from which extents exceed 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dim3 {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Dim3 {
    /// One-dimensional extent.
    pub fn d1(x: u32) -> Self {
        Dim3 { x, y: 1, z: 1 }
    }

    /// Two-dimensional extent.
    pub fn d2(x: u32, y: u32) -> Self {
        Dim3 { x, y, z: 1 }
    }

    /// Three-dimensional extent.
    pub fn d3(x: u32, y: u32, z: u32) -> Self {
        Dim3 { x, y, z }
    }

    /// Total sample count.
    pub fn len(&self) -> usize {
        self.x as usize * self.y as usize * self.z as usize
    }

    /// True when any extent is zero.
    pub fn is_empty(&self) -> bool {
        self.x == 0 || self.y == 0 || self.z == 0
    }

    /// Array rank in 1..=3.
    pub fn rank(&self) -> u8 {
        if self.z > 1 {
            3
        } else if self.y > 1 {
            2
        } else {
            1
        }
    }
}

/// How the caller's error bound is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EbMode {
    /// Absolute bound, used as-is.
    #[default]
    Abs,
    /// Bound relative to the input value range; resolved to an absolute
    /// bound before the pipeline runs.
    R2r,
}

/// Predictor selector.
///
/// Only Lorenzo is implemented; the spline path is declared for CLI
/// compatibility and rejected as unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Predictor {
    #[default]
    Lorenzo,
    Spline3,
}

/// Unsigned integer carrying one quant code.
///
/// Closed width family: the orchestrator selects a concrete width by value,
/// never through a trait object. Code 0 is reserved for "outlier".
pub trait QuantCode: Copy + Default + Send + Sync + 'static {
    /// Width in bytes.
    const NBYTE: usize;

    fn from_u32(v: u32) -> Self;
    fn to_u32(self) -> u32;
}

impl QuantCode for u8 {
    const NBYTE: usize = 1;

    #[inline]
    fn from_u32(v: u32) -> Self {
        v as u8
    }

    #[inline]
    fn to_u32(self) -> u32 {
        self as u32
    }
}

impl QuantCode for u16 {
    const NBYTE: usize = 2;

    #[inline]
    fn from_u32(v: u32) -> Self {
        v as u16
    }

    #[inline]
    fn to_u32(self) -> u32 {
        self as u32
    }
}

impl QuantCode for u32 {
    const NBYTE: usize = 4;

    #[inline]
    fn from_u32(v: u32) -> Self {
        v
    }

    #[inline]
    fn to_u32(self) -> u32 {
        self
    }
}

/// Code-word integer for the Huffman codec.
///
/// A code must leave one bit of headroom in the word, so the longest legal
/// code at width `NBYTE` is `8 * NBYTE - 1` bits. The 8-byte width exists as
/// the runtime fallback when a 4-byte book overflows that limit.
pub trait HuffWord: Copy + Default + Send + Sync + 'static {
    /// Width in bytes.
    const NBYTE: usize;

    /// Longest representable code in bits.
    const MAX_CODE_BITS: u32 = 8 * Self::NBYTE as u32 - 1;

    fn from_u64(v: u64) -> Self;
    fn to_u64(self) -> u64;
}

impl HuffWord for u32 {
    const NBYTE: usize = 4;

    #[inline]
    fn from_u64(v: u64) -> Self {
        v as u32
    }

    #[inline]
    fn to_u64(self) -> u64 {
        self as u64
    }
}

impl HuffWord for u64 {
    const NBYTE: usize = 8;

    #[inline]
    fn from_u64(v: u64) -> Self {
        v
    }

    #[inline]
    fn to_u64(self) -> u64 {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_follows_trailing_extents() {
        assert_eq!(Dim3::d1(100).rank(), 1);
        assert_eq!(Dim3::d2(16, 16).rank(), 2);
        assert_eq!(Dim3::d3(8, 8, 8).rank(), 3);
        // A degenerate y=1 slab is rank 3 as long as z > 1.
        assert_eq!(Dim3::d3(8, 1, 8).rank(), 3);
    }

    #[test]
    fn len_multiplies_extents() {
        assert_eq!(Dim3::d3(4, 5, 6).len(), 120);
        assert!(Dim3::d2(0, 7).is_empty());
    }

    #[test]
    fn huff_word_limits() {
        assert_eq!(<u32 as HuffWord>::MAX_CODE_BITS, 31);
        assert_eq!(<u64 as HuffWord>::MAX_CODE_BITS, 63);
    }

    #[test]
    fn quant_code_round_trips_width() {
        assert_eq!(<u16 as QuantCode>::from_u32(1023).to_u32(), 1023);
        assert_eq!(<u8 as QuantCode>::NBYTE, 1);
        assert_eq!(<u32 as QuantCode>::NBYTE, 4);
    }
}
