//! Fixed-size archive header and subfile entry table.
//!
//! The first 128 bytes of every archive hold the header. All fields are
//! little-endian. `entry` is a cumulative offset table: subfile `k` occupies
//! bytes `[entry[k], entry[k + 1])` of the archive and `entry[END]` is the
//! total archive size.

use crate::error::{Error, Result};
use crate::types::Dim3;

/// Header magic, "STLS".
pub const ARCHIVE_MAGIC: u32 = 0x5354_4C53;

/// Archive format version.
pub const ARCHIVE_VERSION: u32 = 1;

/// Fixed header footprint in bytes.
pub const HEADER_NBYTE: usize = 128;

/// Bit flag in `codecs_in_use` for the Huffman codec.
pub const CODEC_HUFFMAN: u32 = 1;

/// Subfile slots in archive order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subfile {
    Header = 0,
    /// Reserved; empty in the Lorenzo path.
    Anchor = 1,
    /// Huffman stream plus its chunk metadata.
    Vle = 2,
    /// Sparse outlier blob.
    Spfmt = 3,
}

/// Number of subfile slots; `entry` has one extra terminating element.
pub const SUBFILE_END: usize = 4;

/// Parsed archive header.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveHeader {
    pub dims: Dim3,
    pub radius: i32,
    pub vle_pardeg: i32,
    pub eb: f64,
    /// Code-word width the Huffman payload was produced at, 4 or 8.
    pub byte_vle: i32,
    pub codecs_in_use: u32,
    pub nz_density_factor: i32,
    pub entry: [u32; SUBFILE_END + 1],
}

impl ArchiveHeader {
    /// Total archive size recorded in the entry table.
    pub fn file_size(&self) -> usize {
        self.entry[SUBFILE_END] as usize
    }

    /// Byte range of one subfile within the archive.
    pub fn subfile_range(&self, s: Subfile) -> core::ops::Range<usize> {
        let k = s as usize;
        self.entry[k] as usize..self.entry[k + 1] as usize
    }

    /// Serialize into the fixed 128-byte layout.
    pub fn to_bytes(&self) -> [u8; HEADER_NBYTE] {
        let mut b = [0u8; HEADER_NBYTE];
        let mut at = 0usize;
        let mut put = |src: &[u8]| {
            b[at..at + src.len()].copy_from_slice(src);
            at += src.len();
        };
        put(&ARCHIVE_MAGIC.to_le_bytes());
        put(&ARCHIVE_VERSION.to_le_bytes());
        put(&self.dims.x.to_le_bytes());
        put(&self.dims.y.to_le_bytes());
        put(&self.dims.z.to_le_bytes());
        put(&self.radius.to_le_bytes());
        put(&self.vle_pardeg.to_le_bytes());
        put(&self.eb.to_le_bytes());
        put(&self.byte_vle.to_le_bytes());
        put(&self.codecs_in_use.to_le_bytes());
        put(&self.nz_density_factor.to_le_bytes());
        put(&(HEADER_NBYTE as u32).to_le_bytes());
        for e in &self.entry {
            put(&e.to_le_bytes());
        }
        b
    }

    /// Parse and validate the leading 128 bytes of an archive.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_NBYTE {
            return Err(Error::header(format!(
                "blob too short for header: {} bytes",
                bytes.len()
            )));
        }

        let magic = u32_at(bytes, 0);
        if magic != ARCHIVE_MAGIC {
            return Err(Error::header(format!("bad magic 0x{magic:08x}")));
        }
        let version = u32_at(bytes, 4);
        if version != ARCHIVE_VERSION {
            return Err(Error::header(format!("unsupported version {version}")));
        }

        let header_nbyte = u32_at(bytes, 48);
        if header_nbyte as usize != HEADER_NBYTE {
            return Err(Error::header(format!(
                "header_nbyte {header_nbyte} does not match the fixed layout"
            )));
        }

        let mut entry = [0u32; SUBFILE_END + 1];
        for (k, e) in entry.iter_mut().enumerate() {
            *e = u32_at(bytes, 52 + 4 * k);
        }

        let header = ArchiveHeader {
            dims: Dim3 {
                x: u32_at(bytes, 8),
                y: u32_at(bytes, 12),
                z: u32_at(bytes, 16),
            },
            radius: u32_at(bytes, 20) as i32,
            vle_pardeg: u32_at(bytes, 24) as i32,
            eb: f64::from_le_bytes([
                bytes[28], bytes[29], bytes[30], bytes[31], bytes[32], bytes[33], bytes[34],
                bytes[35],
            ]),
            byte_vle: u32_at(bytes, 36) as i32,
            codecs_in_use: u32_at(bytes, 40),
            nz_density_factor: u32_at(bytes, 44) as i32,
            entry,
        };
        header.validate()?;
        Ok(header)
    }

    /// Structural checks shared by parse and the compressor's fill step.
    pub fn validate(&self) -> Result<()> {
        if self.dims.is_empty() {
            return Err(Error::header("zero dimension"));
        }
        if self.radius <= 0 {
            return Err(Error::header(format!("radius {} out of range", self.radius)));
        }
        if self.vle_pardeg <= 0 {
            return Err(Error::header(format!(
                "pardeg {} out of range",
                self.vle_pardeg
            )));
        }
        if !(self.eb > 0.0) || !self.eb.is_finite() {
            return Err(Error::header(format!("error bound {} out of range", self.eb)));
        }
        if self.byte_vle != 4 && self.byte_vle != 8 {
            return Err(Error::header(format!("byte_vle {} not in {{4, 8}}", self.byte_vle)));
        }
        if self.entry[Subfile::Header as usize] != 0
            || self.entry[Subfile::Anchor as usize] != HEADER_NBYTE as u32
        {
            return Err(Error::header("entry table does not start at the header"));
        }
        for k in 0..SUBFILE_END {
            if self.entry[k] > self.entry[k + 1] {
                return Err(Error::header(format!(
                    "entry table not monotonic at slot {k}"
                )));
            }
        }
        Ok(())
    }
}

#[inline]
fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> ArchiveHeader {
        ArchiveHeader {
            dims: Dim3::d3(64, 64, 32),
            radius: 512,
            vle_pardeg: 4,
            eb: 1e-4,
            byte_vle: 4,
            codecs_in_use: CODEC_HUFFMAN,
            nz_density_factor: 4,
            entry: [0, 128, 128, 9000, 9500],
        }
    }

    #[test]
    fn serialization_is_idempotent() {
        let h = sample_header();
        let bytes = h.to_bytes();
        let parsed = ArchiveHeader::parse(&bytes).unwrap();
        assert_eq!(parsed, h);
        // Re-serializing the parsed header yields the same 128 bytes.
        assert_eq!(parsed.to_bytes(), bytes);
    }

    #[test]
    fn subfile_ranges_follow_entries() {
        let h = sample_header();
        assert_eq!(h.subfile_range(Subfile::Header), 0..128);
        assert_eq!(h.subfile_range(Subfile::Anchor), 128..128);
        assert_eq!(h.subfile_range(Subfile::Vle), 128..9000);
        assert_eq!(h.subfile_range(Subfile::Spfmt), 9000..9500);
        assert_eq!(h.file_size(), 9500);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = sample_header().to_bytes();
        bytes[0] ^= 0xFF;
        let err = ArchiveHeader::parse(&bytes).unwrap_err();
        assert_eq!(err.category(), "header_invalid");
    }

    #[test]
    fn non_monotonic_entries_are_rejected() {
        let mut h = sample_header();
        h.entry = [0, 128, 9000, 700, 9500];
        let err = ArchiveHeader::parse(&h.to_bytes()).unwrap_err();
        assert_eq!(err.category(), "header_invalid");
    }

    #[test]
    fn short_blob_is_rejected() {
        assert!(ArchiveHeader::parse(&[0u8; 64]).is_err());
    }
}
