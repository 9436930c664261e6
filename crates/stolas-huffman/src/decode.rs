//! Canonical decoding tables and the chunked decoder.

use rayon::prelude::*;
use stolas_core::{Error, QuantCode, Result};

use crate::bitio::BitReader;
use crate::encode::ChunkMeta;

/// Canonical decode table: first code and symbol index per code length.
#[derive(Debug)]
pub struct DecodeTable {
    max_len: u32,
    /// Codes of each length, index 0 unused.
    counts: Vec<u32>,
    /// Smallest code of each length.
    first_code: Vec<u64>,
    /// Offset into `syms` of each length's first symbol.
    first_index: Vec<u32>,
    /// Symbols sorted by (length, symbol).
    syms: Vec<u32>,
}

impl DecodeTable {
    /// Rebuild the canonical table from per-symbol code lengths.
    pub fn from_lengths(lens: &[u8]) -> Result<Self> {
        let max_len = lens.iter().copied().max().unwrap_or(0) as u32;
        if max_len == 0 {
            return Err(Error::header("code book has no live symbols"));
        }

        let mut counts = vec![0u32; max_len as usize + 1];
        for &l in lens {
            if l > 0 {
                counts[l as usize] += 1;
            }
        }

        let mut first_code = vec![0u64; max_len as usize + 1];
        let mut first_index = vec![0u32; max_len as usize + 1];
        // Wide accumulator: at the 63-bit length limit the running code
        // crosses u64.
        let mut code = 0u128;
        let mut index = 0u32;
        for l in 1..=max_len as usize {
            first_code[l] = code as u64;
            first_index[l] = index;
            code = (code + counts[l] as u128) << 1;
            index += counts[l];
            if code > 1u128 << (l + 1) {
                return Err(Error::header("code lengths violate the Kraft bound"));
            }
        }

        let mut syms = Vec::with_capacity(index as usize);
        for target in 1..=max_len as u8 {
            for (sym, &l) in lens.iter().enumerate() {
                if l == target {
                    syms.push(sym as u32);
                }
            }
        }

        Ok(DecodeTable {
            max_len,
            counts,
            first_code,
            first_index,
            syms,
        })
    }

    /// Decode one symbol, consuming exactly its code's bits.
    #[inline]
    pub fn decode_symbol(&self, r: &mut BitReader) -> Result<u32> {
        let mut code = 0u64;
        for l in 1..=self.max_len as usize {
            code = (code << 1) | r.read_bit()?;
            let first = self.first_code[l];
            if code < first + self.counts[l] as u64 {
                let idx = self.first_index[l] as usize + (code - first) as usize;
                return Ok(self.syms[idx]);
            }
        }
        Err(Error::header("invalid Huffman code in payload"))
    }

    /// Longest code in bits.
    pub fn max_len(&self) -> u32 {
        self.max_len
    }
}

/// Decode every chunk of a payload back into quant codes.
///
/// Each worker seeks to its chunk's bit offset and decodes one band of
/// `sublen` symbols (the final band may be shorter).
pub fn decode_chunked<C: QuantCode>(
    payload: &[u8],
    meta: &[ChunkMeta],
    sublen: usize,
    table: &DecodeTable,
    out: &mut [C],
) -> Result<()> {
    if sublen == 0 {
        return Err(Error::header("zero chunk length"));
    }
    let nchunk = out.len().div_ceil(sublen);
    if nchunk != meta.len() {
        return Err(Error::header(format!(
            "chunk metadata holds {} entries, output needs {nchunk}",
            meta.len()
        )));
    }

    out.par_chunks_mut(sublen)
        .zip(meta.par_iter())
        .try_for_each(|(band, m)| {
            let mut r = BitReader::at_bit(payload, m.loc_bits as usize)?;
            for slot in band.iter_mut() {
                *slot = C::from_u32(table.decode_symbol(&mut r)?);
            }
            Ok(())
        })
}
