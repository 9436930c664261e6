//! Coarse-grained chunked encode.

use rayon::prelude::*;
use stolas_core::{Error, HuffWord, QuantCode, Result};

use crate::bitio::BitWriter;
use crate::book::Book;

/// Per-chunk placement record.
///
/// `loc_bits` is the chunk's bit offset into the payload. Chunks are packed
/// at byte-aligned boundaries, so every offset is a multiple of 8; the bit
/// granularity keeps the metadata exact about where the chunk's codes end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkMeta {
    pub bits: u32,
    pub loc_bits: u32,
}

/// One encoded stream: byte payload plus chunk placement metadata.
#[derive(Debug)]
pub struct EncodedStream {
    /// Symbols per chunk; the final chunk may be shorter.
    pub sublen: usize,
    pub meta: Vec<ChunkMeta>,
    pub payload: Vec<u8>,
}

/// Encode `codes` into `pardeg` independently-decodable chunks.
///
/// Each worker encodes its chunk into a private bit buffer; a prefix scan
/// over the produced lengths then places every buffer at a byte-aligned
/// offset in the shared payload.
pub fn encode_chunked<C: QuantCode, W: HuffWord>(
    codes: &[C],
    book: &Book<W>,
    pardeg: usize,
) -> Result<EncodedStream> {
    if codes.is_empty() || pardeg == 0 {
        return Err(Error::config("empty symbol stream or zero pardeg"));
    }
    let sublen = codes.len().div_ceil(pardeg);

    let chunks: Vec<(Vec<u8>, u64)> = codes
        .par_chunks(sublen)
        .map(|chunk| {
            let mut w = BitWriter::new();
            for &c in chunk {
                let sym = c.to_u32() as usize;
                let entry = book.entry(sym).ok_or_else(|| {
                    Error::device("vle-encode", format!("symbol {sym} has no code"))
                })?;
                w.write_bits(entry.word.to_u64(), entry.len as u32);
            }
            Ok(w.finish())
        })
        .collect::<Result<Vec<_>>>()?;

    let mut meta = Vec::with_capacity(chunks.len());
    let mut byte_at = 0u64;
    for (bytes, bits) in &chunks {
        if *bits > u32::MAX as u64 || byte_at * 8 > u32::MAX as u64 {
            return Err(Error::device(
                "vle-encode",
                "chunk bit length overflows the metadata word",
            ));
        }
        meta.push(ChunkMeta {
            bits: *bits as u32,
            loc_bits: (byte_at * 8) as u32,
        });
        byte_at += bytes.len() as u64;
    }

    let mut payload = Vec::with_capacity(byte_at as usize);
    for (bytes, _) in chunks {
        payload.extend_from_slice(&bytes);
    }

    Ok(EncodedStream {
        sublen,
        meta,
        payload,
    })
}
