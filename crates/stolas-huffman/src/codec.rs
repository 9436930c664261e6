//! Codec front-end: histogram + book + chunked encode behind one call, and
//! the serialized subfile layout.
//!
//! Subfile layout, little-endian:
//!
//! ```text
//! u32 bklen          alphabet size (2 * radius)
//! u32 sublen         symbols per chunk
//! u32 nchunk         chunk count
//! u32 payload_nbyte  encoded stream bytes
//! u8  lens[bklen]    canonical code lengths, 0 = absent
//! u8  payload[payload_nbyte]
//! (u32 bits, u32 loc_bits) x nchunk
//! ```
//!
//! The encoded stream precedes its chunk metadata; the canonical lengths
//! table is all a decoder needs to rebuild the book.

use core::marker::PhantomData;

use tracing::debug;

use stolas_core::{Error, HuffWord, QuantCode, Result};

use crate::book::Book;
use crate::decode::{decode_chunked, DecodeTable};
use crate::encode::{encode_chunked, ChunkMeta};
use crate::histogram::histogram;

/// Prologue bytes before the lengths table.
const PROLOGUE_NBYTE: usize = 16;

/// One codec instance at a fixed word width.
///
/// The width is a compile-time parameter; the orchestrator holds a 4-byte
/// instance and lazily adds an 8-byte one when the narrow book overflows.
#[derive(Debug)]
pub struct HuffmanCodec<C, W> {
    num_symbols: usize,
    pardeg: usize,
    _width: PhantomData<(C, W)>,
}

impl<C: QuantCode, W: HuffWord> HuffmanCodec<C, W> {
    pub fn new(num_symbols: usize, pardeg: usize) -> Self {
        HuffmanCodec {
            num_symbols,
            pardeg,
            _width: PhantomData,
        }
    }

    /// Code-word width in bytes.
    pub fn width_nbyte(&self) -> usize {
        W::NBYTE
    }

    /// Histogram, book, chunked encode, serialize.
    pub fn compress(&self, codes: &[C]) -> Result<Vec<u8>> {
        let hist = histogram(codes, self.num_symbols)?;
        let book = Book::<W>::from_histogram(&hist)?;
        let stream = encode_chunked(codes, &book, self.pardeg)?;

        let lens = book.lens();
        let nbyte = PROLOGUE_NBYTE
            + lens.len()
            + stream.payload.len()
            + stream.meta.len() * 8;
        let mut out = Vec::with_capacity(nbyte);
        out.extend_from_slice(&(lens.len() as u32).to_le_bytes());
        out.extend_from_slice(&(stream.sublen as u32).to_le_bytes());
        out.extend_from_slice(&(stream.meta.len() as u32).to_le_bytes());
        out.extend_from_slice(&(stream.payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&lens);
        out.extend_from_slice(&stream.payload);
        for m in &stream.meta {
            out.extend_from_slice(&m.bits.to_le_bytes());
            out.extend_from_slice(&m.loc_bits.to_le_bytes());
        }

        debug!(
            symbols = codes.len(),
            width = W::NBYTE,
            max_len = book.max_len(),
            chunks = stream.meta.len(),
            nbyte = out.len(),
            "huffman encode"
        );
        Ok(out)
    }

    /// Parse a subfile and decode every chunk into `out`.
    pub fn decompress(&self, subfile: &[u8], out: &mut [C]) -> Result<()> {
        let (lens, sublen, meta, payload) = parse_subfile(subfile)?;
        if lens.len() != self.num_symbols {
            return Err(Error::header(format!(
                "book covers {} symbols, expected {}",
                lens.len(),
                self.num_symbols
            )));
        }
        let table = DecodeTable::from_lengths(lens)?;
        decode_chunked(payload, &meta, sublen, &table, out)
    }
}

fn parse_subfile(subfile: &[u8]) -> Result<(&[u8], usize, Vec<ChunkMeta>, &[u8])> {
    if subfile.len() < PROLOGUE_NBYTE {
        return Err(Error::header("Huffman subfile shorter than its prologue"));
    }
    let word = |at: usize| {
        u32::from_le_bytes([subfile[at], subfile[at + 1], subfile[at + 2], subfile[at + 3]])
    };
    let bklen = word(0) as usize;
    let sublen = word(4) as usize;
    let nchunk = word(8) as usize;
    let payload_nbyte = word(12) as usize;

    let lens_at = PROLOGUE_NBYTE;
    let payload_at = lens_at + bklen;
    let meta_at = payload_at + payload_nbyte;
    let end = meta_at + nchunk * 8;
    if subfile.len() != end {
        return Err(Error::header(format!(
            "Huffman subfile is {} bytes, layout needs {end}",
            subfile.len()
        )));
    }

    let lens = &subfile[lens_at..payload_at];
    let payload = &subfile[payload_at..meta_at];
    let mut meta = Vec::with_capacity(nchunk);
    for k in 0..nchunk {
        let at = meta_at + k * 8;
        meta.push(ChunkMeta {
            bits: word(at),
            loc_bits: word(at + 4),
        });
    }
    Ok((lens, sublen, meta, payload))
}
