//! Decompression orchestrator.

use tracing::debug;

use stolas_core::header::{ArchiveHeader, Subfile, CODEC_HUFFMAN};
use stolas_core::{DeviceBuffer, Error, Result, Stream};
use stolas_huffman::HuffmanCodec;

use super::Quant;
use crate::predict;

/// One-call decompressor; workspaces grow to the largest archive seen.
///
/// Both codec widths sit in lazy slots: an archive selects one through
/// `header.byte_vle` and only that instance is ever materialized.
#[derive(Default)]
pub struct Decompressor {
    quant: DeviceBuffer<Quant>,
    outlier: DeviceBuffer<f32>,
    codec: Option<HuffmanCodec<Quant, u32>>,
    codec_wide: Option<HuffmanCodec<Quant, u64>>,
    book_symbols: usize,
    pardeg: usize,
}

impl Decompressor {
    pub fn new() -> Self {
        Decompressor::default()
    }

    /// Parse the archive and rebuild the sample array into `out`.
    pub fn decompress(
        &mut self,
        archive: &[u8],
        out: &mut DeviceBuffer<f32>,
        stream: Stream,
    ) -> Result<()> {
        let header = ArchiveHeader::parse(archive)?;
        if header.file_size() != archive.len() {
            return Err(Error::header(format!(
                "entry table closes at {} bytes, blob holds {}",
                header.file_size(),
                archive.len()
            )));
        }
        if header.codecs_in_use != CODEC_HUFFMAN {
            return Err(Error::unsupported(format!(
                "codec set 0x{:x} not supported",
                header.codecs_in_use
            )));
        }

        let n = header.dims.len();
        if out.len() != n {
            return Err(Error::device(
                "reconstruct",
                format!("output holds {} samples, archive needs {n}", out.len()),
            ));
        }
        if self.quant.len() != n {
            self.quant = DeviceBuffer::alloc(n);
            self.outlier = DeviceBuffer::alloc(n);
        }

        let num_symbols = 2 * header.radius as usize;
        let pardeg = header.vle_pardeg as usize;
        if num_symbols != self.book_symbols || pardeg != self.pardeg {
            self.codec = None;
            self.codec_wide = None;
            self.book_symbols = num_symbols;
            self.pardeg = pardeg;
        }

        debug!(stage = "scatter", n, "decompress");
        let triple = stolas_sparse::parse(&archive[header.subfile_range(Subfile::Spfmt)])?;
        stolas_sparse::scatter(&triple, self.outlier.as_mut_slice())?;
        stream.synchronize();

        debug!(stage = "decode", byte_vle = header.byte_vle, "decompress");
        let vle = &archive[header.subfile_range(Subfile::Vle)];
        match header.byte_vle {
            4 => {
                let codec = self
                    .codec
                    .get_or_insert_with(|| HuffmanCodec::new(num_symbols, pardeg));
                codec.decompress(vle, self.quant.as_mut_slice())?;
            }
            8 => {
                let codec = self
                    .codec_wide
                    .get_or_insert_with(|| HuffmanCodec::new(num_symbols, pardeg));
                codec.decompress(vle, self.quant.as_mut_slice())?;
            }
            other => {
                return Err(Error::header(format!("byte_vle {other} not in {{4, 8}}")));
            }
        }
        stream.synchronize();

        debug!(stage = "reconstruct", "decompress");
        predict::reconstruct(
            &self.quant,
            &self.outlier,
            header.dims,
            header.eb,
            header.radius,
            out,
            stream,
        )?;
        stream.synchronize();
        Ok(())
    }
}
