//! Compression orchestrator.

use tracing::{debug, warn};

use stolas_core::header::{ArchiveHeader, Subfile, CODEC_HUFFMAN, HEADER_NBYTE, SUBFILE_END};
use stolas_core::{
    CompressContext, CompressionRatio, DeviceBuffer, Error, Predictor, Result, Stream,
};
use stolas_huffman::HuffmanCodec;

use super::{Quant, MIN_RESERVE_NBYTE};
use crate::predict;

/// One-call compressor owning every stage workspace.
///
/// The predictor buffers, the reserved output, and the 4-byte codec are
/// sized at construction; the 8-byte fallback codec occupies an empty slot
/// until a code-book overflow first needs it.
#[derive(Debug)]
pub struct Compressor {
    ctx: CompressContext,
    quant: DeviceBuffer<Quant>,
    outlier: DeviceBuffer<f32>,
    archive: DeviceBuffer<u8>,
    codec: HuffmanCodec<Quant, u32>,
    codec_wide: Option<HuffmanCodec<Quant, u64>>,
    stats: Option<CompressionRatio>,
}

impl Compressor {
    /// Validate the context and size every workspace.
    pub fn new(ctx: &CompressContext) -> Result<Self> {
        ctx.validate()?;
        if ctx.predictor != Predictor::Lorenzo {
            return Err(Error::unsupported(
                "spline3 predictor is declared but not implemented",
            ));
        }

        let n = ctx.dims.len();
        let reserve = (n * core::mem::size_of::<f32>() / 2).max(MIN_RESERVE_NBYTE);
        let num_symbols = 2 * ctx.radius as usize;
        let pardeg = ctx.resolved_pardeg() as usize;

        Ok(Compressor {
            ctx: ctx.clone(),
            quant: DeviceBuffer::alloc(n),
            outlier: DeviceBuffer::alloc(n),
            archive: DeviceBuffer::alloc(reserve),
            codec: HuffmanCodec::new(num_symbols, pardeg),
            codec_wide: None,
            stats: None,
        })
    }

    /// Run the full pipeline and return the archive slice.
    ///
    /// The input is borrowed for the duration of the call and never
    /// modified; the returned slice aliases the reserved output buffer and
    /// stays valid until the next call.
    pub fn compress(&mut self, input: &DeviceBuffer<f32>, stream: Stream) -> Result<&[u8]> {
        let n = self.ctx.dims.len();
        if input.len() != n {
            return Err(Error::device(
                "predict",
                format!("input holds {} samples, shape needs {n}", input.len()),
            ));
        }

        debug!(stage = "predict", n, eb = self.ctx.eb, "compress");
        predict::quantize(
            input,
            self.ctx.dims,
            self.ctx.eb,
            self.ctx.radius,
            &mut self.quant,
            &mut self.outlier,
            stream,
        )?;
        stream.synchronize();

        debug!(stage = "gather", "compress");
        let capacity = n / self.ctx.nz_density_factor as usize;
        let triple = stolas_sparse::gather(self.outlier.as_slice(), capacity)?;
        let sp_blob = stolas_sparse::serialize(&triple);
        stream.synchronize();

        debug!(stage = "encode", "compress");
        let (vle_blob, byte_vle) = self.encode_codes()?;

        debug!(stage = "header_fill", "compress");
        let subfile_nbyte = [HEADER_NBYTE, 0, vle_blob.len(), sp_blob.len()];
        let mut entry = [0u32; SUBFILE_END + 1];
        let mut acc = 0u64;
        for (k, &nbyte) in subfile_nbyte.iter().enumerate() {
            entry[k] = acc as u32;
            acc += nbyte as u64;
        }
        if acc > u32::MAX as u64 {
            return Err(Error::OutputInflation {
                compressed: acc as usize,
                reserved: self.archive.len(),
            });
        }
        entry[SUBFILE_END] = acc as u32;

        let header = ArchiveHeader {
            dims: self.ctx.dims,
            radius: self.ctx.radius,
            vle_pardeg: self.ctx.resolved_pardeg(),
            eb: self.ctx.eb,
            byte_vle,
            codecs_in_use: CODEC_HUFFMAN,
            nz_density_factor: self.ctx.nz_density_factor,
            entry,
        };
        let total = header.file_size();
        if total > self.archive.len() {
            return Err(Error::OutputInflation {
                compressed: total,
                reserved: self.archive.len(),
            });
        }

        debug!(stage = "concat", total, nnz = triple.nnz(), byte_vle, "compress");
        let buf = self.archive.as_mut_slice();
        buf[..HEADER_NBYTE].copy_from_slice(&header.to_bytes());
        buf[header.subfile_range(Subfile::Vle)].copy_from_slice(&vle_blob);
        buf[header.subfile_range(Subfile::Spfmt)].copy_from_slice(&sp_blob);
        stream.synchronize();

        let ratio = CompressionRatio::new(n * core::mem::size_of::<f32>(), total);
        debug!(
            ratio = ratio.ratio(),
            percent = ratio.percent_of_original(),
            "compress done"
        );
        self.stats = Some(ratio);

        Ok(&self.archive.as_slice()[..total])
    }

    /// Encode the quant codes, recovering once from a narrow-book overflow.
    fn encode_codes(&mut self) -> Result<(Vec<u8>, i32)> {
        let Self {
            ctx,
            quant,
            codec,
            codec_wide,
            ..
        } = self;
        let codes = quant.as_slice();

        if ctx.huff_nbyte == 4 {
            match codec.compress(codes) {
                Ok(blob) => return Ok((blob, 4)),
                Err(e) if e.is_recoverable() => {
                    warn!(error = %e, "narrow code book overflow, retrying at 8 bytes");
                }
                Err(e) => return Err(e),
            }
        }

        let num_symbols = 2 * ctx.radius as usize;
        let pardeg = ctx.resolved_pardeg() as usize;
        let wide = codec_wide.get_or_insert_with(|| HuffmanCodec::new(num_symbols, pardeg));
        Ok((wide.compress(codes)?, 8))
    }

    /// Size statistics of the most recent call.
    pub fn stats(&self) -> Option<CompressionRatio> {
        self.stats
    }

    /// The validated context this compressor was built from.
    pub fn context(&self) -> &CompressContext {
        &self.ctx
    }
}
