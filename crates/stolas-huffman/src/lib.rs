//! Coarse-grained canonical Huffman codec.
//!
//! The codec operates on a stream of quant codes over the alphabet
//! `[0, 2 * radius)` in four stages:
//!
//! 1. **Histogram** — parallel per-chunk counters merged into one table.
//! 2. **Book construction** — a Huffman tree built by repeated min-two
//!    merges, reduced to canonical codes assigned in (length, symbol) order.
//! 3. **Chunked encode** — the stream is split into `pardeg` chunks; each
//!    chunk encodes into a private bit buffer, a prefix scan places the
//!    buffers at byte-aligned offsets, and per-chunk metadata records bit
//!    lengths and bit offsets.
//! 4. **Chunked decode** — each chunk decodes independently from its bit
//!    offset against a first-code-per-length canonical table.
//!
//! The code word is either 4 or 8 bytes wide. A book whose longest code
//! exceeds `8 * width - 1` bits fails construction with a recoverable
//! error; the orchestrator retries the whole codec at the 8-byte width.

mod bitio;
mod book;
mod codec;
mod decode;
mod encode;
mod histogram;

pub use bitio::{BitReader, BitWriter};
pub use book::{Book, CodeEntry};
pub use codec::HuffmanCodec;
pub use decode::{decode_chunked, DecodeTable};
pub use encode::{encode_chunked, ChunkMeta, EncodedStream};
pub use histogram::histogram;
