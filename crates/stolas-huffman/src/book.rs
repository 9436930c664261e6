//! Canonical code-book construction.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use stolas_core::{Error, HuffWord, Result};

/// One canonical code: the code word plus its bit length.
///
/// A length of 0 marks a symbol absent from the histogram.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeEntry<W: HuffWord> {
    pub word: W,
    pub len: u8,
}

/// Flat code book indexed by symbol.
#[derive(Debug)]
pub struct Book<W: HuffWord> {
    entries: Vec<CodeEntry<W>>,
    max_len: u32,
}

impl<W: HuffWord> Book<W> {
    /// Build a book from a symbol histogram.
    ///
    /// Fails with a recoverable `CodeTooLong` when the deepest leaf does
    /// not fit the code word; the orchestrator retries at the wider width.
    pub fn from_histogram(hist: &[u32]) -> Result<Self> {
        let lens = tree_code_lengths(hist)?;
        Self::from_lengths(&lens)
    }

    /// Assign canonical codes to a code-length table.
    ///
    /// Codes are assigned in ascending length, then ascending symbol, the
    /// same order the decoder's first-code table assumes.
    pub fn from_lengths(lens: &[u8]) -> Result<Self> {
        let max_len = lens.iter().copied().max().unwrap_or(0) as u32;
        if max_len == 0 {
            return Err(Error::config("code book has no live symbols"));
        }
        if max_len > W::MAX_CODE_BITS {
            return Err(Error::CodeTooLong {
                max_len,
                width: W::NBYTE,
                limit: W::MAX_CODE_BITS,
            });
        }

        let mut bl_count = vec![0u128; max_len as usize + 1];
        for &l in lens {
            if l > 0 {
                bl_count[l as usize] += 1;
            }
        }

        // Wide accumulator: at the 63-bit length limit the running code
        // crosses u64.
        let mut next_code = vec![0u128; max_len as usize + 1];
        let mut code = 0u128;
        for bits in 1..=max_len as usize {
            code = (code + bl_count[bits - 1]) << 1;
            next_code[bits] = code;
        }

        let mut entries = vec![CodeEntry::default(); lens.len()];
        for (sym, &l) in lens.iter().enumerate() {
            if l == 0 {
                continue;
            }
            let l = l as usize;
            let word = next_code[l];
            next_code[l] += 1;
            if next_code[l] > 1u128 << l {
                return Err(Error::header("code lengths violate the Kraft bound"));
            }
            entries[sym] = CodeEntry {
                word: W::from_u64(word as u64),
                len: l as u8,
            };
        }

        Ok(Book { entries, max_len })
    }

    /// Alphabet size the book covers.
    pub fn num_symbols(&self) -> usize {
        self.entries.len()
    }

    /// Longest code in bits.
    pub fn max_len(&self) -> u32 {
        self.max_len
    }

    /// Code for one symbol.
    #[inline]
    pub fn entry(&self, sym: usize) -> Option<CodeEntry<W>> {
        self.entries.get(sym).copied().filter(|e| e.len > 0)
    }

    /// Per-symbol code lengths; enough to rebuild the canonical book.
    pub fn lens(&self) -> Vec<u8> {
        self.entries.iter().map(|e| e.len).collect()
    }
}

/// Code lengths from a Huffman tree built by repeated min-two merges.
///
/// Ties break deterministically: leaves carry their symbol id, internal
/// nodes their creation order after all leaves, and the heap orders by
/// (weight, id). A degenerate one-symbol histogram gets a 1-bit code.
fn tree_code_lengths(hist: &[u32]) -> Result<Vec<u8>> {
    let live: Vec<usize> = hist
        .iter()
        .enumerate()
        .filter(|(_, &w)| w > 0)
        .map(|(i, _)| i)
        .collect();

    let mut lens = vec![0u8; hist.len()];
    match live.len() {
        0 => return Err(Error::config("histogram has no live symbols")),
        1 => {
            lens[live[0]] = 1;
            return Ok(lens);
        }
        _ => {}
    }

    let mut weights: Vec<u64> = live.iter().map(|&s| hist[s] as u64).collect();
    let mut parent: Vec<u32> = vec![u32::MAX; weights.len()];

    let mut heap: BinaryHeap<Reverse<(u64, u32)>> = weights
        .iter()
        .enumerate()
        .map(|(i, &w)| Reverse((w, i as u32)))
        .collect();

    while heap.len() > 1 {
        let (Some(Reverse((wa, a))), Some(Reverse((wb, b)))) = (heap.pop(), heap.pop()) else {
            break;
        };
        let id = weights.len() as u32;
        weights.push(wa + wb);
        parent.push(u32::MAX);
        parent[a as usize] = id;
        parent[b as usize] = id;
        heap.push(Reverse((wa + wb, id)));
    }

    for (leaf, &sym) in live.iter().enumerate() {
        let mut depth = 0u32;
        let mut node = leaf as u32;
        while parent[node as usize] != u32::MAX {
            depth += 1;
            node = parent[node as usize];
        }
        // Depth is bounded far below 255 for any histogram whose counts
        // fit u32, so the narrowing cast cannot truncate.
        lens[sym] = depth as u8;
    }

    Ok(lens)
}
