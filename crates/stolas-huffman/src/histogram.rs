//! Parallel symbol histogram.

use rayon::prelude::*;
use stolas_core::{Error, QuantCode, Result};

/// Chunk granularity for the per-worker local counters.
const HIST_CHUNK: usize = 64 * 1024;

/// Count occurrences of each symbol in `[0, num_symbols)`.
///
/// Workers accumulate block-local counters that are merged at the end,
/// mirroring the device-side block reduction. A symbol outside the alphabet
/// means the quant buffer is corrupt and surfaces as a device failure.
pub fn histogram<C: QuantCode>(codes: &[C], num_symbols: usize) -> Result<Vec<u32>> {
    codes
        .par_chunks(HIST_CHUNK)
        .map(|chunk| {
            let mut local = vec![0u32; num_symbols];
            for &c in chunk {
                let sym = c.to_u32() as usize;
                match local.get_mut(sym) {
                    Some(slot) => *slot += 1,
                    None => {
                        return Err(Error::device(
                            "histogram",
                            format!("symbol {sym} outside alphabet of {num_symbols}"),
                        ))
                    }
                }
            }
            Ok(local)
        })
        .try_reduce(
            || vec![0u32; num_symbols],
            |mut a, b| {
                for (x, y) in a.iter_mut().zip(b) {
                    *x += y;
                }
                Ok(a)
            },
        )
}
