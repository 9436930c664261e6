//! Dense-to-CSR conversion and the serialized sparse subfile.

use rayon::prelude::*;
use tracing::debug;

use stolas_core::{Error, Result};

/// CSR compaction of the dense outlier plane.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrTriple {
    /// Side of the square view; `rowptr` has `m + 1` entries.
    pub m: u32,
    pub rowptr: Vec<u32>,
    pub colidx: Vec<u32>,
    pub values: Vec<f32>,
}

impl CsrTriple {
    /// Number of stored non-zeros.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }
}

/// Side of the square view over a dense plane of `len` samples.
fn square_side(len: usize) -> u32 {
    (len as f64).sqrt().ceil() as u32
}

/// Compact the dense plane into a CSR triple.
///
/// Rows of the square view are swept in parallel; a prefix scan over the
/// per-row counts then fixes the row pointer table. Exceeding `capacity`
/// non-zeros is a capacity failure.
pub fn gather(dense: &[f32], capacity: usize) -> Result<CsrTriple> {
    let m = square_side(dense.len());

    let rows: Vec<(Vec<u32>, Vec<f32>)> = (0..m as usize)
        .into_par_iter()
        .map(|r| {
            let start = r * m as usize;
            let end = (start + m as usize).min(dense.len());
            let mut cols = Vec::new();
            let mut vals = Vec::new();
            if start < dense.len() {
                for (c, &v) in dense[start..end].iter().enumerate() {
                    if v != 0.0 {
                        cols.push(c as u32);
                        vals.push(v);
                    }
                }
            }
            (cols, vals)
        })
        .collect();

    let nnz: usize = rows.iter().map(|(c, _)| c.len()).sum();
    if nnz > capacity {
        return Err(Error::CapacityExceeded { nnz, capacity });
    }

    let mut rowptr = Vec::with_capacity(m as usize + 1);
    let mut colidx = Vec::with_capacity(nnz);
    let mut values = Vec::with_capacity(nnz);
    rowptr.push(0u32);
    for (cols, vals) in rows {
        colidx.extend_from_slice(&cols);
        values.extend_from_slice(&vals);
        rowptr.push(colidx.len() as u32);
    }

    debug!(nnz, m, capacity, "outlier gather");
    Ok(CsrTriple {
        m,
        rowptr,
        colidx,
        values,
    })
}

/// Scatter a CSR triple back into the dense plane. Exact inverse of
/// `gather` for any plane of the same length.
pub fn scatter(triple: &CsrTriple, dense: &mut [f32]) -> Result<()> {
    let m = triple.m as usize;
    if triple.rowptr.len() != m + 1 {
        return Err(Error::header("sparse row pointer table has the wrong length"));
    }
    if square_side(dense.len()) as usize != m {
        return Err(Error::header(format!(
            "sparse view side {m} does not match a plane of {} samples",
            dense.len()
        )));
    }

    dense.fill(0.0);
    let len = dense.len();
    dense
        .par_chunks_mut(m.max(1))
        .enumerate()
        .try_for_each(|(r, band)| {
            let lo = triple.rowptr[r] as usize;
            let hi = triple.rowptr[r + 1] as usize;
            if lo > hi || hi > triple.colidx.len() {
                return Err(Error::header("sparse row pointer table not monotonic"));
            }
            for k in lo..hi {
                let c = triple.colidx[k] as usize;
                if r * m + c >= len || c >= band.len() {
                    return Err(Error::header(format!(
                        "sparse index ({r}, {c}) outside the dense plane"
                    )));
                }
                band[c] = triple.values[k];
            }
            Ok(())
        })?;

    // Rows past the dense tail must be empty.
    let covered = len.div_ceil(m.max(1));
    if triple.rowptr[covered] as usize != triple.colidx.len() {
        return Err(Error::header("sparse rows extend past the dense plane"));
    }
    Ok(())
}

/// Serialized byte footprint of a triple.
pub fn serialized_nbyte(triple: &CsrTriple) -> usize {
    8 + 4 * (triple.m as usize + 1) + 8 * triple.nnz()
}

/// Pack `(nnz, m, rowptr, colidx, values)` little-endian.
pub fn serialize(triple: &CsrTriple) -> Vec<u8> {
    let mut out = Vec::with_capacity(serialized_nbyte(triple));
    out.extend_from_slice(&(triple.nnz() as u32).to_le_bytes());
    out.extend_from_slice(&triple.m.to_le_bytes());
    for &p in &triple.rowptr {
        out.extend_from_slice(&p.to_le_bytes());
    }
    for &c in &triple.colidx {
        out.extend_from_slice(&c.to_le_bytes());
    }
    for &v in &triple.values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Parse a serialized triple, validating the layout length.
pub fn parse(bytes: &[u8]) -> Result<CsrTriple> {
    if bytes.len() < 8 {
        return Err(Error::header("sparse subfile shorter than its prologue"));
    }
    let word = |at: usize| [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]];
    let nnz = u32::from_le_bytes(word(0)) as usize;
    let m = u32::from_le_bytes(word(4));

    let rowptr_at = 8usize;
    let colidx_at = rowptr_at + 4 * (m as usize + 1);
    let values_at = colidx_at + 4 * nnz;
    let end = values_at + 4 * nnz;
    if bytes.len() != end {
        return Err(Error::header(format!(
            "sparse subfile is {} bytes, layout needs {end}",
            bytes.len()
        )));
    }

    let rowptr: Vec<u32> = (0..=m as usize)
        .map(|k| u32::from_le_bytes(word(rowptr_at + 4 * k)))
        .collect();
    let colidx: Vec<u32> = (0..nnz)
        .map(|k| u32::from_le_bytes(word(colidx_at + 4 * k)))
        .collect();
    let values: Vec<f32> = (0..nnz)
        .map(|k| f32::from_le_bytes(word(values_at + 4 * k)))
        .collect();

    if rowptr.last().copied().unwrap_or(0) as usize != nnz {
        return Err(Error::header("sparse row pointer table does not close at nnz"));
    }

    Ok(CsrTriple {
        m,
        rowptr,
        colidx,
        values,
    })
}
