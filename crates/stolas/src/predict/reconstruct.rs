//! Inverse Lorenzo transform: merge the two channels, prefix-sum the
//! residuals tile by tile, rescale.

use rayon::prelude::*;

use stolas_core::{DeviceBuffer, Dim3, Error, QuantCode, Result, Stream};

use super::{BLOCK_1D, BLOCK_2D, BLOCK_3D_X, BLOCK_3D_Y, BLOCK_3D_Z};

/// Rebuild the sample array from `(quant, outlier)`.
///
/// Tiles replay the forward recurrence, so the pass is exact for any pair
/// the forward kernel produced, whatever the tile seams look like.
pub fn reconstruct<C: QuantCode>(
    quant: &DeviceBuffer<C>,
    outlier: &DeviceBuffer<f32>,
    dims: Dim3,
    eb: f64,
    radius: i32,
    out: &mut DeviceBuffer<f32>,
    _stream: Stream,
) -> Result<()> {
    let n = dims.len();
    if quant.len() != n || outlier.len() != n || out.len() != n {
        return Err(Error::device(
            "reconstruct",
            format!(
                "buffer lengths ({}, {}, {}) do not match shape of {n}",
                quant.len(),
                outlier.len(),
                out.len()
            ),
        ));
    }

    let ebx2 = 2.0 * eb;
    let radius = radius as i64;
    match dims.rank() {
        1 => reconstruct_1d(
            quant.as_slice(),
            outlier.as_slice(),
            out.as_mut_slice(),
            ebx2,
            radius,
        ),
        2 => reconstruct_2d(
            quant.as_slice(),
            outlier.as_slice(),
            out.as_mut_slice(),
            dims.x as usize,
            ebx2,
            radius,
        ),
        _ => reconstruct_3d(
            quant.as_slice(),
            outlier.as_slice(),
            out.as_mut_slice(),
            dims.x as usize,
            dims.y as usize,
            ebx2,
            radius,
        ),
    }
    Ok(())
}

/// Undo the channel split: quant code 0 defers to the outlier carrier.
#[inline]
fn restore_delta<C: QuantCode>(q: C, o: f32, radius: i64) -> i64 {
    let qv = q.to_u32();
    if qv == 0 {
        (o as f64).round() as i64 - radius
    } else {
        qv as i64 - radius
    }
}

#[inline]
fn rescale(s: i64, ebx2: f64) -> f32 {
    (s as f64 * ebx2) as f32
}

fn reconstruct_1d<C: QuantCode>(
    quant: &[C],
    outlier: &[f32],
    out: &mut [f32],
    ebx2: f64,
    radius: i64,
) {
    out.par_chunks_mut(BLOCK_1D)
        .zip(quant.par_chunks(BLOCK_1D))
        .zip(outlier.par_chunks(BLOCK_1D))
        .for_each(|((st, qt), ot)| {
            let mut acc = 0i64;
            for ((s, &q), &o) in st.iter_mut().zip(qt).zip(ot) {
                acc += restore_delta(q, o, radius);
                *s = rescale(acc, ebx2);
            }
        });
}

fn reconstruct_2d<C: QuantCode>(
    quant: &[C],
    outlier: &[f32],
    out: &mut [f32],
    nx: usize,
    ebx2: f64,
    radius: i64,
) {
    let band = BLOCK_2D * nx;
    out.par_chunks_mut(band)
        .zip(quant.par_chunks(band))
        .zip(outlier.par_chunks(band))
        .for_each(|((st, qt), ot)| {
            let rows = st.len() / nx;
            for tx in 0..nx.div_ceil(BLOCK_2D) {
                let x0 = tx * BLOCK_2D;
                let w = BLOCK_2D.min(nx - x0);
                let mut pq = [[0i64; BLOCK_2D + 1]; BLOCK_2D + 1];
                for j in 0..rows {
                    for i in 0..w {
                        let at = j * nx + x0 + i;
                        let pred = pq[j][i + 1] + pq[j + 1][i] - pq[j][i];
                        let s = pred + restore_delta(qt[at], ot[at], radius);
                        pq[j + 1][i + 1] = s;
                        st[at] = rescale(s, ebx2);
                    }
                }
            }
        });
}

fn reconstruct_3d<C: QuantCode>(
    quant: &[C],
    outlier: &[f32],
    out: &mut [f32],
    nx: usize,
    ny: usize,
    ebx2: f64,
    radius: i64,
) {
    let plane = nx * ny;
    let band = BLOCK_3D_Z * plane;
    out.par_chunks_mut(band)
        .zip(quant.par_chunks(band))
        .zip(outlier.par_chunks(band))
        .for_each(|((st, qt), ot)| {
            let depth = st.len() / plane;
            for ty in 0..ny.div_ceil(BLOCK_3D_Y) {
                let y0 = ty * BLOCK_3D_Y;
                let h = BLOCK_3D_Y.min(ny - y0);
                for tx in 0..nx.div_ceil(BLOCK_3D_X) {
                    let x0 = tx * BLOCK_3D_X;
                    let w = BLOCK_3D_X.min(nx - x0);
                    let mut pq =
                        [[[0i64; BLOCK_3D_X + 1]; BLOCK_3D_Y + 1]; BLOCK_3D_Z + 1];
                    for k in 0..depth {
                        for j in 0..h {
                            for i in 0..w {
                                let at = k * plane + (y0 + j) * nx + x0 + i;
                                let pred = pq[k][j + 1][i + 1]
                                    + pq[k + 1][j][i + 1]
                                    + pq[k + 1][j + 1][i]
                                    - pq[k][j][i + 1]
                                    - pq[k][j + 1][i]
                                    - pq[k + 1][j][i]
                                    + pq[k][j][i];
                                let s = pred + restore_delta(qt[at], ot[at], radius);
                                pq[k + 1][j + 1][i + 1] = s;
                                st[at] = rescale(s, ebx2);
                            }
                        }
                    }
                }
            }
        });
}
