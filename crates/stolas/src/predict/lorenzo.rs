//! Forward Lorenzo transform: prequantize, predict, split into quant codes
//! and outliers.

use rayon::prelude::*;

use stolas_core::{DeviceBuffer, Dim3, Error, QuantCode, Result, Stream};

use super::{BLOCK_1D, BLOCK_2D, BLOCK_3D_X, BLOCK_3D_Y, BLOCK_3D_Z};

/// Fill `quant` and `outlier` from `input`.
///
/// After the call exactly one of `quant[i] == 0` and `outlier[i] == 0.0`
/// holds per sample. The kernel cannot fail on data; only mismatched buffer
/// shapes are rejected.
pub fn quantize<C: QuantCode>(
    input: &DeviceBuffer<f32>,
    dims: Dim3,
    eb: f64,
    radius: i32,
    quant: &mut DeviceBuffer<C>,
    outlier: &mut DeviceBuffer<f32>,
    _stream: Stream,
) -> Result<()> {
    let n = dims.len();
    if input.len() != n || quant.len() != n || outlier.len() != n {
        return Err(Error::device(
            "predict",
            format!(
                "buffer lengths ({}, {}, {}) do not match shape of {n}",
                input.len(),
                quant.len(),
                outlier.len()
            ),
        ));
    }

    let ebx2_r = 1.0 / (2.0 * eb);
    let radius = radius as i64;
    match dims.rank() {
        1 => quantize_1d(
            input.as_slice(),
            quant.as_mut_slice(),
            outlier.as_mut_slice(),
            ebx2_r,
            radius,
        ),
        2 => quantize_2d(
            input.as_slice(),
            quant.as_mut_slice(),
            outlier.as_mut_slice(),
            dims.x as usize,
            ebx2_r,
            radius,
        ),
        _ => quantize_3d(
            input.as_slice(),
            quant.as_mut_slice(),
            outlier.as_mut_slice(),
            dims.x as usize,
            dims.y as usize,
            ebx2_r,
            radius,
        ),
    }
    Ok(())
}

#[inline]
fn prequant(v: f32, ebx2_r: f64) -> i64 {
    (v as f64 * ebx2_r).round() as i64
}

/// Route one residual to the quant or outlier channel.
#[inline]
fn emit<C: QuantCode>(delta: i64, radius: i64, q: &mut C, o: &mut f32) {
    if delta > -radius && delta < radius {
        *q = C::from_u32((delta + radius) as u32);
        *o = 0.0;
    } else {
        *q = C::from_u32(0);
        *o = (delta + radius) as f32;
    }
}

fn quantize_1d<C: QuantCode>(
    input: &[f32],
    quant: &mut [C],
    outlier: &mut [f32],
    ebx2_r: f64,
    radius: i64,
) {
    quant
        .par_chunks_mut(BLOCK_1D)
        .zip(outlier.par_chunks_mut(BLOCK_1D))
        .zip(input.par_chunks(BLOCK_1D))
        .for_each(|((qt, ot), it)| {
            let mut west = 0i64;
            for ((q, o), &v) in qt.iter_mut().zip(ot.iter_mut()).zip(it) {
                let s = prequant(v, ebx2_r);
                emit(s - west, radius, q, o);
                west = s;
            }
        });
}

fn quantize_2d<C: QuantCode>(
    input: &[f32],
    quant: &mut [C],
    outlier: &mut [f32],
    nx: usize,
    ebx2_r: f64,
    radius: i64,
) {
    let band = BLOCK_2D * nx;
    quant
        .par_chunks_mut(band)
        .zip(outlier.par_chunks_mut(band))
        .zip(input.par_chunks(band))
        .for_each(|((qt, ot), it)| {
            let rows = it.len() / nx;
            for tx in 0..nx.div_ceil(BLOCK_2D) {
                let x0 = tx * BLOCK_2D;
                let w = BLOCK_2D.min(nx - x0);
                // Prequantized tile with a zero halo at index 0 on each axis.
                let mut pq = [[0i64; BLOCK_2D + 1]; BLOCK_2D + 1];
                for j in 0..rows {
                    for i in 0..w {
                        let at = j * nx + x0 + i;
                        let s = prequant(it[at], ebx2_r);
                        let pred = pq[j][i + 1] + pq[j + 1][i] - pq[j][i];
                        pq[j + 1][i + 1] = s;
                        emit(s - pred, radius, &mut qt[at], &mut ot[at]);
                    }
                }
            }
        });
}

fn quantize_3d<C: QuantCode>(
    input: &[f32],
    quant: &mut [C],
    outlier: &mut [f32],
    nx: usize,
    ny: usize,
    ebx2_r: f64,
    radius: i64,
) {
    let plane = nx * ny;
    let band = BLOCK_3D_Z * plane;
    quant
        .par_chunks_mut(band)
        .zip(outlier.par_chunks_mut(band))
        .zip(input.par_chunks(band))
        .for_each(|((qt, ot), it)| {
            let depth = it.len() / plane;
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
                                let s = prequant(it[at], ebx2_r);
                                // Faces minus edges plus the corner, halo zero.
                                let pred = pq[k][j + 1][i + 1]
                                    + pq[k + 1][j][i + 1]
                                    + pq[k + 1][j + 1][i]
                                    - pq[k][j][i + 1]
                                    - pq[k][j + 1][i]
                                    - pq[k + 1][j][i]
                                    + pq[k][j][i];
                                pq[k + 1][j + 1][i + 1] = s;
                                emit(s - pred, radius, &mut qt[at], &mut ot[at]);
                            }
                        }
                    }
                }
            }
        });
}
