//! End-to-end archive round trips.

use stolas::pipeline::{Compressor, Decompressor};
use stolas_core::header::{ArchiveHeader, Subfile};
use stolas_core::{CompressContext, DeviceBuffer, Dim3, Error, Result, Stream};

fn compress(data: &[f32], ctx: &CompressContext) -> Result<Vec<u8>> {
    let input = DeviceBuffer::from_host(data);
    let mut compressor = Compressor::new(ctx)?;
    Ok(compressor.compress(&input, Stream::default())?.to_vec())
}

fn decompress(archive: &[u8], n: usize) -> Vec<f32> {
    let mut out = DeviceBuffer::<f32>::alloc(n);
    Decompressor::new()
        .decompress(archive, &mut out, Stream::default())
        .unwrap();
    out.to_host()
}

fn assert_within(data: &[f32], back: &[f32], eb: f64) {
    assert_eq!(data.len(), back.len());
    for (k, (&a, &b)) in data.iter().zip(back).enumerate() {
        let err = (a as f64 - b as f64).abs();
        assert!(err <= eb * 1.002, "sample {k}: {a} vs {b}, err {err}");
    }
}

fn sparse_nnz(archive: &[u8]) -> usize {
    let header = ArchiveHeader::parse(archive).unwrap();
    let triple = stolas_sparse::parse(&archive[header.subfile_range(Subfile::Spfmt)]).unwrap();
    triple.nnz()
}

#[test]
fn smooth_short_sequence() {
    let data = [1.0f32, 1.01, 1.02, 1.03];
    let mut ctx = CompressContext::new(Dim3::d1(4), 0.02);
    ctx.radius = 4;

    let archive = compress(&data, &ctx).unwrap();
    // The leading sample predicts from zero and lands on the outlier
    // channel; everything after it quantizes.
    assert_eq!(sparse_nnz(&archive), 1);
    assert_within(&data, &decompress(&archive, 4), 0.02);
}

#[test]
fn isolated_spike_rides_the_outlier_channel() {
    let data = [0.0f32, 0.0, 10_000.0, 0.0, 0.0];
    let mut ctx = CompressContext::new(Dim3::d1(5), 0.1);
    ctx.radius = 8;
    // Two of five samples are outliers; the default factor-4 workspace
    // rounds down to a single slot on an array this small.
    ctx.nz_density_factor = 2;

    let archive = compress(&data, &ctx).unwrap();
    // The residual onto the spike and the one back off it both exceed the
    // radius.
    assert_eq!(sparse_nnz(&archive), 2);
    assert_within(&data, &decompress(&archive, 5), 0.1);
}

#[test]
fn zero_plane_compresses_to_header_and_book() {
    let data = vec![0.0f32; 32 * 32];
    let ctx = CompressContext::new(Dim3::d2(32, 32), 1e-6);

    let archive = compress(&data, &ctx).unwrap();
    assert!(archive.len() <= data.len() * 2, "archive {} bytes", archive.len());
    assert_eq!(sparse_nnz(&archive), 0);

    let back = decompress(&archive, data.len());
    assert!(back.iter().all(|&v| v == 0.0));
}

#[test]
fn linear_ramp_3d_has_no_outliers() {
    let dims = Dim3::d3(64, 64, 64);
    let data: Vec<f32> = (0..dims.len())
        .map(|at| {
            let i = at % 64;
            let j = (at / 64) % 64;
            let k = at / (64 * 64);
            (i + j + k) as f32
        })
        .collect();
    let ctx = CompressContext::new(dims, 0.25);

    let archive = compress(&data, &ctx).unwrap();
    assert_eq!(sparse_nnz(&archive), 0);
    assert_within(&data, &decompress(&archive, dims.len()), 0.25);
}

#[test]
fn narrow_book_overflow_falls_back_to_wide_words() {
    // Fibonacci-weighted residuals: 33 distinct deltas whose counts grow as
    // F(1)..F(33) force a Huffman leaf past the 31-bit narrow limit. Tiles
    // reset the running level every 256 samples, so the level stays small
    // whatever the run lengths are.
    let mut runs: Vec<(i64, u64)> = Vec::new();
    let (mut a, mut b) = (1u64, 1u64);
    for k in 0..33i64 {
        runs.push((k - 16, a));
        let next = a + b;
        a = b;
        b = next;
    }

    let total: u64 = runs.iter().map(|&(_, n)| n).sum();
    let mut data = Vec::with_capacity(total as usize);
    let mut level = 0i64;
    for &(delta, count) in &runs {
        for _ in 0..count {
            if data.len() % 256 == 0 {
                level = 0;
            }
            level += delta;
            data.push(level as f32);
        }
    }

    let ctx = CompressContext::new(Dim3::d1(data.len() as u32), 0.5);
    assert_eq!(ctx.huff_nbyte, 4);

    let archive = compress(&data, &ctx).unwrap();
    let header = ArchiveHeader::parse(&archive).unwrap();
    assert_eq!(header.byte_vle, 8);
    assert_eq!(sparse_nnz(&archive), 0);
    assert_within(&data, &decompress(&archive, data.len()), 0.5);
}

#[test]
fn dense_outliers_exceed_gather_capacity() {
    // 40% of samples sit on +-1000-step jumps; at density factor 4 the
    // gatherer only holds 25%.
    let n = 1_000_000usize;
    let mut data = Vec::with_capacity(n);
    let mut level = 0i64;
    for i in 0..n {
        match i % 5 {
            1 => level += 1000,
            3 => level -= 1000,
            _ => {}
        }
        data.push(level as f32);
    }

    let ctx = CompressContext::new(Dim3::d1(n as u32), 0.5);
    let err = compress(&data, &ctx).unwrap_err();
    match err {
        Error::CapacityExceeded { nnz, capacity } => {
            assert_eq!(capacity, n / 4);
            assert!(nnz > capacity);
        }
        other => panic!("expected CapacityExceeded, got {other:?}"),
    }
}

#[test]
fn incompressible_noise_inflates_past_the_reserve() {
    // Wide uniform noise: quant codes spread over the whole alphabet and a
    // sixth of the samples are outliers, so subfiles outgrow N * 4 / 2.
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let n = 20_000usize;
    let mut rng = StdRng::seed_from_u64(7);
    let data: Vec<f32> = (0..n).map(|_| rng.gen_range(0..860) as f32).collect();

    let ctx = CompressContext::new(Dim3::d1(n as u32), 0.5);
    let err = compress(&data, &ctx).unwrap_err();
    assert!(
        matches!(err, Error::OutputInflation { .. }),
        "expected OutputInflation, got {err:?}"
    );
}

#[test]
fn explicit_pardeg_lands_in_the_header() {
    let data: Vec<f32> = (0..1000).map(|i| (i as f32 * 0.05).sin()).collect();
    let mut ctx = CompressContext::new(Dim3::d1(1000), 1e-3);
    ctx.pardeg = 7;

    let archive = compress(&data, &ctx).unwrap();
    let header = ArchiveHeader::parse(&archive).unwrap();
    assert_eq!(header.vle_pardeg, 7);
    assert_within(&data, &decompress(&archive, 1000), 1e-3);
}

#[test]
fn single_sample_round_trips() {
    let data = [2.5f32];
    let mut ctx = CompressContext::new(Dim3::d1(1), 0.5);
    ctx.radius = 16;

    let archive = compress(&data, &ctx).unwrap();
    assert_within(&data, &decompress(&archive, 1), 0.5);
}

#[test]
fn spline_predictor_is_rejected() {
    let mut ctx = CompressContext::new(Dim3::d1(100), 1e-3);
    ctx.predictor = stolas_core::Predictor::Spline3;
    let err = Compressor::new(&ctx).unwrap_err();
    assert_eq!(err.category(), "unsupported");
}

#[test]
fn tampered_magic_fails_decompression() {
    let data = vec![1.0f32; 256];
    let ctx = CompressContext::new(Dim3::d1(256), 1e-3);
    let mut archive = compress(&data, &ctx).unwrap();
    archive[1] ^= 0x40;

    let mut out = DeviceBuffer::<f32>::alloc(256);
    let err = Decompressor::new()
        .decompress(&archive, &mut out, Stream::default())
        .unwrap_err();
    assert_eq!(err.category(), "header_invalid");
}

#[test]
fn truncated_archive_fails_decompression() {
    let data = vec![0.5f32; 256];
    let ctx = CompressContext::new(Dim3::d1(256), 1e-3);
    let archive = compress(&data, &ctx).unwrap();

    let mut out = DeviceBuffer::<f32>::alloc(256);
    let err = Decompressor::new()
        .decompress(&archive[..archive.len() - 4], &mut out, Stream::default())
        .unwrap_err();
    assert_eq!(err.category(), "header_invalid");
}

#[test]
fn wrong_output_shape_is_rejected() {
    let data = vec![0.5f32; 64];
    let ctx = CompressContext::new(Dim3::d1(64), 1e-3);
    let archive = compress(&data, &ctx).unwrap();

    let mut out = DeviceBuffer::<f32>::alloc(32);
    let err = Decompressor::new()
        .decompress(&archive, &mut out, Stream::default())
        .unwrap_err();
    assert_eq!(err.category(), "device_failure");
}

#[test]
fn decompressor_reuses_workspaces_across_archives() {
    let mut decompressor = Decompressor::new();
    let stream = Stream::default();

    for scale in [1.0f32, 3.0, -2.0] {
        let data: Vec<f32> = (0..500).map(|i| scale * (i as f32 * 0.02).cos()).collect();
        let ctx = CompressContext::new(Dim3::d1(500), 1e-3);
        let archive = compress(&data, &ctx).unwrap();

        let mut out = DeviceBuffer::<f32>::alloc(500);
        decompressor.decompress(&archive, &mut out, stream).unwrap();
        assert_within(&data, &out.to_host(), 1e-3);
    }
}
