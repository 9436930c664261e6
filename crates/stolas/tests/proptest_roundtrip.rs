//! Property-based tests for the full pipeline.
//!
//! These verify the bound guarantee and the archive invariants across a
//! range of shapes, bounds, and data:
//! - every reconstructed sample stays within the error bound
//! - the predictor's two output channels are mutually exclusive
//! - the header entry table is monotonic and closes at the blob length
//! - header serialization is idempotent

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use stolas::pipeline::{Compressor, Decompressor};
use stolas::predict;
use stolas_core::header::{ArchiveHeader, HEADER_NBYTE, SUBFILE_END};
use stolas_core::{CompressContext, DeviceBuffer, Dim3, Stream};

// Extents start high enough that the outlier workspace holds the walk's
// tile-origin residuals even at the smallest shapes.
fn dims_strategy() -> impl Strategy<Value = Dim3> {
    prop_oneof![
        (64u32..1200).prop_map(Dim3::d1),
        ((4u32..48), (4u32..48)).prop_map(|(x, y)| Dim3::d2(x, y)),
        ((4u32..14), (4u32..14), (4u32..14)).prop_map(|(x, y, z)| Dim3::d3(x, y, z)),
    ]
}

fn eb_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.01), Just(0.5), Just(2.0)]
}

/// Smooth random walk with an isolated spike every 101 samples: most
/// residuals quantize, the spikes exercise the outlier channel. The walk
/// floats well above zero so tile-origin residuals stay positive.
fn walk(n: usize, eb: f64, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut level = 10_000.0 * eb;
    (0..n)
        .map(|i| {
            level += rng.gen_range(-50.0..50.0) * eb;
            let spike = if i % 101 == 100 { eb * 4000.0 } else { 0.0 };
            (level + spike) as f32
        })
        .collect()
}

fn round_trip(data: &[f32], ctx: &CompressContext) -> (Vec<u8>, Vec<f32>) {
    let stream = Stream::default();
    let input = DeviceBuffer::from_host(data);
    let mut compressor = Compressor::new(ctx).unwrap();
    let archive = compressor.compress(&input, stream).unwrap().to_vec();

    let mut out = DeviceBuffer::<f32>::alloc(data.len());
    Decompressor::new()
        .decompress(&archive, &mut out, stream)
        .unwrap();
    (archive, out.to_host())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 40,
        max_shrink_iters: 60,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_reconstruction_stays_within_bound(
        dims in dims_strategy(),
        eb in eb_strategy(),
        seed in any::<u64>(),
    ) {
        let data = walk(dims.len(), eb, seed);
        let ctx = CompressContext::new(dims, eb);
        let (archive, back) = round_trip(&data, &ctx);

        for (k, (&a, &b)) in data.iter().zip(&back).enumerate() {
            let err = (a as f64 - b as f64).abs();
            prop_assert!(
                err <= eb * 1.002,
                "sample {} of {:?}: {} vs {}, err {}",
                k, dims, a, b, err
            );
        }

        let header = ArchiveHeader::parse(&archive).unwrap();
        for k in 0..SUBFILE_END {
            prop_assert!(header.entry[k] <= header.entry[k + 1]);
        }
        prop_assert_eq!(header.entry[SUBFILE_END] as usize, archive.len());
    }

    #[test]
    fn prop_quant_and_outlier_channels_are_exclusive(
        dims in dims_strategy(),
        eb in eb_strategy(),
        seed in any::<u64>(),
    ) {
        let data = walk(dims.len(), eb, seed);
        let input = DeviceBuffer::from_host(&data);
        let mut quant = DeviceBuffer::<u16>::alloc(data.len());
        let mut outlier = DeviceBuffer::<f32>::alloc(data.len());
        predict::quantize(&input, dims, eb, 512, &mut quant, &mut outlier, Stream::default())
            .unwrap();

        for (q, o) in quant.to_host().iter().zip(outlier.to_host()) {
            prop_assert!((*q == 0) ^ (o == 0.0));
        }
    }

    #[test]
    fn prop_header_serialization_is_idempotent(
        dims in dims_strategy(),
        eb in eb_strategy(),
        seed in any::<u64>(),
    ) {
        let data = walk(dims.len(), eb, seed);
        let ctx = CompressContext::new(dims, eb);
        let (archive, _) = round_trip(&data, &ctx);

        let header = ArchiveHeader::parse(&archive).unwrap();
        prop_assert_eq!(&header.to_bytes()[..], &archive[..HEADER_NBYTE]);
    }
}
