// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Encode seeded synthetic images and check the decoder reproduces them
//! within lossy-compression tolerances.

mod common;

use baseline_jpeg::{decode, Encoder, Plane, Subsampling};
use common::{plane_error, seeded_rng, smooth_plane};
use test_log::test;

fn assert_close(original: &Plane, decoded: &Plane, label: &str) {
    let (mean, max) = plane_error(original, decoded);
    assert!(mean < 2.0, "{label}: mean error {mean}");
    assert!(max < 20, "{label}: max error {max}");
}

#[test]
fn grayscale_sizes() {
    let mut rng = seeded_rng(1);
    for &(w, h) in &[(8, 8), (13, 13), (64, 48), (1, 1), (100, 3)] {
        let plane = smooth_plane(&mut rng, w, h);
        let bytes = Encoder::new(92).encode(&[plane.clone()]).unwrap();
        let image = decode(&bytes).unwrap();
        assert_eq!((image.width(), image.height()), (w, h));
        assert_close(&plane, &image.planes[0], &format!("{w}x{h}"));
    }
}

#[test]
fn color_subsampling_modes() {
    let mut rng = seeded_rng(2);
    let (w, h): (usize, usize) = (45, 29);
    for subsampling in [Subsampling::S444, Subsampling::S422, Subsampling::S420] {
        let (cw, ch) = match subsampling {
            Subsampling::S444 => (w, h),
            Subsampling::S422 => (w.div_ceil(2), h),
            Subsampling::S420 => (w.div_ceil(2), h.div_ceil(2)),
        };
        let planes = [
            smooth_plane(&mut rng, w, h),
            smooth_plane(&mut rng, cw, ch),
            smooth_plane(&mut rng, cw, ch),
        ];
        let bytes = Encoder::new(92).subsampling(subsampling).encode(&planes).unwrap();
        let image = decode(&bytes).unwrap();
        assert_eq!(image.planes.len(), 3);
        for (c, (original, decoded)) in planes.iter().zip(&image.planes).enumerate() {
            assert_close(original, decoded, &format!("{subsampling:?} component {c}"));
        }
    }
}

#[test]
fn color_with_restarts() {
    let mut rng = seeded_rng(3);
    let planes = [
        smooth_plane(&mut rng, 70, 50),
        smooth_plane(&mut rng, 35, 25),
        smooth_plane(&mut rng, 35, 25),
    ];
    for interval in [1, 3, 7] {
        let bytes = Encoder::new(90)
            .subsampling(Subsampling::S420)
            .restart_interval(interval)
            .encode(&planes)
            .unwrap();
        let image = decode(&bytes).unwrap();
        for (original, decoded) in planes.iter().zip(&image.planes) {
            assert_close(original, decoded, &format!("interval {interval}"));
        }
    }
}

#[test]
fn decode_is_deterministic() {
    let mut rng = seeded_rng(4);
    let plane = smooth_plane(&mut rng, 33, 17);
    let bytes = Encoder::new(80).encode(&[plane]).unwrap();
    let first = decode(&bytes).unwrap();
    let second = decode(&bytes).unwrap();
    assert_eq!(first.planes, second.planes);
}

#[test]
fn recompression_stays_close() {
    let mut rng = seeded_rng(5);
    let plane = smooth_plane(&mut rng, 48, 40);
    let first = decode(&Encoder::new(90).encode(&[plane.clone()]).unwrap()).unwrap();
    let second = decode(&Encoder::new(90).encode(&first.planes).unwrap()).unwrap();
    assert_close(&plane, &second.planes[0], "second generation");
    assert_close(&first.planes[0], &second.planes[0], "generation drift");
}

#[test]
fn lower_quality_means_fewer_bytes() {
    let mut rng = seeded_rng(6);
    let plane = smooth_plane(&mut rng, 64, 64);
    let high = Encoder::new(95).encode(&[plane.clone()]).unwrap();
    let low = Encoder::new(20).encode(&[plane]).unwrap();
    assert!(low.len() < high.len(), "{} vs {}", low.len(), high.len());
    assert!(decode(&low).is_ok());
}
