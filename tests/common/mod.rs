// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Hand-assembled JPEG streams for integration tests.

#![allow(dead_code)]

use baseline_jpeg::Plane;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

pub const SOF0: u8 = 0xC0;
pub const SOF2: u8 = 0xC2;
pub const DHT: u8 = 0xC4;
pub const DQT: u8 = 0xDB;
pub const DRI: u8 = 0xDD;
pub const SOS: u8 = 0xDA;
pub const COM: u8 = 0xFE;

/// One entropy-coded byte for a block whose DC difference is +40 and whose
/// AC coefficients are all zero, with tables from [`JpegBuilder::single_code_tables`]:
/// DC code "0" (category 6), magnitude bits 101000, AC code "0" (EOB).
pub const DC_PLUS_40: u8 = 0x50;

/// Byte-level JPEG writer. Segment lengths are filled in automatically.
pub struct JpegBuilder {
    out: Vec<u8>,
}

impl JpegBuilder {
    /// Start a stream with SOI.
    pub fn new() -> Self {
        Self {
            out: vec![0xFF, 0xD8],
        }
    }

    /// Start a stream with no SOI.
    pub fn bare() -> Self {
        Self { out: Vec::new() }
    }

    /// Append a marker segment with a computed length field.
    pub fn segment(mut self, marker: u8, body: &[u8]) -> Self {
        self.out.extend_from_slice(&[0xFF, marker]);
        self.out.extend_from_slice(&((body.len() + 2) as u16).to_be_bytes());
        self.out.extend_from_slice(body);
        self
    }

    /// 8-bit DQT table `id` with `dc` at position 0 and 1 everywhere else.
    pub fn dqt(self, id: u8, dc: u8) -> Self {
        let mut body = vec![id];
        body.push(dc);
        body.extend(std::iter::repeat(1u8).take(63));
        self.segment(DQT, &body)
    }

    /// SOF0 with 8-bit precision. `components` holds (id, h, v, quant table).
    pub fn sof0(self, width: u16, height: u16, components: &[(u8, u8, u8, u8)]) -> Self {
        self.sof(SOF0, width, height, components)
    }

    pub fn sof(self, marker: u8, width: u16, height: u16, components: &[(u8, u8, u8, u8)]) -> Self {
        let mut body = vec![8];
        body.extend_from_slice(&height.to_be_bytes());
        body.extend_from_slice(&width.to_be_bytes());
        body.push(components.len() as u8);
        for &(id, h, v, tq) in components {
            body.extend_from_slice(&[id, (h << 4) | v, tq]);
        }
        self.segment(marker, &body)
    }

    /// DHT table with a single 1-bit code for `symbol`.
    pub fn single_code_dht(self, class: u8, id: u8, symbol: u8) -> Self {
        let mut body = vec![(class << 4) | id, 1];
        body.extend_from_slice(&[0u8; 15]);
        body.push(symbol);
        self.segment(DHT, &body)
    }

    /// DC table 0 (category 6 only) and AC table 0 (EOB only).
    pub fn single_code_tables(self) -> Self {
        self.single_code_dht(0, 0, 6).single_code_dht(1, 0, 0x00)
    }

    pub fn dri(self, interval: u16) -> Self {
        self.segment(DRI, &interval.to_be_bytes())
    }

    /// SOS naming `components` as (id, dc table, ac table).
    pub fn sos(self, components: &[(u8, u8, u8)]) -> Self {
        let mut body = vec![components.len() as u8];
        for &(id, td, ta) in components {
            body.extend_from_slice(&[id, (td << 4) | ta]);
        }
        body.extend_from_slice(&[0, 63, 0]);
        self.segment(SOS, &body)
    }

    /// Raw bytes, appended as-is.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.out.extend_from_slice(bytes);
        self
    }

    pub fn eoi(self) -> Self {
        self.raw(&[0xFF, 0xD9])
    }

    pub fn build(self) -> Vec<u8> {
        self.out
    }
}

impl Default for JpegBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Grayscale 8×`width` stream using the single-code tables, with DC
/// quantizer `q0` and the given entropy bytes.
pub fn gray_stream(width: u16, q0: u8, restart_interval: Option<u16>, entropy: &[u8]) -> Vec<u8> {
    let mut builder = JpegBuilder::new()
        .dqt(0, q0)
        .sof0(width, 8, &[(1, 1, 1, 0)])
        .single_code_tables();
    if let Some(n) = restart_interval {
        builder = builder.dri(n);
    }
    builder.sos(&[(1, 0, 0)]).raw(entropy).eoi().build()
}

/// A smooth plane: a few random low-frequency cosines plus a gradient.
pub fn smooth_plane(rng: &mut ChaCha20Rng, width: usize, height: usize) -> Plane {
    let base: f64 = rng.gen_range(60.0..190.0);
    let waves: Vec<(f64, f64, f64, f64)> = (0..3)
        .map(|_| {
            (
                rng.gen_range(5.0..25.0),
                rng.gen_range(0.01..0.08),
                rng.gen_range(0.01..0.08),
                rng.gen_range(0.0..std::f64::consts::TAU),
            )
        })
        .collect();
    let mut plane = Plane::new(width, height, 0);
    for y in 0..height {
        for x in 0..width {
            let mut v = base + (x as f64 - width as f64 / 2.0) * 0.2;
            for &(amp, fx, fy, phase) in &waves {
                v += amp * (x as f64 * fx + y as f64 * fy + phase).cos();
            }
            plane.samples[y * width + x] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    plane
}

pub fn seeded_rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

/// (mean, max) absolute sample difference of two same-sized planes.
pub fn plane_error(a: &Plane, b: &Plane) -> (f64, u8) {
    assert_eq!((a.width, a.height), (b.width, b.height));
    let mut sum = 0u64;
    let mut max = 0u8;
    for (&x, &y) in a.samples.iter().zip(&b.samples) {
        let d = x.abs_diff(y);
        sum += d as u64;
        max = max.max(d);
    }
    (sum as f64 / a.samples.len() as f64, max)
}
