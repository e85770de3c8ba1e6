// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! 8×8 DCT transforms between coefficient blocks and sample blocks.
//!
//! Both directions are separable: a 1-D transform over columns, then over
//! rows, using a cosine table computed once per process. Blocks are in
//! natural (row-major) order.

use std::f64::consts::PI;
use std::sync::OnceLock;

use super::dct::QuantTable;

/// Pre-computed 8×8 cosine table scaled by the DCT normalization:
/// `BASIS[u][x] = C(u) * cos((2*x + 1) * u * PI / 16)` with
/// C(0) = 1/sqrt(8), C(u>0) = 1/2.
static BASIS: OnceLock<[[f64; 8]; 8]> = OnceLock::new();

fn basis() -> &'static [[f64; 8]; 8] {
    BASIS.get_or_init(|| {
        let mut table = [[0.0f64; 8]; 8];
        for (u, row) in table.iter_mut().enumerate() {
            let norm = if u == 0 { 1.0 / 8f64.sqrt() } else { 0.5 };
            for (x, entry) in row.iter_mut().enumerate() {
                *entry = norm * ((2 * x + 1) as f64 * u as f64 * PI / 16.0).cos();
            }
        }
        table
    })
}

/// 8×8 IDCT of a dequantized coefficient block, level-shifted by +128,
/// rounded and clamped to 0–255.
pub fn idct_block(coeffs: &[i32; 64]) -> [u8; 64] {
    let b = basis();

    // Columns: temp[y][col] = sum_v B[v][y] * F[v][col]
    let mut temp = [0.0f64; 64];
    for col in 0..8 {
        for y in 0..8 {
            let mut sum = 0.0;
            for v in 0..8 {
                sum += b[v][y] * coeffs[v * 8 + col] as f64;
            }
            temp[y * 8 + col] = sum;
        }
    }

    // Rows
    let mut samples = [0u8; 64];
    for row in 0..8 {
        for x in 0..8 {
            let mut sum = 0.0;
            for u in 0..8 {
                sum += b[u][x] * temp[row * 8 + u];
            }
            samples[row * 8 + x] = (sum + 128.0).round().clamp(0.0, 255.0) as u8;
        }
    }
    samples
}

/// Forward 8×8 DCT of a sample block (level-shifted by -128 first).
pub fn fdct_block(samples: &[u8; 64]) -> [f64; 64] {
    let b = basis();

    let mut temp = [0.0f64; 64];
    for row in 0..8 {
        for u in 0..8 {
            let mut sum = 0.0;
            for x in 0..8 {
                sum += b[u][x] * (samples[row * 8 + x] as f64 - 128.0);
            }
            temp[row * 8 + u] = sum;
        }
    }

    let mut coeffs = [0.0f64; 64];
    for col in 0..8 {
        for v in 0..8 {
            let mut sum = 0.0;
            for y in 0..8 {
                sum += b[v][y] * temp[y * 8 + col];
            }
            coeffs[v * 8 + col] = sum;
        }
    }
    coeffs
}

/// Divide by the quantization table and round to nearest.
pub fn quantize(coeffs: &[f64; 64], qt: &QuantTable) -> [i32; 64] {
    let q = qt.natural();
    let mut out = [0i32; 64];
    for i in 0..64 {
        out[i] = (coeffs[i] / q[i] as f64).round() as i32;
    }
    out
}
