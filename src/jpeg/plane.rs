// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Sample planes and their reconstruction from coefficient grids.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::dct::DctGrid;
use super::pixels::idct_block;

/// One component's 8-bit samples in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    pub width: usize,
    pub height: usize,
    pub samples: Vec<u8>,
}

impl Plane {
    /// Plane of the given size filled with `value`.
    pub fn new(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            samples: vec![value; width * height],
        }
    }

    /// Plane from existing samples; `None` if the length does not match.
    pub fn from_samples(width: usize, height: usize, samples: Vec<u8>) -> Option<Self> {
        (samples.len() == width * height).then_some(Self {
            width,
            height,
            samples,
        })
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.samples[y * self.width + x]
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.samples[y * self.width..(y + 1) * self.width]
    }

    /// Sample at (x, y) with coordinates clamped to the plane edge.
    pub fn get_clamped(&self, x: usize, y: usize) -> u8 {
        self.get(x.min(self.width - 1), y.min(self.height - 1))
    }

    /// Upsample by replicating samples to `width` × `height`.
    ///
    /// `h` and `v` are (component factor, maximum factor) pairs: output
    /// column `x` takes source column `x * h.0 / h.1`.
    pub fn replicate(&self, h: (usize, usize), v: (usize, usize), width: usize, height: usize) -> Plane {
        let mut samples = Vec::with_capacity(width * height);
        for y in 0..height {
            let src = self.row((y * v.0 / v.1).min(self.height - 1));
            samples.extend((0..width).map(|x| src[(x * h.0 / h.1).min(self.width - 1)]));
        }
        Plane {
            width,
            height,
            samples,
        }
    }
}

/// Inverse-transform every block of `grid` and assemble a `width` × `height`
/// plane. Blocks (or parts of blocks) outside the plane are dropped.
pub fn reconstruct_plane(grid: &DctGrid, width: usize, height: usize) -> Plane {
    let mut samples = vec![0u8; width * height];
    if width == 0 || height == 0 {
        return Plane { width, height, samples };
    }
    let band = width * 8;

    let fill_band = |(br, out): (usize, &mut [u8])| {
        let rows = out.len() / width;
        let blocks = &grid.block_row(br)[..width.div_ceil(8)];
        for (bc, coeffs) in blocks.iter().enumerate() {
            let block = idct_block(coeffs);
            let x0 = bc * 8;
            let cols = (width - x0).min(8);
            for y in 0..rows {
                out[y * width + x0..y * width + x0 + cols]
                    .copy_from_slice(&block[y * 8..y * 8 + cols]);
            }
        }
    };

    #[cfg(feature = "parallel")]
    samples.par_chunks_mut(band).enumerate().for_each(fill_band);
    #[cfg(not(feature = "parallel"))]
    samples.chunks_mut(band).enumerate().for_each(fill_band);

    Plane { width, height, samples }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crops_partial_blocks() {
        // 2x2 blocks, plane 11x9: right and bottom blocks are cut.
        let mut grid = DctGrid::new(2, 2);
        grid.block_mut(0, 0)[0] = 80; // 138
        grid.block_mut(0, 1)[0] = 160; // 148
        grid.block_mut(1, 0)[0] = -80; // 118
        grid.block_mut(1, 1)[0] = -160; // 108

        let plane = reconstruct_plane(&grid, 11, 9);
        assert_eq!((plane.width, plane.height), (11, 9));
        assert_eq!(plane.samples.len(), 99);
        assert_eq!(plane.get(0, 0), 138);
        assert_eq!(plane.get(7, 7), 138);
        assert_eq!(plane.get(8, 0), 148);
        assert_eq!(plane.get(10, 7), 148);
        assert_eq!(plane.get(0, 8), 118);
        assert_eq!(plane.get(10, 8), 108);
        assert_eq!(plane.row(8), &[118, 118, 118, 118, 118, 118, 118, 118, 108, 108, 108]);
    }

    #[test]
    fn grid_wider_than_plane() {
        // MCU padding: three blocks per row but the plane only needs one.
        let mut grid = DctGrid::new(3, 1);
        grid.block_mut(0, 2)[0] = 400;
        let plane = reconstruct_plane(&grid, 5, 3);
        assert!(plane.samples.iter().all(|&s| s == 128));
    }

    #[test]
    fn replicate_upsamples() {
        let plane = Plane::from_samples(2, 2, vec![1, 2, 3, 4]).unwrap();
        let up = plane.replicate((1, 2), (1, 2), 3, 4);
        assert_eq!(up.samples, vec![1, 1, 2, 1, 1, 2, 3, 3, 4, 3, 3, 4]);
        // 2:3 horizontally (e.g. h=2 with hmax=3).
        let wide = plane.replicate((2, 3), (1, 1), 3, 1);
        assert_eq!(wide.samples, vec![1, 1, 2]);
        assert!(Plane::from_samples(2, 2, vec![0; 3]).is_none());
        assert_eq!(plane.get_clamped(9, 0), 2);
    }
}
