// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! DCT coefficient storage and quantization tables.
//!
//! Provides [`DctGrid`] for storing DCT coefficients in block-raster order,
//! and [`QuantTable`] for the 64-entry quantization matrices.

use super::zigzag::{NATURAL_TO_ZIGZAG, ZIGZAG_TO_NATURAL};

/// Quantization table: 64 values in zigzag order, as transmitted in DQT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantTable {
    /// Quantization values, indexed by zigzag position.
    pub values: [u16; 64],
}

impl QuantTable {
    /// Table from values already in zigzag order.
    pub fn new(values: [u16; 64]) -> Self {
        Self { values }
    }

    /// Table from values in natural (row-major) order.
    pub fn from_natural(natural: &[u16; 64]) -> Self {
        let mut values = [0u16; 64];
        for (ni, &v) in natural.iter().enumerate() {
            values[NATURAL_TO_ZIGZAG[ni]] = v;
        }
        Self { values }
    }

    /// The same table in natural (row-major) order.
    pub fn natural(&self) -> [u16; 64] {
        let mut out = [0u16; 64];
        for (zi, &v) in self.values.iter().enumerate() {
            out[ZIGZAG_TO_NATURAL[zi]] = v;
        }
        out
    }

    /// Whether every value fits the 8-bit DQT precision.
    pub fn is_8bit(&self) -> bool {
        self.values.iter().all(|&v| v <= 255)
    }
}

/// Grid of DCT coefficients for one image component.
///
/// Blocks are stored in block-raster order. Within each block, the 64
/// coefficients are in natural (row-major) order, i.e. index = row * 8 + col.
/// The decoder stores dequantized values; the encoder stores quantized ones.
#[derive(Debug, Clone)]
pub struct DctGrid {
    /// Number of 8×8 blocks horizontally.
    blocks_wide: usize,
    /// Number of 8×8 blocks vertically.
    blocks_tall: usize,
    blocks: Vec<[i32; 64]>,
}

impl DctGrid {
    /// Create a new grid initialized to zero.
    pub fn new(blocks_wide: usize, blocks_tall: usize) -> Self {
        Self {
            blocks_wide,
            blocks_tall,
            blocks: vec![[0i32; 64]; blocks_wide * blocks_tall],
        }
    }

    pub fn blocks_wide(&self) -> usize {
        self.blocks_wide
    }

    pub fn blocks_tall(&self) -> usize {
        self.blocks_tall
    }

    /// Coefficient at frequency row `i`, column `j` of block (`br`, `bc`).
    pub fn get(&self, br: usize, bc: usize, i: usize, j: usize) -> i32 {
        debug_assert!(i < 8 && j < 8);
        self.block(br, bc)[i * 8 + j]
    }

    /// The 64-coefficient block at (br, bc).
    pub fn block(&self, br: usize, bc: usize) -> &[i32; 64] {
        &self.blocks[self.index(br, bc)]
    }

    /// Mutable access to the 64-coefficient block at (br, bc).
    pub fn block_mut(&mut self, br: usize, bc: usize) -> &mut [i32; 64] {
        let idx = self.index(br, bc);
        &mut self.blocks[idx]
    }

    /// One row of blocks, left to right.
    pub fn block_row(&self, br: usize) -> &[[i32; 64]] {
        let start = br * self.blocks_wide;
        &self.blocks[start..start + self.blocks_wide]
    }

    fn index(&self, br: usize, bc: usize) -> usize {
        debug_assert!(br < self.blocks_tall, "block row {br} >= {}", self.blocks_tall);
        debug_assert!(bc < self.blocks_wide, "block col {bc} >= {}", self.blocks_wide);
        br * self.blocks_wide + bc
    }
}
