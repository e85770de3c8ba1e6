// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! JPEG frame header (SOF0) parsing.
//!
//! Extracts image dimensions, component information, and sampling factors
//! from the Start of Frame marker segment, and derives the MCU layout.

use super::error::{JpegError, Result};
use super::marker::SOF0;

/// Information about one image component from SOF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Component ID (typically 1=Y, 2=Cb, 3=Cr).
    pub id: u8,
    /// Horizontal sampling factor (1–4).
    pub h_sampling: u8,
    /// Vertical sampling factor (1–4).
    pub v_sampling: u8,
    /// Quantization table ID (0–3).
    pub quant_table_id: u8,
}

/// Frame header parsed from a SOF0 marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    /// Sample precision in bits (always 8).
    pub precision: u8,
    /// Image height in pixels.
    pub height: u16,
    /// Image width in pixels.
    pub width: u16,
    pub components: Vec<ComponentInfo>,
    /// Maximum horizontal sampling factor across all components.
    pub max_h_sampling: u8,
    /// Maximum vertical sampling factor across all components.
    pub max_v_sampling: u8,
    /// MCU width in pixels (= max_h_sampling * 8).
    pub mcu_width: usize,
    /// MCU height in pixels (= max_v_sampling * 8).
    pub mcu_height: usize,
    /// Number of MCUs horizontally.
    pub mcus_wide: usize,
    /// Number of MCUs vertically.
    pub mcus_tall: usize,
}

impl FrameHeader {
    /// Index of the component with the given ID.
    pub fn component_index(&self, id: u8) -> Option<usize> {
        self.components.iter().position(|c| c.id == id)
    }

    /// Width in samples of a component plane: `ceil(width * h / hmax)`.
    pub fn component_width(&self, comp_idx: usize) -> usize {
        let h = self.components[comp_idx].h_sampling as usize;
        (self.width as usize * h).div_ceil(self.max_h_sampling as usize)
    }

    /// Height in samples of a component plane: `ceil(height * v / vmax)`.
    pub fn component_height(&self, comp_idx: usize) -> usize {
        let v = self.components[comp_idx].v_sampling as usize;
        (self.height as usize * v).div_ceil(self.max_v_sampling as usize)
    }

    /// Number of 8×8 blocks wide for a component, padded to whole MCUs.
    pub fn blocks_wide(&self, comp_idx: usize) -> usize {
        self.mcus_wide * self.components[comp_idx].h_sampling as usize
    }

    /// Number of 8×8 blocks tall for a component, padded to whole MCUs.
    pub fn blocks_tall(&self, comp_idx: usize) -> usize {
        self.mcus_tall * self.components[comp_idx].v_sampling as usize
    }

    /// Blocks per row when the component is coded alone in a scan.
    ///
    /// A non-interleaved scan covers only the blocks that intersect the
    /// component plane, not the MCU padding.
    pub fn scan_blocks_wide(&self, comp_idx: usize) -> usize {
        self.component_width(comp_idx).div_ceil(8)
    }

    /// Block rows when the component is coded alone in a scan.
    pub fn scan_blocks_tall(&self, comp_idx: usize) -> usize {
        self.component_height(comp_idx).div_ceil(8)
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Parse a SOF0 marker segment body (after the 2-byte length).
pub fn parse_sof(data: &[u8]) -> Result<FrameHeader> {
    if data.len() < 6 {
        return Err(JpegError::InvalidMarkerData("SOF segment too short"));
    }

    let precision = data[0];
    if precision != 8 {
        return Err(JpegError::UnsupportedPrecision(precision));
    }

    let height = u16::from_be_bytes([data[1], data[2]]);
    let width = u16::from_be_bytes([data[3], data[4]]);
    let num_components = data[5] as usize;

    if !(1..=4).contains(&num_components) {
        return Err(JpegError::InvalidMarkerData("SOF component count must be 1 to 4"));
    }
    if data.len() != 6 + num_components * 3 {
        return Err(JpegError::InvalidMarkerData("SOF length does not match component count"));
    }
    if width == 0 || height == 0 {
        return Err(JpegError::InvalidDimensions);
    }

    let mut components: Vec<ComponentInfo> = Vec::with_capacity(num_components);
    for entry in data[6..].chunks_exact(3) {
        let id = entry[0];
        let h_sampling = entry[1] >> 4;
        let v_sampling = entry[1] & 0x0F;
        let quant_table_id = entry[2];

        if !(1..=4).contains(&h_sampling) || !(1..=4).contains(&v_sampling) {
            return Err(JpegError::InvalidDimensions);
        }
        if quant_table_id > 3 {
            return Err(JpegError::InvalidQuantTableId(quant_table_id));
        }
        if components.iter().any(|c| c.id == id) {
            return Err(JpegError::InvalidMarkerData("duplicate component ID in SOF"));
        }

        components.push(ComponentInfo {
            id,
            h_sampling,
            v_sampling,
            quant_table_id,
        });
    }

    let max_h = components.iter().map(|c| c.h_sampling).max().unwrap_or(1);
    let max_v = components.iter().map(|c| c.v_sampling).max().unwrap_or(1);
    let mcu_width = max_h as usize * 8;
    let mcu_height = max_v as usize * 8;

    Ok(FrameHeader {
        precision,
        height,
        width,
        components,
        max_h_sampling: max_h,
        max_v_sampling: max_v,
        mcu_width,
        mcu_height,
        mcus_wide: (width as usize).div_ceil(mcu_width),
        mcus_tall: (height as usize).div_ceil(mcu_height),
    })
}

/// Write a SOF0 marker segment (including 0xFFC0 marker and length).
pub fn write_sof(frame: &FrameHeader) -> Vec<u8> {
    let length = 2 + 6 + 3 * frame.components.len();
    let mut out = Vec::with_capacity(length + 2);
    out.extend_from_slice(&[0xFF, SOF0]);
    out.extend_from_slice(&(length as u16).to_be_bytes());
    out.push(frame.precision);
    out.extend_from_slice(&frame.height.to_be_bytes());
    out.extend_from_slice(&frame.width.to_be_bytes());
    out.push(frame.components.len() as u8);
    for c in &frame.components {
        out.extend_from_slice(&[c.id, (c.h_sampling << 4) | c.v_sampling, c.quant_table_id]);
    }
    out
}
