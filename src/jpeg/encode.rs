// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Baseline JPEG encoder.
//!
//! Writes a single interleaved (or grayscale) baseline scan using the
//! ITU-T T.81 Annex K example quantization tables, scaled by a libjpeg-style
//! quality factor, and the Annex K example Huffman tables.

use log::debug;

use super::dct::{DctGrid, QuantTable};
use super::error::{JpegError, Result};
use super::frame::{parse_sof, write_sof, FrameHeader};
use super::huffman::HuffmanEncodeTable;
use super::marker::{write_dri, write_sos, EOI, SOI};
use super::pixels::{fdct_block, quantize};
use super::plane::Plane;
use super::scan::{encode_scan, ScanComponent, ScanHeader};
use super::tables::{write_dht, write_dqt, HuffmanSpec, TableClass};

/// Annex K.1 luminance quantization table, natural order.
const LUMA_QUANT: [u16; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61, 12, 12, 14, 19, 26, 58, 60, 55, 14, 13, 16, 24, 40, 57, 69,
    56, 14, 17, 22, 29, 51, 87, 80, 62, 18, 22, 37, 56, 68, 109, 103, 77, 24, 35, 55, 64, 81,
    104, 113, 92, 49, 64, 78, 87, 103, 121, 120, 101, 72, 92, 95, 98, 112, 100, 103, 99,
];

/// Annex K.2 chrominance quantization table, natural order.
const CHROMA_QUANT: [u16; 64] = [
    17, 18, 24, 47, 99, 99, 99, 99, 18, 21, 26, 66, 99, 99, 99, 99, 24, 26, 56, 99, 99, 99, 99,
    99, 47, 66, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
];

const DC_LUMA_BITS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
const DC_CHROMA_BITS: [u8; 16] = [0, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0];

const AC_LUMA_BITS: [u8; 16] = [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7d];
const AC_LUMA_VALUES: [u8; 162] = [
    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61, 0x07,
    0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08, 0x23, 0x42, 0xb1, 0xc1, 0x15, 0x52, 0xd1, 0xf0,
    0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x25, 0x26, 0x27, 0x28,
    0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49,
    0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69,
    0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
    0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7,
    0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5,
    0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe1, 0xe2,
    0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

const AC_CHROMA_BITS: [u8; 16] = [0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 0x77];
const AC_CHROMA_VALUES: [u8; 162] = [
    0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21, 0x31, 0x06, 0x12, 0x41, 0x51, 0x07, 0x61, 0x71,
    0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91, 0xa1, 0xb1, 0xc1, 0x09, 0x23, 0x33, 0x52, 0xf0,
    0x15, 0x62, 0x72, 0xd1, 0x0a, 0x16, 0x24, 0x34, 0xe1, 0x25, 0xf1, 0x17, 0x18, 0x19, 0x1a, 0x26,
    0x27, 0x28, 0x29, 0x2a, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48,
    0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68,
    0x69, 0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87,
    0x88, 0x89, 0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5,
    0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3,
    0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda,
    0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

/// Annex K example Huffman table for the given class; `id` 0 is luminance,
/// 1 chrominance.
pub fn standard_huffman_spec(class: TableClass, id: u8) -> HuffmanSpec {
    let (bits, huffval) = match (class, id) {
        (TableClass::Dc, 0) => (DC_LUMA_BITS, (0..12).collect()),
        (TableClass::Dc, _) => (DC_CHROMA_BITS, (0..12).collect()),
        (TableClass::Ac, 0) => (AC_LUMA_BITS, AC_LUMA_VALUES.to_vec()),
        (TableClass::Ac, _) => (AC_CHROMA_BITS, AC_CHROMA_VALUES.to_vec()),
    };
    HuffmanSpec {
        class,
        id: id.min(1),
        bits,
        huffval,
    }
}

/// Annex K quantization table scaled by `quality` (1–100), libjpeg formula.
///
/// `chroma` selects the chrominance base table.
pub fn scaled_quant_table(quality: u8, chroma: bool) -> QuantTable {
    let quality = quality.clamp(1, 100) as u32;
    let scale = if quality < 50 {
        5000 / quality
    } else {
        200 - quality * 2
    };
    let base = if chroma { &CHROMA_QUANT } else { &LUMA_QUANT };
    let mut natural = [0u16; 64];
    for (q, &b) in natural.iter_mut().zip(base) {
        *q = ((b as u32 * scale + 50) / 100).clamp(1, 255) as u16;
    }
    QuantTable::from_natural(&natural)
}

/// Chroma subsampling of three-component images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Subsampling {
    /// No subsampling.
    #[default]
    S444,
    /// Chroma halved horizontally.
    S422,
    /// Chroma halved in both directions.
    S420,
}

impl Subsampling {
    /// Sampling factors (h, v) of the first component.
    fn luma_factors(self) -> (u8, u8) {
        match self {
            Self::S444 => (1, 1),
            Self::S422 => (2, 1),
            Self::S420 => (2, 2),
        }
    }
}

/// Baseline JPEG encoder settings.
///
/// ```
/// use baseline_jpeg::{Encoder, Plane};
///
/// let gray = Plane::new(16, 16, 100);
/// let bytes = Encoder::new(90).restart_interval(2).encode(&[gray]).unwrap();
/// assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoder {
    quality: u8,
    subsampling: Subsampling,
    restart_interval: u16,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(75)
    }
}

impl Encoder {
    /// Encoder with the given quality, clamped to 1–100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            subsampling: Subsampling::default(),
            restart_interval: 0,
        }
    }

    /// Chroma subsampling for three-plane input. Ignored for grayscale.
    pub fn subsampling(mut self, subsampling: Subsampling) -> Self {
        self.subsampling = subsampling;
        self
    }

    /// Emit an RST marker every `mcus` MCUs (0 disables restarts).
    pub fn restart_interval(mut self, mcus: u16) -> Self {
        self.restart_interval = mcus;
        self
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode one plane (grayscale) or three planes (Y, Cb, Cr).
    ///
    /// The first plane sets the image size. With subsampling, the other
    /// planes must be `ceil(width / h) × ceil(height / v)`.
    pub fn encode(&self, planes: &[Plane]) -> Result<Vec<u8>> {
        let frame = self.frame_header(planes)?;
        debug!(
            "encoding {}x{} with {} component(s), quality {}",
            frame.width,
            frame.height,
            frame.components.len(),
            self.quality
        );

        for (c, plane) in planes.iter().enumerate() {
            if (plane.width, plane.height) != (frame.component_width(c), frame.component_height(c)) {
                return Err(JpegError::InvalidDimensions);
            }
        }

        let quant = [
            scaled_quant_table(self.quality, false),
            scaled_quant_table(self.quality, true),
        ];
        let grids: Vec<DctGrid> = planes
            .iter()
            .enumerate()
            .map(|(c, plane)| {
                let qt = &quant[frame.components[c].quant_table_id as usize];
                forward_plane(plane, frame.blocks_wide(c), frame.blocks_tall(c), qt)
            })
            .collect();

        let table_count: usize = if planes.len() == 1 { 1 } else { 2 };
        let specs: Vec<(HuffmanSpec, HuffmanSpec)> = (0..table_count as u8)
            .map(|id| {
                (
                    standard_huffman_spec(TableClass::Dc, id),
                    standard_huffman_spec(TableClass::Ac, id),
                )
            })
            .collect();
        let enc_tables = specs
            .iter()
            .map(|(dc, ac)| Ok((HuffmanEncodeTable::build(dc)?, HuffmanEncodeTable::build(ac)?)))
            .collect::<Result<Vec<_>>>()?;

        let scan = ScanHeader {
            components: (0..planes.len())
                .map(|comp_idx| {
                    let id = comp_idx.min(1) as u8;
                    ScanComponent {
                        comp_idx,
                        dc_table: id,
                        ac_table: id,
                    }
                })
                .collect(),
        };
        let scan_tables: Vec<(&HuffmanEncodeTable, &HuffmanEncodeTable)> = scan
            .components
            .iter()
            .map(|sc| {
                let (dc, ac) = &enc_tables[sc.dc_table as usize];
                (dc, ac)
            })
            .collect();
        let entropy = encode_scan(&frame, &scan, &scan_tables, &grids, self.restart_interval)?;

        let mut out = vec![0xFF, SOI];
        for (id, qt) in quant.iter().take(table_count).enumerate() {
            out.extend(write_dqt(id as u8, qt));
        }
        out.extend(write_sof(&frame));
        for (dc, ac) in &specs {
            out.extend(write_dht(dc));
            out.extend(write_dht(ac));
        }
        if self.restart_interval > 0 {
            out.extend(write_dri(self.restart_interval));
        }
        out.extend(write_sos(&scan, &frame));
        out.extend(entropy);
        out.extend([0xFF, EOI]);
        Ok(out)
    }

    fn frame_header(&self, planes: &[Plane]) -> Result<FrameHeader> {
        let first = match planes {
            [only] => only,
            [first, _, _] => first,
            _ => return Err(JpegError::InvalidMarkerData("encoder takes 1 or 3 planes")),
        };
        let width = u16::try_from(first.width).map_err(|_| JpegError::InvalidDimensions)?;
        let height = u16::try_from(first.height).map_err(|_| JpegError::InvalidDimensions)?;

        let mut body = vec![8];
        body.extend(height.to_be_bytes());
        body.extend(width.to_be_bytes());
        body.push(planes.len() as u8);
        if planes.len() == 1 {
            body.extend([1, 0x11, 0]);
        } else {
            let (h, v) = self.subsampling.luma_factors();
            body.extend([1, (h << 4) | v, 0, 2, 0x11, 1, 3, 0x11, 1]);
        }
        parse_sof(&body)
    }
}

/// Forward-transform and quantize a plane into a grid of the given block
/// size, replicating edge samples into the padding.
fn forward_plane(plane: &Plane, blocks_wide: usize, blocks_tall: usize, qt: &QuantTable) -> DctGrid {
    let mut grid = DctGrid::new(blocks_wide, blocks_tall);
    for br in 0..blocks_tall {
        for bc in 0..blocks_wide {
            let samples: [u8; 64] =
                std::array::from_fn(|i| plane.get_clamped(bc * 8 + i % 8, br * 8 + i / 8));
            *grid.block_mut(br, bc) = quantize(&fdct_block(&samples), qt);
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::huffman::canonical_codes;

    #[test]
    fn standard_tables_are_complete() {
        for class in [TableClass::Dc, TableClass::Ac] {
            for id in 0..2 {
                let spec = standard_huffman_spec(class, id);
                assert_eq!(spec.code_count(), spec.huffval.len());
                assert!(canonical_codes(&spec.bits, &spec.huffval).is_ok());
            }
        }
        assert_eq!(standard_huffman_spec(TableClass::Ac, 0).huffval.len(), 162);
    }

    #[test]
    fn quality_scaling() {
        let q50 = scaled_quant_table(50, false);
        assert_eq!(q50.natural(), LUMA_QUANT);
        let q100 = scaled_quant_table(100, true);
        assert_eq!(q100.values, [1; 64]);
        // Quality 10 scales by 5: 16 * 5 = 80, 99 * 5 clamps to 255.
        let q10 = scaled_quant_table(10, false);
        assert_eq!(q10.values[0], 80);
        assert_eq!(q10.natural()[63], 255);
        assert!(scaled_quant_table(0, true).is_8bit());
    }

    #[test]
    fn builder_settings() {
        let enc = Encoder::new(0).subsampling(Subsampling::S420).restart_interval(4);
        assert_eq!(enc.quality(), 1);
        assert_eq!(enc.subsampling, Subsampling::S420);
        assert_eq!(enc.restart_interval, 4);
        assert_eq!(Encoder::default().quality(), 75);
    }

    #[test]
    fn stream_layout() {
        let gray = Plane::new(8, 8, 128);
        let bytes = Encoder::new(50).encode(&[gray]).unwrap();
        assert_eq!(&bytes[..4], &[0xFF, 0xD8, 0xFF, 0xDB]);
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9]);
        // DQT (69) then SOF0.
        assert_eq!(&bytes[2 + 69..2 + 71], &[0xFF, 0xC0]);
    }

    #[test]
    fn rejects_bad_planes() {
        let y = Plane::new(16, 16, 0);
        let c = Plane::new(8, 8, 0);
        assert!(Encoder::new(80).encode(&[]).is_err());
        assert!(Encoder::new(80).encode(&[y.clone(), c.clone()]).is_err());
        // 4:4:4 needs full-size chroma.
        assert_eq!(
            Encoder::new(80).encode(&[y.clone(), c.clone(), c.clone()]),
            Err(JpegError::InvalidDimensions)
        );
        assert!(Encoder::new(80)
            .subsampling(Subsampling::S420)
            .encode(&[y, c.clone(), c])
            .is_ok());
        assert_eq!(
            Encoder::new(80).encode(&[Plane::new(0, 4, 0)]),
            Err(JpegError::InvalidDimensions)
        );
        assert!(Encoder::new(80).encode(&[Plane::new(70_000, 1, 0)]).is_err());
    }
}
