// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Baseline sequential JPEG decoding.
//!
//! Reads a JPEG byte stream, entropy-decodes every scan into dequantized
//! DCT coefficients, and inverse-transforms them into one sample plane per
//! component. No color conversion is done: planes come out in the color
//! space they were coded in (usually YCbCr).
//!
//! Supports:
//! - Baseline sequential DCT (SOF0), 8-bit precision, Huffman coding
//! - Grayscale and up to four components, interleaved or in separate scans
//! - Chroma subsampling (any sampling factors 1–4)
//! - Restart markers (DRI/RST)
//!
//! Rejected with [`error::ErrorKind::UnsupportedFeature`]:
//! - Extended, progressive, lossless and hierarchical processes (SOF1–SOF15)
//! - Arithmetic coding
//! - 12-bit precision

pub mod error;
pub mod zigzag;
pub mod dct;
pub mod bitio;
pub mod tables;
pub mod huffman;
pub mod frame;
pub mod marker;
pub mod scan;
pub mod pixels;
pub mod plane;
pub mod encode;

use std::io::Read;

use log::debug;

use bitio::BitReader;
use dct::{DctGrid, QuantTable};
use error::{JpegError, Result};
use frame::{parse_sof, FrameHeader};
use huffman::HuffmanTable;
use marker::{is_app, parse_dri, parse_sos, MarkerParser, Segment, APP0, COM, DHT, DQT, DRI, EOI, SOF0, SOI, SOS};
use plane::{reconstruct_plane, Plane};
use scan::{decode_scan, ComponentTables};
use tables::{parse_dht, parse_dqt, TableClass};

/// Decoder limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Largest accepted `width * height`. Checked before any coefficient
    /// storage is allocated.
    pub max_pixels: u64,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self { max_pixels: 1 << 28 }
    }
}

/// Payload of an APPn segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSegment {
    /// `n` of APPn (0–15).
    pub index: u8,
    pub data: Vec<u8>,
}

/// A fully decoded image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub frame: FrameHeader,
    /// One plane per frame component, in frame order, each at its own
    /// (possibly subsampled) resolution.
    pub planes: Vec<Plane>,
    /// APPn segments in stream order.
    pub app_segments: Vec<AppSegment>,
    /// COM segment payloads in stream order.
    pub comments: Vec<Vec<u8>>,
}

impl DecodedImage {
    pub fn width(&self) -> usize {
        self.frame.width as usize
    }

    pub fn height(&self) -> usize {
        self.frame.height as usize
    }

    /// Component `idx` replicated up to the full frame resolution.
    pub fn upsampled(&self, idx: usize) -> Option<Plane> {
        let plane = self.planes.get(idx)?;
        let comp = &self.frame.components[idx];
        Some(plane.replicate(
            (comp.h_sampling as usize, self.frame.max_h_sampling as usize),
            (comp.v_sampling as usize, self.frame.max_v_sampling as usize),
            self.width(),
            self.height(),
        ))
    }
}

/// Decode a baseline JPEG with default options.
pub fn decode(data: &[u8]) -> Result<DecodedImage> {
    decode_with(data, &DecoderOptions::default())
}

/// Decode a baseline JPEG.
pub fn decode_with(data: &[u8], options: &DecoderOptions) -> Result<DecodedImage> {
    Decoder::new(data, options.clone()).decode()
}

/// Read `source` to the end and decode it with default options.
pub fn decode_reader<R: Read>(mut source: R) -> Result<DecodedImage> {
    let mut data = Vec::new();
    source.read_to_end(&mut data)?;
    decode(&data)
}

/// Decoding state for one image: tables, frame header and coefficient grids.
///
/// Consumed by [`Decoder::decode`]; nothing escapes on failure.
pub struct Decoder<'a> {
    data: &'a [u8],
    parser: MarkerParser<'a>,
    options: DecoderOptions,
    /// Quantization tables, indexed by table ID (0–3).
    quant: [Option<QuantTable>; 4],
    /// Huffman decode tables, indexed by table ID (0–3).
    dc_tables: [Option<HuffmanTable>; 4],
    ac_tables: [Option<HuffmanTable>; 4],
    frame: Option<FrameHeader>,
    restart_interval: u16,
    /// Dequantized coefficients, one grid per frame component.
    grids: Vec<DctGrid>,
    /// Whether each frame component has appeared in a scan.
    scanned: Vec<bool>,
    app_segments: Vec<AppSegment>,
    comments: Vec<Vec<u8>>,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8], options: DecoderOptions) -> Self {
        Self {
            data,
            parser: MarkerParser::new(data),
            options,
            quant: Default::default(),
            dc_tables: Default::default(),
            ac_tables: Default::default(),
            frame: None,
            restart_interval: 0,
            grids: Vec::new(),
            scanned: Vec::new(),
            app_segments: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Run the decode to EOI and reconstruct the planes.
    pub fn decode(mut self) -> Result<DecodedImage> {
        loop {
            let segment = self.parser.next_segment()?;
            let result = match segment.marker {
                EOI => return self.finish().map_err(|e| e.at(EOI, segment.offset)),
                SOS => self.decode_scan(&segment),
                _ => self.handle_segment(&segment),
            };
            result.map_err(|e| e.at(segment.marker, segment.offset))?;
        }
    }

    fn handle_segment(&mut self, segment: &Segment) -> Result<()> {
        match segment.marker {
            SOI => {}
            DQT => {
                for (id, table) in parse_dqt(segment.body)? {
                    debug!("quantization table {id}");
                    self.quant[id as usize] = Some(table);
                }
            }
            DHT => {
                for spec in parse_dht(segment.body)? {
                    debug!("{} Huffman table {}, {} codes", spec.class, spec.id, spec.code_count());
                    let table = HuffmanTable::build(&spec)?;
                    match spec.class {
                        TableClass::Dc => self.dc_tables[spec.id as usize] = Some(table),
                        TableClass::Ac => self.ac_tables[spec.id as usize] = Some(table),
                    }
                }
            }
            SOF0 => self.start_frame(parse_sof(segment.body)?)?,
            DRI => {
                self.restart_interval = parse_dri(segment.body)?;
                debug!("restart interval {}", self.restart_interval);
            }
            COM => self.comments.push(segment.body.to_vec()),
            m if is_app(m) => self.app_segments.push(AppSegment {
                index: m - APP0,
                data: segment.body.to_vec(),
            }),
            // DNL, JPGn and reserved segments carry nothing baseline decoding needs.
            _ => {}
        }
        Ok(())
    }

    fn start_frame(&mut self, frame: FrameHeader) -> Result<()> {
        if frame.pixel_count() > self.options.max_pixels {
            return Err(JpegError::TooLarge {
                width: frame.width,
                height: frame.height,
                limit: self.options.max_pixels,
            });
        }
        debug!(
            "frame {}x{}, {} component(s), {}x{} MCUs of {}x{} pixels",
            frame.width,
            frame.height,
            frame.components.len(),
            frame.mcus_wide,
            frame.mcus_tall,
            frame.mcu_width,
            frame.mcu_height
        );

        self.grids = (0..frame.components.len())
            .map(|c| DctGrid::new(frame.blocks_wide(c), frame.blocks_tall(c)))
            .collect();
        self.scanned = vec![false; frame.components.len()];
        self.frame = Some(frame);
        Ok(())
    }

    fn decode_scan(&mut self, segment: &Segment) -> Result<()> {
        let frame = self.frame.as_ref().ok_or(JpegError::UnexpectedMarker(SOS))?;
        let scan = parse_sos(segment.body, frame)?;

        let mut tables = Vec::with_capacity(scan.components.len());
        for sc in &scan.components {
            let dc = self.dc_tables[sc.dc_table as usize].as_ref().ok_or(
                JpegError::MissingHuffmanTable {
                    class: TableClass::Dc,
                    id: sc.dc_table,
                },
            )?;
            let ac = self.ac_tables[sc.ac_table as usize].as_ref().ok_or(
                JpegError::MissingHuffmanTable {
                    class: TableClass::Ac,
                    id: sc.ac_table,
                },
            )?;
            let qt_id = frame.components[sc.comp_idx].quant_table_id;
            let quant = self.quant[qt_id as usize]
                .as_ref()
                .ok_or(JpegError::MissingQuantTable(qt_id))?;
            tables.push(ComponentTables { dc, ac, quant });
        }

        debug!(
            "scan of component(s) {:?} at offset {}",
            scan.components
                .iter()
                .map(|sc| frame.components[sc.comp_idx].id)
                .collect::<Vec<_>>(),
            self.parser.position()
        );

        let mut reader = BitReader::new(self.data, self.parser.position());
        decode_scan(&mut reader, frame, &scan, &tables, self.restart_interval, &mut self.grids)?;
        let next_marker = reader.finish()?;

        for sc in &scan.components {
            self.scanned[sc.comp_idx] = true;
        }
        self.parser.resume_at(next_marker);
        Ok(())
    }

    fn finish(self) -> Result<DecodedImage> {
        let frame = self.frame.ok_or(JpegError::UnexpectedMarker(EOI))?;
        if let Some(c) = self.scanned.iter().position(|&s| !s) {
            return Err(JpegError::MissingComponentData(frame.components[c].id));
        }

        let planes = self
            .grids
            .iter()
            .enumerate()
            .map(|(c, grid)| {
                reconstruct_plane(grid, frame.component_width(c), frame.component_height(c))
            })
            .collect();

        Ok(DecodedImage {
            frame,
            planes,
            app_segments: self.app_segments,
            comments: self.comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::encode::Encoder;
    use crate::jpeg::error::ErrorKind;

    #[test]
    fn grayscale_encode_then_decode() {
        let mut plane = Plane::new(19, 11, 0);
        for y in 0..11 {
            for x in 0..19 {
                plane.samples[y * 19 + x] = (x * 6 + y * 9) as u8;
            }
        }
        let bytes = Encoder::new(95).encode(&[plane.clone()]).unwrap();
        let image = decode(&bytes).unwrap();
        assert_eq!((image.width(), image.height()), (19, 11));
        assert_eq!(image.planes.len(), 1);
        let out = &image.planes[0];
        assert_eq!((out.width, out.height), (19, 11));
        let max_err = plane
            .samples
            .iter()
            .zip(&out.samples)
            .map(|(a, b)| a.abs_diff(*b))
            .max()
            .unwrap();
        assert!(max_err <= 8, "max error {max_err}");
    }

    #[test]
    fn pixel_limit() {
        let bytes = Encoder::new(50).encode(&[Plane::new(64, 64, 10)]).unwrap();
        let options = DecoderOptions { max_pixels: 4095 };
        let err = decode_with(&bytes, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
        assert_eq!(err.marker(), Some(SOF0));
        assert!(decode_with(&bytes, &DecoderOptions { max_pixels: 4096 }).is_ok());
    }

    #[test]
    fn reader_source() {
        let bytes = Encoder::new(50).encode(&[Plane::new(8, 8, 77)]).unwrap();
        let image = decode_reader(std::io::Cursor::new(bytes.clone())).unwrap();
        assert!(image.planes[0].samples.iter().all(|&s| s.abs_diff(77) <= 1));

        let err = decode_reader(&bytes[..bytes.len() - 2]).unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn upsampled_chroma() {
        let y = Plane::new(17, 9, 100);
        let c = Plane::new(9, 5, 60);
        let bytes = Encoder::new(90)
            .subsampling(encode::Subsampling::S420)
            .encode(&[y, c.clone(), c])
            .unwrap();
        let image = decode(&bytes).unwrap();
        assert_eq!((image.planes[1].width, image.planes[1].height), (9, 5));
        let up = image.upsampled(1).unwrap();
        assert_eq!((up.width, up.height), (17, 9));
        assert!(up.samples.iter().all(|&s| s.abs_diff(60) <= 2));
        assert!(image.upsampled(3).is_none());
    }
}
