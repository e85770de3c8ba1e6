// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! JPEG marker parsing.
//!
//! [`MarkerParser`] walks the marker segments of a JPEG byte stream and
//! enforces the order baseline decoding needs: SOI first, tables and a
//! single SOF0 frame header, then one or more scans, then EOI. When it
//! returns an SOS segment, the caller decodes the entropy-coded data and
//! hands the offset of the terminating marker back via
//! [`MarkerParser::resume_at`].

use log::debug;

use super::error::{JpegError, Result};
use super::frame::FrameHeader;
use super::scan::{ScanComponent, ScanHeader};

/// JPEG marker constants.
pub const TEM: u8 = 0x01;
pub const SOF0: u8 = 0xC0;
pub const SOF2: u8 = 0xC2;
pub const DHT: u8 = 0xC4;
pub const DAC: u8 = 0xCC;
pub const RST0: u8 = 0xD0;
pub const SOI: u8 = 0xD8;
pub const EOI: u8 = 0xD9;
pub const SOS: u8 = 0xDA;
pub const DQT: u8 = 0xDB;
pub const DNL: u8 = 0xDC;
pub const DRI: u8 = 0xDD;
pub const APP0: u8 = 0xE0;
pub const COM: u8 = 0xFE;

/// Whether `marker` is one of RST0–RST7.
pub fn is_restart(marker: u8) -> bool {
    (RST0..=RST0 + 7).contains(&marker)
}

/// Whether `marker` is one of APP0–APP15.
pub fn is_app(marker: u8) -> bool {
    (APP0..=APP0 + 15).contains(&marker)
}

/// Frame and coding markers of non-baseline processes.
fn is_unsupported(marker: u8) -> bool {
    matches!(
        marker,
        0xC1 // SOF1 extended sequential
        | SOF2 // progressive
        | 0xC3 // SOF3 lossless
        | 0xC5..=0xC7 // SOF5-7 differential
        | 0xC9..=0xCB // SOF9-11 arithmetic
        | DAC // arithmetic conditioning
        | 0xCD..=0xCF // SOF13-15 differential arithmetic
    )
}

/// Human-readable marker name, e.g. `"DQT"`, `"SOF2"`, `"APP1"`.
pub fn marker_name(marker: u8) -> String {
    match marker {
        TEM => "TEM".into(),
        DHT => "DHT".into(),
        DAC => "DAC".into(),
        0xC8 => "JPG".into(),
        0xC0..=0xCF => format!("SOF{}", marker - SOF0),
        0xD0..=0xD7 => format!("RST{}", marker - RST0),
        SOI => "SOI".into(),
        EOI => "EOI".into(),
        SOS => "SOS".into(),
        DQT => "DQT".into(),
        DNL => "DNL".into(),
        DRI => "DRI".into(),
        0xDE => "DHP".into(),
        0xDF => "EXP".into(),
        0xE0..=0xEF => format!("APP{}", marker - APP0),
        0xF0..=0xFD => format!("JPG{}", marker - 0xF0),
        COM => "COM".into(),
        other => format!("0xFF{other:02X}"),
    }
}

/// Position of the parser in the stream structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Nothing read yet; SOI must come first.
    BeforeImage,
    /// After SOI, before the frame header.
    Tables,
    /// Frame header seen; tables and scans may follow.
    FrameReady,
    /// An SOS header was returned; entropy-coded data follows.
    InScan,
    /// EOI reached.
    Done,
}

/// One marker segment.
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    /// The marker byte (e.g., 0xDB for DQT). Does NOT include the 0xFF prefix.
    pub marker: u8,
    /// Byte offset of the marker (its 0xFF byte).
    pub offset: usize,
    /// Segment data NOT including the marker or the 2-byte length field.
    /// Empty for SOI and EOI.
    pub body: &'a [u8],
}

/// Marker state machine over a complete JPEG byte stream.
pub struct MarkerParser<'a> {
    data: &'a [u8],
    pos: usize,
    state: ParserState,
}

impl<'a> MarkerParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            state: ParserState::BeforeImage,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Byte offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Read the next marker segment.
    ///
    /// After an SOS segment the position is the first entropy-coded byte;
    /// call [`resume_at`](Self::resume_at) before reading further.
    pub fn next_segment(&mut self) -> Result<Segment<'a>> {
        match self.state {
            ParserState::BeforeImage => return self.read_soi(),
            ParserState::InScan => {
                return Err(JpegError::InvalidMarkerData("scan data not consumed"))
            }
            ParserState::Done => return Err(JpegError::UnexpectedMarker(EOI)),
            ParserState::Tables | ParserState::FrameReady => {}
        }

        loop {
            let (marker, offset) = self.read_marker()?;
            if marker == TEM {
                continue;
            }
            let segment = self.read_segment(marker, offset).map_err(|e| e.at(marker, offset))?;
            debug!(
                "{} at offset {offset}, {} byte(s)",
                marker_name(marker),
                segment.body.len()
            );
            return Ok(segment);
        }
    }

    /// Continue marker parsing at `offset` after a scan's entropy-coded data.
    pub fn resume_at(&mut self, offset: usize) {
        debug_assert_eq!(self.state, ParserState::InScan);
        self.pos = offset;
        self.state = ParserState::FrameReady;
    }

    fn read_soi(&mut self) -> Result<Segment<'a>> {
        if self.data.get(..2) != Some(&[0xFF, SOI][..]) {
            return Err(JpegError::MissingSoi);
        }
        self.pos = 2;
        self.state = ParserState::Tables;
        Ok(Segment {
            marker: SOI,
            offset: 0,
            body: &[],
        })
    }

    /// Read `0xFF` (fill bytes) and a marker code. Returns (code, offset of the last 0xFF).
    fn read_marker(&mut self) -> Result<(u8, usize)> {
        let data = self.data;
        match data.get(self.pos) {
            None => return Err(JpegError::UnexpectedEof),
            Some(0xFF) => {}
            Some(&other) => return Err(JpegError::ExpectedMarker(other)),
        }
        while self.pos + 1 < data.len() && data[self.pos + 1] == 0xFF {
            self.pos += 1;
        }
        let offset = self.pos;
        let marker = *data.get(offset + 1).ok_or(JpegError::UnexpectedEof)?;
        self.pos += 2;
        Ok((marker, offset))
    }

    fn read_segment(&mut self, marker: u8, offset: usize) -> Result<Segment<'a>> {
        match marker {
            0x00 => return Err(JpegError::ExpectedMarker(0x00)),
            SOI => return Err(JpegError::UnexpectedMarker(SOI)),
            m if is_restart(m) => return Err(JpegError::UnexpectedMarker(m)),
            m if is_unsupported(m) => return Err(JpegError::UnsupportedMarker(m)),
            EOI => {
                self.state = ParserState::Done;
                return Ok(Segment {
                    marker,
                    offset,
                    body: &[],
                });
            }
            SOF0 if self.state == ParserState::FrameReady => {
                return Err(JpegError::UnexpectedMarker(SOF0));
            }
            SOS if self.state == ParserState::Tables => {
                return Err(JpegError::UnexpectedMarker(SOS));
            }
            _ => {}
        }

        let data = self.data;
        let len_bytes = data
            .get(self.pos..self.pos + 2)
            .ok_or(JpegError::UnexpectedEof)?;
        let length = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        if length < 2 {
            return Err(JpegError::InvalidMarkerData("segment length below 2"));
        }
        let body = data
            .get(self.pos + 2..self.pos + length)
            .ok_or(JpegError::UnexpectedEof)?;
        self.pos += length;

        match marker {
            SOF0 => self.state = ParserState::FrameReady,
            SOS => self.state = ParserState::InScan,
            _ => {}
        }
        Ok(Segment { marker, offset, body })
    }
}

/// Parse an SOS (Start of Scan) header and check it against the frame.
pub fn parse_sos(data: &[u8], frame: &FrameHeader) -> Result<ScanHeader> {
    let Some(&count) = data.first() else {
        return Err(JpegError::InvalidMarkerData("empty SOS"));
    };
    let num_components = count as usize;
    if !(1..=4).contains(&num_components) {
        return Err(JpegError::InvalidMarkerData("SOS component count must be 1 to 4"));
    }
    if data.len() != 1 + num_components * 2 + 3 {
        return Err(JpegError::InvalidMarkerData("SOS length does not match component count"));
    }

    let mut components: Vec<ScanComponent> = Vec::with_capacity(num_components);
    for selector in data[1..1 + num_components * 2].chunks_exact(2) {
        let comp_idx = frame
            .component_index(selector[0])
            .ok_or(JpegError::UnknownComponentId(selector[0]))?;
        if components.iter().any(|c| c.comp_idx == comp_idx) {
            return Err(JpegError::InvalidMarkerData("duplicate component in SOS"));
        }
        let td_ta = selector[1];
        if td_ta >> 4 > 3 || td_ta & 0x0F > 3 {
            return Err(JpegError::InvalidHuffmanTableId(td_ta));
        }
        components.push(ScanComponent {
            comp_idx,
            dc_table: td_ta >> 4,
            ac_table: td_ta & 0x0F,
        });
    }

    let params = &data[1 + num_components * 2..];
    if params != [0, 63, 0] {
        return Err(JpegError::InvalidMarkerData(
            "baseline scan must cover coefficients 0 to 63 without approximation",
        ));
    }

    if num_components > 1 {
        let blocks_per_mcu: usize = components
            .iter()
            .map(|c| {
                let comp = &frame.components[c.comp_idx];
                comp.h_sampling as usize * comp.v_sampling as usize
            })
            .sum();
        if blocks_per_mcu > 10 {
            return Err(JpegError::InvalidMarkerData("more than 10 blocks per MCU"));
        }
    }

    Ok(ScanHeader { components })
}

/// Write an SOS marker segment (including 0xFFDA marker and length).
pub fn write_sos(scan: &ScanHeader, frame: &FrameHeader) -> Vec<u8> {
    let length = 2 + 1 + 2 * scan.components.len() + 3;
    let mut out = Vec::with_capacity(length + 2);
    out.extend_from_slice(&[0xFF, SOS]);
    out.extend_from_slice(&(length as u16).to_be_bytes());
    out.push(scan.components.len() as u8);
    for sc in &scan.components {
        out.push(frame.components[sc.comp_idx].id);
        out.push((sc.dc_table << 4) | sc.ac_table);
    }
    out.extend_from_slice(&[0, 63, 0]);
    out
}

/// Parse DRI (Define Restart Interval) marker data.
pub fn parse_dri(data: &[u8]) -> Result<u16> {
    match data {
        &[hi, lo] => Ok(u16::from_be_bytes([hi, lo])),
        _ => Err(JpegError::InvalidMarkerData("DRI length must be 4")),
    }
}

/// Write a DRI marker segment.
pub fn write_dri(interval: u16) -> Vec<u8> {
    let [hi, lo] = interval.to_be_bytes();
    vec![0xFF, DRI, 0x00, 0x04, hi, lo]
}

/// Skip past entropy-coded scan data to find the next marker.
///
/// Starting from `pos` (the first byte of entropy-coded data after an SOS header),
/// scans forward looking for a 0xFF byte followed by a non-zero, non-RST marker byte.
/// Returns the byte offset of the 0xFF byte of the next marker.
pub fn skip_scan_data(data: &[u8], mut pos: usize) -> Result<usize> {
    while pos < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        match data.get(pos + 1) {
            None => break,
            // Stuffed data byte or restart marker
            Some(&next) if next == 0x00 || is_restart(next) => pos += 2,
            // Fill byte
            Some(0xFF) => pos += 1,
            Some(_) => return Ok(pos),
        }
    }
    Err(JpegError::UnexpectedEof)
}
