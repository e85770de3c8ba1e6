// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Quantization and Huffman table parsing/serialization.
//!
//! Handles DQT (Define Quantization Table) and DHT (Define Huffman Table)
//! marker segments. Supports both 8-bit and 16-bit quantization precision
//! and multiple tables per marker segment.

use std::fmt;

use super::dct::QuantTable;
use super::error::{JpegError, Result};
use super::marker::{DHT, DQT};

/// Huffman table class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableClass {
    Dc,
    Ac,
}

impl TableClass {
    /// Class from the Tc nibble of a DHT table header.
    pub fn from_nibble(tc: u8) -> Option<Self> {
        match tc {
            0 => Some(Self::Dc),
            1 => Some(Self::Ac),
            _ => None,
        }
    }

    pub fn nibble(self) -> u8 {
        match self {
            Self::Dc => 0,
            Self::Ac => 1,
        }
    }
}

impl fmt::Display for TableClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dc => "DC",
            Self::Ac => "AC",
        })
    }
}

/// Parse a DQT marker segment body (after the 2-byte length).
///
/// Returns a list of (table_id, QuantTable) pairs. A single DQT segment
/// can contain multiple tables. Values stay in zigzag order.
pub fn parse_dqt(data: &[u8]) -> Result<Vec<(u8, QuantTable)>> {
    let mut tables = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let pq_tq = data[pos];
        pos += 1;
        let precision = pq_tq >> 4;
        let table_id = pq_tq & 0x0F;

        let width = match precision {
            0 => 1,
            1 => 2,
            _ => return Err(JpegError::InvalidMarkerData("invalid DQT precision")),
        };
        if table_id > 3 {
            return Err(JpegError::InvalidQuantTableId(table_id));
        }
        let body = data
            .get(pos..pos + 64 * width)
            .ok_or(JpegError::InvalidMarkerData("truncated DQT table"))?;
        pos += 64 * width;

        let mut values = [0u16; 64];
        for (zi, v) in values.iter_mut().enumerate() {
            *v = if width == 1 {
                body[zi] as u16
            } else {
                u16::from_be_bytes([body[zi * 2], body[zi * 2 + 1]])
            };
        }
        if values.contains(&0) {
            return Err(JpegError::InvalidMarkerData("zero quantization value"));
        }

        tables.push((table_id, QuantTable::new(values)));
    }

    Ok(tables)
}

/// Write a DQT marker segment (including 0xFFDB marker and length).
pub fn write_dqt(table_id: u8, qt: &QuantTable) -> Vec<u8> {
    let precision = if qt.is_8bit() { 0u8 } else { 1u8 };
    let length = 2 + 1 + 64 * (precision as usize + 1);

    let mut out = Vec::with_capacity(length + 2);
    out.extend_from_slice(&[0xFF, DQT]);
    out.extend_from_slice(&(length as u16).to_be_bytes());
    out.push((precision << 4) | (table_id & 0x0F));
    for &v in &qt.values {
        if precision == 0 {
            out.push(v as u8);
        } else {
            out.extend_from_slice(&v.to_be_bytes());
        }
    }
    out
}

/// Parsed Huffman table specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanSpec {
    pub class: TableClass,
    /// Table ID (0–3).
    pub id: u8,
    /// Number of codes of each length (1–16).
    pub bits: [u8; 16],
    /// Symbol values in order of increasing code length.
    pub huffval: Vec<u8>,
}

impl HuffmanSpec {
    /// Total number of codes described by `bits`.
    pub fn code_count(&self) -> usize {
        self.bits.iter().map(|&b| b as usize).sum()
    }
}

/// Parse a DHT marker segment body (after the 2-byte length).
///
/// Returns a list of HuffmanSpec. A single DHT segment can contain multiple tables.
pub fn parse_dht(data: &[u8]) -> Result<Vec<HuffmanSpec>> {
    let mut specs = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let tc_th = data[pos];
        pos += 1;
        let id = tc_th & 0x0F;
        let class = match TableClass::from_nibble(tc_th >> 4) {
            Some(class) if id <= 3 => class,
            _ => return Err(JpegError::InvalidHuffmanTableId(tc_th)),
        };

        let counts = data
            .get(pos..pos + 16)
            .ok_or(JpegError::InvalidMarkerData("truncated DHT code counts"))?;
        let mut bits = [0u8; 16];
        bits.copy_from_slice(counts);
        pos += 16;

        let total: usize = bits.iter().map(|&b| b as usize).sum();
        if total > 256 {
            return Err(JpegError::InvalidHuffmanTable("more than 256 codes"));
        }
        let huffval = data
            .get(pos..pos + total)
            .ok_or(JpegError::InvalidHuffmanTable("fewer symbols than code counts"))?
            .to_vec();
        pos += total;

        specs.push(HuffmanSpec {
            class,
            id,
            bits,
            huffval,
        });
    }

    Ok(specs)
}

/// Write a DHT marker segment (including 0xFFC4 marker and length).
pub fn write_dht(spec: &HuffmanSpec) -> Vec<u8> {
    let length = 2 + 1 + 16 + spec.huffval.len();

    let mut out = Vec::with_capacity(length + 2);
    out.extend_from_slice(&[0xFF, DHT]);
    out.extend_from_slice(&(length as u16).to_be_bytes());
    out.push((spec.class.nibble() << 4) | (spec.id & 0x0F));
    out.extend_from_slice(&spec.bits);
    out.extend_from_slice(&spec.huffval);
    out
}
