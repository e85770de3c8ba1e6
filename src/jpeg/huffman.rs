// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Huffman coding tables for JPEG entropy decoding and encoding.
//!
//! Codes are assigned canonically per ITU-T T.81 Annex C: in increasing
//! numeric order, shortest lengths first. Decoding uses an 8-bit lookup
//! table for short codes and the Annex F.2.2.3 `MAXCODE`/`VALPTR` procedure
//! for the rest.

use super::bitio::BitReader;
use super::error::{JpegError, Result};
use super::tables::HuffmanSpec;

/// Number of bits resolved by the fast lookup table.
const LOOKUP_BITS: u8 = 8;

/// Expand `bits`/`huffval` into canonical `(code, length, symbol)` triples.
///
/// Fails when the symbol list does not match the counts or when the codes
/// of some length overflow their `2^length` code space.
pub fn canonical_codes(bits: &[u8; 16], huffval: &[u8]) -> Result<Vec<(u16, u8, u8)>> {
    let total: usize = bits.iter().map(|&b| b as usize).sum();
    if total != huffval.len() {
        return Err(JpegError::InvalidHuffmanTable("symbol count does not match code counts"));
    }

    let mut codes = Vec::with_capacity(total);
    let mut code: u32 = 0;
    let mut symbols = huffval.iter();

    for length in 1..=16u8 {
        let count = bits[(length - 1) as usize] as u32;
        if code + count > (1u32 << length) {
            return Err(JpegError::InvalidHuffmanTable("code lengths overflow the code space"));
        }
        for _ in 0..count {
            // Length checked against the symbol total above.
            let Some(&symbol) = symbols.next() else {
                return Err(JpegError::InvalidHuffmanTable("too few symbols"));
            };
            codes.push((code as u16, length, symbol));
            code += 1;
        }
        code <<= 1;
    }

    Ok(codes)
}

/// Huffman decode table.
///
/// Level 1: 8-bit lookup indexed by the next 8 bits of the stream.
/// Level 2: per-length `maxcode`/`mincode`/`valptr` for longer codes.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    /// Indexed by the next 8 bits: (symbol, code_length). Length 0 means
    /// the code is longer than 8 bits (or invalid).
    lookup: [(u8, u8); 256],
    /// Largest code of each length 1..=16 (index 0 unused), -1 if none.
    maxcode: [i32; 17],
    /// Smallest code of each length.
    mincode: [i32; 17],
    /// Index into `huffval` of the first symbol of each length.
    valptr: [usize; 17],
    huffval: Vec<u8>,
}

impl HuffmanTable {
    /// Build the decode table for a DHT specification.
    pub fn build(spec: &HuffmanSpec) -> Result<Self> {
        let codes = canonical_codes(&spec.bits, &spec.huffval)?;

        let mut lookup = [(0u8, 0u8); 256];
        let mut maxcode = [-1i32; 17];
        let mut mincode = [0i32; 17];
        let mut valptr = [0usize; 17];

        for (k, &(code, length, symbol)) in codes.iter().enumerate() {
            let l = length as usize;
            if maxcode[l] < 0 {
                mincode[l] = code as i32;
                valptr[l] = k;
            }
            maxcode[l] = code as i32;

            if length <= LOOKUP_BITS {
                // The code left-aligned to 8 bits covers 2^(8-length) entries.
                let shift = LOOKUP_BITS - length;
                let base = (code as usize) << shift;
                for entry in &mut lookup[base..base + (1 << shift)] {
                    *entry = (symbol, length);
                }
            }
        }

        Ok(Self {
            lookup,
            maxcode,
            mincode,
            valptr,
            huffval: spec.huffval.clone(),
        })
    }

    /// Decode one Huffman symbol from the bit stream.
    pub fn decode(&self, reader: &mut BitReader) -> Result<u8> {
        let peek = reader.peek_bits(LOOKUP_BITS);
        let (symbol, length) = self.lookup[peek as usize];
        if length > 0 {
            reader.skip_bits(length)?;
            return Ok(symbol);
        }

        // F.2.2.3: extend the code one bit at a time past the lookup width.
        let mut code = reader.read_bits(LOOKUP_BITS)? as i32;
        for length in (LOOKUP_BITS as usize + 1)..=16 {
            code = (code << 1) | reader.read_bit()? as i32;
            if code <= self.maxcode[length] {
                let idx = self.valptr[length] + (code - self.mincode[length]) as usize;
                return Ok(self.huffval[idx]);
            }
        }
        Err(JpegError::HuffmanDecode)
    }
}

/// Huffman encode table: maps symbol → (code_bits, code_length).
#[derive(Debug, Clone)]
pub struct HuffmanEncodeTable {
    /// For each of the 256 possible symbols: (code, length).
    /// Length 0 means the symbol is not in the table.
    table: [(u16, u8); 256],
}

impl HuffmanEncodeTable {
    pub fn build(spec: &HuffmanSpec) -> Result<Self> {
        let mut table = [(0u16, 0u8); 256];
        for (code, length, symbol) in canonical_codes(&spec.bits, &spec.huffval)? {
            table[symbol as usize] = (code, length);
        }
        Ok(Self { table })
    }

    /// Encode a symbol: returns (code_bits, code_length).
    /// Returns `Err` if the symbol has no code in this table.
    pub fn encode(&self, symbol: u8) -> Result<(u16, u8)> {
        match self.table[symbol as usize] {
            (_, 0) => Err(JpegError::InvalidHuffmanTable("no code for symbol")),
            entry => Ok(entry),
        }
    }
}

/// Extend a signed value from its JPEG "additional bits" representation.
///
/// Per ITU-T T.81 Table F.1: if the high bit is 0, the value is negative.
pub fn extend_sign(value: u16, size: u8) -> i32 {
    if size == 0 {
        return 0;
    }
    let value = value as i32;
    if value < 1 << (size - 1) {
        value - (1 << size) + 1
    } else {
        value
    }
}

/// Encode a signed value into JPEG "additional bits" representation.
/// Returns (magnitude_bits, category/size).
pub fn encode_value(value: i32) -> (u16, u8) {
    if value == 0 {
        return (0, 0);
    }
    let size = (32 - value.unsigned_abs().leading_zeros()) as u8;
    // Negative values are sent as the one's complement of the magnitude.
    let bits = if value > 0 { value } else { value - 1 };
    ((bits as u32 & ((1u32 << size) - 1)) as u16, size)
}
