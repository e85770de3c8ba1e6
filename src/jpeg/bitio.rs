// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Bit-level I/O for JPEG entropy-coded data.
//!
//! Provides [`BitReader`] for decoding and [`BitWriter`] for encoding the
//! entropy-coded scan data. Both handle JPEG byte-stuffing (0xFF -> 0xFF 0x00)
//! and operate in MSB-first bit order.

use log::warn;

use super::error::{JpegError, Result};
use super::marker::{is_restart, skip_scan_data};

/// Bit-level reader for JPEG entropy-coded data.
///
/// Handles JPEG byte-stuffing (0xFF00 → 0xFF) and marker detection.
/// Bits are read MSB-first from a 32-bit internal buffer.
///
/// When a marker (or the end of the data) is reached, the marker is held
/// back for the marker parser and the buffer is topped up with 1-bits so
/// that table lookups can peek past the last real bit. Consuming any of
/// those padding bits fails with [`JpegError::UnexpectedEof`].
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Bit buffer. Valid bits are the low `bits_left` bits, MSB first.
    buf: u32,
    bits_left: u8,
    /// How many of the low `bits_left` bits are padding, not stream data.
    padding: u8,
    /// Marker code found in the stream and the offset of its 0xFF byte.
    marker: Option<(u8, usize)>,
    /// The data slice ran out without a marker.
    exhausted: bool,
}

impl<'a> BitReader<'a> {
    /// Create a new BitReader over the given byte slice.
    /// `pos` should point to the first byte of entropy-coded data (after SOS header).
    pub fn new(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos,
            buf: 0,
            bits_left: 0,
            padding: 0,
            marker: None,
            exhausted: false,
        }
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<u16> {
        self.read_bits(1)
    }

    /// Read `count` bits (1–16) and return them right-aligned.
    pub fn read_bits(&mut self, count: u8) -> Result<u16> {
        let val = self.peek_bits(count);
        self.skip_bits(count)?;
        Ok(val)
    }

    /// Peek at the top `count` bits (1–16) without consuming them.
    ///
    /// Never fails: past the end of the entropy-coded segment the result is
    /// filled with 1-bits.
    pub fn peek_bits(&mut self, count: u8) -> u16 {
        debug_assert!((1..=16).contains(&count));
        while self.bits_left < count {
            self.fill_byte();
        }
        ((self.buf >> (self.bits_left - count)) & ((1u32 << count) - 1)) as u16
    }

    /// Discard `count` bits that have already been peeked.
    pub fn skip_bits(&mut self, count: u8) -> Result<()> {
        debug_assert!(count <= self.bits_left);
        if count > self.bits_left - self.padding {
            return Err(JpegError::UnexpectedEof);
        }
        self.bits_left -= count;
        Ok(())
    }

    /// Align to the next byte boundary by discarding the unread bits of the
    /// current byte.
    pub fn align(&mut self) {
        let partial = (self.bits_left - self.padding) % 8;
        self.bits_left -= partial;
    }

    /// The next raw byte that has not yet been pulled into the bit buffer.
    pub fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Current byte position in the underlying data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the marker byte if a marker was encountered during reading.
    pub fn marker_found(&self) -> Option<u8> {
        self.marker.map(|(m, _)| m)
    }

    /// The entropy-coded segment has ended at the current byte boundary:
    /// no buffered data is left and either the input ran out or the next
    /// marker is not an RST.
    pub fn at_end(&self) -> bool {
        if self.bits_left > self.padding {
            return false;
        }
        if let Some((m, _)) = self.marker {
            return !is_restart(m);
        }
        if self.exhausted {
            return true;
        }
        let mut pos = self.pos;
        while self.data.get(pos) == Some(&0xFF) {
            pos += 1;
        }
        match self.data.get(pos) {
            None => true,
            Some(_) if pos == self.pos => false,
            Some(&code) => code != 0x00 && !is_restart(code),
        }
    }

    /// Consume a restart marker (0xFFD0–0xFFD7) at the current byte boundary.
    ///
    /// The marker may already have been reached while filling the bit buffer,
    /// or may be the next thing in the stream (possibly after 0xFF fill
    /// bytes). Returns the marker's low 3 bits, or `None` if entropy-coded
    /// data or some other marker comes first. Resets the bit buffer.
    pub fn take_restart_marker(&mut self) -> Option<u8> {
        self.align();
        if self.bits_left > self.padding {
            return None;
        }
        self.buf = 0;
        self.bits_left = 0;
        self.padding = 0;

        if let Some((m, _)) = self.marker {
            if is_restart(m) {
                self.marker = None;
                return Some(m & 0x07);
            }
            return None;
        }

        if self.peek_byte() != Some(0xFF) {
            return None;
        }
        let mut pos = self.pos;
        while pos < self.data.len() && self.data[pos] == 0xFF {
            pos += 1;
        }
        match self.data.get(pos) {
            Some(&m) if is_restart(m) => {
                self.pos = pos + 1;
                Some(m & 0x07)
            }
            _ => None,
        }
    }

    /// Finish the entropy-coded segment and return the byte offset of the
    /// marker that terminates it.
    ///
    /// Unread entropy bytes and stray restart markers before that marker are
    /// skipped with a warning.
    pub fn finish(self) -> Result<usize> {
        let buffered = (self.bits_left - self.padding) / 8;
        match self.marker {
            Some((m, offset)) if !is_restart(m) => {
                if buffered > 0 {
                    warn!("{buffered} unread byte(s) at end of scan data");
                }
                Ok(offset)
            }
            _ if self.exhausted => Err(JpegError::UnexpectedEof),
            _ => {
                let offset = skip_scan_data(self.data, self.pos)?;
                if buffered > 0 || offset > self.pos || self.marker.is_some() {
                    warn!(
                        "skipped {} byte(s) of trailing scan data before offset {offset}",
                        offset - self.pos + buffered as usize
                    );
                }
                Ok(offset)
            }
        }
    }

    fn fill_byte(&mut self) {
        if self.marker.is_some() || self.exhausted {
            self.push_padding();
            return;
        }
        let Some(&byte) = self.data.get(self.pos) else {
            self.exhausted = true;
            self.push_padding();
            return;
        };

        if byte == 0xFF {
            // Skip fill bytes to find the byte that decides stuffing vs marker.
            let mut next_pos = self.pos + 1;
            while next_pos < self.data.len() && self.data[next_pos] == 0xFF {
                next_pos += 1;
            }
            match self.data.get(next_pos) {
                None => {
                    self.pos = self.data.len();
                    self.exhausted = true;
                    self.push_padding();
                    return;
                }
                Some(0x00) => {
                    // Byte-stuffed 0xFF
                    self.pos = next_pos + 1;
                }
                Some(&code) => {
                    self.marker = Some((code, next_pos - 1));
                    self.pos = next_pos + 1;
                    self.push_padding();
                    return;
                }
            }
        } else {
            self.pos += 1;
        }

        self.buf = (self.buf << 8) | (byte as u32);
        self.bits_left += 8;
    }

    fn push_padding(&mut self) {
        self.buf = (self.buf << 8) | 0xFF;
        self.bits_left += 8;
        self.padding += 8;
    }
}

/// Bit-level writer for JPEG entropy-coded data.
///
/// Handles byte-stuffing (0xFF → 0xFF 0x00). MSB-first bit order.
pub struct BitWriter {
    output: Vec<u8>,
    acc: u32,
    bits_used: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            output: Vec::new(),
            acc: 0,
            bits_used: 0,
        }
    }

    /// Write `count` bits (0–16) from the low bits of `value`.
    pub fn write_bits(&mut self, value: u16, count: u8) {
        debug_assert!(count <= 16);
        if count == 0 {
            return;
        }
        let masked = (value as u32) & ((1u32 << count) - 1);
        self.acc = (self.acc << count) | masked;
        self.bits_used += count;
        while self.bits_used >= 8 {
            self.bits_used -= 8;
            let byte = (self.acc >> self.bits_used) as u8;
            self.emit_byte(byte);
        }
        self.acc &= (1u32 << self.bits_used) - 1;
    }

    /// Pad to a byte boundary with 1-bits and emit restart marker RST`index`.
    pub fn restart(&mut self, index: u8) {
        self.pad();
        self.output.push(0xFF);
        self.output.push(0xD0 | (index & 0x07));
    }

    /// Pad remaining bits with 1s and return the bytes.
    pub fn flush(mut self) -> Vec<u8> {
        self.pad();
        self.output
    }

    fn pad(&mut self) {
        if self.bits_used > 0 {
            let remaining = 8 - self.bits_used;
            self.write_bits((1u16 << remaining) - 1, remaining);
        }
    }

    fn emit_byte(&mut self, byte: u8) {
        self.output.push(byte);
        if byte == 0xFF {
            self.output.push(0x00); // Byte-stuffing
        }
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_basic_bits() {
        // 0xA5 = 1010_0101
        let data = [0xA5];
        let mut r = BitReader::new(&data, 0);
        assert_eq!(r.read_bits(4).unwrap(), 0b1010);
        assert_eq!(r.read_bit().unwrap(), 0);
        assert_eq!(r.read_bits(3).unwrap(), 0b101);
    }

    #[test]
    fn read_cross_byte_with_stuffing() {
        // 0xFF00 0x80 → after de-stuffing: 0xFF, 0x80
        let data = [0xFF, 0x00, 0x80];
        let mut r = BitReader::new(&data, 0);
        assert_eq!(r.read_bits(12).unwrap(), 0xFF8);
        assert_eq!(r.position(), 3);
    }

    #[test]
    fn marker_is_pushed_back() {
        // 0xFF 0xD9 is a marker (EOI), not byte-stuffed data
        let data = [0xAB, 0xFF, 0xD9];
        let mut r = BitReader::new(&data, 0);
        assert_eq!(r.read_bits(8).unwrap(), 0xAB);
        // Peeking past the last data byte sees padding, not the marker bytes.
        assert_eq!(r.peek_bits(8), 0xFF);
        assert_eq!(r.marker_found(), Some(0xD9));
        assert_eq!(r.read_bits(1), Err(JpegError::UnexpectedEof));
        assert_eq!(r.finish().unwrap(), 1);
    }

    #[test]
    fn end_of_data_is_end_of_stream() {
        let data = [0x0F];
        let mut r = BitReader::new(&data, 0);
        assert_eq!(r.peek_bits(16), 0x0FFF);
        assert_eq!(r.read_bits(8).unwrap(), 0x0F);
        assert_eq!(r.read_bit(), Err(JpegError::UnexpectedEof));
        assert_eq!(r.finish(), Err(JpegError::UnexpectedEof));
    }

    #[test]
    fn peek_then_skip() {
        let data = [0xA5]; // 1010_0101
        let mut r = BitReader::new(&data, 0);
        assert_eq!(r.peek_bits(4), 0b1010);
        r.skip_bits(4).unwrap();
        assert_eq!(r.read_bits(4).unwrap(), 0b0101);
    }

    #[test]
    fn restart_marker_after_partial_byte() {
        // 3 data bits, 5 padding 1-bits, RST3, then a fresh byte.
        let data = [0b101_11111, 0xFF, 0xD3, 0x80, 0xFF, 0xD9];
        let mut r = BitReader::new(&data, 0);
        assert_eq!(r.read_bits(3).unwrap(), 0b101);
        assert_eq!(r.take_restart_marker(), Some(3));
        assert_eq!(r.read_bit().unwrap(), 1);
        assert_eq!(r.finish().unwrap(), 4);
    }

    #[test]
    fn restart_marker_already_buffered() {
        // Peeking 16 bits runs into the RST marker before it is requested.
        let data = [0x00, 0xFF, 0xD0, 0x00];
        let mut r = BitReader::new(&data, 0);
        assert_eq!(r.peek_bits(16), 0x00FF);
        r.skip_bits(8).unwrap();
        assert_eq!(r.take_restart_marker(), Some(0));
        assert_eq!(r.read_bits(8).unwrap(), 0x00);
    }

    #[test]
    fn restart_marker_missing() {
        let data = [0x00, 0x12, 0xFF, 0xD0];
        let mut r = BitReader::new(&data, 0);
        r.read_bits(8).unwrap();
        assert_eq!(r.peek_byte(), Some(0x12));
        assert_eq!(r.take_restart_marker(), None);
    }

    #[test]
    fn end_of_segment_at_byte_boundary() {
        // Entropy byte, then EOI: the segment ends after the byte.
        let data = [0x55, 0xFF, 0xD9];
        let mut r = BitReader::new(&data, 0);
        assert!(!r.at_end());
        r.read_bits(8).unwrap();
        assert!(r.at_end());

        // More entropy data follows: not the end.
        let data = [0x55, 0xFF, 0x00, 0x12];
        let mut r = BitReader::new(&data, 0);
        r.read_bits(8).unwrap();
        assert!(!r.at_end());

        // A pending RST is not the end either.
        let data = [0x55, 0xFF, 0xD0, 0x12];
        let mut r = BitReader::new(&data, 0);
        r.read_bits(4).unwrap();
        r.align();
        assert!(!r.at_end());

        let data = [0x55];
        let mut r = BitReader::new(&data, 0);
        r.read_bits(8).unwrap();
        assert!(r.at_end());
    }

    #[test]
    fn fill_bytes_before_marker() {
        let data = [0x55, 0xFF, 0xFF, 0xFF, 0xD9];
        let mut r = BitReader::new(&data, 0);
        assert_eq!(r.read_bits(8).unwrap(), 0x55);
        let _ = r.peek_bits(8);
        assert_eq!(r.marker_found(), Some(0xD9));
        assert_eq!(r.finish().unwrap(), 3);
    }

    #[test]
    fn write_basic() {
        let mut w = BitWriter::new();
        w.write_bits(0b1010, 4);
        w.write_bits(0b0101, 4);
        assert_eq!(w.flush(), vec![0xA5]);
    }

    #[test]
    fn write_byte_stuffing() {
        let mut w = BitWriter::new();
        w.write_bits(0xFF, 8);
        assert_eq!(w.flush(), vec![0xFF, 0x00]);
    }

    #[test]
    fn write_padding() {
        let mut w = BitWriter::new();
        w.write_bits(0b110, 3);
        // Should pad with 1s: 110_11111 = 0xDF
        assert_eq!(w.flush(), vec![0xDF]);
    }

    #[test]
    fn write_restart_marker() {
        let mut w = BitWriter::new();
        w.write_bits(0b0, 1);
        w.restart(9);
        w.write_bits(0xA5, 8);
        assert_eq!(w.flush(), vec![0x7F, 0xFF, 0xD1, 0xA5]);
    }

    #[test]
    fn writer_output_reads_back() {
        let mut w = BitWriter::new();
        w.write_bits(0b1111_1111_1000, 12);
        w.write_bits(0x1234, 16);
        let out = w.flush();
        let mut r = BitReader::new(&out, 0);
        assert_eq!(r.read_bits(12).unwrap(), 0xFF8);
        assert_eq!(r.read_bits(16).unwrap(), 0x1234);
    }
}
