// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! JPEG scan data encoding and decoding.
//!
//! Decodes entropy-coded scan data into dequantized [`DctGrid`]s (one per
//! frame component) and encodes quantized grids to entropy-coded bytes.
//! Handles interleaved MCU ordering, restart markers, and DC prediction.

use log::{trace, warn};

use super::bitio::{BitReader, BitWriter};
use super::dct::{DctGrid, QuantTable};
use super::error::{JpegError, Result};
use super::frame::FrameHeader;
use super::huffman::{encode_value, extend_sign, HuffmanEncodeTable, HuffmanTable};
use super::zigzag::ZIGZAG_TO_NATURAL;

/// Component selector for one scan component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanComponent {
    /// Index into FrameHeader.components.
    pub comp_idx: usize,
    /// DC Huffman table ID.
    pub dc_table: u8,
    /// AC Huffman table ID.
    pub ac_table: u8,
}

/// Parsed SOS header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHeader {
    /// Scan components in the order their blocks appear in each MCU.
    pub components: Vec<ScanComponent>,
}

impl ScanHeader {
    /// Whether the scan interleaves more than one component per MCU.
    pub fn is_interleaved(&self) -> bool {
        self.components.len() > 1
    }
}

/// Tables used to decode the blocks of one scan component.
#[derive(Clone, Copy)]
pub struct ComponentTables<'t> {
    pub dc: &'t HuffmanTable,
    pub ac: &'t HuffmanTable,
    pub quant: &'t QuantTable,
}

/// MCU grid of one scan.
struct McuLayout {
    per_row: usize,
    count: usize,
}

impl McuLayout {
    fn new(frame: &FrameHeader, scan: &ScanHeader) -> Self {
        if scan.is_interleaved() {
            Self {
                per_row: frame.mcus_wide,
                count: frame.mcus_wide * frame.mcus_tall,
            }
        } else {
            // One block per MCU, covering only the component's own blocks.
            let comp_idx = scan.components[0].comp_idx;
            let per_row = frame.scan_blocks_wide(comp_idx);
            Self {
                per_row,
                count: per_row * frame.scan_blocks_tall(comp_idx),
            }
        }
    }
}

/// Visit the blocks of MCU (`row`, `col`) in coding order as
/// (scan component index, block row, block column).
fn for_each_block<F>(frame: &FrameHeader, scan: &ScanHeader, row: usize, col: usize, mut f: F) -> Result<()>
where
    F: FnMut(usize, usize, usize) -> Result<()>,
{
    if !scan.is_interleaved() {
        return f(0, row, col);
    }
    for (si, sc) in scan.components.iter().enumerate() {
        let comp = &frame.components[sc.comp_idx];
        let (h_s, v_s) = (comp.h_sampling as usize, comp.v_sampling as usize);
        for v in 0..v_s {
            for h in 0..h_s {
                f(si, row * v_s + v, col * h_s + h)?;
            }
        }
    }
    Ok(())
}

/// Decode the entropy-coded data of one scan.
///
/// - `reader`: positioned at the first byte after the SOS header
/// - `tables`: one entry per scan component, in scan order
/// - `restart_interval`: MCUs between RST markers, 0 = no restarts
/// - `grids`: one grid per frame component, indexed like `frame.components`
///
/// Blocks are stored dequantized in natural order. The reader is left just
/// after the last MCU; use [`BitReader::finish`] to locate the next marker.
pub fn decode_scan(
    reader: &mut BitReader,
    frame: &FrameHeader,
    scan: &ScanHeader,
    tables: &[ComponentTables],
    restart_interval: u16,
    grids: &mut [DctGrid],
) -> Result<()> {
    debug_assert_eq!(tables.len(), scan.components.len());
    let layout = McuLayout::new(frame, scan);
    let interval = restart_interval as usize;
    let mut dc_pred = vec![0i32; scan.components.len()];
    let mut restarts = 0usize;

    for mcu in 0..layout.count {
        if interval > 0 && mcu > 0 && mcu % interval == 0 {
            let Some(n) = reader.take_restart_marker() else {
                if reader.at_end() {
                    return Err(JpegError::UnexpectedEof);
                }
                return Err(JpegError::MissingRestartMarker(mcu));
            };
            let expected = (restarts % 8) as u8;
            if n != expected {
                warn!("expected RST{expected}, found RST{n} before MCU {mcu}");
            }
            trace!("RST{n} before MCU {mcu}, resetting DC predictors");
            restarts += 1;
            dc_pred.fill(0);
        }

        let (row, col) = (mcu / layout.per_row, mcu % layout.per_row);
        for_each_block(frame, scan, row, col, |si, br, bc| {
            let grid = &mut grids[scan.components[si].comp_idx];
            decode_block(reader, &tables[si], &mut dc_pred[si], grid.block_mut(br, bc))
        })?;
    }

    Ok(())
}

/// Decode one block: DC difference, AC run/size pairs, dequantize into
/// natural order.
///
/// The DC predictor saturates at the i16 range, so on streams whose DC sum
/// leaves that range `DC = previous + diff` no longer holds exactly. This
/// bounds `dc * q` well inside i32.
fn decode_block(
    reader: &mut BitReader,
    tables: &ComponentTables,
    dc_pred: &mut i32,
    block: &mut [i32; 64],
) -> Result<()> {
    let q = &tables.quant.values;
    block.fill(0);

    let dc_size = tables.dc.decode(reader)?;
    if dc_size > 11 {
        return Err(JpegError::InvalidDcCategory(dc_size));
    }
    let diff = if dc_size > 0 {
        extend_sign(reader.read_bits(dc_size)?, dc_size)
    } else {
        0
    };
    *dc_pred = (*dc_pred + diff).clamp(i16::MIN as i32, i16::MAX as i32);
    block[0] = *dc_pred * q[0] as i32;

    let mut k = 1;
    while k < 64 {
        let rs = tables.ac.decode(reader)?;
        let run = (rs >> 4) as usize;
        let size = rs & 0x0F;

        if size == 0 {
            match rs {
                // EOB: remaining coefficients are zero
                0x00 => break,
                // ZRL: sixteen zeros
                0xF0 => {
                    k += 16;
                    if k > 64 {
                        return Err(JpegError::CoefficientOverflow(k - 1));
                    }
                    continue;
                }
                _ => return Err(JpegError::InvalidRunSize(rs)),
            }
        }
        if size > 10 {
            return Err(JpegError::InvalidRunSize(rs));
        }

        k += run;
        if k > 63 {
            return Err(JpegError::CoefficientOverflow(k));
        }
        let value = extend_sign(reader.read_bits(size)?, size);
        block[ZIGZAG_TO_NATURAL[k]] = value * q[k] as i32;
        k += 1;
    }

    Ok(())
}

/// Encode quantized grids to entropy-coded scan data.
///
/// `tables` holds the (DC, AC) encode tables of each scan component. Returns
/// the entropy-coded bytes including RST markers, without the SOS header.
pub fn encode_scan(
    frame: &FrameHeader,
    scan: &ScanHeader,
    tables: &[(&HuffmanEncodeTable, &HuffmanEncodeTable)],
    grids: &[DctGrid],
    restart_interval: u16,
) -> Result<Vec<u8>> {
    let layout = McuLayout::new(frame, scan);
    let interval = restart_interval as usize;
    let mut writer = BitWriter::new();
    let mut dc_pred = vec![0i32; scan.components.len()];
    let mut restarts = 0u8;

    for mcu in 0..layout.count {
        if interval > 0 && mcu > 0 && mcu % interval == 0 {
            writer.restart(restarts);
            restarts = (restarts + 1) % 8;
            dc_pred.fill(0);
        }

        let (row, col) = (mcu / layout.per_row, mcu % layout.per_row);
        for_each_block(frame, scan, row, col, |si, br, bc| {
            let block = grids[scan.components[si].comp_idx].block(br, bc);
            let (dc, ac) = tables[si];
            encode_block(&mut writer, dc, ac, &mut dc_pred[si], block)
        })?;
    }

    Ok(writer.flush())
}

fn encode_block(
    writer: &mut BitWriter,
    dc: &HuffmanEncodeTable,
    ac: &HuffmanEncodeTable,
    dc_pred: &mut i32,
    block: &[i32; 64],
) -> Result<()> {
    let (bits, size) = encode_value(block[0] - *dc_pred);
    *dc_pred = block[0];
    let (code, len) = dc.encode(size)?;
    writer.write_bits(code, len);
    writer.write_bits(bits, size);

    let mut run = 0u8;
    for &ni in &ZIGZAG_TO_NATURAL[1..] {
        let coef = block[ni];
        if coef == 0 {
            run += 1;
            continue;
        }
        while run >= 16 {
            let (code, len) = ac.encode(0xF0)?;
            writer.write_bits(code, len);
            run -= 16;
        }
        let (bits, size) = encode_value(coef);
        if size > 10 {
            return Err(JpegError::InvalidRunSize((run << 4) | size));
        }
        let (code, len) = ac.encode((run << 4) | size)?;
        writer.write_bits(code, len);
        writer.write_bits(bits, size);
        run = 0;
    }
    if run > 0 {
        let (code, len) = ac.encode(0x00)?;
        writer.write_bits(code, len);
    }
    Ok(())
}
