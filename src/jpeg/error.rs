// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for JPEG decoding and encoding.
//!
//! Every [`JpegError`] variant belongs to one of four [`ErrorKind`]s. Errors
//! raised while handling a marker segment or a scan are wrapped in
//! [`JpegError::Context`], which records the marker code and the byte offset
//! of its `0xFF` prefix.

use thiserror::Error;

use super::marker::{marker_name, SOS};
use super::tables::TableClass;

/// Coarse classification of a [`JpegError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed marker, segment, table or entropy-coded data.
    Format,
    /// Well-formed JPEG using a feature outside baseline sequential decoding.
    UnsupportedFeature,
    /// The input ended before decoding finished.
    EndOfStream,
    /// A table id, component id or coefficient index is out of range.
    Consistency,
}

/// Errors that can occur during JPEG decoding or encoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JpegError {
    /// Input data is truncated.
    #[error("unexpected end of JPEG data")]
    UnexpectedEof,
    /// Reading the input source failed.
    #[error("failed to read JPEG source: {0}")]
    Io(std::io::ErrorKind),
    /// Data does not start with SOI (0xFFD8).
    #[error("missing SOI marker (not a JPEG)")]
    MissingSoi,
    /// A byte other than 0xFF where a marker was expected.
    #[error("expected a marker, found byte 0x{0:02X}")]
    ExpectedMarker(u8),
    /// Marker that is valid JPEG but not baseline (progressive, lossless, arithmetic...).
    #[error("unsupported JPEG marker: 0xFF{0:02X}")]
    UnsupportedMarker(u8),
    /// Only 8-bit samples are supported.
    #[error("unsupported sample precision: {0}-bit")]
    UnsupportedPrecision(u8),
    /// Frame exceeds the configured pixel limit.
    #[error("image of {width}x{height} exceeds the limit of {limit} pixels")]
    TooLarge { width: u16, height: u16, limit: u64 },
    /// Segment contents are malformed.
    #[error("invalid marker data: {0}")]
    InvalidMarkerData(&'static str),
    /// Marker appears where the parser state does not allow it.
    #[error("unexpected marker 0xFF{0:02X} at this point in the stream")]
    UnexpectedMarker(u8),
    /// Code lengths and symbols of a DHT table are inconsistent.
    #[error("invalid Huffman table: {0}")]
    InvalidHuffmanTable(&'static str),
    /// No Huffman code matched within 16 bits.
    #[error("Huffman decode error (no code matches)")]
    HuffmanDecode,
    /// DC magnitude category above 11.
    #[error("invalid DC magnitude category: {0}")]
    InvalidDcCategory(u8),
    /// AC symbol that is neither EOB, ZRL nor a valid run/size pair.
    #[error("invalid AC run/size symbol: 0x{0:02X}")]
    InvalidRunSize(u8),
    /// Restart interval elapsed without an RSTn marker.
    #[error("missing restart marker after {0} MCUs")]
    MissingRestartMarker(usize),
    /// Image dimensions or sampling factors are invalid.
    #[error("invalid image dimensions or sampling factors")]
    InvalidDimensions,
    /// Quantization table ID out of range (0–3).
    #[error("invalid quantization table ID: {0}")]
    InvalidQuantTableId(u8),
    /// Huffman table class/ID byte out of range.
    #[error("invalid Huffman table class/ID: 0x{0:02X}")]
    InvalidHuffmanTableId(u8),
    /// A component references a quantization table that was never defined.
    #[error("quantization table {0} is not defined")]
    MissingQuantTable(u8),
    /// A scan references a Huffman table that was never defined.
    #[error("{class} Huffman table {id} is not defined")]
    MissingHuffmanTable { class: TableClass, id: u8 },
    /// Component ID referenced in SOS not found in SOF.
    #[error("unknown component ID in SOS: {0}")]
    UnknownComponentId(u8),
    /// Run-length decoding walked past the last zig-zag position.
    #[error("coefficient index {0} exceeds 63")]
    CoefficientOverflow(usize),
    /// EOI reached before every frame component appeared in a scan.
    #[error("component {0} was not present in any scan")]
    MissingComponentData(u8),
    /// Error raised inside a marker segment or its scan data.
    #[error("in {} at byte {offset}: {source}", context_label(.marker))]
    Context {
        marker: u8,
        offset: usize,
        source: Box<JpegError>,
    },
}

impl JpegError {
    /// The classification of this error, looking through [`JpegError::Context`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnexpectedEof | Self::Io(_) => ErrorKind::EndOfStream,
            Self::UnsupportedMarker(_) | Self::UnsupportedPrecision(_) | Self::TooLarge { .. } => {
                ErrorKind::UnsupportedFeature
            }
            Self::InvalidQuantTableId(_)
            | Self::InvalidHuffmanTableId(_)
            | Self::MissingQuantTable(_)
            | Self::MissingHuffmanTable { .. }
            | Self::UnknownComponentId(_)
            | Self::CoefficientOverflow(_) => ErrorKind::Consistency,
            Self::Context { source, .. } => source.kind(),
            _ => ErrorKind::Format,
        }
    }

    /// Whether the input ended early rather than being malformed.
    pub fn is_truncation(&self) -> bool {
        self.kind() == ErrorKind::EndOfStream
    }

    /// Byte offset of the marker in whose segment the error occurred.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Context { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Marker code (without the 0xFF prefix) of the failing segment.
    pub fn marker(&self) -> Option<u8> {
        match self {
            Self::Context { marker, .. } => Some(*marker),
            _ => None,
        }
    }

    /// Attach marker/offset context. An already-wrapped error keeps its
    /// innermost context.
    pub(crate) fn at(self, marker: u8, offset: usize) -> Self {
        match self {
            wrapped @ Self::Context { .. } => wrapped,
            other => Self::Context {
                marker,
                offset,
                source: Box::new(other),
            },
        }
    }
}

impl From<std::io::Error> for JpegError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Self::UnexpectedEof,
            kind => Self::Io(kind),
        }
    }
}

fn context_label(marker: &u8) -> String {
    if *marker == SOS {
        "scan".to_string()
    } else {
        format!("{} segment", marker_name(*marker))
    }
}

pub type Result<T> = std::result::Result<T, JpegError>;
