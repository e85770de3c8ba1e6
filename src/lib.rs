// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # baseline-jpeg
//!
//! Pure-Rust baseline sequential JPEG decoder. Parses the marker segments of
//! a JPEG stream, Huffman-decodes the quantized DCT coefficients, dequantizes
//! them and runs an 8×8 inverse DCT to produce one 8-bit sample plane per
//! component.
//!
//! A small baseline encoder (Annex K tables, quality scaling) is included
//! for producing test streams and round-trips.
//!
//! With the default `parallel` feature, block rows are inverse-transformed
//! on the rayon thread pool. Entropy decoding is always sequential.
//!
//! # Quick start
//!
//! ```rust
//! use baseline_jpeg::{decode, Encoder, Plane};
//!
//! let gray = Plane::new(32, 16, 90);
//! let jpeg = Encoder::new(85).encode(&[gray]).unwrap();
//!
//! let image = decode(&jpeg).unwrap();
//! assert_eq!((image.width(), image.height()), (32, 16));
//! assert_eq!(image.planes[0].get(5, 5), 90);
//! ```

pub mod jpeg;

pub use jpeg::error::{ErrorKind, JpegError, Result as JpegResult};
pub use jpeg::encode::{Encoder, Subsampling};
pub use jpeg::frame::{ComponentInfo, FrameHeader};
pub use jpeg::plane::Plane;
pub use jpeg::{decode, decode_reader, decode_with, AppSegment, DecodedImage, Decoder, DecoderOptions};
