//! # pilates
//!
//! A PNG codec with a small pixel-editing layer on top.
//!
//! Decoding checks chunk framing and CRCs, reverses the five scanline
//! filters and unpacks samples at every bit depth PNG defines (1, 2, 4, 8
//! and 16). Indexed images are resolved through their palette. Encoding
//! runs the same pipeline backwards. The zlib stream itself is handled by
//! [`flate2`] behind the [`compress::zlib::StreamCompressor`] trait.
//!
//! ## Example
//!
//! ```rust
//! use pilates::{ColorType, Image, Invert};
//!
//! let mut img = Image::new(2, 2, ColorType::Rgb, 8, &[255, 0, 0]).unwrap();
//! img.apply(&Invert).unwrap();
//!
//! let png = img.encode().unwrap();
//! let decoded = Image::decode(&png).unwrap();
//! assert_eq!(decoded.get_pixel(0, 0).unwrap(), vec![0, 255, 255]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bits;
pub mod color;
pub mod compress;
pub mod error;
pub mod image;
pub mod png;
pub mod transform;

pub use color::ColorType;
pub use error::{Error, Result};
pub use image::{Image, Pixel};
pub use png::{FilterStrategy, PngOptions};
pub use transform::{
    AddAlpha, Grayscale, Invert, RemoveAlpha, Resize, SortPixels, Transform, Truecolour,
};
