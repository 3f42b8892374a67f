//! The image value type.
//!
//! An [`Image`] owns its pixel grid, palette and text metadata. Readers get
//! copies or immutable views; every mutation goes through a setter that
//! checks the pixel against the image format first.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::info;

use crate::color::{max_sample, ColorType};
use crate::compress::zlib::StreamCompressor;
use crate::error::{Error, Result};
use crate::png::{self, chunk, Header, PngOptions};
use crate::transform::Transform;

/// One pixel: its samples in stored order (gray[, alpha] or R, G, B[, alpha]).
pub type Pixel = Vec<u16>;

/// A decoded or constructed image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    bit_depth: u8,
    color_type: ColorType,
    pixels: Vec<Vec<Pixel>>,
    palette: Vec<[u8; 3]>,
    text: HashMap<String, String>,
}

impl Image {
    /// Create an image with every pixel set to `fill`.
    ///
    /// Indexed colour cannot be constructed directly; decode an indexed PNG
    /// instead.
    pub fn new(
        width: u32,
        height: u32,
        color_type: ColorType,
        bit_depth: u8,
        fill: &[u16],
    ) -> Result<Self> {
        if color_type == ColorType::Indexed {
            return Err(Error::UnsupportedFeature(
                "constructing indexed-colour images".into(),
            ));
        }
        let header = Header::new(width, height, color_type, bit_depth)?;
        header.check_pixel_count()?;
        check_pixel(color_type, bit_depth, fill)?;

        info!(
            "new image {}x{}, colour type {}, bit depth {}",
            header.width, header.height, color_type as u8, bit_depth
        );
        Ok(Self {
            width,
            height,
            bit_depth,
            color_type,
            pixels: vec![vec![fill.to_vec(); width as usize]; height as usize],
            palette: Vec::new(),
            text: HashMap::new(),
        })
    }

    /// Create an image with every sample set to zero.
    pub fn blank(width: u32, height: u32, color_type: ColorType, bit_depth: u8) -> Result<Self> {
        let fill = vec![0; color_type.samples_per_pixel()];
        Self::new(width, height, color_type, bit_depth, &fill)
    }

    /// Decode a PNG byte stream.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from(png::decode_png(bytes)?))
    }

    /// Decode a PNG byte stream with a caller-supplied decompressor.
    pub fn decode_with(bytes: &[u8], codec: &dyn StreamCompressor) -> Result<Self> {
        Ok(Self::from(png::decode_png_with(bytes, codec)?))
    }

    /// Encode as PNG with default options.
    pub fn encode(&self) -> Result<Vec<u8>> {
        png::encode(self)
    }

    /// Encode as PNG with the given options.
    pub fn encode_with_options(&self, options: &PngOptions) -> Result<Vec<u8>> {
        png::encode_with_options(self, options)
    }

    /// Encode as PNG with a caller-supplied compressor.
    pub fn encode_with(&self, options: &PngOptions, codec: &dyn StreamCompressor) -> Result<Vec<u8>> {
        png::encode_with(self, options, codec)
    }

    /// Read and decode a PNG file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::decode(&fs::read(path)?)
    }

    /// Encode and write a PNG file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.encode()?)?;
        Ok(())
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    pub fn shape(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bits per sample.
    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    /// Pixel format class.
    pub fn color_type(&self) -> ColorType {
        self.color_type
    }

    /// Samples every pixel must carry.
    pub fn samples_per_pixel(&self) -> usize {
        self.color_type.samples_per_pixel()
    }

    /// Largest sample value at the current bit depth.
    pub fn max_sample(&self) -> u16 {
        max_sample(self.bit_depth)
    }

    /// The IHDR fields describing this image.
    pub fn header(&self) -> Header {
        Header {
            width: self.width,
            height: self.height,
            bit_depth: self.bit_depth,
            color_type: self.color_type,
            interlace_method: 0,
        }
    }

    /// Palette read from an indexed source, empty otherwise.
    pub fn palette(&self) -> &[[u8; 3]] {
        &self.palette
    }

    /// Value of a text attribute.
    pub fn text(&self, keyword: &str) -> Option<&str> {
        self.text.get(keyword).map(String::as_str)
    }

    /// All text attributes.
    pub fn text_attributes(&self) -> &HashMap<String, String> {
        &self.text
    }

    /// Set a text attribute. The keyword must be 1-79 Latin-1 characters and
    /// both parts must be representable in Latin-1.
    pub fn set_text(&mut self, keyword: &str, text: &str) -> Result<()> {
        chunk::text_body(keyword, text)?;
        self.text.insert(keyword.to_string(), text.to_string());
        Ok(())
    }

    /// Remove a text attribute, returning its value.
    pub fn remove_text(&mut self, keyword: &str) -> Option<String> {
        self.text.remove(keyword)
    }

    /// Copy of the pixel at `(x, y)`.
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<Pixel> {
        self.check_bounds(x, y)?;
        Ok(self.pixels[y as usize][x as usize].clone())
    }

    /// Replace the pixel at `(x, y)`.
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) -> Result<()> {
        self.check_bounds(x, y)?;
        check_pixel(self.color_type, self.bit_depth, &pixel)?;
        self.pixels[y as usize][x as usize] = pixel;
        Ok(())
    }

    /// Copy of the whole pixel grid, row-major.
    pub fn get_pixels(&self) -> Vec<Vec<Pixel>> {
        self.pixels.clone()
    }

    /// Set every pixel to `pixel`.
    pub fn fill(&mut self, pixel: &[u16]) -> Result<()> {
        check_pixel(self.color_type, self.bit_depth, pixel)?;
        for row in &mut self.pixels {
            for p in row.iter_mut() {
                p.clear();
                p.extend_from_slice(pixel);
            }
        }
        Ok(())
    }

    /// Replace the pixel grid. The image takes the shape of `pixels`.
    pub fn replace_pixels(&mut self, pixels: Vec<Vec<Pixel>>) -> Result<()> {
        self.reformat(self.color_type, self.bit_depth, pixels)
    }

    /// Replace the pixel grid together with the pixel format.
    ///
    /// Used by transforms that change the colour type or bit depth. Nothing is
    /// modified if validation fails.
    pub fn reformat(
        &mut self,
        color_type: ColorType,
        bit_depth: u8,
        pixels: Vec<Vec<Pixel>>,
    ) -> Result<()> {
        if color_type == ColorType::Indexed {
            return Err(Error::UnsupportedFeature(
                "constructing indexed-colour images".into(),
            ));
        }
        let height = pixels.len();
        let width = pixels.first().map_or(0, Vec::len);
        if width == 0 {
            return Err(Error::InvalidPixelShape("pixel grid is empty".into()));
        }
        let header = Header::new(width as u32, height as u32, color_type, bit_depth)?;

        for (y, row) in pixels.iter().enumerate() {
            if row.len() != width {
                return Err(Error::InvalidPixelShape(format!(
                    "row {} has {} pixels, expected {}",
                    y,
                    row.len(),
                    width
                )));
            }
            for pixel in row {
                check_pixel(color_type, bit_depth, pixel)?;
            }
        }

        self.width = header.width;
        self.height = header.height;
        self.color_type = color_type;
        self.bit_depth = bit_depth;
        self.pixels = pixels;
        Ok(())
    }

    /// Change the bit depth, rescaling every sample to the new range.
    ///
    /// Reducing the depth loses precision.
    pub fn set_bit_depth(&mut self, bit_depth: u8) -> Result<()> {
        if !self.color_type.is_valid_bit_depth(bit_depth) {
            return Err(Error::InvalidFieldValue {
                field: "bit depth",
                value: bit_depth as u32,
            });
        }
        let old_max = max_sample(self.bit_depth) as u32;
        let new_max = max_sample(bit_depth) as u32;
        for sample in self.pixels.iter_mut().flatten().flatten() {
            *sample = (*sample as u32 * new_max / old_max) as u16;
        }
        info!(
            "Changed the bit depth from {} to {}",
            self.bit_depth, bit_depth
        );
        self.bit_depth = bit_depth;
        Ok(())
    }

    /// Apply a pixel transform in place.
    pub fn apply<T: Transform + ?Sized>(&mut self, transform: &T) -> Result<()> {
        transform.apply(self)
    }

    /// Borrow the grid for encoding.
    pub(crate) fn pixel_grid(&self) -> &[Vec<Pixel>] {
        &self.pixels
    }

    fn check_bounds(&self, x: u32, y: u32) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::InvalidPixelShape(format!(
                "pixel ({}, {}) outside {}x{} image",
                x, y, self.width, self.height
            )));
        }
        Ok(())
    }
}

impl From<png::DecodedPng> for Image {
    fn from(decoded: png::DecodedPng) -> Self {
        Self {
            width: decoded.header.width,
            height: decoded.header.height,
            bit_depth: decoded.header.bit_depth,
            color_type: decoded.header.color_type,
            pixels: decoded.pixels,
            palette: decoded.palette,
            text: decoded.text,
        }
    }
}

/// Check sample count and range of one pixel.
fn check_pixel(color_type: ColorType, bit_depth: u8, pixel: &[u16]) -> Result<()> {
    let expected = color_type.samples_per_pixel();
    if pixel.len() != expected {
        return Err(Error::InvalidPixelShape(format!(
            "pixel has {} samples, {:?} needs {}",
            pixel.len(),
            color_type,
            expected
        )));
    }
    let max = max_sample(bit_depth);
    if let Some(&sample) = pixel.iter().find(|&&s| s > max) {
        return Err(Error::InvalidPixelShape(format!(
            "sample {} exceeds {} for bit depth {}",
            sample, max, bit_depth
        )));
    }
    Ok(())
}
