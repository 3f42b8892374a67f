//! Pixel transforms.
//!
//! Transforms only touch an image through its pixel accessors and
//! [`Image::reformat`], so they need no knowledge of the file format.

use log::debug;

use crate::color::ColorType;
use crate::error::Result;
use crate::image::{Image, Pixel};
use crate::png::Header;

/// An in-place operation on an image.
pub trait Transform {
    /// Transform `image`, leaving it untouched on error.
    fn apply(&self, image: &mut Image) -> Result<()>;
}

/// Convert truecolour to grayscale using the rounded mean of R, G and B.
/// Alpha is kept. Grayscale images are left unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Grayscale;

impl Transform for Grayscale {
    fn apply(&self, image: &mut Image) -> Result<()> {
        let target = match image.color_type() {
            ColorType::Rgb => ColorType::Gray,
            ColorType::Rgba => ColorType::GrayAlpha,
            _ => return Ok(()),
        };
        let pixels = map_pixels(image, |p| {
            let sum: u32 = p[..3].iter().map(|&s| s as u32).sum();
            let mut out = vec![((sum + 1) / 3) as u16];
            out.extend_from_slice(&p[3..]);
            out
        });
        image.reformat(target, image.bit_depth(), pixels)
    }
}

/// Convert grayscale to truecolour by copying the gray sample into R, G and B.
///
/// Gray images at 1, 2 or 4 bits are rescaled to 8 bits first, since
/// truecolour has no sub-byte depths.
#[derive(Debug, Clone, Copy, Default)]
pub struct Truecolour;

impl Transform for Truecolour {
    fn apply(&self, image: &mut Image) -> Result<()> {
        let target = match image.color_type() {
            ColorType::Gray => ColorType::Rgb,
            ColorType::GrayAlpha => ColorType::Rgba,
            _ => return Ok(()),
        };
        if image.bit_depth() < 8 {
            image.set_bit_depth(8)?;
        }
        let pixels = map_pixels(image, |p| {
            let mut out = vec![p[0]; 3];
            out.extend_from_slice(&p[1..]);
            out
        });
        image.reformat(target, image.bit_depth(), pixels)
    }
}

/// Add a fully opaque alpha channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddAlpha;

impl Transform for AddAlpha {
    fn apply(&self, image: &mut Image) -> Result<()> {
        let target = match image.color_type() {
            ColorType::Gray => ColorType::GrayAlpha,
            ColorType::Rgb => ColorType::Rgba,
            _ => return Ok(()),
        };
        if image.bit_depth() < 8 {
            image.set_bit_depth(8)?;
        }
        let opaque = image.max_sample();
        let pixels = map_pixels(image, |p| {
            let mut out = p.to_vec();
            out.push(opaque);
            out
        });
        image.reformat(target, image.bit_depth(), pixels)
    }
}

/// Drop the alpha channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveAlpha;

impl Transform for RemoveAlpha {
    fn apply(&self, image: &mut Image) -> Result<()> {
        let target = match image.color_type() {
            ColorType::GrayAlpha => ColorType::Gray,
            ColorType::Rgba => ColorType::Rgb,
            _ => return Ok(()),
        };
        let pixels = map_pixels(image, |p| p[..p.len() - 1].to_vec());
        image.reformat(target, image.bit_depth(), pixels)
    }
}

/// Replace every colour sample `v` with `max - v`. Alpha is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct Invert;

impl Transform for Invert {
    fn apply(&self, image: &mut Image) -> Result<()> {
        let max = image.max_sample();
        let colour = image.color_type().color_samples();
        let pixels = map_pixels(image, |p| {
            let mut out = p.to_vec();
            for s in &mut out[..colour] {
                *s = max - *s;
            }
            out
        });
        image.replace_pixels(pixels)
    }
}

/// Bilinear resize to a new shape.
#[derive(Debug, Clone, Copy)]
pub struct Resize {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
}

impl Resize {
    /// Resize to `width` x `height`.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Transform for Resize {
    fn apply(&self, image: &mut Image) -> Result<()> {
        Header::new(self.width, self.height, image.color_type(), image.bit_depth())?
            .check_pixel_count()?;
        if (self.width, self.height) == image.shape() {
            return Ok(());
        }
        let src = image.get_pixels();
        let pixels = resize_bilinear(
            &src,
            self.width as usize,
            self.height as usize,
            image.max_sample(),
        );
        debug!(
            "resized {}x{} -> {}x{}",
            image.width(),
            image.height(),
            self.width,
            self.height
        );
        image.replace_pixels(pixels)
    }
}

/// Sample positions map corner to corner: destination pixel 0 reads source
/// pixel 0 and the last destination pixel reads the last source pixel.
fn resize_bilinear(
    src: &[Vec<Pixel>],
    dst_width: usize,
    dst_height: usize,
    max: u16,
) -> Vec<Vec<Pixel>> {
    let src_height = src.len();
    let src_width = src[0].len();
    let ratio = |from: usize, to: usize| {
        if to > 1 {
            (from - 1) as f32 / (to - 1) as f32
        } else {
            0.0
        }
    };
    let x_ratio = ratio(src_width, dst_width);
    let y_ratio = ratio(src_height, dst_height);

    (0..dst_height)
        .map(|dst_y| {
            let src_y_f = dst_y as f32 * y_ratio;
            let y0 = (src_y_f.floor() as usize).min(src_height - 1);
            let y1 = (y0 + 1).min(src_height - 1);
            let y_frac = src_y_f - y0 as f32;

            (0..dst_width)
                .map(|dst_x| {
                    let src_x_f = dst_x as f32 * x_ratio;
                    let x0 = (src_x_f.floor() as usize).min(src_width - 1);
                    let x1 = (x0 + 1).min(src_width - 1);
                    let x_frac = src_x_f - x0 as f32;

                    let (p00, p01) = (&src[y0][x0], &src[y0][x1]);
                    let (p10, p11) = (&src[y1][x0], &src[y1][x1]);
                    (0..p00.len())
                        .map(|c| {
                            let top = p00[c] as f32 * (1.0 - x_frac) + p01[c] as f32 * x_frac;
                            let bottom = p10[c] as f32 * (1.0 - x_frac) + p11[c] as f32 * x_frac;
                            let value = top * (1.0 - y_frac) + bottom * y_frac;
                            value.round().clamp(0.0, max as f32) as u16
                        })
                        .collect()
                })
                .collect()
        })
        .collect()
}

/// Reorder pixels by the sum of their colour samples, ascending unless
/// `reverse` is set. Pixels with equal sums keep their relative order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortPixels {
    /// Sort descending.
    pub reverse: bool,
}

impl Transform for SortPixels {
    fn apply(&self, image: &mut Image) -> Result<()> {
        let width = image.width() as usize;
        let colour = image.color_type().color_samples();
        let mut flat: Vec<Pixel> = image.get_pixels().into_iter().flatten().collect();
        let key = |p: &Pixel| p[..colour].iter().map(|&s| s as u32).sum::<u32>();
        if self.reverse {
            flat.sort_by_key(|p| std::cmp::Reverse(key(p)));
        } else {
            flat.sort_by_key(key);
        }
        let pixels: Vec<Vec<Pixel>> = flat.chunks(width).map(<[Pixel]>::to_vec).collect();
        image.replace_pixels(pixels)
    }
}

fn map_pixels<F>(image: &Image, f: F) -> Vec<Vec<Pixel>>
where
    F: Fn(&[u16]) -> Pixel,
{
    image
        .pixel_grid()
        .iter()
        .map(|row| row.iter().map(|p| f(p)).collect())
        .collect()
}
