//! Deterministic test images.

use pilates::{ColorType, Image};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Horizontal and vertical ramps across every channel.
pub fn gradient(width: u32, height: u32, color_type: ColorType, bit_depth: u8) -> Image {
    let mut img = Image::blank(width, height, color_type, bit_depth).expect("blank image");
    let max = img.max_sample() as u32;
    let span = (width + height).max(1);
    for y in 0..height {
        for x in 0..width {
            let pixel = (0..color_type.samples_per_pixel() as u32)
                .map(|c| (((x + y + c * 3) % span) * max / span) as u16)
                .collect();
            img.set_pixel(x, y, pixel).expect("set pixel");
        }
    }
    img
}

/// Uniformly random samples from a fixed seed.
pub fn noise(width: u32, height: u32, color_type: ColorType, bit_depth: u8, seed: u64) -> Image {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut img = Image::blank(width, height, color_type, bit_depth).expect("blank image");
    let max = img.max_sample();
    for y in 0..height {
        for x in 0..width {
            let pixel = (0..color_type.samples_per_pixel())
                .map(|_| rng.gen_range(0..=max))
                .collect();
            img.set_pixel(x, y, pixel).expect("set pixel");
        }
    }
    img
}
