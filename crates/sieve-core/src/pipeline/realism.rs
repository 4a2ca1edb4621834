//! Sensor-realism transform: luminance-dependent noise, then a subtle
//! red/blue channel shift.
//!
//! Both stages produce new buffers. Noise is drawn row-major, one standard
//! normal sample per channel (R, G, B), so a seeded generator always yields
//! the same output.

use image::{DynamicImage, RgbImage};
use rand::Rng;
use rand_distr::StandardNormal;

/// Noise standard deviation applied to pure black; pure white gets none.
pub const MAX_NOISE_STRENGTH: f32 = 3.5;

/// Weight of the shifted channel when blending the aberration back in.
pub const ABERRATION_BLEND: f32 = 0.2;

/// Applies phone-sensor artifacts to RGB pixel data.
#[derive(Debug, Clone, Copy)]
pub struct RealismEffectEngine {
    max_noise: f32,
    blend: f32,
}

impl Default for RealismEffectEngine {
    fn default() -> Self {
        Self {
            max_noise: MAX_NOISE_STRENGTH,
            blend: ABERRATION_BLEND,
        }
    }
}

impl RealismEffectEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum noise strength (`K`).
    pub fn max_noise(&self) -> f32 {
        self.max_noise
    }

    /// Apply noise then chromatic aberration. Non-RGB input is converted first.
    pub fn apply<R: Rng + ?Sized>(&self, image: &DynamicImage, rng: &mut R) -> RgbImage {
        let rgb = image.to_rgb8();
        let noisy = self.add_noise(&rgb, rng);
        self.chromatic_aberration(&noisy)
    }

    /// Per-pixel brightness in [0, 1], row-major.
    ///
    /// Uses the ITU-R 601-2 luma weights with 8-bit rounding, so the mask
    /// matches an ordinary grayscale conversion of the same pixels.
    pub fn luminance_mask(image: &RgbImage) -> Vec<f32> {
        image
            .pixels()
            .map(|p| {
                let [r, g, b] = p.0;
                let luma = (u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471
                    + 0x8000)
                    >> 16;
                luma as f32 / 255.0
            })
            .collect()
    }

    /// Gaussian noise scaled by `(1 - luminance) * K`, clipped and rounded.
    pub fn add_noise<R: Rng + ?Sized>(&self, image: &RgbImage, rng: &mut R) -> RgbImage {
        let mask = Self::luminance_mask(image);
        let mut out = image.clone();

        for (pixel, luminance) in out.pixels_mut().zip(mask) {
            let strength = (1.0 - luminance) * self.max_noise;
            for channel in pixel.0.iter_mut() {
                let sample: f32 = rng.sample(StandardNormal);
                let value = f32::from(*channel) + sample * strength;
                *channel = value.clamp(0.0, 255.0).round() as u8;
            }
        }

        out
    }

    /// Shift red one pixel left and blue one pixel right, blended at low weight.
    ///
    /// The column vacated by each shift keeps its own value. Green is untouched.
    pub fn chromatic_aberration(&self, image: &RgbImage) -> RgbImage {
        let (width, height) = image.dimensions();
        let mut out = image.clone();
        if width < 2 {
            return out;
        }

        for y in 0..height {
            for x in 0..width {
                let here = image.get_pixel(x, y).0;
                let red_source = if x + 1 < width {
                    image.get_pixel(x + 1, y).0[0]
                } else {
                    here[0]
                };
                let blue_source = if x > 0 {
                    image.get_pixel(x - 1, y).0[2]
                } else {
                    here[2]
                };

                let pixel = out.get_pixel_mut(x, y);
                pixel.0[0] = self.blend_channel(here[0], red_source);
                pixel.0[2] = self.blend_channel(here[2], blue_source);
            }
        }

        out
    }

    fn blend_channel(&self, original: u8, shifted: u8) -> u8 {
        let value = f32::from(original) * (1.0 - self.blend) + f32::from(shifted) * self.blend;
        value.clamp(0.0, 255.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayAlphaImage, LumaA, Rgb};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn solid(value: u8, size: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(size, size, Rgb([value; 3])))
    }

    /// Mean and variance of the green channel, which aberration never touches.
    fn green_stats(image: &RgbImage) -> (f64, f64) {
        let values: Vec<f64> = image.pixels().map(|p| f64::from(p.0[1])).collect();
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        (mean, var)
    }

    #[test]
    fn test_white_image_gets_no_noise() {
        let engine = RealismEffectEngine::new();
        let input = solid(255, 32);
        let output = engine.apply(&input, &mut StdRng::seed_from_u64(1));
        assert_eq!(output, input.to_rgb8());
    }

    #[test]
    fn test_black_image_gets_full_strength_noise() {
        let engine = RealismEffectEngine::new();
        let output = engine.apply(&solid(0, 64), &mut StdRng::seed_from_u64(2));
        let (mean, var) = green_stats(&output);
        // Half-normal after clipping at zero: mean ~ K / sqrt(2*pi) ~ 1.4.
        assert!((1.0..1.8).contains(&mean), "mean {mean}");
        assert!(var > 1.5, "variance {var}");
    }

    #[test]
    fn test_mid_gray_variance_tracks_mask() {
        let engine = RealismEffectEngine::new();
        let output = engine.apply(&solid(128, 64), &mut StdRng::seed_from_u64(3));
        let (mean, var) = green_stats(&output);
        // sigma = (127/255) * 3.5 ~ 1.74, variance ~ 3.04 plus rounding.
        assert!((mean - 128.0).abs() < 0.2, "mean {mean}");
        assert!((2.6..3.6).contains(&var), "variance {var}");
    }

    #[test]
    fn test_shadows_noisier_than_highlights() {
        let engine = RealismEffectEngine::new();
        let (_, dark) = green_stats(&engine.apply(&solid(40, 64), &mut StdRng::seed_from_u64(4)));
        let (_, bright) =
            green_stats(&engine.apply(&solid(220, 64), &mut StdRng::seed_from_u64(4)));
        assert!(dark > bright * 4.0, "dark {dark} bright {bright}");
    }

    #[test]
    fn test_seeded_output_is_deterministic() {
        let engine = RealismEffectEngine::new();
        let input = DynamicImage::ImageRgb8(RgbImage::from_fn(24, 16, |x, y| {
            Rgb([(x * 10) as u8, (y * 12) as u8, 90])
        }));
        let a = engine.apply(&input, &mut StdRng::seed_from_u64(99));
        let b = engine.apply(&input, &mut StdRng::seed_from_u64(99));
        let c = engine.apply(&input, &mut StdRng::seed_from_u64(100));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_aberration_shifts_red_left_and_blue_right() {
        let engine = RealismEffectEngine::new();
        let mut image = RgbImage::from_pixel(10, 1, Rgb([0, 50, 0]));
        image.put_pixel(5, 0, Rgb([200, 50, 200]));

        let out = engine.chromatic_aberration(&image);

        // Red pulled in from the right neighbour.
        assert_eq!(out.get_pixel(4, 0).0[0], 40);
        assert_eq!(out.get_pixel(5, 0).0[0], 160);
        assert_eq!(out.get_pixel(6, 0).0[0], 0);
        // Blue pulled in from the left neighbour.
        assert_eq!(out.get_pixel(4, 0).0[2], 0);
        assert_eq!(out.get_pixel(5, 0).0[2], 160);
        assert_eq!(out.get_pixel(6, 0).0[2], 40);
        // Green untouched everywhere.
        assert!(out.pixels().all(|p| p.0[1] == 50));
    }

    #[test]
    fn test_aberration_edges_keep_their_values() {
        let engine = RealismEffectEngine::new();
        let image = RgbImage::from_fn(4, 2, |x, _| Rgb([(x * 60) as u8, 0, (x * 60) as u8]));
        let out = engine.chromatic_aberration(&image);
        // Last column has no right neighbour for red; first column none for blue.
        assert_eq!(out.get_pixel(3, 0).0[0], 180);
        assert_eq!(out.get_pixel(0, 1).0[2], 0);
    }

    #[test]
    fn test_non_rgb_input_is_flattened() {
        let engine = RealismEffectEngine::new();
        let input = DynamicImage::ImageLumaA8(GrayAlphaImage::from_pixel(8, 6, LumaA([255, 128])));
        let output = engine.apply(&input, &mut StdRng::seed_from_u64(5));
        assert_eq!(output.dimensions(), (8, 6));
        assert!(output.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn test_luminance_mask_range() {
        let image = RgbImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([0; 3]) } else { Rgb([255; 3]) });
        let mask = RealismEffectEngine::luminance_mask(&image);
        assert_eq!(mask, vec![0.0, 1.0]);
    }
}
