// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Random Patch Sampler
// ─────────────────────────────────────────────────────────────────────
//! Draws fixed-size square patches from random positions of an image.
//!
//! Forensic artifacts of generators live in local texture, so Layer B
//! looks at several native-resolution crops instead of one downscaled
//! whole image. An image smaller than the patch in either dimension is
//! resized to the patch size once, and that copy is yielded every round.

use std::iter::FusedIterator;

use image::imageops::{self, FilterType};
use image::RgbImage;
use rand::Rng;

/// Lazy iterator over sampled patches. See [`sample_patches`].
pub struct Patches<'a, R: Rng + ?Sized> {
    image: &'a RgbImage,
    size: u32,
    remaining: usize,
    rng: &'a mut R,
    fallback: Option<RgbImage>,
}

/// Sample `num_patches` square patches of side `patch_size` from `image`.
///
/// Each round draws the x offset, then the y offset, uniformly over every
/// position where the patch fits entirely. The fallback path draws nothing
/// from `rng`.
pub fn sample_patches<'a, R: Rng + ?Sized>(
    image: &'a RgbImage,
    patch_size: u32,
    num_patches: usize,
    rng: &'a mut R,
) -> Patches<'a, R> {
    let (w, h) = image.dimensions();
    let fallback = if w < patch_size || h < patch_size {
        log::debug!("image {w}x{h} smaller than patch {patch_size}, resizing whole image");
        Some(imageops::resize(
            image,
            patch_size,
            patch_size,
            FilterType::CatmullRom,
        ))
    } else {
        None
    };

    Patches {
        image,
        size: patch_size,
        remaining: num_patches,
        rng,
        fallback,
    }
}

impl<R: Rng + ?Sized> Patches<'_, R> {
    /// True when every patch is the resized whole image.
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

impl<R: Rng + ?Sized> Iterator for Patches<'_, R> {
    type Item = RgbImage;

    fn next(&mut self) -> Option<RgbImage> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        if let Some(resized) = &self.fallback {
            return Some(resized.clone());
        }

        let (w, h) = self.image.dimensions();
        let x = self.rng.gen_range(0..=w - self.size);
        let y = self.rng.gen_range(0..=h - self.size);
        Some(imageops::crop_imm(self.image, x, y, self.size, self.size).to_image())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<R: Rng + ?Sized> ExactSizeIterator for Patches<'_, R> {}

impl<R: Rng + ?Sized> FusedIterator for Patches<'_, R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Red channel encodes x, green encodes y.
    fn coordinate_image(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| Rgb([x as u8, y as u8, 0]))
    }

    #[test]
    fn test_exact_count_and_size() {
        let img = coordinate_image(100, 80);
        let mut rng = StdRng::seed_from_u64(1);
        let patches = sample_patches(&img, 32, 7, &mut rng);
        assert_eq!(patches.len(), 7);
        let all: Vec<RgbImage> = patches.collect();
        assert_eq!(all.len(), 7);
        assert!(all.iter().all(|p| p.dimensions() == (32, 32)));
    }

    #[test]
    fn test_seeded_offsets_reproduced() {
        let img = coordinate_image(200, 150);
        let mut rng = StdRng::seed_from_u64(42);
        let patches: Vec<RgbImage> = sample_patches(&img, 16, 5, &mut rng).collect();

        let mut replay = StdRng::seed_from_u64(42);
        for patch in &patches {
            let x = replay.gen_range(0..=200u32 - 16) as u8;
            let y = replay.gen_range(0..=150u32 - 16) as u8;
            assert_eq!(patch.get_pixel(0, 0), &Rgb([x, y, 0]));
            assert_eq!(patch.get_pixel(15, 15), &Rgb([x + 15, y + 15, 0]));
        }
    }

    #[test]
    fn test_patch_equal_to_image() {
        let img = coordinate_image(24, 24);
        let mut rng = StdRng::seed_from_u64(3);
        let patches = sample_patches(&img, 24, 3, &mut rng);
        assert!(!patches.is_fallback());
        for patch in patches {
            assert_eq!(patch, img);
        }
    }

    #[test]
    fn test_fallback_every_round() {
        let img = coordinate_image(10, 40);
        let mut rng = StdRng::seed_from_u64(9);
        let patches = sample_patches(&img, 32, 4, &mut rng);
        assert!(patches.is_fallback());
        let expected = imageops::resize(&img, 32, 32, FilterType::CatmullRom);
        for patch in patches {
            assert_eq!(patch, expected);
        }
    }

    #[test]
    fn test_fallback_draws_nothing() {
        let img = coordinate_image(8, 8);
        let mut rng = StdRng::seed_from_u64(5);
        let _: Vec<RgbImage> = sample_patches(&img, 16, 3, &mut rng).collect();
        let mut fresh = StdRng::seed_from_u64(5);
        assert_eq!(rng.gen::<u64>(), fresh.gen::<u64>());
    }

    #[test]
    fn test_fused() {
        let img = coordinate_image(20, 20);
        let mut rng = StdRng::seed_from_u64(0);
        let mut patches = sample_patches(&img, 4, 1, &mut rng);
        assert!(patches.next().is_some());
        assert!(patches.next().is_none());
        assert!(patches.next().is_none());
        assert_eq!(patches.len(), 0);
    }
}
