//! Per-pixel nearest-seed recoloring gated by a mask.

use crate::color::{blend, grayscale, scale_alpha};
use crate::{ensure_nonempty, ensure_same_size, for_each_row, Result, SeedIndex, CHANNELS};

/// Blends each masked pixel with the color of its nearest seed.
///
/// For a pixel whose mask grayscale is `g > 0`:
///
/// ```text
/// a   = g * global_alpha / 255
/// out = blend(scale_alpha(nearest(x, y), a), original)
/// ```
///
/// Pixels with `g == 0` are skipped and keep their exact bytes. Rows are
/// independent, so the parallel path writes disjoint row slices with no
/// locking and produces the same bytes as the sequential one.
#[derive(Debug, Clone, Copy)]
pub struct Recolorer {
    /// Split rows across the Rayon pool (ignored without the `parallel` feature)
    pub parallel: bool,
}

impl Recolorer {
    pub fn new() -> Self {
        Self {
            parallel: cfg!(feature = "parallel"),
        }
    }

    /// Single-threaded recolorer (reference path for determinism checks)
    pub fn sequential() -> Self {
        Self { parallel: false }
    }

    /// Recolor `original` in place.
    pub fn recolor_in_place(
        &self,
        original: &mut image::RgbaImage,
        mask: &image::RgbaImage,
        seeds: &SeedIndex,
        global_alpha: u8,
    ) -> Result<()> {
        let (width, height) = original.dimensions();
        ensure_nonempty(width, height)?;
        ensure_same_size(original, mask)?;

        if global_alpha == 0 {
            return Ok(());
        }
        let mask_raw = mask.as_raw();
        let stride = width as usize * CHANNELS;

        for_each_row(original, width, self.parallel, |y, row| {
            let mask_row = &mask_raw[y as usize * stride..(y as usize + 1) * stride];
            let py = y as f64;

            for (x, (px, m)) in row
                .chunks_exact_mut(CHANNELS)
                .zip(mask_row.chunks_exact(CHANNELS))
                .enumerate()
            {
                let g = grayscale(image::Rgba([m[0], m[1], m[2], m[3]]));
                if g == 0 {
                    continue;
                }
                let a = (g as u32 * global_alpha as u32 / 255) as u8;
                let seed_color = seeds.nearest(x as f64, py);
                let bottom = image::Rgba([px[0], px[1], px[2], px[3]]);
                px.copy_from_slice(&blend(scale_alpha(seed_color, a), bottom).0);
            }
        });

        Ok(())
    }

    /// Recolor into a fresh raster, leaving `original` untouched.
    pub fn recolor(
        &self,
        original: &image::RgbaImage,
        mask: &image::RgbaImage,
        seeds: &SeedIndex,
        global_alpha: u8,
    ) -> Result<image::RgbaImage> {
        let mut out = original.clone();
        self.recolor_in_place(&mut out, mask, seeds, global_alpha)?;
        Ok(out)
    }
}

impl Default for Recolorer {
    fn default() -> Self {
        Self::new()
    }
}
