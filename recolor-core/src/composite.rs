//! Layered compositing of a pre-rendered overlay onto the original.
//!
//! Trades the per-pixel nearest-seed search for a fixed number of full-image
//! passes, so cost no longer depends on seed count.

use crate::color::{blend, scale_alpha};
use crate::{ensure_nonempty, ensure_same_size, for_each_row, Result, CHANNELS};

/// Composite `overlay` onto `original` through `mask` into a fresh raster.
///
/// Equivalent to three layered draws on a transparent canvas:
/// 1. draw `overlay`;
/// 2. [`destination_in`] with `mask` attenuated by `global_alpha`;
/// 3. [`destination_over`] with `original`.
pub fn compose(
    original: &image::RgbaImage,
    overlay: &image::RgbaImage,
    mask: &image::RgbaImage,
    global_alpha: u8,
    parallel: bool,
) -> Result<image::RgbaImage> {
    let (width, height) = original.dimensions();
    ensure_nonempty(width, height)?;
    ensure_same_size(original, overlay)?;
    ensure_same_size(original, mask)?;

    let mut canvas = overlay.clone();
    destination_in(&mut canvas, mask, global_alpha, parallel)?;
    destination_over(&mut canvas, original, parallel)?;
    Ok(canvas)
}

/// Keep `canvas` only where `mask` is opaque.
///
/// Each canvas alpha becomes `Ac * (Am * global_alpha / 255) / 255`; color
/// channels are left as they are (straight alpha).
pub fn destination_in(
    canvas: &mut image::RgbaImage,
    mask: &image::RgbaImage,
    global_alpha: u8,
    parallel: bool,
) -> Result<()> {
    ensure_same_size(canvas, mask)?;
    let width = canvas.width();
    let stride = width as usize * CHANNELS;
    let mask_raw = mask.as_raw();

    for_each_row(canvas, width, parallel, |y, row| {
        let mask_row = &mask_raw[y as usize * stride..(y as usize + 1) * stride];
        for (px, m) in row
            .chunks_exact_mut(CHANNELS)
            .zip(mask_row.chunks_exact(CHANNELS))
        {
            let strength = (m[3] as u32 * global_alpha as u32 / 255) as u8;
            let src = image::Rgba([px[0], px[1], px[2], px[3]]);
            px.copy_from_slice(&scale_alpha(src, strength).0);
        }
    });

    Ok(())
}

/// Draw `background` beneath `canvas`.
///
/// Fully transparent canvas pixels take the background bytes unchanged;
/// opaque ones are untouched.
pub fn destination_over(
    canvas: &mut image::RgbaImage,
    background: &image::RgbaImage,
    parallel: bool,
) -> Result<()> {
    ensure_same_size(canvas, background)?;
    let width = canvas.width();
    let stride = width as usize * CHANNELS;
    let bg_raw = background.as_raw();

    for_each_row(canvas, width, parallel, |y, row| {
        let bg_row = &bg_raw[y as usize * stride..(y as usize + 1) * stride];
        for (px, b) in row
            .chunks_exact_mut(CHANNELS)
            .zip(bg_row.chunks_exact(CHANNELS))
        {
            let top = image::Rgba([px[0], px[1], px[2], px[3]]);
            let bottom = image::Rgba([b[0], b[1], b[2], b[3]]);
            px.copy_from_slice(&blend(top, bottom).0);
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{CellGeometry, ClippedCells, Rect};
    use crate::mask::{cell_raster, circle_mask};
    use crate::{Point, RecolorError, Recolorer, Seed, SeedIndex};

    fn gradient(w: u32, h: u32) -> image::RgbaImage {
        image::RgbaImage::from_fn(w, h, |x, y| {
            image::Rgba([(x * 255 / w) as u8, (y * 255 / h) as u8, 60, 255])
        })
    }

    #[test]
    fn test_destination_in_scales_alpha() {
        let mut canvas = image::RgbaImage::from_pixel(2, 1, image::Rgba([10, 20, 30, 255]));
        let mut mask = image::RgbaImage::new(2, 1);
        mask.put_pixel(1, 0, image::Rgba([255; 4]));

        destination_in(&mut canvas, &mask, 128, false).unwrap();
        assert_eq!(canvas.get_pixel(0, 0).0, [10, 20, 30, 0]);
        assert_eq!(canvas.get_pixel(1, 0).0, [10, 20, 30, 128]);
    }

    #[test]
    fn test_destination_over_fills_transparent() {
        let mut canvas = image::RgbaImage::new(2, 1);
        canvas.put_pixel(1, 0, image::Rgba([1, 2, 3, 255]));
        let background = image::RgbaImage::from_pixel(2, 1, image::Rgba([200, 100, 50, 90]));

        destination_over(&mut canvas, &background, false).unwrap();
        assert_eq!(canvas.get_pixel(0, 0).0, [200, 100, 50, 90]);
        assert_eq!(canvas.get_pixel(1, 0).0, [1, 2, 3, 255]);
    }

    #[test]
    fn test_empty_mask_returns_original() {
        let original = gradient(8, 8);
        let overlay = image::RgbaImage::from_pixel(8, 8, image::Rgba([255, 0, 0, 255]));
        let mask = image::RgbaImage::new(8, 8);

        let out = compose(&original, &overlay, &mask, 255, true).unwrap();
        assert_eq!(out.as_raw(), original.as_raw());
    }

    #[test]
    fn test_size_mismatch() {
        let a = image::RgbaImage::new(3, 3);
        let b = image::RgbaImage::new(3, 2);
        assert!(matches!(
            compose(&a, &a, &b, 255, false),
            Err(RecolorError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_matches_recolorer_on_cell_overlay() {
        let (w, h) = (48u32, 40u32);
        let original = gradient(w, h);
        // Pixel-aligned sites so cell ownership and nearest lookups agree
        let seeds = vec![
            Seed::new(Point::new(8.5, 8.5), image::Rgba([250, 10, 10, 255])),
            Seed::new(Point::new(38.5, 12.5), image::Rgba([10, 250, 10, 255])),
            Seed::new(Point::new(20.5, 33.5), image::Rgba([10, 10, 250, 255])),
        ];
        let positions: Vec<Point> = seeds.iter().map(|s| s.pos).collect();
        let edges = ClippedCells::new()
            .edges(Rect::from_size(w, h), &positions)
            .unwrap();
        let overlay = cell_raster(w, h, &edges, &seeds, true).unwrap();
        let mask = circle_mask(w, h, 7.0, &positions, true).unwrap();

        let composed = compose(&original, &overlay, &mask, 200, true).unwrap();

        // Recolorer samples integer coordinates; shift sites by half a pixel
        let shifted: Vec<Seed> = seeds
            .iter()
            .map(|s| Seed::new(Point::new(s.pos.x - 0.5, s.pos.y - 0.5), s.color))
            .collect();
        let index = SeedIndex::new(shifted).unwrap();
        let recolored = Recolorer::new().recolor(&original, &mask, &index, 200).unwrap();

        // The masks only reach pixels well inside each site's cell
        assert_eq!(composed.as_raw(), recolored.as_raw());
    }
}
