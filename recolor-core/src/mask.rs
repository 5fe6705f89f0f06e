//! Rasterization of seed geometry into masks and cell rasters.

use crate::color::{blend, mask_value};
use crate::geometry::Edge;
use crate::{ensure_nonempty, for_each_row, Color, Point, RecolorError, Result, Seed, CHANNELS};

/// Anti-aliased disc mask: one disc of `radius` per point.
///
/// The background is transparent black; pixel strength is encoded as
/// `(v, v, v, v)`. Coverage at a disc edge falls off linearly over one pixel,
/// measured from the pixel center. Overlapping discs combine like source-over
/// on alpha, applied in point order.
pub fn circle_mask(
    width: u32,
    height: u32,
    radius: f64,
    points: &[Point],
    parallel: bool,
) -> Result<image::RgbaImage> {
    ensure_nonempty(width, height)?;
    if !radius.is_finite() || radius <= 0.0 {
        return Err(RecolorError::InvalidRadius(radius));
    }

    let mut mask = image::RgbaImage::new(width, height);
    let reach = radius + 0.5;
    let max_x = width as f64 - 1.0;

    for_each_row(&mut mask, width, parallel, |y, row| {
        let py = y as f64 + 0.5;
        for point in points {
            let dy = py - point.y;
            if dy.abs() >= reach {
                continue;
            }
            let x_start = (point.x - reach).floor().max(0.0);
            let x_end = (point.x + reach).ceil().min(max_x);
            if x_start > x_end {
                continue;
            }
            for x in x_start as u32..=x_end as u32 {
                let dx = x as f64 + 0.5 - point.x;
                let d = (dx * dx + dy * dy).sqrt();
                let coverage = (reach - d).clamp(0.0, 1.0);
                let strength = (coverage * 255.0).round() as u8;
                if strength == 0 {
                    continue;
                }
                let px = &mut row[x as usize * CHANNELS..(x as usize + 1) * CHANNELS];
                let current = px[3];
                let combined = blend(mask_value(strength), mask_value(current))[3];
                px.copy_from_slice(&mask_value(combined).0);
            }
        }
    });

    Ok(mask)
}

/// Filled triangle with a precomputed paint color
struct Triangle {
    v: [Point; 3],
    color: Color,
    y_min: f64,
    y_max: f64,
}

impl Triangle {
    fn new(v: [Point; 3], color: Color) -> Option<Self> {
        let area = cross(v[0], v[1], v[2]);
        if area.abs() < 1e-12 {
            return None;
        }
        // Normalize to counter-clockwise so inside means all edge functions >= 0
        let v = if area < 0.0 { [v[0], v[2], v[1]] } else { v };
        let y_min = v.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let y_max = v.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        Some(Self { v, color, y_min, y_max })
    }

    #[inline]
    fn contains(&self, p: Point) -> bool {
        const TOLERANCE: f64 = -1e-9;
        cross(self.v[0], self.v[1], p) >= TOLERANCE
            && cross(self.v[1], self.v[2], p) >= TOLERANCE
            && cross(self.v[2], self.v[0], p) >= TOLERANCE
    }

    fn x_range(&self) -> (f64, f64) {
        let x_min = self.v.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let x_max = self.v.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        (x_min, x_max)
    }
}

/// Twice the signed area of (a, b, c)
#[inline]
fn cross(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Fail if any edge references a site index outside `0..sites`.
pub(crate) fn check_sites(edges: &[Edge], sites: usize) -> Result<()> {
    match edges.iter().flat_map(Edge::sites).find(|&site| site >= sites) {
        Some(site) => Err(RecolorError::UnknownSite { site, sites }),
        None => Ok(()),
    }
}

/// Hard-edged raster of colored cells.
///
/// Every edge is filled as the triangle (site, edge.a, edge.b) in the site's
/// color, once for each site the edge references. A pixel is painted when its
/// center lies inside or on the triangle; no anti-aliasing, so neighboring
/// cells never bleed. Later triangles overwrite earlier ones.
///
/// Site indices are resolved against `sites` before any painting; an index
/// outside it fails with [`RecolorError::UnknownSite`].
pub fn cell_raster(
    width: u32,
    height: u32,
    edges: &[Edge],
    sites: &[Seed],
    parallel: bool,
) -> Result<image::RgbaImage> {
    ensure_nonempty(width, height)?;
    check_sites(edges, sites.len())?;

    let triangles: Vec<Triangle> = edges
        .iter()
        .flat_map(|edge| edge.sites().map(move |site| (edge, &sites[site])))
        .filter_map(|(edge, seed)| Triangle::new([seed.pos, edge.a, edge.b], seed.color))
        .collect();

    let mut raster = image::RgbaImage::new(width, height);
    let max_x = width as f64 - 1.0;

    for_each_row(&mut raster, width, parallel, |y, row| {
        let py = y as f64 + 0.5;
        for tri in &triangles {
            if py < tri.y_min || py > tri.y_max {
                continue;
            }
            let (x_min, x_max) = tri.x_range();
            let x_start = (x_min - 0.5).floor().max(0.0);
            let x_end = (x_max - 0.5).ceil().min(max_x);
            if x_start > x_end {
                continue;
            }
            for x in x_start as u32..=x_end as u32 {
                if tri.contains(Point::new(x as f64 + 0.5, py)) {
                    let offset = x as usize * CHANNELS;
                    row[offset..offset + CHANNELS].copy_from_slice(&tri.color.0);
                }
            }
        }
    });

    Ok(raster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::grayscale;
    use crate::geometry::{CellGeometry, ClippedCells, Rect};
    use crate::SeedIndex;

    #[test]
    fn test_circle_mask_rejects_bad_input() {
        let pts = [Point::new(1.0, 1.0)];
        assert!(matches!(
            circle_mask(0, 4, 2.0, &pts, false),
            Err(RecolorError::EmptyImage { width: 0, height: 4 })
        ));
        assert!(matches!(
            circle_mask(4, 4, 0.0, &pts, false),
            Err(RecolorError::InvalidRadius(_))
        ));
        assert!(matches!(
            circle_mask(4, 4, f64::NAN, &pts, false),
            Err(RecolorError::InvalidRadius(_))
        ));
    }

    #[test]
    fn test_circle_mask_interior_and_background() {
        let mask = circle_mask(40, 40, 8.0, &[Point::new(20.0, 20.0)], false).unwrap();

        assert_eq!(mask.get_pixel(20, 20).0, [255; 4]);
        assert_eq!(mask.get_pixel(14, 20).0, [255; 4]);
        assert_eq!(mask.get_pixel(0, 0).0, [0; 4]);
        assert_eq!(mask.get_pixel(39, 20).0, [0; 4]);
    }

    #[test]
    fn test_circle_mask_edge_is_antialiased() {
        // Pixel center (27.5, 20.5) sits ~7.52 from (20, 20): coverage ~0.98
        // Pixel center (28.5, 20.5) sits ~8.51 from (20, 20): coverage 0
        let mask = circle_mask(40, 40, 8.0, &[Point::new(20.0, 20.0)], false).unwrap();

        let partial = (0..40u32)
            .flat_map(|y| (0..40u32).map(move |x| (x, y)))
            .filter(|&(x, y)| {
                let v = mask.get_pixel(x, y)[3];
                v > 0 && v < 255
            })
            .count();
        assert!(partial > 0, "expected soft edge pixels");

        for (x, y, px) in mask.enumerate_pixels() {
            let [r, g, b, a] = px.0;
            assert!(r == g && g == b && b == a, "pixel ({}, {}) = {:?}", x, y, px);
        }
        assert_eq!(grayscale(*mask.get_pixel(29, 20)), 0);
    }

    #[test]
    fn test_circle_mask_parallel_matches_sequential() {
        let points: Vec<Point> = (0..12)
            .map(|i| Point::new((i * 17 % 64) as f64 + 0.3, (i * 29 % 48) as f64 + 0.7))
            .collect();
        let seq = circle_mask(64, 48, 6.5, &points, false).unwrap();
        let par = circle_mask(64, 48, 6.5, &points, true).unwrap();
        assert_eq!(seq.as_raw(), par.as_raw());
    }

    #[test]
    fn test_cell_raster_matches_nearest_seed() {
        let seeds = vec![
            Seed::new(Point::new(5.5, 5.5), image::Rgba([255, 0, 0, 255])),
            Seed::new(Point::new(25.5, 8.5), image::Rgba([0, 255, 0, 255])),
            Seed::new(Point::new(12.5, 25.5), image::Rgba([0, 0, 255, 255])),
        ];
        let positions: Vec<Point> = seeds.iter().map(|s| s.pos).collect();
        let edges = ClippedCells::new()
            .edges(Rect::from_size(32, 32), &positions)
            .unwrap();
        let raster = cell_raster(32, 32, &edges, &seeds, true).unwrap();
        let index = SeedIndex::new(seeds.clone()).unwrap();

        // Every pixel is painted opaque
        assert!(raster.pixels().all(|p| p[3] == 255));

        // Away from boundaries the cell color equals the nearest seed
        let mut checked = 0;
        for (x, y, px) in raster.enumerate_pixels() {
            let c = Point::new(x as f64 + 0.5, y as f64 + 0.5);
            let mut d: Vec<f64> = positions.iter().map(|p| p.dist(&c)).collect();
            d.sort_by(|a, b| a.partial_cmp(b).unwrap());
            if d[1] - d[0] > 1.5 {
                assert_eq!(*px, index.nearest(c.x, c.y), "pixel ({}, {})", x, y);
                checked += 1;
            }
        }
        assert!(checked > 500);
    }

    #[test]
    fn test_cell_raster_unknown_site() {
        let seeds = vec![Seed::new(Point::new(1.0, 1.0), image::Rgba([1, 2, 3, 255]))];
        let edges = vec![Edge {
            a: Point::new(0.0, 0.0),
            b: Point::new(4.0, 0.0),
            left: Some(0),
            right: Some(3),
        }];
        let err = cell_raster(4, 4, &edges, &seeds, false).unwrap_err();
        assert!(matches!(err, RecolorError::UnknownSite { site: 3, sites: 1 }));
        assert!(!err.is_invalid_configuration());
    }
}
