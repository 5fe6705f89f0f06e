//! Seed points, their colors, and nearest-seed lookup.

use rand::Rng;

use crate::{Color, RecolorError, Result};

/// 2D position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point
    pub fn dist_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Distance to another point
    pub fn dist(&self, other: &Point) -> f64 {
        self.dist_sq(other).sqrt()
    }

    /// Multiply both coordinates by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

/// A point bound to the color it spreads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seed {
    pub pos: Point,
    pub color: Color,
}

impl Seed {
    pub fn new(pos: Point, color: Color) -> Self {
        Self { pos, color }
    }

    /// Give each point a random opaque color drawn from `rng`.
    ///
    /// Colors are drawn in point order, so a seeded `rng` reproduces the
    /// same palette.
    pub fn colorize<R: Rng + ?Sized>(points: &[Point], rng: &mut R) -> Vec<Seed> {
        points
            .iter()
            .map(|&pos| Seed::new(pos, random_color(rng)))
            .collect()
    }
}

/// Random opaque color
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Color {
    image::Rgba([rng.gen(), rng.gen(), rng.gen(), 255])
}

/// Brute-force nearest-seed lookup over a fixed, non-empty seed set.
///
/// Each query scans every seed, so cost is O(seeds) per pixel. Callers only
/// query pixels the mask marks as influenced.
#[derive(Debug, Clone)]
pub struct SeedIndex {
    seeds: Vec<Seed>,
}

impl SeedIndex {
    /// Build an index, failing if `seeds` is empty.
    pub fn new(seeds: Vec<Seed>) -> Result<Self> {
        if seeds.is_empty() {
            return Err(RecolorError::NoSeeds);
        }
        Ok(Self { seeds })
    }

    pub fn seeds(&self) -> &[Seed] {
        &self.seeds
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    /// Always false: construction rejects empty seed sets.
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    pub fn positions(&self) -> Vec<Point> {
        self.seeds.iter().map(|s| s.pos).collect()
    }

    /// Index of the seed closest to (x, y). Ties go to the earlier seed.
    #[inline]
    pub fn nearest_index(&self, x: f64, y: f64) -> usize {
        let p = Point::new(x, y);
        let mut min_dist = f64::INFINITY;
        let mut nearest = 0;
        for (i, seed) in self.seeds.iter().enumerate() {
            let dist = seed.pos.dist_sq(&p);
            if dist < min_dist {
                min_dist = dist;
                nearest = i;
            }
        }
        nearest
    }

    /// Color of the seed closest to (x, y). Ties go to the earlier seed.
    #[inline]
    pub fn nearest(&self, x: f64, y: f64) -> Color {
        self.seeds[self.nearest_index(x, y)].color
    }
}
