//! Cell geometry: the planar subdivision used by the cell variant.
//!
//! Sites are referred to by their index in the caller's site slice, never by
//! coordinate, so a geometry backend that recomputes vertices cannot break
//! the site-to-color association.

use crate::{Point, Result};

/// Axis-aligned bounding rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle covering a `width` x `height` image
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f64, height as f64)
    }

    fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x0, self.y0),
            Point::new(self.x1, self.y0),
            Point::new(self.x1, self.y1),
            Point::new(self.x0, self.y1),
        ]
    }
}

/// Boundary segment between two cells (or a cell and the bounding rectangle)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: Point,
    pub b: Point,
    /// Site index on one side
    pub left: Option<usize>,
    /// Site index on the other side, `None` on the bounding rectangle
    pub right: Option<usize>,
}

impl Edge {
    /// Site indices this edge borders
    pub fn sites(&self) -> impl Iterator<Item = usize> {
        self.left.into_iter().chain(self.right)
    }
}

/// Trait for cell geometry backends
pub trait CellGeometry {
    /// Partition `bounds` into one cell per site.
    ///
    /// Joining each site to every edge that references it must yield a
    /// closed fan covering that site's cell.
    fn edges(&self, bounds: Rect, sites: &[Point]) -> Result<Vec<Edge>>;
}

impl<G: CellGeometry + ?Sized> CellGeometry for &G {
    fn edges(&self, bounds: Rect, sites: &[Point]) -> Result<Vec<Edge>> {
        (**self).edges(bounds, sites)
    }
}

/// Builds each cell by clipping the bounding rectangle against the bisector
/// half-plane of every other site. O(sites²); intended for sparse seed sets.
///
/// Every cell is emitted independently, so each interior boundary appears
/// twice (once per owning cell, always with the owner as `left`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ClippedCells;

impl ClippedCells {
    pub fn new() -> Self {
        Self
    }

    /// Vertices of site `i`'s cell, each paired with the neighbor across the
    /// edge that starts at that vertex.
    fn cell(bounds: Rect, sites: &[Point], i: usize) -> Vec<(Point, Option<usize>)> {
        let site = sites[i];
        let mut poly: Vec<(Point, Option<usize>)> =
            bounds.corners().iter().map(|&p| (p, None)).collect();

        for (j, other) in sites.iter().enumerate() {
            if j == i {
                continue;
            }
            if other == &site {
                // Coincident sites: the earlier one owns the whole cell
                if j < i {
                    return Vec::new();
                }
                continue;
            }
            poly = clip(&poly, site, *other, j);
            if poly.len() < 3 {
                return Vec::new();
            }
        }
        poly
    }
}

impl CellGeometry for ClippedCells {
    fn edges(&self, bounds: Rect, sites: &[Point]) -> Result<Vec<Edge>> {
        let mut edges = Vec::new();
        for i in 0..sites.len() {
            let poly = Self::cell(bounds, sites, i);
            let n = poly.len();
            for k in 0..n {
                let (a, neighbor) = poly[k];
                let (b, _) = poly[(k + 1) % n];
                if a.dist_sq(&b) < EPS {
                    continue;
                }
                edges.push(Edge {
                    a,
                    b,
                    left: Some(i),
                    right: neighbor,
                });
            }
        }
        Ok(edges)
    }
}

const EPS: f64 = 1e-9;

/// Keep the part of `poly` closer to `site` than to `other`.
fn clip(
    poly: &[(Point, Option<usize>)],
    site: Point,
    other: Point,
    other_idx: usize,
) -> Vec<(Point, Option<usize>)> {
    let mid = Point::new((site.x + other.x) / 2.0, (site.y + other.y) / 2.0);
    let (nx, ny) = (other.x - site.x, other.y - site.y);
    // > 0 means closer to `other`
    let side = |p: &Point| (p.x - mid.x) * nx + (p.y - mid.y) * ny;

    let n = poly.len();
    let mut out = Vec::with_capacity(n + 1);
    for k in 0..n {
        let (s, label) = poly[k];
        let (e, _) = poly[(k + 1) % n];
        let fs = side(&s);
        let fe = side(&e);
        let s_in = fs <= EPS;
        let e_in = fe <= EPS;

        match (s_in, e_in) {
            (true, true) => out.push((s, label)),
            (true, false) => {
                out.push((s, label));
                out.push((intersect(s, e, fs, fe), Some(other_idx)));
            }
            (false, true) => out.push((intersect(s, e, fs, fe), label)),
            (false, false) => {}
        }
    }
    out
}

fn intersect(s: Point, e: Point, fs: f64, fe: f64) -> Point {
    let t = fs / (fs - fe);
    Point::new(s.x + (e.x - s.x) * t, s.y + (e.y - s.y) * t)
}
