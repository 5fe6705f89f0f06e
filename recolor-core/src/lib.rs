//! Seed-driven image recoloring library.
//!
//! Blends a raster with an overlay derived from a sparse set of colored seed
//! points. Two variants are provided: a per-pixel nearest-seed recolor gated
//! by a circle mask, and a layered composite of a pre-rendered cell raster.
//! Per-pixel passes run row-parallel on Rayon when the `parallel` feature is
//! enabled.

mod color;
mod composite;
mod geometry;
mod mask;
mod pipeline;
mod recolor;
mod seed;

pub use color::{blend, grayscale, mask_value, scale_alpha};
pub use composite::{compose, destination_in, destination_over};
pub use geometry::{CellGeometry, ClippedCells, Edge, Rect};
pub use mask::{cell_raster, circle_mask};
pub use pipeline::{Params, Pipeline, Variant};
pub use recolor::Recolorer;
pub use seed::{random_color, Point, Seed, SeedIndex};

/// RGBA color, straight alpha
pub type Color = image::Rgba<u8>;

/// Error type for recoloring operations
#[derive(Debug, thiserror::Error)]
pub enum RecolorError {
    #[error("No seeds provided")]
    NoSeeds,

    #[error("Image has no pixels: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("Invalid mask radius: {0}")]
    InvalidRadius(f64),

    #[error("Raster size mismatch: expected {}x{}, got {}x{}", expected.0, expected.1, actual.0, actual.1)]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Cell edge references site {site}, but only {sites} site colors are known")]
    UnknownSite { site: usize, sites: usize },
}

impl RecolorError {
    /// True for precondition failures on caller-supplied parameters
    pub fn is_invalid_configuration(&self) -> bool {
        !matches!(self, RecolorError::UnknownSite { .. })
    }
}

pub type Result<T> = std::result::Result<T, RecolorError>;

/// Bytes per RGBA pixel
pub(crate) const CHANNELS: usize = 4;

/// Fail unless both dimensions are positive.
pub(crate) fn ensure_nonempty(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(RecolorError::EmptyImage { width, height });
    }
    Ok(())
}

/// Fail unless `actual` has the same dimensions as `expected`.
pub(crate) fn ensure_same_size(
    expected: &image::RgbaImage,
    actual: &image::RgbaImage,
) -> Result<()> {
    if expected.dimensions() != actual.dimensions() {
        return Err(RecolorError::DimensionMismatch {
            expected: expected.dimensions(),
            actual: actual.dimensions(),
        });
    }
    Ok(())
}

/// Run `f` once per row of an RGBA buffer, each call owning its row slice.
///
/// With `parallel` set (and the `parallel` feature enabled) rows are handed to
/// the Rayon pool; the call returns once every row is done.
pub(crate) fn for_each_row<F>(buf: &mut [u8], width: u32, parallel: bool, f: F)
where
    F: Fn(u32, &mut [u8]) + Sync + Send,
{
    let stride = width as usize * CHANNELS;
    if stride == 0 {
        return;
    }

    #[cfg(feature = "parallel")]
    {
        if parallel {
            use rayon::prelude::*;
            buf.par_chunks_mut(stride)
                .enumerate()
                .for_each(|(y, row)| f(y as u32, row));
            return;
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    buf.chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| f(y as u32, row));
}

/// Run two closures, on the Rayon pool when `parallel` is set.
pub(crate) fn join<A, B, RA, RB>(parallel: bool, a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    #[cfg(feature = "parallel")]
    {
        if parallel {
            return rayon::join(a, b);
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    (a(), b())
}
