//! Perceptual near-duplicate check for textures.
//!
//! Both images are bilinearly resampled to an 8x8 luminance grid; they are
//! similar when no cell differs by more than [`TOLERANCE`]. Comparing a
//! project's textures is an all-pairs scan, so cost grows quadratically with
//! the texture count: a few thousand textures is the practical limit.

use image::{DynamicImage, GenericImageView};

/// Side of the comparison grid
pub const GRID_SIZE: usize = 8;

/// Largest per-cell luminance difference, on a 0..1 scale
pub const TOLERANCE: f32 = 0.1;

/// Downsampled luminance of one image
#[derive(Debug, Clone, PartialEq)]
pub struct LumaGrid {
    cells: [f32; GRID_SIZE * GRID_SIZE],
}

impl LumaGrid {
    /// Resample an image; `None` for an image without pixels.
    ///
    /// Only the four texels around each cell center are read, so the cost
    /// does not depend on the image size.
    pub fn from_image(image: &DynamicImage) -> Option<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return None;
        }

        let luma_at = |x: u32, y: u32| {
            let [r, g, b, _] = image.get_pixel(x, y).0;
            luminance(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
        };

        let mut cells = [0.0f32; GRID_SIZE * GRID_SIZE];
        for gy in 0..GRID_SIZE {
            let (y0, y1, fy) = sample_axis(gy, height);
            for gx in 0..GRID_SIZE {
                let (x0, x1, fx) = sample_axis(gx, width);
                let top = lerp(luma_at(x0, y0), luma_at(x1, y0), fx);
                let bottom = lerp(luma_at(x0, y1), luma_at(x1, y1), fx);
                cells[gy * GRID_SIZE + gx] = lerp(top, bottom, fy);
            }
        }

        Some(Self { cells })
    }

    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    /// Every cell within tolerance; stops at the first cell that is not
    pub fn is_similar(&self, other: &LumaGrid) -> bool {
        self.cells
            .iter()
            .zip(other.cells.iter())
            .all(|(a, b)| (a - b).abs() <= TOLERANCE)
    }
}

/// Whether two images look alike; images without pixels never do
pub fn similar(a: &DynamicImage, b: &DynamicImage) -> bool {
    match (LumaGrid::from_image(a), LumaGrid::from_image(b)) {
        (Some(a), Some(b)) => a.is_similar(&b),
        _ => false,
    }
}

/// Grayscale weights of the engine's color type
fn luminance(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Source texels and weight for grid cell `cell` along an axis of `len`
/// texels, sampling at the cell center
fn sample_axis(cell: usize, len: u32) -> (u32, u32, f32) {
    let max = (len - 1) as f32;
    let pos = ((cell as f32 + 0.5) * len as f32 / GRID_SIZE as f32 - 0.5).clamp(0.0, max);
    let lo = pos.floor() as u32;
    let hi = (lo + 1).min(len - 1);
    (lo, hi, pos - lo as f32)
}
