use super::{FlowField, FlowSolver};
use crate::error::{Error, Result};
use image::GrayImage;
use ndarray::{Array2, Zip};

/// Horn-Schunck global dense optical flow
///
/// Minimizes the brightness-constancy error plus `alpha^2` times the flow
/// smoothness term with Jacobi iterations. Border pixels replicate their
/// nearest neighbor.
#[derive(Debug, Clone, Copy)]
pub struct HornSchunck {
    alpha: f32,
    iterations: usize,
}

impl Default for HornSchunck {
    fn default() -> Self {
        Self::new(1.0, 100)
    }
}

impl HornSchunck {
    pub fn new(alpha: f32, iterations: usize) -> Self {
        Self { alpha, iterations }
    }
}

impl FlowSolver for HornSchunck {
    fn compute(&mut self, prev: &GrayImage, next: &GrayImage) -> Result<FlowField> {
        let _span = tracing::debug_span!("horn_schunck").entered();

        if prev.dimensions() != next.dimensions() {
            return Err(Error::Flow(format!(
                "frame size mismatch: {:?} vs {:?}",
                prev.dimensions(),
                next.dimensions()
            )));
        }

        let (width, height) = prev.dimensions();
        if width == 0 || height == 0 {
            return Ok(FlowField::zeros(width, height));
        }

        let i1 = to_array(prev);
        let i2 = to_array(next);
        let (ix, iy, it) = gradients(&i1, &i2);

        let alpha_sq = self.alpha * self.alpha;
        let denom = Zip::from(&ix)
            .and(&iy)
            .map_collect(|&gx, &gy| alpha_sq + gx * gx + gy * gy);

        let mut u = Array2::<f32>::zeros(i1.dim());
        let mut v = Array2::<f32>::zeros(i1.dim());

        for _ in 0..self.iterations {
            let u_avg = neighborhood_mean(&u);
            let v_avg = neighborhood_mean(&v);

            let residual = Array2::from_shape_fn(i1.dim(), |idx| {
                (ix[idx] * u_avg[idx] + iy[idx] * v_avg[idx] + it[idx]) / denom[idx]
            });

            u = &u_avg - &(&ix * &residual);
            v = &v_avg - &(&iy * &residual);
        }

        Ok(FlowField { x: u, y: v })
    }
}

fn to_array(image: &GrayImage) -> Array2<f32> {
    let (width, height) = image.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(row, col)| {
        image.get_pixel(col as u32, row as u32)[0] as f32
    })
}

fn clamped(a: &Array2<f32>, row: isize, col: isize) -> f32 {
    let (rows, cols) = a.dim();
    let r = row.clamp(0, rows as isize - 1) as usize;
    let c = col.clamp(0, cols as isize - 1) as usize;
    a[[r, c]]
}

/// Spatial and temporal derivatives averaged over the 2x2x2 cube
fn gradients(i1: &Array2<f32>, i2: &Array2<f32>) -> (Array2<f32>, Array2<f32>, Array2<f32>) {
    let dim = i1.dim();
    let mut ix = Array2::<f32>::zeros(dim);
    let mut iy = Array2::<f32>::zeros(dim);
    let mut it = Array2::<f32>::zeros(dim);

    for ((row, col), gx) in ix.indexed_iter_mut() {
        let (r, c) = (row as isize, col as isize);
        let p = |a: &Array2<f32>, dr: isize, dc: isize| clamped(a, r + dr, c + dc);

        *gx = 0.25
            * (p(i1, 0, 1) - p(i1, 0, 0) + p(i1, 1, 1) - p(i1, 1, 0)
                + p(i2, 0, 1) - p(i2, 0, 0) + p(i2, 1, 1) - p(i2, 1, 0));
        iy[[row, col]] = 0.25
            * (p(i1, 1, 0) - p(i1, 0, 0) + p(i1, 1, 1) - p(i1, 0, 1)
                + p(i2, 1, 0) - p(i2, 0, 0) + p(i2, 1, 1) - p(i2, 0, 1));
        it[[row, col]] = 0.25
            * (p(i2, 0, 0) - p(i1, 0, 0) + p(i2, 1, 0) - p(i1, 1, 0)
                + p(i2, 0, 1) - p(i1, 0, 1) + p(i2, 1, 1) - p(i1, 1, 1));
    }

    (ix, iy, it)
}

/// Weighted 8-neighbor mean: 1/6 for edge neighbors, 1/12 for corners
fn neighborhood_mean(a: &Array2<f32>) -> Array2<f32> {
    Array2::from_shape_fn(a.dim(), |(row, col)| {
        let (r, c) = (row as isize, col as isize);
        let p = |dr: isize, dc: isize| clamped(a, r + dr, c + dc);

        (p(-1, 0) + p(1, 0) + p(0, -1) + p(0, 1)) / 6.0
            + (p(-1, -1) + p(-1, 1) + p(1, -1) + p(1, 1)) / 12.0
    })
}
