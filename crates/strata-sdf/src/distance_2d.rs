//! Planar signed distance slices.
//!
//! A slice is the signed distance, within one horizontal plane at a fixed
//! height, from every cell of an elevation raster to the boundary between
//! free cells (terrain below the plane) and occupied cells (terrain at or
//! above it). Distances are positive in free space and negative inside
//! terrain, in world units.

use nalgebra::DMatrix;

/// Computes one horizontal distance slice from an elevation raster.
///
/// Implementations must return a raster of the same shape as `elevation`.
pub trait PlanarDistanceTransform {
    /// Signed distance of every cell to the terrain boundary at `height`.
    fn signed_distance_at_height(
        &self,
        elevation: &DMatrix<f32>,
        height: f32,
        resolution: f32,
    ) -> DMatrix<f32>;
}

impl<F> PlanarDistanceTransform for F
where
    F: Fn(&DMatrix<f32>, f32, f32) -> DMatrix<f32>,
{
    fn signed_distance_at_height(
        &self,
        elevation: &DMatrix<f32>,
        height: f32,
        resolution: f32,
    ) -> DMatrix<f32> {
        self(elevation, height, resolution)
    }
}

/// Exact Euclidean transform between cell centres.
///
/// Free cells measure to the nearest occupied cell and occupied cells to the
/// nearest free cell, both minus half a cell so the zero crossing lies on the
/// shared cell border. When a slice is entirely free or entirely occupied
/// there is no planar boundary and the vertical offset `height - elevation`
/// is used instead.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EuclideanDistanceTransform;

impl PlanarDistanceTransform for EuclideanDistanceTransform {
    fn signed_distance_at_height(
        &self,
        elevation: &DMatrix<f32>,
        height: f32,
        resolution: f32,
    ) -> DMatrix<f32> {
        signed_distance_at_height(elevation, height, resolution)
    }
}

/// Signed distance slice using [`EuclideanDistanceTransform`] semantics.
pub fn signed_distance_at_height(
    elevation: &DMatrix<f32>,
    height: f32,
    resolution: f32,
) -> DMatrix<f32> {
    let occupied = elevation.map(|e| e >= height);
    let any_occupied = occupied.iter().any(|&o| o);
    let any_free = occupied.iter().any(|&o| !o);

    if !(any_occupied && any_free) {
        return elevation.map(|e| height - e);
    }

    let to_occupied = squared_distance_transform(&occupied);
    let to_free = squared_distance_transform(&occupied.map(|o| !o));

    DMatrix::from_fn(elevation.nrows(), elevation.ncols(), |row, col| {
        let index = (row, col);
        if occupied[index] {
            -((to_free[index].sqrt() - 0.5) as f32) * resolution
        } else {
            ((to_occupied[index].sqrt() - 0.5) as f32) * resolution
        }
    })
}

/// Squared distance in cells from every cell centre to the nearest `true` cell.
///
/// Separable transform: columns first, then rows. Cells are infinitely far
/// away when the mask holds no `true` cell.
fn squared_distance_transform(targets: &DMatrix<bool>) -> DMatrix<f64> {
    let (rows, cols) = targets.shape();
    let mut distance = targets.map(|t| if t { 0.0 } else { f64::INFINITY });

    let mut envelope = LowerEnvelope::with_capacity(rows.max(cols));
    let mut input = Vec::with_capacity(rows.max(cols));
    let mut output = vec![0.0; rows.max(cols)];

    for col in 0..cols {
        input.clear();
        input.extend(distance.column(col).iter().copied());
        envelope.transform(&input, &mut output[..rows]);
        for (row, &value) in output[..rows].iter().enumerate() {
            distance[(row, col)] = value;
        }
    }

    for row in 0..rows {
        input.clear();
        input.extend(distance.row(row).iter().copied());
        envelope.transform(&input, &mut output[..cols]);
        for (col, &value) in output[..cols].iter().enumerate() {
            distance[(row, col)] = value;
        }
    }

    distance
}

/// Scratch space for the 1D lower envelope of parabolas.
struct LowerEnvelope {
    /// Positions of the parabolas that form the envelope.
    vertices: Vec<usize>,
    /// Left boundary of the region where each parabola is lowest.
    boundaries: Vec<f64>,
}

impl LowerEnvelope {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            boundaries: Vec::with_capacity(capacity),
        }
    }

    /// `output[q] = min_p (q - p)^2 + input[p]`, skipping infinite samples.
    fn transform(&mut self, input: &[f64], output: &mut [f64]) {
        self.vertices.clear();
        self.boundaries.clear();

        for (q, &fq) in input.iter().enumerate() {
            if !fq.is_finite() {
                continue;
            }
            let mut boundary = f64::NEG_INFINITY;
            while let (Some(&p), Some(&start)) = (self.vertices.last(), self.boundaries.last()) {
                let s = intersection(input, p, q);
                if s <= start {
                    self.vertices.pop();
                    self.boundaries.pop();
                    boundary = f64::NEG_INFINITY;
                } else {
                    boundary = s;
                    break;
                }
            }
            self.vertices.push(q);
            self.boundaries.push(boundary);
        }

        if self.vertices.is_empty() {
            output.fill(f64::INFINITY);
            return;
        }

        let mut k = 0;
        for (q, out) in output.iter_mut().enumerate() {
            let position = q as f64;
            while k + 1 < self.vertices.len() && self.boundaries[k + 1] < position {
                k += 1;
            }
            let p = self.vertices[k];
            let offset = position - p as f64;
            *out = offset * offset + input[p];
        }
    }
}

/// Abscissa where the parabolas rooted at `p` and `q > p` intersect.
fn intersection(f: &[f64], p: usize, q: usize) -> f64 {
    let (p_f, q_f) = (p as f64, q as f64);
    ((f[q] + q_f * q_f) - (f[p] + p_f * p_f)) / (2.0 * (q_f - p_f))
}
