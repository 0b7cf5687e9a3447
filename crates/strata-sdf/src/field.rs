//! Signed distance field over an elevation map.
//!
//! The field is built once, layer by layer, from horizontal distance slices
//! and is read-only afterwards. Every node stores its distance together with
//! the distance gradient in world coordinates, so a query at an arbitrary
//! point is answered from the nearest node with a first order correction.

use std::time::Instant;

use nalgebra::{DMatrix, Vector3};
use strata_map::{CellIndex, GridMap};
use tracing::{debug, info, trace};

use crate::derivatives::{
    columnwise_central_difference, layer_central_difference, layer_finite_difference,
    rowwise_central_difference,
};
use crate::distance_2d::{EuclideanDistanceTransform, PlanarDistanceTransform};
use crate::error::SdfError;
use crate::lookup::{GridLookup3D, GridSize, NodeIndex};

/// Distance and world-frame gradient stored at one node.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldSample {
    /// Signed distance to the terrain surface (m).
    pub distance: f32,
    /// Derivative of the distance along world x.
    pub dx: f32,
    /// Derivative of the distance along world y.
    pub dy: f32,
    /// Derivative of the distance along world z.
    pub dz: f32,
}

impl FieldSample {
    /// Gradient as a vector.
    pub fn gradient(&self) -> Vector3<f64> {
        Vector3::new(self.dx as f64, self.dy as f64, self.dz as f64)
    }
}

/// Discretized 3D signed distance field of a terrain.
///
/// Nodes share the horizontal grid of the source map and are stacked in
/// layers of one map resolution between the requested heights. The field is
/// immutable, a changed terrain needs a new field.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignedDistanceField {
    lookup: GridLookup3D,
    /// One sample per node, in [`GridLookup3D::linear_index`] order.
    samples: Vec<FieldSample>,
}

impl SignedDistanceField {
    /// Builds the field from the `elevation_layer` of `map` between
    /// `min_height` and `max_height`, using the [`EuclideanDistanceTransform`].
    ///
    /// The grid has `max(ceil((max_height - min_height) / resolution), 2)`
    /// layers, the first one at `min_height`.
    ///
    /// # Errors
    /// See [`Self::with_transform`].
    pub fn new(
        map: &GridMap,
        elevation_layer: &str,
        min_height: f64,
        max_height: f64,
    ) -> Result<Self, SdfError> {
        Self::with_transform(
            map,
            elevation_layer,
            min_height,
            max_height,
            &EuclideanDistanceTransform,
        )
    }

    /// Builds the field using a custom planar distance transform.
    ///
    /// # Errors
    /// * [`SdfError::InvalidHeightRange`] if `max_height < min_height` or a bound is not finite.
    /// * [`SdfError::Map`] if the map has no `elevation_layer`.
    /// * [`SdfError::NonFiniteElevation`] if the elevation holds NaN or infinite values.
    /// * [`SdfError::InvalidGridSize`] if the grid has too many nodes to address or store.
    /// * [`SdfError::SliceShapeMismatch`] if `transform` returns a slice of the wrong shape.
    pub fn with_transform<T>(
        map: &GridMap,
        elevation_layer: &str,
        min_height: f64,
        max_height: f64,
        transform: &T,
    ) -> Result<Self, SdfError>
    where
        T: PlanarDistanceTransform + ?Sized,
    {
        if !min_height.is_finite() || !max_height.is_finite() || max_height < min_height {
            return Err(SdfError::InvalidHeightRange {
                min_height,
                max_height,
            });
        }

        let elevation = map.get(elevation_layer)?;
        if let Some(position) = elevation.iter().position(|e| !e.is_finite()) {
            return Err(SdfError::NonFiniteElevation {
                row: position % elevation.nrows(),
                col: position / elevation.nrows(),
            });
        }

        let resolution = map.resolution();
        let (rows, cols) = map.size();
        // At least two layers so the vertical difference is always defined.
        let span = ((max_height - min_height) / resolution).ceil().max(2.0);
        if span >= usize::MAX as f64 {
            return Err(SdfError::InvalidGridSize {
                rows,
                cols,
                layers: usize::MAX,
            });
        }
        let layers = span as usize;
        let corner = map.position_of(CellIndex::new(0, 0))?;
        let lookup = GridLookup3D::new(
            GridSize::new(rows, cols, layers),
            Vector3::new(corner.x, corner.y, min_height),
            resolution,
        )?;

        debug!(
            rows,
            cols,
            layers,
            resolution,
            min_height,
            max_height,
            "Building signed distance field"
        );
        let start = Instant::now();

        let mut samples = Vec::new();
        samples
            .try_reserve_exact(lookup.linear_size())
            .map_err(|_| SdfError::InvalidGridSize {
                rows,
                cols,
                layers,
            })?;

        let mut field = SignedDistanceField { lookup, samples };
        field.compute_signed_distance(elevation, transform)?;
        debug_assert_eq!(field.samples.len(), lookup.linear_size());

        info!(
            nodes = field.samples.len(),
            layers,
            elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
            "Signed distance field built"
        );
        Ok(field)
    }

    /// Slides a three slice window (previous, current, next) up the layers.
    ///
    /// Buffers are addressed by index and the oldest one is overwritten by
    /// the next slice, so at most three slices are alive at once.
    fn compute_signed_distance<T>(
        &mut self,
        elevation: &DMatrix<f32>,
        transform: &T,
    ) -> Result<(), SdfError>
    where
        T: PlanarDistanceTransform + ?Sized,
    {
        let layers = self.lookup.size().layers;
        let resolution = self.lookup.resolution() as f32;

        let mut slices = [
            self.slice_at_layer(elevation, transform, 0)?,
            self.slice_at_layer(elevation, transform, 1)?,
            DMatrix::zeros(0, 0),
        ];
        let (mut previous, mut current, mut next) = (2, 0, 1);

        // First layer: forward difference in z
        let dz = layer_finite_difference(&slices[current], &slices[next], resolution);
        self.push_layer(&slices[current], dz);

        // Middle layers: central difference in z
        for layer in 1..layers - 1 {
            (previous, current, next) = (current, next, previous);
            slices[next] = self.slice_at_layer(elevation, transform, layer + 1)?;

            let dz = layer_central_difference(&slices[previous], &slices[next], resolution);
            self.push_layer(&slices[current], dz);
        }

        // Last layer: the central helper over the final two slices
        (previous, current) = (current, next);
        let dz = layer_central_difference(&slices[previous], &slices[current], resolution);
        self.push_layer(&slices[current], dz);

        Ok(())
    }

    /// Distance slice at the height of `layer`, checked for shape.
    fn slice_at_layer<T>(
        &self,
        elevation: &DMatrix<f32>,
        transform: &T,
        layer: usize,
    ) -> Result<DMatrix<f32>, SdfError>
    where
        T: PlanarDistanceTransform + ?Sized,
    {
        let height =
            (self.lookup.origin().z + layer as f64 * self.lookup.resolution()) as f32;
        let resolution = self.lookup.resolution() as f32;
        let slice = transform.signed_distance_at_height(elevation, height, resolution);
        trace!(layer, height, "Computed distance slice");

        if slice.shape() != elevation.shape() {
            return Err(SdfError::SliceShapeMismatch {
                height,
                rows: slice.nrows(),
                cols: slice.ncols(),
                expected_rows: elevation.nrows(),
                expected_cols: elevation.ncols(),
            });
        }
        Ok(slice)
    }

    /// Appends the samples of one layer.
    fn push_layer(&mut self, distance: &DMatrix<f32>, dz: DMatrix<f32>) {
        let delta = -(self.lookup.resolution() as f32);
        // Row and column steps move along negative world x and y.
        let dx = rowwise_central_difference(distance, delta);
        let dy = columnwise_central_difference(distance, delta);

        // Column-major iteration matches the row-fastest storage order.
        let layer = distance
            .iter()
            .zip(dx.iter())
            .zip(dy.iter())
            .zip(dz.iter())
            .map(|(((&distance, &dx), &dy), &dz)| FieldSample {
                distance,
                dx,
                dy,
                dz,
            });
        self.samples.extend(layer);
    }

    /// Grid geometry of the field.
    pub fn lookup(&self) -> &GridLookup3D {
        &self.lookup
    }

    /// All samples in storage order.
    pub fn samples(&self) -> &[FieldSample] {
        &self.samples
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed field.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample stored at a node, `None` if the node is outside the grid.
    pub fn sample_at_node(&self, node: NodeIndex) -> Option<&FieldSample> {
        let size = self.lookup.size();
        if node.row >= size.rows || node.col >= size.cols || node.layer >= size.layers {
            return None;
        }
        self.samples.get(self.lookup.linear_index(node))
    }

    /// Signed distance at a world position.
    ///
    /// Taken from the nearest node and corrected linearly with the node
    /// gradient. Positions outside the grid use the nearest boundary node.
    pub fn value_at(&self, position: &Vector3<f64>) -> f64 {
        self.value_and_gradient_at(position).0
    }

    /// Gradient of the signed distance at the node nearest to `position`.
    pub fn gradient_at(&self, position: &Vector3<f64>) -> Vector3<f64> {
        let node = self.lookup.nearest_node(position);
        self.node_sample(node).gradient()
    }

    /// Distance and gradient with a single node lookup.
    pub fn value_and_gradient_at(&self, position: &Vector3<f64>) -> (f64, Vector3<f64>) {
        let node = self.lookup.nearest_node(position);
        let sample = self.node_sample(node);
        let gradient = sample.gradient();
        let offset = position - self.lookup.node_position(node);
        (sample.distance as f64 + gradient.dot(&offset), gradient)
    }

    /// Sample of a node returned by [`GridLookup3D::nearest_node`].
    fn node_sample(&self, node: NodeIndex) -> FieldSample {
        // The constructor guarantees one sample per node and nearest_node clamps into the grid.
        self.samples[self.lookup.linear_index(node)]
    }
}
