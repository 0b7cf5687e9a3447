//! Error types for signed distance field construction.

use strata_map::MapError;

/// Errors that can occur while building a [`SignedDistanceField`](crate::SignedDistanceField).
///
/// Queries never fail; every variant here is raised before a field is handed out.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum SdfError {
    /// The height range is empty, inverted or not finite.
    #[error("invalid height range: min {min_height} must not exceed max {max_height}")]
    InvalidHeightRange {
        /// Lower bound of the requested range.
        min_height: f64,
        /// Upper bound of the requested range.
        max_height: f64,
    },

    /// The grid resolution must be positive and finite.
    #[error("grid resolution must be positive and finite, got {0}")]
    InvalidResolution(f64),

    /// The 3D grid has a zero extent or too many nodes to address.
    #[error("invalid grid size: {rows}x{cols}x{layers}")]
    InvalidGridSize {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
        /// Number of layers.
        layers: usize,
    },

    /// The source map could not provide the requested data.
    #[error(transparent)]
    Map(#[from] MapError),

    /// The elevation layer holds a NaN or infinite value.
    #[error("elevation at cell ({row}, {col}) is not finite")]
    NonFiniteElevation {
        /// Row of the first offending cell.
        row: usize,
        /// Column of the first offending cell.
        col: usize,
    },

    /// A planar distance transform returned a slice of the wrong shape.
    #[error("distance slice at height {height} has shape {rows}x{cols}, expected {expected_rows}x{expected_cols}")]
    SliceShapeMismatch {
        /// Height of the slice.
        height: f32,
        /// Rows returned.
        rows: usize,
        /// Columns returned.
        cols: usize,
        /// Rows of the elevation raster.
        expected_rows: usize,
        /// Columns of the elevation raster.
        expected_cols: usize,
    },
}
