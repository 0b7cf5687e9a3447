//! Error types for the `strata-map` crate.

#![warn(missing_docs)]

/// Errors that can occur while building or indexing a [`GridMap`](crate::GridMap).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum MapError {
    /// The cell size must be positive and finite.
    #[error("map resolution must be positive and finite, got {0}")]
    InvalidResolution(f64),

    /// The map must have at least one row and one column, and the cell count must fit in `usize`.
    #[error("invalid map dimensions: {rows}x{cols}")]
    InvalidDimensions {
        /// Number of rows requested.
        rows: usize,
        /// Number of columns requested.
        cols: usize,
    },

    /// A layer was added with a shape that differs from the map size.
    #[error("layer `{name}` has shape {rows}x{cols}, map is {expected_rows}x{expected_cols}")]
    LayerShapeMismatch {
        /// Name of the offending layer.
        name: String,
        /// Rows of the provided matrix.
        rows: usize,
        /// Columns of the provided matrix.
        cols: usize,
        /// Rows of the map.
        expected_rows: usize,
        /// Columns of the map.
        expected_cols: usize,
    },

    /// The requested layer does not exist.
    #[error("map has no layer named `{0}`")]
    MissingLayer(String),

    /// A cell index outside the map was requested.
    #[error("cell ({row}, {col}) is out of bounds")]
    OutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },

    /// A world position does not fall on any cell of the map.
    #[error("position ({x:.3}, {y:.3}) lies outside the map")]
    OutsideMap {
        /// World x coordinate.
        x: f64,
        /// World y coordinate.
        y: f64,
    },
}
