//! Index and position conversions for the 3D node grid.
//!
//! Nodes are addressed by `(row, col, layer)`. Rows and columns follow the
//! source elevation map and grow along negative world x and y, layers grow
//! along positive world z. The flat storage index is row-fastest, then
//! column, then layer.

use nalgebra::Vector3;

use crate::error::SdfError;

/// Integer coordinates of a node in the 3D grid.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeIndex {
    /// Row, grows along negative world x.
    pub row: usize,
    /// Column, grows along negative world y.
    pub col: usize,
    /// Layer, grows along positive world z.
    pub layer: usize,
}

impl NodeIndex {
    /// Creates a new `NodeIndex`.
    #[must_use]
    pub const fn new(row: usize, col: usize, layer: usize) -> Self {
        Self { row, col, layer }
    }
}

/// Extents of the 3D grid in nodes.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridSize {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Number of layers.
    pub layers: usize,
}

impl GridSize {
    /// Creates a new `GridSize`.
    #[must_use]
    pub const fn new(rows: usize, cols: usize, layers: usize) -> Self {
        Self { rows, cols, layers }
    }
}

/// Immutable mapping between node coordinates, flat indices and world positions.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridLookup3D {
    size: GridSize,
    /// World position of node (0, 0, 0).
    origin: Vector3<f64>,
    /// Node spacing, shared by all axes.
    resolution: f64,
    /// Number of nodes in one layer.
    layer_stride: usize,
    /// Total number of nodes.
    linear_size: usize,
}

impl GridLookup3D {
    /// Creates a lookup for a grid of `size` nodes.
    ///
    /// # Errors
    /// Returns [`SdfError::InvalidGridSize`] if an extent is zero or the node count
    /// overflows `usize`, and [`SdfError::InvalidResolution`] if `resolution` is
    /// not positive and finite.
    pub fn new(size: GridSize, origin: Vector3<f64>, resolution: f64) -> Result<Self, SdfError> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(SdfError::InvalidResolution(resolution));
        }

        let invalid = SdfError::InvalidGridSize {
            rows: size.rows,
            cols: size.cols,
            layers: size.layers,
        };
        if size.rows == 0 || size.cols == 0 || size.layers == 0 {
            return Err(invalid);
        }
        let layer_stride = size.rows.checked_mul(size.cols).ok_or(invalid.clone())?;
        let linear_size = layer_stride.checked_mul(size.layers).ok_or(invalid)?;

        Ok(GridLookup3D {
            size,
            origin,
            resolution,
            layer_stride,
            linear_size,
        })
    }

    /// Grid extents.
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// World position of node (0, 0, 0).
    pub fn origin(&self) -> &Vector3<f64> {
        &self.origin
    }

    /// Node spacing in meters.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Total number of nodes.
    pub fn linear_size(&self) -> usize {
        self.linear_size
    }

    /// Nearest node to a world position, clamped into the grid.
    ///
    /// Positions outside the grid resolve to the closest boundary node, so the
    /// returned index is always valid.
    pub fn nearest_node(&self, position: &Vector3<f64>) -> NodeIndex {
        let row = (self.origin.x - position.x) / self.resolution;
        let col = (self.origin.y - position.y) / self.resolution;
        let layer = (position.z - self.origin.z) / self.resolution;
        NodeIndex {
            row: nearest_clamped_index(row, self.size.rows - 1),
            col: nearest_clamped_index(col, self.size.cols - 1),
            layer: nearest_clamped_index(layer, self.size.layers - 1),
        }
    }

    /// World position of a node.
    pub fn node_position(&self, node: NodeIndex) -> Vector3<f64> {
        Vector3::new(
            self.origin.x - node.row as f64 * self.resolution,
            self.origin.y - node.col as f64 * self.resolution,
            self.origin.z + node.layer as f64 * self.resolution,
        )
    }

    /// Flat storage index of a node.
    pub fn linear_index(&self, node: NodeIndex) -> usize {
        node.row + node.col * self.size.rows + node.layer * self.layer_stride
    }

    /// Node stored at a flat index. Inverse of [`Self::linear_index`].
    pub fn node_from_linear_index(&self, index: usize) -> NodeIndex {
        let layer = index / self.layer_stride;
        let in_layer = index % self.layer_stride;
        NodeIndex {
            row: in_layer % self.size.rows,
            col: in_layer / self.size.rows,
            layer,
        }
    }
}

/// Rounds to the nearest index in `[0, max_index]`.
///
/// Bounds are compared as floats so very large or negative values cannot wrap.
fn nearest_clamped_index(value: f64, max_index: usize) -> usize {
    value.round().clamp(0.0, max_index as f64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn lookup() -> GridLookup3D {
        GridLookup3D::new(
            GridSize::new(4, 3, 5),
            Vector3::new(1.0, 2.0, -0.5),
            0.2,
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_creation() {
        let origin = Vector3::zeros();
        assert!(matches!(
            GridLookup3D::new(GridSize::new(0, 3, 2), origin, 1.0),
            Err(SdfError::InvalidGridSize { rows: 0, .. })
        ));
        assert!(matches!(
            GridLookup3D::new(GridSize::new(3, 3, 2), origin, -1.0),
            Err(SdfError::InvalidResolution(_))
        ));
        assert!(matches!(
            GridLookup3D::new(GridSize::new(usize::MAX, 2, 2), origin, 1.0),
            Err(SdfError::InvalidGridSize { .. })
        ));
    }

    #[test]
    fn test_linear_size_and_index() {
        let lookup = lookup();
        assert_eq!(lookup.linear_size(), 60);
        assert_eq!(lookup.linear_index(NodeIndex::new(0, 0, 0)), 0);
        assert_eq!(lookup.linear_index(NodeIndex::new(1, 0, 0)), 1);
        assert_eq!(lookup.linear_index(NodeIndex::new(0, 1, 0)), 4);
        assert_eq!(lookup.linear_index(NodeIndex::new(0, 0, 1)), 12);
        assert_eq!(lookup.linear_index(NodeIndex::new(3, 2, 4)), 59);
    }

    #[test]
    fn test_linear_index_is_bijective() {
        let lookup = lookup();
        for index in 0..lookup.linear_size() {
            let node = lookup.node_from_linear_index(index);
            assert_eq!(lookup.linear_index(node), index);
        }
    }

    #[test]
    fn test_axis_directions() {
        let lookup = lookup();
        let base = lookup.node_position(NodeIndex::new(1, 1, 1));

        let next_row = lookup.node_position(NodeIndex::new(2, 1, 1));
        assert!((next_row - base - Vector3::new(-0.2, 0.0, 0.0)).norm() < EPSILON);

        let next_col = lookup.node_position(NodeIndex::new(1, 2, 1));
        assert!((next_col - base - Vector3::new(0.0, -0.2, 0.0)).norm() < EPSILON);

        let next_layer = lookup.node_position(NodeIndex::new(1, 1, 2));
        assert!((next_layer - base - Vector3::new(0.0, 0.0, 0.2)).norm() < EPSILON);

        let origin = lookup.node_position(NodeIndex::new(0, 0, 0));
        assert!((origin - lookup.origin()).norm() < EPSILON);
    }

    #[test]
    fn test_node_position_round_trip() {
        let lookup = lookup();
        let size = lookup.size();
        for layer in 0..size.layers {
            for col in 0..size.cols {
                for row in 0..size.rows {
                    let node = NodeIndex::new(row, col, layer);
                    let position = lookup.node_position(node);
                    assert_eq!(lookup.nearest_node(&position), node);
                }
            }
        }
    }

    #[test]
    fn test_nearest_node_rounds() {
        let lookup = lookup();
        // Slightly less than half a cell towards the next node in every axis.
        let p = lookup.node_position(NodeIndex::new(1, 1, 1)) + Vector3::new(-0.09, -0.09, 0.09);
        assert_eq!(lookup.nearest_node(&p), NodeIndex::new(1, 1, 1));

        let p = lookup.node_position(NodeIndex::new(1, 1, 1)) + Vector3::new(-0.11, -0.11, 0.11);
        assert_eq!(lookup.nearest_node(&p), NodeIndex::new(2, 2, 2));
    }

    #[test]
    fn test_nearest_node_clamps() {
        let lookup = lookup();
        let far_positive = Vector3::new(100.0, 100.0, 100.0);
        assert_eq!(lookup.nearest_node(&far_positive), NodeIndex::new(0, 0, 4));

        let far_negative = Vector3::new(-100.0, -100.0, -100.0);
        assert_eq!(lookup.nearest_node(&far_negative), NodeIndex::new(3, 2, 0));

        let huge = Vector3::new(f64::MAX, f64::MIN, f64::MAX);
        assert_eq!(lookup.nearest_node(&huge), NodeIndex::new(0, 2, 4));
    }
}
