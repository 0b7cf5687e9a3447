//! Layered 2D grid map.
//!
//! This module provides the [`GridMap`] raster used as input for terrain
//! processing, together with the conversions between cell indices and world
//! positions.

#![warn(missing_docs)]

use std::collections::BTreeMap;
use std::fmt;

use nalgebra::{DMatrix, Vector2};
use tracing::debug;

use crate::error::MapError;

/// Index of a cell in a [`GridMap`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellIndex {
    /// Row index, grows along negative world x.
    pub row: usize,
    /// Column index, grows along negative world y.
    pub col: usize,
}

impl CellIndex {
    /// Creates a new `CellIndex`.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A regular 2D grid with named `f32` layers.
///
/// All layers share the map geometry: `rows × cols` cells of side
/// `resolution`, centred on `position` in the world frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridMap {
    /// Number of cells along the row axis (world x).
    rows: usize,
    /// Number of cells along the column axis (world y).
    cols: usize,
    /// Side length of a cell in meters.
    resolution: f64,
    /// World position of the map centre.
    position: Vector2<f64>,
    /// Layer data, every matrix is `rows × cols`.
    layers: BTreeMap<String, DMatrix<f32>>,
}

impl GridMap {
    /// Creates an empty map without layers.
    ///
    /// # Arguments
    /// * `rows` - Number of cells along world x
    /// * `cols` - Number of cells along world y
    /// * `resolution` - Cell size in meters
    /// * `position` - World position of the map centre
    ///
    /// # Errors
    /// Returns [`MapError::InvalidDimensions`] if either dimension is zero or the
    /// cell count overflows, and [`MapError::InvalidResolution`] if `resolution`
    /// is not a positive finite number.
    pub fn new(
        rows: usize,
        cols: usize,
        resolution: f64,
        position: Vector2<f64>,
    ) -> Result<Self, MapError> {
        if rows == 0 || cols == 0 || rows.checked_mul(cols).is_none() {
            return Err(MapError::InvalidDimensions { rows, cols });
        }
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(MapError::InvalidResolution(resolution));
        }

        Ok(GridMap {
            rows,
            cols,
            resolution,
            position,
            layers: BTreeMap::new(),
        })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Map size as `(rows, cols)`.
    pub fn size(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Cell size in meters.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// World position of the map centre.
    pub fn position(&self) -> &Vector2<f64> {
        &self.position
    }

    /// Side lengths of the map in meters along world x and y.
    pub fn length(&self) -> Vector2<f64> {
        Vector2::new(
            self.rows as f64 * self.resolution,
            self.cols as f64 * self.resolution,
        )
    }

    /// Adds or replaces a layer.
    ///
    /// # Errors
    /// Returns [`MapError::LayerShapeMismatch`] if `data` is not `rows × cols`.
    pub fn add_layer(
        &mut self,
        name: impl Into<String>,
        data: DMatrix<f32>,
    ) -> Result<(), MapError> {
        let name = name.into();
        if data.nrows() != self.rows || data.ncols() != self.cols {
            return Err(MapError::LayerShapeMismatch {
                name,
                rows: data.nrows(),
                cols: data.ncols(),
                expected_rows: self.rows,
                expected_cols: self.cols,
            });
        }

        self.insert_layer(name, data);
        Ok(())
    }

    /// Adds or replaces a layer holding the same value in every cell.
    pub fn add_constant_layer(&mut self, name: impl Into<String>, value: f32) {
        let data = DMatrix::from_element(self.rows, self.cols, value);
        self.insert_layer(name.into(), data);
    }

    /// Adds or replaces a layer by evaluating `f` at the world position of every cell centre.
    pub fn add_layer_from_fn<F>(&mut self, name: impl Into<String>, mut f: F)
    where
        F: FnMut(Vector2<f64>) -> f32,
    {
        let data = DMatrix::from_fn(self.rows, self.cols, |row, col| {
            f(self.cell_position(CellIndex::new(row, col)))
        });
        self.insert_layer(name.into(), data);
    }

    /// Inserts a layer already checked for shape.
    fn insert_layer(&mut self, name: String, data: DMatrix<f32>) {
        debug!(layer = %name, rows = self.rows, cols = self.cols, "Adding map layer");
        self.layers.insert(name, data);
    }

    /// Returns true if the map holds a layer called `name`.
    pub fn has_layer(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    /// Names of all layers in lexical order.
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    /// Gets a layer by name.
    ///
    /// # Errors
    /// Returns [`MapError::MissingLayer`] if there is no such layer.
    pub fn get(&self, name: &str) -> Result<&DMatrix<f32>, MapError> {
        self.layers
            .get(name)
            .ok_or_else(|| MapError::MissingLayer(name.to_owned()))
    }

    /// Gets a mutable reference to a layer by name.
    ///
    /// # Errors
    /// Returns [`MapError::MissingLayer`] if there is no such layer.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut DMatrix<f32>, MapError> {
        self.layers
            .get_mut(name)
            .ok_or_else(|| MapError::MissingLayer(name.to_owned()))
    }

    /// Removes a layer, returning its data if it existed.
    pub fn remove_layer(&mut self, name: &str) -> Option<DMatrix<f32>> {
        self.layers.remove(name)
    }

    /// World position of the centre of a cell.
    ///
    /// # Errors
    /// Returns [`MapError::OutOfBounds`] if the index lies outside the map.
    pub fn position_of(&self, index: CellIndex) -> Result<Vector2<f64>, MapError> {
        if index.row >= self.rows || index.col >= self.cols {
            return Err(MapError::OutOfBounds {
                row: index.row,
                col: index.col,
            });
        }
        Ok(self.cell_position(index))
    }

    /// Index of the cell containing a world position.
    ///
    /// # Errors
    /// Returns [`MapError::OutsideMap`] if the position does not fall on the map.
    pub fn index_of(&self, position: &Vector2<f64>) -> Result<CellIndex, MapError> {
        let corner = self.position + self.length() / 2.0;
        let row_f = ((corner.x - position.x) / self.resolution).floor();
        let col_f = ((corner.y - position.y) / self.resolution).floor();

        let inside = row_f >= 0.0
            && col_f >= 0.0
            && row_f < self.rows as f64
            && col_f < self.cols as f64;
        if !inside {
            return Err(MapError::OutsideMap {
                x: position.x,
                y: position.y,
            });
        }

        Ok(CellIndex::new(row_f as usize, col_f as usize))
    }

    /// Returns true if the world position falls on a cell of the map.
    pub fn is_inside(&self, position: &Vector2<f64>) -> bool {
        self.index_of(position).is_ok()
    }

    /// Cell centre without bounds checking.
    fn cell_position(&self, index: CellIndex) -> Vector2<f64> {
        let corner = self.position + self.length() / 2.0;
        Vector2::new(
            corner.x - (index.row as f64 + 0.5) * self.resolution,
            corner.y - (index.col as f64 + 0.5) * self.resolution,
        )
    }
}

impl fmt::Display for GridMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "GridMap ({}x{}, resolution: {:.3}m)",
            self.rows, self.cols, self.resolution
        )?;
        writeln!(f, "Position: ({:.3}, {:.3})", self.position.x, self.position.y)?;
        for (name, data) in &self.layers {
            writeln!(
                f,
                "Layer `{}`: min {:.3}, max {:.3}",
                name,
                data.min(),
                data.max()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    const EPSILON: f64 = 1e-9;

    fn map_5x5() -> GridMap {
        GridMap::new(5, 5, 1.0, Vector2::zeros()).unwrap()
    }

    #[test]
    fn test_map_creation() {
        let map = GridMap::new(4, 6, 0.1, Vector2::new(1.0, -2.0)).unwrap();
        assert_eq!(map.size(), (4, 6));
        assert_eq!(map.resolution(), 0.1);
        assert!((map.length().x - 0.4).abs() < EPSILON);
        assert!((map.length().y - 0.6).abs() < EPSILON);
        assert_eq!(map.layer_names().count(), 0);
    }

    #[test]
    fn test_invalid_creation() {
        assert!(matches!(
            GridMap::new(0, 5, 1.0, Vector2::zeros()),
            Err(MapError::InvalidDimensions { rows: 0, cols: 5 })
        ));
        assert!(matches!(
            GridMap::new(5, 0, 1.0, Vector2::zeros()),
            Err(MapError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            GridMap::new(5, 5, 0.0, Vector2::zeros()),
            Err(MapError::InvalidResolution(_))
        ));
        assert!(matches!(
            GridMap::new(5, 5, f64::NAN, Vector2::zeros()),
            Err(MapError::InvalidResolution(_))
        ));
    }

    #[test]
    fn test_corner_cell_position() {
        let map = map_5x5();
        // Cell (0, 0) is at the +x/+y corner.
        let p = map.position_of(CellIndex::new(0, 0)).unwrap();
        assert!((p.x - 2.0).abs() < EPSILON);
        assert!((p.y - 2.0).abs() < EPSILON);

        let p = map.position_of(CellIndex::new(4, 4)).unwrap();
        assert!((p.x + 2.0).abs() < EPSILON);
        assert!((p.y + 2.0).abs() < EPSILON);

        let centre = map.position_of(CellIndex::new(2, 2)).unwrap();
        assert!(centre.norm() < EPSILON);
    }

    #[test]
    fn test_row_and_col_directions() {
        let map = GridMap::new(3, 3, 0.5, Vector2::new(10.0, 20.0)).unwrap();
        let base = map.position_of(CellIndex::new(1, 1)).unwrap();
        let next_row = map.position_of(CellIndex::new(2, 1)).unwrap();
        let next_col = map.position_of(CellIndex::new(1, 2)).unwrap();
        assert!((next_row.x - (base.x - 0.5)).abs() < EPSILON);
        assert!((next_row.y - base.y).abs() < EPSILON);
        assert!((next_col.y - (base.y - 0.5)).abs() < EPSILON);
        assert!((next_col.x - base.x).abs() < EPSILON);
    }

    #[test]
    fn test_index_position_round_trip() {
        let map = GridMap::new(7, 4, 0.25, Vector2::new(-1.0, 3.0)).unwrap();
        for row in 0..7 {
            for col in 0..4 {
                let index = CellIndex::new(row, col);
                let p = map.position_of(index).unwrap();
                assert_eq!(map.index_of(&p).unwrap(), index);
            }
        }
    }

    #[test]
    fn test_out_of_bounds() {
        let map = map_5x5();
        assert!(matches!(
            map.position_of(CellIndex::new(5, 0)),
            Err(MapError::OutOfBounds { row: 5, col: 0 })
        ));
        assert!(matches!(
            map.index_of(&Vector2::new(2.6, 0.0)),
            Err(MapError::OutsideMap { .. })
        ));
        assert!(!map.is_inside(&Vector2::new(0.0, -2.6)));
        assert!(map.is_inside(&Vector2::new(2.4, -2.4)));
    }

    #[test]
    fn test_layers() {
        let mut map = map_5x5();
        map.add_constant_layer("elevation", 1.5);
        assert!(map.has_layer("elevation"));
        assert_eq!(map.get("elevation").unwrap()[(3, 4)], 1.5);

        map.get_mut("elevation").unwrap()[(0, 0)] = -1.0;
        assert_eq!(map.get("elevation").unwrap()[(0, 0)], -1.0);

        assert!(matches!(
            map.get("variance"),
            Err(MapError::MissingLayer(name)) if name == "variance"
        ));

        let wrong = DMatrix::zeros(4, 5);
        assert!(matches!(
            map.add_layer("bad", wrong),
            Err(MapError::LayerShapeMismatch { expected_rows: 5, .. })
        ));

        assert!(map.remove_layer("elevation").is_some());
        assert!(!map.has_layer("elevation"));
    }

    #[test]
    fn test_layer_from_fn() {
        let mut map = map_5x5();
        map.add_layer_from_fn("elevation", |p| p.x as f32);
        let elevation = map.get("elevation").unwrap();
        assert_eq!(elevation[(0, 3)], 2.0);
        assert_eq!(elevation[(4, 0)], -2.0);
    }

    /// Counts every event emitted while it is the default subscriber.
    struct EventCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for EventCounter {
        fn on_event(&self, _event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_every_layer_insert_is_logged() {
        let mut map = map_5x5();
        let events = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(EventCounter(events.clone()));

        tracing::subscriber::with_default(subscriber, || {
            map.add_layer("elevation", DMatrix::zeros(5, 5)).unwrap();
            map.add_constant_layer("variance", 0.1);
            map.add_layer_from_fn("slope", |p| p.y as f32);
        });

        assert_eq!(events.load(Ordering::SeqCst), 3);
        assert_eq!(map.layer_names().count(), 3);
    }

    #[test]
    fn test_display() {
        let mut map = map_5x5();
        map.add_constant_layer("elevation", 0.25);
        let display_str = format!("{}", map);
        assert!(display_str.contains("GridMap (5x5"));
        assert!(display_str.contains("Layer `elevation`"));
        assert!(display_str.contains("0.250"));
    }
}
