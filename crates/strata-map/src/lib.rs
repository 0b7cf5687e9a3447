#![warn(missing_docs)]
//! Elevation grid maps for terrain processing.
//!
//! A [`GridMap`] is a regular 2D raster of cells with any number of named
//! `f32` layers (typically an `"elevation"` layer). Indices follow the usual
//! grid map convention: cell `(0, 0)` sits at the corner of the map with the
//! largest world `x` and `y`, rows grow towards negative `x` and columns grow
//! towards negative `y`.

pub mod error;
pub mod grid_map;

pub use error::MapError;
pub use grid_map::{CellIndex, GridMap};
