#![warn(missing_docs)]
//! Signed distance fields over elevation maps.
//!
//! This crate turns a 2D elevation layer of a [`GridMap`](strata_map::GridMap)
//! into a discretized 3D signed distance field for collision checking and
//! motion planning. The field stores, for every node of a regular 3D grid,
//! the distance to the terrain surface and its gradient. Queries at arbitrary
//! points snap to the nearest node and correct the value linearly.
//!
//! # Example
//!
//! ```
//! use nalgebra::{Vector2, Vector3};
//! use strata_map::GridMap;
//! use strata_sdf::SignedDistanceField;
//!
//! let mut map = GridMap::new(20, 20, 0.1, Vector2::zeros()).unwrap();
//! map.add_constant_layer("elevation", 0.0);
//!
//! let sdf = SignedDistanceField::new(&map, "elevation", -0.5, 1.0).unwrap();
//! let (distance, gradient) = sdf.value_and_gradient_at(&Vector3::new(0.0, 0.0, 0.5));
//! assert!((distance - 0.5).abs() < 0.05);
//! assert!(gradient.z > 0.9);
//! ```

pub mod derivatives;
pub mod distance_2d;
pub mod error;
pub mod field;
pub mod lookup;
pub mod point_cloud;

pub use distance_2d::{
    EuclideanDistanceTransform, PlanarDistanceTransform, signed_distance_at_height,
};
pub use error::SdfError;
pub use field::{FieldSample, SignedDistanceField};
pub use lookup::{GridLookup3D, GridSize, NodeIndex};
pub use point_cloud::FieldPoint;
