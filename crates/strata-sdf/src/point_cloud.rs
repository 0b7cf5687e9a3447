//! Flat point export of the field for diagnostics and visualization.

use crate::field::SignedDistanceField;

/// One field node as a point with its distance as intensity.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldPoint {
    /// World x (m).
    pub x: f32,
    /// World y (m).
    pub y: f32,
    /// World z (m).
    pub z: f32,
    /// Signed distance at the node (m).
    pub intensity: f32,
}

impl SignedDistanceField {
    /// One point per node at its world position, in storage order
    /// (layer outer, column middle, row inner).
    pub fn as_point_cloud(&self) -> Vec<FieldPoint> {
        let lookup = self.lookup();
        self.samples()
            .iter()
            .enumerate()
            .map(|(index, sample)| {
                let position = lookup.node_position(lookup.node_from_linear_index(index));
                FieldPoint {
                    x: position.x as f32,
                    y: position.y as f32,
                    z: position.z as f32,
                    intensity: sample.distance,
                }
            })
            .collect()
    }
}
