//! Finite differences over distance slices.
//!
//! Layer differences combine two horizontal slices into a vertical
//! derivative. Row and column differences act within one slice and take the
//! world spacing per index step as `delta`, so passing `-resolution` yields
//! derivatives along world x and y directly.

use nalgebra::DMatrix;

/// Forward difference between two consecutive layers: `(upper - lower) / delta`.
pub fn layer_finite_difference(
    lower: &DMatrix<f32>,
    upper: &DMatrix<f32>,
    delta: f32,
) -> DMatrix<f32> {
    (upper - lower) / delta
}

/// Central difference across a layer: `(upper - lower) / (2 * delta)`.
///
/// `lower` and `upper` are the slices one step below and above the layer.
pub fn layer_central_difference(
    lower: &DMatrix<f32>,
    upper: &DMatrix<f32>,
    delta: f32,
) -> DMatrix<f32> {
    (upper - lower) / (2.0 * delta)
}

/// Central difference along the row axis, `(d[r+1] - d[r-1]) / (2 * delta)`.
///
/// Missing neighbours at the first and last row are replaced by the edge
/// value, a raster with a single row has a zero derivative.
pub fn rowwise_central_difference(data: &DMatrix<f32>, delta: f32) -> DMatrix<f32> {
    let last_row = data.nrows().saturating_sub(1);
    let scale = 1.0 / (2.0 * delta);
    DMatrix::from_fn(data.nrows(), data.ncols(), |row, col| {
        let previous = row.saturating_sub(1);
        let next = (row + 1).min(last_row);
        (data[(next, col)] - data[(previous, col)]) * scale
    })
}

/// Central difference along the column axis, `(d[c+1] - d[c-1]) / (2 * delta)`.
///
/// Edges are handled as in [`rowwise_central_difference`].
pub fn columnwise_central_difference(data: &DMatrix<f32>, delta: f32) -> DMatrix<f32> {
    let last_col = data.ncols().saturating_sub(1);
    let scale = 1.0 / (2.0 * delta);
    DMatrix::from_fn(data.nrows(), data.ncols(), |row, col| {
        let previous = col.saturating_sub(1);
        let next = (col + 1).min(last_col);
        (data[(row, next)] - data[(row, previous)]) * scale
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn assert_matrix_eq(actual: &DMatrix<f32>, expected: &DMatrix<f32>) {
        assert_eq!(actual.shape(), expected.shape());
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!((a - e).abs() < EPSILON, "{} != {}\n{}\n{}", a, e, actual, expected);
        }
    }

    #[test]
    fn test_layer_differences() {
        let lower = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 2.0, 3.0]);
        let upper = DMatrix::from_row_slice(2, 2, &[0.5, 2.0, 2.0, 7.0]);

        let forward = layer_finite_difference(&lower, &upper, 0.5);
        assert_matrix_eq(&forward, &DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 8.0]));

        let central = layer_central_difference(&lower, &upper, 0.5);
        assert_matrix_eq(&central, &DMatrix::from_row_slice(2, 2, &[0.5, 1.0, 0.0, 4.0]));
    }

    #[test]
    fn test_rowwise_interior_and_edges() {
        // Values grow by 1 per row, 10 per column.
        let data = DMatrix::from_fn(4, 2, |row, col| row as f32 + 10.0 * col as f32);
        let diff = rowwise_central_difference(&data, 1.0);
        // Interior rows: (r+1 - (r-1)) / 2 = 1; edges use the clamped neighbour: 1 / 2.
        let expected = DMatrix::from_row_slice(4, 2, &[0.5, 0.5, 1.0, 1.0, 1.0, 1.0, 0.5, 0.5]);
        assert_matrix_eq(&diff, &expected);
    }

    #[test]
    fn test_columnwise_interior_and_edges() {
        let data = DMatrix::from_fn(2, 3, |row, col| row as f32 + 10.0 * col as f32);
        let diff = columnwise_central_difference(&data, 2.0);
        // Interior column: 20 / 4 = 5; edges: 10 / 4 = 2.5.
        let expected = DMatrix::from_row_slice(2, 3, &[2.5, 5.0, 2.5, 2.5, 5.0, 2.5]);
        assert_matrix_eq(&diff, &expected);
    }

    #[test]
    fn test_negative_delta_flips_sign() {
        let data = DMatrix::from_fn(3, 3, |row, col| 2.0 * row as f32 - col as f32);
        let dx = rowwise_central_difference(&data, -0.5);
        let dy = columnwise_central_difference(&data, -0.5);
        // d/drow = 2 per index; with a step of -0.5 m per index: -4 per meter.
        assert!((dx[(1, 1)] + 4.0).abs() < EPSILON);
        // d/dcol = -1 per index: +2 per meter.
        assert!((dy[(1, 1)] - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_single_row_and_column() {
        let data = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 4.0]);
        let dx = rowwise_central_difference(&data, 1.0);
        assert!(dx.iter().all(|v| v.abs() < EPSILON));

        let dy = columnwise_central_difference(&data, 1.0);
        assert_matrix_eq(&dy, &DMatrix::from_row_slice(1, 3, &[0.5, 1.5, 1.0]));
    }
}
