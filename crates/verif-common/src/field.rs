//! Gridded scalar fields for spatial verification.

use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// A 2D scalar field on a regular grid, one variable at one valid time.
///
/// Values are stored in row-major order (row 0 first). Missing data is
/// represented by NaN and propagates through arithmetic; the scoring code
/// treats NaN pixels as absent, never as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridField {
    /// Field values in row-major order.
    #[serde(with = "crate::json::nan_f32_vec")]
    pub data: Vec<f32>,
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Optional coordinate metadata. Used by callers for domain cropping,
    /// never by the scoring math.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<GridCoords>,
}

/// Latitude/longitude arrays matching the field shape, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCoords {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
}

impl GridField {
    /// Create a field from row-major data.
    pub fn new(data: Vec<f32>, width: usize, height: usize) -> CommonResult<Self> {
        if data.len() != width * height {
            return Err(CommonError::GridSizeMismatch {
                width,
                height,
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            coords: None,
        })
    }

    /// Attach coordinate arrays (same shape as the data).
    pub fn with_coords(mut self, lat: Vec<f64>, lon: Vec<f64>) -> CommonResult<Self> {
        let expected = self.width * self.height;
        for arr in [&lat, &lon] {
            if arr.len() != expected {
                return Err(CommonError::CoordSizeMismatch {
                    expected,
                    actual: arr.len(),
                });
            }
        }
        self.coords = Some(GridCoords { lat, lon });
        Ok(self)
    }

    /// Build a field from a per-cell function of (row, col).
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Self {
            data,
            width,
            height,
            coords: None,
        }
    }

    /// Grid shape as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Whether another field has the same shape.
    pub fn same_shape(&self, other: &GridField) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Value at (row, col), or None if out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// Value at (row, col). Caller guarantees bounds.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    /// Number of finite (non-NaN, non-infinite) values.
    pub fn finite_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_finite()).count()
    }

    /// Minimum finite value, or None if no finite values exist.
    pub fn min_finite(&self) -> Option<f32> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some(v),
                Some(m) => Some(m.min(v)),
            })
    }

    /// Maximum finite value, or None if no finite values exist.
    pub fn max_finite(&self) -> Option<f32> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some(v),
                Some(m) => Some(m.max(v)),
            })
    }

    /// Length of the grid diagonal in pixel units.
    pub fn diagonal(&self) -> f64 {
        ((self.height as f64).powi(2) + (self.width as f64).powi(2)).sqrt()
    }

    /// Apply a function to every value, keeping shape and coordinates.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> GridField {
        GridField {
            data: self.data.iter().map(|&v| f(v)).collect(),
            width: self.width,
            height: self.height,
            coords: self.coords.clone(),
        }
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the field is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_bad_length() {
        assert!(GridField::new(vec![0.0; 5], 2, 3).is_err());
        assert!(GridField::new(vec![0.0; 6], 2, 3).is_ok());
    }

    #[test]
    fn test_get_and_at() {
        let field = GridField::from_fn(3, 2, |row, col| (row * 10 + col) as f32);
        assert_eq!(field.get(0, 0), Some(0.0));
        assert_eq!(field.get(1, 2), Some(12.0));
        assert_eq!(field.get(2, 0), None);
        assert_eq!(field.at(1, 1), 11.0);
    }

    #[test]
    fn test_finite_count_ignores_nan() {
        let field = GridField::new(vec![1.0, f32::NAN, 3.0, f32::NAN], 2, 2).unwrap();
        assert_eq!(field.finite_count(), 2);
        assert_eq!(field.min_finite(), Some(1.0));
        assert_eq!(field.max_finite(), Some(3.0));
    }

    #[test]
    fn test_all_nan_has_no_extrema() {
        let field = GridField::new(vec![f32::NAN; 4], 2, 2).unwrap();
        assert_eq!(field.finite_count(), 0);
        assert_eq!(field.min_finite(), None);
    }

    #[test]
    fn test_diagonal() {
        let field = GridField::from_fn(4, 3, |_, _| 0.0);
        assert!((field.diagonal() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_map_preserves_nan() {
        let field = GridField::new(vec![-1.0, f32::NAN, 2.0, 0.0], 2, 2).unwrap();
        let clamped = field.map(|v| if v < 0.0 { 0.0 } else { v });
        assert_eq!(clamped.at(0, 0), 0.0);
        assert!(clamped.at(0, 1).is_nan());
        assert_eq!(clamped.at(1, 0), 2.0);
    }

    #[test]
    fn test_coords_shape_checked() {
        let field = GridField::from_fn(2, 2, |_, _| 0.0);
        assert!(field.clone().with_coords(vec![0.0; 4], vec![0.0; 4]).is_ok());
        assert!(field.with_coords(vec![0.0; 3], vec![0.0; 4]).is_err());
    }

    #[test]
    fn test_serde_round_trip_with_nan() {
        let field = GridField::new(vec![1.5, f32::NAN, 0.0, -2.0], 2, 2).unwrap();
        let text = serde_json::to_string(&field).unwrap();
        let back: GridField = serde_json::from_str(&text).unwrap();
        assert_eq!(back.width, 2);
        assert_eq!(back.at(0, 0), 1.5);
        assert!(back.at(0, 1).is_nan());
        assert_eq!(back.at(1, 1), -2.0);
    }
}
