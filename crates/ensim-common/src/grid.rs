//! Grid header model for rectangular-cell datasets.

use crate::GridArray;
use serde::{Deserialize, Serialize};

/// Parameters of a rotated lat/lon projection.
///
/// The grid north pole terms are carried so that rotated grids can be
/// round-tripped without re-deriving them; they omit the half-cell offset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub centre_latitude: f64,
    pub centre_longitude: f64,
    pub rotation_latitude: f64,
    pub rotation_longitude: f64,
    pub grid_north_pole_latitude: f64,
    pub grid_north_pole_longitude: f64,
    pub north_pole_grid_longitude: f64,
}

/// Supported grid projections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    /// Plate carree, keyword `LATLONG`.
    LatLong,
    /// Rotated plate carree, keyword `ROTLATLONG`.
    RotatedLatLong(Rotation),
}

impl Projection {
    /// Header keyword for this projection.
    pub fn keyword(&self) -> &'static str {
        match self {
            Projection::LatLong => "LATLONG",
            Projection::RotatedLatLong(_) => "ROTLATLONG",
        }
    }

    pub fn is_rotated(&self) -> bool {
        matches!(self, Projection::RotatedLatLong(_))
    }
}

/// Projection and extent of a grid dataset.
///
/// The origin is the grid corner, half a cell away from the first data
/// point in each direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridHeader {
    pub projection: Projection,
    pub ellipsoid: String,
    pub x_origin: f64,
    pub y_origin: f64,
    pub x_count: usize,
    pub y_count: usize,
    pub x_delta: f64,
    pub y_delta: f64,
}

impl GridHeader {
    /// Create an unrotated lat/lon header.
    pub fn lat_long(
        x_origin: f64,
        y_origin: f64,
        x_count: usize,
        y_count: usize,
        x_delta: f64,
        y_delta: f64,
    ) -> Self {
        Self {
            projection: Projection::LatLong,
            ellipsoid: "SPHERE".to_string(),
            x_origin,
            y_origin,
            x_count,
            y_count,
            x_delta,
            y_delta,
        }
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.x_count * self.y_count
    }

    /// Check the extent invariants (positive counts and deltas).
    pub fn validate(&self) -> Result<(), String> {
        if self.x_count == 0 || self.y_count == 0 {
            return Err(format!(
                "cell counts must be positive, got {}x{}",
                self.x_count, self.y_count
            ));
        }
        if !(self.x_delta > 0.0) || !(self.y_delta > 0.0) {
            return Err(format!(
                "cell deltas must be positive, got ({}, {})",
                self.x_delta, self.y_delta
            ));
        }
        Ok(())
    }

    /// X coordinate of the centre of column `i`.
    pub fn cell_centre_x(&self, i: usize) -> f64 {
        self.x_origin + self.x_delta * (i + 1) as f64 - self.x_delta / 2.0
    }

    /// Y coordinate of the centre of row `j`.
    pub fn cell_centre_y(&self, j: usize) -> f64 {
        self.y_origin + self.y_delta * (j + 1) as f64 - self.y_delta / 2.0
    }

    /// Grid index containing the location `(x, y)`.
    ///
    /// The offset from the origin is truncated, not rounded. Locations
    /// before the origin or past the last cell return `None`.
    pub fn locate(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let fx = (x - self.x_origin) / self.x_delta;
        let fy = (y - self.y_origin) / self.y_delta;
        if !(fx >= 0.0 && fy >= 0.0) {
            return None;
        }
        if fx >= self.x_count as f64 || fy >= self.y_count as f64 {
            return None;
        }
        Some((fx.trunc() as usize, fy.trunc() as usize))
    }

    /// An array shaped to this grid.
    pub fn filled<T: Copy>(&self, value: T) -> GridArray<T> {
        GridArray::filled(self.x_count, self.y_count, value)
    }
}

/// Drainage database metadata.
///
/// Every value is derived from the attribute arrays of the dataset; the
/// header copy is informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrainageMeta {
    pub nominal_grid_size_al: f64,
    pub contour_interval: f64,
    pub impervious_area: f64,
    pub class_count: usize,
    pub num_river_classes: usize,
    pub elev_conversion: f64,
    pub total_num_of_grids: usize,
    pub num_grids_in_basin: usize,
    pub debug_grid_no: usize,
}

impl Default for DrainageMeta {
    fn default() -> Self {
        Self {
            nominal_grid_size_al: 1.0,
            contour_interval: 1.0,
            impervious_area: 0.0,
            class_count: 0,
            num_river_classes: 0,
            elev_conversion: 1.0,
            total_num_of_grids: 0,
            num_grids_in_basin: 0,
            debug_grid_no: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_grid() -> GridHeader {
        GridHeader::lat_long(0.0, 0.0, 3, 3, 1.0, 1.0)
    }

    #[test]
    fn test_cell_centres_offset_half_delta() {
        let grid = GridHeader::lat_long(-100.0, 40.0, 10, 5, 0.5, 0.25);
        assert!((grid.cell_centre_x(0) - (-99.75)).abs() < 1e-12);
        assert!((grid.cell_centre_y(0) - 40.125).abs() < 1e-12);
        assert!((grid.cell_centre_x(9) - (-95.25)).abs() < 1e-12);
    }

    #[test]
    fn test_locate_truncates() {
        let grid = unit_grid();
        assert_eq!(grid.locate(0.0, 0.0), Some((0, 0)));
        assert_eq!(grid.locate(0.99, 1.99), Some((0, 1)));
        assert_eq!(grid.locate(2.999, 2.5), Some((2, 2)));
    }

    #[test]
    fn test_locate_outside() {
        let grid = unit_grid();
        assert_eq!(grid.locate(-0.2, 1.0), None);
        assert_eq!(grid.locate(1.0, 3.0), None);
        assert_eq!(grid.locate(f64::NAN, 1.0), None);
    }

    #[test]
    fn test_validate() {
        assert!(unit_grid().validate().is_ok());
        let mut grid = unit_grid();
        grid.y_count = 0;
        assert!(grid.validate().is_err());
        let mut grid = unit_grid();
        grid.x_delta = -1.0;
        assert!(grid.validate().is_err());
    }

    #[test]
    fn test_projection_keywords() {
        assert_eq!(Projection::LatLong.keyword(), "LATLONG");
        let rotated = Projection::RotatedLatLong(Rotation::default());
        assert_eq!(rotated.keyword(), "ROTLATLONG");
        assert!(rotated.is_rotated());
    }
}
