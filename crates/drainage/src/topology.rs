//! Rank/Next topology and cell coordinates of a drainage dataset.

use crate::roles::{AttributeRole, RoleIndex};
use ensim_common::{EnsimError, EnsimResult, GridArray, GridHeader, Projection};
use r2c_parser::R2cDataset;
use tracing::{debug, info};

/// A single-frame dataset with its attribute roles resolved.
pub struct DrainageView<'a> {
    pub dataset: &'a R2cDataset,
    pub roles: RoleIndex,
}

impl<'a> DrainageView<'a> {
    pub fn new(dataset: &'a R2cDataset) -> Self {
        Self {
            dataset,
            roles: RoleIndex::resolve(&dataset.attributes),
        }
    }

    pub fn grid(&self) -> &GridHeader {
        &self.dataset.grid
    }

    /// Array carrying `role`, if present.
    pub fn array(&self, role: AttributeRole) -> Option<&'a GridArray> {
        let position = self.roles.get(role)?;
        self.dataset.single_frame().nth(position).map(|(_, array)| array)
    }

    /// Array carrying `role`, or `MissingAttribute`.
    pub fn require(&self, role: AttributeRole) -> EnsimResult<&'a GridArray> {
        self.array(role)
            .ok_or_else(|| EnsimError::MissingAttribute(role.attribute_name().to_string()))
    }

    /// Any attribute by name, including ones without a role.
    pub fn named(&self, name: &str) -> Option<&'a GridArray> {
        let position = self.roles.lookup(name)?;
        self.dataset.single_frame().nth(position).map(|(_, array)| array)
    }
}

/// Convert a stored rank value to an integer.
fn to_rank(value: f64, role: AttributeRole, x: usize, y: usize) -> EnsimResult<usize> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(EnsimError::topology(format!(
            "{} at cell ({}, {}) is not a non-negative integer: {}",
            role, x, y, value
        )));
    }
    Ok(value as usize)
}

fn to_rank_array(array: &GridArray, role: AttributeRole) -> EnsimResult<GridArray<usize>> {
    let mut ranks = GridArray::filled(array.nx(), array.ny(), 0usize);
    for (x, y, value) in array.cells() {
        ranks.set(x, y, to_rank(value, role, x, y)?);
    }
    Ok(ranks)
}

/// The `Rank` attribute as integers.
pub fn rank_array(view: &DrainageView<'_>) -> EnsimResult<GridArray<usize>> {
    to_rank_array(view.require(AttributeRole::Rank)?, AttributeRole::Rank)
}

/// Latitude and longitude of every cell centre.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    pub latitude: GridArray,
    pub longitude: GridArray,
}

/// Flow topology pulled from a drainage dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    pub rank: GridArray<usize>,
    pub next: GridArray<usize>,
    pub latitude: Option<GridArray>,
    pub longitude: Option<GridArray>,
}

impl Topology {
    /// Cell coordinates, reconstructing missing ones from the grid header.
    pub fn coordinates(&self, grid: &GridHeader) -> EnsimResult<Coordinates> {
        resolve_coordinates(grid, self.latitude.clone(), self.longitude.clone())
    }

    /// Number of cells with a non-zero rank.
    pub fn active_count(&self) -> usize {
        self.rank.as_slice().iter().filter(|&&r| r > 0).count()
    }
}

/// Extract Rank, Next and any stored coordinates.
///
/// Missing `Rank` or `Next` is a `MissingAttribute` error.
pub fn extract_topology(view: &DrainageView<'_>) -> EnsimResult<Topology> {
    let rank = rank_array(view)?;
    let next = to_rank_array(view.require(AttributeRole::Next)?, AttributeRole::Next)?;
    let topology = Topology {
        rank,
        next,
        latitude: view.array(AttributeRole::Latitude).cloned(),
        longitude: view.array(AttributeRole::Longitude).cloned(),
    };
    info!(
        active_cells = topology.active_count(),
        has_coordinates = topology.latitude.is_some() && topology.longitude.is_some(),
        "Extracted drainage topology"
    );
    Ok(topology)
}

/// Stored coordinates of any dataset, reconstructing missing ones.
pub fn dataset_coordinates(view: &DrainageView<'_>) -> EnsimResult<Coordinates> {
    resolve_coordinates(
        view.grid(),
        view.array(AttributeRole::Latitude).cloned(),
        view.array(AttributeRole::Longitude).cloned(),
    )
}

fn resolve_coordinates(
    grid: &GridHeader,
    latitude: Option<GridArray>,
    longitude: Option<GridArray>,
) -> EnsimResult<Coordinates> {
    let needs_reconstruction = latitude.is_none() || longitude.is_none();
    if needs_reconstruction {
        if let Projection::RotatedLatLong(_) = grid.projection {
            return Err(EnsimError::UnsupportedProjection(format!(
                "cannot derive cell coordinates for a {} grid without Latitude and Longitude attributes",
                grid.projection.keyword()
            )));
        }
    }
    let latitude = match latitude {
        Some(array) => array,
        None => {
            debug!("Deriving Latitude from the grid header");
            GridArray::from_fn(grid.x_count, grid.y_count, |_, y| grid.cell_centre_y(y))
        }
    };
    let longitude = match longitude {
        Some(array) => array,
        None => {
            debug!("Deriving Longitude from the grid header");
            GridArray::from_fn(grid.x_count, grid.y_count, |x, _| grid.cell_centre_x(x))
        }
    };
    Ok(Coordinates {
        latitude,
        longitude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ensim_common::Rotation;
    use r2c_parser::AttributeSpec;

    fn dataset(attrs: &[(&str, Vec<f64>)]) -> R2cDataset {
        let mut dataset = R2cDataset::new(GridHeader::lat_long(10.0, 20.0, 2, 2, 0.5, 0.5));
        for (name, values) in attrs {
            let array = GridArray::from_rows(2, 2, values.clone()).unwrap();
            dataset.push_attribute(AttributeSpec::new(*name), array).unwrap();
        }
        dataset
    }

    #[test]
    fn test_extract_topology() {
        let ds = dataset(&[
            ("rank", vec![1.0, 2.0, 0.0, 3.0]),
            ("NEXT", vec![3.0, 3.0, 0.0, 0.0]),
        ]);
        let topology = extract_topology(&DrainageView::new(&ds)).unwrap();
        assert_eq!(topology.rank.get(1, 1), 3);
        assert_eq!(topology.next.get(0, 0), 3);
        assert_eq!(topology.active_count(), 3);
        assert!(topology.latitude.is_none());
    }

    #[test]
    fn test_missing_next_is_precondition() {
        let ds = dataset(&[("Rank", vec![1.0, 2.0, 3.0, 4.0])]);
        let err = extract_topology(&DrainageView::new(&ds)).unwrap_err();
        assert!(matches!(err, EnsimError::MissingAttribute(ref name) if name == "Next"));
    }

    #[test]
    fn test_fractional_rank_is_rejected() {
        let ds = dataset(&[
            ("Rank", vec![1.0, 2.5, 0.0, 3.0]),
            ("Next", vec![0.0, 0.0, 0.0, 0.0]),
        ]);
        let err = extract_topology(&DrainageView::new(&ds)).unwrap_err();
        assert!(matches!(err, EnsimError::InvalidTopology(_)));
    }

    #[test]
    fn test_reconstructed_coordinates_are_cell_centres() {
        let ds = dataset(&[
            ("Rank", vec![1.0, 2.0, 3.0, 4.0]),
            ("Next", vec![4.0, 4.0, 4.0, 0.0]),
        ]);
        let view = DrainageView::new(&ds);
        let coords = extract_topology(&view)
            .unwrap()
            .coordinates(view.grid())
            .unwrap();
        assert_eq!(coords.longitude.get(1, 0), 10.75);
        assert_eq!(coords.latitude.get(0, 1), 20.75);
        assert_eq!(coords.latitude.get(1, 0), 20.25);
    }

    #[test]
    fn test_stored_coordinates_win() {
        let ds = dataset(&[
            ("Rank", vec![1.0, 2.0, 3.0, 4.0]),
            ("Latitude", vec![-1.0, -2.0, -3.0, -4.0]),
        ]);
        let coords = dataset_coordinates(&DrainageView::new(&ds)).unwrap();
        assert_eq!(coords.latitude.get(1, 1), -4.0);
        assert_eq!(coords.longitude.get(1, 1), 10.75);
    }

    #[test]
    fn test_rotated_reconstruction_unsupported() {
        let mut grid = GridHeader::lat_long(0.0, 0.0, 2, 2, 1.0, 1.0);
        grid.projection = Projection::RotatedLatLong(Rotation::default());
        let ds = R2cDataset::new(grid);
        let err = dataset_coordinates(&DrainageView::new(&ds)).unwrap_err();
        assert!(matches!(err, EnsimError::UnsupportedProjection(_)));
    }
}
