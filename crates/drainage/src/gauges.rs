//! Gauge locations and outlet assembly.

use crate::forest::Forest;
use ensim_common::{DrainageMeta, EnsimError, EnsimResult, GridArray, GridHeader};
use serde::Serialize;
use tb0_parser::Tb0Dataset;
use tracing::{debug, info};

/// A streamflow gauge location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gauge {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

/// Gauges declared by the columns of a streamflow table, in column order.
///
/// A column without both location coordinates is an `InvalidArgument` error.
pub fn gauges_from_table(table: &Tb0Dataset) -> EnsimResult<Vec<Gauge>> {
    table
        .header
        .columns
        .iter()
        .enumerate()
        .map(|(position, column)| {
            let name = column.display_name(position);
            let (x, y) = column.location().ok_or_else(|| {
                EnsimError::InvalidArgument(format!("gauge {} has no location", name))
            })?;
            Ok(Gauge { name, x, y })
        })
        .collect()
}

/// Rank of the cell containing `gauge`.
///
/// The cell index is the truncated offset from the grid origin. Locations
/// outside the grid and cells with rank 0 are precondition errors.
pub fn map_gauge(grid: &GridHeader, rank: &GridArray<usize>, gauge: &Gauge) -> EnsimResult<usize> {
    let (x, y) = grid.locate(gauge.x, gauge.y).ok_or_else(|| EnsimError::GaugeOutsideGrid {
        gauge: gauge.name.clone(),
        x: gauge.x,
        y: gauge.y,
    })?;
    match rank.get(x, y) {
        0 => Err(EnsimError::GaugeOnInactiveCell {
            gauge: gauge.name.clone(),
            x,
            y,
        }),
        r => {
            debug!(gauge = %gauge.name, x, y, rank = r, "Mapped gauge");
            Ok(r)
        }
    }
}

/// Map every gauge, failing on the first bad one.
pub fn map_gauges(
    grid: &GridHeader,
    rank: &GridArray<usize>,
    gauges: &[Gauge],
) -> EnsimResult<Vec<usize>> {
    gauges.iter().map(|g| map_gauge(grid, rank, g)).collect()
}

/// Rank of the cell where the whole domain drains out.
///
/// This is `TotalNumOfGrids` from the drainage meta, or the active cell
/// count when the dataset carries no meta.
pub fn domain_outlet(meta: Option<&DrainageMeta>, forest: &Forest) -> EnsimResult<usize> {
    let rank = match meta {
        Some(meta) if meta.total_num_of_grids > 0 => meta.total_num_of_grids,
        _ => forest.len(),
    };
    if forest.cell(rank).is_none() {
        return Err(EnsimError::topology(format!(
            "domain outlet rank {} is outside the {} active cells",
            rank,
            forest.len()
        )));
    }
    Ok(rank)
}

/// Gauge ranks in order, followed by the domain outlet unless already present.
pub fn assemble_outlets(gauge_ranks: &[usize], domain_outlet: usize) -> Vec<usize> {
    let mut outlets = gauge_ranks.to_vec();
    if !outlets.contains(&domain_outlet) {
        outlets.push(domain_outlet);
    }
    info!(
        gauges = gauge_ranks.len(),
        outlets = outlets.len(),
        domain_outlet,
        "Assembled outlets"
    );
    outlets
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb0_parser::{TableColumn, Tb0Header};

    fn grid() -> GridHeader {
        GridHeader::lat_long(0.0, 0.0, 2, 2, 1.0, 1.0)
    }

    fn ranks() -> GridArray<usize> {
        GridArray::from_rows(2, 2, vec![1, 0, 2, 3]).unwrap()
    }

    fn gauge(x: f64, y: f64) -> Gauge {
        Gauge {
            name: "G1".to_string(),
            x,
            y,
        }
    }

    #[test]
    fn test_map_gauge_truncates() {
        assert_eq!(map_gauge(&grid(), &ranks(), &gauge(0.99, 1.01)).unwrap(), 2);
        assert_eq!(map_gauge(&grid(), &ranks(), &gauge(1.5, 1.5)).unwrap(), 3);
    }

    #[test]
    fn test_gauge_outside_grid_names_the_gauge() {
        let err = map_gauge(&grid(), &ranks(), &gauge(2.5, 0.5)).unwrap_err();
        assert!(err.is_precondition());
        assert!(err.to_string().contains("G1"));

        let err = map_gauge(&grid(), &ranks(), &gauge(-0.1, 0.5)).unwrap_err();
        assert!(matches!(err, EnsimError::GaugeOutsideGrid { .. }));
    }

    #[test]
    fn test_gauge_on_inactive_cell() {
        let err = map_gauge(&grid(), &ranks(), &gauge(1.2, 0.3)).unwrap_err();
        assert!(matches!(
            err,
            EnsimError::GaugeOnInactiveCell { x: 1, y: 0, .. }
        ));
    }

    #[test]
    fn test_assemble_outlets_appends_domain_outlet_once() {
        assert_eq!(assemble_outlets(&[3, 1], 5), vec![3, 1, 5]);
        assert_eq!(assemble_outlets(&[5, 1], 5), vec![5, 1]);
        assert_eq!(assemble_outlets(&[], 5), vec![5]);
    }

    #[test]
    fn test_gauges_from_table_requires_locations() {
        let header = Tb0Header::new(vec![
            TableColumn::new("A").at(1.0, 2.0),
            TableColumn::new("B"),
        ]);
        let table = Tb0Dataset {
            header,
            rows: Vec::new(),
        };
        let err = gauges_from_table(&table).unwrap_err();
        assert!(err.to_string().contains("B"));
    }
}
