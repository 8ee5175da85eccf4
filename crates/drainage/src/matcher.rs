//! Nearest-cell matching between two independently gridded domains.

use crate::topology::Coordinates;
use ensim_common::{EnsimError, EnsimResult, GridArray};
use tracing::info;

/// Coordinates of the active cells of a domain, ordered by rank.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveCells {
    pub ranks: Vec<usize>,
    pub latitude: Vec<f64>,
    pub longitude: Vec<f64>,
}

impl ActiveCells {
    /// Collect active cells sorted by rank. Gaps in the ranks are kept as
    /// they are.
    pub fn collect(rank: &GridArray<usize>, coordinates: &Coordinates) -> EnsimResult<Self> {
        if !rank.same_shape(&coordinates.latitude) || !rank.same_shape(&coordinates.longitude) {
            return Err(EnsimError::InvalidArgument(
                "rank and coordinate arrays differ in shape".to_string(),
            ));
        }
        let mut cells: Vec<(usize, f64, f64)> = rank
            .cells()
            .filter(|&(_, _, r)| r > 0)
            .map(|(x, y, r)| {
                (
                    r,
                    coordinates.latitude.get(x, y),
                    coordinates.longitude.get(x, y),
                )
            })
            .collect();
        cells.sort_by_key(|&(r, _, _)| r);
        Ok(Self {
            ranks: cells.iter().map(|c| c.0).collect(),
            latitude: cells.iter().map(|c| c.1).collect(),
            longitude: cells.iter().map(|c| c.2).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

/// Index of the source point nearest to `(lat, lon)` by squared distance
/// in degrees, with the distance. Ties keep the lowest index.
///
/// Points at a non-finite distance are never chosen.
pub fn nearest_index(lat: f64, lon: f64, source_lat: &[f64], source_lon: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, (&slat, &slon)) in source_lat.iter().zip(source_lon).enumerate() {
        let d = (lat - slat).powi(2) + (lon - slon).powi(2);
        if !d.is_finite() {
            continue;
        }
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }
    best
}

/// Nearest source cell for every target cell.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainMatch {
    /// Matched source rank, indexed by target `rank - 1`.
    pub source_rank: Vec<usize>,
    /// Squared distance to the match, indexed by target `rank - 1`.
    pub distance: Vec<f64>,
}

impl DomainMatch {
    /// Source rank matched to the target cell with this rank.
    pub fn source_of(&self, target_rank: usize) -> Option<usize> {
        self.source_rank.get(target_rank.checked_sub(1)?).copied()
    }

    /// Source ranks laid out on the target grid; inactive cells hold 0.
    pub fn to_grid(&self, target_rank: &GridArray<usize>) -> GridArray {
        target_rank.map(|r| match r {
            0 => 0.0,
            r => self.source_rank[r - 1] as f64,
        })
    }

    /// Distances laid out on the target grid; inactive cells hold 0.
    pub fn distance_grid(&self, target_rank: &GridArray<usize>) -> GridArray {
        target_rank.map(|r| match r {
            0 => 0.0,
            r => self.distance[r - 1],
        })
    }
}

/// Match every active target cell to its nearest active source cell.
///
/// Target ranks must be `1..=n` since results are indexed by target rank.
/// Source ranks may have gaps. Brute force, proportional to the product of
/// the two active counts.
pub fn match_domains(target: &ActiveCells, source: &ActiveCells) -> EnsimResult<DomainMatch> {
    if source.is_empty() {
        return Err(EnsimError::InvalidArgument(
            "source domain has no active cells".to_string(),
        ));
    }
    if let Some((i, &rank)) = target.ranks.iter().enumerate().find(|&(i, &r)| r != i + 1) {
        return Err(EnsimError::InvalidArgument(format!(
            "target ranks are not dense: expected rank {}, found {}",
            i + 1,
            rank
        )));
    }
    let mut source_rank = Vec::with_capacity(target.len());
    let mut distance = Vec::with_capacity(target.len());
    for (&lat, &lon) in target.latitude.iter().zip(&target.longitude) {
        let (index, d) = nearest_index(lat, lon, &source.latitude, &source.longitude)
            .ok_or_else(|| {
                EnsimError::InvalidArgument(format!(
                    "no source cell at a finite distance from ({}, {})",
                    lat, lon
                ))
            })?;
        source_rank.push(source.ranks[index]);
        distance.push(d);
    }
    let max_distance = distance.iter().copied().fold(0.0_f64, f64::max);
    info!(
        targets = target.len(),
        sources = source.len(),
        max_distance,
        "Matched domains"
    );
    Ok(DomainMatch {
        source_rank,
        distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_nearest_index() {
        let lat = [0.0, 1.0, 2.0];
        let lon = [0.0, 1.0, 2.0];
        let (i, d) = nearest_index(1.2, 0.9, &lat, &lon).unwrap();
        assert_eq!(i, 1);
        assert_approx_eq!(d, 0.05, 1e-12);
    }

    #[test]
    fn test_nearest_index_ties_keep_first() {
        let lat = [0.0, 2.0];
        let lon = [0.0, 0.0];
        assert_eq!(nearest_index(1.0, 0.0, &lat, &lon).unwrap().0, 0);
        assert!(nearest_index(1.0, 0.0, &[], &[]).is_none());
    }

    #[test]
    fn test_nearest_index_skips_non_finite() {
        let lat = [f64::NAN, 3.0, 1.0];
        let lon = [0.0, 0.0, f64::INFINITY];
        assert_eq!(nearest_index(0.0, 0.0, &lat, &lon).unwrap().0, 1);
        assert!(nearest_index(0.0, 0.0, &[f64::NAN], &[0.0]).is_none());
    }

    #[test]
    fn test_active_cells_sorted_by_rank() {
        let rank = GridArray::from_rows(2, 2, vec![2, 0, 1, 3]).unwrap();
        let coordinates = Coordinates {
            latitude: GridArray::from_rows(2, 2, vec![10.0, 11.0, 12.0, 13.0]).unwrap(),
            longitude: GridArray::from_rows(2, 2, vec![20.0, 21.0, 22.0, 23.0]).unwrap(),
        };
        let cells = ActiveCells::collect(&rank, &coordinates).unwrap();
        assert_eq!(cells.ranks, vec![1, 2, 3]);
        assert_eq!(cells.latitude, vec![12.0, 10.0, 13.0]);
        assert_eq!(cells.longitude, vec![22.0, 20.0, 23.0]);
    }

    #[test]
    fn test_match_domains() {
        let target = ActiveCells {
            ranks: vec![1, 2],
            latitude: vec![0.1, 5.0],
            longitude: vec![0.1, 5.0],
        };
        let source = ActiveCells {
            ranks: vec![1, 2],
            latitude: vec![4.0, 0.0],
            longitude: vec![4.0, 0.0],
        };
        let matched = match_domains(&target, &source).unwrap();
        assert_eq!(matched.source_rank, vec![2, 1]);
        assert_approx_eq!(matched.distance[0], 0.02, 1e-12);
        assert_eq!(matched.source_of(2), Some(1));
        assert_eq!(matched.source_of(0), None);
    }

    #[test]
    fn test_sparse_source_ranks_are_kept() {
        let rank = GridArray::from_rows(2, 1, vec![7, 3]).unwrap();
        let coordinates = Coordinates {
            latitude: GridArray::from_rows(2, 1, vec![0.0, 1.0]).unwrap(),
            longitude: GridArray::from_rows(2, 1, vec![0.0, 1.0]).unwrap(),
        };
        let source = ActiveCells::collect(&rank, &coordinates).unwrap();
        assert_eq!(source.ranks, vec![3, 7]);

        let target = ActiveCells {
            ranks: vec![1],
            latitude: vec![0.1],
            longitude: vec![0.1],
        };
        assert_eq!(match_domains(&target, &source).unwrap().source_rank, vec![7]);

        // Sparse ranks cannot be the target side
        assert!(match_domains(&source, &target).is_err());
    }

    #[test]
    fn test_empty_source_is_an_error() {
        let empty = ActiveCells {
            ranks: vec![],
            latitude: vec![],
            longitude: vec![],
        };
        assert!(match_domains(&empty, &empty).is_err());
    }
}
