//! Subbasin delineation.
//!
//! Every outlet gets a 1-based priority from its position in the caller's
//! list. Membership spreads upstream from each outlet and stops at any
//! other outlet, so each cell ends with the priority of its nearest
//! downstream outlet whatever order the outlets are processed in.

use crate::forest::Forest;
use ensim_common::{EnsimError, EnsimResult, GridArray};
use tracing::{debug, info};

/// Result of a delineation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Subbasins {
    outlets: Vec<usize>,
    membership: Vec<usize>,
}

impl Subbasins {
    /// Outlet ranks in priority order; priority `p` is `outlets()[p - 1]`.
    pub fn outlets(&self) -> &[usize] {
        &self.outlets
    }

    /// Priority of the subbasin containing `rank`; 0 when unassigned.
    pub fn membership_of(&self, rank: usize) -> usize {
        rank.checked_sub(1)
            .and_then(|i| self.membership.get(i))
            .copied()
            .unwrap_or(0)
    }

    /// Membership indexed by `rank - 1`.
    pub fn membership(&self) -> &[usize] {
        &self.membership
    }

    /// Ranks belonging to subbasin `priority`.
    pub fn ranks_in(&self, priority: usize) -> impl Iterator<Item = usize> + '_ {
        self.membership
            .iter()
            .enumerate()
            .filter(move |(_, &p)| p == priority && priority > 0)
            .map(|(i, _)| i + 1)
    }

    /// Number of cells in subbasin `priority`.
    pub fn cell_count(&self, priority: usize) -> usize {
        self.ranks_in(priority).count()
    }

    /// Active cells not upstream of any outlet.
    pub fn unassigned_count(&self) -> usize {
        self.membership.iter().filter(|&&p| p == 0).count()
    }

    /// Membership laid out on the grid; inactive cells hold 0.
    pub fn to_grid(&self, forest: &Forest, nx: usize, ny: usize) -> GridArray {
        let mut grid = GridArray::filled(nx, ny, 0.0);
        for cell in forest.cells() {
            grid.set(cell.x, cell.y, self.membership[cell.rank - 1] as f64);
        }
        grid
    }
}

/// Assign every cell upstream of an outlet to that outlet's subbasin.
///
/// Duplicate outlets keep their first priority. An outlet rank that is not
/// an active cell is an `InvalidArgument` error.
pub fn delineate(forest: &Forest, outlet_ranks: &[usize]) -> EnsimResult<Subbasins> {
    let n = forest.len();
    let mut outlets: Vec<usize> = Vec::with_capacity(outlet_ranks.len());
    for &rank in outlet_ranks {
        if rank == 0 || rank > n {
            return Err(EnsimError::InvalidArgument(format!(
                "outlet rank {} is not one of the {} active cells",
                rank, n
            )));
        }
        if !outlets.contains(&rank) {
            outlets.push(rank);
        }
    }

    let mut is_outlet = vec![false; n];
    for &rank in &outlets {
        is_outlet[rank - 1] = true;
    }

    let mut membership = vec![0usize; n];
    let mut stack: Vec<usize> = Vec::new();
    for (i, &outlet) in outlets.iter().enumerate() {
        let priority = i + 1;
        membership[outlet - 1] = priority;
        stack.clear();
        stack.extend(forest.upstream(outlet).iter().filter(|&&r| !is_outlet[r - 1]));
        let mut reached = 1usize;
        while let Some(rank) = stack.pop() {
            membership[rank - 1] = priority;
            reached += 1;
            stack.extend(forest.upstream(rank).iter().filter(|&&r| !is_outlet[r - 1]));
        }
        debug!(outlet, priority, cells = reached, "Delineated subbasin");
    }

    let subbasins = Subbasins {
        outlets,
        membership,
    };
    info!(
        subbasins = subbasins.outlets.len(),
        unassigned = subbasins.unassigned_count(),
        "Delineation complete"
    );
    Ok(subbasins)
}
