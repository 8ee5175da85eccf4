//! Flow forest built from Rank/Next.
//!
//! Cells are indexed by `rank - 1`. Back-links (the ranks draining into a
//! cell) are stored in compressed form: one offsets vector and one flat
//! vector of upstream ranks, built by a single inversion of `Next`.

use crate::topology::Topology;
use ensim_common::{EnsimError, EnsimResult};
use tracing::debug;

/// One active drainage cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub rank: usize,
    /// Downstream rank; 0 for an outlet.
    pub next: usize,
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub fn is_outlet(&self) -> bool {
        self.next == 0
    }
}

/// Immutable flow forest over the active cells.
#[derive(Debug, Clone)]
pub struct Forest {
    cells: Vec<Cell>,
    upstream_offsets: Vec<usize>,
    upstream: Vec<usize>,
}

impl Forest {
    /// Number of active cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell with the given rank, if it exists.
    pub fn cell(&self, rank: usize) -> Option<&Cell> {
        rank.checked_sub(1).and_then(|i| self.cells.get(i))
    }

    /// Ranks draining directly into `rank`.
    pub fn upstream(&self, rank: usize) -> &[usize] {
        match rank.checked_sub(1) {
            Some(i) if i < self.cells.len() => {
                &self.upstream[self.upstream_offsets[i]..self.upstream_offsets[i + 1]]
            }
            _ => &[],
        }
    }

    /// Ranks whose `Next` is 0.
    pub fn outlets(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells.iter().filter(|c| c.is_outlet()).map(|c| c.rank)
    }
}

/// Build the forest, checking that it is one.
///
/// Fails with `InvalidTopology` when ranks are not the dense range
/// `1..=active`, when `Next` points outside that range, when there is no
/// outlet, or when some cell never reaches an outlet.
pub fn build_forest(topology: &Topology) -> EnsimResult<Forest> {
    let n = topology.active_count();
    if n == 0 {
        return Err(EnsimError::topology("no active cells (every Rank is 0)"));
    }

    let mut slots: Vec<Option<Cell>> = vec![None; n];
    for (x, y, rank) in topology.rank.cells() {
        if rank == 0 {
            continue;
        }
        if rank > n {
            return Err(EnsimError::topology(format!(
                "Rank {} at cell ({}, {}) exceeds the {} active cells; ranks must be dense",
                rank, x, y, n
            )));
        }
        let next = topology.next.get(x, y);
        if next > n {
            return Err(EnsimError::topology(format!(
                "Next {} of rank {} is not an active rank",
                next, rank
            )));
        }
        let slot = &mut slots[rank - 1];
        if let Some(existing) = slot.as_ref() {
            return Err(EnsimError::topology(format!(
                "Rank {} appears at both ({}, {}) and ({}, {})",
                rank, existing.x, existing.y, x, y
            )));
        }
        *slot = Some(Cell { rank, next, x, y });
    }
    // n slots, n distinct ranks in 1..=n: every slot is filled
    let cells: Vec<Cell> = slots.into_iter().flatten().collect();

    // Invert Next
    let mut upstream_offsets = vec![0usize; n + 1];
    for cell in &cells {
        if cell.next > 0 {
            upstream_offsets[cell.next] += 1;
        }
    }
    for i in 0..n {
        upstream_offsets[i + 1] += upstream_offsets[i];
    }
    let mut fill = upstream_offsets.clone();
    let mut upstream = vec![0usize; upstream_offsets[n]];
    for cell in &cells {
        if cell.next > 0 {
            let slot = &mut fill[cell.next - 1];
            upstream[*slot] = cell.rank;
            *slot += 1;
        }
    }

    let forest = Forest {
        cells,
        upstream_offsets,
        upstream,
    };

    // Every cell must be reachable upstream from some outlet
    let mut reached = vec![false; n];
    let mut stack: Vec<usize> = forest.outlets().collect();
    if stack.is_empty() {
        return Err(EnsimError::topology("no outlet: every active cell has a downstream Next"));
    }
    let outlet_count = stack.len();
    let mut reached_count = 0;
    while let Some(rank) = stack.pop() {
        if std::mem::replace(&mut reached[rank - 1], true) {
            continue;
        }
        reached_count += 1;
        stack.extend_from_slice(forest.upstream(rank));
    }
    if reached_count != n {
        let first = reached.iter().position(|&r| !r).map(|i| i + 1).unwrap_or(0);
        return Err(EnsimError::topology(format!(
            "{} cells never reach an outlet (cycle through rank {})",
            n - reached_count,
            first
        )));
    }

    debug!(cells = n, outlets = outlet_count, "Built flow forest");
    Ok(forest)
}
