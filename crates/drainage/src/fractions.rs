//! Land-cover fractions per subbasin and the diagnostic drainage dataset.

use crate::delineate::Subbasins;
use crate::forest::Forest;
use crate::matcher::DomainMatch;
use crate::roles::AttributeRole;
use crate::topology::{rank_array, DrainageView};
use ensim_common::{Diagnostics, EnsimError, EnsimResult, GridArray, WarningKind};
use r2c_parser::{AttributeSpec, R2cDataset};
use serde::Serialize;
use tracing::{debug, info};

/// Area-weighted land-cover fractions of one subbasin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubbasinFractions {
    /// 1-based subbasin priority.
    pub subbasin: usize,
    pub outlet_rank: usize,
    pub cell_count: usize,
    pub area: f64,
    /// One entry per class, in class order.
    pub fractions: Vec<f64>,
}

/// Fractions of every subbasin over the same list of classes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandCoverFractions {
    pub classes: Vec<String>,
    pub subbasins: Vec<SubbasinFractions>,
}

/// The trailing `ClassCount` attributes of a land-surface dataset.
fn land_cover_classes(lss: &R2cDataset) -> EnsimResult<Vec<(String, &GridArray)>> {
    let class_count = lss.meta.as_ref().map_or(0, |m| m.class_count);
    if class_count < 2 {
        return Err(EnsimError::InvalidArgument(format!(
            "land-surface dataset declares {} land-cover classes, at least 2 are required",
            class_count
        )));
    }
    let attributes: Vec<_> = lss.single_frame().collect();
    if class_count > attributes.len() {
        return Err(EnsimError::InvalidArgument(format!(
            "ClassCount {} exceeds the {} attributes of the land-surface dataset",
            class_count,
            attributes.len()
        )));
    }
    Ok(attributes[attributes.len() - class_count..]
        .iter()
        .enumerate()
        .map(|(i, (spec, array))| (spec.display_name(attributes.len() - class_count + i), *array))
        .collect())
}

/// Aggregate the land-cover classes of the matched land-surface cells over
/// each subbasin, weighted by drainage `GridArea`.
///
/// Cells outside every subbasin are ignored. A land-surface cell whose
/// class fractions sum to zero is reported once.
pub fn land_cover_fractions(
    drainage: &DrainageView<'_>,
    forest: &Forest,
    subbasins: &Subbasins,
    lss: &R2cDataset,
    matched: &DomainMatch,
    diagnostics: &mut Diagnostics,
) -> EnsimResult<LandCoverFractions> {
    let grid_area = drainage.require(AttributeRole::GridArea)?;
    let classes = land_cover_classes(lss)?;
    let lss_rank = rank_array(&DrainageView::new(lss))?;

    let max_rank = lss_rank.as_slice().iter().copied().max().unwrap_or(0);
    let mut lss_cells: Vec<Option<(usize, usize)>> = vec![None; max_rank];
    for (x, y, r) in lss_rank.cells() {
        if r > 0 {
            lss_cells[r - 1] = Some((x, y));
        }
    }

    let n = subbasins.outlets().len();
    let mut sums = vec![vec![0.0; classes.len()]; n];
    let mut areas = vec![0.0; n];
    let mut counts = vec![0usize; n];
    let mut warned = vec![false; max_rank];

    for cell in forest.cells() {
        let priority = subbasins.membership_of(cell.rank);
        if priority == 0 {
            continue;
        }
        let source = matched.source_of(cell.rank).ok_or_else(|| {
            EnsimError::InvalidArgument(format!("drainage rank {} has no matched cell", cell.rank))
        })?;
        let (sx, sy) = source
            .checked_sub(1)
            .and_then(|i| lss_cells.get(i).copied().flatten())
            .ok_or_else(|| {
                EnsimError::InvalidArgument(format!("matched land-surface rank {} does not exist", source))
            })?;

        let values: Vec<f64> = classes.iter().map(|(_, array)| array.get(sx, sy)).collect();
        if values.iter().sum::<f64>() == 0.0 && !warned[source - 1] {
            warned[source - 1] = true;
            diagnostics.push(
                WarningKind::ZeroLandCoverFraction,
                format!("land-surface cell {} ({}, {}) has no land cover", source, sx, sy),
            );
        }

        let area = grid_area.get(cell.x, cell.y);
        for (sum, value) in sums[priority - 1].iter_mut().zip(&values) {
            *sum += area * value;
        }
        areas[priority - 1] += area;
        counts[priority - 1] += 1;
    }

    let subbasins: Vec<SubbasinFractions> = subbasins
        .outlets()
        .iter()
        .enumerate()
        .map(|(i, &outlet_rank)| {
            let area = areas[i];
            let fractions = sums[i]
                .iter()
                .map(|&s| if area > 0.0 { s / area } else { 0.0 })
                .collect();
            debug!(subbasin = i + 1, outlet_rank, area, "Aggregated land cover");
            SubbasinFractions {
                subbasin: i + 1,
                outlet_rank,
                cell_count: counts[i],
                area,
                fractions,
            }
        })
        .collect();

    info!(
        subbasins = subbasins.len(),
        classes = classes.len(),
        "Computed land-cover fractions"
    );
    Ok(LandCoverFractions {
        classes: classes.into_iter().map(|(name, _)| name).collect(),
        subbasins,
    })
}

/// Copy of the drainage dataset with the matching and delineation results
/// inserted ahead of its land-cover classes.
///
/// Adds `GeophyDist` (squared match distance), `RankGeophyToShd` (matched
/// land-surface rank) and `Subbasins` (subbasin priority). Inactive cells
/// hold 0 in all three.
pub fn diagnostic_dataset(
    drainage: &R2cDataset,
    forest: &Forest,
    subbasins: &Subbasins,
    matched: &DomainMatch,
) -> EnsimResult<R2cDataset> {
    let rank = rank_array(&DrainageView::new(drainage))?;
    let (nx, ny) = (drainage.grid.x_count, drainage.grid.y_count);
    let class_count = drainage.meta.as_ref().map_or(0, |m| m.class_count);
    let position = drainage.attributes.len().saturating_sub(class_count);

    let mut output = drainage.clone();
    output.insert_attribute(
        position,
        AttributeSpec::float("GeophyDist"),
        matched.distance_grid(&rank),
    )?;
    output.insert_attribute(
        position + 1,
        AttributeSpec::integer("RankGeophyToShd"),
        matched.to_grid(&rank),
    )?;
    output.insert_attribute(
        position + 2,
        AttributeSpec::integer("Subbasins"),
        subbasins.to_grid(forest, nx, ny),
    )?;
    Ok(output)
}
