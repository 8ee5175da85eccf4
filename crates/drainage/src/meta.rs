//! Drainage database metadata derivation and quality checks.

use crate::roles::AttributeRole;
use crate::topology::{rank_array, DrainageView};
use ensim_common::{Diagnostics, DrainageMeta, EnsimResult, GridArray, WarningKind};
use std::collections::BTreeSet;
use tracing::info;

const FEET_TO_METRES: f64 = 0.305;

/// Recompute the drainage meta block from the attribute arrays.
///
/// `class_count` is the number of land-cover classes, which the arrays
/// alone cannot tell apart from other attributes.
pub fn derive_drainage_meta(view: &DrainageView<'_>, class_count: usize) -> EnsimResult<DrainageMeta> {
    let rank = rank_array(view)?;
    let next = view.require(AttributeRole::Next)?;

    let mut meta = DrainageMeta {
        class_count,
        ..DrainageMeta::default()
    };

    if let Some(area) = view.array(AttributeRole::GridArea) {
        let positive: Vec<f64> = area.as_slice().iter().copied().filter(|&a| a > 0.0).collect();
        if !positive.is_empty() {
            meta.nominal_grid_size_al = (positive.iter().sum::<f64>() / positive.len() as f64).sqrt();
        }
    }

    if let Some(iak) = view.array(AttributeRole::RiverClass) {
        let classes: BTreeSet<i64> = iak
            .as_slice()
            .iter()
            .filter(|&&v| v != 0.0)
            .map(|&v| v.round() as i64)
            .collect();
        meta.num_river_classes = classes.len();
    }

    if let Some(position) = view.roles.get(AttributeRole::Elevation) {
        let units = view.dataset.attributes[position].units.as_deref().unwrap_or("");
        if units.eq_ignore_ascii_case("ft") || units.eq_ignore_ascii_case("feet") {
            meta.elev_conversion = FEET_TO_METRES;
        }
    }

    meta.total_num_of_grids = rank.as_slice().iter().filter(|&&r| r > 0).count();
    meta.num_grids_in_basin = next.as_slice().iter().filter(|&&n| n > 0.0).count();
    meta.debug_grid_no = rank
        .as_slice()
        .iter()
        .zip(next.as_slice())
        .filter(|&(_, &n)| n > 0.0)
        .map(|(&r, _)| r)
        .max()
        .unwrap_or(0);

    info!(
        total_num_of_grids = meta.total_num_of_grids,
        num_grids_in_basin = meta.num_grids_in_basin,
        nominal_grid_size_al = meta.nominal_grid_size_al,
        "Derived drainage meta"
    );
    Ok(meta)
}

fn check_zero(
    rank: &GridArray<usize>,
    array: Option<&GridArray>,
    role: AttributeRole,
    kind: WarningKind,
    diagnostics: &mut Diagnostics,
) {
    let Some(array) = array else {
        return;
    };
    let zero = rank
        .as_slice()
        .iter()
        .zip(array.as_slice())
        .filter(|&(&r, &v)| r > 0 && v == 0.0)
        .count();
    if zero > 0 {
        diagnostics.push(kind, format!("{} active cells have zero {}", zero, role));
    }
}

/// Record non-fatal problems of a drainage database.
///
/// Only `Rank` and `Next` are required; other checks run when their
/// attribute is present.
pub fn check_drainage_quality(view: &DrainageView<'_>, diagnostics: &mut Diagnostics) -> EnsimResult<()> {
    let rank = rank_array(view)?;
    let next = view.require(AttributeRole::Next)?;

    check_zero(&rank, view.array(AttributeRole::GridArea), AttributeRole::GridArea, WarningKind::ZeroGridArea, diagnostics);
    check_zero(&rank, view.array(AttributeRole::DrainageArea), AttributeRole::DrainageArea, WarningKind::ZeroDrainageArea, diagnostics);
    check_zero(&rank, view.array(AttributeRole::ChannelSlope), AttributeRole::ChannelSlope, WarningKind::ZeroChannelSlope, diagnostics);
    check_zero(&rank, view.array(AttributeRole::ChannelLength), AttributeRole::ChannelLength, WarningKind::ZeroChannelLength, diagnostics);

    let has_outlet = rank
        .as_slice()
        .iter()
        .zip(next.as_slice())
        .any(|(&r, &n)| r > 0 && n == 0.0);
    if !has_outlet {
        diagnostics.push(WarningKind::NoOutlet, "no active cell drains out of the basin");
    }

    let distinct: BTreeSet<usize> = rank.as_slice().iter().copied().filter(|&r| r > 0).collect();
    let max_rank = distinct.iter().next_back().copied().unwrap_or(0);
    if distinct.len() != max_rank {
        diagnostics.push(
            WarningKind::DiscontinuousRank,
            format!("{} distinct ranks but the highest rank is {}", distinct.len(), max_rank),
        );
    }
    Ok(())
}
