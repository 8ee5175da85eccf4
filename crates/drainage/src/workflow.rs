//! The subbasin workflow: gauges to outlets, delineation, domain matching
//! and land-cover aggregation in one call.

use crate::delineate::{delineate, Subbasins};
use crate::forest::build_forest;
use crate::fractions::{diagnostic_dataset, land_cover_fractions, LandCoverFractions};
use crate::gauges::{assemble_outlets, domain_outlet, gauges_from_table, map_gauges};
use crate::matcher::{match_domains, ActiveCells};
use crate::meta::check_drainage_quality;
use crate::topology::{extract_topology, rank_array, dataset_coordinates, DrainageView};
use ensim_common::{Diagnostics, EnsimResult};
use r2c_parser::R2cDataset;
use serde::Serialize;
use tb0_parser::Tb0Dataset;
use tracing::info;

/// One delineated subbasin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutletEntry {
    pub subbasin: usize,
    pub rank: usize,
    /// Gauge name, or `None` for the domain outlet.
    pub gauge: Option<String>,
    pub cell_count: usize,
}

/// Serializable summary of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubbasinReport {
    pub outlets: Vec<OutletEntry>,
    pub unassigned_cells: usize,
    pub land_cover: LandCoverFractions,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct SubbasinRun {
    pub report: SubbasinReport,
    pub subbasins: Subbasins,
    /// The drainage dataset with `GeophyDist`, `RankGeophyToShd` and
    /// `Subbasins` added.
    pub diagnostic: R2cDataset,
}

/// Delineate subbasins at the streamflow gauges and the domain outlet, then
/// aggregate land cover from the land-surface dataset over each of them.
pub fn run_subbasins(
    drainage: &R2cDataset,
    lss: &R2cDataset,
    streamflow: &Tb0Dataset,
    diagnostics: &mut Diagnostics,
) -> EnsimResult<SubbasinRun> {
    let view = DrainageView::new(drainage);
    check_drainage_quality(&view, diagnostics)?;
    let topology = extract_topology(&view)?;
    let forest = build_forest(&topology)?;

    let gauges = gauges_from_table(streamflow)?;
    let gauge_ranks = map_gauges(view.grid(), &topology.rank, &gauges)?;
    let outlet = domain_outlet(drainage.meta.as_ref(), &forest)?;
    let outlets = assemble_outlets(&gauge_ranks, outlet);
    let subbasins = delineate(&forest, &outlets)?;

    let target = ActiveCells::collect(&topology.rank, &topology.coordinates(view.grid())?)?;
    let lss_view = DrainageView::new(lss);
    let source = ActiveCells::collect(&rank_array(&lss_view)?, &dataset_coordinates(&lss_view)?)?;
    let matched = match_domains(&target, &source)?;

    let land_cover = land_cover_fractions(&view, &forest, &subbasins, lss, &matched, diagnostics)?;
    let diagnostic = diagnostic_dataset(drainage, &forest, &subbasins, &matched)?;

    let outlets = subbasins
        .outlets()
        .iter()
        .enumerate()
        .map(|(i, &rank)| OutletEntry {
            subbasin: i + 1,
            rank,
            gauge: gauge_ranks
                .iter()
                .position(|&r| r == rank)
                .map(|g| gauges[g].name.clone()),
            cell_count: subbasins.cell_count(i + 1),
        })
        .collect();

    let report = SubbasinReport {
        outlets,
        unassigned_cells: subbasins.unassigned_count(),
        land_cover,
    };
    info!(
        subbasins = report.outlets.len(),
        warnings = diagnostics.len(),
        "Subbasin workflow complete"
    );
    Ok(SubbasinRun {
        report,
        subbasins,
        diagnostic,
    })
}
