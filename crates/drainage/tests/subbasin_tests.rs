//! Integration tests for delineation and the subbasin workflow.

use drainage::{
    build_forest, delineate, extract_topology, map_gauge, run_subbasins, DrainageView, Gauge,
    Topology,
};
use ensim_common::{Diagnostics, EnsimError, GridArray, GridHeader};
use r2c_parser::{read_r2c_str, AttributeSpec, R2cDataset, WriterInfo};
use tb0_parser::read_tb0_str;
use test_utils::fixtures::{DRAINAGE_3X3_R2C, GAUGES_TB0, LSS_2X2_R2C};
use test_utils::{
    assert_approx_eq, assert_slice_approx_eq, create_column_chains, create_row_major_ranks,
    create_single_outlet_next,
};

fn routing_dataset(nx: usize, ny: usize, rank: Vec<f64>, next: Vec<f64>) -> R2cDataset {
    let mut dataset = R2cDataset::new(GridHeader::lat_long(0.0, 0.0, nx, ny, 1.0, 1.0));
    dataset
        .push_attribute(AttributeSpec::integer("Rank"), GridArray::from_rows(nx, ny, rank).unwrap())
        .unwrap();
    dataset
        .push_attribute(AttributeSpec::integer("Next"), GridArray::from_rows(nx, ny, next).unwrap())
        .unwrap();
    dataset
}

fn chains_dataset(columns: usize, length: usize) -> R2cDataset {
    let (rank, next) = create_column_chains(columns, length);
    routing_dataset(columns, length, rank, next)
}

// ============================================================================
// Delineation
// ============================================================================

#[test]
fn test_single_outlet_claims_every_cell() {
    let dataset = read_r2c_str(DRAINAGE_3X3_R2C).unwrap();
    let forest = build_forest(&extract_topology(&DrainageView::new(&dataset)).unwrap()).unwrap();
    assert_eq!(forest.outlets().collect::<Vec<_>>(), vec![9]);
    assert_eq!(forest.upstream(9).len(), 8);

    let subbasins = delineate(&forest, &[9]).unwrap();
    assert!(subbasins.membership().iter().all(|&p| p == 1));
    assert_eq!(subbasins.unassigned_count(), 0);
}

#[test]
fn test_star_drainage_into_last_rank() {
    let dataset = routing_dataset(
        3,
        3,
        create_row_major_ranks(3, 3),
        create_single_outlet_next(3, 3),
    );
    let forest = build_forest(&extract_topology(&DrainageView::new(&dataset)).unwrap()).unwrap();
    assert_eq!(forest.outlets().collect::<Vec<_>>(), vec![9]);
    assert_eq!(forest.upstream(9).len(), 8);

    // An interior outlet keeps only itself, everything else drains past it
    let subbasins = delineate(&forest, &[4, 9]).unwrap();
    assert_eq!(subbasins.cell_count(1), 1);
    assert_eq!(subbasins.cell_count(2), 8);
    assert_eq!(subbasins.unassigned_count(), 0);
}

#[test]
fn test_disjoint_chains_form_separate_subbasins() {
    let dataset = chains_dataset(2, 3);
    let forest = build_forest(&extract_topology(&DrainageView::new(&dataset)).unwrap()).unwrap();
    assert_eq!(forest.outlets().collect::<Vec<_>>(), vec![3, 6]);

    let subbasins = delineate(&forest, &[3, 6]).unwrap();
    assert_eq!(subbasins.membership(), &[1, 1, 1, 2, 2, 2]);

    let grid = subbasins.to_grid(&forest, 2, 3);
    for y in 0..3 {
        assert_eq!(grid.get(0, y), 1.0);
        assert_eq!(grid.get(1, y), 2.0);
    }
}

#[test]
fn test_interior_outlet_splits_a_chain() {
    let dataset = chains_dataset(1, 4);
    let forest = build_forest(&extract_topology(&DrainageView::new(&dataset)).unwrap()).unwrap();
    // Chain 1 -> 2 -> 3 -> 4, with rank 4 at y = 0
    let subbasins = delineate(&forest, &[4, 2]).unwrap();
    assert_eq!(subbasins.membership(), &[2, 2, 1, 1]);
}

#[test]
fn test_missing_next_is_a_precondition_error() {
    let mut dataset = R2cDataset::new(GridHeader::lat_long(0.0, 0.0, 2, 1, 1.0, 1.0));
    dataset
        .push_attribute(
            AttributeSpec::integer("Rank"),
            GridArray::from_rows(2, 1, vec![1.0, 2.0]).unwrap(),
        )
        .unwrap();
    let err = extract_topology(&DrainageView::new(&dataset)).unwrap_err();
    assert!(matches!(err, EnsimError::MissingAttribute(ref name) if name == "Next"));
}

#[test]
fn test_topology_with_gap_is_rejected() {
    let topology = Topology {
        rank: GridArray::from_rows(2, 1, vec![1, 4]).unwrap(),
        next: GridArray::from_rows(2, 1, vec![4, 0]).unwrap(),
        latitude: None,
        longitude: None,
    };
    assert!(build_forest(&topology).unwrap_err().is_precondition());
}

// ============================================================================
// Gauges
// ============================================================================

#[test]
fn test_fixture_gauges_map_to_ranks() {
    let dataset = read_r2c_str(DRAINAGE_3X3_R2C).unwrap();
    let topology = extract_topology(&DrainageView::new(&dataset)).unwrap();
    let gauge = |name: &str, x: f64, y: f64| Gauge {
        name: name.to_string(),
        x,
        y,
    };
    assert_eq!(map_gauge(&dataset.grid, &topology.rank, &gauge("a", 1.5, 1.5)).unwrap(), 5);
    assert_eq!(map_gauge(&dataset.grid, &topology.rank, &gauge("b", 0.2, 2.7)).unwrap(), 7);

    let err = map_gauge(&dataset.grid, &topology.rank, &gauge("far", 3.0, 0.5)).unwrap_err();
    assert!(matches!(err, EnsimError::GaugeOutsideGrid { ref gauge, .. } if gauge == "far"));
}

// ============================================================================
// Workflow
// ============================================================================

#[test]
fn test_subbasin_workflow_on_fixtures() {
    let drainage = read_r2c_str(DRAINAGE_3X3_R2C).unwrap();
    let lss = read_r2c_str(LSS_2X2_R2C).unwrap();
    let mut diagnostics = Diagnostics::new();
    let streamflow = read_tb0_str(GAUGES_TB0, &mut diagnostics).unwrap();

    let run = run_subbasins(&drainage, &lss, &streamflow, &mut diagnostics).unwrap();
    assert!(diagnostics.is_empty(), "{}", diagnostics.summary());

    let outlets: Vec<_> = run
        .report
        .outlets
        .iter()
        .map(|o| (o.rank, o.gauge.clone(), o.cell_count))
        .collect();
    assert_eq!(
        outlets,
        vec![
            (5, Some("05AA001".to_string()), 1),
            (7, Some("Bow River".to_string()), 1),
            (9, None, 7),
        ]
    );
    assert_eq!(run.report.unassigned_cells, 0);

    let land_cover = &run.report.land_cover;
    assert_eq!(land_cover.classes, vec!["forest", "crop"]);
    let fractions: Vec<&[f64]> = land_cover
        .subbasins
        .iter()
        .map(|s| s.fractions.as_slice())
        .collect();
    assert_slice_approx_eq!(fractions[0], [0.25, 0.75], 1e-12);
    assert_slice_approx_eq!(fractions[1], [0.5, 0.5], 1e-12);
    assert_slice_approx_eq!(fractions[2], [2.25 / 7.0, 4.75 / 7.0], 1e-12);
    for subbasin in &land_cover.subbasins {
        assert_approx_eq!(subbasin.fractions.iter().sum::<f64>(), 1.0, 1e-12);
    }
}

#[test]
fn test_diagnostic_dataset_layout() {
    let drainage = read_r2c_str(DRAINAGE_3X3_R2C).unwrap();
    let lss = read_r2c_str(LSS_2X2_R2C).unwrap();
    let mut diagnostics = Diagnostics::new();
    let streamflow = read_tb0_str(GAUGES_TB0, &mut diagnostics).unwrap();
    let run = run_subbasins(&drainage, &lss, &streamflow, &mut diagnostics).unwrap();

    let names: Vec<&str> = run.diagnostic.attributes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Rank", "Next", "DA", "ChnlSlope", "ChnlLength", "IAK", "GridArea", "GeophyDist",
            "RankGeophyToShd", "Subbasins", "forest", "crop",
        ]
    );

    let subbasins = run.diagnostic.require("Subbasins").unwrap();
    assert_eq!(subbasins.get(1, 1), 1.0);
    assert_eq!(subbasins.get(0, 2), 2.0);
    assert_eq!(subbasins.get(0, 0), 3.0);

    let matched = run.diagnostic.require("RankGeophyToShd").unwrap();
    assert_eq!(matched.get(0, 0), 1.0);
    assert_eq!(matched.get(2, 0), 2.0);
    assert_eq!(matched.get(0, 2), 3.0);
    assert_eq!(matched.get(2, 2), 4.0);

    let distance = run.diagnostic.require("GeophyDist").unwrap();
    assert_approx_eq!(distance.get(0, 0), 0.045, 1e-12);

    // The diagnostic dataset is a valid drainage database in its own right
    let text = String::from_utf8(
        run.diagnostic
            .write_to(Vec::new(), &WriterInfo::default())
            .unwrap(),
    )
    .unwrap();
    let reread = read_r2c_str(&text).unwrap();
    assert_eq!(reread.attributes.len(), 12);
    assert_eq!(reread.require("Subbasins").unwrap(), subbasins);
}

#[test]
fn test_workflow_reports_bad_gauge() {
    let drainage = read_r2c_str(DRAINAGE_3X3_R2C).unwrap();
    let lss = read_r2c_str(LSS_2X2_R2C).unwrap();
    let mut diagnostics = Diagnostics::new();
    let table = GAUGES_TB0.replace(":ColumnLocationX 1.5 0.2", ":ColumnLocationX 1.5 7.2");
    let streamflow = read_tb0_str(&table, &mut diagnostics).unwrap();

    let err = run_subbasins(&drainage, &lss, &streamflow, &mut diagnostics).unwrap_err();
    assert!(err.to_string().contains("Bow River"));
}
