//! Drainage topology, subbasin delineation and domain matching.
//!
//! A drainage database is a single-frame grid dataset whose `Rank` and
//! `Next` attributes describe a flow forest: every active cell has a
//! unique rank in `1..=N` and drains to the cell ranked `Next`, with 0
//! marking an outlet. This crate turns those arrays into a [`Forest`],
//! partitions it into subbasins at chosen outlets and carries land-cover
//! information over from an independently gridded land-surface dataset.
//!
//! # Example
//!
//! ```ignore
//! use drainage::{build_forest, delineate, extract_topology, DrainageView};
//!
//! let view = DrainageView::new(&dataset);
//! let forest = build_forest(&extract_topology(&view)?)?;
//! let subbasins = delineate(&forest, &[42, 97])?;
//! ```

pub mod delineate;
pub mod forest;
pub mod fractions;
pub mod gauges;
pub mod matcher;
pub mod meta;
pub mod roles;
pub mod topology;
pub mod workflow;

pub use delineate::{delineate, Subbasins};
pub use forest::{build_forest, Cell, Forest};
pub use fractions::{diagnostic_dataset, land_cover_fractions, LandCoverFractions, SubbasinFractions};
pub use gauges::{assemble_outlets, domain_outlet, gauges_from_table, map_gauge, map_gauges, Gauge};
pub use matcher::{match_domains, nearest_index, ActiveCells, DomainMatch};
pub use meta::{check_drainage_quality, derive_drainage_meta};
pub use roles::{AttributeRole, RoleIndex};
pub use topology::{dataset_coordinates, extract_topology, rank_array, Coordinates, DrainageView, Topology};
pub use workflow::{run_subbasins, OutletEntry, SubbasinReport, SubbasinRun};
