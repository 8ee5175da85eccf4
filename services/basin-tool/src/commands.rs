//! Subcommand implementations.

use crate::config::RunPaths;
use anyhow::{Context, Result};
use drainage::{run_subbasins, SubbasinReport};
use ensim_common::{format_timestamp, Diagnostics, GridArray};
use r2c_parser::{read_r2c_file, R2cDataset, WriterInfo};
use std::fmt;
use std::path::Path;
use tb0_parser::{read_tb0_file, Tb0Dataset, Tb0Header};
use tracing::info;

/// Run the subbasin workflow and write its outputs.
///
/// Returns the report so the caller can print or save it.
pub fn subbasins(paths: &RunPaths, diagnostics: &mut Diagnostics) -> Result<SubbasinReport> {
    let drainage = read_r2c_file(&paths.drainage_database)
        .with_context(|| format!("Failed to read drainage database {:?}", paths.drainage_database))?;
    let lss = read_r2c_file(&paths.lss_database)
        .with_context(|| format!("Failed to read land-surface database {:?}", paths.lss_database))?;
    let streamflow = match &paths.streamflow {
        Some(path) => read_tb0_file(path, diagnostics)
            .with_context(|| format!("Failed to read streamflow table {:?}", path))?,
        None => Tb0Dataset {
            header: Tb0Header::new(Vec::new()),
            rows: Vec::new(),
        },
    };

    let run = run_subbasins(&drainage, &lss, &streamflow, diagnostics)
        .context("Subbasin delineation failed")?;

    if let Some(output) = &paths.diagnostic_output {
        run.diagnostic
            .write_file(output, &WriterInfo::default())
            .with_context(|| format!("Failed to write diagnostic output {:?}", output))?;
        info!(path = %output.display(), "Wrote diagnostic dataset");
    }
    Ok(run.report)
}

/// Outlet table and per-subbasin fractions as plain text.
pub fn render_report(report: &SubbasinReport) -> String {
    ReportTable(report).to_string()
}

/// Outlet and land-cover tables of a subbasin run.
pub struct ReportTable<'a>(pub &'a SubbasinReport);

impl fmt::Display for ReportTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "{:>8} {:>8} {:>8}  gauge", "subbasin", "rank", "cells")?;
        for outlet in &report.outlets {
            writeln!(
                f,
                "{:>8} {:>8} {:>8}  {}",
                outlet.subbasin,
                outlet.rank,
                outlet.cell_count,
                outlet.gauge.as_deref().unwrap_or("(domain outlet)")
            )?;
        }
        if report.unassigned_cells > 0 {
            writeln!(f, "{} active cells drain to no outlet", report.unassigned_cells)?;
        }

        let land_cover = &report.land_cover;
        writeln!(f)?;
        write!(f, "{:>8}", "subbasin")?;
        for class in &land_cover.classes {
            write!(f, " {:>12}", truncate(class, 12))?;
        }
        writeln!(f)?;
        for subbasin in &land_cover.subbasins {
            write!(f, "{:>8}", subbasin.subbasin)?;
            for fraction in &subbasin.fractions {
                write!(f, " {:>12.4}", fraction)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn truncate(s: &str, width: usize) -> &str {
    match s.char_indices().nth(width) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Summary of a grid or table dataset, chosen by file extension.
pub fn inspect(path: &Path, diagnostics: &mut Diagnostics) -> Result<String> {
    let is_table = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tb0"));
    if is_table {
        let table = read_tb0_file(path, diagnostics)
            .with_context(|| format!("Failed to read table {:?}", path))?;
        Ok(describe_table(&table))
    } else {
        let dataset = read_r2c_file(path)
            .with_context(|| format!("Failed to read grid dataset {:?}", path))?;
        Ok(describe_grid(&dataset))
    }
}

fn value_range(array: &GridArray) -> (f64, f64) {
    array
        .as_slice()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

pub fn describe_grid(dataset: &R2cDataset) -> String {
    GridSummary(dataset).to_string()
}

struct GridSummary<'a>(&'a R2cDataset);

impl fmt::Display for GridSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dataset = self.0;
        let grid = &dataset.grid;
        writeln!(
            f,
            "grid: {} {}x{} origin ({}, {}) delta ({}, {})",
            grid.projection.keyword(),
            grid.x_count,
            grid.y_count,
            grid.x_origin,
            grid.y_origin,
            grid.x_delta,
            grid.y_delta
        )?;
        if let Some(meta) = &dataset.meta {
            writeln!(
                f,
                "drainage: {} grids, {} in basin, {} classes",
                meta.total_num_of_grids, meta.num_grids_in_basin, meta.class_count
            )?;
        }
        let frames = dataset.frames();
        match (frames.first(), frames.last()) {
            (Some(first), Some(last)) => {
                let name = dataset
                    .attributes
                    .first()
                    .map(|a| a.display_name(0))
                    .unwrap_or_default();
                writeln!(
                    f,
                    "frames: {} of {} from {} to {}",
                    frames.len(),
                    name,
                    format_timestamp(&first.timestamp),
                    format_timestamp(&last.timestamp)
                )
            }
            _ => {
                writeln!(f, "attributes: {}", dataset.attributes.len())?;
                for (position, (spec, array)) in dataset.single_frame().enumerate() {
                    let (lo, hi) = value_range(array);
                    writeln!(
                        f,
                        "  {:>3} {} [{}] min {} max {}",
                        position + 1,
                        spec.display_name(position),
                        spec.units.as_deref().unwrap_or("-"),
                        lo,
                        hi
                    )?;
                }
                Ok(())
            }
        }
    }
}

pub fn describe_table(table: &Tb0Dataset) -> String {
    TableSummary(table).to_string()
}

struct TableSummary<'a>(&'a Tb0Dataset);

impl fmt::Display for TableSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.0;
        writeln!(
            f,
            "columns: {}, records: {}",
            table.header.column_count(),
            table.record_count()
        )?;
        if let Some(start) = table.header.meta.as_ref().and_then(|m| m.start_time) {
            writeln!(f, "start: {}", format_timestamp(&start))?;
        }
        for (position, column) in table.header.columns.iter().enumerate() {
            let location = column
                .location()
                .map(|(x, y)| format!("({}, {})", x, y))
                .unwrap_or_else(|| "-".to_string());
            writeln!(f, "  {:>3} {} at {}", position + 1, column.display_name(position), location)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::{DRAINAGE_3X3_R2C, GAUGES_TB0, LSS_2X2_R2C, RAIN_MULTI_FRAME_R2C};
    use test_utils::{temp_test_dir, write_fixture_in};

    #[test]
    fn test_subbasins_writes_diagnostic_output() {
        let dir = temp_test_dir();
        let paths = RunPaths {
            drainage_database: write_fixture_in(&dir, "drainage.r2c", DRAINAGE_3X3_R2C),
            lss_database: write_fixture_in(&dir, "lss.r2c", LSS_2X2_R2C),
            streamflow: Some(write_fixture_in(&dir, "gauges.tb0", GAUGES_TB0)),
            diagnostic_output: Some(dir.path().join("shd_output.r2c")),
        };
        let mut diagnostics = Diagnostics::new();
        let report = subbasins(&paths, &mut diagnostics).unwrap();
        assert_eq!(report.outlets.len(), 3);

        let diagnostic = read_r2c_file(dir.path().join("shd_output.r2c")).unwrap();
        assert!(diagnostic.array("Subbasins").is_some());

        let text = render_report(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "subbasin     rank    cells  gauge");
        assert!(lines[2].ends_with("Bow River"));
        assert!(lines[3].ends_with("(domain outlet)"));
        assert_eq!(lines[4], "");
        assert_eq!(lines[8], format!("{:>8} {:>12} {:>12}", 3, "0.3214", "0.6786"));
    }

    #[test]
    fn test_subbasins_without_streamflow_uses_domain_outlet() {
        let dir = temp_test_dir();
        let paths = RunPaths {
            drainage_database: write_fixture_in(&dir, "drainage.r2c", DRAINAGE_3X3_R2C),
            lss_database: write_fixture_in(&dir, "lss.r2c", LSS_2X2_R2C),
            streamflow: None,
            diagnostic_output: None,
        };
        let report = subbasins(&paths, &mut Diagnostics::new()).unwrap();
        assert_eq!(report.outlets.len(), 1);
        assert_eq!(report.outlets[0].rank, 9);
        assert_eq!(report.outlets[0].cell_count, 9);
    }

    #[test]
    fn test_inspect_grid_and_table() {
        let dir = temp_test_dir();
        let mut diagnostics = Diagnostics::new();

        let grid = inspect(&write_fixture_in(&dir, "lss.r2c", LSS_2X2_R2C), &mut diagnostics).unwrap();
        assert!(grid.starts_with("grid: LATLONG 2x2"));
        assert!(grid.contains("forest"));

        let rain = inspect(&write_fixture_in(&dir, "rain.r2c", RAIN_MULTI_FRAME_R2C), &mut diagnostics).unwrap();
        assert!(rain.contains("frames: 3"));

        let table = inspect(&write_fixture_in(&dir, "gauges.TB0", GAUGES_TB0), &mut diagnostics).unwrap();
        assert!(table.contains("columns: 2, records: 3"));
        assert!(table.contains("Bow River at (0.2, 2.7)"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("1199 sea water", 8), "1199 sea");
        assert_eq!(truncate("crop", 8), "crop");
    }
}
