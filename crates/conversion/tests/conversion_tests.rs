//! Integration tests for field conversion using in-memory collaborators.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use conversion::{
    build_drainage_database, ConversionError, ConversionField, DatabaseRequest, FieldKey,
    FieldSource, Interpolation, Resampler, SourceError, SourceField, TimeSeriesConversion,
};
use drainage::Coordinates;
use ensim_common::{Diagnostics, GridArray, GridHeader, Projection, Rotation, WarningKind};
use r2c_parser::{read_r2c_file, read_r2c_str, AttributeSpec, WriterInfo};
use std::collections::HashMap;
use test_utils::{assert_approx_eq, temp_test_dir};

/// Fields held in memory, all on one grid.
struct MemorySource {
    grid: GridHeader,
    fields: HashMap<FieldKey, GridArray>,
}

impl MemorySource {
    fn new(grid: GridHeader) -> Self {
        Self {
            grid,
            fields: HashMap::new(),
        }
    }

    fn insert(&mut self, key: FieldKey, data: GridArray) {
        self.fields.insert(key, data);
    }
}

impl FieldSource for MemorySource {
    fn read_field(&self, key: &FieldKey) -> Result<SourceField, SourceError> {
        let data = self
            .fields
            .get(key)
            .cloned()
            .ok_or_else(|| SourceError::FieldNotFound(key.to_string()))?;
        Ok(SourceField {
            key: key.clone(),
            grid: self.grid.clone(),
            data,
        })
    }
}

/// Picks the source cell containing each target cell centre.
struct CellLookup;

impl Resampler for CellLookup {
    fn resample(
        &self,
        field: &SourceField,
        target: &GridHeader,
        _kind: Interpolation,
    ) -> Result<GridArray, SourceError> {
        let mut out = target.filled(0.0);
        for y in 0..target.y_count {
            for x in 0..target.x_count {
                let (sx, sy) = field
                    .grid
                    .locate(target.cell_centre_x(x), target.cell_centre_y(y))
                    .ok_or_else(|| SourceError::ResampleFailed(format!("cell ({}, {}) outside source", x, y)))?;
                out.set(x, y, field.data.get(sx, sy));
            }
        }
        Ok(out)
    }

    fn coordinates(&self, target: &GridHeader) -> Option<Coordinates> {
        Some(Coordinates {
            latitude: GridArray::from_fn(target.x_count, target.y_count, |_, y| target.cell_centre_y(y)),
            longitude: GridArray::from_fn(target.x_count, target.y_count, |x, _| target.cell_centre_x(x)),
        })
    }
}

fn hour(h: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::hours(h)
}

fn fixed_info() -> WriterInfo {
    WriterInfo::default().with_creation_date(hour(0))
}

fn target() -> GridHeader {
    GridHeader::lat_long(0.0, 0.0, 2, 2, 1.0, 1.0)
}

/// One coarse cell covering the whole target, holding `10 * hour`.
fn accumulated_source(hours: std::ops::Range<i64>) -> MemorySource {
    let mut source = MemorySource::new(GridHeader::lat_long(0.0, 0.0, 1, 1, 2.0, 2.0));
    for h in hours {
        source.insert(FieldKey::new("PR").at(hour(h)), GridArray::filled(1, 1, 10.0 * h as f64));
    }
    source
}

// ============================================================================
// Time series
// ============================================================================

#[test]
fn test_time_series_resamples_and_transforms() {
    let source = accumulated_source(0..4);
    let field = ConversionField::new("PR", AttributeSpec::float("rain").with_units("mm"))
        .with_interpolation(Interpolation::Linear)
        .scaled(0.5, 1.0);
    let conversion = TimeSeriesConversion::new(target(), hour(0), hour(3), Duration::hours(1))
        .with_info(fixed_info());

    let (out, frames) = conversion.run(&field, &source, &CellLookup, Vec::new()).unwrap();
    assert_eq!(frames, 3);

    let dataset = read_r2c_str(&String::from_utf8(out).unwrap()).unwrap();
    assert_eq!(dataset.attributes[0].name, "rain");
    let frames = dataset.frames();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[2].timestamp, hour(2));
    assert_eq!(frames[2].data, GridArray::filled(2, 2, 11.0));
}

#[test]
fn test_deaccumulated_time_series() {
    let source = accumulated_source(0..4);
    let field = ConversionField::new("PR", AttributeSpec::float("rain"))
        .deaccumulated()
        .clipped(Some(0.0), None);
    let conversion = TimeSeriesConversion::new(target(), hour(1), hour(4), Duration::hours(1))
        .with_info(fixed_info());

    let dir = temp_test_dir();
    let path = dir.path().join("rain.r2c");
    let frames = conversion.run_to_file(&field, &source, &CellLookup, &path).unwrap();
    assert_eq!(frames, 3);

    let dataset = read_r2c_file(&path).unwrap();
    for frame in dataset.frames() {
        for value in frame.data.as_slice() {
            assert_approx_eq!(*value, 10.0, 1e-12);
        }
    }
}

#[test]
fn test_missing_field_aborts_the_run() {
    let source = accumulated_source(0..2);
    let field = ConversionField::new("PR", AttributeSpec::float("rain"));
    let conversion = TimeSeriesConversion::new(target(), hour(0), hour(3), Duration::hours(1));

    let err = conversion.run(&field, &source, &CellLookup, Vec::new()).unwrap_err();
    match err {
        ConversionError::Source(SourceError::FieldNotFound(key)) => {
            assert!(key.contains("2023/01/01 02:00:00"), "{}", key);
        }
        other => panic!("unexpected error: {}", other),
    }
}

/// Returns the source field unchanged whatever the target.
struct Passthrough;

impl Resampler for Passthrough {
    fn resample(
        &self,
        field: &SourceField,
        _target: &GridHeader,
        _kind: Interpolation,
    ) -> Result<GridArray, SourceError> {
        Ok(field.data.clone())
    }
}

#[test]
fn test_resampled_shape_must_match_target() {
    let source = accumulated_source(0..3);
    let field = ConversionField::new("PR", AttributeSpec::float("rain")).deaccumulated();

    let err = field
        .fetch(&source, &Passthrough, &target(), Some(hour(2)), Duration::hours(1))
        .unwrap_err();
    match err {
        ConversionError::Source(SourceError::ResampleFailed(message)) => {
            assert!(message.contains("1x1"), "{}", message);
            assert!(message.contains("2x2"), "{}", message);
        }
        other => panic!("unexpected error: {}", other),
    }
}

// ============================================================================
// Drainage databases
// ============================================================================

fn shed_source(grid: &GridHeader) -> MemorySource {
    let mut shed = MemorySource::new(grid.clone());
    let row = |a: f64, b: f64| GridArray::from_rows(2, 1, vec![a, b]).unwrap();
    shed.insert(FieldKey::new("RANK"), row(1.0, 2.0));
    shed.insert(FieldKey::new("NEXT"), row(2.0, 0.0));
    shed.insert(FieldKey::new("DA"), row(1.0, 2.0));
    shed.insert(FieldKey::new("CSLP"), row(0.01, 0.02));
    shed.insert(FieldKey::new("ELEV"), row(300.0, 250.0));
    shed.insert(FieldKey::new("CLEN"), row(1000.0, 1000.0));
    shed.insert(FieldKey::new("CHNL"), row(1.2, 2.0));
    shed.insert(FieldKey::new("REAC"), row(0.0, 0.0));
    shed.insert(FieldKey::new("GRDA"), row(4.0, 16.0));
    shed.insert(FieldKey::new("VEGL"), row(0.5, 0.5));
    shed.insert(FieldKey::new("VEGH"), row(0.5, 0.5));
    shed
}

fn physics_source(grid: &GridHeader) -> MemorySource {
    let mut physics = MemorySource::new(grid.clone());
    physics.insert(FieldKey::new("SLOP"), GridArray::filled(2, 1, 0.1));
    physics.insert(FieldKey::new("VF").with_level(1199), GridArray::filled(2, 1, 0.25));
    physics.insert(FieldKey::new("VF").with_level(1185), GridArray::filled(2, 1, 0.75));
    physics
}

#[test]
fn test_full_database() {
    let grid = GridHeader::lat_long(0.0, 0.0, 2, 1, 1.0, 1.0);
    let shed = shed_source(&grid);
    let physics = physics_source(&grid);
    let mut diagnostics = Diagnostics::new();
    let request = DatabaseRequest::Full {
        shed: &shed,
        physics: &physics,
    };

    let dataset = build_drainage_database(&request, &grid, &CellLookup, &mut diagnostics).unwrap();
    let names: Vec<&str> = dataset.attributes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Rank", "Next", "DA", "ChnlSlope", "Elev", "ChnlLength", "IAK", "Chnl", "Reach",
            "GridArea", "VegLow", "VegHigh", "IntSlope", "1199 sea water", "1185 crops",
            "impervious",
        ]
    );
    // Bankfull and 24 vegetation classes are absent from the sources
    assert_eq!(diagnostics.count(WarningKind::MissingSourceField), 25);

    let meta = dataset.meta.as_ref().unwrap();
    assert_eq!(meta.class_count, 3);
    assert_eq!(meta.total_num_of_grids, 2);
    assert_eq!(meta.num_grids_in_basin, 1);
    assert_eq!(meta.debug_grid_no, 1);
    assert_eq!(meta.num_river_classes, 1);
    assert_approx_eq!(meta.nominal_grid_size_al, 10f64.sqrt(), 1e-12);

    assert_eq!(dataset.require("Chnl").unwrap().as_slice(), &[1.0, 2.0]);
    assert_eq!(dataset.require("IAK").unwrap().as_slice(), &[1.0, 1.0]);
    assert_eq!(dataset.require("impervious").unwrap().as_slice(), &[0.0, 0.0]);

    // Class names with spaces survive a write and re-read
    let text = String::from_utf8(dataset.write_to(Vec::new(), &fixed_info()).unwrap()).unwrap();
    assert!(text.contains(":AttributeName 14 \"1199 sea water\""));
    let reread = read_r2c_str(&text).unwrap();
    assert_eq!(reread.attributes.len(), 16);
    assert_eq!(reread.meta, dataset.meta);
}

#[test]
fn test_routing_only_requires_rank() {
    let grid = GridHeader::lat_long(0.0, 0.0, 2, 1, 1.0, 1.0);
    let mut shed = shed_source(&grid);
    shed.fields.remove(&FieldKey::new("RANK"));
    let mut diagnostics = Diagnostics::new();

    let err = build_drainage_database(
        &DatabaseRequest::RoutingOnly { shed: &shed },
        &grid,
        &CellLookup,
        &mut diagnostics,
    )
    .unwrap_err();
    assert!(matches!(err, ConversionError::Source(SourceError::FieldNotFound(_))));
}

#[test]
fn test_land_surface_only_on_rotated_grid() {
    let grid = GridHeader {
        projection: Projection::RotatedLatLong(Rotation::default()),
        ..GridHeader::lat_long(0.0, 0.0, 2, 1, 1.0, 1.0)
    };
    let physics = physics_source(&grid);
    let mut diagnostics = Diagnostics::new();

    let dataset = build_drainage_database(
        &DatabaseRequest::LandSurfaceOnly { physics: &physics },
        &grid,
        &CellLookup,
        &mut diagnostics,
    )
    .unwrap();
    assert_eq!(dataset.attributes[0].name, "Latitude");
    assert_eq!(dataset.attributes[1].name, "Longitude");
    assert_eq!(dataset.require("Longitude").unwrap().as_slice(), &[0.5, 1.5]);
    assert!(dataset.array("Rank").is_none());
    assert_eq!(dataset.meta.as_ref().unwrap().class_count, 3);
}
