//! Grid header parsing and writing.
//!
//! The header is a run of `:Keyword value` lines closed by `:EndHeader`.
//! Keywords are matched case-insensitively and unknown ones are skipped.

use crate::attribute::{split_indexed, AttributeSpec, AttributeType};
use chrono::{NaiveDateTime, Utc};
use ensim_common::lines::{quote_if_needed, tokenize};
use ensim_common::{
    format_timestamp, DrainageMeta, EnsimError, EnsimResult, GridHeader, LineReader, Projection,
    Rotation,
};
use std::io::{BufRead, Cursor, Write};
use std::str::FromStr;
use tracing::debug;

/// Provenance lines at the top of a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Banner {
    pub file_type: Option<String>,
    pub application: Option<String>,
    pub version: Option<String>,
    pub written_by: Option<String>,
    pub creation_date: Option<String>,
}

/// Everything declared before `:EndHeader`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderBlock {
    pub banner: Banner,
    pub grid: GridHeader,
    pub meta: Option<DrainageMeta>,
    pub attributes: Vec<AttributeSpec>,
}

/// Provenance written into new datasets.
#[derive(Debug, Clone)]
pub struct WriterInfo {
    pub application: String,
    pub version: String,
    pub written_by: String,
    /// Fixed creation date; the current UTC time when `None`.
    pub creation_date: Option<NaiveDateTime>,
}

impl Default for WriterInfo {
    fn default() -> Self {
        Self {
            application: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            written_by: env!("CARGO_PKG_NAME").to_string(),
            creation_date: None,
        }
    }
}

impl WriterInfo {
    pub fn with_creation_date(mut self, date: NaiveDateTime) -> Self {
        self.creation_date = Some(date);
        self
    }
}

#[derive(Default)]
struct PartialGrid {
    projection: Option<String>,
    projection_line: usize,
    ellipsoid: Option<String>,
    x_origin: Option<f64>,
    y_origin: Option<f64>,
    x_count: Option<usize>,
    y_count: Option<usize>,
    x_delta: Option<f64>,
    y_delta: Option<f64>,
    rotation: Rotation,
}

fn parse_value<T: FromStr>(tokens: &[String], line: usize) -> EnsimResult<T> {
    let raw = tokens
        .get(1)
        .ok_or_else(|| EnsimError::format(line, format!("missing value for '{}'", tokens[0])))?;
    raw.parse()
        .map_err(|_| EnsimError::format(line, format!("invalid value '{}' for '{}'", raw, tokens[0])))
}

/// Counts are integers but some writers emit them as `12.0`.
fn parse_count(tokens: &[String], line: usize) -> EnsimResult<usize> {
    let value: f64 = parse_value(tokens, line)?;
    if value < 0.0 || value.fract() != 0.0 {
        return Err(EnsimError::format(
            line,
            format!("'{}' must be a non-negative integer, got {}", tokens[0], value),
        ));
    }
    Ok(value as usize)
}

fn meta_mut(meta: &mut Option<DrainageMeta>) -> &mut DrainageMeta {
    meta.get_or_insert_with(DrainageMeta::default)
}

/// Read header lines up to and including `:EndHeader`.
pub fn parse_header<R: BufRead>(lines: &mut LineReader<R>) -> EnsimResult<HeaderBlock> {
    let mut banner = Banner::default();
    let mut grid = PartialGrid::default();
    let mut meta: Option<DrainageMeta> = None;
    let mut attributes: Vec<AttributeSpec> = Vec::new();

    loop {
        let Some(raw) = lines.next_line()? else {
            return Err(EnsimError::MissingEndHeader {
                line: lines.line_number(),
            });
        };
        let line = lines.line_number();
        if !raw.trim_start().starts_with(':') {
            continue;
        }
        let key = raw
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        // Only attribute values may be quoted
        let tokens: Vec<String> = if key.starts_with(":attribute") {
            tokenize(&raw, line)?
        } else {
            raw.split_whitespace().map(str::to_string).collect()
        };
        let rest = || tokens[1..].join(" ");

        match key.as_str() {
            ":endheader" => break,

            ":filetype" => banner.file_type = Some(rest()),
            ":application" => banner.application = Some(rest()),
            ":version" => banner.version = Some(rest()),
            ":writtenby" => banner.written_by = Some(rest()),
            ":creationdate" => banner.creation_date = Some(rest()),

            ":nominalgridsize_al" => meta_mut(&mut meta).nominal_grid_size_al = parse_value(&tokens, line)?,
            ":contourinterval" => meta_mut(&mut meta).contour_interval = parse_value(&tokens, line)?,
            ":imperviousarea" => meta_mut(&mut meta).impervious_area = parse_value(&tokens, line)?,
            ":classcount" => meta_mut(&mut meta).class_count = parse_count(&tokens, line)?,
            ":numriverclasses" => meta_mut(&mut meta).num_river_classes = parse_count(&tokens, line)?,
            ":elevconversion" => meta_mut(&mut meta).elev_conversion = parse_value(&tokens, line)?,
            ":totalnumofgrids" => meta_mut(&mut meta).total_num_of_grids = parse_count(&tokens, line)?,
            ":numgridsinbasin" => meta_mut(&mut meta).num_grids_in_basin = parse_count(&tokens, line)?,
            ":debuggridno" => meta_mut(&mut meta).debug_grid_no = parse_count(&tokens, line)?,

            ":projection" => {
                grid.projection = Some(parse_value::<String>(&tokens, line)?.to_ascii_uppercase());
                grid.projection_line = line;
            }
            ":ellipsoid" => grid.ellipsoid = Some(parse_value::<String>(&tokens, line)?.to_ascii_uppercase()),
            ":centrelatitude" => grid.rotation.centre_latitude = parse_value(&tokens, line)?,
            ":centrelongitude" => grid.rotation.centre_longitude = parse_value(&tokens, line)?,
            ":rotationlatitude" => grid.rotation.rotation_latitude = parse_value(&tokens, line)?,
            ":rotationlongitude" => grid.rotation.rotation_longitude = parse_value(&tokens, line)?,
            ":gridnorthpolelatitude" => grid.rotation.grid_north_pole_latitude = parse_value(&tokens, line)?,
            ":gridnorthpolelongitude" => grid.rotation.grid_north_pole_longitude = parse_value(&tokens, line)?,
            ":northpolegridlongitude" => grid.rotation.north_pole_grid_longitude = parse_value(&tokens, line)?,
            ":xorigin" => grid.x_origin = Some(parse_value(&tokens, line)?),
            ":yorigin" => grid.y_origin = Some(parse_value(&tokens, line)?),
            ":xcount" => grid.x_count = Some(parse_count(&tokens, line)?),
            ":ycount" => grid.y_count = Some(parse_count(&tokens, line)?),
            ":xdelta" => grid.x_delta = Some(parse_value(&tokens, line)?),
            ":ydelta" => grid.y_delta = Some(parse_value(&tokens, line)?),

            ":attributename" => {
                let (_, name) = split_indexed(&tokens[1..]);
                attributes.push(AttributeSpec::new(name));
            }
            ":attributetype" | ":attributeunits" => {
                let (index, value) = split_indexed(&tokens[1..]);
                let count = attributes.len();
                // Out-of-range indexes go to the most recently declared attribute
                let position = match index {
                    Some(i) if i >= 1 && i <= count => i - 1,
                    _ if count > 0 => count - 1,
                    _ => {
                        return Err(EnsimError::format(
                            line,
                            format!("'{}' appears before any ':AttributeName'", tokens[0]),
                        ))
                    }
                };
                if key == ":attributetype" {
                    attributes[position].kind = Some(AttributeType::parse(&value));
                } else {
                    attributes[position].units = Some(value);
                }
            }

            _ => debug!(keyword = %tokens[0], line, "Ignoring unknown header keyword"),
        }
    }

    let end_line = lines.line_number();
    let grid = finish_grid(grid, end_line)?;
    Ok(HeaderBlock {
        banner,
        grid,
        meta,
        attributes,
    })
}

fn finish_grid(partial: PartialGrid, end_line: usize) -> EnsimResult<GridHeader> {
    let projection_name = partial
        .projection
        .ok_or(EnsimError::MissingHeaderKey("Projection"))?;
    let projection = match projection_name.as_str() {
        "LATLONG" => Projection::LatLong,
        "ROTLATLONG" => Projection::RotatedLatLong(partial.rotation),
        other => {
            return Err(EnsimError::format(
                partial.projection_line,
                format!("unsupported projection '{}'", other),
            ))
        }
    };
    let grid = GridHeader {
        projection,
        ellipsoid: partial.ellipsoid.unwrap_or_else(|| "UNKNOWN".to_string()),
        x_origin: partial.x_origin.ok_or(EnsimError::MissingHeaderKey("xOrigin"))?,
        y_origin: partial.y_origin.ok_or(EnsimError::MissingHeaderKey("yOrigin"))?,
        x_count: partial.x_count.ok_or(EnsimError::MissingHeaderKey("xCount"))?,
        y_count: partial.y_count.ok_or(EnsimError::MissingHeaderKey("yCount"))?,
        x_delta: partial.x_delta.ok_or(EnsimError::MissingHeaderKey("xDelta"))?,
        y_delta: partial.y_delta.ok_or(EnsimError::MissingHeaderKey("yDelta"))?,
    };
    grid.validate()
        .map_err(|message| EnsimError::format(end_line, message))?;
    Ok(grid)
}

/// Parse a header held in memory.
pub fn parse_header_str(text: &str) -> EnsimResult<HeaderBlock> {
    parse_header(&mut LineReader::new(Cursor::new(text)))
}

/// Write a complete header, ending with `:EndHeader`.
pub fn write_header<W: Write>(
    out: &mut W,
    grid: &GridHeader,
    attributes: &[AttributeSpec],
    meta: Option<&DrainageMeta>,
    info: &WriterInfo,
) -> EnsimResult<()> {
    let created = info
        .creation_date
        .unwrap_or_else(|| Utc::now().naive_utc());

    writeln!(out, "########################################")?;
    writeln!(out, ":FileType r2c ASCII EnSim 1.0")?;
    writeln!(out, "#")?;
    writeln!(out, "# DataType 2D Rect Cell")?;
    writeln!(out, "#")?;
    writeln!(out, ":Application {}", info.application)?;
    writeln!(out, ":Version {}", info.version)?;
    writeln!(out, ":WrittenBy {}", info.written_by)?;
    writeln!(out, ":CreationDate {}", format_timestamp(&created))?;
    writeln!(out, "#")?;
    writeln!(out, "#---------------------------------------")?;
    writeln!(out, "#")?;

    if let Some(meta) = meta {
        writeln!(out, "#")?;
        writeln!(out, ":NominalGridSize_AL {}", meta.nominal_grid_size_al)?;
        writeln!(out, ":ContourInterval {}", meta.contour_interval)?;
        writeln!(out, ":ImperviousArea {}", meta.impervious_area)?;
        writeln!(out, ":ClassCount {}", meta.class_count)?;
        writeln!(out, ":NumRiverClasses {}", meta.num_river_classes)?;
        writeln!(out, ":ElevConversion {}", meta.elev_conversion)?;
        writeln!(out, ":TotalNumOfGrids {}", meta.total_num_of_grids)?;
        writeln!(out, ":NumGridsInBasin {}", meta.num_grids_in_basin)?;
        writeln!(out, ":DebugGridNo {}", meta.debug_grid_no)?;
    }
    writeln!(out, "#")?;

    writeln!(out, ":Projection {}", grid.projection.keyword())?;
    if let Projection::RotatedLatLong(rotation) = &grid.projection {
        writeln!(out, ":CentreLatitude {}", rotation.centre_latitude)?;
        writeln!(out, ":CentreLongitude {}", rotation.centre_longitude)?;
        writeln!(out, ":RotationLatitude {}", rotation.rotation_latitude)?;
        writeln!(out, ":RotationLongitude {}", rotation.rotation_longitude)?;
    }
    writeln!(out, ":Ellipsoid {}", grid.ellipsoid)?;

    writeln!(out, "#")?;
    writeln!(out, ":xOrigin {}", grid.x_origin)?;
    writeln!(out, ":yOrigin {}", grid.y_origin)?;
    writeln!(out, "#")?;
    if let Projection::RotatedLatLong(rotation) = &grid.projection {
        writeln!(out, ":GridNorthPoleLatitude {}", rotation.grid_north_pole_latitude)?;
        writeln!(out, ":GridNorthPoleLongitude {}", rotation.grid_north_pole_longitude)?;
        writeln!(out, ":NorthPoleGridLongitude {}", rotation.north_pole_grid_longitude)?;
    }
    writeln!(out, "#")?;

    for (i, attribute) in attributes.iter().enumerate() {
        let name = quote_if_needed(&attribute.display_name(i));
        writeln!(out, ":AttributeName {} {}", i + 1, name)?;
        if let Some(kind) = &attribute.kind {
            writeln!(out, ":AttributeType {} {}", i + 1, kind)?;
        }
        if let Some(units) = &attribute.units {
            writeln!(out, ":AttributeUnits {} {}", i + 1, quote_if_needed(units))?;
        }
    }

    writeln!(out, "#")?;
    writeln!(out, ":xCount {}", grid.x_count)?;
    writeln!(out, ":yCount {}", grid.y_count)?;
    writeln!(out, ":xDelta {}", grid.x_delta)?;
    writeln!(out, ":yDelta {}", grid.y_delta)?;
    writeln!(out, "#")?;
    writeln!(out, "#")?;
    writeln!(out, ":EndHeader")?;
    Ok(())
}
