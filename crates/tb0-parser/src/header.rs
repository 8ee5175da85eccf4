//! Table header: timing metadata, projection and column metadata.

use chrono::{NaiveDateTime, Utc};
use ensim_common::lines::{quote_if_needed, tokenize};
use ensim_common::{
    format_timestamp, parse_timestamp, Diagnostics, EnsimError, EnsimResult, LineReader, TimeStep,
    WarningKind,
};
use std::io::{BufRead, Cursor, Write};
use tracing::debug;

/// Timing metadata of a table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tb0Meta {
    pub start_time: Option<NaiveDateTime>,
    pub delta_t: Option<TimeStep>,
    pub routing_delta_t: Option<TimeStep>,
    pub fill_flag: Option<String>,
}

impl Tb0Meta {
    fn is_empty(&self) -> bool {
        self.start_time.is_none()
            && self.delta_t.is_none()
            && self.routing_delta_t.is_none()
            && self.fill_flag.is_none()
    }
}

/// Metadata of one column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableColumn {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub units: Option<String>,
    pub location_x: Option<f64>,
    pub location_y: Option<f64>,
}

impl TableColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.location_x = Some(x);
        self.location_y = Some(y);
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Name to report for the column at 0-based `position`.
    pub fn display_name(&self, position: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| (position + 1).to_string())
    }

    /// Location as `(x, y)` when both coordinates are declared.
    pub fn location(&self) -> Option<(f64, f64)> {
        Some((self.location_x?, self.location_y?))
    }
}

/// Everything declared before `:EndHeader`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tb0Header {
    pub meta: Option<Tb0Meta>,
    pub ellipsoid: String,
    pub columns: Vec<TableColumn>,
}

impl Tb0Header {
    pub fn new(columns: Vec<TableColumn>) -> Self {
        Self {
            meta: None,
            ellipsoid: "SPHERE".to_string(),
            columns,
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Position of the named column, ignoring case.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name)))
    }
}

/// A header directive with its line number and tokens.
#[derive(Debug, Clone)]
pub struct HeaderLine {
    pub number: usize,
    pub tokens: Vec<String>,
}

impl HeaderLine {
    fn key(&self) -> String {
        self.tokens[0].to_ascii_lowercase()
    }

    fn values(&self) -> &[String] {
        &self.tokens[1..]
    }
}

const COLUMN_KEYS: [&str; 5] = [
    ":columnname",
    ":columntype",
    ":columnunits",
    ":columnlocationx",
    ":columnlocationy",
];

/// Collect directive lines up to and including `:EndHeader`.
pub fn read_header_lines<R: BufRead>(lines: &mut LineReader<R>) -> EnsimResult<Vec<HeaderLine>> {
    let mut collected = Vec::new();
    loop {
        let Some(raw) = lines.next_line()? else {
            return Err(EnsimError::MissingEndHeader {
                line: lines.line_number(),
            });
        };
        let number = lines.line_number();
        if !raw.trim_start().starts_with(':') {
            continue;
        }
        let key = raw
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let tokens = if key.starts_with(":column") {
            tokenize(&raw, number)?
        } else {
            raw.split_whitespace().map(str::to_string).collect()
        };
        let done = key == ":endheader";
        collected.push(HeaderLine { number, tokens });
        if done {
            return Ok(collected);
        }
    }
}

/// Number of columns declared by the column metadata lines.
///
/// When the lines disagree the smallest count wins and a single
/// `InconsistentColumnCount` warning is recorded.
pub fn scan_column_count(header: &[HeaderLine], diagnostics: &mut Diagnostics) -> EnsimResult<usize> {
    let counts: Vec<(String, usize)> = header
        .iter()
        .filter(|line| COLUMN_KEYS.contains(&line.key().as_str()))
        .map(|line| (line.tokens[0].clone(), line.values().len()))
        .collect();

    let max = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
    let min = counts.iter().map(|(_, n)| *n).min().unwrap_or(0);
    if min != max {
        let detail: Vec<String> = counts
            .iter()
            .map(|(key, n)| format!("{} has {}", key, n))
            .collect();
        diagnostics.push(
            WarningKind::InconsistentColumnCount,
            format!(
                "column metadata lines disagree ({}); using {} columns",
                detail.join(", "),
                min
            ),
        );
    }
    if min == 0 {
        let line = header.last().map(|l| l.number).unwrap_or(0);
        return Err(EnsimError::format(line, "no columns declared in ':ColumnMetaData'"));
    }
    Ok(min)
}

fn parse_location(value: &str, line: usize) -> EnsimResult<f64> {
    value
        .parse()
        .map_err(|_| EnsimError::format(line, format!("invalid column location '{}'", value)))
}

/// Assign column metadata positionally: value token `i` describes column `i`.
pub fn parse_columns(header: &[HeaderLine], n: usize) -> EnsimResult<Vec<TableColumn>> {
    let mut columns = vec![TableColumn::default(); n];
    for line in header {
        let key = line.key();
        if !COLUMN_KEYS.contains(&key.as_str()) {
            continue;
        }
        for (column, value) in columns.iter_mut().zip(line.values()) {
            match key.as_str() {
                ":columnname" => column.name = Some(value.clone()),
                ":columntype" => column.kind = Some(value.clone()),
                ":columnunits" => column.units = Some(value.clone()),
                ":columnlocationx" => column.location_x = Some(parse_location(value, line.number)?),
                _ => column.location_y = Some(parse_location(value, line.number)?),
            }
        }
    }
    Ok(columns)
}

fn parse_step(line: &HeaderLine) -> EnsimResult<TimeStep> {
    let raw = line.values().join(" ");
    TimeStep::parse(&raw).ok_or_else(|| {
        EnsimError::format(
            line.number,
            format!("invalid time step '{}' for '{}'", raw, line.tokens[0]),
        )
    })
}

/// Parse a table header from collected directive lines.
pub fn parse_header_lines(header: &[HeaderLine], diagnostics: &mut Diagnostics) -> EnsimResult<Tb0Header> {
    let mut meta = Tb0Meta::default();
    let mut projection: Option<(String, usize)> = None;
    let mut ellipsoid = "UNKNOWN".to_string();

    for line in header {
        let first = || line.values().first().cloned().unwrap_or_default();
        match line.key().as_str() {
            ":starttime" => {
                let raw = line.values().join(" ");
                let time = parse_timestamp(&raw).ok_or_else(|| {
                    EnsimError::format(line.number, format!("invalid start time '{}'", raw))
                })?;
                meta.start_time = Some(time);
            }
            ":deltat" => meta.delta_t = Some(parse_step(line)?),
            ":routingdeltat" => meta.routing_delta_t = Some(parse_step(line)?),
            ":fillflag" => meta.fill_flag = Some(first()),
            ":projection" => projection = Some((first().to_ascii_uppercase(), line.number)),
            ":ellipsoid" => ellipsoid = first().to_ascii_uppercase(),
            _ => {}
        }
    }

    match projection {
        Some((name, _)) if name == "LATLONG" => {}
        Some((name, number)) => {
            return Err(EnsimError::format(
                number,
                format!("unsupported table projection '{}', expected LATLONG", name),
            ))
        }
        None => return Err(EnsimError::MissingHeaderKey("Projection")),
    }

    let n = scan_column_count(header, diagnostics)?;
    let columns = parse_columns(header, n)?;
    debug!(columns = n, "Parsed tb0 header");

    Ok(Tb0Header {
        meta: (!meta.is_empty()).then_some(meta),
        ellipsoid,
        columns,
    })
}

/// Read and parse a table header from a stream.
pub fn parse_header<R: BufRead>(
    lines: &mut LineReader<R>,
    diagnostics: &mut Diagnostics,
) -> EnsimResult<Tb0Header> {
    let header = read_header_lines(lines)?;
    parse_header_lines(&header, diagnostics)
}

/// Parse a header held in memory.
pub fn parse_header_str(text: &str, diagnostics: &mut Diagnostics) -> EnsimResult<Tb0Header> {
    parse_header(&mut LineReader::new(Cursor::new(text)), diagnostics)
}

/// Provenance written into new tables.
#[derive(Debug, Clone)]
pub struct WriterInfo {
    pub application: String,
    pub version: String,
    pub written_by: String,
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

fn location_token(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "0".to_string())
}

/// Write a complete table header, ending with `:EndHeader`.
pub fn write_header<W: Write>(out: &mut W, header: &Tb0Header, info: &WriterInfo) -> EnsimResult<()> {
    let created = info
        .creation_date
        .unwrap_or_else(|| Utc::now().naive_utc());

    writeln!(out, "########################################")?;
    writeln!(out, ":FileType tb0 ASCII EnSim 1.0")?;
    writeln!(out, "#")?;
    writeln!(out, "# DataType EnSim Table")?;
    writeln!(out, "#")?;
    writeln!(out, ":Application {}", info.application)?;
    writeln!(out, ":Version {}", info.version)?;
    writeln!(out, ":WrittenBy {}", info.written_by)?;
    writeln!(out, ":CreationDate {}", format_timestamp(&created))?;
    writeln!(out, "#")?;
    writeln!(out, "#---------------------------------------")?;
    writeln!(out, "#")?;

    if let Some(meta) = &header.meta {
        writeln!(out, "#")?;
        if let Some(start) = &meta.start_time {
            writeln!(out, ":StartTime {}", format_timestamp(start))?;
        }
        if let Some(step) = &meta.delta_t {
            writeln!(out, ":DeltaT {}", step)?;
        }
        if let Some(step) = &meta.routing_delta_t {
            writeln!(out, ":RoutingDeltaT {}", step)?;
        }
        if let Some(flag) = &meta.fill_flag {
            writeln!(out, "#")?;
            writeln!(out, ":FillFlag {}", flag)?;
        }
    }
    writeln!(out, "#")?;
    writeln!(out, ":Projection LATLONG")?;
    writeln!(out, ":Ellipsoid {}", header.ellipsoid)?;
    writeln!(out, "#")?;

    let columns = &header.columns;
    let names: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| quote_if_needed(&c.display_name(i)))
        .collect();
    let kinds: Vec<String> = columns
        .iter()
        .map(|c| quote_if_needed(c.kind.as_deref().unwrap_or("float")))
        .collect();
    let units: Vec<String> = columns
        .iter()
        .map(|c| quote_if_needed(c.units.as_deref().unwrap_or("none")))
        .collect();
    let xs: Vec<String> = columns.iter().map(|c| location_token(c.location_x)).collect();
    let ys: Vec<String> = columns.iter().map(|c| location_token(c.location_y)).collect();

    writeln!(out, ":ColumnMetaData")?;
    writeln!(out, ":ColumnName {}", names.join(" "))?;
    writeln!(out, ":ColumnType {}", kinds.join(" "))?;
    writeln!(out, ":ColumnUnits {}", units.join(" "))?;
    writeln!(out, ":ColumnLocationX {}", xs.join(" "))?;
    writeln!(out, ":ColumnLocationY {}", ys.join(" "))?;
    writeln!(out, ":EndColumnMetaData")?;
    writeln!(out, "#")?;
    writeln!(out, ":EndHeader")?;
    Ok(())
}
