//! Drainage database assembly from shed and physics field sources.

use crate::error::{ConversionError, Result, SourceError};
use crate::field::ConversionField;
use crate::source::{FieldSource, Resampler};
use chrono::Duration;
use drainage::{check_drainage_quality, derive_drainage_meta, DrainageView};
use ensim_common::{Diagnostics, DrainageMeta, GridArray, GridHeader, WarningKind};
use r2c_parser::{AttributeSpec, R2cDataset};
use tracing::info;

/// Which parts of a drainage database to build.
pub enum DatabaseRequest<'a> {
    /// Routing attributes and land-cover classes.
    Full {
        shed: &'a dyn FieldSource,
        physics: &'a dyn FieldSource,
    },
    /// Routing attributes only.
    RoutingOnly { shed: &'a dyn FieldSource },
    /// Land-cover classes only; no drainage meta is derived.
    LandSurfaceOnly { physics: &'a dyn FieldSource },
}

impl<'a> DatabaseRequest<'a> {
    fn shed(&self) -> Option<&'a dyn FieldSource> {
        match *self {
            DatabaseRequest::Full { shed, .. } | DatabaseRequest::RoutingOnly { shed } => Some(shed),
            DatabaseRequest::LandSurfaceOnly { .. } => None,
        }
    }

    fn physics(&self) -> Option<&'a dyn FieldSource> {
        match *self {
            DatabaseRequest::Full { physics, .. } | DatabaseRequest::LandSurfaceOnly { physics } => {
                Some(physics)
            }
            DatabaseRequest::RoutingOnly { .. } => None,
        }
    }
}

/// Routing attributes read from the shed source, in output order.
/// `None` marks `IAK`, which is a constant river class of 1.
const ROUTING_FIELDS: [(&str, Option<&str>, bool, Option<&str>); 13] = [
    ("Rank", Some("RANK"), true, None),
    ("Next", Some("NEXT"), true, None),
    ("DA", Some("DA"), false, Some("km**2")),
    ("Bankfull", Some("BKFL"), false, Some("m**3")),
    ("ChnlSlope", Some("CSLP"), false, Some("m m**-1")),
    ("Elev", Some("ELEV"), false, Some("m")),
    ("ChnlLength", Some("CLEN"), false, Some("m")),
    ("IAK", None, true, None),
    ("Chnl", Some("CHNL"), true, None),
    ("Reach", Some("REAC"), true, None),
    ("GridArea", Some("GRDA"), false, Some("m**2")),
    ("VegLow", Some("VEGL"), false, Some("fraction")),
    ("VegHigh", Some("VEGH"), false, Some("fraction")),
];

/// Variable holding vegetation fractions, one level per class.
const VEGETATION_VARIABLE: &str = "VF";

/// Vegetation classes by level, in output order.
pub const VEGETATION_CLASSES: [(i32, &str); 26] = [
    (1199, "sea water"),
    (1198, "glaciers"),
    (1197, "inland lake water"),
    (1196, "evergreen needleleaf trees"),
    (1195, "evergreen broadleaf trees"),
    (1194, "deciduous needleleaf trees"),
    (1193, "deciduous broadleaf trees"),
    (1192, "tropical broadleaf trees"),
    (1191, "drought deciduous trees"),
    (1190, "evergreen broadleaf shrubs"),
    (1189, "deciduous shrubs"),
    (1188, "thorn shrubs"),
    (1187, "short grass and forbs"),
    (1186, "long grass"),
    (1185, "crops"),
    (1184, "rice"),
    (1183, "sugar"),
    (1182, "maize"),
    (1181, "cotton"),
    (1180, "irrigated crops"),
    (1179, "urban"),
    (1178, "tundra"),
    (1177, "swamp wetlands"),
    (1176, "desert"),
    (1175, "mixed wood forest trees"),
    (1174, "mixed shrubs"),
];

struct Builder<'a> {
    dataset: R2cDataset,
    target: &'a GridHeader,
    resampler: &'a dyn Resampler,
    diagnostics: &'a mut Diagnostics,
}

impl Builder<'_> {
    /// Fetch a static field; a missing optional field is skipped with a warning.
    fn fetch(&mut self, source: &dyn FieldSource, field: &ConversionField, required: bool) -> Result<Option<GridArray>> {
        match field.fetch(source, self.resampler, self.target, None, Duration::zero()) {
            Ok(array) => Ok(Some(array)),
            Err(ConversionError::Source(SourceError::FieldNotFound(key))) if !required => {
                self.diagnostics.push(
                    WarningKind::MissingSourceField,
                    format!("unable to fetch {}; attribute {} not added", key, field.attribute.name),
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn push(&mut self, spec: AttributeSpec, array: GridArray) -> Result<()> {
        self.dataset.push_attribute(spec, array)?;
        Ok(())
    }

    fn routing(&mut self, shed: &dyn FieldSource) -> Result<()> {
        for (name, variable, integer, units) in ROUTING_FIELDS {
            let mut spec = if integer {
                AttributeSpec::integer(name)
            } else {
                AttributeSpec::float(name)
            };
            if let Some(units) = units {
                spec = spec.with_units(units);
            }
            let Some(variable) = variable else {
                self.push(spec, self.target.filled(1.0))?;
                continue;
            };
            let required = name == "Rank" || name == "Next";
            let field = ConversionField::new(variable, spec.clone());
            if let Some(array) = self.fetch(shed, &field, required)? {
                let array = if integer { array.map(f64::round) } else { array };
                self.push(spec, array)?;
            }
        }
        Ok(())
    }

    fn coordinates(&mut self) -> Result<()> {
        if !self.target.projection.is_rotated() {
            return Ok(());
        }
        match self.resampler.coordinates(self.target) {
            Some(coordinates) => {
                self.push(AttributeSpec::float("Latitude").with_units("degrees"), coordinates.latitude)?;
                self.push(AttributeSpec::float("Longitude").with_units("degrees"), coordinates.longitude)?;
            }
            None => self.diagnostics.push(
                WarningKind::MissingSourceField,
                "resampler cannot supply coordinates of the rotated grid; Latitude and Longitude not added",
            ),
        }
        Ok(())
    }

    /// Append land-cover classes and return how many were added.
    fn land_cover(&mut self, physics: &dyn FieldSource) -> Result<usize> {
        let slope = ConversionField::new("SLOP", AttributeSpec::float("IntSlope").with_units("m m**-1"));
        if let Some(array) = self.fetch(physics, &slope, false)? {
            self.push(slope.attribute, array)?;
        }

        let mut classes = 0;
        for (level, description) in VEGETATION_CLASSES {
            let spec = AttributeSpec::float(format!("{} {}", level, description)).with_units("fraction");
            let field = ConversionField::new(VEGETATION_VARIABLE, spec).with_level(level);
            if let Some(array) = self.fetch(physics, &field, false)? {
                self.push(field.attribute, array)?;
                classes += 1;
            }
        }

        self.push(
            AttributeSpec::float("impervious").with_units("fraction"),
            self.target.filled(0.0),
        )?;
        Ok(classes + 1)
    }
}

/// Build a drainage database on `target` from the requested sources.
///
/// `Rank` and `Next` are required when routing attributes are requested;
/// any other missing field is skipped with a `MissingSourceField` warning.
/// With routing attributes present the drainage meta is derived from the
/// arrays and the quality checks run.
pub fn build_drainage_database(
    request: &DatabaseRequest<'_>,
    target: &GridHeader,
    resampler: &dyn Resampler,
    diagnostics: &mut Diagnostics,
) -> Result<R2cDataset> {
    let mut builder = Builder {
        dataset: R2cDataset::new(target.clone()),
        target,
        resampler,
        diagnostics: &mut *diagnostics,
    };

    if let Some(shed) = request.shed() {
        builder.routing(shed)?;
    }
    builder.coordinates()?;
    let class_count = match request.physics() {
        Some(physics) => builder.land_cover(physics)?,
        None => 0,
    };

    let mut dataset = builder.dataset;
    dataset.meta = Some(if request.shed().is_some() {
        let view = DrainageView::new(&dataset);
        check_drainage_quality(&view, diagnostics)?;
        derive_drainage_meta(&view, class_count)?
    } else {
        DrainageMeta {
            class_count,
            ..DrainageMeta::default()
        }
    });

    info!(
        attributes = dataset.attributes.len(),
        class_count,
        warnings = diagnostics.len(),
        "Built drainage database"
    );
    Ok(dataset)
}
