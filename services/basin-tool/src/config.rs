//! Configuration of a subbasin run.
//!
//! Loaded from an optional YAML file, then overridden field by field from
//! the command line. Supports `${VAR}` and `${VAR:-default}` substitution.

use anyhow::{Context, Result};
use ensim_common::EnsimError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubbasinConfig {
    /// Directory that relative paths are resolved against.
    pub workdir: PathBuf,
    pub drainage_database: PathBuf,
    pub lss_database: PathBuf,
    /// Streamflow table whose columns locate the gauges.
    pub streamflow: Option<PathBuf>,
    pub diagnostic_output: Option<PathBuf>,
}

impl Default for SubbasinConfig {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            drainage_database: PathBuf::from("MESH_drainage_database.r2c"),
            lss_database: PathBuf::from("MESH_lss_database.r2c"),
            streamflow: None,
            diagnostic_output: Some(PathBuf::from("shd_output.r2c")),
        }
    }
}

/// Command-line values that replace configured ones.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub workdir: Option<PathBuf>,
    pub drainage_database: Option<PathBuf>,
    pub lss_database: Option<PathBuf>,
    pub streamflow: Option<PathBuf>,
    pub diagnostic_output: Option<PathBuf>,
}

/// Input and output paths of a run, resolved and checked.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPaths {
    pub drainage_database: PathBuf,
    pub lss_database: PathBuf,
    pub streamflow: Option<PathBuf>,
    pub diagnostic_output: Option<PathBuf>,
}

impl SubbasinConfig {
    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(workdir) = overrides.workdir {
            self.workdir = workdir;
        }
        if let Some(path) = overrides.drainage_database {
            self.drainage_database = path;
        }
        if let Some(path) = overrides.lss_database {
            self.lss_database = path;
        }
        if overrides.streamflow.is_some() {
            self.streamflow = overrides.streamflow;
        }
        if overrides.diagnostic_output.is_some() {
            self.diagnostic_output = overrides.diagnostic_output;
        }
        self
    }

    /// Resolve paths against `workdir` and check the inputs exist.
    ///
    /// A diagnostic output that would overwrite an input is disabled.
    pub fn resolve(&self) -> Result<RunPaths> {
        let join = |p: &Path| self.workdir.join(p);
        let drainage_database = join(&self.drainage_database);
        let lss_database = join(&self.lss_database);
        let streamflow = self.streamflow.as_deref().map(join);

        for input in [Some(&drainage_database), Some(&lss_database), streamflow.as_ref()]
            .into_iter()
            .flatten()
        {
            if !input.is_file() {
                return Err(EnsimError::FileNotFound(input.clone()).into());
            }
        }

        let diagnostic_output = self.diagnostic_output.as_deref().map(join).and_then(|output| {
            if output == drainage_database || output == lss_database {
                warn!(
                    path = %output.display(),
                    "Diagnostic output would overwrite an input; it will not be written"
                );
                None
            } else {
                Some(output)
            }
        });

        Ok(RunPaths {
            drainage_database,
            lss_database,
            streamflow,
            diagnostic_output,
        })
    }
}

/// Load a run configuration with environment variable substitution.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SubbasinConfig> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config from {:?}", path.as_ref()))?;

    let expanded = expand_env_vars(&content)?;

    let config: SubbasinConfig = serde_yaml::from_str(&expanded)
        .with_context(|| format!("Failed to parse config YAML from {:?}", path.as_ref()))?;

    info!(path = %path.as_ref().display(), "Loaded configuration");
    Ok(config)
}

/// Expand `${VAR}` and `${VAR:-default}` in YAML content.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut rest = content;
    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .with_context(|| format!("Unclosed variable substitution: ${{{}", after))?;
        result.push_str(&resolve_var_expr(&after[..end])?);
        rest = &after[end + 1..];
    }
    result.push_str(rest);
    Ok(result)
}

/// Resolve `VAR` or `VAR:-default`.
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{temp_test_dir, write_fixture_in};

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("BASIN_TOOL_TEST_DIR", "/data/basin");
        let result = expand_env_vars("workdir: ${BASIN_TOOL_TEST_DIR}/run").unwrap();
        assert_eq!(result, "workdir: /data/basin/run");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("BASIN_TOOL_UNSET");
        let result = expand_env_vars("x: ${BASIN_TOOL_UNSET:-fallback}").unwrap();
        assert_eq!(result, "x: fallback");
        assert!(expand_env_vars("${BASIN_TOOL_UNSET}").is_err());
        assert!(expand_env_vars("${BASIN_TOOL_UNSET").is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let dir = temp_test_dir();
        let path = write_fixture_in(&dir, "run.yaml", "streamflow: gauges.tb0\n");
        let config = load_config(&path).unwrap();
        assert_eq!(config.streamflow, Some(PathBuf::from("gauges.tb0")));
        assert_eq!(config.drainage_database, PathBuf::from("MESH_drainage_database.r2c"));
        assert_eq!(config.diagnostic_output, Some(PathBuf::from("shd_output.r2c")));
    }

    #[test]
    fn test_overrides_win() {
        let config = SubbasinConfig::default().apply(Overrides {
            lss_database: Some(PathBuf::from("other.r2c")),
            ..Overrides::default()
        });
        assert_eq!(config.lss_database, PathBuf::from("other.r2c"));
        assert_eq!(config.drainage_database, PathBuf::from("MESH_drainage_database.r2c"));
    }

    #[test]
    fn test_resolve_checks_inputs() {
        let dir = temp_test_dir();
        write_fixture_in(&dir, "MESH_drainage_database.r2c", "");
        let config = SubbasinConfig {
            workdir: dir.path().to_path_buf(),
            ..SubbasinConfig::default()
        };
        let err = config.resolve().unwrap_err();
        let err = err.downcast_ref::<EnsimError>().unwrap();
        assert!(matches!(err, EnsimError::FileNotFound(p) if p.ends_with("MESH_lss_database.r2c")));
    }

    #[test]
    fn test_diagnostic_output_cannot_overwrite_input() {
        let dir = temp_test_dir();
        write_fixture_in(&dir, "MESH_drainage_database.r2c", "");
        write_fixture_in(&dir, "MESH_lss_database.r2c", "");
        let config = SubbasinConfig {
            workdir: dir.path().to_path_buf(),
            diagnostic_output: Some(PathBuf::from("MESH_lss_database.r2c")),
            ..SubbasinConfig::default()
        };
        let paths = config.resolve().unwrap();
        assert_eq!(paths.diagnostic_output, None);
        assert_eq!(paths.lss_database, dir.path().join("MESH_lss_database.r2c"));
    }
}
