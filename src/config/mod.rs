use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::data::parse::load_path;
use crate::data::reformat::TargetSchema;
use crate::CONFIG_PATH;

pub const DEFAULT_PREVIEW_ROWS: usize = 10;
pub const DEFAULT_MAX_CELL_WIDTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Explicit target layout for `format`.
    pub target_columns: Option<Vec<String>>,
    /// CSV file whose header row is the target layout.
    pub reference_file: Option<PathBuf>,
    pub case_sensitive: bool,
    pub preview_rows: usize,
    pub max_cell_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_columns: None,
            reference_file: None,
            case_sensitive: false,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            max_cell_width: DEFAULT_MAX_CELL_WIDTH,
        }
    }
}

pub fn parse_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config file {path:?}"))?;
    parse_str(&content)
}

pub fn parse_str(content: &str) -> Result<Config> {
    let config = serde_json::from_str(content)?;
    Ok(config)
}

impl Config {
    pub fn load() -> Self {
        let buf = CONFIG_PATH
            .lock()
            .map(|path| path.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone());

        if !buf.exists() {
            debug!("No config file at {buf:?}, using defaults");
            return Config::default();
        }

        match parse_file(&buf) {
            Ok(config) => {
                info!("Using config {buf:?}");
                config
            }
            Err(err) => {
                error!("Failed to parse config {buf:?}: {err:#}");
                warn!("Falling back to default config");
                Config::default()
            }
        }
    }

    /// Resolve the target layout. Command line choices beat the config file,
    /// which beats the built-in Bitwarden layout.
    pub fn target_schema(&self, columns: Option<&str>, reference: Option<&Path>) -> Result<TargetSchema> {
        if let Some(list) = columns {
            return Ok(TargetSchema::parse_list(list)?);
        }
        if let Some(path) = reference {
            return schema_from_reference(path);
        }
        if let Some(columns) = &self.target_columns {
            return Ok(TargetSchema::new(columns.iter().cloned())?);
        }
        if let Some(path) = &self.reference_file {
            return schema_from_reference(path);
        }
        Ok(TargetSchema::bitwarden())
    }
}

fn schema_from_reference(path: &Path) -> Result<TargetSchema> {
    let reference = load_path(path).with_context(|| format!("reading reference file {path:?}"))?;
    let schema = TargetSchema::from_reference(&reference)?;
    debug!("Target schema from {:?}: {}", path, schema);
    Ok(schema)
}
