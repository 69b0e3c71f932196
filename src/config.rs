use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{ImportError, Result};

/// Settings for one catalog import. `Default` is the Biotium run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Manufacturer string the catalog belongs to
    pub vendor: String,
    pub dye_list: PathBuf,
    pub data: PathBuf,
    pub database: PathBuf,
    pub wavelength_column: String,
    /// Current vendor name -> previously stored name
    pub renames: BTreeMap<String, String>,
    pub skip: BTreeSet<String>,
    /// Persist the disown sweep instead of only reporting it
    pub apply_disown: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        let data_dir = Path::new(constants::DATA_DIR);
        Self {
            vendor: constants::BIOTIUM.to_string(),
            dye_list: data_dir.join(constants::BIOTIUM_DYE_LIST),
            data: data_dir.join(constants::BIOTIUM_DATA),
            database: PathBuf::from(constants::DEFAULT_DATABASE),
            wavelength_column: constants::WAVELENGTH_COLUMN.to_string(),
            renames: constants::NAME_CHANGES
                .iter()
                .map(|(new, old)| (new.to_string(), old.to_string()))
                .collect(),
            skip: constants::SKIP_NAMES.iter().map(|s| s.to_string()).collect(),
            apply_disown: false,
        }
    }
}

impl ImportConfig {
    /// Reads a TOML file; fields it leaves out keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ImportError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: ImportConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.vendor.trim().is_empty() {
            return Err(ImportError::Config("vendor must not be empty".to_string()));
        }
        if self.wavelength_column.trim().is_empty() {
            return Err(ImportError::Config(
                "wavelength_column must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Names the disown sweep leaves alone: the old names of renamed dyes
    pub fn rename_sources(&self) -> BTreeSet<&str> {
        self.renames.values().map(String::as_str).collect()
    }
}
