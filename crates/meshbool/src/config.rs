//! Tunable names and parameters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Names and defaults used by every command.
///
/// All fields are optional in TOML; missing keys take their default.
///
/// ```
/// use meshbool::BoolConfig;
///
/// let config = BoolConfig::from_toml_str("inset_factor = 0.8").unwrap();
/// assert_eq!(config.inset_factor, 0.8);
/// assert_eq!(config.cutter_name, "dc_bool_obj");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoolConfig {
    /// Canonical cutter name; sources are renamed to it on first use.
    pub cutter_name: String,
    /// Name given to inset duplicates.
    pub inset_name: String,
    /// Name of the shared boolean group.
    pub boolean_group: String,
    /// Name of the group holding helper empties.
    pub helpers_group: String,
    /// Solidify thickness added to cutters in cutline mode.
    pub cutline_thickness: f64,
    /// Per-component scale applied to a fresh inset.
    pub inset_factor: f64,
    /// Scale step per wheel tick while adjusting an inset.
    pub inset_step: f64,
    /// Initial radial array count.
    pub radial_count: u32,
    /// Vertex weld distance of radial arrays.
    pub radial_merge_threshold: f64,
}

impl Default for BoolConfig {
    fn default() -> Self {
        Self {
            cutter_name: "dc_bool_obj".to_string(),
            inset_name: "DC_bool_inset".to_string(),
            boolean_group: "DC_booleans".to_string(),
            helpers_group: "DC_helpers".to_string(),
            cutline_thickness: 0.02,
            inset_factor: 0.92,
            inset_step: 0.01,
            radial_count: 3,
            radial_merge_threshold: 0.001,
        }
    }
}

/// Largest radial array count.
pub const MAX_RADIAL_COUNT: u32 = 360;

impl BoolConfig {
    /// Parse and validate TOML.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check ranges and names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("cutter_name", &self.cutter_name),
            ("inset_name", &self.inset_name),
            ("boolean_group", &self.boolean_group),
            ("helpers_group", &self.helpers_group),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Invalid(format!("{key} must not be empty")));
            }
        }
        if self.inset_name.starts_with(&self.cutter_name) {
            return Err(ConfigError::Invalid(
                "inset_name must not start with cutter_name".into(),
            ));
        }
        if !(self.cutline_thickness > 0.0) {
            return Err(ConfigError::Invalid(
                "cutline_thickness must be positive".into(),
            ));
        }
        if !(self.inset_factor > 0.0 && self.inset_factor < 1.0) {
            return Err(ConfigError::Invalid(
                "inset_factor must be in (0, 1)".into(),
            ));
        }
        if !(self.inset_step > 0.0 && self.inset_step < 1.0) {
            return Err(ConfigError::Invalid("inset_step must be in (0, 1)".into()));
        }
        if self.radial_count == 0 || self.radial_count > MAX_RADIAL_COUNT {
            return Err(ConfigError::Invalid(format!(
                "radial_count must be in 1..={MAX_RADIAL_COUNT}"
            )));
        }
        if !(self.radial_merge_threshold >= 0.0) {
            return Err(ConfigError::Invalid(
                "radial_merge_threshold must not be negative".into(),
            ));
        }
        Ok(())
    }
}
