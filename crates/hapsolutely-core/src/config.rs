//! Application settings.
//!
//! [`Settings`] gathers the labels and conventions that the model and batch
//! layers agree on: what the synthetic rows display, which two allele tags
//! are recognized, how many identifiers a warning quotes before truncating.
//! Every key has a default, so a settings file only needs the keys it
//! overrides:
//!
//! ```toml
//! placeholder_label = "(none)"
//! allele_tags = ["1", "2"]
//! warning_preview = 5
//! ```
//!
//! # Persistence
//!
//! ```ignore
//! let settings = Settings::load("hapsolutely.toml")?;
//! std::fs::write("hapsolutely.toml", settings.to_toml_string()?)?;
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::logging::targets;

/// Labels and conventions shared by the model and batch layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Display text of the "nothing selected" row.
    pub placeholder_label: String,
    /// Display text of the previously computed result row.
    pub shared_result_label: String,
    /// Display prefix of generated-alternative rows, followed by the method
    /// description.
    pub alternative_label_prefix: String,
    /// Group assigned to individuals that match no partition entry.
    pub unknown_group: String,
    /// The two recognized allele tags, in allele order.
    pub allele_tags: [String; 2],
    /// Extras field holding the allele tag in tabular inputs.
    pub allele_field: String,
    /// Number of identifiers quoted in a warning before it is truncated.
    pub warning_preview: usize,
    /// Characters that are not reported as ambiguity codes.
    pub ambiguity_alphabet: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            placeholder_label: "---".to_string(),
            shared_result_label: "Previously phased sequences".to_string(),
            alternative_label_prefix: "Generate from input sequences using".to_string(),
            unknown_group: "unknown".to_string(),
            allele_tags: ["a".to_string(), "b".to_string()],
            allele_field: "allele".to_string(),
            warning_preview: 3,
            ambiguity_alphabet: "ACGT".to_string(),
        }
    }
}

impl Settings {
    /// Parses settings from a TOML string and validates them.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let settings = Self::from_toml_str(&text)?;
        tracing::debug!(target: targets::CONFIG, path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Serializes the settings as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks that the settings can be used.
    pub fn validate(&self) -> Result<()> {
        let [first, second] = &self.allele_tags;
        if first.is_empty() || second.is_empty() {
            return Err(Error::invalid_config("allele_tags", "tags must not be empty"));
        }
        if first == second {
            return Err(Error::invalid_config("allele_tags", "tags must be distinct"));
        }
        if self.allele_field.is_empty() {
            return Err(Error::invalid_config("allele_field", "field must not be empty"));
        }
        if self.warning_preview == 0 {
            return Err(Error::invalid_config("warning_preview", "must be at least 1"));
        }
        Ok(())
    }

    /// Returns the position of `tag` among the recognized allele tags.
    pub fn allele_slot(&self, tag: &str) -> Option<usize> {
        self.allele_tags.iter().position(|t| t == tag)
    }
}
