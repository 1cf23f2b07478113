//! Compiler configuration
//!
//! Loaded from TOML; every field has a default, so an empty file is valid:
//!
//! ```toml
//! analyze_wildcard = true
//! fuzziness = "AUTO"
//! ```

use crate::error::CriteriaError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CompilerConfig {
    /// Analyze-wildcard flag set on CONTAINS / STARTS_WITH / ENDS_WITH clauses
    #[serde(default = "default_true")]
    pub analyze_wildcard: bool,

    /// Fuzziness attached to FUZZY clauses (engine default when unset)
    #[serde(default)]
    pub fuzziness: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            analyze_wildcard: default_true(),
            fuzziness: None,
        }
    }
}

impl CompilerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CompilerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from `path`, falling back to defaults if the file is missing
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if let Some(fuzziness) = &self.fuzziness {
            if fuzziness.trim().is_empty() {
                return Err(CriteriaError::Config(
                    "fuzziness must not be blank".to_string(),
                ));
            }
        }
        Ok(())
    }
}
