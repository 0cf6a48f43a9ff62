use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV_VAR: &str = "RUSTY_BOARD_CONFIG";

// ---------------------------------------------------------------------------
// Viewer configuration
// ---------------------------------------------------------------------------

/// Tunables for inference, filtering and charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Categorical columns with more distinct values than this get no filter.
    pub max_category_choices: usize,
    /// Case-insensitive name fragments that mark a column as date-like.
    pub date_tokens: Vec<String>,
    /// Upper bound on histogram bins.
    pub max_histogram_bins: usize,
    /// Rows shown in the raw table view.
    pub table_preview_rows: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_category_choices: 50,
            date_tokens: vec!["date".to_string(), "日".to_string()],
            max_histogram_bins: 50,
            table_preview_rows: 1000,
        }
    }
}

impl ViewerConfig {
    /// Read the file named by [`CONFIG_ENV_VAR`], falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV_VAR) else {
            return Self::default();
        };
        match Self::from_path(Path::new(&path)) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", Path::new(&path).display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring configuration: {e:#}");
                Self::default()
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).context("parsing configuration JSON")
    }
}
