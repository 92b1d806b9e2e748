//! Explicit configuration values threaded into ingestion and threshold
//! checks. Nothing in the library reads process-wide state.

use serde::{Deserialize, Serialize};

use crate::error::{CoverageError, Result};
use crate::threshold::Thresholds;

/// Options applied while turning a report into `ProjectStats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Prefix stripped from report paths, typically the CI checkout directory.
    pub workspace_prefix: Option<String>,
}

impl IngestOptions {
    pub fn with_workspace(prefix: impl Into<String>) -> Self {
        Self {
            workspace_prefix: Some(prefix.into()),
        }
    }
}

/// Settings file accepted by the `--config` flag.
///
/// ```json
/// {
///   "workspace_prefix": "/home/runner/work/app/app",
///   "thresholds": { "min_line_coverage": 80, "max_line_coverage_decrease": 2.5 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub workspace_prefix: Option<String>,
    pub thresholds: Thresholds,
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| CoverageError::Configuration(format!("invalid config file: {e}")))
    }

    #[must_use]
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            workspace_prefix: self.workspace_prefix.clone(),
        }
    }
}
