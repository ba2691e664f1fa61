//! Repository configuration in `.relflow.toml`.

use crate::bulk::DEFAULT_CONCURRENCY;
use crate::error::{Error, Result};
use crate::tracker::WorkflowLabels;
use crate::types::{Platform, PlatformConfig};
use crate::workflow::Settings;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Filename of the repository configuration.
pub const CONFIG_FILE: &str = ".relflow.toml";

/// Parsed repository configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Branch, tag and file naming
    #[serde(flatten)]
    pub settings: Settings,
    /// Maximum concurrent tracker calls in bulk updates
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Issue tracker location
    pub tracker: PlatformConfig,
    /// Code review location (defaults to the tracker's)
    #[serde(default)]
    pub review: Option<PlatformConfig>,
    /// Overrides for the tracker's label vocabulary
    #[serde(default)]
    labels: LabelOverrides,
}

const fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LabelOverrides {
    approved: Option<String>,
    being_implemented: Option<String>,
    implemented: Option<String>,
    reviewed: Option<String>,
    tested: Option<String>,
    staged: Option<String>,
    accepted: Option<String>,
    rejected: Option<String>,
    invalid: Option<String>,
    release_prefix: Option<String>,
    skip_check: Option<Vec<String>>,
}

impl Config {
    /// Label vocabulary: the tracker's defaults with configured overrides
    pub fn labels(&self) -> WorkflowLabels {
        let mut labels = match self.tracker.platform {
            Platform::GitHub => WorkflowLabels::plain(),
            Platform::GitLab => WorkflowLabels::scoped(),
        };
        let o = self.labels.clone();
        let fields = [
            (&mut labels.approved, o.approved),
            (&mut labels.being_implemented, o.being_implemented),
            (&mut labels.implemented, o.implemented),
            (&mut labels.reviewed, o.reviewed),
            (&mut labels.tested, o.tested),
            (&mut labels.staged, o.staged),
            (&mut labels.accepted, o.accepted),
            (&mut labels.rejected, o.rejected),
            (&mut labels.invalid, o.invalid),
            (&mut labels.release_prefix, o.release_prefix),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(skip) = o.skip_check {
            labels.skip_check = skip;
        }
        labels
    }

    /// Where review requests are posted
    pub fn review_platform(&self) -> &PlatformConfig {
        self.review.as_ref().unwrap_or(&self.tracker)
    }
}

/// Get path to the configuration file.
pub fn config_path(repo_root: &Path) -> PathBuf {
    repo_root.join(CONFIG_FILE)
}

/// Load configuration from disk.
pub fn load_config(repo_root: &Path) -> Result<Config> {
    let path = config_path(repo_root);

    if !path.exists() {
        return Err(Error::Config(format!(
            "{} not found; create it with at least a [tracker] section",
            path.display()
        )));
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    parse_config(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}

fn parse_config(content: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(content)
}
