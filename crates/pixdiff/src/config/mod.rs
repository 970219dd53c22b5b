pub mod resolve;
pub mod template;

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::diff::{DiffOptions, Rgb};
use crate::history::{BackendKind, DEFAULT_MAX_BLOB_BYTES, Revision};

pub use self::resolve::{CliOverrides, EnvLayer, ResolvedConfig};
pub use self::template::{config_file_exists, write_gitignore, write_template};

pub const CONFIG_DIR: &str = ".pixdiff";
const CONFIG_FILE: &str = "config.toml";

/// Default directory for written artifacts, relative to the working dir.
pub const DEFAULT_OUTPUT_DIR: &str = ".pixdiff/out";

/// Check that a fraction lies in `[0, 1]`.
pub fn validate_unit(name: &str, v: f64) -> Result<f64, String> {
    if !(0.0..=1.0).contains(&v) {
        return Err(format!("{name} must be between 0.0 and 1.0, got {v}"));
    }
    Ok(v)
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    validate_unit("threshold", v)
}

fn parse_alpha(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    validate_unit("alpha", v)
}

/// Pixel comparison settings.
///
/// Fields are `Option`; `None` means "use default".
/// Serves both TOML deserialization (`[diff]`) and CLI argument parsing.
#[derive(Clone, Debug, Default, PartialEq, clap::Args, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Colour tolerance (0.0 = exact match, 1.0 = maximal tolerance)
    #[arg(long, value_parser = parse_threshold)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Count anti-aliased pixels as differences
    #[arg(long = "include-aa", num_args = 0..=1, default_missing_value = "true")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_anti_aliasing: Option<bool>,

    /// Opacity of unchanged pixels in the diff image (0.0-1.0)
    #[arg(long, value_parser = parse_alpha)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,

    /// Highlight colour for differing pixels (`r,g,b` or `#rrggbb`)
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_color: Option<Rgb>,

    /// Marker colour for anti-aliased pixels (`r,g,b` or `#rrggbb`)
    #[arg(long = "aa-color")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anti_alias_color: Option<Rgb>,
}

impl DiffConfig {
    /// Overlay non-None fields from `other` onto self.
    pub fn merge(&mut self, other: &DiffConfig) {
        if other.threshold.is_some() {
            self.threshold = other.threshold;
        }
        if other.include_anti_aliasing.is_some() {
            self.include_anti_aliasing = other.include_anti_aliasing;
        }
        if other.alpha.is_some() {
            self.alpha = other.alpha;
        }
        if other.diff_color.is_some() {
            self.diff_color = other.diff_color;
        }
        if other.anti_alias_color.is_some() {
            self.anti_alias_color = other.anti_alias_color;
        }
    }

    pub fn to_options(&self) -> DiffOptions {
        let defaults = DiffOptions::default();
        DiffOptions {
            threshold: self.threshold.unwrap_or(defaults.threshold),
            include_anti_aliasing: self
                .include_anti_aliasing
                .unwrap_or(defaults.include_anti_aliasing),
            alpha: self.alpha.unwrap_or(defaults.alpha),
            diff_color: self.diff_color.unwrap_or(defaults.diff_color),
            anti_alias_color: self.anti_alias_color.or(defaults.anti_alias_color),
        }
    }
}

/// Previous-version retrieval settings.
#[derive(Clone, Debug, Default, PartialEq, clap::Args, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Revision to compare against (default HEAD~1)
    #[arg(long = "rev")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<Revision>,

    /// How historical blobs are read
    #[arg(long, value_enum)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,

    /// Refuse historical blobs larger than this many bytes
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_blob_bytes: Option<u64>,

    /// Number of files compared concurrently in batch mode
    #[arg(long, short = 'p')]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<usize>,
}

impl HistoryConfig {
    /// Overlay non-None fields from `other` onto self.
    pub fn merge(&mut self, other: &HistoryConfig) {
        if other.revision.is_some() {
            self.revision = other.revision.clone();
        }
        if other.backend.is_some() {
            self.backend = other.backend;
        }
        if other.max_blob_bytes.is_some() {
            self.max_blob_bytes = other.max_blob_bytes;
        }
        if other.parallel.is_some() {
            self.parallel = other.parallel;
        }
    }

    pub fn max_blob_bytes(&self) -> u64 {
        self.max_blob_bytes.unwrap_or(DEFAULT_MAX_BLOB_BYTES)
    }

    pub fn parallel(&self) -> usize {
        self.parallel.unwrap_or(4)
    }
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

impl Config {
    /// Validate semantic constraints that serde cannot express.
    fn validate(&self) -> Result<()> {
        if let Some(t) = self.diff.threshold {
            validate_unit("diff.threshold", t).map_err(anyhow::Error::msg)?;
        }
        if let Some(a) = self.diff.alpha {
            validate_unit("diff.alpha", a).map_err(anyhow::Error::msg)?;
        }
        if self.history.parallel == Some(0) {
            bail!("history.parallel must be at least 1");
        }
        if self.history.max_blob_bytes == Some(0) {
            bail!("history.max_blob_bytes must be greater than 0");
        }
        Ok(())
    }
}

/// Parse and validate a config file's contents.
pub fn parse(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load `.pixdiff/config.toml` from the working directory, if present.
pub fn load() -> Result<Option<Config>> {
    load_from(&Path::new(CONFIG_DIR).join(CONFIG_FILE))
}

pub fn load_from(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = parse(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(config))
}
