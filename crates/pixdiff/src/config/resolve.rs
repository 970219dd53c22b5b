use anyhow::{Context, Result, bail};

use super::{Config, DiffConfig, HistoryConfig, load, validate_unit};
use crate::diff::DiffOptions;
use crate::history::{BackendKind, Revision};

/// Values extracted from the CLI that participate in the merge.
#[derive(Clone, Debug, Default)]
pub struct CliOverrides {
    pub diff: DiffConfig,
    pub history: HistoryConfig,
}

/// Values read from `PIXDIFF_*` environment variables.
#[derive(Clone, Debug, Default)]
pub struct EnvLayer {
    pub threshold: Option<f64>,
    pub revision: Option<Revision>,
}

impl EnvLayer {
    pub fn from_env() -> Result<Self> {
        let threshold = std::env::var("PIXDIFF_THRESHOLD")
            .ok()
            .map(|v| v.parse::<f64>())
            .transpose()
            .context("PIXDIFF_THRESHOLD must be a valid float")?;
        let revision = std::env::var("PIXDIFF_REVISION")
            .ok()
            .map(|v| Revision::parse(&v))
            .transpose()
            .context("PIXDIFF_REVISION is not a valid revision")?;
        Ok(Self {
            threshold,
            revision,
        })
    }
}

/// Fully resolved config after CLI > env > file > defaults merge.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub diff: DiffOptions,
    pub revision: Revision,
    pub backend: BackendKind,
    pub max_blob_bytes: u64,
    pub parallel: usize,
}

impl ResolvedConfig {
    pub fn new(cli: CliOverrides) -> Result<Self> {
        let file = load()?.unwrap_or_default();
        let env = EnvLayer::from_env()?;
        Self::from_layers(file, env, cli)
    }

    pub fn from_layers(file: Config, env: EnvLayer, cli: CliOverrides) -> Result<Self> {
        // 1. File layer
        let mut diff = file.diff;
        let mut history = file.history;

        // 2. Env layer
        diff.merge(&DiffConfig {
            threshold: env.threshold,
            ..DiffConfig::default()
        });
        history.merge(&HistoryConfig {
            revision: env.revision,
            ..HistoryConfig::default()
        });

        // 3. CLI layer
        diff.merge(&cli.diff);
        history.merge(&cli.history);

        let diff = diff.to_options();
        validate_unit("threshold", diff.threshold).map_err(anyhow::Error::msg)?;
        validate_unit("alpha", diff.alpha).map_err(anyhow::Error::msg)?;
        if history.max_blob_bytes() == 0 {
            bail!("max_blob_bytes must be greater than 0");
        }

        Ok(Self {
            diff,
            revision: history.revision.clone().unwrap_or_default(),
            backend: history.backend.unwrap_or_default(),
            max_blob_bytes: history.max_blob_bytes(),
            parallel: history.parallel().max(1),
        })
    }
}
