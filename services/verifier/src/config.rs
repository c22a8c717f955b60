//! Verifier service configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use verif_common::parse_init_time;
use verif_session::VariableSpec;

/// Full configuration for one verification invocation: one observation
/// dataset, one case study, one experiment, any number of init times.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifierConfig {
    /// Observation dataset identifier, e.g. "IMERG_pcp".
    pub obs_dataset: String,
    pub case: CaseConfig,
    pub experiment: ExperimentConfig,
    pub variable: VariableSpec,
    pub paths: PathsConfig,
    /// Score lead times on the rayon thread pool.
    #[serde(default)]
    pub parallel: bool,
}

/// Case study window.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseConfig {
    pub name: String,
    /// Window start as YYYYMMDDHH.
    pub start: String,
    /// Window end as YYYYMMDDHH.
    pub end: String,
}

/// Experiment to verify.
#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentConfig {
    pub name: String,
    /// Init times mapped to their forecast horizons, both YYYYMMDDHH.
    pub inits: BTreeMap<String, String>,
}

/// Where fields come from and where records go.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Root of the regridded field files.
    pub data_dir: PathBuf,
    /// Root of the persisted score records.
    pub records_dir: PathBuf,
}

impl VerifierConfig {
    /// Load and validate a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: VerifierConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        parse_init_time(&self.case.start).context("case.start")?;
        parse_init_time(&self.case.end).context("case.end")?;
        if self.experiment.inits.is_empty() {
            bail!("experiment '{}' has no init times", self.experiment.name);
        }
        for (init, horizon) in &self.experiment.inits {
            parse_init_time(init).with_context(|| format!("init time '{}'", init))?;
            parse_init_time(horizon).with_context(|| format!("forecast horizon '{}'", horizon))?;
        }
        self.variable
            .validate()
            .with_context(|| format!("variable '{}'", self.variable.name))?;
        Ok(())
    }
}
