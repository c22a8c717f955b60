//! Field provider reading regridded field files from a directory tree.
//!
//! The upstream regridding pipeline leaves one JSON-encoded [`GridField`]
//! per file:
//!
//! ```text
//! <data_dir>/OBSERVATIONS/<obs_dataset>/<case>/obs_<valid>.json
//! <data_dir>/SIMULATIONS/<experiment>/<init>/pred_<init>+<LL>.json
//! ```
//!
//! where `<valid>` and `<init>` are YYYYMMDDHH and `<LL>` is the
//! zero-padded lead hour.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use tracing::debug;
use verif_common::{format_init_time, format_lead_time, GridField};
use verif_session::{FieldPair, FieldProvider, ProviderError};
use walkdir::WalkDir;

/// Serves field pairs for one (experiment, init time) from disk.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    obs_dir: PathBuf,
    sim_dir: PathBuf,
    init: NaiveDateTime,
    init_label: String,
}

impl DirectoryProvider {
    pub fn new(
        data_dir: &Path,
        obs_dataset: &str,
        case: &str,
        experiment: &str,
        init: NaiveDateTime,
    ) -> Self {
        let init_label = format_init_time(init);
        Self {
            obs_dir: data_dir.join("OBSERVATIONS").join(obs_dataset).join(case),
            sim_dir: data_dir.join("SIMULATIONS").join(experiment).join(&init_label),
            init,
            init_label,
        }
    }

    /// Lead times with a prediction file on disk, ascending.
    pub fn available_lead_times(&self) -> Vec<u32> {
        let prefix = format!("pred_{}+", self.init_label);
        let mut leads: Vec<u32> = WalkDir::new(&self.sim_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                let lead = name.strip_prefix(&prefix)?.strip_suffix(".json")?;
                lead.parse().ok()
            })
            .collect();
        leads.sort_unstable();
        leads
    }

    fn read_field(&self, path: &Path, lead: u32) -> Result<GridField, ProviderError> {
        let bytes = fs::read(path).map_err(|e| {
            ProviderError::new(lead, format!("{}: {}", path.display(), e))
        })?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ProviderError::new(lead, format!("{}: {}", path.display(), e)))
    }
}

impl FieldProvider for DirectoryProvider {
    fn fetch(&self, lead_time: u32) -> Result<FieldPair, ProviderError> {
        let valid = self.init + Duration::hours(lead_time as i64);
        let obs_path = self
            .obs_dir
            .join(format!("obs_{}.json", format_init_time(valid)));
        let pred_path = self.sim_dir.join(format!(
            "pred_{}+{}.json",
            self.init_label,
            format_lead_time(lead_time)
        ));

        debug!(
            obs = %obs_path.display(),
            pred = %pred_path.display(),
            "loading field pair"
        );
        let observation = self.read_field(&obs_path, lead_time)?;
        let prediction = self.read_field(&pred_path, lead_time)?;
        Ok(FieldPair {
            prediction,
            observation,
        })
    }
}
