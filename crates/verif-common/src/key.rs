//! Identity of one verification run.

use serde::{Deserialize, Serialize};

/// Key identifying a verification run: one observation dataset, one case
/// study, one experiment, one model init time.
///
/// Persisted records are addressed by this key so a later run can resume
/// without recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerifKey {
    /// Observation dataset identifier, e.g. "IMERG_pcp".
    pub obs_dataset: String,
    /// Case study name.
    pub case: String,
    /// Experiment name.
    pub experiment: String,
    /// Model init time as YYYYMMDDHH.
    pub init_time: String,
}

impl VerifKey {
    pub fn new(
        obs_dataset: impl Into<String>,
        case: impl Into<String>,
        experiment: impl Into<String>,
        init_time: impl Into<String>,
    ) -> Self {
        Self {
            obs_dataset: obs_dataset.into(),
            case: case.into(),
            experiment: experiment.into(),
            init_time: init_time.into(),
        }
    }

    /// File stem for persisted records, e.g.
    /// `FSS_expname_IMERG_pcp_2021090100`.
    pub fn file_stem(&self, kind: &str) -> String {
        format!(
            "{}_{}_{}_{}",
            kind, self.experiment, self.obs_dataset, self.init_time
        )
    }

    /// Relative directory for this run's records: `<obs>/<case>/<exp>`.
    pub fn relative_dir(&self) -> String {
        format!("{}/{}/{}", self.obs_dataset, self.case, self.experiment)
    }
}

impl std::fmt::Display for VerifKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.obs_dataset, self.case, self.experiment, self.init_time
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        let key = VerifKey::new("IMERG_pcp", "Storm1", "AIB_46h1", "2021090100");
        assert_eq!(key.file_stem("FSS"), "FSS_AIB_46h1_IMERG_pcp_2021090100");
        assert_eq!(key.relative_dir(), "IMERG_pcp/Storm1/AIB_46h1");
    }
}
