//! Persisted score record types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use verif_common::VerifKey;
use verif_engine::{DetectionParameters, FssTable, SalScore};

/// FSS verification for one run: one table per scored lead time plus the
/// NaN-ignoring mean across lead times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FssRecord {
    pub key: VerifKey,
    /// Tables keyed by zero-padded lead-time label. BTreeMap keeps the
    /// serialized order stable.
    pub tables: BTreeMap<String, FssTable>,
    /// Per-cell mean over all scored lead times.
    pub mean: Option<FssTable>,
}

impl FssRecord {
    pub fn new(key: VerifKey) -> Self {
        Self {
            key,
            tables: BTreeMap::new(),
            mean: None,
        }
    }

    /// Whether a lead time has already been scored.
    pub fn contains(&self, lead_label: &str) -> bool {
        self.tables.contains_key(lead_label)
    }

    /// Recompute the cross-lead-time mean from the stored tables.
    pub fn update_mean(&mut self) {
        let tables: Vec<FssTable> = self.tables.values().cloned().collect();
        self.mean = FssTable::nan_mean(&tables);
    }
}

/// One SAL row: the triple plus the location sub-terms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SalRow {
    #[serde(with = "verif_common::json::nan_f64")]
    pub structure: f64,
    #[serde(with = "verif_common::json::nan_f64")]
    pub amplitude: f64,
    #[serde(with = "verif_common::json::nan_f64")]
    pub location: f64,
    #[serde(with = "verif_common::json::nan_f64")]
    pub location_l1: f64,
    #[serde(with = "verif_common::json::nan_f64")]
    pub location_l2: f64,
}

impl From<SalScore> for SalRow {
    fn from(score: SalScore) -> Self {
        Self {
            structure: score.structure,
            amplitude: score.amplitude,
            location: score.location(),
            location_l1: score.location_l1,
            location_l2: score.location_l2,
        }
    }
}

/// SAL verification for one run: one row per scored lead time, together
/// with the detection parameters that produced them. The parameters are
/// part of the record because adaptive thresholds are field-dependent and
/// a resumed run must score new lead times with the same configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalRecord {
    pub key: VerifKey,
    pub params: DetectionParameters,
    pub rows: BTreeMap<String, SalRow>,
}

impl SalRecord {
    pub fn new(key: VerifKey, params: DetectionParameters) -> Self {
        Self {
            key,
            params,
            rows: BTreeMap::new(),
        }
    }

    /// Whether a lead time has already been scored.
    pub fn contains(&self, lead_label: &str) -> bool {
        self.rows.contains_key(lead_label)
    }
}
