//! The verification session: scoring loop, skip logic, persistence.

use rayon::prelude::*;
use tracing::{info, warn};
use verif_common::{format_lead_time, VerifKey};
use verif_engine::{fss_score, sal_score, FssTable};
use verif_store::{FssRecord, RecordStore, SalRecord, SalRow};

use crate::error::SessionResult;
use crate::provider::FieldProvider;
use crate::variable::VariableSpec;

/// Orchestrates FSS and SAL scoring for one verification key.
///
/// Scoring one lead time is a pure function over the provided pair, so
/// the session can fan lead times out across a thread pool; the merge
/// into the ordered records is the only sequential step.
#[derive(Debug)]
pub struct VerificationSession {
    key: VerifKey,
    variable: VariableSpec,
    store: RecordStore,
    parallel: bool,
}

/// What one `verify` call did.
#[derive(Debug)]
pub struct SessionOutcome {
    /// Lead-time labels scored by this call.
    pub scored: Vec<String>,
    /// Lead-time labels found in the persisted records and left alone.
    pub reused: Vec<String>,
    /// Lead-time labels that failed and were skipped.
    pub skipped: Vec<String>,
    /// The persisted FSS record after the run.
    pub fss: FssRecord,
    /// The persisted SAL record after the run.
    pub sal: SalRecord,
}

impl VerificationSession {
    /// Create a session. Validates the variable configuration up front.
    pub fn new(key: VerifKey, variable: VariableSpec, store: RecordStore) -> SessionResult<Self> {
        variable.validate()?;
        Ok(Self {
            key,
            variable,
            store,
            parallel: false,
        })
    }

    /// Score lead times on the rayon thread pool instead of in order.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn key(&self) -> &VerifKey {
        &self.key
    }

    /// Verify the given lead times, reusing persisted results.
    ///
    /// Lead times present in a previously saved record are not recomputed
    /// and not rewritten, even if the source fields have changed since.
    /// `replace` discards the persisted records first and rescores
    /// everything. Lead times whose fields cannot be loaded or scored are
    /// logged and skipped; the run continues.
    pub fn verify<P: FieldProvider>(
        &self,
        provider: &P,
        lead_times: &[u32],
        replace: bool,
    ) -> SessionResult<SessionOutcome> {
        if replace {
            self.store.remove(&self.key)?;
        }

        let mut fss_record = match self.store.load_fss(&self.key)? {
            Some(record) => record,
            None => FssRecord::new(self.key.clone()),
        };
        let mut sal_record = match self.store.load_sal(&self.key)? {
            Some(record) => record,
            None => SalRecord::new(self.key.clone(), self.variable.detection.clone()),
        };

        let wanted = self.variable.usable_lead_times(lead_times);
        let (pending, reused): (Vec<u32>, Vec<u32>) = wanted.into_iter().partition(|&lead| {
            let label = format_lead_time(lead);
            !(fss_record.contains(&label) && sal_record.contains(&label))
        });
        info!(
            key = %self.key,
            pending = pending.len(),
            reused = reused.len(),
            "verifying {}",
            self.variable.name
        );

        let results: Vec<(u32, SessionResult<(FssTable, SalRow)>)> = if self.parallel {
            pending
                .par_iter()
                .map(|&lead| (lead, self.score_lead_time(provider, lead)))
                .collect()
        } else {
            pending
                .iter()
                .map(|&lead| (lead, self.score_lead_time(provider, lead)))
                .collect()
        };

        // Single merge point: results keyed by lead time, inserted into
        // ordered maps.
        let mut scored = Vec::new();
        let mut skipped = Vec::new();
        for (lead, result) in results {
            let label = format_lead_time(lead);
            match result {
                Ok((fss_table, sal_row)) => {
                    fss_record.tables.insert(label.clone(), fss_table);
                    sal_record.rows.insert(label.clone(), sal_row);
                    scored.push(label);
                }
                Err(e) => {
                    warn!(key = %self.key, lead = %label, error = %e, "skipping lead time");
                    skipped.push(label);
                }
            }
        }

        fss_record.update_mean();
        self.store.save_fss(&fss_record)?;
        self.store.save_sal(&sal_record)?;

        Ok(SessionOutcome {
            scored,
            reused: reused.into_iter().map(format_lead_time).collect(),
            skipped,
            fss: fss_record,
            sal: sal_record,
        })
    }

    /// Score one lead time: fetch, sign-adjust, FSS, SAL.
    fn score_lead_time<P: FieldProvider>(
        &self,
        provider: &P,
        lead: u32,
    ) -> SessionResult<(FssTable, SalRow)> {
        let pair = provider.fetch(lead)?;
        let prediction = self.variable.prepare(&pair.prediction);
        let observation = self.variable.prepare(&pair.observation);

        let fss_table = fss_score(
            &prediction,
            &observation,
            &self.variable.thresholds,
            &self.variable.scales,
        )?
        .with_labels(
            self.variable.threshold_labels(),
            self.variable.scale_labels(),
        )?;

        let sal = sal_score(&prediction, &observation, &self.variable.detection)?;

        info!(
            key = %self.key,
            lead = %format_lead_time(lead),
            structure = sal.structure,
            amplitude = sal.amplitude,
            location = sal.location(),
            "scored lead time"
        );

        Ok((fss_table, SalRow::from(sal)))
    }
}
