//! The seam between the session and the data pipeline.
//!
//! Acquisition, regridding and domain cropping happen upstream; the
//! session only ever sees finished pairs through [`FieldProvider`].

use std::collections::BTreeMap;

use thiserror::Error;
use verif_common::GridField;

/// A prediction/observation pair on the shared verification grid.
#[derive(Debug, Clone)]
pub struct FieldPair {
    pub prediction: GridField,
    pub observation: GridField,
}

/// Failure to supply a field pair for one lead time.
#[derive(Debug, Error)]
#[error("no fields for lead time +{lead:02}: {message}")]
pub struct ProviderError {
    pub lead: u32,
    pub message: String,
}

impl ProviderError {
    pub fn new(lead: u32, message: impl Into<String>) -> Self {
        Self {
            lead,
            message: message.into(),
        }
    }
}

/// Supplies regridded, cropped field pairs per lead time.
///
/// Implementations must be safe to call from worker threads; the session
/// fans lead times out in parallel.
pub trait FieldProvider: Send + Sync {
    fn fetch(&self, lead_time: u32) -> Result<FieldPair, ProviderError>;
}

/// In-memory provider over a fixed set of lead times.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    pairs: BTreeMap<u32, FieldPair>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, lead_time: u32, pair: FieldPair) {
        self.pairs.insert(lead_time, pair);
    }
}

impl FieldProvider for MemoryProvider {
    fn fetch(&self, lead_time: u32) -> Result<FieldPair, ProviderError> {
        self.pairs
            .get(&lead_time)
            .cloned()
            .ok_or_else(|| ProviderError::new(lead_time, "lead time not loaded"))
    }
}
