//! Persistence for verification score records.
//!
//! One JSON document per (score kind, verification key), laid out as
//! `<root>/<KIND>/<obs>/<case>/<exp>/<KIND>_<exp>_<obs>_<init>.json`.
//! Documents use ordered maps and a stable encoding so a re-run that adds
//! nothing produces byte-identical files, which is what makes incremental
//! re-verification cheap to reason about.

pub mod error;
pub mod record;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use record::{FssRecord, SalRecord, SalRow};
pub use store::RecordStore;
