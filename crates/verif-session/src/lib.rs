//! Verification session: per-lead-time orchestration of the scoring
//! engine with incremental persistence.
//!
//! A session owns one verification key (observation dataset, case,
//! experiment, init time) and one variable specification. For every lead
//! time it pulls an already-regridded field pair from a [`FieldProvider`],
//! applies the minimum-seeking sign convention where configured, invokes
//! the FSS and SAL scorers, and merges the results into persisted,
//! ordered score records. Lead times found in a previously persisted
//! record are never recomputed or rewritten.

pub mod error;
pub mod provider;
pub mod session;
pub mod variable;

pub use error::{SessionError, SessionResult};
pub use provider::{FieldPair, FieldProvider, MemoryProvider, ProviderError};
pub use session::{SessionOutcome, VerificationSession};
pub use variable::{PixelResolution, VariableSpec};
