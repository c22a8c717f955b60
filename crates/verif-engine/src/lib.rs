//! Spatial verification scores for gridded forecast fields.
//!
//! This crate turns two same-shaped 2D scalar fields (prediction,
//! observation) into quantitative skill scores:
//!
//! - **FSS**: the Fractions Skill Score over a grid of intensity
//!   thresholds and neighborhood scales ([`fss_score`])
//! - **SAL**: the Structure-Amplitude-Location decomposition
//!   ([`sal_score`]), built on adaptive-threshold feature detection
//!   ([`detect`])
//!
//! All scoring functions are pure over immutable inputs: no shared
//! mutable state, no I/O, no locking. Scoring one lead time is
//! independent of all others, so callers are free to fan the work out
//! across threads and merge by lead-time key.
//!
//! # Example
//!
//! ```
//! use verif_common::GridField;
//! use verif_engine::{fss_score, sal_score, DetectionParameters};
//!
//! let pred = GridField::from_fn(16, 16, |r, c| if r > 8 && c > 8 { 4.0 } else { 0.0 });
//! let obs = GridField::from_fn(16, 16, |r, c| if r > 7 && c > 7 { 5.0 } else { 0.0 });
//!
//! let fss = fss_score(&pred, &obs, &[1.0, 2.0], &[1, 3, 5]).unwrap();
//! assert!(fss.value(0, 0) > 0.0);
//!
//! let params = DetectionParameters {
//!     minsize: 4,
//!     ..DetectionParameters::adaptive(0.067, 0.95)
//! };
//! let sal = sal_score(&pred, &obs, &params).unwrap();
//! assert!(sal.amplitude < 0.0);
//! ```

pub mod detect;
pub mod error;
pub mod fss;
pub mod params;
pub mod sal;

// Re-export commonly used types at crate root
pub use detect::{detect, DetectedObject, Detection};
pub use error::{EngineError, Result};
pub use fss::{fss_score, FssTable};
pub use params::{derive_thresholds, DetectionParameters, THRESHOLD_EPSILON};
pub use sal::{sal_report, sal_score, SalReport, SalScore};
