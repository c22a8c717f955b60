//! Common types and utilities shared across all spatial-verif crates.

pub mod error;
pub mod field;
pub mod json;
pub mod key;
pub mod time;

pub use error::{CommonError, CommonResult};
pub use field::{GridCoords, GridField};
pub use key::VerifKey;
pub use time::{format_init_time, format_lead_time, hours_between, lead_time_range, parse_init_time};
