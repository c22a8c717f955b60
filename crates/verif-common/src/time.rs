//! Init times and lead-time arithmetic.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{CommonError, CommonResult};

/// Parse an init time in YYYYMMDDHH form.
pub fn parse_init_time(s: &str) -> CommonResult<NaiveDateTime> {
    let invalid = || CommonError::InvalidInitTime(s.to_string());
    if s.len() != 10 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let year: i32 = s[0..4].parse().map_err(|_| invalid())?;
    let month: u32 = s[4..6].parse().map_err(|_| invalid())?;
    let day: u32 = s[6..8].parse().map_err(|_| invalid())?;
    let hour: u32 = s[8..10].parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .ok_or_else(invalid)
}

/// Format an init or valid time as YYYYMMDDHH.
pub fn format_init_time(t: NaiveDateTime) -> String {
    t.format("%Y%m%d%H").to_string()
}

/// Whole hours between two times (truncated).
pub fn hours_between(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    (end - start).num_seconds() / 3600
}

/// Lead times (hours since init) at which a forecast overlaps the case
/// window.
///
/// The first lead is 0 unless the forecast was initialized before the case
/// window opens; the last lead is capped by whichever of the case window
/// and the forecast horizon ends first. Returns an empty range when the
/// two windows do not overlap.
pub fn lead_time_range(
    case_start: NaiveDateTime,
    case_end: NaiveDateTime,
    init: NaiveDateTime,
    forecast_end: NaiveDateTime,
) -> Vec<u32> {
    let first = if init < case_start {
        hours_between(init, case_start)
    } else {
        0
    };
    let last = if case_end < forecast_end {
        hours_between(init, case_end)
    } else {
        hours_between(init, forecast_end)
    };
    if last < first {
        return Vec::new();
    }
    (first..=last).map(|h| h as u32).collect()
}

/// Zero-padded lead-time label used to key per-lead-time results, e.g.
/// `"03"` for lead 3.
pub fn format_lead_time(lead: u32) -> String {
    format!("{:02}", lead)
}
