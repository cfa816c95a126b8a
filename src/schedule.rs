// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Pure pieces of the recurring-obligation scheduler: description token
//! resolution and calendar due-date arithmetic. The activation pass itself
//! lives on [`crate::engine::Engine`], which owns the stores and guards.

use crate::error::{Error, Result};
use crate::models::IntervalUnit;
use chrono::{DateTime, Datelike, Days, Local, Months, NaiveDate, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

/// Marker appended to every expense materialized from an obligation.
pub const RECURRING_SUFFIX: &str = " (scheduled)";

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(YEAR|MONTH|DAY|HOUR|MINUTE|SECOND)\}").unwrap());

/// Substitute `{YEAR}`/`{MONTH}`/`{DAY}`/`{HOUR}`/`{MINUTE}`/`{SECOND}`
/// against the given instant, zero-padded. Unknown braces pass through.
pub fn resolve_tokens(template: &str, instant: &DateTime<Local>) -> String {
    TOKEN_RE
        .replace_all(template, |caps: &regex::Captures| match &caps[1] {
            "YEAR" => format!("{:04}", instant.year()),
            "MONTH" => format!("{:02}", instant.month()),
            "DAY" => format!("{:02}", instant.day()),
            "HOUR" => format!("{:02}", instant.hour()),
            "MINUTE" => format!("{:02}", instant.minute()),
            _ => format!("{:02}", instant.second()),
        })
        .into_owned()
}

/// Advance a due date by `every × unit` with calendar rules: month and year
/// steps clamp to the last valid day instead of wrapping (Jan 31 + 1 month is
/// the end of February).
pub fn advance_due(date: NaiveDate, every: u32, unit: IntervalUnit) -> Result<NaiveDate> {
    let next = match unit {
        IntervalUnit::Day => date.checked_add_days(Days::new(u64::from(every))),
        IntervalUnit::Week => date.checked_add_days(Days::new(7 * u64::from(every))),
        IntervalUnit::Month => date.checked_add_months(Months::new(every)),
        IntervalUnit::Year => every
            .checked_mul(12)
            .and_then(|m| date.checked_add_months(Months::new(m))),
    };
    next.ok_or_else(|| {
        Error::Validation(format!(
            "cannot advance {} by {} {}(s)",
            date,
            every,
            unit.as_str()
        ))
    })
}

/// Outcome of one activation pass for one owner.
#[derive(Debug, Default, Serialize)]
pub struct ActivationReport {
    /// Obligations materialized into an expense during this pass.
    pub applied: Vec<String>,
    /// New due dates for the repeating obligations among them.
    pub next_due: BTreeMap<String, NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn tokens_resolve_zero_padded() {
        let instant = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap();
        assert_eq!(
            resolve_tokens("rent {YEAR}-{MONTH}-{DAY} {HOUR}:{MINUTE}:{SECOND}", &instant),
            "rent 2024-03-07 09:05:02"
        );
        assert_eq!(resolve_tokens("no tokens {WEEK}", &instant), "no tokens {WEEK}");
    }

    #[test]
    fn month_advance_clamps() {
        let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            advance_due(jan31, 1, IntervalUnit::Month).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        let jan31_25 = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(
            advance_due(jan31_25, 1, IntervalUnit::Month).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
    }

    #[test]
    fn week_and_year_advance() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            advance_due(d, 2, IntervalUnit::Week).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
        );
        assert_eq!(
            advance_due(d, 1, IntervalUnit::Year).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
    }
}
