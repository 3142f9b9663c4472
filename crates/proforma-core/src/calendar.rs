use chrono::{DateTime, Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ProFormaError;
use crate::ProFormaResult;

/// Months added to leasing start when a stabilization date precedes it.
pub const STABILIZATION_FALLBACK_MONTHS: u32 = 12;

/// One column of the projection, indexed from the closing date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowMonth {
    /// 0-based month index
    pub index: u32,
    /// "Month 1" .. "Month 60"
    pub label: String,
    /// "Jan 2026" style label; absent without a closing date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_label: Option<String>,
}

/// Month offsets of the lease-up window, relative to closing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseUpOffsets {
    pub leasing_start: Option<u32>,
    pub stabilized: Option<u32>,
    /// True when the stabilized offset was pushed past leasing start
    pub clamped: bool,
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` or an RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> ProFormaResult<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.date_naive());
    }
    if let Some((date_part, _)) = trimmed.split_once('T') {
        if let Ok(d) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
            return Ok(d);
        }
    }
    Err(ProFormaError::DateError(format!(
        "Unrecognised date '{trimmed}', expected YYYY-MM-DD"
    )))
}

/// Whole calendar months from `from` to `to`, floored at zero.
pub fn month_offset(from: NaiveDate, to: NaiveDate) -> u32 {
    let months = (to.year() - from.year()) as i64 * 12 + to.month() as i64 - from.month() as i64;
    months.max(0) as u32
}

/// Label every month of the horizon.
pub fn cashflow_months(closing: Option<NaiveDate>, horizon: u32) -> Vec<CashflowMonth> {
    (0..horizon)
        .map(|index| CashflowMonth {
            index,
            label: format!("Month {}", index + 1),
            calendar_label: closing
                .and_then(|d| d.checked_add_months(Months::new(index)))
                .map(|d| d.format("%b %Y").to_string()),
        })
        .collect()
}

/// Derive leasing-start and stabilization offsets from project dates.
///
/// Without a closing date neither offset is known. A stabilization date
/// that falls before leasing start is replaced by leasing start + 12 months.
pub fn resolve_lease_up(
    closing: Option<NaiveDate>,
    leasing_start: Option<NaiveDate>,
    stabilized: Option<NaiveDate>,
) -> LeaseUpOffsets {
    let Some(closing) = closing else {
        return LeaseUpOffsets::default();
    };
    let leasing = leasing_start.map(|d| month_offset(closing, d));
    let raw_stabilized = stabilized.map(|d| month_offset(closing, d));
    clamp_lease_up(leasing, raw_stabilized)
}

/// Apply the stabilization clamp to already-known offsets.
pub fn clamp_lease_up(leasing_start: Option<u32>, stabilized: Option<u32>) -> LeaseUpOffsets {
    match (leasing_start, stabilized) {
        (Some(l), Some(s)) if s < l => LeaseUpOffsets {
            leasing_start: Some(l),
            stabilized: Some(l.saturating_add(STABILIZATION_FALLBACK_MONTHS)),
            clamped: true,
        },
        _ => LeaseUpOffsets {
            leasing_start,
            stabilized,
            clamped: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2026-03-15").unwrap(), date(2026, 3, 15));
        assert_eq!(parse_date("2026-03-15T00:00:00Z").unwrap(), date(2026, 3, 15));
        assert_eq!(parse_date("2026-03-15T08:30:00").unwrap(), date(2026, 3, 15));
        assert!(parse_date("15/03/2026").is_err());
    }

    #[test]
    fn test_month_offset() {
        assert_eq!(month_offset(date(2026, 1, 31), date(2026, 2, 1)), 1);
        assert_eq!(month_offset(date(2026, 1, 1), date(2028, 1, 1)), 24);
        assert_eq!(month_offset(date(2026, 6, 1), date(2026, 1, 1)), 0);
    }

    #[test]
    fn test_cashflow_months_labels() {
        let months = cashflow_months(Some(date(2026, 11, 15)), 3);
        assert_eq!(months.len(), 3);
        assert_eq!(months[0].label, "Month 1");
        assert_eq!(months[0].calendar_label.as_deref(), Some("Nov 2026"));
        assert_eq!(months[2].calendar_label.as_deref(), Some("Jan 2027"));

        let undated = cashflow_months(None, 2);
        assert!(undated[1].calendar_label.is_none());
    }

    #[test]
    fn test_stabilized_before_leasing_is_clamped() {
        let offsets = resolve_lease_up(
            Some(date(2026, 1, 1)),
            Some(date(2027, 7, 1)),
            Some(date(2027, 1, 1)),
        );
        assert_eq!(offsets.leasing_start, Some(18));
        assert_eq!(offsets.stabilized, Some(30));
        assert!(offsets.clamped);
    }

    #[test]
    fn test_no_closing_means_unknown_offsets() {
        let offsets = resolve_lease_up(None, Some(date(2027, 7, 1)), None);
        assert_eq!(offsets, LeaseUpOffsets::default());
    }
}
