//! Date utility functions for calendar-month calculations
//!
//! Schedule durations are counted in whole calendar months: day-of-month is
//! ignored, so the 28th of one month to the 1st of the next counts as 1.
//! Every duration shown in the schedule UI goes through `month_span`.

use chrono::{Datelike, NaiveDate};

/// Parse a "YYYY-MM-DD" date string
/// Returns None for empty or malformed input
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    if date_str.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()
}

/// Whole-month count between two calendar dates
///
/// months = (endYear - startYear) * 12 + (endMonth - startMonth), clamped
/// to zero. A reversed range yields 0 rather than an error; callers run
/// their own date-order validation before display.
pub fn month_span(start_str: &str, end_str: &str) -> i32 {
    let start = match parse_date(start_str) {
        Some(d) => d,
        None => return 0,
    };

    let end = match parse_date(end_str) {
        Some(d) => d,
        None => return 0,
    };

    let months = (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32);

    months.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_year_span() {
        assert_eq!(month_span("2025-01-15", "2025-04-01"), 3);
    }

    #[test]
    fn year_rollover_span() {
        assert_eq!(month_span("2024-12-10", "2025-01-05"), 1);
    }

    #[test]
    fn reversed_dates_clamp_to_zero() {
        assert_eq!(month_span("2025-05-01", "2025-01-01"), 0);
    }

    #[test]
    fn missing_input_counts_zero() {
        assert_eq!(month_span("", "2025-01-01"), 0);
        assert_eq!(month_span("2025-01-01", ""), 0);
        assert_eq!(month_span("", ""), 0);
    }

    #[test]
    fn malformed_input_counts_zero() {
        assert_eq!(month_span("not-a-date", "2025-01-01"), 0);
        assert_eq!(month_span("2025-01-01", "2025-13-40"), 0);
    }

    #[test]
    fn day_of_month_is_ignored() {
        // 28th to the 1st of the next month is still one month
        assert_eq!(month_span("2025-02-28", "2025-03-01"), 1);
        // same calendar month is zero regardless of days apart
        assert_eq!(month_span("2025-03-01", "2025-03-31"), 0);
    }

    #[test]
    fn multi_year_span() {
        assert_eq!(month_span("2025-01-15", "2029-01-10"), 48);
        assert_eq!(month_span("2025-01-15", "2029-02-10"), 49);
    }
}
