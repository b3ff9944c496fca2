//! Pure helpers for dates, day counts and stock classification.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::conf::{
    C_PLACEHOLDER_INVALID_DATE, N_MS_PER_DAY, N_PCT_STOCK_LOW, N_PCT_STOCK_MEDIUM,
};
use crate::spec::{EnumStockStatus, SpecRenderContext};

////////////////////////////////////////////////////////////////////////////////
// #region Timestamps

/// Parse a stored timestamp.
///
/// Accepted shapes:
/// - RFC 3339 (`2026-10-16T09:30:00.000Z`, `2026-10-16T09:30:00+05:30`)
/// - date only (`2026-10-16`), taken as UTC midnight
/// - date-time without offset, taken in `offset`
pub fn parse_timestamp(raw: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let c_raw = raw.trim();
    if c_raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(c_raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(c_raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(c_raw, fmt).ok())
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Whole days from `from` to `to`, rounded up: `ceil((to - from) / 1 day)`.
pub fn calculate_days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let n_delta_ms = (to - from).num_milliseconds();
    n_delta_ms.div_euclid(N_MS_PER_DAY) + i64::from(n_delta_ms.rem_euclid(N_MS_PER_DAY) != 0)
}

/// Render `raw` as a calendar date in the context offset, or `Invalid Date`.
pub fn format_calendar_date(raw: &str, ctx: &SpecRenderContext) -> String {
    match parse_timestamp(raw, ctx.offset) {
        Some(dt) => dt
            .with_timezone(&ctx.offset)
            .format(&ctx.date_format)
            .to_string(),
        None => C_PLACEHOLDER_INVALID_DATE.to_string(),
    }
}

/// Download file name: `<app>-Report-<YYYY-MM-DD>.xlsx` using the UTC date.
pub fn derive_report_filename(app_name: &str, now: DateTime<Utc>) -> String {
    format!("{}-Report-{}.xlsx", app_name.trim(), now.format("%Y-%m-%d"))
}

impl SpecRenderContext {
    pub fn parse(&self, raw: &str) -> Option<DateTime<Utc>> {
        parse_timestamp(raw, self.offset)
    }

    pub fn format_date(&self, raw: &str) -> String {
        format_calendar_date(raw, self)
    }

    /// Days from now until `raw`; negative once it has passed.
    pub fn days_until(&self, raw: &str) -> Option<i64> {
        self.parse(raw)
            .map(|dt| calculate_days_between(self.now, dt))
    }

    /// Days from `raw` until now.
    pub fn days_since(&self, raw: &str) -> Option<i64> {
        self.parse(raw)
            .map(|dt| calculate_days_between(dt, self.now))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Stock

/// `available / total * 100`. Zero total gives NaN (or infinity) without panicking.
pub fn derive_stock_percentage(available: i64, total: i64) -> f64 {
    (available as f64 / total as f64) * 100.0
}

/// Stock level: zero available is out of stock, then `< 20%` low, `< 50%` medium.
pub fn classify_stock_status(available: i64, total: i64) -> EnumStockStatus {
    if available == 0 {
        return EnumStockStatus::OutOfStock;
    }
    let n_pct = derive_stock_percentage(available, total);
    if n_pct < N_PCT_STOCK_LOW {
        EnumStockStatus::Low
    } else if n_pct < N_PCT_STOCK_MEDIUM {
        EnumStockStatus::Medium
    } else {
        EnumStockStatus::Good
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

/// Two-decimal rendering.
pub fn format_fixed_2(value: f64) -> String {
    format!("{value:.2}")
}
