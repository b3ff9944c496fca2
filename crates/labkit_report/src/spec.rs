//! Report options, layouts, display enums, outcomes and errors.

use std::fmt;
use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Utc};
use labkit_io_xlsx::SpecXlsxReport;
use polars::prelude::PolarsError;
use thiserror::Error;

use crate::conf::{C_APP_NAME_DEFAULT, C_DATE_FORMAT_DEFAULT};

////////////////////////////////////////////////////////////////////////////////
// #region SheetLayout

/// Storage kind of one report column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumColumnKind {
    /// Plain text.
    Text,
    /// Whole numbers.
    Integer,
    /// Whole numbers or a placeholder string (e.g. `N/A`); numbers are written as numbers.
    IntegerOrText,
}

/// One column of a fixed sheet layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecColumnLayout {
    /// Header text.
    pub header: &'static str,
    /// Column width in character units.
    pub width: f64,
    /// Storage kind.
    pub kind: EnumColumnKind,
}

/// Fixed sheet layout: name, header fill and ordered columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecSheetLayout {
    /// Worksheet name.
    pub sheet_name: &'static str,
    /// Header fill color (`#RRGGBB`).
    pub color_header: &'static str,
    /// Ordered columns.
    pub columns: &'static [SpecColumnLayout],
}

impl SpecSheetLayout {
    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.header).collect()
    }

    pub fn widths(&self) -> Vec<f64> {
        self.columns.iter().map(|c| c.width).collect()
    }

    /// Zero-based position of the column titled `header`.
    pub fn position(&self, header: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.header == header)
    }

    /// Headers of text-backed columns that should still render numbers as numbers.
    pub fn cols_integer_or_text(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind == EnumColumnKind::IntegerOrText)
            .map(|c| c.header.to_string())
            .collect()
    }
}

/// One rendered cell before it is collected into a typed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumRowCell {
    Text(String),
    Integer(i64),
}

impl EnumRowCell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

impl fmt::Display for EnumRowCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(val) => write!(f, "{val}"),
            Self::Integer(val) => write!(f, "{val}"),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DisplayEnums

/// Inventory stock level derived from the available/total ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumStockStatus {
    OutOfStock,
    Low,
    Medium,
    Good,
}

impl EnumStockStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OutOfStock => "OUT OF STOCK",
            Self::Low => "LOW STOCK",
            Self::Medium => "MEDIUM STOCK",
            Self::Good => "GOOD STOCK",
        }
    }
}

impl fmt::Display for EnumStockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// User activity level by login count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumActivityLevel {
    High,
    Medium,
    Low,
    Inactive,
}

impl EnumActivityLevel {
    /// More than 10 logins is high, more than 3 medium, any login low.
    pub fn from_login_count(n_logins: i64) -> Self {
        match n_logins {
            n if n > 10 => Self::High,
            n if n > 3 => Self::Medium,
            n if n > 0 => Self::Low,
            _ => Self::Inactive,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Inactive => "INACTIVE",
        }
    }
}

/// Account flag as shown in the activity sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumAccountStatus {
    Active,
    Inactive,
}

impl EnumAccountStatus {
    pub fn from_is_active(if_active: bool) -> Self {
        if if_active { Self::Active } else { Self::Inactive }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }
}

/// Part of the day a login falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnumLoginTimeBucket {
    /// 05:00 to 11:59.
    Morning,
    /// 12:00 to 16:59.
    Afternoon,
    /// 17:00 to 20:59.
    Evening,
    /// 21:00 to 04:59.
    Night,
}

impl EnumLoginTimeBucket {
    pub fn from_hour(n_hour: u32) -> Self {
        match n_hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::Night => "Night",
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Exporter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecReportOptions {
    /// Prefix of the output file name (`<app_name>-Report-<date>.xlsx`).
    pub app_name: String,
    /// chrono format used for calendar-date cells.
    pub date_format: String,
    /// Offset from UTC used when rendering dates and bucketing login times.
    pub utc_offset_minutes: i32,
    /// Append the User Activity Report sheet.
    pub include_user_activity: bool,
    /// Pinned reference instant; the clock is read per call when `None`.
    pub now: Option<DateTime<Utc>>,
}

impl Default for SpecReportOptions {
    fn default() -> Self {
        Self {
            app_name: C_APP_NAME_DEFAULT.to_string(),
            date_format: C_DATE_FORMAT_DEFAULT.to_string(),
            utc_offset_minutes: 0,
            include_user_activity: false,
            now: None,
        }
    }
}

impl SpecReportOptions {
    /// Reject options that would produce an unusable file name or unrenderable dates.
    pub fn validate(&self) -> Result<(), ReportError> {
        let c_app_name = self.app_name.trim();
        if c_app_name.is_empty() {
            return Err(ReportError::InvalidOptions(
                "app_name must not be empty.".to_string(),
            ));
        }
        if c_app_name.contains(['/', '\\']) {
            return Err(ReportError::InvalidOptions(format!(
                "app_name must not contain path separators: {c_app_name:?}"
            )));
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ReportError::InvalidOptions(format!(
                "date_format is not a valid chrono format: {:?}",
                self.date_format
            )));
        }
        self.derive_utc_offset()?;
        Ok(())
    }

    pub fn derive_utc_offset(&self) -> Result<FixedOffset, ReportError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ReportError::InvalidOptions(format!(
                    "utc_offset_minutes out of range: {}",
                    self.utc_offset_minutes
                ))
            })
    }
}

/// Per-call rendering inputs resolved from [`SpecReportOptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRenderContext {
    /// Reference instant for day counts.
    pub now: DateTime<Utc>,
    /// Display offset.
    pub offset: FixedOffset,
    /// Calendar-date format.
    pub date_format: String,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region OutcomesAndErrors

/// Result of writing the report to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExportOutcome {
    /// Full path of the written workbook.
    pub path_file_out: PathBuf,
    /// File name, `<app>-Report-<YYYY-MM-DD>.xlsx`.
    pub file_name: String,
    /// One writer report per sheet, in sheet order.
    pub reports: Vec<SpecXlsxReport>,
}

/// Workbook kept in memory, ready to be offered as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExportBuffer {
    /// Suggested download file name.
    pub file_name: String,
    /// XLSX bytes.
    pub bytes: Vec<u8>,
    /// One writer report per sheet, in sheet order.
    pub reports: Vec<SpecXlsxReport>,
}

/// Errors surfaced by the report exporter.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Filesystem failure around the output or snapshot file.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot JSON could not be decoded.
    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Sheet table construction failed.
    #[error("Failed to build sheet table: {0}")]
    Frame(#[from] PolarsError),

    /// Workbook writer failure.
    #[error("{0}")]
    Xlsx(String),

    /// Rejected exporter configuration.
    #[error("Invalid report options: {0}")]
    InvalidOptions(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
