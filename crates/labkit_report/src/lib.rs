//! `labkit_report` v1:
//! Lab lending report exporter (borrowing records, inventory, loans, user activity).
//!
//! Module layout:
//! - `conf`     : defaults, placeholders and fixed sheet layouts
//! - `spec`     : options/layouts/display enums/outcomes/errors
//! - `model`    : snapshot records (camelCase JSON)
//! - `util`     : date parsing, day counts, stock classification
//! - `sheets`   : row construction and sheet tables
//! - `activity` : per-user activity statistics
//! - `preview`  : on-screen summary
//! - `exporter` : workbook export to file or buffer
pub mod activity;
pub mod conf;
pub mod exporter;
pub mod model;
pub mod preview;
pub mod sheets;
pub mod spec;
pub mod util;

pub use conf::{
    C_APP_NAME_DEFAULT, C_DATE_FORMAT_DEFAULT, LAYOUT_BORROWING_RECORDS, LAYOUT_CURRENTLY_BORROWED,
    LAYOUT_INVENTORY, LAYOUT_USER_ACTIVITY, N_PREVIEW_RECORDS_MAX,
};
pub use exporter::ReportExporter;
pub use model::{BorrowRequest, Component, EnumRequestStatus, LoginSession, SystemData, User};
pub use preview::{SpecPreviewSummary, SpecReportPreview, generate_preview_data};
pub use sheets::{SpecSheetTable, build_report_sheets};
pub use spec::{
    EnumAccountStatus, EnumActivityLevel, EnumColumnKind, EnumLoginTimeBucket, EnumRowCell,
    EnumStockStatus, ReportError, SpecColumnLayout, SpecExportBuffer, SpecExportOutcome,
    SpecRenderContext, SpecReportOptions, SpecSheetLayout,
};
pub use util::{calculate_days_between, classify_stock_status, derive_report_filename};
