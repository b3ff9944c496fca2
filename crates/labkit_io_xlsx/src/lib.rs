//! `labkit_io_xlsx` v1:
//! XLSX writer kernel used by the lab report exporter.
//!
//! Module layout:
//! - `conf`   : Excel limits and default format presets
//! - `spec`   : formats/policies/options/report models
//! - `util`   : pure helper functions
//! - `writer` : DataFrame-to-worksheet writer
pub mod conf;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
    derive_default_xlsx_formats,
};
pub use spec::{
    EnumCellValue, EnumIntegerCoerceMode, SpecAutofitCellsPolicy,
    SpecCellFormat, SpecSheetSlice, SpecXlsxFormatSet, SpecXlsxReport, SpecXlsxValuePolicy,
    SpecXlsxWriteOptions,
};
pub use util::{convert_cell_value, convert_nan_inf_to_str, plan_sheet_slices, sanitize_sheet_name};
pub use writer::{SpecXlsxSheetWriteOptions, XlsxWriter};
