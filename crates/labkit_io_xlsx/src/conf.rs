//! XLSX constants and default preset factories.

use crate::spec::{SpecCellFormat, SpecXlsxFormatSet};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Upper bound Excel accepts for a column width.
pub const N_WIDTH_EXCEL_COLUMN_MAX: f64 = 255.0;

/// Build the default format set used by [`crate::writer::XlsxWriter`].
///
/// Header cells are bold and centred; body cells share one base font.
pub fn derive_default_xlsx_formats() -> SpecXlsxFormatSet {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("Calibri".to_string()),
        font_size: Some(11),
        align: Some("left".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    SpecXlsxFormatSet {
        text: cfg_base_fmt_spec.clone(),
        integer: cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("0".to_string()),
            align: Some("right".to_string()),
            ..Default::default()
        }),
        decimal: cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("0.00".to_string()),
            align: Some("right".to_string()),
            ..Default::default()
        }),
        header: cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            align: Some("center".to_string()),
            border: Some(1),
            ..Default::default()
        }),
    }
}
