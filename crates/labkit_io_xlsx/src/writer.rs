//! XLSX writer kernel that renders polars `DataFrame`s into styled worksheets.

use std::collections::BTreeSet;
use std::path::Path;

use polars::prelude::{AnyValue, DataFrame};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, N_WIDTH_EXCEL_COLUMN_MAX};
use crate::spec::{
    EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat,
    SpecSheetSlice, SpecXlsxFormatSet, SpecXlsxReport, SpecXlsxValuePolicy, SpecXlsxWriteOptions,
};
use crate::util::{
    convert_cell_value, derive_slice_indices, plan_sheet_slices, sanitize_sheet_name,
    select_sorted_indices_from_refs, validate_unique_columns,
};

/// Per-sheet call options.
#[derive(Default, Debug, Clone)]
pub struct SpecXlsxSheetWriteOptions {
    /// Integer columns by name/index-string.
    ///
    /// Listed columns are treated as numeric even when stored as text, so
    /// numeric-looking strings become numbers and other strings stay text.
    pub cols_integer: Option<Vec<String>>,
    /// Fixed column widths; takes precedence over autofit.
    pub widths_col: Option<Vec<f64>>,
    /// Patch overlaid on the writer header format for this sheet only.
    pub fmt_header_patch: Option<SpecCellFormat>,
    /// Column autofit policy, used when `widths_col` is `None`.
    pub policy_autofit: SpecAutofitCellsPolicy,
}

/// Stateful workbook writer.
///
/// The workbook is buffered in memory until [`Self::save`] or
/// [`Self::save_to_buffer`] is called; either one closes the writer.
pub struct XlsxWriter {
    workbook: Workbook,
    formats: SpecXlsxFormatSet,
    write_options: SpecXlsxWriteOptions,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
    if_closed: bool,
}

const N_HEIGHT_HEADER: usize = 1;

impl XlsxWriter {
    /// Create writer with format presets and write options.
    pub fn new(formats: SpecXlsxFormatSet, write_options: SpecXlsxWriteOptions) -> Self {
        Self {
            workbook: Workbook::new(),
            formats,
            write_options,
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            if_closed: false,
        }
    }

    /// Return immutable snapshot of per-sheet write reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Flush workbook to `path_file_out`. Idempotent once saved.
    pub fn save(&mut self, path_file_out: &Path) -> Result<(), String> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook
            .save(path_file_out)
            .map_err(derive_xlsx_error_text)?;
        self.if_closed = true;
        Ok(())
    }

    /// Serialize workbook into memory and close the writer.
    pub fn save_to_buffer(&mut self) -> Result<Vec<u8>, String> {
        if self.if_closed {
            return Err("Workbook already closed.".to_string());
        }
        let v_bytes = self
            .workbook
            .save_to_buffer()
            .map_err(derive_xlsx_error_text)?;
        self.if_closed = true;
        Ok(v_bytes)
    }

    /// Write one sheet: a single header row from the column names followed by
    /// one worksheet row per dataframe row.
    pub fn write_sheet(
        &mut self,
        df_data: &DataFrame,
        sheet_name: &str,
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<(), String> {
        if self.if_closed {
            return Err("Cannot write after close().".to_string());
        }
        validate_policy_autofit(&options.policy_autofit)?;

        let if_keep_missing_values = self.write_options.keep_missing_values;
        let value_policy = self.write_options.value_policy.clone();

        let l_colnames_df: Vec<String> = df_data
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        validate_unique_columns(&l_colnames_df)?;

        let n_width_df = l_colnames_df.len();
        let n_height_df = df_data.height();

        if let Some(widths_col) = &options.widths_col
            && widths_col.len() != n_width_df
        {
            return Err(format!(
                "widths_col has {} entries but the sheet has {n_width_df} columns.",
                widths_col.len()
            ));
        }

        // Integer/float dtypes are numeric; listed text columns join the integer set.
        let l_cols_idx_integer_specified =
            select_sorted_indices_from_refs(&l_colnames_df, options.cols_integer.as_deref())?;
        let mut set_cols_idx_numeric: BTreeSet<usize> =
            derive_numeric_column_indices(df_data).into_iter().collect();
        let mut set_cols_idx_integer = derive_integer_column_indices(df_data, &set_cols_idx_numeric);
        set_cols_idx_integer.extend(l_cols_idx_integer_specified.iter().copied());
        set_cols_idx_numeric.extend(l_cols_idx_integer_specified.iter().copied());
        let l_cols_idx_numeric: Vec<usize> = set_cols_idx_numeric.into_iter().collect();
        let l_cols_idx_integer: Vec<usize> = set_cols_idx_integer.into_iter().collect();

        let mut report = SpecXlsxReport::default();
        let l_sheet_parts = plan_sheet_slices(
            n_height_df,
            n_width_df,
            N_HEIGHT_HEADER,
            &sanitize_sheet_name(sheet_name, "_"),
            &mut report,
        )?;

        let fmt_header = derive_rust_xlsx_format(&match &options.fmt_header_patch {
            Some(patch) => self.formats.header.merge(patch),
            None => self.formats.header.clone(),
        });
        let l_columns = df_data.get_columns();

        for sheet_slice in l_sheet_parts {
            let sheet_name_unique = self.derive_unique_sheet_name(&sheet_slice.sheet_name);
            let n_col_start = sheet_slice.col_start_inclusive;
            let n_col_end = sheet_slice.col_end_exclusive;

            let set_numeric_slice =
                derive_slice_indices(&l_cols_idx_numeric, n_col_start, n_col_end);
            let set_integer_slice =
                derive_slice_indices(&l_cols_idx_integer, n_col_start, n_col_end);

            let l_fmt_spec_by_col: Vec<SpecCellFormat> = (0..n_col_end - n_col_start)
                .map(|n_idx_col| {
                    let fmt_base = if set_integer_slice.contains(&n_idx_col) {
                        &self.formats.integer
                    } else if set_numeric_slice.contains(&n_idx_col) {
                        &self.formats.decimal
                    } else {
                        &self.formats.text
                    };
                    fmt_base.merge(&self.write_options.base_format_patch)
                })
                .collect();
            let l_fmt_data_by_col: Vec<Format> =
                l_fmt_spec_by_col.iter().map(derive_rust_xlsx_format).collect();

            let worksheet = self.workbook.add_worksheet();
            worksheet
                .set_name(&sheet_name_unique)
                .map_err(derive_xlsx_error_text)?;

            let l_header_slice = &l_colnames_df[n_col_start..n_col_end];
            for (n_idx_col, c_header) in l_header_slice.iter().enumerate() {
                worksheet
                    .write_string_with_format(0, cast_col_num(n_idx_col)?, c_header, &fmt_header)
                    .map_err(derive_xlsx_error_text)?;
            }
            worksheet
                .set_freeze_panes(cast_row_num(N_HEIGHT_HEADER)?, 0)
                .map_err(derive_xlsx_error_text)?;

            let l_width_by_col_header: Vec<usize> = l_header_slice
                .iter()
                .map(|c_header| estimate_unicode_string_width(c_header))
                .collect();
            let mut l_width_by_col_body = vec![0usize; l_header_slice.len()];
            let n_rows_autofit_max = options
                .policy_autofit
                .height_body_inferred_max
                .unwrap_or(usize::MAX);

            for n_row_abs in sheet_slice.row_start_inclusive..sheet_slice.row_end_exclusive {
                let n_row_local = n_row_abs - sheet_slice.row_start_inclusive;
                for n_idx_col in 0..l_header_slice.len() {
                    let col = &l_columns[n_col_start + n_idx_col];
                    let value_raw = derive_cell_value_from_any_value(
                        col.get(n_row_abs)
                            .map_err(|err| format!("Failed to access cell value: {err}"))?,
                    );
                    let value = convert_cell_value(
                        &value_raw,
                        set_numeric_slice.contains(&n_idx_col),
                        set_integer_slice.contains(&n_idx_col),
                        if_keep_missing_values,
                        &value_policy,
                    );

                    if n_row_local < n_rows_autofit_max {
                        l_width_by_col_body[n_idx_col] = usize::max(
                            l_width_by_col_body[n_idx_col],
                            estimate_width_len(&value, if_keep_missing_values, &value_policy),
                        );
                    }

                    write_cell_with_format(
                        worksheet,
                        N_HEIGHT_HEADER + n_row_local,
                        n_idx_col,
                        &value,
                        &l_fmt_data_by_col[n_idx_col],
                    )?;
                }
            }

            if let Some(widths_col) = &options.widths_col {
                for (n_idx_col, n_width) in widths_col[n_col_start..n_col_end].iter().enumerate() {
                    worksheet
                        .set_column_width(
                            cast_col_num(n_idx_col)?,
                            n_width.clamp(0.0, N_WIDTH_EXCEL_COLUMN_MAX),
                        )
                        .map_err(derive_xlsx_error_text)?;
                }
            } else {
                apply_autofit_widths(
                    worksheet,
                    &options.policy_autofit,
                    &l_width_by_col_header,
                    &l_width_by_col_body,
                )?;
            }

            tracing::debug!(
                sheet = %sheet_name_unique,
                rows = sheet_slice.height(),
                cols = n_col_end - n_col_start,
                "worksheet written"
            );
            report.sheets.push(SpecSheetSlice {
                sheet_name: sheet_name_unique,
                ..sheet_slice
            });
        }

        self.l_reports.push(report);
        Ok(())
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        let c_name_key = name.to_lowercase();
        if !self.set_sheet_names_existing.contains(&c_name_key) {
            self.set_sheet_names_existing.insert(c_name_key);
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate: String = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            let candidate_key = candidate.to_lowercase();
            if !self.set_sheet_names_existing.contains(&candidate_key) {
                self.set_sheet_names_existing.insert(candidate_key);
                return candidate;
            }
            n_idx += 1;
        }
    }
}

/// Estimate displayed width units for one normalized cell value.
pub fn estimate_width_len(
    value: &EnumCellValue,
    if_keep_missing_values: bool,
    value_policy: &SpecXlsxValuePolicy,
) -> usize {
    match value {
        EnumCellValue::None if if_keep_missing_values => value_policy.missing_value_str.len(),
        EnumCellValue::None => 0,
        EnumCellValue::String(s) => estimate_unicode_string_width(s),
        EnumCellValue::Number(n) if n.fract() == 0.0 => format!("{n:.0}").len(),
        EnumCellValue::Number(n) => format!("{n:.2}").len(),
    }
}

fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

fn apply_autofit_widths(
    worksheet: &mut Worksheet,
    policy_autofit: &SpecAutofitCellsPolicy,
    l_width_by_col_header: &[usize],
    l_width_by_col_body: &[usize],
) -> Result<(), String> {
    let n_min = usize::max(1, policy_autofit.width_cell_min);
    let n_max = usize::min(255, usize::max(n_min, policy_autofit.width_cell_max));

    for (n_idx_col, (n_header, n_body)) in l_width_by_col_header
        .iter()
        .zip(l_width_by_col_body)
        .enumerate()
    {
        let n_width_final =
            (usize::max(*n_header, *n_body) + policy_autofit.width_cell_padding).clamp(n_min, n_max);
        worksheet
            .set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)
            .map_err(derive_xlsx_error_text)?;
    }
    Ok(())
}

fn validate_policy_autofit(policy_autofit: &SpecAutofitCellsPolicy) -> Result<(), String> {
    if policy_autofit.width_cell_min == 0 {
        return Err("policy_autofit.width_cell_min must be >= 1.".to_string());
    }
    if policy_autofit.width_cell_max < policy_autofit.width_cell_min {
        return Err(
            "policy_autofit.width_cell_max must be >= policy_autofit.width_cell_min.".to_string(),
        );
    }
    Ok(())
}

fn derive_numeric_column_indices(df: &DataFrame) -> Vec<usize> {
    df.get_columns()
        .iter()
        .enumerate()
        .filter(|(_, c_col)| c_col.dtype().is_numeric())
        .map(|(n_idx, _)| n_idx)
        .collect()
}

fn derive_integer_column_indices(
    df: &DataFrame,
    cols_idx_numeric: &BTreeSet<usize>,
) -> BTreeSet<usize> {
    cols_idx_numeric
        .iter()
        .copied()
        .filter(|n_idx| df.get_columns()[*n_idx].dtype().is_integer())
        .collect()
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "TRUE" } else { "FALSE" }.to_string())
        }
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), String> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => worksheet.write_blank(n_row, n_col, format),
        EnumCellValue::String(val) => worksheet.write_string_with_format(n_row, n_col, val, format),
        EnumCellValue::Number(val) => worksheet.write_number_with_format(n_row, n_col, *val, format),
    }
    .map_err(derive_xlsx_error_text)?;
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    match align.trim().to_ascii_lowercase().as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}
