//! Stateless helper utilities used by the XLSX writer kernel.

use std::collections::{BTreeMap, BTreeSet};

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::spec::{EnumCellValue, EnumIntegerCoerceMode, SpecSheetSlice, SpecXlsxReport, SpecXlsxValuePolicy};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Convert `NaN`/`Inf` to policy string; return error for finite values.
pub fn convert_nan_inf_to_str(
    x: f64,
    value_policy: &SpecXlsxValuePolicy,
) -> Result<String, String> {
    if x.is_nan() {
        return Ok(value_policy.nan_str.clone());
    }
    if x.is_infinite() {
        return Ok(if x.is_sign_positive() {
            value_policy.posinf_str.clone()
        } else {
            value_policy.neginf_str.clone()
        });
    }
    Err("Input is neither NaN nor Inf.".to_string())
}

/// Normalize cell value according to numeric/integer flags and value policy.
///
/// Text in a numeric column is parsed when it looks like a number and kept
/// verbatim otherwise, so placeholder strings survive in numeric columns.
pub fn convert_cell_value(
    value: &EnumCellValue,
    if_is_numeric_col: bool,
    if_is_integer_col: bool,
    if_keep_missing_values: bool,
    value_policy: &SpecXlsxValuePolicy,
) -> EnumCellValue {
    let n_value = match value {
        EnumCellValue::None => {
            return if if_keep_missing_values {
                EnumCellValue::String(value_policy.missing_value_str.clone())
            } else {
                EnumCellValue::None
            };
        }
        EnumCellValue::String(s) if !if_is_numeric_col => return EnumCellValue::String(s.clone()),
        EnumCellValue::Number(n) if !if_is_numeric_col => {
            return EnumCellValue::String(n.to_string());
        }
        EnumCellValue::Number(n) => *n,
        EnumCellValue::String(s) => match s.trim().parse::<f64>() {
            Ok(v) if !s.trim().is_empty() => v,
            _ => return EnumCellValue::String(s.clone()),
        },
    };

    if !n_value.is_finite() {
        return if if_keep_missing_values {
            EnumCellValue::String(
                convert_nan_inf_to_str(n_value, value_policy)
                    .unwrap_or_else(|_| value_policy.nan_str.clone()),
            )
        } else {
            EnumCellValue::None
        };
    }

    if !if_is_integer_col || n_value.fract() == 0.0 {
        return EnumCellValue::Number(n_value);
    }
    match value_policy.integer_coerce {
        EnumIntegerCoerceMode::Coerce => EnumCellValue::Number(n_value.trunc()),
        EnumIntegerCoerceMode::Strict => EnumCellValue::String(n_value.to_string()),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), String> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter(|(_, l_pos)| l_pos.len() > 1)
        .map(|(c_name, l_pos)| format!("{c_name:?} x{} at indices {l_pos:?}", l_pos.len()))
        .collect::<Vec<_>>()
        .join("; ");

    Err(format!("Duplicate column names detected: {c_msg}"))
}

/// Resolve mixed refs (`name` or numeric string index) to sorted unique indices.
pub fn select_sorted_indices_from_refs(
    columns: &[String],
    refs: Option<&[String]>,
) -> Result<Vec<usize>, String> {
    let Some(refs) = refs else {
        return Ok(vec![]);
    };

    let mut set_idx = BTreeSet::new();
    for ref_col in refs {
        if let Some(n_idx) = columns.iter().position(|c_name| c_name == ref_col) {
            set_idx.insert(n_idx);
            continue;
        }
        match ref_col.parse::<usize>() {
            Ok(n_idx) if n_idx < columns.len() => {
                set_idx.insert(n_idx);
            }
            _ => return Err(format!("Column not found: {ref_col:?}")),
        }
    }

    Ok(set_idx.into_iter().collect())
}

/// Keep indices inside `[col_start, col_end)` and rebase them to the slice.
pub fn derive_slice_indices(
    indices: &[usize],
    col_start_inclusive: usize,
    col_end_exclusive: usize,
) -> BTreeSet<usize> {
    indices
        .iter()
        .filter(|idx| (col_start_inclusive..col_end_exclusive).contains(*idx))
        .map(|idx| idx - col_start_inclusive)
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Split a logical table into Excel-compliant sheet slices.
///
/// Columns are split first, then rows. An empty table still yields one
/// header-only slice.
pub fn plan_sheet_slices(
    height_df: usize,
    width_df: usize,
    height_header: usize,
    sheet_name: &str,
    report: &mut SpecXlsxReport,
) -> Result<Vec<SpecSheetSlice>, String> {
    if height_header == 0 {
        return Err("height_header must be >= 1.".to_string());
    }
    let n_rows_data_max = N_NROWS_EXCEL_MAX.saturating_sub(height_header);
    if n_rows_data_max == 0 {
        return Err(format!(
            "Header too tall: height_header={height_header} exceeds Excel limit."
        ));
    }

    let l_col_slices = derive_spans(width_df, N_NCOLS_EXCEL_MAX);
    let l_row_slices = derive_spans(height_df, n_rows_data_max);
    let n_parts_total = l_col_slices.len() * l_row_slices.len();

    let l_sheet_parts: Vec<SpecSheetSlice> = l_col_slices
        .iter()
        .flat_map(|col_span| l_row_slices.iter().map(move |row_span| (*col_span, *row_span)))
        .enumerate()
        .map(|(n_idx, ((col_start, col_end), (row_start, row_end)))| SpecSheetSlice {
            sheet_name: if n_parts_total == 1 {
                sheet_name.to_string()
            } else {
                create_sheet_identifier(sheet_name, n_idx + 1)
            },
            row_start_inclusive: row_start,
            row_end_exclusive: row_end,
            col_start_inclusive: col_start,
            col_end_exclusive: col_end,
        })
        .collect();

    if n_parts_total > 1 {
        report.warn(format!(
            "Excel limit overflow: split {sheet_name:?} into {} sheets (columns-first, then rows).",
            l_sheet_parts.len()
        ));
    }

    Ok(l_sheet_parts)
}

fn derive_spans(n_total: usize, n_span_max: usize) -> Vec<(usize, usize)> {
    let mut l_spans = Vec::new();
    let mut n_start = 0;
    while n_start < n_total {
        let n_end = usize::min(n_total, n_start + n_span_max);
        l_spans.push((n_start, n_end));
        n_start = n_end;
    }
    if l_spans.is_empty() {
        l_spans.push((0, 0));
    }
    l_spans
}

/// Create suffixed sheet name (`base_1`, `base_2`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, part_idx_1based: usize) -> String {
    let c_sheet_name_suffix = format!("_{part_idx_1based}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
