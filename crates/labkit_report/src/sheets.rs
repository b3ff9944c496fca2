//! Row construction for the fixed report sheets and table assembly.

use std::collections::BTreeMap;

use polars::prelude::{Column, DataFrame};

use crate::activity::derive_user_activity_row;
use crate::conf::{
    C_PLACEHOLDER_DESCRIPTION, C_PLACEHOLDER_NA, C_PLACEHOLDER_NAN, C_PLACEHOLDER_NOT_RETURNED,
    C_PLACEHOLDER_UNKNOWN, LAYOUT_BORROWING_RECORDS, LAYOUT_CURRENTLY_BORROWED, LAYOUT_INVENTORY,
    LAYOUT_USER_ACTIVITY,
};
use crate::model::{BorrowRequest, Component, EnumRequestStatus, SystemData};
use crate::spec::{EnumColumnKind, EnumRowCell, ReportError, SpecRenderContext, SpecSheetLayout};

/// Days-remaining cell: only approved requests carry a count.
fn derive_days_remaining_cell(request: &BorrowRequest, ctx: &SpecRenderContext) -> EnumRowCell {
    if request.status != EnumRequestStatus::Approved {
        return EnumRowCell::text(C_PLACEHOLDER_NA);
    }
    match ctx.days_until(&request.due_date) {
        Some(n_days) => EnumRowCell::Integer(n_days),
        None => EnumRowCell::text(C_PLACEHOLDER_NAN),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|val| !val.is_empty())
}

/// One Borrowing Records row.
pub fn derive_borrowing_record_row(
    request: &BorrowRequest,
    ctx: &SpecRenderContext,
) -> Vec<EnumRowCell> {
    vec![
        EnumRowCell::text(&request.id),
        EnumRowCell::text(&request.student_name),
        EnumRowCell::text(&request.roll_no),
        EnumRowCell::text(&request.mobile),
        EnumRowCell::text(&request.component_name),
        EnumRowCell::Integer(request.quantity),
        EnumRowCell::text(ctx.format_date(&request.request_date)),
        EnumRowCell::text(ctx.format_date(&request.due_date)),
        EnumRowCell::text(request.status.label()),
        derive_days_remaining_cell(request, ctx),
        EnumRowCell::text(non_empty(request.approved_by.as_deref()).unwrap_or(C_PLACEHOLDER_NA)),
        EnumRowCell::text(match non_empty(request.returned_at.as_deref()) {
            Some(returned_at) => ctx.format_date(returned_at),
            None => C_PLACEHOLDER_NOT_RETURNED.to_string(),
        }),
    ]
}

/// One Inventory row.
pub fn derive_inventory_row(component: &Component) -> Vec<EnumRowCell> {
    vec![
        EnumRowCell::text(&component.name),
        EnumRowCell::text(&component.category),
        EnumRowCell::Integer(component.total_quantity),
        EnumRowCell::Integer(component.available_quantity),
        EnumRowCell::Integer(component.borrowed_quantity()),
        EnumRowCell::text(component.stock_status().label()),
        EnumRowCell::text(
            non_empty(component.description.as_deref()).unwrap_or(C_PLACEHOLDER_DESCRIPTION),
        ),
    ]
}

/// One Currently Borrowed row; `dict_components` maps component id to component.
pub fn derive_currently_borrowed_row(
    request: &BorrowRequest,
    dict_components: &BTreeMap<&str, &Component>,
    ctx: &SpecRenderContext,
) -> Vec<EnumRowCell> {
    let c_category = dict_components
        .get(request.component_id.as_str())
        .map_or(C_PLACEHOLDER_UNKNOWN, |component| component.category.as_str());
    let c_overdue = match ctx.days_until(&request.due_date) {
        Some(n_days) if n_days < 0 => "YES",
        Some(_) => "NO",
        None => C_PLACEHOLDER_NA,
    };

    vec![
        EnumRowCell::text(&request.id),
        EnumRowCell::text(&request.student_name),
        EnumRowCell::text(&request.roll_no),
        EnumRowCell::text(&request.mobile),
        EnumRowCell::text(&request.component_name),
        EnumRowCell::text(c_category),
        EnumRowCell::Integer(request.quantity),
        EnumRowCell::text(ctx.format_date(&request.request_date)),
        EnumRowCell::text(ctx.format_date(&request.due_date)),
        derive_days_remaining_cell(request, ctx),
        EnumRowCell::text(c_overdue),
    ]
}

fn collect_integer_values(
    layout: &SpecSheetLayout,
    n_idx_col: usize,
    rows: &[Vec<EnumRowCell>],
) -> Result<Vec<i64>, ReportError> {
    rows.iter()
        .enumerate()
        .map(|(n_idx_row, row)| match &row[n_idx_col] {
            EnumRowCell::Integer(val) => Ok(*val),
            EnumRowCell::Text(val) => Err(ReportError::Xlsx(format!(
                "Row {n_idx_row} of sheet {:?} has text {val:?} in integer column {:?}.",
                layout.sheet_name, layout.columns[n_idx_col].header
            ))),
        })
        .collect()
}

/// Collect rows into a table whose columns follow `layout`.
///
/// Integer columns hold `i64` and reject text cells; text and mixed columns
/// hold strings. Zero rows give a header-only table.
pub fn assemble_sheet_frame(
    layout: &SpecSheetLayout,
    rows: &[Vec<EnumRowCell>],
) -> Result<DataFrame, ReportError> {
    let n_width = layout.columns.len();
    if let Some((n_idx_row, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != n_width) {
        return Err(ReportError::Xlsx(format!(
            "Row {n_idx_row} of sheet {:?} has {} cells; expected {n_width}.",
            layout.sheet_name,
            row.len()
        )));
    }

    let l_columns = layout
        .columns
        .iter()
        .enumerate()
        .map(|(n_idx_col, col_layout)| -> Result<Column, ReportError> {
            let c_name = col_layout.header.into();
            match col_layout.kind {
                EnumColumnKind::Integer => Ok(Column::new(
                    c_name,
                    collect_integer_values(layout, n_idx_col, rows)?,
                )),
                EnumColumnKind::Text | EnumColumnKind::IntegerOrText => {
                    let l_values: Vec<String> =
                        rows.iter().map(|row| row[n_idx_col].to_string()).collect();
                    Ok(Column::new(c_name, l_values))
                }
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DataFrame::new(l_columns)?)
}

/// A sheet ready to hand to the writer.
pub struct SpecSheetTable {
    pub layout: SpecSheetLayout,
    pub frame: DataFrame,
}

/// Build all sheets in workbook order.
pub fn build_report_sheets(
    data: &SystemData,
    ctx: &SpecRenderContext,
    include_user_activity: bool,
) -> Result<Vec<SpecSheetTable>, ReportError> {
    let l_rows_records: Vec<_> = data
        .requests
        .iter()
        .map(|request| derive_borrowing_record_row(request, ctx))
        .collect();

    let l_rows_inventory: Vec<_> = data.components.iter().map(derive_inventory_row).collect();

    let dict_components: BTreeMap<&str, &Component> = data
        .components
        .iter()
        .map(|component| (component.id.as_str(), component))
        .collect();
    let l_rows_borrowed: Vec<_> = data
        .requests_with_status(EnumRequestStatus::Approved)
        .map(|request| derive_currently_borrowed_row(request, &dict_components, ctx))
        .collect();

    let mut l_sheets = vec![
        SpecSheetTable {
            layout: LAYOUT_BORROWING_RECORDS,
            frame: assemble_sheet_frame(&LAYOUT_BORROWING_RECORDS, &l_rows_records)?,
        },
        SpecSheetTable {
            layout: LAYOUT_INVENTORY,
            frame: assemble_sheet_frame(&LAYOUT_INVENTORY, &l_rows_inventory)?,
        },
        SpecSheetTable {
            layout: LAYOUT_CURRENTLY_BORROWED,
            frame: assemble_sheet_frame(&LAYOUT_CURRENTLY_BORROWED, &l_rows_borrowed)?,
        },
    ];

    if include_user_activity {
        let l_rows_users: Vec<_> = data
            .users
            .iter()
            .map(|user| derive_user_activity_row(user, &data.sessions, &data.requests, ctx))
            .collect();
        l_sheets.push(SpecSheetTable {
            layout: LAYOUT_USER_ACTIVITY,
            frame: assemble_sheet_frame(&LAYOUT_USER_ACTIVITY, &l_rows_users)?,
        });
    }

    Ok(l_sheets)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, FixedOffset, Utc};

    use super::*;

    fn create_ctx() -> SpecRenderContext {
        SpecRenderContext {
            now: DateTime::parse_from_rfc3339("2026-10-16T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            offset: FixedOffset::east_opt(0).unwrap(),
            date_format: "%-m/%-d/%Y".to_string(),
        }
    }

    fn create_request(status: EnumRequestStatus, due_date: &str) -> BorrowRequest {
        BorrowRequest {
            id: "req-1".to_string(),
            student_id: "student-1".to_string(),
            student_name: "Ada Lovelace".to_string(),
            roll_no: "CS-01".to_string(),
            mobile: "5550100".to_string(),
            component_id: "c-1".to_string(),
            component_name: "Arduino Uno".to_string(),
            quantity: 2,
            request_date: "2026-10-01T09:30:00.000Z".to_string(),
            due_date: due_date.to_string(),
            status,
            approved_by: None,
            approved_at: None,
            returned_at: None,
        }
    }

    fn create_component(available: i64, total: i64, description: Option<&str>) -> Component {
        Component {
            id: "c-1".to_string(),
            name: "Arduino Uno".to_string(),
            category: "Microcontrollers".to_string(),
            description: description.map(str::to_string),
            total_quantity: total,
            available_quantity: available,
        }
    }

    fn cell<'a>(layout: &SpecSheetLayout, row: &'a [EnumRowCell], header: &str) -> &'a EnumRowCell {
        &row[layout.position(header).unwrap()]
    }

    #[test]
    fn borrowing_row_for_approved_request() {
        let ctx = create_ctx();
        let mut request = create_request(EnumRequestStatus::Approved, "2026-10-20");
        request.approved_by = Some("Staff".to_string());
        let row = derive_borrowing_record_row(&request, &ctx);
        let layout = &LAYOUT_BORROWING_RECORDS;

        assert_eq!(row.len(), layout.columns.len());
        assert_eq!(cell(layout, &row, "Status"), &EnumRowCell::text("APPROVED"));
        assert_eq!(cell(layout, &row, "Days Remaining"), &EnumRowCell::Integer(4));
        assert_eq!(cell(layout, &row, "Borrowed Date"), &EnumRowCell::text("10/1/2026"));
        assert_eq!(cell(layout, &row, "Due Date"), &EnumRowCell::text("10/20/2026"));
        assert_eq!(cell(layout, &row, "Approved By"), &EnumRowCell::text("Staff"));
        assert_eq!(cell(layout, &row, "Return Date"), &EnumRowCell::text("Not Returned"));
    }

    #[test]
    fn borrowing_row_overdue_is_negative_integer() {
        let ctx = create_ctx();
        let yesterday = (ctx.now - Duration::days(1)).to_rfc3339();
        let row = derive_borrowing_record_row(
            &create_request(EnumRequestStatus::Approved, &yesterday),
            &ctx,
        );
        match cell(&LAYOUT_BORROWING_RECORDS, &row, "Days Remaining") {
            EnumRowCell::Integer(n_days) => assert!(*n_days < 0),
            other => panic!("expected integer, got {other:?}"),
        }
    }

    #[test]
    fn borrowing_row_placeholders() {
        let ctx = create_ctx();
        let layout = &LAYOUT_BORROWING_RECORDS;

        let mut request = create_request(EnumRequestStatus::Returned, "2026-10-10");
        request.approved_by = Some(String::new());
        request.returned_at = Some("2026-10-09T15:00:00Z".to_string());
        let row = derive_borrowing_record_row(&request, &ctx);
        assert_eq!(cell(layout, &row, "Days Remaining"), &EnumRowCell::text("N/A"));
        assert_eq!(cell(layout, &row, "Approved By"), &EnumRowCell::text("N/A"));
        assert_eq!(cell(layout, &row, "Return Date"), &EnumRowCell::text("10/9/2026"));
        assert_eq!(cell(layout, &row, "Status"), &EnumRowCell::text("RETURNED"));

        let row = derive_borrowing_record_row(
            &create_request(EnumRequestStatus::Approved, "not a date"),
            &ctx,
        );
        assert_eq!(cell(layout, &row, "Days Remaining"), &EnumRowCell::text("NaN"));
        assert_eq!(cell(layout, &row, "Due Date"), &EnumRowCell::text("Invalid Date"));

        let row = derive_borrowing_record_row(
            &create_request(EnumRequestStatus::Pending, "2026-10-20"),
            &ctx,
        );
        assert_eq!(cell(layout, &row, "Days Remaining"), &EnumRowCell::text("N/A"));
    }

    #[test]
    fn inventory_rows_follow_thresholds() {
        let layout = &LAYOUT_INVENTORY;
        for (n_available, c_expected) in [
            (0, "OUT OF STOCK"),
            (1, "LOW STOCK"),
            (4, "MEDIUM STOCK"),
            (8, "GOOD STOCK"),
        ] {
            let row = derive_inventory_row(&create_component(n_available, 10, None));
            assert_eq!(cell(layout, &row, "Stock Status"), &EnumRowCell::text(c_expected));
            assert_eq!(
                cell(layout, &row, "Currently Borrowed"),
                &EnumRowCell::Integer(10 - n_available)
            );
        }
    }

    #[test]
    fn inventory_row_description_default_and_zero_total() {
        let layout = &LAYOUT_INVENTORY;
        let row = derive_inventory_row(&create_component(0, 0, Some("")));
        assert_eq!(
            cell(layout, &row, "Description"),
            &EnumRowCell::text("Standard lab component")
        );
        assert_eq!(cell(layout, &row, "Stock Status"), &EnumRowCell::text("OUT OF STOCK"));

        let row = derive_inventory_row(&create_component(3, 5, Some("5V logic")));
        assert_eq!(cell(layout, &row, "Description"), &EnumRowCell::text("5V logic"));
        let row = derive_inventory_row(&create_component(3, 5, Some("  ")));
        assert_eq!(cell(layout, &row, "Description"), &EnumRowCell::text("  "));
    }

    #[test]
    fn whitespace_values_are_kept_verbatim() {
        let ctx = create_ctx();
        let mut request = create_request(EnumRequestStatus::Approved, "2026-10-20");
        request.approved_by = Some(" ".to_string());
        let row = derive_borrowing_record_row(&request, &ctx);
        assert_eq!(
            cell(&LAYOUT_BORROWING_RECORDS, &row, "Approved By"),
            &EnumRowCell::text(" ")
        );
    }

    #[test]
    fn currently_borrowed_row_looks_up_category() {
        let ctx = create_ctx();
        let component = create_component(8, 10, None);
        let dict_components = BTreeMap::from([("c-1", &component)]);
        let layout = &LAYOUT_CURRENTLY_BORROWED;

        let past_due = create_request(EnumRequestStatus::Approved, "2026-10-10");
        let row = derive_currently_borrowed_row(&past_due, &dict_components, &ctx);
        assert_eq!(cell(layout, &row, "Category"), &EnumRowCell::text("Microcontrollers"));
        assert_eq!(cell(layout, &row, "Overdue"), &EnumRowCell::text("YES"));

        let mut orphan = create_request(EnumRequestStatus::Approved, "2026-10-30");
        orphan.component_id = "c-404".to_string();
        let row = derive_currently_borrowed_row(&orphan, &dict_components, &ctx);
        assert_eq!(cell(layout, &row, "Category"), &EnumRowCell::text("Unknown"));
        assert_eq!(cell(layout, &row, "Overdue"), &EnumRowCell::text("NO"));
    }

    #[test]
    fn assemble_frame_types_columns() {
        let ctx = create_ctx();
        let rows = vec![derive_borrowing_record_row(
            &create_request(EnumRequestStatus::Approved, "2026-10-20"),
            &ctx,
        )];
        let df = assemble_sheet_frame(&LAYOUT_BORROWING_RECORDS, &rows).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.get_column_names_str(), LAYOUT_BORROWING_RECORDS.headers());
        let columns = df.get_columns();
        assert!(columns[5].dtype().is_integer());
        assert!(!columns[9].dtype().is_numeric());
    }

    #[test]
    fn assemble_frame_rejects_text_in_integer_column() {
        let mut row = derive_inventory_row(&create_component(3, 5, None));
        let n_idx_total = LAYOUT_INVENTORY.position("Total Stock").unwrap();
        row[n_idx_total] = EnumRowCell::text("5");

        let err = assemble_sheet_frame(&LAYOUT_INVENTORY, &[row]).unwrap_err();
        assert!(matches!(err, ReportError::Xlsx(_)));
        assert!(err.to_string().contains("Total Stock"));
    }

    #[test]
    fn assemble_frame_rejects_ragged_rows() {
        let rows = vec![vec![EnumRowCell::text("only one")]];
        assert!(assemble_sheet_frame(&LAYOUT_INVENTORY, &rows).is_err());
    }

    #[test]
    fn empty_snapshot_gives_header_only_sheets() {
        let l_sheets = build_report_sheets(&SystemData::default(), &create_ctx(), true).unwrap();
        let l_names: Vec<_> = l_sheets.iter().map(|s| s.layout.sheet_name).collect();
        assert_eq!(
            l_names,
            vec![
                "Borrowing Records",
                "Inventory",
                "Currently Borrowed",
                "User Activity Report"
            ]
        );
        assert!(l_sheets.iter().all(|s| s.frame.height() == 0));
        assert!(
            l_sheets
                .iter()
                .all(|s| s.frame.width() == s.layout.columns.len())
        );
    }
}
