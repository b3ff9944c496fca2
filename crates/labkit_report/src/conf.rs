//! Report constants and fixed sheet layouts.

use crate::spec::EnumColumnKind::{self, Integer, IntegerOrText, Text};
use crate::spec::{SpecColumnLayout, SpecSheetLayout};

/// Application name used in the report file name.
pub const C_APP_NAME_DEFAULT: &str = "Isaac-Asimov-Lab";
/// Calendar-date rendering (`M/D/YYYY`).
pub const C_DATE_FORMAT_DEFAULT: &str = "%-m/%-d/%Y";

/// Milliseconds in one day; the divisor for all day counts.
pub const N_MS_PER_DAY: i64 = 86_400_000;
/// Requests included in the preview record list.
pub const N_PREVIEW_RECORDS_MAX: usize = 10;

/// Stock below this percentage is `LOW STOCK`.
pub const N_PCT_STOCK_LOW: f64 = 20.0;
/// Stock below this percentage is `MEDIUM STOCK`.
pub const N_PCT_STOCK_MEDIUM: f64 = 50.0;

pub const C_PLACEHOLDER_NA: &str = "N/A";
pub const C_PLACEHOLDER_NAN: &str = "NaN";
pub const C_PLACEHOLDER_NOT_RETURNED: &str = "Not Returned";
pub const C_PLACEHOLDER_DESCRIPTION: &str = "Standard lab component";
pub const C_PLACEHOLDER_INVALID_DATE: &str = "Invalid Date";
pub const C_PLACEHOLDER_UNKNOWN: &str = "Unknown";
pub const C_PLACEHOLDER_NEVER: &str = "Never";
pub const C_PLACEHOLDER_NEVER_LOGGED_IN: &str = "Never logged in";

/// Header font color shared by every sheet.
pub const C_COLOR_HEADER_FONT: &str = "#FFFFFF";

const fn col(header: &'static str, width: f64, kind: EnumColumnKind) -> SpecColumnLayout {
    SpecColumnLayout {
        header,
        width,
        kind,
    }
}

pub const LAYOUT_BORROWING_RECORDS: SpecSheetLayout = SpecSheetLayout {
    sheet_name: "Borrowing Records",
    color_header: "#FF9800",
    columns: &[
        col("Record ID", 15.0, Text),
        col("Student Name", 20.0, Text),
        col("Roll Number", 15.0, Text),
        col("Mobile Number", 15.0, Text),
        col("Component Name", 25.0, Text),
        col("Quantity", 10.0, Integer),
        col("Borrowed Date", 15.0, Text),
        col("Due Date", 15.0, Text),
        col("Status", 15.0, Text),
        col("Days Remaining", 15.0, IntegerOrText),
        col("Approved By", 15.0, Text),
        col("Return Date", 15.0, Text),
    ],
};

pub const LAYOUT_INVENTORY: SpecSheetLayout = SpecSheetLayout {
    sheet_name: "Inventory",
    color_header: "#795548",
    columns: &[
        col("Component Name", 25.0, Text),
        col("Category", 18.0, Text),
        col("Total Stock", 15.0, Integer),
        col("Available Stock", 15.0, Integer),
        col("Currently Borrowed", 18.0, Integer),
        col("Stock Status", 18.0, Text),
        col("Description", 30.0, Text),
    ],
};

pub const LAYOUT_CURRENTLY_BORROWED: SpecSheetLayout = SpecSheetLayout {
    sheet_name: "Currently Borrowed",
    color_header: "#4CAF50",
    columns: &[
        col("Record ID", 15.0, Text),
        col("Student Name", 20.0, Text),
        col("Roll Number", 15.0, Text),
        col("Mobile Number", 15.0, Text),
        col("Component Name", 25.0, Text),
        col("Category", 18.0, Text),
        col("Quantity", 10.0, Integer),
        col("Borrowed Date", 15.0, Text),
        col("Due Date", 15.0, Text),
        col("Days Remaining", 15.0, IntegerOrText),
        col("Overdue", 10.0, Text),
    ],
};

pub const LAYOUT_USER_ACTIVITY: SpecSheetLayout = SpecSheetLayout {
    sheet_name: "User Activity Report",
    color_header: "#3F51B5",
    columns: &[
        col("User ID", 15.0, Text),
        col("Full Name", 25.0, Text),
        col("Email Address", 30.0, Text),
        col("User Role", 12.0, Text),
        col("Registration Date", 15.0, Text),
        col("Last Login Date", 15.0, Text),
        col("Total Login Count", 15.0, Integer),
        col("Account Status", 15.0, Text),
        col("Activity Level", 15.0, Text),
        col("Days Since Last Login", 18.0, IntegerOrText),
        col("Account Age (Days)", 15.0, IntegerOrText),
        col("Engagement Score", 15.0, Text),
        col("Total Session Time (Hours)", 20.0, Text),
        col("Average Session Duration", 20.0, Text),
        col("Peak Activity Day", 15.0, Text),
        col("Preferred Login Time", 18.0, Text),
        col("Device Usage", 15.0, Text),
        col("Components Borrowed", 18.0, Integer),
        col("Active Requests", 15.0, Integer),
        col("Completed Returns", 18.0, Integer),
        col("Success Rate (%)", 15.0, Text),
    ],
};
