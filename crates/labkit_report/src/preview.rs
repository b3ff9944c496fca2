//! On-screen preview of what the export will contain.

use serde::Serialize;

use crate::conf::N_PREVIEW_RECORDS_MAX;
use crate::model::{BorrowRequest, Component, EnumRequestStatus, SystemData};

/// Headline counts shown above the preview tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecPreviewSummary {
    pub total_borrowing_records: usize,
    /// Requests with status `approved`.
    pub currently_borrowed: usize,
    /// Requests with status `returned`.
    pub total_returned: usize,
    pub total_components: usize,
}

/// Preview borrowing from the snapshot it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecReportPreview<'a> {
    pub summary: SpecPreviewSummary,
    /// First records in snapshot order, at most [`N_PREVIEW_RECORDS_MAX`].
    pub borrowing_records: &'a [BorrowRequest],
    pub inventory: &'a [Component],
}

pub fn generate_preview_data(data: &SystemData) -> SpecReportPreview<'_> {
    let n_records_preview = data.requests.len().min(N_PREVIEW_RECORDS_MAX);
    SpecReportPreview {
        summary: SpecPreviewSummary {
            total_borrowing_records: data.requests.len(),
            currently_borrowed: data.requests_with_status(EnumRequestStatus::Approved).count(),
            total_returned: data.requests_with_status(EnumRequestStatus::Returned).count(),
            total_components: data.components.len(),
        },
        borrowing_records: &data.requests[..n_records_preview],
        inventory: &data.components,
    }
}
