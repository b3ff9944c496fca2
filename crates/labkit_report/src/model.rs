//! Lending-system records as stored by the dashboard (camelCase JSON).

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::spec::{EnumStockStatus, ReportError};
use crate::util::{classify_stock_status, derive_stock_percentage};

/// Lifecycle status of a borrow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumRequestStatus {
    Pending,
    Approved,
    Returned,
    Rejected,
}

impl EnumRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Returned => "returned",
            Self::Rejected => "rejected",
        }
    }

    /// Upper-cased form used in report cells.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Returned => "RETURNED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for EnumRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inventory item. `available_quantity` is expected to stay within `0..=total_quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub total_quantity: i64,
    pub available_quantity: i64,
}

impl Component {
    /// Units currently out on loan; saturates on malformed quantities.
    pub fn borrowed_quantity(&self) -> i64 {
        self.total_quantity.saturating_sub(self.available_quantity)
    }

    /// Available share of total stock in percent; NaN when both are zero.
    pub fn stock_percentage(&self) -> f64 {
        derive_stock_percentage(self.available_quantity, self.total_quantity)
    }

    pub fn stock_status(&self) -> EnumStockStatus {
        classify_stock_status(self.available_quantity, self.total_quantity)
    }
}

/// One borrow transaction.
///
/// Timestamps stay as the raw strings held by the store and are parsed when
/// rendered, so a malformed value shows up in the report instead of failing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub roll_no: String,
    pub mobile: String,
    pub component_id: String,
    pub component_name: String,
    pub quantity: i64,
    pub request_date: String,
    pub due_date: String,
    pub status: EnumRequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returned_at: Option<String>,
}

/// Dashboard account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub registered_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_count: Option<i64>,
    #[serde(default)]
    pub is_active: bool,
}

/// One login of a [`User`]. `session_duration` is in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSession {
    pub id: String,
    pub user_id: String,
    pub login_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logout_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<String>,
}

/// Read-only snapshot handed to the exporter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemData {
    #[serde(default)]
    pub requests: Vec<BorrowRequest>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub sessions: Vec<LoginSession>,
}

impl SystemData {
    pub fn from_json_str(txt: &str) -> Result<Self, ReportError> {
        Ok(serde_json::from_str(txt)?)
    }

    /// Load a snapshot exported from the dashboard store.
    pub fn load_from_path(path: &Path) -> Result<Self, ReportError> {
        let txt = fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&txt)
    }

    /// Requests with the given status, in snapshot order.
    pub fn requests_with_status(
        &self,
        status: EnumRequestStatus,
    ) -> impl Iterator<Item = &BorrowRequest> {
        self.requests.iter().filter(move |r| r.status == status)
    }

    pub fn find_component(&self, component_id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == component_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const C_SNAPSHOT: &str = r#"{
        "requests": [{
            "id": "req-1",
            "studentId": "student-1",
            "studentName": "Ada",
            "rollNo": "CS-01",
            "mobile": "5550100",
            "componentId": "c-1",
            "componentName": "Arduino Uno",
            "quantity": 2,
            "requestDate": "2026-10-01T09:30:00.000Z",
            "dueDate": "2026-10-20",
            "status": "approved",
            "approvedBy": "Staff"
        }],
        "components": [{
            "id": "c-1",
            "name": "Arduino Uno",
            "category": "Microcontrollers",
            "totalQuantity": 10,
            "availableQuantity": 8
        }]
    }"#;

    #[test]
    fn snapshot_decodes_camel_case_and_defaults() {
        let data = SystemData::from_json_str(C_SNAPSHOT).unwrap();
        assert_eq!(data.requests.len(), 1);
        assert!(data.users.is_empty());
        assert!(data.sessions.is_empty());

        let request = &data.requests[0];
        assert_eq!(request.status, EnumRequestStatus::Approved);
        assert_eq!(request.roll_no, "CS-01");
        assert_eq!(request.returned_at, None);

        let component = data.find_component("c-1").unwrap();
        assert_eq!(component.description, None);
        assert_eq!(component.borrowed_quantity(), 2);
        assert_eq!(component.stock_status(), EnumStockStatus::Good);
    }

    #[test]
    fn snapshot_rejects_unknown_status() {
        let txt = C_SNAPSHOT.replace("\"approved\"", "\"lost\"");
        assert!(matches!(
            SystemData::from_json_str(&txt),
            Err(ReportError::Snapshot(_))
        ));
    }

    #[test]
    fn load_from_missing_path_reports_io_error() {
        let err = SystemData::load_from_path(Path::new("/nonexistent/snapshot.json")).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }

    #[test]
    fn borrowed_quantity_saturates_on_extreme_values() {
        let mut component = SystemData::from_json_str(C_SNAPSHOT).unwrap().components[0].clone();
        component.total_quantity = 0;
        component.available_quantity = i64::MIN;
        assert_eq!(component.borrowed_quantity(), i64::MAX);

        component.total_quantity = i64::MIN;
        component.available_quantity = 1;
        assert_eq!(component.borrowed_quantity(), i64::MIN);

        component.total_quantity = 0;
        component.available_quantity = 3;
        assert_eq!(component.borrowed_quantity(), -3);
    }

    #[test]
    fn status_labels() {
        assert_eq!(EnumRequestStatus::Returned.label(), "RETURNED");
        assert_eq!(EnumRequestStatus::Pending.to_string(), "pending");
    }

    #[test]
    fn requests_serialize_back_to_camel_case() {
        let data = SystemData::from_json_str(C_SNAPSHOT).unwrap();
        let value = serde_json::to_value(&data.requests[0]).unwrap();
        assert_eq!(value["studentName"], "Ada");
        assert!(value.get("returnedAt").is_none());
    }
}
