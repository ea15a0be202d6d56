use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::employee::EmployeeSummary;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HandoverStatus {
    Pending,
    Accepted,
    Rejected,
}

impl HandoverStatus {
    /// Pending and accepted handovers still hold the recipient for the leave window.
    pub fn is_open(&self) -> bool {
        matches!(self, HandoverStatus::Pending | HandoverStatus::Accepted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 7,
    "leave_id": 12,
    "from_employee_id": 1000,
    "to_employee_id": 1001,
    "notes": "Cover the weekly payroll export and vendor calls",
    "status": "pending",
    "is_admin_initiated": false,
    "created_at": "2026-01-01T09:00:00Z",
    "updated_at": "2026-01-01T09:00:00Z"
}))]
pub struct LeaveHandover {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = 12)]
    pub leave_id: u64,
    /// employee going on leave
    #[schema(example = 1000)]
    pub from_employee_id: u64,
    /// employee covering the leave
    #[schema(example = 1001)]
    pub to_employee_id: u64,
    pub notes: String,
    pub status: HandoverStatus,
    pub is_admin_initiated: bool,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

/// A validated handover that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewHandover {
    pub leave_id: u64,
    pub from_employee_id: u64,
    pub to_employee_id: u64,
    pub notes: String,
    pub status: HandoverStatus,
    pub is_admin_initiated: bool,
    pub created_at: DateTime<Utc>,
}

impl NewHandover {
    pub fn into_handover(self, id: u64) -> LeaveHandover {
        LeaveHandover {
            id,
            leave_id: self.leave_id,
            from_employee_id: self.from_employee_id,
            to_employee_id: self.to_employee_id,
            notes: self.notes,
            status: self.status,
            is_admin_initiated: self.is_admin_initiated,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Handover joined with its leave window and both participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HandoverView {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = 12)]
    pub leave_id: u64,
    /// null when the leave request no longer exists
    #[schema(example = "2026-01-10", format = "date", value_type = Option<String>)]
    pub leave_start: Option<NaiveDate>,
    #[schema(example = "2026-01-15", format = "date", value_type = Option<String>)]
    pub leave_end: Option<NaiveDate>,
    #[schema(example = 1000)]
    pub from_employee_id: u64,
    #[schema(example = 1001)]
    pub to_employee_id: u64,
    /// null when the employee record no longer exists
    pub from_employee: Option<EmployeeSummary>,
    pub to_employee: Option<EmployeeSummary>,
    pub notes: String,
    pub status: HandoverStatus,
    pub is_admin_initiated: bool,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}
