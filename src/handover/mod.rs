//! Leave handover coordination.
//!
//! The coordinator never talks to the database directly. It reads leaves and
//! employees through [`LeaveLookup`] / [`EmployeeLookup`] and persists through
//! [`HandoverStore`], all of which hand back plain value snapshots.

pub mod coordinator;
pub mod view;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::employee::EmployeeSnapshot;
use crate::model::handover::{HandoverStatus, LeaveHandover, NewHandover};
use crate::model::leave_request::{DateRange, LeaveSnapshot};

pub use coordinator::{HandoverCoordinator, HandoverRequest};

#[async_trait]
pub trait LeaveLookup: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveSnapshot>>;

    /// Every approved leave of the employee, in no particular order.
    async fn find_approved_by_employee(&self, employee_id: u64) -> Result<Vec<LeaveSnapshot>>;
}

#[async_trait]
pub trait EmployeeLookup: Send + Sync {
    async fn exists(&self, id: u64) -> Result<bool>;

    async fn find_by_id(&self, id: u64) -> Result<Option<EmployeeSnapshot>>;
}

#[async_trait]
pub trait HandoverStore: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveHandover>>;

    /// Pending and accepted handovers where the employee is the recipient.
    async fn find_by_recipient_and_open_status(
        &self,
        to_employee_id: u64,
    ) -> Result<Vec<LeaveHandover>>;

    /// Handovers where the employee is either the delegating or the receiving side.
    async fn find_by_employee(&self, employee_id: u64) -> Result<Vec<LeaveHandover>>;

    async fn find_all(&self) -> Result<Vec<LeaveHandover>>;

    /// Inserts the handover atomically with a fresh check that the recipient holds
    /// no open handover whose leave overlaps `window`. Fails with
    /// [`HandoverError::Conflict`](crate::error::HandoverError::Conflict) otherwise.
    async fn save(&self, handover: NewHandover, window: DateRange) -> Result<LeaveHandover>;

    /// Moves a pending, non-admin handover to `status`. Returns `false` when no
    /// such record was in a state that allows the transition.
    async fn update_status(
        &self,
        id: u64,
        status: HandoverStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;
}
