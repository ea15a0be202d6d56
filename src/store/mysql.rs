use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use crate::error::{EMPLOYEE_ALREADY_BOOKED, HandoverError, Result};
use crate::handover::{EmployeeLookup, HandoverStore, LeaveLookup};
use crate::model::employee::EmployeeSnapshot;
use crate::model::handover::{HandoverStatus, LeaveHandover, NewHandover};
use crate::model::leave_request::{DateRange, LeaveSnapshot, LeaveStatus};

const HANDOVER_COLUMNS: &str = r#"
    id, leave_id, from_employee_id, to_employee_id, notes,
    status, is_admin_initiated, created_at, updated_at
"#;

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: Option<String>,
}

impl TryFrom<LeaveRow> for LeaveSnapshot {
    type Error = HandoverError;

    fn try_from(row: LeaveRow) -> Result<Self> {
        // rows inserted without a status default to pending
        let status = match row.status.as_deref() {
            None => LeaveStatus::Pending,
            Some(s) => s.parse().map_err(|_| {
                HandoverError::Unavailable(format!("leave {} has unknown status '{}'", row.id, s))
            })?,
        };

        Ok(LeaveSnapshot {
            id: row.id,
            employee_id: row.employee_id,
            status,
            range: DateRange::new(row.start_date, row.end_date),
        })
    }
}

#[derive(FromRow)]
struct HandoverRow {
    id: u64,
    leave_id: u64,
    from_employee_id: u64,
    to_employee_id: u64,
    notes: String,
    status: String,
    is_admin_initiated: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<HandoverRow> for LeaveHandover {
    type Error = HandoverError;

    fn try_from(row: HandoverRow) -> Result<Self> {
        let status = row.status.parse().map_err(|_| {
            HandoverError::Unavailable(format!(
                "handover {} has unknown status '{}'",
                row.id, row.status
            ))
        })?;

        Ok(LeaveHandover {
            id: row.id,
            leave_id: row.leave_id,
            from_employee_id: row.from_employee_id,
            to_employee_id: row.to_employee_id,
            notes: row.notes,
            status,
            is_admin_initiated: row.is_admin_initiated,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_handovers(rows: Vec<HandoverRow>) -> Result<Vec<LeaveHandover>> {
    rows.into_iter().map(LeaveHandover::try_from).collect()
}

/// Reads `leave_requests` and `employees`, owns `leave_handovers`.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveLookup for MySqlStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveSnapshot>> {
        let row = sqlx::query_as::<_, LeaveRow>(
            r#"
            SELECT id, employee_id, start_date, end_date, status
            FROM leave_requests
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LeaveSnapshot::try_from).transpose()
    }

    async fn find_approved_by_employee(&self, employee_id: u64) -> Result<Vec<LeaveSnapshot>> {
        let rows = sqlx::query_as::<_, LeaveRow>(
            r#"
            SELECT id, employee_id, start_date, end_date, status
            FROM leave_requests
            WHERE employee_id = ?
            AND status = 'approved'
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LeaveSnapshot::try_from).collect()
    }
}

#[async_trait]
impl EmployeeLookup for MySqlStore {
    async fn exists(&self, id: u64) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ? LIMIT 1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists > 0)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<EmployeeSnapshot>> {
        let employee = sqlx::query_as::<_, EmployeeSnapshot>(
            r#"
            SELECT id, employee_code, first_name, last_name
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }
}

#[async_trait]
impl HandoverStore for MySqlStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveHandover>> {
        let sql = format!("SELECT {} FROM leave_handovers WHERE id = ?", HANDOVER_COLUMNS);
        let row = sqlx::query_as::<_, HandoverRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(LeaveHandover::try_from).transpose()
    }

    async fn find_by_recipient_and_open_status(
        &self,
        to_employee_id: u64,
    ) -> Result<Vec<LeaveHandover>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM leave_handovers
            WHERE to_employee_id = ?
            AND status IN ('pending', 'accepted')
            "#,
            HANDOVER_COLUMNS
        );
        let rows = sqlx::query_as::<_, HandoverRow>(&sql)
            .bind(to_employee_id)
            .fetch_all(&self.pool)
            .await?;

        into_handovers(rows)
    }

    async fn find_by_employee(&self, employee_id: u64) -> Result<Vec<LeaveHandover>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM leave_handovers
            WHERE from_employee_id = ? OR to_employee_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
            HANDOVER_COLUMNS
        );
        let rows = sqlx::query_as::<_, HandoverRow>(&sql)
            .bind(employee_id)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;

        into_handovers(rows)
    }

    async fn find_all(&self) -> Result<Vec<LeaveHandover>> {
        let sql = format!(
            "SELECT {} FROM leave_handovers ORDER BY created_at DESC, id DESC",
            HANDOVER_COLUMNS
        );
        let rows = sqlx::query_as::<_, HandoverRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        into_handovers(rows)
    }

    async fn save(&self, handover: NewHandover, window: DateRange) -> Result<LeaveHandover> {
        let mut tx = self.pool.begin().await?;

        // Both participants are locked in id order. The recipient lock serializes
        // bookings of that employee, and holding the delegator's row up front keeps the
        // insert's foreign key checks from waiting on a crossed booking (A->B vs B->A).
        let locked = sqlx::query_scalar::<_, u64>(
            "SELECT id FROM employees WHERE id IN (?, ?) ORDER BY id FOR UPDATE",
        )
        .bind(handover.from_employee_id)
        .bind(handover.to_employee_id)
        .fetch_all(&mut *tx)
        .await?;
        if !locked.contains(&handover.to_employee_id)
            || !locked.contains(&handover.from_employee_id)
        {
            return Err(HandoverError::not_found("employee not found"));
        }

        let clashes = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM leave_handovers h
            JOIN leave_requests l ON l.id = h.leave_id
            WHERE h.to_employee_id = ?
            AND h.status IN ('pending', 'accepted')
            AND l.start_date <= ?
            AND l.end_date >= ?
            "#,
        )
        .bind(handover.to_employee_id)
        .bind(window.end)
        .bind(window.start)
        .fetch_one(&mut *tx)
        .await?;

        if clashes > 0 {
            debug!(
                to_employee_id = handover.to_employee_id,
                clashes, "Booking lost to a concurrent handover"
            );
            return Err(HandoverError::conflict(EMPLOYEE_ALREADY_BOOKED));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO leave_handovers
                (leave_id, from_employee_id, to_employee_id, notes,
                 status, is_admin_initiated, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(handover.leave_id)
        .bind(handover.from_employee_id)
        .bind(handover.to_employee_id)
        .bind(&handover.notes)
        .bind(handover.status.as_ref())
        .bind(handover.is_admin_initiated)
        .bind(handover.created_at)
        .bind(handover.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(handover.into_handover(result.last_insert_id()))
    }

    async fn update_status(
        &self,
        id: u64,
        status: HandoverStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE leave_handovers
            SET status = ?, updated_at = ?
            WHERE id = ?
            AND status = 'pending'
            AND is_admin_initiated = FALSE
            "#,
        )
        .bind(status.as_ref())
        .bind(updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
