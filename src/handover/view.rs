use crate::model::employee::{EmployeeSnapshot, EmployeeSummary};
use crate::model::handover::{HandoverView, LeaveHandover};
use crate::model::leave_request::LeaveSnapshot;

/// Joins a raw handover with the snapshots it references.
/// Missing snapshots (deleted leave or employee) come out as `None`.
pub fn enrich(
    handover: &LeaveHandover,
    leave: Option<&LeaveSnapshot>,
    from: Option<&EmployeeSnapshot>,
    to: Option<&EmployeeSnapshot>,
) -> HandoverView {
    HandoverView {
        id: handover.id,
        leave_id: handover.leave_id,
        leave_start: leave.map(|l| l.range.start),
        leave_end: leave.map(|l| l.range.end),
        from_employee_id: handover.from_employee_id,
        to_employee_id: handover.to_employee_id,
        from_employee: from.map(EmployeeSummary::from),
        to_employee: to.map(EmployeeSummary::from),
        notes: handover.notes.clone(),
        status: handover.status,
        is_admin_initiated: handover.is_admin_initiated,
        created_at: handover.created_at,
        updated_at: handover.updated_at,
    }
}

/// Newest first; ties on the creation instant fall back to the higher id.
pub fn sort_newest_first(handovers: &mut [LeaveHandover]) {
    handovers.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
