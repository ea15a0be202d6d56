use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::error::{
    ADMIN_HANDOVER_IMMUTABLE, EMPLOYEE_ALREADY_BOOKED, EMPLOYEE_ON_LEAVE,
    HANDOVER_REQUIRES_APPROVED_LEAVE, HandoverError, Result,
};
use crate::handover::view::{enrich, sort_newest_first};
use crate::handover::{EmployeeLookup, HandoverStore, LeaveLookup};
use crate::model::employee::EmployeeSnapshot;
use crate::model::handover::{HandoverStatus, HandoverView, LeaveHandover, NewHandover};
use crate::model::leave_request::{DateRange, LeaveSnapshot, LeaveStatus};

/// Caller-supplied part of a new handover.
#[derive(Debug, Clone)]
pub struct HandoverRequest {
    pub leave_id: u64,
    pub from_employee_id: u64,
    pub to_employee_id: u64,
    pub notes: String,
}

pub struct HandoverCoordinator {
    leaves: Arc<dyn LeaveLookup>,
    employees: Arc<dyn EmployeeLookup>,
    store: Arc<dyn HandoverStore>,
}

impl HandoverCoordinator {
    pub fn new(
        leaves: Arc<dyn LeaveLookup>,
        employees: Arc<dyn EmployeeLookup>,
        store: Arc<dyn HandoverStore>,
    ) -> Self {
        Self {
            leaves,
            employees,
            store,
        }
    }

    /// Validates and persists a handover. Admin-initiated handovers start out
    /// `Accepted`; everything else starts `Pending` and waits for the recipient.
    #[instrument(
        name = "handover_create",
        skip(self, request),
        fields(
            leave_id = request.leave_id,
            from = request.from_employee_id,
            to = request.to_employee_id
        )
    )]
    pub async fn create_handover(
        &self,
        request: HandoverRequest,
        is_admin_initiated: bool,
    ) -> Result<LeaveHandover> {
        // 1️⃣ input shape
        if request.leave_id == 0 {
            return Err(HandoverError::invalid_input("invalid leave id"));
        }
        if request.to_employee_id == 0 || request.from_employee_id == 0 {
            return Err(HandoverError::invalid_input("invalid employee id"));
        }
        let notes = request.notes.trim();
        if notes.is_empty() {
            return Err(HandoverError::invalid_input("notes must not be empty"));
        }
        if request.from_employee_id == request.to_employee_id {
            return Err(HandoverError::invalid_input("cannot hand over to yourself"));
        }

        // 2️⃣ leave exists and 3️⃣ is approved
        let leave = self
            .leaves
            .find_by_id(request.leave_id)
            .await?
            .ok_or_else(|| HandoverError::not_found("leave request not found"))?;

        if leave.status != LeaveStatus::Approved {
            info!(status = %leave.status, "Rejected: leave not approved");
            return Err(HandoverError::invalid_state(HANDOVER_REQUIRES_APPROVED_LEAVE));
        }

        if leave.employee_id != request.from_employee_id {
            return Err(if is_admin_initiated {
                HandoverError::invalid_input("employee does not own this leave")
            } else {
                HandoverError::forbidden("handover only allowed for your own leave")
            });
        }

        if is_admin_initiated && !self.employees.exists(request.from_employee_id).await? {
            return Err(HandoverError::not_found("employee not found"));
        }
        if !self.employees.exists(request.to_employee_id).await? {
            return Err(HandoverError::not_found("employee not found"));
        }

        // 4️⃣ recipient must be at work, 5️⃣ and not already covering someone else
        self.ensure_recipient_available(request.to_employee_id, &leave.range)
            .await?;
        self.ensure_recipient_unbooked(request.to_employee_id, &leave.range)
            .await?;

        // 6️⃣ single write; the store re-checks bookings atomically
        let status = if is_admin_initiated {
            HandoverStatus::Accepted
        } else {
            HandoverStatus::Pending
        };
        let handover = self
            .store
            .save(
                NewHandover {
                    leave_id: leave.id,
                    from_employee_id: request.from_employee_id,
                    to_employee_id: request.to_employee_id,
                    notes: notes.to_string(),
                    status,
                    is_admin_initiated,
                    created_at: Utc::now(),
                },
                leave.range,
            )
            .await?;

        info!(handover_id = handover.id, status = %handover.status, "Handover created");
        Ok(handover)
    }

    /// Admin assignment on behalf of any employee; skips recipient consent.
    pub async fn create_admin_handover(&self, request: HandoverRequest) -> Result<LeaveHandover> {
        self.create_handover(request, true).await
    }

    /// Recipient's answer to a pending handover.
    #[instrument(name = "handover_update_status", skip(self))]
    pub async fn update_status(
        &self,
        handover_id: u64,
        new_status: HandoverStatus,
        caller_employee_id: u64,
    ) -> Result<LeaveHandover> {
        if new_status == HandoverStatus::Pending {
            return Err(HandoverError::invalid_input(
                "status must be accepted or rejected",
            ));
        }
        if handover_id == 0 {
            return Err(HandoverError::invalid_input("invalid handover id"));
        }

        let mut handover = self
            .store
            .find_by_id(handover_id)
            .await?
            .ok_or_else(|| HandoverError::not_found("handover not found"))?;

        if handover.to_employee_id != caller_employee_id {
            return Err(HandoverError::forbidden(
                "only the receiving employee can respond to this handover",
            ));
        }
        if handover.is_admin_initiated {
            return Err(HandoverError::invalid_state(ADMIN_HANDOVER_IMMUTABLE));
        }
        if handover.status != HandoverStatus::Pending {
            return Err(HandoverError::invalid_state("handover already responded to"));
        }

        let now = Utc::now();
        if !self.store.update_status(handover_id, new_status, now).await? {
            // someone else answered between our read and the write
            warn!("Handover left pending state concurrently");
            return Err(HandoverError::invalid_state("handover already responded to"));
        }

        handover.status = new_status;
        handover.updated_at = now;
        info!(status = %new_status, "Handover status updated");
        Ok(handover)
    }

    /// Handovers the employee gave or received, newest first.
    #[instrument(name = "handover_history", skip(self))]
    pub async fn get_history(&self, employee_id: u64) -> Result<Vec<HandoverView>> {
        let handovers = self.store.find_by_employee(employee_id).await?;
        self.assemble(handovers).await
    }

    /// Every handover, newest first. Callers must be authorized beforehand.
    #[instrument(name = "handover_all", skip(self))]
    pub async fn get_all(&self) -> Result<Vec<HandoverView>> {
        let handovers = self.store.find_all().await?;
        self.assemble(handovers).await
    }

    pub async fn get_handover(&self, handover_id: u64) -> Result<HandoverView> {
        let handover = self
            .store
            .find_by_id(handover_id)
            .await?
            .ok_or_else(|| HandoverError::not_found("handover not found"))?;

        let mut views = self.assemble(vec![handover]).await?;
        views
            .pop()
            .ok_or_else(|| HandoverError::not_found("handover not found"))
    }

    async fn ensure_recipient_available(&self, employee_id: u64, window: &DateRange) -> Result<()> {
        let leaves = self.leaves.find_approved_by_employee(employee_id).await?;

        if let Some(clash) = leaves
            .iter()
            .filter(|l| l.status == LeaveStatus::Approved)
            .find(|l| l.range.overlaps(window))
        {
            info!(clashing_leave = clash.id, "Rejected: recipient on leave");
            return Err(HandoverError::conflict(EMPLOYEE_ON_LEAVE));
        }
        Ok(())
    }

    async fn ensure_recipient_unbooked(&self, employee_id: u64, window: &DateRange) -> Result<()> {
        let open = self
            .store
            .find_by_recipient_and_open_status(employee_id)
            .await?;

        for existing in open.iter().filter(|h| h.status.is_open()) {
            match self.leaves.find_by_id(existing.leave_id).await? {
                Some(leave) if leave.range.overlaps(window) => {
                    info!(clashing_handover = existing.id, "Rejected: recipient already booked");
                    return Err(HandoverError::conflict(EMPLOYEE_ALREADY_BOOKED));
                }
                Some(_) => {}
                None => warn!(
                    handover_id = existing.id,
                    leave_id = existing.leave_id,
                    "Open handover references a missing leave"
                ),
            }
        }
        Ok(())
    }

    /// Orders the records and joins each with its leave and both employees.
    /// Lookups are memoized per call so shared references are fetched once.
    async fn assemble(&self, mut handovers: Vec<LeaveHandover>) -> Result<Vec<HandoverView>> {
        sort_newest_first(&mut handovers);

        let mut leaves: HashMap<u64, Option<LeaveSnapshot>> = HashMap::new();
        let mut employees: HashMap<u64, Option<EmployeeSnapshot>> = HashMap::new();

        for h in &handovers {
            if !leaves.contains_key(&h.leave_id) {
                let leave = self.leaves.find_by_id(h.leave_id).await?;
                leaves.insert(h.leave_id, leave);
            }
            for id in [h.from_employee_id, h.to_employee_id] {
                if !employees.contains_key(&id) {
                    let employee = self.employees.find_by_id(id).await?;
                    employees.insert(id, employee);
                }
            }
        }

        Ok(handovers
            .iter()
            .map(|h| {
                enrich(
                    h,
                    leaves.get(&h.leave_id).and_then(Option::as_ref),
                    employees.get(&h.from_employee_id).and_then(Option::as_ref),
                    employees.get(&h.to_employee_id).and_then(Option::as_ref),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::handover::NewHandover;
    use crate::store::memory::MemoryBackend;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate};
    use tokio::sync::Barrier;

    const ALICE: u64 = 1;
    const BOB: u64 = 2;
    const CAROL: u64 = 3;
    const DAVE: u64 = 4;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).unwrap()
    }

    /// Alice, Carol and Dave go on leave at various times; Bob is the usual cover.
    fn seeded() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        backend.add_employee(ALICE, "Alice", "Ames");
        backend.add_employee(BOB, "Bob", "Brown");
        backend.add_employee(CAROL, "Carol", "Cruz");
        backend.add_employee(DAVE, "Dave", "Diaz");

        backend.add_leave(10, ALICE, LeaveStatus::Approved, d(1, 10), d(1, 15));
        backend.add_leave(11, ALICE, LeaveStatus::Pending, d(1, 10), d(1, 15));
        backend.add_leave(12, ALICE, LeaveStatus::Rejected, d(1, 10), d(1, 15));
        backend.add_leave(13, CAROL, LeaveStatus::Approved, d(1, 15), d(1, 20));
        backend.add_leave(14, CAROL, LeaveStatus::Approved, d(1, 16), d(1, 20));

        backend.add_leave(15, BOB, LeaveStatus::Approved, d(2, 1), d(2, 3));
        backend.add_leave(16, ALICE, LeaveStatus::Approved, d(2, 3), d(2, 5));
        backend.add_leave(17, BOB, LeaveStatus::Pending, d(3, 1), d(3, 5));
        backend.add_leave(18, DAVE, LeaveStatus::Approved, d(3, 2), d(3, 4));

        backend.add_leave(20, ALICE, LeaveStatus::Approved, d(4, 1), d(4, 5));
        backend.add_leave(21, CAROL, LeaveStatus::Approved, d(4, 6), d(4, 10));
        backend
    }

    fn coordinator(backend: &Arc<MemoryBackend>) -> HandoverCoordinator {
        HandoverCoordinator::new(backend.clone(), backend.clone(), backend.clone())
    }

    fn request(leave_id: u64, from: u64, to: u64) -> HandoverRequest {
        HandoverRequest {
            leave_id,
            from_employee_id: from,
            to_employee_id: to,
            notes: "Cover the on-call rotation".into(),
        }
    }

    #[tokio::test]
    async fn creates_pending_handover() {
        let backend = seeded();
        let c = coordinator(&backend);

        let mut req = request(10, ALICE, BOB);
        req.notes = "  Weekly payroll export  ".into();
        let h = c.create_handover(req, false).await.unwrap();

        assert_eq!(h.status, HandoverStatus::Pending);
        assert!(!h.is_admin_initiated);
        assert_eq!(h.notes, "Weekly payroll export");
        assert_eq!(h.created_at, h.updated_at);
        assert_eq!((h.leave_id, h.from_employee_id, h.to_employee_id), (10, ALICE, BOB));
    }

    #[tokio::test]
    async fn admin_handover_starts_accepted() {
        let backend = seeded();
        let c = coordinator(&backend);

        let h = c.create_admin_handover(request(10, ALICE, BOB)).await.unwrap();
        assert_eq!(h.status, HandoverStatus::Accepted);
        assert!(h.is_admin_initiated);
    }

    #[tokio::test]
    async fn admin_must_name_the_leave_owner() {
        let backend = seeded();
        let c = coordinator(&backend);

        let err = c.create_admin_handover(request(10, CAROL, BOB)).await.unwrap_err();
        assert_matches!(err, HandoverError::InvalidInput(_));
    }

    #[tokio::test]
    async fn employees_only_hand_over_their_own_leave() {
        let backend = seeded();
        let c = coordinator(&backend);

        let err = c.create_handover(request(10, CAROL, BOB), false).await.unwrap_err();
        assert_matches!(err, HandoverError::Forbidden(_));
    }

    #[tokio::test]
    async fn malformed_input_is_rejected_first() {
        let backend = seeded();
        let c = coordinator(&backend);

        let err = c.create_handover(request(0, ALICE, BOB), false).await.unwrap_err();
        assert_eq!(err, HandoverError::invalid_input("invalid leave id"));

        let err = c.create_handover(request(10, ALICE, 0), false).await.unwrap_err();
        assert_eq!(err, HandoverError::invalid_input("invalid employee id"));

        let mut blank = request(10, ALICE, BOB);
        blank.notes = " \n\t ".into();
        let err = c.create_handover(blank, false).await.unwrap_err();
        assert_eq!(err, HandoverError::invalid_input("notes must not be empty"));

        let err = c.create_handover(request(10, ALICE, ALICE), false).await.unwrap_err();
        assert_eq!(err, HandoverError::invalid_input("cannot hand over to yourself"));

        assert_eq!(backend.handover_count(), 0);
    }

    #[tokio::test]
    async fn unknown_leave_or_recipient_is_not_found() {
        let backend = seeded();
        let c = coordinator(&backend);

        let err = c.create_handover(request(999, ALICE, BOB), false).await.unwrap_err();
        assert_eq!(err, HandoverError::not_found("leave request not found"));

        let err = c.create_handover(request(10, ALICE, 77), false).await.unwrap_err();
        assert_eq!(err, HandoverError::not_found("employee not found"));
    }

    #[tokio::test]
    async fn unapproved_leave_is_invalid_state_regardless_of_other_fields() {
        let backend = seeded();
        let c = coordinator(&backend);

        for leave_id in [11, 12] {
            for (from, to) in [(ALICE, BOB), (CAROL, BOB), (ALICE, 77)] {
                let err = c.create_handover(request(leave_id, from, to), false).await.unwrap_err();
                assert_eq!(
                    err,
                    HandoverError::invalid_state(HANDOVER_REQUIRES_APPROVED_LEAVE)
                );
            }
        }
    }

    #[tokio::test]
    async fn recipient_on_leave_is_a_conflict_without_any_handovers() {
        let backend = seeded();
        let c = coordinator(&backend);

        // Bob is off Feb 1-3, Alice's leave starts Feb 3
        let err = c.create_handover(request(16, ALICE, BOB), false).await.unwrap_err();
        assert_eq!(err, HandoverError::conflict(EMPLOYEE_ON_LEAVE));
        assert_eq!(backend.handover_count(), 0);
    }

    #[tokio::test]
    async fn recipient_pending_leave_does_not_block() {
        let backend = seeded();
        let c = coordinator(&backend);

        // Bob's March leave is only pending
        c.create_handover(request(18, DAVE, BOB), false).await.unwrap();
    }

    #[tokio::test]
    async fn boundary_day_overlap_is_rejected() {
        let backend = seeded();
        let c = coordinator(&backend);

        c.create_handover(request(10, ALICE, BOB), false).await.unwrap();

        // Jan 10-15 vs Jan 15-20
        let err = c.create_handover(request(13, CAROL, BOB), false).await.unwrap_err();
        assert_eq!(err, HandoverError::conflict(EMPLOYEE_ALREADY_BOOKED));

        // Jan 16-20 is clear
        c.create_handover(request(14, CAROL, BOB), false).await.unwrap();
    }

    #[tokio::test]
    async fn adjacent_leaves_can_share_a_recipient() {
        let backend = seeded();
        let c = coordinator(&backend);

        c.create_handover(request(20, ALICE, BOB), false).await.unwrap();
        c.create_handover(request(21, CAROL, BOB), false).await.unwrap();
        assert_eq!(backend.handover_count(), 2);
    }

    #[tokio::test]
    async fn accepted_admin_handover_blocks_overlaps() {
        let backend = seeded();
        let c = coordinator(&backend);

        c.create_admin_handover(request(10, ALICE, BOB)).await.unwrap();
        let err = c.create_handover(request(13, CAROL, BOB), false).await.unwrap_err();
        assert_matches!(err, HandoverError::Conflict(_));
    }

    #[tokio::test]
    async fn rejected_handover_frees_the_recipient() {
        let backend = seeded();
        let c = coordinator(&backend);

        let first = c.create_handover(request(10, ALICE, BOB), false).await.unwrap();
        c.update_status(first.id, HandoverStatus::Rejected, BOB).await.unwrap();

        c.create_handover(request(13, CAROL, BOB), false).await.unwrap();
    }

    #[tokio::test]
    async fn recipient_accepts_pending_handover() {
        let backend = seeded();
        let c = coordinator(&backend);

        let h = c.create_handover(request(10, ALICE, BOB), false).await.unwrap();
        let accepted = c.update_status(h.id, HandoverStatus::Accepted, BOB).await.unwrap();

        assert_eq!(accepted.status, HandoverStatus::Accepted);
        assert!(accepted.updated_at >= h.updated_at);

        let stored = c.get_handover(h.id).await.unwrap();
        assert_eq!(stored.status, HandoverStatus::Accepted);
    }

    #[tokio::test]
    async fn answered_handover_cannot_change_again() {
        let backend = seeded();
        let c = coordinator(&backend);

        let h = c.create_handover(request(10, ALICE, BOB), false).await.unwrap();
        c.update_status(h.id, HandoverStatus::Accepted, BOB).await.unwrap();

        for next in [HandoverStatus::Accepted, HandoverStatus::Rejected] {
            let err = c.update_status(h.id, next, BOB).await.unwrap_err();
            assert_matches!(err, HandoverError::InvalidState(_));
        }
    }

    #[tokio::test]
    async fn admin_handover_is_immutable() {
        let backend = seeded();
        let c = coordinator(&backend);

        let h = c.create_admin_handover(request(10, ALICE, BOB)).await.unwrap();
        for next in [HandoverStatus::Accepted, HandoverStatus::Rejected] {
            let err = c.update_status(h.id, next, BOB).await.unwrap_err();
            assert_eq!(err, HandoverError::invalid_state(ADMIN_HANDOVER_IMMUTABLE));
        }
    }

    #[tokio::test]
    async fn only_the_recipient_may_respond() {
        let backend = seeded();
        let c = coordinator(&backend);

        let h = c.create_handover(request(10, ALICE, BOB), false).await.unwrap();
        for caller in [ALICE, CAROL, 0] {
            let err = c
                .update_status(h.id, HandoverStatus::Accepted, caller)
                .await
                .unwrap_err();
            assert_matches!(err, HandoverError::Forbidden(_));
        }

        let still = c.get_handover(h.id).await.unwrap();
        assert_eq!(still.status, HandoverStatus::Pending);
    }

    #[tokio::test]
    async fn pending_is_not_a_valid_answer() {
        let backend = seeded();
        let c = coordinator(&backend);

        let h = c.create_handover(request(10, ALICE, BOB), false).await.unwrap();
        let err = c.update_status(h.id, HandoverStatus::Pending, BOB).await.unwrap_err();
        assert_matches!(err, HandoverError::InvalidInput(_));
    }

    #[tokio::test]
    async fn unknown_handover_is_not_found() {
        let backend = seeded();
        let c = coordinator(&backend);

        let err = c.update_status(42, HandoverStatus::Accepted, BOB).await.unwrap_err();
        assert_eq!(err, HandoverError::not_found("handover not found"));
        assert_matches!(c.get_handover(42).await, Err(HandoverError::NotFound(_)));
    }

    #[tokio::test]
    async fn history_lists_both_sides_newest_first() {
        let backend = seeded();
        let c = coordinator(&backend);

        let given = c.create_handover(request(20, ALICE, BOB), false).await.unwrap();
        let received = c.create_handover(request(21, CAROL, ALICE), false).await.unwrap();
        c.create_handover(request(14, CAROL, DAVE), false).await.unwrap();

        let history = c.get_history(ALICE).await.unwrap();
        let ids: Vec<u64> = history.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![received.id, given.id]);

        let newest = &history[0];
        assert_eq!(newest.from_employee.as_ref().unwrap().name, "Carol Cruz");
        assert_eq!(newest.to_employee.as_ref().unwrap().employee_code, "EMP-001");
        assert_eq!(newest.leave_start, Some(d(4, 6)));
        assert_eq!(newest.leave_end, Some(d(4, 10)));
    }

    #[tokio::test]
    async fn history_is_stable_between_reads() {
        let backend = seeded();
        let c = coordinator(&backend);

        c.create_handover(request(20, ALICE, BOB), false).await.unwrap();
        c.create_handover(request(21, CAROL, BOB), false).await.unwrap();

        let first = c.get_history(BOB).await.unwrap();
        let second = c.get_history(BOB).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn get_all_is_unfiltered() {
        let backend = seeded();
        let c = coordinator(&backend);

        c.create_handover(request(20, ALICE, BOB), false).await.unwrap();
        c.create_handover(request(14, CAROL, DAVE), false).await.unwrap();

        let all = c.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].created_at >= all[1].created_at);
    }

    #[tokio::test]
    async fn missing_employee_leaves_summary_empty() {
        let backend = seeded();
        let c = coordinator(&backend);

        c.create_handover(request(20, ALICE, BOB), false).await.unwrap();
        backend.remove_employee(BOB);

        let history = c.get_history(ALICE).await.unwrap();
        assert!(history[0].to_employee.is_none());
        assert!(history[0].from_employee.is_some());
    }

    #[tokio::test]
    async fn outages_propagate_as_unavailable() {
        let backend = seeded();
        let c = coordinator(&backend);
        backend.set_offline(true);

        assert_matches!(
            c.create_handover(request(10, ALICE, BOB), false).await,
            Err(HandoverError::Unavailable(_))
        );
        assert_matches!(c.get_history(ALICE).await, Err(HandoverError::Unavailable(_)));
        assert_matches!(
            c.update_status(1, HandoverStatus::Accepted, BOB).await,
            Err(HandoverError::Unavailable(_))
        );
    }

    /// Holds every caller at the overlap read until `parties` callers have read,
    /// so all of them pass the pre-check before anyone writes.
    struct RacingStore {
        inner: Arc<MemoryBackend>,
        gate: Barrier,
    }

    #[async_trait]
    impl HandoverStore for RacingStore {
        async fn find_by_id(&self, id: u64) -> Result<Option<LeaveHandover>> {
            HandoverStore::find_by_id(&*self.inner, id).await
        }

        async fn find_by_recipient_and_open_status(
            &self,
            to_employee_id: u64,
        ) -> Result<Vec<LeaveHandover>> {
            let open = self.inner.find_by_recipient_and_open_status(to_employee_id).await;
            self.gate.wait().await;
            open
        }

        async fn find_by_employee(&self, employee_id: u64) -> Result<Vec<LeaveHandover>> {
            self.inner.find_by_employee(employee_id).await
        }

        async fn find_all(&self) -> Result<Vec<LeaveHandover>> {
            self.inner.find_all().await
        }

        async fn save(&self, handover: NewHandover, window: DateRange) -> Result<LeaveHandover> {
            self.inner.save(handover, window).await
        }

        async fn update_status(
            &self,
            id: u64,
            status: HandoverStatus,
            updated_at: DateTime<Utc>,
        ) -> Result<bool> {
            self.inner.update_status(id, status, updated_at).await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_overlapping_bookings_have_one_winner() {
        let backend = seeded();
        let store = Arc::new(RacingStore {
            inner: backend.clone(),
            gate: Barrier::new(2),
        });
        let c = Arc::new(HandoverCoordinator::new(backend.clone(), backend.clone(), store));

        let first = tokio::spawn({
            let c = c.clone();
            async move { c.create_handover(request(10, ALICE, BOB), false).await }
        });
        let second = tokio::spawn({
            let c = c.clone();
            async move { c.create_handover(request(13, CAROL, BOB), false).await }
        });

        let outcomes = [first.await.unwrap(), second.await.unwrap()];
        let winners = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);

        let loser = outcomes.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert_eq!(*loser, HandoverError::conflict(EMPLOYEE_ALREADY_BOOKED));
        assert_eq!(backend.handover_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_disjoint_bookings_both_succeed() {
        let backend = seeded();
        let store = Arc::new(RacingStore {
            inner: backend.clone(),
            gate: Barrier::new(2),
        });
        let c = Arc::new(HandoverCoordinator::new(backend.clone(), backend.clone(), store));

        let first = tokio::spawn({
            let c = c.clone();
            async move { c.create_handover(request(20, ALICE, BOB), false).await }
        });
        let second = tokio::spawn({
            let c = c.clone();
            async move { c.create_handover(request(21, CAROL, BOB), false).await }
        });

        assert!(first.await.unwrap().is_ok());
        assert!(second.await.unwrap().is_ok());
        assert_eq!(backend.handover_count(), 2);
    }
}
