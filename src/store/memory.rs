//! In-memory backend implementing all three collaborator traits over one shared state.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{EMPLOYEE_ALREADY_BOOKED, HandoverError, Result};
use crate::handover::{EmployeeLookup, HandoverStore, LeaveLookup};
use crate::model::employee::EmployeeSnapshot;
use crate::model::handover::{HandoverStatus, LeaveHandover, NewHandover};
use crate::model::leave_request::{DateRange, LeaveSnapshot, LeaveStatus};

#[derive(Default)]
struct State {
    leaves: HashMap<u64, LeaveSnapshot>,
    employees: HashMap<u64, EmployeeSnapshot>,
    handovers: Vec<LeaveHandover>,
    next_handover_id: u64,
    offline: bool,
}

#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_employee(&self, id: u64, first_name: &str, last_name: &str) {
        self.with(|s| {
            s.employees.insert(
                id,
                EmployeeSnapshot {
                    id,
                    employee_code: format!("EMP-{id:03}"),
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                },
            );
        });
    }

    pub fn remove_employee(&self, id: u64) {
        self.with(|s| {
            s.employees.remove(&id);
        });
    }

    pub fn add_leave(
        &self,
        id: u64,
        employee_id: u64,
        status: LeaveStatus,
        start: NaiveDate,
        end: NaiveDate,
    ) {
        self.with(|s| {
            s.leaves.insert(
                id,
                LeaveSnapshot {
                    id,
                    employee_id,
                    status,
                    range: DateRange::new(start, end),
                },
            );
        });
    }

    /// Simulates an unreachable database: every call fails with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.with(|s| s.offline = offline);
    }

    pub fn handover_count(&self) -> usize {
        self.with(|s| s.handovers.len())
    }

    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().expect("memory backend poisoned");
        f(&mut state)
    }

    fn online<T>(&self, f: impl FnOnce(&mut State) -> T) -> Result<T> {
        self.with(|s| {
            if s.offline {
                Err(HandoverError::Unavailable("memory backend offline".into()))
            } else {
                Ok(f(s))
            }
        })
    }
}

#[async_trait]
impl LeaveLookup for MemoryBackend {
    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveSnapshot>> {
        self.online(|s| s.leaves.get(&id).cloned())
    }

    async fn find_approved_by_employee(&self, employee_id: u64) -> Result<Vec<LeaveSnapshot>> {
        self.online(|s| {
            s.leaves
                .values()
                .filter(|l| l.employee_id == employee_id && l.status == LeaveStatus::Approved)
                .cloned()
                .collect()
        })
    }
}

#[async_trait]
impl EmployeeLookup for MemoryBackend {
    async fn exists(&self, id: u64) -> Result<bool> {
        self.online(|s| s.employees.contains_key(&id))
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<EmployeeSnapshot>> {
        self.online(|s| s.employees.get(&id).cloned())
    }
}

#[async_trait]
impl HandoverStore for MemoryBackend {
    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveHandover>> {
        self.online(|s| s.handovers.iter().find(|h| h.id == id).cloned())
    }

    async fn find_by_recipient_and_open_status(
        &self,
        to_employee_id: u64,
    ) -> Result<Vec<LeaveHandover>> {
        self.online(|s| {
            s.handovers
                .iter()
                .filter(|h| h.to_employee_id == to_employee_id && h.status.is_open())
                .cloned()
                .collect()
        })
    }

    async fn find_by_employee(&self, employee_id: u64) -> Result<Vec<LeaveHandover>> {
        self.online(|s| {
            s.handovers
                .iter()
                .filter(|h| h.from_employee_id == employee_id || h.to_employee_id == employee_id)
                .cloned()
                .collect()
        })
    }

    async fn find_all(&self) -> Result<Vec<LeaveHandover>> {
        self.online(|s| s.handovers.clone())
    }

    async fn save(&self, handover: NewHandover, window: DateRange) -> Result<LeaveHandover> {
        self.online(|s| {
            let booked = s.handovers.iter().any(|h| {
                h.to_employee_id == handover.to_employee_id
                    && h.status.is_open()
                    && s.leaves
                        .get(&h.leave_id)
                        .is_some_and(|l| l.range.overlaps(&window))
            });
            if booked {
                return Err(HandoverError::conflict(EMPLOYEE_ALREADY_BOOKED));
            }

            s.next_handover_id += 1;
            let saved = handover.into_handover(s.next_handover_id);
            s.handovers.push(saved.clone());
            Ok(saved)
        })?
    }

    async fn update_status(
        &self,
        id: u64,
        status: HandoverStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.online(|s| {
            match s.handovers.iter_mut().find(|h| {
                h.id == id && h.status == HandoverStatus::Pending && !h.is_admin_initiated
            }) {
                Some(h) => {
                    h.status = status;
                    h.updated_at = updated_at;
                    true
                }
                None => false,
            }
        })
    }
}
