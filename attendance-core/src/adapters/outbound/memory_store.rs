//! In-memory implementation of the remote store.
//!
//! Serves as the dev backend for the CLI and as the fake behind service tests.

use std::{
    collections::VecDeque,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;

use crate::domain::{
    models::{
        AttendanceId, AttendancePatch, AttendanceRecord, EmployeeId, EmployeeLeaves, LeaveId,
        LeavePatch, LeaveQuota, LeaveRequest, LeaveStatus, NewAttendance, NewLeave, NewTask, Task,
        TaskId, TaskStatus,
    },
    ports::outbound::{RemoteError, RemoteStore},
    services::compute_duration,
};

/// Leave days granted per employee when no allowance is configured.
pub const DEFAULT_ANNUAL_ALLOWANCE: f64 = 20.0;

/// Most recent operations kept in the call log.
const CALL_LOG_LIMIT: usize = 256;

#[derive(Debug, Default)]
struct StoreState {
    next_id: u64,
    attendance: Vec<AttendanceRecord>,
    tasks: Vec<Task>,
    leaves: Vec<LeaveRequest>,
    offline: bool,
    authoritative_hours: Option<f64>,
    failing: Vec<&'static str>,
    calls: VecDeque<&'static str>,
}

impl StoreState {
    /// Log the call and fail it when the store is switched offline or the
    /// operation is marked as failing.
    fn begin(&mut self, op: &'static str) -> Result<(), RemoteError> {
        if self.calls.len() == CALL_LOG_LIMIT {
            self.calls.pop_front();
        }
        self.calls.push_back(op);

        if self.offline {
            return Err(RemoteError::unavailable(format!("{op}: store offline")));
        }
        if self.failing.contains(&op) {
            return Err(RemoteError::unavailable(format!("{op}: operation failing")));
        }
        Ok(())
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

/// Remote store held entirely in memory.
///
/// Quota is derived the way a backend would: the annual allowance minus the
/// duration of every request that has not been rejected.
///
/// # Examples
///
/// ```
/// use attendance_core::adapters::outbound::InMemoryRemoteStore;
///
/// let store = InMemoryRemoteStore::new().with_annual_allowance(12.0);
/// store.set_offline(true);
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryRemoteStore {
    state: Arc<RwLock<StoreState>>,
    annual_allowance: f64,
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            annual_allowance: DEFAULT_ANNUAL_ALLOWANCE,
        }
    }
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_annual_allowance(mut self, days: f64) -> Self {
        self.annual_allowance = days;
        self
    }

    /// Make clock-out report this many hours regardless of what was sent.
    pub fn with_authoritative_hours(self, hours: f64) -> Self {
        self.write().authoritative_hours = Some(hours);
        self
    }

    /// Seed leave requests, e.g. ones already decided by a reviewer.
    pub fn with_leaves(self, leaves: Vec<LeaveRequest>) -> Self {
        self.write().leaves.extend(leaves);
        self
    }

    /// Simulate the store becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.write().offline = offline;
    }

    /// Make every call to `op` fail as unavailable while the rest keep working.
    pub fn fail_operation(&self, op: &'static str) {
        let mut state = self.write();
        if !state.failing.contains(&op) {
            state.failing.push(op);
        }
    }

    /// Names of the most recent operations invoked, oldest first.
    pub fn calls(&self) -> Vec<&'static str> {
        self.read().calls.iter().copied().collect()
    }

    pub fn clear_calls(&self) {
        self.write().calls.clear();
    }

    pub fn attendance_records(&self) -> Vec<AttendanceRecord> {
        self.read().attendance.clone()
    }

    pub fn leave_requests(&self) -> Vec<LeaveRequest> {
        self.read().leaves.clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, StoreState> {
        self.state.read().expect("store lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StoreState> {
        self.state.write().expect("store lock poisoned")
    }

    fn quota_for(&self, leaves: &[LeaveRequest]) -> LeaveQuota {
        let used: f64 = leaves
            .iter()
            .filter(|leave| leave.status != LeaveStatus::Rejected)
            .map(|leave| compute_duration(leave.start_date, leave.end_date, leave.leave_type))
            .sum();
        LeaveQuota {
            remaining_days: self.annual_allowance - used,
        }
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn create_attendance(
        &self,
        record: &NewAttendance,
    ) -> Result<AttendanceRecord, RemoteError> {
        let mut state = self.write();
        state.begin("create_attendance")?;

        if state
            .attendance
            .iter()
            .any(|r| r.employee_id == record.employee_id && r.date == record.date)
        {
            return Err(RemoteError::Rejected(format!(
                "attendance for {} on {} already exists",
                record.employee_id, record.date
            )));
        }

        let created = AttendanceRecord {
            id: AttendanceId::new(state.next_id("att")),
            employee_id: record.employee_id.clone(),
            date: record.date,
            clock_in: record.clock_in,
            clock_out: None,
            total_hours_worked: None,
        };
        state.attendance.push(created.clone());
        Ok(created)
    }

    async fn update_attendance(
        &self,
        id: &AttendanceId,
        patch: &AttendancePatch,
    ) -> Result<AttendanceRecord, RemoteError> {
        let mut state = self.write();
        state.begin("update_attendance")?;

        let hours = state.authoritative_hours.unwrap_or(patch.total_hours_worked);
        let record = state
            .attendance
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| RemoteError::NotFound(format!("attendance {id}")))?;

        if record.clock_out.is_some() {
            return Err(RemoteError::Rejected(format!("attendance {id} already closed")));
        }

        record.clock_out = Some(patch.clock_out);
        record.total_hours_worked = Some(hours);
        Ok(record.clone())
    }

    async fn list_attendance_history(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<AttendanceRecord>, RemoteError> {
        let mut state = self.write();
        state.begin("list_attendance_history")?;

        Ok(state
            .attendance
            .iter()
            .filter(|r| &r.employee_id == employee_id)
            .cloned()
            .collect())
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, RemoteError> {
        let mut state = self.write();
        state.begin("create_task")?;

        if !state.attendance.iter().any(|r| r.id == task.attendance_id) {
            return Err(RemoteError::NotFound(format!(
                "attendance {}",
                task.attendance_id
            )));
        }

        let created = Task {
            id: TaskId::new(state.next_id("task")),
            title: task.title.clone(),
            status: task.status,
            attendance_id: task.attendance_id.clone(),
            created_at: task.created_at,
        };
        state.tasks.push(created.clone());
        Ok(created)
    }

    async fn list_tasks(&self, attendance_id: &AttendanceId) -> Result<Vec<Task>, RemoteError> {
        let mut state = self.write();
        state.begin("list_tasks")?;

        Ok(state
            .tasks
            .iter()
            .filter(|t| &t.attendance_id == attendance_id)
            .cloned()
            .collect())
    }

    async fn update_task(&self, id: &TaskId, status: TaskStatus) -> Result<Task, RemoteError> {
        let mut state = self.write();
        state.begin("update_task")?;

        let task = state
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| RemoteError::NotFound(format!("task {id}")))?;
        task.status = status;
        Ok(task.clone())
    }

    async fn create_leave(&self, request: &NewLeave) -> Result<LeaveRequest, RemoteError> {
        let mut state = self.write();
        state.begin("create_leave")?;

        let created = LeaveRequest {
            id: LeaveId::new(state.next_id("leave")),
            employee_id: request.employee_id.clone(),
            leave_type: request.leave_type,
            start_date: request.start_date,
            end_date: request.end_date,
            reason: request.reason.clone(),
            status: request.status,
            applied_date: request.applied_date,
        };
        state.leaves.push(created.clone());
        Ok(created)
    }

    async fn update_leave(
        &self,
        id: &LeaveId,
        patch: &LeavePatch,
    ) -> Result<LeaveRequest, RemoteError> {
        let mut state = self.write();
        state.begin("update_leave")?;

        let leave = state
            .leaves
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| RemoteError::NotFound(format!("leave {id}")))?;

        if leave.status.is_final() {
            return Err(RemoteError::Rejected(format!("leave {id} already {}", leave.status)));
        }

        patch.apply_to(leave);
        Ok(leave.clone())
    }

    async fn delete_leave(&self, id: &LeaveId) -> Result<(), RemoteError> {
        let mut state = self.write();
        state.begin("delete_leave")?;

        let before = state.leaves.len();
        state.leaves.retain(|l| &l.id != id);
        if state.leaves.len() == before {
            return Err(RemoteError::NotFound(format!("leave {id}")));
        }
        Ok(())
    }

    async fn list_leaves(&self) -> Result<Vec<LeaveRequest>, RemoteError> {
        let mut state = self.write();
        state.begin("list_leaves")?;
        Ok(state.leaves.clone())
    }

    async fn get_leave_by_employee(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<EmployeeLeaves, RemoteError> {
        let requests: Vec<LeaveRequest> = {
            let mut state = self.write();
            state.begin("get_leave_by_employee")?;
            state
                .leaves
                .iter()
                .filter(|l| &l.employee_id == employee_id)
                .cloned()
                .collect()
        };

        let quota = self.quota_for(&requests);
        Ok(EmployeeLeaves { requests, quota })
    }
}
