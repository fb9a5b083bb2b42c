use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::{
    AttendanceId, AttendancePatch, AttendanceRecord, EmployeeId, EmployeeLeaves, LeaveId,
    LeavePatch, LeaveRequest, NewAttendance, NewLeave, NewTask, Task, TaskId, TaskStatus,
};

/// Errors reported by the authoritative store.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RemoteError {
    /// The store could not be reached. Reads may fall back to the cache.
    #[error("store unreachable: {0}")]
    Unavailable(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Rejected(String),
}

impl RemoteError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Outbound port for the authoritative backend.
///
/// Implementations are transport-agnostic; the engine never retries a failed
/// call and never assumes compare-and-swap semantics.
#[async_trait]
pub trait RemoteStore: Send + Sync + 'static {
    // ========================================================================
    // Attendance
    // ========================================================================

    /// Create the attendance record for a business day. Returns it with its id.
    async fn create_attendance(
        &self,
        record: &NewAttendance,
    ) -> Result<AttendanceRecord, RemoteError>;

    /// Write clock-out data. The returned record may carry an authoritative
    /// `total_hours_worked` that differs from the one sent.
    async fn update_attendance(
        &self,
        id: &AttendanceId,
        patch: &AttendancePatch,
    ) -> Result<AttendanceRecord, RemoteError>;

    /// All attendance records of an employee.
    async fn list_attendance_history(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<AttendanceRecord>, RemoteError>;

    // ========================================================================
    // Tasks
    // ========================================================================

    async fn create_task(&self, task: &NewTask) -> Result<Task, RemoteError>;

    async fn list_tasks(&self, attendance_id: &AttendanceId) -> Result<Vec<Task>, RemoteError>;

    async fn update_task(&self, id: &TaskId, status: TaskStatus) -> Result<Task, RemoteError>;

    // ========================================================================
    // Leave
    // ========================================================================

    async fn create_leave(&self, request: &NewLeave) -> Result<LeaveRequest, RemoteError>;

    async fn update_leave(
        &self,
        id: &LeaveId,
        patch: &LeavePatch,
    ) -> Result<LeaveRequest, RemoteError>;

    async fn delete_leave(&self, id: &LeaveId) -> Result<(), RemoteError>;

    /// Every leave request, for reviewers.
    async fn list_leaves(&self) -> Result<Vec<LeaveRequest>, RemoteError>;

    /// An employee's own requests and their remaining quota.
    async fn get_leave_by_employee(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<EmployeeLeaves, RemoteError>;
}
