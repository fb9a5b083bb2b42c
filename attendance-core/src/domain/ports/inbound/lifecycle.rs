use async_trait::async_trait;
use time::Date;

use crate::domain::{
    models::{
        Actor, AttendanceRecord, LeaveDraft, LeaveFilter, LeaveId, LeaveQuota, LeaveRequest,
        LeaveStatus, SessionView, Task, TaskId, TaskStatistics, TaskStatus,
    },
    LifecycleError,
};

/// Inbound port for everything a front end can ask of the engine.
///
/// One implementation serves one actor on one business day. Mutating
/// operations take `&mut self` so at most one of them is in flight per owner.
#[async_trait]
pub trait AttendanceLifecycle: Send + 'static {
    fn actor(&self) -> &Actor;

    fn business_date(&self) -> Date;

    // ========================================================================
    // Session
    // ========================================================================

    /// Rebuild session, tasks and leave requests for `date`.
    ///
    /// Session data falls back to the local cache when the store is
    /// unreachable. A failed leave refresh does not fail the load.
    async fn load(&mut self, date: Date) -> Result<SessionView, LifecycleError>;

    fn session(&self) -> SessionView;

    async fn clock_in(&mut self) -> Result<AttendanceRecord, LifecycleError>;

    async fn clock_out(&mut self) -> Result<AttendanceRecord, LifecycleError>;

    // ========================================================================
    // Tasks
    // ========================================================================

    async fn add_task(&mut self, title: &str) -> Result<Task, LifecycleError>;

    async fn update_task_status(
        &mut self,
        task_id: &TaskId,
        status: TaskStatus,
    ) -> Result<Task, LifecycleError>;

    fn tasks(&self) -> &[Task];

    fn task_statistics(&self) -> TaskStatistics;

    // ========================================================================
    // Leave
    // ========================================================================

    /// Reload "my requests" for employees or every request for reviewers.
    async fn refresh_leaves(&mut self) -> Result<(), LifecycleError>;

    /// Create a request, or edit the pending one the draft points at.
    async fn submit_leave(&mut self, draft: &LeaveDraft) -> Result<LeaveRequest, LifecycleError>;

    async fn delete_leave(&mut self, id: &LeaveId) -> Result<(), LifecycleError>;

    /// Approve or reject a pending request.
    async fn review_leave(
        &mut self,
        id: &LeaveId,
        decision: LeaveStatus,
    ) -> Result<LeaveRequest, LifecycleError>;

    fn leaves(&self, filter: &LeaveFilter) -> Vec<&LeaveRequest>;

    fn leave_quota(&self) -> Option<LeaveQuota>;

    fn stash_leave_draft(&self, draft_key: &str, draft: &LeaveDraft);

    fn restore_leave_draft(&self, draft_key: &str) -> Option<LeaveDraft>;

    fn discard_leave_draft(&self, draft_key: &str);
}
