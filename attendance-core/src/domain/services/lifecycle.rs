use std::sync::Arc;

use async_trait::async_trait;
use time::Date;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

use super::{ElapsedTicker, LeaveEngine, SessionManager, TaskTracker};
use crate::domain::{
    models::{
        Actor, AttendanceRecord, LeaveDraft, LeaveFilter, LeaveId, LeaveQuota, LeaveRequest,
        LeaveStatus, SessionView, Task, TaskId, TaskStatistics, TaskStatus,
    },
    ports::{
        inbound::AttendanceLifecycle,
        outbound::{Clock, LocalCache, RemoteStore},
    },
    LifecycleError,
};

/// Implementation of the [`AttendanceLifecycle`] inbound port.
///
/// Composes the session, task and leave services for one actor and threads
/// the business date through them.
pub struct LifecycleFacade<S, K, C> {
    actor: Actor,
    business_date: Date,
    clock: Arc<C>,
    sessions: SessionManager<S, K, C>,
    tasks: TaskTracker<S, C>,
    leaves: LeaveEngine<S, K>,
}

impl<S, K, C> LifecycleFacade<S, K, C>
where
    S: RemoteStore,
    K: LocalCache,
    C: Clock,
{
    pub fn new(
        store: Arc<S>,
        cache: Arc<K>,
        clock: Arc<C>,
        actor: Actor,
        business_date: Date,
    ) -> Self {
        Self {
            sessions: SessionManager::new(
                store.clone(),
                cache.clone(),
                clock.clone(),
                business_date,
            ),
            tasks: TaskTracker::new(store.clone(), clock.clone()),
            leaves: LeaveEngine::new(store, cache),
            actor,
            business_date,
            clock,
        }
    }

    /// A ticker observing this facade's session.
    pub fn elapsed_ticker(&self) -> ElapsedTicker<C> {
        ElapsedTicker::new(self.sessions.subscribe(), self.clock.clone())
    }
}

#[async_trait]
impl<S, K, C> AttendanceLifecycle for LifecycleFacade<S, K, C>
where
    S: RemoteStore,
    K: LocalCache,
    C: Clock,
{
    fn actor(&self) -> &Actor {
        &self.actor
    }

    fn business_date(&self) -> Date {
        self.business_date
    }

    async fn load(&mut self, date: Date) -> Result<SessionView, LifecycleError> {
        let tasks = self.sessions.load(&self.actor.employee_id, date).await?;
        self.tasks.replace(tasks);
        self.business_date = date;

        if let Err(e) = self.leaves.refresh(&self.actor).await {
            warn!(error = %e, "Leave requests could not be loaded");
        }

        Ok(self.sessions.view())
    }

    fn session(&self) -> SessionView {
        self.sessions.view()
    }

    async fn clock_in(&mut self) -> Result<AttendanceRecord, LifecycleError> {
        let record = self.sessions.clock_in(&self.actor.employee_id).await?;
        self.tasks.replace(Vec::new());
        Ok(record)
    }

    async fn clock_out(&mut self) -> Result<AttendanceRecord, LifecycleError> {
        self.sessions.clock_out(self.tasks.tasks()).await
    }

    async fn add_task(&mut self, title: &str) -> Result<Task, LifecycleError> {
        let task = self.tasks.add_task(self.sessions.state(), title).await?;
        self.sessions.mirror_tasks(self.tasks.tasks());
        Ok(task)
    }

    async fn update_task_status(
        &mut self,
        task_id: &TaskId,
        status: TaskStatus,
    ) -> Result<Task, LifecycleError> {
        let task = self.tasks.update_status(task_id, status).await?;
        self.sessions.mirror_tasks(self.tasks.tasks());
        Ok(task)
    }

    fn tasks(&self) -> &[Task] {
        self.tasks.tasks()
    }

    fn task_statistics(&self) -> TaskStatistics {
        self.tasks.statistics()
    }

    async fn refresh_leaves(&mut self) -> Result<(), LifecycleError> {
        self.leaves.refresh(&self.actor).await
    }

    async fn submit_leave(&mut self, draft: &LeaveDraft) -> Result<LeaveRequest, LifecycleError> {
        self.leaves
            .submit(&self.actor, draft, self.business_date)
            .await
    }

    async fn delete_leave(&mut self, id: &LeaveId) -> Result<(), LifecycleError> {
        self.leaves.delete(id).await
    }

    async fn review_leave(
        &mut self,
        id: &LeaveId,
        decision: LeaveStatus,
    ) -> Result<LeaveRequest, LifecycleError> {
        self.leaves.transition_status(id, decision).await
    }

    fn leaves(&self, filter: &LeaveFilter) -> Vec<&LeaveRequest> {
        self.leaves.filter(filter)
    }

    fn leave_quota(&self) -> Option<LeaveQuota> {
        self.leaves.quota()
    }

    fn stash_leave_draft(&self, draft_key: &str, draft: &LeaveDraft) {
        self.leaves.stash_draft(draft_key, draft);
    }

    fn restore_leave_draft(&self, draft_key: &str) -> Option<LeaveDraft> {
        self.leaves.restore_draft(draft_key)
    }

    fn discard_leave_draft(&self, draft_key: &str) {
        self.leaves.discard_draft(draft_key);
    }
}

/// Shared access to a lifecycle that admits one intent at a time.
///
/// A second caller is turned away with [`LifecycleError::OperationInFlight`]
/// instead of queueing behind the pending write.
pub struct LifecycleHandle<L> {
    inner: Arc<Mutex<L>>,
}

impl<L> Clone for LifecycleHandle<L> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<L: AttendanceLifecycle> LifecycleHandle<L> {
    pub fn new(lifecycle: L) -> Self {
        Self {
            inner: Arc::new(Mutex::new(lifecycle)),
        }
    }

    pub fn acquire(&self) -> Result<OwnedMutexGuard<L>, LifecycleError> {
        self.inner
            .clone()
            .try_lock_owned()
            .map_err(|_| LifecycleError::OperationInFlight)
    }
}
