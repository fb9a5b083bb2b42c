use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::{
    models::{NewTask, SessionState, Task, TaskId, TaskStatistics, TaskStatus},
    ports::outbound::{Clock, RemoteStore},
    LifecycleError,
};

/// Tasks attached to the active attendance session.
pub struct TaskTracker<S, C> {
    store: Arc<S>,
    clock: Arc<C>,
    tasks: Vec<Task>,
}

impl<S: RemoteStore, C: Clock> TaskTracker<S, C> {
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            store,
            clock,
            tasks: Vec::new(),
        }
    }

    /// Swap in the tasks of a freshly loaded session.
    pub fn replace(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn statistics(&self) -> TaskStatistics {
        TaskStatistics::from_tasks(&self.tasks)
    }

    /// Attach a new pending task to the active session.
    #[instrument(name = "TaskTracker::add_task", skip(self, session))]
    pub async fn add_task(
        &mut self,
        session: &SessionState,
        title: &str,
    ) -> Result<Task, LifecycleError> {
        let Some(attendance_id) = session.active_id() else {
            return Err(LifecycleError::NoActiveSession);
        };

        let title = title.trim();
        if title.is_empty() {
            return Err(LifecycleError::EmptyInput("title"));
        }

        let new_task = NewTask {
            attendance_id: attendance_id.clone(),
            title: title.to_string(),
            status: TaskStatus::Pending,
            created_at: self.clock.now(),
        };
        let task = self.store.create_task(&new_task).await?;
        self.tasks.push(task.clone());

        info!(task_id = %task.id, "Task added");
        Ok(task)
    }

    /// Move a task to `status`. Setting the status it already has is a no-op
    /// that never reaches the store.
    #[instrument(name = "TaskTracker::update_status", skip(self))]
    pub async fn update_status(
        &mut self,
        task_id: &TaskId,
        status: TaskStatus,
    ) -> Result<Task, LifecycleError> {
        let Some(index) = self.tasks.iter().position(|t| &t.id == task_id) else {
            return Err(LifecycleError::not_found(format!("task {task_id}")));
        };
        if self.tasks[index].status == status {
            return Ok(self.tasks[index].clone());
        }

        let updated = self.store.update_task(task_id, status).await?;
        self.tasks[index] = updated.clone();

        info!(status = %updated.status, "Task status updated");
        Ok(updated)
    }
}
