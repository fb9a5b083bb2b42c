use std::sync::Arc;

use time::Date;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::domain::{
    models::{
        attendance_key, worked_hours, AttendancePatch, AttendanceRecord, CachedAttendance,
        DataSource, Elapsed, EmployeeId, NewAttendance, SessionPhase, SessionState, SessionView,
        Task,
    },
    ports::outbound::{CacheError, Clock, LocalCache, RemoteError, RemoteStore},
    services::reconcile,
    LifecycleError,
};

/// Owns the attendance session of one business day.
///
/// Transitions: `NoSession --clock_in--> Active --clock_out--> Completed`.
/// Every state change is mirrored into the local cache and published on a
/// watch channel for read-only observers such as [`super::ElapsedTicker`].
pub struct SessionManager<S, K, C> {
    store: Arc<S>,
    cache: Arc<K>,
    clock: Arc<C>,
    business_date: Date,
    state: SessionState,
    source: DataSource,
    published: watch::Sender<SessionState>,
}

impl<S, K, C> SessionManager<S, K, C>
where
    S: RemoteStore,
    K: LocalCache,
    C: Clock,
{
    pub fn new(store: Arc<S>, cache: Arc<K>, clock: Arc<C>, business_date: Date) -> Self {
        let (published, _) = watch::channel(SessionState::NoSession);
        Self {
            store,
            cache,
            clock,
            business_date,
            state: SessionState::NoSession,
            source: DataSource::NotLoaded,
            published,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    pub fn business_date(&self) -> Date {
        self.business_date
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    /// Observe state changes without borrowing the manager.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.published.subscribe()
    }

    pub fn elapsed(&self) -> Elapsed {
        self.state.elapsed_at(self.clock.now())
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.state.phase(),
            record: self.state.record().cloned(),
            elapsed: self.elapsed(),
            source: self.source,
        }
    }

    /// Rebuild the state of `date` for `employee_id`.
    ///
    /// The store is authoritative whenever it answers. Only when it is
    /// unreachable does the cached mirror of the day stand in for it. Returns
    /// the tasks of the loaded session.
    #[instrument(name = "SessionManager::load", skip(self))]
    pub async fn load(
        &mut self,
        employee_id: &EmployeeId,
        date: Date,
    ) -> Result<Vec<Task>, LifecycleError> {
        let remote = self.fetch_day(employee_id, date).await;
        if let Err(e) = &remote {
            warn!(error = %e, "Remote attendance read failed, falling back to cache");
        }

        let cached = self
            .read_cache(employee_id, date)
            .map(|cached| (cached.to_record(), cached.tasks));

        let resolved = reconcile(remote, cached)?;
        let (state, tasks) = match resolved.value {
            Some((record, tasks)) => (SessionState::from_record(record), tasks),
            None => (SessionState::NoSession, Vec::new()),
        };

        if resolved.source == DataSource::Remote {
            if let Some(record) = state.record() {
                self.mirror(record, &tasks);
            }
        }

        self.business_date = date;
        self.set_state(state, resolved.source);
        info!(phase = %self.state.phase(), source = %self.source, "Attendance loaded");
        Ok(tasks)
    }

    /// Open today's session.
    #[instrument(name = "SessionManager::clock_in", skip(self), fields(date = %self.business_date))]
    pub async fn clock_in(
        &mut self,
        employee_id: &EmployeeId,
    ) -> Result<AttendanceRecord, LifecycleError> {
        if !matches!(self.state, SessionState::NoSession) {
            return Err(LifecycleError::invalid_transition(format!(
                "cannot clock in while session is {}",
                self.state.phase()
            )));
        }

        let new_record = NewAttendance {
            employee_id: employee_id.clone(),
            date: self.business_date,
            clock_in: self.clock.now(),
        };
        let record = self.store.create_attendance(&new_record).await?;

        self.mirror(&record, &[]);
        self.set_state(SessionState::Active(record.clone()), DataSource::Remote);
        info!(attendance_id = %record.id, "Clocked in");
        Ok(record)
    }

    /// Close today's session. `tasks` is the task set of the session, written
    /// to the cache along with the closed record.
    ///
    /// Hours are computed locally and sent along; a value returned by the
    /// store replaces the local one.
    #[instrument(name = "SessionManager::clock_out", skip(self, tasks), fields(date = %self.business_date))]
    pub async fn clock_out(
        &mut self,
        tasks: &[Task],
    ) -> Result<AttendanceRecord, LifecycleError> {
        let SessionState::Active(active) = &self.state else {
            return Err(LifecycleError::invalid_transition(format!(
                "cannot clock out while session is {}",
                self.state.phase()
            )));
        };

        let clock_out = self.clock.now().max(active.clock_in);
        let local_hours = worked_hours(active.clock_in, clock_out);
        let patch = AttendancePatch {
            clock_out,
            total_hours_worked: local_hours,
        };
        let stored = self.store.update_attendance(&active.id, &patch).await?;

        let record = AttendanceRecord {
            clock_out: Some(stored.clock_out.unwrap_or(clock_out).max(active.clock_in)),
            total_hours_worked: Some(stored.total_hours_worked.unwrap_or(local_hours)),
            ..active.clone()
        };

        self.mirror(&record, tasks);
        info!(hours = ?record.total_hours_worked, "Clocked out");
        self.set_state(SessionState::Completed(record.clone()), DataSource::Remote);
        Ok(record)
    }

    /// Rewrite the cached task list of the current session.
    pub fn mirror_tasks(&self, tasks: &[Task]) {
        if let Some(record) = self.state.record() {
            self.mirror(record, tasks);
        }
    }

    async fn fetch_day(
        &self,
        employee_id: &EmployeeId,
        date: Date,
    ) -> Result<Option<(AttendanceRecord, Vec<Task>)>, RemoteError> {
        let history = self.store.list_attendance_history(employee_id).await?;
        let Some(record) = history.into_iter().find(|r| r.date == date) else {
            return Ok(None);
        };

        let tasks = self.store.list_tasks(&record.id).await?;
        Ok(Some((record, tasks)))
    }

    fn read_cache(&self, employee_id: &EmployeeId, date: Date) -> Option<CachedAttendance> {
        let value = self.cache.get(&attendance_key(date))?;
        let cached: CachedAttendance = match serde_json::from_value(value) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable cached attendance");
                return None;
            }
        };

        if &cached.employee_id != employee_id || cached.date != date {
            debug!(cached_employee = %cached.employee_id, "Cached attendance belongs to someone else");
            return None;
        }
        Some(cached)
    }

    fn mirror(&self, record: &AttendanceRecord, tasks: &[Task]) {
        let cached = CachedAttendance::from_record(record, tasks);
        let result = serde_json::to_value(&cached)
            .map_err(CacheError::from)
            .and_then(|value| self.cache.set(&attendance_key(record.date), value));
        if let Err(e) = result {
            warn!(error = %e, attendance_id = %record.id, "Failed to mirror attendance to cache");
        }
    }

    fn set_state(&mut self, state: SessionState, source: DataSource) {
        self.state = state;
        self.source = source;
        self.published.send_replace(self.state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::{InMemoryRemoteStore, ManualClock, MemoryCache};
    use crate::domain::models::{NewTask, TaskStatus};
    use serde_json::json;
    use time::macros::{date, datetime};
    use time::Duration;

    const DAY: Date = date!(2024 - 03 - 01);

    struct Fixture {
        store: InMemoryRemoteStore,
        cache: Arc<MemoryCache>,
        clock: Arc<ManualClock>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: InMemoryRemoteStore::new(),
                cache: Arc::new(MemoryCache::new()),
                clock: Arc::new(ManualClock::new(datetime!(2024-03-01 09:00 UTC))),
            }
        }

        fn manager(&self) -> SessionManager<InMemoryRemoteStore, MemoryCache, ManualClock> {
            SessionManager::new(
                Arc::new(self.store.clone()),
                self.cache.clone(),
                self.clock.clone(),
                DAY,
            )
        }
    }

    fn employee() -> EmployeeId {
        EmployeeId::new("emp-1")
    }

    #[tokio::test]
    async fn clock_out_without_session_is_invalid() {
        let fx = Fixture::new();
        let mut manager = fx.manager();

        assert!(matches!(
            manager.clock_out(&[]).await,
            Err(LifecycleError::InvalidTransition(_))
        ));
        assert!(fx.store.calls().is_empty());
    }

    #[tokio::test]
    async fn second_clock_in_is_invalid() {
        let fx = Fixture::new();
        let mut manager = fx.manager();

        manager.clock_in(&employee()).await.unwrap();
        assert_eq!(manager.phase(), SessionPhase::Active);

        assert!(matches!(
            manager.clock_in(&employee()).await,
            Err(LifecycleError::InvalidTransition(_))
        ));
        assert_eq!(fx.store.attendance_records().len(), 1);
    }

    #[tokio::test]
    async fn clock_in_after_completion_is_invalid() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        manager.clock_in(&employee()).await.unwrap();
        manager.clock_out(&[]).await.unwrap();

        assert!(matches!(
            manager.clock_in(&employee()).await,
            Err(LifecycleError::InvalidTransition(_))
        ));
        assert!(matches!(
            manager.clock_out(&[]).await,
            Err(LifecycleError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn clock_out_computes_rounded_hours() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        manager.clock_in(&employee()).await.unwrap();

        fx.clock.advance(Duration::minutes(125));
        let record = manager.clock_out(&[]).await.unwrap();

        assert_eq!(record.total_hours_worked, Some(2.08));
        assert_eq!(record.clock_out, Some(datetime!(2024-03-01 11:05 UTC)));
        assert_eq!(manager.phase(), SessionPhase::Completed);
    }

    #[tokio::test]
    async fn authoritative_hours_take_precedence() {
        let fx = Fixture::new();
        let store = fx.store.clone().with_authoritative_hours(1.5);
        let mut manager = SessionManager::new(
            Arc::new(store),
            fx.cache.clone(),
            fx.clock.clone(),
            DAY,
        );
        manager.clock_in(&employee()).await.unwrap();
        fx.clock.advance(Duration::hours(2));

        let record = manager.clock_out(&[]).await.unwrap();
        assert_eq!(record.total_hours_worked, Some(1.5));
    }

    #[tokio::test]
    async fn clock_skew_never_produces_negative_time() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        manager.clock_in(&employee()).await.unwrap();

        fx.clock.advance(-Duration::minutes(10));
        assert_eq!(manager.elapsed(), Elapsed::default());

        let record = manager.clock_out(&[]).await.unwrap();
        assert_eq!(record.total_hours_worked, Some(0.0));
        assert_eq!(record.clock_out, Some(record.clock_in));
    }

    #[tokio::test]
    async fn elapsed_is_monotonic_while_active_and_frozen_after() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        manager.clock_in(&employee()).await.unwrap();

        let mut previous = manager.elapsed();
        for _ in 0..5 {
            fx.clock.advance(Duration::seconds(37));
            let current = manager.elapsed();
            assert!(current >= previous);
            previous = current;
        }

        manager.clock_out(&[]).await.unwrap();
        let frozen = manager.elapsed();
        fx.clock.advance(Duration::hours(3));
        assert_eq!(manager.elapsed(), frozen);
        assert_eq!(frozen.total_seconds(), 185);
    }

    #[tokio::test]
    async fn remote_failure_leaves_state_unchanged() {
        let fx = Fixture::new();
        let mut manager = fx.manager();

        fx.store.set_offline(true);
        assert!(matches!(
            manager.clock_in(&employee()).await,
            Err(LifecycleError::RemoteUnavailable(_))
        ));
        assert_eq!(manager.phase(), SessionPhase::NoSession);
        assert!(fx.cache.is_empty());

        fx.store.set_offline(false);
        manager.clock_in(&employee()).await.unwrap();

        fx.store.set_offline(true);
        assert!(manager.clock_out(&[]).await.is_err());
        assert_eq!(manager.phase(), SessionPhase::Active);
    }

    #[tokio::test]
    async fn reload_reconstructs_completed_session() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        let clocked_in = manager.clock_in(&employee()).await.unwrap();
        let clocked_out = manager.clock_out(&[]).await.unwrap();
        assert!(clocked_out.total_hours_worked.unwrap() >= 0.0);

        let mut reloaded = fx.manager();
        reloaded.load(&employee(), DAY).await.unwrap();

        assert_eq!(reloaded.phase(), SessionPhase::Completed);
        assert_eq!(reloaded.source(), DataSource::Remote);
        let record = reloaded.state().record().unwrap();
        assert_eq!(record.clock_in, clocked_in.clock_in);
        assert_eq!(record.clock_out, clocked_out.clock_out);
    }

    #[tokio::test]
    async fn load_falls_back_to_cache_when_remote_is_down() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        manager.clock_in(&employee()).await.unwrap();

        fx.store.set_offline(true);
        let mut offline = fx.manager();
        offline.load(&employee(), DAY).await.unwrap();

        assert_eq!(offline.phase(), SessionPhase::Active);
        assert_eq!(offline.source(), DataSource::Cache);
    }

    #[tokio::test]
    async fn load_prefers_reachable_remote_over_stale_cache() {
        let fx = Fixture::new();
        let stale = json!({
            "employeeId": "emp-1",
            "date": "2024-03-01",
            "clockIn": {"timestamp": "2024-03-01T08:00:00Z", "id": "att-old"},
            "clockOut": null,
            "tasks": []
        });
        fx.cache.set(&attendance_key(DAY), stale).unwrap();

        let mut manager = fx.manager();
        manager.load(&employee(), DAY).await.unwrap();

        assert_eq!(manager.phase(), SessionPhase::NoSession);
        assert_eq!(manager.source(), DataSource::Remote);
    }

    #[tokio::test]
    async fn load_ignores_cache_of_another_employee() {
        let fx = Fixture::new();
        fx.manager()
            .clock_in(&EmployeeId::new("emp-2"))
            .await
            .unwrap();

        fx.store.set_offline(true);
        let mut manager = fx.manager();
        manager.load(&employee(), DAY).await.unwrap();

        assert_eq!(manager.phase(), SessionPhase::NoSession);
        assert_eq!(manager.source(), DataSource::Unavailable);
    }

    #[tokio::test]
    async fn load_restores_remote_tasks_and_mirrors_them() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        let record = manager.clock_in(&employee()).await.unwrap();
        fx.store
            .create_task(&NewTask {
                attendance_id: record.id.clone(),
                title: "write report".to_string(),
                status: TaskStatus::Pending,
                created_at: fx.clock.now(),
            })
            .await
            .unwrap();

        let mut reloaded = fx.manager();
        let tasks = reloaded.load(&employee(), DAY).await.unwrap();
        assert_eq!(tasks.len(), 1);

        fx.store.set_offline(true);
        let mut offline = fx.manager();
        let cached_tasks = offline.load(&employee(), DAY).await.unwrap();
        assert_eq!(cached_tasks, tasks);
    }

    #[tokio::test]
    async fn clock_out_writes_session_tasks_to_cache() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        let record = manager.clock_in(&employee()).await.unwrap();
        let task = Task {
            id: crate::domain::models::TaskId::new("task-1"),
            title: "write report".to_string(),
            status: TaskStatus::Pending,
            attendance_id: record.id,
            created_at: fx.clock.now(),
        };
        manager.clock_out(std::slice::from_ref(&task)).await.unwrap();

        let cached: CachedAttendance =
            serde_json::from_value(fx.cache.get(&attendance_key(DAY)).unwrap()).unwrap();
        assert_eq!(cached.tasks, vec![task]);
        assert!(cached.clock_out.is_some());
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let fx = Fixture::new();
        let mut manager = fx.manager();
        let rx = manager.subscribe();

        manager.clock_in(&employee()).await.unwrap();
        assert_eq!(rx.borrow().phase(), SessionPhase::Active);

        manager.clock_out(&[]).await.unwrap();
        assert_eq!(rx.borrow().phase(), SessionPhase::Completed);
    }
}
