use std::sync::Arc;

use itertools::Itertools;
use time::Date;
use tracing::{debug, info, instrument, warn};

use crate::domain::{
    models::{
        leave_draft_key, Actor, EmployeeId, LeaveDraft, LeaveFilter, LeaveId, LeavePatch,
        LeaveQuota, LeaveRequest, LeaveStatus, LeaveType, NewLeave,
    },
    ports::outbound::{LocalCache, RemoteStore},
    LifecycleError,
};

/// Days a leave request consumes.
///
/// Casual and sick leave count every calendar day from start to end inclusive.
/// Half-day and short leave are fixed amounts that ignore the dates.
pub fn compute_duration(start_date: Date, end_date: Date, leave_type: LeaveType) -> f64 {
    match leave_type {
        LeaveType::Casual | LeaveType::Sick => ((end_date - start_date).whole_days() + 1) as f64,
        LeaveType::HalfDay => 0.5,
        LeaveType::ShortLeave => 0.25,
    }
}

/// Check a draft against the leave invariants as of `today`.
pub fn validate(draft: &LeaveDraft, today: Date) -> Result<(), LifecycleError> {
    if draft.reason.trim().is_empty() {
        return Err(LifecycleError::EmptyInput("reason"));
    }

    if draft.leave_type.is_single_day() {
        if draft.end_date != draft.start_date {
            return Err(LifecycleError::InvalidDateRange(format!(
                "{} leave must start and end on the same day",
                draft.leave_type
            )));
        }
    } else if draft.end_date < draft.start_date {
        return Err(LifecycleError::InvalidDateRange(format!(
            "end date {} is before start date {}",
            draft.end_date, draft.start_date
        )));
    }

    if draft.start_date < today {
        return Err(LifecycleError::PastDate);
    }

    Ok(())
}

/// Owns the leave requests visible to the current actor and the quota projection.
pub struct LeaveEngine<S, K> {
    store: Arc<S>,
    cache: Arc<K>,
    requests: Vec<LeaveRequest>,
    quota: Option<LeaveQuota>,
    quota_owner: Option<EmployeeId>,
}

impl<S: RemoteStore, K: LocalCache> LeaveEngine<S, K> {
    pub fn new(store: Arc<S>, cache: Arc<K>) -> Self {
        Self {
            store,
            cache,
            requests: Vec::new(),
            quota: None,
            quota_owner: None,
        }
    }

    pub fn requests(&self) -> &[LeaveRequest] {
        &self.requests
    }

    pub fn get(&self, id: &LeaveId) -> Option<&LeaveRequest> {
        self.requests.iter().find(|r| &r.id == id)
    }

    /// Held requests matching `filter`, newest start date first.
    pub fn filter(&self, filter: &LeaveFilter) -> Vec<&LeaveRequest> {
        self.requests
            .iter()
            .filter(|r| filter.matches(r))
            .sorted_by(|a, b| b.start_date.cmp(&a.start_date))
            .collect()
    }

    /// Last quota read from the store; `None` when unknown or stale.
    pub fn quota(&self) -> Option<LeaveQuota> {
        self.quota
    }

    /// Reload the working set for `actor`.
    ///
    /// Employees see their own requests; reviewers see every request.
    #[instrument(skip(self), fields(employee_id = %actor.employee_id, role = %actor.role))]
    pub async fn refresh(&mut self, actor: &Actor) -> Result<(), LifecycleError> {
        if actor.is_reviewer() {
            self.requests = self.store.list_leaves().await?;
            self.quota_owner = Some(actor.employee_id.clone());
            self.refetch_quota().await;
        } else {
            let leaves = self.store.get_leave_by_employee(&actor.employee_id).await?;
            self.requests = leaves.requests;
            self.quota = Some(leaves.quota);
            self.quota_owner = Some(actor.employee_id.clone());
        }

        debug!(count = self.requests.len(), "Loaded leave requests");
        Ok(())
    }

    /// Create a request, or edit one when the draft carries an id.
    ///
    /// Edits keep the stored status untouched. All checks run before the store
    /// is contacted.
    #[instrument(skip(self, draft), fields(employee_id = %actor.employee_id, leave_id = ?draft.id))]
    pub async fn submit(
        &mut self,
        actor: &Actor,
        draft: &LeaveDraft,
        today: Date,
    ) -> Result<LeaveRequest, LifecycleError> {
        let saved = match &draft.id {
            None => {
                validate(draft, today)?;
                let new_leave = NewLeave {
                    employee_id: actor.employee_id.clone(),
                    leave_type: draft.leave_type,
                    start_date: draft.start_date,
                    end_date: draft.end_date,
                    reason: draft.reason.trim().to_string(),
                    status: LeaveStatus::Pending,
                    applied_date: today,
                };
                let created = self.store.create_leave(&new_leave).await?;
                self.requests.push(created.clone());
                info!(leave_id = %created.id, leave_type = %created.leave_type, "Leave request created");
                created
            }
            Some(id) => {
                let existing = self
                    .get(id)
                    .ok_or_else(|| LifecycleError::not_found(format!("leave {id}")))?;
                if !existing.is_editable() {
                    return Err(LifecycleError::NotEditable);
                }
                validate(draft, today)?;

                let patch = LeavePatch {
                    leave_type: Some(draft.leave_type),
                    start_date: Some(draft.start_date),
                    end_date: Some(draft.end_date),
                    reason: Some(draft.reason.trim().to_string()),
                    status: Some(existing.status),
                };
                let updated = self.store.update_leave(id, &patch).await?;
                self.replace(updated.clone());
                info!(leave_id = %updated.id, "Leave request updated");
                updated
            }
        };

        if self.quota_owner.is_none() {
            self.quota_owner = Some(actor.employee_id.clone());
        }
        self.refetch_quota().await;
        Ok(saved)
    }

    /// Withdraw a pending request.
    #[instrument(skip(self))]
    pub async fn delete(&mut self, id: &LeaveId) -> Result<(), LifecycleError> {
        let existing = self
            .get(id)
            .ok_or_else(|| LifecycleError::not_found(format!("leave {id}")))?;
        if !existing.is_editable() {
            return Err(LifecycleError::NotEditable);
        }

        self.store.delete_leave(id).await?;
        self.requests.retain(|r| &r.id != id);
        info!("Leave request deleted");

        self.refetch_quota().await;
        Ok(())
    }

    /// Record a reviewer decision. The request is immutable afterwards.
    ///
    /// The held quota is re-read only when it belongs to the owner of the
    /// decided request.
    #[instrument(skip(self))]
    pub async fn transition_status(
        &mut self,
        id: &LeaveId,
        next: LeaveStatus,
    ) -> Result<LeaveRequest, LifecycleError> {
        let existing = self
            .get(id)
            .ok_or_else(|| LifecycleError::not_found(format!("leave {id}")))?;
        if !existing.status.can_transition_to(next) {
            return Err(LifecycleError::invalid_transition(format!(
                "leave {id} cannot move from {} to {next}",
                existing.status
            )));
        }

        let updated = self.store.update_leave(id, &LeavePatch::status(next)).await?;
        self.replace(updated.clone());
        info!(status = %updated.status, "Leave request reviewed");

        if self.quota_owner.as_ref() == Some(&updated.employee_id) {
            self.refetch_quota().await;
        }
        Ok(updated)
    }

    /// Keep an unsent form so it can be restored later.
    pub fn stash_draft(&self, draft_key: &str, draft: &LeaveDraft) {
        let value = match serde_json::to_value(draft) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Failed to encode leave draft");
                return;
            }
        };
        if let Err(e) = self.cache.set(&leave_draft_key(draft_key), value) {
            warn!(error = %e, "Failed to stash leave draft");
        }
    }

    pub fn restore_draft(&self, draft_key: &str) -> Option<LeaveDraft> {
        let value = self.cache.get(&leave_draft_key(draft_key))?;
        match serde_json::from_value(value) {
            Ok(draft) => Some(draft),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable leave draft");
                None
            }
        }
    }

    pub fn discard_draft(&self, draft_key: &str) {
        if let Err(e) = self.cache.remove(&leave_draft_key(draft_key)) {
            warn!(error = %e, "Failed to discard leave draft");
        }
    }

    fn replace(&mut self, request: LeaveRequest) {
        match self.requests.iter_mut().find(|r| r.id == request.id) {
            Some(slot) => *slot = request,
            None => self.requests.push(request),
        }
    }

    /// Re-read the quota after a mutation. A failed read leaves the quota
    /// unknown instead of keeping a value the mutation just invalidated.
    async fn refetch_quota(&mut self) {
        let Some(owner) = self.quota_owner.clone() else {
            debug!("No quota owner yet, skipping quota refresh");
            return;
        };

        match self.store.get_leave_by_employee(&owner).await {
            Ok(leaves) => self.quota = Some(leaves.quota),
            Err(e) => {
                warn!(error = %e, employee_id = %owner, "Failed to refresh leave quota");
                self.quota = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::{InMemoryRemoteStore, MemoryCache};
    use time::macros::date;

    const TODAY: Date = date!(2024 - 02 - 20);

    fn engine(store: &InMemoryRemoteStore) -> LeaveEngine<InMemoryRemoteStore, MemoryCache> {
        LeaveEngine::new(Arc::new(store.clone()), Arc::new(MemoryCache::new()))
    }

    fn trip() -> LeaveDraft {
        LeaveDraft::new(LeaveType::Casual, date!(2024 - 03 - 01), date!(2024 - 03 - 03), "trip")
    }

    fn decided(id: &str, status: LeaveStatus) -> LeaveRequest {
        LeaveRequest {
            id: LeaveId::new(id),
            employee_id: EmployeeId::new("emp-1"),
            leave_type: LeaveType::Sick,
            start_date: date!(2024 - 01 - 10),
            end_date: date!(2024 - 01 - 11),
            reason: "flu".to_string(),
            status,
            applied_date: date!(2024 - 01 - 09),
        }
    }

    #[test]
    fn duration_follows_leave_type() {
        assert_eq!(compute_duration(date!(2024 - 01 - 01), date!(2024 - 01 - 03), LeaveType::Casual), 3.0);
        assert_eq!(compute_duration(date!(2024 - 01 - 05), date!(2024 - 01 - 05), LeaveType::Sick), 1.0);
        assert_eq!(compute_duration(date!(2024 - 01 - 05), date!(2024 - 01 - 05), LeaveType::HalfDay), 0.5);
        assert_eq!(compute_duration(date!(2024 - 01 - 05), date!(2024 - 01 - 05), LeaveType::ShortLeave), 0.25);
    }

    #[test]
    fn duration_of_fixed_types_ignores_span() {
        assert_eq!(compute_duration(date!(2024 - 01 - 01), date!(2024 - 01 - 09), LeaveType::HalfDay), 0.5);
        assert_eq!(compute_duration(date!(2024 - 01 - 01), date!(2024 - 01 - 09), LeaveType::ShortLeave), 0.25);
    }

    #[test]
    fn duration_spans_month_boundaries() {
        assert_eq!(compute_duration(date!(2024 - 02 - 28), date!(2024 - 03 - 01), LeaveType::Casual), 3.0);
    }

    #[test]
    fn validate_rejects_blank_reason() {
        let draft = LeaveDraft::new(LeaveType::Sick, TODAY, TODAY, "   ");
        assert_eq!(validate(&draft, TODAY), Err(LifecycleError::EmptyInput("reason")));
    }

    #[test]
    fn validate_rejects_reversed_range() {
        let draft = LeaveDraft::new(LeaveType::Casual, date!(2024 - 03 - 03), date!(2024 - 03 - 01), "trip");
        assert!(matches!(validate(&draft, TODAY), Err(LifecycleError::InvalidDateRange(_))));
    }

    #[test]
    fn validate_rejects_multi_day_half_day() {
        let draft = LeaveDraft::new(LeaveType::HalfDay, date!(2024 - 03 - 01), date!(2024 - 03 - 02), "dentist");
        assert!(matches!(validate(&draft, TODAY), Err(LifecycleError::InvalidDateRange(_))));
    }

    #[test]
    fn validate_rejects_past_start_but_allows_today() {
        let past = LeaveDraft::new(LeaveType::Sick, date!(2024 - 02 - 19), date!(2024 - 02 - 19), "flu");
        assert_eq!(validate(&past, TODAY), Err(LifecycleError::PastDate));

        let today = LeaveDraft::single_day(LeaveType::ShortLeave, TODAY, "errand");
        assert_eq!(validate(&today, TODAY), Ok(()));
    }

    #[tokio::test]
    async fn submit_creates_pending_request_and_refreshes_quota() {
        let store = InMemoryRemoteStore::new().with_annual_allowance(10.0);
        let mut engine = engine(&store);
        let actor = Actor::employee("emp-1");

        engine.refresh(&actor).await.unwrap();
        assert_eq!(engine.quota().unwrap().remaining_days, 10.0);

        let created = engine.submit(&actor, &trip(), TODAY).await.unwrap();
        assert_eq!(created.status, LeaveStatus::Pending);
        assert_eq!(created.applied_date, TODAY);
        assert_eq!(compute_duration(created.start_date, created.end_date, created.leave_type), 3.0);
        assert_eq!(engine.quota().unwrap().remaining_days, 7.0);
        assert_eq!(store.calls().last(), Some(&"get_leave_by_employee"));
    }

    #[tokio::test]
    async fn validation_failures_make_no_remote_calls() {
        let store = InMemoryRemoteStore::new();
        let mut engine = engine(&store);
        let actor = Actor::employee("emp-1");

        let blank = LeaveDraft::new(LeaveType::Casual, date!(2024 - 03 - 01), date!(2024 - 03 - 01), "");
        assert!(engine.submit(&actor, &blank, TODAY).await.is_err());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn edit_preserves_status_and_revalidates() {
        let store = InMemoryRemoteStore::new();
        let mut engine = engine(&store);
        let actor = Actor::employee("emp-1");
        let created = engine.submit(&actor, &trip(), TODAY).await.unwrap();

        let edit = LeaveDraft::new(LeaveType::Casual, date!(2024 - 03 - 02), date!(2024 - 03 - 04), "longer trip")
            .editing(created.id.clone());
        let updated = engine.submit(&actor, &edit, TODAY).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.status, LeaveStatus::Pending);
        assert_eq!(updated.reason, "longer trip");
        assert_eq!(engine.requests().len(), 1);

        let bad_edit = LeaveDraft::new(LeaveType::HalfDay, date!(2024 - 03 - 02), date!(2024 - 03 - 04), "x")
            .editing(created.id.clone());
        assert!(matches!(
            engine.submit(&actor, &bad_edit, TODAY).await,
            Err(LifecycleError::InvalidDateRange(_))
        ));
    }

    #[tokio::test]
    async fn approved_and_rejected_requests_are_not_editable() {
        let store = InMemoryRemoteStore::new().with_leaves(vec![
            decided("leave-a", LeaveStatus::Approved),
            decided("leave-r", LeaveStatus::Rejected),
        ]);
        let mut engine = engine(&store);
        let actor = Actor::employee("emp-1");
        engine.refresh(&actor).await.unwrap();
        store.clear_calls();

        for id in ["leave-a", "leave-r"] {
            let edit = trip().editing(id);
            assert_eq!(
                engine.submit(&actor, &edit, TODAY).await,
                Err(LifecycleError::NotEditable)
            );
            assert_eq!(
                engine.delete(&LeaveId::new(id)).await,
                Err(LifecycleError::NotEditable)
            );
        }
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn editing_unknown_request_is_not_found() {
        let store = InMemoryRemoteStore::new();
        let mut engine = engine(&store);
        let edit = trip().editing("leave-missing");

        assert!(matches!(
            engine.submit(&Actor::employee("emp-1"), &edit, TODAY).await,
            Err(LifecycleError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_pending_request_and_restores_quota() {
        let store = InMemoryRemoteStore::new().with_annual_allowance(5.0);
        let mut engine = engine(&store);
        let actor = Actor::employee("emp-1");
        engine.refresh(&actor).await.unwrap();

        let created = engine.submit(&actor, &trip(), TODAY).await.unwrap();
        assert_eq!(engine.quota().unwrap().remaining_days, 2.0);

        engine.delete(&created.id).await.unwrap();
        assert!(engine.requests().is_empty());
        assert!(store.leave_requests().is_empty());
        assert_eq!(engine.quota().unwrap().remaining_days, 5.0);
    }

    #[tokio::test]
    async fn reviewer_decides_once() {
        let store = InMemoryRemoteStore::new();
        let employee = Actor::employee("emp-1");
        let mut employee_engine = engine(&store);
        let created = employee_engine.submit(&employee, &trip(), TODAY).await.unwrap();

        let mut reviewer_engine = engine(&store);
        reviewer_engine.refresh(&Actor::reviewer("hr-1")).await.unwrap();

        assert!(matches!(
            reviewer_engine.transition_status(&created.id, LeaveStatus::Pending).await,
            Err(LifecycleError::InvalidTransition(_))
        ));

        let approved = reviewer_engine
            .transition_status(&created.id, LeaveStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, LeaveStatus::Approved);
        assert!(!reviewer_engine.get(&created.id).unwrap().is_editable());

        assert!(matches!(
            reviewer_engine.transition_status(&created.id, LeaveStatus::Rejected).await,
            Err(LifecycleError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn reviewing_another_employee_keeps_reviewer_quota() {
        let store = InMemoryRemoteStore::new().with_annual_allowance(10.0);
        let created = engine(&store)
            .submit(&Actor::employee("emp-1"), &trip(), TODAY)
            .await
            .unwrap();

        let mut reviewer_engine = engine(&store);
        reviewer_engine.refresh(&Actor::reviewer("hr-1")).await.unwrap();
        let reviewer_quota = reviewer_engine.quota();
        store.clear_calls();

        reviewer_engine
            .transition_status(&created.id, LeaveStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(store.calls(), vec!["update_leave"]);
        assert_eq!(reviewer_engine.quota(), reviewer_quota);
    }

    #[tokio::test]
    async fn failed_quota_read_after_submit_keeps_request_and_clears_quota() {
        let store = InMemoryRemoteStore::new();
        let mut engine = engine(&store);
        let actor = Actor::employee("emp-1");
        engine.refresh(&actor).await.unwrap();
        assert!(engine.quota().is_some());

        store.fail_operation("get_leave_by_employee");
        let created = engine.submit(&actor, &trip(), TODAY).await.unwrap();

        assert_eq!(engine.requests(), std::slice::from_ref(&created));
        assert_eq!(store.leave_requests(), vec![created]);
        assert_eq!(engine.quota(), None);
    }

    #[tokio::test]
    async fn failed_quota_read_after_delete_keeps_deletion() {
        let store = InMemoryRemoteStore::new();
        let mut engine = engine(&store);
        let actor = Actor::employee("emp-1");
        let created = engine.submit(&actor, &trip(), TODAY).await.unwrap();
        assert!(engine.quota().is_some());

        store.fail_operation("get_leave_by_employee");
        engine.delete(&created.id).await.unwrap();

        assert!(engine.requests().is_empty());
        assert!(store.leave_requests().is_empty());
        assert_eq!(engine.quota(), None);
    }

    #[tokio::test]
    async fn failed_remote_delete_keeps_request_and_quota() {
        let store = InMemoryRemoteStore::new();
        let mut engine = engine(&store);
        let actor = Actor::employee("emp-1");
        engine.refresh(&actor).await.unwrap();
        let created = engine.submit(&actor, &trip(), TODAY).await.unwrap();
        assert!(engine.quota().is_some());

        store.set_offline(true);
        assert!(matches!(
            engine.delete(&created.id).await,
            Err(LifecycleError::RemoteUnavailable(_))
        ));
        assert_eq!(engine.requests().len(), 1);
        assert!(engine.quota().is_some());
    }

    #[tokio::test]
    async fn filter_projects_without_mutating() {
        let store = InMemoryRemoteStore::new().with_leaves(vec![
            decided("leave-a", LeaveStatus::Approved),
            decided("leave-r", LeaveStatus::Rejected),
        ]);
        let mut engine = engine(&store);
        engine.refresh(&Actor::reviewer("hr-1")).await.unwrap();

        let approved = engine.filter(&LeaveFilter::default().with_status(LeaveStatus::Approved));
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, LeaveId::new("leave-a"));
        assert_eq!(engine.filter(&LeaveFilter::default().with_employee("emp-9")).len(), 0);
        assert_eq!(engine.requests().len(), 2);
    }

    #[test]
    fn drafts_round_trip_through_cache() {
        let store = InMemoryRemoteStore::new();
        let engine = engine(&store);

        engine.stash_draft("new", &trip());
        assert_eq!(engine.restore_draft("new"), Some(trip()));

        engine.discard_draft("new");
        assert_eq!(engine.restore_draft("new"), None);
    }
}
