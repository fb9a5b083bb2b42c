use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::Date;

use super::{EmployeeId, LeaveId};

/// Kind of leave. Half-day and short leave are fixed single-day types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum LeaveType {
    Casual,
    Sick,
    HalfDay,
    ShortLeave,
}

impl LeaveType {
    pub fn is_single_day(&self) -> bool {
        matches!(self, LeaveType::HalfDay | LeaveType::ShortLeave)
    }
}

/// Review status of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// Only pending requests move, and only to a final decision.
    pub fn can_transition_to(&self, next: LeaveStatus) -> bool {
        matches!(
            (self, next),
            (LeaveStatus::Pending, LeaveStatus::Approved) | (LeaveStatus::Pending, LeaveStatus::Rejected)
        )
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

/// A leave request as held by the authoritative store.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveRequest {
    pub id: LeaveId,
    pub employee_id: EmployeeId,
    pub leave_type: LeaveType,
    pub start_date: Date,
    pub end_date: Date,
    pub reason: String,
    pub status: LeaveStatus,
    pub applied_date: Date,
}

impl LeaveRequest {
    pub fn is_editable(&self) -> bool {
        self.status == LeaveStatus::Pending
    }
}

/// Leave form input. `id` is set when editing an existing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<LeaveId>,
    pub leave_type: LeaveType,
    pub start_date: Date,
    pub end_date: Date,
    pub reason: String,
}

impl LeaveDraft {
    pub fn new(leave_type: LeaveType, start_date: Date, end_date: Date, reason: impl Into<String>) -> Self {
        Self {
            id: None,
            leave_type,
            start_date,
            end_date,
            reason: reason.into(),
        }
    }

    /// A single-day draft for half-day or short leave.
    pub fn single_day(leave_type: LeaveType, date: Date, reason: impl Into<String>) -> Self {
        Self::new(leave_type, date, date, reason)
    }

    pub fn editing(mut self, id: impl Into<LeaveId>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Data for creating a leave request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeave {
    pub employee_id: EmployeeId,
    pub leave_type: LeaveType,
    pub start_date: Date,
    pub end_date: Date,
    pub reason: String,
    pub status: LeaveStatus,
    pub applied_date: Date,
}

/// Partial update of a leave request. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeavePatch {
    pub leave_type: Option<LeaveType>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub reason: Option<String>,
    pub status: Option<LeaveStatus>,
}

impl LeavePatch {
    pub fn status(status: LeaveStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, request: &mut LeaveRequest) {
        if let Some(leave_type) = self.leave_type {
            request.leave_type = leave_type;
        }
        if let Some(start_date) = self.start_date {
            request.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            request.end_date = end_date;
        }
        if let Some(reason) = &self.reason {
            request.reason = reason.clone();
        }
        if let Some(status) = self.status {
            request.status = status;
        }
    }
}

/// Remaining leave allowance in days, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaveQuota {
    pub remaining_days: f64,
}

/// An employee's requests together with their current quota.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeLeaves {
    pub requests: Vec<LeaveRequest>,
    pub quota: LeaveQuota,
}

/// Read-side filter over the held leave requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaveFilter {
    pub status: Option<LeaveStatus>,
    pub employee_id: Option<EmployeeId>,
}

impl LeaveFilter {
    pub fn with_status(mut self, status: LeaveStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_employee(mut self, employee_id: impl Into<EmployeeId>) -> Self {
        self.employee_id = Some(employee_id.into());
        self
    }

    pub fn matches(&self, request: &LeaveRequest) -> bool {
        self.status.map_or(true, |status| request.status == status)
            && self
                .employee_id
                .as_ref()
                .map_or(true, |employee_id| &request.employee_id == employee_id)
    }
}
