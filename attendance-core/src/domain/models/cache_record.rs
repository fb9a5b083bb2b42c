//! Shapes mirrored into the local cache.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use super::{AttendanceId, AttendanceRecord, EmployeeId, Task};

/// Cache key for the attendance mirror of a business day.
pub fn attendance_key(date: Date) -> String {
    format!("attendance_{date}")
}

/// Cache key for a stashed leave form.
pub fn leave_draft_key(draft_key: &str) -> String {
    format!("leave_draft_{draft_key}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedClockIn {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub id: AttendanceId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedClockOut {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub hours_worked: f64,
}

/// Local mirror of one day's session and its tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedAttendance {
    pub employee_id: EmployeeId,
    pub date: Date,
    pub clock_in: CachedClockIn,
    #[serde(default)]
    pub clock_out: Option<CachedClockOut>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl CachedAttendance {
    pub fn from_record(record: &AttendanceRecord, tasks: &[Task]) -> Self {
        Self {
            employee_id: record.employee_id.clone(),
            date: record.date,
            clock_in: CachedClockIn {
                timestamp: record.clock_in,
                id: record.id.clone(),
            },
            clock_out: record.clock_out.map(|timestamp| CachedClockOut {
                timestamp,
                hours_worked: record.total_hours_worked.unwrap_or_default(),
            }),
            tasks: tasks.to_vec(),
        }
    }

    pub fn to_record(&self) -> AttendanceRecord {
        AttendanceRecord {
            id: self.clock_in.id.clone(),
            employee_id: self.employee_id.clone(),
            date: self.date,
            clock_in: self.clock_in.timestamp,
            clock_out: self.clock_out.as_ref().map(|out| out.timestamp),
            total_hours_worked: self.clock_out.as_ref().map(|out| out.hours_worked),
        }
    }
}
