use strum::Display;
use time::{Date, OffsetDateTime};

use super::{AttendanceId, EmployeeId};

/// An attendance record as held by the authoritative store.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub id: AttendanceId,
    pub employee_id: EmployeeId,
    /// Business day of the session. Fixed at clock-in.
    pub date: Date,
    pub clock_in: OffsetDateTime,
    pub clock_out: Option<OffsetDateTime>,
    pub total_hours_worked: Option<f64>,
}

impl AttendanceRecord {
    pub fn is_completed(&self) -> bool {
        self.clock_out.is_some()
    }
}

/// Data for creating an attendance record at clock-in.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendance {
    pub employee_id: EmployeeId,
    pub date: Date,
    pub clock_in: OffsetDateTime,
}

/// Fields written at clock-out.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendancePatch {
    pub clock_out: OffsetDateTime,
    pub total_hours_worked: f64,
}

/// Observable phase of the session for the current business day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionPhase {
    NoSession,
    Active,
    Completed,
}

/// State of the session for one business day.
///
/// `Completed` always carries a record with `clock_out` set and `Active` never
/// does; [`SessionState::from_record`] is the only way records enter the state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    NoSession,
    Active(AttendanceRecord),
    Completed(AttendanceRecord),
}

impl SessionState {
    pub fn from_record(record: AttendanceRecord) -> Self {
        if record.is_completed() {
            SessionState::Completed(record)
        } else {
            SessionState::Active(record)
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match self {
            SessionState::NoSession => SessionPhase::NoSession,
            SessionState::Active(_) => SessionPhase::Active,
            SessionState::Completed(_) => SessionPhase::Completed,
        }
    }

    pub fn record(&self) -> Option<&AttendanceRecord> {
        match self {
            SessionState::NoSession => None,
            SessionState::Active(record) | SessionState::Completed(record) => Some(record),
        }
    }

    /// The session id, only while tasks may still be attached to it.
    pub fn active_id(&self) -> Option<&AttendanceId> {
        match self {
            SessionState::Active(record) => Some(&record.id),
            _ => None,
        }
    }

    /// Elapsed working time as seen at `now`.
    ///
    /// Runs while active and is frozen at clock-out once completed.
    pub fn elapsed_at(&self, now: OffsetDateTime) -> Elapsed {
        match self {
            SessionState::NoSession => Elapsed::default(),
            SessionState::Active(record) => Elapsed::between(record.clock_in, now),
            SessionState::Completed(record) => {
                Elapsed::between(record.clock_in, record.clock_out.unwrap_or(record.clock_in))
            }
        }
    }
}

/// Elapsed time split into clock components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Elapsed {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Elapsed {
    /// Time from `start` to `end`, clamped at zero when `end` is earlier.
    pub fn between(start: OffsetDateTime, end: OffsetDateTime) -> Self {
        let total_seconds = (end - start).whole_seconds().max(0);
        Self {
            hours: total_seconds / 3600,
            minutes: (total_seconds % 3600) / 60,
            seconds: total_seconds % 60,
        }
    }

    pub fn total_seconds(&self) -> i64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }
}

impl std::fmt::Display for Elapsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Hours between two instants rounded to two decimals, never negative.
pub fn worked_hours(clock_in: OffsetDateTime, clock_out: OffsetDateTime) -> f64 {
    let seconds = (clock_out - clock_in).as_seconds_f64().max(0.0);
    (seconds / 36.0).round() / 100.0
}

/// Where the in-memory session state was last loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DataSource {
    NotLoaded,
    Remote,
    Cache,
    /// The store was unreachable and nothing was cached.
    Unavailable,
}

/// Read model of the session handed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub record: Option<AttendanceRecord>,
    pub elapsed: Elapsed,
    pub source: DataSource,
}
