//! Attendance and leave lifecycle engine.
//!
//! The domain layer owns the daily attendance session, the tasks bound to it and
//! the leave-request lifecycle. Storage is reached through the outbound ports in
//! [`domain::ports::outbound`]; [`adapters`] holds the in-process implementations.

pub mod adapters;
pub mod domain;
