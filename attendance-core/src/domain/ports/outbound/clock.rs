use time::{Date, OffsetDateTime};

/// Outbound port supplying the current time.
///
/// The engine never reads the wall clock directly so tests can pin time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> OffsetDateTime;

    /// Calendar date of `now` in the clock's own offset.
    fn today(&self) -> Date {
        self.now().date()
    }
}
