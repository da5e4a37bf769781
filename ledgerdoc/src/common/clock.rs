use chrono::{DateTime, Utc};

/// Source of the timestamps written into `createdAt` and `updatedAt`.
///
/// A driver may re-run a whole transaction body after a conflict. Each run asks
/// the clock again, so callers that need identical stamps across retries either
/// stamp the document before opening the transaction or use a [FixedClock].
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock time in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
