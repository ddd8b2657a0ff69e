use time::OffsetDateTime;
use uuid::Uuid;

/// Hands out identifiers for client-assigned checklist items.
pub trait IdSource {
    fn next_id(&mut self) -> i64;
}

/// Numeric instant source, epoch milliseconds.
pub trait Clock {
    fn now(&self) -> i64;
}

/// Random ids folded from the high half of a v4 UUID, kept non-negative so
/// they stay inside the canonical `i64` identifier space.
#[derive(Debug, Default)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&mut self) -> i64 {
        let (high, _) = Uuid::new_v4().as_u64_pair();
        (high & i64::MAX as u64) as i64
    }
}

/// Deterministic incrementing source for non-interactive runs and tests.
#[derive(Debug)]
pub struct SequenceIds {
    next: i64,
}

impl SequenceIds {
    pub fn starting_at(next: i64) -> Self {
        Self { next }
    }
}

impl IdSource for SequenceIds {
    fn next_id(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

#[derive(Debug, Default)]
pub struct WallClock;

impl Clock for WallClock {
    fn now(&self) -> i64 {
        (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
    }
}
