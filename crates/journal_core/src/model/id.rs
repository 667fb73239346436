//! Record identifiers.

use chrono::Utc;

/// Creation-time derived identifier (epoch milliseconds, bumped on collision).
pub type RecordId = i64;

/// Hands out strictly increasing ids derived from the wall clock.
///
/// Two records created within the same millisecond still get distinct ids:
/// the generator never returns a value `<=` the last one it issued or observed.
#[derive(Debug, Clone, Default)]
pub struct RecordIdGenerator {
    last: RecordId,
}

impl RecordIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts after the largest id already present in loaded data.
    pub fn seeded(ids: impl IntoIterator<Item = RecordId>) -> Self {
        let mut generator = Self::new();
        for id in ids {
            generator.observe(id);
        }
        generator
    }

    /// Records an externally assigned id so it is never reissued.
    pub fn observe(&mut self, id: RecordId) {
        self.last = self.last.max(id);
    }

    /// Next id for the current wall-clock time.
    pub fn next_id(&mut self) -> RecordId {
        self.next_at(Utc::now().timestamp_millis())
    }

    /// Next id for a given epoch-millisecond clock reading.
    pub fn next_at(&mut self, now_ms: i64) -> RecordId {
        let id = now_ms.max(self.last.saturating_add(1));
        self.last = id;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::RecordIdGenerator;

    #[test]
    fn ids_follow_the_clock_when_it_advances() {
        let mut ids = RecordIdGenerator::new();
        assert_eq!(ids.next_at(1_000), 1_000);
        assert_eq!(ids.next_at(5_000), 5_000);
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond_and_across_clock_skew() {
        let mut ids = RecordIdGenerator::new();
        let a = ids.next_at(1_000);
        let b = ids.next_at(1_000);
        let c = ids.next_at(999);
        assert!(a < b && b < c);
    }

    #[test]
    fn seeded_generator_skips_existing_ids() {
        let mut ids = RecordIdGenerator::seeded([3, 9_000, 12]);
        assert_eq!(ids.next_at(10), 9_001);
    }
}
