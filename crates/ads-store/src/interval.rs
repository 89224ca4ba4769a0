use ads_model::AdId;

/// A closed-or-half-open integer interval carrying an ad id as payload.
///
/// Assigns each inserted segment a monotonically increasing integer id from
/// a private counter, rather than relying on pointer identity.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    id: u64,
    start: i64,
    end: i64,
    payload: AdId,
}

/// An interval index over `i64` bounds. Used for the time window
/// (`[StartAt, EndAt)`, half-open) and the age window (`[AgeStart, AgeEnd]`,
/// closed).
///
/// The read path (`ads-store`'s `Store::get_ads`) does not currently
/// consult this index for filtering; see DESIGN.md for why. It is kept as a
/// first-class, independently correct structure so that it's available the
/// moment an accelerated read path is wanted, without changing the
/// observable result set.
#[derive(Debug, Default)]
pub struct IntervalIndex {
    next_id: u64,
    segments: Vec<Segment>,
}

impl IntervalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new segment `[start, end]` (inclusive of both ends is the
    /// caller's choice — this index itself is agnostic to open/closed
    /// convention, it just stores bounds) carrying `payload`.
    pub fn insert(&mut self, start: i64, end: i64, payload: AdId) {
        let id = self.next_id;
        self.next_id += 1;
        self.segments.push(Segment {
            id,
            start,
            end,
            payload,
        });
    }

    /// Returns the ad ids of every segment whose `[start, end]` bound
    /// contains `point`, using a closed-interval test on both sides. Callers
    /// wanting a half-open test on the upper bound should pass `point` and
    /// post-filter, or subtract one from `point` before calling.
    pub fn contains_point(&self, point: i64) -> impl Iterator<Item = &AdId> {
        self.segments
            .iter()
            .filter(move |seg| seg.start <= point && point <= seg.end)
            .map(|seg| &seg.payload)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_point_is_closed_on_both_ends() {
        let mut idx = IntervalIndex::new();
        idx.insert(10, 20, AdId::new("a"));
        let hits: Vec<_> = idx.contains_point(10).map(|id| id.to_string()).collect();
        assert_eq!(hits, vec!["a".to_string()]);
        let hits: Vec<_> = idx.contains_point(20).map(|id| id.to_string()).collect();
        assert_eq!(hits, vec!["a".to_string()]);
        assert_eq!(idx.contains_point(21).count(), 0);
        assert_eq!(idx.contains_point(9).count(), 0);
    }

    #[test]
    fn segment_ids_are_monotonic_not_pointer_derived() {
        let mut idx = IntervalIndex::new();
        for i in 0..5 {
            idx.insert(i, i + 1, AdId::new(format!("ad-{i}")));
        }
        assert_eq!(idx.next_id, 5);
        assert_eq!(idx.len(), 5);
    }
}
