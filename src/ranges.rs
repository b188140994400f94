//! Half-open byte intervals and a merged set of them.
//!
//! [`IntervalSet`] records which bytes of a [`RangeFile`](crate::RangeFile) have
//! already been fetched. Memory grows with the number of distinct fetches, not with
//! the size of the file being read.

use std::fmt;
use std::ops::Range;

/// A half-open span `[start, end)`. `end == None` means "to end of data".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: u64,
    pub end: Option<u64>,
}

impl Interval {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "interval start {start} past end {end}");
        Self {
            start,
            end: Some(end),
        }
    }

    /// An interval with no upper bound.
    pub fn starting_at(start: u64) -> Self {
        Self { start, end: None }
    }

    pub fn is_bounded(&self) -> bool {
        self.end.is_some()
    }

    /// Length of a bounded interval, `None` when unbounded.
    pub fn len(&self) -> Option<u64> {
        self.end.map(|end| end.saturating_sub(self.start))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    fn ends_after(&self, offset: u64) -> bool {
        self.end.is_none_or(|end| end > offset)
    }
}

impl From<Range<u64>> for Interval {
    fn from(range: Range<u64>) -> Self {
        Interval::new(range.start, range.end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "[{}, {})", self.start, end),
            None => write!(f, "[{}, ..)", self.start),
        }
    }
}

/// Disjoint, sorted, non-touching bounded intervals.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IntervalSet {
    ranges: Vec<Range<u64>>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `range`, merging it with every stored interval it overlaps or abuts.
    pub fn insert(&mut self, range: Range<u64>) {
        if range.start >= range.end {
            return;
        }
        // First stored interval that ends at or after the new start; everything
        // before it is strictly to the left and untouched.
        let first = self.ranges.partition_point(|r| r.end < range.start);
        // One past the last stored interval that starts at or before the new end.
        let last = self.ranges.partition_point(|r| r.start <= range.end);

        let mut merged = range;
        if first < last {
            merged.start = merged.start.min(self.ranges[first].start);
            merged.end = merged.end.max(self.ranges[last - 1].end);
        }
        self.ranges.splice(first..last, std::iter::once(merged));
    }

    /// Whether every byte of `interval` is stored. Unbounded intervals are never
    /// covered; empty ones always are.
    pub fn covers(&self, interval: &Interval) -> bool {
        let Some(end) = interval.end else {
            return false;
        };
        if interval.start >= end {
            return true;
        }
        self.range_containing(interval.start)
            .is_some_and(|r| r.end >= end)
    }

    /// Sum of the lengths of all stored intervals.
    pub fn total_covered_length(&self) -> u64 {
        self.ranges.iter().map(|r| r.end - r.start).sum()
    }

    /// The stored interval containing `offset`, if any.
    pub fn range_containing(&self, offset: u64) -> Option<Range<u64>> {
        let idx = self.ranges.partition_point(|r| r.start <= offset);
        let candidate = self.ranges.get(idx.checked_sub(1)?)?;
        (offset < candidate.end).then(|| candidate.clone())
    }

    /// Start of the first stored interval beginning strictly after `offset`.
    pub fn next_start_after(&self, offset: u64) -> Option<u64> {
        let idx = self.ranges.partition_point(|r| r.start <= offset);
        self.ranges.get(idx).map(|r| r.start)
    }

    /// The parts of `interval` not covered by the set, in ascending order. The last
    /// gap is unbounded when `interval` is.
    pub fn gaps(&self, interval: &Interval) -> Vec<Interval> {
        let mut gaps = Vec::new();
        let mut cursor = interval.start;
        let first = self.ranges.partition_point(|r| r.end <= interval.start);

        for stored in &self.ranges[first..] {
            if !interval.ends_after(stored.start) {
                break;
            }
            if stored.start > cursor {
                gaps.push(Interval::new(cursor, stored.start));
            }
            cursor = cursor.max(stored.end);
        }

        match interval.end {
            Some(end) if cursor < end => gaps.push(Interval::new(cursor, end)),
            Some(_) => {}
            None => gaps.push(Interval::starting_at(cursor)),
        }
        gaps
    }

    pub fn iter(&self) -> impl Iterator<Item = Range<u64>> + '_ {
        self.ranges.iter().cloned()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(set: &IntervalSet) -> Vec<Range<u64>> {
        set.iter().collect()
    }

    #[test]
    fn test_insert_keeps_disjoint_ranges_sorted() {
        let mut set = IntervalSet::new();
        set.insert(50..60);
        set.insert(10..20);
        set.insert(30..40);
        assert_eq!(stored(&set), vec![10..20, 30..40, 50..60]);
    }

    #[test]
    fn test_insert_merges_overlap_and_adjacency() {
        let mut set = IntervalSet::new();
        set.insert(10..20);
        set.insert(20..30);
        assert_eq!(stored(&set), vec![10..30]);

        set.insert(40..50);
        set.insert(25..45);
        assert_eq!(stored(&set), vec![10..50]);

        set.insert(0..10);
        assert_eq!(stored(&set), vec![0..50]);
    }

    #[test]
    fn test_insert_swallows_several_ranges() {
        let mut set = IntervalSet::new();
        for start in (0..100).step_by(10) {
            set.insert(start..start + 5);
        }
        assert_eq!(set.len(), 10);
        set.insert(3..92);
        assert_eq!(stored(&set), vec![0..95]);
    }

    #[test]
    fn test_insert_ignores_empty_range() {
        let mut set = IntervalSet::new();
        set.insert(5..5);
        assert!(set.is_empty());
    }

    #[test]
    fn test_covers() {
        let mut set = IntervalSet::new();
        set.insert(10..20);
        set.insert(30..40);

        assert!(set.covers(&Interval::new(10, 20)));
        assert!(set.covers(&Interval::new(12, 18)));
        assert!(set.covers(&Interval::new(35, 35)));
        assert!(!set.covers(&Interval::new(15, 35)));
        assert!(!set.covers(&Interval::new(5, 15)));
        assert!(!set.covers(&Interval::new(19, 21)));
        assert!(!set.covers(&Interval::starting_at(30)));
    }

    #[test]
    fn test_range_lookup() {
        let mut set = IntervalSet::new();
        set.insert(10..20);
        set.insert(30..40);

        assert_eq!(set.range_containing(10), Some(10..20));
        assert_eq!(set.range_containing(19), Some(10..20));
        assert_eq!(set.range_containing(20), None);
        assert_eq!(set.range_containing(5), None);
        assert_eq!(set.next_start_after(0), Some(10));
        assert_eq!(set.next_start_after(10), Some(30));
        assert_eq!(set.next_start_after(30), None);
    }

    #[test]
    fn test_gaps() {
        let mut set = IntervalSet::new();
        set.insert(10..20);
        set.insert(30..40);

        assert_eq!(
            set.gaps(&Interval::new(0, 50)),
            vec![
                Interval::new(0, 10),
                Interval::new(20, 30),
                Interval::new(40, 50)
            ]
        );
        assert_eq!(set.gaps(&Interval::new(15, 35)), vec![Interval::new(20, 30)]);
        assert!(set.gaps(&Interval::new(12, 18)).is_empty());
        assert_eq!(
            set.gaps(&Interval::starting_at(15)),
            vec![Interval::new(20, 30), Interval::starting_at(40)]
        );
        assert_eq!(set.gaps(&Interval::starting_at(45)), vec![Interval::starting_at(45)]);
    }

    #[test]
    fn test_random_inserts_match_brute_force_union() {
        // xorshift, deterministic
        let mut state = 0x2545_f491_4f6c_dd1d_u64;
        let mut next = move |bound: u64| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state % bound
        };

        let mut set = IntervalSet::new();
        let mut bitmap = vec![false; 600];
        for _ in 0..300 {
            let start = next(500);
            let end = start + next(40);
            set.insert(start..end);
            for b in &mut bitmap[start as usize..end as usize] {
                *b = true;
            }

            let ranges = stored(&set);
            for pair in ranges.windows(2) {
                assert!(pair[0].end < pair[1].start, "{ranges:?} not disjoint");
            }
            let expected = bitmap.iter().filter(|b| **b).count() as u64;
            assert_eq!(set.total_covered_length(), expected);
        }
    }
}
