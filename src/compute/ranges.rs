//! Range planning: merging covering ranges and splitting them on partition
//! boundaries.
//!
//! Covering cells arrive as contiguous intervals of the 64-bit index. They
//! are first coalesced into disjoint ranges, then cut wherever a range
//! crosses from one partition key into the next so that each piece can be
//! scanned with a single equality condition on the partition key.

use crate::error::{GeoError, Result};
use crate::types::{DispatchTask, IndexRange};
use smallvec::SmallVec;

/// Bits in an index value.
pub const INDEX_BITS: u32 = 64;

impl IndexRange {
    /// Two ranges can merge when they overlap or are contiguous.
    pub fn can_merge(&self, other: &IndexRange) -> bool {
        self.min <= other.max.saturating_add(1) && other.min <= self.max.saturating_add(1)
    }

    /// Widen `self` to absorb `other` when they overlap or touch.
    pub fn try_merge(&mut self, other: &IndexRange) -> bool {
        if !self.can_merge(other) {
            return false;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        true
    }
}

/// Single-pass merge.
///
/// Each input range is merged into the first accumulated range it overlaps or
/// touches, otherwise appended. Order follows first appearance. The pass does
/// not revisit earlier entries, so on unsorted input two accumulated ranges
/// may end up touching; sort the input or use [`merge_until_stable`] when a
/// minimal result is required.
///
/// ```rust
/// use geodex::IndexRange;
/// use geodex::compute::ranges::merge;
///
/// let merged = merge([IndexRange::new(1, 5), IndexRange::new(6, 10), IndexRange::new(20, 25)]);
/// assert_eq!(merged, vec![IndexRange::new(1, 10), IndexRange::new(20, 25)]);
/// ```
pub fn merge<I>(ranges: I) -> Vec<IndexRange>
where
    I: IntoIterator<Item = IndexRange>,
{
    let mut merged: Vec<IndexRange> = Vec::new();

    for range in ranges {
        if !merged.iter_mut().any(|existing| existing.try_merge(&range)) {
            merged.push(range);
        }
    }

    merged
}

/// Re-run [`merge`] until the range count stops shrinking.
pub fn merge_until_stable<I>(ranges: I) -> Vec<IndexRange>
where
    I: IntoIterator<Item = IndexRange>,
{
    let mut current = merge(ranges);
    loop {
        let before = current.len();
        current = merge(current);
        if current.len() == before {
            return current;
        }
    }
}

/// Sort by lower bound, then merge. The result is minimal and ordered.
pub fn merge_sorted(mut ranges: Vec<IndexRange>) -> Vec<IndexRange> {
    ranges.sort_unstable();
    merge(ranges)
}

/// Maps index values to partition keys.
///
/// The partition key of a value is `value / span`; every partition covers
/// `span` consecutive index values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionScheme {
    span: u64,
}

impl PartitionScheme {
    /// Scheme keyed on the top `2 * length` bits of the index, so one
    /// partition spans `2^(64 - 2 * length)` values.
    pub fn from_key_length(length: u8) -> Result<Self> {
        if !(1..=31).contains(&length) {
            return Err(GeoError::InvalidConfig(format!(
                "partition key length must be between 1 and 31, got {}",
                length
            )));
        }
        let shift = INDEX_BITS - 2 * u32::from(length);
        Ok(Self { span: 1u64 << shift })
    }

    /// Scheme with an explicit partition width.
    pub fn with_span(span: u64) -> Result<Self> {
        if span == 0 {
            return Err(GeoError::InvalidConfig(
                "partition span must be greater than zero".into(),
            ));
        }
        Ok(Self { span })
    }

    pub const fn span(&self) -> u64 {
        self.span
    }

    pub const fn partition_key(&self, index: u64) -> u64 {
        index / self.span
    }

    /// Inclusive bounds of the partition containing `index`.
    pub fn partition_bounds(&self, index: u64) -> IndexRange {
        let start = index - index % self.span;
        IndexRange {
            min: start,
            max: start.saturating_add(self.span - 1),
        }
    }

    /// Cut `range` at partition boundaries.
    ///
    /// Pieces are ordered, disjoint, each inside one partition, and their
    /// union is exactly `range`.
    ///
    /// ```rust
    /// use geodex::IndexRange;
    /// use geodex::compute::ranges::PartitionScheme;
    ///
    /// let scheme = PartitionScheme::with_span(100).unwrap();
    /// let pieces = scheme.split(IndexRange::new(95, 205));
    /// assert_eq!(
    ///     pieces.as_slice(),
    ///     &[IndexRange::new(95, 99), IndexRange::new(100, 199), IndexRange::new(200, 205)]
    /// );
    /// ```
    pub fn split(&self, range: IndexRange) -> SmallVec<[IndexRange; 4]> {
        let mut pieces = SmallVec::new();
        let mut lo = range.min;

        loop {
            let hi = self.partition_bounds(lo).max.min(range.max);
            pieces.push(IndexRange { min: lo, max: hi });
            if hi == range.max {
                break;
            }
            lo = hi + 1;
        }

        pieces
    }

    /// Split every range and tag each piece with its partition key.
    pub fn plan_tasks<'a, I>(&self, ranges: I) -> Vec<DispatchTask>
    where
        I: IntoIterator<Item = &'a IndexRange>,
    {
        ranges
            .into_iter()
            .flat_map(|range| self.split(*range))
            .map(|piece| DispatchTask {
                range: piece,
                partition_key: self.partition_key(piece.min),
            })
            .collect()
    }
}
