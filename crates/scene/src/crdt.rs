//! CRDT building blocks: identifiers, last-write-wins cells, sequences.

use std::fmt;

/// A CRDT node identifier, also used as a Lamport-style timestamp.
///
/// Ordering compares `part1` first, then `part2`, which is exactly the
/// dominance order for last-write-wins resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CrdtId {
    pub part1: u8,
    pub part2: u64,
}

impl CrdtId {
    pub const ZERO: CrdtId = CrdtId { part1: 0, part2: 0 };

    pub const fn new(part1: u8, part2: u64) -> Self {
        Self { part1, part2 }
    }
}

impl fmt::Display for CrdtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CrdtId({}, {})", self.part1, self.part2)
    }
}

/// A value paired with the timestamp of the write that produced it.
///
/// Concurrent writes resolve to the higher timestamp; equal timestamps are
/// tolerated (the later arrival is kept).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LwwValue<T> {
    pub timestamp: CrdtId,
    pub value: T,
}

impl<T> LwwValue<T> {
    pub fn new(timestamp: CrdtId, value: T) -> Self {
        Self { timestamp, value }
    }

    /// A value with the zero timestamp, dominated by any real write.
    pub fn initial(value: T) -> Self {
        Self {
            timestamp: CrdtId::ZERO,
            value,
        }
    }
}

/// One element of a CRDT sequence.
///
/// `left_id`/`right_id` record where the producer inserted the item; they
/// are retained for fidelity but never used to re-order (the file's
/// delivery order is authoritative for this read-only consumer). An item
/// with `deleted_length > 0` is a tombstone and contributes no content.
#[derive(Debug, Clone, PartialEq)]
pub struct CrdtSequenceItem<T> {
    pub item_id: CrdtId,
    pub left_id: CrdtId,
    pub right_id: CrdtId,
    pub deleted_length: u32,
    pub value: T,
}

impl<T> CrdtSequenceItem<T> {
    pub fn is_tombstone(&self) -> bool {
        self.deleted_length > 0
    }
}

/// An append-only sequence of CRDT items in file delivery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrdtSequence<T> {
    pub items: Vec<CrdtSequenceItem<T>>,
}

impl<T> CrdtSequence<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: CrdtSequenceItem<T>) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CrdtSequenceItem<T>> {
        self.items.iter()
    }

    /// Iterates the items that carry content (skips tombstones).
    pub fn live(&self) -> impl Iterator<Item = &CrdtSequenceItem<T>> {
        self.items.iter().filter(|item| !item.is_tombstone())
    }
}

impl<'a, T> IntoIterator for &'a CrdtSequence<T> {
    type Item = &'a CrdtSequenceItem<T>;
    type IntoIter = std::slice::Iter<'a, CrdtSequenceItem<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
