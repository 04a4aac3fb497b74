//! Grouping over sorted and unsorted wrapper streams.

use std::iter::Peekable;

use crate::wrappers::HistoWrapper;

/// A materialized wrapper sequence that is known to be sorted.
///
/// Produced only by [`sort_wrappers`](super::sort_wrappers); grouping by a
/// key consistent with the sort is guaranteed to see equal keys adjacent, so
/// [`Sorted::group`] cannot silently split a key into several groups.
pub struct Sorted {
    wrps: Vec<HistoWrapper>,
}

impl Sorted {
    pub(super) fn new(wrps: Vec<HistoWrapper>) -> Self {
        Self { wrps }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoWrapper> {
        self.wrps.iter()
    }

    pub fn len(&self) -> usize {
        self.wrps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wrps.is_empty()
    }

    /// Group adjacent wrappers with equal keys.
    pub fn group<F>(self, key: F) -> GroupAdjacent<std::vec::IntoIter<HistoWrapper>, F>
    where
        F: Fn(&HistoWrapper) -> String,
    {
        group_adjacent(self.wrps, key)
    }

    /// Give up the sortedness guarantee.
    pub fn into_vec(self) -> Vec<HistoWrapper> {
        self.wrps
    }
}

impl IntoIterator for Sorted {
    type Item = HistoWrapper;
    type IntoIter = std::vec::IntoIter<HistoWrapper>;

    fn into_iter(self) -> Self::IntoIter {
        self.wrps.into_iter()
    }
}

/// Group **adjacent** wrappers with equal keys.
///
/// This detects boundaries only: an input where equal keys are not adjacent
/// yields several groups for the same key. Sort first (or start from
/// [`Sorted`]) unless boundary grouping is exactly what is wanted.
pub fn group_adjacent<I, F>(wrps: I, key: F) -> GroupAdjacent<I::IntoIter, F>
where
    I: IntoIterator<Item = HistoWrapper>,
    F: Fn(&HistoWrapper) -> String,
{
    GroupAdjacent {
        inner: wrps.into_iter().peekable(),
        key,
    }
}

/// Iterator of adjacent-equal-key groups.
pub struct GroupAdjacent<I: Iterator, F> {
    inner: Peekable<I>,
    key: F,
}

impl<I, F> Iterator for GroupAdjacent<I, F>
where
    I: Iterator<Item = HistoWrapper>,
    F: Fn(&HistoWrapper) -> String,
{
    type Item = Vec<HistoWrapper>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.inner.next()?;
        let current = (self.key)(&first);
        let mut group = vec![first];
        while let Some(next) = self.inner.peek() {
            if (self.key)(next) != current {
                break;
            }
            group.push(self.inner.next().expect("peeked"));
        }
        Some(group)
    }
}
