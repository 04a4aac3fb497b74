//! Lazy stream combinators over histogram wrappers.
//!
//! Streams are processed one element at a time except where an operation is
//! inherently order-sensitive: sorting materializes, grouping walks adjacent
//! runs. Callers compose these into arbitrary processing graphs; the central
//! packaging step is [`mc_stack_n_data_sum`].

mod group;
mod stack_n_sum;

pub use group::{group_adjacent, GroupAdjacent, Sorted};
pub use stack_n_sum::{mc_stack_n_data_sum, StackAndData, StackOptions};

use crate::wrappers::HistoWrapper;

/// Sortable wrapper attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Analyzer,
    Name,
    IsData,
    Sample,
    Legend,
}

impl SortKey {
    /// The wrapper attribute as a sortable string.
    pub fn key_of(&self, wrp: &HistoWrapper) -> String {
        match self {
            SortKey::Analyzer => wrp.analyzer.clone(),
            SortKey::Name => wrp.info.name.clone(),
            SortKey::IsData => (wrp.is_data as u8).to_string(),
            SortKey::Sample => wrp.sample.clone(),
            SortKey::Legend => wrp.legend.clone(),
        }
    }
}

/// Default sort order, most significant first.
pub const DEFAULT_SORT_KEYS: [SortKey; 4] = [
    SortKey::Analyzer,
    SortKey::Name,
    SortKey::IsData,
    SortKey::Sample,
];

/// Stable multi-key sort.
///
/// Sorts once per key from least to most significant; stability of each pass
/// preserves the ordering established by the previous ones. Materializes the
/// stream.
pub fn sort_wrappers<I>(wrps: I, keys: &[SortKey]) -> Sorted
where
    I: IntoIterator<Item = HistoWrapper>,
{
    let mut wrps: Vec<HistoWrapper> = wrps.into_iter().collect();
    for key in keys.iter().rev() {
        wrps.sort_by_key(|w| key.key_of(w));
    }
    Sorted::new(wrps)
}

/// Keep wrappers produced by `analyzer`.
pub fn filter_analyzer<I>(
    wrps: I,
    analyzer: impl Into<String>,
) -> impl Iterator<Item = HistoWrapper>
where
    I: IntoIterator<Item = HistoWrapper>,
{
    let analyzer = analyzer.into();
    wrps.into_iter().filter(move |w| w.analyzer == analyzer)
}

/// Drop data wrappers, keeping simulation only.
pub fn reject_data<I>(wrps: I) -> impl Iterator<Item = HistoWrapper>
where
    I: IntoIterator<Item = HistoWrapper>,
{
    wrps.into_iter().filter(|w| !w.is_data)
}

/// Partition a stream into its data and simulation branches.
///
/// Materializes both branches, so each side can be consumed independently
/// and in any order.
pub fn split_data_mc<I>(wrps: I) -> (Vec<HistoWrapper>, Vec<HistoWrapper>)
where
    I: IntoIterator<Item = HistoWrapper>,
{
    wrps.into_iter().partition(|w| w.is_data)
}
