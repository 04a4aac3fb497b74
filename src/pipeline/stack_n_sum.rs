//! The central packaging step: one stack plus one data sum per group.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ops;
use crate::wrappers::{FloatWrapper, HistoWrapper, StackWrapper, Wrapper};

use super::{group_adjacent, split_data_mc};

/// Knobs for [`mc_stack_n_data_sum`].
#[derive(Debug, Clone, Default)]
pub struct StackOptions {
    /// Scale simulation to this luminosity instead of the summed data's.
    pub target_lumi: Option<f64>,
    /// Color tag per legend entry, stored on each merged constituent.
    pub colors: BTreeMap<String, String>,
}

/// Per-group result: the simulation stack and the summed data.
///
/// At least one side is always present; a group with neither is an error.
#[derive(Debug, Clone)]
pub struct StackAndData {
    pub stack: Option<StackWrapper>,
    pub data: Option<HistoWrapper>,
}

/// Package each group of same-identity histograms into a simulation stack
/// and a summed data histogram.
///
/// Per group: split data from simulation; sum the data branch; take the
/// target luminosity from the summed data (or `options.target_lumi`); sort
/// and regroup the simulation branch by `merge_key`, merge each sub-group
/// into one unit-exposure shape, tag it, scale it to the target luminosity
/// and stack the results. A group missing one branch degrades to the other
/// with a warning; a group missing both fails with `TooFewWrps`.
pub fn mc_stack_n_data_sum<I, F>(
    groups: I,
    merge_key: F,
    options: StackOptions,
) -> impl Iterator<Item = Result<StackAndData>>
where
    I: IntoIterator<Item = Vec<HistoWrapper>>,
    F: Fn(&HistoWrapper) -> String,
{
    groups
        .into_iter()
        .map(move |group| stack_one_group(group, &merge_key, &options))
}

fn stack_one_group<F>(
    group: Vec<HistoWrapper>,
    merge_key: &F,
    options: &StackOptions,
) -> Result<StackAndData>
where
    F: Fn(&HistoWrapper) -> String,
{
    let group_name = group
        .first()
        .map(|w| w.info.name.clone())
        .unwrap_or_default();
    let (data, mc) = split_data_mc(group);

    let data_sum = if data.is_empty() {
        warn!(group = %group_name, "no data histograms in group, proceeding mc-only");
        None
    } else {
        Some(ops::sum(data)?)
    };

    let target_lumi = options
        .target_lumi
        .or_else(|| data_sum.as_ref().map(|d| d.lumi))
        .unwrap_or(1.0);

    let stack = if mc.is_empty() {
        warn!(group = %group_name, "no mc histograms in group, proceeding data-only");
        None
    } else {
        debug!(group = %group_name, target_lumi, n_mc = mc.len(), "stacking group");
        let mut sorted = mc;
        sorted.sort_by_key(|w| merge_key(w));

        let mut scaled = Vec::new();
        for sub_group in group_adjacent(sorted, |w| merge_key(w)) {
            let mut merged = ops::merge(sub_group)?;
            if let Some(color) = options.colors.get(&merged.legend) {
                merged.info.extra.insert("color".into(), color.clone());
            }
            scaled.push(ops::prod(vec![
                Wrapper::Histo(merged),
                Wrapper::Float(FloatWrapper::new("target_lumi", target_lumi)),
            ])?);
        }
        Some(ops::stack(scaled)?)
    };

    if stack.is_none() && data_sum.is_none() {
        return Err(Error::TooFewWrps(format!(
            "group '{group_name}': neither data nor mc histograms present"
        )));
    }
    Ok(StackAndData {
        stack,
        data: data_sum,
    })
}
