//! The operation algebra: pure functions combining wrappers.
//!
//! Every operation consumes its inputs (iterables exactly once), validates
//! them, and returns a new wrapper carrying a provenance record of the call.
//! Shape errors (`TooFewWrps`, `TooManyWrps`, `WrongInput`, `NoLumiMatch`)
//! are programming or configuration mistakes and always propagate; nothing
//! here is retried.

use tracing::debug;

use crate::error::{Error, Result};
use crate::hist::Hist1d;
use crate::provenance::{HasHistory, History, HistoryCollector};
use crate::wrappers::{FloatWrapper, HistoWrapper, StackWrapper, Wrapper};

/// Boundary specification for [`trim`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trim {
    /// Leave this side untouched.
    Keep,
    /// Crop to the outermost non-empty bin.
    Auto,
    /// Crop at this axis value, which must coincide with a bin edge.
    At(f64),
}

fn collect_histos<I>(
    op: &str,
    wrps: I,
    collector: &HistoryCollector,
) -> Result<Vec<HistoWrapper>>
where
    I: IntoIterator<Item = HistoWrapper>,
{
    let histos: Vec<HistoWrapper> = collector.observe(wrps).collect();
    if histos.is_empty() {
        return Err(Error::TooFewWrps(format!("{op}: no input wrappers")));
    }
    Ok(histos)
}

/// Sample identity shared by all inputs, or empty when mixed.
fn unanimous_sample(histos: &[HistoWrapper]) -> String {
    let first = &histos[0].sample;
    if histos.iter().all(|h| &h.sample == first) {
        first.clone()
    } else {
        String::new()
    }
}

/// Stack histograms into an ordered union plus a materialized sum.
///
/// All inputs must share one `lumi` value bit-for-bit; stacking histograms
/// of different exposure is meaningless and fails with `NoLumiMatch`.
pub fn stack<I>(wrps: I) -> Result<StackWrapper>
where
    I: IntoIterator<Item = HistoWrapper>,
{
    let collector = HistoryCollector::new();
    let histos = collect_histos("stack", wrps, &collector)?;

    let lumi = histos[0].lumi;
    for h in &histos {
        if h.lumi.to_bits() != lumi.to_bits() {
            return Err(Error::NoLumiMatch(format!(
                "stack: '{}' has lumi {} but '{}' has {}",
                histos[0].info.name, lumi, h.info.name, h.lumi
            )));
        }
    }
    debug!(n = histos.len(), lumi, "stacking histograms");

    let mut template = histos[0].derived(histos[0].hist.clone());
    template.sample = unanimous_sample(&histos);
    template.legend = String::new();

    let mut result = StackWrapper::from_constituents(template, histos)?;
    result.set_history(History::new("stack").push_inputs(collector.take()));
    Ok(result)
}

/// Add histograms; exposures of independent runs add up with the contents.
pub fn sum<I>(wrps: I) -> Result<HistoWrapper>
where
    I: IntoIterator<Item = HistoWrapper>,
{
    let collector = HistoryCollector::new();
    let histos = collect_histos("sum", wrps, &collector)?;
    debug!(n = histos.len(), "summing histograms");

    let mut iter = histos.into_iter();
    let first = iter.next().expect("collect_histos guarantees one input");
    let mut result = first.derived(first.hist.clone());
    let mut samples = vec![first];
    for h in iter {
        result.hist.add(&h.hist, 1.0)?;
        result.lumi += h.lumi;
        samples.push(h);
    }
    result.sample = unanimous_sample(&samples);

    result.set_history(History::new("sum").push_inputs(collector.take()));
    Ok(result)
}

/// Combine heterogeneous-exposure samples into one unit-exposure shape.
///
/// Each payload is divided by its own `lumi` before accumulation; the result
/// has `lumi = 1.0`.
pub fn merge<I>(wrps: I) -> Result<HistoWrapper>
where
    I: IntoIterator<Item = HistoWrapper>,
{
    let collector = HistoryCollector::new();
    let histos = collect_histos("merge", wrps, &collector)?;
    debug!(n = histos.len(), "merging histograms");

    let mut result = histos[0].derived(Hist1d::from_edges(histos[0].hist.bin_edges.clone()));
    for h in &histos {
        result.hist.add(&h.hist, 1.0 / h.lumi)?;
    }
    result.lumi = 1.0;
    result.sample = unanimous_sample(&histos);

    result.set_history(History::new("merge").push_inputs(collector.take()));
    Ok(result)
}

fn prod_like<I>(
    op: &'static str,
    invert: bool,
    wrps: I,
) -> Result<(HistoWrapper, Vec<History>, usize)>
where
    I: IntoIterator<Item = Wrapper>,
{
    let collector = HistoryCollector::new();
    let mut iter = collector.observe(wrps);

    let first = iter
        .next()
        .ok_or_else(|| Error::TooFewWrps(format!("{op}: no input wrappers")))?;
    let Wrapper::Histo(first) = first else {
        return Err(Error::WrongInput(format!(
            "{op}: first input must be a histogram wrapper, got {}",
            first.kind()
        )));
    };
    let mut result = first.derived(first.hist.clone());

    let mut count = 1;
    for wrp in iter {
        count += 1;
        match wrp {
            Wrapper::Histo(h) => {
                if invert {
                    result.hist.divide(&h.hist)?;
                } else {
                    result.hist.multiply(&h.hist)?;
                }
                result.lumi = 1.0;
            }
            Wrapper::Float(f) => {
                let factor = if invert { 1.0 / f.value } else { f.value };
                result.hist.scale(factor);
                result.lumi *= factor;
            }
            Wrapper::Stack(_) => {
                return Err(Error::WrongInput(format!(
                    "{op}: stacks cannot appear as factors"
                )));
            }
        }
    }
    Ok((result, collector.take(), count))
}

/// Multiply the first histogram by further histograms or scalars.
///
/// Histogram factors multiply payloads bin-wise and reset `lumi` to 1.0;
/// scalar factors scale the payload and `lumi` alike.
pub fn prod<I>(wrps: I) -> Result<HistoWrapper>
where
    I: IntoIterator<Item = Wrapper>,
{
    let (mut result, histories, _) = prod_like("prod", false, wrps)?;
    result.set_history(History::new("prod").push_inputs(histories));
    Ok(result)
}

/// Divide one histogram by exactly one histogram or scalar.
pub fn div<I>(wrps: I) -> Result<HistoWrapper>
where
    I: IntoIterator<Item = Wrapper>,
{
    let (mut result, histories, count) = prod_like("div", true, wrps)?;
    if count < 2 {
        return Err(Error::TooFewWrps(format!("div: got {count} input, need 2")));
    }
    if count > 2 {
        return Err(Error::TooManyWrps(format!("div: got {count} inputs, need 2")));
    }
    result.set_history(History::new("div").push_inputs(histories));
    Ok(result)
}

/// The `lumi` metadata as a scalar wrapper.
pub fn lumi(wrp: &HistoWrapper) -> FloatWrapper {
    let mut result = FloatWrapper::new(format!("{}_lumi", wrp.info.name), wrp.lumi);
    result.set_history(History::new("lumi").push_input(wrp.history().cloned()));
    result
}

/// The payload integral as a scalar wrapper, optionally bin-width weighted.
pub fn integral(wrp: &HistoWrapper, weighted: bool) -> FloatWrapper {
    let mut result = FloatWrapper::new(
        format!("{}_integral", wrp.info.name),
        wrp.hist.integral(None, weighted),
    );
    result.set_history(
        History::new("integral")
            .push_input(wrp.history().cloned())
            .push_kwarg("weighted", weighted),
    );
    result
}

fn running_integral(wrp: &HistoWrapper, from_left: bool) -> HistoWrapper {
    let n = wrp.hist.n_bins();
    let mut hist = Hist1d::from_edges(wrp.hist.bin_edges.clone());
    let mut content = 0.0;
    let mut variance = 0.0;
    let order: Box<dyn Iterator<Item = usize>> = if from_left {
        Box::new(0..n)
    } else {
        Box::new((0..n).rev())
    };
    for i in order {
        content += wrp.hist.bin_content[i];
        variance += wrp.hist.sumw2[i];
        hist.bin_content[i] = content;
        hist.sumw2[i] = variance;
    }
    hist.entries = wrp.hist.entries;
    wrp.derived(hist)
}

/// Cumulative integral from the left edge, per bin.
pub fn int_l(wrp: &HistoWrapper) -> HistoWrapper {
    let mut result = running_integral(wrp, true);
    result.set_history(History::new("int_l").push_input(wrp.history().cloned()));
    result
}

/// Cumulative integral from the right edge, per bin.
pub fn int_r(wrp: &HistoWrapper) -> HistoWrapper {
    let mut result = running_integral(wrp, false);
    result.set_history(History::new("int_r").push_input(wrp.history().cloned()));
    result
}

/// Re-bin onto arbitrary boundaries coinciding with existing bin edges.
pub fn rebin(wrp: &HistoWrapper, bounds: &[f64], norm_by_width: bool) -> Result<HistoWrapper> {
    let mut result = wrp.derived(wrp.hist.rebinned(bounds, norm_by_width)?);
    result.set_history(
        History::new("rebin")
            .push_input(wrp.history().cloned())
            .push_literal(format!("{bounds:?}"))
            .push_kwarg("norm_by_width", norm_by_width),
    );
    Ok(result)
}

/// Crop the axis range, auto-detecting content bounds where requested.
pub fn trim(wrp: &HistoWrapper, low: Trim, high: Trim) -> Result<HistoWrapper> {
    let edges = &wrp.hist.bin_edges;
    let bounds = wrp.hist.content_bounds();
    let lo = match low {
        Trim::Keep => wrp.hist.x_min(),
        Trim::At(x) => x,
        Trim::Auto => bounds.map_or(wrp.hist.x_min(), |(first, _)| edges[first]),
    };
    let hi = match high {
        Trim::Keep => wrp.hist.x_max(),
        Trim::At(x) => x,
        Trim::Auto => bounds.map_or(wrp.hist.x_max(), |(_, last)| edges[last + 1]),
    };
    let kept: Vec<f64> = edges.iter().copied().filter(|&e| lo <= e && e <= hi).collect();

    let mut result = wrp.derived(wrp.hist.rebinned(&kept, false)?);
    result.set_history(
        History::new("trim")
            .push_input(wrp.history().cloned())
            .push_kwarg("low", format!("{low:?}"))
            .push_kwarg("high", format!("{high:?}")),
    );
    Ok(result)
}

/// Fold flow-bin content into the outermost visible bins.
pub fn mv_in(wrp: &HistoWrapper, overflow: bool, underflow: bool) -> HistoWrapper {
    let mut hist = wrp.hist.clone();
    let n = hist.n_bins();
    if overflow && n > 0 {
        hist.bin_content[n - 1] += hist.overflow;
        hist.sumw2[n - 1] += hist.overflow_sumw2;
        hist.overflow = 0.0;
        hist.overflow_sumw2 = 0.0;
    }
    if underflow && n > 0 {
        hist.bin_content[0] += hist.underflow;
        hist.sumw2[0] += hist.underflow_sumw2;
        hist.underflow = 0.0;
        hist.underflow_sumw2 = 0.0;
    }
    let mut result = wrp.derived(hist);
    result.set_history(
        History::new("mv_in")
            .push_input(wrp.history().cloned())
            .push_kwarg("overflow", overflow)
            .push_kwarg("underflow", underflow),
    );
    result
}

/// Pairwise chi-square over a bin range.
///
/// Per bin: squared content difference over the combined variance. Bin pairs
/// where both errors are zero contribute zero instead of dividing by zero.
pub fn chi2<I>(wrps: I, x_min: Option<f64>, x_max: Option<f64>) -> Result<FloatWrapper>
where
    I: IntoIterator<Item = HistoWrapper>,
{
    let collector = HistoryCollector::new();
    let histos = collect_histos("chi2", wrps, &collector)?;
    if histos.len() != 2 {
        let msg = format!("chi2: got {} inputs, need 2", histos.len());
        return Err(if histos.len() < 2 {
            Error::TooFewWrps(msg)
        } else {
            Error::TooManyWrps(msg)
        });
    }
    let (a, b) = (&histos[0], &histos[1]);
    if !a.hist.same_binning(&b.hist) {
        return Err(Error::WrongInput("chi2: incompatible binning".into()));
    }

    let lo = x_min.unwrap_or_else(|| a.hist.x_min());
    let hi = x_max.unwrap_or_else(|| a.hist.x_max());
    let mut value = 0.0;
    for i in 0..a.hist.n_bins() {
        let center = a.hist.bin_center(i);
        if center < lo || center > hi {
            continue;
        }
        let combined_variance = a.hist.sumw2[i] + b.hist.sumw2[i];
        if combined_variance == 0.0 {
            continue;
        }
        let diff = a.hist.value(i) - b.hist.value(i);
        value += diff * diff / combined_variance;
    }

    let mut result = FloatWrapper::new(format!("{}_chi2", a.info.name), value);
    result.set_history(
        History::new("chi2")
            .push_inputs(collector.take())
            .push_kwarg("x_min", lo)
            .push_kwarg("x_max", hi),
    );
    Ok(result)
}
