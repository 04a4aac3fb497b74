//! Histogram wrapper.

use serde::{Deserialize, Serialize};

use crate::hist::Hist1d;
use crate::provenance::{HasHistory, History};

use super::WrapperInfo;

/// A histogram payload plus sample metadata.
///
/// `lumi` is the integrated luminosity the bin contents correspond to; it is
/// meaningful only relative to `sample`. Two histograms may be stacked only
/// when their `lumi` values are identical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoWrapper {
    pub info: WrapperInfo,
    pub hist: Hist1d,
    /// Integrated luminosity of the sample these contents were filled from.
    pub lumi: f64,
    pub is_data: bool,
    pub is_signal: bool,
    /// Sample identity, e.g. `"ttbar"`. Empty when mixed or unknown.
    #[serde(default)]
    pub sample: String,
    /// Producing analyzer, the outermost grouping key.
    #[serde(default)]
    pub analyzer: String,
    /// Legend entry used when the histogram is drawn.
    #[serde(default)]
    pub legend: String,
    /// Source file for lazy reload.
    #[serde(default)]
    pub filename: String,
    /// Path inside the source file.
    #[serde(default)]
    pub in_file_path: String,
}

impl HistoWrapper {
    pub fn new(name: impl Into<String>, hist: Hist1d) -> Self {
        Self {
            info: WrapperInfo::named(name),
            hist,
            lumi: 1.0,
            is_data: false,
            is_signal: false,
            sample: String::new(),
            analyzer: String::new(),
            legend: String::new(),
            filename: String::new(),
            in_file_path: String::new(),
        }
    }

    /// Copy of this wrapper's metadata with a fresh payload, used by
    /// operations that derive a result from a single input.
    pub fn derived(&self, hist: Hist1d) -> Self {
        Self {
            info: WrapperInfo::named(self.info.name.clone()),
            hist,
            ..self.clone()
        }
    }
}

impl HasHistory for HistoWrapper {
    fn history(&self) -> Option<&History> {
        self.info.history.as_ref()
    }
    fn take_history(&mut self) -> Option<History> {
        self.info.history.take()
    }
    fn set_history(&mut self, history: History) {
        self.info.history = Some(history);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let w = HistoWrapper::new("met", Hist1d::with_uniform_bins(4, 0.0, 200.0));
        assert_eq!(w.lumi, 1.0);
        assert!(!w.is_data);
        assert_eq!(w.info.title, "met");
    }

    #[test]
    fn test_derived_keeps_metadata_drops_history() {
        let mut w = HistoWrapper::new("met", Hist1d::with_uniform_bins(4, 0.0, 200.0));
        w.sample = "qcd".into();
        w.lumi = 3.5;
        w.set_history(History::new("load"));

        let d = w.derived(w.hist.clone());
        assert_eq!(d.sample, "qcd");
        assert_eq!(d.lumi, 3.5);
        assert!(d.history().is_none());
    }
}
