//! Typed value objects pairing a numeric payload with metadata and history.
//!
//! Wrappers are immutable values: the operation algebra always constructs new
//! wrappers instead of mutating inputs. Common metadata lives in
//! [`WrapperInfo`] (named fields plus one open `extra` map for genuinely
//! dynamic keys); each wrapper kind adds its own payload.

mod alias;
mod float;
mod histo;
mod stack;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::provenance::{HasHistory, History};

pub use alias::Alias;
pub use float::FloatWrapper;
pub use histo::HistoWrapper;
pub use stack::StackWrapper;

/// Metadata shared by every wrapper kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WrapperInfo {
    /// String identity; storage entries are keyed on this.
    pub name: String,
    /// Display string.
    pub title: String,
    /// Derivation record; absent only on freshly loaded wrappers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<History>,
    /// Open extension map for dynamic metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl WrapperInfo {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            ..Default::default()
        }
    }
}

/// A wrapper of any kind, as handled at the persistence boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Wrapper {
    Histo(HistoWrapper),
    Stack(StackWrapper),
    Float(FloatWrapper),
}

impl Wrapper {
    pub fn info(&self) -> &WrapperInfo {
        match self {
            Wrapper::Histo(w) => &w.info,
            Wrapper::Stack(w) => &w.histo.info,
            Wrapper::Float(w) => &w.info,
        }
    }

    pub fn info_mut(&mut self) -> &mut WrapperInfo {
        match self {
            Wrapper::Histo(w) => &mut w.info,
            Wrapper::Stack(w) => &mut w.histo.info,
            Wrapper::Float(w) => &mut w.info,
        }
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    /// Expect a histogram wrapper, failing with the offending kind otherwise.
    pub fn into_histo(self) -> crate::Result<HistoWrapper> {
        match self {
            Wrapper::Histo(w) => Ok(w),
            other => Err(crate::Error::WrongInput(format!(
                "expected a histogram wrapper, got {} '{}'",
                other.kind(),
                other.name()
            ))),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Wrapper::Histo(_) => "histo",
            Wrapper::Stack(_) => "stack",
            Wrapper::Float(_) => "float",
        }
    }

    /// Replace the live history tree by its rendered string form, stored
    /// under `extra["history"]`. Persisted wrappers never carry live trees.
    pub fn render_history(&mut self) {
        let info = self.info_mut();
        if let Some(history) = info.history.take() {
            info.extra.insert("history".into(), history.to_string());
        }
    }
}

impl fmt::Display for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind(), self.name())
    }
}

impl HasHistory for Wrapper {
    fn history(&self) -> Option<&History> {
        self.info().history.as_ref()
    }
    fn take_history(&mut self) -> Option<History> {
        self.info_mut().history.take()
    }
    fn set_history(&mut self, history: History) {
        self.info_mut().history = Some(history);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hist::Hist1d;

    #[test]
    fn test_render_history_moves_tree_into_extra() {
        let mut w = HistoWrapper::new("jet_pt", Hist1d::with_uniform_bins(2, 0.0, 2.0));
        w.info.history = Some(History::new("load").push_literal("'f.json'"));
        let mut wrapper = Wrapper::Histo(w);

        wrapper.render_history();

        assert!(wrapper.info().history.is_none());
        assert!(wrapper.info().extra["history"].contains("load("));
    }

    #[test]
    fn test_into_histo_rejects_float() {
        let f = FloatWrapper::new("n", 1.0);
        assert!(matches!(
            Wrapper::Float(f).into_histo(),
            Err(crate::Error::WrongInput(_))
        ));
    }
}
