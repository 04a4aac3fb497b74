//! Stacked-histogram wrapper.

use serde::{Deserialize, Serialize};

use crate::hist::Hist1d;
use crate::provenance::{HasHistory, History};

use super::HistoWrapper;

/// An ordered union of histograms plus their materialized sum.
///
/// The constituents keep input order (drawing order) and their own metadata,
/// so legend and color tags survive into rendering. The sum is computed once
/// at construction and not kept in sync afterwards, which is safe because
/// wrappers are value objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackWrapper {
    /// Metadata and the materialized sum payload.
    pub histo: HistoWrapper,
    /// Constituent wrappers, in input order.
    pub constituents: Vec<HistoWrapper>,
}

impl StackWrapper {
    /// Build from constituents; the sum payload is materialized here.
    pub fn from_constituents(
        mut template: HistoWrapper,
        constituents: Vec<HistoWrapper>,
    ) -> crate::Result<Self> {
        let mut sum = Hist1d::from_edges(template.hist.bin_edges.clone());
        for c in &constituents {
            sum.add(&c.hist, 1.0)?;
        }
        template.hist = sum;
        Ok(Self {
            histo: template,
            constituents,
        })
    }

    pub fn n_constituents(&self) -> usize {
        self.constituents.len()
    }
}

impl HasHistory for StackWrapper {
    fn history(&self) -> Option<&History> {
        self.histo.info.history.as_ref()
    }
    fn take_history(&mut self) -> Option<History> {
        self.histo.info.history.take()
    }
    fn set_history(&mut self, history: History) {
        self.histo.info.history = Some(history);
    }
}
