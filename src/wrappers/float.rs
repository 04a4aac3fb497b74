//! Scalar wrapper.

use serde::{Deserialize, Serialize};

use crate::provenance::{HasHistory, History};

use super::WrapperInfo;

/// A single scalar value with wrapper metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatWrapper {
    pub info: WrapperInfo,
    pub value: f64,
}

impl FloatWrapper {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            info: WrapperInfo::named(name),
            value,
        }
    }
}

impl HasHistory for FloatWrapper {
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
