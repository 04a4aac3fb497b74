//! Provenance tracking for wrapper-producing operations.
//!
//! Every operation in the algebra attaches a [`History`] node to its result:
//! a call tree naming the operation, the histories of its wrapper inputs and
//! any literal parameters. The rendered tree reproduces the exact chain of
//! calls that produced a wrapper; it is the toolkit's only audit mechanism.
//!
//! Sequence inputs are consumed exactly once, so their histories are captured
//! in-stream by [`HistoryCollector`] while the elements flow into the
//! operation, never by a second pass.

mod history;
mod observer;

pub use history::{History, HistoryArg};
pub use observer::{HasHistory, HistoryCollector, Observed};
