//! # Histmill
//!
//! A batch data-processing toolkit for scientific histogram analysis.
//!
//! Histmill pairs a lazy, provenance-tracked transformation pipeline over
//! typed histogram wrappers with an incremental, cache-aware task-execution
//! engine. Every transformation records its own derivation history, and the
//! execution engine persists that history alongside results so that reuse
//! decisions and audit trails depend on the same provenance model.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use histmill::engine::{Tool, ToolChain, ToolCtx};
//!
//! let mut ctx = ToolCtx::new("results")?;
//! let mut chain = ToolChain::new("analysis");
//! chain.push(Box::new(LoadHistograms::default()));
//! chain.push(Box::new(PlotStacks::default()));
//! chain.run_as_root(&mut ctx).await?;
//! ```
//!
//! ## Modules
//!
//! - `hist` - Minimal 1-D histogram payload honoring the numeric-backend contract
//! - `wrappers` - Typed value objects pairing payloads with metadata and history
//! - `ops` - Pure operation algebra combining wrappers (stack, sum, merge, ...)
//! - `provenance` - History construction and single-pass sequence observation
//! - `pipeline` - Lazy stream combinators (filter, sort, group, stack-and-sum)
//! - `pool` - Bounded worker pool with a process-wide slot budget
//! - `storage` - Wrapper persistence contract, flat-file backend, completion markers
//! - `engine` - Named, cacheable execution units (Tool) composed into chains
//! - `logging` - Tracing setup for driver binaries and tests

pub mod engine;
pub mod error;
pub mod hist;
pub mod logging;
pub mod ops;
pub mod pipeline;
pub mod pool;
pub mod provenance;
pub mod storage;
pub mod wrappers;

pub use error::{Error, Result};
