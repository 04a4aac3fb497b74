//! The task-execution engine.
//!
//! Work is organized into named, cacheable units ([`Tool`]) composed into
//! trees ([`ToolChain`]). Each tool owns a result directory derived from its
//! position in the tree, persists its output wrappers there and marks clean
//! completion with a marker record; on the next invocation a tool whose
//! marker is intact, and whose predecessors were all reused, skips execution
//! and adopts the prior output (waterfall invalidation otherwise).
//!
//! Execution is strictly sequential; parallelism happens only inside a
//! tool's `run` via the worker pool.

mod cancel;
mod chain;
mod context;
mod settings;
mod tool;
mod variant;

pub use cancel::{install_signal_handlers, CancelToken};
pub use chain::ToolChain;
pub use context::ToolCtx;
pub use settings::Settings;
pub use tool::{execute, Tool, ToolState, RESULT_ENTRY};
pub use variant::{SettingsPatch, VariantChain};
