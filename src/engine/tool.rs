//! The task unit and its execution state machine.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::Result;
use crate::storage::{Marker, WrapperStorage};
use crate::wrappers::Wrapper;

use super::ToolCtx;

/// Index entry name under which a tool's result list is persisted.
pub const RESULT_ENTRY: &str = "result";

/// Lifecycle of a task unit.
///
/// `Reused` and `Finished` are terminal; a reused task skips the
/// starting/running states entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolState {
    Created,
    Reused,
    Starting,
    Running,
    Finished,
}

impl ToolState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ToolState::Reused | ToolState::Finished)
    }
}

/// A named, cacheable unit of execution.
///
/// Implementors provide `run`; the default lifecycle hooks give every tool
/// marker-based reuse and result persistence for free. All hooks receive the
/// shared [`ToolCtx`], already scoped to this tool's result directory.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Namespace segment and display name.
    fn name(&self) -> &str;

    /// Whether this tool may ever skip execution in favor of prior output.
    fn reusable(&self) -> bool {
        true
    }

    /// True for tools that only host children (chains). A container running
    /// does not by itself clear the chain-wide reuse flag; its children
    /// decide that individually.
    fn is_container(&self) -> bool {
        false
    }

    /// Decide whether prior output will be reused.
    ///
    /// The default requires (1) the tool declaring itself reusable, (2) every
    /// logically preceding task in the chain having been reused, and (3) a
    /// readable, complete marker in this tool's result directory.
    async fn wanna_reuse(&self, ctx: &ToolCtx, all_reused_before_me: bool) -> bool {
        self.reusable() && all_reused_before_me && ctx.has_complete_marker()
    }

    /// Adopt prior output. The default reads nothing; tools that feed state
    /// to later code override this and read through [`ToolCtx::storage`].
    async fn reuse(&mut self, _ctx: &mut ToolCtx) -> Result<()> {
        Ok(())
    }

    /// Pre-run hook.
    async fn starting(&mut self, _ctx: &mut ToolCtx) -> Result<()> {
        Ok(())
    }

    /// Do the work, returning the wrappers to persist (possibly none).
    async fn run(&mut self, ctx: &mut ToolCtx) -> Result<Vec<Wrapper>>;

    /// Post-run hook; the default persists a non-empty result list.
    async fn finished(&mut self, ctx: &mut ToolCtx, output: &[Wrapper]) -> Result<()> {
        if !output.is_empty() {
            ctx.storage()?.write_list(output, RESULT_ENTRY)?;
        }
        Ok(())
    }
}

/// Execute one tool inside its own directory scope.
///
/// Returns `true` when prior output was reused. The scope segment pushed on
/// entry is popped again on every exit path, so a failing tool cannot corrupt
/// the directory stack of its siblings.
pub async fn execute(tool: &mut dyn Tool, ctx: &mut ToolCtx) -> Result<bool> {
    ctx.check_cancelled()?;
    ctx.push_dir(tool.name());
    let outcome = drive(tool, ctx).await;
    ctx.pop_dir();
    outcome
}

async fn drive(tool: &mut dyn Tool, ctx: &mut ToolCtx) -> Result<bool> {
    let name = tool.name().to_string();
    debug!(tool = %name, state = ?ToolState::Created, "tool created");

    if tool.wanna_reuse(ctx, ctx.all_reused).await {
        tool.reuse(ctx).await?;
        info!(tool = %name, state = ?ToolState::Reused, "reusing prior output");
        return Ok(true);
    }
    // waterfall rule: once one task re-runs, no later sibling may reuse
    if !tool.is_container() {
        ctx.all_reused = false;
    }

    debug!(tool = %name, state = ?ToolState::Starting, "starting");
    Marker::remove(&ctx.cwd())?;
    tool.starting(ctx).await?;
    let mut marker = Marker::start();

    debug!(tool = %name, state = ?ToolState::Running, "running");
    let output = tool.run(ctx).await?;

    // an interrupted run must never look like a clean completion
    ctx.check_cancelled()?;
    tool.finished(ctx, &output).await?;
    marker.complete();
    marker.write(&ctx.cwd())?;
    ctx.tools_run += 1;
    info!(tool = %name, state = ?ToolState::Finished, n_wrappers = output.len(), "finished");
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::hist::Hist1d;
    use crate::wrappers::HistoWrapper;

    struct Producer {
        runs: u32,
    }

    #[async_trait]
    impl Tool for Producer {
        fn name(&self) -> &str {
            "producer"
        }
        async fn run(&mut self, _ctx: &mut ToolCtx) -> Result<Vec<Wrapper>> {
            self.runs += 1;
            let mut w = HistoWrapper::new("met", Hist1d::with_uniform_bins(2, 0.0, 2.0));
            w.hist.fill(0.5, 2.0);
            Ok(vec![Wrapper::Histo(w)])
        }
    }

    struct Failing;

    #[async_trait]
    impl Tool for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        async fn run(&mut self, _ctx: &mut ToolCtx) -> Result<Vec<Wrapper>> {
            Err(Error::Tool("deliberate".into()))
        }
    }

    #[tokio::test]
    async fn test_execute_persists_result_and_marker() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ToolCtx::new(dir.path()).unwrap();
        let mut tool = Producer { runs: 0 };

        let reused = execute(&mut tool, &mut ctx).await.unwrap();
        assert!(!reused);
        assert_eq!(tool.runs, 1);
        assert_eq!(ctx.tools_run, 1);

        let storage = crate::storage::DirStorage::new(dir.path().join("producer")).unwrap();
        let back = storage.read_list(RESULT_ENTRY).unwrap();
        assert_eq!(back[0].name(), "met");
        assert!(Marker::read(&dir.path().join("producer")).unwrap().is_complete());
    }

    #[tokio::test]
    async fn test_second_execution_reuses() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ToolCtx::new(dir.path()).unwrap();
        let mut tool = Producer { runs: 0 };
        execute(&mut tool, &mut ctx).await.unwrap();

        let mut ctx = ToolCtx::new(dir.path()).unwrap();
        let reused = execute(&mut tool, &mut ctx).await.unwrap();
        assert!(reused);
        assert_eq!(tool.runs, 1, "reused tool must not run again");
    }

    #[tokio::test]
    async fn test_failure_leaves_no_marker_and_restores_scope() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ToolCtx::new(dir.path()).unwrap();
        let err = execute(&mut Failing, &mut ctx).await.unwrap_err();
        assert!(matches!(err, Error::Tool(_)));
        assert_eq!(ctx.depth(), 0);
        assert!(Marker::read(&dir.path().join("failing")).is_none());
    }

    #[tokio::test]
    async fn test_cancelled_run_writes_no_marker() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ToolCtx::new(dir.path()).unwrap();

        struct CancelMidRun;
        #[async_trait]
        impl Tool for CancelMidRun {
            fn name(&self) -> &str {
                "mid"
            }
            async fn run(&mut self, ctx: &mut ToolCtx) -> Result<Vec<Wrapper>> {
                ctx.cancel.cancel();
                Ok(vec![])
            }
        }

        let err = execute(&mut CancelMidRun, &mut ctx).await.unwrap_err();
        assert!(matches!(err, Error::Interrupted));
        assert!(Marker::read(&dir.path().join("mid")).is_none());
    }

    #[tokio::test]
    async fn test_stale_marker_removed_at_starting() {
        let dir = tempfile::tempdir().unwrap();
        let tool_dir = dir.path().join("producer");
        // a marker without completion stamp, as left by a crashed run
        Marker::start().write(&tool_dir).unwrap();

        let mut ctx = ToolCtx::new(dir.path()).unwrap();
        let reused = execute(&mut Producer { runs: 0 }, &mut ctx).await.unwrap();
        assert!(!reused, "incomplete marker must not enable reuse");
        assert!(Marker::read(&tool_dir).unwrap().is_complete());
    }
}
