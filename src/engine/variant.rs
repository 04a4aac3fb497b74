//! Systematic-variant branches with configuration isolation.

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::wrappers::Wrapper;

use super::{Settings, Tool, ToolChain, ToolCtx};

/// Mutation applied to [`Settings`] on entering a variant branch.
pub type SettingsPatch = Box<dyn Fn(&mut Settings) + Send + Sync>;

/// A chain that explores an alternative configuration.
///
/// On entry the current [`Settings`] are snapshotted and the variant's patch
/// is applied; on exit the snapshot is reinstated exactly, even when a child
/// fails partway through. A variant branch therefore cannot leak mutated
/// configuration into sibling branches or the parent scope. State outside
/// `Settings` (counters, pools) persists across the boundary by design.
pub struct VariantChain {
    chain: ToolChain,
    variant: String,
    patch: SettingsPatch,
}

impl VariantChain {
    pub fn new(name: impl Into<String>, variant: impl Into<String>, patch: SettingsPatch) -> Self {
        Self {
            chain: ToolChain::new(name),
            variant: variant.into(),
            patch,
        }
    }

    /// Append a child tool.
    pub fn push(&mut self, tool: Box<dyn Tool>) -> &mut Self {
        self.chain.push(tool);
        self
    }
}

#[async_trait]
impl Tool for VariantChain {
    fn name(&self) -> &str {
        self.chain.name()
    }

    fn reusable(&self) -> bool {
        false
    }

    fn is_container(&self) -> bool {
        true
    }

    async fn run(&mut self, ctx: &mut ToolCtx) -> Result<Vec<Wrapper>> {
        info!(variant = %self.variant, "entering variant branch");
        let snapshot = ctx.settings.snapshot();
        ctx.settings.active_variant = Some(self.variant.clone());
        (self.patch)(&mut ctx.settings);

        let outcome = self.chain.run(ctx).await;

        ctx.settings.restore(snapshot);
        info!(variant = %self.variant, ok = outcome.is_ok(), "left variant branch");
        outcome
    }
}
