//! Composable trees of tools.

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::wrappers::Wrapper;

use super::tool::execute;
use super::{Tool, ToolCtx};

/// A named sequence of tools, itself a tool.
///
/// Children run strictly sequentially in declaration order. Each child is
/// short-circuited to reuse when eligible; the first child that re-runs
/// clears the chain-wide flag so every later sibling re-runs too (waterfall
/// invalidation). Nesting chains nests result directories.
pub struct ToolChain {
    name: String,
    children: Vec<Box<dyn Tool>>,
}

impl ToolChain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Append a child tool.
    pub fn push(&mut self, tool: Box<dyn Tool>) -> &mut Self {
        self.children.push(tool);
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Run this chain as the outermost task.
    pub async fn run_as_root(&mut self, ctx: &mut ToolCtx) -> Result<()> {
        execute(self, ctx).await.map(|_| ())
    }
}

#[async_trait]
impl Tool for ToolChain {
    fn name(&self) -> &str {
        &self.name
    }

    /// Chains never short-circuit as a whole; reuse is decided per child.
    fn reusable(&self) -> bool {
        false
    }

    fn is_container(&self) -> bool {
        true
    }

    async fn run(&mut self, ctx: &mut ToolCtx) -> Result<Vec<Wrapper>> {
        let n = self.children.len();
        info!(chain = %self.name, n_children = n, "running chain");
        for child in &mut self.children {
            ctx.check_cancelled()?;
            execute(child.as_mut(), ctx).await?;
        }
        Ok(vec![])
    }
}
