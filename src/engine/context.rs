//! The process-wide execution context handed to every tool.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::storage::{DirStorage, Marker};

use super::{CancelToken, Settings};

/// Everything a tool needs from its surroundings, passed by reference.
///
/// There is no ambient global state: the result-directory stack, the
/// configuration bag and the cancellation token all live here. Entering a
/// tool's scope pushes a namespace segment onto the directory stack, so
/// nested tools get nested result directories.
pub struct ToolCtx {
    root: PathBuf,
    dir_stack: Vec<String>,
    pub settings: Settings,
    pub cancel: CancelToken,
    /// Waterfall flag: true while every task executed so far in the current
    /// chain was reused. The first task that re-runs clears it for all
    /// later siblings.
    pub all_reused: bool,
    /// Running counter of executed (not reused) tools. Survives variant
    /// boundaries on purpose.
    pub tools_run: u64,
}

impl ToolCtx {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            dir_stack: Vec::new(),
            settings: Settings::default(),
            cancel: CancelToken::new(),
            all_reused: true,
            tools_run: 0,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The result directory of the currently entered tool scope.
    pub fn cwd(&self) -> PathBuf {
        let mut path = self.root.clone();
        for segment in &self.dir_stack {
            path.push(segment);
        }
        path
    }

    /// Storage rooted at the current scope's result directory.
    pub fn storage(&self) -> Result<DirStorage> {
        DirStorage::new(self.cwd())
    }

    pub(super) fn push_dir(&mut self, segment: &str) {
        self.dir_stack.push(segment.to_string());
        debug!(cwd = %self.cwd().display(), "entered tool scope");
    }

    pub(super) fn pop_dir(&mut self) {
        self.dir_stack.pop();
    }

    /// Depth of the current scope, the root scope being 0.
    pub fn depth(&self) -> usize {
        self.dir_stack.len()
    }

    /// True when the current scope holds a marker proving clean completion.
    pub fn has_complete_marker(&self) -> bool {
        Marker::read(&self.cwd()).is_some_and(|m| m.is_complete())
    }

    pub fn check_cancelled(&self) -> Result<()> {
        self.cancel.check()
    }
}
