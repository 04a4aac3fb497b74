//! Wrapper persistence.
//!
//! Persistence is dead simple by design: one human-readable JSON file per
//! wrapper, written atomically, with zero configuration. The engine talks to
//! storage only through [`WrapperStorage`], so richer backends can be swapped
//! in by embedding callers.
//!
//! Persisted wrappers never carry a live history tree; the tree is rendered
//! to its printable string form before serialization and travels in the
//! wrapper's `extra` map.

mod dir;
mod marker;

pub use dir::DirStorage;
pub use marker::Marker;

use crate::error::Result;
use crate::wrappers::Wrapper;

/// Persistence contract for wrapper objects.
pub trait WrapperStorage: Send + Sync {
    /// Persist `wrapper` under `name`, metadata and payload included.
    ///
    /// `read(name)` afterwards reconstructs an equivalent wrapper: same
    /// metadata, an independent payload with equal numeric content, and the
    /// history in rendered string form.
    fn write(&self, wrapper: &Wrapper, name: &str) -> Result<()>;

    /// Read the wrapper persisted under `name`.
    fn read(&self, name: &str) -> Result<Wrapper>;

    /// Non-raising read.
    fn get(&self, name: &str) -> Option<Wrapper> {
        self.read(name).ok()
    }

    /// Names of all persisted entries, sorted.
    fn list(&self) -> Vec<String>;

    /// Persist a list result: N individually named entries plus one index
    /// entry under `name` enumerating them.
    fn write_list(&self, wrappers: &[Wrapper], name: &str) -> Result<()>;

    /// Read back a list result via its index entry.
    fn read_list(&self, name: &str) -> Result<Vec<Wrapper>>;
}
