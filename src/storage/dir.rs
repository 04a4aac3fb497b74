//! Flat-file JSON storage backend.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::wrappers::Wrapper;

use super::WrapperStorage;

/// Index entry written for list-valued results.
#[derive(Debug, Serialize, Deserialize)]
struct ListIndex {
    names: Vec<String>,
}

/// One JSON file per wrapper under a root directory.
///
/// Files are written atomically (temp file, then rename), so readers never
/// observe a half-written entry. Entry names may contain `/` to nest.
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    fn write_json<T: Serialize>(&self, value: &T, name: &str) -> Result<()> {
        let path = self.entry_path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, name: &str) -> Result<T> {
        let path = self.entry_path(name);
        let bytes = std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("no entry '{name}' under {}", self.root.display()))
            } else {
                e.into()
            }
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl WrapperStorage for DirStorage {
    fn write(&self, wrapper: &Wrapper, name: &str) -> Result<()> {
        let mut flat = wrapper.clone();
        flat.render_history();
        self.write_json(&flat, name)?;
        debug!(name, kind = wrapper.kind(), "persisted wrapper");
        Ok(())
    }

    fn read(&self, name: &str) -> Result<Wrapper> {
        self.read_json(name)
    }

    fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let rel = e.path().strip_prefix(&self.root).ok()?;
                let rel = rel.to_string_lossy();
                let name = rel.strip_suffix(".json")?;
                if name.starts_with('.') {
                    return None;
                }
                Some(name.to_string())
            })
            .collect();
        names.sort();
        names
    }

    fn write_list(&self, wrappers: &[Wrapper], name: &str) -> Result<()> {
        let mut names = Vec::with_capacity(wrappers.len());
        for wrapper in wrappers {
            let entry = wrapper.name().to_string();
            if entry.is_empty() {
                return Err(Error::Storage(format!(
                    "cannot persist unnamed wrapper inside list '{name}'"
                )));
            }
            self.write(wrapper, &entry)?;
            names.push(entry);
        }
        self.write_json(&ListIndex { names }, name)
    }

    fn read_list(&self, name: &str) -> Result<Vec<Wrapper>> {
        let index: ListIndex = self.read_json(name)?;
        index.names.iter().map(|n| self.read(n)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hist::Hist1d;
    use crate::provenance::{HasHistory, History};
    use crate::wrappers::{FloatWrapper, HistoWrapper};

    fn histo(name: &str) -> Wrapper {
        let mut w = HistoWrapper::new(name, Hist1d::with_uniform_bins(2, 0.0, 2.0));
        w.hist.fill(0.5, 1.0);
        w.set_history(History::new("load"));
        Wrapper::Histo(w)
    }

    #[test]
    fn test_round_trip_renders_history() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DirStorage::new(dir.path()).unwrap();
        storage.write(&histo("met"), "met").unwrap();

        let back = storage.read("met").unwrap();
        assert!(back.info().history.is_none());
        assert!(back.info().extra["history"].contains("load"));
        let h = back.into_histo().unwrap();
        assert_eq!(h.hist.integral(None, false), 1.0);
    }

    #[test]
    fn test_get_is_non_raising() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DirStorage::new(dir.path()).unwrap();
        assert!(storage.get("absent").is_none());
    }

    #[test]
    fn test_list_skips_dotfiles() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DirStorage::new(dir.path()).unwrap();
        storage.write(&histo("b"), "b").unwrap();
        storage.write(&histo("a"), "a").unwrap();
        crate::storage::Marker::start().write(dir.path()).unwrap();
        assert_eq!(storage.list(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_list_result_written_with_index() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DirStorage::new(dir.path()).unwrap();
        let wrappers = vec![
            histo("h1"),
            Wrapper::Float(FloatWrapper::new("n_events", 42.0)),
        ];
        storage.write_list(&wrappers, "result").unwrap();

        let back = storage.read_list("result").unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].name(), "h1");
        assert_eq!(back[1].name(), "n_events");
    }

    #[test]
    fn test_nested_entry_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DirStorage::new(dir.path()).unwrap();
        storage.write(&histo("cut1/met"), "cut1/met").unwrap();
        assert_eq!(storage.list(), vec!["cut1/met".to_string()]);
    }
}
