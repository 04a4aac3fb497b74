//! Deferred reference to a persisted histogram.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::provenance::{HasHistory, History};
use crate::storage::WrapperStorage;

use super::HistoWrapper;

/// A not-yet-loaded histogram: location plus the metadata known up front.
///
/// Aliases let the pipeline enumerate and filter available histograms
/// without paying the load cost; the payload is read only when an alias is
/// resolved at the point of consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    /// Storage location the wrapper will be read from.
    pub filename: String,
    /// Entry path inside that location.
    pub in_file_path: String,
    pub is_data: bool,
    #[serde(default)]
    pub sample: String,
    #[serde(default)]
    pub legend: String,
    pub lumi: f64,
}

impl Alias {
    pub fn new(name: impl Into<String>, filename: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            in_file_path: name.clone(),
            name,
            filename: filename.into(),
            is_data: false,
            sample: String::new(),
            legend: String::new(),
            lumi: 1.0,
        }
    }

    /// Load the referenced histogram and stamp the alias metadata onto it.
    ///
    /// The result's history is a fresh `load` leaf naming the location.
    pub fn resolve(&self, storage: &dyn WrapperStorage) -> Result<HistoWrapper> {
        let wrapper = storage
            .read(&self.in_file_path)
            .map_err(|e| match e {
                Error::NotFound(_) => {
                    Error::NotFound(format!("alias '{}' in '{}'", self.in_file_path, self.filename))
                }
                other => other,
            })?;
        let mut histo = wrapper.into_histo()?;
        histo.is_data = self.is_data;
        histo.lumi = self.lumi;
        if !self.sample.is_empty() {
            histo.sample = self.sample.clone();
        }
        if !self.legend.is_empty() {
            histo.legend = self.legend.clone();
        }
        histo.filename = self.filename.clone();
        histo.in_file_path = self.in_file_path.clone();
        histo.set_history(
            History::new("load")
                .push_literal(format!("'{}'", self.filename))
                .push_literal(format!("'{}'", self.in_file_path)),
        );
        Ok(histo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hist::Hist1d;
    use crate::storage::DirStorage;
    use crate::wrappers::Wrapper;

    #[test]
    fn test_resolve_stamps_metadata_and_load_history() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DirStorage::new(dir.path()).unwrap();

        let mut h = HistoWrapper::new("jet_pt", Hist1d::with_uniform_bins(2, 0.0, 2.0));
        h.hist.fill(0.5, 2.0);
        storage.write(&Wrapper::Histo(h), "jet_pt").unwrap();

        let mut alias = Alias::new("jet_pt", dir.path().to_string_lossy());
        alias.sample = "data_2016".into();
        alias.is_data = true;
        alias.lumi = 19.7;

        let loaded = alias.resolve(&storage).unwrap();
        assert_eq!(loaded.sample, "data_2016");
        assert!(loaded.is_data);
        assert_eq!(loaded.lumi, 19.7);
        assert_eq!(loaded.hist.integral(None, false), 2.0);
        assert!(loaded.history().unwrap().mentions("load"));
    }

    #[test]
    fn test_resolve_missing_entry_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DirStorage::new(dir.path()).unwrap();
        let alias = Alias::new("absent", "somewhere");
        assert!(matches!(
            alias.resolve(&storage),
            Err(Error::NotFound(_))
        ));
    }
}
