//! MeSH exact-match dictionary
//!
//! Maps lowercase MeSH terms to their CUI. The dictionary is built upstream by
//! the exact string mapper and shipped as a JSON object; it is loaded fully
//! into memory before any row is streamed and never changes afterwards.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::error::{EnrichError, Result};

/// Lowercase term → CUI.
#[derive(Debug, Clone, Default)]
pub struct MeshDictionary {
    entries: FxHashMap<String, String>,
}

impl MeshDictionary {
    /// Load the dictionary from a JSON object file.
    ///
    /// Unreadable files are I/O errors; anything that is not an object of
    /// string values is a dictionary error.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| EnrichError::io(path, e))?;
        let entries: FxHashMap<String, String> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| {
                if e.is_io() {
                    EnrichError::io(path, e.into())
                } else {
                    EnrichError::Dictionary {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    }
                }
            })?;

        tracing::info!("Loaded MeSH dictionary: {} terms from {:?}", entries.len(), path);
        Ok(Self { entries })
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Exact lookup; callers lowercase the term first.
    pub fn get(&self, lowercase_term: &str) -> Option<&str> {
        self.entries.get(lowercase_term).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
