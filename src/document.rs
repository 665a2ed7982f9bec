//! Catalog documents on disk.
//!
//! A document is a YAML or JSON file with two arrays of records:
//!
//! ```yaml
//! states:
//!   - { workflow_id: 1, state_id: 10, sort_order: 5, validity_token: n }
//!   - { workflow_id: 1, state_id: 20, sort_order: 2, validity_token: y }
//! transitions:
//!   - { workflow_id: 1, transition_id: 100, from_state_id: 10, to_state_id: 20, is_default: true }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use wfresolve_core::{
    load_catalog, CoreError, LoadOptions, Loaded, StateRecord, TransitionRecord,
};

/// Errors reading a catalog document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read catalog '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse catalog '{}': {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error(transparent)]
    Load(#[from] CoreError),
}

/// Serialization format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.json` files are JSON; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Raw records as read from a document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub states: Vec<StateRecord>,
    #[serde(default)]
    pub transitions: Vec<TransitionRecord>,
}

impl CatalogDocument {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| DocumentError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, DocumentFormat::from_path(path)).map_err(|reason| {
            DocumentError::Parse {
                path: path.to_path_buf(),
                reason,
            }
        })
    }

    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self, String> {
        match format {
            DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            // An empty YAML file deserializes to unit, not a map.
            DocumentFormat::Yaml if content.trim().is_empty() => Ok(Self::default()),
            DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        }
    }

    /// Builds a catalog from the document's records.
    pub fn load(&self, options: &LoadOptions) -> Result<Loaded, CoreError> {
        load_catalog(&self.states, &self.transitions, options)
    }
}

/// Reads and loads a catalog document in one step.
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Loaded, DocumentError> {
    let document = CatalogDocument::from_file(path)?;
    tracing::debug!(
        "Read {} state and {} transition records from {}",
        document.states.len(),
        document.transitions.len(),
        path.display()
    );
    Ok(document.load(options)?)
}
