use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::pipeline::extractor::CandidateGraph;
use crate::rdf::vocab;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} does not hold a single entity")]
    NotASingleEntity { path: PathBuf },
}

pub type NormalizeResult<T> = std::result::Result<T, NormalizeError>;

/// A graph in canonical form: fixed context, document linkage under
/// `subjectOf`, single-entity array file form.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedGraph {
    root: Map<String, Value>,
}

/// The one `@context` every persisted graph carries.
#[must_use]
pub fn canonical_context() -> Value {
    json!({
        "@vocab": vocab::SCHEMA_NS,
        "mun": vocab::INSTANCE_NS,
    })
}

/// Rewrites extractor output into canonical form.
///
/// The document URL moves under `subjectOf.@id` with spaces
/// percent-encoded (the only escaping applied), and whatever `@context`
/// the completion invented is replaced with the canonical one.
#[must_use]
pub fn normalize(candidate: CandidateGraph) -> NormalizedGraph {
    NormalizedGraph { root: normalize_root(candidate.into_root()) }
}

fn normalize_root(mut root: Map<String, Value>) -> Map<String, Value> {
    match root.remove("url") {
        Some(Value::String(url)) => {
            let encoded = url.replace(' ', "%20");
            root.insert("subjectOf".to_owned(), json!({ "@id": encoded }));
        }
        Some(other) => {
            tracing::warn!(value = %other, "non-string url dropped without document linkage");
        }
        None => {}
    }
    root.remove("@context");
    root.insert("@context".to_owned(), canonical_context());
    root
}

impl NormalizedGraph {
    /// File form: a one-element array, as array-based JSON-LD readers
    /// expect.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Array(vec![Value::Object(self.root.clone())])
    }

    #[must_use]
    pub fn document_url(&self) -> Option<&str> {
        self.root.get("subjectOf")?.get("@id")?.as_str()
    }

    #[must_use]
    pub fn root_id(&self) -> Option<&str> {
        self.root.get("@id")?.as_str()
    }

    #[must_use]
    pub fn context(&self) -> Option<&Value> {
        self.root.get("@context")
    }

    /// Persists pretty-printed JSON, overwriting any previous attempt.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let mut text = serde_json::to_string_pretty(&self.to_json())?;
        text.push('\n');
        fs::write(path, text)
    }
}

/// Re-normalizes one persisted graph file in place. Accepts both the
/// array file form and a bare entity object.
pub fn normalize_file(path: &Path) -> NormalizeResult<()> {
    let bytes = fs::read(path).map_err(|source| NormalizeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|source| NormalizeError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let root = single_entity(value)
        .ok_or_else(|| NormalizeError::NotASingleEntity { path: path.to_path_buf() })?;
    let graph = NormalizedGraph { root: normalize_root(root) };
    graph.write_to(path).map_err(|source| NormalizeError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Re-normalizes every graph file in `dir`, returning how many were
/// rewritten.
pub fn normalize_directory(dir: &Path) -> NormalizeResult<usize> {
    let entries = fs::read_dir(dir).map_err(|source| NormalizeError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|extension| extension == "json"))
        .collect();
    paths.sort();
    for path in &paths {
        normalize_file(path)?;
        tracing::debug!(path = %path.display(), "re-normalized graph file");
    }
    Ok(paths.len())
}

fn single_entity(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(root) => Some(root),
        Value::Array(mut items) if items.len() == 1 => match items.pop() {
            Some(Value::Object(root)) => Some(root),
            _ => None,
        },
        _ => None,
    }
}
