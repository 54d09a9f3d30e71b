use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use oxrdf::Graph;
use serde::Serialize;
use thiserror::Error;

use crate::rdf::jsonld::{self, JsonLdError};
use crate::rdf::shacl::{ShapesError, ShapesGraph, Violation};

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shapes graph {path} is not valid Turtle: {source}")]
    Shapes {
        path: PathBuf,
        #[source]
        source: ShapesError,
    },

    #[error("data graph {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("data graph {path} cannot be expanded: {source}")]
    Expansion {
        path: PathBuf,
        #[source]
        source: JsonLdError,
    },
}

pub type ValidateResult<T> = std::result::Result<T, ValidateError>;

/// Outcome of checking one data graph. Non-conformance is a normal result,
/// never an error.
#[derive(Debug, Clone, Serialize)]
pub struct ConformanceReport {
    pub document_id: String,
    pub conforms: bool,
    pub violations: Vec<Violation>,
    pub generated_at: DateTime<Utc>,
}

impl ConformanceReport {
    /// Plain-text rendering persisted to the validation cache.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        text.push_str("Validation Report\n");
        text.push_str(&format!("Document: {}\n", self.document_id));
        text.push_str(&format!("Generated: {}\n", self.generated_at.to_rfc3339()));
        text.push_str(&format!("Conforms: {}\n", if self.conforms { "True" } else { "False" }));
        if !self.violations.is_empty() {
            text.push_str(&format!("Results ({}):\n", self.violations.len()));
            for violation in &self.violations {
                text.push_str(&format!("Constraint Violation in {}:\n", violation.constraint));
                text.push_str(&format!("\tFocus node: {}\n", violation.focus));
                if let Some(path) = &violation.path {
                    text.push_str(&format!("\tResult path: {path}\n"));
                }
                text.push_str(&format!("\tMessage: {}\n", violation.message));
            }
        }
        text
    }
}

/// Checks persisted graph files against a fixed shapes graph.
#[derive(Debug, Clone)]
pub struct ShaclValidator {
    shapes: ShapesGraph,
}

impl ShaclValidator {
    /// Loads the shapes graph once; it is reused for every document.
    pub fn open(shapes_path: &Path) -> ValidateResult<Self> {
        let bytes = fs::read(shapes_path).map_err(|source| ValidateError::Io {
            path: shapes_path.to_path_buf(),
            source,
        })?;
        let shapes = ShapesGraph::parse(&bytes).map_err(|source| ValidateError::Shapes {
            path: shapes_path.to_path_buf(),
            source,
        })?;
        if shapes.is_empty() {
            tracing::warn!(path = %shapes_path.display(), "shapes graph defines no node shapes");
        }
        Ok(Self { shapes })
    }

    /// Validates one persisted graph file.
    pub fn validate_file(&self, data_path: &Path) -> ValidateResult<ConformanceReport> {
        let bytes = fs::read(data_path).map_err(|source| ValidateError::Io {
            path: data_path.to_path_buf(),
            source,
        })?;
        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|source| ValidateError::Json {
                path: data_path.to_path_buf(),
                source,
            })?;
        let document_id = document_id(data_path);
        let triples =
            jsonld::expand_entity(&value, &document_id).map_err(|source| {
                ValidateError::Expansion { path: data_path.to_path_buf(), source }
            })?;
        let mut data = Graph::new();
        for triple in &triples {
            data.insert(triple.as_ref());
        }

        let violations = self.shapes.check(&data);
        let conforms = violations.is_empty();
        tracing::info!(
            document = %document_id,
            conforms,
            violations = violations.len(),
            "validated graph"
        );
        Ok(ConformanceReport { document_id, conforms, violations, generated_at: Utc::now() })
    }

    /// Validates and persists the report as
    /// `<document-id>_validation_results.txt` under `cache_dir`.
    pub fn validate_and_cache(
        &self,
        data_path: &Path,
        cache_dir: &Path,
    ) -> ValidateResult<(ConformanceReport, PathBuf)> {
        let report = self.validate_file(data_path)?;
        fs::create_dir_all(cache_dir).map_err(|source| ValidateError::Io {
            path: cache_dir.to_path_buf(),
            source,
        })?;
        let report_path = cache_dir.join(format!("{}_validation_results.txt", report.document_id));
        fs::write(&report_path, report.to_text()).map_err(|source| ValidateError::Io {
            path: report_path.clone(),
            source,
        })?;
        Ok((report, report_path))
    }
}

fn document_id(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "graph".to_owned(), |stem| stem.to_string_lossy().into_owned())
}
