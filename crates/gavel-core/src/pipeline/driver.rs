use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::minutes::MinutesDocument;
use crate::pipeline::extractor::{ExtractError, GraphExtractor};
use crate::pipeline::normalizer;
use crate::pipeline::validator::{ConformanceReport, ShaclValidator, ValidateError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("extraction failed for document {document_id}: {source}")]
    Extraction {
        document_id: String,
        #[source]
        source: ExtractError,
    },

    #[error("validation failed for document {document_id}: {source}")]
    Validation {
        document_id: String,
        #[source]
        source: ValidateError,
    },

    #[error("failed to write graph for document {document_id}: {source}")]
    GraphWrite {
        document_id: String,
        #[source]
        source: io::Error,
    },

    #[error("review gate failed: {0}")]
    Review(#[from] io::Error),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Where a document currently sits in its extract-validate-review pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Pending,
    Extracting,
    Validating,
    AwaitingReview,
    Accepted,
    Retrying,
}

impl DocumentState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Extracting => "extracting",
            Self::Validating => "validating",
            Self::AwaitingReview => "awaiting_review",
            Self::Accepted => "accepted",
            Self::Retrying => "retrying",
        }
    }
}

impl std::fmt::Display for DocumentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reviewer decision after seeing one document's report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    /// Keep the graph and move to the next document.
    Accept,
    /// Extract the same document again, overwriting its artifacts.
    Rerun,
}

/// Everything a reviewer gets to see before deciding.
#[derive(Debug)]
pub struct ReviewRequest<'a> {
    pub document: &'a MinutesDocument,
    pub attempt: u32,
    pub report: &'a ConformanceReport,
    pub graph_path: &'a Path,
    pub report_path: &'a Path,
}

/// Accept/rerun gate between validation and the next document. The console
/// implementation blocks on a human; tests script it.
pub trait ReviewGate {
    fn decide(&mut self, request: &ReviewRequest<'_>) -> io::Result<ReviewDecision>;
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub documents: usize,
    pub reruns: u64,
    pub duration_ms: u64,
}

/// Sequences extraction, normalization, validation, and review, one
/// document at a time.
pub struct PipelineDriver {
    extractor: GraphExtractor,
    validator: ShaclValidator,
    graphs_dir: PathBuf,
    reports_dir: PathBuf,
    start_index: usize,
}

impl PipelineDriver {
    pub fn new(
        extractor: GraphExtractor,
        validator: ShaclValidator,
        graphs_dir: impl Into<PathBuf>,
        reports_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            extractor,
            validator,
            graphs_dir: graphs_dir.into(),
            reports_dir: reports_dir.into(),
            start_index: 0,
        }
    }

    /// Skips documents before `start_index`, resuming a previous run.
    #[must_use]
    pub fn with_start_index(mut self, start_index: usize) -> Self {
        self.start_index = start_index;
        self
    }

    /// Processes every document from the start index onward. Strictly
    /// sequential: a document must be accepted before the next begins.
    pub async fn run(
        &self,
        documents: &[MinutesDocument],
        gate: &mut dyn ReviewGate,
    ) -> PipelineResult<RunSummary> {
        let run_id = Uuid::now_v7();
        let started = Instant::now();
        tracing::info!(
            %run_id,
            documents = documents.len(),
            start_index = self.start_index,
            "pipeline run starting"
        );

        let mut processed = 0;
        let mut reruns = 0;
        for document in documents.iter().skip(self.start_index) {
            reruns += self.process_document(document, gate).await?;
            processed += 1;
        }

        let summary = RunSummary {
            run_id,
            documents: processed,
            reruns,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        tracing::info!(
            %run_id,
            documents = summary.documents,
            reruns = summary.reruns,
            "pipeline run finished"
        );
        Ok(summary)
    }

    /// Runs one document to acceptance, returning how many reruns the
    /// reviewer requested.
    async fn process_document(
        &self,
        document: &MinutesDocument,
        gate: &mut dyn ReviewGate,
    ) -> PipelineResult<u64> {
        let mut state = DocumentState::Pending;
        let mut attempt: u32 = 0;
        let graph_path = self.graphs_dir.join(format!("{}.json", document.id));
        loop {
            attempt += 1;
            advance(&mut state, DocumentState::Extracting, &document.id);
            let candidate = self.extractor.extract(document).await.map_err(|source| {
                PipelineError::Extraction { document_id: document.id.clone(), source }
            })?;
            let normalized = normalizer::normalize(candidate);
            self.write_graph(&normalized, &graph_path, document).await?;

            advance(&mut state, DocumentState::Validating, &document.id);
            let (report, report_path) = self
                .validator
                .validate_and_cache(&graph_path, &self.reports_dir)
                .map_err(|source| PipelineError::Validation {
                    document_id: document.id.clone(),
                    source,
                })?;

            advance(&mut state, DocumentState::AwaitingReview, &document.id);
            let request = ReviewRequest {
                document,
                attempt,
                report: &report,
                graph_path: &graph_path,
                report_path: &report_path,
            };
            match gate.decide(&request)? {
                ReviewDecision::Accept => {
                    advance(&mut state, DocumentState::Accepted, &document.id);
                    return Ok(u64::from(attempt) - 1);
                }
                ReviewDecision::Rerun => {
                    advance(&mut state, DocumentState::Retrying, &document.id);
                }
            }
        }
    }

    async fn write_graph(
        &self,
        graph: &normalizer::NormalizedGraph,
        path: &Path,
        document: &MinutesDocument,
    ) -> PipelineResult<()> {
        let wrap = |source| PipelineError::GraphWrite { document_id: document.id.clone(), source };
        tokio::fs::create_dir_all(&self.graphs_dir).await.map_err(wrap)?;
        graph.write_to(path).map_err(wrap)
    }
}

impl std::fmt::Debug for PipelineDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineDriver")
            .field("graphs_dir", &self.graphs_dir)
            .field("reports_dir", &self.reports_dir)
            .field("start_index", &self.start_index)
            .finish_non_exhaustive()
    }
}

fn advance(state: &mut DocumentState, next: DocumentState, document_id: &str) {
    tracing::debug!(document = %document_id, from = %state, to = %next, "state transition");
    *state = next;
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::Value;
    use tempfile::TempDir;

    use crate::completion::{CompletionClient, CompletionResult};

    use super::*;

    struct CountingClient {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CompletionClient for CountingClient {
        async fn complete(&self, _prompt: &str) -> CompletionResult<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!(
                "{{\"@type\": \"Event\", \"name\": \"Meeting\", \"attempt\": {call}, \
                 \"url\": \"https://townofbrunswick.org/files/M1.pdf\"}}"
            ))
        }
    }

    struct ScriptedGate {
        decisions: Vec<ReviewDecision>,
        seen_attempts: Vec<u32>,
    }

    impl ScriptedGate {
        fn new(decisions: Vec<ReviewDecision>) -> Self {
            Self { decisions, seen_attempts: Vec::new() }
        }
    }

    impl ReviewGate for ScriptedGate {
        fn decide(&mut self, request: &ReviewRequest<'_>) -> io::Result<ReviewDecision> {
            self.seen_attempts.push(request.attempt);
            Ok(self.decisions.remove(0))
        }
    }

    fn driver(dir: &TempDir, calls: &Arc<AtomicUsize>) -> PipelineDriver {
        let shapes_path = dir.path().join("shapes.ttl");
        fs::write(&shapes_path, "").unwrap();
        let extractor = GraphExtractor::new(
            Box::new(CountingClient { calls: Arc::clone(calls) }),
            "Extract:\n",
        );
        let validator = ShaclValidator::open(&shapes_path).unwrap();
        PipelineDriver::new(
            extractor,
            validator,
            dir.path().join("graphs"),
            dir.path().join("reports"),
        )
    }

    fn documents(ids: &[&str]) -> Vec<MinutesDocument> {
        ids.iter()
            .map(|id| MinutesDocument::new(*id, "Motion passed 5-0").unwrap())
            .collect()
    }

    #[tokio::test]
    async fn accepted_documents_produce_graph_and_report_files() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let driver = driver(&dir, &calls);
        let mut gate = ScriptedGate::new(vec![ReviewDecision::Accept, ReviewDecision::Accept]);

        let summary = driver.run(&documents(&["M1", "M2"]), &mut gate).await.unwrap();
        assert_eq!(summary.documents, 2);
        assert_eq!(summary.reruns, 0);
        assert!(dir.path().join("graphs").join("M1.json").exists());
        assert!(dir.path().join("graphs").join("M2.json").exists());
        assert!(dir.path().join("reports").join("M1_validation_results.txt").exists());
        assert_eq!(gate.seen_attempts, vec![1, 1]);
    }

    #[tokio::test]
    async fn rerun_repeats_the_same_document_and_overwrites_its_graph() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let driver = driver(&dir, &calls);
        let mut gate = ScriptedGate::new(vec![ReviewDecision::Rerun, ReviewDecision::Accept]);

        let summary = driver.run(&documents(&["M1"]), &mut gate).await.unwrap();
        assert_eq!(summary.documents, 1);
        assert_eq!(summary.reruns, 1);
        assert_eq!(gate.seen_attempts, vec![1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let value: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("graphs").join("M1.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(value[0]["attempt"], Value::from(2));
    }

    #[tokio::test]
    async fn start_index_skips_already_processed_documents() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let driver = driver(&dir, &calls).with_start_index(1);
        let mut gate = ScriptedGate::new(vec![ReviewDecision::Accept]);

        let summary = driver.run(&documents(&["M1", "M2"]), &mut gate).await.unwrap();
        assert_eq!(summary.documents, 1);
        assert!(!dir.path().join("graphs").join("M1.json").exists());
        assert!(dir.path().join("graphs").join("M2.json").exists());
    }

    #[tokio::test]
    async fn malformed_completions_surface_with_the_document_id() {
        struct GarbageClient;

        #[async_trait]
        impl CompletionClient for GarbageClient {
            async fn complete(&self, _prompt: &str) -> CompletionResult<String> {
                Ok("no json at all".to_owned())
            }
        }

        let dir = TempDir::new().unwrap();
        let shapes_path = dir.path().join("shapes.ttl");
        fs::write(&shapes_path, "").unwrap();
        let driver = PipelineDriver::new(
            GraphExtractor::new(Box::new(GarbageClient), "Extract:\n"),
            ShaclValidator::open(&shapes_path).unwrap(),
            dir.path().join("graphs"),
            dir.path().join("reports"),
        );
        let mut gate = ScriptedGate::new(vec![]);

        let error = driver.run(&documents(&["M9"]), &mut gate).await.unwrap_err();
        assert!(matches!(
            &error,
            PipelineError::Extraction { document_id, .. } if document_id == "M9"
        ));
        assert!(!dir.path().join("graphs").join("M9.json").exists());
    }
}
