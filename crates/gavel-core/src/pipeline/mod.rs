pub mod driver;
pub mod extractor;
pub mod normalizer;
pub mod validator;

pub use driver::{
    DocumentState, PipelineDriver, PipelineError, PipelineResult, ReviewDecision, ReviewGate,
    ReviewRequest, RunSummary,
};
pub use extractor::{CandidateGraph, ExtractError, ExtractResult, GraphExtractor};
pub use normalizer::{
    canonical_context, normalize, normalize_directory, normalize_file, NormalizeError,
    NormalizeResult, NormalizedGraph,
};
pub use validator::{ConformanceReport, ShaclValidator, ValidateError, ValidateResult};
