pub mod collate;
pub mod completion;
pub mod config;
pub mod minutes;
pub mod pipeline;
pub mod rdf;

pub use collate::{
    collate_directory, collate_to_file, seed_class_hierarchy, CollateError, CollateStats,
    SkippedGraph,
};
pub use completion::{CompletionClient, CompletionError, OpenAiClient};
pub use config::{ConfigError, EtlConfig, DEFAULT_API_BASE, DEFAULT_MODEL};
pub use minutes::{read_minutes, MinutesDocument, MinutesError};
pub use pipeline::{
    CandidateGraph, ConformanceReport, GraphExtractor, NormalizedGraph, PipelineDriver,
    PipelineError, ReviewDecision, ReviewGate, ReviewRequest, RunSummary, ShaclValidator,
};
pub use rdf::{ShapesGraph, Violation};
