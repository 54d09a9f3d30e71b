pub mod collate;
pub mod extract;
pub mod normalize;
pub mod run;
pub mod validate;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use gavel_core::config::{EtlConfig, DEFAULT_API_BASE, DEFAULT_MODEL};

#[derive(Parser)]
#[command(
    name = "gvl",
    about = "Knowledge-graph extraction for municipal meeting minutes",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract and validate a graph per meeting, pausing for review
    Extract(PipelineArgs),
    /// Extract every meeting, then collate the accepted graphs
    Run(PipelineArgs),
    /// Rewrite extracted graph files into canonical form
    Normalize {
        /// Directory of graph JSON files
        #[arg(long, default_value = "data/output/graphs")]
        graphs: PathBuf,
    },
    /// Merge normalized graphs into one TriG dataset
    Collate {
        /// Directory of normalized graph JSON files
        #[arg(long, default_value = "data/output/graphs")]
        graphs: PathBuf,
        /// Where to write the dataset
        #[arg(long, default_value = "data/output/minutes.trig")]
        dataset: PathBuf,
    },
    /// Validate one normalized graph file and cache its report
    Validate {
        /// Graph JSON file to validate
        graph: PathBuf,
        /// Shapes graph in Turtle
        #[arg(long, default_value = "assets/minutes.shapes.ttl")]
        shapes: PathBuf,
        /// Directory for cached validation reports
        #[arg(long, default_value = "data/cache/validation")]
        reports: PathBuf,
    },
}

#[derive(Args)]
pub struct PipelineArgs {
    /// Directory of meeting-minutes text files
    #[arg(long, default_value = "data/input/minutes")]
    pub minutes: PathBuf,
    /// Extraction prompt template
    #[arg(long, default_value = "assets/extraction_prompt.txt")]
    pub prompt: PathBuf,
    /// Shapes graph in Turtle
    #[arg(long, default_value = "assets/minutes.shapes.ttl")]
    pub shapes: PathBuf,
    /// Directory for extracted graph files
    #[arg(long, default_value = "data/output/graphs")]
    pub graphs: PathBuf,
    /// Directory for cached validation reports
    #[arg(long, default_value = "data/cache/validation")]
    pub reports: PathBuf,
    /// Where `run` writes the collated dataset
    #[arg(long, default_value = "data/output/minutes.trig")]
    pub dataset: PathBuf,
    /// Skip meetings before this position in the sorted input
    #[arg(long, default_value_t = 0)]
    pub start_index: usize,
    /// Chat completion model
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,
    /// Chat completion API base URL
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,
}

impl PipelineArgs {
    /// Resolves CLI arguments into pipeline configuration, picking the
    /// completion credential up from `OPENAI_API_KEY`.
    #[must_use]
    pub fn into_config(self) -> EtlConfig {
        EtlConfig {
            minutes_dir: self.minutes,
            prompt_path: self.prompt,
            shapes_path: self.shapes,
            graphs_dir: self.graphs,
            reports_dir: self.reports,
            dataset_path: self.dataset,
            start_index: self.start_index,
            api_base: self.api_base,
            model: self.model,
            api_key: std::env::var("OPENAI_API_KEY").ok(),
        }
    }
}
