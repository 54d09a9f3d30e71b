use anyhow::Result;

use crate::cli::{collate, extract, PipelineArgs};

/// Full pass: extract and review every document, then collate whatever
/// was accepted into the dataset.
pub async fn run(args: PipelineArgs) -> Result<()> {
    let config = args.into_config();
    let summary = extract::extract_documents(&config).await?;
    extract::report(&summary, &config);
    collate::run(&config.graphs_dir, &config.dataset_path)
}
