use anyhow::Result;
use gavel_core::completion::OpenAiClient;
use gavel_core::config::EtlConfig;
use gavel_core::minutes;
use gavel_core::pipeline::{GraphExtractor, PipelineDriver, RunSummary, ShaclValidator};

use crate::cli::PipelineArgs;
use crate::review::ConsoleReviewer;

pub async fn run(args: PipelineArgs) -> Result<()> {
    let config = args.into_config();
    let summary = extract_documents(&config).await?;
    report(&summary, &config);
    Ok(())
}

/// Extracts, validates, and reviews every document in the minutes
/// directory, one at a time. Settings are checked before any work starts.
pub async fn extract_documents(config: &EtlConfig) -> Result<RunSummary> {
    let prompt = config.load_prompt()?;
    config.ensure_shapes()?;
    let api_key = config.require_api_key()?;

    let client = OpenAiClient::new(config.api_base.as_str(), api_key, config.model.as_str())?;
    let driver = PipelineDriver::new(
        GraphExtractor::new(Box::new(client), prompt),
        ShaclValidator::open(&config.shapes_path)?,
        &config.graphs_dir,
        &config.reports_dir,
    )
    .with_start_index(config.start_index);

    let documents = minutes::read_minutes(&config.minutes_dir)?;
    let mut reviewer = ConsoleReviewer::default();
    Ok(driver.run(&documents, &mut reviewer).await?)
}

pub fn report(summary: &RunSummary, config: &EtlConfig) {
    if summary.documents == 0 {
        println!("No meeting minutes to process under {}.", config.minutes_dir.display());
    } else {
        println!(
            "Accepted {} graph(s) after {} rerun(s); reports are under {}.",
            summary.documents,
            summary.reruns,
            config.reports_dir.display()
        );
    }
}
