use std::path::Path;

use anyhow::Result;
use gavel_core::pipeline::ShaclValidator;

pub fn run(graph: &Path, shapes: &Path, reports: &Path) -> Result<()> {
    let validator = ShaclValidator::open(shapes)?;
    let (report, report_path) = validator.validate_and_cache(graph, reports)?;
    print!("{}", report.to_text());
    println!("Report cached at {}.", report_path.display());
    Ok(())
}
