use std::path::Path;

use anyhow::Result;
use gavel_core::pipeline::normalizer;

pub fn run(graphs: &Path) -> Result<()> {
    let count = normalizer::normalize_directory(graphs)?;
    println!("Normalized {count} graph file(s) under {}.", graphs.display());
    Ok(())
}
