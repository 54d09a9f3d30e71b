use std::path::Path;

use anyhow::Result;
use gavel_core::collate::collate_to_file;

pub fn run(graphs: &Path, dataset: &Path) -> Result<()> {
    let stats = collate_to_file(graphs, dataset)?;
    for skipped in &stats.skipped {
        eprintln!("Skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    println!(
        "Collated {} document graph(s) ({} quads, {} seeded) into {}",
        stats.documents,
        stats.quads,
        stats.seed_triples,
        dataset.display()
    );
    Ok(())
}
