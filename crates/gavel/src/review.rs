use std::io;

use dialoguer::Select;
use gavel_core::pipeline::{ReviewDecision, ReviewGate, ReviewRequest};

/// Interactive gate between validation and the next document: shows the
/// conformance report and asks whether to keep the graph or try again.
#[derive(Debug, Default)]
pub struct ConsoleReviewer;

impl ReviewGate for ConsoleReviewer {
    fn decide(&mut self, request: &ReviewRequest<'_>) -> io::Result<ReviewDecision> {
        println!();
        println!("Document: {} (attempt {})", request.document.id, request.attempt);
        println!("Graph:    {}", request.graph_path.display());
        println!("Report:   {}", request.report_path.display());
        print!("{}", request.report.to_text());

        let items = [
            "Accept and continue to the next document",
            "Re-run extraction for this document",
        ];
        let selection = Select::new()
            .with_prompt("Review the extracted graph")
            .items(&items)
            .default(0)
            .interact_opt()
            .map_err(io::Error::other)?;

        match selection {
            Some(0) => Ok(ReviewDecision::Accept),
            Some(_) => Ok(ReviewDecision::Rerun),
            None => Err(io::Error::other("review cancelled")),
        }
    }
}
