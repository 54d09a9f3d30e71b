use anyhow::Result;
use clap::Parser;

use gavel::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    dispatch(cli.command).await
}

async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Extract(args) => cli::extract::run(args).await,
        Commands::Run(args) => cli::run::run(args).await,
        Commands::Normalize { graphs } => cli::normalize::run(&graphs),
        Commands::Collate { graphs, dataset } => cli::collate::run(&graphs, &dataset),
        Commands::Validate { graph, shapes, reports } => {
            cli::validate::run(&graph, &shapes, &reports)
        }
    }
}
