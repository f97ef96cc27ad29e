use bucks_cache::cli::{self, Cli, Command};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Lookup(args) => cli::lookup::run(args).await,
        Command::Evict(args) => cli::evict::run(args).await,
    }
}
