use clap::Parser;
use semantic_cache_qa::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Ask(args) => cli::ask::run(args).await,
        Command::Chat(args) => cli::chat::run(args).await,
        Command::Demo => cli::demo::run().await,
    }
}
