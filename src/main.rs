use clap::Parser;
use user_accounts::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Migrate(args) => cli::migrate::run(args).await,
    }
}
