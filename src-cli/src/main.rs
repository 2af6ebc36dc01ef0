use clap::Parser;
use remedy_cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    remedy_cli::init_tracing();
    remedy_cli::run(Cli::parse()).await
}
