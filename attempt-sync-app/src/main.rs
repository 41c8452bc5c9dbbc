use attempt_sync_app::{cli::Cli, logging};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    if let Err(e) = attempt_sync_app::run(cli).await {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
