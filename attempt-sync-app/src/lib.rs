pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod logging;
pub mod repl;

use anyhow::{Context, Result};
use cli::Cli;
use config::Config;
use repl::Repl;

/// Load config, select the attempt and hand over to the prompt.
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load_or_default(cli.config.as_deref())?.with_env_overrides()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = Some(base_url);
    }

    let controller = bootstrap::build_controller(&config).await?;
    controller
        .select_attempt_id(cli.attempt_id)
        .await
        .with_context(|| format!("Failed to load attempt {}", cli.attempt_id))?;

    let result = if cli.once {
        println!("{}", repl::render_processes(&controller.attempt_data()));
        Ok(())
    } else {
        Repl::new(controller.clone()).run().await
    };

    controller.shutdown();
    result
}
