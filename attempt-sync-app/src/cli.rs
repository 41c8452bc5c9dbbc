use clap::Parser;
use std::path::PathBuf;
use uuid::Uuid;

/// Follow a task attempt's processes and send follow-ups to its agent.
#[derive(Debug, Parser)]
#[command(name = "attempt-sync", version)]
pub struct Cli {
    /// Task attempt to follow
    pub attempt_id: Uuid,

    /// YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Backend URL, overriding config and port-file discovery
    #[arg(long)]
    pub base_url: Option<String>,

    /// Print the attempt once and exit instead of starting the prompt
    #[arg(long)]
    pub once: bool,
}
