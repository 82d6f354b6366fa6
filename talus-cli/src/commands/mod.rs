//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;

pub use job::{PrecomputeArgs, SubmitArgs};

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a site assessment job
    Submit(SubmitArgs),
    /// Submit a hazard precompute job to warm grid cells
    Precompute(PrecomputeArgs),
    /// Show the status of a job
    Status {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Poll a job until it reaches a terminal state
    Watch {
        /// Job ID or unambiguous prefix
        id: String,

        /// Seconds between polls
        #[arg(long, default_value_t = 2)]
        interval: u64,
    },
    /// Print a finished job's results as JSON
    Result {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// List recent jobs
    List {
        /// Maximum number of jobs to show
        #[arg(long)]
        limit: Option<i64>,
    },
    /// List queued jobs
    Scheduled,
    /// Cancel a queued or running job
    Cancel {
        /// Job ID or unambiguous prefix
        id: String,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
///
/// # Returns
/// Result indicating success or failure
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Submit(args) => job::submit(args, config).await,
        Commands::Precompute(args) => job::precompute(args, config).await,
        Commands::Status { id } => job::status(&id, config).await,
        Commands::Watch { id, interval } => job::watch(&id, interval, config).await,
        Commands::Result { id } => job::result(&id, config).await,
        Commands::List { limit } => job::list(limit, config).await,
        Commands::Scheduled => job::scheduled(config).await,
        Commands::Cancel { id } => job::cancel(&id, config).await,
    }
}
