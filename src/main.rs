use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod core;
mod daemon;
mod query;

use crate::core::settings::Settings;

#[derive(Parser)]
#[command(name = "ticket-watch")]
#[command(author, version, about = "Desktop notifications for new Sonar helpdesk tickets")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch for new tickets and raise desktop notifications (default)
    Watch,

    /// Check that the GraphQL endpoint and API key work
    Probe {
        /// Print the raw response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a test desktop notification
    TestNotification,

    /// List tickets currently matching the tracked statuses
    Tickets {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(debug: bool, json: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Watch);

    if let Commands::Completions { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let (settings, source) = Settings::load()?;
    init_logging(settings.debug, cli.log_json);
    source.log();

    match command {
        Commands::Watch => daemon::run(&settings).await,
        Commands::Probe { json } => cli::probe::run(&settings, json).await,
        Commands::TestNotification => cli::notify::run(&settings),
        Commands::Tickets { json } => cli::tickets::run(&settings, json).await,
        Commands::Completions { .. } => Ok(()),
    }
}
