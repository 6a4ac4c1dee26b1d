use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use hakilens::config::Config;
use hakilens::lens::types::ResearchMode;
use hakilens::matter::MatterBook;
use hakilens::repl;
use hakilens::settings::Settings;

#[derive(Parser)]
#[command(name = "hakilens", version, about = "Kenyan legal research assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with the general legal assistant.
    Chat,
    /// Open the interactive research hub.
    Lens,
    /// Run one research pass and print the results.
    Research {
        /// Target URL (must be on the research allow-list).
        url: String,
        /// Research mode.
        #[arg(long, value_enum, default_value = "auto-detect")]
        mode: ResearchMode,
    },
    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hakilens=warn")),
        )
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Command::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "hakilens", &mut io::stdout());
            Ok(())
        }
        command => {
            let settings = Settings::load()?;
            let config = Config::resolve(&settings)?;
            match command {
                Command::Chat => {
                    let mut matters = MatterBook::load(&settings.matters);
                    repl::run_hakibot(&config, &mut matters).await
                }
                Command::Lens => repl::run_lens_hub(&config).await,
                Command::Research { url, mode } => {
                    repl::run_research_once(&config, &url, mode).await
                }
                Command::Completions { .. } => unreachable!("handled above"),
            }
        }
    }
}
