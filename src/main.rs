use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use mailsort::cli;

#[derive(Debug, Parser)]
#[command(name = "mailsort")]
#[command(about = "Classify emails as productive or unproductive")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Send one email to the classification service and save the result
    Analyze {
        /// Email file to upload (.pdf, .txt, .eml)
        #[arg(long)]
        file: Option<PathBuf>,
        /// Email text to classify
        #[arg(long, conflicts_with = "stdin")]
        text: Option<String>,
        /// Read the email text from stdin
        #[arg(long)]
        stdin: bool,
        /// Extra context passed to the classifier
        #[arg(long)]
        context: Option<String>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List the most recent results, newest first
    History {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Show the full email text instead of a preview
        #[arg(long)]
        expand: bool,
    },
    /// Clear the saved history
    Reset {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Show productive/unproductive statistics
    Stats {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Launch the web dashboard
    Web {
        /// Address to bind (default from config: 127.0.0.1:5173)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Check the service, config, storage, and event log
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file to ~/.mailsort/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a single value, e.g. `endpoint.retries 2`
    Set { key: String, value: String },
    /// Reset the global config file to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Analyze {
            file,
            text,
            stdin,
            context,
            format,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            let input = cli::AnalyzeInput {
                file,
                text,
                stdin,
                context,
            };
            cli::run_analyze(input, fmt)
        }
        Commands::History { format, expand } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_history(fmt, expand)
        }
        Commands::Reset { yes } => cli::run_reset(yes),
        Commands::Stats { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_stats(fmt)
        }
        Commands::Web { addr } => {
            let cfg = mailsort::config::load();
            let addr = addr.unwrap_or_else(|| cfg.web.addr.clone());
            mailsort::web::serve(&cfg, &addr)
        }
        Commands::Health => cli::run_health(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
