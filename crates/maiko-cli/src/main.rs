//! MAiKO terminal client

mod repl;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use maiko::{MaikoConfig, ProviderType};

/// Chat with GLM or Claude while MAiKO remembers what matters about you.
#[derive(Parser, Debug)]
#[command(name = "maiko", version, about, long_about = None)]
struct Cli {
    /// YAML configuration file. Defaults to `<config dir>/maiko/config.yaml` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an interactive chat (the default).
    Chat {
        /// Engine to start with: glm or claude.
        #[arg(long)]
        engine: Option<ProviderType>,
        /// Reopen a stored conversation.
        #[arg(long)]
        open: Option<String>,
    },
    /// Print the facts MAiKO currently shows the model.
    Facts,
    /// Print archived conversation summaries, newest first.
    Archive,
    /// List stored conversations, newest first.
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn default_config_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("maiko").join("config.yaml");
    path.exists().then_some(path)
}

fn init_tracing(log_level: &str) {
    let default_filter = format!("maiko={}", log_level);
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or(default_filter))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.or_else(default_config_path);
    let config = MaikoConfig::load(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("failed to load configuration from {}", path.display()),
        None => "invalid configuration".to_string(),
    })?;

    init_tracing(&config.log_level);

    let mut session = maiko::session::build_session(&config);

    match cli.command.unwrap_or(Commands::Chat {
        engine: None,
        open: None,
    }) {
        Commands::Chat { engine, open } => {
            if let Some(engine) = engine {
                session.select_engine(engine);
            }
            if let Some(id) = open {
                session
                    .open(&id)
                    .await
                    .with_context(|| format!("cannot open conversation {}", id))?;
            }
            repl::Repl::new(session).run().await?;
        }
        Commands::Facts => {
            let facts = session.facts().await;
            if facts.is_empty() {
                println!("No facts yet.");
            }
            for fact in facts {
                println!("- {}", fact);
            }
        }
        Commands::Archive => {
            let records = session.archive_records().await;
            if records.is_empty() {
                println!("Archive is empty.");
            }
            for record in records {
                println!("[{}]\n{}\n", record.label, record.summary);
            }
        }
        Commands::History { limit } => {
            let ids = session.list_conversations().await;
            if ids.is_empty() {
                println!("No conversations.");
            }
            for id in ids.into_iter().take(limit) {
                println!("{}  {}", id, session.preview(&id, repl::PREVIEW_CHARS).await);
            }
        }
    }

    Ok(())
}
