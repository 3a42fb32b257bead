//! GroundChat CLI — the main entry point.
//!
//! Commands:
//! - `init`      — Write a config template
//! - `chat`      — Interactive chat or single-message mode
//! - `models`    — List models offered by the endpoint
//! - `image`     — Generate one image
//! - `search`    — Run a web search and print the context block
//! - `settings`  — Show or change the web-search preference
//! - `doctor`    — Diagnose configuration

use clap::{Parser, Subcommand, ValueEnum};

mod commands;
mod runtime;

#[derive(Parser)]
#[command(
    name = "groundchat",
    about = "GroundChat — streaming chat grounded in live web search",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,

    /// Chat with the model
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Override the configured model
        #[arg(long)]
        model: Option<String>,
    },

    /// List available models
    Models,

    /// Generate an image from a prompt
    Image {
        /// What the image should show
        prompt: String,
    },

    /// Search the web and print the formatted context
    Search {
        /// The search query
        query: String,
    },

    /// Show or change preferences
    Settings {
        #[command(subcommand)]
        setting: Setting,
    },

    /// Diagnose configuration
    Doctor,
}

#[derive(Subcommand)]
enum Setting {
    /// Augment chat turns with web search results
    WebSearch {
        /// New value; omit to print the current one
        #[arg(value_enum)]
        state: Option<Toggle>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so streamed replies stay clean on stdout
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Chat { message, model } => commands::chat::run(message, model).await?,
        Commands::Models => commands::models::run().await?,
        Commands::Image { prompt } => commands::image::run(&prompt).await?,
        Commands::Search { query } => commands::search::run(&query).await?,
        Commands::Settings {
            setting: Setting::WebSearch { state },
        } => commands::settings::web_search(state.map(|t| matches!(t, Toggle::On)))?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
