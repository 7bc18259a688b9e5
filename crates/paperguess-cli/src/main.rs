//! paperguess CLI — play the paper guessing game from a terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "paperguess",
    version,
    about = "Guess when a paper was published and how often it was cited"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play rounds interactively
    Play {
        /// Server base URL (overrides config)
        #[arg(long)]
        server: Option<String>,

        /// Where scores are computed: local or remote
        #[arg(long)]
        score_mode: Option<String>,

        /// Enter citation guesses as slider positions
        #[arg(long)]
        slider: bool,

        /// Write the session history as JSON when the game ends
        #[arg(long)]
        save_history: Option<PathBuf>,

        /// Preferences file path
        #[arg(long)]
        prefs: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score a single guess offline
    Score {
        /// Guessed publication year
        #[arg(long)]
        year_guess: i32,

        /// Actual publication year
        #[arg(long)]
        year: i32,

        /// Guessed citation count (or slider position with --slider)
        #[arg(long, allow_negative_numbers = true)]
        cite_guess: i64,

        /// Actual citation count
        #[arg(long)]
        cites: u32,

        /// Treat --cite-guess as a slider position
        #[arg(long)]
        slider: bool,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Convert between slider positions and citation counts
    Slider {
        /// Slider position to convert
        #[arg(long, conflicts_with = "citations", allow_negative_numbers = true)]
        position: Option<i64>,

        /// Citation count to convert
        #[arg(long)]
        citations: Option<u32>,
    },

    /// Show the server's paper cache status
    Stats {
        /// Keep polling until interrupted
        #[arg(long)]
        watch: bool,

        /// Server base URL (overrides config)
        #[arg(long)]
        server: Option<String>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show or change the display theme
    Theme {
        /// show, toggle, light or dark
        #[arg(default_value = "show")]
        action: String,

        /// Preferences file path
        #[arg(long)]
        prefs: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter paperguess.toml
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("paperguess=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            server,
            score_mode,
            slider,
            save_history,
            prefs,
            config,
        } => {
            commands::play::execute(commands::play::PlayArgs {
                server,
                score_mode,
                slider,
                save_history,
                prefs,
                config,
            })
            .await
        }
        Commands::Score {
            year_guess,
            year,
            cite_guess,
            cites,
            slider,
            format,
        } => commands::score::execute(year_guess, year, cite_guess, cites, slider, format),
        Commands::Slider {
            position,
            citations,
        } => commands::slider::execute(position, citations),
        Commands::Stats {
            watch,
            server,
            format,
            config,
        } => commands::stats::execute(watch, server, format, config).await,
        Commands::Theme {
            action,
            prefs,
            config,
        } => commands::theme::execute(action, prefs, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
