//! The `paperguess play` command.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use comfy_table::Cell;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use paperguess_client::config::{create_source, load_config_from, PaperguessConfig};
use paperguess_core::badge::CacheBadge;
use paperguess_core::loader::{LoadObserver, LoadOutcome};
use paperguess_core::model::{CitationInput, GuessInput, InputMode, Round, ScoreMode, Theme};
use paperguess_core::scoring::{citations_from_slider, MAX_AXIS_SCORE, SLIDER_MAX};
use paperguess_core::session::{GameSession, RoundOutcome, SessionHistory};
use paperguess_core::traits::ImageStatus;

use super::{theme_store, themed_table};

pub struct PlayArgs {
    pub server: Option<String>,
    pub score_mode: Option<String>,
    pub slider: bool,
    pub save_history: Option<PathBuf>,
    pub prefs: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Console loading indicator.
struct ConsoleObserver {
    max_attempts: u32,
}

impl LoadObserver for ConsoleObserver {
    fn on_loading(&self, attempt: u32) {
        if attempt == 1 {
            eprintln!("Loading paper...");
        } else {
            eprintln!("Loading paper (attempt {attempt}/{})...", self.max_attempts);
        }
    }

    fn on_retry(&self, attempt: u32, error: &str, delay: Duration) {
        eprintln!(
            "  attempt {attempt} failed: {error}; retrying in {:.1}s",
            delay.as_secs_f64()
        );
    }

    fn on_ready(&self, _round: &Round, image: &ImageStatus) {
        match image {
            ImageStatus::Loaded { bytes } => eprintln!("  title page loaded ({bytes} bytes)"),
            ImageStatus::Broken { reason } => eprintln!("  title page unavailable: {reason}"),
            ImageStatus::Skipped => {}
        }
    }

    fn on_failed(&self, attempts: u32, error: &str) {
        eprintln!("Could not load a paper after {attempts} attempts: {error}");
    }
}

/// What the player asked for between rounds.
enum Next {
    Round,
    Reset,
    Quit,
}

type Input = Lines<BufReader<Stdin>>;

/// Print `label` and read one trimmed line. `None` on end of input.
async fn prompt(lines: &mut Input, label: &str) -> Result<Option<String>> {
    print!("{label}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?.map(|l| l.trim().to_string()))
}

fn is_quit(answer: &str) -> bool {
    matches!(answer, "q" | "quit")
}

pub async fn execute(args: PlayArgs) -> Result<()> {
    let mut config = load_config_from(args.config.as_deref())?;
    if let Some(url) = args.server {
        config.server_url = url;
    }
    if let Some(mode) = args.score_mode {
        config.score_mode = match mode.as_str() {
            "local" => ScoreMode::Local,
            "remote" => ScoreMode::Remote,
            other => anyhow::bail!("unknown score mode: {other} (expected local or remote)"),
        };
    }
    if args.slider {
        config.citation_input = InputMode::Slider;
    }

    let store = theme_store(args.prefs, &config)?;
    let mut theme = store.get().unwrap_or_else(|e| {
        tracing::warn!("{e}");
        config.default_theme
    });

    let source = create_source(&config)?;
    let badge = CacheBadge::spawn(
        Arc::clone(&source),
        Duration::from_secs(config.cache_poll_secs.max(1)),
    );
    let session = GameSession::new(source, config.session_config());
    let observer = ConsoleObserver {
        max_attempts: config.max_attempts,
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "paperguess: {} ({} scoring, {theme} theme)",
        config.server_url,
        match config.score_mode {
            ScoreMode::Local => "local",
            ScoreMode::Remote => "remote",
        }
    );

    let mut next = Next::Round;
    loop {
        let outcome = match next {
            Next::Round => session.next_round(&observer).await,
            Next::Reset => session.reset(&observer).await,
            Next::Quit => break,
        };

        match outcome {
            LoadOutcome::Ready(_) => {}
            LoadOutcome::AlreadyLoading => anyhow::bail!("a round is already loading"),
            LoadOutcome::Failed { .. } => {
                next = match prompt(&mut lines, "[r]etry or [q]uit: ").await?.as_deref() {
                    Some("r") | Some("retry") | Some("") => Next::Round,
                    _ => Next::Quit,
                };
                continue;
            }
        }

        let tally = session.tally();
        println!("\nRound {}", tally.round_number);
        if let Some(label) = badge.label() {
            println!("  [{label}]");
        }

        if !play_round(&session, &mut lines, &config).await? {
            break;
        }

        next = loop {
            let answer = prompt(&mut lines, "[n]ext, [r]eset score, [t]heme, [q]uit: ").await?;
            match answer.as_deref() {
                Some("n") | Some("next") | Some("") => break Next::Round,
                Some("r") | Some("reset") => break Next::Reset,
                Some("t") | Some("theme") => {
                    theme = theme.toggled();
                    if let Err(e) = store.set(theme) {
                        tracing::warn!("{e}");
                    }
                    println!("Theme: {theme}");
                }
                Some(other) if !is_quit(other) => println!("Unknown choice: {other}"),
                _ => break Next::Quit,
            }
        };
    }

    let history = session.history();
    print_summary(&history, theme);

    if let Some(path) = args.save_history {
        let json = serde_json::to_string_pretty(&history)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write history: {}", path.display()))?;
        eprintln!("History written to {}", path.display());
    }

    Ok(())
}

/// Prompt for guesses until one is scored. Returns `false` if the player quit.
async fn play_round(
    session: &GameSession,
    lines: &mut Input,
    config: &PaperguessConfig,
) -> Result<bool> {
    let mode = config.citation_input;
    let year_label = format!("Year ({}-{}): ", config.year_min, config.year_max);
    let cite_label = match mode {
        InputMode::Exact => "Citations: ".to_string(),
        InputMode::Slider => format!("Citation slider (0-{SLIDER_MAX}): "),
    };

    loop {
        let Some(year) = prompt(lines, &year_label).await? else {
            return Ok(false);
        };
        if is_quit(&year) {
            return Ok(false);
        }
        let Ok(year) = year.parse::<i32>() else {
            println!("Please enter a year.");
            continue;
        };

        let Some(cites) = prompt(lines, &cite_label).await? else {
            return Ok(false);
        };
        if is_quit(&cites) {
            return Ok(false);
        }
        let Ok(value) = cites.parse::<i64>() else {
            println!("Please enter a whole number.");
            continue;
        };

        let citations = match mode {
            InputMode::Exact => CitationInput::Exact(value),
            InputMode::Slider => {
                if let Ok(pos) = u32::try_from(value) {
                    if pos <= SLIDER_MAX {
                        println!("  slider {pos} = {} citations", citations_from_slider(pos));
                    }
                }
                CitationInput::Slider(value)
            }
        };

        match session.submit(GuessInput { year, citations }).await {
            Ok(outcome) => {
                print_outcome(&outcome, config.zero_pad_links);
                return Ok(true);
            }
            Err(e) if e.round_still_open() => println!("{e}"),
            Err(e) => {
                println!("{e}");
                return Ok(true);
            }
        }
    }
}

fn print_outcome(outcome: &RoundOutcome, zero_pad: bool) {
    let round = &outcome.round;
    println!(
        "  Year {}: {} / {MAX_AXIS_SCORE}  {}",
        outcome.guess.year, outcome.score.year_score, outcome.year_feedback.message
    );
    println!(
        "  Citations {}: {} / {MAX_AXIS_SCORE}  {}",
        outcome.guess.citations, outcome.score.citation_score, outcome.citation_feedback.message
    );
    match (round.title.is_empty(), round.actual) {
        (false, Some(actual)) => println!(
            "  Paper: {} ({}, {} citations)",
            round.title, actual.year, actual.citations
        ),
        (false, None) => println!("  Paper: {}", round.title),
        (true, _) => {}
    }
    if let Some(url) = round.eprint_url(zero_pad) {
        println!("  Link: {url}");
    }
    println!(
        "  Round score: {}  |  Total: {} over {} round(s), avg {:.0}",
        outcome.score.total_score,
        outcome.tally.cumulative_score,
        outcome.tally.rounds_played,
        outcome.tally.average()
    );
}

fn print_summary(history: &SessionHistory, theme: Theme) {
    if history.rounds.is_empty() {
        println!("\nNo rounds scored.");
        return;
    }

    let mut table = themed_table(theme);
    table.set_header(vec!["Round", "Paper", "Year", "Citations", "Score"]);
    for r in &history.rounds {
        table.add_row(vec![
            Cell::new(r.round_number),
            Cell::new(if r.title.is_empty() { "-" } else { r.title.as_str() }),
            Cell::new(format!("{} / {}", r.year_guess, r.year_actual)),
            Cell::new(format!("{} / {}", r.citation_guess, r.citation_actual)),
            Cell::new(r.score.total_score),
        ]);
    }

    println!("\n{table}");
    println!(
        "Final score: {} over {} round(s)",
        history.tally.cumulative_score, history.tally.rounds_played
    );
}
