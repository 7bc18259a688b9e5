//! The `paperguess score` command.

use anyhow::Result;
use serde_json::json;

use paperguess_core::feedback::{citation_feedback, year_feedback};
use paperguess_core::model::{ActualValues, CitationInput, GuessInput, GuessRules};
use paperguess_core::scoring::{score_round, MAX_AXIS_SCORE};

pub fn execute(
    year_guess: i32,
    year: i32,
    cite_guess: i64,
    cites: u32,
    slider: bool,
    format: String,
) -> Result<()> {
    let citations = if slider {
        CitationInput::Slider(cite_guess)
    } else {
        CitationInput::Exact(cite_guess)
    };

    // Offline scoring has no configured window, so accept any year.
    let rules = GuessRules {
        year_min: i32::MIN,
        year_max: i32::MAX,
        ..GuessRules::default()
    };
    let guess = rules.resolve(GuessInput {
        year: year_guess,
        citations,
    })?;

    let actual = ActualValues {
        year,
        citations: cites,
    };
    let score = score_round(&guess, &actual);
    let year_fb = year_feedback(guess.year, actual.year);
    let citation_fb = citation_feedback(guess.citations, actual.citations);

    match format.as_str() {
        "json" => {
            let out = json!({
                "guess": guess,
                "score": score,
                "year_feedback": year_fb,
                "citation_feedback": citation_fb,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        _ => {
            if slider {
                println!("Slider {cite_guess} is {} citations", guess.citations);
            }
            println!(
                "Year:      {:>5} / {MAX_AXIS_SCORE}  {}",
                score.year_score, year_fb.message
            );
            println!(
                "Citations: {:>5} / {MAX_AXIS_SCORE}  {}",
                score.citation_score, citation_fb.message
            );
            println!("Total:     {:>5} / {}", score.total_score, 2 * MAX_AXIS_SCORE);
        }
    }

    Ok(())
}
