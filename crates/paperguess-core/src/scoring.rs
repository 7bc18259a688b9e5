//! Round scoring and the nonlinear citation slider.
//!
//! Both axis scores are pure functions of `(guess, actual)`, in `[0, 5000]`,
//! reach 5000 only on an exact guess, and never increase as the error grows.

use crate::model::{ActualValues, Guess, ScoreResult};

/// Maximum points per axis.
pub const MAX_AXIS_SCORE: u32 = 5000;

/// Largest citation count the slider can express.
pub const CITATION_CAP: u32 = 10_000;

/// Upper end of the slider range. The transform saturates at position 139.
pub const SLIDER_MAX: u32 = 140;

/// Year penalties for misses of 0 through 5 years.
const YEAR_PENALTIES: [u32; 6] = [0, 100, 500, 1000, 2000, 4000];

/// Points lost per year beyond the penalty table.
const YEAR_PENALTY_TAIL: u32 = 200;

/// Points lost per doubling of `(citations + 20)` between guess and actual.
const CITATION_PENALTY: f64 = 1500.0;

/// Offset that keeps the log error finite and soft for small counts.
const CITATION_LOG_OFFSET: f64 = 20.0;

/// Map a slider position to a citation count.
///
/// `citations(s) = min(round((e^(s/20) - 1) * 10), 10000)`
pub fn citations_from_slider(position: u32) -> u32 {
    let raw = ((f64::from(position) / 20.0).exp() - 1.0) * 10.0;
    raw.round().min(f64::from(CITATION_CAP)) as u32
}

/// Approximate inverse of [`citations_from_slider`], used to place the
/// slider for a known citation count.
///
/// `position(c) = round(20 * ln(c / 10 + 1))`, clamped to the slider range.
pub fn slider_from_citations(citations: u32) -> u32 {
    let pos = (20.0 * (f64::from(citations) / 10.0 + 1.0).ln()).round();
    (pos as u32).min(SLIDER_MAX)
}

/// Score a year guess.
///
/// Misses up to five years follow a fixed penalty table; beyond that the
/// score keeps falling by 200 per year until it reaches 0 at ten years.
pub fn year_score(guess: i32, actual: i32) -> u32 {
    let dist = guess.abs_diff(actual);
    match YEAR_PENALTIES.get(dist as usize) {
        Some(penalty) => MAX_AXIS_SCORE - penalty,
        None => {
            let floor = MAX_AXIS_SCORE - YEAR_PENALTIES[YEAR_PENALTIES.len() - 1];
            let over = dist - (YEAR_PENALTIES.len() as u32 - 1);
            floor.saturating_sub(over.saturating_mul(YEAR_PENALTY_TAIL))
        }
    }
}

/// Score a citation guess on a log scale.
///
/// `error = |log2(guess + 20) - log2(actual + 20)|`,
/// `score = floor(5000 - 1500 * error)` clamped to `[0, 5000]`.
pub fn citation_score(guess: u32, actual: u32) -> u32 {
    if guess == actual {
        return MAX_AXIS_SCORE;
    }
    let error = ((f64::from(guess) + CITATION_LOG_OFFSET).log2()
        - (f64::from(actual) + CITATION_LOG_OFFSET).log2())
    .abs();
    let score = (f64::from(MAX_AXIS_SCORE) - CITATION_PENALTY * error).floor();
    // A nonzero error must never round back up to the maximum.
    score.clamp(0.0, f64::from(MAX_AXIS_SCORE - 1)) as u32
}

/// Score a validated guess against the round's actual values.
pub fn score_round(guess: &Guess, actual: &ActualValues) -> ScoreResult {
    ScoreResult::new(
        year_score(guess.year, actual.year),
        citation_score(guess.citations, actual.citations),
    )
}
