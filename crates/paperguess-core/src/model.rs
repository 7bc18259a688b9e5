//! Core data model types for paperguess.
//!
//! A `Round` is the paper currently on screen, a `Guess` is what the
//! player submits against it, and `ScoreResult`/`SessionTally` record how
//! well they did.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GuessError;
use crate::scoring::{citations_from_slider, SLIDER_MAX};

const EPRINT_BASE_URL: &str = "https://eprint.iacr.org";

/// One paper to guess. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Archive identifier within the publication year, if the server sent one.
    #[serde(default)]
    pub id: Option<String>,
    /// Paper title. Hidden from the player until the round is scored.
    #[serde(default)]
    pub title: String,
    /// Actual values, or `None` while the server keeps them to itself.
    #[serde(default)]
    pub actual: Option<ActualValues>,
    /// Locator of the scanned title page (URL or `data:` URI).
    pub image: String,
}

/// A paper's true publication year and citation count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualValues {
    pub year: i32,
    pub citations: u32,
}

impl Round {
    /// Link to the paper in the source archive.
    ///
    /// Numeric identifiers are zero-padded to four digits when `zero_pad`
    /// is set, matching the archive's canonical URLs.
    pub fn eprint_url(&self, zero_pad: bool) -> Option<String> {
        let id = self.id.as_deref()?.trim();
        if id.is_empty() {
            return None;
        }
        let id = match id.parse::<u32>() {
            Ok(n) if zero_pad => format!("{n:04}"),
            _ => id.to_string(),
        };
        let year = self.actual?.year;
        Some(format!("{EPRINT_BASE_URL}/{year}/{id}"))
    }

    /// This round with the actual values (and title, if still unknown)
    /// filled in from a score response.
    pub fn revealed(mut self, actual: ActualValues, title: Option<String>) -> Self {
        self.actual = Some(actual);
        if self.title.is_empty() {
            self.title = title.unwrap_or_default();
        }
        self
    }
}

/// How the player expressed their citation guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "value")]
pub enum CitationInput {
    /// A raw citation count typed by the player.
    Exact(i64),
    /// A position on the nonlinear citation slider.
    Slider(i64),
}

/// Raw, unvalidated guess as entered by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessInput {
    pub year: i32,
    pub citations: CitationInput,
}

/// A validated guess, ready to be scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guess {
    pub year: i32,
    pub citations: u32,
}

/// Bounds applied to guesses before they are scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessRules {
    pub year_min: i32,
    pub year_max: i32,
    pub slider_max: u32,
}

impl Default for GuessRules {
    fn default() -> Self {
        Self {
            year_min: 2000,
            year_max: 2025,
            slider_max: SLIDER_MAX,
        }
    }
}

impl GuessRules {
    /// Validate a raw guess and resolve slider positions into citation counts.
    pub fn resolve(&self, input: GuessInput) -> Result<Guess, GuessError> {
        if input.year < self.year_min || input.year > self.year_max {
            return Err(GuessError::YearOutOfRange {
                year: input.year,
                min: self.year_min,
                max: self.year_max,
            });
        }

        let citations = match input.citations {
            CitationInput::Exact(n) if n < 0 => return Err(GuessError::NegativeCitations(n)),
            CitationInput::Exact(n) => {
                u32::try_from(n).map_err(|_| GuessError::CitationsTooLarge(n))?
            }
            CitationInput::Slider(pos) => {
                if pos < 0 || pos > i64::from(self.slider_max) {
                    return Err(GuessError::SliderOutOfRange {
                        position: pos,
                        max: self.slider_max,
                    });
                }
                citations_from_slider(pos as u32)
            }
        };

        Ok(Guess {
            year: input.year,
            citations,
        })
    }
}

/// Points awarded for one round. Each axis is in `[0, 5000]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreResult {
    pub year_score: u32,
    pub citation_score: u32,
    pub total_score: u32,
}

impl ScoreResult {
    pub fn new(year_score: u32, citation_score: u32) -> Self {
        Self {
            year_score,
            citation_score,
            total_score: year_score + citation_score,
        }
    }
}

/// Running totals for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTally {
    /// 1-based number of the round being played.
    pub round_number: u32,
    /// Rounds that have been scored.
    pub rounds_played: u32,
    /// Sum of all round totals.
    pub cumulative_score: u64,
}

impl Default for SessionTally {
    fn default() -> Self {
        Self {
            round_number: 1,
            rounds_played: 0,
            cumulative_score: 0,
        }
    }
}

impl SessionTally {
    /// Average total per scored round, or 0 before the first round.
    pub fn average(&self) -> f64 {
        if self.rounds_played == 0 {
            0.0
        } else {
            self.cumulative_score as f64 / self.rounds_played as f64
        }
    }
}

/// Server-side cache statistics, shown as a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub cached_papers: u64,
    #[serde(default)]
    pub is_warming: bool,
}

/// Where round scores are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMode {
    /// Scored in-process with `scoring::score_round`.
    #[default]
    Local,
    /// Scored by the server's submit endpoint.
    Remote,
}

/// How citation guesses are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    #[default]
    Exact,
    Slider,
}

/// Display theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(id: Option<&str>) -> Round {
        Round {
            id: id.map(str::to_string),
            title: "On Something".into(),
            actual: Some(ActualValues {
                year: 2015,
                citations: 200,
            }),
            image: "data:image/png;base64,AAAA".into(),
        }
    }

    #[test]
    fn eprint_url_pads_numeric_ids() {
        let r = round(Some("42"));
        assert_eq!(
            r.eprint_url(true).as_deref(),
            Some("https://eprint.iacr.org/2015/0042")
        );
        assert_eq!(
            r.eprint_url(false).as_deref(),
            Some("https://eprint.iacr.org/2015/42")
        );
        assert_eq!(
            round(Some("abc")).eprint_url(true).as_deref(),
            Some("https://eprint.iacr.org/2015/abc")
        );
        assert!(round(None).eprint_url(true).is_none());
        assert!(round(Some("  ")).eprint_url(true).is_none());
    }

    #[test]
    fn hidden_round_links_only_once_revealed() {
        let hidden = Round {
            actual: None,
            title: String::new(),
            ..round(Some("42"))
        };
        assert!(hidden.eprint_url(true).is_none());

        let shown = hidden.revealed(
            ActualValues {
                year: 2019,
                citations: 7,
            },
            Some("Revealed Title".into()),
        );
        assert_eq!(shown.title, "Revealed Title");
        assert_eq!(
            shown.eprint_url(true).as_deref(),
            Some("https://eprint.iacr.org/2019/0042")
        );
    }

    #[test]
    fn revealing_keeps_a_known_title() {
        let shown = round(Some("1")).revealed(
            ActualValues {
                year: 2015,
                citations: 200,
            },
            Some("Other".into()),
        );
        assert_eq!(shown.title, "On Something");
    }

    #[test]
    fn resolve_rejects_out_of_range_years() {
        let rules = GuessRules::default();
        let err = rules
            .resolve(GuessInput {
                year: 1999,
                citations: CitationInput::Exact(5),
            })
            .unwrap_err();
        assert!(matches!(err, GuessError::YearOutOfRange { year: 1999, .. }));
        assert!(rules
            .resolve(GuessInput {
                year: 2026,
                citations: CitationInput::Exact(5),
            })
            .is_err());
        assert!(rules
            .resolve(GuessInput {
                year: 2025,
                citations: CitationInput::Exact(5),
            })
            .is_ok());
    }

    #[test]
    fn resolve_rejects_negative_citations_and_bad_slider() {
        let rules = GuessRules::default();
        assert_eq!(
            rules.resolve(GuessInput {
                year: 2010,
                citations: CitationInput::Exact(-10),
            }),
            Err(GuessError::NegativeCitations(-10))
        );
        assert!(matches!(
            rules.resolve(GuessInput {
                year: 2010,
                citations: CitationInput::Slider(SLIDER_MAX as i64 + 1),
            }),
            Err(GuessError::SliderOutOfRange { .. })
        ));
    }

    #[test]
    fn resolve_rejects_citations_beyond_u32() {
        let rules = GuessRules::default();
        let huge = i64::from(u32::MAX) + 1;
        assert_eq!(
            rules.resolve(GuessInput {
                year: 2010,
                citations: CitationInput::Exact(huge),
            }),
            Err(GuessError::CitationsTooLarge(huge))
        );
        assert_eq!(
            rules
                .resolve(GuessInput {
                    year: 2010,
                    citations: CitationInput::Exact(i64::from(u32::MAX)),
                })
                .map(|g| g.citations),
            Ok(u32::MAX)
        );
    }

    #[test]
    fn resolve_converts_slider_positions() {
        let rules = GuessRules::default();
        let guess = rules
            .resolve(GuessInput {
                year: 2010,
                citations: CitationInput::Slider(0),
            })
            .unwrap();
        assert_eq!(guess.citations, 0);
        let guess = rules
            .resolve(GuessInput {
                year: 2010,
                citations: CitationInput::Slider(SLIDER_MAX as i64),
            })
            .unwrap();
        assert_eq!(guess.citations, 10_000);
    }

    #[test]
    fn theme_display_parse_and_toggle() {
        assert_eq!(Theme::Dark.to_string(), "dark");
        assert_eq!("Light".parse::<Theme>().unwrap(), Theme::Light);
        assert!("sepia".parse::<Theme>().is_err());
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().toggled(), Theme::Dark);
    }

    #[test]
    fn tally_starts_at_round_one() {
        let tally = SessionTally::default();
        assert_eq!(tally.round_number, 1);
        assert_eq!(tally.rounds_played, 0);
        assert_eq!(tally.average(), 0.0);
    }
}
