//! Qualitative feedback for a scored guess.
//!
//! Errors are sorted into bands; each band has its own message, and
//! every miss says which way the guess was off.

use serde::{Deserialize, Serialize};

/// Which side of the actual value a guess landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Over,
    Exact,
    Under,
}

impl Direction {
    fn of(diff: i64) -> Self {
        match diff {
            d if d > 0 => Direction::Over,
            0 => Direction::Exact,
            _ => Direction::Under,
        }
    }
}

/// Year error bands, by absolute difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearBand {
    Perfect,
    OffByOne,
    VeryClose,
    Close,
    Fair,
    WayOff,
}

/// Citation error bands.
///
/// Papers with fewer than 50 citations are judged on absolute difference,
/// the rest on percentage difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationBand {
    Exact,
    /// `|d| <= 5`
    AbsoluteNear,
    /// `|d| <= 20`
    AbsoluteClose,
    /// `|d| > 20`
    AbsoluteFar,
    /// `<= 10%`
    PercentSlight,
    /// `<= 25%`
    PercentModerate,
    /// `<= 50%`
    PercentLarge,
    /// `> 50%`
    PercentWayOff,
}

/// A feedback message together with the band that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback<B> {
    pub band: B,
    pub direction: Direction,
    /// Signed `guess - actual`.
    pub difference: i64,
    pub message: String,
}

/// Citation count at which feedback switches from absolute to percentage bands.
pub const PERCENT_BANDS_FROM: u32 = 50;

/// Feedback for a year guess.
pub fn year_feedback(guess: i32, actual: i32) -> Feedback<YearBand> {
    let difference = i64::from(guess) - i64::from(actual);
    let direction = Direction::of(difference);
    let dist = difference.unsigned_abs();

    let band = match dist {
        0 => YearBand::Perfect,
        1 => YearBand::OffByOne,
        2..=3 => YearBand::VeryClose,
        4..=5 => YearBand::Close,
        6..=10 => YearBand::Fair,
        _ => YearBand::WayOff,
    };

    let when = if direction == Direction::Over {
        "too recent"
    } else {
        "too old"
    };
    let message = match band {
        YearBand::Perfect => format!("Perfect! It was published in {actual}."),
        YearBand::OffByOne => format!("So close! Just 1 year {when}."),
        YearBand::VeryClose => format!("Very close! {dist} years {when}."),
        YearBand::Close => format!("Good guess, {dist} years {when}."),
        YearBand::Fair => format!("Not bad, but {dist} years {when}."),
        YearBand::WayOff => format!("Way off: {dist} years {when}. It was {actual}."),
    };

    Feedback {
        band,
        direction,
        difference,
        message,
    }
}

/// Percentage difference of a citation guess; `actual == 0` counts as 100%.
pub fn citation_percent_diff(guess: u32, actual: u32) -> f64 {
    if actual == 0 {
        return 100.0;
    }
    f64::from(guess.abs_diff(actual)) * 100.0 / f64::from(actual)
}

/// Feedback for a citation guess.
pub fn citation_feedback(guess: u32, actual: u32) -> Feedback<CitationBand> {
    let difference = i64::from(guess) - i64::from(actual);
    let direction = Direction::of(difference);
    let dist = difference.unsigned_abs();
    let percent = citation_percent_diff(guess, actual);

    let verb = if direction == Direction::Over {
        "overestimated"
    } else {
        "underestimated"
    };

    let band = if dist == 0 {
        CitationBand::Exact
    } else if actual < PERCENT_BANDS_FROM {
        match dist {
            0..=5 => CitationBand::AbsoluteNear,
            6..=20 => CitationBand::AbsoluteClose,
            _ => CitationBand::AbsoluteFar,
        }
    } else if percent <= 10.0 {
        CitationBand::PercentSlight
    } else if percent <= 25.0 {
        CitationBand::PercentModerate
    } else if percent <= 50.0 {
        CitationBand::PercentLarge
    } else {
        CitationBand::PercentWayOff
    };

    let message = match band {
        CitationBand::Exact => format!("Exact! It has exactly {actual} citations."),
        CitationBand::AbsoluteNear => format!("Very close! You {verb} by {dist}."),
        CitationBand::AbsoluteClose => format!("Close. You {verb} by {dist}."),
        CitationBand::AbsoluteFar => {
            format!("You {verb} by {dist}. It has {actual} citations.")
        }
        CitationBand::PercentSlight => {
            format!("Excellent! You slightly {verb} ({percent:.0}% off).")
        }
        CitationBand::PercentModerate => format!("Good guess, you {verb} by {percent:.0}%."),
        CitationBand::PercentLarge => {
            format!("You {verb} by {percent:.0}%. It has {actual} citations.")
        }
        CitationBand::PercentWayOff => {
            format!("Way off: you {verb} by {percent:.0}%. It has {actual} citations.")
        }
    };

    Feedback {
        band,
        direction,
        difference,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_year_is_perfect_for_every_year() {
        for year in 2000..=2025 {
            let fb = year_feedback(year, year);
            assert_eq!(fb.band, YearBand::Perfect);
            assert_eq!(fb.direction, Direction::Exact);
            assert!(fb.message.starts_with("Perfect!"));
        }
    }

    #[test]
    fn off_by_one_differs_only_in_direction() {
        let over = year_feedback(2016, 2015);
        let under = year_feedback(2014, 2015);
        assert_eq!(over.band, under.band);
        assert_eq!(over.direction, Direction::Over);
        assert_eq!(under.direction, Direction::Under);
        assert_eq!(over.message.replace("too recent", "too old"), under.message);
    }

    #[test]
    fn year_band_edges() {
        let bands: Vec<YearBand> = [0, 1, 2, 3, 4, 5, 6, 10, 11, 25]
            .iter()
            .map(|d| year_feedback(2000 + d, 2000).band)
            .collect();
        assert_eq!(
            bands,
            vec![
                YearBand::Perfect,
                YearBand::OffByOne,
                YearBand::VeryClose,
                YearBand::VeryClose,
                YearBand::Close,
                YearBand::Close,
                YearBand::Fair,
                YearBand::Fair,
                YearBand::WayOff,
                YearBand::WayOff,
            ]
        );
        assert!(year_feedback(2005, 2020).message.contains("15 years too old"));
    }

    #[test]
    fn citation_exact_match() {
        let fb = citation_feedback(0, 0);
        assert_eq!(fb.band, CitationBand::Exact);
        let fb = citation_feedback(812, 812);
        assert_eq!(fb.band, CitationBand::Exact);
        assert!(fb.message.contains("exactly 812"));
    }

    #[test]
    fn small_counts_use_absolute_bands() {
        assert_eq!(citation_feedback(15, 10).band, CitationBand::AbsoluteNear);
        assert_eq!(citation_feedback(35, 10).band, CitationBand::AbsoluteFar);
        assert_eq!(citation_feedback(0, 20).band, CitationBand::AbsoluteClose);

        let fb = citation_feedback(40, 10);
        assert_eq!(fb.band, CitationBand::AbsoluteFar);
        assert!(fb.message.contains("overestimated by 30"), "{}", fb.message);
        assert!(!fb.message.contains('%'));
    }

    #[test]
    fn large_counts_use_percentage_bands() {
        // the same absolute misses land in different bands above 50 citations
        assert_eq!(citation_feedback(1005, 1000).band, CitationBand::PercentSlight);
        assert_eq!(citation_feedback(1025, 1000).band, CitationBand::PercentSlight);
        assert_eq!(citation_feedback(15, 10).band, CitationBand::AbsoluteNear);
        assert_eq!(citation_feedback(35, 10).band, CitationBand::AbsoluteFar);

        assert_eq!(citation_feedback(250, 200).band, CitationBand::PercentModerate);
        assert_eq!(citation_feedback(100, 200).band, CitationBand::PercentLarge);
        assert_eq!(citation_feedback(500, 200).band, CitationBand::PercentWayOff);
        assert_eq!(citation_feedback(50, 49).band, CitationBand::AbsoluteNear);
        assert_eq!(citation_feedback(55, 50).band, CitationBand::PercentSlight);
    }

    #[test]
    fn slightly_overestimated_at_ten_percent() {
        let fb = citation_feedback(220, 200);
        assert_eq!(fb.band, CitationBand::PercentSlight);
        assert_eq!(fb.direction, Direction::Over);
        assert!(fb.message.contains("slightly overestimated"), "{}", fb.message);

        let fb = citation_feedback(180, 200);
        assert!(fb.message.contains("slightly underestimated"), "{}", fb.message);
    }

    #[test]
    fn percent_diff_zero_actual() {
        assert_eq!(citation_percent_diff(7, 0), 100.0);
        assert_eq!(citation_percent_diff(150, 100), 50.0);
    }
}
