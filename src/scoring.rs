use crate::model::types::{POINTS_PER_CORRECT_ANSWER, ScoreBreakdown};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How remaining time feeds into the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringPolicy {
    /// `time_remaining + correct * P - incorrect * P`. Can go negative.
    #[default]
    Flat,
    /// `max(0, round(correct * P * (1 + time_remaining / initial)) - incorrect * P)`
    TimeMultiplied,
}

impl FromStr for ScoringPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(ScoringPolicy::Flat),
            "time-multiplied" | "time_multiplied" | "multiplied" => {
                Ok(ScoringPolicy::TimeMultiplied)
            }
            other => Err(format!(
                "Unknown scoring policy '{other}', expected 'flat' or 'time-multiplied'"
            )),
        }
    }
}

impl fmt::Display for ScoringPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringPolicy::Flat => write!(f, "flat"),
            ScoringPolicy::TimeMultiplied => write!(f, "time-multiplied"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub correct: usize,
    pub incorrect: usize,
}

impl ScoringPolicy {
    pub fn score(&self, tally: Tally, time_remaining: u32, initial_seconds: u32) -> i64 {
        let breakdown = self.breakdown(tally, time_remaining, initial_seconds);
        let raw = breakdown.correct_bonus + breakdown.time_bonus - breakdown.wrong_answer_penalty;
        match self {
            ScoringPolicy::Flat => raw,
            ScoringPolicy::TimeMultiplied => raw.max(0),
        }
    }

    /// Split the score into the parts shown on the results screen. For the
    /// time-multiplied policy the time bonus is whatever the multiplier added
    /// on top of the plain correct-answer points.
    pub fn breakdown(&self, tally: Tally, time_remaining: u32, initial_seconds: u32) -> ScoreBreakdown {
        let correct_bonus = tally.correct as i64 * POINTS_PER_CORRECT_ANSWER;
        let wrong_answer_penalty = tally.incorrect as i64 * POINTS_PER_CORRECT_ANSWER;
        let time_bonus = match self {
            ScoringPolicy::Flat => i64::from(time_remaining),
            ScoringPolicy::TimeMultiplied => {
                let fraction = if initial_seconds == 0 {
                    0.0
                } else {
                    (f64::from(time_remaining) / f64::from(initial_seconds)).clamp(0.0, 1.0)
                };
                let multiplied = (correct_bonus as f64 * (1.0 + fraction)).round() as i64;
                multiplied - correct_bonus
            }
        };
        ScoreBreakdown {
            correct_bonus,
            wrong_answer_penalty,
            time_bonus,
        }
    }
}
