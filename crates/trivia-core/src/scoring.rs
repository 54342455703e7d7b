//! Time-decay scoring.
//!
//! Points are maximal for fast correct answers and decay linearly to zero at
//! the question deadline:
//!
//! - incorrect → 0
//! - `elapsed ≤ fast_threshold` → `max_points`
//! - `fast_threshold < elapsed < duration` →
//!   `⌊max_points × (duration − elapsed) / (duration − fast_threshold)⌋`
//! - `elapsed ≥ duration` → 0 (the deadline normally closes the question
//!   before this can happen)

use crate::constants::{FAST_ANSWER_SECONDS, MAX_POINTS, QUESTION_SECONDS};

/// Points awarded for an answer.
///
/// Pure function of correctness and elapsed time. `duration` must be greater
/// than `fast_threshold`; the defaults in [`crate::constants`] satisfy this.
pub fn score(
    correct: bool,
    elapsed_secs: f64,
    duration_secs: f64,
    fast_threshold_secs: f64,
    max_points: u32,
) -> u32 {
    if !correct || elapsed_secs >= duration_secs {
        return 0;
    }
    if elapsed_secs <= fast_threshold_secs {
        return max_points;
    }
    let fraction = (duration_secs - elapsed_secs) / (duration_secs - fast_threshold_secs);
    let points = (f64::from(max_points) * fraction).floor();
    if points.is_sign_negative() { 0 } else { points as u32 }
}

/// [`score`] with the default 60 s question, 10 s fast window, 1000 points.
pub fn score_with_defaults(correct: bool, elapsed_secs: f64) -> u32 {
    score(
        correct,
        elapsed_secs,
        QUESTION_SECONDS as f64,
        FAST_ANSWER_SECONDS as f64,
        MAX_POINTS,
    )
}
