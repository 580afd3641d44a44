//! Scoring of captured rhythm against a target pattern.
//!
//! Evaluation is a pure function: count agreement, short/long class
//! agreement, then mean absolute error over (optionally L1-normalized)
//! durations against a configured tolerance.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::config::RhythmConfig;

/// Penalty per element of length difference, applied after truncating
/// to the common prefix.
pub const LENGTH_PENALTY: f32 = 0.06;

/// Extra penalty when the lenient count policy let an off-by-one
/// capture through.
pub const OFF_BY_ONE_PENALTY: f32 = 0.12;

// Divisor floor so normalization never divides by zero.
const NORM_EPSILON: f32 = 1e-6;

// f32::abs lives in std; libm keeps the matcher usable under no_std.
fn absf(value: f32) -> f32 {
    libm::fabsf(value)
}

/// Classify a duration as short (`'S'`) or long (`'L'`) by nearest
/// reference constant. Ties go to short.
pub fn classify(value: f32, dot_seconds: f32, dash_seconds: f32) -> char {
    if absf(value - dot_seconds) <= absf(value - dash_seconds) {
        'S'
    } else {
        'L'
    }
}

/// Why a segment failed evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailReason {
    /// Nothing was captured before the window ended.
    EmptyCapture,
    /// Interval count differed beyond the configured policy.
    CountMismatch,
    /// Short/long classification strings differed.
    ClassMismatch,
    /// Mean absolute error exceeded the tolerance.
    AboveTolerance,
}

/// Immutable outcome of evaluating one segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the segment passed.
    pub pass: bool,
    /// Final mean absolute error, when scoring was reached.
    pub mae: Option<f32>,
    /// Failure cause, `None` on pass.
    pub reason: Option<FailReason>,
}

impl Verdict {
    fn fail(reason: FailReason) -> Self {
        Self {
            pass: false,
            mae: None,
            reason: Some(reason),
        }
    }
}

/// Pure evaluator for captured intervals against a target pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matcher {
    /// Reference short duration.
    pub dot_seconds: f32,
    /// Reference long duration.
    pub dash_seconds: f32,
    /// Pass threshold on the final MAE.
    pub tolerance: f32,
    /// Fail on any count difference; lenient mode tolerates one.
    pub strict_count_match: bool,
    /// Add [`OFF_BY_ONE_PENALTY`] for a tolerated off-by-one count.
    pub penalize_off_by_one: bool,
    /// Require class-string agreement before magnitude scoring.
    pub require_class_match: bool,
    /// L1-normalize both sequences so shape is compared, not tempo.
    pub length_normalize: bool,
    /// Hold mode compares the full target; tap mode drops its last beat.
    pub hold_mode: bool,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            dot_seconds: 0.30,
            dash_seconds: 0.80,
            tolerance: 0.18,
            strict_count_match: true,
            penalize_off_by_one: true,
            require_class_match: true,
            length_normalize: true,
            hold_mode: true,
        }
    }
}

impl Matcher {
    /// Matcher matching a session configuration.
    pub fn from_config(config: &RhythmConfig) -> Self {
        Self {
            dot_seconds: config.dot_seconds,
            dash_seconds: config.dash_seconds,
            tolerance: config.tolerance,
            strict_count_match: config.strict_count_match,
            penalize_off_by_one: config.penalize_off_by_one,
            require_class_match: config.require_class_match,
            length_normalize: config.length_normalize,
            hold_mode: config.hold_mode,
        }
    }

    /// Intervals expected from a capture of `target_len` beats.
    pub fn required_intervals(&self, target_len: usize) -> usize {
        if self.hold_mode {
            target_len
        } else {
            target_len.saturating_sub(1)
        }
    }

    /// Score `captured` against `target` and render a verdict.
    pub fn evaluate(&self, target: &[f32], captured: &[f32]) -> Verdict {
        if captured.is_empty() {
            return Verdict::fail(FailReason::EmptyCapture);
        }

        let expected = self.required_intervals(target.len());
        let diff = expected.abs_diff(captured.len());
        if self.strict_count_match {
            if diff != 0 {
                return Verdict::fail(FailReason::CountMismatch);
            }
        } else if diff > 1 {
            return Verdict::fail(FailReason::CountMismatch);
        }

        if self.require_class_match {
            let compared = if self.hold_mode {
                target
            } else {
                &target[..target.len().saturating_sub(1)]
            };
            if !self.classes_match(compared, captured) {
                return Verdict::fail(FailReason::ClassMismatch);
            }
        }

        let mut mae = if self.length_normalize {
            mean_abs_error(&normalized(target), &normalized(captured))
        } else {
            mean_abs_error(target, captured)
        };
        if !self.strict_count_match && diff == 1 && self.penalize_off_by_one {
            mae += OFF_BY_ONE_PENALTY;
        }

        let pass = mae <= self.tolerance;
        Verdict {
            pass,
            mae: Some(mae),
            reason: if pass {
                None
            } else {
                Some(FailReason::AboveTolerance)
            },
        }
    }

    fn classes_match(&self, target: &[f32], captured: &[f32]) -> bool {
        target.len() == captured.len()
            && target.iter().zip(captured).all(|(&t, &c)| {
                classify(t, self.dot_seconds, self.dash_seconds)
                    == classify(c, self.dot_seconds, self.dash_seconds)
            })
    }
}

/// Each element divided by the sequence sum, floored at a small epsilon.
fn normalized(sequence: &[f32]) -> Vec<f32> {
    let sum = sequence.iter().sum::<f32>().max(NORM_EPSILON);
    sequence.iter().map(|&v| v / sum).collect()
}

/// Mean absolute error over the common prefix plus a per-element
/// penalty for the length difference. Empty overlap scores 1.0.
fn mean_abs_error(x: &[f32], y: &[f32]) -> f32 {
    let n = x.len().min(y.len());
    if n == 0 {
        return 1.0;
    }
    let mut mae = 0.0;
    for i in 0..n {
        mae += absf(x[i] - y[i]);
    }
    mae /= n as f32;
    mae + LENGTH_PENALTY * x.len().abs_diff(y.len()) as f32
}
