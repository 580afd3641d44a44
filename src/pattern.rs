//! Deterministic synthesis of rhythmic beat patterns.
//!
//! A 31-bit window seed is mixed with the attempt counter and segment
//! index, then expanded through a seeded PRNG into beat durations drawn
//! from a short/long palette with bounded jitter. Same inputs, same
//! pattern, bit for bit.

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::RhythmConfig;

/// Multiplier mixing the attempt counter into the base seed, so every
/// new attempt re-randomizes even within one time window.
pub const ATTEMPT_MIX: u32 = 92_837_111;

// Large odd multipliers for the per-(attempt, segment) nonce.
const SEGMENT_NONCE_A: u32 = 73_856_093;
const SEGMENT_NONCE_B: u32 = 19_349_663;

/// Ordered beat durations for one segment of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// Beat durations in seconds.
    pub beats: Vec<f32>,
}

impl Pattern {
    /// Number of beats.
    pub fn len(&self) -> usize {
        self.beats.len()
    }

    /// True if the pattern has no beats.
    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    /// Turn one textual code group (e.g. `"..-"`) into durations, dot
    /// characters as `dot_seconds` and everything else as
    /// `dash_seconds`. Used to render the grouped code haptically.
    pub fn from_code_group(group: &str, dot_seconds: f32, dash_seconds: f32) -> Self {
        let beats = group
            .chars()
            .map(|c| if c == '.' { dot_seconds } else { dash_seconds })
            .collect();
        Self { beats }
    }
}

/// Expands a seed into per-segment patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Synthesizer {
    /// Beats per pattern.
    pub beat_count: usize,
    /// Canonical durations to draw from.
    pub palette: Vec<f32>,
    /// Uniform jitter bound around each palette duration.
    pub jitter: f32,
    /// Floor clamp applied after jitter.
    pub floor: f32,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self {
            beat_count: 4,
            palette: vec![0.20, 0.60],
            jitter: 0.02,
            floor: 0.12,
        }
    }
}

impl Synthesizer {
    /// Synthesizer matching a session configuration.
    pub fn from_config(config: &RhythmConfig) -> Self {
        Self {
            beat_count: config.beat_count,
            palette: config.palette.clone(),
            jitter: config.pattern_jitter,
            floor: config.beat_floor,
        }
    }

    /// Deterministically expand `(seed, attempt, segment)` into a
    /// pattern of `beat_count` durations.
    pub fn synthesize(&self, seed: u32, attempt: u32, segment: u32) -> Pattern {
        let nonce =
            attempt.wrapping_mul(SEGMENT_NONCE_A) ^ segment.wrapping_mul(SEGMENT_NONCE_B);
        let mixed = seed ^ attempt.wrapping_mul(ATTEMPT_MIX) ^ nonce;
        let mut rng = StdRng::seed_from_u64(mixed as u64);

        let mut beats = Vec::with_capacity(self.beat_count);
        for _ in 0..self.beat_count {
            let pick = rng.gen_range(0..self.palette.len());
            let jitter = if self.jitter > 0.0 {
                rng.gen_range(-self.jitter..self.jitter)
            } else {
                0.0
            };
            beats.push((self.palette[pick] + jitter).max(self.floor));
        }
        Pattern { beats }
    }

    /// Patterns for every segment of one attempt.
    pub fn build_all(&self, seed: u32, attempt: u32, segments: usize) -> Vec<Pattern> {
        (0..segments)
            .map(|segment| self.synthesize(seed, attempt, segment as u32))
            .collect()
    }
}
