//! Tunables for challenge playback, capture and matching.
//!
//! All out-of-range values are rejected here, at configuration time;
//! the engines themselves treat their inputs as total functions.

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Configuration for one rhythmic authentication session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RhythmConfig {
    /// Beats per segment pattern (allowed range 3..=8).
    pub beat_count: usize,
    /// Canonical beat durations in seconds (short/long).
    pub palette: Vec<f32>,
    /// Segments per attempt.
    pub total_segments: usize,
    /// Uniform jitter applied around each palette duration, in seconds.
    pub pattern_jitter: f32,
    /// Minimum beat duration after jitter.
    pub beat_floor: f32,
    /// Delay before playback reacts at all.
    pub settle_delay: f32,
    /// Lead-in after settle, before the first beat.
    pub lead_in: f32,
    /// Silence between beats during playback.
    pub inter_beat_gap: f32,
    /// Base pulse amplitude in `[0, 1]`.
    pub amplitude: f32,
    /// Beat index emphasized with `accent_boost`, if any.
    pub accent_index: Option<usize>,
    /// Extra amplitude for the accented beat.
    pub accent_boost: f32,
    /// Reference "short" duration for classification and UI thresholds.
    pub dot_seconds: f32,
    /// Reference "long" duration for classification and UI thresholds.
    pub dash_seconds: f32,
    /// Pass threshold on the mean absolute error (allowed range 0.05..=0.4).
    pub tolerance: f32,
    /// Compare shape rather than absolute tempo (L1-normalize both sides).
    pub length_normalize: bool,
    /// Fail on any interval-count mismatch; lenient mode tolerates one.
    pub strict_count_match: bool,
    /// In lenient mode, add a fixed penalty for an off-by-one count.
    pub penalize_off_by_one: bool,
    /// Require short/long class agreement before magnitude scoring.
    pub require_class_match: bool,
    /// Record press-hold durations; when false, gaps between taps.
    pub hold_mode: bool,
    /// Seconds without input before a capture window force-ends.
    pub capture_idle_gap: f32,
    /// Lower clamp for a recorded hold duration.
    pub hold_clamp_min: f32,
    /// Upper clamp for a recorded hold duration.
    pub hold_clamp_max: f32,
    /// Ignore input while the target pattern is still playing.
    pub block_input_while_playing: bool,
    /// Re-randomize patterns on every attempt; otherwise cache per session.
    pub per_attempt_randomize: bool,
    /// Restart from segment 0 automatically after a failed attempt.
    pub auto_replay_on_fail: bool,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            beat_count: 4,
            palette: vec![0.20, 0.60],
            total_segments: 4,
            pattern_jitter: 0.02,
            beat_floor: 0.12,
            settle_delay: 0.03,
            lead_in: 0.15,
            inter_beat_gap: 0.45,
            amplitude: 0.7,
            accent_index: None,
            accent_boost: 0.15,
            dot_seconds: 0.30,
            dash_seconds: 0.80,
            tolerance: 0.18,
            length_normalize: true,
            strict_count_match: true,
            penalize_off_by_one: true,
            require_class_match: true,
            hold_mode: true,
            capture_idle_gap: 0.9,
            hold_clamp_min: 0.05,
            hold_clamp_max: 1.50,
            block_input_while_playing: true,
            per_attempt_randomize: true,
            auto_replay_on_fail: false,
        }
    }
}

impl RhythmConfig {
    /// Check every tunable against its supported range.
    pub fn validate(&self) -> Result<(), Error> {
        if !(3..=8).contains(&self.beat_count) {
            return Err(Error::BeatCountOutOfRange {
                value: self.beat_count,
            });
        }
        if !(0.05..=0.4).contains(&self.tolerance) {
            return Err(Error::ToleranceOutOfRange {
                value: self.tolerance,
            });
        }
        if !(0.0..=1.0).contains(&self.amplitude) {
            return Err(Error::AmplitudeOutOfRange {
                value: self.amplitude,
            });
        }
        if self.palette.is_empty() {
            return Err(Error::EmptyPalette);
        }
        if self.total_segments == 0 {
            return Err(Error::NoSegments);
        }
        Ok(())
    }

    /// Intervals one capture window must record before evaluation.
    ///
    /// Hold mode records one interval per beat; tap mode records the
    /// gaps between taps, one fewer than the beat count.
    pub fn required_intervals(&self) -> usize {
        if self.hold_mode {
            self.beat_count
        } else {
            self.beat_count.saturating_sub(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RhythmConfig::default().validate().is_ok());
    }

    #[test]
    fn beat_count_bounds_enforced() {
        let mut config = RhythmConfig::default();
        config.beat_count = 2;
        assert!(matches!(
            config.validate(),
            Err(Error::BeatCountOutOfRange { value: 2 })
        ));
        config.beat_count = 9;
        assert!(config.validate().is_err());
        config.beat_count = 8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn tolerance_bounds_enforced() {
        let mut config = RhythmConfig::default();
        config.tolerance = 0.04;
        assert!(matches!(
            config.validate(),
            Err(Error::ToleranceOutOfRange { .. })
        ));
        config.tolerance = 0.41;
        assert!(config.validate().is_err());
        config.tolerance = 0.4;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_palette_rejected() {
        let mut config = RhythmConfig::default();
        config.palette.clear();
        assert!(matches!(config.validate(), Err(Error::EmptyPalette)));
    }

    #[test]
    fn required_intervals_per_mode() {
        let mut config = RhythmConfig::default();
        assert_eq!(config.required_intervals(), 4);
        config.hold_mode = false;
        assert_eq!(config.required_intervals(), 3);
    }
}
