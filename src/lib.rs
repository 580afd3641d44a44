//! PulseLock: rhythm-based one-time authentication.
//!
//! A per-user secret and the current time window deterministically yield
//! a challenge: a short sequence of haptic pulses ("beats") drawn from a
//! short/long palette. The user reproduces the rhythm with press-hold
//! timing, and the reproduction is scored against the target under a
//! configurable tolerance. The same derivation also yields a grouped
//! text code for a pure-text OTP fallback.
//!
//! # Architecture
//!
//! Leaves first:
//!
//! - [`Secret`]: per-user key material (well-known fallback included)
//! - [`CodeGenerator`] / [`CodeValidator`]: windowed codes and seeds
//! - [`Synthesizer`]: seed → deterministic beat [`Pattern`]
//! - [`PlaybackEngine`]: pattern → ordered haptic pulses
//! - [`CaptureEngine`]: press/release timing → intervals
//! - [`Matcher`]: intervals vs. target → [`Verdict`]
//! - [`Authenticator`]: the multi-segment attempt protocol on top
//!
//! Everything is single-threaded and cooperative: the caller owns the
//! clock and pushes time in via `tick`, `press` and `release`. Output
//! goes to a caller-supplied [`HapticSink`]; notifications come back as
//! a queue of typed [`AuthEvent`]s.
//!
//! # Example
//!
//! ```rust
//! use pulselock::{Authenticator, CodeGenerator, NullSink, RhythmConfig, Secret};
//!
//! let mut auth = Authenticator::new(RhythmConfig::default()).unwrap();
//! let secret = Secret::derive("alice");
//! let seed = CodeGenerator::default().seed_now(&secret);
//!
//! // kick off an attempt and drive it from the host loop
//! auth.start_attempt(seed, 0.0);
//! let mut sink = NullSink;
//! auth.tick(0.1, &mut sink);
//!
//! // the text code for the same window doubles as a classic OTP
//! let code = CodeGenerator::default().code_now(&secret);
//! assert_eq!(code.split(' ').count(), 4);
//! ```
//!
//! # no_std support
//!
//! The crate supports `no_std` environments (with `alloc`) when the
//! `std` feature is disabled. All engines take explicit timestamps, so
//! only the wall-clock conveniences ([`CodeGenerator::code_now`],
//! [`CodeGenerator::seed_now`], [`CodeValidator::is_valid_now`],
//! [`Authenticator::start_attempt_now`]) and JSON report export require
//! `std`.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod attempt;
pub mod capture;
pub mod code;
pub mod config;
pub mod matcher;
pub mod pattern;
pub mod playback;
pub mod secret;
pub mod traits;

// Re-exports
pub use attempt::{AuthEvent, Authenticator, SegmentRecord, StopOutcome};
pub use capture::{CaptureEngine, CaptureMode};
pub use code::{CodeGenerator, CodeValidator};
pub use config::RhythmConfig;
pub use matcher::{FailReason, Matcher, Verdict};
pub use pattern::{Pattern, Synthesizer};
pub use playback::PlaybackEngine;
pub use secret::{derive_user_secret, Secret, WELL_KNOWN_USERNAME};
pub use traits::{HapticSink, NullSink};

/// Error types for pulselock operations.
///
/// Only configuration can fail: synthesis, playback, capture and
/// scoring are total functions over their documented input domains.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum Error {
    /// Beats per segment outside the supported range.
    #[cfg_attr(
        feature = "std",
        error("beat count {value} outside supported range 3..=8")
    )]
    BeatCountOutOfRange {
        /// The rejected value.
        value: usize,
    },

    /// MAE tolerance outside the supported range.
    #[cfg_attr(
        feature = "std",
        error("tolerance {value} outside supported range 0.05..=0.4")
    )]
    ToleranceOutOfRange {
        /// The rejected value.
        value: f32,
    },

    /// Pulse amplitude outside `[0, 1]`.
    #[cfg_attr(feature = "std", error("amplitude {value} outside 0.0..=1.0"))]
    AmplitudeOutOfRange {
        /// The rejected value.
        value: f32,
    },

    /// The beat duration palette has no entries.
    #[cfg_attr(feature = "std", error("duration palette must not be empty"))]
    EmptyPalette,

    /// An attempt needs at least one segment.
    #[cfg_attr(feature = "std", error("segment count must be at least 1"))]
    NoSegments,

    /// Code windows must be at least one second long.
    #[cfg_attr(feature = "std", error("window length must be greater than 0 seconds"))]
    ZeroWindow,
}

#[cfg(not(feature = "std"))]
impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::BeatCountOutOfRange { value } => {
                write!(f, "beat count {} outside supported range 3..=8", value)
            }
            Error::ToleranceOutOfRange { value } => {
                write!(f, "tolerance {} outside supported range 0.05..=0.4", value)
            }
            Error::AmplitudeOutOfRange { value } => {
                write!(f, "amplitude {} outside 0.0..=1.0", value)
            }
            Error::EmptyPalette => write!(f, "duration palette must not be empty"),
            Error::NoSegments => write!(f, "segment count must be at least 1"),
            Error::ZeroWindow => {
                write!(f, "window length must be greater than 0 seconds")
            }
        }
    }
}
