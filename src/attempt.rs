//! Multi-segment attempt protocol.
//!
//! An attempt walks every segment through synthesize, play, capture and
//! evaluate, then renders one aggregate verdict. Failing segments never
//! short-circuit the attempt: all segments are always visited, so the
//! total attempt duration does not leak which segment failed first.

#[cfg(not(feature = "std"))]
use alloc::collections::VecDeque;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::capture::CaptureEngine;
use crate::config::RhythmConfig;
use crate::matcher::{Matcher, Verdict};
use crate::pattern::{Pattern, Synthesizer};
use crate::playback::PlaybackEngine;
use crate::traits::HapticSink;
use crate::Error;

/// Seconds after capture opens during which the segment transition is
/// still considered in progress.
const TRANSITION_GUARD: f32 = 0.08;

// Input acknowledgement tick and the silencing pulse.
const ACK_PULSE: (f32, f32) = (0.04, 0.4);
const SILENCE_PULSE: (f32, f32) = (0.001, 0.0);

/// Notification emitted by the attempt protocol, drained by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEvent {
    /// A segment's pattern is about to play.
    SegmentBegin {
        /// Zero-based segment index.
        segment: usize,
    },
    /// A segment's captured reply passed evaluation.
    SegmentPass {
        /// Zero-based segment index.
        segment: usize,
    },
    /// Every segment of the attempt passed; the user is authenticated.
    AllSegmentsPass,
    /// At least one segment failed.
    AttemptFailed {
        /// How many segments failed evaluation.
        failed_segments: usize,
    },
}

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Playback and capture were torn down.
    Stopped,
    /// A segment transition was in progress; the request was queued and
    /// will apply at the next tick checkpoint.
    Deferred,
}

/// One evaluated segment, immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// Zero-based segment index.
    pub segment: usize,
    /// Target pattern that was played.
    pub target: Pattern,
    /// Intervals the user produced.
    pub captured: Vec<f32>,
    /// Evaluation outcome.
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Playing,
    Capturing,
}

/// Drives segments through synthesize, play, capture and evaluate, and
/// aggregates their verdicts into one attempt outcome.
///
/// Single-threaded and cooperative: the caller owns the clock and calls
/// [`tick`](Authenticator::tick) plus [`press`](Authenticator::press) /
/// [`release`](Authenticator::release) with the same monotonic seconds.
#[derive(Debug, Clone)]
pub struct Authenticator {
    config: RhythmConfig,
    synthesizer: Synthesizer,
    playback: PlaybackEngine,
    capture: CaptureEngine,
    matcher: Matcher,
    phase: Phase,
    seed: u32,
    attempt_counter: u32,
    current_segment: usize,
    targets: Vec<Pattern>,
    records: Vec<SegmentRecord>,
    had_mismatch: bool,
    authenticated: bool,
    in_transition: bool,
    transition_ends_at: Option<f32>,
    pending_stop: bool,
    events: VecDeque<AuthEvent>,
}

impl Authenticator {
    /// Build an authenticator, rejecting out-of-range configuration.
    pub fn new(config: RhythmConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            synthesizer: Synthesizer::from_config(&config),
            playback: PlaybackEngine::from_config(&config),
            capture: CaptureEngine::from_config(&config),
            matcher: Matcher::from_config(&config),
            phase: Phase::Idle,
            seed: 0,
            attempt_counter: 0,
            current_segment: 0,
            targets: Vec::new(),
            records: Vec::new(),
            had_mismatch: false,
            authenticated: false,
            in_transition: false,
            transition_ends_at: None,
            pending_stop: false,
            events: VecDeque::new(),
            config,
        })
    }

    /// The configuration this session runs with.
    pub fn config(&self) -> &RhythmConfig {
        &self.config
    }

    /// Begin a fresh attempt at `now` from the given window seed.
    ///
    /// Increments the attempt counter (re-randomizing patterns even for
    /// the same seed), clears prior records and enters segment 0.
    pub fn start_attempt(&mut self, seed: u32, now: f32) {
        self.silence();
        self.pending_stop = false;
        self.seed = seed;
        self.attempt_counter = self.attempt_counter.wrapping_add(1);
        self.had_mismatch = false;
        self.authenticated = false;
        self.records.clear();
        self.build_targets_if_needed();
        self.enter_segment(0, now);
    }

    /// [`start_attempt`](Authenticator::start_attempt) with the seed
    /// derived from `secret` for the current wall-clock window.
    #[cfg(feature = "std")]
    pub fn start_attempt_now(&mut self, secret: &crate::Secret, now: f32) {
        let seed = crate::CodeGenerator::default().seed_now(secret);
        self.start_attempt(seed, now);
    }

    /// Advance playback, the idle-capture timeout and any queued stop.
    ///
    /// Call at whatever cadence the host loop runs; wake times are
    /// absolute, so cadence only bounds latency, not correctness.
    pub fn tick<H: HapticSink>(&mut self, now: f32, sink: &mut H) {
        if let Some(end) = self.transition_ends_at {
            if now >= end {
                self.in_transition = false;
                self.transition_ends_at = None;
            }
        }
        if self.pending_stop && !self.in_transition {
            self.pending_stop = false;
            log::debug!("applying queued stop request");
            self.silence();
            sink.pulse(SILENCE_PULSE.0, SILENCE_PULSE.1);
            return;
        }

        match self.phase {
            Phase::Idle => {}
            Phase::Playing => {
                if self.playback.tick(now, sink) {
                    let required = self.matcher.required_intervals(
                        self.targets[self.current_segment].len(),
                    );
                    self.capture.begin(required, now);
                    self.phase = Phase::Capturing;
                    self.transition_ends_at = Some(now + TRANSITION_GUARD);
                }
            }
            Phase::Capturing => {
                if self.capture.tick(now) {
                    self.evaluate(now, sink);
                }
            }
        }
    }

    /// Feed a press event. Ignored outside a capture window, or while
    /// the pattern is still playing when input blocking is enabled.
    pub fn press<H: HapticSink>(&mut self, now: f32, sink: &mut H) {
        if !self.input_accepted() {
            return;
        }
        sink.pulse(ACK_PULSE.0, ACK_PULSE.1);
        if self.capture.on_press(now) {
            self.evaluate(now, sink);
        }
    }

    /// Feed a release event, the counterpart of [`press`](Authenticator::press).
    pub fn release<H: HapticSink>(&mut self, now: f32, sink: &mut H) {
        if !self.input_accepted() {
            return;
        }
        if self.capture.on_release(now) {
            self.evaluate(now, sink);
        }
    }

    /// Abort playback and capture and return to idle.
    ///
    /// While a segment transition is in progress the request cannot be
    /// applied safely; it is queued and applied at the next
    /// [`tick`](Authenticator::tick) checkpoint, and `Deferred` is
    /// returned so the caller knows teardown has not happened yet.
    pub fn stop_and_silence<H: HapticSink>(&mut self, sink: &mut H) -> StopOutcome {
        if self.in_transition {
            self.pending_stop = true;
            log::debug!("stop requested during segment transition, queued");
            return StopOutcome::Deferred;
        }
        self.pending_stop = false;
        self.silence();
        sink.pulse(SILENCE_PULSE.0, SILENCE_PULSE.1);
        StopOutcome::Stopped
    }

    /// Pop the oldest pending notification.
    pub fn poll_event(&mut self) -> Option<AuthEvent> {
        self.events.pop_front()
    }

    /// Drain all pending notifications in order.
    pub fn drain_events(&mut self) -> Vec<AuthEvent> {
        self.events.drain(..).collect()
    }

    /// True while a capture window accepts input.
    pub fn is_capturing(&self) -> bool {
        self.capture.is_capturing()
    }

    /// True while the user is holding a press inside a capture window.
    pub fn is_input_held(&self) -> bool {
        self.capture.is_capturing() && !self.playback.is_playing() && self.capture.is_held()
    }

    /// Duration of the current hold, 0 when none.
    pub fn held_seconds(&self, now: f32) -> f32 {
        if self.is_input_held() {
            self.capture.held_seconds(now)
        } else {
            0.0
        }
    }

    /// Current hold normalized against the long reference duration,
    /// clamped to `[0, 1]`. Drives progress bars.
    pub fn held_fraction(&self, now: f32) -> f32 {
        (self.held_seconds(now) / self.config.dash_seconds.max(1e-4)).clamp(0.0, 1.0)
    }

    /// Where the short/long boundary sits on the same normalized scale.
    pub fn dot_threshold_normalized(&self) -> f32 {
        (self.config.dot_seconds / self.config.dash_seconds.max(1e-4)).clamp(0.0, 1.0)
    }

    /// True once every segment of the last finished attempt passed.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Monotonic attempt counter.
    pub fn attempt_counter(&self) -> u32 {
        self.attempt_counter
    }

    /// Index of the segment currently playing or capturing.
    pub fn current_segment(&self) -> usize {
        self.current_segment
    }

    /// Target pattern of the active segment, if an attempt is running.
    pub fn current_target(&self) -> Option<&Pattern> {
        if self.phase == Phase::Idle {
            None
        } else {
            self.targets.get(self.current_segment)
        }
    }

    /// Evaluated segments of the session, oldest first.
    pub fn report(&self) -> &[SegmentRecord] {
        &self.records
    }

    /// Serialize the segment records for external bookkeeping.
    #[cfg(feature = "std")]
    pub fn export_report_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.records)
    }

    fn input_accepted(&self) -> bool {
        if self.phase != Phase::Capturing {
            return false;
        }
        !(self.config.block_input_while_playing && self.playback.is_playing())
    }

    fn build_targets_if_needed(&mut self) {
        if !self.config.per_attempt_randomize && self.targets.len() == self.config.total_segments
        {
            return;
        }
        self.targets =
            self.synthesizer
                .build_all(self.seed, self.attempt_counter, self.config.total_segments);
    }

    fn enter_segment(&mut self, segment: usize, now: f32) {
        self.in_transition = true;
        self.transition_ends_at = None;
        self.current_segment = segment;
        log::debug!(
            "segment {} begin (attempt {})",
            segment,
            self.attempt_counter
        );
        self.events.push_back(AuthEvent::SegmentBegin { segment });

        let target = self.targets[segment].clone();
        self.playback.play(&target, self.config.accent_index, now);
        self.phase = Phase::Playing;
    }

    fn evaluate<H: HapticSink>(&mut self, now: f32, sink: &mut H) {
        let target = self.targets[self.current_segment].clone();
        let verdict = self.matcher.evaluate(&target.beats, self.capture.intervals());

        if verdict.pass {
            self.events.push_back(AuthEvent::SegmentPass {
                segment: self.current_segment,
            });
        } else {
            self.had_mismatch = true;
            log::debug!(
                "segment {} failed: {:?}",
                self.current_segment,
                verdict.reason
            );
        }
        self.records.push(SegmentRecord {
            segment: self.current_segment,
            target,
            captured: self.capture.intervals().to_vec(),
            verdict,
        });

        let next = self.current_segment + 1;
        if next < self.config.total_segments {
            self.enter_segment(next, now);
        } else {
            self.finish_attempt(now, sink);
        }
    }

    fn finish_attempt<H: HapticSink>(&mut self, now: f32, sink: &mut H) {
        let failed = self
            .records
            .iter()
            .rev()
            .take(self.config.total_segments)
            .filter(|r| !r.verdict.pass)
            .count();

        self.silence();
        sink.pulse(SILENCE_PULSE.0, SILENCE_PULSE.1);

        if !self.had_mismatch {
            self.authenticated = true;
            self.events.push_back(AuthEvent::AllSegmentsPass);
        } else {
            self.authenticated = false;
            self.events.push_back(AuthEvent::AttemptFailed {
                failed_segments: failed,
            });
            if self.config.auto_replay_on_fail {
                log::debug!("attempt failed, auto-replaying from segment 0");
                self.had_mismatch = false;
                self.enter_segment(0, now);
            }
        }
    }

    fn silence(&mut self) {
        self.playback.stop();
        self.capture.abort();
        self.phase = Phase::Idle;
        self.in_transition = false;
        self.transition_ends_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::FailReason;

    #[derive(Default)]
    struct RecordingSink {
        pulses: Vec<(f32, f32)>,
    }

    impl HapticSink for RecordingSink {
        fn pulse(&mut self, duration: f32, amplitude: f32) {
            self.pulses.push((duration, amplitude));
        }
    }

    struct Harness {
        auth: Authenticator,
        sink: RecordingSink,
        now: f32,
    }

    impl Harness {
        fn new(config: RhythmConfig) -> Self {
            Self {
                auth: Authenticator::new(config).unwrap(),
                sink: RecordingSink::default(),
                now: 0.0,
            }
        }

        fn start(&mut self, seed: u32) {
            let now = self.now;
            self.auth.start_attempt(seed, now);
        }

        /// Tick until a capture window opens.
        fn run_until_capturing(&mut self) {
            for _ in 0..100_000 {
                self.now += 0.005;
                let now = self.now;
                self.auth.tick(now, &mut self.sink);
                if self.auth.is_capturing() {
                    return;
                }
            }
            panic!("capture window never opened");
        }

        /// Reproduce `intervals` exactly as press-hold pairs.
        fn play_back(&mut self, intervals: &[f32]) {
            for &hold in intervals {
                self.now += 0.1;
                let press_at = self.now;
                self.auth.press(press_at, &mut self.sink);
                self.now += hold;
                let release_at = self.now;
                self.auth.release(release_at, &mut self.sink);
            }
        }

        /// Run one full segment, reproducing the target exactly.
        fn pass_segment(&mut self) {
            self.run_until_capturing();
            let target = self.auth.current_target().unwrap().beats.clone();
            self.play_back(&target);
        }
    }

    #[test]
    fn exact_reproduction_authenticates_end_to_end() {
        let mut h = Harness::new(RhythmConfig::default());
        h.start(0xBEEF);
        assert_eq!(h.auth.attempt_counter(), 1);

        for segment in 0..4 {
            assert_eq!(h.auth.current_segment(), segment);
            h.pass_segment();
        }

        assert!(h.auth.is_authenticated());
        let events = h.auth.drain_events();
        let passes = events
            .iter()
            .filter(|e| matches!(e, AuthEvent::AllSegmentsPass))
            .count();
        assert_eq!(passes, 1, "success notification must fire exactly once");
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, AuthEvent::SegmentBegin { .. }))
                .count(),
            4
        );
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, AuthEvent::SegmentPass { .. }))
                .count(),
            4
        );
        assert_eq!(h.auth.report().len(), 4);
        assert!(h.auth.report().iter().all(|r| r.verdict.pass));
    }

    #[test]
    fn playback_emits_the_synthesized_pattern() {
        let mut h = Harness::new(RhythmConfig::default());
        h.start(0xBEEF);
        h.run_until_capturing();

        let target = h.auth.current_target().unwrap().beats.clone();
        let played: Vec<f32> = h
            .sink
            .pulses
            .iter()
            .take(target.len())
            .map(|p| p.0)
            .collect();
        assert_eq!(played, target);
    }

    #[test]
    fn failing_segment_never_short_circuits() {
        let mut h = Harness::new(RhythmConfig::default());
        h.start(7);

        // ruin segment 0 with too few intervals, then pass the rest
        h.run_until_capturing();
        let short: Vec<f32> = h.auth.current_target().unwrap().beats[..2].to_vec();
        h.play_back(&short);
        // force the idle timeout so the partial capture evaluates
        h.now += 1.0;
        let now = h.now;
        h.auth.tick(now, &mut h.sink);

        for _ in 1..4 {
            h.pass_segment();
        }

        assert!(!h.auth.is_authenticated());
        let events = h.auth.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, AuthEvent::SegmentBegin { .. }))
                .count(),
            4,
            "all segments must be visited despite the early failure"
        );
        assert!(events
            .iter()
            .any(|e| matches!(e, AuthEvent::AttemptFailed { failed_segments: 1 })));
        assert_eq!(h.auth.report().len(), 4);
        assert_eq!(
            h.auth.report()[0].verdict.reason,
            Some(FailReason::CountMismatch)
        );
    }

    #[test]
    fn empty_capture_times_out_and_fails_the_segment() {
        let mut h = Harness::new(RhythmConfig::default());
        h.start(7);
        h.run_until_capturing();

        h.now += 1.0;
        let now = h.now;
        h.auth.tick(now, &mut h.sink);

        assert_eq!(h.auth.report().len(), 1);
        assert_eq!(
            h.auth.report()[0].verdict.reason,
            Some(FailReason::EmptyCapture)
        );
        // the protocol moved on to segment 1
        assert_eq!(h.auth.current_segment(), 1);
    }

    #[test]
    fn long_hold_is_not_evaluated_early() {
        let mut h = Harness::new(RhythmConfig::default());
        h.start(13);
        h.run_until_capturing();

        // hold well past the idle gap; the window must wait for release
        let press_at = h.now + 0.25;
        h.auth.press(press_at, &mut h.sink);
        h.auth.tick(press_at + 1.2, &mut h.sink);
        assert!(h.auth.is_capturing(), "mid-hold timeout would lose the hold");
        assert!(h.auth.report().is_empty());

        h.auth.release(press_at + 1.25, &mut h.sink);
        h.now = press_at + 1.25;
        h.play_back(&[0.2, 0.2, 0.2]);

        assert_eq!(h.auth.report().len(), 1);
        let captured = &h.auth.report()[0].captured;
        assert_eq!(captured.len(), 4);
        assert!((captured[0] - 1.25).abs() < 1e-3, "the long hold was recorded");
    }

    #[test]
    fn attempts_re_randomize_patterns() {
        let mut h = Harness::new(RhythmConfig::default());
        h.start(42);
        h.run_until_capturing();
        let first = h.auth.current_target().unwrap().clone();

        h.start(42);
        h.run_until_capturing();
        let second = h.auth.current_target().unwrap().clone();
        assert_ne!(first, second, "same seed, new attempt, new pattern");
    }

    #[test]
    fn cached_patterns_survive_attempts_when_randomization_is_off() {
        let mut config = RhythmConfig::default();
        config.per_attempt_randomize = false;
        let mut h = Harness::new(config);

        h.start(42);
        h.run_until_capturing();
        let first = h.auth.current_target().unwrap().clone();

        h.start(42);
        h.run_until_capturing();
        assert_eq!(first, *h.auth.current_target().unwrap());
    }

    #[test]
    fn auto_replay_restarts_from_segment_zero() {
        let mut config = RhythmConfig::default();
        config.auto_replay_on_fail = true;
        config.total_segments = 2;
        let mut h = Harness::new(config);
        h.start(3);

        for _ in 0..2 {
            h.run_until_capturing();
            h.now += 1.0; // let every segment time out empty
            let now = h.now;
            h.auth.tick(now, &mut h.sink);
        }

        let events = h.auth.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, AuthEvent::AttemptFailed { .. })));
        // replay re-entered segment 0 without a new start_attempt call
        assert_eq!(h.auth.current_segment(), 0);
        assert_eq!(h.auth.attempt_counter(), 1);
        assert!(h.auth.current_target().is_some());
    }

    #[test]
    fn input_is_ignored_while_pattern_plays() {
        let mut h = Harness::new(RhythmConfig::default());
        h.start(9);
        h.auth.tick(0.2, &mut h.sink);
        assert!(!h.auth.is_capturing());

        h.auth.press(0.25, &mut h.sink);
        h.auth.release(0.5, &mut h.sink);
        h.run_until_capturing();
        // nothing was recorded before the capture window opened
        let target_len = h.auth.current_target().unwrap().len();
        h.play_back(&vec![0.2; target_len]);
        assert_eq!(h.auth.report().len(), 1);
        assert_eq!(h.auth.report()[0].captured.len(), target_len);
    }

    #[test]
    fn stop_during_transition_is_queued_not_dropped() {
        let mut h = Harness::new(RhythmConfig::default());
        h.start(5);
        h.auth.tick(0.1, &mut h.sink);

        // playback is part of the segment transition window
        assert_eq!(
            h.auth.stop_and_silence(&mut h.sink),
            StopOutcome::Deferred
        );
        // the queued request applies once the transition guard expires
        h.run_until_capturing();
        let mut now = h.now;
        for _ in 0..100 {
            now += 0.05;
            h.auth.tick(now, &mut h.sink);
            if !h.auth.is_capturing() {
                break;
            }
        }
        assert!(!h.auth.is_capturing(), "queued stop was never applied");
        assert!(h.auth.report().is_empty(), "stop must not fake an evaluation");
    }

    #[test]
    fn stop_outside_transition_applies_immediately() {
        let mut h = Harness::new(RhythmConfig::default());
        h.start(5);
        h.run_until_capturing();
        // wait out the transition guard
        h.now += 0.2;
        let now = h.now;
        h.auth.tick(now, &mut h.sink);

        assert_eq!(h.auth.stop_and_silence(&mut h.sink), StopOutcome::Stopped);
        assert!(!h.auth.is_capturing());
        let (duration, amplitude) = *h.sink.pulses.last().unwrap();
        assert_eq!((duration, amplitude), (0.001, 0.0));
    }

    #[test]
    fn held_fraction_tracks_the_current_press() {
        let mut h = Harness::new(RhythmConfig::default());
        h.start(11);
        assert_eq!(h.auth.held_fraction(0.0), 0.0);
        h.run_until_capturing();

        let press_at = h.now;
        h.auth.press(press_at, &mut h.sink);
        assert!(h.auth.is_input_held());
        let fraction = h.auth.held_fraction(press_at + 0.4);
        assert!((fraction - 0.5).abs() < 1e-3, "0.4s of a 0.8s dash");
        assert!(h.auth.held_fraction(press_at + 2.0) <= 1.0);

        let threshold = h.auth.dot_threshold_normalized();
        assert!((threshold - 0.375).abs() < 1e-6, "0.3 dot over 0.8 dash");
    }

    #[test]
    fn report_serializes_for_external_logging() {
        let mut h = Harness::new(RhythmConfig::default());
        h.start(1);
        h.pass_segment();

        let json = h.auth.export_report_json().unwrap();
        assert!(json.contains("\"verdict\""));
        assert!(json.contains("\"captured\""));
    }
}
