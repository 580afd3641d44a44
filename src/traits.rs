//! Output seam for haptic feedback devices.

/// Sink for haptic pulses emitted during playback and input feedback.
///
/// Implementations map a pulse to whatever actuator is available
/// (controller rumble, vibration motor, audio click).
pub trait HapticSink {
    /// Emit one pulse of `duration` seconds at `amplitude` in `[0, 1]`.
    fn pulse(&mut self, duration: f32, amplitude: f32);
}

/// Sink that discards all pulses. Useful for headless validation flows.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl HapticSink for NullSink {
    fn pulse(&mut self, _duration: f32, _amplitude: f32) {}
}
