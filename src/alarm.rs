//! Alarm controller — a repeating chime + haptic pulse until acknowledged.
//!
//! Once rung, the alarm re-fires both modalities on a fixed interval
//! until `acknowledge` is called. The two modalities fail independently:
//! a chime failure (no audio environment, muted platform policy) is
//! logged and never stops the haptic pulse or the repeat schedule.

use crate::signal::SignalGenerator;

/// Platform vibration capability. The pattern is alternating on/off
/// durations in milliseconds, WebVibration style.
pub trait HapticDevice {
    fn pulse(&mut self, pattern_ms: &[u32]);
    /// Cancel any in-flight pattern.
    fn cancel(&mut self);
}

/// Fallback for platforms without a vibration motor.
#[derive(Debug, Clone, Default)]
pub struct NullHaptics;

impl HapticDevice for NullHaptics {
    fn pulse(&mut self, _pattern_ms: &[u32]) {}
    fn cancel(&mut self) {}
}

/// The shipped pulse pattern: two 500ms buzzes with a 200ms gap.
pub const HAPTIC_PATTERN: &[u32] = &[500, 200, 500];

/// Interval between alarm repeats.
pub const REPEAT_INTERVAL_MS: f64 = 3000.0;

/// The live repeat schedule. The deadline doubles as the cancellation
/// token: it is cleared together with the active flag, so a repeat can
/// never fire after acknowledgement.
#[derive(Debug, Clone, Copy)]
struct AlarmSession {
    active: bool,
    next_repeat_ms: Option<f64>,
}

/// The alarm controller. At most one repeating session per instance.
pub struct AlarmController {
    session: AlarmSession,
    repeat_interval_ms: f64,
    haptics: Box<dyn HapticDevice>,
}

impl AlarmController {
    pub fn new(haptics: Box<dyn HapticDevice>) -> Self {
        AlarmController {
            session: AlarmSession {
                active: false,
                next_repeat_ms: None,
            },
            repeat_interval_ms: REPEAT_INTERVAL_MS,
            haptics,
        }
    }

    /// Start the alarm: chime + haptic pulse immediately, then repeat on
    /// the fixed interval until acknowledged. No-op while a session is
    /// already active — ringing twice never doubles the schedule.
    pub fn ring(&mut self, now_ms: f64, signals: &mut SignalGenerator) {
        if self.session.active {
            return;
        }
        self.fire(signals);
        self.session = AlarmSession {
            active: true,
            next_repeat_ms: Some(now_ms + self.repeat_interval_ms),
        };
    }

    /// Fire any due repeat. The host drives this from the same tick loop
    /// as the countdown.
    pub fn poll(&mut self, now_ms: f64, signals: &mut SignalGenerator) {
        if !self.session.active {
            return;
        }
        let Some(next) = self.session.next_repeat_ms else {
            return;
        };
        if now_ms >= next {
            self.fire(signals);
            self.session.next_repeat_ms = Some(now_ms + self.repeat_interval_ms);
        }
    }

    /// Stop the alarm: clears the repeat schedule and cancels any
    /// in-flight haptic pattern. Idempotent; without an active session
    /// this does nothing.
    pub fn acknowledge(&mut self) {
        if !self.session.active {
            return;
        }
        self.session = AlarmSession {
            active: false,
            next_repeat_ms: None,
        };
        self.haptics.cancel();
    }

    pub fn is_active(&self) -> bool {
        self.session.active
    }

    /// One ring: both modalities, failing independently.
    fn fire(&mut self, signals: &mut SignalGenerator) {
        if let Err(e) = signals.chime() {
            log::warn!("alarm chime failed, continuing with haptics: {e}");
        }
        self.haptics.pulse(HAPTIC_PATTERN);
    }
}
