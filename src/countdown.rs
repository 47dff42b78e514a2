//! Countdown engine — a drift-corrected, deadline-anchored interval timer.
//!
//! Remaining time is always derived by subtracting "now" from an absolute
//! deadline computed once at the transition into Running, never by
//! accumulating periodic decrements. Imprecise or suspended host ticks
//! therefore cannot drift the clock: a late poll simply derives a smaller
//! remainder.
//!
//! The engine never reads a wall clock itself. The host supplies
//! monotonic milliseconds (`performance.now()` in the browser) to every
//! time-dependent call and drives `poll` at its own cadence — one second
//! or faster for a smooth display.

use crate::error::SignalError;

/// Countdown lifecycle states. `Completed` is transient: it is only
/// observable inside the completion callback, after which the engine has
/// already re-armed to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStatus {
    Idle,
    Running,
    Completed,
}

/// The countdown engine.
pub struct CountdownEngine {
    total_seconds: u32,
    /// Duration configured mid-run; applied at the next reset.
    pending_total_seconds: Option<u32>,
    status: CountdownStatus,
    /// Wall-clock instant at which the remainder reaches zero. Non-null
    /// iff Running.
    deadline_ms: Option<f64>,
    /// Remaining milliseconds while not Running. Kept at millisecond
    /// precision so pause/resume cycles cannot accumulate rounding drift.
    frozen_ms: f64,
    /// Display snapshot, refreshed on every poll and transition.
    remaining_seconds: u32,
    on_tick: Option<Box<dyn FnMut(u32)>>,
    on_complete: Option<Box<dyn FnMut()>>,
}

impl CountdownEngine {
    /// Create an idle engine with the given duration in minutes.
    pub fn new(duration_minutes: f64) -> Result<Self, SignalError> {
        let total_seconds = validate_minutes(duration_minutes)?;
        Ok(CountdownEngine {
            total_seconds,
            pending_total_seconds: None,
            status: CountdownStatus::Idle,
            deadline_ms: None,
            frozen_ms: total_seconds as f64 * 1000.0,
            remaining_seconds: total_seconds,
            on_tick: None,
            on_complete: None,
        })
    }

    /// Register the per-poll display callback. Receives the derived
    /// remaining seconds on every re-evaluation.
    pub fn set_on_tick(&mut self, callback: impl FnMut(u32) + 'static) {
        self.on_tick = Some(Box::new(callback));
    }

    /// Register the completion callback. Fires exactly once per
    /// Running → Completed transition.
    pub fn set_on_complete(&mut self, callback: impl FnMut() + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Set a new duration. Rejects non-positive values; state unchanged
    /// on rejection. While Running, the change is parked and applied at
    /// the next reset, so the live deadline anchor is never disturbed
    /// mid-flight.
    pub fn configure(&mut self, duration_minutes: f64) -> Result<(), SignalError> {
        let total_seconds = validate_minutes(duration_minutes)?;
        if self.status == CountdownStatus::Running {
            self.pending_total_seconds = Some(total_seconds);
        } else {
            self.total_seconds = total_seconds;
            self.pending_total_seconds = None;
            self.frozen_ms = total_seconds as f64 * 1000.0;
            self.remaining_seconds = total_seconds;
            self.status = CountdownStatus::Idle;
        }
        Ok(())
    }

    /// Begin (or resume) the countdown. No-op while already Running.
    /// The deadline is computed fresh from the frozen remainder, never
    /// from tick accumulation.
    pub fn start(&mut self, now_ms: f64) {
        if self.status == CountdownStatus::Running {
            return;
        }
        if self.frozen_ms <= 0.0 {
            // Stale remainder from a previous run.
            self.frozen_ms = self.total_seconds as f64 * 1000.0;
        }
        self.deadline_ms = Some(now_ms + self.frozen_ms);
        self.status = CountdownStatus::Running;
        self.remaining_seconds = ceil_seconds(self.frozen_ms);
    }

    /// Freeze the countdown. The millisecond remainder is preserved
    /// exactly; a later `start` anchors a fresh deadline from it. No-op
    /// unless Running.
    pub fn pause(&mut self, now_ms: f64) {
        let Some(deadline) = self.deadline_ms else {
            return;
        };
        if self.status != CountdownStatus::Running {
            return;
        }
        self.frozen_ms = (deadline - now_ms).max(0.0);
        self.deadline_ms = None;
        self.status = CountdownStatus::Idle;
        self.remaining_seconds = ceil_seconds(self.frozen_ms);
    }

    /// Force Idle with the full (possibly newly configured) duration.
    /// Idempotent.
    pub fn reset(&mut self) {
        self.rearm();
    }

    /// Re-evaluate the countdown against `now_ms`. Fires the tick
    /// callback with the derived remainder; on reaching zero, fires the
    /// completion callback once and re-arms to Idle.
    pub fn poll(&mut self, now_ms: f64) {
        if self.status != CountdownStatus::Running {
            return;
        }
        let Some(deadline) = self.deadline_ms else {
            return;
        };

        let remaining = ceil_seconds((deadline - now_ms).max(0.0));
        self.remaining_seconds = remaining;
        if let Some(tick) = self.on_tick.as_mut() {
            tick(remaining);
        }

        if remaining == 0 {
            self.status = CountdownStatus::Completed;
            if let Some(complete) = self.on_complete.as_mut() {
                complete();
            }
            // The completion event is the only external signal; the
            // engine itself immediately re-arms. Whether to auto-start
            // the next phase is the caller's policy.
            self.rearm();
        }
    }

    // ── Read-only snapshots ─────────────────────────────────

    pub fn status(&self) -> CountdownStatus {
        self.status
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    fn rearm(&mut self) {
        if let Some(total) = self.pending_total_seconds.take() {
            self.total_seconds = total;
        }
        self.status = CountdownStatus::Idle;
        self.deadline_ms = None;
        self.frozen_ms = self.total_seconds as f64 * 1000.0;
        self.remaining_seconds = self.total_seconds;
    }
}

/// Validate a duration in minutes and convert to whole seconds.
fn validate_minutes(minutes: f64) -> Result<u32, SignalError> {
    if !minutes.is_finite() || minutes <= 0.0 {
        return Err(SignalError::invalid(format!(
            "duration must be a positive number of minutes, got {minutes}"
        )));
    }
    let seconds = (minutes * 60.0).round();
    if seconds < 1.0 {
        return Err(SignalError::invalid(format!(
            "duration of {minutes} minutes rounds below one second"
        )));
    }
    Ok(seconds as u32)
}

/// Milliseconds to display seconds, rounded up so the display only
/// reaches 0 at the actual deadline.
fn ceil_seconds(ms: f64) -> u32 {
    (ms / 1000.0).ceil().max(0.0) as u32
}
