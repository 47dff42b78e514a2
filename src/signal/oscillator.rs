//! Sine oscillator — phase accumulator.
//!
//! The bell chime is purely additive sine synthesis, so no band-limiting
//! is required: a sine has no harmonics to alias.

use std::f64::consts::PI;

/// A free-running sine oscillator.
#[derive(Debug, Clone)]
pub struct SineOscillator {
    pub frequency: f64,
    phase: f64,
    sample_rate: f64,
}

impl SineOscillator {
    pub fn new(frequency: f64, sample_rate: f64) -> Self {
        SineOscillator {
            frequency,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Phase increment per sample.
    fn phase_inc(&self) -> f64 {
        self.frequency / self.sample_rate
    }

    /// Generate the next sample in [-1, 1].
    pub fn next_sample(&mut self) -> f64 {
        let sample = (2.0 * PI * self.phase).sin();
        self.phase += self.phase_inc();
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        sample
    }

    /// Reset phase to zero.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_in_range() {
        let mut osc = SineOscillator::new(440.0, 44100.0);
        for _ in 0..44100 {
            let s = osc.next_sample();
            assert!(s.abs() <= 1.0, "Sine output out of range: {s}");
        }
    }

    #[test]
    fn starts_at_zero_phase() {
        let mut osc = SineOscillator::new(440.0, 44100.0);
        let s = osc.next_sample();
        assert!(s.abs() < 1e-12, "First sample should be sin(0) = 0, got {s}");
    }

    #[test]
    fn frequency_matches_zero_crossings() {
        // A 100 Hz sine over 1 second crosses zero upward 100 times.
        let mut osc = SineOscillator::new(100.0, 44100.0);
        let mut prev = osc.next_sample();
        let mut crossings = 0;
        for _ in 0..44100 {
            let s = osc.next_sample();
            if prev < 0.0 && s >= 0.0 {
                crossings += 1;
            }
            prev = s;
        }
        assert!(
            (crossings as i32 - 100).abs() <= 1,
            "Expected ~100 upward zero crossings, got {crossings}"
        );
    }

    #[test]
    fn reset_restarts_phase() {
        let mut osc = SineOscillator::new(440.0, 44100.0);
        let first = osc.next_sample();
        for _ in 0..100 {
            osc.next_sample();
        }
        osc.reset();
        let again = osc.next_sample();
        assert!((first - again).abs() < 1e-12);
    }
}
