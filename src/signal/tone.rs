//! Bell chime — additive synthesis of a struck-bell timbre.
//!
//! Five sine partials at fixed inharmonic ratios, each through its own
//! percussive envelope, summed. Peak levels fall off with partial order so
//! perceived brightness decays naturally. A chime is fire-and-forget: the
//! voice self-terminates once every partial's envelope has run out.

use serde::{Deserialize, Serialize};

use super::envelope::PercussiveEnvelope;
use super::oscillator::SineOscillator;

/// Configuration for the chime timbre. The defaults are the tuned values
/// the product ships with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BellTone {
    /// Fundamental frequency in Hz.
    pub fundamental_hz: f64,
    /// Frequency ratio of each partial relative to the fundamental.
    pub harmonic_ratios: Vec<f64>,
    /// Peak amplitude of each partial, paired with `harmonic_ratios`.
    pub harmonic_levels: Vec<f64>,
    /// Linear attack window in seconds.
    pub attack: f64,
    /// Total duration (attack + exponential decay) in seconds.
    pub duration: f64,
}

impl Default for BellTone {
    fn default() -> Self {
        BellTone {
            fundamental_hz: 440.0,
            harmonic_ratios: vec![1.0, 2.0, 3.0, 4.2, 5.4],
            harmonic_levels: vec![0.30, 0.15, 0.10, 0.05, 0.02],
            attack: 0.02,
            duration: 2.5,
        }
    }
}

/// One partial: a sine oscillator shaped by its envelope.
#[derive(Debug, Clone)]
struct Partial {
    oscillator: SineOscillator,
    envelope: PercussiveEnvelope,
}

/// A single live chime instance. All partials start simultaneously.
#[derive(Debug, Clone)]
pub struct ToneVoice {
    partials: Vec<Partial>,
    finished: bool,
}

impl ToneVoice {
    pub fn new(config: &BellTone, sample_rate: f64) -> Self {
        let partials = config
            .harmonic_ratios
            .iter()
            .zip(config.harmonic_levels.iter())
            .map(|(&ratio, &level)| Partial {
                oscillator: SineOscillator::new(config.fundamental_hz * ratio, sample_rate),
                envelope: PercussiveEnvelope::new(level, config.attack, config.duration, sample_rate),
            })
            .collect();
        ToneVoice {
            partials,
            finished: false,
        }
    }

    /// Generate the next sample: the sum of all enveloped partials.
    pub fn next_sample(&mut self) -> f64 {
        if self.finished {
            return 0.0;
        }

        let mut sum = 0.0;
        for p in self.partials.iter_mut() {
            sum += p.oscillator.next_sample() * p.envelope.next_sample();
        }

        if self.partials.iter().all(|p| p.envelope.is_finished()) {
            self.finished = true;
        }

        sum
    }

    /// Has every partial's envelope run out?
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
