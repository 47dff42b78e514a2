//! Percussive envelope — linear attack, exponential decay.
//!
//! Shapes one struck-bell partial: an instantaneous-feeling linear rise to
//! the partial's peak, then an exponential fall toward a near-zero floor.
//! The decay targets the floor rather than zero, since an exponential ramp
//! to exactly zero is undefined.

/// Envelope stages.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Attack,
    Decay,
    Done,
}

/// A one-shot attack/decay envelope. Runs once and finishes; there is no
/// gate-off — the voice self-terminates when the decay window elapses.
#[derive(Debug, Clone)]
pub struct PercussiveEnvelope {
    /// Peak level reached at the end of the attack.
    pub peak: f64,

    stage: Stage,
    level: f64,
    /// Samples in the attack stage.
    attack_samples: usize,
    /// Samples in the decay stage.
    decay_samples: usize,
    stage_counter: usize,
    /// Per-sample multiplier during decay.
    decay_coeff: f64,
}

/// Exponential decay target. Matches the WebAudio convention of ramping
/// toward a small positive floor instead of zero.
pub const DECAY_FLOOR: f64 = 0.001;

impl PercussiveEnvelope {
    /// `attack` and `total` are in seconds; the decay occupies the remainder
    /// of `total` after the attack.
    pub fn new(peak: f64, attack: f64, total: f64, sample_rate: f64) -> Self {
        let attack_samples = (attack * sample_rate) as usize;
        let decay_samples = ((total - attack).max(0.0) * sample_rate) as usize;
        let decay_coeff = if decay_samples == 0 || peak <= DECAY_FLOOR {
            0.0
        } else {
            (DECAY_FLOOR / peak).powf(1.0 / decay_samples as f64)
        };
        PercussiveEnvelope {
            peak,
            stage: Stage::Attack,
            level: 0.0,
            attack_samples,
            decay_samples,
            stage_counter: 0,
            decay_coeff,
        }
    }

    /// Generate the next envelope sample in [0, peak].
    pub fn next_sample(&mut self) -> f64 {
        match self.stage {
            Stage::Attack => {
                if self.attack_samples == 0 {
                    self.level = self.peak;
                    self.enter_decay();
                } else {
                    let t = self.stage_counter as f64 / self.attack_samples as f64;
                    self.level = self.peak * t;
                    self.stage_counter += 1;
                    if self.stage_counter >= self.attack_samples {
                        self.level = self.peak;
                        self.enter_decay();
                    }
                }
            }
            Stage::Decay => {
                self.level *= self.decay_coeff;
                self.stage_counter += 1;
                if self.stage_counter >= self.decay_samples {
                    self.level = 0.0;
                    self.stage = Stage::Done;
                }
            }
            Stage::Done => {
                self.level = 0.0;
            }
        }
        self.level
    }

    /// Has the decay window fully elapsed?
    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Done
    }

    fn enter_decay(&mut self) {
        self.stage = Stage::Decay;
        self.stage_counter = 0;
    }
}
