//! Audio capability — backend trait and the process-scoped context.
//!
//! The platform's audio output is modeled as a capability: a backend
//! either yields a working [`AudioContext`] or fails with
//! `EnvironmentUnavailable`, in which case the generator degrades to
//! silent no-ops while haptics and the countdown keep working. The
//! context is created lazily on the first sound request and reused for
//! the life of the process.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::SignalError;

/// Length of the cached white-noise loop. Long enough that the loop point
/// is inaudible over normal listening durations.
pub const NOISE_BUFFER_SECONDS: f64 = 30.0;

/// Fixed PCG seed. Keeps the noise bed deterministic across sessions and
/// platforms; the ear cannot tell one uniform noise stream from another.
const NOISE_SEED: u64 = 0x0F0C_0B31;

/// Constructor capability for the platform audio context.
pub trait AudioBackend {
    /// Instantiate the audio context. Called at most once per generator;
    /// failure is reported once and then sound calls become no-ops.
    fn open(&mut self) -> Result<AudioContext, SignalError>;
}

/// In-process backend with a fixed sample rate. The default for native
/// rendering and for the WASM build, where the host AudioWorklet pulls
/// sample buffers at its own rate.
#[derive(Debug, Clone)]
pub struct FixedRateBackend {
    pub sample_rate: f64,
}

impl FixedRateBackend {
    pub fn new(sample_rate: f64) -> Self {
        FixedRateBackend { sample_rate }
    }
}

impl Default for FixedRateBackend {
    fn default() -> Self {
        FixedRateBackend::new(44100.0)
    }
}

impl AudioBackend for FixedRateBackend {
    fn open(&mut self) -> Result<AudioContext, SignalError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(SignalError::unavailable(format!(
                "invalid sample rate {}",
                self.sample_rate
            )));
        }
        Ok(AudioContext::new(self.sample_rate))
    }
}

/// Fallback for platforms without audio output. Opening always fails, so
/// every sound path degrades gracefully.
#[derive(Debug, Clone, Default)]
pub struct UnavailableBackend;

impl AudioBackend for UnavailableBackend {
    fn open(&mut self) -> Result<AudioContext, SignalError> {
        Err(SignalError::unavailable(
            "audio output is not available on this platform",
        ))
    }
}

/// The process-scoped audio context: sample rate, deterministic RNG, and
/// the cached noise loop. Owned exclusively by the signal generator.
#[derive(Debug, Clone)]
pub struct AudioContext {
    sample_rate: f64,
    rng: Pcg32,
    noise_buffer: Option<Arc<Vec<f32>>>,
}

impl AudioContext {
    pub fn new(sample_rate: f64) -> Self {
        AudioContext {
            sample_rate,
            rng: Pcg32::seed_from_u64(NOISE_SEED),
            noise_buffer: None,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// The shared white-noise loop, generated on first use and cached for
    /// the life of the context. Uniform samples in [-1, 1].
    pub fn noise_buffer(&mut self) -> Arc<Vec<f32>> {
        if let Some(buf) = &self.noise_buffer {
            return Arc::clone(buf);
        }
        let len = (NOISE_BUFFER_SECONDS * self.sample_rate) as usize;
        let buffer: Vec<f32> = (0..len)
            .map(|_| self.rng.gen_range(-1.0_f32..=1.0))
            .collect();
        let buffer = Arc::new(buffer);
        self.noise_buffer = Some(Arc::clone(&buffer));
        buffer
    }

    /// A random loop offset into a buffer of `len` samples. Used to start
    /// each band voice at its own position in the shared loop.
    pub fn random_offset(&mut self, len: usize) -> usize {
        if len == 0 { 0 } else { self.rng.gen_range(0..len) }
    }
}
