//! Mixer — sums voice outputs with master gain and soft clipping.

/// A summing mixer that accumulates audio from multiple sources and writes
/// soft-clipped f32 blocks for the platform audio callback.
#[derive(Debug, Clone)]
pub struct Mixer {
    pub master_gain: f64,
    buffer: Vec<f64>,
}

impl Mixer {
    pub fn new() -> Self {
        Mixer {
            master_gain: 1.0,
            buffer: Vec::new(),
        }
    }

    /// Prepare a buffer of `num_samples` filled with zeros.
    pub fn clear(&mut self, num_samples: usize) {
        self.buffer.clear();
        self.buffer.resize(num_samples, 0.0);
    }

    /// Add a sample at the given index.
    pub fn add(&mut self, index: usize, sample: f64) {
        if index < self.buffer.len() {
            self.buffer[index] += sample;
        }
    }

    /// Write the mixed block into `out`, with master gain and soft clipping
    /// applied. `out` must be at least as long as the prepared block.
    pub fn write_to(&self, out: &mut [f32]) {
        for (dst, &s) in out.iter_mut().zip(self.buffer.iter()) {
            *dst = soft_clip(s * self.master_gain) as f32;
        }
    }

    /// Mixed output as a fresh buffer (offline rendering path).
    pub fn output(&self) -> Vec<f64> {
        self.buffer
            .iter()
            .map(|&s| soft_clip(s * self.master_gain))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Mixer::new()
    }
}

/// Soft clipper using tanh to prevent harsh digital clipping.
fn soft_clip(x: f64) -> f64 {
    x.tanh()
}
