//! Band-filtered noise — profile types and the per-band voice chain.
//!
//! The ambient bed is broadband white noise shaped by five fixed bands
//! (bass through treble). Each active band loops a shared noise buffer
//! through highpass → shelf/peak → lowpass → band gain, and all bands sum
//! into the master fade stage. These types map directly to the profile
//! JSON the UI layer ships.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::filter::{BiquadFilter, FilterType};

/// The characteristic filter shape of a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterShape {
    Lowshelf,
    Peaking,
    Highshelf,
}

impl FilterShape {
    fn filter_type(self) -> FilterType {
        match self {
            FilterShape::Lowshelf => FilterType::Lowshelf,
            FilterShape::Peaking => FilterType::Peaking,
            FilterShape::Highshelf => FilterType::Highshelf,
        }
    }
}

/// Immutable configuration for one noise band.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoiseBand {
    /// Band name (e.g. "bass", "lowMids").
    pub name: String,
    /// Center frequency of the characteristic filter in Hz.
    pub center_hz: f64,
    /// Q factor of the characteristic filter.
    pub q: f64,
    /// Characteristic filter shape.
    pub shape: FilterShape,
    /// Low edge of the band's passband in Hz (highpass cutoff).
    pub pass_low_hz: f64,
    /// High edge of the band's passband in Hz (lowpass cutoff).
    pub pass_high_hz: f64,
    /// Band level in [0, 1]. Zero means the band is inactive.
    pub level: f64,
}

/// A band level of 0.5 maps to unity gain, matching the shipped preset's
/// volume scale.
pub const BAND_LEVEL_FULL_SCALE: f64 = 0.5;

impl NoiseBand {
    /// Linear gain for this band's configured level.
    pub fn gain(&self) -> f64 {
        if self.level <= 0.0 {
            0.0
        } else {
            self.level / BAND_LEVEL_FULL_SCALE
        }
    }

    /// Is this band audible at all?
    pub fn is_active(&self) -> bool {
        self.level > 0.0
    }
}

/// The fixed ordered set of bands forming the noise bed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseProfile {
    pub bands: Vec<NoiseBand>,
}

impl Default for NoiseProfile {
    /// The shipped "bass heavy" preset: bass at half level, everything
    /// else silent.
    fn default() -> Self {
        let band = |name: &str, center: f64, shape: FilterShape, low: f64, high: f64, level: f64| {
            NoiseBand {
                name: name.to_string(),
                center_hz: center,
                q: 0.7,
                shape,
                pass_low_hz: low,
                pass_high_hz: high,
                level,
            }
        };
        NoiseProfile {
            bands: vec![
                band("bass", 125.0, FilterShape::Lowshelf, 32.0, 500.0, 0.5),
                band("lowMids", 1000.0, FilterShape::Peaking, 500.0, 2000.0, 0.0),
                band("mids", 2500.0, FilterShape::Peaking, 1000.0, 4000.0, 0.0),
                band("highMids", 5000.0, FilterShape::Peaking, 2000.0, 8000.0, 0.0),
                band("treble", 10000.0, FilterShape::Highshelf, 4000.0, 16000.0, 0.0),
            ],
        }
    }
}

impl NoiseProfile {
    /// Bands with a nonzero level, in their fixed order.
    pub fn active_bands(&self) -> impl Iterator<Item = &NoiseBand> {
        self.bands.iter().filter(|b| b.is_active())
    }
}

/// A live voice for one band: the looped noise buffer routed through the
/// band's filter chain.
#[derive(Debug, Clone)]
pub struct NoiseVoice {
    buffer: Arc<Vec<f32>>,
    position: usize,
    low_cut: BiquadFilter,
    shaper: BiquadFilter,
    high_cut: BiquadFilter,
    gain: f64,
}

impl NoiseVoice {
    /// Build the chain for `band`. `start_offset` is the loop read position
    /// this voice begins at; giving each band its own offset keeps the
    /// bands decorrelated while sharing one cached buffer.
    pub fn new(band: &NoiseBand, buffer: Arc<Vec<f32>>, start_offset: usize, sample_rate: f64) -> Self {
        let mut low_cut = BiquadFilter::new(FilterType::Highpass, sample_rate);
        low_cut.set_frequency(band.pass_low_hz);
        low_cut.update_coefficients();

        let mut shaper = BiquadFilter::new(band.shape.filter_type(), sample_rate);
        shaper.set_frequency(band.center_hz);
        shaper.set_q(band.q);
        shaper.update_coefficients();

        let mut high_cut = BiquadFilter::new(FilterType::Lowpass, sample_rate);
        high_cut.set_frequency(band.pass_high_hz);
        high_cut.update_coefficients();

        let position = if buffer.is_empty() {
            0
        } else {
            start_offset % buffer.len()
        };

        NoiseVoice {
            buffer,
            position,
            low_cut,
            shaper,
            high_cut,
            gain: band.gain(),
        }
    }

    /// Generate the next sample of shaped noise.
    pub fn next_sample(&mut self) -> f64 {
        if self.buffer.is_empty() {
            return 0.0;
        }
        let raw = self.buffer[self.position] as f64;
        self.position += 1;
        if self.position >= self.buffer.len() {
            self.position = 0;
        }

        let s = self.low_cut.process(raw);
        let s = self.shaper.process(s);
        let s = self.high_cut.process(s);
        s * self.gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_has_five_bands() {
        let profile = NoiseProfile::default();
        assert_eq!(profile.bands.len(), 5);
        let names: Vec<&str> = profile.bands.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["bass", "lowMids", "mids", "highMids", "treble"]);
    }

    #[test]
    fn default_profile_only_bass_active() {
        let profile = NoiseProfile::default();
        let active: Vec<&str> = profile.active_bands().map(|b| b.name.as_str()).collect();
        assert_eq!(active, ["bass"]);
    }

    #[test]
    fn band_gain_scale() {
        let profile = NoiseProfile::default();
        let bass = &profile.bands[0];
        assert!((bass.gain() - 1.0).abs() < 1e-12, "level 0.5 is unity gain");
        assert_eq!(profile.bands[1].gain(), 0.0);
    }

    #[test]
    fn profile_json_round_trip() {
        let profile = NoiseProfile::default();
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"centerHz\""), "fields serialize camelCase: {json}");
        assert!(json.contains("\"lowshelf\""), "shapes serialize lowercase: {json}");

        let back: NoiseProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.bands.len(), 5);
        assert_eq!(back.bands[0].shape, FilterShape::Lowshelf);
        assert!((back.bands[0].level - 0.5).abs() < 1e-12);
    }

    #[test]
    fn voice_output_bounded() {
        let profile = NoiseProfile::default();
        let buffer: Arc<Vec<f32>> = Arc::new(
            (0..4410).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect(),
        );
        let mut voice = NoiseVoice::new(&profile.bands[0], buffer, 0, 44100.0);
        for i in 0..20000 {
            let s = voice.next_sample();
            assert!(s.is_finite(), "Noise voice output not finite at sample {i}");
            assert!(s.abs() < 10.0, "Noise voice output blew up: {s}");
        }
    }

    #[test]
    fn voice_loops_past_buffer_end() {
        let profile = NoiseProfile::default();
        let buffer: Arc<Vec<f32>> = Arc::new(vec![0.5; 100]);
        let mut voice = NoiseVoice::new(&profile.bands[0], buffer, 90, 44100.0);
        // Reading far past the end must wrap, not panic.
        for _ in 0..500 {
            voice.next_sample();
        }
    }
}
