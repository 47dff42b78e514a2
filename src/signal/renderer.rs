//! Offline renderer — chime and noise rendered to sample buffers or WAV
//! bytes.
//!
//! This is the export surface the browser pulls AudioWorklet buffers
//! from, and doubles as an offline WAV path for native hosts.

use crate::error::SignalError;

use super::backend::FixedRateBackend;
use super::generator::SignalGenerator;
use super::noise::NoiseProfile;
use super::tone::BellTone;

/// Render one bell chime to mono f32 samples at `sample_rate`. The buffer
/// covers the full attack + decay window.
pub fn chime_samples(sample_rate: u32) -> Result<Vec<f32>, SignalError> {
    let mut generator =
        SignalGenerator::new(Box::new(FixedRateBackend::new(sample_rate as f64)));
    generator.chime()?;

    let total = (BellTone::default().duration * sample_rate as f64) as usize;
    let mut out = vec![0.0_f32; total];
    generator.render(&mut out);
    Ok(out)
}

/// Render one bell chime to a WAV byte buffer (16-bit stereo PCM).
pub fn chime_wav(sample_rate: u32) -> Result<Vec<u8>, SignalError> {
    let mono = chime_samples(sample_rate)?;
    Ok(encode_wav(&to_pcm_i16_stereo(&mono), sample_rate, 2))
}

/// Render `seconds` of the noise bed (including its fade-in) to mono f32
/// samples at `sample_rate`.
pub fn noise_samples(
    profile: &NoiseProfile,
    seconds: f64,
    sample_rate: u32,
) -> Result<Vec<f32>, SignalError> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(SignalError::invalid(format!(
            "noise render length must be positive, got {seconds}"
        )));
    }

    let mut generator =
        SignalGenerator::new(Box::new(FixedRateBackend::new(sample_rate as f64)));
    generator.set_profile(profile.clone());
    generator.start_noise()?;

    let total = (seconds * sample_rate as f64) as usize;
    let mut out = vec![0.0_f32; total];
    generator.render(&mut out);
    Ok(out)
}

/// Duplicate mono f32 samples into interleaved stereo i16 PCM.
fn to_pcm_i16_stereo(samples: &[f32]) -> Vec<i16> {
    let mut stereo = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let sample = (s as f64 * 32767.0).round().clamp(-32768.0, 32767.0) as i16;
        stereo.push(sample); // L
        stereo.push(sample); // R
    }
    stereo
}

/// Encode interleaved i16 PCM samples to a WAV byte buffer.
fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = (samples.len() * 2) as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chime_is_not_silent() {
        let samples = chime_samples(22050).unwrap();
        let max = samples.iter().fold(0.0_f32, |m, &s| m.max(s.abs()));
        assert!(max > 0.01, "Chime should be audible, max={max}");
    }

    #[test]
    fn chime_decays_to_near_silence() {
        let samples = chime_samples(22050).unwrap();
        // The last 2% of the buffer sits at the very end of the decay.
        let tail_start = samples.len() - samples.len() / 50;
        let tail_max = samples[tail_start..]
            .iter()
            .fold(0.0_f32, |m, &s| m.max(s.abs()));
        assert!(
            tail_max < 0.01,
            "Chime tail should be near-silent, max={tail_max}"
        );
    }

    #[test]
    fn chime_length_covers_decay_window() {
        let samples = chime_samples(22050).unwrap();
        // Default duration is 2.5s.
        assert_eq!(samples.len(), (2.5 * 22050.0) as usize);
    }

    #[test]
    fn wav_header_valid() {
        let wav = chime_wav(22050).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");

        let sr = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
        assert_eq!(sr, 22050);

        let ch = u16::from_le_bytes([wav[22], wav[23]]);
        assert_eq!(ch, 2);
    }

    #[test]
    fn wav_size_correct() {
        let wav = chime_wav(22050).unwrap();
        let samples = (2.5 * 22050.0) as usize;
        // stereo * 2 bytes per sample
        let expected_data = (samples * 2 * 2) as u32;
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size, expected_data);
        assert_eq!(wav.len(), 44 + expected_data as usize);
    }

    #[test]
    fn noise_render_length_and_content() {
        let samples = noise_samples(&NoiseProfile::default(), 2.0, 8000).unwrap();
        assert_eq!(samples.len(), 16000);
        // The second half sits past the 1s fade-in and must be audible.
        let max = samples[8000..]
            .iter()
            .fold(0.0_f32, |m, &s| m.max(s.abs()));
        assert!(max > 0.001, "Noise should be audible after fade-in, max={max}");
    }

    #[test]
    fn noise_rejects_nonpositive_length() {
        let err = noise_samples(&NoiseProfile::default(), 0.0, 8000).unwrap_err();
        assert!(matches!(err, SignalError::InvalidConfiguration { .. }));
        assert!(noise_samples(&NoiseProfile::default(), -1.0, 8000).is_err());
    }

    #[test]
    fn zero_sample_rate_is_environment_error() {
        let err = chime_samples(0).unwrap_err();
        assert!(matches!(err, SignalError::EnvironmentUnavailable { .. }));
    }
}
