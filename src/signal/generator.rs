//! Signal generator — chime and noise-bed synthesis over one shared
//! audio context.
//!
//! Two independent synthesis paths share the lazily-created context: the
//! fire-and-forget bell chime (one ephemeral voice per call, self-
//! terminating) and the looped noise bed (one voice per active band,
//! faded in and out through a single master gain). The platform audio
//! callback pulls mixed samples through [`SignalGenerator::render`].

use std::sync::Arc;

use crate::error::SignalError;

use super::backend::{AudioBackend, AudioContext, FixedRateBackend};
use super::mixer::Mixer;
use super::noise::{NoiseBand, NoiseProfile, NoiseVoice};
use super::tone::{BellTone, ToneVoice};

/// Master level the noise bed fades up to.
pub const NOISE_TARGET_LEVEL: f64 = 0.5;
/// Fade-in window in seconds.
pub const FADE_IN_SECONDS: f64 = 1.0;
/// Fade-out window in seconds.
pub const FADE_OUT_SECONDS: f64 = 0.5;
/// Near-silent floor the exponential fades start from and end at.
const FADE_FLOOR: f64 = 0.001;

/// Noise bed lifecycle. Voices exist in every state but `Stopped`;
/// teardown is deferred until the fade-out window has fully rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoiseState {
    Stopped,
    FadingIn,
    Playing,
    FadingOut,
}

/// An exponential gain ramp, advanced once per rendered sample.
#[derive(Debug, Clone)]
struct ExpRamp {
    value: f64,
    target: f64,
    coeff: f64,
    remaining: usize,
}

impl ExpRamp {
    fn new(start: f64, target: f64, seconds: f64, sample_rate: f64) -> Self {
        let start = start.max(FADE_FLOOR);
        let target = target.max(FADE_FLOOR);
        let remaining = (seconds * sample_rate) as usize;
        let coeff = if remaining == 0 {
            1.0
        } else {
            (target / start).powf(1.0 / remaining as f64)
        };
        ExpRamp {
            value: start,
            target,
            coeff,
            remaining,
        }
    }

    fn next_value(&mut self) -> f64 {
        if self.remaining == 0 {
            return self.target;
        }
        self.value *= self.coeff;
        self.remaining -= 1;
        if self.remaining == 0 {
            self.value = self.target;
        }
        self.value
    }

    fn is_done(&self) -> bool {
        self.remaining == 0
    }
}

/// The signal generator. Owns the audio context, the mute flag, and all
/// live voices. Not observable from outside except through the snapshot
/// getters; all mutation goes through the contract methods.
pub struct SignalGenerator {
    backend: Box<dyn AudioBackend>,
    context: Option<AudioContext>,
    /// Set after the first failed context open; later sound calls are
    /// silent no-ops instead of repeated errors.
    env_failed: bool,
    muted: bool,

    tone: BellTone,
    tone_voices: Vec<ToneVoice>,

    profile: NoiseProfile,
    noise_voices: Vec<NoiseVoice>,
    noise_state: NoiseState,
    noise_gain: f64,
    fade: Option<ExpRamp>,

    mixer: Mixer,
}

impl SignalGenerator {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        SignalGenerator {
            backend,
            context: None,
            env_failed: false,
            muted: false,
            tone: BellTone::default(),
            tone_voices: Vec::new(),
            profile: NoiseProfile::default(),
            noise_voices: Vec::new(),
            noise_state: NoiseState::Stopped,
            noise_gain: FADE_FLOOR,
            fade: None,
            mixer: Mixer::new(),
        }
    }

    /// Generator over the default fixed-rate backend (44.1 kHz).
    pub fn with_defaults() -> Self {
        SignalGenerator::new(Box::new(FixedRateBackend::default()))
    }

    // ── External flags ──────────────────────────────────────

    /// The externally-persisted mute flag. Gates the chime only; the
    /// noise bed has its own toggle.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    /// Replace the noise profile. Takes effect at the next noise start.
    pub fn set_profile(&mut self, profile: NoiseProfile) {
        self.profile = profile;
    }

    /// Replace the chime timbre. Takes effect at the next chime.
    pub fn set_tone(&mut self, tone: BellTone) {
        self.tone = tone;
    }

    // ── Bell chime ──────────────────────────────────────────

    /// Synthesize one bell chime. Fire-and-forget: the voice decays on
    /// its own and needs no stop call. When muted, succeeds without
    /// creating any voice. Overlapping chimes mix additively.
    pub fn chime(&mut self) -> Result<(), SignalError> {
        if self.muted {
            return Ok(());
        }
        if !self.ensure_context()? {
            return Ok(());
        }
        let sample_rate = match self.context.as_ref() {
            Some(ctx) => ctx.sample_rate(),
            None => return Ok(()),
        };
        self.tone_voices.push(ToneVoice::new(&self.tone, sample_rate));
        Ok(())
    }

    // ── Noise bed ───────────────────────────────────────────

    /// Start the noise bed: one looped voice chain per nonzero-level
    /// band, faded in exponentially from near-silence. No-op while the
    /// bed is already fading in or playing. Starting during a pending
    /// teardown drops the stale voices and begins fresh.
    pub fn start_noise(&mut self) -> Result<(), SignalError> {
        match self.noise_state {
            NoiseState::FadingIn | NoiseState::Playing => return Ok(()),
            NoiseState::Stopped | NoiseState::FadingOut => {}
        }
        if !self.ensure_context()? {
            return Ok(());
        }

        // Stale handles from an unfinished fade-out.
        self.noise_voices.clear();

        let bands: Vec<NoiseBand> = self.profile.active_bands().cloned().collect();
        let Some(ctx) = self.context.as_mut() else {
            return Ok(());
        };
        let sample_rate = ctx.sample_rate();
        let buffer = ctx.noise_buffer();

        let mut voices = Vec::with_capacity(bands.len());
        for band in &bands {
            let offset = ctx.random_offset(buffer.len());
            voices.push(NoiseVoice::new(band, Arc::clone(&buffer), offset, sample_rate));
        }

        self.noise_voices = voices;
        self.noise_gain = FADE_FLOOR;
        self.fade = Some(ExpRamp::new(
            FADE_FLOOR,
            NOISE_TARGET_LEVEL,
            FADE_IN_SECONDS,
            sample_rate,
        ));
        self.noise_state = NoiseState::FadingIn;
        Ok(())
    }

    /// Fade the noise bed out. Voice teardown happens only after the
    /// fade window has rendered, so no click from a hard stop. No-op
    /// when stopped or already fading out.
    pub fn stop_noise(&mut self) {
        match self.noise_state {
            NoiseState::Stopped | NoiseState::FadingOut => {}
            NoiseState::FadingIn | NoiseState::Playing => {
                let sample_rate = match self.context.as_ref() {
                    Some(ctx) => ctx.sample_rate(),
                    None => {
                        // No context means nothing is audible; stop hard.
                        self.teardown_noise();
                        return;
                    }
                };
                self.fade = Some(ExpRamp::new(
                    self.noise_gain,
                    FADE_FLOOR,
                    FADE_OUT_SECONDS,
                    sample_rate,
                ));
                self.noise_state = NoiseState::FadingOut;
            }
        }
    }

    /// Single-toggle surface for the UI: start when stopped, stop when
    /// audible. Toggling again mid-fade hits the corresponding no-op
    /// guard, so rapid toggling can neither deadlock nor double-schedule.
    pub fn toggle_noise(&mut self) -> Result<(), SignalError> {
        if self.noise_playing() {
            self.stop_noise();
            Ok(())
        } else {
            self.start_noise()
        }
    }

    /// Is the noise bed audible (anywhere between fade-in start and
    /// teardown)?
    pub fn noise_playing(&self) -> bool {
        self.noise_state != NoiseState::Stopped
    }

    fn teardown_noise(&mut self) {
        self.noise_voices.clear();
        self.fade = None;
        self.noise_gain = FADE_FLOOR;
        self.noise_state = NoiseState::Stopped;
    }

    // ── Rendering ───────────────────────────────────────────

    /// Fill `out` with the mixed output of all live voices. This is the
    /// pull point for the platform's real-time audio callback; fades and
    /// voice lifetimes advance in sample time here. Writes silence when
    /// no context exists.
    pub fn render(&mut self, out: &mut [f32]) {
        let n = out.len();
        if self.context.is_none() {
            out.fill(0.0);
            return;
        }

        self.mixer.clear(n);

        for voice in self.tone_voices.iter_mut() {
            for i in 0..n {
                self.mixer.add(i, voice.next_sample());
            }
        }

        let mut fade_done = false;
        if self.noise_state != NoiseState::Stopped {
            for i in 0..n {
                let mut sum = 0.0;
                for voice in self.noise_voices.iter_mut() {
                    sum += voice.next_sample();
                }
                if let Some(fade) = self.fade.as_mut() {
                    self.noise_gain = fade.next_value();
                    if fade.is_done() {
                        fade_done = true;
                    }
                }
                self.mixer.add(i, sum * self.noise_gain);
            }
        }

        self.mixer.write_to(out);

        self.tone_voices.retain(|v| !v.is_finished());
        if fade_done {
            match self.noise_state {
                NoiseState::FadingIn => {
                    self.fade = None;
                    self.noise_state = NoiseState::Playing;
                }
                NoiseState::FadingOut => self.teardown_noise(),
                _ => {}
            }
        }
    }

    // ── Snapshots for tests and embedders ───────────────────

    /// Number of live chime voices.
    pub fn tone_voice_count(&self) -> usize {
        self.tone_voices.len()
    }

    /// Number of live noise band voices.
    pub fn noise_voice_count(&self) -> usize {
        self.noise_voices.len()
    }

    /// Sample rate of the live context, if one exists.
    pub fn sample_rate(&self) -> Option<f64> {
        self.context.as_ref().map(|c| c.sample_rate())
    }

    /// Lazily open the audio context. `Ok(true)`: a context is live.
    /// `Ok(false)`: the environment already failed, degrade silently.
    /// `Err`: the first failure, reported exactly once.
    fn ensure_context(&mut self) -> Result<bool, SignalError> {
        if self.context.is_some() {
            return Ok(true);
        }
        if self.env_failed {
            return Ok(false);
        }
        match self.backend.open() {
            Ok(ctx) => {
                self.context = Some(ctx);
                Ok(true)
            }
            Err(e) => {
                self.env_failed = true;
                log::warn!("audio context unavailable, sound disabled: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::backend::UnavailableBackend;
    use crate::signal::noise::FilterShape;

    const TEST_RATE: f64 = 1000.0;

    fn generator() -> SignalGenerator {
        SignalGenerator::new(Box::new(FixedRateBackend::new(TEST_RATE)))
    }

    fn render_seconds(g: &mut SignalGenerator, seconds: f64) -> Vec<f32> {
        let mut out = vec![0.0_f32; (seconds * TEST_RATE) as usize];
        g.render(&mut out);
        out
    }

    #[test]
    fn chime_creates_one_voice() {
        let mut g = generator();
        g.chime().unwrap();
        assert_eq!(g.tone_voice_count(), 1);
    }

    #[test]
    fn chimes_overlap_additively() {
        let mut g = generator();
        g.chime().unwrap();
        g.chime().unwrap();
        assert_eq!(g.tone_voice_count(), 2);
    }

    #[test]
    fn chime_voice_reaped_after_decay() {
        let mut g = generator();
        g.chime().unwrap();
        render_seconds(&mut g, 2.6); // past the 2.5s decay window
        assert_eq!(g.tone_voice_count(), 0, "Finished chime should be reaped");
    }

    #[test]
    fn muted_chime_succeeds_without_voice() {
        let mut g = generator();
        g.set_muted(true);
        g.chime().unwrap();
        assert_eq!(g.tone_voice_count(), 0);
    }

    #[test]
    fn unavailable_backend_reports_once_then_noops() {
        let mut g = SignalGenerator::new(Box::new(UnavailableBackend));
        let first = g.chime();
        assert!(matches!(
            first,
            Err(SignalError::EnvironmentUnavailable { .. })
        ));
        // Subsequent calls degrade to silent no-ops.
        assert!(g.chime().is_ok());
        assert!(g.start_noise().is_ok());
        assert_eq!(g.tone_voice_count(), 0);
        assert_eq!(g.noise_voice_count(), 0);
    }

    #[test]
    fn render_without_context_is_silent() {
        let mut g = SignalGenerator::new(Box::new(UnavailableBackend));
        let mut out = vec![1.0_f32; 64];
        g.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn default_profile_starts_one_voice() {
        // Bass-only default: exactly one band chain.
        let mut g = generator();
        g.start_noise().unwrap();
        assert_eq!(g.noise_voice_count(), 1);
        assert!(g.noise_playing());
    }

    #[test]
    fn start_noise_idempotent() {
        let mut g = generator();
        g.start_noise().unwrap();
        g.start_noise().unwrap();
        assert_eq!(g.noise_voice_count(), 1, "Double start must not double voices");
    }

    #[test]
    fn all_bands_active_starts_five_voices() {
        let mut g = generator();
        let mut profile = NoiseProfile::default();
        for band in profile.bands.iter_mut() {
            band.level = 0.25;
        }
        g.set_profile(profile);
        g.start_noise().unwrap();
        assert_eq!(g.noise_voice_count(), 5);
    }

    #[test]
    fn noise_fades_in_then_plays() {
        let mut g = generator();
        g.start_noise().unwrap();
        // Render past the 1s fade-in window.
        render_seconds(&mut g, 1.1);
        assert!(g.noise_playing());
        let out = render_seconds(&mut g, 0.5);
        let max = out.iter().fold(0.0_f32, |m, &s| m.max(s.abs()));
        assert!(max > 0.001, "Noise bed should be audible once playing, max={max}");
    }

    #[test]
    fn stop_noise_defers_teardown_until_fade_rendered() {
        let mut g = generator();
        g.start_noise().unwrap();
        render_seconds(&mut g, 1.1);
        g.stop_noise();
        // Teardown has not happened yet: voices survive the fade window.
        assert!(g.noise_playing());
        assert_eq!(g.noise_voice_count(), 1);

        render_seconds(&mut g, 0.6); // past the 0.5s fade-out window
        assert!(!g.noise_playing());
        assert_eq!(g.noise_voice_count(), 0, "Voices must be released after the fade");

        let out = render_seconds(&mut g, 0.2);
        assert!(out.iter().all(|&s| s == 0.0), "Silence after teardown");
    }

    #[test]
    fn stop_before_fade_in_completes_still_reaches_silence() {
        let mut g = generator();
        g.start_noise().unwrap();
        render_seconds(&mut g, 0.3); // mid fade-in
        g.stop_noise();
        render_seconds(&mut g, 0.6);
        assert!(!g.noise_playing());
        assert_eq!(g.noise_voice_count(), 0, "No leaked looping voices");
    }

    #[test]
    fn stop_noise_idempotent() {
        let mut g = generator();
        g.stop_noise(); // from Stopped: no-op
        assert!(!g.noise_playing());

        g.start_noise().unwrap();
        render_seconds(&mut g, 1.1);
        g.stop_noise();
        g.stop_noise(); // from FadingOut: no-op, does not restart the fade
        render_seconds(&mut g, 0.6);
        assert!(!g.noise_playing());
    }

    #[test]
    fn restart_during_fade_out_is_fresh_start() {
        let mut g = generator();
        g.start_noise().unwrap();
        render_seconds(&mut g, 1.1);
        g.stop_noise();
        // Toggle back on while the teardown is still pending.
        g.start_noise().unwrap();
        assert!(g.noise_playing());
        assert_eq!(g.noise_voice_count(), 1, "Fresh start replaces stale voices");

        // And the bed keeps playing past where the old teardown would
        // have landed.
        render_seconds(&mut g, 1.5);
        assert!(g.noise_playing());
        assert_eq!(g.noise_voice_count(), 1);
    }

    #[test]
    fn toggle_tracks_playing_flag() {
        let mut g = generator();
        g.toggle_noise().unwrap();
        assert!(g.noise_playing());
        render_seconds(&mut g, 1.1);

        g.toggle_noise().unwrap();
        assert!(g.noise_playing(), "Still audible through the fade-out");
        render_seconds(&mut g, 0.6);
        assert!(!g.noise_playing());

        // Rapid toggling: on, off mid-fade-in, then once more while the
        // flag is still true. The third toggle lands on the stop branch
        // and stays a no-op rather than double-scheduling a teardown.
        g.toggle_noise().unwrap();
        g.toggle_noise().unwrap();
        g.toggle_noise().unwrap();
        render_seconds(&mut g, 0.6);
        assert!(!g.noise_playing());
        assert_eq!(g.noise_voice_count(), 0);
    }

    #[test]
    fn custom_band_shape_accepted() {
        let mut g = generator();
        let mut profile = NoiseProfile::default();
        profile.bands[4].level = 0.4;
        profile.bands[4].shape = FilterShape::Highshelf;
        g.set_profile(profile);
        g.start_noise().unwrap();
        assert_eq!(g.noise_voice_count(), 2); // bass + treble
    }

    #[test]
    fn chime_and_noise_share_one_context() {
        let mut g = generator();
        g.chime().unwrap();
        let sr = g.sample_rate().unwrap();
        g.start_noise().unwrap();
        assert_eq!(g.sample_rate().unwrap(), sr);
    }
}
