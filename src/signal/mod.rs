//! Signal generator — pure Rust audio synthesis for the focus timer.
//!
//! All DSP runs in Rust for deterministic, cross-platform audio output.
//! The same code powers both the WebAudio path (via AudioWorklet + WASM)
//! and native offline rendering (WAV export). Two synthesis paths share
//! one lazily-created audio context: the fire-and-forget bell chime and
//! the band-filtered ambient noise bed.

pub mod backend;
pub mod envelope;
pub mod filter;
pub mod generator;
pub mod mixer;
pub mod noise;
pub mod oscillator;
pub mod renderer;
pub mod tone;

pub use backend::{AudioBackend, AudioContext, FixedRateBackend, UnavailableBackend};
pub use generator::SignalGenerator;
pub use noise::{FilterShape, NoiseBand, NoiseProfile};
pub use tone::BellTone;
