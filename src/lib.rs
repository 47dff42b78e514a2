pub mod alarm;
pub mod countdown;
pub mod error;
pub mod signal;

use crate::signal::noise::NoiseProfile;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the focusbell-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: render one bell chime to mono f32 samples for
/// AudioWorklet playback.
#[wasm_bindgen]
pub fn chime_samples(sample_rate: u32) -> Result<Vec<f32>, JsValue> {
    signal::renderer::chime_samples(sample_rate).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: render one bell chime to a WAV byte array.
#[wasm_bindgen]
pub fn chime_wav(sample_rate: u32) -> Result<Vec<u8>, JsValue> {
    signal::renderer::chime_wav(sample_rate).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: render the noise bed to mono f32 samples. `profile` is
/// a JSON NoiseProfile; pass null/undefined for the shipped default.
#[wasm_bindgen]
pub fn noise_samples(profile: JsValue, seconds: f64, sample_rate: u32) -> Result<Vec<f32>, JsValue> {
    let profile: NoiseProfile = if profile.is_null() || profile.is_undefined() {
        NoiseProfile::default()
    } else {
        serde_wasm_bindgen::from_value(profile).map_err(|e| JsValue::from_str(&format!("{e}")))?
    };
    signal::renderer::noise_samples(&profile, seconds, sample_rate)
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}
