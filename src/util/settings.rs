// Copyright (c) 2024 Mike Tsao

//! Configuration for a render. Intended to be serialized, so that a driver
//! program can keep it in a file.

use crate::{
    audio::ByteWidth,
    error::{Error, Result},
    types::SampleRate,
};
use derivative::Derivative;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// How to turn a signal into PCM: at what rate, at what width, and how loud.
#[derive(Builder, Clone, Debug, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default, build_fn(validate = "Self::validate"))]
#[serde(rename_all = "kebab-case", default)]
pub struct RenderSettings {
    /// Samples per second.
    sample_rate: SampleRate,

    /// Bytes per quantized sample.
    byte_width: ByteWidth,

    /// The peak the rendered audio is scaled to. `None` leaves quiet audio
    /// alone and shrinks loud audio to full scale; `Some(0.0)` disables
    /// fitting entirely.
    #[derivative(Default(value = "Some(1.0)"))]
    #[builder(setter(strip_option))]
    max_amplitude: Option<f64>,

    /// Whether the children of a mix are realized on separate threads.
    #[derivative(Default(value = "true"))]
    parallel_mix: bool,
}
impl RenderSettingsBuilder {
    fn validate(&self) -> core::result::Result<(), String> {
        if let Some(Some(max_amplitude)) = self.max_amplitude {
            if !(0.0..=1.0).contains(&max_amplitude) {
                return Err(format!(
                    "max amplitude must be between 0.0 and 1.0, got {max_amplitude}"
                ));
            }
        }
        if let Some(sample_rate) = self.sample_rate {
            if sample_rate.0 == 0 {
                return Err("sample rate must be positive".to_string());
            }
        }
        Ok(())
    }
}
impl RenderSettings {
    #[allow(missing_docs)]
    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    #[allow(missing_docs)]
    pub fn byte_width(&self) -> ByteWidth {
        self.byte_width
    }

    #[allow(missing_docs)]
    pub fn max_amplitude(&self) -> Option<f64> {
        self.max_amplitude
    }

    #[allow(missing_docs)]
    pub fn parallel_mix(&self) -> bool {
        self.parallel_mix
    }

    /// Reads settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| Error::invalid_argument(format!("couldn't parse render settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Writes settings as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::invalid_argument(format!("couldn't serialize render settings: {e}")))
    }

    fn validate(&self) -> Result<()> {
        if let Some(max_amplitude) = self.max_amplitude {
            if !(0.0..=1.0).contains(&max_amplitude) {
                return Err(Error::invalid_argument(format!(
                    "max amplitude must be between 0.0 and 1.0, got {max_amplitude}"
                )));
            }
        }
        if self.sample_rate.0 == 0 {
            return Err(Error::invalid_argument("sample rate must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = RenderSettings::default();
        assert_eq!(s.sample_rate(), SampleRate(44100));
        assert_eq!(s.byte_width(), ByteWidth::Two);
        assert_eq!(s.max_amplitude(), Some(1.0));
        assert!(s.parallel_mix());

        assert_eq!(RenderSettingsBuilder::default().build().unwrap(), s);
    }

    #[test]
    fn builder_validates() {
        assert!(RenderSettingsBuilder::default()
            .max_amplitude(1.5)
            .build()
            .is_err());
        assert!(RenderSettingsBuilder::default()
            .sample_rate(SampleRate(0))
            .build()
            .is_err());
        let s = RenderSettingsBuilder::default()
            .sample_rate(SampleRate(8000))
            .byte_width(ByteWidth::Three)
            .max_amplitude(0.5)
            .parallel_mix(false)
            .build()
            .unwrap();
        assert_eq!(s.byte_width(), ByteWidth::Three);
        assert!(!s.parallel_mix());
    }

    #[test]
    fn json() {
        let s = RenderSettingsBuilder::default()
            .sample_rate(SampleRate(22050))
            .byte_width(ByteWidth::Four)
            .build()
            .unwrap();
        let json = s.to_json().unwrap();
        assert!(json.contains("\"byte-width\": 4"));
        assert_eq!(RenderSettings::from_json(&json).unwrap(), s);

        let partial = RenderSettings::from_json(r#"{ "sample-rate": 8000 }"#).unwrap();
        assert_eq!(partial.sample_rate(), SampleRate(8000));
        assert_eq!(partial.max_amplitude(), Some(1.0));

        assert!(RenderSettings::from_json(r#"{ "byte-width": 5 }"#).is_err());
        assert!(RenderSettings::from_json(r#"{ "max-amplitude": -1.0 }"#).is_err());
    }
}
