//! Pipeline configuration surface.
//!
//! The handful of knobs the channelization core consumes, loadable from a
//! TOML document. Everything else the core depends on is a fixed design
//! constant and deliberately not configurable: the dedup window
//! ([`crate::dedup::DEDUP_WINDOW_US`]) and cache size
//! ([`crate::dedup::DEDUP_CACHE_CAPACITY`]), the prototype filter
//! semi-length ([`banda_channel::FILTER_SEMI_LENGTH`]), its stopband
//! ([`banda_channel::STOPBAND_DB`]) and the usable-bandwidth fraction
//! ([`banda_channel::CUTOFF_RATIO`]).
//!
//! # Example
//!
//! ```rust
//! use banda_pipeline::PipelineConfig;
//!
//! let config = PipelineConfig::from_toml_str(
//!     r#"
//!     num_channels = 8
//!     center_hz = 868.3e6
//!     input_rate_hz = 2500000
//!     target_rate_hz = 250000
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.num_channels, 8);
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

fn default_block_samples() -> usize {
    65_536
}

/// Configuration consumed by [`crate::WidebandDriver`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Channels produced by the analyzer; power of two in `[2, 16]`.
    pub num_channels: usize,

    /// RF center frequency in Hz, passed through to the channel frequency
    /// map.
    pub center_hz: f64,

    /// Wideband input sample rate in Hz.
    pub input_rate_hz: u32,

    /// Decoder sample rate per channel. When equal to the channel rate
    /// `input_rate_hz / (num_channels/2)` the per-channel resampler runs in
    /// passthrough; when absent, channels are fed to decoders at the channel
    /// rate directly with no resampler at all.
    #[serde(default)]
    pub target_rate_hz: Option<u32>,

    /// Squelch threshold: channels whose block SNR estimate is below this
    /// value skip their decoder. Absent means no squelch.
    #[serde(default)]
    pub squelch_snr_db: Option<f32>,

    /// Largest block (in complex samples) a single driver call will be
    /// given; sizes the channelizer and resampler buffers.
    #[serde(default = "default_block_samples")]
    pub max_block_samples: usize,
}

impl PipelineConfig {
    /// Parse a TOML document. The result is not yet validated; the driver
    /// validates on construction, or call [`validate`](Self::validate)
    /// directly.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Check every field against the ranges the core supports.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=16).contains(&self.num_channels) || !self.num_channels.is_power_of_two() {
            return Err(ConfigError::InvalidChannelCount(self.num_channels));
        }
        if !self.center_hz.is_finite() {
            return Err(ConfigError::InvalidCenter(self.center_hz));
        }
        check_rate("input_rate_hz", self.input_rate_hz)?;
        if let Some(target) = self.target_rate_hz {
            check_rate("target_rate_hz", target)?;
        }
        if self.max_block_samples == 0 {
            return Err(ConfigError::InvalidBlockSize);
        }
        Ok(())
    }

    /// Per-channel output rate of the analyzer, `input_rate / (M/2)`.
    pub fn channel_rate_hz(&self) -> u32 {
        self.input_rate_hz / (self.num_channels as u32 / 2)
    }
}

fn check_rate(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if value == 0 || value > i32::MAX as u32 {
        return Err(ConfigError::InvalidRate { field, value });
    }
    Ok(())
}
