//! Error types for configuration and the driver loop.

use banda_channel::{ChannelizerError, ResamplerError};
use thiserror::Error;

/// Errors raised while loading or validating a pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Channel count outside the supported set.
    #[error("num_channels must be a power of two in [2, 16], got {0}")]
    InvalidChannelCount(usize),

    /// A rate field is zero or exceeds the signed 32-bit range.
    #[error("{field} must be nonzero and at most 2147483647, got {value}")]
    InvalidRate {
        /// Name of the offending configuration field.
        field: &'static str,
        /// The rejected value.
        value: u32,
    },

    /// Center frequency is not a finite number.
    #[error("center_hz must be finite, got {0}")]
    InvalidCenter(f64),

    /// Block size of zero would make the pipeline a no-op.
    #[error("max_block_samples must be nonzero")]
    InvalidBlockSize,

    /// The TOML document failed to parse.
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Errors raised by [`crate::WidebandDriver`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration rejected by validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The channelizer rejected its parameters or input.
    #[error(transparent)]
    Channelizer(#[from] ChannelizerError),

    /// A per-channel resampler rejected its parameters or input.
    #[error(transparent)]
    Resampler(#[from] ResamplerError),

    /// The decoder list does not match the channel count.
    #[error("got {got} decoders for {want} channels")]
    DecoderCount {
        /// Decoders supplied.
        got: usize,
        /// Channels configured.
        want: usize,
    },
}
