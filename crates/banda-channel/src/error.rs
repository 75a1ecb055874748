//! Error types for the multirate structures.

use thiserror::Error;

/// Errors reported by [`crate::Channelizer`].
#[derive(Debug, Error)]
pub enum ChannelizerError {
    /// Channel count is not a power of two in the supported range.
    #[error("channel count must be a power of two in [2, 16], got {0}")]
    InvalidChannelCount(usize),

    /// Wideband sample rate is zero, negative or not finite.
    #[error("sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f64),

    /// An interleaved IQ buffer had an odd number of f32 elements.
    #[error("interleaved IQ buffer length must be even, got {0}")]
    OddBufferLength(usize),

    /// A process call exceeded the block size the output buffers were sized for.
    #[error("input of {got} complex samples exceeds the configured maximum of {max}")]
    InputTooLong {
        /// Complex samples in the offending call.
        got: usize,
        /// `max_input_samples` the channelizer was built with.
        max: usize,
    },
}

/// Errors reported by [`crate::Resampler`].
#[derive(Debug, Error)]
pub enum ResamplerError {
    /// One of the rates is zero.
    #[error("sample rates must be nonzero")]
    ZeroRate,

    /// A rate does not fit in a signed 32-bit integer.
    #[error("sample rate {0} exceeds the supported maximum of 2147483647")]
    RateTooLarge(u32),

    /// `L · taps_per_branch` does not fit in memory-size arithmetic.
    #[error("interpolation factor {0} makes the polyphase filter size overflow")]
    FilterSizeOverflow(usize),

    /// The output buffer size computation overflowed.
    #[error("output sizing overflows for {0} maximum input samples")]
    OutputSizeOverflow(usize),

    /// An interleaved IQ buffer had an odd number of f32 elements.
    #[error("interleaved IQ buffer length must be even, got {0}")]
    OddBufferLength(usize),

    /// A process call exceeded the block size the output buffer was sized for.
    #[error("input of {got} complex samples exceeds the configured maximum of {max}")]
    InputTooLong {
        /// Complex samples in the offending call.
        got: usize,
        /// `max_input_samples` the resampler was built with.
        max: usize,
    },
}
