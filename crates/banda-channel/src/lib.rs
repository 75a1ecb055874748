//! Banda Channel - multirate front half of the wideband receiver.
//!
//! Two structures that together turn one wideband IQ stream into per-decoder
//! narrowband streams:
//!
//! - [`Channelizer`] - 2× oversampled M-channel polyphase filter-bank
//!   analyzer; splits the wideband stream into overlapping channels at
//!   `fs / (M/2)` each
//! - [`Resampler`] - rational L/M polyphase converter; rate-matches a
//!   channel to its decoder's required sample rate, or passes through when
//!   the rates already agree
//!
//! Sample buffers are interleaved f32 IQ (`[I0, Q0, I1, Q1, ...]`) on both
//! sides; lengths are counted in f32 elements, so every buffer has an even
//! length.
//!
//! # Ownership and threading
//!
//! Both structures are pure compute and never block, but neither is
//! internally synchronized: each instance is owned and driven by exactly one
//! logical actor at a time. The reference pipeline runs the whole chain on
//! the acquisition thread; spreading channels across workers is fine as long
//! as each per-channel state stays with one thread.
//!
//! Within one channel, outputs are strictly ordered and gap-free across
//! `process` calls: commutator position, window contents and resampler phase
//! all persist, so block boundaries are invisible in the output streams.

pub mod channelizer;
pub mod error;
pub mod resampler;

mod ring;

pub use channelizer::{
    CUTOFF_RATIO, Channelizer, FILTER_SEMI_LENGTH, MAX_CHANNELS, MIN_CHANNELS, STOPBAND_DB,
};
pub use error::{ChannelizerError, ResamplerError};
pub use resampler::{RESAMPLER_STOPBAND_DB, Resampler, TAPS_PER_BRANCH};
