//! Banda Pipeline - stream glue for the wideband receiver.
//!
//! Assembles the multirate structures from [`banda_channel`] into the
//! running receive chain:
//!
//! - [`WidebandDriver`] - the per-block fan-out: channelize, rate-convert,
//!   estimate, squelch, decode, dedup
//! - [`Decoder`] - the facade protocol decoders implement
//! - [`DecodeEvent`] / [`Value`] - the ordered key/value record decoders
//!   emit
//! - [`DedupCache`] / [`fingerprint`] - cross-channel duplicate suppression
//! - [`SignalEstimator`] - per-channel RSSI and noise-floor tracking
//! - [`PipelineConfig`] - the TOML-loadable configuration surface
//!
//! # Threading model
//!
//! The reference deployment runs the entire chain on the acquisition thread:
//! the frontend's sample callback hands each block to
//! [`WidebandDriver::process_block`], which is pure compute and returns the
//! block's surviving events. Nothing here spawns threads or blocks; any
//! fan-out to workers is the embedder's choice, under the constraint that
//! per-channel state and the dedup cache each stay with a single logical
//! actor.

pub mod config;
pub mod dedup;
pub mod driver;
pub mod error;
pub mod event;
pub mod rssi;

pub use config::PipelineConfig;
pub use dedup::{
    DEDUP_CACHE_CAPACITY, DEDUP_WINDOW_US, Decision, DedupCache, SAME_CHANNEL_EPSILON_HZ,
    fingerprint,
};
pub use driver::{ChannelEvent, Decoder, WidebandDriver};
pub use error::{ConfigError, PipelineError};
pub use event::{DecodeEvent, Value, ValueKind};
pub use rssi::SignalEstimator;
