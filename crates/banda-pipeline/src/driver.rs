//! Wideband driver loop.
//!
//! Owns the per-channel fan-out: one channelizer pass per input block, then
//! for every channel an optional rate conversion, a signal-estimate update,
//! an optional squelch gate, the decoder facade call, and finally the
//! cross-channel dedup at the event boundary.
//!
//! The driver is built for the acquisition-thread model: the whole chain
//! runs synchronously inside [`process_block`](WidebandDriver::process_block)
//! and never blocks, so it can live directly in a frontend sample callback.
//! Decoders are external collaborators behind the [`Decoder`] trait; the
//! driver feeds them interleaved IQ at their configured rate and collects
//! whatever events they emit.

use crate::config::PipelineConfig;
use crate::dedup::{Decision, DedupCache, fingerprint};
use crate::error::PipelineError;
use crate::event::DecodeEvent;
use crate::rssi::SignalEstimator;
use banda_channel::{Channelizer, Resampler};

/// Protocol decoder facade.
///
/// Implementations consume interleaved f32 IQ at the rate the channel was
/// configured for and return zero or more decoded events per block. State
/// (bit synchronizers, packet assemblers) lives inside the implementation
/// and persists across calls.
pub trait Decoder {
    /// Process one block of channel samples.
    fn process(&mut self, iq: &[f32]) -> Vec<DecodeEvent>;
}

/// A decode event tagged with the channel it came from.
#[derive(Debug, Clone)]
pub struct ChannelEvent {
    /// Channel index in natural FFT order.
    pub channel: usize,
    /// Center frequency of that channel in Hz.
    pub freq_hz: f32,
    /// The decoded event.
    pub event: DecodeEvent,
}

/// Everything owned per channel: the optional rate converter, the decoder
/// and the signal estimator.
struct ChannelStack {
    resampler: Option<Resampler>,
    decoder: Box<dyn Decoder>,
    estimator: SignalEstimator,
}

/// The assembled channelization pipeline.
///
/// Single-actor by construction: one logical owner calls
/// [`process_block`](Self::process_block); the dedup cache behind the event
/// boundary is thereby single-writer. Implementations that spread channels
/// across worker threads must keep each channel's state on one thread and
/// serialize the event boundary.
pub struct WidebandDriver {
    channelizer: Channelizer,
    channels: Vec<ChannelStack>,
    dedup: DedupCache,
    squelch_snr_db: Option<f32>,
}

impl WidebandDriver {
    /// Build the pipeline from a validated configuration and one decoder per
    /// channel (in natural FFT channel order).
    ///
    /// # Errors
    ///
    /// Configuration validation errors, channelizer/resampler construction
    /// errors, or [`PipelineError::DecoderCount`] when the decoder list does
    /// not match `config.num_channels`.
    pub fn new(
        config: &PipelineConfig,
        decoders: Vec<Box<dyn Decoder>>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        if decoders.len() != config.num_channels {
            return Err(PipelineError::DecoderCount {
                got: decoders.len(),
                want: config.num_channels,
            });
        }

        let channelizer = Channelizer::new(
            config.num_channels,
            config.center_hz,
            f64::from(config.input_rate_hz),
            config.max_block_samples,
        )?;

        // Largest per-channel block a process call can hand the resampler.
        let max_channel_samples = config.max_block_samples / channelizer.decimation() + 1;
        let channel_rate = config.channel_rate_hz();

        let channels = decoders
            .into_iter()
            .map(|decoder| {
                let resampler = match config.target_rate_hz {
                    Some(target) => Some(Resampler::new(channel_rate, target, max_channel_samples)?),
                    None => None,
                };
                Ok(ChannelStack {
                    resampler,
                    decoder,
                    estimator: SignalEstimator::new(),
                })
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        tracing::debug!(
            num_channels = config.num_channels,
            channel_rate_hz = channel_rate,
            target_rate_hz = ?config.target_rate_hz,
            squelch_snr_db = ?config.squelch_snr_db,
            "wideband driver assembled"
        );

        Ok(Self {
            channelizer,
            channels,
            dedup: DedupCache::new(),
            squelch_snr_db: config.squelch_snr_db,
        })
    }

    /// Run one block of wideband interleaved IQ through the whole chain and
    /// return the deduplicated events.
    ///
    /// `now_us` timestamps this block for the dedup window; any monotonic
    /// microsecond clock works as long as it is consistent across calls.
    /// Events arrive in channel order, and within a channel in the order the
    /// decoder emitted them.
    pub fn process_block(
        &mut self,
        input: &[f32],
        now_us: i64,
    ) -> Result<Vec<ChannelEvent>, PipelineError> {
        self.channelizer.process(input)?;

        let mut forwarded = Vec::new();
        for (k, stack) in self.channels.iter_mut().enumerate() {
            let channel_out = self.channelizer.channel_output(k);
            if channel_out.is_empty() {
                continue;
            }

            let samples: &[f32] = match stack.resampler.as_mut() {
                Some(resampler) => resampler.process(channel_out)?,
                None => channel_out,
            };

            stack.estimator.update(samples);
            if let Some(threshold) = self.squelch_snr_db {
                if stack.estimator.snr_db() < threshold {
                    continue;
                }
            }

            let freq_hz = self.channelizer.channel_center_hz(k);
            for event in stack.decoder.process(samples) {
                match self.dedup.check(fingerprint(&event), freq_hz, now_us) {
                    Decision::Forward => forwarded.push(ChannelEvent {
                        channel: k,
                        freq_hz,
                        event,
                    }),
                    Decision::Suppress => {}
                }
            }
        }
        Ok(forwarded)
    }

    /// The analyzer, for frequency-map and rate queries.
    pub fn channelizer(&self) -> &Channelizer {
        &self.channelizer
    }

    /// Smoothed RSSI of `channel` in dBFS.
    ///
    /// # Panics
    ///
    /// Panics if `channel` is out of range.
    pub fn channel_rssi_db(&self, channel: usize) -> f32 {
        self.channels[channel].estimator.rssi_db()
    }

    /// Noise-floor estimate of `channel` in dBFS.
    ///
    /// # Panics
    ///
    /// Panics if `channel` is out of range.
    pub fn channel_noise_db(&self, channel: usize) -> f32 {
        self.channels[channel].estimator.noise_floor_db()
    }

    /// SNR estimate of `channel` in dB.
    ///
    /// # Panics
    ///
    /// Panics if `channel` is out of range.
    pub fn channel_snr_db(&self, channel: usize) -> f32 {
        self.channels[channel].estimator.snr_db()
    }
}
