//! 2× oversampled polyphase filter-bank analyzer.
//!
//! Splits one wideband complex baseband stream into `M` equally spaced
//! narrowband channels, each at `fs / (M/2)`. Because the commutator advances
//! by `M/2` input samples per transform instead of `M`, adjacent channels
//! overlap by half a channel width: a signal sitting on a channel boundary is
//! received by both neighbors instead of falling into a dead zone.
//!
//! # Structure
//!
//! A Kaiser-windowed sinc prototype of length `2·M·m + 1` (m = 24 symbols
//! semi-length, 80 dB stopband, cutoff at `0.9/M` cycles per sample) is
//! sliced into `M` branches of `2·m` taps. Each input sample is pushed into
//! one branch's circular window by a decrementing commutator cursor; every
//! `M/2` pushes, all `M` branch dot products are taken, an `M`-point FFT
//! converts the branch vector into channel samples, and the known
//! `exp(-jπkn)` rotation of the oversampled commutator is corrected by
//! negating odd channels on odd output indices.
//!
//! Channel centers follow natural FFT order: bin 0 at the stream center,
//! bins `1..M/2` at positive offsets of `fs/M`, bin `M/2` at the Nyquist
//! offset, bins `M/2+1..M-1` at negative offsets.
//!
//! Reference: f. j. harris, *Multirate Signal Processing for Communication
//! Systems*, Prentice Hall, 2004, Chapter 9 (polyphase channelizers).
//!
//! # Example
//!
//! ```rust
//! use banda_channel::Channelizer;
//!
//! // Split a 2.5 MS/s stream into 8 channels of 625 kS/s each.
//! let mut chan = Channelizer::new(8, 868.3e6, 2_500_000.0, 4096).unwrap();
//! let block = vec![0.0f32; 2 * 4096];
//! let produced = chan.process(&block).unwrap();
//! assert_eq!(produced, 1024);
//! assert_eq!(chan.channel_output(1).len(), 2 * 1024);
//! ```

use crate::ChannelizerError;
use crate::ring::ring_dot_iq;
use banda_dsp::{FftPlan, design_lowpass};

/// Prototype filter semi-length in symbols; each branch gets `2·m` taps.
pub const FILTER_SEMI_LENGTH: usize = 24;

/// Prototype stopband attenuation in dB.
pub const STOPBAND_DB: f64 = 80.0;

/// Fraction of the channel spacing that is usable passband.
pub const CUTOFF_RATIO: f64 = 0.9;

/// Smallest supported channel count.
pub const MIN_CHANNELS: usize = 2;

/// Largest supported channel count.
pub const MAX_CHANNELS: usize = 16;

/// Polyphase filter-bank analyzer with 2× channel oversampling.
///
/// Owns the prototype coefficients (reversed per branch), the per-branch
/// circular windows (split I/Q), the FFT plan and scratch, and one output
/// buffer per channel. Created once per stream configuration; the channel
/// count is fixed for the lifetime of the stream.
///
/// Not shared across threads: one logical actor owns and drives the
/// channelizer at a time.
pub struct Channelizer {
    num_channels: usize,
    decimation: usize,
    center_hz: f64,
    fs_hz: f64,
    max_input_samples: usize,

    /// Branch coefficients, `[branch][tap]`, each branch reversed so the
    /// forward dot product reads the window oldest-first.
    coeffs: Vec<f32>,
    taps_per_branch: usize,

    /// Split I/Q circular windows, `[branch][window_alloc]`.
    win_i: Vec<f32>,
    win_q: Vec<f32>,
    window_alloc: usize,
    window_mask: usize,
    write_pos: Vec<usize>,

    /// Commutator cursor, decremented modulo `M` per input sample.
    filter_index: usize,
    /// Input samples accumulated since the last transform, in `[0, M/2)`.
    pending: usize,
    /// Parity of the global output index, for the oversampling correction.
    out_parity: bool,

    fft: FftPlan,
    fft_re: Vec<f32>,
    fft_im: Vec<f32>,

    /// Interleaved IQ output, one buffer per channel.
    out: Vec<Vec<f32>>,
    last_out_samples: usize,

    /// Channel center frequencies in natural FFT order.
    center_map: Vec<f32>,
}

impl Channelizer {
    /// Create an analyzer for `num_channels` channels over a stream of
    /// `fs_hz` complex samples per second centered at `center_hz`.
    ///
    /// `max_input_samples` is the largest block (in complex samples) a
    /// single [`process`](Self::process) call will be given; it sizes the
    /// per-channel output buffers.
    ///
    /// # Errors
    ///
    /// [`ChannelizerError::InvalidChannelCount`] unless `num_channels` is a
    /// power of two in `[2, 16]`; [`ChannelizerError::InvalidSampleRate`]
    /// unless `fs_hz` is positive and finite.
    pub fn new(
        num_channels: usize,
        center_hz: f64,
        fs_hz: f64,
        max_input_samples: usize,
    ) -> Result<Self, ChannelizerError> {
        if !(MIN_CHANNELS..=MAX_CHANNELS).contains(&num_channels)
            || !num_channels.is_power_of_two()
        {
            return Err(ChannelizerError::InvalidChannelCount(num_channels));
        }
        if !fs_hz.is_finite() || fs_hz <= 0.0 {
            return Err(ChannelizerError::InvalidSampleRate(fs_hz));
        }

        let m = num_channels;
        let decimation = m / 2;
        let taps_per_branch = 2 * FILTER_SEMI_LENGTH;

        // Prototype lowpass, one-sided cutoff at CUTOFF_RATIO / M cycles per
        // sample: the full channel passband of the oversampled output rate,
        // shy of the adjacent channel center by the 10% guard.
        let proto = design_lowpass(
            2 * m * FILTER_SEMI_LENGTH + 1,
            CUTOFF_RATIO / m as f64,
            STOPBAND_DB,
        );

        // Slice into M branches: branch b takes proto[b + j·M]. Stored
        // reversed so the dot against an oldest-first window is the FIR sum
        // over newest-first taps. The final (symmetric, near-zero) prototype
        // tap has no branch slot and is dropped.
        let mut coeffs = vec![0.0f32; m * taps_per_branch];
        for b in 0..m {
            for j in 0..taps_per_branch {
                coeffs[b * taps_per_branch + (taps_per_branch - 1 - j)] = proto[b + j * m];
            }
        }

        let window_alloc = taps_per_branch.next_power_of_two();
        let out_capacity = (max_input_samples / decimation + 1).max(2);

        let spacing = fs_hz / m as f64;
        let center_map = (0..m)
            .map(|k| {
                let offset = if k <= m / 2 {
                    k as f64 * spacing
                } else {
                    (k as f64 - m as f64) * spacing
                };
                (center_hz + offset) as f32
            })
            .collect();

        tracing::debug!(
            num_channels = m,
            decimation,
            taps_per_branch,
            prototype_taps = 2 * m * FILTER_SEMI_LENGTH + 1,
            channel_rate_hz = fs_hz / decimation as f64,
            kernel = banda_dsp::selected_kernel_name(),
            "channelizer initialized"
        );

        Ok(Self {
            num_channels: m,
            decimation,
            center_hz,
            fs_hz,
            max_input_samples,
            coeffs,
            taps_per_branch,
            win_i: vec![0.0; m * window_alloc],
            win_q: vec![0.0; m * window_alloc],
            window_alloc,
            window_mask: window_alloc - 1,
            write_pos: vec![0; m],
            filter_index: m - 1,
            pending: 0,
            out_parity: false,
            fft: FftPlan::new(m),
            fft_re: vec![0.0; m],
            fft_im: vec![0.0; m],
            out: vec![vec![0.0; 2 * out_capacity]; m],
            last_out_samples: 0,
            center_map,
        })
    }

    /// Consume a block of interleaved IQ and produce per-channel samples.
    ///
    /// Returns the number of complex samples now available in every
    /// channel's [`channel_output`](Self::channel_output) buffer. An empty
    /// input is a no-op returning `Ok(0)`.
    ///
    /// Input samples that do not complete a commutator stride are carried in
    /// the window state and counted toward the next call, so splitting a
    /// stream into blocks at any boundary yields the same channel streams as
    /// one large call.
    ///
    /// # Errors
    ///
    /// [`ChannelizerError::OddBufferLength`] for a half-sample buffer;
    /// [`ChannelizerError::InputTooLong`] when the block exceeds the
    /// configured `max_input_samples`.
    pub fn process(&mut self, input: &[f32]) -> Result<usize, ChannelizerError> {
        if input.len() % 2 != 0 {
            return Err(ChannelizerError::OddBufferLength(input.len()));
        }
        let n = input.len() / 2;
        if n > self.max_input_samples {
            return Err(ChannelizerError::InputTooLong {
                got: n,
                max: self.max_input_samples,
            });
        }

        let m = self.num_channels;
        let mut produced = 0usize;

        for t in 0..n {
            // Commutator push: route the sample to the cursor's branch and
            // step the cursor downward.
            let b = self.filter_index;
            let slot = b * self.window_alloc + self.write_pos[b];
            self.win_i[slot] = input[2 * t];
            self.win_q[slot] = input[2 * t + 1];
            self.write_pos[b] = (self.write_pos[b] + 1) & self.window_mask;
            self.filter_index = if b == 0 { m - 1 } else { b - 1 };

            self.pending += 1;
            if self.pending == self.decimation {
                self.pending = 0;
                self.transform(produced);
                produced += 1;
            }
        }

        self.last_out_samples = produced;
        Ok(produced)
    }

    /// One analysis step: M branch dot products, the M-point FFT, the
    /// oversampling phase correction, and the store into output slot `slot`.
    fn transform(&mut self, slot: usize) {
        let m = self.num_channels;
        let p = self.taps_per_branch;

        for i in 0..m {
            // Coefficient set i holds the prototype taps of time residue i;
            // the commutator rotation selects the window branch currently
            // carrying that residue class (the pairing shifts by M/2 on
            // alternate steps because of the half-stride hop).
            let branch = (i + self.filter_index + 1) % m;
            // Oldest of the p most recent window samples.
            let start = (self.write_pos[branch] + self.window_alloc - p) & self.window_mask;
            let base = branch * self.window_alloc;
            let (acc_i, acc_q) = ring_dot_iq(
                &self.coeffs[i * p..(i + 1) * p],
                &self.win_i[base..base + self.window_alloc],
                &self.win_q[base..base + self.window_alloc],
                start,
            );
            // Stored in reverse: the scan runs newest residue first while
            // the transform wants ascending time order.
            self.fft_re[m - 1 - i] = acc_i;
            self.fft_im[m - 1 - i] = acc_q;
        }

        self.fft.process(&mut self.fft_re, &mut self.fft_im);

        for k in 0..m {
            let mut re = self.fft_re[k];
            let mut im = self.fft_im[k];
            // The M/2 hop rotates channel k by exp(-jπkn); undo it on odd
            // channels at odd output indices. The parity is global so the
            // correction stays aligned across process calls.
            if (k & 1 == 1) && self.out_parity {
                re = -re;
                im = -im;
            }
            self.out[k][2 * slot] = re;
            self.out[k][2 * slot + 1] = im;
        }
        self.out_parity = !self.out_parity;
    }

    /// Interleaved IQ output of `channel` from the most recent
    /// [`process`](Self::process) call.
    ///
    /// The slice aliases the channelizer's own storage and is overwritten by
    /// the next `process` call; the borrow checker enforces that callers
    /// consume or copy it first.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= num_channels()`.
    pub fn channel_output(&self, channel: usize) -> &[f32] {
        &self.out[channel][..2 * self.last_out_samples]
    }

    /// Center frequency of `channel` in Hz, or `0.0` for an out-of-range
    /// channel index.
    ///
    /// Channel `M/2` is the Nyquist bin: it carries signals from both
    /// `+fs/2` and `-fs/2` offsets and the analyzer cannot tell them apart.
    /// Decoders should avoid it for signals where the frequency sign
    /// matters.
    pub fn channel_center_hz(&self, channel: usize) -> f32 {
        self.center_map.get(channel).copied().unwrap_or(0.0)
    }

    /// Number of channels `M`.
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Input samples consumed per output sample, `M/2`.
    pub fn decimation(&self) -> usize {
        self.decimation
    }

    /// Per-channel output sample rate, `fs / (M/2)`.
    pub fn channel_rate_hz(&self) -> f64 {
        self.fs_hz / self.decimation as f64
    }

    /// Spacing between adjacent channel centers, `fs / M`.
    pub fn channel_spacing_hz(&self) -> f64 {
        self.fs_hz / self.num_channels as f64
    }

    /// Usable (flat-passband) bandwidth per channel.
    pub fn usable_bandwidth_hz(&self) -> f64 {
        CUTOFF_RATIO * self.channel_spacing_hz()
    }

    /// The configured stream center frequency in Hz.
    pub fn center_hz(&self) -> f64 {
        self.center_hz
    }
}
