//! Rational L/M polyphase resampler.
//!
//! Converts a complex IQ stream between integer sample rates by the reduced
//! ratio `L/M` (upsample by L, lowpass, decimate by M) without materializing
//! the upsampled stream: the prototype lowpass is decomposed into `L`
//! branches of 32 taps and only the branches that land on output instants
//! are evaluated.
//!
//! The prototype is a Kaiser-windowed sinc with 60 dB stopband and a cutoff
//! of `1/max(L, M)` cycles per sample at the interpolated rate. Note that
//! this cutoff has no guard band: the resampler is a near-Nyquist
//! passthrough that deliberately passes the full input band and relies on
//! the channelizer's per-channel filtering upstream for anti-aliasing. It
//! rate-matches decoders; it is not a brick-wall decimator.
//!
//! Phase state persists across [`process`](Resampler::process) calls, so a
//! stream split into arbitrary blocks produces the same output sequence as
//! one large call.
//!
//! Reference: R. E. Crochiere and L. R. Rabiner, *Multirate Digital Signal
//! Processing*, Prentice Hall, 1983, Section 3.3.

use crate::ResamplerError;
use crate::ring::ring_dot_iq;
use banda_dsp::design_lowpass;

/// Taps evaluated per output sample (per polyphase branch).
pub const TAPS_PER_BRANCH: usize = 32;

/// Prototype stopband attenuation in dB.
pub const RESAMPLER_STOPBAND_DB: f64 = 60.0;

/// Filter state for an active (non-passthrough) conversion.
struct Inner {
    /// Interpolation factor L (reduced).
    up: usize,
    /// Decimation factor M (reduced).
    down: usize,
    /// Branch coefficients, `[branch][tap]`, reversed per branch and scaled
    /// by L for interpolation gain.
    coeffs: Vec<f32>,
    /// Split I/Q history rings, power-of-two length ≥ 2·TAPS_PER_BRANCH.
    hist_i: Vec<f32>,
    hist_q: Vec<f32>,
    hist_mask: usize,
    write_pos: usize,
    /// Phase accumulator in `[0, L)`; advances by M per emitted output.
    phase: usize,
    /// Interleaved IQ output buffer.
    out: Vec<f32>,
    max_input_samples: usize,
}

/// Per-channel rational sample-rate converter.
///
/// Equal input and output rates construct a passthrough with no filter;
/// `process` then returns its input unchanged.
///
/// Owned by exactly one logical actor at a time, like every per-channel
/// structure in this workspace.
pub struct Resampler {
    input_rate: u32,
    output_rate: u32,
    inner: Option<Inner>,
}

impl Resampler {
    /// Create a converter from `input_rate` to `output_rate` Hz.
    ///
    /// `max_input_samples` is the largest block (in complex samples) a
    /// single `process` call will be given; it sizes the output buffer.
    ///
    /// # Errors
    ///
    /// - [`ResamplerError::ZeroRate`] if either rate is zero
    /// - [`ResamplerError::RateTooLarge`] if either rate exceeds `i32::MAX`
    /// - [`ResamplerError::FilterSizeOverflow`] if `L · 32` overflows
    /// - [`ResamplerError::OutputSizeOverflow`] if the output buffer size
    ///   computation overflows
    pub fn new(
        input_rate: u32,
        output_rate: u32,
        max_input_samples: usize,
    ) -> Result<Self, ResamplerError> {
        if input_rate == 0 || output_rate == 0 {
            return Err(ResamplerError::ZeroRate);
        }
        for &rate in &[input_rate, output_rate] {
            if rate > i32::MAX as u32 {
                return Err(ResamplerError::RateTooLarge(rate));
            }
        }

        if input_rate == output_rate {
            tracing::debug!(rate = input_rate, "resampler in passthrough mode");
            return Ok(Self {
                input_rate,
                output_rate,
                inner: None,
            });
        }

        let g = gcd(input_rate, output_rate);
        let up = (output_rate / g) as usize;
        let down = (input_rate / g) as usize;

        let num_taps = up
            .checked_mul(TAPS_PER_BRANCH)
            .ok_or(ResamplerError::FilterSizeOverflow(up))?;

        // Output sizing: ⌊max_input · L / M⌋ + 1 complex samples, checked the
        // whole way.
        let out_capacity = max_input_samples
            .checked_mul(up)
            .map(|v| v / down)
            .and_then(|v| v.checked_add(1))
            .and_then(|v| v.checked_mul(2))
            .ok_or(ResamplerError::OutputSizeOverflow(max_input_samples))?;

        // Near-Nyquist cutoff (see module docs), scaled by L to compensate
        // the interpolation gain.
        let cutoff = 1.0 / up.max(down) as f64;
        let proto = design_lowpass(num_taps, cutoff, RESAMPLER_STOPBAND_DB);

        // Branch b takes proto[b + k·L], reversed for the oldest-first dot.
        let mut coeffs = vec![0.0f32; num_taps];
        for b in 0..up {
            for k in 0..TAPS_PER_BRANCH {
                coeffs[b * TAPS_PER_BRANCH + (TAPS_PER_BRANCH - 1 - k)] =
                    proto[b + k * up] * up as f32;
            }
        }

        let hist_len = (2 * TAPS_PER_BRANCH).next_power_of_two();

        tracing::debug!(
            input_rate,
            output_rate,
            up,
            down,
            num_taps,
            "resampler initialized"
        );

        Ok(Self {
            input_rate,
            output_rate,
            inner: Some(Inner {
                up,
                down,
                coeffs,
                hist_i: vec![0.0; hist_len],
                hist_q: vec![0.0; hist_len],
                hist_mask: hist_len - 1,
                write_pos: 0,
                phase: 0,
                out: vec![0.0; out_capacity],
                max_input_samples,
            }),
        })
    }

    /// Convert a block of interleaved IQ.
    ///
    /// Returns the converted block; in passthrough mode this is the input
    /// slice itself. The returned slice aliases internal storage and is
    /// overwritten by the next call.
    ///
    /// # Errors
    ///
    /// [`ResamplerError::OddBufferLength`] for a half-sample buffer;
    /// [`ResamplerError::InputTooLong`] when the block exceeds the
    /// configured `max_input_samples`.
    pub fn process<'a>(&'a mut self, input: &'a [f32]) -> Result<&'a [f32], ResamplerError> {
        if input.len() % 2 != 0 {
            return Err(ResamplerError::OddBufferLength(input.len()));
        }
        let Some(inner) = self.inner.as_mut() else {
            return Ok(input);
        };

        let n = input.len() / 2;
        if n > inner.max_input_samples {
            return Err(ResamplerError::InputTooLong {
                got: n,
                max: inner.max_input_samples,
            });
        }

        let mut emitted = 0usize;
        for t in 0..n {
            inner.hist_i[inner.write_pos] = input[2 * t];
            inner.hist_q[inner.write_pos] = input[2 * t + 1];
            inner.write_pos = (inner.write_pos + 1) & inner.hist_mask;

            // Emit every branch that lands between this input and the next.
            while inner.phase < inner.up {
                let branch = inner.phase;
                let start = (inner.write_pos + inner.hist_i.len() - TAPS_PER_BRANCH)
                    & inner.hist_mask;
                let (out_i, out_q) = ring_dot_iq(
                    &inner.coeffs[branch * TAPS_PER_BRANCH..(branch + 1) * TAPS_PER_BRANCH],
                    &inner.hist_i,
                    &inner.hist_q,
                    start,
                );
                inner.out[2 * emitted] = out_i;
                inner.out[2 * emitted + 1] = out_q;
                emitted += 1;
                inner.phase += inner.down;
            }
            inner.phase -= inner.up;
        }

        Ok(&inner.out[..2 * emitted])
    }

    /// True when input and output rates are equal and no filter exists.
    pub fn is_passthrough(&self) -> bool {
        self.inner.is_none()
    }

    /// Configured input rate in Hz.
    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// Configured output rate in Hz.
    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    /// The reduced conversion ratio `(L, M)`; `(1, 1)` for passthrough.
    pub fn ratio(&self) -> (usize, usize) {
        self.inner
            .as_ref()
            .map_or((1, 1), |inner| (inner.up, inner.down))
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}
