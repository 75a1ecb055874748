//! Circular-buffer dot product shared by the channelizer and the resampler.
//!
//! Both structures keep split I/Q history in power-of-two rings so the wrap
//! reduces to a bitwise AND, and both evaluate their FIR branches as a dual
//! dot product over the most recent samples in oldest-first order. The ring
//! read is at most two contiguous runs, each handed to the dispatched SIMD
//! kernel.

use banda_dsp::dot_iq;

/// Dual dot product of `coeffs` against the ring contents starting at
/// `start`, reading `coeffs.len()` samples oldest-first with wraparound.
///
/// `ring_i` and `ring_q` must be the same (power-of-two) length, at least
/// `coeffs.len()`, and `start` must be in range.
pub(crate) fn ring_dot_iq(
    coeffs: &[f32],
    ring_i: &[f32],
    ring_q: &[f32],
    start: usize,
) -> (f32, f32) {
    let taps = coeffs.len();
    let first = taps.min(ring_i.len() - start);

    let (mut acc_i, mut acc_q) = dot_iq(
        &coeffs[..first],
        &ring_i[start..start + first],
        &ring_q[start..start + first],
    );
    if first < taps {
        let rest = taps - first;
        let (tail_i, tail_q) = dot_iq(&coeffs[first..], &ring_i[..rest], &ring_q[..rest]);
        acc_i += tail_i;
        acc_q += tail_q;
    }
    (acc_i, acc_q)
}
