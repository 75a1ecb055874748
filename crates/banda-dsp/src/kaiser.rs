//! Kaiser-windowed sinc lowpass design.
//!
//! Both multirate structures in this workspace (the polyphase channelizer and
//! the rational resampler) are built around a single prototype lowpass FIR,
//! designed here with the windowed-sinc method and a Kaiser window. The Kaiser
//! window is chosen over fixed windows (Hann, Blackman) because its shape
//! parameter β is derived directly from the required stopband attenuation,
//! letting callers specify filters by attenuation rather than by window type.
//!
//! The impulse response is:
//!   `h[n] = 2·fc·sinc(2·fc·(n - C)) · w_kaiser[n]`,  C = (h_len - 1) / 2
//! where `fc` is the one-sided cutoff in cycles per sample and `w_kaiser` uses
//! `I0(β·√(1 - ((2n/(h_len-1)) - 1)²)) / I0(β)`. The result is normalized to
//! unity DC gain (coefficient sum = 1).
//!
//! Reference: J. F. Kaiser, "Nonrecursive digital filter design using the
//! I0-sinh window function", Proc. IEEE ISCAS, 1974; A. V. Oppenheim and
//! R. W. Schafer, *Discrete-Time Signal Processing*, 3rd ed., Section 7.5.

use std::f64::consts::PI;

/// Maximum number of terms evaluated in the `I0` power series.
const I0_MAX_TERMS: usize = 32;

/// Relative threshold below which an `I0` series term is considered negligible.
const I0_EPSILON: f64 = 1e-12;

/// Kaiser window shape parameter β for a given stopband attenuation in dB.
///
/// Piecewise empirical fit (Kaiser, 1974):
/// - `As > 50`:       `β = 0.1102·(As - 8.7)`
/// - `21 < As ≤ 50`:  `β = 0.5842·(As - 21)^0.4 + 0.07886·(As - 21)`
/// - `As ≤ 21`:       `β = 0` (rectangular window already achieves this)
pub fn kaiser_beta(atten_db: f64) -> f64 {
    if atten_db > 50.0 {
        0.1102 * (atten_db - 8.7)
    } else if atten_db > 21.0 {
        0.5842 * (atten_db - 21.0).powf(0.4) + 0.07886 * (atten_db - 21.0)
    } else {
        0.0
    }
}

/// Zeroth-order modified Bessel function of the first kind, `I0(x)`.
///
/// Truncated power series `Σ ((x/2)^k / k!)²`, at most [`I0_MAX_TERMS`] terms,
/// with an early exit once a term falls below [`I0_EPSILON`] relative to the
/// running sum. Accurate to well below f32 precision for the β range produced
/// by [`kaiser_beta`] (β < 9 for attenuations up to 90 dB).
pub fn bessel_i0(x: f64) -> f64 {
    let half_x = x / 2.0;
    let mut sum = 1.0;
    let mut term = 1.0;
    for k in 1..=I0_MAX_TERMS {
        let factor = half_x / k as f64;
        term *= factor * factor;
        sum += term;
        if term < sum * I0_EPSILON {
            break;
        }
    }
    sum
}

/// Design a Kaiser-windowed sinc lowpass FIR.
///
/// # Arguments
///
/// * `h_len` - Filter length in taps. The channelizer passes an odd length
///   (symmetric Type I filter); the resampler passes `L · taps_per_branch`,
///   which need not be odd.
/// * `cutoff` - One-sided cutoff frequency in cycles per sample, in
///   `(0.0, 0.5]`. The passband is `±cutoff` around DC.
/// * `atten_db` - Target stopband attenuation in dB, mapped to the Kaiser β
///   via [`kaiser_beta`].
///
/// # Returns
///
/// Coefficient vector of length `h_len`, normalized so the coefficient sum
/// is 1.0 (unity DC gain). Coefficients are computed in f64 and rounded to
/// f32 at the end.
pub fn design_lowpass(h_len: usize, cutoff: f64, atten_db: f64) -> Vec<f32> {
    assert!(h_len > 0, "filter length must be > 0");
    assert!(
        cutoff > 0.0 && cutoff <= 0.5,
        "cutoff must be in (0, 0.5] cycles/sample, got {cutoff}"
    );

    let beta = kaiser_beta(atten_db);
    let i0_beta = bessel_i0(beta);
    let center = (h_len - 1) as f64 / 2.0;

    let mut coeffs = vec![0.0f64; h_len];
    for (i, c) in coeffs.iter_mut().enumerate() {
        let n = i as f64 - center;

        // Ideal lowpass: 2·fc·sinc(2·fc·n). The center tap is the 0/0 limit.
        let sinc = if n == 0.0 {
            2.0 * cutoff
        } else {
            (2.0 * PI * cutoff * n).sin() / (PI * n)
        };

        // Kaiser window. The argument of the square root is clamped at zero
        // against rounding for the endpoint taps.
        let r = 2.0 * i as f64 / (h_len - 1) as f64 - 1.0;
        let window = bessel_i0(beta * (1.0 - r * r).max(0.0).sqrt()) / i0_beta;

        *c = sinc * window;
    }

    // Unity DC gain.
    let sum: f64 = coeffs.iter().sum();
    let scale = 1.0 / sum;
    coeffs.iter_mut().for_each(|c| *c *= scale);

    coeffs.iter().map(|&c| c as f32).collect()
}
