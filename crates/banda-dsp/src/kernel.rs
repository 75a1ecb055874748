//! Runtime-dispatched dual dot-product kernel.
//!
//! Every hot loop in the channelizer and the resampler reduces to the same
//! primitive: a real coefficient vector multiplied against a pair of equal
//! length I and Q sample vectors, `(Σ c[k]·i[k], Σ c[k]·q[k])`. This module
//! compiles that primitive in several SIMD widths and selects the widest one
//! the running machine supports, once, at first use.
//!
//! Selection uses the standard library's feature detection
//! (`is_x86_feature_detected!` / `is_aarch64_feature_detected!`), which
//! checks both CPUID capability and OS state-save support (the XCR0 YMM and
//! ZMM bits on x86-64), so a CPU-capable machine whose OS does not save the
//! wide registers falls back cleanly. The chosen kernel is cached in a
//! [`OnceLock`]; initialization is therefore at-most-once even when first use
//! races across threads, and it cannot fail because the scalar kernel is
//! always available.
//!
//! All variants follow the same accumulation order (vector partial sums, a
//! horizontal reduce, then a scalar tail), so results across variants agree
//! to floating-point rounding. The scalar baseline compiles to SSE2 code on
//! x86-64, where SSE2 is part of the base target.

use std::sync::OnceLock;

/// Signature of the dual dot product: `(coeffs, i, q) -> (Σc·i, Σc·q)`.
pub type DotIqFn = fn(&[f32], &[f32], &[f32]) -> (f32, f32);

struct Kernel {
    name: &'static str,
    dot_iq: DotIqFn,
}

static KERNEL: OnceLock<Kernel> = OnceLock::new();

/// Dual dot product of a real coefficient vector against I and Q vectors.
///
/// All three slices must have equal length. Dispatches to the SIMD variant
/// selected at first use.
///
/// # Panics
///
/// Panics if the slice lengths differ.
#[inline]
pub fn dot_iq(coeffs: &[f32], i: &[f32], q: &[f32]) -> (f32, f32) {
    assert!(
        coeffs.len() == i.len() && coeffs.len() == q.len(),
        "dot_iq length mismatch: {} / {} / {}",
        coeffs.len(),
        i.len(),
        q.len()
    );
    (kernel().dot_iq)(coeffs, i, q)
}

/// Name of the selected kernel variant, for logs and diagnostics.
///
/// One of `"scalar"`, `"avx2-fma"`, `"avx512-fma"`, `"neon"`.
pub fn selected_kernel_name() -> &'static str {
    kernel().name
}

fn kernel() -> &'static Kernel {
    KERNEL.get_or_init(select)
}

fn select() -> Kernel {
    #[cfg(target_arch = "x86_64")]
    {
        if std::is_x86_feature_detected!("avx512f")
            && std::is_x86_feature_detected!("avx512vl")
            && std::is_x86_feature_detected!("fma")
        {
            return Kernel {
                name: "avx512-fma",
                dot_iq: x86::dot_iq_avx512_entry,
            };
        }
        if std::is_x86_feature_detected!("avx2") && std::is_x86_feature_detected!("fma") {
            return Kernel {
                name: "avx2-fma",
                dot_iq: x86::dot_iq_avx2_entry,
            };
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        if std::arch::is_aarch64_feature_detected!("neon") {
            return Kernel {
                name: "neon",
                dot_iq: aarch64::dot_iq_neon_entry,
            };
        }
    }
    Kernel {
        name: "scalar",
        dot_iq: dot_iq_scalar,
    }
}

/// Portable baseline. Kept `pub(crate)` so tests can compare SIMD variants
/// against it directly.
pub(crate) fn dot_iq_scalar(coeffs: &[f32], i: &[f32], q: &[f32]) -> (f32, f32) {
    let mut acc_i = 0.0f32;
    let mut acc_q = 0.0f32;
    for k in 0..coeffs.len() {
        acc_i += coeffs[k] * i[k];
        acc_q += coeffs[k] * q[k];
    }
    (acc_i, acc_q)
}

#[cfg(target_arch = "x86_64")]
mod x86 {
    #![allow(unsafe_code)]

    use std::arch::x86_64::*;

    pub(super) fn dot_iq_avx2_entry(coeffs: &[f32], i: &[f32], q: &[f32]) -> (f32, f32) {
        // Safety: only installed by `select` after is_x86_feature_detected!
        // confirmed avx2 and fma.
        unsafe { dot_iq_avx2(coeffs, i, q) }
    }

    pub(super) fn dot_iq_avx512_entry(coeffs: &[f32], i: &[f32], q: &[f32]) -> (f32, f32) {
        // Safety: only installed by `select` after is_x86_feature_detected!
        // confirmed avx512f, avx512vl and fma.
        unsafe { dot_iq_avx512(coeffs, i, q) }
    }

    #[target_feature(enable = "avx2,fma")]
    unsafe fn dot_iq_avx2(coeffs: &[f32], i: &[f32], q: &[f32]) -> (f32, f32) {
        let n = coeffs.len();
        let lanes = 8;
        let full = n / lanes * lanes;

        let mut acc_i = _mm256_setzero_ps();
        let mut acc_q = _mm256_setzero_ps();
        let mut k = 0;
        while k < full {
            // Safety: k + 8 <= n holds for all three equal-length slices.
            unsafe {
                let c = _mm256_loadu_ps(coeffs.as_ptr().add(k));
                acc_i = _mm256_fmadd_ps(c, _mm256_loadu_ps(i.as_ptr().add(k)), acc_i);
                acc_q = _mm256_fmadd_ps(c, _mm256_loadu_ps(q.as_ptr().add(k)), acc_q);
            }
            k += lanes;
        }

        let (mut sum_i, mut sum_q) = (hsum256(acc_i), hsum256(acc_q));
        for k in full..n {
            sum_i += coeffs[k] * i[k];
            sum_q += coeffs[k] * q[k];
        }
        (sum_i, sum_q)
    }

    #[target_feature(enable = "avx2")]
    fn hsum256(v: __m256) -> f32 {
        let lo = _mm256_castps256_ps128(v);
        let hi = _mm256_extractf128_ps::<1>(v);
        let sum4 = _mm_add_ps(lo, hi);
        let shuf = _mm_movehdup_ps(sum4);
        let sum2 = _mm_add_ps(sum4, shuf);
        let hi2 = _mm_movehl_ps(shuf, sum2);
        _mm_cvtss_f32(_mm_add_ss(sum2, hi2))
    }

    #[target_feature(enable = "avx512f,avx512vl,fma")]
    unsafe fn dot_iq_avx512(coeffs: &[f32], i: &[f32], q: &[f32]) -> (f32, f32) {
        let n = coeffs.len();
        let lanes = 16;
        let full = n / lanes * lanes;

        let mut acc_i = _mm512_setzero_ps();
        let mut acc_q = _mm512_setzero_ps();
        let mut k = 0;
        while k < full {
            // Safety: k + 16 <= n holds for all three equal-length slices.
            unsafe {
                let c = _mm512_loadu_ps(coeffs.as_ptr().add(k));
                acc_i = _mm512_fmadd_ps(c, _mm512_loadu_ps(i.as_ptr().add(k)), acc_i);
                acc_q = _mm512_fmadd_ps(c, _mm512_loadu_ps(q.as_ptr().add(k)), acc_q);
            }
            k += lanes;
        }

        let (mut sum_i, mut sum_q) = (_mm512_reduce_add_ps(acc_i), _mm512_reduce_add_ps(acc_q));
        for k in full..n {
            sum_i += coeffs[k] * i[k];
            sum_q += coeffs[k] * q[k];
        }
        (sum_i, sum_q)
    }
}

#[cfg(target_arch = "aarch64")]
mod aarch64 {
    #![allow(unsafe_code)]

    use std::arch::aarch64::*;

    pub(super) fn dot_iq_neon_entry(coeffs: &[f32], i: &[f32], q: &[f32]) -> (f32, f32) {
        // Safety: only installed by `select` after is_aarch64_feature_detected!
        // confirmed neon.
        unsafe { dot_iq_neon(coeffs, i, q) }
    }

    #[target_feature(enable = "neon")]
    unsafe fn dot_iq_neon(coeffs: &[f32], i: &[f32], q: &[f32]) -> (f32, f32) {
        let n = coeffs.len();
        let lanes = 4;
        let full = n / lanes * lanes;

        // Safety: k + 4 <= n holds for all three equal-length slices.
        unsafe {
            let mut acc_i = vdupq_n_f32(0.0);
            let mut acc_q = vdupq_n_f32(0.0);
            let mut k = 0;
            while k < full {
                let c = vld1q_f32(coeffs.as_ptr().add(k));
                acc_i = vfmaq_f32(acc_i, c, vld1q_f32(i.as_ptr().add(k)));
                acc_q = vfmaq_f32(acc_q, c, vld1q_f32(q.as_ptr().add(k)));
                k += lanes;
            }

            let (mut sum_i, mut sum_q) = (vaddvq_f32(acc_i), vaddvq_f32(acc_q));
            for k in full..n {
                sum_i += coeffs[k] * i[k];
                sum_q += coeffs[k] * q[k];
            }
            (sum_i, sum_q)
        }
    }
}
