//! Fixed-size forward FFT kernels for the channelizer.
//!
//! The channelizer only ever needs transforms of size 2, 4, 8 or 16 (one
//! point per channel), so instead of a general planner this module provides
//! fully unrolled Cooley-Tukey kernels with compile-time twiddle constants:
//! radix-2 for sizes 2, 4 and 8, radix-4 for size 16 (a radix-2 size-16
//! kernel needs more live values than registers comfortably hold).
//!
//! Data is split real/imaginary (two `&mut [f32]` slices) to match the
//! channelizer's branch accumulators; the transform is the forward DFT
//! `X[k] = Σ x[n]·e^(-j2πnk/N)` without normalization.

/// cos(π/8), -sin(π/8): the 1/16-turn twiddle.
const W16_1: (f32, f32) = (0.9238795325112867, -0.3826834323650898);
/// The 1/8-turn twiddle, also used by the size-8 kernel.
const W8_C: f32 = std::f32::consts::FRAC_1_SQRT_2;
const W16_2: (f32, f32) = (W8_C, -W8_C);
const W16_3: (f32, f32) = (0.3826834323650898, -0.9238795325112867);
const W16_6: (f32, f32) = (-W8_C, -W8_C);
const W16_9: (f32, f32) = (-0.9238795325112867, 0.3826834323650898);

type C = (f32, f32);

#[inline(always)]
fn cmul(a: C, b: C) -> C {
    (a.0 * b.0 - a.1 * b.1, a.0 * b.1 + a.1 * b.0)
}

/// 4-point DFT butterfly: `out[k] = Σ x[n]·(-j)^(nk)`.
///
/// This is both the size-4 kernel and the radix-4 building block of the
/// size-16 kernel.
#[inline(always)]
fn bf4(x0: C, x1: C, x2: C, x3: C) -> [C; 4] {
    let a0 = (x0.0 + x2.0, x0.1 + x2.1);
    let a1 = (x0.0 - x2.0, x0.1 - x2.1);
    let b0 = (x1.0 + x3.0, x1.1 + x3.1);
    let b1 = (x1.0 - x3.0, x1.1 - x3.1);
    [
        (a0.0 + b0.0, a0.1 + b0.1),
        // a1 - j·b1
        (a1.0 + b1.1, a1.1 - b1.0),
        (a0.0 - b0.0, a0.1 - b0.1),
        // a1 + j·b1
        (a1.0 - b1.1, a1.1 + b1.0),
    ]
}

#[inline(always)]
fn fft2(re: &mut [f32], im: &mut [f32]) {
    let (a, b) = ((re[0], im[0]), (re[1], im[1]));
    re[0] = a.0 + b.0;
    im[0] = a.1 + b.1;
    re[1] = a.0 - b.0;
    im[1] = a.1 - b.1;
}

#[inline(always)]
fn fft4(re: &mut [f32], im: &mut [f32]) {
    let out = bf4(
        (re[0], im[0]),
        (re[1], im[1]),
        (re[2], im[2]),
        (re[3], im[3]),
    );
    for (k, &(r, i)) in out.iter().enumerate() {
        re[k] = r;
        im[k] = i;
    }
}

#[inline(always)]
fn fft8(re: &mut [f32], im: &mut [f32]) {
    // Decimation in time: 4-point DFTs over even and odd samples.
    let e = bf4(
        (re[0], im[0]),
        (re[2], im[2]),
        (re[4], im[4]),
        (re[6], im[6]),
    );
    let o = bf4(
        (re[1], im[1]),
        (re[3], im[3]),
        (re[5], im[5]),
        (re[7], im[7]),
    );

    // Twiddle the odd half: W8^k for k = 0..3. W8^1 and W8^3 expand to
    // sum/difference forms instead of a general complex multiply.
    let t0 = o[0];
    let t1 = (W8_C * (o[1].0 + o[1].1), W8_C * (o[1].1 - o[1].0));
    let t2 = (o[2].1, -o[2].0);
    let t3 = (W8_C * (o[3].1 - o[3].0), -W8_C * (o[3].0 + o[3].1));

    for (k, (ek, tk)) in e.iter().zip([t0, t1, t2, t3]).enumerate() {
        re[k] = ek.0 + tk.0;
        im[k] = ek.1 + tk.1;
        re[k + 4] = ek.0 - tk.0;
        im[k + 4] = ek.1 - tk.1;
    }
}

#[inline(always)]
fn fft16(re: &mut [f32], im: &mut [f32]) {
    // Radix-4 decimation in time. Stage 1: four 4-point DFTs over the
    // residue classes n mod 4.
    let mut y = [[(0.0f32, 0.0f32); 4]; 4];
    for r in 0..4 {
        y[r] = bf4(
            (re[r], im[r]),
            (re[r + 4], im[r + 4]),
            (re[r + 8], im[r + 8]),
            (re[r + 12], im[r + 12]),
        );
    }

    // Stage 2: for each output residue s, twiddle by W16^(r·s) and take a
    // 4-point DFT across the stage-1 outputs. X[4q+s] = out_s[q].

    // s = 0: all twiddles are 1.
    let s0 = bf4(y[0][0], y[1][0], y[2][0], y[3][0]);
    // s = 1: W16^0, W16^1, W16^2, W16^3.
    let s1 = bf4(
        y[0][1],
        cmul(y[1][1], W16_1),
        cmul(y[2][1], W16_2),
        cmul(y[3][1], W16_3),
    );
    // s = 2: W16^0, W16^2, W16^4 = -j, W16^6.
    let s2 = bf4(
        y[0][2],
        cmul(y[1][2], W16_2),
        (y[2][2].1, -y[2][2].0),
        cmul(y[3][2], W16_6),
    );
    // s = 3: W16^0, W16^3, W16^6, W16^9.
    let s3 = bf4(
        y[0][3],
        cmul(y[1][3], W16_3),
        cmul(y[2][3], W16_6),
        cmul(y[3][3], W16_9),
    );

    for q in 0..4 {
        re[4 * q] = s0[q].0;
        im[4 * q] = s0[q].1;
        re[4 * q + 1] = s1[q].0;
        im[4 * q + 1] = s1[q].1;
        re[4 * q + 2] = s2[q].0;
        im[4 * q + 2] = s2[q].1;
        re[4 * q + 3] = s3[q].0;
        im[4 * q + 3] = s3[q].1;
    }
}

/// A forward FFT of fixed size 2, 4, 8 or 16.
///
/// Unlike a general planner there is no per-size setup cost; the plan is just
/// a validated size that selects an unrolled kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FftPlan {
    size: usize,
}

impl FftPlan {
    /// Create a plan for `size` points.
    ///
    /// # Panics
    ///
    /// Panics if `size` is not one of 2, 4, 8, 16. Callers (the channelizer)
    /// validate the channel count before building a plan.
    pub fn new(size: usize) -> Self {
        assert!(
            matches!(size, 2 | 4 | 8 | 16),
            "unsupported FFT size {size}, expected 2, 4, 8 or 16"
        );
        Self { size }
    }

    /// Transform size in points.
    pub fn size(&self) -> usize {
        self.size
    }

    /// In-place forward transform of split real/imaginary data.
    ///
    /// # Panics
    ///
    /// Panics if either slice length differs from the plan size.
    pub fn process(&self, re: &mut [f32], im: &mut [f32]) {
        assert_eq!(re.len(), self.size, "real slice length mismatch");
        assert_eq!(im.len(), self.size, "imag slice length mismatch");
        match self.size {
            2 => fft2(re, im),
            4 => fft4(re, im),
            8 => fft8(re, im),
            16 => fft16(re, im),
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// Naive O(N²) reference DFT in f64.
    fn reference_dft(re: &[f32], im: &[f32]) -> (Vec<f64>, Vec<f64>) {
        let n = re.len();
        let mut out_re = vec![0.0; n];
        let mut out_im = vec![0.0; n];
        for k in 0..n {
            for t in 0..n {
                let phase = -2.0 * PI * (k * t) as f64 / n as f64;
                let (s, c) = phase.sin_cos();
                out_re[k] += re[t] as f64 * c - im[t] as f64 * s;
                out_im[k] += re[t] as f64 * s + im[t] as f64 * c;
            }
        }
        (out_re, out_im)
    }

    fn assert_matches_reference(re: &[f32], im: &[f32]) {
        let (want_re, want_im) = reference_dft(re, im);
        let mut got_re = re.to_vec();
        let mut got_im = im.to_vec();
        FftPlan::new(re.len()).process(&mut got_re, &mut got_im);
        for k in 0..re.len() {
            assert!(
                (got_re[k] as f64 - want_re[k]).abs() < 1e-5
                    && (got_im[k] as f64 - want_im[k]).abs() < 1e-5,
                "size {} bin {}: got ({}, {}), want ({:.7}, {:.7})",
                re.len(),
                k,
                got_re[k],
                got_im[k],
                want_re[k],
                want_im[k]
            );
        }
    }

    #[test]
    fn impulse_is_flat() {
        for &n in &[2usize, 4, 8, 16] {
            let mut re = vec![0.0; n];
            let mut im = vec![0.0; n];
            re[0] = 1.0;
            FftPlan::new(n).process(&mut re, &mut im);
            for k in 0..n {
                assert!((re[k] - 1.0).abs() < 1e-6 && im[k].abs() < 1e-6);
            }
        }
    }

    #[test]
    fn dc_concentrates_in_bin_zero() {
        for &n in &[2usize, 4, 8, 16] {
            let mut re = vec![1.0; n];
            let mut im = vec![0.0; n];
            FftPlan::new(n).process(&mut re, &mut im);
            assert!((re[0] - n as f32).abs() < 1e-5);
            for k in 1..n {
                assert!(re[k].abs() < 1e-5 && im[k].abs() < 1e-5);
            }
        }
    }

    #[test]
    fn complex_tone_routes_to_its_bin() {
        // x[t] = e^(j2π·m·t/N) must transform to N·δ[k-m].
        for &n in &[2usize, 4, 8, 16] {
            for m in 0..n {
                let mut re: Vec<f32> = (0..n)
                    .map(|t| (2.0 * PI * (m * t) as f64 / n as f64).cos() as f32)
                    .collect();
                let mut im: Vec<f32> = (0..n)
                    .map(|t| (2.0 * PI * (m * t) as f64 / n as f64).sin() as f32)
                    .collect();
                FftPlan::new(n).process(&mut re, &mut im);
                for k in 0..n {
                    let expected = if k == m { n as f32 } else { 0.0 };
                    assert!(
                        (re[k] - expected).abs() < 1e-4 && im[k].abs() < 1e-4,
                        "n={} m={} k={}: ({}, {})",
                        n,
                        m,
                        k,
                        re[k],
                        im[k]
                    );
                }
            }
        }
    }

    #[test]
    fn matches_reference_on_structured_inputs() {
        for &n in &[2usize, 4, 8, 16] {
            // A deterministic, aperiodic input exercising all butterflies.
            let re: Vec<f32> = (0..n).map(|t| ((t * t + 1) as f32 * 0.37).sin()).collect();
            let im: Vec<f32> = (0..n).map(|t| ((t * 3 + 2) as f32 * 0.71).cos()).collect();
            assert_matches_reference(&re, &im);
        }
    }

    #[test]
    #[should_panic(expected = "unsupported FFT size")]
    fn rejects_unsupported_size() {
        let _ = FftPlan::new(32);
    }
}
