//! Banda DSP - foundation primitives for the wideband channelizer.
//!
//! This crate holds the three building blocks everything above it is made of:
//!
//! - [`kaiser`] - Kaiser-windowed sinc lowpass design, shared by the
//!   channelizer prototype and the resampler prototype
//! - [`fft`] - fully unrolled forward FFT kernels for the fixed channel
//!   counts (2, 4, 8, 16)
//! - [`kernel`] - the runtime-dispatched SIMD dual dot product that both
//!   multirate hot paths reduce to
//!
//! # Design Principles
//!
//! - **Real-time safe**: nothing here allocates after construction
//! - **One primitive, many widths**: the dot product is compiled for every
//!   SIMD width the target knows and selected once at first use
//! - **f32 data, f64 design**: sample paths are f32 end to end; filter
//!   design runs in f64 and rounds once

pub mod fft;
pub mod kaiser;
pub mod kernel;

pub use fft::FftPlan;
pub use kaiser::{bessel_i0, design_lowpass, kaiser_beta};
pub use kernel::{dot_iq, selected_kernel_name};
