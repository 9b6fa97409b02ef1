//! Low-level DSP primitives used by the signal graph.
//!
//! These components stay allocation-free on the render path and focus on
//! the signal-processing math; voice lifecycle and parameter discipline are
//! layered on top by the engine.

/// Streaming partitioned FFT convolution.
pub mod convolver;
/// Feedback delay line built on a circular buffer.
pub mod delay;
/// Low-pass filter shared by the whole voice mix.
pub mod filter;
/// Audio-band oscillators.
pub mod oscillator;
/// Impulse generation and convolution reverb stage.
pub mod reverb;
