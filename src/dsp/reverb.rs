//! Reverb - Room Simulation via Convolution
//!
//! Reverb here is the convolution of the input with a fixed impulse
//! response rather than a recirculating filter network. The impulse is a
//! short burst of exponentially decaying noise, which convolved against a
//! signal reads as the dense reflection wash of a hall.
//!
//! The impulse has two independently generated channels, so a mono input
//! produces a decorrelated stereo tail; its shape is fixed for the life of
//! the graph and only the send level into the mix is adjustable.

use rand::Rng;

use crate::dsp::convolver::Convolver;

/// Duration of the generated impulse in seconds.
pub const IMPULSE_SECONDS: f32 = 2.0;

/// Precomputed two-channel decaying-noise impulse response.
///
/// Generated once at graph construction and immutable afterwards. The
/// channels are normalized together so the convolution stage sits near
/// unity loudness and the send gain is the only level control.
pub struct ReverbImpulse {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl ReverbImpulse {
    pub fn decaying_noise(sample_rate: f32) -> Self {
        let length = (sample_rate * IMPULSE_SECONDS) as usize;
        let mut rng = rand::thread_rng();

        let channel = |rng: &mut rand::rngs::ThreadRng| -> Vec<f32> {
            (0..length)
                .map(|i| {
                    let fade = 1.0 - i as f32 / length as f32;
                    (rng.gen::<f32>() * 2.0 - 1.0) * fade * fade
                })
                .collect()
        };

        let mut impulse = Self {
            left: channel(&mut rng),
            right: channel(&mut rng),
        };
        impulse.normalize();
        impulse
    }

    /// Scale both channels so their combined energy is unity.
    fn normalize(&mut self) {
        let energy: f32 = self
            .left
            .iter()
            .chain(self.right.iter())
            .map(|s| s * s)
            .sum::<f32>()
            / 2.0;
        if energy > 0.0 {
            let scale = 1.0 / energy.sqrt();
            for s in self.left.iter_mut().chain(self.right.iter_mut()) {
                *s *= scale;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// Convolution reverb stage: one convolver per impulse channel, both fed
/// the same mono input.
pub struct ConvolutionReverb {
    left: Convolver,
    right: Convolver,
}

impl ConvolutionReverb {
    pub fn new(impulse: &ReverbImpulse) -> Self {
        Self {
            left: Convolver::new(&impulse.left),
            right: Convolver::new(&impulse.right),
        }
    }

    /// Convolve `input` into a stereo wet pair.
    pub fn process(&mut self, input: &[f32], out_left: &mut [f32], out_right: &mut [f32]) {
        self.left.process(input, out_left);
        self.right.process(input, out_right);
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}
