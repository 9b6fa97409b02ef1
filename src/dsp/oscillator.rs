use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Waveform shapes available to a voice.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Sawtooth,
}

/// Phase-accumulator oscillator.
///
/// Phase runs 0..1 and wraps; frequency is supplied per render call so a
/// voice can hold it fixed for its whole lifetime. Phase persists across
/// blocks, so consecutive renders produce a continuous waveform.
pub struct Oscillator {
    waveform: Waveform,
    phase: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Fill `out` with one block of the waveform at `frequency_hz`.
    pub fn render(&mut self, out: &mut [f32], frequency_hz: f32, sample_rate: f32) {
        let step = frequency_hz / sample_rate;

        for sample in out.iter_mut() {
            *sample = match self.waveform {
                Waveform::Sine => (TAU * self.phase).sin(),
                // Ramp from -1 to +1 over one period
                Waveform::Sawtooth => 2.0 * self.phase - 1.0,
            };

            self.phase += step;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_matches_closed_form() {
        let sample_rate = 48_000.0;
        let freq = 440.0;
        let mut osc = Oscillator::new(Waveform::Sine);

        let mut buffer = vec![0.0f32; 128];
        osc.render(&mut buffer, freq, sample_rate);

        // sample n should be sin(2pi f n / sr)
        for (n, &actual) in buffer.iter().enumerate().take(32) {
            let expected = (TAU * freq * n as f32 / sample_rate).sin();
            assert!(
                (actual - expected).abs() < 1e-4,
                "sample {n}: expected {expected}, got {actual}"
            );
        }
    }

    #[test]
    fn phase_continues_across_blocks() {
        let sample_rate = 48_000.0;
        let freq = 440.0;

        let mut one_shot = Oscillator::new(Waveform::Sine);
        let mut whole = vec![0.0f32; 256];
        one_shot.render(&mut whole, freq, sample_rate);

        let mut split = Oscillator::new(Waveform::Sine);
        let mut first = vec![0.0f32; 128];
        let mut second = vec![0.0f32; 128];
        split.render(&mut first, freq, sample_rate);
        split.render(&mut second, freq, sample_rate);

        for i in 0..128 {
            assert!((whole[128 + i] - second[i]).abs() < 1e-4);
        }
    }

    #[test]
    fn sawtooth_ramps_and_wraps() {
        let sample_rate = 1_000.0;
        let freq = 100.0; // exactly 10 samples per period
        let mut osc = Oscillator::new(Waveform::Sawtooth);

        let mut buffer = vec![0.0f32; 20];
        osc.render(&mut buffer, freq, sample_rate);

        assert_eq!(buffer[0], -1.0);
        assert!(buffer[9] > buffer[1], "ramp should rise within a period");
        assert!((buffer[10] - -1.0).abs() < 1e-5, "should wrap after a period");
    }

    #[test]
    fn output_stays_in_unit_range() {
        for waveform in [Waveform::Sine, Waveform::Sawtooth] {
            let mut osc = Oscillator::new(waveform);
            let mut buffer = vec![0.0f32; 4096];
            osc.render(&mut buffer, 2_345.0, 48_000.0);
            assert!(buffer.iter().all(|s| s.abs() <= 1.0));
        }
    }
}
