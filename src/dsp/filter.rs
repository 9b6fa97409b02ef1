use std::f32::consts::TAU;

/*
Low-Pass Filter
===============

One filter instance serves the entire polyphonic mix: every voice is summed
first and the sum passes through here, so cutoff changes act on the whole
instrument rather than per voice.

The topology is a topology-preserving-transform state variable filter. Two
integrator states carry the filter memory between samples; the prewarped
coefficient g keeps the analog cutoff frequency accurate near Nyquist. Only
the low-pass output is exposed, and damping is fixed (no resonance control
on this instrument).
*/

pub struct LowPassFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory
    cutoff_hz: f32,
}

impl LowPassFilter {
    pub fn new(cutoff_hz: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
        }
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.cutoff_hz = cutoff_hz;
    }

    #[inline]
    fn compute_g(&self, sample_rate: f32) -> f32 {
        // The prewarp tangent is singular at Nyquist; hold the effective
        // cutoff below it
        let cutoff = self.cutoff_hz.min(0.45 * sample_rate);
        let wd = TAU * cutoff;
        let wa = (2.0 * sample_rate) * (wd / (2.0 * sample_rate)).tan();
        wa / (2.0 * sample_rate)
    }

    pub fn render(&mut self, buffer: &mut [f32], sample_rate: f32) {
        let g = self.compute_g(sample_rate);
        let k = 2.0;
        let h = 1.0 / (1.0 + g * (g + k));

        for sample in buffer.iter_mut() {
            let v3 = *sample - self.ic2eq;
            let v1 = h * (self.ic1eq + g * v3);
            let v2 = self.ic2eq + g * v1;

            self.ic1eq = 2.0 * v1 - self.ic1eq;
            self.ic2eq = 2.0 * v2 - self.ic2eq;

            *sample = v2;
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}
