/*
Feedback Delay Line
===================

A fixed-size circular buffer with separate read and write positions. The
feedback coefficient is applied at write time:

    delayed = buffer[read]
    buffer[write] = input + delayed * feedback

which makes the loop a genuine cycle: every echo re-enters the line and
spawns the next one, so the echo count is unbounded while the energy stays
bounded as long as feedback < 1. This is the explicit-buffer rendition of a
delay node whose output feeds a gain that feeds its own input.

Delay time is passed per sample, so immediate delay-time changes simply move
the read tap on the next sample.
*/

pub struct FeedbackDelay {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl FeedbackDelay {
    /// Create a delay line able to hold up to `max_samples` of signal.
    pub fn new(max_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_samples.max(2)],
            write_pos: 0,
        }
    }

    /// Capacity of the line in samples.
    pub fn max_samples(&self) -> usize {
        self.buffer.len()
    }

    /// Advance the line by one sample and return the delayed output.
    ///
    /// `delay_samples` is clamped to [1, capacity - 1]; `feedback` is the
    /// fraction of the delayed output written back into the line.
    pub fn process(&mut self, input: f32, delay_samples: usize, feedback: f32) -> f32 {
        let len = self.buffer.len();
        let delay_samples = delay_samples.clamp(1, len - 1);

        let read_pos = (self.write_pos + len - delay_samples) % len;
        let delayed = self.buffer[read_pos];

        self.buffer[self.write_pos] = input + delayed * feedback;
        self.write_pos = (self.write_pos + 1) % len;

        delayed
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
