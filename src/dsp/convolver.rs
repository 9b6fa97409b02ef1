//! Streaming convolution against a fixed impulse response.
//!
//! Direct convolution of a multi-second impulse is far too slow for the
//! audio path, so this uses uniform partitioned convolution: the impulse is
//! split into equal partitions whose spectra are precomputed once, and at
//! runtime each input block is transformed, multiplied against every
//! partition via a frequency-domain delay line, and overlap-added back into
//! the time domain.
//!
//! Input arrives in arbitrary block sizes; samples are gathered into
//! partition-sized chunks internally, which adds a fixed latency of one
//! partition. All FFT work buffers are preallocated, so `process` never
//! allocates.

use std::collections::VecDeque;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Partition size in samples. 256 samples is ~5 ms at 48 kHz, short enough
/// that the fixed latency reads as pre-delay on a reverb tail.
pub const PARTITION_SIZE: usize = 256;

pub struct Convolver {
    part_len: usize,
    fft_len: usize,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    /// Impulse partition spectra, in impulse order.
    partitions: Vec<Vec<Complex<f32>>>,
    /// Ring of past input-block spectra; slot `hist_pos` holds the newest.
    history: Vec<Vec<Complex<f32>>>,
    hist_pos: usize,
    input_accum: Vec<f32>,
    input_fill: usize,
    overlap: Vec<f32>,
    output: VecDeque<f32>,
    work: Vec<Complex<f32>>,
    acc: Vec<Complex<f32>>,
    fft_scratch: Vec<Complex<f32>>,
}

impl Convolver {
    pub fn new(impulse: &[f32]) -> Self {
        Self::with_partition_size(impulse, PARTITION_SIZE)
    }

    pub fn with_partition_size(impulse: &[f32], part_len: usize) -> Self {
        assert!(part_len >= 2, "partition size must hold at least two samples");

        let fft_len = part_len * 2;
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_len);
        let ifft = planner.plan_fft_inverse(fft_len);

        let num_partitions = impulse.len().div_ceil(part_len).max(1);
        let mut partitions = Vec::with_capacity(num_partitions);
        let mut chunk_buf = vec![Complex::new(0.0, 0.0); fft_len];
        let mut scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        for p in 0..num_partitions {
            chunk_buf.fill(Complex::new(0.0, 0.0));
            let start = p * part_len;
            let end = (start + part_len).min(impulse.len());
            for (slot, &h) in chunk_buf.iter_mut().zip(&impulse[start..end]) {
                *slot = Complex::new(h, 0.0);
            }
            fft.process_with_scratch(&mut chunk_buf, &mut scratch);
            partitions.push(chunk_buf.clone());
        }

        let history = vec![vec![Complex::new(0.0, 0.0); fft_len]; num_partitions];
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());

        Self {
            part_len,
            fft_len,
            fft,
            ifft,
            partitions,
            history,
            hist_pos: 0,
            input_accum: vec![0.0; part_len],
            input_fill: 0,
            overlap: vec![0.0; part_len],
            output: VecDeque::with_capacity(fft_len),
            work: vec![Complex::new(0.0, 0.0); fft_len],
            acc: vec![Complex::new(0.0, 0.0); fft_len],
            fft_scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        }
    }

    /// Fixed processing latency in samples.
    pub fn latency(&self) -> usize {
        self.part_len - 1
    }

    /// Convolve a block. `out` receives exactly `input.len()` samples,
    /// delayed by `latency()` relative to the input.
    pub fn process(&mut self, input: &[f32], out: &mut [f32]) {
        debug_assert_eq!(input.len(), out.len());

        for (&x, o) in input.iter().zip(out.iter_mut()) {
            self.input_accum[self.input_fill] = x;
            self.input_fill += 1;
            if self.input_fill == self.part_len {
                self.flush_block();
            }
            *o = self.output.pop_front().unwrap_or(0.0);
        }
    }

    fn flush_block(&mut self) {
        let n = self.history.len();

        // Transform the gathered input block (zero-padded to 2P)
        self.work.fill(Complex::new(0.0, 0.0));
        for (slot, &x) in self.work.iter_mut().zip(&self.input_accum) {
            *slot = Complex::new(x, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.work, &mut self.fft_scratch);

        // Newest spectrum takes the slot ahead of the previous newest
        self.hist_pos = (self.hist_pos + n - 1) % n;
        self.history[self.hist_pos].copy_from_slice(&self.work);

        // Multiply-accumulate each partition against its matching past block
        self.acc.fill(Complex::new(0.0, 0.0));
        for (age, partition) in self.partitions.iter().enumerate() {
            let spectrum = &self.history[(self.hist_pos + age) % n];
            for ((a, &s), &p) in self.acc.iter_mut().zip(spectrum).zip(partition) {
                *a += s * p;
            }
        }

        self.ifft
            .process_with_scratch(&mut self.acc, &mut self.fft_scratch);

        // Overlap-add: first half is output, second half carries over
        let scale = 1.0 / self.fft_len as f32;
        for k in 0..self.part_len {
            self.output.push_back(self.acc[k].re * scale + self.overlap[k]);
        }
        for k in 0..self.part_len {
            self.overlap[k] = self.acc[self.part_len + k].re * scale;
        }

        self.input_fill = 0;
    }

    pub fn reset(&mut self) {
        for spectrum in &mut self.history {
            spectrum.fill(Complex::new(0.0, 0.0));
        }
        self.overlap.fill(0.0);
        self.output.clear();
        self.input_fill = 0;
    }
}
