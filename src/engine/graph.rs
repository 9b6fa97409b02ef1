use crate::{
    dsp::{
        delay::FeedbackDelay,
        filter::LowPassFilter,
        reverb::{ConvolutionReverb, ReverbImpulse},
    },
    engine::params::{GraphParameters, Parameter, Ramp, MAX_DELAY_SECONDS},
    MAX_BLOCK_SIZE,
};

/*
Signal Graph
============

Fixed topology, built once per session and shared by every voice:

  voice mix -> Filter -+-> * dry ----------------------> L, R
                       +-> Delay (feedback cycle) * wet -> L, R
                       +-> Reverb (convolution) * send --> L / R

The three paths are summed linearly with no normalization; overall level is
the player's responsibility via mix, feedback and send settings. The filter
is one instance across the whole polyphonic mix. The delay line closes a
real feedback cycle inside FeedbackDelay, so echoes repeat indefinitely and
only decay because the feedback gain sits below one. The reverb convolves
the filtered signal with a fixed two-channel impulse; its send gain is the
only reverb control.

Feedback and send gains are read through per-sample ramps driven by the
graph's own frame clock; cutoff, delay time and mix are plain settings that
take effect on the next sample.
*/

pub struct SignalGraph {
    sample_rate: f32,
    filter: LowPassFilter,
    delay: FeedbackDelay,
    reverb: ConvolutionReverb,

    delay_samples: usize,
    dry_gain: f32,
    wet_gain: f32,
    feedback: Ramp,
    reverb_send: Ramp,

    /// Frames rendered since construction; the clock that advances ramps.
    frame: u64,

    filtered: Vec<f32>,
    wet: Vec<f32>,
    send_levels: Vec<f32>,
    rev_left: Vec<f32>,
    rev_right: Vec<f32>,
}

impl SignalGraph {
    /// Build the graph from a parameter snapshot. The reverb impulse is
    /// generated here and fixed for the life of the graph.
    pub fn new(sample_rate: f32, params: &GraphParameters) -> Self {
        let impulse = ReverbImpulse::decaying_noise(sample_rate);
        let max_delay = (MAX_DELAY_SECONDS * sample_rate) as usize;

        Self {
            sample_rate,
            filter: LowPassFilter::new(params.cutoff_hz),
            delay: FeedbackDelay::new(max_delay),
            reverb: ConvolutionReverb::new(&impulse),
            delay_samples: (params.delay_seconds * sample_rate).round() as usize,
            dry_gain: 1.0 - params.mix,
            wet_gain: params.mix,
            feedback: Ramp::new(params.feedback),
            reverb_send: Ramp::new(params.reverb_send),
            frame: 0,
            filtered: vec![0.0; MAX_BLOCK_SIZE],
            wet: vec![0.0; MAX_BLOCK_SIZE],
            send_levels: vec![0.0; MAX_BLOCK_SIZE],
            rev_left: vec![0.0; MAX_BLOCK_SIZE],
            rev_right: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame
    }

    /// Apply a stored parameter value. Ramped parameters transition over
    /// `ramp_seconds`; the rest take effect immediately and ignore it.
    pub fn apply(&mut self, parameter: Parameter, stored: f32, ramp_seconds: f32) {
        match parameter {
            Parameter::Cutoff => self.filter.set_cutoff(stored),
            Parameter::DelayTime => {
                self.delay_samples = (stored * self.sample_rate).round() as usize;
            }
            Parameter::Mix => {
                self.wet_gain = stored;
                self.dry_gain = 1.0 - stored;
            }
            Parameter::Feedback => {
                let frames = (ramp_seconds * self.sample_rate) as u64;
                self.feedback.ramp_to(stored, self.frame, frames);
            }
            Parameter::ReverbSend => {
                let frames = (ramp_seconds * self.sample_rate) as u64;
                self.reverb_send.ramp_to(stored, self.frame, frames);
            }
        }
    }

    /// The value a parameter holds at the current render instant: the
    /// interpolated point of an in-flight ramp, or the setting itself.
    pub fn live_value(&mut self, parameter: Parameter) -> f32 {
        match parameter {
            Parameter::Cutoff => self.filter.cutoff(),
            Parameter::DelayTime => self.delay_samples as f32 / self.sample_rate,
            Parameter::Mix => self.wet_gain,
            Parameter::Feedback => self.feedback.value_at(self.frame),
            Parameter::ReverbSend => self.reverb_send.value_at(self.frame),
        }
    }

    /// Route one block of the summed voice mix through the graph.
    ///
    /// `input` is the mono voice mix; `left`/`right` receive the summed
    /// dry, delayed and reverb paths. All three slices share one length,
    /// at most `MAX_BLOCK_SIZE`.
    pub fn process(&mut self, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        let n = input.len();
        debug_assert!(n <= MAX_BLOCK_SIZE);
        debug_assert_eq!(left.len(), n);
        debug_assert_eq!(right.len(), n);

        let filtered = &mut self.filtered[..n];
        filtered.copy_from_slice(input);
        self.filter.render(filtered, self.sample_rate);

        // Delay path, advancing the ramp clocks one sample at a time
        for i in 0..n {
            let frame = self.frame + i as u64;
            let fb = self.feedback.value_at(frame);
            self.send_levels[i] = self.reverb_send.value_at(frame);
            self.wet[i] = self.delay.process(filtered[i], self.delay_samples, fb);
        }

        // Reverb path (stereo tail from the two-channel impulse)
        self.reverb.process(
            &self.filtered[..n],
            &mut self.rev_left[..n],
            &mut self.rev_right[..n],
        );

        // Linear sum of the three paths
        for i in 0..n {
            let center = self.filtered[i] * self.dry_gain + self.wet[i] * self.wet_gain;
            left[i] = center + self.rev_left[i] * self.send_levels[i];
            right[i] = center + self.rev_right[i] * self.send_levels[i];
        }

        self.frame += n as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::params::{RAMP_LIVE_SECONDS, RAMP_RESET_SECONDS};

    const SR: f32 = 8_000.0;

    fn graph_with(mix: f32, feedback: f32, reverb_send: f32) -> SignalGraph {
        let params = GraphParameters {
            cutoff_hz: 20_000.0, // wide open so the filter barely colors tests
            delay_seconds: 0.01,
            feedback,
            mix,
            reverb_send,
        };
        SignalGraph::new(SR, &params)
    }

    fn render(graph: &mut SignalGraph, input: &[f32]) -> (Vec<f32>, Vec<f32>) {
        let mut left = vec![0.0; input.len()];
        let mut right = vec![0.0; input.len()];
        graph.process(input, &mut left, &mut right);
        (left, right)
    }

    #[test]
    fn dry_path_passes_signal_at_zero_mix() {
        let mut graph = graph_with(0.0, 0.0, 0.0);

        let input: Vec<f32> = (0..256).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
        let (left, right) = render(&mut graph, &input);

        assert_eq!(left, right, "dry and delay paths are center-panned");
        let in_peak = input.iter().fold(0.0f32, |a, &x| a.max(x.abs()));
        let out_peak = left.iter().fold(0.0f32, |a, &x| a.max(x.abs()));
        assert!(
            out_peak > in_peak * 0.5,
            "open filter and full dry should keep most of the level"
        );
    }

    #[test]
    fn full_wet_mix_silences_dry_signal() {
        // 100 ms delay at full wet: the first block precedes any echo
        let params = GraphParameters {
            cutoff_hz: 20_000.0,
            delay_seconds: 0.1,
            feedback: 0.0,
            mix: 1.0,
            reverb_send: 0.0,
        };
        let mut graph = SignalGraph::new(SR, &params);

        let input = vec![0.5; 64];
        let (left, _) = render(&mut graph, &input);

        let peak = left.iter().fold(0.0f32, |a, &x| a.max(x.abs()));
        assert!(peak < 1e-6, "fully wet output should be silent before the delay time, peak={peak}");
    }

    #[test]
    fn delayed_signal_arrives_after_delay_time() {
        let params = GraphParameters {
            cutoff_hz: 20_000.0,
            delay_seconds: 0.01, // 80 samples at 8 kHz
            feedback: 0.0,
            mix: 1.0,
            reverb_send: 0.0,
        };
        let mut graph = SignalGraph::new(SR, &params);

        let mut input = vec![0.0; 256];
        input[0] = 1.0;
        let (left, _) = render(&mut graph, &input);

        let before: f32 = left[..79].iter().map(|s| s.abs()).sum();
        assert!(before < 1e-5, "no wet signal before the delay time");
        assert!(left[80].abs() > 0.1, "echo should arrive at the delay time");
    }

    #[test]
    fn reverb_send_adds_a_stereo_tail() {
        let mut graph = graph_with(0.0, 0.0, 1.0);

        let mut input = vec![0.0; 1024];
        for (i, s) in input.iter_mut().enumerate().take(256) {
            *s = (i as f32 * 0.3).sin();
        }
        let (left, right) = render(&mut graph, &input);

        assert_ne!(left, right, "reverb tail should be decorrelated across channels");
        let tail_energy: f32 = left[512..].iter().map(|s| s * s).sum();
        assert!(tail_energy > 1e-6, "expected reverb energy after the source stops");
    }

    #[test]
    fn feedback_ramp_supersedes_previous_ramp() {
        let mut graph = graph_with(0.5, 0.0, 0.0);

        graph.apply(Parameter::Feedback, 0.8, RAMP_LIVE_SECONDS);
        // Render a quarter of the ramp window, then retarget to zero
        let input = vec![0.0; 200];
        render(&mut graph, &input);
        graph.apply(Parameter::Feedback, 0.0, RAMP_LIVE_SECONDS);

        let mid = graph.live_value(Parameter::Feedback);
        assert!(mid > 0.0 && mid < 0.8, "new ramp starts from the live value, got {mid}");

        // Run well past both windows; the superseded target is never held
        let mut peak = 0.0f32;
        for _ in 0..10 {
            render(&mut graph, &input);
            peak = peak.max(graph.live_value(Parameter::Feedback));
        }
        assert!(peak < 0.8, "first target should never be reached, peak={peak}");
        assert_eq!(graph.live_value(Parameter::Feedback), 0.0);
    }

    #[test]
    fn immediate_parameters_take_effect_without_ramp() {
        let mut graph = graph_with(0.5, 0.3, 0.0);

        graph.apply(Parameter::Mix, 1.0, RAMP_RESET_SECONDS);
        assert_eq!(graph.live_value(Parameter::Mix), 1.0);

        graph.apply(Parameter::Cutoff, 800.0, RAMP_RESET_SECONDS);
        assert_eq!(graph.live_value(Parameter::Cutoff), 800.0);

        graph.apply(Parameter::DelayTime, 1.5, RAMP_RESET_SECONDS);
        let stored = graph.live_value(Parameter::DelayTime);
        assert!((stored - 1.5).abs() < 1e-3);
    }

    #[test]
    fn render_clock_advances_with_frames() {
        let mut graph = graph_with(0.5, 0.3, 0.0);
        assert_eq!(graph.frames_rendered(), 0);

        let input = vec![0.0; 96];
        render(&mut graph, &input);
        render(&mut graph, &input);
        assert_eq!(graph.frames_rendered(), 192);
    }

    #[test]
    fn output_is_linear_sum_of_paths() {
        // mix 0.5 halves the dry level next to mix 0.0
        let mut dry_graph = graph_with(0.0, 0.0, 0.0);
        let mut half_graph = graph_with(0.5, 0.0, 0.0);

        // Long delay so the wet path stays silent over the test window
        dry_graph.apply(Parameter::DelayTime, 1.0, 0.0);
        half_graph.apply(Parameter::DelayTime, 1.0, 0.0);

        let input: Vec<f32> = (0..512).map(|i| (i as f32 * 0.02).sin()).collect();
        let (dry, _) = render(&mut dry_graph, &input);
        let (half, _) = render(&mut half_graph, &input);

        for i in 256..512 {
            assert!(
                (half[i] - dry[i] * 0.5).abs() < 1e-4,
                "sample {i}: {} vs {}",
                half[i],
                dry[i] * 0.5
            );
        }
    }
}
