//! Engine facade: voice lifecycle, parameter discipline, rendering.
//!
//! The `Engine` owns every piece of shared state the synth has: the
//! authoritative parameter targets, the waveform and base octave used for
//! new voices, the voice table, and the lazily-built signal graph. All
//! mutation funnels through its methods on a single control path, so the
//! design needs no locks; a multi-threaded host serializes access by owning
//! the engine on one thread and feeding it `EngineMessage`s.

/// Signal graph topology and per-block rendering.
pub mod graph;
/// Control-message contract between input layer and engine.
pub mod message;
/// Parameter domains, defaults and ramping.
pub mod params;
/// Voice table keyed by note identity.
pub mod voices;

use crate::{
    dsp::oscillator::Waveform,
    pitch::{frequency_of, NoteIdentity, NoteName},
    MAX_BLOCK_SIZE,
};

use self::{
    graph::SignalGraph,
    message::EngineMessage,
    params::{GraphParameters, Parameter, RAMP_LIVE_SECONDS, RAMP_RESET_SECONDS},
    voices::VoiceManager,
};

/// Base octave bounds for the keyboard surface.
pub const OCTAVE_RANGE: (i32, i32) = (1, 7);

const DEFAULT_OCTAVE: i32 = 4;
const DEFAULT_WAVEFORM: Waveform = Waveform::Sine;

pub struct Engine {
    sample_rate: f32,
    params: GraphParameters,
    waveform: Waveform,
    base_octave: i32,
    voices: VoiceManager,
    /// Built on the first note-on and kept for the engine's lifetime;
    /// reset clears voices and parameters but never tears this down.
    graph: Option<SignalGraph>,
    mix_buffer: Vec<f32>,
}

impl Engine {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            params: GraphParameters::default(),
            waveform: DEFAULT_WAVEFORM,
            base_octave: DEFAULT_OCTAVE,
            voices: VoiceManager::new(),
            graph: None,
            mix_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Start a voice for `note` at `base octave + octave_offset`. A second
    /// note-on for an identity that is already sounding is a no-op.
    pub fn note_on(&mut self, note: NoteName, octave_offset: i32) {
        let identity = NoteIdentity::new(note, self.base_octave + octave_offset);
        let frequency = frequency_of(identity.note, identity.octave);

        self.ensure_graph();
        self.voices.note_on(identity, self.waveform, frequency);
    }

    /// Release the voice for `note`, if one is sounding.
    pub fn note_off(&mut self, note: NoteName, octave_offset: i32) {
        let identity = NoteIdentity::new(note, self.base_octave + octave_offset);
        self.voices.note_off(identity);
    }

    /// Clamp `raw` (control-surface units) into the parameter's domain and
    /// apply it: immediately for cutoff, delay time and mix; through a
    /// 100 ms ramp for feedback and reverb send.
    pub fn set_parameter(&mut self, parameter: Parameter, raw: f32) {
        let stored = parameter.store(raw);
        self.params.set(parameter, stored);
        if let Some(graph) = &mut self.graph {
            graph.apply(parameter, stored, RAMP_LIVE_SECONDS);
        }
    }

    /// Authoritative (target) value of a parameter, in its stored domain.
    pub fn parameter(&self, parameter: Parameter) -> f32 {
        self.params.get(parameter)
    }

    /// The value a ramped parameter holds at the current render instant.
    /// Equals `parameter()` once any transition has settled.
    pub fn live_parameter(&mut self, parameter: Parameter) -> f32 {
        match &mut self.graph {
            Some(graph) => graph.live_value(parameter),
            None => self.params.get(parameter),
        }
    }

    /// Waveform used for subsequently created voices.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Move the base octave by `delta`, clamped to `OCTAVE_RANGE`. Affects
    /// only subsequently created voices.
    pub fn shift_octave(&mut self, delta: i32) {
        self.base_octave = (self.base_octave + delta).clamp(OCTAVE_RANGE.0, OCTAVE_RANGE.1);
    }

    pub fn base_octave(&self) -> i32 {
        self.base_octave
    }

    /// Stop every voice and restore all parameters, waveform and octave to
    /// their defaults. Feedback and reverb send glide to their defaults
    /// over a short window; the rest snap.
    pub fn reset(&mut self) {
        self.voices.stop_all();
        self.waveform = DEFAULT_WAVEFORM;
        self.base_octave = DEFAULT_OCTAVE;
        self.params = GraphParameters::default();

        if let Some(graph) = &mut self.graph {
            for parameter in Parameter::ALL {
                graph.apply(parameter, self.params.get(parameter), RAMP_RESET_SECONDS);
            }
        }
    }

    /// Snapshot of every sounding note identity, in pitch order.
    pub fn active_notes(&self) -> Vec<NoteIdentity> {
        self.voices.active()
    }

    /// Apply one control message.
    pub fn apply(&mut self, message: EngineMessage) {
        match message {
            EngineMessage::NoteOn { note, octave_offset } => self.note_on(note, octave_offset),
            EngineMessage::NoteOff { note, octave_offset } => self.note_off(note, octave_offset),
            EngineMessage::SetParameter { parameter, value } => {
                self.set_parameter(parameter, value)
            }
            EngineMessage::SetWaveform(waveform) => self.set_waveform(waveform),
            EngineMessage::ShiftOctave(delta) => self.shift_octave(delta),
            EngineMessage::Reset => self.reset(),
        }
    }

    /// Render one stereo block. Before the first note-on there is no graph
    /// and the output is silence. Longer spans than `MAX_BLOCK_SIZE` are
    /// rendered in chunks internally.
    pub fn render_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());

        let Some(graph) = &mut self.graph else {
            left.fill(0.0);
            right.fill(0.0);
            return;
        };

        let mut offset = 0;
        while offset < left.len() {
            let n = (left.len() - offset).min(MAX_BLOCK_SIZE);
            let mix = &mut self.mix_buffer[..n];
            self.voices.render_mix(mix, self.sample_rate);
            graph.process(
                mix,
                &mut left[offset..offset + n],
                &mut right[offset..offset + n],
            );
            offset += n;
        }
    }

    /// Frames rendered since the graph was built (0 before first note-on).
    pub fn frames_rendered(&self) -> u64 {
        self.graph.as_ref().map_or(0, SignalGraph::frames_rendered)
    }

    fn ensure_graph(&mut self) {
        if self.graph.is_none() {
            self.graph = Some(SignalGraph::new(self.sample_rate, &self.params));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_is_built_lazily_on_first_note_on() {
        let mut engine = Engine::new(8_000.0);
        assert!(engine.graph.is_none());

        engine.note_on(NoteName::C, 0);
        assert!(engine.graph.is_some());

        // Subsequent note-ons reuse the same graph
        let mut left = vec![0.0; 64];
        let mut right = vec![0.0; 64];
        engine.render_block(&mut left, &mut right);
        let frames = engine.frames_rendered();

        engine.note_on(NoteName::E, 0);
        assert_eq!(engine.frames_rendered(), frames, "graph must not be rebuilt");
    }

    #[test]
    fn renders_silence_before_any_note() {
        let mut engine = Engine::new(8_000.0);
        let mut left = vec![1.0; 64];
        let mut right = vec![1.0; 64];
        engine.render_block(&mut left, &mut right);
        assert!(left.iter().all(|&s| s == 0.0));
        assert!(right.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn note_identity_uses_base_octave_plus_offset() {
        let mut engine = Engine::new(8_000.0);
        engine.shift_octave(1); // base 5
        engine.note_on(NoteName::D, 1);

        assert_eq!(
            engine.active_notes(),
            vec![NoteIdentity::new(NoteName::D, 6)]
        );
    }

    #[test]
    fn octave_is_clamped_to_range() {
        let mut engine = Engine::new(8_000.0);
        engine.shift_octave(-10);
        assert_eq!(engine.base_octave(), OCTAVE_RANGE.0);
        engine.shift_octave(100);
        assert_eq!(engine.base_octave(), OCTAVE_RANGE.1);
    }

    #[test]
    fn octave_shift_does_not_move_sounding_voices() {
        let mut engine = Engine::new(8_000.0);
        engine.note_on(NoteName::A, 0);
        engine.shift_octave(1);

        // The sounding voice keeps its original identity; releasing at the
        // new octave misses it
        engine.note_off(NoteName::A, 0);
        assert_eq!(
            engine.active_notes(),
            vec![NoteIdentity::new(NoteName::A, 4)]
        );
    }

    #[test]
    fn reset_restores_defaults_and_clears_voices() {
        let mut engine = Engine::new(8_000.0);
        engine.note_on(NoteName::C, 0);
        engine.note_on(NoteName::G, 1);
        engine.set_waveform(Waveform::Sawtooth);
        engine.shift_octave(2);
        engine.set_parameter(Parameter::Cutoff, 900.0);
        engine.set_parameter(Parameter::Feedback, 80.0);

        engine.reset();

        assert!(engine.active_notes().is_empty());
        assert_eq!(engine.waveform(), Waveform::Sine);
        assert_eq!(engine.base_octave(), 4);
        for parameter in Parameter::ALL {
            assert_eq!(
                engine.parameter(parameter),
                GraphParameters::default().get(parameter)
            );
        }
    }

    #[test]
    fn parameters_set_before_graph_apply_at_construction() {
        let mut engine = Engine::new(8_000.0);
        engine.set_parameter(Parameter::Mix, 100.0);
        engine.set_parameter(Parameter::Feedback, 60.0);

        engine.note_on(NoteName::C, 0);
        assert_eq!(engine.live_parameter(Parameter::Mix), 1.0);
        assert_eq!(engine.live_parameter(Parameter::Feedback), 0.6);
    }
}
