//! Display-side state for the terminal UI.
//!
//! The UI keeps its own copy of everything it shows (held keys, parameter
//! read-outs, waveform, octave). It originates every control message, so
//! mirroring the values locally keeps the audio thread free of UI traffic.

use std::collections::HashSet;

use ripple_dsp::{
    dsp::oscillator::Waveform,
    engine::params::Parameter,
    pitch::NoteName,
};

/// One adjustable control row: a parameter plus its raw display value.
#[derive(Clone, Copy, Debug)]
pub struct ControlRow {
    pub parameter: Parameter,
    pub value: f32,
}

impl ControlRow {
    pub fn label(&self) -> &'static str {
        match self.parameter {
            Parameter::Cutoff => "Cutoff",
            Parameter::DelayTime => "Delay",
            Parameter::Feedback => "Feedback",
            Parameter::Mix => "Mix",
            Parameter::ReverbSend => "Reverb",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self.parameter {
            Parameter::Cutoff => "Hz",
            Parameter::DelayTime => "ms",
            _ => "%",
        }
    }

    /// Raw-value bounds for the on-screen control.
    pub fn range(&self) -> (f32, f32) {
        match self.parameter {
            Parameter::Cutoff => (100.0, 12_000.0),
            Parameter::DelayTime => (0.0, 2_000.0),
            _ => (0.0, 100.0),
        }
    }

    pub fn step(&self) -> f32 {
        match self.parameter {
            Parameter::Cutoff => 100.0,
            Parameter::DelayTime => 10.0,
            _ => 5.0,
        }
    }

    /// Position within the control range, for gauge rendering.
    pub fn fraction(&self) -> f64 {
        let (lo, hi) = self.range();
        ((self.value - lo) / (hi - lo)).clamp(0.0, 1.0) as f64
    }
}

pub struct UiState {
    pub waveform: Waveform,
    pub octave: i32,
    pub controls: [ControlRow; 5],
    pub selected: usize,
    /// Notes currently held, as (note, octave offset) pairs, for key
    /// highlighting.
    pub held: HashSet<(NoteName, i32)>,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            waveform: Waveform::Sine,
            octave: 4,
            controls: [
                ControlRow { parameter: Parameter::Cutoff, value: 5_000.0 },
                ControlRow { parameter: Parameter::DelayTime, value: 200.0 },
                ControlRow { parameter: Parameter::Feedback, value: 30.0 },
                ControlRow { parameter: Parameter::Mix, value: 50.0 },
                ControlRow { parameter: Parameter::ReverbSend, value: 0.0 },
            ],
            selected: 0,
            held: HashSet::new(),
        }
    }

    /// Step the selected control and return (parameter, new raw value).
    pub fn adjust_selected(&mut self, direction: f32) -> (Parameter, f32) {
        let row = &mut self.controls[self.selected];
        let (lo, hi) = row.range();
        row.value = (row.value + row.step() * direction).clamp(lo, hi);
        (row.parameter, row.value)
    }

    /// Restore every displayed value to its default.
    pub fn reset(&mut self) {
        *self = Self {
            selected: self.selected,
            ..Self::new()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_clamps_to_control_range() {
        let mut state = UiState::new();
        state.selected = 3; // mix
        for _ in 0..100 {
            state.adjust_selected(1.0);
        }
        assert_eq!(state.controls[3].value, 100.0);

        for _ in 0..100 {
            state.adjust_selected(-1.0);
        }
        assert_eq!(state.controls[3].value, 0.0);
    }

    #[test]
    fn reset_restores_defaults_but_keeps_selection() {
        let mut state = UiState::new();
        state.selected = 2;
        state.adjust_selected(1.0);
        state.waveform = Waveform::Sawtooth;
        state.octave = 6;

        state.reset();
        assert_eq!(state.controls[2].value, 30.0);
        assert_eq!(state.waveform, Waveform::Sine);
        assert_eq!(state.octave, 4);
        assert_eq!(state.selected, 2);
    }
}
