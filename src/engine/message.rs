#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::{
    dsp::oscillator::Waveform,
    engine::params::Parameter,
    pitch::NoteName,
};

/// Control messages from the input layer to the engine.
///
/// Notes arrive as (name, octave offset) pairs relative to the engine's
/// base octave, matching what a keyboard surface produces. Parameter values
/// are raw control-surface units and are clamped by the engine.
#[derive(Debug, Copy, Clone)]
pub enum EngineMessage {
    NoteOn { note: NoteName, octave_offset: i32 },
    NoteOff { note: NoteName, octave_offset: i32 },
    SetParameter { parameter: Parameter, value: f32 },
    SetWaveform(Waveform),
    ShiftOctave(i32),
    Reset,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<EngineMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<EngineMessage> {
    fn pop(&mut self) -> Option<EngineMessage> {
        Consumer::pop(self).ok()
    }
}
