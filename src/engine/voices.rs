use std::collections::HashMap;

use crate::{
    dsp::oscillator::{Oscillator, Waveform},
    pitch::NoteIdentity,
    MAX_BLOCK_SIZE,
};

/// One currently-sounding oscillator.
///
/// Frequency and waveform are fixed at note-on; later waveform or octave
/// changes only affect voices created afterwards. The running flag makes
/// `stop` idempotent, so stopping a voice that already halted is harmless.
pub struct Voice {
    identity: NoteIdentity,
    frequency_hz: f32,
    osc: Oscillator,
    running: bool,
}

impl Voice {
    fn new(identity: NoteIdentity, waveform: Waveform, frequency_hz: f32) -> Self {
        Self {
            identity,
            frequency_hz,
            osc: Oscillator::new(waveform),
            running: true,
        }
    }

    pub fn identity(&self) -> NoteIdentity {
        self.identity
    }

    pub fn frequency(&self) -> f32 {
        self.frequency_hz
    }

    pub fn waveform(&self) -> Waveform {
        self.osc.waveform()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn stop(&mut self) {
        self.running = false;
    }
}

/// Owns every sounding voice, keyed by note identity.
///
/// The map enforces the at-most-one-voice-per-identity invariant: a note-on
/// for an identity that is already sounding is a no-op, and a note-off for
/// a silent identity is a no-op.
pub struct VoiceManager {
    voices: HashMap<NoteIdentity, Voice>,
    temp_buffer: Vec<f32>,
}

impl VoiceManager {
    pub fn new() -> Self {
        Self {
            voices: HashMap::new(),
            temp_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Start a voice for `identity` unless one is already sounding.
    /// Returns true if a voice was created.
    pub fn note_on(&mut self, identity: NoteIdentity, waveform: Waveform, frequency_hz: f32) -> bool {
        if self.voices.contains_key(&identity) {
            return false;
        }
        self.voices
            .insert(identity, Voice::new(identity, waveform, frequency_hz));
        true
    }

    /// Stop and remove the voice for `identity`, if any.
    /// Returns true if a voice was removed.
    pub fn note_off(&mut self, identity: NoteIdentity) -> bool {
        match self.voices.remove(&identity) {
            Some(mut voice) => {
                voice.stop();
                true
            }
            None => false,
        }
    }

    /// Snapshot of every sounding identity, in pitch order.
    pub fn active(&self) -> Vec<NoteIdentity> {
        let mut ids: Vec<NoteIdentity> = self.voices.keys().copied().collect();
        ids.sort_by_key(|id| id.midi_index());
        ids
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Stop every voice and clear the table. Each voice is stopped
    /// individually so one already-halted voice cannot abort the sweep.
    pub fn stop_all(&mut self) {
        for (_, voice) in self.voices.iter_mut() {
            voice.stop();
        }
        self.voices.clear();
    }

    /// Sum all running voices into `out` (overwrites the buffer).
    pub fn render_mix(&mut self, out: &mut [f32], sample_rate: f32) {
        out.fill(0.0);

        for voice in self.voices.values_mut() {
            if !voice.running {
                continue;
            }
            let temp = &mut self.temp_buffer[..out.len()];
            voice.osc.render(temp, voice.frequency_hz, sample_rate);

            for (o, v) in out.iter_mut().zip(temp.iter()) {
                *o += v;
            }
        }
    }
}

impl Default for VoiceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::{frequency_of, NoteName};

    fn id(note: NoteName, octave: i32) -> NoteIdentity {
        NoteIdentity::new(note, octave)
    }

    #[test]
    fn note_on_is_idempotent_per_identity() {
        let mut voices = VoiceManager::new();
        let c4 = id(NoteName::C, 4);
        let freq = frequency_of(NoteName::C, 4);

        assert!(voices.note_on(c4, Waveform::Sine, freq));
        for _ in 0..5 {
            assert!(!voices.note_on(c4, Waveform::Sine, freq));
        }

        let active = voices.active();
        assert_eq!(active, vec![c4]);
    }

    #[test]
    fn note_off_twice_is_a_noop() {
        let mut voices = VoiceManager::new();
        let a4 = id(NoteName::A, 4);

        voices.note_on(a4, Waveform::Sine, 440.0);
        assert!(voices.note_off(a4));
        assert!(!voices.note_off(a4));
        assert!(voices.is_empty());
    }

    #[test]
    fn same_note_in_different_octaves_are_distinct_voices() {
        let mut voices = VoiceManager::new();

        voices.note_on(id(NoteName::E, 3), Waveform::Sine, frequency_of(NoteName::E, 3));
        voices.note_on(id(NoteName::E, 4), Waveform::Sine, frequency_of(NoteName::E, 4));

        assert_eq!(voices.len(), 2);
    }

    #[test]
    fn voice_keeps_frequency_fixed_at_note_on() {
        let mut voices = VoiceManager::new();
        let g4 = id(NoteName::G, 4);
        let freq = frequency_of(NoteName::G, 4);

        voices.note_on(g4, Waveform::Sawtooth, freq);
        let voice = voices.voices.get(&g4).unwrap();
        assert_eq!(voice.frequency(), freq);
        assert_eq!(voice.waveform(), Waveform::Sawtooth);
    }

    #[test]
    fn stop_all_clears_every_voice() {
        let mut voices = VoiceManager::new();
        for octave in 2..6 {
            voices.note_on(id(NoteName::C, octave), Waveform::Sine, 100.0);
        }
        assert_eq!(voices.len(), 4);

        voices.stop_all();
        assert!(voices.is_empty());
        assert!(voices.active().is_empty());
    }

    #[test]
    fn render_mix_sums_voices() {
        let mut voices = VoiceManager::new();
        let sample_rate = 48_000.0;

        voices.note_on(id(NoteName::A, 4), Waveform::Sine, 440.0);
        let mut single = vec![0.0f32; 128];
        voices.render_mix(&mut single, sample_rate);

        let mut voices = VoiceManager::new();
        voices.note_on(id(NoteName::A, 4), Waveform::Sine, 440.0);
        voices.note_on(id(NoteName::A, 5), Waveform::Sine, 880.0);
        let mut pair = vec![0.0f32; 128];
        voices.render_mix(&mut pair, sample_rate);

        let single_peak = single.iter().fold(0.0f32, |a, &x| a.max(x.abs()));
        let pair_peak = pair.iter().fold(0.0f32, |a, &x| a.max(x.abs()));
        assert!(pair_peak > single_peak, "two voices should sum louder than one");
    }

    #[test]
    fn render_mix_is_silent_with_no_voices() {
        let mut voices = VoiceManager::new();
        let mut out = vec![1.0f32; 64];
        voices.render_mix(&mut out, 48_000.0);
        assert!(out.iter().all(|&s| s == 0.0));
    }
}
