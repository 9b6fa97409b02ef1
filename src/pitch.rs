use std::fmt;
use std::str::FromStr;

/*
Equal-Tempered Pitch Model
==========================

Everything audible in this crate starts from a (note name, octave) pair.
The twelve chromatic note names map onto semitone indices, and the pair
maps onto a linear MIDI-style pitch index:

    midi = (octave + 1) * 12 + chromatic_index

Frequency follows A440 tuning: A4 is MIDI note 69 at exactly 440 Hz, and
each semitone is a factor of 2^(1/12):

    freq = 440 * 2^((midi - 69) / 12)

So C4 (middle C) = MIDI 60 ≈ 261.63 Hz, C5 = 72 ≈ 523.25 Hz, etc.

The note-name vocabulary is a closed set of twelve symbols. Anything else
is a caller bug, surfaced as `InvalidNoteName` at the parse boundary rather
than silently defaulted.
*/

/// The twelve chromatic note names, C through B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteName {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl NoteName {
    /// All twelve names in chromatic order, for keyboard construction.
    pub const ALL: [NoteName; 12] = [
        NoteName::C,
        NoteName::Cs,
        NoteName::D,
        NoteName::Ds,
        NoteName::E,
        NoteName::F,
        NoteName::Fs,
        NoteName::G,
        NoteName::Gs,
        NoteName::A,
        NoteName::As,
        NoteName::B,
    ];

    /// Semitone offset within the octave (C = 0 .. B = 11).
    pub fn chromatic_index(self) -> i32 {
        match self {
            NoteName::C => 0,
            NoteName::Cs => 1,
            NoteName::D => 2,
            NoteName::Ds => 3,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::Fs => 6,
            NoteName::G => 7,
            NoteName::Gs => 8,
            NoteName::A => 9,
            NoteName::As => 10,
            NoteName::B => 11,
        }
    }

    /// Display label, sharps spelled with `#`.
    pub fn label(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::Cs => "C#",
            NoteName::D => "D",
            NoteName::Ds => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::Fs => "F#",
            NoteName::G => "G",
            NoteName::Gs => "G#",
            NoteName::A => "A",
            NoteName::As => "A#",
            NoteName::B => "B",
        }
    }

    /// Whether this is a sharp (black) key.
    pub fn is_sharp(self) -> bool {
        matches!(
            self,
            NoteName::Cs | NoteName::Ds | NoteName::Fs | NoteName::Gs | NoteName::As
        )
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error for a note-name symbol outside the chromatic vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidNoteName(pub String);

impl fmt::Display for InvalidNoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid note name: {:?}", self.0)
    }
}

impl std::error::Error for InvalidNoteName {}

impl FromStr for NoteName {
    type Err = InvalidNoteName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteName::ALL
            .iter()
            .copied()
            .find(|n| n.label() == s)
            .ok_or_else(|| InvalidNoteName(s.to_string()))
    }
}

/// Unique identity of a sounding pitch: note name plus absolute octave.
///
/// Two note-on events with the same identity refer to the same voice; the
/// voice manager never holds more than one voice per identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteIdentity {
    pub note: NoteName,
    pub octave: i32,
}

impl NoteIdentity {
    pub fn new(note: NoteName, octave: i32) -> Self {
        Self { note, octave }
    }

    /// Linear pitch index (MIDI numbering, C-1 = 0).
    pub fn midi_index(self) -> i32 {
        (self.octave + 1) * 12 + self.note.chromatic_index()
    }
}

impl fmt::Display for NoteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.note, self.octave)
    }
}

/// Fundamental frequency of a note in Hz, A440 equal temperament.
pub fn frequency_of(note: NoteName, octave: i32) -> f32 {
    let midi = NoteIdentity::new(note, octave).midi_index();
    440.0 * 2.0_f32.powf((midi - 69) as f32 / 12.0)
}
