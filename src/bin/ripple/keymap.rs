//! Computer-keyboard note mapping.
//!
//! Modelled after common DAW computer-keyboard layouts: the home row
//! covers one octave of naturals from C, the number/QWERTY row above
//! carries the sharps, and the right-hand keys continue into the next
//! octave. The engine never sees raw key codes, only (note, offset) pairs.

use ripple_dsp::pitch::NoteName;

/// Translate a pressed character into a logical note and octave offset
/// relative to the engine's base octave.
pub fn note_for_key(key: char) -> Option<(NoteName, i32)> {
    let mapping = match key {
        'a' => (NoteName::C, 0),
        'w' => (NoteName::Cs, 0),
        's' => (NoteName::D, 0),
        'e' => (NoteName::Ds, 0),
        'd' => (NoteName::E, 0),
        'f' => (NoteName::F, 0),
        't' => (NoteName::Fs, 0),
        'g' => (NoteName::G, 0),
        'y' => (NoteName::Gs, 0),
        'h' => (NoteName::A, 0),
        'u' => (NoteName::As, 0),
        'j' => (NoteName::B, 0),
        // Continue into the second octave
        'k' => (NoteName::C, 1),
        'o' => (NoteName::Cs, 1),
        'l' => (NoteName::D, 1),
        'p' => (NoteName::Ds, 1),
        ';' => (NoteName::E, 1),
        _ => return None,
    };
    Some(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_row_covers_an_octave_of_naturals() {
        assert_eq!(note_for_key('a'), Some((NoteName::C, 0)));
        assert_eq!(note_for_key('j'), Some((NoteName::B, 0)));
        assert_eq!(note_for_key('k'), Some((NoteName::C, 1)));
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        assert_eq!(note_for_key('q'), None);
        assert_eq!(note_for_key('1'), None);
        assert_eq!(note_for_key(' '), None);
    }
}
