//! cadenza-core: Music theory engine for scales, chords and progressions
//!
//! Everything here is a pure function over small value types: no I/O, no
//! shared mutable state. The scale and chord tables are `&'static` data.

pub mod chord;
mod error;
pub mod pitch;
pub mod progression;
pub mod scale;
pub mod voice_leading;

pub use chord::{
    generate_chord, generate_diatonic_chords, generate_diatonic_chords_sized, invert_chord,
    roman_numeral, Chord, ChordQuality, DiatonicChord, HarmonicFunction, Voicing,
};
pub use error::{Result, TheoryError};
pub use pitch::{
    frequency_to_pitch, interval_name, name_to_pitch, pitch_to_frequency, pitch_to_name, Pitch,
};
pub use progression::{generate_progression, Progression, ProgressionStep};
pub use scale::{generate_scale, quantize_to_scale, scale_note_names, Key, ScaleKind};
pub use voice_leading::{best_voicing, voice_lead, voice_leading_distance, VoiceLeading};
