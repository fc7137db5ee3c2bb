//! Pitch numbers, pitch names and frequencies
//!
//! Pitch numbers follow the MIDI layout: 0-127, one step per semitone, with
//! 69 sounding at 440 Hz. Names use sharps only and number octaves as
//! `pitch / 12`, so 0 is "C0", 60 is "C5", 69 is "A5" and 127 is "G10".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TheoryError};

pub const MAX_PITCH: u8 = 127;

/// Pitch number that sounds at [`REFERENCE_FREQUENCY`]
pub const REFERENCE_PITCH: u8 = 69;
pub const REFERENCE_FREQUENCY: f64 = 440.0;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

const INTERVAL_NAMES: [&str; 13] = [
    "unison",
    "minor second",
    "major second",
    "minor third",
    "major third",
    "perfect fourth",
    "tritone",
    "perfect fifth",
    "minor sixth",
    "major sixth",
    "minor seventh",
    "major seventh",
    "octave",
];

/// A semitone-quantized pitch, guaranteed to lie in 0-127
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Pitch(u8);

impl Pitch {
    pub fn new(value: u8) -> Result<Self> {
        if value > MAX_PITCH {
            return Err(TheoryError::Range(value as i32));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Pitch class, 0 = C through 11 = B
    pub fn pitch_class(self) -> u8 {
        self.0 % 12
    }

    pub fn octave(self) -> u8 {
        self.0 / 12
    }

    /// Move by a signed number of semitones. Fails rather than clamping.
    pub fn transpose(self, semitones: i32) -> Result<Self> {
        Self::try_from(self.0 as i32 + semitones)
    }

    /// Signed semitone distance from `self` up to `other`
    pub fn interval_to(self, other: Pitch) -> i32 {
        other.0 as i32 - self.0 as i32
    }

    pub fn name(self) -> String {
        format!("{}{}", NOTE_NAMES[self.pitch_class() as usize], self.octave())
    }

    pub fn frequency(self) -> f64 {
        pitch_to_frequency(self)
    }
}

impl TryFrom<i32> for Pitch {
    type Error = TheoryError;

    fn try_from(value: i32) -> Result<Self> {
        if !(0..=MAX_PITCH as i32).contains(&value) {
            return Err(TheoryError::Range(value));
        }
        Ok(Self(value as u8))
    }
}

impl TryFrom<u8> for Pitch {
    type Error = TheoryError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Pitch> for u8 {
    fn from(pitch: Pitch) -> Self {
        pitch.0
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Pitch {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self> {
        name_to_pitch(s)
    }
}

/// Render a raw pitch number as a name such as "C5" or "F#3"
pub fn pitch_to_name(pitch: u8) -> Result<String> {
    Ok(Pitch::new(pitch)?.name())
}

/// Parse `<letter>[#|b]<octave>`, e.g. "C5", "f#3", "Bb2"
pub fn name_to_pitch(name: &str) -> Result<Pitch> {
    let invalid = || TheoryError::InvalidName(name.to_string());
    let trimmed = name.trim();
    let mut chars = trimmed.chars();

    let letter = chars.next().ok_or_else(invalid)?;
    let pitch_class: i32 = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(invalid()),
    };

    let rest = chars.as_str();
    let (accidental, digits) = match rest.chars().next() {
        Some('#') => (1, &rest[1..]),
        Some('b') => (-1, &rest[1..]),
        _ => (0, rest),
    };

    if digits.is_empty() || digits.len() > 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let octave: i32 = digits.parse().map_err(|_| invalid())?;

    Pitch::try_from(octave * 12 + pitch_class + accidental)
}

/// Equal-tempered frequency in Hz: `440 * 2^((pitch - 69) / 12)`
pub fn pitch_to_frequency(pitch: Pitch) -> f64 {
    let offset = pitch.value() as f64 - REFERENCE_PITCH as f64;
    REFERENCE_FREQUENCY * 2.0_f64.powf(offset / 12.0)
}

/// Nearest pitch to a frequency in Hz
pub fn frequency_to_pitch(frequency: f64) -> Result<Pitch> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(TheoryError::Validation(format!(
            "frequency must be a positive number, got {frequency}"
        )));
    }
    let exact = REFERENCE_PITCH as f64 + 12.0 * (frequency / REFERENCE_FREQUENCY).log2();
    // `as` saturates, so huge values still land outside 0-127
    Pitch::try_from(exact.round() as i32)
}

/// Name of an interval from 0 (unison) to 12 (octave) semitones
pub fn interval_name(semitones: i32) -> Result<&'static str> {
    usize::try_from(semitones)
        .ok()
        .and_then(|idx| INTERVAL_NAMES.get(idx).copied())
        .ok_or(TheoryError::IntervalRange(semitones))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pitch_names() {
        assert_eq!(pitch_to_name(60).unwrap(), "C5");
        assert_eq!(pitch_to_name(69).unwrap(), "A5");
        assert_eq!(pitch_to_name(0).unwrap(), "C0");
        assert_eq!(pitch_to_name(61).unwrap(), "C#5");
        assert_eq!(pitch_to_name(127).unwrap(), "G10");
        assert_eq!(pitch_to_name(128), Err(TheoryError::Range(128)));
    }

    #[test]
    fn test_name_round_trip() {
        for p in 0..=MAX_PITCH {
            let name = pitch_to_name(p).unwrap();
            assert_eq!(name_to_pitch(&name).unwrap().value(), p, "{name}");
        }
    }

    #[test]
    fn test_name_parsing_variants() {
        assert_eq!(name_to_pitch("f#3").unwrap().value(), 42);
        assert_eq!(name_to_pitch("Bb2").unwrap().value(), 34);
        assert_eq!(name_to_pitch(" C5 ").unwrap().value(), 60);
        assert_eq!("A5".parse::<Pitch>().unwrap().value(), 69);
    }

    #[test]
    fn test_invalid_names() {
        for bad in ["", "H4", "C", "C#", "5C", "C-1", "C#x", "Cb", "C123", "C##4"] {
            assert_eq!(
                name_to_pitch(bad),
                Err(TheoryError::InvalidName(bad.to_string())),
                "{bad:?}"
            );
        }
        // Well-formed but outside 0-127
        assert_eq!(name_to_pitch("G#10"), Err(TheoryError::Range(128)));
        assert_eq!(name_to_pitch("Cb0"), Err(TheoryError::Range(-1)));
    }

    #[test]
    fn test_frequency() {
        let a = Pitch::new(69).unwrap();
        assert_eq!(pitch_to_frequency(a), 440.0);
        assert_relative_eq!(Pitch::new(57).unwrap().frequency(), 220.0, epsilon = 1e-9);
        assert_relative_eq!(Pitch::new(81).unwrap().frequency(), 880.0, epsilon = 1e-9);
        assert_relative_eq!(Pitch::new(60).unwrap().frequency(), 261.625_565, epsilon = 1e-5);
    }

    #[test]
    fn test_frequency_to_pitch() {
        assert_eq!(frequency_to_pitch(440.0).unwrap().value(), 69);
        assert_eq!(frequency_to_pitch(445.0).unwrap().value(), 69);
        assert_eq!(frequency_to_pitch(261.0).unwrap().value(), 60);
        assert!(matches!(frequency_to_pitch(0.0), Err(TheoryError::Validation(_))));
        assert!(matches!(frequency_to_pitch(f64::NAN), Err(TheoryError::Validation(_))));
        assert!(matches!(frequency_to_pitch(50_000.0), Err(TheoryError::Range(_))));
    }

    #[test]
    fn test_interval_names() {
        assert_eq!(interval_name(0).unwrap(), "unison");
        assert_eq!(interval_name(6).unwrap(), "tritone");
        assert_eq!(interval_name(7).unwrap(), "perfect fifth");
        assert_eq!(interval_name(12).unwrap(), "octave");
        assert_eq!(interval_name(13), Err(TheoryError::IntervalRange(13)));
        assert_eq!(interval_name(-1), Err(TheoryError::IntervalRange(-1)));
    }

    #[test]
    fn test_transpose_fails_out_of_range() {
        let p = Pitch::new(120).unwrap();
        assert_eq!(p.transpose(7).unwrap().value(), 127);
        assert_eq!(p.transpose(8), Err(TheoryError::Range(128)));
        assert_eq!(Pitch::new(3).unwrap().transpose(-4), Err(TheoryError::Range(-1)));
    }

    #[test]
    fn test_interval_to() {
        let c = Pitch::new(60).unwrap();
        let g = Pitch::new(67).unwrap();
        assert_eq!(c.interval_to(g), 7);
        assert_eq!(g.interval_to(c), -7);
        assert_eq!(c.interval_to(c), 0);
    }

    #[test]
    fn test_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<Pitch>("127").is_ok());
        assert!(serde_json::from_str::<Pitch>("128").is_err());
        assert_eq!(serde_json::to_string(&Pitch::new(60).unwrap()).unwrap(), "60");
    }
}
