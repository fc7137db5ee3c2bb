//! Scale definitions, keys and scale generation

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

use crate::error::{Result, TheoryError};
use crate::pitch::{Pitch, MAX_PITCH};

// ============================================================================
// Scale Types
// ============================================================================

/// Scale/mode types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "camelCase")]
pub enum ScaleKind {
    Major,
    MinorNatural,
    MinorHarmonic,
    MinorMelodic,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Locrian,
    MajorPentatonic,
    MinorPentatonic,
    Blues,
    WholeTone,
    Chromatic,
    DiminishedHalfWhole,
    DiminishedWholeHalf,
}

impl ScaleKind {
    /// Get scale intervals (semitones from root)
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Self::Major => &[0, 2, 4, 5, 7, 9, 11],
            Self::MinorNatural => &[0, 2, 3, 5, 7, 8, 10],
            Self::MinorHarmonic => &[0, 2, 3, 5, 7, 8, 11],
            Self::MinorMelodic => &[0, 2, 3, 5, 7, 9, 11],
            Self::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Self::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            Self::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            Self::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            Self::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            Self::MajorPentatonic => &[0, 2, 4, 7, 9],
            Self::MinorPentatonic => &[0, 3, 5, 7, 10],
            Self::Blues => &[0, 3, 5, 6, 7, 10],
            Self::WholeTone => &[0, 2, 4, 6, 8, 10],
            Self::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            Self::DiminishedHalfWhole => &[0, 1, 3, 4, 6, 7, 9, 10],
            Self::DiminishedWholeHalf => &[0, 2, 3, 5, 6, 8, 9, 11],
        }
    }

    /// Number of distinct notes per octave
    pub fn cardinality(&self) -> usize {
        self.intervals().len()
    }

    /// Identifier used for parsing and serialization
    pub fn id(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::MinorNatural => "minorNatural",
            Self::MinorHarmonic => "minorHarmonic",
            Self::MinorMelodic => "minorMelodic",
            Self::Dorian => "dorian",
            Self::Phrygian => "phrygian",
            Self::Lydian => "lydian",
            Self::Mixolydian => "mixolydian",
            Self::Locrian => "locrian",
            Self::MajorPentatonic => "majorPentatonic",
            Self::MinorPentatonic => "minorPentatonic",
            Self::Blues => "blues",
            Self::WholeTone => "wholeTone",
            Self::Chromatic => "chromatic",
            Self::DiminishedHalfWhole => "diminishedHalfWhole",
            Self::DiminishedWholeHalf => "diminishedWholeHalf",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::MinorNatural => "Natural Minor",
            Self::MinorHarmonic => "Harmonic Minor",
            Self::MinorMelodic => "Melodic Minor",
            Self::Dorian => "Dorian",
            Self::Phrygian => "Phrygian",
            Self::Lydian => "Lydian",
            Self::Mixolydian => "Mixolydian",
            Self::Locrian => "Locrian",
            Self::MajorPentatonic => "Major Pentatonic",
            Self::MinorPentatonic => "Minor Pentatonic",
            Self::Blues => "Blues",
            Self::WholeTone => "Whole Tone",
            Self::Chromatic => "Chromatic",
            Self::DiminishedHalfWhole => "Diminished (half-whole)",
            Self::DiminishedWholeHalf => "Diminished (whole-half)",
        }
    }
}

impl fmt::Display for ScaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lowercase with separators removed, so "minor_harmonic", "Minor Harmonic"
/// and "minorHarmonic" all compare equal.
pub(crate) fn normalize_id(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for ScaleKind {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self> {
        use strum::IntoEnumIterator;

        let wanted = normalize_id(s);
        let alias = match wanted.as_str() {
            "ionian" => Some(Self::Major),
            "minor" | "aeolian" | "naturalminor" => Some(Self::MinorNatural),
            "harmonicminor" => Some(Self::MinorHarmonic),
            "melodicminor" => Some(Self::MinorMelodic),
            "pentatonic" => Some(Self::MajorPentatonic),
            _ => None,
        };
        alias
            .or_else(|| Self::iter().find(|kind| normalize_id(kind.id()) == wanted))
            .ok_or_else(|| TheoryError::UnknownScale(s.to_string()))
    }
}

// ============================================================================
// Key
// ============================================================================

/// A root pitch plus a scale: the context that roman numerals resolve against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub root: Pitch,
    pub scale: ScaleKind,
}

impl Key {
    pub fn new(root: u8, scale: ScaleKind) -> Result<Self> {
        Ok(Self {
            root: Pitch::new(root)?,
            scale,
        })
    }

    /// Whether a pitch's class belongs to this key
    pub fn contains(&self, pitch: Pitch) -> bool {
        self.degree_of(pitch).is_some()
    }

    /// 1-based scale degree of a pitch, or None if not in the key
    pub fn degree_of(&self, pitch: Pitch) -> Option<usize> {
        let relative = (pitch.pitch_class() + 12 - self.root.pitch_class()) % 12;
        self.scale
            .intervals()
            .iter()
            .position(|&iv| iv == relative)
            .map(|idx| idx + 1)
    }

    pub fn notes(&self, octave_count: usize) -> Result<Vec<Pitch>> {
        generate_scale(self.root.value(), self.scale, octave_count)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.root, self.scale)
    }
}

// ============================================================================
// Generation
// ============================================================================

/// Scale pitches over `octave_count` octaves, closed by the top root.
///
/// Returns `intervals().len() * octave_count + 1` pitches. Fails if the root
/// or any generated pitch falls outside 0-127.
///
/// # Example
/// ```
/// use cadenza_core::{generate_scale, ScaleKind};
/// let notes: Vec<u8> = generate_scale(60, ScaleKind::Major, 1)
///     .unwrap()
///     .into_iter()
///     .map(u8::from)
///     .collect();
/// assert_eq!(notes, vec![60, 62, 64, 65, 67, 69, 71, 72]);
/// ```
pub fn generate_scale(root: u8, scale: ScaleKind, octave_count: usize) -> Result<Vec<Pitch>> {
    let root = Pitch::new(root)?;
    if octave_count == 0 {
        return Err(TheoryError::Validation(
            "octave count must be at least 1".to_string(),
        ));
    }

    let top = i32::try_from(octave_count)
        .ok()
        .and_then(|count| count.checked_mul(12))
        .and_then(|span| span.checked_add(root.value() as i32))
        .ok_or(TheoryError::Range(i32::MAX))?;
    if top > MAX_PITCH as i32 {
        return Err(TheoryError::Range(top));
    }

    let intervals = scale.intervals();
    let mut notes = Vec::with_capacity(intervals.len() * octave_count + 1);
    for octave in 0..octave_count as i32 {
        for &interval in intervals {
            notes.push(root.transpose(12 * octave + interval as i32)?);
        }
    }
    notes.push(root.transpose(12 * octave_count as i32)?);
    Ok(notes)
}

/// Same as [`generate_scale`], rendered as pitch names
pub fn scale_note_names(root: u8, scale: ScaleKind, octave_count: usize) -> Result<Vec<String>> {
    Ok(generate_scale(root, scale, octave_count)?
        .into_iter()
        .map(Pitch::name)
        .collect())
}

/// Snap a pitch to the nearest pitch in the key. Equidistant candidates
/// resolve downward.
pub fn quantize_to_scale(pitch: Pitch, key: &Key) -> Pitch {
    if key.contains(pitch) {
        return pitch;
    }
    for distance in 1..=6 {
        for offset in [-distance, distance] {
            if let Ok(candidate) = pitch.transpose(offset) {
                if key.contains(candidate) {
                    return candidate;
                }
            }
        }
    }
    pitch
}
