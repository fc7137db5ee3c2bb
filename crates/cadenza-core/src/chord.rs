//! Chord construction, inversion and diatonic harmonization

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::error::{Result, TheoryError};
use crate::pitch::Pitch;
use crate::scale::{normalize_id, ScaleKind};

/// Upper bound on stacked diatonic chords (a 13th chord)
pub const MAX_DIATONIC_SIZE: usize = 7;

pub(crate) const ROMAN_NUMERALS: [&str; 12] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII",
];

const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

// ============================================================================
// Chord Types
// ============================================================================

/// Chord quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "camelCase")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
    Major7,
    Minor7,
    Dominant7,
    Diminished7,
    HalfDiminished7,
    MinorMajor7,
    AugmentedMajor7,
    Add9,
}

impl ChordQuality {
    /// Get chord intervals from root
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Self::Major => &[0, 4, 7],
            Self::Minor => &[0, 3, 7],
            Self::Diminished => &[0, 3, 6],
            Self::Augmented => &[0, 4, 8],
            Self::Sus2 => &[0, 2, 7],
            Self::Sus4 => &[0, 5, 7],
            Self::Major7 => &[0, 4, 7, 11],
            Self::Minor7 => &[0, 3, 7, 10],
            Self::Dominant7 => &[0, 4, 7, 10],
            Self::Diminished7 => &[0, 3, 6, 9],
            Self::HalfDiminished7 => &[0, 3, 6, 10],
            Self::MinorMajor7 => &[0, 3, 7, 11],
            Self::AugmentedMajor7 => &[0, 4, 8, 11],
            Self::Add9 => &[0, 4, 7, 14],
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Diminished => "diminished",
            Self::Augmented => "augmented",
            Self::Sus2 => "sus2",
            Self::Sus4 => "sus4",
            Self::Major7 => "major7",
            Self::Minor7 => "minor7",
            Self::Dominant7 => "dominant7",
            Self::Diminished7 => "diminished7",
            Self::HalfDiminished7 => "halfDiminished7",
            Self::MinorMajor7 => "minorMajor7",
            Self::AugmentedMajor7 => "augmentedMajor7",
            Self::Add9 => "add9",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Minor => "Minor",
            Self::Diminished => "Dim",
            Self::Augmented => "Aug",
            Self::Sus2 => "Sus2",
            Self::Sus4 => "Sus4",
            Self::Major7 => "Maj7",
            Self::Minor7 => "Min7",
            Self::Dominant7 => "Dom7",
            Self::Diminished7 => "Dim7",
            Self::HalfDiminished7 => "m7b5",
            Self::MinorMajor7 => "MinMaj7",
            Self::AugmentedMajor7 => "AugMaj7",
            Self::Add9 => "Add9",
        }
    }

    /// Lead-sheet suffix, e.g. "m7" for a C minor seventh written "Cm7"
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Major => "",
            Self::Minor => "m",
            Self::Diminished => "dim",
            Self::Augmented => "aug",
            Self::Sus2 => "sus2",
            Self::Sus4 => "sus4",
            Self::Major7 => "maj7",
            Self::Minor7 => "m7",
            Self::Dominant7 => "7",
            Self::Diminished7 => "dim7",
            Self::HalfDiminished7 => "m7b5",
            Self::MinorMajor7 => "m(maj7)",
            Self::AugmentedMajor7 => "maj7#5",
            Self::Add9 => "add9",
        }
    }

    /// Suffix appended to a roman numeral for this quality
    pub fn numeral_suffix(&self) -> &'static str {
        match self {
            Self::Major | Self::Minor => "",
            Self::Diminished => "°",
            Self::Augmented => "+",
            Self::Sus2 => "sus2",
            Self::Sus4 => "sus4",
            Self::Major7 | Self::MinorMajor7 => "maj7",
            Self::Minor7 | Self::Dominant7 => "7",
            Self::Diminished7 => "°7",
            Self::HalfDiminished7 => "ø7",
            Self::AugmentedMajor7 => "+maj7",
            Self::Add9 => "add9",
        }
    }

    /// Find the quality whose intervals above the root match exactly
    pub fn from_intervals(intervals: &[i32]) -> Option<Self> {
        Self::iter().find(|quality| {
            let own = quality.intervals();
            own.len() == intervals.len()
                && own.iter().zip(intervals).all(|(&a, &b)| a as i32 == b)
        })
    }
}

impl fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChordQuality {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalize_id(s);
        let alias = match wanted.as_str() {
            "maj" => Some(Self::Major),
            "min" | "m" => Some(Self::Minor),
            "dim" => Some(Self::Diminished),
            "aug" => Some(Self::Augmented),
            "maj7" => Some(Self::Major7),
            "min7" | "m7" => Some(Self::Minor7),
            "7" | "dom7" => Some(Self::Dominant7),
            "dim7" => Some(Self::Diminished7),
            "m7b5" => Some(Self::HalfDiminished7),
            _ => None,
        };
        alias
            .or_else(|| Self::iter().find(|q| normalize_id(q.id()) == wanted))
            .ok_or_else(|| TheoryError::UnknownChord(s.to_string()))
    }
}

/// Chord voicing types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "camelCase")]
pub enum Voicing {
    #[default]
    Close,    // Notes stacked in order
    Open,     // Every other voice raised an octave
    Drop2,    // 2nd voice from top dropped an octave
    Drop3,    // 3rd voice from top dropped an octave
    RootBass, // Root moved below everything else
}

impl FromStr for Voicing {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_id(s).as_str() {
            "close" => Ok(Self::Close),
            "open" => Ok(Self::Open),
            "drop2" => Ok(Self::Drop2),
            "drop3" => Ok(Self::Drop3),
            "rootbass" => Ok(Self::RootBass),
            _ => Err(TheoryError::Validation(format!("unknown voicing: {s}"))),
        }
    }
}

/// Tonal role of a chord within its key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarmonicFunction {
    Tonic,
    Subdominant,
    Dominant,
    Predominant,
}

impl HarmonicFunction {
    /// Heptatonic scales group by degree (the leading-tone chord counts as
    /// dominant). Other scale sizes group by the root's interval above the
    /// tonic.
    pub fn classify(scale: ScaleKind, degree: usize, root_offset: u8) -> Self {
        if scale.cardinality() == 7 {
            match degree {
                1 => Self::Tonic,
                4 => Self::Subdominant,
                5 | 7 => Self::Dominant,
                _ => Self::Predominant,
            }
        } else {
            match root_offset % 12 {
                0 => Self::Tonic,
                5 => Self::Subdominant,
                7 | 11 => Self::Dominant,
                _ => Self::Predominant,
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Tonic => "tonic",
            Self::Subdominant => "subdominant",
            Self::Dominant => "dominant",
            Self::Predominant => "predominant",
        }
    }
}

impl fmt::Display for HarmonicFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Chord
// ============================================================================

/// A concrete chord: ascending pitches plus the root they are built on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    pub root: Pitch,
    /// None for diatonic stacks that match no named quality
    pub quality: Option<ChordQuality>,
    pub notes: Vec<Pitch>,
    pub inversion: usize,
}

impl Chord {
    /// Build from unchecked pitch values. The root is the lowest note of
    /// pitch class `root_class`.
    pub(crate) fn from_raw(
        raw: &[i32],
        root_class: u8,
        quality: Option<ChordQuality>,
        inversion: usize,
    ) -> Result<Self> {
        let mut notes = raw
            .iter()
            .map(|&value| Pitch::try_from(value))
            .collect::<Result<Vec<_>>>()?;
        notes.sort();
        let root = notes
            .iter()
            .copied()
            .find(|p| p.pitch_class() == root_class)
            .or_else(|| notes.first().copied())
            .ok_or_else(|| TheoryError::Validation("chord has no notes".to_string()))?;
        Ok(Self {
            root,
            quality,
            notes,
            inversion,
        })
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Lowest sounding note
    pub fn bass(&self) -> Option<Pitch> {
        self.notes.first().copied()
    }

    pub fn midi_notes(&self) -> Vec<u8> {
        self.notes.iter().map(|p| p.value()).collect()
    }

    pub fn note_names(&self) -> Vec<String> {
        self.notes.iter().map(|p| p.name()).collect()
    }

    /// Lead-sheet symbol such as "Cmaj7" or "F#m". Unnamed stacks list their
    /// intervals above the root, e.g. "C(4,9)".
    pub fn symbol(&self) -> String {
        let root = PITCH_CLASS_NAMES[self.root.pitch_class() as usize];
        match self.quality {
            Some(quality) => format!("{root}{}", quality.symbol()),
            None => {
                let intervals: Vec<String> = self
                    .notes
                    .iter()
                    .filter(|&&p| p != self.root)
                    .map(|&p| self.root.interval_to(p).rem_euclid(12).to_string())
                    .collect();
                format!("{root}({})", intervals.join(","))
            }
        }
    }

    /// Shift every note. Fails if any note would leave 0-127.
    pub fn transpose(&self, semitones: i32) -> Result<Self> {
        Ok(Self {
            root: self.root.transpose(semitones)?,
            quality: self.quality,
            notes: self
                .notes
                .iter()
                .map(|p| p.transpose(semitones))
                .collect::<Result<Vec<_>>>()?,
            inversion: self.inversion,
        })
    }

    /// Re-voice the chord. Fails instead of clamping notes into range.
    pub fn voiced(&self, voicing: Voicing) -> Result<Self> {
        let mut raw: Vec<i32> = self.notes.iter().map(|p| p.value() as i32).collect();

        match voicing {
            Voicing::Close => {}
            Voicing::Open => {
                for (i, note) in raw.iter_mut().enumerate() {
                    if i % 2 == 1 {
                        *note += 12;
                    }
                }
            }
            Voicing::Drop2 => {
                if raw.len() >= 2 {
                    let idx = raw.len() - 2;
                    raw[idx] -= 12;
                }
            }
            Voicing::Drop3 => {
                if raw.len() >= 3 {
                    let idx = raw.len() - 3;
                    raw[idx] -= 12;
                }
            }
            Voicing::RootBass => {
                let root = self.root.value() as i32;
                if let Some(idx) = raw.iter().position(|&n| n == root) {
                    let lowest_other = raw
                        .iter()
                        .enumerate()
                        .filter(|&(i, _)| i != idx)
                        .map(|(_, &n)| n)
                        .min();
                    if let Some(lowest) = lowest_other {
                        while raw[idx] >= lowest {
                            raw[idx] -= 12;
                        }
                    }
                }
            }
        }

        let mut chord =
            Self::from_raw(&raw, self.root.pitch_class(), self.quality, self.inversion)?;
        if let Some(bass) = chord.bass() {
            chord.inversion = chord.inversion_for_bass(bass);
        }
        Ok(chord)
    }

    /// Which chord member sits in the bass, counted in stacking order
    fn inversion_for_bass(&self, bass: Pitch) -> usize {
        let relative = self.root.interval_to(bass).rem_euclid(12);
        self.quality
            .and_then(|q| q.intervals().iter().position(|&iv| i32::from(iv % 12) == relative))
            .unwrap_or(self.inversion)
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.symbol(), self.note_names().join(" "))
    }
}

/// Root-position chord: `root + offset` for each interval of the quality
///
/// # Example
/// ```
/// use cadenza_core::{generate_chord, ChordQuality};
/// let chord = generate_chord(60, ChordQuality::Major).unwrap();
/// assert_eq!(chord.midi_notes(), vec![60, 64, 67]);
/// ```
pub fn generate_chord(root: u8, quality: ChordQuality) -> Result<Chord> {
    let root = Pitch::new(root)?;
    let raw: Vec<i32> = quality
        .intervals()
        .iter()
        .map(|&iv| root.value() as i32 + iv as i32)
        .collect();
    Chord::from_raw(&raw, root.pitch_class(), Some(quality), 0)
}

/// Rotate the chord left by `inversion` notes, lifting each rotated note
/// by octaves until it sits above its predecessor.
///
/// The index wraps modulo the chord size, with one extra octave per full
/// turn: inverting a triad by 3 returns the same chord an octave higher.
pub fn invert_chord(chord: &Chord, inversion: usize) -> Result<Chord> {
    let size = chord.len();
    if size == 0 {
        return Err(TheoryError::Validation("cannot invert an empty chord".to_string()));
    }
    let values: Vec<i32> = chord.notes.iter().map(|p| p.value() as i32).collect();
    let octaves = (inversion / size) as i32;
    let mut raw = rotate_stack(&values, inversion % size);
    for value in &mut raw {
        *value += 12 * octaves;
    }

    Chord::from_raw(
        &raw,
        chord.root.pitch_class(),
        chord.quality,
        (chord.inversion + inversion) % size,
    )
}

/// Rotate left by `steps`, lifting each note by octaves until it sits above
/// the note before it.
pub(crate) fn rotate_stack(values: &[i32], steps: usize) -> Vec<i32> {
    let mut raw: Vec<i32> = Vec::with_capacity(values.len());
    for &note in values.iter().cycle().skip(steps).take(values.len()) {
        let mut value = note;
        while raw.last().is_some_and(|&prev| value <= prev) {
            value += 12;
        }
        raw.push(value);
    }
    raw
}

// ============================================================================
// Diatonic Harmonization
// ============================================================================

/// A chord built from scale tones, tagged with its place in the key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiatonicChord {
    #[serde(flatten)]
    pub chord: Chord,
    /// 1-based scale degree
    pub degree: usize,
    pub roman_numeral: String,
    pub function: HarmonicFunction,
}

impl fmt::Display for DiatonicChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.roman_numeral, self.chord, self.function)
    }
}

/// Roman numeral for a chord on `degree`: uppercase unless the chord has a
/// minor third and no major third, followed by the quality's suffix.
pub fn roman_numeral(degree: usize, intervals: &[i32], quality: Option<ChordQuality>) -> String {
    let numeral = degree
        .checked_sub(1)
        .and_then(|idx| ROMAN_NUMERALS.get(idx))
        .map(|s| s.to_string())
        .unwrap_or_else(|| degree.to_string());
    let minor_like = intervals.contains(&3) && !intervals.contains(&4);
    let numeral = if minor_like {
        numeral.to_lowercase()
    } else {
        numeral
    };
    let suffix = quality.map(|q| q.numeral_suffix()).unwrap_or("");
    format!("{numeral}{suffix}")
}

/// Triads on every degree of the scale
pub fn generate_diatonic_chords(root: u8, scale: ScaleKind) -> Result<Vec<DiatonicChord>> {
    generate_diatonic_chords_sized(root, scale, 3)
}

/// Chords of `size` notes on every degree, stacked by skipping every other
/// scale tone (degrees i, i+2, i+4, ...) and wrapping up an octave past the
/// end of the scale. Qualities are classified from the measured intervals,
/// so any scale works, not only major and minor.
pub fn generate_diatonic_chords_sized(
    root: u8,
    scale: ScaleKind,
    size: usize,
) -> Result<Vec<DiatonicChord>> {
    let root = Pitch::new(root)?;
    if !(3..=MAX_DIATONIC_SIZE).contains(&size) {
        return Err(TheoryError::Validation(format!(
            "diatonic chord size must be 3-{MAX_DIATONIC_SIZE}, got {size}"
        )));
    }

    let intervals = scale.intervals();
    let n = intervals.len();
    let base = root.value() as i32;

    (0..n)
        .map(|degree_idx| {
            let raw: Vec<i32> = (0..size)
                .map(|k| {
                    let j = degree_idx + 2 * k;
                    base + intervals[j % n] as i32 + 12 * (j / n) as i32
                })
                .collect();
            let above_root: Vec<i32> = raw.iter().map(|&v| v - raw[0]).collect();
            let quality = ChordQuality::from_intervals(&above_root);
            let degree = degree_idx + 1;
            let chord_root_class = raw[0].rem_euclid(12) as u8;

            Ok(DiatonicChord {
                chord: Chord::from_raw(&raw, chord_root_class, quality, 0)?,
                degree,
                roman_numeral: roman_numeral(degree, &above_root[1..], quality),
                function: HarmonicFunction::classify(scale, degree, intervals[degree_idx]),
            })
        })
        .collect()
}
