//! Chord progressions from roman-numeral labels
//!
//! Labels are resolved against the key's diatonic harmony, then every chord
//! after the first is voice-led from the one before it.
//!
//! Accepted labels:
//! - degree indices: `"1"` .. `"7"` (or the scale's size)
//! - roman numerals: `I`..`XII`, case matching the chord (`ii`, `IV`),
//!   optional `°`/`o`, `ø` or `+` marker and optional `7` or `maj7`
//! - secondary dominants: `V/x` and `V7/x` for any resolvable, non-diminished `x`

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chord::{
    generate_chord, generate_diatonic_chords, generate_diatonic_chords_sized, Chord,
    ChordQuality, DiatonicChord, HarmonicFunction, ROMAN_NUMERALS,
};
use crate::error::{Result, TheoryError};
use crate::scale::{Key, ScaleKind};
use crate::voice_leading::voice_lead;

/// One chord of a progression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionStep {
    /// The label as requested
    pub label: String,
    #[serde(flatten)]
    pub chord: DiatonicChord,
    /// Voice-leading distance from the previous step, 0 for the first
    pub distance: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub key: Key,
    pub steps: Vec<ProgressionStep>,
}

impl Progression {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn chords(&self) -> impl Iterator<Item = &Chord> {
        self.steps.iter().map(|step| &step.chord.chord)
    }

    /// Sum of every step's movement
    pub fn total_distance(&self) -> u32 {
        self.steps.iter().map(|step| step.distance).sum()
    }
}

impl fmt::Display for Progression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numerals: Vec<&str> = self
            .steps
            .iter()
            .map(|step| step.chord.roman_numeral.as_str())
            .collect();
        write!(f, "{}: {}", self.key, numerals.join(" - "))
    }
}

// ============================================================================
// Label Parsing
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Diminished,
    HalfDiminished,
    Augmented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seventh {
    Minor,
    Major,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Numeral {
    degree: usize,
    /// None for plain degree indices, which skip the case check
    upper: Option<bool>,
    marker: Option<Marker>,
    seventh: Option<Seventh>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Diatonic(Numeral),
    SecondaryDominant { seventh: bool, target: Numeral },
}

impl Label {
    fn needs_sevenths(&self) -> bool {
        match self {
            Self::Diatonic(n) | Self::SecondaryDominant { target: n, .. } => n.seventh.is_some(),
        }
    }
}

fn parse_label(label: &str) -> Option<Label> {
    let label = label.trim();
    match label.split_once('/') {
        Some((dominant, target)) => {
            let seventh = match dominant {
                "V" => false,
                "V7" => true,
                _ => return None,
            };
            Some(Label::SecondaryDominant {
                seventh,
                target: parse_numeral(target)?,
            })
        }
        None => parse_numeral(label).map(Label::Diatonic),
    }
}

fn parse_numeral(s: &str) -> Option<Numeral> {
    let s = s.trim();
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        return Some(Numeral {
            degree: s.parse().ok()?,
            upper: None,
            marker: None,
            seventh: None,
        });
    }

    let split = s
        .find(|c: char| !matches!(c, 'I' | 'V' | 'X' | 'i' | 'v' | 'x'))
        .unwrap_or(s.len());
    let (numeral, rest) = s.split_at(split);
    if numeral.is_empty() {
        return None;
    }
    let upper = numeral.chars().all(|c| c.is_ascii_uppercase());
    if !upper && !numeral.chars().all(|c| c.is_ascii_lowercase()) {
        return None;
    }
    let canonical = numeral.to_ascii_uppercase();
    let degree = ROMAN_NUMERALS.iter().position(|&r| r == canonical)? + 1;

    let diminished = rest.strip_prefix('°').or_else(|| rest.strip_prefix('o'));
    let (marker, rest) = if let Some(r) = diminished {
        (Some(Marker::Diminished), r)
    } else if let Some(r) = rest.strip_prefix('ø') {
        (Some(Marker::HalfDiminished), r)
    } else if let Some(r) = rest.strip_prefix('+') {
        (Some(Marker::Augmented), r)
    } else {
        (None, rest)
    };

    let seventh = match rest {
        "" => None,
        "7" => Some(Seventh::Minor),
        "maj7" | "M7" => Some(Seventh::Major),
        _ => return None,
    };
    if marker == Some(Marker::HalfDiminished) && seventh != Some(Seventh::Minor) {
        return None;
    }

    Some(Numeral {
        degree,
        upper: Some(upper),
        marker,
        seventh,
    })
}

// ============================================================================
// Resolution
// ============================================================================

/// The key's diatonic chords, harmonized once per request
struct Harmony {
    key: Key,
    triads: Vec<DiatonicChord>,
    sevenths: Option<Vec<DiatonicChord>>,
}

impl Harmony {
    fn new(key: Key, with_sevenths: bool) -> Result<Self> {
        let root = key.root.value();
        let sevenths = if with_sevenths {
            Some(generate_diatonic_chords_sized(root, key.scale, 4)?)
        } else {
            None
        };
        Ok(Self {
            key,
            triads: generate_diatonic_chords(root, key.scale)?,
            sevenths,
        })
    }

    fn resolve_numeral(&self, numeral: &Numeral) -> Option<&DiatonicChord> {
        use ChordQuality::*;

        let table = match numeral.seventh {
            Some(_) => self.sevenths.as_ref()?,
            None => &self.triads,
        };
        let chord = table.get(numeral.degree.checked_sub(1)?)?;

        if let Some(upper) = numeral.upper {
            let chord_upper = chord.roman_numeral.starts_with(|c: char| c.is_ascii_uppercase());
            if upper != chord_upper {
                return None;
            }
        }

        let quality = chord.chord.quality;
        let marker_ok = match numeral.marker {
            None => true,
            Some(Marker::Diminished) => matches!(quality, Some(Diminished | Diminished7)),
            Some(Marker::HalfDiminished) => quality == Some(HalfDiminished7),
            Some(Marker::Augmented) => matches!(quality, Some(Augmented | AugmentedMajor7)),
        };
        let seventh_ok = match (numeral.seventh, quality) {
            (Some(Seventh::Major), Some(q)) => matches!(q, Major7 | MinorMajor7 | AugmentedMajor7),
            (Some(Seventh::Minor), Some(q)) => {
                matches!(q, Minor7 | Dominant7 | Diminished7 | HalfDiminished7)
            }
            _ => true,
        };

        (marker_ok && seventh_ok).then_some(chord)
    }

    fn resolve(&self, label: &str) -> Result<DiatonicChord> {
        let invalid = || TheoryError::InvalidDegree {
            label: label.to_string(),
            key: self.key.to_string(),
        };

        match parse_label(label).ok_or_else(invalid)? {
            Label::Diatonic(numeral) => {
                self.resolve_numeral(&numeral).cloned().ok_or_else(invalid)
            }
            Label::SecondaryDominant { seventh, target } => {
                let target = self.resolve_numeral(&target).ok_or_else(invalid)?;
                if matches!(
                    target.chord.quality,
                    Some(
                        ChordQuality::Diminished
                            | ChordQuality::Diminished7
                            | ChordQuality::HalfDiminished7
                    )
                ) {
                    return Err(invalid());
                }

                // A fifth above the target, folded down when that stays above the tonic
                let mut root = target.chord.root.value() as i32 + 7;
                if root - 12 >= self.key.root.value() as i32 {
                    root -= 12;
                }
                let root = u8::try_from(root).map_err(|_| TheoryError::Range(root))?;
                let (quality, numeral) = if seventh {
                    (ChordQuality::Dominant7, "V7")
                } else {
                    (ChordQuality::Major, "V")
                };

                Ok(DiatonicChord {
                    chord: generate_chord(root, quality)?,
                    degree: target.degree,
                    roman_numeral: format!("{numeral}/{}", target.roman_numeral),
                    function: HarmonicFunction::Dominant,
                })
            }
        }
    }
}

// ============================================================================
// Generation
// ============================================================================

/// Resolve `labels` in the key of `root`/`scale` and voice-lead the result.
///
/// The first chord stays in root position. Fails without partial output if
/// `labels` is empty or any label cannot be resolved.
///
/// Every diatonic chord of the key is built up front, so the whole key must
/// fit in 0-127 even when only some of its chords are requested: a major key
/// on 115 fails with `Range` from its seventh degree.
///
/// # Example
/// ```
/// use cadenza_core::{generate_progression, ScaleKind};
/// let progression = generate_progression(60, ScaleKind::Major, &["I", "IV", "V", "I"]).unwrap();
/// assert_eq!(progression.len(), 4);
/// assert_eq!(progression.steps[0].chord.chord.midi_notes(), vec![60, 64, 67]);
/// ```
pub fn generate_progression<S: AsRef<str>>(
    root: u8,
    scale: ScaleKind,
    labels: &[S],
) -> Result<Progression> {
    if labels.is_empty() {
        return Err(TheoryError::Validation(
            "a progression needs at least one chord".to_string(),
        ));
    }
    let key = Key::new(root, scale)?;
    tracing::debug!(key = %key, chords = labels.len(), "generating progression");

    let with_sevenths = labels
        .iter()
        .filter_map(|label| parse_label(label.as_ref()))
        .any(|label| label.needs_sevenths());
    let harmony = Harmony::new(key, with_sevenths)?;

    let resolved = labels
        .iter()
        .map(|label| harmony.resolve(label.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let mut steps: Vec<ProgressionStep> = Vec::with_capacity(resolved.len());
    for (label, mut chord) in labels.iter().zip(resolved) {
        let distance = match steps.last() {
            None => 0,
            Some(previous) => {
                let led = voice_lead(&previous.chord.chord, &chord.chord)?;
                chord.chord = led.chord;
                led.distance
            }
        };
        tracing::debug!(
            label = label.as_ref(),
            chord = %chord.chord,
            distance,
            "progression step"
        );
        steps.push(ProgressionStep {
            label: label.as_ref().to_string(),
            chord,
            distance,
        });
    }

    Ok(Progression { key, steps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice_leading::voice_leading_distance;

    fn pitch_classes(chord: &Chord) -> Vec<u8> {
        let mut pcs: Vec<u8> = chord.notes.iter().map(|p| p.pitch_class()).collect();
        pcs.sort_unstable();
        pcs
    }

    fn invalid(label: &str, key: &str) -> TheoryError {
        TheoryError::InvalidDegree {
            label: label.to_string(),
            key: key.to_string(),
        }
    }

    #[test]
    fn test_one_four_five_one() {
        let progression =
            generate_progression(60, ScaleKind::Major, &["I", "IV", "V", "I"]).unwrap();
        assert_eq!(progression.len(), 4);

        let notes: Vec<Vec<u8>> = progression.chords().map(|c| c.midi_notes()).collect();
        assert_eq!(
            notes,
            vec![
                vec![60, 64, 67],
                vec![60, 65, 69],
                vec![59, 62, 67],
                vec![60, 64, 67],
            ]
        );
        let distances: Vec<u32> = progression.steps.iter().map(|s| s.distance).collect();
        assert_eq!(distances, vec![0, 3, 6, 3]);
        assert_eq!(progression.total_distance(), 12);
        assert_eq!(progression.to_string(), "C5 Major: I - IV - V - I");
    }

    #[test]
    fn test_never_worse_than_unvoiced() {
        let labels = ["I", "vi", "ii", "V", "iii", "IV", "vii°", "I"];
        let progression = generate_progression(60, ScaleKind::Major, &labels).unwrap();
        let plain = generate_diatonic_chords(60, ScaleKind::Major).unwrap();

        for pair in progression.steps.windows(2) {
            let (prev, step) = (&pair[0], &pair[1]);
            let unvoiced = &plain[step.chord.degree - 1].chord;
            let plain_distance = voice_leading_distance(&prev.chord.chord.notes, &unvoiced.notes);
            assert!(step.distance <= plain_distance);
            assert_eq!(pitch_classes(&step.chord.chord), pitch_classes(unvoiced));
        }
    }

    #[test]
    fn test_tags_survive_voicing() {
        let progression =
            generate_progression(57, ScaleKind::MinorNatural, &["i", "iv", "v", "i"]).unwrap();
        let tags: Vec<(usize, &str, HarmonicFunction)> = progression
            .steps
            .iter()
            .map(|s| (s.chord.degree, s.chord.roman_numeral.as_str(), s.chord.function))
            .collect();
        assert_eq!(
            tags,
            vec![
                (1, "i", HarmonicFunction::Tonic),
                (4, "iv", HarmonicFunction::Subdominant),
                (5, "v", HarmonicFunction::Dominant),
                (1, "i", HarmonicFunction::Tonic),
            ]
        );
    }

    #[test]
    fn test_degree_indices() {
        let by_index = generate_progression(60, ScaleKind::Major, &["1", "4", "5", "1"]).unwrap();
        let by_numeral =
            generate_progression(60, ScaleKind::Major, &["I", "IV", "V", "I"]).unwrap();
        let a: Vec<_> = by_index.chords().collect();
        let b: Vec<_> = by_numeral.chords().collect();
        assert_eq!(a, b);

        let penta =
            generate_progression(60, ScaleKind::MajorPentatonic, &["1", "3", "4", "1"]).unwrap();
        assert_eq!(penta.len(), 4);
    }

    #[test]
    fn test_empty_rejected() {
        let labels: [&str; 0] = [];
        assert!(matches!(
            generate_progression(60, ScaleKind::Major, &labels),
            Err(TheoryError::Validation(_))
        ));
    }

    #[test]
    fn test_unresolvable_labels() {
        let labels = [
            "II", "v", "VIII", "8", "0", "bVI", "#iv", "Iv", "IX7", "vii°7", "I7", "viiø", "",
            "V/vii°", "IV/V", "V/",
        ];
        for label in labels {
            assert_eq!(
                generate_progression(60, ScaleKind::Major, &["I", label]),
                Err(invalid(label, "C5 Major")),
                "{label:?}"
            );
        }
    }

    #[test]
    fn test_whole_key_must_fit() {
        // I on 115 fits, but the key's V reaches 129
        assert!(generate_chord(115, ChordQuality::Major).is_ok());
        assert_eq!(
            generate_progression(115, ScaleKind::Major, &["I"]),
            Err(TheoryError::Range(129))
        );
        assert!(generate_progression(108, ScaleKind::Major, &["I"]).is_ok());
    }

    #[test]
    fn test_no_partial_result() {
        let result = generate_progression(60, ScaleKind::Major, &["I", "IV", "bogus", "I"]);
        assert_eq!(result, Err(invalid("bogus", "C5 Major")));
    }

    #[test]
    fn test_quality_markers() {
        let progression =
            generate_progression(60, ScaleKind::Major, &["vii°", "vii", "viio", "I"]).unwrap();
        for step in &progression.steps[..3] {
            assert_eq!(step.chord.chord.quality, Some(ChordQuality::Diminished));
        }

        let labels = ["i", "III+", "III", "vii°7", "i"];
        let harmonic = generate_progression(57, ScaleKind::MinorHarmonic, &labels).unwrap();
        assert_eq!(harmonic.steps[1].chord.chord.quality, Some(ChordQuality::Augmented));
        assert_eq!(harmonic.steps[2].chord.chord.quality, Some(ChordQuality::Augmented));
        assert_eq!(harmonic.steps[3].chord.chord.quality, Some(ChordQuality::Diminished7));
        assert!(generate_progression(57, ScaleKind::MinorHarmonic, &["iii"]).is_err());
    }

    #[test]
    fn test_sevenths() {
        let progression =
            generate_progression(60, ScaleKind::Major, &["ii7", "V7", "Imaj7"]).unwrap();
        assert_eq!(progression.steps[0].chord.chord.midi_notes(), vec![62, 65, 69, 72]);
        let qualities: Vec<_> = progression.chords().map(|c| c.quality).collect();
        assert_eq!(
            qualities,
            vec![
                Some(ChordQuality::Minor7),
                Some(ChordQuality::Dominant7),
                Some(ChordQuality::Major7)
            ]
        );

        let half = generate_progression(60, ScaleKind::Major, &["viiø7", "I"]).unwrap();
        assert_eq!(half.steps[0].chord.chord.quality, Some(ChordQuality::HalfDiminished7));
        assert_eq!(half.steps[0].chord.roman_numeral, "viiø7");
    }

    #[test]
    fn test_mixed_triads_and_sevenths() {
        let labels = ["I", "vi", "ii7", "V7", "I"];
        let progression = generate_progression(60, ScaleKind::Major, &labels).unwrap();
        let sizes: Vec<usize> = progression.chords().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![3, 3, 4, 4, 3]);
        for step in &progression.steps[1..] {
            assert!(step.distance <= 12, "{} moved {}", step.label, step.distance);
        }
    }

    #[test]
    fn test_secondary_dominants() {
        let progression = generate_progression(60, ScaleKind::Major, &["V/V", "V", "I"]).unwrap();
        let first = &progression.steps[0].chord;
        assert_eq!(first.chord.midi_notes(), vec![62, 66, 69]); // D major
        assert_eq!(first.roman_numeral, "V/V");
        assert_eq!(first.function, HarmonicFunction::Dominant);
        assert_eq!(first.degree, 5);

        let applied = generate_progression(60, ScaleKind::Major, &["I", "V7/ii", "ii"]).unwrap();
        let a7 = &applied.steps[1].chord;
        assert_eq!(pitch_classes(&a7.chord), vec![1, 4, 7, 9]);
        assert_eq!(a7.roman_numeral, "V7/ii");
        assert_eq!(a7.chord.quality, Some(ChordQuality::Dominant7));
    }

    #[test]
    fn test_range_errors() {
        assert_eq!(
            generate_progression(200, ScaleKind::Major, &["I"]),
            Err(TheoryError::Range(200))
        );
        assert!(matches!(
            generate_progression(120, ScaleKind::Major, &["I"]),
            Err(TheoryError::Range(_))
        ));
    }

    #[test]
    fn test_serializes_for_transport() {
        let progression = generate_progression(60, ScaleKind::Major, &["I", "IV"]).unwrap();
        let json = serde_json::to_value(&progression).unwrap();
        assert_eq!(json["key"]["root"], 60);
        assert_eq!(json["key"]["scale"], "major");
        assert_eq!(json["steps"][1]["label"], "IV");
        assert_eq!(json["steps"][1]["roman_numeral"], "IV");
        assert_eq!(json["steps"][1]["function"], "subdominant");
        assert_eq!(json["steps"][1]["notes"], serde_json::json!([60, 65, 69]));
        assert_eq!(json["steps"][1]["distance"], 3);

        let back: Progression = serde_json::from_value(json).unwrap();
        assert_eq!(back, progression);
    }
}
