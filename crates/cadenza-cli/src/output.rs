//! Plain-text and JSON rendering of command results

use cadenza_core::{Chord, DiatonicChord, Pitch, Progression, ScaleKind, VoiceLeading};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NoteInfo {
    pitch: u8,
    name: String,
    pitch_class: u8,
    frequency: f64,
}

#[derive(Debug, Serialize)]
struct IntervalInfo<'a> {
    semitones: i32,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct ScaleInfo<'a> {
    scale: ScaleKind,
    notes: &'a [Pitch],
    names: Vec<String>,
}

#[derive(Debug, Serialize)]
struct VoiceLeadInfo<'a> {
    from: &'a Chord,
    to: &'a Chord,
    distance: u32,
}

pub(crate) struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }

    pub fn note(&self, pitch: Pitch) -> anyhow::Result<()> {
        let info = NoteInfo {
            pitch: pitch.value(),
            name: pitch.name(),
            pitch_class: pitch.pitch_class(),
            frequency: pitch.frequency(),
        };
        self.emit(&info, || {
            format!("{} ({}) {:.2} Hz", info.name, info.pitch, info.frequency)
        })
    }

    pub fn interval(&self, semitones: i32, name: &str) -> anyhow::Result<()> {
        self.emit(&IntervalInfo { semitones, name }, || format!("{semitones}: {name}"))
    }

    pub fn scale(&self, scale: ScaleKind, notes: &[Pitch]) -> anyhow::Result<()> {
        let info = ScaleInfo {
            scale,
            notes,
            names: notes.iter().map(|p| p.name()).collect(),
        };
        self.emit(&info, || format!("{}: {}", scale.name(), info.names.join(" ")))
    }

    pub fn chord(&self, chord: &Chord) -> anyhow::Result<()> {
        self.emit(chord, || {
            format!("{chord} {:?} inversion {}", chord.midi_notes(), chord.inversion)
        })
    }

    pub fn diatonic(&self, chords: &[DiatonicChord]) -> anyhow::Result<()> {
        self.emit(&chords, || {
            chords
                .iter()
                .map(|c| format!("{:>2}  {c}  ({})", c.degree, c.function))
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    pub fn progression(&self, progression: &Progression) -> anyhow::Result<()> {
        self.emit(progression, || {
            let mut lines = vec![progression.to_string()];
            for step in &progression.steps {
                lines.push(format!(
                    "{:<6} {:<8} {:?}  +{}",
                    step.label,
                    step.chord.chord.symbol(),
                    step.chord.chord.midi_notes(),
                    step.distance
                ));
            }
            lines.push(format!("total movement: {}", progression.total_distance()));
            lines.join("\n")
        })
    }

    pub fn voice_leading(&self, from: &Chord, result: &VoiceLeading) -> anyhow::Result<()> {
        let info = VoiceLeadInfo {
            from,
            to: &result.chord,
            distance: result.distance,
        };
        self.emit(&info, || {
            format!(
                "{from} -> {} (inversion {}, moved {})",
                result.chord, result.chord.inversion, result.distance
            )
        })
    }
}
