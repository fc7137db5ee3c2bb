//! Voice-leading search
//!
//! Places the next chord of a progression at the inversion and octave that
//! moves the voices the least from the previous chord.

use serde::{Deserialize, Serialize};

use crate::chord::{rotate_stack, Chord, ChordQuality};
use crate::error::{Result, TheoryError};
use crate::pitch::{Pitch, MAX_PITCH};

/// The chosen voicing and its total movement in semitones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceLeading {
    pub chord: Chord,
    pub distance: u32,
}

/// Total semitone movement between two chords.
///
/// Equal-sized chords pair voices in ascending order. Otherwise voices are
/// matched greedily, closest pair first, and every note left over in the
/// larger chord adds its distance to the nearest note of the smaller one.
pub fn voice_leading_distance(from: &[Pitch], to: &[Pitch]) -> u32 {
    let mut a: Vec<i32> = from.iter().map(|p| p.value() as i32).collect();
    let mut b: Vec<i32> = to.iter().map(|p| p.value() as i32).collect();
    a.sort_unstable();
    b.sort_unstable();
    raw_distance(&a, &b)
}

fn raw_distance(a: &[i32], b: &[i32]) -> u32 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    if a.len() == b.len() {
        return a.iter().zip(b).map(|(x, y)| x.abs_diff(*y)).sum();
    }

    let (small, large) = if a.len() < b.len() { (a, b) } else { (b, a) };
    let mut pairs: Vec<(u32, usize, usize)> = small
        .iter()
        .enumerate()
        .flat_map(|(i, &s)| large.iter().enumerate().map(move |(j, &l)| (s.abs_diff(l), i, j)))
        .collect();
    pairs.sort_unstable();

    let mut small_used = vec![false; small.len()];
    let mut large_used = vec![false; large.len()];
    let mut total = 0;
    let mut matched = 0;
    for (distance, i, j) in pairs {
        if small_used[i] || large_used[j] {
            continue;
        }
        small_used[i] = true;
        large_used[j] = true;
        total += distance;
        matched += 1;
        if matched == small.len() {
            break;
        }
    }

    // Doubled or split voices
    for (j, &l) in large.iter().enumerate() {
        if !large_used[j] {
            total += small.iter().map(|&s| s.abs_diff(l)).min().unwrap_or(0);
        }
    }
    total
}

struct Candidate {
    notes: Vec<i32>,
    inversion: usize,
    distance: u32,
    root_gap: u32,
}

impl Candidate {
    fn rank(&self) -> (u32, usize, u32, i32) {
        let lowest = self.notes.first().copied().unwrap_or(0);
        (self.distance, self.inversion, self.root_gap, lowest)
    }
}

/// Best placement of `next_root`/`next_quality` after `previous`
pub fn best_voicing(
    previous: &Chord,
    next_root: u8,
    next_quality: ChordQuality,
) -> Result<VoiceLeading> {
    let root = Pitch::new(next_root)?;
    let raw: Vec<i32> = next_quality
        .intervals()
        .iter()
        .map(|&iv| root.value() as i32 + iv as i32)
        .collect();
    search(previous, &raw, root.pitch_class(), Some(next_quality), 0)
}

/// Best placement of `next` (in any inversion or octave) after `previous`
pub fn voice_lead(previous: &Chord, next: &Chord) -> Result<VoiceLeading> {
    let raw: Vec<i32> = next.notes.iter().map(|p| p.value() as i32).collect();
    search(previous, &raw, next.root.pitch_class(), next.quality, next.inversion)
}

/// Try every inversion of `raw`, each at its own octave, one octave either
/// side, and re-centred on the previous chord's register. Ties go to the
/// smaller inversion, then the smaller root movement, then the lower chord.
fn search(
    previous: &Chord,
    raw: &[i32],
    root_class: u8,
    quality: Option<ChordQuality>,
    base_inversion: usize,
) -> Result<VoiceLeading> {
    if previous.is_empty() || raw.is_empty() {
        return Err(TheoryError::Validation(
            "voice leading needs two non-empty chords".to_string(),
        ));
    }

    let mut prev: Vec<i32> = previous.notes.iter().map(|p| p.value() as i32).collect();
    prev.sort_unstable();
    let prev_root = previous.root.value() as i32;
    let prev_mean = mean(&prev);

    let mut sorted = raw.to_vec();
    sorted.sort_unstable();
    let size = sorted.len();

    let mut best: Option<Candidate> = None;
    for steps in 0..size {
        let shape = rotate_stack(&sorted, steps);
        let recentre = 12 * ((prev_mean - mean(&shape)) / 12.0).round() as i32;

        let mut shifts = vec![-12, 0, 12, recentre - 12, recentre, recentre + 12];
        shifts.sort_unstable();
        shifts.dedup();

        for shift in shifts {
            let notes: Vec<i32> = shape.iter().map(|&n| n + shift).collect();
            if notes.iter().any(|&n| !(0..=MAX_PITCH as i32).contains(&n)) {
                continue;
            }
            let root_note = notes.iter().copied().find(|n| n.rem_euclid(12) == root_class as i32);
            let Some(cand_root) = root_note else {
                continue;
            };

            let candidate = Candidate {
                distance: raw_distance(&prev, &notes),
                inversion: (base_inversion + steps) % size,
                root_gap: cand_root.abs_diff(prev_root),
                notes,
            };
            tracing::trace!(
                inversion = candidate.inversion,
                shift,
                distance = candidate.distance,
                "voicing candidate"
            );

            if best.as_ref().is_none_or(|b| candidate.rank() < b.rank()) {
                best = Some(candidate);
            }
        }
    }

    let best = best.ok_or_else(|| {
        let top = sorted.last().copied().unwrap_or_default();
        TheoryError::Range(top)
    })?;
    let chord = Chord::from_raw(&best.notes, root_class, quality, best.inversion)?;
    tracing::debug!(
        chord = %chord,
        inversion = best.inversion,
        distance = best.distance,
        "chose voicing"
    );
    Ok(VoiceLeading {
        chord,
        distance: best.distance,
    })
}

fn mean(values: &[i32]) -> f64 {
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len().max(1) as f64
}
