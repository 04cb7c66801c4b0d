// Harmony analysis: how well a note or a bar of notes fits its context.
//
// Three views, all pure and total:
// - `note_role`: where a pitch sits relative to a chord root (root, third,
//   fifth, seventh, extension, or outside the chord).
// - `analyze_note`: a 0-100 fitness score for a single pitch against the key
//   and the previous note, with a mood label for display.
// - `analyze_bar_harmony`: the share of a bar's notes that are chord tones.
//
// `bar_harmony_report` applies the bar view across a generated track; the CLI
// prints it as a sanity check on melody generation.

use crate::song::{GeneratedNote, SongState};
use crate::theory::{ChordDegree, interval_quality};
use std::collections::BTreeSet;

/// Score given to any pitch outside the key.
pub const OUT_OF_KEY_SCORE: u8 = 10;

/// Score of a bar with no notes; nothing clashes.
pub const EMPTY_BAR_SCORE: u8 = 100;

/// Function of a pitch within a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteRole {
    Root,
    Third,
    Fifth,
    Seventh,
    Extension,
    NonChord,
}

/// Classify `midi` by its semitone distance above the chord root.
///
/// Buckets: {0} root, {3,4} third, {7} fifth, {10,11} seventh,
/// {2,5,9} extension, {1,6,8} non-chord. The buckets partition all twelve
/// distances.
pub fn note_role(midi: u8, chord_root_pc: u8) -> NoteRole {
    match (midi % 12 + 12 - chord_root_pc % 12) % 12 {
        0 => NoteRole::Root,
        3 | 4 => NoteRole::Third,
        7 => NoteRole::Fifth,
        10 | 11 => NoteRole::Seventh,
        2 | 5 | 9 => NoteRole::Extension,
        _ => NoteRole::NonChord,
    }
}

/// `note_role` for a chord degree in a key.
pub fn role_in_chord(midi: u8, degree: &ChordDegree, scale_root: u8) -> NoteRole {
    note_role(midi, degree.root_pitch_class(scale_root))
}

/// Fitness of a single pitch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteAnalysis {
    /// 0-100; higher fits better.
    pub score: u8,
    pub mood: &'static str,
    pub details: String,
}

/// Score a pitch against the key and its predecessor.
///
/// Out-of-key pitches score `OUT_OF_KEY_SCORE`. In-key pitches start at 50
/// and add half the consonance rating of the interval to the previous note,
/// or to the tonic when there is no previous note.
pub fn analyze_note(
    target: u8,
    root_pc: u8,
    scale_set: &BTreeSet<u8>,
    previous: Option<u8>,
) -> NoteAnalysis {
    if !scale_set.contains(&target) {
        return NoteAnalysis {
            score: OUT_OF_KEY_SCORE,
            mood: "dissonant",
            details: "outside the key".to_string(),
        };
    }

    let (reference, against) = match previous {
        Some(prev) => (prev, "previous note"),
        None => (root_pc % 12, "tonic"),
    };
    let quality = interval_quality(target, reference);
    NoteAnalysis {
        score: (50 + quality.score / 2).min(100),
        mood: quality.mood,
        details: format!("{} from the {}", quality.name, against),
    }
}

/// Chord-tone coverage of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarHarmony {
    /// Percentage (0-100) of notes that are chord tones.
    pub score: u8,
    pub chord_tones: usize,
    pub total: usize,
}

/// Percentage of `pitches` whose pitch class belongs to the chord.
/// An empty bar scores 100.
pub fn analyze_bar_harmony(pitches: &[u8], degree: &ChordDegree, root_pc: u8) -> BarHarmony {
    if pitches.is_empty() {
        return BarHarmony {
            score: EMPTY_BAR_SCORE,
            chord_tones: 0,
            total: 0,
        };
    }
    let allowed = degree.pitch_classes(root_pc);
    let chord_tones = pitches
        .iter()
        .filter(|&&p| allowed[(p % 12) as usize])
        .count();
    let score = (chord_tones * 100 + pitches.len() / 2) / pitches.len();
    BarHarmony {
        score: score.min(100) as u8,
        chord_tones,
        total: pitches.len(),
    }
}

/// Per-bar chord-tone coverage of a track. Notes are assigned to the bar
/// their start step falls in; bars with no chord degree score as empty.
pub fn bar_harmony_report(state: &SongState, notes: &[GeneratedNote]) -> Vec<BarHarmony> {
    let steps = state.steps_per_bar.max(1);
    let mut per_bar: Vec<Vec<u8>> = vec![Vec::new(); state.total_bars()];
    for note in notes {
        if let Some(bar) = per_bar.get_mut(note.start_step / steps) {
            bar.push(note.midi);
        }
    }
    per_bar
        .iter()
        .enumerate()
        .map(|(bar, pitches)| match state.chord_at(bar) {
            Some(degree) => analyze_bar_harmony(pitches, degree, state.key().root),
            None => BarHarmony {
                score: EMPTY_BAR_SCORE,
                chord_tones: 0,
                total: pitches.len(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::{MAJOR_CHORDS, MINOR_CHORDS, ScaleKind, scale_notes};

    #[test]
    fn note_role_partitions_all_intervals() {
        let mut counts = std::collections::HashMap::new();
        for rel in 0..12u8 {
            *counts.entry(note_role(60 + rel, 0)).or_insert(0) += 1;
        }
        assert_eq!(counts[&NoteRole::Root], 1);
        assert_eq!(counts[&NoteRole::Third], 2);
        assert_eq!(counts[&NoteRole::Fifth], 1);
        assert_eq!(counts[&NoteRole::Seventh], 2);
        assert_eq!(counts[&NoteRole::Extension], 3);
        assert_eq!(counts[&NoteRole::NonChord], 3);
        assert_eq!(counts.values().sum::<i32>(), 12);
    }

    #[test]
    fn roles_are_relative_to_the_chord_root() {
        // V in C major: G B D F
        let dominant = &MAJOR_CHORDS[7];
        assert_eq!(role_in_chord(67, dominant, 0), NoteRole::Root);
        assert_eq!(role_in_chord(71, dominant, 0), NoteRole::Third);
        assert_eq!(role_in_chord(62, dominant, 0), NoteRole::Fifth);
        assert_eq!(role_in_chord(65, dominant, 0), NoteRole::Seventh);
        assert_eq!(role_in_chord(68, dominant, 0), NoteRole::NonChord);
    }

    #[test]
    fn out_of_key_notes_short_circuit() {
        let c_major = scale_notes(0, ScaleKind::Major);
        let a = analyze_note(61, 0, &c_major, Some(60));
        assert_eq!(a.score, OUT_OF_KEY_SCORE);
        assert_eq!(a.mood, "dissonant");
    }

    #[test]
    fn in_key_notes_use_interval_table() {
        let c_major = scale_notes(0, ScaleKind::Major);
        // G over C: perfect fifth, rated 95 -> 50 + 47
        let fifth = analyze_note(67, 0, &c_major, Some(60));
        assert_eq!(fifth.score, 97);
        assert_eq!(fifth.mood, "powerful");
        // Without a previous note the tonic is the reference.
        let third = analyze_note(64, 0, &c_major, None);
        assert_eq!(third.score, 50 + 85 / 2);
        assert!(third.details.contains("tonic"));
        // B against C: major 7th, the weakest in-key interval here.
        let seventh = analyze_note(71, 0, &c_major, Some(60));
        assert!(seventh.score < fifth.score);
        assert!(seventh.score >= 50);
    }

    #[test]
    fn empty_bar_is_vacuously_harmonious() {
        for degree in MINOR_CHORDS {
            for root in 0..12 {
                assert_eq!(analyze_bar_harmony(&[], degree, root).score, 100);
            }
        }
    }

    #[test]
    fn bar_harmony_is_chord_tone_percentage() {
        // C major triad plus D: 3 of 4 are chord tones.
        let tonic = &MAJOR_CHORDS[0];
        let bar = analyze_bar_harmony(&[60, 64, 67, 62], tonic, 0);
        assert_eq!(bar.score, 75);
        assert_eq!(bar.chord_tones, 3);
        assert_eq!(bar.total, 4);
        // Transposed to D major the same pitches mostly miss.
        let bar_d = analyze_bar_harmony(&[60, 64, 67, 62], tonic, 2);
        assert_eq!(bar_d.score, 25);
    }
}
