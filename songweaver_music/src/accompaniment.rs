// Accompaniment tracks: chord pad, bass line and arpeggiator.
//
// All three follow the per-bar chord from `SongState` and skip bars in `None`
// sections or without a chord. Velocities scale with section energy.
//
// - Chord pad: one block chord per bar voiced upward from octave 3.
// - Bass: the chord root in octave 2, pulsing in whole, quarter or eighth
//   notes depending on how busy the section is.
// - Arpeggio: an `ArpeggioStyle` per genre and section walks the chord tones
//   stacked over two octaves. Pattern slots are chord-tone indices or rests;
//   each slot lasts `step_rate` steps and sounds for `gate_ratio` of that.

use crate::song::{
    GeneratedNote, GenerationRange, Genre, STEPS_PER_BAR, SectionType, SongState, scale_step,
};
use crate::theory::ChordDegree;

/// Lowest note of the chord pad voicing (C3).
pub const CHORD_BASE: u8 = 48;
/// Bass register (C2).
pub const BASS_BASE: u8 = 36;
/// Lowest note of the arpeggio voicing (C4).
pub const ARPEGGIO_BASE: u8 = 60;
/// Octaves the arpeggiator's extended chord spans.
pub const ARPEGGIO_OCTAVES: u8 = 2;

/// Semitones of each chord tone above the chord root, ascending.
pub fn chord_shape(degree: &ChordDegree) -> Vec<u8> {
    let first = degree.root_offset();
    let mut shape: Vec<u8> = degree
        .intervals
        .iter()
        .map(|&iv| (iv % 12 + 12 - first) % 12)
        .collect();
    shape.sort_unstable();
    shape.dedup();
    shape
}

/// Lowest MIDI note at or above `base` with the chord root's pitch class.
fn root_above(degree: &ChordDegree, scale_root: u8, base: u8) -> u8 {
    let root_pc = degree.root_pitch_class(scale_root);
    base + (root_pc + 12 - base % 12) % 12
}

/// Chord tones stacked upward from the first chord root at or above `base`.
pub fn extended_chord(degree: &ChordDegree, scale_root: u8, base: u8, octaves: u8) -> Vec<u8> {
    let root = root_above(degree, scale_root, base);
    let shape = chord_shape(degree);
    (0..octaves)
        .flat_map(|octave| shape.iter().map(move |&rel| root + rel + 12 * octave))
        .collect()
}

/// How the arpeggiator walks a chord.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArpeggioStyle {
    /// Indices into the extended chord (wrapped to its length), `None` for a rest.
    pub pattern: &'static [Option<usize>],
    /// Steps per pattern slot.
    pub step_rate: usize,
    /// Share of each slot the note sounds for, 0.0-1.0.
    pub gate_ratio: f32,
}

impl ArpeggioStyle {
    /// Sounding length of one slot, never below one step.
    pub fn gate_steps(&self) -> usize {
        ((self.step_rate as f32 * self.gate_ratio).round() as usize).max(1)
    }
}

const UP: &[Option<usize>] = &[Some(0), Some(1), Some(2), Some(3)];
const UP_DOWN: &[Option<usize>] = &[
    Some(0),
    Some(1),
    Some(2),
    Some(3),
    Some(4),
    Some(3),
    Some(2),
    Some(1),
];
const BROKEN: &[Option<usize>] = &[Some(0), None, Some(2), Some(1), None, Some(2)];
const POWER: &[Option<usize>] = &[
    Some(0),
    Some(2),
    Some(0),
    Some(2),
    Some(3),
    Some(2),
    Some(1),
    Some(2),
];
const TRAP_BELLS: &[Option<usize>] = &[Some(0), None, None, Some(2), None, None, Some(4), None];

/// Arpeggio style for a section of a genre. Quiet sections run at half speed.
pub fn arpeggio_style(genre: Genre, section: SectionType) -> ArpeggioStyle {
    let base = match genre {
        Genre::Pop => ArpeggioStyle {
            pattern: UP,
            step_rate: 2,
            gate_ratio: 0.8,
        },
        Genre::Rock => ArpeggioStyle {
            pattern: POWER,
            step_rate: 2,
            gate_ratio: 0.5,
        },
        Genre::Techno => ArpeggioStyle {
            pattern: UP_DOWN,
            step_rate: 1,
            gate_ratio: 0.5,
        },
        Genre::Trap => ArpeggioStyle {
            pattern: TRAP_BELLS,
            step_rate: 1,
            gate_ratio: 0.6,
        },
        Genre::LoFi | Genre::Ballad => ArpeggioStyle {
            pattern: BROKEN,
            step_rate: 2,
            gate_ratio: 0.9,
        },
    };
    match section {
        SectionType::Intro | SectionType::Outro | SectionType::Bridge => ArpeggioStyle {
            step_rate: base.step_rate * 2,
            ..base
        },
        _ => base,
    }
}

fn velocity(base: f32, section: SectionType) -> f32 {
    (base + 0.3 * section.energy()).min(1.0)
}

/// Bars of `range` that have a section and a chord.
fn voiced_bars(
    state: &SongState,
    range: GenerationRange,
) -> impl Iterator<Item = (usize, SectionType, &'static ChordDegree)> + '_ {
    range.bars(state).filter_map(move |bar| {
        let section = state.section_at(bar);
        if section == SectionType::None {
            return None;
        }
        let degree = state.chord_at(bar)?;
        Some((bar, section, degree))
    })
}

/// One block chord per bar, lasting the bar.
pub fn generate_chords(state: &SongState, range: GenerationRange) -> Vec<GeneratedNote> {
    let steps = state.steps_per_bar;
    let mut notes = Vec::new();
    for (bar, section, degree) in voiced_bars(state, range) {
        let root = CHORD_BASE + degree.root_pitch_class(state.root_pitch_class);
        for rel in chord_shape(degree) {
            notes.push(GeneratedNote {
                midi: root + rel,
                start_step: bar * steps,
                duration_steps: steps.max(1),
                velocity: velocity(0.4, section),
            });
        }
    }
    notes
}

/// Pattern steps between bass notes for a section.
pub fn bass_pulse(section: SectionType) -> usize {
    match section {
        SectionType::Intro | SectionType::Outro | SectionType::Bridge => STEPS_PER_BAR,
        SectionType::Verse | SectionType::PreChorus => STEPS_PER_BAR / 4,
        SectionType::Chorus | SectionType::Solo | SectionType::Drop => STEPS_PER_BAR / 8,
        SectionType::None => STEPS_PER_BAR,
    }
}

/// Chord roots in octave 2 at the section's pulse.
pub fn generate_bass(state: &SongState, range: GenerationRange) -> Vec<GeneratedNote> {
    let steps = state.steps_per_bar;
    let mut notes = Vec::new();
    for (bar, section, degree) in voiced_bars(state, range) {
        let midi = BASS_BASE + degree.root_pitch_class(state.root_pitch_class);
        let pulse = bass_pulse(section);
        for pos in (0..STEPS_PER_BAR).step_by(pulse) {
            let start = scale_step(pos, steps);
            let stop = scale_step(pos + pulse, steps);
            if stop <= start {
                continue;
            }
            let accent = if pos == 0 { 0.65 } else { 0.55 };
            notes.push(GeneratedNote {
                midi,
                start_step: bar * steps + start,
                duration_steps: stop - start,
                velocity: velocity(accent, section),
            });
        }
    }
    notes
}

/// Arpeggiate each bar's chord with the genre and section style.
pub fn generate_arpeggio(state: &SongState, genre: Genre, range: GenerationRange) -> Vec<GeneratedNote> {
    let steps = state.steps_per_bar;
    let mut notes = Vec::new();
    for (bar, section, degree) in voiced_bars(state, range) {
        let style = arpeggio_style(genre, section);
        let tones = extended_chord(degree, state.root_pitch_class, ARPEGGIO_BASE, ARPEGGIO_OCTAVES);
        if tones.is_empty() || style.pattern.is_empty() {
            continue;
        }
        let gate = style.gate_steps();
        let slots = style.pattern.iter().cycle();
        for (pos, slot) in (0..STEPS_PER_BAR).step_by(style.step_rate.max(1)).zip(slots) {
            let Some(index) = slot else {
                continue;
            };
            let start = scale_step(pos, steps);
            let stop = scale_step((pos + gate).min(STEPS_PER_BAR), steps);
            if stop <= start {
                continue;
            }
            notes.push(GeneratedNote {
                midi: tones[index % tones.len()],
                start_step: bar * steps + start,
                duration_steps: stop - start,
                velocity: velocity(0.45, section),
            });
        }
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::styles_for;
    use crate::song::{SectionSpec, SongTemplate};
    use crate::theory::{MAJOR_CHORDS, ScaleKind, VocalRange};
    use pretty_assertions::assert_eq;

    fn state(sections: Vec<SectionSpec>) -> SongState {
        let template = SongTemplate {
            genre: Genre::Pop,
            bpm: 110,
            sections,
        };
        SongState::from_template(
            &template,
            0,
            ScaleKind::Major,
            &styles_for(Genre::Pop)[0],
            VocalRange::Tenor,
        )
    }

    #[test]
    fn dominant_seventh_shape() {
        // V7 in C: G B D F
        assert_eq!(chord_shape(&MAJOR_CHORDS[7]), vec![0, 4, 7, 10]);
        assert_eq!(
            extended_chord(&MAJOR_CHORDS[7], 0, 60, 2),
            vec![67, 71, 74, 77, 79, 83, 86, 89]
        );
    }

    #[test]
    fn block_chords_fill_each_bar() {
        let s = state(vec![SectionSpec::new(SectionType::Verse, 4)]);
        let notes = generate_chords(&s, GenerationRange::whole_song(&s));
        for bar in 0..4 {
            let in_bar: Vec<_> = notes
                .iter()
                .filter(|n| n.start_step == bar * s.steps_per_bar)
                .collect();
            assert!(in_bar.len() >= 3);
            let degree = s.chord_at(bar).unwrap();
            for n in in_bar {
                assert!(degree.contains(n.midi, 0));
                assert_eq!(n.duration_steps, s.steps_per_bar);
                assert!((48..72).contains(&n.midi));
            }
        }
    }

    #[test]
    fn bass_pulse_follows_section_energy() {
        let s = state(vec![
            SectionSpec::new(SectionType::Intro, 1),
            SectionSpec::new(SectionType::Verse, 1),
            SectionSpec::new(SectionType::Chorus, 1),
        ]);
        let notes = generate_bass(&s, GenerationRange::whole_song(&s));
        let per_bar = |bar: usize| {
            notes
                .iter()
                .filter(|n| n.start_step / s.steps_per_bar == bar)
                .count()
        };
        assert_eq!(per_bar(0), 1);
        assert_eq!(per_bar(1), 4);
        assert_eq!(per_bar(2), 8);
        for n in &notes {
            assert!((36..48).contains(&n.midi));
        }
    }

    #[test]
    fn arpeggio_respects_rests_and_gate() {
        let style = arpeggio_style(Genre::LoFi, SectionType::Verse);
        assert_eq!(style.gate_steps(), 2);
        let s = state(vec![SectionSpec::new(SectionType::Verse, 1)]);
        let notes = generate_arpeggio(&s, Genre::LoFi, GenerationRange::whole_song(&s));
        // Eight slots per bar over a six-slot pattern: rests land on slots 1, 4, 7.
        let starts: Vec<usize> = notes.iter().map(|n| n.start_step).collect();
        assert_eq!(starts, vec![0, 4, 6, 10, 12]);
        let degree = s.chord_at(0).unwrap();
        assert!(notes.iter().all(|n| degree.contains(n.midi, 0)));
    }

    #[test]
    fn quiet_sections_arpeggiate_at_half_speed() {
        let verse = arpeggio_style(Genre::Techno, SectionType::Verse);
        let intro = arpeggio_style(Genre::Techno, SectionType::Intro);
        assert_eq!(intro.step_rate, verse.step_rate * 2);
        assert_eq!(verse.gate_steps(), 1);
    }

    #[test]
    fn coarse_grid_bass_and_arpeggio_stay_monophonic() {
        let mut s = state(vec![
            SectionSpec::new(SectionType::Chorus, 2),
            SectionSpec::new(SectionType::Verse, 2),
        ]);
        s.steps_per_bar = 4;
        let range = GenerationRange::whole_song(&s);
        let bass = generate_bass(&s, range);
        // Eighth-note Chorus pulse folds onto quarter steps.
        assert_eq!(bass.iter().filter(|n| n.start_step < 4).count(), 4);
        for genre in Genre::ALL {
            let arp = generate_arpeggio(&s, genre, range);
            for line in [&bass, &arp] {
                for pair in line.windows(2) {
                    assert!(pair[1].start_step >= pair[0].end_step(), "{genre:?}: {pair:?}");
                }
                assert!(line.iter().all(|n| n.duration_steps >= 1));
            }
        }
    }

    #[test]
    fn empty_sections_have_no_accompaniment() {
        let s = state(vec![
            SectionSpec::new(SectionType::None, 2),
            SectionSpec::new(SectionType::Verse, 1),
        ]);
        let range = GenerationRange::new(0, 2);
        assert!(generate_chords(&s, range).is_empty());
        assert!(generate_bass(&s, range).is_empty());
        assert!(generate_arpeggio(&s, Genre::Pop, range).is_empty());
    }
}
