// Full-arrangement composition.
//
// `compose` runs every generator over a bar range and returns the results as
// an `Arrangement`, one note list per part. Per-bar `Instrumentation` decides
// which parts may sound in each bar; notes in bars where a part is muted are
// dropped after generation so that the melody's phrase positions still count
// from the start of the range. Each part is sorted by start step.
//
// The melody draws from the random source first, then nothing else does: the
// accompaniment and drum generators are deterministic given the song state.

use crate::accompaniment::{generate_arpeggio, generate_bass, generate_chords};
use crate::drums::generate_drums;
use crate::melody::{MelodyStrategy, generate_melody};
use crate::song::{
    Complexity, GeneratedNote, GenerationRange, Genre, Instrumentation, SongState,
    assign_instrumentation,
};
use serde::{Deserialize, Serialize};
use songweaver_prng::RandomSource;

/// Caller choices that shape generation but are not part of the song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComposeOptions {
    pub complexity: Complexity,
    pub strategy: MelodyStrategy,
}

/// The tracks of an arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    Melody,
    Chords,
    Bass,
    Arpeggio,
    Drums,
}

impl Part {
    pub const ALL: [Part; 5] = [
        Part::Melody,
        Part::Chords,
        Part::Bass,
        Part::Arpeggio,
        Part::Drums,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Part::Melody => "Melody",
            Part::Chords => "Chords",
            Part::Bass => "Bass",
            Part::Arpeggio => "Arpeggio",
            Part::Drums => "Drums",
        }
    }

    /// Whether this part plays under `inst`.
    pub fn enabled(self, inst: &Instrumentation) -> bool {
        match self {
            Part::Melody => inst.melody,
            Part::Chords => inst.chords,
            Part::Bass => inst.bass,
            Part::Arpeggio => inst.arpeggio,
            Part::Drums => inst.drums,
        }
    }
}

/// Generated note lists, one per part. Times are absolute steps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Arrangement {
    pub steps_per_bar: usize,
    pub melody: Vec<GeneratedNote>,
    pub chords: Vec<GeneratedNote>,
    pub bass: Vec<GeneratedNote>,
    pub arpeggio: Vec<GeneratedNote>,
    pub drums: Vec<GeneratedNote>,
}

impl Arrangement {
    pub fn part(&self, part: Part) -> &[GeneratedNote] {
        match part {
            Part::Melody => &self.melody,
            Part::Chords => &self.chords,
            Part::Bass => &self.bass,
            Part::Arpeggio => &self.arpeggio,
            Part::Drums => &self.drums,
        }
    }

    fn part_mut(&mut self, part: Part) -> &mut Vec<GeneratedNote> {
        match part {
            Part::Melody => &mut self.melody,
            Part::Chords => &mut self.chords,
            Part::Bass => &mut self.bass,
            Part::Arpeggio => &mut self.arpeggio,
            Part::Drums => &mut self.drums,
        }
    }

    pub fn note_count(&self) -> usize {
        Part::ALL.iter().map(|&p| self.part(p).len()).sum()
    }

    /// Last step any part sounds through.
    pub fn end_step(&self) -> usize {
        Part::ALL
            .iter()
            .flat_map(|&p| self.part(p).iter().map(GeneratedNote::end_step))
            .max()
            .unwrap_or(0)
    }
}

/// Compose every part over `range`.
pub fn compose<R: RandomSource + ?Sized>(
    state: &SongState,
    genre: Genre,
    range: GenerationRange,
    options: ComposeOptions,
    rng: &mut R,
) -> Arrangement {
    let mut arrangement = Arrangement {
        steps_per_bar: state.steps_per_bar,
        melody: generate_melody(state, range, options.complexity, &options.strategy, rng),
        chords: generate_chords(state, range),
        bass: generate_bass(state, range),
        arpeggio: generate_arpeggio(state, genre, range),
        drums: generate_drums(state, genre, range),
    };

    let instrumentation = assign_instrumentation(&state.bar_structure);
    let steps = state.steps_per_bar.max(1);
    for part in Part::ALL {
        let notes = arrangement.part_mut(part);
        notes.retain(|n| {
            instrumentation
                .get(n.start_step / steps)
                .is_some_and(|inst| part.enabled(inst))
        });
        notes.sort_by_key(|n| n.start_step);
        log::trace!("{}: {} notes", part.name(), notes.len());
    }
    arrangement
}
