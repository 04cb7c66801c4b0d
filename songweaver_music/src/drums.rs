// Drum pattern engine.
//
// Each bar is played on the 16-step pattern grid by a two-state machine:
//
//   Steady   the genre's kick/snare/hat tables with per-section overrides
//            (PreChorus tension groove, Bridge without kick, Chorus/Solo
//            open-hat lift and a crash on the section's first step).
//   Filling  steps 8-15 of a transition bar, i.e. a bar whose successor is
//            a different section, or the song's final bar. A fill replaces
//            the tail of the bar only.
//
// Fill choice, first match wins: Intro plays two snare hits at the very end;
// leaving a Chorus for anything but Chorus/Outro plays a descending tom
// cascade; heading into a Chorus or Outro plays a rising snare roll; anything
// else uses the genre's own fill.
//
// `generate_drums` renders the machine over a bar range into notes keyed on
// General MIDI percussion numbers (midi.rs puts them on channel 10).

use crate::song::{
    GeneratedNote, GenerationRange, Genre, STEPS_PER_BAR, STEPS_PER_BEAT, SectionType, SongState,
    scale_step,
};
use std::collections::BTreeMap;

/// First pattern step a fill may replace (the last two beats).
pub const FILL_START: usize = STEPS_PER_BAR - 2 * STEPS_PER_BEAT;

/// Kit pieces the engine writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DrumPiece {
    Kick,
    Snare,
    ClosedHat,
    OpenHat,
    Crash,
    HiTom,
    MidTom,
    LoTom,
}

impl DrumPiece {
    /// General MIDI percussion key.
    pub fn midi_note(self) -> u8 {
        match self {
            DrumPiece::Kick => 36,
            DrumPiece::Snare => 38,
            DrumPiece::ClosedHat => 42,
            DrumPiece::OpenHat => 46,
            DrumPiece::Crash => 49,
            DrumPiece::HiTom => 50,
            DrumPiece::MidTom => 47,
            DrumPiece::LoTom => 45,
        }
    }

    pub fn is_hat(self) -> bool {
        matches!(self, DrumPiece::ClosedHat | DrumPiece::OpenHat)
    }
}

/// One drum strike at a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrumHit {
    pub piece: DrumPiece,
    /// 0.0-1.0.
    pub velocity: f32,
}

const fn hit(piece: DrumPiece, velocity: f32) -> DrumHit {
    DrumHit { piece, velocity }
}

/// A 16-step on/off lane.
pub type StepPattern = [bool; STEPS_PER_BAR];

/// Parse an `x`/`.` lane; anything but `x` is a rest.
const fn lane(grid: &str) -> StepPattern {
    let bytes = grid.as_bytes();
    let mut out = [false; STEPS_PER_BAR];
    let mut i = 0;
    while i < STEPS_PER_BAR && i < bytes.len() {
        out[i] = bytes[i] == b'x';
        i += 1;
    }
    out
}

/// Genre-specific fill used when no section rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStrategy {
    RockTomCascade,
    PopBuild,
    TechnoRoll,
    TrapRoll,
    /// Kick on the fill downbeat and two snare hits.
    Simple,
}

/// A genre's steady groove plus its fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrumPatternTable {
    pub kick: StepPattern,
    pub snare: StepPattern,
    pub hat: StepPattern,
    pub fill: FillStrategy,
}

const BACKBEAT: StepPattern = lane("....x.......x...");
const EIGHTH_HATS: StepPattern = lane("x.x.x.x.x.x.x.x.");

const POP_DRUMS: DrumPatternTable = DrumPatternTable {
    kick: lane("x.......x.x....."),
    snare: BACKBEAT,
    hat: EIGHTH_HATS,
    fill: FillStrategy::PopBuild,
};

const ROCK_DRUMS: DrumPatternTable = DrumPatternTable {
    kick: lane("x.....x.x......."),
    snare: BACKBEAT,
    hat: EIGHTH_HATS,
    fill: FillStrategy::RockTomCascade,
};

const TECHNO_DRUMS: DrumPatternTable = DrumPatternTable {
    kick: lane("x...x...x...x..."),
    snare: BACKBEAT,
    hat: lane("..x...x...x...x."),
    fill: FillStrategy::TechnoRoll,
};

const TRAP_DRUMS: DrumPatternTable = DrumPatternTable {
    kick: lane("x......x..x....."),
    snare: lane("........x......."),
    hat: lane("x.x.x.x.xxx.x.x."),
    fill: FillStrategy::TrapRoll,
};

const LOFI_DRUMS: DrumPatternTable = DrumPatternTable {
    kick: lane("x.......x.....x."),
    snare: BACKBEAT,
    hat: EIGHTH_HATS,
    fill: FillStrategy::Simple,
};

const BALLAD_DRUMS: DrumPatternTable = DrumPatternTable {
    kick: lane("x.......x......."),
    snare: BACKBEAT,
    hat: lane("x...x...x...x..."),
    fill: FillStrategy::Simple,
};

/// Drum table for a genre.
pub fn pattern_table(genre: Genre) -> &'static DrumPatternTable {
    match genre {
        Genre::Pop => &POP_DRUMS,
        Genre::Rock => &ROCK_DRUMS,
        Genre::Techno => &TECHNO_DRUMS,
        Genre::Trap => &TRAP_DRUMS,
        Genre::LoFi => &LOFI_DRUMS,
        Genre::Ballad => &BALLAD_DRUMS,
    }
}

/// State of the drum machine at one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrumState {
    Steady,
    Filling,
}

/// Inputs for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrumContext {
    pub genre: Genre,
    pub current: SectionType,
    /// Section of the following bar; `None` after the last bar.
    pub next: Option<SectionType>,
    /// Position on the 16-step grid.
    pub step: usize,
    pub is_transition_bar: bool,
    pub is_section_start: bool,
}

impl DrumState {
    pub fn for_context(ctx: &DrumContext) -> DrumState {
        if ctx.is_transition_bar && ctx.step >= FILL_START {
            DrumState::Filling
        } else {
            DrumState::Steady
        }
    }
}

/// Hits to play at `ctx.step`.
pub fn drum_hits(ctx: &DrumContext) -> Vec<DrumHit> {
    if ctx.current == SectionType::None || ctx.step >= STEPS_PER_BAR {
        return Vec::new();
    }
    match DrumState::for_context(ctx) {
        DrumState::Steady => steady_hits(ctx),
        DrumState::Filling => fill_hits(ctx),
    }
}

fn steady_hits(ctx: &DrumContext) -> Vec<DrumHit> {
    let table = pattern_table(ctx.genre);
    let step = ctx.step;
    let on_beat = step % STEPS_PER_BEAT == 0;
    let mut hits = Vec::new();

    if ctx.current == SectionType::PreChorus {
        if on_beat {
            hits.push(hit(DrumPiece::Kick, 0.9));
        }
        if step == 7 || step == 15 {
            hits.push(hit(DrumPiece::Snare, 0.85));
        }
        if step % 2 == 0 {
            hits.push(hit(DrumPiece::ClosedHat, 0.6));
        }
        return hits;
    }

    if table.kick[step] && ctx.current != SectionType::Bridge {
        hits.push(hit(DrumPiece::Kick, 0.9));
    }
    if table.snare[step] {
        hits.push(hit(DrumPiece::Snare, 0.85));
    }
    match ctx.current {
        SectionType::Chorus | SectionType::Solo => {
            match step % STEPS_PER_BEAT {
                0 => hits.push(hit(DrumPiece::ClosedHat, 0.7)),
                2 => hits.push(hit(DrumPiece::OpenHat, 0.65)),
                _ => {}
            }
            if step == 0 && ctx.is_section_start {
                hits.push(hit(DrumPiece::Crash, 1.0));
            }
        }
        _ => {
            if table.hat[step] {
                let velocity = if on_beat { 0.65 } else { 0.5 };
                hits.push(hit(DrumPiece::ClosedHat, velocity));
            }
        }
    }
    hits
}

/// Velocity climbing from 0.5 at the fill start to 1.0 on the last step.
fn rising(step: usize) -> f32 {
    let span = (STEPS_PER_BAR - 1 - FILL_START).max(1) as f32;
    0.5 + 0.5 * (step.saturating_sub(FILL_START) as f32 / span)
}

fn fill_hits(ctx: &DrumContext) -> Vec<DrumHit> {
    let step = ctx.step;
    let heading_to_peak = matches!(ctx.next, Some(SectionType::Chorus | SectionType::Outro));

    if ctx.current == SectionType::Intro {
        return if step >= STEPS_PER_BAR - 2 {
            vec![hit(DrumPiece::Snare, 0.7)]
        } else {
            Vec::new()
        };
    }

    if ctx.current == SectionType::Chorus && !heading_to_peak {
        return tom_cascade(step);
    }

    if heading_to_peak {
        let mut hits = vec![hit(DrumPiece::Snare, rising(step))];
        if step == FILL_START || step == FILL_START + STEPS_PER_BEAT {
            hits.push(hit(DrumPiece::Kick, 0.9));
        }
        return hits;
    }

    genre_fill(pattern_table(ctx.genre).fill, step)
}

/// Kick and snare into high, mid, low toms.
fn tom_cascade(step: usize) -> Vec<DrumHit> {
    match step - FILL_START {
        0 => vec![hit(DrumPiece::Kick, 0.9), hit(DrumPiece::Snare, 0.8)],
        2 => vec![hit(DrumPiece::Snare, 0.85)],
        4 | 5 => vec![hit(DrumPiece::HiTom, 0.85)],
        6 => vec![hit(DrumPiece::MidTom, 0.9)],
        7 => vec![hit(DrumPiece::LoTom, 0.95)],
        _ => Vec::new(),
    }
}

fn genre_fill(strategy: FillStrategy, step: usize) -> Vec<DrumHit> {
    let rel = step - FILL_START;
    match strategy {
        FillStrategy::RockTomCascade => match rel {
            0 => vec![hit(DrumPiece::Kick, 0.9), hit(DrumPiece::Snare, 0.85)],
            1 => vec![hit(DrumPiece::Snare, 0.8)],
            2 | 3 => vec![hit(DrumPiece::HiTom, 0.85)],
            4 | 5 => vec![hit(DrumPiece::MidTom, 0.9)],
            _ => vec![hit(DrumPiece::LoTom, 0.95)],
        },
        FillStrategy::PopBuild => {
            let mut hits = Vec::new();
            if rel == 0 || rel == 4 {
                hits.push(hit(DrumPiece::Kick, 0.9));
            }
            if rel == 2 || rel >= 4 {
                hits.push(hit(DrumPiece::Snare, rising(step)));
            }
            hits
        }
        FillStrategy::TechnoRoll => {
            let mut hits = Vec::new();
            if rel % STEPS_PER_BEAT == 0 {
                hits.push(hit(DrumPiece::Kick, 0.95));
            }
            if rel >= 4 || rel % 2 == 0 {
                hits.push(hit(DrumPiece::Snare, rising(step)));
            }
            hits
        }
        FillStrategy::TrapRoll => {
            let mut hits = vec![hit(DrumPiece::ClosedHat, rising(step))];
            match rel {
                0 => hits.push(hit(DrumPiece::Kick, 0.9)),
                4 | 6 | 7 => hits.push(hit(DrumPiece::Snare, 0.85)),
                _ => {}
            }
            hits
        }
        FillStrategy::Simple => match rel {
            0 => vec![hit(DrumPiece::Kick, 0.9)],
            4 | 6 => vec![hit(DrumPiece::Snare, 0.85)],
            _ => Vec::new(),
        },
    }
}

/// Render the drum track for `range`. Hits landing on the same step and
/// piece after grid scaling are merged, keeping the loudest. Output is
/// ordered by start step.
pub fn generate_drums(state: &SongState, genre: Genre, range: GenerationRange) -> Vec<GeneratedNote> {
    let steps_per_bar = state.steps_per_bar;
    let mut merged: BTreeMap<(usize, DrumPiece), f32> = BTreeMap::new();

    for bar in range.bars(state) {
        let current = state.section_at(bar);
        if current == SectionType::None {
            continue;
        }
        let mut ctx = DrumContext {
            genre,
            current,
            next: state.next_section(bar),
            step: 0,
            is_transition_bar: state.is_transition_bar(bar),
            is_section_start: state.is_section_start(bar),
        };
        if ctx.is_transition_bar {
            log::trace!("bar {bar}: fill {current:?} -> {:?}", ctx.next);
        }
        for step in 0..STEPS_PER_BAR {
            ctx.step = step;
            let start = bar * steps_per_bar + scale_step(step, steps_per_bar);
            for h in drum_hits(&ctx) {
                let slot = merged.entry((start, h.piece)).or_insert(0.0);
                *slot = slot.max(h.velocity);
            }
        }
    }

    merged
        .into_iter()
        .map(|((start_step, piece), velocity)| GeneratedNote {
            midi: piece.midi_note(),
            start_step,
            duration_steps: 1,
            velocity,
        })
        .collect()
}
