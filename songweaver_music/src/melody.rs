// Melody pitch selection and the melody line generator.
//
// Two interchangeable strategies implement `PitchSelector`:
// - `SmoothVoiceLeading` scores every in-range scale tone against the
//   previous pitch (small steps rewarded, big leaps penalised, chord tones
//   favoured on strong beats) with a little random jitter, and takes the best.
// - `MarkovStepper` sorts nearby candidates by distance and picks among the
//   closest few with fixed 60/30/10 odds, so lines mostly step with the
//   occasional deliberate leap. Chorus bars are pushed into the upper part of
//   the range for lift.
//
// Both return `None` when the vocal range holds no scale tone; the generator
// then skips that note slot. `generate_melody` walks the rhythm plan from
// rhythm.rs bar by bar and pitches every note event.
//
// See also: harmony.rs for after-the-fact chord-tone scoring of the output.

use crate::rhythm::{MotifGenerator, PhrasePosition};
use crate::song::{
    Complexity, GeneratedNote, GenerationRange, STEPS_PER_BAR, STEPS_PER_BEAT, SectionType,
    SongState, scale_step,
};
use crate::theory::{ChordDegree, scale_notes};
use serde::{Deserialize, Serialize};
use songweaver_prng::RandomSource;
use std::collections::BTreeSet;

/// Middle of the register Markov starters aim for.
const STARTER_BAND: (u8, u8) = (60, 72);

/// Everything a pitch selector may look at for one note slot.
#[derive(Debug, Clone, Copy)]
pub struct PitchContext<'a> {
    pub previous: Option<u8>,
    pub chord: &'a ChordDegree,
    pub scale_root: u8,
    pub scale_notes: &'a BTreeSet<u8>,
    /// Inclusive `(min, max)` MIDI bounds.
    pub range: (u8, u8),
    pub is_strong_beat: bool,
    pub is_phrase_start: bool,
    pub section: SectionType,
}

impl PitchContext<'_> {
    /// Scale tones inside the range, ascending.
    pub fn scale_tones(&self) -> Vec<u8> {
        let (low, high) = self.range;
        if low > high {
            return Vec::new();
        }
        self.scale_notes.range(low..=high).copied().collect()
    }

    pub fn is_chord_tone(&self, midi: u8) -> bool {
        self.chord.contains(midi, self.scale_root)
    }

    /// Scale tones inside the range that belong to the chord, ascending.
    pub fn chord_tones(&self) -> Vec<u8> {
        self.scale_tones()
            .into_iter()
            .filter(|&p| self.is_chord_tone(p))
            .collect()
    }

    fn clip(&self, midi: u8) -> u8 {
        let (low, high) = self.range;
        midi.clamp(low, high.max(low))
    }
}

/// Picks the pitch for one note slot.
pub trait PitchSelector {
    fn select<R: RandomSource + ?Sized>(&self, ctx: &PitchContext, rng: &mut R) -> Option<u8>;
}

// ---------------------------------------------------------------------------
// Smooth voice leading
// ---------------------------------------------------------------------------

/// Best-scoring nearby tone, with jitter to break near-ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothVoiceLeading;

impl SmoothVoiceLeading {
    /// Proximity term of the score for a move of `distance` semitones.
    pub fn motion_score(distance: u8) -> f64 {
        match distance {
            0 => -5.0,
            1..=2 => 10.0,
            3..=4 => 6.0,
            5..=7 => 3.0,
            d => -f64::from(d - 7) * 2.0,
        }
    }

    fn score(ctx: &PitchContext, candidate: u8, previous: u8) -> f64 {
        let mut score = Self::motion_score(candidate.abs_diff(previous));
        let chord_tone = ctx.is_chord_tone(candidate);
        if chord_tone && ctx.is_strong_beat {
            score += 8.0;
        } else if !chord_tone && !ctx.is_strong_beat {
            // Passing tone.
            score += 3.0;
        }
        score
    }
}

impl PitchSelector for SmoothVoiceLeading {
    fn select<R: RandomSource + ?Sized>(&self, ctx: &PitchContext, rng: &mut R) -> Option<u8> {
        let scale_tones = ctx.scale_tones();
        if scale_tones.is_empty() {
            return None;
        }

        let previous = match ctx.previous {
            Some(prev) if !ctx.is_phrase_start => prev,
            _ => {
                let chord_tones = ctx.chord_tones();
                let anchors = if chord_tones.is_empty() {
                    &scale_tones
                } else {
                    &chord_tones
                };
                return Some(ctx.clip(anchors[anchors.len() / 2]));
            }
        };

        let mut best: Option<(u8, f64)> = None;
        for &candidate in &scale_tones {
            let score = Self::score(ctx, candidate, previous) + rng.next_f64() * 2.0;
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((candidate, score));
            }
        }
        best.map(|(pitch, _)| ctx.clip(pitch))
    }
}

// ---------------------------------------------------------------------------
// Markov-like stepper
// ---------------------------------------------------------------------------

/// Weighted random walk over nearby tones.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkovStepper;

impl MarkovStepper {
    /// Largest move considered before widening the search.
    pub const NEIGHBOR_SPAN: u8 = 7;
    /// Fallback search span.
    pub const WIDE_SPAN: u8 = 12;

    /// Candidate pool after the Chorus lift: the upper two-thirds of the
    /// range, when that still holds any tone.
    fn pool(ctx: &PitchContext) -> Vec<u8> {
        let tones = ctx.scale_tones();
        if ctx.section != SectionType::Chorus {
            return tones;
        }
        let (low, high) = ctx.range;
        let floor = low + high.saturating_sub(low) / 3;
        let lifted: Vec<u8> = tones.iter().copied().filter(|&p| p >= floor).collect();
        if lifted.is_empty() { tones } else { lifted }
    }

    fn starter<R: RandomSource + ?Sized>(ctx: &PitchContext, pool: &[u8], rng: &mut R) -> u8 {
        let (band_low, band_high) = STARTER_BAND;
        let band: Vec<u8> = pool
            .iter()
            .copied()
            .filter(|p| (band_low..=band_high).contains(p))
            .collect();
        let chord_band: Vec<u8> = band
            .iter()
            .copied()
            .filter(|&p| ctx.is_chord_tone(p))
            .collect();
        let choices = if chord_band.is_empty() { band } else { chord_band };
        if let Some(i) = rng.choose_index(choices.len()) {
            return choices[i];
        }
        // Nothing in the band: take the tone nearest its centre.
        let centre = (band_low + band_high) / 2;
        pool.iter()
            .copied()
            .min_by_key(|p| p.abs_diff(centre))
            .unwrap_or(centre)
    }

    /// Candidates around `previous`, widening until something qualifies.
    fn candidates(ctx: &PitchContext, pool: &[u8], previous: u8) -> Vec<u8> {
        let within = |span: u8| -> Vec<u8> {
            pool.iter()
                .copied()
                .filter(|p| p.abs_diff(previous) <= span)
                .collect()
        };
        let neighbors = within(Self::NEIGHBOR_SPAN);
        if ctx.is_strong_beat {
            let chordal: Vec<u8> = neighbors
                .iter()
                .copied()
                .filter(|&p| ctx.is_chord_tone(p))
                .collect();
            if !chordal.is_empty() {
                return chordal;
            }
        }
        if !neighbors.is_empty() {
            return neighbors;
        }
        within(Self::WIDE_SPAN)
    }

    /// Order candidates by distance from `previous`; a repeated pitch costs as
    /// much as the farthest candidate. Ties keep ascending pitch order.
    pub fn rank(mut candidates: Vec<u8>, previous: u8) -> Vec<u8> {
        let farthest = candidates
            .iter()
            .map(|p| p.abs_diff(previous))
            .max()
            .unwrap_or(0);
        candidates.sort_by_key(|&p| match p.abs_diff(previous) {
            0 => farthest,
            d => d,
        });
        candidates
    }

    /// Index drawn with 60% / 30% / 10% odds for the nearest, the next, and
    /// anything further, clamped to `len`.
    pub fn pick_index<R: RandomSource + ?Sized>(len: usize, rng: &mut R) -> usize {
        let roll = rng.next_f64();
        let index = if roll < 0.6 {
            0
        } else if roll < 0.9 {
            1
        } else {
            rng.range_usize(2, len.max(3))
        };
        index.min(len.saturating_sub(1))
    }
}

impl PitchSelector for MarkovStepper {
    fn select<R: RandomSource + ?Sized>(&self, ctx: &PitchContext, rng: &mut R) -> Option<u8> {
        let pool = Self::pool(ctx);
        if pool.is_empty() {
            return None;
        }
        let Some(previous) = ctx.previous else {
            return Some(ctx.clip(Self::starter(ctx, &pool, rng)));
        };
        let candidates = Self::candidates(ctx, &pool, previous);
        if candidates.is_empty() {
            return Some(ctx.clip(previous));
        }
        let ranked = Self::rank(candidates, previous);
        let index = Self::pick_index(ranked.len(), rng);
        Some(ctx.clip(ranked[index]))
    }
}

// ---------------------------------------------------------------------------
// Strategy selection and generation
// ---------------------------------------------------------------------------

/// Runtime choice between the two selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MelodyStrategy {
    #[default]
    Smooth,
    Markov,
}

impl MelodyStrategy {
    pub fn from_name(name: &str) -> MelodyStrategy {
        match name.to_lowercase().as_str() {
            "smooth" | "voice-leading" => MelodyStrategy::Smooth,
            "markov" | "stepper" => MelodyStrategy::Markov,
            _ => {
                log::debug!("unknown melody strategy '{name}', using smooth");
                MelodyStrategy::Smooth
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MelodyStrategy::Smooth => "smooth",
            MelodyStrategy::Markov => "markov",
        }
    }
}

impl PitchSelector for MelodyStrategy {
    fn select<R: RandomSource + ?Sized>(&self, ctx: &PitchContext, rng: &mut R) -> Option<u8> {
        match self {
            MelodyStrategy::Smooth => SmoothVoiceLeading.select(ctx, rng),
            MelodyStrategy::Markov => MarkovStepper.select(ctx, rng),
        }
    }
}

fn note_velocity(is_strong_beat: bool, section: SectionType) -> f32 {
    let base = if is_strong_beat { 0.6 } else { 0.45 };
    (base + 0.3 * section.energy()).min(1.0)
}

/// Generate the melody for `range`.
///
/// Phrase positions count from the first bar of the range. Bars in `None`
/// sections or without a chord are left silent. Notes never cross a bar line
/// and never overlap; motif events too short to survive grid scaling are
/// dropped.
pub fn generate_melody<S, R>(
    state: &SongState,
    range: GenerationRange,
    complexity: Complexity,
    selector: &S,
    rng: &mut R,
) -> Vec<GeneratedNote>
where
    S: PitchSelector + ?Sized,
    R: RandomSource + ?Sized,
{
    let scale_set = scale_notes(state.root_pitch_class, state.scale);
    let bounds = state.vocal_range.bounds();
    let steps_per_bar = state.steps_per_bar;
    let bars = range.bars(state);
    let last = bars.end.saturating_sub(1);

    let mut motifs = MotifGenerator::new(complexity);
    let mut previous: Option<u8> = None;
    let mut notes = Vec::new();

    for (offset, bar) in bars.enumerate() {
        let section = state.section_at(bar);
        let motif = motifs.next_bar(offset, section, bar == last, rng);
        if section == SectionType::None {
            continue;
        }
        let Some(chord) = state.chord_at(bar) else {
            continue;
        };
        let phrase_start = PhrasePosition::at(offset) == PhrasePosition::Statement;

        let bar_start = bar * steps_per_bar;
        let mut pos = 0;
        let mut first_note = true;
        for event in &motif.events {
            if pos >= STEPS_PER_BAR {
                break;
            }
            let end = (pos + event.duration).min(STEPS_PER_BAR);
            let start = scale_step(pos, steps_per_bar);
            let stop = scale_step(end, steps_per_bar);
            // On coarse grids short events collapse onto the next one's start.
            if !event.is_rest && stop > start {
                let is_strong_beat = pos % STEPS_PER_BEAT == 0;
                let ctx = PitchContext {
                    previous,
                    chord,
                    scale_root: state.root_pitch_class,
                    scale_notes: &scale_set,
                    range: bounds,
                    is_strong_beat,
                    is_phrase_start: phrase_start && first_note,
                    section,
                };
                match selector.select(&ctx, rng) {
                    Some(midi) => {
                        notes.push(GeneratedNote {
                            midi,
                            start_step: bar_start + start,
                            duration_steps: stop - start,
                            velocity: note_velocity(is_strong_beat, section),
                        });
                        previous = Some(midi);
                    }
                    None => log::debug!("bar {bar}: no scale tone in range {bounds:?}"),
                }
                first_note = false;
            }
            pos = end;
        }
    }
    notes
}
