// Rhythmic motifs: the duration skeletons melodies are written on.
//
// Each section maps to a coarse vibe (sparse, chatty, anthem, syncopated)
// and each vibe owns a pool of one-bar duration templates on the 16-step
// grid. Bars are grouped into 4-bar phrases counted from the start of the
// generation request:
//
//   bar 0  statement   a template drawn from the vibe's pool
//   bar 1  repeat      the same template again
//   bar 2  variation   the first note of 4+ steps split into two halves
//   bar 3  resolution  a long note and a rest (or a whole-bar note when it is
//                      the request's final bar)
//
// Intro bars ignore the phrase and always play a sparse note-rest-note-rest
// figure. High complexity adds sixteenth-note templates to the chatty pool.
//
// Consumed by melody.rs, which pitches each note event.

use crate::song::{Complexity, STEPS_PER_BAR, SectionType};
use songweaver_prng::RandomSource;

/// Bars per phrase.
pub const PHRASE_BARS: usize = 4;

/// One slot of a motif: a note or a rest lasting `duration` steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotifEvent {
    pub duration: usize,
    pub is_rest: bool,
}

const fn note(duration: usize) -> MotifEvent {
    MotifEvent {
        duration,
        is_rest: false,
    }
}

const fn rest(duration: usize) -> MotifEvent {
    MotifEvent {
        duration,
        is_rest: true,
    }
}

/// An ordered list of note and rest events. The total need not fill a bar;
/// callers truncate at the bar line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RhythmMotif {
    pub events: Vec<MotifEvent>,
}

impl RhythmMotif {
    pub fn from_events(events: &[MotifEvent]) -> Self {
        RhythmMotif {
            events: events.to_vec(),
        }
    }

    pub fn total_steps(&self) -> usize {
        self.events.iter().map(|e| e.duration).sum()
    }

    pub fn note_count(&self) -> usize {
        self.events.iter().filter(|e| !e.is_rest).count()
    }
}

/// Rhythmic character of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vibe {
    /// Few notes, lots of air.
    Sparse,
    /// Short, speech-like durations.
    Chatty,
    /// Long, sustained durations.
    Anthem,
    /// 3-3-2 style groupings.
    Sync,
}

const SPARSE_POOL: &[&[MotifEvent]] = &[
    &[note(8), rest(8)],
    &[note(4), rest(4), note(4), rest(4)],
    &[note(12), rest(4)],
    &[note(6), rest(2), note(8)],
    &[note(16)],
    &[rest(4), note(8), rest(4)],
    &[note(4), rest(8), note(4)],
];

const CHATTY_POOL: &[&[MotifEvent]] = &[
    &[note(2), note(2), note(2), note(2), note(4), rest(4)],
    &[note(2), note(2), note(4), note(2), note(2), rest(4)],
    &[note(4), note(2), note(2), note(4), rest(4)],
    &[note(2), rest(2), note(2), note(2), note(2), note(2), rest(4)],
    &[note(3), note(3), note(2), note(4), rest(4)],
    &[note(2), note(2), note(2), note(2), note(2), note(2), note(4)],
    &[rest(2), note(2), note(2), note(2), note(4), rest(4)],
    &[note(4), note(4), note(2), note(2), rest(4)],
];

/// Sixteenth-note figures unlocked by `Complexity::High`.
const CHATTY_HIGH_EXTRAS: &[&[MotifEvent]] = &[
    &[note(1), note(1), note(2), note(1), note(1), note(2), note(4), rest(4)],
    &[note(1), note(1), note(1), note(1), note(2), note(2), note(4), rest(4)],
];

const ANTHEM_POOL: &[&[MotifEvent]] = &[
    &[note(8), note(8)],
    &[note(4), note(4), note(8)],
    &[note(12), note(4)],
    &[note(6), note(6), note(4)],
    &[note(4), note(12)],
    &[note(8), note(4), note(4)],
    &[note(16)],
];

const SYNC_POOL: &[&[MotifEvent]] = &[
    &[note(3), note(3), note(2), note(3), note(3), note(2)],
    &[note(3), note(3), note(2), note(8)],
    &[note(3), rest(1), note(3), note(3), note(2), note(4)],
    &[rest(2), note(3), note(3), note(2), note(6)],
    &[note(6), note(6), note(4)],
    &[note(3), note(3), note(4), rest(2), note(4)],
];

const INTRO_FIGURE: &[MotifEvent] = &[note(4), rest(4), note(4), rest(4)];

impl Vibe {
    pub fn for_section(section: SectionType) -> Vibe {
        match section {
            SectionType::Intro | SectionType::Outro | SectionType::None => Vibe::Sparse,
            SectionType::Verse | SectionType::PreChorus | SectionType::Solo => Vibe::Chatty,
            SectionType::Chorus | SectionType::Drop => Vibe::Anthem,
            SectionType::Bridge => Vibe::Sync,
        }
    }

    /// Templates available at this complexity.
    pub fn pool(self, complexity: Complexity) -> Vec<&'static [MotifEvent]> {
        let mut pool: Vec<&'static [MotifEvent]> = match self {
            Vibe::Sparse => SPARSE_POOL.to_vec(),
            Vibe::Chatty => CHATTY_POOL.to_vec(),
            Vibe::Anthem => ANTHEM_POOL.to_vec(),
            Vibe::Sync => SYNC_POOL.to_vec(),
        };
        if self == Vibe::Chatty && complexity == Complexity::High {
            pool.extend_from_slice(CHATTY_HIGH_EXTRAS);
        }
        pool
    }
}

/// Role of a bar within its phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhrasePosition {
    Statement,
    Repeat,
    Variation,
    Resolution,
}

impl PhrasePosition {
    /// Position of the `bar`-th bar of a generation request.
    pub fn at(bar: usize) -> PhrasePosition {
        match bar % PHRASE_BARS {
            0 => PhrasePosition::Statement,
            1 => PhrasePosition::Repeat,
            2 => PhrasePosition::Variation,
            _ => PhrasePosition::Resolution,
        }
    }
}

/// Draw a base motif uniformly from the vibe's pool.
pub fn choose_base_motif<R: RandomSource + ?Sized>(
    vibe: Vibe,
    complexity: Complexity,
    rng: &mut R,
) -> RhythmMotif {
    let pool = vibe.pool(complexity);
    match rng.choose_index(pool.len()) {
        Some(i) => RhythmMotif::from_events(pool[i]),
        None => RhythmMotif::from_events(INTRO_FIGURE),
    }
}

/// Split the first note of four or more steps into two back-to-back halves.
/// Motifs without such a note come back unchanged.
pub fn vary_motif(base: &RhythmMotif) -> RhythmMotif {
    let Some(pos) = base
        .events
        .iter()
        .position(|e| !e.is_rest && e.duration >= 4)
    else {
        return base.clone();
    };
    let long = base.events[pos].duration;
    let first = long / 2;
    let mut events = base.events.clone();
    events.splice(pos..=pos, [note(first), note(long - first)]);
    RhythmMotif { events }
}

/// Cadence figure closing a phrase.
pub fn resolution_motif(is_final_bar: bool) -> RhythmMotif {
    if is_final_bar {
        RhythmMotif::from_events(&[note(STEPS_PER_BAR)])
    } else {
        RhythmMotif::from_events(&[note(STEPS_PER_BAR * 3 / 4), rest(STEPS_PER_BAR / 4)])
    }
}

/// The fixed Intro figure.
pub fn intro_motif() -> RhythmMotif {
    RhythmMotif::from_events(INTRO_FIGURE)
}

/// Walks the phrase state machine bar by bar for one generation request.
///
/// The base motif is redrawn at every phrase statement and whenever the
/// section vibe changes mid-phrase.
#[derive(Debug, Clone)]
pub struct MotifGenerator {
    complexity: Complexity,
    base: Option<(Vibe, RhythmMotif)>,
}

impl MotifGenerator {
    pub fn new(complexity: Complexity) -> Self {
        MotifGenerator {
            complexity,
            base: None,
        }
    }

    /// Motif for the `bar`-th bar of the request (0-based).
    pub fn next_bar<R: RandomSource + ?Sized>(
        &mut self,
        bar: usize,
        section: SectionType,
        is_last_bar: bool,
        rng: &mut R,
    ) -> RhythmMotif {
        if section == SectionType::Intro {
            return intro_motif();
        }
        let position = PhrasePosition::at(bar);
        let vibe = Vibe::for_section(section);
        let stale = match &self.base {
            Some((current, _)) => *current != vibe,
            None => true,
        };
        if stale || position == PhrasePosition::Statement {
            let motif = choose_base_motif(vibe, self.complexity, rng);
            log::trace!("bar {bar}: new {vibe:?} motif {:?}", motif.events);
            self.base = Some((vibe, motif));
        }
        let base = self.base.as_ref().map(|(_, m)| m.clone()).unwrap_or_default();
        match position {
            PhrasePosition::Statement | PhrasePosition::Repeat => base,
            PhrasePosition::Variation => vary_motif(&base),
            PhrasePosition::Resolution => resolution_motif(is_last_bar),
        }
    }
}

/// Motifs for a run of bars, one per entry of `sections`.
pub fn plan_rhythms<R: RandomSource + ?Sized>(
    sections: &[SectionType],
    complexity: Complexity,
    rng: &mut R,
) -> Vec<RhythmMotif> {
    let mut generator = MotifGenerator::new(complexity);
    let last = sections.len().saturating_sub(1);
    sections
        .iter()
        .enumerate()
        .map(|(bar, &section)| generator.next_bar(bar, section, bar == last, rng))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use songweaver_prng::SongRng;

    #[test]
    fn pools_fill_one_bar_and_have_six_to_nine_templates() {
        for vibe in [Vibe::Sparse, Vibe::Chatty, Vibe::Anthem, Vibe::Sync] {
            let pool = vibe.pool(Complexity::Medium);
            assert!((6..=9).contains(&pool.len()), "{vibe:?}: {}", pool.len());
            for template in vibe.pool(Complexity::High) {
                let total: usize = template.iter().map(|e| e.duration).sum();
                assert_eq!(total, STEPS_PER_BAR, "{vibe:?} {template:?}");
            }
        }
    }

    #[test]
    fn high_complexity_only_extends_chatty() {
        assert_eq!(
            Vibe::Chatty.pool(Complexity::High).len(),
            Vibe::Chatty.pool(Complexity::Low).len() + 2
        );
        for vibe in [Vibe::Sparse, Vibe::Anthem, Vibe::Sync] {
            assert_eq!(vibe.pool(Complexity::High), vibe.pool(Complexity::Low));
        }
    }

    #[test]
    fn variation_splits_first_long_note() {
        let base = RhythmMotif::from_events(&[note(2), rest(2), note(8), note(4)]);
        let varied = vary_motif(&base);
        assert_eq!(
            varied.events,
            vec![note(2), rest(2), note(4), note(4), note(4)]
        );
        assert_eq!(varied.total_steps(), base.total_steps());
    }

    #[test]
    fn variation_without_long_note_is_identity() {
        let base = RhythmMotif::from_events(&[note(3), note(3), note(2), rest(8)]);
        assert_eq!(vary_motif(&base), base);
    }

    #[test]
    fn odd_long_note_splits_unevenly_but_keeps_length() {
        let varied = vary_motif(&RhythmMotif::from_events(&[note(5)]));
        assert_eq!(varied.events, vec![note(2), note(3)]);
    }

    #[test]
    fn chorus_phrase_follows_state_machine() {
        let mut rng = SongRng::new(11);
        let bars = plan_rhythms(&[SectionType::Chorus; 8], Complexity::Low, &mut rng);
        assert_eq!(bars[0], bars[1], "bar 1 replays the statement");
        assert_eq!(bars[2], vary_motif(&bars[0]));
        assert_eq!(bars[3], resolution_motif(false));
        assert_eq!(bars[3].events, vec![note(12), rest(4)]);
        assert_eq!(bars[7], resolution_motif(true));
    }

    #[test]
    fn four_bar_request_ends_on_sustained_note() {
        let mut rng = SongRng::new(5);
        let bars = plan_rhythms(&[SectionType::Chorus; 4], Complexity::Low, &mut rng);
        assert_eq!(bars[3].events, vec![note(STEPS_PER_BAR)]);
    }

    #[test]
    fn intro_ignores_phrase_position() {
        let mut rng = SongRng::new(1);
        let bars = plan_rhythms(&[SectionType::Intro; 5], Complexity::High, &mut rng);
        for bar in bars {
            assert_eq!(bar, intro_motif());
        }
    }

    #[test]
    fn vibe_change_mid_phrase_redraws_base() {
        let mut rng = SongRng::new(21);
        let bars = plan_rhythms(
            &[SectionType::Verse, SectionType::Chorus, SectionType::Chorus],
            Complexity::Medium,
            &mut rng,
        );
        let anthem = Vibe::Anthem.pool(Complexity::Medium);
        assert!(anthem.iter().any(|t| *t == bars[1].events.as_slice()));
    }

    #[test]
    fn vibes_by_section() {
        assert_eq!(Vibe::for_section(SectionType::Intro), Vibe::Sparse);
        assert_eq!(Vibe::for_section(SectionType::Outro), Vibe::Sparse);
        assert_eq!(Vibe::for_section(SectionType::Verse), Vibe::Chatty);
        assert_eq!(Vibe::for_section(SectionType::Chorus), Vibe::Anthem);
        assert_eq!(Vibe::for_section(SectionType::Bridge), Vibe::Sync);
    }
}
