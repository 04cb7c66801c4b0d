// Song-level data model and structure expansion.
//
// A song is planned as a run-length-encoded list of sections (`SongTemplate`),
// expanded into one `SectionType` per bar, and given one chord-degree index
// per bar from a `ProgressionStyle`. The resulting `SongState` is the
// read-only view every generator receives; generators answer with fresh
// `GeneratedNote` lists and never mutate the state.
//
// Positions are counted in sixteenth-note steps. Pattern tables (rhythm
// motifs, drum grids, arpeggios) are authored on a 16-step bar and scaled
// onto `SongState::steps_per_bar` with `scale_step`.
//
// Depends on progression.rs for section resolution. Consumed by every
// generator module and by compose.rs.

use crate::progression::{DEFAULT_PROGRESSION, ProgressionStyle, resolve_section};
use crate::theory::{ChordDegree, Key, ScaleKind, VocalRange};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Steps in the bar that pattern tables are written against.
pub const STEPS_PER_BAR: usize = 16;

/// Steps per beat on the pattern grid.
pub const STEPS_PER_BEAT: usize = 4;

/// Map a position on the 16-step pattern grid onto a bar of `steps_per_bar`.
pub fn scale_step(pattern_step: usize, steps_per_bar: usize) -> usize {
    pattern_step * steps_per_bar / STEPS_PER_BAR
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Kind of song section. `None` marks bars left empty on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SectionType {
    Intro,
    Verse,
    PreChorus,
    Chorus,
    Bridge,
    Solo,
    Drop,
    Outro,
    None,
}

impl SectionType {
    pub const ALL: [SectionType; 9] = [
        SectionType::Intro,
        SectionType::Verse,
        SectionType::PreChorus,
        SectionType::Chorus,
        SectionType::Bridge,
        SectionType::Solo,
        SectionType::Drop,
        SectionType::Outro,
        SectionType::None,
    ];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            SectionType::Intro => "Intro",
            SectionType::Verse => "Verse",
            SectionType::PreChorus => "Pre-Chorus",
            SectionType::Chorus => "Chorus",
            SectionType::Bridge => "Bridge",
            SectionType::Solo => "Solo",
            SectionType::Drop => "Drop",
            SectionType::Outro => "Outro",
            SectionType::None => "-",
        }
    }

    /// Display colour for timeline views (CSS hex). Presentation only.
    pub fn color(self) -> &'static str {
        match self {
            SectionType::Intro => "#4a90d9",
            SectionType::Verse => "#50b86c",
            SectionType::PreChorus => "#e0b341",
            SectionType::Chorus => "#e05a47",
            SectionType::Bridge => "#9b6bd6",
            SectionType::Solo => "#e07b39",
            SectionType::Drop => "#d6368f",
            SectionType::Outro => "#5c6b7a",
            SectionType::None => "#2b2b2b",
        }
    }

    /// Relative intensity in [0, 1], used to scale velocities.
    pub fn energy(self) -> f32 {
        match self {
            SectionType::Intro | SectionType::Outro => 0.55,
            SectionType::Verse => 0.7,
            SectionType::Bridge => 0.65,
            SectionType::PreChorus => 0.8,
            SectionType::Solo => 0.9,
            SectionType::Chorus | SectionType::Drop => 1.0,
            SectionType::None => 0.0,
        }
    }

    /// Solo and Drop reuse the Chorus progression.
    pub fn progression_alias(self) -> SectionType {
        match self {
            SectionType::Solo | SectionType::Drop => SectionType::Chorus,
            other => other,
        }
    }
}

/// Musical style family. Closed set; free-text names go through
/// `progression::resolve_genre`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Genre {
    #[default]
    Pop,
    Rock,
    Techno,
    Trap,
    LoFi,
    Ballad,
}

impl Genre {
    pub const ALL: [Genre; 6] = [
        Genre::Pop,
        Genre::Rock,
        Genre::Techno,
        Genre::Trap,
        Genre::LoFi,
        Genre::Ballad,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Genre::Pop => "Pop",
            Genre::Rock => "Rock",
            Genre::Techno => "Techno",
            Genre::Trap => "Trap",
            Genre::LoFi => "Lo-Fi",
            Genre::Ballad => "Ballad",
        }
    }

    /// Typical tempo in BPM.
    pub fn default_bpm(self) -> u16 {
        match self {
            Genre::Pop => 110,
            Genre::Rock => 128,
            Genre::Techno => 126,
            Genre::Trap => 140,
            Genre::LoFi => 80,
            Genre::Ballad => 72,
        }
    }
}

/// How busy generated rhythms may get.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
}

impl Complexity {
    pub fn from_name(name: &str) -> Complexity {
        match name.to_lowercase().as_str() {
            "low" => Complexity::Low,
            "high" => Complexity::High,
            "medium" | "med" => Complexity::Medium,
            _ => {
                log::debug!("unknown complexity '{name}', using Medium");
                Complexity::Medium
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Templates and structure expansion
// ---------------------------------------------------------------------------

/// One run of bars in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub section: SectionType,
    pub length_in_bars: u32,
}

impl SectionSpec {
    pub fn new(section: SectionType, length_in_bars: u32) -> Self {
        SectionSpec {
            section,
            length_in_bars,
        }
    }
}

/// A compressed song plan: ordered sections with their lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongTemplate {
    pub genre: Genre,
    pub bpm: u16,
    pub sections: Vec<SectionSpec>,
}

impl SongTemplate {
    /// Total bars the template expands to.
    pub fn total_bars(&self) -> usize {
        self.sections.iter().map(|s| s.length_in_bars as usize).sum()
    }

    /// A conventional arrangement for the genre at its typical tempo.
    pub fn standard(genre: Genre) -> SongTemplate {
        use SectionType as S;
        let plan: &[(SectionType, u32)] = match genre {
            Genre::Pop => &[
                (S::Intro, 4),
                (S::Verse, 8),
                (S::PreChorus, 4),
                (S::Chorus, 8),
                (S::Verse, 8),
                (S::PreChorus, 4),
                (S::Chorus, 8),
                (S::Bridge, 4),
                (S::Chorus, 8),
                (S::Outro, 4),
            ],
            Genre::Rock => &[
                (S::Intro, 4),
                (S::Verse, 8),
                (S::Chorus, 8),
                (S::Verse, 8),
                (S::Chorus, 8),
                (S::Solo, 8),
                (S::Chorus, 8),
                (S::Outro, 4),
            ],
            Genre::Techno => &[
                (S::Intro, 8),
                (S::Verse, 8),
                (S::Bridge, 4),
                (S::Drop, 8),
                (S::Verse, 8),
                (S::Drop, 8),
                (S::Outro, 8),
            ],
            Genre::Trap => &[
                (S::Intro, 4),
                (S::Chorus, 8),
                (S::Verse, 16),
                (S::Chorus, 8),
                (S::Verse, 16),
                (S::Chorus, 8),
                (S::Outro, 4),
            ],
            Genre::LoFi => &[
                (S::Intro, 4),
                (S::Verse, 8),
                (S::Chorus, 8),
                (S::Verse, 8),
                (S::Chorus, 8),
                (S::Outro, 4),
            ],
            Genre::Ballad => &[
                (S::Intro, 4),
                (S::Verse, 8),
                (S::Verse, 8),
                (S::Chorus, 8),
                (S::Bridge, 4),
                (S::Chorus, 8),
                (S::Outro, 4),
            ],
        };
        SongTemplate {
            genre,
            bpm: genre.default_bpm(),
            sections: plan
                .iter()
                .map(|&(section, bars)| SectionSpec::new(section, bars))
                .collect(),
        }
    }
}

/// Run-length decode a template into one section per bar, preserving order.
/// Zero-length runs contribute nothing.
pub fn expand_structure(template: &SongTemplate) -> Vec<SectionType> {
    template
        .sections
        .iter()
        .flat_map(|run| std::iter::repeat_n(run.section, run.length_in_bars as usize))
        .collect()
}

/// Give every bar a chord-degree index from `style`.
///
/// Each bar resolves its section to a progression loop (Solo/Drop use the
/// Chorus loop; misses fall back Chorus, then Verse, then the default loop)
/// and takes entry `bar_index % loop.len()`. The phase comes from the song's
/// absolute bar index, so a section that recurs later may start mid-loop.
pub fn assign_chords_to_structure(
    bar_structure: &[SectionType],
    style: &ProgressionStyle,
) -> Vec<usize> {
    let degree_count = style.preferred_scale.chord_degrees().len();
    bar_structure
        .iter()
        .enumerate()
        .map(|(bar, &section)| {
            let progression = resolve_section(style, section).unwrap_or(DEFAULT_PROGRESSION);
            progression[bar % progression.len()] % degree_count
        })
        .collect()
}

/// Which parts play in a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrumentation {
    pub melody: bool,
    pub chords: bool,
    pub bass: bool,
    pub arpeggio: bool,
    pub drums: bool,
}

impl Instrumentation {
    pub fn for_section(section: SectionType) -> Instrumentation {
        let on = |melody, chords, bass, arpeggio, drums| Instrumentation {
            melody,
            chords,
            bass,
            arpeggio,
            drums,
        };
        match section {
            SectionType::Intro => on(true, true, false, true, true),
            SectionType::Verse => on(true, true, true, false, true),
            SectionType::PreChorus => on(true, true, true, true, true),
            SectionType::Chorus => on(true, true, true, true, true),
            SectionType::Bridge => on(true, true, true, true, true),
            SectionType::Solo => on(true, true, true, false, true),
            SectionType::Drop => on(false, false, true, true, true),
            SectionType::Outro => on(true, true, false, true, true),
            SectionType::None => on(false, false, false, false, false),
        }
    }
}

/// Instrumentation for every bar of an expanded structure.
pub fn assign_instrumentation(bar_structure: &[SectionType]) -> Vec<Instrumentation> {
    bar_structure
        .iter()
        .map(|&section| Instrumentation::for_section(section))
        .collect()
}

// ---------------------------------------------------------------------------
// Song state and generated output
// ---------------------------------------------------------------------------

/// Read-only view of a song that generators work from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongState {
    pub root_pitch_class: u8,
    pub scale: ScaleKind,
    pub steps_per_bar: usize,
    /// Chord-degree index per bar.
    pub bar_chords: Vec<usize>,
    /// Section per bar.
    pub bar_structure: Vec<SectionType>,
    pub vocal_range: VocalRange,
}

impl SongState {
    /// Expand `template`, assign chords from `style`, and key the song on
    /// `root_pitch_class` in `scale`. Chord indices are reduced into the
    /// scale's chord table when the scale differs from the style's.
    pub fn from_template(
        template: &SongTemplate,
        root_pitch_class: u8,
        scale: ScaleKind,
        style: &ProgressionStyle,
        vocal_range: VocalRange,
    ) -> SongState {
        let bar_structure = expand_structure(template);
        let degree_count = scale.chord_degrees().len();
        let bar_chords = assign_chords_to_structure(&bar_structure, style)
            .into_iter()
            .map(|degree| degree % degree_count)
            .collect();
        SongState {
            root_pitch_class: root_pitch_class % 12,
            scale,
            steps_per_bar: STEPS_PER_BAR,
            bar_chords,
            bar_structure,
            vocal_range,
        }
    }

    pub fn total_bars(&self) -> usize {
        self.bar_structure.len()
    }

    pub fn total_steps(&self) -> usize {
        self.total_bars() * self.steps_per_bar
    }

    pub fn key(&self) -> Key {
        Key::new(self.root_pitch_class, self.scale)
    }

    pub fn section_at(&self, bar: usize) -> SectionType {
        self.bar_structure
            .get(bar)
            .copied()
            .unwrap_or(SectionType::None)
    }

    /// Section of the following bar, or `None` after the last bar.
    pub fn next_section(&self, bar: usize) -> Option<SectionType> {
        self.bar_structure.get(bar + 1).copied()
    }

    /// Chord degree for a bar; `None` if the bar or its index is out of table.
    pub fn chord_at(&self, bar: usize) -> Option<&'static ChordDegree> {
        let index = *self.bar_chords.get(bar)?;
        let degree = self.key().chord(index);
        if degree.is_none() {
            log::debug!("bar {bar}: chord index {index} outside {:?} table", self.scale);
        }
        degree
    }

    /// First bar of a contiguous run of one section.
    pub fn is_section_start(&self, bar: usize) -> bool {
        bar == 0 || self.bar_structure.get(bar - 1) != self.bar_structure.get(bar)
    }

    /// The bar hands over to a different section, or ends the song.
    pub fn is_transition_bar(&self, bar: usize) -> bool {
        self.next_section(bar) != Some(self.section_at(bar))
    }
}

/// A note produced by a generator. Times are in steps from the song start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratedNote {
    pub midi: u8,
    pub start_step: usize,
    pub duration_steps: usize,
    /// 0.0-1.0.
    pub velocity: f32,
}

impl GeneratedNote {
    pub fn end_step(&self) -> usize {
        self.start_step + self.duration_steps
    }
}

/// A span of bars to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRange {
    pub start_bar: usize,
    pub length_in_bars: usize,
}

impl GenerationRange {
    pub fn new(start_bar: usize, length_in_bars: usize) -> Self {
        GenerationRange {
            start_bar,
            length_in_bars,
        }
    }

    pub fn whole_song(state: &SongState) -> Self {
        GenerationRange::new(0, state.total_bars())
    }

    /// The bars actually covered, clipped to the song.
    pub fn bars(&self, state: &SongState) -> Range<usize> {
        let end = self
            .start_bar
            .saturating_add(self.length_in_bars)
            .min(state.total_bars());
        self.start_bar.min(end)..end
    }
}
