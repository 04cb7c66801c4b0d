// Chord progression library and selection.
//
// Each genre owns a few alternative `ProgressionStyle`s ("vibes"). A style
// names a preferred scale and lists, per section type, the loop of chord
// degree indices that section cycles through. Choosing a style is the only
// random decision in harmony; everything after is table lookup.
//
// The fallback policy lives in two functions so it is stated once:
// - `resolve_genre`: free-text genre -> `Genre`, unknown -> Pop.
// - `resolve_section`: section -> its loop, else Chorus, else Verse.
// When both miss, callers use `DEFAULT_PROGRESSION` reduced into the scale's
// chord table.
//
// Consumed by song.rs (`assign_chords_to_structure`) and compose.rs.

use crate::song::{Genre, SectionType};
use crate::theory::ScaleKind;
use songweaver_prng::RandomSource;

/// Loop used when a style has nothing for a section, its Chorus, or its Verse.
/// In major keys this is I-vi-IV-V; in minor keys i-VI-iv-v.
pub const DEFAULT_PROGRESSION: &[usize] = &[0, 5, 3, 4];

/// A named way of harmonizing a song in one genre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressionStyle {
    pub name: &'static str,
    pub preferred_scale: ScaleKind,
    /// Chord-degree loop per section. Solo and Drop are never looked up
    /// directly; they reuse Chorus.
    pub sections: &'static [(SectionType, &'static [usize])],
}

impl ProgressionStyle {
    /// The loop written for exactly this section, if any.
    pub fn section_loop(&self, section: SectionType) -> Option<&'static [usize]> {
        self.sections
            .iter()
            .find(|(s, progression)| *s == section && !progression.is_empty())
            .map(|&(_, progression)| progression)
    }
}

use crate::song::SectionType::{Bridge, Chorus, Intro, Outro, PreChorus, Verse};

const POP_STYLES: &[ProgressionStyle] = &[
    ProgressionStyle {
        name: "Four-Chord Anthem",
        preferred_scale: ScaleKind::Major,
        sections: &[
            (Intro, &[0, 4]),
            (Verse, &[0, 4, 5, 3]),
            (PreChorus, &[1, 3, 4, 4]),
            (Chorus, &[3, 0, 4, 5]),
            (Bridge, &[5, 3, 0, 4]),
            (Outro, &[3, 4, 0, 0]),
        ],
    },
    ProgressionStyle {
        name: "Heartbreak Radio",
        preferred_scale: ScaleKind::Minor,
        sections: &[
            (Intro, &[0, 5]),
            (Verse, &[0, 5, 2, 6]),
            (PreChorus, &[3, 3, 4, 4]),
            (Chorus, &[5, 2, 6, 0]),
            (Bridge, &[3, 0, 5, 7]),
            (Outro, &[5, 6, 0]),
        ],
    },
    ProgressionStyle {
        name: "Doo-Wop Sunshine",
        preferred_scale: ScaleKind::Major,
        sections: &[(Verse, &[0, 5, 3, 4]), (Chorus, &[0, 5, 1, 7])],
    },
];

const ROCK_STYLES: &[ProgressionStyle] = &[
    ProgressionStyle {
        name: "Arena Swagger",
        preferred_scale: ScaleKind::Mixolydian,
        sections: &[
            (Intro, &[0, 6]),
            (Verse, &[0, 6, 3, 0]),
            (Chorus, &[0, 3, 6, 3]),
            (Bridge, &[5, 3, 4, 6]),
            (Outro, &[6, 3, 0]),
        ],
    },
    ProgressionStyle {
        name: "Minor Riff Machine",
        preferred_scale: ScaleKind::Minor,
        sections: &[
            (Verse, &[0, 6, 5, 6]),
            (PreChorus, &[3, 4]),
            (Chorus, &[5, 6, 0, 0]),
            (Bridge, &[3, 5, 6, 7]),
        ],
    },
    ProgressionStyle {
        name: "Garage Power",
        preferred_scale: ScaleKind::Major,
        sections: &[(Verse, &[0, 3, 4, 3]), (Chorus, &[3, 4, 0, 0])],
    },
];

const TECHNO_STYLES: &[ProgressionStyle] = &[
    ProgressionStyle {
        name: "Hypnotic Loop",
        preferred_scale: ScaleKind::Minor,
        sections: &[
            (Intro, &[0]),
            (Verse, &[0, 0, 5, 5]),
            (Chorus, &[0, 5, 6, 4]),
            (Bridge, &[3, 3, 5, 5]),
            (Outro, &[0]),
        ],
    },
    ProgressionStyle {
        name: "Warehouse Phrygian",
        preferred_scale: ScaleKind::Phrygian,
        sections: &[
            (Verse, &[0, 1, 0, 1]),
            (Chorus, &[0, 1, 5, 6]),
            (Bridge, &[3, 1]),
        ],
    },
];

const TRAP_STYLES: &[ProgressionStyle] = &[
    ProgressionStyle {
        name: "Dark Bells",
        preferred_scale: ScaleKind::HarmonicMinor,
        sections: &[
            (Intro, &[0, 5]),
            (Verse, &[0, 5, 0, 4]),
            (Chorus, &[0, 5, 3, 4]),
            (Bridge, &[3, 5, 6, 4]),
            (Outro, &[0]),
        ],
    },
    ProgressionStyle {
        name: "Midnight Drift",
        preferred_scale: ScaleKind::Minor,
        sections: &[
            (Verse, &[0, 5]),
            (Chorus, &[0, 3, 5, 4]),
            (Bridge, &[5, 6]),
        ],
    },
];

const LOFI_STYLES: &[ProgressionStyle] = &[
    ProgressionStyle {
        name: "Rainy Window",
        preferred_scale: ScaleKind::Dorian,
        sections: &[
            (Intro, &[0, 3]),
            (Verse, &[0, 3, 0, 3]),
            (Chorus, &[1, 4, 0, 6]),
            (Bridge, &[2, 3, 4, 0]),
            (Outro, &[3, 0]),
        ],
    },
    ProgressionStyle {
        name: "Soft Sunday",
        preferred_scale: ScaleKind::Major,
        sections: &[
            (Verse, &[1, 4, 0, 5]),
            (Chorus, &[3, 2, 1, 0]),
            (Bridge, &[5, 1, 4, 0]),
        ],
    },
];

const BALLAD_STYLES: &[ProgressionStyle] = &[
    ProgressionStyle {
        name: "Candlelight",
        preferred_scale: ScaleKind::Major,
        sections: &[
            (Intro, &[0, 3]),
            (Verse, &[0, 4, 5, 2, 3, 0, 3, 4]),
            (Chorus, &[3, 4, 0, 5, 3, 4, 0, 0]),
            (Bridge, &[5, 2, 3, 7]),
            (Outro, &[3, 4, 0]),
        ],
    },
    ProgressionStyle {
        name: "Rain on Glass",
        preferred_scale: ScaleKind::Minor,
        sections: &[
            (Verse, &[0, 3, 6, 2]),
            (Chorus, &[5, 6, 0, 0]),
            (Bridge, &[3, 4, 7]),
        ],
    },
];

/// The styles available for a genre. A genre without styles borrows Pop's.
pub fn styles_for(genre: Genre) -> &'static [ProgressionStyle] {
    let styles = match genre {
        Genre::Pop => POP_STYLES,
        Genre::Rock => ROCK_STYLES,
        Genre::Techno => TECHNO_STYLES,
        Genre::Trap => TRAP_STYLES,
        Genre::LoFi => LOFI_STYLES,
        Genre::Ballad => BALLAD_STYLES,
    };
    if styles.is_empty() {
        log::debug!("no progression styles for {genre:?}, using Pop");
        POP_STYLES
    } else {
        styles
    }
}

/// Resolve a free-text genre name. Unknown names resolve to Pop.
pub fn resolve_genre(name: &str) -> Genre {
    let key: String = name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    match key.as_str() {
        "pop" => Genre::Pop,
        "rock" | "metal" | "punk" => Genre::Rock,
        "techno" | "edm" | "house" | "trance" => Genre::Techno,
        "trap" | "hiphop" | "rap" => Genre::Trap,
        "lofi" | "chillhop" => Genre::LoFi,
        "ballad" => Genre::Ballad,
        _ => {
            log::debug!("unknown genre '{name}', using Pop");
            Genre::Pop
        }
    }
}

/// The loop a section uses in `style`: the section's own (Solo/Drop read
/// Chorus), else Chorus, else Verse. `None` when all three are missing.
pub fn resolve_section(style: &ProgressionStyle, section: SectionType) -> Option<&'static [usize]> {
    let wanted = section.progression_alias();
    if let Some(progression) = style.section_loop(wanted) {
        return Some(progression);
    }
    for fallback in [Chorus, Verse] {
        if let Some(progression) = style.section_loop(fallback) {
            log::debug!(
                "style '{}' has no {:?} loop, using {:?}",
                style.name,
                section,
                fallback
            );
            return Some(progression);
        }
    }
    None
}

/// The full loop for a section, with the default loop as last resort.
/// Every index is valid for the style's preferred scale.
pub fn progression_for(style: &ProgressionStyle, section: SectionType) -> Vec<usize> {
    let degree_count = style.preferred_scale.chord_degrees().len();
    resolve_section(style, section)
        .unwrap_or(DEFAULT_PROGRESSION)
        .iter()
        .map(|&degree| degree % degree_count)
        .collect()
}

/// Pick one of the genre's styles uniformly at random.
pub fn pick_style<R: RandomSource + ?Sized>(genre: Genre, rng: &mut R) -> &'static ProgressionStyle {
    let styles = styles_for(genre);
    let index = rng.choose_index(styles.len()).unwrap_or(0);
    &styles[index]
}

/// A chord-degree loop for `section` in a randomly chosen `genre` style.
pub fn chord_progression<R: RandomSource + ?Sized>(
    genre: Genre,
    section: SectionType,
    rng: &mut R,
) -> Vec<usize> {
    progression_for(pick_style(genre, rng), section)
}
