// Static music-theory knowledge: scales, chord degrees, vocal ranges and
// interval ratings.
//
// Everything here is an immutable table keyed by a closed enum, so a lookup
// can only miss at the string boundary (`ScaleKind::from_name`,
// `VocalRange::from_name`), where it falls back to a documented default.
// Completeness of the tables is asserted by the tests at the bottom of the
// file rather than checked at runtime.
//
// Chord-degree intervals are offsets from the *scale* root, not the chord
// root: the first interval is the chord root's offset, and offsets may run
// past 11 for stacked tones (always reduce mod 12 before use).
//
// Used by harmony.rs for fitness scoring, progression.rs for style scales,
// melody.rs and accompaniment.rs for pitch pools.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Note names for pitch classes 0-11, spelled the way chord charts usually are.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
];

/// Highest MIDI pitch.
pub const MIDI_MAX: u8 = 127;

/// Pitch class (0-11) of a MIDI pitch.
pub fn pitch_class(midi: u8) -> u8 {
    midi % 12
}

/// Octave number in scientific pitch notation (MIDI 60 = C4).
pub fn octave(midi: u8) -> i8 {
    (midi / 12) as i8 - 1
}

/// Name of a pitch class, e.g. `note_name(10) == "Bb"`.
pub fn note_name(pc: u8) -> &'static str {
    NOTE_NAMES[(pc % 12) as usize]
}

/// Name with octave, e.g. `pitch_name(61) == "C#4"`.
pub fn pitch_name(midi: u8) -> String {
    format!("{}{}", note_name(pitch_class(midi)), octave(midi))
}

// ---------------------------------------------------------------------------
// Scales
// ---------------------------------------------------------------------------

/// The scales the engine knows. Each has an interval set and a chord table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScaleKind {
    Major,
    Minor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    HarmonicMinor,
    MajorPentatonic,
    MinorPentatonic,
    Blues,
}

impl ScaleKind {
    pub const ALL: [ScaleKind; 10] = [
        ScaleKind::Major,
        ScaleKind::Minor,
        ScaleKind::Dorian,
        ScaleKind::Phrygian,
        ScaleKind::Lydian,
        ScaleKind::Mixolydian,
        ScaleKind::HarmonicMinor,
        ScaleKind::MajorPentatonic,
        ScaleKind::MinorPentatonic,
        ScaleKind::Blues,
    ];

    /// Semitone offsets from the root, strictly increasing, starting at 0.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ScaleKind::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleKind::Minor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleKind::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleKind::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            ScaleKind::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            ScaleKind::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            ScaleKind::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            ScaleKind::MajorPentatonic => &[0, 2, 4, 7, 9],
            ScaleKind::MinorPentatonic => &[0, 3, 5, 7, 10],
            ScaleKind::Blues => &[0, 3, 5, 6, 7, 10],
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            ScaleKind::Major => "Major",
            ScaleKind::Minor => "Minor",
            ScaleKind::Dorian => "Dorian",
            ScaleKind::Phrygian => "Phrygian",
            ScaleKind::Lydian => "Lydian",
            ScaleKind::Mixolydian => "Mixolydian",
            ScaleKind::HarmonicMinor => "Harmonic Minor",
            ScaleKind::MajorPentatonic => "Major Pentatonic",
            ScaleKind::MinorPentatonic => "Minor Pentatonic",
            ScaleKind::Blues => "Blues",
        }
    }

    /// Resolve a free-text scale name. Case, spaces, `-` and `_` are ignored;
    /// modal aliases are accepted. Unknown names resolve to `Major`.
    pub fn from_name(name: &str) -> ScaleKind {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "major" | "ionian" => ScaleKind::Major,
            "minor" | "aeolian" | "naturalminor" => ScaleKind::Minor,
            "dorian" => ScaleKind::Dorian,
            "phrygian" => ScaleKind::Phrygian,
            "lydian" => ScaleKind::Lydian,
            "mixolydian" => ScaleKind::Mixolydian,
            "harmonicminor" => ScaleKind::HarmonicMinor,
            "majorpentatonic" | "pentatonic" => ScaleKind::MajorPentatonic,
            "minorpentatonic" => ScaleKind::MinorPentatonic,
            "blues" => ScaleKind::Blues,
            _ => {
                log::debug!("unknown scale '{name}', using Major");
                ScaleKind::Major
            }
        }
    }

    /// Membership table indexed by root-relative pitch class.
    pub fn pitch_classes(self) -> [bool; 12] {
        let mut pcs = [false; 12];
        for &interval in self.intervals() {
            pcs[interval as usize] = true;
        }
        pcs
    }

    /// The chord table used with this scale. Pentatonic and blues scales
    /// borrow the table of their parent heptatonic scale.
    pub fn chord_degrees(self) -> &'static [ChordDegree] {
        match self {
            ScaleKind::Major | ScaleKind::MajorPentatonic => MAJOR_CHORDS,
            ScaleKind::Minor | ScaleKind::MinorPentatonic | ScaleKind::Blues => MINOR_CHORDS,
            ScaleKind::Dorian => DORIAN_CHORDS,
            ScaleKind::Phrygian => PHRYGIAN_CHORDS,
            ScaleKind::Lydian => LYDIAN_CHORDS,
            ScaleKind::Mixolydian => MIXOLYDIAN_CHORDS,
            ScaleKind::HarmonicMinor => HARMONIC_MINOR_CHORDS,
        }
    }
}

/// Every MIDI pitch (0-127) that belongs to the scale built on `root`.
pub fn scale_notes(root: u8, scale: ScaleKind) -> BTreeSet<u8> {
    let pcs = scale.pitch_classes();
    (0..=MIDI_MAX)
        .filter(|&midi| pcs[((midi + 12 - root % 12) % 12) as usize])
        .collect()
}

// ---------------------------------------------------------------------------
// Chords
// ---------------------------------------------------------------------------

/// Chord quality; determines the suffix in chord names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Dominant7,
}

impl ChordQuality {
    pub fn suffix(self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "°",
            ChordQuality::Augmented => "+",
            ChordQuality::Dominant7 => "7",
        }
    }
}

/// The role a chord plays in tension and release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmonicFunction {
    Tonic,
    Subdominant,
    Dominant,
}

/// One chord of a scale's chord table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordDegree {
    /// Roman numeral for display ("IV", "vii°").
    pub name: &'static str,
    pub quality: ChordQuality,
    /// Offsets from the scale root; `intervals[0]` is the chord root.
    pub intervals: &'static [u8],
    pub function: HarmonicFunction,
    /// Free-text mood tag shown to the user.
    pub vibe: &'static str,
}

impl ChordDegree {
    /// Offset of the chord root from the scale root (0-11).
    pub fn root_offset(&self) -> u8 {
        self.intervals.first().copied().unwrap_or(0) % 12
    }

    /// Absolute pitch class of the chord root for a given scale root.
    pub fn root_pitch_class(&self, scale_root: u8) -> u8 {
        (scale_root % 12 + self.root_offset()) % 12
    }

    /// Absolute pitch classes of the chord tones.
    pub fn pitch_classes(&self, scale_root: u8) -> [bool; 12] {
        let mut pcs = [false; 12];
        for &iv in self.intervals {
            pcs[((scale_root % 12 + iv) % 12) as usize] = true;
        }
        pcs
    }

    /// Whether a MIDI pitch is one of this chord's tones.
    pub fn contains(&self, midi: u8, scale_root: u8) -> bool {
        self.pitch_classes(scale_root)[pitch_class(midi) as usize]
    }
}

const fn chord(
    name: &'static str,
    quality: ChordQuality,
    intervals: &'static [u8],
    function: HarmonicFunction,
    vibe: &'static str,
) -> ChordDegree {
    ChordDegree {
        name,
        quality,
        intervals,
        function,
        vibe,
    }
}

use ChordQuality::{Augmented, Diminished, Dominant7, Major as Maj, Minor as Min};
use HarmonicFunction::{Dominant, Subdominant, Tonic};

pub const MAJOR_CHORDS: &[ChordDegree] = &[
    chord("I", Maj, &[0, 4, 7], Tonic, "home"),
    chord("ii", Min, &[2, 5, 9], Subdominant, "wistful"),
    chord("iii", Min, &[4, 7, 11], Tonic, "tender"),
    chord("IV", Maj, &[5, 9, 12], Subdominant, "hopeful"),
    chord("V", Maj, &[7, 11, 14], Dominant, "driving"),
    chord("vi", Min, &[9, 12, 16], Tonic, "bittersweet"),
    chord("vii°", Diminished, &[11, 14, 17], Dominant, "uneasy"),
    chord("V7", Dominant7, &[7, 11, 14, 17], Dominant, "yearning"),
];

pub const MINOR_CHORDS: &[ChordDegree] = &[
    chord("i", Min, &[0, 3, 7], Tonic, "brooding"),
    chord("ii°", Diminished, &[2, 5, 8], Subdominant, "uneasy"),
    chord("III", Maj, &[3, 7, 10], Tonic, "heroic"),
    chord("iv", Min, &[5, 8, 12], Subdominant, "mournful"),
    chord("v", Min, &[7, 10, 14], Dominant, "restless"),
    chord("VI", Maj, &[8, 12, 15], Subdominant, "epic"),
    chord("VII", Maj, &[10, 14, 17], Dominant, "defiant"),
    chord("V7", Dominant7, &[7, 11, 14, 17], Dominant, "tense"),
];

pub const DORIAN_CHORDS: &[ChordDegree] = &[
    chord("i", Min, &[0, 3, 7], Tonic, "cool"),
    chord("ii", Min, &[2, 5, 9], Subdominant, "drifting"),
    chord("III", Maj, &[3, 7, 10], Tonic, "warm"),
    chord("IV", Maj, &[5, 9, 12], Subdominant, "soulful"),
    chord("v", Min, &[7, 10, 14], Dominant, "smoky"),
    chord("vi°", Diminished, &[9, 12, 15], Dominant, "uneasy"),
    chord("VII", Maj, &[10, 14, 17], Dominant, "lifting"),
];

pub const PHRYGIAN_CHORDS: &[ChordDegree] = &[
    chord("i", Min, &[0, 3, 7], Tonic, "dark"),
    chord("II", Maj, &[1, 5, 8], Dominant, "exotic"),
    chord("III", Maj, &[3, 7, 10], Tonic, "ominous"),
    chord("iv", Min, &[5, 8, 12], Subdominant, "grim"),
    chord("v°", Diminished, &[7, 10, 13], Dominant, "menacing"),
    chord("VI", Maj, &[8, 12, 15], Subdominant, "cinematic"),
    chord("vii", Min, &[10, 13, 17], Dominant, "cold"),
];

pub const LYDIAN_CHORDS: &[ChordDegree] = &[
    chord("I", Maj, &[0, 4, 7], Tonic, "dreamy"),
    chord("II", Maj, &[2, 6, 9], Subdominant, "floating"),
    chord("iii", Min, &[4, 7, 11], Tonic, "gentle"),
    chord("#iv°", Diminished, &[6, 9, 12], Dominant, "strange"),
    chord("V", Maj, &[7, 11, 14], Dominant, "bright"),
    chord("vi", Min, &[9, 12, 16], Tonic, "nostalgic"),
    chord("vii", Min, &[11, 14, 18], Dominant, "shimmering"),
];

pub const MIXOLYDIAN_CHORDS: &[ChordDegree] = &[
    chord("I", Maj, &[0, 4, 7], Tonic, "swagger"),
    chord("ii", Min, &[2, 5, 9], Subdominant, "loose"),
    chord("iii°", Diminished, &[4, 7, 10], Dominant, "uneasy"),
    chord("IV", Maj, &[5, 9, 12], Subdominant, "anthemic"),
    chord("v", Min, &[7, 10, 14], Dominant, "laid-back"),
    chord("vi", Min, &[9, 12, 16], Tonic, "reflective"),
    chord("bVII", Maj, &[10, 14, 17], Subdominant, "rebellious"),
];

pub const HARMONIC_MINOR_CHORDS: &[ChordDegree] = &[
    chord("i", Min, &[0, 3, 7], Tonic, "haunting"),
    chord("ii°", Diminished, &[2, 5, 8], Subdominant, "tense"),
    chord("III+", Augmented, &[3, 7, 11], Tonic, "mysterious"),
    chord("iv", Min, &[5, 8, 12], Subdominant, "mournful"),
    chord("V", Maj, &[7, 11, 14], Dominant, "dramatic"),
    chord("VI", Maj, &[8, 12, 15], Subdominant, "epic"),
    chord("vii°", Diminished, &[11, 14, 17], Dominant, "sinister"),
    chord("V7", Dominant7, &[7, 11, 14, 17], Dominant, "urgent"),
];

/// Root pitch class of chord `degree_index` in `scale` on `scale_root`.
/// Returns 0 when the index is outside the chord table.
pub fn chord_root_pitch_class(scale_root: u8, scale: ScaleKind, degree_index: usize) -> u8 {
    scale
        .chord_degrees()
        .get(degree_index)
        .map(|degree| degree.root_pitch_class(scale_root))
        .unwrap_or(0)
}

/// Concrete chord name for a degree in a key, e.g. vi in C major -> "Am".
pub fn real_chord_name(degree: &ChordDegree, scale_root: u8) -> String {
    format!(
        "{}{}",
        note_name(degree.root_pitch_class(scale_root)),
        degree.quality.suffix()
    )
}

// ---------------------------------------------------------------------------
// Key: a scale on a concrete root
// ---------------------------------------------------------------------------

/// A scale bound to a root pitch class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub root: u8,
    pub scale: ScaleKind,
}

impl Key {
    pub fn new(root: u8, scale: ScaleKind) -> Self {
        Key {
            root: root % 12,
            scale,
        }
    }

    /// Check if a MIDI pitch is in this key.
    pub fn contains(&self, pitch: u8) -> bool {
        let pc = (pitch % 12 + 12 - self.root) % 12;
        self.scale.pitch_classes()[pc as usize]
    }

    /// Chord `index` of this key's chord table, if it exists.
    pub fn chord(&self, index: usize) -> Option<&'static ChordDegree> {
        self.scale.chord_degrees().get(index)
    }
}

// ---------------------------------------------------------------------------
// Vocal ranges
// ---------------------------------------------------------------------------

/// Named pitch ranges used to clip melodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VocalRange {
    Bass,
    Baritone,
    #[default]
    Tenor,
    Alto,
    MezzoSoprano,
    Soprano,
    /// Wide instrumental lead range.
    Lead,
}

impl VocalRange {
    pub const ALL: [VocalRange; 7] = [
        VocalRange::Bass,
        VocalRange::Baritone,
        VocalRange::Tenor,
        VocalRange::Alto,
        VocalRange::MezzoSoprano,
        VocalRange::Soprano,
        VocalRange::Lead,
    ];

    /// Inclusive MIDI bounds `(min, max)`.
    pub fn bounds(self) -> (u8, u8) {
        match self {
            VocalRange::Bass => (40, 64),         // E2–E4
            VocalRange::Baritone => (45, 69),     // A2–A4
            VocalRange::Tenor => (48, 72),        // C3–C5
            VocalRange::Alto => (53, 77),         // F3–F5
            VocalRange::MezzoSoprano => (57, 81), // A3–A5
            VocalRange::Soprano => (60, 84),      // C4–C6
            VocalRange::Lead => (48, 88),         // C3–E6
        }
    }

    pub fn from_name(name: &str) -> VocalRange {
        match name.to_lowercase().replace([' ', '_', '-'], "").as_str() {
            "bass" => VocalRange::Bass,
            "baritone" => VocalRange::Baritone,
            "tenor" => VocalRange::Tenor,
            "alto" => VocalRange::Alto,
            "mezzo" | "mezzosoprano" => VocalRange::MezzoSoprano,
            "soprano" => VocalRange::Soprano,
            "lead" | "instrument" => VocalRange::Lead,
            _ => {
                log::debug!("unknown vocal range '{name}', using Tenor");
                VocalRange::Tenor
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Interval quality
// ---------------------------------------------------------------------------

/// How an interval class sounds, on a 0-100 consonance scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalQuality {
    pub name: &'static str,
    pub score: u8,
    pub mood: &'static str,
}

const fn iq(name: &'static str, score: u8, mood: &'static str) -> IntervalQuality {
    IntervalQuality { name, score, mood }
}

/// Indexed by semitone distance mod 12.
pub static INTERVAL_QUALITY: [IntervalQuality; 12] = [
    iq("unison", 90, "stable"),
    iq("minor 2nd", 10, "tense"),
    iq("major 2nd", 60, "flowing"),
    iq("minor 3rd", 80, "melancholic"),
    iq("major 3rd", 85, "bright"),
    iq("perfect 4th", 75, "open"),
    iq("tritone", 5, "unstable"),
    iq("perfect 5th", 95, "powerful"),
    iq("minor 6th", 65, "bittersweet"),
    iq("major 6th", 70, "warm"),
    iq("minor 7th", 40, "bluesy"),
    iq("major 7th", 20, "yearning"),
];

/// Quality of the interval between two pitches (direction and octave ignored).
pub fn interval_quality(a: u8, b: u8) -> &'static IntervalQuality {
    let semis = (a as i16 - b as i16).unsigned_abs() % 12;
    &INTERVAL_QUALITY[semis as usize]
}
