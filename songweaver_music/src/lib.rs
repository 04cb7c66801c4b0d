// Songweaver procedural composition engine.
//
// Generates chord progressions, melodies, rhythmic motifs, accompaniment and
// drum patterns that follow a song's section structure, genre and complexity
// setting. Every generator is a pure function of a read-only `SongState` plus
// an injected `RandomSource`; nothing is mutated in place and no global
// randomness exists, so a seed reproduces a song exactly.
//
// Architecture:
// - theory.rs: Scales, chord-degree tables, vocal ranges, interval ratings
// - harmony.rs: Note roles, single-note fitness and bar chord-tone coverage
// - song.rs: Section/genre enums, templates, structure expansion, `SongState`
// - progression.rs: Progression style library per genre, fallback resolution
// - rhythm.rs: Rhythmic motif pools and the 4-bar phrase state machine
// - melody.rs: Smooth voice-leading and Markov-like pitch selectors
// - drums.rs: Genre step tables plus the steady/fill drum state machine
// - accompaniment.rs: Chord pad, bass line and arpeggiator
// - compose.rs: Runs every generator over a range into an `Arrangement`
// - config.rs: JSON-loadable `ComposerConfig`
// - error.rs: `MusicError` for config loading and export
// - midi.rs: SMF output of an arrangement
//
// Randomness comes from the `songweaver_prng` crate.

pub mod accompaniment;
pub mod compose;
pub mod config;
pub mod drums;
pub mod error;
pub mod harmony;
pub mod melody;
pub mod midi;
pub mod progression;
pub mod rhythm;
pub mod song;
pub mod theory;
