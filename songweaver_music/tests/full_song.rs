// End-to-end tests for the composition pipeline.
//
// Each test drives the public API the way the `generate` binary does: build a
// song state from a template and progression style, compose with a fixed
// seed, and check the result. The scenarios cover the phrase cadence, the
// drum fill at a Chorus exit, the smooth selector's empty-chord fallback,
// chord assignment across every style, and a full write to MIDI for each
// genre.

use songweaver_music::compose::{ComposeOptions, Part, compose};
use songweaver_music::config::ComposerConfig;
use songweaver_music::drums::{DrumPiece, generate_drums};
use songweaver_music::melody::{
    MelodyStrategy, PitchContext, PitchSelector, SmoothVoiceLeading, generate_melody,
};
use songweaver_music::midi::{midi_bytes, write_midi};
use songweaver_music::progression::{resolve_section, styles_for};
use songweaver_music::song::{
    Complexity, GenerationRange, Genre, SectionSpec, SectionType, SongState, SongTemplate,
    assign_chords_to_structure, expand_structure,
};
use songweaver_music::theory::{ScaleKind, VocalRange, scale_notes};
use songweaver_prng::SongRng;

/// A song made of the given runs, Pop style 0, C major, tenor range.
fn song(sections: &[(SectionType, u32)]) -> SongState {
    let template = SongTemplate {
        genre: Genre::Pop,
        bpm: 110,
        sections: sections
            .iter()
            .map(|&(section, bars)| SectionSpec::new(section, bars))
            .collect(),
    };
    SongState::from_template(
        &template,
        0,
        ScaleKind::Major,
        &styles_for(Genre::Pop)[0],
        VocalRange::Tenor,
    )
}

fn melody_in_bar(state: &SongState, range: GenerationRange, bar: usize, seed: u64) -> Vec<(usize, usize)> {
    generate_melody(
        state,
        range,
        Complexity::Low,
        &MelodyStrategy::Smooth,
        &mut SongRng::new(seed),
    )
    .into_iter()
    .filter(|n| n.start_step / state.steps_per_bar == bar)
    .map(|n| (n.start_step % state.steps_per_bar, n.duration_steps))
    .collect()
}

#[test]
fn major_scale_membership() {
    let notes = scale_notes(0, ScaleKind::Major);
    for midi in [0, 2, 4, 5, 7, 9, 11, 12, 14] {
        assert!(notes.contains(&midi), "{midi}");
    }
    for midi in [1, 3, 6, 8, 10, 13] {
        assert!(!notes.contains(&midi), "{midi}");
    }
}

#[test]
fn four_bar_chorus_ends_on_whole_bar_note() {
    let state = song(&[(SectionType::Chorus, 8)]);
    for seed in 0..10 {
        let bar3 = melody_in_bar(&state, GenerationRange::new(0, 4), 3, seed);
        assert_eq!(bar3, vec![(0, 16)], "seed {seed}");
    }
}

#[test]
fn mid_request_cadence_is_long_note_then_rest() {
    let state = song(&[(SectionType::Chorus, 8)]);
    for seed in 0..10 {
        let bar3 = melody_in_bar(&state, GenerationRange::new(0, 8), 3, seed);
        assert_eq!(bar3, vec![(0, 12)], "seed {seed}");
    }
}

#[test]
fn chorus_exit_plays_descending_toms() {
    let state = song(&[(SectionType::Chorus, 1), (SectionType::Verse, 1)]);
    let drums = generate_drums(&state, Genre::Pop, GenerationRange::new(0, 1));
    let at = |piece: DrumPiece| -> Vec<usize> {
        drums
            .iter()
            .filter(|n| n.midi == piece.midi_note())
            .map(|n| n.start_step)
            .collect()
    };
    assert_eq!(at(DrumPiece::HiTom), vec![12, 13]);
    assert_eq!(at(DrumPiece::MidTom), vec![14]);
    assert_eq!(at(DrumPiece::LoTom), vec![15]);
    let hats_in_tail = drums.iter().any(|n| {
        n.start_step >= 8
            && (n.midi == DrumPiece::ClosedHat.midi_note() || n.midi == DrumPiece::OpenHat.midi_note())
    });
    assert!(!hats_in_tail);
    // The steady half still carries the Chorus groove.
    assert!(at(DrumPiece::Crash).contains(&0));
}

#[test]
fn smooth_phrase_start_without_chord_tones_uses_scale_middle() {
    let scale = scale_notes(0, ScaleKind::Major);
    let chord = &ScaleKind::Major.chord_degrees()[0];
    // Only F4 is in range, and F is not in the C major triad.
    let ctx = PitchContext {
        previous: Some(70),
        chord,
        scale_root: 0,
        scale_notes: &scale,
        range: (65, 66),
        is_strong_beat: true,
        is_phrase_start: true,
        section: SectionType::Verse,
    };
    assert_eq!(ctx.chord_tones(), Vec::<u8>::new());
    assert_eq!(SmoothVoiceLeading.select(&ctx, &mut SongRng::new(0)), Some(65));
}

#[test]
fn chord_assignment_is_valid_for_every_style() {
    for genre in Genre::ALL {
        let template = SongTemplate::standard(genre);
        let bars = expand_structure(&template);
        assert_eq!(bars, expand_structure(&template));
        for style in styles_for(genre) {
            let chords = assign_chords_to_structure(&bars, style);
            assert_eq!(chords.len(), template.total_bars());
            let table = style.preferred_scale.chord_degrees();
            for (bar, &degree) in chords.iter().enumerate() {
                assert!(degree < table.len(), "{}: bar {bar} -> {degree}", style.name);
                if let Some(list) = resolve_section(style, bars[bar]) {
                    assert!(list.contains(&degree));
                }
            }
        }
    }
}

#[test]
fn every_genre_composes_and_exports() {
    for genre in Genre::ALL {
        let config = ComposerConfig {
            genre,
            seed: Some(2024),
            melody_strategy: MelodyStrategy::Markov,
            complexity: Complexity::High,
            ..Default::default()
        };
        let mut rng = SongRng::new(2024);
        let (state, _) = config.build_song(&mut rng);
        let arrangement = compose(
            &state,
            genre,
            GenerationRange::whole_song(&state),
            ComposeOptions {
                complexity: config.complexity,
                strategy: config.melody_strategy,
            },
            &mut rng,
        );
        for part in Part::ALL {
            assert!(!arrangement.part(part).is_empty(), "{genre:?} {}", part.name());
        }
        let bytes = midi_bytes(&arrangement, genre.default_bpm()).unwrap();
        let smf = midly::Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 1 + Part::ALL.len());
    }
}

#[test]
fn same_seed_same_file() {
    let path = std::env::temp_dir().join(format!("songweaver-test-{}.mid", std::process::id()));
    let render = |seed: u64| -> Vec<u8> {
        let config = ComposerConfig {
            seed: Some(seed),
            ..Default::default()
        };
        let mut rng = SongRng::new(seed);
        let (state, _) = config.build_song(&mut rng);
        let arrangement = compose(
            &state,
            config.genre,
            GenerationRange::whole_song(&state),
            ComposeOptions::default(),
            &mut rng,
        );
        write_midi(&arrangement, 110, &path).unwrap();
        std::fs::read(&path).unwrap()
    };
    let first = render(99);
    assert_eq!(first, render(99));
    let _ = std::fs::remove_file(&path);
}
