// Songweaver: CLI entry point.
//
// Builds a song from a config (file and/or flags), composes every part and
// writes the result to MIDI. The pipeline: config -> song state (template
// expansion + chord assignment) -> composition -> harmony check -> MIDI.
//
// Usage:
//   cargo run -p songweaver_music --bin generate -- [output.mid] [--genre G]
//     [--complexity low|medium|high] [--strategy smooth|markov] [--root N]
//     [--seed N] [--config path.json]
//
// Genres: pop, rock, techno, trap, lofi, ballad
// Set RUST_LOG=debug to see fallback decisions.

use songweaver_music::compose::{ComposeOptions, Part, compose};
use songweaver_music::config::ComposerConfig;
use songweaver_music::harmony::bar_harmony_report;
use songweaver_music::melody::MelodyStrategy;
use songweaver_music::midi::write_midi;
use songweaver_music::progression::resolve_genre;
use songweaver_music::song::{Complexity, GenerationRange, SongState};
use songweaver_music::theory::{note_name, real_chord_name};
use songweaver_prng::{SongRng, entropy_seed};
use std::path::Path;

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    let output_path = args
        .get(1)
        .filter(|s| !s.starts_with("--"))
        .map(|s| s.as_str())
        .unwrap_or("output.mid");

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let seed = config.seed.unwrap_or_else(entropy_seed);

    println!("=== Songweaver ===");
    println!("Output: {output_path}");
    println!("Genre: {}", config.genre.name());
    println!("Complexity: {:?}", config.complexity);
    println!("Melody: {}", config.melody_strategy.name());
    println!("Seed: {seed}");
    println!();

    let mut rng = SongRng::new(seed);

    println!("[1/4] Building song...");
    let template = config.song_template();
    let (state, style) = config.build_song(&mut rng);
    println!(
        "  Style: {} in {} {}",
        style.name,
        note_name(state.root_pitch_class),
        state.scale.name()
    );
    println!(
        "  {} bars at {} BPM, {} steps per bar",
        state.total_bars(),
        template.bpm,
        state.steps_per_bar
    );
    print_sections(&state);

    println!("[2/4] Composing...");
    let options = ComposeOptions {
        complexity: config.complexity,
        strategy: config.melody_strategy,
    };
    let arrangement = compose(
        &state,
        config.genre,
        GenerationRange::whole_song(&state),
        options,
        &mut rng,
    );
    for part in Part::ALL {
        println!("  {:<9} {} notes", part.name(), arrangement.part(part).len());
    }

    println!("[3/4] Checking harmony...");
    let report = bar_harmony_report(&state, &arrangement.melody);
    let sounding: Vec<u8> = report
        .iter()
        .filter(|bar| bar.total > 0)
        .map(|bar| bar.score)
        .collect();
    if sounding.is_empty() {
        println!("  No melody bars to score.");
    } else {
        let mean = sounding.iter().map(|&s| f64::from(s)).sum::<f64>() / sounding.len() as f64;
        let weakest = sounding.iter().copied().min().unwrap_or(0);
        println!(
            "  Melody chord-tone coverage: mean {mean:.0}%, weakest bar {weakest}% ({} bars)",
            sounding.len()
        );
    }

    println!("[4/4] Writing MIDI to {output_path}...");
    match write_midi(&arrangement, template.bpm, Path::new(output_path)) {
        Ok(()) => {
            let seconds = state.total_bars() as f64 * 4.0 * 60.0 / f64::from(template.bpm.max(1));
            println!(
                "  Done! {} notes, duration {seconds:.0}s",
                arrangement.note_count()
            );
        }
        Err(e) => {
            eprintln!("  Error writing MIDI: {e}");
            std::process::exit(1);
        }
    }

    println!();
    println!("Play with: timidity {output_path} (or any MIDI player)");
}

/// Config file first (if given), then flag overrides, then validation.
fn load_config(args: &[String]) -> songweaver_music::error::MusicResult<ComposerConfig> {
    let mut config = match parse_flag::<String>(args, "--config") {
        Some(path) => ComposerConfig::load(Path::new(&path))?,
        None => ComposerConfig::default(),
    };
    if let Some(genre) = parse_flag::<String>(args, "--genre") {
        config.genre = resolve_genre(&genre);
        config.style_index = None;
    }
    if let Some(complexity) = parse_flag::<String>(args, "--complexity") {
        config.complexity = Complexity::from_name(&complexity);
    }
    if let Some(strategy) = parse_flag::<String>(args, "--strategy") {
        config.melody_strategy = MelodyStrategy::from_name(&strategy);
    }
    if let Some(root) = parse_flag(args, "--root") {
        config.root_pitch_class = root;
    }
    if let Some(seed) = parse_flag(args, "--seed") {
        config.seed = Some(seed);
    }
    config.validate()?;
    Ok(config)
}

/// One line per contiguous section run with its chord loop.
fn print_sections(state: &SongState) {
    let mut bar = 0;
    while bar < state.total_bars() {
        let section = state.section_at(bar);
        let start = bar;
        while bar < state.total_bars() && state.section_at(bar) == section {
            bar += 1;
        }
        let mut chords: Vec<String> = Vec::new();
        for b in start..bar {
            if let Some(degree) = state.chord_at(b) {
                let name = real_chord_name(degree, state.root_pitch_class);
                if chords.last() != Some(&name) {
                    chords.push(name);
                }
            }
            if chords.len() >= 8 {
                break;
            }
        }
        println!(
            "  bars {:>3}-{:<3} {:<10} {}",
            start + 1,
            bar,
            section.label(),
            chords.join(" ")
        );
    }
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
