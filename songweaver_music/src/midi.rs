// MIDI output from arrangements.
//
// Converts an `Arrangement` into a Standard MIDI File (SMF) for playback in
// any sequencer. Output is SMF Format 1: a tempo track followed by one track
// per part. Drums go on channel 10 (index 9) so General MIDI players map
// their keys to the percussion kit; every other part gets its own channel and
// a program change.
//
// Steps map to ticks through the arrangement's steps-per-bar, assuming 4/4.
//
// Uses the `midly` crate for MIDI writing.

use crate::compose::{Arrangement, Part};
use crate::error::MusicResult;
use crate::song::GeneratedNote;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Ticks in a 4/4 bar.
const TICKS_PER_BAR: u32 = TICKS_PER_QUARTER as u32 * 4;

/// General MIDI percussion channel (channel 10, zero-based).
const DRUM_CHANNEL: u8 = 9;

/// Channel and GM program for a part. Drums take no program change.
fn part_voice(part: Part) -> (u8, Option<u8>) {
    match part {
        Part::Melody => (0, Some(80)),   // square lead
        Part::Chords => (1, Some(89)),   // warm pad
        Part::Bass => (2, Some(33)),     // fingered bass
        Part::Arpeggio => (3, Some(81)), // saw lead
        Part::Drums => (DRUM_CHANNEL, None),
    }
}

/// Convert an arrangement to MIDI and write it to a file.
pub fn write_midi(arrangement: &Arrangement, bpm: u16, path: &Path) -> MusicResult<()> {
    let bytes = midi_bytes(arrangement, bpm)?;
    std::fs::write(path, &bytes)?;
    Ok(())
}

/// Encode an arrangement as SMF bytes.
pub fn midi_bytes(arrangement: &Arrangement, bpm: u16) -> MusicResult<Vec<u8>> {
    let smf = arrangement_to_smf(arrangement, bpm);
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

fn to_velocity(velocity: f32) -> u7 {
    u7::new((velocity.clamp(0.0, 1.0) * 127.0).round().max(1.0) as u8)
}

/// Absolute tick of a step. Scaling the whole position keeps grids that do
/// not divide a bar's ticks from drifting.
fn step_to_tick(step: usize, steps_per_bar: usize) -> u32 {
    let ticks = step as u64 * u64::from(TICKS_PER_BAR) / steps_per_bar.max(1) as u64;
    ticks.min(u64::from(u32::MAX)) as u32
}

/// Convert an arrangement to an in-memory SMF.
fn arrangement_to_smf(arrangement: &Arrangement, bpm: u16) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    // Track 0: tempo track
    let mut tempo_track: Track<'static> = Vec::new();
    let tempo_microseconds = 60_000_000 / u32::from(bpm.max(1));
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
    });
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(tempo_track);

    for part in Part::ALL {
        smf.tracks.push(part_track(
            part,
            arrangement.part(part),
            arrangement.steps_per_bar,
        ));
    }
    smf
}

/// One part's track: name, program, then note events in time order.
fn part_track(part: Part, notes: &[GeneratedNote], steps_per_bar: usize) -> Track<'static> {
    let (channel, program) = part_voice(part);
    let channel = u4::new(channel);
    let mut track: Track<'static> = Vec::new();

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(part.name().as_bytes())),
    });
    if let Some(program) = program {
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(program),
                },
            },
        });
    }

    // (tick, is_on, key, velocity); offs sort before ons at the same tick so
    // repeated pitches retrigger cleanly.
    let mut events: Vec<(u32, bool, u8, u7)> = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        let on = step_to_tick(note.start_step, steps_per_bar);
        let off = step_to_tick(note.end_step(), steps_per_bar);
        let key = note.midi.min(127);
        events.push((on, true, key, to_velocity(note.velocity)));
        events.push((off.max(on + 1), false, key, u7::new(0)));
    }
    events.sort_by_key(|&(tick, is_on, key, _)| (tick, is_on, key));

    let mut last_tick = 0;
    for (tick, is_on, key, vel) in events {
        let message = if is_on {
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel,
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel,
            }
        };
        track.push(TrackEvent {
            delta: u28::new(tick - last_tick),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::STEPS_PER_BAR;

    fn note(midi: u8, start_step: usize, duration_steps: usize) -> GeneratedNote {
        GeneratedNote {
            midi,
            start_step,
            duration_steps,
            velocity: 0.8,
        }
    }

    fn arrangement() -> Arrangement {
        Arrangement {
            steps_per_bar: STEPS_PER_BAR,
            melody: vec![note(60, 0, 4), note(60, 4, 4), note(64, 8, 8)],
            chords: vec![note(48, 0, 16), note(52, 0, 16), note(55, 0, 16)],
            bass: vec![note(36, 0, 16)],
            arpeggio: Vec::new(),
            drums: vec![note(36, 0, 1), note(38, 4, 1)],
        }
    }

    fn midi_events(track: &Track) -> Vec<(u32, u4, MidiMessage)> {
        let mut tick = 0;
        let mut out = Vec::new();
        for ev in track {
            tick += ev.delta.as_int();
            if let TrackEventKind::Midi { channel, message } = ev.kind {
                out.push((tick, channel, message));
            }
        }
        out
    }

    #[test]
    fn tempo_track_plus_one_track_per_part() {
        let smf = arrangement_to_smf(&arrangement(), 120);
        assert_eq!(smf.tracks.len(), 1 + Part::ALL.len());
        match smf.tracks[0][0].kind {
            TrackEventKind::Meta(MetaMessage::Tempo(t)) => assert_eq!(t.as_int(), 500_000),
            ref other => panic!("expected tempo, got {other:?}"),
        }
    }

    #[test]
    fn drums_use_percussion_channel_without_program() {
        let smf = arrangement_to_smf(&arrangement(), 100);
        let drums = &smf.tracks[1 + 4];
        let events = midi_events(drums);
        assert!(!events.is_empty());
        for (_, channel, message) in events {
            assert_eq!(channel.as_int(), DRUM_CHANNEL);
            assert!(!matches!(message, MidiMessage::ProgramChange { .. }));
        }
    }

    #[test]
    fn repeated_pitch_releases_before_retrigger() {
        let smf = arrangement_to_smf(&arrangement(), 100);
        let melody = midi_events(&smf.tracks[1]);
        let at_step_4: Vec<&MidiMessage> = melody
            .iter()
            .filter(|(tick, _, _)| *tick == 4 * 120)
            .map(|(_, _, m)| m)
            .collect();
        assert!(matches!(at_step_4[0], MidiMessage::NoteOff { .. }));
        assert!(matches!(at_step_4[1], MidiMessage::NoteOn { .. }));
        // The last event releases E4 at the end of the bar.
        let (tick, _, last) = melody.last().copied().unwrap();
        assert_eq!(tick, TICKS_PER_BAR);
        assert!(matches!(last, MidiMessage::NoteOff { .. }));
    }

    #[test]
    fn uneven_grid_keeps_bar_lines_exact() {
        assert_eq!(step_to_tick(7, 7), TICKS_PER_BAR);
        assert_eq!(step_to_tick(70, 7), 10 * TICKS_PER_BAR);
        assert_eq!(step_to_tick(3, 7), 822);
        let mut a = arrangement();
        a.steps_per_bar = 7;
        a.melody = vec![note(60, 0, 7), note(62, 7, 7)];
        let smf = arrangement_to_smf(&a, 100);
        let ons: Vec<u32> = midi_events(&smf.tracks[1])
            .into_iter()
            .filter(|(_, _, m)| matches!(m, MidiMessage::NoteOn { .. }))
            .map(|(tick, _, _)| tick)
            .collect();
        assert_eq!(ons, vec![0, TICKS_PER_BAR]);
    }

    #[test]
    fn bytes_start_with_smf_header() {
        let bytes = midi_bytes(&arrangement(), 90).unwrap();
        assert_eq!(&bytes[..4], b"MThd");
        let parsed = Smf::parse(&bytes).unwrap();
        assert_eq!(parsed.tracks.len(), 6);
    }
}
