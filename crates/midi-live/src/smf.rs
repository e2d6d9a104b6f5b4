//! Standard MIDI File replay.
//!
//! Flattens every track of a file into one time-ordered list of
//! [`TimestampedMidiMessage`]s so a recording can be pushed through the same
//! pump as live input.

use midly::{MetaMessage, MidiMessage as SmfMessage, Smf, Timing, TrackEventKind};
use tracing::debug;

use crate::midi::{encode_midi_message, parse_midi_bytes, MidiMessage, TimestampedMidiMessage};
use crate::{Error, Result};

/// Default tempo before any Set Tempo meta event: 120 BPM.
pub const DEFAULT_MICROSECONDS_PER_BEAT: u32 = 500_000;

enum Timed {
    Tempo(u32),
    Channel([u8; 3]),
}

/// Parse an SMF and return its note and controller events in time order.
///
/// Tracks are merged by absolute tick (format 2 files are treated as
/// parallel). Metrical ticks are converted through the tempo map;
/// timecode files use a fixed frames × subframes tick rate.
pub fn messages_from_smf(bytes: &[u8]) -> Result<Vec<TimestampedMidiMessage>> {
    let smf = Smf::parse(bytes).map_err(|e| Error::Smf(e.to_string()))?;

    let mut timeline: Vec<(u64, Timed)> = Vec::new();
    for track in &smf.tracks {
        let mut tick: u64 = 0;
        for event in track {
            tick += event.delta.as_int() as u64;
            match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                    timeline.push((tick, Timed::Tempo(tempo.as_int())));
                }
                TrackEventKind::Midi { channel, message } => {
                    let channel = channel.as_int();
                    let message = match message {
                        SmfMessage::NoteOn { key, vel } => MidiMessage::NoteOn {
                            channel,
                            pitch: key.as_int(),
                            velocity: vel.as_int(),
                        },
                        SmfMessage::NoteOff { key, .. } => MidiMessage::NoteOff {
                            channel,
                            pitch: key.as_int(),
                        },
                        SmfMessage::Controller { controller, value } => {
                            MidiMessage::ControlChange {
                                channel,
                                controller: controller.as_int(),
                                value: value.as_int(),
                            }
                        }
                        _ => continue,
                    };
                    timeline.push((tick, Timed::Channel(encode_midi_message(&message))));
                }
                _ => {}
            }
        }
    }

    // Stable: simultaneous events keep track order.
    timeline.sort_by_key(|(tick, _)| *tick);

    let mut micros_per_tick = match smf.header.timing {
        Timing::Metrical(ppq) => DEFAULT_MICROSECONDS_PER_BEAT as f64 / ppq.as_int().max(1) as f64,
        Timing::Timecode(fps, subframes) => {
            1_000_000.0 / (fps.as_f32() as f64 * subframes.max(1) as f64)
        }
    };

    let mut messages = Vec::with_capacity(timeline.len());
    let mut last_tick = 0u64;
    let mut elapsed_us = 0.0f64;

    for (tick, timed) in timeline {
        elapsed_us += (tick - last_tick) as f64 * micros_per_tick;
        last_tick = tick;

        match timed {
            Timed::Tempo(us_per_beat) => {
                if let Timing::Metrical(ppq) = smf.header.timing {
                    micros_per_tick = us_per_beat as f64 / ppq.as_int().max(1) as f64;
                }
            }
            Timed::Channel(raw) => {
                if let Some(message) = parse_midi_bytes(&raw) {
                    messages.push(TimestampedMidiMessage {
                        timestamp_us: elapsed_us.round() as u64,
                        message,
                    });
                }
            }
        }
    }

    debug!(
        tracks = smf.tracks.len(),
        messages = messages.len(),
        "flattened MIDI file"
    );
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smf_bytes(tracks: &[Vec<u8>], ppq: u16) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"MThd");
        buf.extend_from_slice(&6u32.to_be_bytes());
        buf.extend_from_slice(&1u16.to_be_bytes()); // format 1
        buf.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
        buf.extend_from_slice(&ppq.to_be_bytes());
        for track in tracks {
            buf.extend_from_slice(b"MTrk");
            buf.extend_from_slice(&(track.len() as u32).to_be_bytes());
            buf.extend_from_slice(track);
        }
        buf
    }

    fn tempo_track(us_per_beat: u32) -> Vec<u8> {
        let t = us_per_beat.to_be_bytes();
        let mut track = vec![0x00, 0xFF, 0x51, 0x03, t[1], t[2], t[3]];
        track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        track
    }

    fn arpeggio_track() -> Vec<u8> {
        let mut track = Vec::new();
        // C4, E4, G4, each 480 ticks
        track.extend_from_slice(&[0x00, 0x90, 60, 100]);
        track.extend_from_slice(&[0x83, 0x60, 0x80, 60, 0]);
        track.extend_from_slice(&[0x00, 0x90, 64, 100]);
        track.extend_from_slice(&[0x83, 0x60, 0x80, 64, 0]);
        track.extend_from_slice(&[0x00, 0x90, 67, 100]);
        track.extend_from_slice(&[0x83, 0x60, 0x80, 67, 0]);
        track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        track
    }

    #[test]
    fn arpeggio_at_120_bpm() {
        let bytes = smf_bytes(&[tempo_track(500_000), arpeggio_track()], 480);
        let messages = messages_from_smf(&bytes).unwrap();

        assert_eq!(messages.len(), 6);
        let times: Vec<u64> = messages.iter().map(|m| m.timestamp_us).collect();
        assert_eq!(times, vec![0, 500_000, 500_000, 1_000_000, 1_000_000, 1_500_000]);
        assert_eq!(
            messages[0].message,
            MidiMessage::NoteOn {
                channel: 0,
                pitch: 60,
                velocity: 100
            }
        );
        assert_eq!(
            messages[1].message,
            MidiMessage::NoteOff {
                channel: 0,
                pitch: 60
            }
        );
    }

    #[test]
    fn tempo_change_scales_time() {
        // 60 BPM: one beat per second
        let bytes = smf_bytes(&[tempo_track(1_000_000), arpeggio_track()], 480);
        let messages = messages_from_smf(&bytes).unwrap();
        assert_eq!(messages.last().unwrap().timestamp_us, 3_000_000);
    }

    #[test]
    fn default_tempo_without_meta_event() {
        let bytes = smf_bytes(&[arpeggio_track()], 480);
        let messages = messages_from_smf(&bytes).unwrap();
        assert_eq!(messages.last().unwrap().timestamp_us, 1_500_000);
    }

    #[test]
    fn note_on_velocity_zero_decodes_as_note_off() {
        let track = vec![
            0x00, 0x90, 60, 100, //
            0x60, 0x90, 60, 0, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let messages = messages_from_smf(&smf_bytes(&[track], 96)).unwrap();
        assert!(matches!(messages[1].message, MidiMessage::NoteOff { pitch: 60, .. }));
        assert_eq!(messages[1].timestamp_us, 500_000);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(messages_from_smf(b"not a midi file"), Err(Error::Smf(_))));
    }
}
