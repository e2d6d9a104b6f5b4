//! Raw MIDI byte decoding for the channel messages the detectors care about.

use harmony::note_label;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Controller 120: All Sound Off.
pub const CC_ALL_SOUND_OFF: u8 = 120;
/// Controller 123: All Notes Off.
pub const CC_ALL_NOTES_OFF: u8 = 123;

/// Decoded MIDI channel message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MidiMessage {
    NoteOn {
        channel: u8,
        pitch: u8,
        velocity: u8,
    },
    NoteOff {
        channel: u8,
        pitch: u8,
    },
    ControlChange {
        channel: u8,
        controller: u8,
        value: u8,
    },
}

impl MidiMessage {
    /// True for control changes that silence every sounding note.
    pub fn is_all_notes_off(&self) -> bool {
        matches!(
            self,
            MidiMessage::ControlChange { controller, .. }
                if *controller == CC_ALL_SOUND_OFF || *controller == CC_ALL_NOTES_OFF
        )
    }
}

impl std::fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MidiMessage::NoteOn {
                pitch, velocity, ..
            } => write!(
                f,
                "Note On {} (velocity: {})",
                note_label(*pitch as i32),
                velocity
            ),
            MidiMessage::NoteOff { pitch, .. } => {
                write!(f, "Note Off {}", note_label(*pitch as i32))
            }
            MidiMessage::ControlChange {
                controller, value, ..
            } => write!(f, "Control Change {} = {}", controller, value),
        }
    }
}

/// A decoded message with its arrival time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampedMidiMessage {
    /// Microseconds since an arbitrary, per-source epoch
    pub timestamp_us: u64,
    pub message: MidiMessage,
}

/// Parse raw MIDI bytes into a MidiMessage.
///
/// Note On with velocity 0 is reported as Note Off. Data bytes with the high
/// bit set are rejected, so decoded note numbers are always 0..=127.
pub fn parse_midi_bytes(data: &[u8]) -> Option<MidiMessage> {
    let (&status, rest) = data.split_first()?;
    let channel = status & 0x0F;
    let msg_type = status & 0xF0;

    if rest.len() < 2 || rest[..2].iter().any(|b| b & 0x80 != 0) {
        debug!("Unhandled MIDI message: {:02X?}", data);
        return None;
    }

    match msg_type {
        0x90 => {
            let velocity = rest[1];
            if velocity == 0 {
                Some(MidiMessage::NoteOff {
                    channel,
                    pitch: rest[0],
                })
            } else {
                Some(MidiMessage::NoteOn {
                    channel,
                    pitch: rest[0],
                    velocity,
                })
            }
        }
        0x80 => Some(MidiMessage::NoteOff {
            channel,
            pitch: rest[0],
        }),
        0xB0 => Some(MidiMessage::ControlChange {
            channel,
            controller: rest[0],
            value: rest[1],
        }),
        _ => {
            debug!("Unhandled MIDI message type: {:02X}", status);
            None
        }
    }
}

/// Encode a MidiMessage to raw MIDI bytes.
pub fn encode_midi_message(msg: &MidiMessage) -> [u8; 3] {
    match msg {
        MidiMessage::NoteOn {
            channel,
            pitch,
            velocity,
        } => [0x90 | (channel & 0x0F), *pitch, *velocity],
        MidiMessage::NoteOff { channel, pitch } => [0x80 | (channel & 0x0F), *pitch, 0],
        MidiMessage::ControlChange {
            channel,
            controller,
            value,
        } => [0xB0 | (channel & 0x0F), *controller, *value],
    }
}

/// One event-log line for raw bytes: the decoded message when there is one,
/// otherwise the status and data bytes.
pub fn describe_bytes(data: &[u8]) -> String {
    if let Some(msg @ (MidiMessage::NoteOn { .. } | MidiMessage::NoteOff { .. })) =
        parse_midi_bytes(data)
    {
        return msg.to_string();
    }

    let byte = |i: usize| data.get(i).map_or_else(|| "-".to_string(), |b| b.to_string());
    format!(
        "Status: {}, Data1: {}, Data2: {}",
        data.first().map_or_else(|| "-".to_string(), |s| format!("{:x}", s)),
        byte(1),
        byte(2)
    )
}

/// Parse a line of whitespace-separated hex bytes, e.g. `"90 3C 64"`.
pub fn parse_hex_line(line: &str) -> Result<Vec<u8>> {
    line.split_whitespace()
        .map(|token| {
            let digits = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            u8::from_str_radix(digits, 16).map_err(|_| Error::InvalidHex(token.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn note_on() {
        assert_eq!(
            parse_midi_bytes(&[0x91, 60, 100]),
            Some(MidiMessage::NoteOn {
                channel: 1,
                pitch: 60,
                velocity: 100
            })
        );
    }

    #[test]
    fn note_on_velocity_zero_is_note_off() {
        assert_eq!(
            parse_midi_bytes(&[0x90, 64, 0]),
            Some(MidiMessage::NoteOff {
                channel: 0,
                pitch: 64
            })
        );
    }

    #[test]
    fn note_off() {
        assert_eq!(
            parse_midi_bytes(&[0x8F, 67, 40]),
            Some(MidiMessage::NoteOff {
                channel: 15,
                pitch: 67
            })
        );
    }

    #[test]
    fn control_change() {
        let msg = parse_midi_bytes(&[0xB0, CC_ALL_NOTES_OFF, 0]).unwrap();
        assert!(msg.is_all_notes_off());

        let sustain = parse_midi_bytes(&[0xB0, 64, 127]).unwrap();
        assert!(!sustain.is_all_notes_off());
    }

    #[test]
    fn short_and_unsupported_messages_are_ignored() {
        assert_eq!(parse_midi_bytes(&[]), None);
        assert_eq!(parse_midi_bytes(&[0x90, 60]), None);
        assert_eq!(parse_midi_bytes(&[0xC0, 5]), None);
        assert_eq!(parse_midi_bytes(&[0xE0, 0, 64]), None);
        assert_eq!(parse_midi_bytes(&[0xF8]), None);
    }

    #[test]
    fn data_bytes_with_high_bit_are_rejected() {
        assert_eq!(parse_midi_bytes(&[0x90, 0x80, 100]), None);
        assert_eq!(parse_midi_bytes(&[0x90, 60, 0xFF]), None);
    }

    #[test]
    fn encode_then_parse_preserves_note_on() {
        let msg = MidiMessage::NoteOn {
            channel: 3,
            pitch: 72,
            velocity: 90,
        };
        assert_eq!(parse_midi_bytes(&encode_midi_message(&msg)), Some(msg));
    }

    #[test]
    fn describe_note_events() {
        assert_eq!(describe_bytes(&[0x90, 60, 100]), "Note On C4 (60) (velocity: 100)");
        assert_eq!(describe_bytes(&[0x80, 60, 0]), "Note Off C4 (60)");
        assert_eq!(describe_bytes(&[0x90, 57, 0]), "Note Off A3 (57)");
    }

    #[test]
    fn describe_other_events_shows_raw_bytes() {
        assert_eq!(describe_bytes(&[0xB0, 7, 100]), "Status: b0, Data1: 7, Data2: 100");
        assert_eq!(describe_bytes(&[0xC0, 5]), "Status: c0, Data1: 5, Data2: -");
    }

    #[test]
    fn hex_lines() {
        assert_eq!(parse_hex_line("90 3C 64").unwrap(), vec![0x90, 0x3C, 0x64]);
        assert_eq!(parse_hex_line("0x80 0x3c 0x00").unwrap(), vec![0x80, 0x3C, 0x00]);
        assert_eq!(parse_hex_line("   ").unwrap(), Vec::<u8>::new());
        assert!(matches!(parse_hex_line("90 zz"), Err(Error::InvalidHex(t)) if t == "zz"));
    }
}
