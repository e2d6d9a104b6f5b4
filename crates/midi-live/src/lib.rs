//! Caller side of the harmony detectors: raw MIDI decoding, per-session
//! state, and an ordered event pump.

#[cfg(feature = "device")]
pub mod device;
pub mod midi;
pub mod pump;
pub mod session;
pub mod smf;

pub use midi::{
    describe_bytes, encode_midi_message, parse_hex_line, parse_midi_bytes, MidiMessage,
    TimestampedMidiMessage,
};
pub use pump::{AnalysisPublisher, EventPump, EventSender, LoggingPublisher};
pub use session::{
    ActiveNotes, Analysis, KeyHighlighter, NoteCounts, PitchHistogram, Session, Weighting,
};
pub use smf::messages_from_smf;

/// Errors from live MIDI handling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("MIDI file parse error: {0}")]
    Smf(String),

    #[error("invalid hex byte: {0:?}")]
    InvalidHex(String),

    #[error("unknown histogram weighting {0:?} (expected count, velocity or duration)")]
    UnknownWeighting(String),
}

pub type Result<T> = std::result::Result<T, Error>;
