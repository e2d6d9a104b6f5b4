//! Harmonic analysis of MIDI note snapshots.
//!
//! Two pure classifiers share a handful of pitch-class primitives:
//!
//! - [`detect_chord`] names the chord formed by a set of sounding notes by
//!   template matching against a fixed catalog.
//! - [`detect_key`] finds the best-fitting major or minor key for a
//!   12-bin pitch-class histogram by correlating it with the
//!   Krumhansl-Schmuckler profiles.
//!
//! Neither keeps state between calls. Callers own the active-note set and
//! the histogram and pass a snapshot in on every event.

pub mod chord_templates;
pub mod chords;
pub mod key;
pub mod pitch;
pub mod scale;
pub mod types;

pub use chord_templates::{ChordTemplate, TEMPLATES};
pub use chords::{detect_chord, match_chord, match_chord_with, ChordMatch};
pub use key::{detect_key, detect_key_with, KeyProfiles, MAJOR_PROFILE, MINOR_PROFILE};
pub use pitch::{
    correlate, note_label, note_name, pitch_class_name, rotate_backward, rotate_forward,
    PitchClassSet, PITCH_CLASS_NAMES,
};
pub use scale::Key;
pub use types::{KeyDetection, KeyMode};

/// Errors from harmonic analysis.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("pitch-class histogram must have {expected} bins, got {actual}")]
    InvalidHistogramLength { expected: usize, actual: usize },

    #[error("cannot correlate sequences of length {left} and {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("unrecognized key: {0:?}")]
    UnknownKey(String),
}

pub type Result<T> = std::result::Result<T, Error>;
