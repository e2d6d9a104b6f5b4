use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pitch::{pitch_class_name, PITCH_CLASS_NAMES};
use crate::types::{KeyDetection, KeyMode};
use crate::Error;

const MAJOR_STEPS: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
const NATURAL_MINOR_STEPS: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];

/// Flat spellings accepted when parsing a key label.
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// A tonal center: root pitch class plus mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    pub root: u8,
    pub mode: KeyMode,
}

impl Key {
    pub fn new(root: u8, mode: KeyMode) -> Self {
        Self {
            root: root % 12,
            mode,
        }
    }

    /// The seven pitch classes of the key's major or natural-minor scale.
    pub fn scale_pitch_classes(&self) -> [u8; 7] {
        let steps = match self.mode {
            KeyMode::Major => MAJOR_STEPS,
            KeyMode::Minor => NATURAL_MINOR_STEPS,
        };
        steps.map(|step| (self.root % 12 + step) % 12)
    }

    pub fn contains(&self, pitch_class: u8) -> bool {
        self.scale_pitch_classes().contains(&(pitch_class % 12))
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", pitch_class_name(self.root), self.mode)
    }
}

impl From<&KeyDetection> for Key {
    fn from(detection: &KeyDetection) -> Self {
        Key::new(detection.root_pitch_class, detection.mode)
    }
}

impl FromStr for Key {
    type Err = Error;

    /// Parses labels like "C Major", "F# minor", "Bb Minor".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || Error::UnknownKey(s.to_string());

        let mut parts = s.split_whitespace();
        let (Some(root), Some(mode), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(unknown());
        };

        let root = PITCH_CLASS_NAMES
            .iter()
            .position(|name| name.eq_ignore_ascii_case(root))
            .or_else(|| FLAT_NAMES.iter().position(|name| name.eq_ignore_ascii_case(root)))
            .ok_or_else(unknown)?;

        let mode = match mode.to_ascii_lowercase().as_str() {
            "major" => KeyMode::Major,
            "minor" => KeyMode::Minor,
            _ => return Err(unknown()),
        };

        Ok(Key::new(root as u8, mode))
    }
}
