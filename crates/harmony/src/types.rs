use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    Major,
    Minor,
}

impl KeyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyMode::Major => "Major",
            KeyMode::Minor => "Minor",
        }
    }
}

impl std::fmt::Display for KeyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-fitting key for a pitch-class histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDetection {
    /// Display label: "C Major", "F# Minor", ...
    pub key: String,
    /// Pitch class 0–11 (C=0, C#=1, ...)
    pub root_pitch_class: u8,
    pub mode: KeyMode,
    /// Pearson correlation with the winning profile. NaN when the histogram
    /// carries no usable signal (all zero or constant).
    pub confidence: f64,
}

impl KeyDetection {
    /// False when the confidence is NaN and the label should not be shown.
    pub fn is_reliable(&self) -> bool {
        !self.confidence.is_nan()
    }
}
