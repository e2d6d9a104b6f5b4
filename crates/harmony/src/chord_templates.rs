use crate::pitch::PitchClassSet;

/// A chord quality: display name + interval offsets from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordTemplate {
    pub name: &'static str,
    /// Ascending semitone offsets from the root, always starting at 0.
    pub offsets: &'static [u8],
}

impl ChordTemplate {
    pub const fn new(name: &'static str, offsets: &'static [u8]) -> Self {
        Self { name, offsets }
    }

    /// True when every template tone is present in `intervals`.
    ///
    /// `intervals` must already be transposed so the candidate root is 0.
    /// Extra tones are allowed.
    pub fn is_covered_by(&self, intervals: &PitchClassSet) -> bool {
        self.offsets.iter().all(|&offset| intervals.contains(offset))
    }
}

/// Built-in chord catalog. Declaration order is the match priority within a
/// root: the first template covered by the transposed set wins.
pub static TEMPLATES: &[ChordTemplate] = &[
    ChordTemplate::new("Major", &[0, 4, 7]),
    ChordTemplate::new("Minor", &[0, 3, 7]),
    ChordTemplate::new("Diminished", &[0, 3, 6]),
    ChordTemplate::new("Augmented", &[0, 4, 8]),
    ChordTemplate::new("Sus2", &[0, 2, 7]),
    ChordTemplate::new("Sus4", &[0, 5, 7]),
    ChordTemplate::new("Major 7", &[0, 4, 7, 11]),
    ChordTemplate::new("Minor 7", &[0, 3, 7, 10]),
    ChordTemplate::new("Dominant 7", &[0, 4, 7, 10]),
    ChordTemplate::new("Half-diminished 7", &[0, 3, 6, 10]),
];
