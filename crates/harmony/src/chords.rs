use serde::{Deserialize, Serialize};

use crate::chord_templates::{ChordTemplate, TEMPLATES};
use crate::pitch::{pitch_class_name, PitchClassSet};

/// A chord needs at least a triad's worth of distinct pitch classes.
pub const MIN_CHORD_PITCH_CLASSES: usize = 3;

/// The (root, template) pair found by [`match_chord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordMatch {
    pub root_pitch_class: u8,
    pub quality: String,
}

impl ChordMatch {
    /// Display label: "<RootName> <TemplateName>", e.g. "C Major".
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for ChordMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", pitch_class_name(self.root_pitch_class), self.quality)
    }
}

/// Match sounding notes against the built-in catalog.
///
/// Roots are tried C upward, and within a root templates are tried in
/// catalog order; the first template whose tones are all present (after
/// transposing the notes down to that root) wins. Fewer than three distinct
/// pitch classes never match.
pub fn match_chord<I>(notes: I) -> Option<ChordMatch>
where
    I: IntoIterator<Item = i32>,
{
    match_chord_with(notes, TEMPLATES)
}

/// [`match_chord`] against a caller-supplied catalog.
pub fn match_chord_with<I>(notes: I, catalog: &[ChordTemplate]) -> Option<ChordMatch>
where
    I: IntoIterator<Item = i32>,
{
    let pitch_classes = PitchClassSet::from_notes(notes);
    if pitch_classes.len() < MIN_CHORD_PITCH_CLASSES {
        return None;
    }

    for root in 0..12u8 {
        let intervals = pitch_classes.transposed_down(root);
        if let Some(template) = catalog.iter().find(|t| t.is_covered_by(&intervals)) {
            return Some(ChordMatch {
                root_pitch_class: root,
                quality: template.name.to_string(),
            });
        }
    }

    None
}

/// Chord label for a snapshot of active MIDI notes, or `None`.
pub fn detect_chord<I>(notes: I) -> Option<String>
where
    I: IntoIterator<Item = i32>,
{
    match_chord(notes).map(|m| m.label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_major_triad() {
        assert_eq!(detect_chord([60, 64, 67]).as_deref(), Some("C Major"));
    }

    #[test]
    fn c_minor_triad() {
        assert_eq!(detect_chord([60, 63, 67]).as_deref(), Some("C Minor"));
    }

    #[test]
    fn c_diminished_triad() {
        assert_eq!(detect_chord([60, 63, 66]).as_deref(), Some("C Diminished"));
    }

    #[test]
    fn d_minor_from_unordered_input() {
        assert_eq!(detect_chord([69, 62, 65]).as_deref(), Some("D Minor"));
    }

    #[test]
    fn inversion_reports_true_root() {
        // E G C (first inversion) is still C major
        assert_eq!(detect_chord([64, 67, 72]).as_deref(), Some("C Major"));
    }

    #[test]
    fn too_few_notes() {
        assert_eq!(detect_chord([60]), None);
        assert_eq!(detect_chord([60, 64]), None);
        assert_eq!(detect_chord(std::iter::empty()), None);
    }

    #[test]
    fn octave_doublings_do_not_count_as_distinct() {
        assert_eq!(detect_chord([60, 72, 84]), None);
        assert_eq!(detect_chord([60, 72, 64]), None);
    }

    #[test]
    fn unrecognized_combination() {
        assert_eq!(detect_chord([60, 62, 65]), None);
    }

    #[test]
    fn extra_tone_still_matches_triad() {
        // C E G + D
        assert_eq!(detect_chord([60, 62, 64, 67]).as_deref(), Some("C Major"));
    }

    #[test]
    fn catalog_order_decides_within_root() {
        // C E G Bb covers Major before Dominant 7 is reached
        assert_eq!(detect_chord([60, 64, 67, 70]).as_deref(), Some("C Major"));
    }

    #[test]
    fn lowest_root_wins_across_roots() {
        // C E G# is augmented from C, E and G#; C is tried first
        let m = match_chord([60, 64, 68]).unwrap();
        assert_eq!(m.root_pitch_class, 0);
        assert_eq!(m.quality, "Augmented");
    }

    #[test]
    fn lower_root_triad_beats_seventh_chord() {
        // B D F A: B diminished triad also present, found at root B (11),
        // but D minor (D F A) sits on a lower root.
        assert_eq!(detect_chord([59, 62, 65, 69]).as_deref(), Some("D Minor"));
    }

    #[test]
    fn sus_chords() {
        assert_eq!(detect_chord([60, 62, 67]).as_deref(), Some("C Sus2"));
        // C F G: also G Sus2, but C is tried first
        assert_eq!(detect_chord([60, 65, 67]).as_deref(), Some("C Sus4"));
    }

    #[test]
    fn custom_catalog_is_used() {
        static SIXTHS: &[ChordTemplate] = &[ChordTemplate::new("Six", &[0, 4, 9])];
        let m = match_chord_with([60, 64, 69], SIXTHS).unwrap();
        assert_eq!(m.label(), "C Six");
        assert_eq!(match_chord_with([60, 64, 67], SIXTHS), None);
    }

    #[test]
    fn repeated_calls_are_stable() {
        let notes = [60, 63, 67, 70];
        let first = detect_chord(notes);
        for _ in 0..5 {
            assert_eq!(detect_chord(notes), first);
        }
    }

    #[test]
    fn display_matches_label() {
        let m = match_chord([62, 66, 69]).unwrap();
        assert_eq!(m.to_string(), m.label());
        assert_eq!(m.label(), "D Major");
    }
}
