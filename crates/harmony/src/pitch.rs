//! Pitch-class primitives shared by the chord and key detectors.
//!
//! Everything that transposes pitch-class data goes through
//! [`rotate_forward`] / [`rotate_backward`], so chord root search and key
//! root search agree on a single index mapping.

use crate::{Error, Result};

/// Canonical sharp spellings, indexed by pitch class (C = 0).
pub const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Name of a pitch class. Out-of-range values wrap modulo 12.
pub fn pitch_class_name(pitch_class: u8) -> &'static str {
    PITCH_CLASS_NAMES[(pitch_class % 12) as usize]
}

/// Scientific pitch name for a MIDI note number: 60 → "C4", 0 → "C-1".
///
/// Defined for 0..=127 but total over `i32`: the pitch class wraps with
/// Euclidean modulo and the octave uses floor division, so negative or
/// oversized inputs still produce a name.
pub fn note_name(note: i32) -> String {
    let pitch_class = note.rem_euclid(12) as usize;
    let octave = note.div_euclid(12) - 1;
    format!("{}{}", PITCH_CLASS_NAMES[pitch_class], octave)
}

/// Note name with the raw number appended, as shown in event logs: "C4 (60)".
pub fn note_label(note: i32) -> String {
    format!("{} ({})", note_name(note), note)
}

/// Shift values toward higher indices: `result[i] = seq[(i - k) mod N]`.
pub fn rotate_forward<T: Copy, const N: usize>(seq: &[T; N], k: usize) -> [T; N] {
    std::array::from_fn(|i| seq[(i + N - k % N) % N])
}

/// Shift values toward lower indices: `result[i] = seq[(i + k) mod N]`.
///
/// Inverse of [`rotate_forward`] for the same `k`. Rotating a pitch-class
/// vector backward by `r` transposes it down by `r` semitones, so the value
/// at pitch class `r` lands at index 0.
pub fn rotate_backward<T: Copy, const N: usize>(seq: &[T; N], k: usize) -> [T; N] {
    std::array::from_fn(|i| seq[(i + k % N) % N])
}

/// Pearson correlation coefficient of two equal-length sequences.
///
/// Returns NaN when either sequence has zero variance (all values equal,
/// including all zeros); callers decide what a NaN means for them. Sequences
/// of different length are rejected.
pub fn correlate(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let n = a.len() as f64;
    let a_mean = a.iter().sum::<f64>() / n;
    let b_mean = b.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut a_sq = 0.0;
    let mut b_sq = 0.0;

    for (x, y) in a.iter().zip(b) {
        let xd = x - a_mean;
        let yd = y - b_mean;
        num += xd * yd;
        a_sq += xd * xd;
        b_sq += yd * yd;
    }

    // 0/0 is NaN, which is exactly the zero-variance signal we want.
    Ok(num / (a_sq * b_sq).sqrt())
}

/// A set of pitch classes, stored as membership flags indexed by pitch class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PitchClassSet([bool; 12]);

impl PitchClassSet {
    /// Collect the distinct pitch classes of a set of MIDI note numbers.
    pub fn from_notes<I>(notes: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let mut flags = [false; 12];
        for note in notes {
            flags[note.rem_euclid(12) as usize] = true;
        }
        Self(flags)
    }

    pub fn contains(&self, pitch_class: u8) -> bool {
        self.0[(pitch_class % 12) as usize]
    }

    pub fn len(&self) -> usize {
        self.0.iter().filter(|&&present| present).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Transpose every member down by `semitones`, so `semitones` becomes 0.
    pub fn transposed_down(&self, semitones: u8) -> Self {
        Self(rotate_backward(&self.0, semitones as usize))
    }

    /// Members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..12u8).filter(move |&pc| self.0[pc as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn note_names_across_octaves() {
        assert_eq!(note_name(57), "A3");
        assert_eq!(note_name(58), "A#3");
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(61), "C#4");
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(72), "C5");
        assert_eq!(note_name(127), "G9");
    }

    #[test]
    fn note_names_wrap_at_octave_boundaries() {
        assert_eq!(note_name(0), "C-1");
        assert_eq!(note_name(11), "B-1");
        assert_eq!(note_name(12), "C0");
    }

    #[test]
    fn note_name_outside_midi_range_does_not_panic() {
        assert_eq!(note_name(-1), "B-2");
        assert_eq!(note_name(-12), "C-2");
        assert_eq!(note_name(128), "G#9");
    }

    #[test]
    fn note_label_appends_number() {
        assert_eq!(note_label(57), "A3 (57)");
        assert_eq!(note_label(74), "D5 (74)");
    }

    #[test]
    fn rotate_forward_moves_values_up() {
        assert_eq!(rotate_forward(&[10, 20, 30, 40], 1), [40, 10, 20, 30]);
    }

    #[test]
    fn rotate_backward_moves_values_down() {
        assert_eq!(rotate_backward(&[0, 1, 2, 3], 1), [1, 2, 3, 0]);
    }

    #[test]
    fn rotate_forward_by_two_on_pitch_class_row() {
        let input = [100, 0, 50, 80, 0, 0, 0, 90, 50, 0, 20, 20];
        let expected = [20, 20, 100, 0, 50, 80, 0, 0, 0, 90, 50, 0];
        assert_eq!(rotate_forward(&input, 2), expected);
    }

    #[test]
    fn rotation_by_multiple_of_length_is_identity() {
        let input = [1, 2, 3, 4, 5];
        assert_eq!(rotate_forward(&input, 0), input);
        assert_eq!(rotate_forward(&input, 5), input);
        assert_eq!(rotate_backward(&input, 10), input);
    }

    #[test]
    fn correlate_reversed_linear_is_minus_one() {
        let r = correlate(&[1.0, 2.0, 3.0, 4.0, 5.0], &[5.0, 4.0, 3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-12, "got {}", r);
    }

    #[test]
    fn correlate_identical_is_one() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let r = correlate(&a, &a).unwrap();
        assert!((r - 1.0).abs() < 1e-12, "got {}", r);
    }

    #[test]
    fn correlate_constant_input_is_nan() {
        let ramp = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let r = correlate(&[3.0; 12], &ramp).unwrap();
        assert!(r.is_nan());
    }

    #[test]
    fn correlate_rejects_length_mismatch() {
        let err = correlate(&[1.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { left: 2, right: 3 }));
    }

    #[test]
    fn pitch_class_set_dedups_octaves() {
        let set = PitchClassSet::from_notes([60, 72, 64, 48, 67]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 4, 7]);
    }

    #[test]
    fn pitch_class_set_transposes_down() {
        // D F A down by 2 → C D# G
        let set = PitchClassSet::from_notes([62, 65, 69]).transposed_down(2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 3, 7]);
    }
}
