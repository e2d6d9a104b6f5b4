use crate::pitch::{correlate, pitch_class_name, rotate_backward};
use crate::types::{KeyDetection, KeyMode};
use crate::{Error, Result};

/// Krumhansl-Kessler major key profile, rooted at C.
pub const MAJOR_PROFILE: [f64; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor key profile, rooted at C.
pub const MINOR_PROFILE: [f64; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Reference profiles correlated against every rotation of a histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyProfiles {
    pub major: [f64; 12],
    pub minor: [f64; 12],
}

impl KeyProfiles {
    pub const KRUMHANSL: KeyProfiles = KeyProfiles {
        major: MAJOR_PROFILE,
        minor: MINOR_PROFILE,
    };
}

impl Default for KeyProfiles {
    fn default() -> Self {
        Self::KRUMHANSL
    }
}

/// Detect the key of a pitch-class histogram (Krumhansl-Schmuckler).
///
/// `histogram[pc]` is any non-negative weight for pitch class `pc`: counts,
/// durations, or velocities. The histogram is rotated so each candidate root
/// sits at index 0 and correlated with the major and minor profiles; the
/// highest of the 24 correlations wins. Ties keep the first candidate seen,
/// scanning roots C upward and major before minor.
///
/// Fails when the histogram is not exactly 12 bins long. A histogram with no
/// variance yields a NaN confidence and the label "C Major".
pub fn detect_key(histogram: &[f64]) -> Result<KeyDetection> {
    detect_key_with(histogram, &KeyProfiles::KRUMHANSL)
}

/// [`detect_key`] with caller-supplied reference profiles.
pub fn detect_key_with(histogram: &[f64], profiles: &KeyProfiles) -> Result<KeyDetection> {
    let histogram: &[f64; 12] = histogram
        .try_into()
        .map_err(|_| Error::InvalidHistogramLength {
            expected: 12,
            actual: histogram.len(),
        })?;

    let mut best: Option<(u8, KeyMode, f64)> = None;

    for root in 0..12u8 {
        let rotated = rotate_backward(histogram, root as usize);

        for (mode, profile) in [
            (KeyMode::Major, &profiles.major),
            (KeyMode::Minor, &profiles.minor),
        ] {
            let corr = correlate(&rotated, profile)?;
            // NaN never compares greater, so an unusable candidate never wins.
            if best.map_or(!corr.is_nan(), |(_, _, best_corr)| corr > best_corr) {
                best = Some((root, mode, corr));
            }
        }
    }

    let (root, mode, confidence) = best.unwrap_or((0, KeyMode::Major, f64::NAN));

    Ok(KeyDetection {
        key: format!("{} {}", pitch_class_name(root), mode),
        root_pitch_class: root,
        mode,
        confidence,
    })
}
