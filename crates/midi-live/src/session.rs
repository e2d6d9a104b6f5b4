//! Caller-side state fed to the detectors.
//!
//! A [`Session`] owns everything that changes as events arrive: the set of
//! sounding notes, the pitch-class histogram, per-note counters and the key
//! highlighting latch. Events are applied one at a time and the detectors are
//! re-run against the resulting snapshot before the next event is taken.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use harmony::{detect_chord, detect_key, note_name, Key, KeyDetection};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::midi::{MidiMessage, TimestampedMidiMessage};
use crate::Error;

/// How note events are turned into pitch-class histogram weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    /// +1 per note-on
    #[default]
    Count,
    /// +velocity per note-on
    Velocity,
    /// +seconds held, credited when the note is released
    Duration,
}

impl Weighting {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weighting::Count => "count",
            Weighting::Velocity => "velocity",
            Weighting::Duration => "duration",
        }
    }
}

impl std::fmt::Display for Weighting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weighting {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(Weighting::Count),
            "velocity" => Ok(Weighting::Velocity),
            "duration" => Ok(Weighting::Duration),
            _ => Err(Error::UnknownWeighting(s.to_string())),
        }
    }
}

/// Notes currently sounding (note-on received, no note-off yet).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveNotes(BTreeSet<u8>);

impl ActiveNotes {
    /// Returns false if the note was already sounding.
    pub fn insert(&mut self, pitch: u8) -> bool {
        self.0.insert(pitch)
    }

    pub fn remove(&mut self, pitch: u8) -> bool {
        self.0.remove(&pitch)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn contains(&self, pitch: u8) -> bool {
        self.0.contains(&pitch)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sounding notes, lowest first.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
}

/// Accumulated pitch-class weights.
#[derive(Debug, Clone, Default)]
pub struct PitchHistogram {
    weighting: Weighting,
    weights: [f64; 12],
    /// Onset timestamps of held notes, for duration weighting
    held_since: HashMap<u8, u64>,
}

impl PitchHistogram {
    pub fn new(weighting: Weighting) -> Self {
        Self {
            weighting,
            ..Default::default()
        }
    }

    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    pub fn weights(&self) -> &[f64; 12] {
        &self.weights
    }

    pub fn note_on(&mut self, pitch: u8, velocity: u8, timestamp_us: u64) {
        let pc = (pitch % 12) as usize;
        match self.weighting {
            Weighting::Count => self.weights[pc] += 1.0,
            Weighting::Velocity => self.weights[pc] += velocity as f64,
            Weighting::Duration => {
                // A repeated note-on keeps the original onset.
                self.held_since.entry(pitch).or_insert(timestamp_us);
            }
        }
    }

    pub fn note_off(&mut self, pitch: u8, timestamp_us: u64) {
        if let Some(onset) = self.held_since.remove(&pitch) {
            let held_us = timestamp_us.saturating_sub(onset);
            self.weights[(pitch % 12) as usize] += held_us as f64 / 1_000_000.0;
        }
    }

    /// Credit every held note as released at `timestamp_us`.
    pub fn release_all(&mut self, timestamp_us: u64) {
        let held: Vec<u8> = self.held_since.keys().copied().collect();
        for pitch in held {
            self.note_off(pitch, timestamp_us);
        }
    }

    /// Zero all weights. Notes still held keep their onsets.
    pub fn reset(&mut self) {
        self.weights = [0.0; 12];
    }
}

/// Note-on counters for every MIDI note number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteCounts([u32; 128]);

impl Default for NoteCounts {
    fn default() -> Self {
        Self([0; 128])
    }
}

impl NoteCounts {
    pub fn record(&mut self, pitch: u8) {
        if let Some(count) = self.0.get_mut(pitch as usize) {
            *count = count.saturating_add(1);
        }
    }

    pub fn get(&self, pitch: u8) -> u32 {
        self.0.get(pitch as usize).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|&c| c as u64).sum()
    }

    /// Counts folded onto the 12 pitch classes.
    pub fn pitch_class_totals(&self) -> [f64; 12] {
        let mut totals = [0.0; 12];
        for (pitch, &count) in self.0.iter().enumerate() {
            totals[pitch % 12] += count as f64;
        }
        totals
    }

    pub fn reset(&mut self) {
        self.0 = [0; 128];
    }
}

/// Latches played notes that belong to a selected key.
///
/// Once a note in the selected key's scale is played it stays highlighted
/// until the key changes.
#[derive(Debug, Clone, Default)]
pub struct KeyHighlighter {
    key: Option<Key>,
    highlighted: BTreeSet<u8>,
}

impl KeyHighlighter {
    pub fn new(key: Option<Key>) -> Self {
        Self {
            key,
            highlighted: BTreeSet::new(),
        }
    }

    pub fn key(&self) -> Option<Key> {
        self.key
    }

    /// Select a new key (or none), clearing every latched note.
    pub fn set_key(&mut self, key: Option<Key>) {
        self.key = key;
        self.highlighted.clear();
    }

    /// Record a played note. Returns true if it is (now) highlighted.
    pub fn observe(&mut self, pitch: u8) -> bool {
        match self.key {
            Some(key) if key.contains(pitch % 12) => {
                self.highlighted.insert(pitch);
                true
            }
            _ => false,
        }
    }

    pub fn is_highlighted(&self, pitch: u8) -> bool {
        self.highlighted.contains(&pitch)
    }

    pub fn highlighted(&self) -> impl Iterator<Item = u8> + '_ {
        self.highlighted.iter().copied()
    }
}

/// What the detectors made of the session after one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub timestamp_us: u64,
    pub active_notes: Vec<u8>,
    pub note_names: Vec<String>,
    pub chord: Option<String>,
    /// None while the histogram carries no usable key signal
    pub key: Option<KeyDetection>,
    pub highlighted: Vec<u8>,
}

impl Analysis {
    /// One display line: notes, chord and key.
    pub fn summary(&self) -> String {
        let notes = if self.note_names.is_empty() {
            "–".to_string()
        } else {
            self.note_names.join(", ")
        };
        let chord = self.chord.as_deref().unwrap_or("–");
        let key = self
            .key
            .as_ref()
            .map(|k| format!("{} ({:.3})", k.key, k.confidence))
            .unwrap_or_else(|| "–".to_string());
        format!("notes: {} | chord: {} | key: {}", notes, chord, key)
    }
}

/// Everything that changes while notes are played.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub active: ActiveNotes,
    pub histogram: PitchHistogram,
    pub counts: NoteCounts,
    pub highlighter: KeyHighlighter,
    events_applied: u64,
}

impl Session {
    pub fn new(weighting: Weighting) -> Self {
        Self {
            histogram: PitchHistogram::new(weighting),
            ..Default::default()
        }
    }

    pub fn with_highlight_key(mut self, key: Option<Key>) -> Self {
        self.highlighter.set_key(key);
        self
    }

    pub fn events_applied(&self) -> u64 {
        self.events_applied
    }

    /// Apply one event and re-run the detectors.
    ///
    /// Returns `None` for messages that do not touch harmonic state.
    pub fn apply(&mut self, event: &TimestampedMidiMessage) -> Option<Analysis> {
        let ts = event.timestamp_us;
        trace!(timestamp_us = ts, message = %event.message, "applying MIDI event");

        match event.message {
            // A note-on with velocity 0 is a note-off.
            MidiMessage::NoteOn {
                pitch, velocity: 0, ..
            }
            | MidiMessage::NoteOff { pitch, .. } => {
                self.active.remove(pitch);
                self.histogram.note_off(pitch, ts);
            }
            MidiMessage::NoteOn {
                pitch, velocity, ..
            } => {
                self.active.insert(pitch);
                self.histogram.note_on(pitch, velocity, ts);
                self.counts.record(pitch);
                self.highlighter.observe(pitch);
            }
            msg if msg.is_all_notes_off() => {
                debug!(timestamp_us = ts, "all notes off");
                self.active.clear();
                self.histogram.release_all(ts);
            }
            MidiMessage::ControlChange { .. } => return None,
        }

        self.events_applied += 1;
        Some(self.analysis(ts))
    }

    /// Run both detectors against the current snapshot.
    pub fn analysis(&self, timestamp_us: u64) -> Analysis {
        let active_notes: Vec<u8> = self.active.iter().collect();

        // The histogram is always 12 bins, so detection cannot fail here.
        let key = detect_key(self.histogram.weights())
            .ok()
            .filter(KeyDetection::is_reliable);

        Analysis {
            timestamp_us,
            note_names: active_notes.iter().map(|&n| note_name(n as i32)).collect(),
            chord: detect_chord(active_notes.iter().map(|&n| n as i32)),
            key,
            highlighted: self.highlighter.highlighted().collect(),
            active_notes,
        }
    }

    /// Clear the histogram and the per-note counters.
    pub fn reset_statistics(&mut self) {
        self.histogram.reset();
        self.counts.reset();
    }
}
