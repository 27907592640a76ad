//! Export tree types
//!
//! A format-neutral tree of parts, measures and measure items built from swept
//! voices. Durations are integer divisions of a quarter note, where one minim of
//! sounding mensural time is one quarter.

use serde::{Deserialize, Serialize};

/// Whole score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportScore {
    pub title: String,
    pub composer: String,
    pub parts: Vec<ExportPart>,
}

/// One voice across all sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPart {
    /// Part identifier ("P1", "P2", ...)
    pub part_id: String,

    /// Voice name shown as part name
    pub label: String,

    /// Divisions per quarter note
    pub divisions: usize,

    pub measures: Vec<ExportMeasure>,
}

/// One breve of the mensuration in force at its start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMeasure {
    /// 1-based measure number
    pub number: usize,

    /// Nominal length in divisions
    pub length: usize,

    pub events: Vec<ExportEvent>,
}

impl ExportMeasure {
    pub fn new(number: usize, length: usize) -> Self {
        Self {
            number,
            length,
            events: Vec::new(),
        }
    }

    /// Time occupied by notes and rests; chord members do not advance time
    pub fn filled(&self) -> usize {
        self.events.iter().map(ExportEvent::divisions).sum()
    }

    /// Whether the content fills the measure exactly
    pub fn validate(&self) -> bool {
        self.filled() == self.length
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExportEvent {
    Attributes(AttributesData),
    Note(NoteData),
    Rest(RestData),
}

impl ExportEvent {
    /// Time this item advances the measure by
    pub fn divisions(&self) -> usize {
        match self {
            ExportEvent::Note(note) if !note.chord => note.duration,
            ExportEvent::Rest(rest) => rest.duration,
            _ => 0,
        }
    }
}

/// Clef, key and time changes, each only when it differs from the previous
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributesData {
    pub clef: Option<ClefData>,

    /// Circle-of-fifths position (negative = flats)
    pub key_fifths: Option<i8>,

    pub time: Option<TimeData>,
}

impl AttributesData {
    pub fn is_empty(&self) -> bool {
        self.clef.is_none() && self.key_fifths.is_none() && self.time.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClefData {
    /// "G", "F" or "C"
    pub sign: char,

    /// Staff line counted from the bottom, 1-based
    pub line: u8,

    pub octave_change: i8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeData {
    pub beats: u32,
    pub beat_type: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchInfo {
    pub step: char,
    pub alter: i8,
    pub octave: i8,
}

/// Note or chord member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteData {
    pub pitch: PitchInfo,

    /// Duration in divisions
    pub duration: usize,

    /// Graphic type when the duration has a plain notation
    pub note_type: Option<String>,

    pub dots: usize,

    /// Sounds with the previous note
    pub chord: bool,

    pub tie_start: bool,

    pub tie_stop: bool,

    pub lyric: Option<LyricData>,

    /// Drawn colored in the source
    pub colored: bool,

    /// Corona in the source
    pub fermata: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestData {
    pub duration: usize,
    pub note_type: Option<String>,
    pub dots: usize,
}

/// Lyric data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricData {
    /// The syllable text
    pub syllable: String,

    /// Syllabic type: begin, middle, end, single
    pub syllabic: Syllabic,
}

/// Syllabic type for lyrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Syllabic {
    Single,
    Begin,
    Middle,
    End,
}

impl Syllabic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Syllabic::Single => "single",
            Syllabic::Begin => "begin",
            Syllabic::Middle => "middle",
            Syllabic::End => "end",
        }
    }
}
