//! Musical events
//!
//! A voice is an ordered list of [`Event`]s. The kind of event is a closed sum type
//! ([`EventKind`]); every event also carries an [`EventContext`] describing the clef
//! set, mensuration, coloration, key signature and proportion in force at that point.
//! The context is written only by the contextual sweep (`crate::context`) and is
//! meaningless until a sweep has run over the list.

use super::clef::Clef;
use super::clef_set::ClefSet;
use super::coloration::Coloration;
use super::key_signature::ModernKeySignature;
use super::mensuration::{MensSign, Mensuration, NoteType};
use super::pitch::{Accidental, Pitch};
use super::proportion::Proportion;
use crate::variants::VariantBlock;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::sync::Arc;

/// Numeric tag for each event kind, matching the event file format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum EventType {
    Note = 1,
    Rest = 2,
    Clef = 3,
    Mensuration = 4,
    Dot = 5,
    Proportion = 6,
    ColorChange = 7,
    Custos = 8,
    LineEnd = 9,
    Barline = 10,
    Annotation = 11,
    OriginalText = 12,
    Lacuna = 13,
    LacunaEnd = 14,
    ModernKeySignature = 15,
    Multi = 16,
    Ellipsis = 17,
    VariantDataStart = 18,
    VariantDataEnd = 19,
    SectionEnd = 20,
}

/// Context in force at an event, stamped by the sweep
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    /// `None` until a clef has been seen
    pub clef_set: Option<Arc<ClefSet>>,
    /// Index of the clef event that last changed `clef_set`
    pub clef_event: Option<usize>,
    pub mensuration: Mensuration,
    /// Index of the mensuration event in force
    pub mens_event: Option<usize>,
    pub coloration: Coloration,
    pub key_signature: Arc<ModernKeySignature>,
    pub proportion: Proportion,
    /// Inside a lacuna: the event is an editorial supply
    pub editorial: bool,
    /// Written music time (minims) from the start of the list
    pub onset: Proportion,
}

impl Default for EventContext {
    fn default() -> Self {
        Self {
            clef_set: None,
            clef_event: None,
            mensuration: Mensuration::default(),
            mens_event: None,
            coloration: Coloration::DEFAULT,
            key_signature: Arc::new(ModernKeySignature::new()),
            proportion: Proportion::ONE,
            editorial: false,
            onset: Proportion::ZERO,
        }
    }
}

impl EventContext {
    pub fn principal_clef(&self) -> Option<&Clef> {
        self.clef_set.as_deref().and_then(ClefSet::principal)
    }

    pub fn with_clef_set(mut self, set: ClefSet) -> Self {
        self.key_signature = Arc::new(set.key_signature().clone());
        self.clef_set = Some(Arc::new(set));
        self
    }

    pub fn with_mensuration(mut self, mensuration: Mensuration) -> Self {
        self.mensuration = mensuration;
        self
    }

    pub fn with_coloration(mut self, coloration: Coloration) -> Self {
        self.coloration = coloration;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LigStatus {
    None,
    Recta,
    Obliqua,
}

impl LigStatus {
    /// Connected to the following note
    pub fn is_ligated(&self) -> bool {
        !matches!(self, LigStatus::None)
    }
}

impl Default for LigStatus {
    fn default() -> Self {
        LigStatus::None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StemDirection {
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StemSide {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stem {
    pub direction: StemDirection,
    pub side: StemSide,
}

/// Modern text syllable attached to a note
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModernText {
    pub syllable: String,
    pub word_end: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub note_type: NoteType,
    /// Written music time in minims
    pub length: Proportion,
    pub pitch: Pitch,
    pub ligature: LigStatus,
    pub colored: bool,
    pub stem: Option<Stem>,
    pub flags: u8,
    pub accidental: Option<Accidental>,
    pub corona: bool,
    pub signum: bool,
    pub tie: bool,
    pub text: Option<ModernText>,
}

impl NoteEvent {
    pub fn new(note_type: NoteType, length: Proportion, pitch: Pitch) -> Self {
        Self {
            note_type,
            length,
            pitch,
            ligature: LigStatus::None,
            colored: false,
            stem: None,
            flags: 0,
            accidental: None,
            corona: false,
            signum: false,
            tie: false,
            text: None,
        }
    }

    /// Note at its default length under a mensuration
    pub fn with_default_length(note_type: NoteType, pitch: Pitch, mensuration: &Mensuration) -> Self {
        Self::new(note_type, mensuration.note_length(note_type), pitch)
    }

    pub fn ligated(mut self, status: LigStatus) -> Self {
        self.ligature = status;
        self
    }

    pub fn colored(mut self) -> Self {
        self.colored = true;
        self
    }

    pub fn with_accidental(mut self, accidental: Accidental) -> Self {
        self.accidental = Some(accidental);
        self
    }

    pub fn with_text(mut self, syllable: &str, word_end: bool) -> Self {
        self.text = Some(ModernText {
            syllable: syllable.to_string(),
            word_end,
        });
        self
    }

    pub fn with_stem(mut self, direction: StemDirection, side: StemSide) -> Self {
        self.stem = Some(Stem { direction, side });
        self
    }

    pub fn tied(mut self) -> Self {
        self.tie = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestEvent {
    pub note_type: NoteType,
    pub length: Proportion,
    /// Staff location of the rest's lowest point
    pub bottom_line: i32,
    /// Number of spaces a long rest spans
    pub num_spaces: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MensEvent {
    pub signs: Vec<MensSign>,
    pub mensuration: Mensuration,
    pub staff_location: i32,
    pub small: bool,
    pub vertical: bool,
}

impl MensEvent {
    /// Sign with its conventional mensuration
    pub fn from_signs(signs: Vec<MensSign>) -> Self {
        let mensuration = super::mensuration::implied_mensuration(&signs);
        Self {
            signs,
            mensuration,
            staff_location: 4,
            small: false,
            vertical: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DotKind {
    /// Adds half the value of the preceding note; drawn glued to it
    Addition,
    /// Separates perfections; spaced on its own
    Division,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarlineEvent {
    pub num_lines: u8,
    pub repeat: bool,
    pub bottom: i32,
    pub top: i32,
}

impl Default for BarlineEvent {
    fn default() -> Self {
        Self {
            num_lines: 1,
            repeat: false,
            bottom: 0,
            top: 8,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    Note(NoteEvent),
    Rest(RestEvent),
    Clef(Clef),
    Mensuration(MensEvent),
    Dot { kind: DotKind, staff_position: i32 },
    Proportion(Proportion),
    ColorChange(Coloration),
    Custos(Pitch),
    LineEnd { page_end: bool },
    Barline(BarlineEvent),
    Annotation { text: String, staff_position: i32 },
    OriginalText { text: String },
    Lacuna { length: Proportion },
    LacunaEnd,
    ModernKeySignature(ModernKeySignature),
    /// Simultaneous sub-events sharing one slot
    Multi(Vec<Event>),
    Ellipsis,
    VariantDataStart(VariantBlock),
    VariantDataEnd,
    SectionEnd,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    /// Drawn at the same x as the preceding event
    #[serde(default)]
    pub display_aligned: bool,
    #[serde(default)]
    pub context: EventContext,
}

impl From<EventKind> for Event {
    fn from(kind: EventKind) -> Self {
        Event::new(kind)
    }
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            display_aligned: false,
            context: EventContext::default(),
        }
    }

    pub fn note(note: NoteEvent) -> Self {
        Self::new(EventKind::Note(note))
    }

    pub fn rest(note_type: NoteType, length: Proportion) -> Self {
        Self::new(EventKind::Rest(RestEvent {
            note_type,
            length,
            bottom_line: 2,
            num_spaces: 1,
        }))
    }

    pub fn clef(clef: Clef) -> Self {
        Self::new(EventKind::Clef(clef))
    }

    pub fn mensuration(mens: MensEvent) -> Self {
        Self::new(EventKind::Mensuration(mens))
    }

    pub fn dot(kind: DotKind, staff_position: i32) -> Self {
        Self::new(EventKind::Dot { kind, staff_position })
    }

    pub fn proportion(proportion: Proportion) -> Self {
        Self::new(EventKind::Proportion(proportion))
    }

    pub fn color_change(coloration: Coloration) -> Self {
        Self::new(EventKind::ColorChange(coloration))
    }

    pub fn custos(pitch: Pitch) -> Self {
        Self::new(EventKind::Custos(pitch))
    }

    pub fn line_end(page_end: bool) -> Self {
        Self::new(EventKind::LineEnd { page_end })
    }

    pub fn barline() -> Self {
        Self::new(EventKind::Barline(BarlineEvent::default()))
    }

    pub fn annotation(text: &str, staff_position: i32) -> Self {
        Self::new(EventKind::Annotation {
            text: text.to_string(),
            staff_position,
        })
    }

    pub fn original_text(text: &str) -> Self {
        Self::new(EventKind::OriginalText { text: text.to_string() })
    }

    pub fn lacuna(length: Proportion) -> Self {
        Self::new(EventKind::Lacuna { length })
    }

    pub fn lacuna_end() -> Self {
        Self::new(EventKind::LacunaEnd)
    }

    pub fn key_signature(signature: ModernKeySignature) -> Self {
        Self::new(EventKind::ModernKeySignature(signature))
    }

    pub fn multi(events: Vec<Event>) -> Self {
        Self::new(EventKind::Multi(events))
    }

    pub fn ellipsis() -> Self {
        Self::new(EventKind::Ellipsis)
    }

    pub fn variant_start(block: VariantBlock) -> Self {
        Self::new(EventKind::VariantDataStart(block))
    }

    pub fn variant_end() -> Self {
        Self::new(EventKind::VariantDataEnd)
    }

    pub fn section_end() -> Self {
        Self::new(EventKind::SectionEnd)
    }

    pub fn aligned(mut self) -> Self {
        self.display_aligned = true;
        self
    }

    pub fn event_type(&self) -> EventType {
        match &self.kind {
            EventKind::Note(_) => EventType::Note,
            EventKind::Rest(_) => EventType::Rest,
            EventKind::Clef(_) => EventType::Clef,
            EventKind::Mensuration(_) => EventType::Mensuration,
            EventKind::Dot { .. } => EventType::Dot,
            EventKind::Proportion(_) => EventType::Proportion,
            EventKind::ColorChange(_) => EventType::ColorChange,
            EventKind::Custos(_) => EventType::Custos,
            EventKind::LineEnd { .. } => EventType::LineEnd,
            EventKind::Barline(_) => EventType::Barline,
            EventKind::Annotation { .. } => EventType::Annotation,
            EventKind::OriginalText { .. } => EventType::OriginalText,
            EventKind::Lacuna { .. } => EventType::Lacuna,
            EventKind::LacunaEnd => EventType::LacunaEnd,
            EventKind::ModernKeySignature(_) => EventType::ModernKeySignature,
            EventKind::Multi(_) => EventType::Multi,
            EventKind::Ellipsis => EventType::Ellipsis,
            EventKind::VariantDataStart(_) => EventType::VariantDataStart,
            EventKind::VariantDataEnd => EventType::VariantDataEnd,
            EventKind::SectionEnd => EventType::SectionEnd,
        }
    }

    /// Written duration in minims; simultaneous events last as long as their longest member
    pub fn music_time(&self) -> Proportion {
        match &self.kind {
            EventKind::Note(n) => n.length,
            EventKind::Rest(r) => r.length,
            EventKind::Lacuna { length } => *length,
            EventKind::Multi(events) => events
                .iter()
                .map(Event::music_time)
                .fold(Proportion::ZERO, Proportion::max),
            _ => Proportion::ZERO,
        }
    }

    /// Markers that share the horizontal slot of whatever follows them
    pub fn is_non_spacing(&self) -> bool {
        matches!(
            self.kind,
            EventKind::Annotation { .. }
                | EventKind::OriginalText { .. }
                | EventKind::ColorChange(_)
                | EventKind::Proportion(_)
                | EventKind::ModernKeySignature(_)
                | EventKind::VariantDataStart(_)
                | EventKind::VariantDataEnd
        )
    }

    /// Inserting or deleting this event invalidates context stamped downstream
    pub fn requires_resweep(&self) -> bool {
        match &self.kind {
            EventKind::Clef(clef) => clef.signature,
            EventKind::Mensuration(_)
            | EventKind::ColorChange(_)
            | EventKind::Proportion(_)
            | EventKind::ModernKeySignature(_)
            | EventKind::Lacuna { .. }
            | EventKind::LacunaEnd
            | EventKind::VariantDataStart(_)
            | EventKind::VariantDataEnd => true,
            EventKind::Multi(events) => events.iter().any(Event::requires_resweep),
            _ => false,
        }
    }

    pub fn as_note(&self) -> Option<&NoteEvent> {
        match &self.kind {
            EventKind::Note(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_note_mut(&mut self) -> Option<&mut NoteEvent> {
        match &mut self.kind {
            EventKind::Note(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_clef(&self) -> Option<&Clef> {
        match &self.kind {
            EventKind::Clef(c) => Some(c),
            _ => None,
        }
    }

    /// Clefs carried by this event, including those inside a simultaneity
    pub fn clefs(&self) -> Vec<&Clef> {
        match &self.kind {
            EventKind::Clef(c) => vec![c],
            EventKind::Multi(events) => events.iter().flat_map(Event::clefs).collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_clef_bearing(&self) -> bool {
        !self.clefs().is_empty()
    }

    /// Notes carried by this event, including those inside a simultaneity
    pub fn notes(&self) -> Vec<&NoteEvent> {
        match &self.kind {
            EventKind::Note(n) => vec![n],
            EventKind::Multi(events) => events.iter().flat_map(Event::notes).collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_ligated_note(&self) -> bool {
        self.as_note().map_or(false, |n| n.ligature.is_ligated())
    }

    /// Principal clef that starts a new clef set
    pub fn is_principal_clef(&self) -> bool {
        self.as_clef().map_or(false, Clef::is_principal)
    }
}
