//! Models module for the mensural engine
//!
//! Value types (proportions, pitches, clefs, mensurations), the event sum type and
//! the voice/section/piece containers that hold event lists.

pub mod proportion;
pub mod mensuration;
pub mod pitch;
pub mod clef;
pub mod clef_set;
pub mod key_signature;
pub mod coloration;
pub mod events;
pub mod voice;

// Re-export commonly used types
pub use proportion::Proportion;
pub use mensuration::{Division, MensSign, MensSymbol, Mensuration, MensurationLevel, NoteType};
pub use pitch::{Accidental, NoteLetter, Pitch};
pub use clef::{Clef, ClefType, ModernClef};
pub use clef_set::ClefSet;
pub use key_signature::{KeySignatureElement, ModernKeySignature};
pub use coloration::{Color, ColorSpec, Coloration, Fill};
pub use events::{
    BarlineEvent, DotKind, Event, EventContext, EventKind, EventType, LigStatus, MensEvent, ModernText,
    NoteEvent, RestEvent, Stem, StemDirection, StemSide,
};
pub use voice::{EditOutcome, MusicSection, Piece, VariantVersion, VoiceEvents, VoiceInfo};
