//! MusicXML export module
//!
//! Provides MusicXML 3.1 export of the format-neutral tree built in `crate::ir`.
//!
//! # Module Structure
//!
//! - **duration**: Duration to note type conversion
//! - **emitter**: MusicXML document emitter (consumes the tree from `crate::ir`)

pub mod duration;
pub mod emitter;

pub use duration::duration_to_note_type;
pub use emitter::emit_musicxml;

use crate::error::ExportError;
use crate::models::voice::Piece;

/// Build the export tree for a piece and emit it as MusicXML
pub fn to_musicxml(piece: &Piece) -> Result<String, ExportError> {
    let score = crate::ir::build_export_score(piece)?;
    emit_musicxml(&score)
}
