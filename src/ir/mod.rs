//! Intermediate Representation (IR) Module
//!
//! A format-agnostic tree of parts and measures that sits between swept voices and
//! format emitters:
//!
//! ```text
//! Piece (swept voices)
//!     ↓
//! IR Builder (measure projection)
//!     ↓
//! IR Types (format-agnostic representation)
//!     ↓
//! Format Emitters (MusicXML)
//! ```

pub mod builder;
pub mod types;

pub use builder::{build_export_part, build_export_score, divisions_for};
pub use types::{
    AttributesData, ClefData, ExportEvent, ExportMeasure, ExportPart, ExportScore, LyricData, NoteData, PitchInfo,
    RestData, Syllabic, TimeData,
};
