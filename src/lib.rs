//! Mensural Engine
//!
//! Event model, contextual sweep, variant classification and staff layout for
//! mensural (white) notation, with MusicXML export.

pub mod models;
pub mod context;
pub mod variants;
pub mod renderers;
pub mod ir;
pub mod config;
pub mod error;
pub mod utils;

// Re-export commonly used types
pub use config::{CompareOptions, FlowMode, LayoutConfig};
pub use context::{ContextSweep, SweepReport};
pub use error::{ConfigError, Diagnostic, ExportError, ModelParseError};
pub use models::{Event, EventContext, EventKind, MusicSection, Piece, Proportion, VoiceEvents};
pub use renderers::{DisplayList, PartRenderer, TableMetrics};
pub use variants::{calc_variant_types, VariantTypes};
