//! Renderers module for the mensural engine
//!
//! Event grouping, horizontal staff layout and the display list handed to an
//! external drawing layer, plus MusicXML export.

pub mod metrics;
pub mod grouping;
pub mod layout_engine;
pub mod display_list;
pub mod part_renderer;
pub mod musicxml;

// Re-export commonly used types
pub use metrics::{GlyphMetrics, Symbol, TableMetrics};
pub use grouping::{group_events, GroupType, Grouping, RenderedEventGroup};
pub use layout_engine::{LayoutEngine, LeadingSlot, PositionedGroup, StaffLayout};
pub use display_list::{DisplayList, RenderedEvent, RenderedSource, RenderedStaff, RenderedVoice};
pub use part_renderer::PartRenderer;
pub use musicxml::{emit_musicxml, to_musicxml};
