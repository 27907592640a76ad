//! Display List for staff rendering
//!
//! This module defines the output handed to an external renderer: for every voice,
//! its staves, and on each staff the positioned events together with the context
//! resolved for them. Glyph choice and drawing happen outside this crate.

use super::layout_engine::{PositionedGroup, StaffLayout};
use crate::error::Diagnostic;
use crate::models::clef::Clef;
use crate::models::clef_set::ClefSet;
use crate::models::coloration::Coloration;
use crate::models::key_signature::ModernKeySignature;
use crate::models::mensuration::Mensuration;
use crate::models::proportion::Proportion;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Top-level display list
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DisplayList {
    pub title: String,

    pub composer: String,

    /// Voices of every section, in section order
    pub voices: Vec<RenderedVoice>,
}

impl DisplayList {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.voices.iter().flat_map(|v| v.diagnostics.iter())
    }
}

/// One voice of one section
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RenderedVoice {
    pub voice: usize,

    pub section: usize,

    pub staves: Vec<RenderedStaff>,

    /// Structural problems met while laying out this voice
    pub diagnostics: Vec<Diagnostic>,
}

/// Where a rendered item comes from
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum RenderedSource {
    /// Index into the voice's event list
    Event(usize),
    /// Clef re-emitted at the start of a staff
    LeadingClef(Clef),
}

/// A positioned item with the context resolved for it
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RenderedEvent {
    pub source: RenderedSource,

    /// Left edge
    pub x: f32,

    pub width: f32,

    pub clef_set: Option<Arc<ClefSet>>,

    pub mensuration: Mensuration,

    pub coloration: Coloration,

    pub key_signature: Arc<ModernKeySignature>,

    pub proportion: Proportion,

    /// Editorial supply inside a lacuna
    pub editorial: bool,
}

impl RenderedEvent {
    pub fn event_index(&self) -> Option<usize> {
        match self.source {
            RenderedSource::Event(i) => Some(i),
            RenderedSource::LeadingClef(_) => None,
        }
    }
}

/// One staff line of a voice
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RenderedStaff {
    pub layout: StaffLayout,

    /// Leading clef items followed by one item per event, in x order
    pub events: Vec<RenderedEvent>,

    /// Last staff of a voice split into staves; its padding stays within the
    /// configured bounds. Incipit staves are never last.
    pub is_last: bool,

    /// The staff ends with a page break in the source
    pub page_end: bool,

    /// Width reserved for the incipit when voices were aligned at an ellipsis
    pub incipit_width: Option<f32>,
}

impl RenderedStaff {
    pub fn total_x_size(&self) -> f32 {
        self.layout.total_x_size
    }

    /// Group containing event `index`; `None` if not on this staff
    pub fn group_for_event(&self, index: usize) -> Option<&PositionedGroup> {
        self.layout.group_for_event(index)
    }

    /// Rendered item for event `index`; `None` if not on this staff
    pub fn event(&self, index: usize) -> Option<&RenderedEvent> {
        self.events.iter().find(|e| e.event_index() == Some(index))
    }

    pub fn leading_clefs(&self) -> impl Iterator<Item = &Clef> {
        self.events.iter().filter_map(|e| match &e.source {
            RenderedSource::LeadingClef(clef) => Some(clef),
            RenderedSource::Event(_) => None,
        })
    }
}
