//! Glyph metrics capability
//!
//! The layout engine never measures glyphs itself. It asks a [`GlyphMetrics`]
//! implementation for the width of a symbol; real renderers back this with font data,
//! while [`TableMetrics`] is a fixed lookup table useful for tests and headless layout.

use crate::models::clef::ClefType;
use crate::models::events::{Event, EventKind};
use crate::models::mensuration::NoteType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Drawable symbol whose width the layout needs
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    Note(NoteType),
    Rest(NoteType),
    Clef(ClefType),
    MensurationSign,
    Dot,
    Custos,
    Barline,
    LineEnd,
    Lacuna,
    Ellipsis,
}

/// Width provider queried by the layout engine
pub trait GlyphMetrics {
    fn symbol_width(&self, symbol: Symbol) -> f32;

    fn text_width(&self, text: &str) -> f32;

    /// Rendered width of one event. Non-spacing markers take no width; a
    /// simultaneity is as wide as its widest member.
    fn event_width(&self, event: &Event) -> f32 {
        match &event.kind {
            EventKind::Note(note) => self.symbol_width(Symbol::Note(note.note_type)),
            EventKind::Rest(rest) => self.symbol_width(Symbol::Rest(rest.note_type)),
            EventKind::Clef(clef) => self.symbol_width(Symbol::Clef(clef.clef_type)),
            EventKind::Mensuration(mens) => {
                self.symbol_width(Symbol::MensurationSign) * mens.signs.len().max(1) as f32
            }
            EventKind::Dot { .. } => self.symbol_width(Symbol::Dot),
            EventKind::Custos(_) => self.symbol_width(Symbol::Custos),
            EventKind::LineEnd { .. } => self.symbol_width(Symbol::LineEnd),
            EventKind::Barline(barline) => self.symbol_width(Symbol::Barline) * f32::from(barline.num_lines.max(1)),
            EventKind::Lacuna { .. } => self.symbol_width(Symbol::Lacuna),
            EventKind::Ellipsis => self.symbol_width(Symbol::Ellipsis),
            EventKind::Multi(members) => members.iter().map(|m| self.event_width(m)).fold(0.0, f32::max),
            EventKind::Annotation { .. }
            | EventKind::OriginalText { .. }
            | EventKind::ColorChange(_)
            | EventKind::Proportion(_)
            | EventKind::ModernKeySignature(_)
            | EventKind::VariantDataStart(_)
            | EventKind::VariantDataEnd
            | EventKind::LacunaEnd
            | EventKind::SectionEnd => 0.0,
        }
    }
}

/// Table-driven metrics with a fallback width
#[derive(Clone, Debug)]
pub struct TableMetrics {
    widths: HashMap<Symbol, f32>,
    default_width: f32,
    char_width: f32,
}

impl TableMetrics {
    /// Empty table: every symbol measures `default_width`
    pub fn uniform(default_width: f32) -> Self {
        Self {
            widths: HashMap::new(),
            default_width,
            char_width: default_width / 2.0,
        }
    }

    pub fn with_width(mut self, symbol: Symbol, width: f32) -> Self {
        self.widths.insert(symbol, width);
        self
    }

    pub fn set_width(&mut self, symbol: Symbol, width: f32) {
        self.widths.insert(symbol, width);
    }
}

impl Default for TableMetrics {
    fn default() -> Self {
        let mut metrics = TableMetrics::uniform(10.0);
        for nt in [NoteType::Maxima, NoteType::Longa, NoteType::Brevis] {
            metrics.set_width(Symbol::Note(nt), 14.0);
            metrics.set_width(Symbol::Rest(nt), 6.0);
        }
        for ct in [ClefType::C, ClefType::F, ClefType::G, ClefType::Gamma, ClefType::FRound, ClefType::FSquare] {
            metrics.set_width(Symbol::Clef(ct), 14.0);
        }
        for ct in [ClefType::Bmol, ClefType::BmolDouble, ClefType::Bqua, ClefType::Diesis] {
            metrics.set_width(Symbol::Clef(ct), 8.0);
        }
        metrics
            .with_width(Symbol::MensurationSign, 12.0)
            .with_width(Symbol::Dot, 4.0)
            .with_width(Symbol::Custos, 8.0)
            .with_width(Symbol::Barline, 4.0)
            .with_width(Symbol::LineEnd, 0.0)
            .with_width(Symbol::Lacuna, 20.0)
            .with_width(Symbol::Ellipsis, 16.0)
    }
}

impl GlyphMetrics for TableMetrics {
    fn symbol_width(&self, symbol: Symbol) -> f32 {
        self.widths.get(&symbol).copied().unwrap_or(self.default_width)
    }

    fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.char_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::events::NoteEvent;
    use crate::models::pitch::{NoteLetter, Pitch};
    use crate::models::proportion::Proportion;

    #[test]
    fn test_table_lookup_and_fallback() {
        let m = TableMetrics::uniform(10.0).with_width(Symbol::Dot, 3.0);
        assert_eq!(m.symbol_width(Symbol::Dot), 3.0);
        assert_eq!(m.symbol_width(Symbol::Custos), 10.0);
        assert_eq!(m.text_width("Kyrie"), 25.0);
    }

    #[test]
    fn test_event_widths() {
        let m = TableMetrics::default();
        let g4 = Pitch::new(NoteLetter::G, 4);
        let brevis = Event::note(NoteEvent::new(NoteType::Brevis, Proportion::whole(4), g4));
        let minim = Event::note(NoteEvent::new(NoteType::Minima, Proportion::ONE, g4));
        assert_eq!(m.event_width(&brevis), 14.0);
        assert_eq!(m.event_width(&Event::multi(vec![minim.clone(), brevis])), 14.0);
        assert_eq!(m.event_width(&Event::original_text("Gloria")), 0.0);
        assert_eq!(m.event_width(&Event::proportion(Proportion::new(3, 2))), 0.0);
    }
}
