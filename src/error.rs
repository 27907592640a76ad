//! Error and diagnostic types
//!
//! Nothing in the sweep, layout or comparison passes is fatal. Structural problems
//! found while walking an event list are reported as [`Diagnostic`] values (and logged
//! with `log::warn!` where they are detected); the pass continues with a best-effort
//! fallback. Only configuration loading, name parsing and XML emission return errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Non-fatal structural inconsistency found in an event list
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A ligated note with no following note closing the ligature
    #[error("ligature starting at event {index} is never terminated")]
    UnterminatedLigature { index: usize },

    /// Ligature rendering requested for a note whose status is not ligated
    #[error("event {index} rendered as ligature member but is not ligated")]
    LigatureOnUnligatedNote { index: usize },

    /// Variant block that encloses no events and carries no readings
    #[error("variant block at event {index} encloses no events")]
    EmptyVariantBlock { index: usize },

    /// Variant start without end, or end without start
    #[error("unbalanced variant marker at event {index}")]
    UnbalancedVariantMarker { index: usize },

    /// Lacuna start without end, or end without start
    #[error("unbalanced lacuna marker at event {index}")]
    UnbalancedLacuna { index: usize },

    /// Incipit justification requested for a voice with no ellipsis marker
    #[error("voice {voice} has no ellipsis marker; whole voice treated as incipit")]
    MissingEllipsis { voice: usize },
}

/// Invalid layout configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config JSON could not be parsed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("min_padding ({min}) exceeds max_padding ({max})")]
    PaddingRange { min: f32, max: f32 },

    #[error("staff width must be positive, got {0}")]
    StaffWidth(f32),

    #[error("groups_per_staff must be at least 1")]
    GroupsPerStaff,
}

/// Failures while parsing textual names of model values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelParseError {
    #[error("invalid pitch name: {0}")]
    Pitch(String),

    #[error("unknown clef name: {0}")]
    Clef(String),

    #[error("proportion {0}/0 has a zero denominator")]
    ZeroDenominator(i64),
}

/// Export projection failures
#[derive(Debug, Clone, Error)]
pub enum ExportError {
    #[error("nothing to export: piece has no voices with events")]
    EmptyScore,

    #[error("XML writer failed: {0}")]
    Xml(String),

    #[error("exported XML is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}
