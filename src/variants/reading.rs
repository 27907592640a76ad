//! Variant readings attached to a location in a voice
//!
//! A [`VariantBlock`] rides on a `VariantDataStart` event. The events between that
//! marker and the matching `VariantDataEnd` are the default reading; each
//! [`VariantReading`] in the block is an alternative used by one or more versions.

use super::compare::{calc_variant_types, VariantTypes};
use crate::config::CompareOptions;
use crate::context::ContextSweep;
use crate::error::Diagnostic;
use crate::models::events::{Event, EventContext};
use crate::models::proportion::Proportion;
use serde::{Deserialize, Serialize};

/// Identifier of a named source version within a piece
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionId(pub usize);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantReading {
    versions: Vec<VersionId>,
    events: Vec<Event>,
    /// Cached total music time of `events`
    length: Proportion,
    /// Difference from the default reading, filled by [`VariantBlock::compute_types`]
    types: VariantTypes,
    /// The reading is marked as a scribal error
    pub error: bool,
}

impl VariantReading {
    pub fn new(versions: Vec<VersionId>, events: Vec<Event>) -> Self {
        let length = events.iter().map(Event::music_time).sum();
        Self {
            versions,
            events,
            length,
            types: VariantTypes::NONE,
            error: false,
        }
    }

    pub fn versions(&self) -> &[VersionId] {
        &self.versions
    }

    pub fn includes(&self, version: VersionId) -> bool {
        self.versions.contains(&version)
    }

    pub fn add_version(&mut self, version: VersionId) {
        if !self.includes(version) {
            self.versions.push(version);
        }
    }

    pub fn remove_version(&mut self, version: VersionId) {
        self.versions.retain(|v| *v != version);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut Vec<Event> {
        &mut self.events
    }

    /// Refresh the cached length after editing `events`
    pub fn recompute_length(&mut self) {
        self.length = self.events.iter().map(Event::music_time).sum();
    }

    pub fn length(&self) -> Proportion {
        self.length
    }

    pub fn types(&self) -> VariantTypes {
        self.types
    }

    /// Stamp context on the reading's events, continuing from the anchor's context
    pub(crate) fn sweep_from(&mut self, sweep: &ContextSweep, start: &EventContext) -> Vec<Diagnostic> {
        sweep.run(&mut self.events, start).diagnostics
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantBlock {
    readings: Vec<VariantReading>,
}

impl VariantBlock {
    pub fn new(readings: Vec<VariantReading>) -> Self {
        Self { readings }
    }

    pub fn readings(&self) -> &[VariantReading] {
        &self.readings
    }

    pub fn readings_mut(&mut self) -> &mut Vec<VariantReading> {
        &mut self.readings
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Reading used by a version, or `None` when the version follows the default
    pub fn reading_for(&self, version: VersionId) -> Option<&VariantReading> {
        self.readings.iter().find(|r| r.includes(version))
    }

    /// Attach a reading, moving its versions out of any other reading in this block
    pub fn add_reading(&mut self, reading: VariantReading) {
        for existing in &mut self.readings {
            for v in reading.versions() {
                existing.remove_version(*v);
            }
        }
        self.readings.retain(|r| !r.versions.is_empty());
        self.readings.push(reading);
    }

    /// Classify every reading against the default events of this block
    pub fn compute_types(&mut self, default_events: &[Event], options: &CompareOptions) {
        for reading in &mut self.readings {
            reading.types = calc_variant_types(default_events, &reading.events, options);
        }
    }

    /// Union of all readings' difference categories
    pub fn combined_types(&self) -> VariantTypes {
        self.readings
            .iter()
            .fold(VariantTypes::NONE, |acc, r| acc | r.types)
    }
}
