//! Voices, sections and pieces
//!
//! [`VoiceEvents`] owns one voice's chronological event list within a section and
//! keeps its stamped context valid across edits. A [`MusicSection`] holds one optional
//! list per voice; a [`Piece`] holds the sections plus the voice and version registries.

use super::clef::Clef;
use super::coloration::Coloration;
use super::events::{Event, EventContext, EventKind};
use super::proportion::Proportion;
use crate::config::CompareOptions;
use crate::context::{ContextSweep, SweepReport};
use crate::error::Diagnostic;
use crate::variants::VersionId;
use serde::{Deserialize, Serialize};

/// What an edit did to the stamped context
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditOutcome {
    /// The edit touched a context-bearing event
    pub requires_resweep: bool,
    /// Present when a retained start context allowed an automatic re-sweep
    pub report: Option<SweepReport>,
}

/// One voice's events in one section
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoiceEvents {
    voice: usize,
    events: Vec<Event>,
    /// Start context of the last sweep, retained for automatic re-sweeps
    #[serde(skip)]
    start: Option<EventContext>,
    #[serde(skip)]
    use_modern_clefs: bool,
}

impl VoiceEvents {
    pub fn new(voice: usize, events: Vec<Event>) -> Self {
        Self {
            voice,
            events,
            start: None,
            use_modern_clefs: false,
        }
    }

    pub fn voice(&self) -> usize {
        self.voice
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event at `index`; `None` outside the list
    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    /// Stamped context at `index`; `None` outside the list
    pub fn context_at(&self, index: usize) -> Option<&EventContext> {
        self.events.get(index).map(|e| &e.context)
    }

    /// Start context retained from the last sweep
    pub fn start_context(&self) -> Option<&EventContext> {
        self.start.as_ref()
    }

    /// Stamp context on every event and retain `start` for later edits
    pub fn sweep(&mut self, sweep: &ContextSweep, start: EventContext) -> SweepReport {
        let report = sweep.run(&mut self.events, &start);
        self.start = Some(start);
        self.use_modern_clefs = sweep.uses_modern_clefs();
        report
    }

    /// Re-run the last sweep; `None` if the voice was never swept
    pub fn resweep(&mut self) -> Option<SweepReport> {
        let start = self.start.as_ref()?;
        let sweep = ContextSweep::new().with_modern_clefs(self.use_modern_clefs);
        Some(sweep.run(&mut self.events, start))
    }

    /// Insert at `index` (clamped to the end of the list)
    pub fn insert(&mut self, index: usize, event: Event) -> EditOutcome {
        let index = index.min(self.events.len());
        let requires_resweep = event.requires_resweep();
        self.events.insert(index, event);
        self.after_edit(index, requires_resweep)
    }

    /// Remove the event at `index`; `None` outside the list
    pub fn remove(&mut self, index: usize) -> Option<(Event, EditOutcome)> {
        if index >= self.events.len() {
            return None;
        }
        let removed = self.events.remove(index);
        let outcome = self.after_edit(index, removed.requires_resweep());
        Some((removed, outcome))
    }

    /// Replace the event at `index`; `None` outside the list
    pub fn replace(&mut self, index: usize, event: Event) -> Option<(Event, EditOutcome)> {
        let slot = self.events.get_mut(index)?;
        let removed = std::mem::replace(slot, event);
        let requires_resweep = crate::context::edit_requires_resweep(Some(&removed), self.events.get(index));
        let outcome = self.after_edit(index, requires_resweep);
        Some((removed, outcome))
    }

    fn after_edit(&mut self, index: usize, requires_resweep: bool) -> EditOutcome {
        if self.start.is_none() {
            if requires_resweep {
                log::debug!("voice {}: edit at {} leaves context stale until swept", self.voice, index);
            }
            return EditOutcome {
                requires_resweep,
                report: None,
            };
        }
        if requires_resweep {
            return EditOutcome {
                requires_resweep,
                report: self.resweep(),
            };
        }
        self.restamp_local(index);
        EditOutcome::default()
    }

    /// Give an edited slot its predecessor's context and shift later onsets
    fn restamp_local(&mut self, index: usize) {
        if let Some(ctx) = self.context_after(index) {
            if let Some(event) = self.events.get_mut(index) {
                set_context(event, &ctx);
            }
        }
        self.retime_from(index);
    }

    /// Context in force just before `index`
    fn context_after(&self, index: usize) -> Option<EventContext> {
        if index == 0 {
            return self.start.clone();
        }
        let prev = self.events.get(index - 1)?;
        let mut ctx = prev.context.clone();
        if matches!(prev.kind, EventKind::LacunaEnd) {
            ctx.editorial = false;
        }
        Some(ctx)
    }

    fn retime_from(&mut self, index: usize) {
        let mut onset = match index.checked_sub(1).and_then(|i| self.events.get(i)) {
            Some(prev) => prev.context.onset + prev.music_time(),
            None => self.start.as_ref().map_or(Proportion::ZERO, |s| s.onset),
        };
        for event in self.events.iter_mut().skip(index) {
            set_onset(event, onset);
            onset += event.music_time();
        }
    }

    /// Index of the ellipsis that ends the incipit
    pub fn ellipsis_index(&self) -> Option<usize> {
        self.events.iter().position(|e| matches!(e.kind, EventKind::Ellipsis))
    }

    /// Balanced (start, end) index pairs of variant markers
    pub fn variant_spans(&self) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut open = None;
        for (i, event) in self.events.iter().enumerate() {
            match event.kind {
                EventKind::VariantDataStart(_) => open = Some(i),
                EventKind::VariantDataEnd => {
                    if let Some(start) = open.take() {
                        spans.push((start, i));
                    }
                }
                _ => {}
            }
        }
        spans
    }

    /// Classify every variant reading against the default events it replaces
    pub fn compute_variant_types(&mut self, options: &CompareOptions) {
        for (start, end) in self.variant_spans() {
            let (head, tail) = self.events.split_at_mut(start + 1);
            let default_events = &tail[..end - start - 1];
            if let EventKind::VariantDataStart(block) = &mut head[start].kind {
                block.compute_types(default_events, options);
            }
        }
    }

    /// Total written music time
    pub fn total_length(&self) -> Proportion {
        self.events.iter().map(Event::music_time).sum()
    }
}

fn set_context(event: &mut Event, ctx: &EventContext) {
    event.context = ctx.clone();
    if let EventKind::Multi(members) = &mut event.kind {
        for member in members {
            set_context(member, ctx);
        }
    }
}

fn set_onset(event: &mut Event, onset: Proportion) {
    event.context.onset = onset;
    if let EventKind::Multi(members) = &mut event.kind {
        for member in members {
            set_onset(member, onset);
        }
    }
}

/// Voice-level metadata
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub name: String,
    /// Modern clef to display regardless of the written clefs
    pub suggested_modern_clef: Option<Clef>,
}

impl VoiceInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            suggested_modern_clef: None,
        }
    }
}

/// A named source version
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantVersion {
    pub id: VersionId,
    pub name: String,
    pub source: Option<String>,
    /// The version that follows the default reading everywhere
    pub default: bool,
    /// Voices this source does not transmit
    pub missing_voices: Vec<usize>,
}

impl VariantVersion {
    pub fn is_missing_voice(&self, voice: usize) -> bool {
        self.missing_voices.contains(&voice)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MusicSection {
    voices: Vec<Option<VoiceEvents>>,
    pub base_coloration: Coloration,
}

impl MusicSection {
    pub fn new(num_voices: usize) -> Self {
        Self {
            voices: vec![None; num_voices],
            base_coloration: Coloration::DEFAULT,
        }
    }

    pub fn num_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn voice(&self, voice: usize) -> Option<&VoiceEvents> {
        self.voices.get(voice).and_then(Option::as_ref)
    }

    pub fn voice_mut(&mut self, voice: usize) -> Option<&mut VoiceEvents> {
        self.voices.get_mut(voice).and_then(Option::as_mut)
    }

    /// Set a voice's events, growing the voice table if needed
    pub fn set_voice(&mut self, events: VoiceEvents) {
        let voice = events.voice();
        if voice >= self.voices.len() {
            self.voices.resize(voice + 1, None);
        }
        self.voices[voice] = Some(events);
    }

    /// Voices with events, in voice order
    pub fn present_voices(&self) -> impl Iterator<Item = &VoiceEvents> {
        self.voices.iter().flatten()
    }

    /// Event list as one version reads it: each variant span is replaced by that
    /// version's reading, or by the default events if it has none. Markers are dropped.
    pub fn events_for_version(&self, voice: usize, version: VersionId) -> Option<Vec<Event>> {
        let source = self.voice(voice)?;
        let mut out = Vec::with_capacity(source.len());
        let mut skipping_default = false;
        for event in source.events() {
            match &event.kind {
                EventKind::VariantDataStart(block) => {
                    if let Some(reading) = block.reading_for(version) {
                        out.extend(reading.events().iter().cloned());
                        skipping_default = true;
                    }
                }
                EventKind::VariantDataEnd => skipping_default = false,
                _ if skipping_default => {}
                _ => out.push(event.clone()),
            }
        }
        Some(out)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    pub title: String,
    pub composer: String,
    pub voices: Vec<VoiceInfo>,
    pub versions: Vec<VariantVersion>,
    pub sections: Vec<MusicSection>,
}

impl Piece {
    pub fn new(title: &str, composer: &str) -> Self {
        Self {
            title: title.to_string(),
            composer: composer.to_string(),
            ..Self::default()
        }
    }

    pub fn add_voice(&mut self, info: VoiceInfo) -> usize {
        self.voices.push(info);
        self.voices.len() - 1
    }

    pub fn add_version(&mut self, name: &str, source: Option<&str>) -> VersionId {
        let id = VersionId(self.versions.len());
        self.versions.push(VariantVersion {
            id,
            name: name.to_string(),
            source: source.map(str::to_string),
            default: self.versions.is_empty(),
            missing_voices: Vec::new(),
        });
        id
    }

    pub fn version(&self, id: VersionId) -> Option<&VariantVersion> {
        self.versions.iter().find(|v| v.id == id)
    }

    pub fn version_by_name(&self, name: &str) -> Option<&VariantVersion> {
        self.versions.iter().find(|v| v.name == name)
    }

    pub fn default_version(&self) -> Option<&VariantVersion> {
        self.versions.iter().find(|v| v.default)
    }

    /// Sweep every voice of every section. Each voice starts a section with the
    /// context its previous section ended in, at onset zero.
    pub fn sweep_all(&mut self, sweep: &ContextSweep) -> Vec<Diagnostic> {
        let mut carried: Vec<Option<EventContext>> = vec![None; self.voices.len()];
        let mut diagnostics = Vec::new();

        for (s, section) in self.sections.iter_mut().enumerate() {
            let base = section.base_coloration;
            for voice_events in section.voices.iter_mut().flatten() {
                let v = voice_events.voice();
                if v >= carried.len() {
                    carried.resize(v + 1, None);
                }
                let start = match carried[v].take() {
                    Some(mut ctx) => {
                        ctx.onset = Proportion::ZERO;
                        ctx
                    }
                    None => EventContext::default().with_coloration(base),
                };
                let report = voice_events.sweep(sweep, start);
                log::debug!(
                    "section {} voice {}: {} events stamped",
                    s,
                    v,
                    report.events_stamped
                );
                diagnostics.extend(report.diagnostics);
                carried[v] = Some(report.end_context);
            }
        }
        diagnostics
    }

    /// Classify all variant readings in the piece
    pub fn compute_variant_types(&mut self, options: &CompareOptions) {
        for section in &mut self.sections {
            for voice_events in section.voices.iter_mut().flatten() {
                voice_events.compute_variant_types(options);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::clef::ClefType;
    use crate::models::events::NoteEvent;
    use crate::models::mensuration::NoteType;
    use crate::models::pitch::{NoteLetter, Pitch};
    use crate::variants::{VariantBlock, VariantReading, VariantTypes};

    fn minim(letter: NoteLetter) -> Event {
        Event::note(NoteEvent::new(NoteType::Minima, Proportion::ONE, Pitch::new(letter, 4)))
    }

    fn swept(events: Vec<Event>) -> VoiceEvents {
        let mut voice = VoiceEvents::new(0, events);
        voice.sweep(&ContextSweep::new(), EventContext::default());
        voice
    }

    #[test]
    fn test_out_of_range_queries() {
        let voice = swept(vec![minim(NoteLetter::C)]);
        assert!(voice.get(1).is_none());
        assert!(voice.context_at(5).is_none());
        assert!(voice.context_at(0).is_some());
    }

    #[test]
    fn test_cheap_insert_retimes_without_resweep() {
        let mut voice = swept(vec![
            Event::clef(Clef::principal(ClefType::G, 2)),
            minim(NoteLetter::C),
            minim(NoteLetter::D),
        ]);
        let outcome = voice.insert(2, minim(NoteLetter::E));
        assert!(!outcome.requires_resweep);
        assert!(outcome.report.is_none());
        assert_eq!(voice.context_at(2).map(|c| c.onset), Some(Proportion::ONE));
        assert_eq!(voice.context_at(3).map(|c| c.onset), Some(Proportion::whole(2)));
        assert!(voice.context_at(2).and_then(EventContext::principal_clef).is_some());
    }

    #[test]
    fn test_clef_insert_resweeps() {
        let mut voice = swept(vec![Event::clef(Clef::principal(ClefType::G, 2)), minim(NoteLetter::C)]);
        let f = Clef::principal(ClefType::F, 6);
        let outcome = voice.insert(1, Event::clef(f));
        assert!(outcome.requires_resweep);
        assert!(outcome.report.is_some());
        assert_eq!(voice.context_at(2).and_then(EventContext::principal_clef), Some(&f));

        let removed = voice.remove(1);
        assert!(matches!(removed, Some((_, ref o)) if o.requires_resweep));
        assert_ne!(voice.context_at(1).and_then(EventContext::principal_clef), Some(&f));
    }

    #[test]
    fn test_unswept_edit_only_reports() {
        let mut voice = VoiceEvents::new(0, vec![minim(NoteLetter::C)]);
        let outcome = voice.insert(0, Event::clef(Clef::principal(ClefType::C, 4)));
        assert!(outcome.requires_resweep);
        assert!(outcome.report.is_none());
        assert!(voice.remove(9).is_none());
        assert!(voice.replace(9, minim(NoteLetter::D)).is_none());
    }

    #[test]
    fn test_events_for_version_substitutes_reading() {
        let mut piece = Piece::new("Missa", "Anon.");
        piece.add_voice(VoiceInfo::new("Superius"));
        let a = piece.add_version("A", Some("Trent 89"));
        let b = piece.add_version("B", None);

        let reading = VariantReading::new(vec![b], vec![minim(NoteLetter::F), minim(NoteLetter::G)]);
        let mut section = MusicSection::new(1);
        section.set_voice(VoiceEvents::new(
            0,
            vec![
                minim(NoteLetter::C),
                Event::variant_start(VariantBlock::new(vec![reading])),
                minim(NoteLetter::D),
                Event::variant_end(),
                minim(NoteLetter::E),
            ],
        ));
        piece.sections.push(section);
        assert!(piece.sweep_all(&ContextSweep::new()).is_empty());

        let letters = |events: Vec<Event>| -> Vec<NoteLetter> {
            events.iter().filter_map(Event::as_note).map(|n| n.pitch.letter).collect()
        };
        let for_a = piece.sections[0].events_for_version(0, a).map(letters);
        let for_b = piece.sections[0].events_for_version(0, b).map(letters);
        assert_eq!(for_a, Some(vec![NoteLetter::C, NoteLetter::D, NoteLetter::E]));
        assert_eq!(for_b, Some(vec![NoteLetter::C, NoteLetter::F, NoteLetter::G, NoteLetter::E]));
        assert!(piece.sections[0].events_for_version(3, a).is_none());
        assert_eq!(piece.default_version().map(|v| v.id), Some(a));

        piece.compute_variant_types(&CompareOptions::default());
        if let Some(EventKind::VariantDataStart(block)) = piece.sections[0].voice(0).and_then(|v| v.get(1)).map(|e| &e.kind) {
            assert!(block.combined_types().contains(VariantTypes::RHYTHM));
            assert!(block.combined_types().contains(VariantTypes::PITCH));
        }
    }

    #[test]
    fn test_context_carries_across_sections() {
        let mut piece = Piece::new("Chanson", "");
        piece.add_voice(VoiceInfo::new("Tenor"));
        let c = Clef::principal(ClefType::C, 4);
        let mut first = MusicSection::new(1);
        first.set_voice(VoiceEvents::new(0, vec![Event::clef(c), minim(NoteLetter::C)]));
        let mut second = MusicSection::new(1);
        second.set_voice(VoiceEvents::new(0, vec![minim(NoteLetter::D)]));
        piece.sections.push(first);
        piece.sections.push(second);
        piece.sweep_all(&ContextSweep::new());

        let ctx = piece.sections[1].voice(0).and_then(|v| v.context_at(0));
        assert_eq!(ctx.and_then(EventContext::principal_clef), Some(&c));
        assert_eq!(ctx.map(|c| c.onset), Some(Proportion::ZERO));
    }
}
