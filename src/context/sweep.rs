//! Contextual sweep
//!
//! One left-to-right pass over a voice's events that stamps every event with the clef
//! set, mensuration, coloration, key signature and proportion in force at that point.
//! Each event is first allowed to change the running context and is then stamped, so
//! a clef event carries the set it creates.
//!
//! The pass never fails. Malformed ligature chains and unbalanced markers are logged
//! and returned as [`Diagnostic`]s; the stamped context is best-effort around them.

use crate::error::Diagnostic;
use crate::models::clef::Clef;
use crate::models::clef_set::ClefSet;
use crate::models::events::{Event, EventContext, EventKind};
use std::sync::Arc;

/// Result of one sweep
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SweepReport {
    pub diagnostics: Vec<Diagnostic>,
    /// Events stamped, counting members of simultaneities
    pub events_stamped: usize,
    /// Context in force after the last event
    pub end_context: EventContext,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContextSweep {
    use_modern_clefs: bool,
}

/// Running state of a pass
struct SweepState {
    ctx: EventContext,
    open_ligature: Option<usize>,
    open_lacuna: Option<usize>,
    /// (marker index, events enclosed so far, block has readings)
    open_variant: Option<(usize, usize, bool)>,
    report: SweepReport,
}

impl SweepState {
    fn new(start: EventContext) -> Self {
        Self {
            ctx: start,
            open_ligature: None,
            open_lacuna: None,
            open_variant: None,
            report: SweepReport::default(),
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!("context sweep: {}", diagnostic);
        self.report.diagnostics.push(diagnostic);
    }

    fn break_ligature(&mut self) {
        if let Some(index) = self.open_ligature.take() {
            self.report(Diagnostic::UnterminatedLigature { index });
        }
    }
}

impl ContextSweep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build clef sets from modern equivalents instead of the written clefs
    pub fn with_modern_clefs(mut self, use_modern_clefs: bool) -> Self {
        self.use_modern_clefs = use_modern_clefs;
        self
    }

    pub fn uses_modern_clefs(&self) -> bool {
        self.use_modern_clefs
    }

    /// Stamp context on `events`, starting from `start`.
    ///
    /// Running twice over an unmodified list produces identical stamps.
    pub fn run(&self, events: &mut [Event], start: &EventContext) -> SweepReport {
        let mut state = SweepState::new(start.clone());

        for (index, event) in events.iter_mut().enumerate() {
            self.check_ligature(&mut state, index, event);
            self.check_markers(&mut state, index, event);
            self.apply(&mut state.ctx, index, event);

            if let EventKind::VariantDataStart(block) = &mut event.kind {
                for reading in block.readings_mut() {
                    let nested = reading.sweep_from(self, &state.ctx);
                    state.report.diagnostics.extend(nested);
                }
            }

            state.report.events_stamped += stamp(event, &state.ctx);

            if matches!(event.kind, EventKind::LacunaEnd) {
                state.ctx.editorial = false;
            }
            state.ctx.onset += event.music_time();
        }

        state.break_ligature();
        if let Some(index) = state.open_lacuna.take() {
            state.report(Diagnostic::UnbalancedLacuna { index });
        }
        if let Some((index, _, _)) = state.open_variant.take() {
            state.report(Diagnostic::UnbalancedVariantMarker { index });
        }

        log::trace!(
            "context sweep stamped {} events, {} diagnostics",
            state.report.events_stamped,
            state.report.diagnostics.len()
        );
        state.report.end_context = state.ctx;
        state.report
    }

    /// Fold one event's effect into the running context
    fn apply(&self, ctx: &mut EventContext, index: usize, event: &Event) {
        match &event.kind {
            EventKind::Clef(clef) => self.apply_clef(ctx, index, clef),
            EventKind::Mensuration(mens) => {
                ctx.mensuration = mens.mensuration;
                ctx.mens_event = Some(index);
            }
            EventKind::ColorChange(change) => ctx.coloration = ctx.coloration.compose(change),
            EventKind::Proportion(proportion) => ctx.proportion = *proportion,
            EventKind::ModernKeySignature(signature) => ctx.key_signature = Arc::new(signature.clone()),
            EventKind::Lacuna { .. } => ctx.editorial = true,
            // a simultaneity's context comes from its members, clefs included
            EventKind::Multi(members) => {
                for member in members {
                    self.apply(ctx, index, member);
                }
            }
            _ => {}
        }
    }

    fn apply_clef(&self, ctx: &mut EventContext, index: usize, clef: &Clef) {
        if !clef.signature {
            return;
        }
        let resolved = |c: &Clef| {
            if self.use_modern_clefs {
                c.modern_equivalent(None)
            } else {
                *c
            }
        };

        let changed = if clef.is_principal() {
            ctx.clef_set = Some(Arc::new(ClefSet::new(resolved(clef))));
            true
        } else {
            match ctx.clef_set.as_mut() {
                Some(set) => Arc::make_mut(set).add_clef(*clef, self.use_modern_clefs),
                None => {
                    ctx.clef_set = Some(Arc::new(ClefSet::new(resolved(clef))));
                    true
                }
            }
        };

        if changed {
            if let Some(set) = &ctx.clef_set {
                ctx.key_signature = Arc::new(set.key_signature().clone());
            }
            ctx.clef_event = Some(index);
        }
    }

    /// A ligature runs until a note with no ligature status. Rests, principal clefs
    /// and mensuration signs cannot occur inside one.
    fn check_ligature(&self, state: &mut SweepState, index: usize, event: &Event) {
        match &event.kind {
            EventKind::Note(note) => {
                if note.ligature.is_ligated() {
                    state.open_ligature.get_or_insert(index);
                } else {
                    state.open_ligature = None;
                }
            }
            EventKind::Rest(_) | EventKind::Mensuration(_) => state.break_ligature(),
            EventKind::Clef(clef) if clef.is_principal() => state.break_ligature(),
            _ => {}
        }
    }

    fn check_markers(&self, state: &mut SweepState, index: usize, event: &Event) {
        match &event.kind {
            EventKind::Lacuna { .. } => {
                if let Some(prev) = state.open_lacuna.replace(index) {
                    state.report(Diagnostic::UnbalancedLacuna { index: prev });
                }
            }
            EventKind::LacunaEnd => {
                if state.open_lacuna.take().is_none() {
                    state.report(Diagnostic::UnbalancedLacuna { index });
                }
            }
            EventKind::VariantDataStart(block) => {
                if let Some((prev, _, _)) = state.open_variant.replace((index, 0, !block.is_empty())) {
                    state.report(Diagnostic::UnbalancedVariantMarker { index: prev });
                }
            }
            EventKind::VariantDataEnd => match state.open_variant.take() {
                None => state.report(Diagnostic::UnbalancedVariantMarker { index }),
                Some((start, 0, false)) => state.report(Diagnostic::EmptyVariantBlock { index: start }),
                Some(_) => {}
            },
            _ => {
                if let Some((_, enclosed, _)) = state.open_variant.as_mut() {
                    *enclosed += 1;
                }
            }
        }
    }
}

/// Write the context onto an event and any simultaneous members
fn stamp(event: &mut Event, ctx: &EventContext) -> usize {
    event.context = ctx.clone();
    let mut count = 1;
    if let EventKind::Multi(members) = &mut event.kind {
        for member in members {
            count += stamp(member, ctx);
        }
    }
    count
}

/// Whether replacing `removed` with `inserted` invalidates downstream context
pub fn edit_requires_resweep(removed: Option<&Event>, inserted: Option<&Event>) -> bool {
    removed.map_or(false, Event::requires_resweep) || inserted.map_or(false, Event::requires_resweep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::clef::ClefType;
    use crate::models::coloration::{Color, ColorSpec, Coloration, Fill};
    use crate::models::events::{LigStatus, MensEvent, NoteEvent};
    use crate::models::key_signature::ModernKeySignature;
    use crate::models::mensuration::{Division, MensSign, MensSymbol, NoteType};
    use crate::models::pitch::{Accidental, NoteLetter, Pitch};
    use crate::models::proportion::Proportion;
    use crate::variants::{VariantBlock, VariantReading, VersionId};

    fn minim(letter: NoteLetter, octave: i8) -> Event {
        Event::note(NoteEvent::new(NoteType::Minima, Proportion::ONE, Pitch::new(letter, octave)))
    }

    fn ligated(letter: NoteLetter, status: LigStatus) -> Event {
        Event::note(NoteEvent::new(NoteType::Brevis, Proportion::whole(4), Pitch::new(letter, 4)).ligated(status))
    }

    #[test]
    fn test_single_clef_voice() {
        let g = Clef::principal(ClefType::G, 2);
        let mut events = vec![Event::clef(g), minim(NoteLetter::G, 4), Event::line_end(false)];
        let report = ContextSweep::new().run(&mut events, &EventContext::default());

        assert!(report.diagnostics.is_empty());
        assert_eq!(report.events_stamped, 3);
        let set = events[1].context.clef_set.as_deref();
        assert_eq!(set.map(ClefSet::len), Some(1));
        assert_eq!(set.and_then(ClefSet::principal), Some(&g));
        assert_eq!(events[1].context.clef_event, Some(0));
        assert_eq!(events[2].context.onset, Proportion::ONE);
    }

    #[test]
    fn test_signature_accidental_extends_set() {
        let c = Clef::principal(ClefType::C, 4);
        let flat = Clef::accidental(ClefType::Bmol, Pitch::new(NoteLetter::B, 3), &c);
        let mut events = vec![Event::clef(c), Event::clef(flat), minim(NoteLetter::B, 3)];
        ContextSweep::new().run(&mut events, &EventContext::default());

        let ctx = &events[2].context;
        assert_eq!(ctx.clef_set.as_deref().map(ClefSet::len), Some(2));
        assert_eq!(ctx.key_signature.accidental_for(NoteLetter::B), Some(Accidental::Flat));
        assert_eq!(ctx.clef_event, Some(1));
        // the principal clef event keeps the set as it was before the accidental
        assert_eq!(events[0].context.clef_set.as_deref().map(ClefSet::len), Some(1));
    }

    #[test]
    fn test_inline_accidental_leaves_context() {
        let c = Clef::principal(ClefType::C, 4);
        let inline = Clef::new(ClefType::Bmol, 4, Pitch::new(NoteLetter::B, 3), false);
        let mut events = vec![Event::clef(c), Event::clef(inline), minim(NoteLetter::B, 3)];
        ContextSweep::new().run(&mut events, &EventContext::default());
        assert_eq!(events[2].context.clef_event, Some(0));
        assert!(events[2].context.key_signature.is_empty());
    }

    #[test]
    fn test_context_shared_until_change() {
        let mut events = vec![
            Event::clef(Clef::principal(ClefType::G, 2)),
            minim(NoteLetter::A, 4),
            minim(NoteLetter::B, 4),
        ];
        ContextSweep::new().run(&mut events, &EventContext::default());
        let a = events[1].context.clef_set.as_ref();
        let b = events[2].context.clef_set.as_ref();
        assert!(matches!((a, b), (Some(x), Some(y)) if Arc::ptr_eq(x, y)));
    }

    #[test]
    fn test_sweep_is_deterministic() {
        let c = Clef::principal(ClefType::C, 4);
        let mut events = vec![
            Event::clef(c),
            Event::mensuration(MensEvent::from_signs(vec![MensSign::new(MensSymbol::Circle)])),
            minim(NoteLetter::C, 4),
            Event::proportion(Proportion::new(3, 2)),
            minim(NoteLetter::D, 4),
        ];
        let sweep = ContextSweep::new();
        sweep.run(&mut events, &EventContext::default());
        let first: Vec<EventContext> = events.iter().map(|e| e.context.clone()).collect();
        sweep.run(&mut events, &EventContext::default());
        let second: Vec<EventContext> = events.iter().map(|e| e.context.clone()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_mensuration_and_proportion() {
        let mut events = vec![
            minim(NoteLetter::C, 4),
            Event::mensuration(MensEvent::from_signs(vec![MensSign::new(MensSymbol::Circle)])),
            minim(NoteLetter::D, 4),
            Event::proportion(Proportion::new(3, 1)),
            minim(NoteLetter::E, 4),
        ];
        ContextSweep::new().run(&mut events, &EventContext::default());
        assert_eq!(events[0].context.mens_event, None);
        assert_eq!(events[2].context.mensuration.tempus, Division::Ternary);
        assert_eq!(events[2].context.mens_event, Some(1));
        assert_eq!(events[2].context.proportion, Proportion::ONE);
        assert_eq!(events[4].context.proportion, Proportion::new(3, 1));
    }

    #[test]
    fn test_color_changes_compose() {
        let red = Coloration::new(ColorSpec::new(Color::Red, Fill::Full), ColorSpec::new(Color::Red, Fill::Void));
        let mut events = vec![Event::color_change(red), minim(NoteLetter::C, 4), Event::color_change(red)];
        ContextSweep::new().run(&mut events, &EventContext::default());
        let after = events[1].context.coloration;
        assert_eq!(after.primary, red.primary);
        assert_eq!(after.secondary, Coloration::DEFAULT.primary);
        // restating the current color changes nothing
        assert_eq!(events[2].context.coloration, after);
    }

    #[test]
    fn test_lacuna_marks_span_editorial() {
        let mut events = vec![
            minim(NoteLetter::C, 4),
            Event::lacuna(Proportion::whole(2)),
            minim(NoteLetter::D, 4),
            Event::lacuna_end(),
            minim(NoteLetter::E, 4),
        ];
        let report = ContextSweep::new().run(&mut events, &EventContext::default());
        assert!(report.diagnostics.is_empty());
        let flags: Vec<bool> = events.iter().map(|e| e.context.editorial).collect();
        assert_eq!(flags, vec![false, true, true, true, false]);
    }

    #[test]
    fn test_unbalanced_lacuna_reported() {
        let mut events = vec![Event::lacuna_end(), minim(NoteLetter::C, 4)];
        let report = ContextSweep::new().run(&mut events, &EventContext::default());
        assert_eq!(report.diagnostics, vec![Diagnostic::UnbalancedLacuna { index: 0 }]);
    }

    #[test]
    fn test_unterminated_ligature_is_not_fatal() {
        let mut events = vec![
            Event::clef(Clef::principal(ClefType::C, 4)),
            ligated(NoteLetter::C, LigStatus::Recta),
            Event::rest(NoteType::Brevis, Proportion::whole(4)),
            ligated(NoteLetter::D, LigStatus::Obliqua),
        ];
        let report = ContextSweep::new().run(&mut events, &EventContext::default());
        assert_eq!(
            report.diagnostics,
            vec![
                Diagnostic::UnterminatedLigature { index: 1 },
                Diagnostic::UnterminatedLigature { index: 3 },
            ]
        );
        assert!(events[3].context.clef_set.is_some());
    }

    #[test]
    fn test_complete_ligature_is_clean() {
        let mut events = vec![
            ligated(NoteLetter::C, LigStatus::Recta),
            ligated(NoteLetter::D, LigStatus::Recta),
            ligated(NoteLetter::E, LigStatus::None),
        ];
        let report = ContextSweep::new().run(&mut events, &EventContext::default());
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_multi_context_from_member_clefs() {
        let f = Clef::principal(ClefType::F, 6);
        let mut events = vec![
            Event::clef(Clef::principal(ClefType::G, 2)),
            Event::multi(vec![Event::clef(f), minim(NoteLetter::F, 3)]),
        ];
        let report = ContextSweep::new().run(&mut events, &EventContext::default());
        assert_eq!(report.events_stamped, 4);
        assert_eq!(events[1].context.principal_clef(), Some(&f));
        if let EventKind::Multi(members) = &events[1].kind {
            assert_eq!(members[1].context.principal_clef(), Some(&f));
        }
    }

    #[test]
    fn test_key_signature_event_overrides() {
        let mut events = vec![
            Event::clef(Clef::principal(ClefType::G, 2)),
            Event::key_signature(ModernKeySignature::from_fifths(-2)),
            minim(NoteLetter::E, 4),
        ];
        ContextSweep::new().run(&mut events, &EventContext::default());
        assert_eq!(events[2].context.key_signature.fifths(), -2);
    }

    #[test]
    fn test_modern_clef_sets() {
        let mut events = vec![Event::clef(Clef::principal(ClefType::C, 0)), minim(NoteLetter::C, 4)];
        ContextSweep::new()
            .with_modern_clefs(true)
            .run(&mut events, &EventContext::default());
        let principal = events[1].context.principal_clef().map(|c| c.clef_type);
        assert_eq!(principal, Some(ClefType::ModernG));
    }

    #[test]
    fn test_variant_readings_swept_from_anchor() {
        let g = Clef::principal(ClefType::G, 2);
        let reading = VariantReading::new(vec![VersionId(1)], vec![minim(NoteLetter::A, 4)]);
        let mut events = vec![
            Event::clef(g),
            minim(NoteLetter::C, 5),
            Event::variant_start(VariantBlock::new(vec![reading])),
            minim(NoteLetter::B, 4),
            Event::variant_end(),
        ];
        let report = ContextSweep::new().run(&mut events, &EventContext::default());
        assert!(report.diagnostics.is_empty());
        if let EventKind::VariantDataStart(block) = &events[2].kind {
            let ctx = &block.readings()[0].events()[0].context;
            assert_eq!(ctx.principal_clef(), Some(&g));
            assert_eq!(ctx.onset, Proportion::ONE);
        }
    }

    #[test]
    fn test_empty_variant_block_reported() {
        let mut events = vec![Event::variant_start(VariantBlock::default()), Event::variant_end(), Event::variant_end()];
        let report = ContextSweep::new().run(&mut events, &EventContext::default());
        assert_eq!(
            report.diagnostics,
            vec![
                Diagnostic::EmptyVariantBlock { index: 0 },
                Diagnostic::UnbalancedVariantMarker { index: 2 },
            ]
        );
    }

    #[test]
    fn test_edit_classification() {
        let note = minim(NoteLetter::C, 4);
        let clef = Event::clef(Clef::principal(ClefType::C, 4));
        assert!(!edit_requires_resweep(Some(&note), Some(&note)));
        assert!(edit_requires_resweep(Some(&note), Some(&clef)));
        assert!(edit_requires_resweep(Some(&clef), None));
    }
}
