//! Part renderer
//!
//! Turns swept voices into staves: groups the events, splits them into staves
//! (at source line ends, or by group count in auto-flow), re-emits the active clef set
//! at the start of every continuation staff, justifies each staff and resolves the
//! rendered event tuples. Voices of a section that end their incipit with an ellipsis
//! are aligned so every incipit occupies the same width.

use super::display_list::{DisplayList, RenderedEvent, RenderedSource, RenderedStaff, RenderedVoice};
use super::grouping::{group_events, group_has, member_slots, split_group, validate_ligature, GroupType, RenderedEventGroup};
use super::layout_engine::{LayoutEngine, StaffLayout};
use super::metrics::{GlyphMetrics, Symbol};
use crate::config::{FlowMode, LayoutConfig};
use crate::error::Diagnostic;
use crate::models::clef::Clef;
use crate::models::events::{Event, EventContext, EventKind};
use crate::models::voice::{MusicSection, Piece, VoiceEvents};

pub struct PartRenderer<'a, M: GlyphMetrics + ?Sized> {
    metrics: &'a M,
    config: &'a LayoutConfig,
}

/// Groups of a staff and whether the staff ends a page
struct StaffGroups {
    groups: Vec<RenderedEventGroup>,
    page_end: bool,
}

impl<'a, M: GlyphMetrics + ?Sized> PartRenderer<'a, M> {
    /// An invalid config is logged and rendered with ordered padding bounds
    pub fn new(metrics: &'a M, config: &'a LayoutConfig) -> Self {
        if let Err(err) = config.validate() {
            log::warn!("rendering with invalid layout config: {}", err);
        }
        Self { metrics, config }
    }

    fn engine(&self) -> LayoutEngine<'a, M> {
        LayoutEngine::new(self.metrics, self.config)
    }

    /// Group events, splitting ligature groups whose members are not ligated
    fn prepare_groups(&self, events: &[Event]) -> (Vec<RenderedEventGroup>, Vec<Diagnostic>) {
        let grouping = group_events(events);
        let mut diagnostics = grouping.diagnostics;
        let mut groups = Vec::with_capacity(grouping.groups.len());
        for group in grouping.groups {
            match validate_ligature(events, &group) {
                Ok(()) => groups.push(group),
                Err(diagnostic) => {
                    log::warn!("{}; drawing members unligated", diagnostic);
                    diagnostics.push(diagnostic);
                    groups.extend(split_group(&group));
                }
            }
        }
        (groups, diagnostics)
    }

    fn split_staves(&self, events: &[Event], groups: Vec<RenderedEventGroup>) -> Vec<StaffGroups> {
        let mut staves = Vec::new();
        let mut current: Vec<RenderedEventGroup> = Vec::new();

        for group in groups {
            match self.config.flow {
                FlowMode::Manuscript => {
                    current.push(group);
                    let line_end = group.indices().find_map(|i| match events.get(i).map(|e| &e.kind) {
                        Some(EventKind::LineEnd { page_end }) => Some(*page_end),
                        _ => None,
                    });
                    if let Some(page_end) = line_end {
                        staves.push(StaffGroups {
                            groups: std::mem::take(&mut current),
                            page_end,
                        });
                    }
                }
                FlowMode::AutoFlow => {
                    let full = current.len() >= self.config.groups_per_staff;
                    if full && current.last().map_or(false, |prev| can_break_between(events, prev, &group)) {
                        log::debug!("auto-flow break before event {}", group.first);
                        staves.push(StaffGroups {
                            groups: std::mem::take(&mut current),
                            page_end: false,
                        });
                    }
                    current.push(group);
                }
            }
        }

        if !current.is_empty() || staves.is_empty() {
            staves.push(StaffGroups {
                groups: current,
                page_end: false,
            });
        }
        staves
    }

    /// Clefs to repeat at the start of a continuation staff
    fn leading_clefs(&self, events: &[Event], groups: &[RenderedEventGroup]) -> Vec<Clef> {
        let Some(first) = groups.first() else {
            return Vec::new();
        };
        if group_has(events, first, Event::is_clef_bearing) {
            return Vec::new();
        }
        let Some(set) = events.get(first.first).and_then(|e| e.context.clef_set.as_deref()) else {
            return Vec::new();
        };
        if self.config.use_modern_clefs {
            set.clefs().iter().map(|c| c.modern_equivalent(set.principal())).collect()
        } else {
            set.clefs().to_vec()
        }
    }

    fn clefs_width(&self, clefs: &[Clef]) -> f32 {
        clefs
            .iter()
            .map(|c| self.metrics.symbol_width(Symbol::Clef(c.clef_type)))
            .sum()
    }

    fn rendered_events(&self, events: &[Event], layout: &StaffLayout, leading: &[Clef]) -> Vec<RenderedEvent> {
        let mut out = Vec::new();

        if let (Some(slot), Some(ctx)) = (
            layout.leading,
            layout.first_event().and_then(|i| events.get(i)).map(|e| &e.context),
        ) {
            let mut x = slot.x;
            for clef in leading {
                let width = self.metrics.symbol_width(Symbol::Clef(clef.clef_type));
                out.push(resolved(RenderedSource::LeadingClef(*clef), x, width, ctx));
                x += width;
            }
        }

        for positioned in &layout.groups {
            for member in member_slots(events, &positioned.group, self.metrics) {
                if let Some(event) = events.get(member.index) {
                    out.push(resolved(
                        RenderedSource::Event(member.index),
                        positioned.x + member.offset,
                        member.width,
                        &event.context,
                    ));
                }
            }
        }
        out
    }

    /// Lay out one voice as a sequence of staves
    pub fn render_voice(&self, voice: &VoiceEvents, section: usize) -> RenderedVoice {
        let events = voice.events();
        let (groups, diagnostics) = self.prepare_groups(events);
        let split = self.split_staves(events, groups);
        let count = split.len();
        let engine = self.engine();

        let staves: Vec<RenderedStaff> = split
            .into_iter()
            .enumerate()
            .map(|(s, staff)| {
                let is_last = s + 1 == count;
                let leading = if s > 0 {
                    self.leading_clefs(events, &staff.groups)
                } else {
                    Vec::new()
                };
                let leading_width = (!leading.is_empty()).then(|| self.clefs_width(&leading));
                let layout = engine.layout_staff(events, &staff.groups, leading_width, is_last);
                RenderedStaff {
                    events: self.rendered_events(events, &layout, &leading),
                    layout,
                    is_last,
                    page_end: staff.page_end,
                    incipit_width: None,
                }
            })
            .collect();

        log::debug!("voice {} section {}: {} staves", voice.voice(), section, staves.len());
        RenderedVoice {
            voice: voice.voice(),
            section,
            staves,
            diagnostics,
        }
    }

    /// Render each voice on a single staff with all incipits padded to the width of
    /// the widest one. The widest incipit keeps the default padding; the music after
    /// the ellipsis is justified into the rest of each staff. Incipit staves are
    /// fully justified, so they are never marked last.
    pub fn justify_incipits(&self, voices: &[&VoiceEvents], section: usize) -> Vec<RenderedVoice> {
        let engine = self.engine();
        let default_padding = self.config.clamped_default_padding();

        let prepared: Vec<(Vec<RenderedEventGroup>, Vec<Diagnostic>, usize, f32)> = voices
            .iter()
            .map(|voice| {
                let events = voice.events();
                let (groups, mut diagnostics) = self.prepare_groups(events);
                let incipit = match voice.ellipsis_index() {
                    Some(ellipsis) => groups.iter().take_while(|g| g.last < ellipsis).count(),
                    None => {
                        let diagnostic = Diagnostic::MissingEllipsis { voice: voice.voice() };
                        log::warn!("{}", diagnostic);
                        diagnostics.push(diagnostic);
                        groups.len()
                    }
                };
                let width: f32 = engine
                    .measure(events, &groups[..incipit])
                    .iter()
                    .map(|(_, w)| w)
                    .sum();
                (groups, diagnostics, incipit, width)
            })
            .collect();

        let target = prepared
            .iter()
            .map(|(_, _, n, w)| w + *n as f32 * default_padding)
            .fold(0.0, f32::max);
        log::debug!("incipit target width {:.1} across {} voices", target, voices.len());

        voices
            .iter()
            .zip(prepared)
            .map(|(voice, (groups, diagnostics, incipit, _))| {
                let events = voice.events();
                let layout = engine.layout_with_incipit(events, &groups, incipit, target);
                RenderedVoice {
                    voice: voice.voice(),
                    section,
                    staves: vec![RenderedStaff {
                        events: self.rendered_events(events, &layout, &[]),
                        layout,
                        is_last: false,
                        page_end: false,
                        incipit_width: Some(target),
                    }],
                    diagnostics,
                }
            })
            .collect()
    }

    /// Render every voice of a section; sections with an ellipsis in any voice are
    /// incipit-aligned
    pub fn render_section(&self, section: &MusicSection, index: usize) -> Vec<RenderedVoice> {
        let voices: Vec<&VoiceEvents> = section.present_voices().collect();
        if voices.iter().any(|v| v.ellipsis_index().is_some()) {
            self.justify_incipits(&voices, index)
        } else {
            voices.iter().map(|v| self.render_voice(v, index)).collect()
        }
    }

    pub fn render_piece(&self, piece: &Piece) -> DisplayList {
        DisplayList {
            title: piece.title.clone(),
            composer: piece.composer.clone(),
            voices: piece
                .sections
                .iter()
                .enumerate()
                .flat_map(|(i, section)| self.render_section(section, i))
                .collect(),
        }
    }
}

/// A break between `prev` and `next` may not fall before a clef or after an open
/// ligature member. A color change never ends a group: being non-spacing, it shares
/// the slot of the event after it, so no break can follow it.
fn can_break_between(events: &[Event], prev: &RenderedEventGroup, next: &RenderedEventGroup) -> bool {
    let before_clef = group_has(events, next, Event::is_clef_bearing);
    let open_ligature = prev.group_type != GroupType::Ligature && events.get(prev.last).map_or(false, Event::is_ligated_note);
    !(before_clef || open_ligature)
}

fn resolved(source: RenderedSource, x: f32, width: f32, ctx: &EventContext) -> RenderedEvent {
    RenderedEvent {
        source,
        x,
        width,
        clef_set: ctx.clef_set.clone(),
        mensuration: ctx.mensuration,
        coloration: ctx.coloration,
        key_signature: ctx.key_signature.clone(),
        proportion: ctx.proportion,
        editorial: ctx.editorial,
    }
}
