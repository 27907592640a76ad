//! Event grouping
//!
//! Partitions a voice's events into contiguous groups that each occupy one horizontal
//! slot. Ligatures are atomic groups; dots of addition, aligned events and signature
//! accidentals joining their clef set are glued to what precedes them; events after a
//! non-spacing marker share the marker's slot.

use super::metrics::GlyphMetrics;
use crate::error::Diagnostic;
use crate::models::events::{DotKind, Event, EventKind};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupType {
    Single,
    Ligature,
    /// Principal clef followed by its signature accidentals
    ClefSet,
}

/// Inclusive index range of events drawn in one slot
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderedEventGroup {
    pub first: usize,
    pub last: usize,
    pub group_type: GroupType,
}

impl RenderedEventGroup {
    pub fn single(index: usize) -> Self {
        Self {
            first: index,
            last: index,
            group_type: GroupType::Single,
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.first..=self.last).contains(&index)
    }

    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn indices(&self) -> std::ops::RangeInclusive<usize> {
        self.first..=self.last
    }
}

/// Groups of one event list plus problems found while forming them
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grouping {
    pub groups: Vec<RenderedEventGroup>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Whether the event at `index` shares the slot of the event before it
pub fn group_with_previous(events: &[Event], index: usize) -> bool {
    let (Some(event), Some(prev)) = (events.get(index), index.checked_sub(1).and_then(|i| events.get(i))) else {
        return false;
    };
    if event.display_aligned || prev.is_non_spacing() {
        return true;
    }
    match &event.kind {
        EventKind::Dot { kind: DotKind::Addition, .. } => true,
        EventKind::Clef(clef) => {
            !clef.is_principal()
                && clef.signature
                && prev.is_clef_bearing()
                && match (event.context.clef_set.as_deref(), prev.context.clef_set.as_deref()) {
                    (Some(set), Some(prev_set)) => set.extends(prev_set),
                    _ => false,
                }
        }
        _ => false,
    }
}

/// End of the ligature starting at `start`, and whether a closing note was found.
/// Non-spacing markers and dots may sit between members.
fn ligature_end(events: &[Event], start: usize) -> (usize, bool) {
    let mut last = start;
    for (j, event) in events.iter().enumerate().skip(start) {
        match &event.kind {
            EventKind::Note(note) => {
                last = j;
                if !note.ligature.is_ligated() {
                    return (j, true);
                }
            }
            EventKind::Dot { .. } => {}
            _ if event.is_non_spacing() => {}
            _ => return (last, false),
        }
    }
    (last, false)
}

/// Partition `events` into rendered groups
pub fn group_events(events: &[Event]) -> Grouping {
    let mut grouping = Grouping::default();
    let mut i = 0;

    while i < events.len() {
        if events[i].is_ligated_note() {
            let (last, complete) = ligature_end(events, i);
            if !complete {
                let diagnostic = Diagnostic::UnterminatedLigature { index: i };
                log::warn!("grouping: {}", diagnostic);
                grouping.diagnostics.push(diagnostic);
            }
            let notes = (i..=last).filter(|&j| events[j].as_note().is_some()).count();
            let group_type = if notes >= 2 {
                GroupType::Ligature
            } else {
                GroupType::Single
            };
            match grouping.groups.last_mut() {
                // markers before a ligature share its slot
                Some(prev) if group_with_previous(events, i) && prev.last + 1 == i => {
                    prev.last = last;
                    prev.group_type = group_type;
                }
                _ => grouping.groups.push(RenderedEventGroup {
                    first: i,
                    last,
                    group_type,
                }),
            }
            i = last + 1;
            continue;
        }

        match grouping.groups.last_mut() {
            Some(prev) if prev.last + 1 == i && group_with_previous(events, i) => {
                prev.last = i;
                if prev.group_type == GroupType::Single && events[i].as_clef().is_some() {
                    prev.group_type = GroupType::ClefSet;
                }
            }
            _ => grouping.groups.push(RenderedEventGroup::single(i)),
        }
        i += 1;
    }

    log::trace!("grouped {} events into {} groups", events.len(), grouping.groups.len());
    grouping
}

/// Check that a ligature group's members, all but the last, are ligated.
/// On failure the caller draws the members unligated.
pub fn validate_ligature(events: &[Event], group: &RenderedEventGroup) -> Result<(), Diagnostic> {
    if group.group_type != GroupType::Ligature {
        return Ok(());
    }
    let notes: Vec<usize> = group
        .indices()
        .filter(|&i| events.get(i).and_then(Event::as_note).is_some())
        .collect();
    let members = notes.len().saturating_sub(1);
    for &index in notes.iter().take(members) {
        if !events[index].is_ligated_note() {
            return Err(Diagnostic::LigatureOnUnligatedNote { index });
        }
    }
    Ok(())
}

/// Split a group into one single group per member
pub fn split_group(group: &RenderedEventGroup) -> Vec<RenderedEventGroup> {
    group.indices().map(RenderedEventGroup::single).collect()
}

/// Placement of one group member relative to the group's x
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemberSlot {
    pub index: usize,
    pub offset: f32,
    pub width: f32,
}

/// Lay out members inside a group. Aligned members reuse the previous member's
/// offset; in a ligature non-spacing markers take no width.
pub fn member_slots<M: GlyphMetrics + ?Sized>(
    events: &[Event],
    group: &RenderedEventGroup,
    metrics: &M,
) -> Vec<MemberSlot> {
    let mut slots: Vec<MemberSlot> = Vec::with_capacity(group.len());
    let mut cursor = 0.0_f32;
    for index in group.indices() {
        let Some(event) = events.get(index) else {
            break;
        };
        let width = if group.group_type == GroupType::Ligature && event.is_non_spacing() {
            0.0
        } else {
            metrics.event_width(event)
        };
        let offset = match slots.last() {
            Some(prev) if event.display_aligned => prev.offset,
            _ => cursor,
        };
        cursor = cursor.max(offset + width);
        slots.push(MemberSlot { index, offset, width });
    }
    slots
}

/// Rendered width of a group
pub fn group_width<M: GlyphMetrics + ?Sized>(events: &[Event], group: &RenderedEventGroup, metrics: &M) -> f32 {
    member_slots(events, group, metrics)
        .iter()
        .map(|s| s.offset + s.width)
        .fold(0.0, f32::max)
}

/// Whether any member of the group satisfies `pred`
pub fn group_has(events: &[Event], group: &RenderedEventGroup, pred: impl Fn(&Event) -> bool) -> bool {
    group.indices().filter_map(|i| events.get(i)).any(pred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextSweep;
    use crate::models::clef::{Clef, ClefType};
    use crate::models::events::{EventContext, LigStatus, NoteEvent};
    use crate::models::mensuration::NoteType;
    use crate::models::pitch::{NoteLetter, Pitch};
    use crate::models::proportion::Proportion;
    use crate::renderers::metrics::TableMetrics;

    fn brevis(letter: NoteLetter, status: LigStatus) -> Event {
        Event::note(NoteEvent::new(NoteType::Brevis, Proportion::whole(4), Pitch::new(letter, 4)).ligated(status))
    }

    fn minim(letter: NoteLetter) -> Event {
        Event::note(NoteEvent::new(NoteType::Minima, Proportion::ONE, Pitch::new(letter, 4)))
    }

    #[test]
    fn test_three_note_ligature_is_one_group() {
        let events = vec![
            brevis(NoteLetter::C, LigStatus::Recta),
            brevis(NoteLetter::D, LigStatus::Recta),
            brevis(NoteLetter::E, LigStatus::None),
        ];
        let grouping = group_events(&events);
        assert_eq!(
            grouping.groups,
            vec![RenderedEventGroup {
                first: 0,
                last: 2,
                group_type: GroupType::Ligature
            }]
        );
        assert!(grouping.diagnostics.is_empty());
    }

    #[test]
    fn test_ligature_width_counts_notes_only() {
        let metrics = TableMetrics::default();
        let events = vec![
            brevis(NoteLetter::C, LigStatus::Obliqua),
            Event::original_text("Amen"),
            brevis(NoteLetter::D, LigStatus::None),
        ];
        let grouping = group_events(&events);
        assert_eq!(grouping.groups.len(), 1);
        assert_eq!(group_width(&events, &grouping.groups[0], &metrics), 28.0);
    }

    #[test]
    fn test_dot_after_ligature_keeps_width() {
        let metrics = TableMetrics::default();
        let events = vec![
            brevis(NoteLetter::C, LigStatus::Recta),
            brevis(NoteLetter::D, LigStatus::None),
            Event::dot(DotKind::Addition, 3),
            minim(NoteLetter::E),
        ];
        let groups = group_events(&events).groups;
        assert_eq!((groups[0].first, groups[0].last), (0, 2));
        assert_eq!(groups[0].group_type, GroupType::Ligature);

        let slots = member_slots(&events, &groups[0], &metrics);
        assert_eq!(slots[2].offset, 28.0);
        assert_eq!(slots[2].width, 4.0);
        assert_eq!(group_width(&events, &groups[0], &metrics), 32.0);
    }

    #[test]
    fn test_addition_dot_and_aligned_join() {
        let events = vec![
            minim(NoteLetter::C),
            Event::dot(DotKind::Addition, 3),
            minim(NoteLetter::D),
            minim(NoteLetter::F).aligned(),
            Event::dot(DotKind::Division, 3),
        ];
        let groups = group_events(&events).groups;
        let spans: Vec<(usize, usize)> = groups.iter().map(|g| (g.first, g.last)).collect();
        assert_eq!(spans, vec![(0, 1), (2, 3), (4, 4)]);

        let metrics = TableMetrics::default();
        // aligned notes share one x
        assert_eq!(group_width(&events, &groups[1], &metrics), 10.0);
        assert_eq!(group_width(&events, &groups[0], &metrics), 14.0);
    }

    #[test]
    fn test_marker_shares_slot_with_following_event() {
        let events = vec![
            minim(NoteLetter::C),
            Event::proportion(Proportion::new(3, 1)),
            minim(NoteLetter::D),
            Event::original_text("Qui"),
            brevis(NoteLetter::E, LigStatus::Recta),
            brevis(NoteLetter::F, LigStatus::None),
        ];
        let groups = group_events(&events).groups;
        let spans: Vec<(usize, usize, GroupType)> = groups.iter().map(|g| (g.first, g.last, g.group_type)).collect();
        assert_eq!(
            spans,
            vec![
                (0, 0, GroupType::Single),
                (1, 2, GroupType::Single),
                (3, 5, GroupType::Ligature)
            ]
        );
    }

    #[test]
    fn test_signature_accidentals_join_clef() {
        let c = Clef::principal(ClefType::C, 4);
        let flat = Clef::accidental(ClefType::Bmol, Pitch::new(NoteLetter::B, 3), &c);
        let mut events = vec![Event::clef(c), Event::clef(flat), minim(NoteLetter::C)];
        ContextSweep::new().run(&mut events, &EventContext::default());
        let groups = group_events(&events).groups;
        assert_eq!(groups[0].group_type, GroupType::ClefSet);
        assert_eq!((groups[0].first, groups[0].last), (0, 1));
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_broken_ligature_reported() {
        let events = vec![brevis(NoteLetter::C, LigStatus::Recta), Event::barline(), minim(NoteLetter::D)];
        let grouping = group_events(&events);
        assert_eq!(grouping.diagnostics, vec![Diagnostic::UnterminatedLigature { index: 0 }]);
        assert_eq!(grouping.groups[0].group_type, GroupType::Single);
        assert_eq!(grouping.groups.len(), 3);
    }

    #[test]
    fn test_validate_ligature_rejects_unligated_member() {
        let events = vec![brevis(NoteLetter::C, LigStatus::None), brevis(NoteLetter::D, LigStatus::None)];
        let forced = RenderedEventGroup {
            first: 0,
            last: 1,
            group_type: GroupType::Ligature,
        };
        assert_eq!(
            validate_ligature(&events, &forced),
            Err(Diagnostic::LigatureOnUnligatedNote { index: 0 })
        );
        assert_eq!(split_group(&forced).len(), 2);
    }
}
