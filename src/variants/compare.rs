//! Variant comparator
//!
//! Classifies how a variant reading differs from the default reading. Each category
//! has its own test; most walk both event lists in parallel, skipping events that are
//! irrelevant to the category while accumulating elapsed music time, and compare only
//! events that start at the same cumulative time.

use crate::config::CompareOptions;
use crate::models::events::{Event, EventKind, LigStatus};
use crate::models::mensuration::{MensSign, Mensuration};
use crate::models::pitch::{Accidental, Pitch};
use crate::models::proportion::Proportion;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bitset of difference categories. Empty means the variant is non-substantive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantTypes(u16);

impl VariantTypes {
    pub const NONE: VariantTypes = VariantTypes(0);
    pub const RHYTHM: VariantTypes = VariantTypes(1 << 0);
    pub const PITCH: VariantTypes = VariantTypes(1 << 1);
    pub const ORIGINAL_TEXT: VariantTypes = VariantTypes(1 << 2);
    pub const ACCIDENTAL: VariantTypes = VariantTypes(1 << 3);
    pub const CLEF: VariantTypes = VariantTypes(1 << 4);
    pub const LINE_END: VariantTypes = VariantTypes(1 << 5);
    pub const COLORATION: VariantTypes = VariantTypes(1 << 6);
    pub const LIGATURE: VariantTypes = VariantTypes(1 << 7);
    pub const MENSURATION: VariantTypes = VariantTypes(1 << 8);

    const NAMED: [(VariantTypes, &'static str); 9] = [
        (Self::RHYTHM, "rhythm"),
        (Self::PITCH, "pitch"),
        (Self::ORIGINAL_TEXT, "original-text"),
        (Self::ACCIDENTAL, "accidental"),
        (Self::CLEF, "clef"),
        (Self::LINE_END, "line-end"),
        (Self::COLORATION, "coloration"),
        (Self::LIGATURE, "ligature"),
        (Self::MENSURATION, "mensuration"),
    ];

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn contains(&self, other: VariantTypes) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: VariantTypes) {
        self.0 |= other.0;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn is_non_substantive(&self) -> bool {
        self.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for VariantTypes {
    type Output = VariantTypes;

    fn bitor(self, rhs: VariantTypes) -> VariantTypes {
        VariantTypes(self.0 | rhs.0)
    }
}

impl BitOrAssign for VariantTypes {
    fn bitor_assign(&mut self, rhs: VariantTypes) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for VariantTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "non-substantive")
        } else {
            write!(f, "{}", self.names().join("+"))
        }
    }
}

/// Classify the difference between two aligned event sequences
pub fn calc_variant_types(a: &[Event], b: &[Event], options: &CompareOptions) -> VariantTypes {
    let mut types = VariantTypes::NONE;
    if rhythm_differs(a, b, options) {
        types |= VariantTypes::RHYTHM;
    }
    if pitch_differs(a, b) {
        types |= VariantTypes::PITCH;
    }
    if original_text_differs(a, b) {
        types |= VariantTypes::ORIGINAL_TEXT;
    }
    if accidentals_differ(a, b) {
        types |= VariantTypes::ACCIDENTAL;
    }
    if clef_differs(a, b, options) {
        types |= VariantTypes::CLEF;
    }
    if line_end_differs(a, b) {
        types |= VariantTypes::LINE_END;
    }
    if coloration_differs(a, b) {
        types |= VariantTypes::COLORATION;
    }
    if ligature_differs(a, b) {
        types |= VariantTypes::LIGATURE;
    }
    if mensuration_differs(a, b) {
        types |= VariantTypes::MENSURATION;
    }
    log::debug!("variant comparison: {}", types);
    types
}

/// Cursor over one event list that keeps elapsed music time
struct Walker<'a> {
    events: &'a [Event],
    pos: usize,
    time: Proportion,
}

impl<'a> Walker<'a> {
    fn new(events: &'a [Event]) -> Self {
        Self {
            events,
            pos: 0,
            time: Proportion::ZERO,
        }
    }

    /// Next event accepted by `relevant`, with its onset
    fn next_relevant(&mut self, relevant: &dyn Fn(&Event) -> bool) -> Option<(Proportion, &'a Event)> {
        while let Some(event) = self.events.get(self.pos) {
            let onset = self.time;
            self.time += event.music_time();
            self.pos += 1;
            if relevant(event) {
                return Some((onset, event));
            }
        }
        None
    }
}

/// Two-pointer walk comparing events that start at the same time
fn co_walk<'a>(
    a: &'a [Event],
    b: &'a [Event],
    relevant: &dyn Fn(&Event) -> bool,
    differs: &mut dyn FnMut(&'a Event, &'a Event) -> bool,
) -> bool {
    let mut wa = Walker::new(a);
    let mut wb = Walker::new(b);
    let mut ea = wa.next_relevant(relevant);
    let mut eb = wb.next_relevant(relevant);
    while let (Some((ta, x)), Some((tb, y))) = (ea, eb) {
        match ta.cmp(&tb) {
            Ordering::Equal => {
                if differs(x, y) {
                    return true;
                }
                ea = wa.next_relevant(relevant);
                eb = wb.next_relevant(relevant);
            }
            Ordering::Less => ea = wa.next_relevant(relevant),
            Ordering::Greater => eb = wb.next_relevant(relevant),
        }
    }
    false
}

fn is_timed(event: &Event) -> bool {
    !event.music_time().is_zero()
}

fn has_notes(event: &Event) -> bool {
    !event.notes().is_empty()
}

/// Positions that may be shifted by sesquialtera/tripla rescaling
fn is_triple_position(t: &Proportion) -> bool {
    !t.is_zero() && t.is_multiple_of(3)
}

/// Onset or duration of timed events diverge.
///
/// With `skip_triple_positions`, a mismatch whose onset is a whole multiple of three
/// minims is not counted and the walk resynchronises instead. This is a known
/// approximation for proportional passages, kept as an explicit option.
fn rhythm_differs(a: &[Event], b: &[Event], options: &CompareOptions) -> bool {
    let relevant = |e: &Event| is_timed(e);
    let mut wa = Walker::new(a);
    let mut wb = Walker::new(b);
    let mut ea = wa.next_relevant(&relevant);
    let mut eb = wb.next_relevant(&relevant);
    loop {
        match (ea, eb) {
            (None, None) => return false,
            (Some((ta, x)), Some((tb, y))) => {
                if ta == tb && x.music_time() == y.music_time() {
                    ea = wa.next_relevant(&relevant);
                    eb = wb.next_relevant(&relevant);
                    continue;
                }
                if !(options.skip_triple_positions && (is_triple_position(&ta) || is_triple_position(&tb))) {
                    return true;
                }
                match ta.cmp(&tb) {
                    Ordering::Less => ea = wa.next_relevant(&relevant),
                    Ordering::Greater => eb = wb.next_relevant(&relevant),
                    Ordering::Equal => {
                        ea = wa.next_relevant(&relevant);
                        eb = wb.next_relevant(&relevant);
                    }
                }
            }
            (Some((t, _)), None) => {
                if !(options.skip_triple_positions && is_triple_position(&t)) {
                    return true;
                }
                ea = wa.next_relevant(&relevant);
            }
            (None, Some((t, _))) => {
                if !(options.skip_triple_positions && is_triple_position(&t)) {
                    return true;
                }
                eb = wb.next_relevant(&relevant);
            }
        }
    }
}

fn sorted_pitches(event: &Event) -> Vec<Pitch> {
    let mut pitches: Vec<Pitch> = event.notes().iter().map(|n| n.pitch).collect();
    pitches.sort();
    pitches
}

fn pitch_differs(a: &[Event], b: &[Event]) -> bool {
    co_walk(a, b, &has_notes, &mut |x, y| sorted_pitches(x) != sorted_pitches(y))
}

fn texts(events: &[Event]) -> Vec<(Proportion, &str)> {
    let mut walker = Walker::new(events);
    let relevant = |e: &Event| matches!(e.kind, EventKind::OriginalText { .. });
    let mut out = Vec::new();
    while let Some((t, e)) = walker.next_relevant(&relevant) {
        if let EventKind::OriginalText { text } = &e.kind {
            out.push((t, text.as_str()));
        }
    }
    out
}

fn original_text_differs(a: &[Event], b: &[Event]) -> bool {
    texts(a) != texts(b)
}

fn written_accidentals(event: &Event) -> Vec<Accidental> {
    let mut acc: Vec<Accidental> = event.notes().iter().filter_map(|n| n.accidental).collect();
    acc.sort();
    acc
}

/// Signature content or written accidentals differ at matching notes.
/// Clef sets restated at a line break with the same accidentals do not count.
fn accidentals_differ(a: &[Event], b: &[Event]) -> bool {
    co_walk(a, b, &has_notes, &mut |x, y| {
        let sig_differs = match (x.context.clef_set.as_deref(), y.context.clef_set.as_deref()) {
            (Some(sx), Some(sy)) => sx.sig_contradicts(sy),
            (Some(s), None) | (None, Some(s)) => !s.accidentals().is_empty(),
            (None, None) => false,
        };
        sig_differs
            || *x.context.key_signature != *y.context.key_signature
            || written_accidentals(x) != written_accidentals(y)
    })
}

fn clef_differs(a: &[Event], b: &[Event], options: &CompareOptions) -> bool {
    co_walk(a, b, &has_notes, &mut |x, y| {
        match (x.context.principal_clef(), y.context.principal_clef()) {
            (Some(cx), Some(cy)) => {
                if options.use_modern_clefs {
                    let (mx, my) = (cx.modern_equivalent(None), cy.modern_equivalent(None));
                    mx.clef_type != my.clef_type || mx.line_space != my.line_space
                } else {
                    cx.clef_type != cy.clef_type || cx.line_space != cy.line_space || cx.pitch != cy.pitch
                }
            }
            (None, None) => false,
            _ => true,
        }
    })
}

fn line_end_onsets(events: &[Event]) -> Vec<Proportion> {
    let mut walker = Walker::new(events);
    let relevant = |e: &Event| matches!(e.kind, EventKind::LineEnd { .. });
    std::iter::from_fn(|| walker.next_relevant(&relevant).map(|(t, _)| t)).collect()
}

fn line_end_differs(a: &[Event], b: &[Event]) -> bool {
    line_end_onsets(a) != line_end_onsets(b)
}

fn colored_flags(event: &Event) -> Vec<bool> {
    let mut flags: Vec<bool> = event.notes().iter().map(|n| n.colored).collect();
    flags.sort();
    flags
}

fn coloration_differs(a: &[Event], b: &[Event]) -> bool {
    co_walk(a, b, &has_notes, &mut |x, y| {
        x.context.coloration.primary != y.context.coloration.primary || colored_flags(x) != colored_flags(y)
    })
}

/// Each ligature as the sequence of its members' statuses
fn ligature_shapes(events: &[Event]) -> Vec<Vec<LigStatus>> {
    let mut shapes = Vec::new();
    let mut current: Vec<LigStatus> = Vec::new();
    for note in events.iter().filter_map(Event::as_note) {
        if note.ligature.is_ligated() || !current.is_empty() {
            current.push(note.ligature);
        }
        if !note.ligature.is_ligated() && !current.is_empty() {
            shapes.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        shapes.push(current);
    }
    shapes
}

fn ligature_differs(a: &[Event], b: &[Event]) -> bool {
    ligature_shapes(a) != ligature_shapes(b)
}

fn mensuration_signs(events: &[Event]) -> Vec<(&[MensSign], Mensuration)> {
    events
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::Mensuration(m) => Some((m.signs.as_slice(), m.mensuration)),
            _ => None,
        })
        .collect()
}

fn mensuration_differs(a: &[Event], b: &[Event]) -> bool {
    mensuration_signs(a) != mensuration_signs(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mensuration::NoteType;
    use crate::models::pitch::NoteLetter;
    use crate::models::NoteEvent;

    fn note(nt: NoteType, len: i64, letter: NoteLetter) -> Event {
        Event::note(NoteEvent::new(nt, Proportion::whole(len), Pitch::new(letter, 4)))
    }

    fn strict() -> CompareOptions {
        CompareOptions {
            skip_triple_positions: false,
            ..CompareOptions::default()
        }
    }

    #[test]
    fn test_identical_is_non_substantive() {
        let a = vec![note(NoteType::Minima, 1, NoteLetter::C), note(NoteType::Semibrevis, 2, NoteLetter::D)];
        let t = calc_variant_types(&a, &a.clone(), &strict());
        assert!(t.is_non_substantive());
        assert_eq!(t.to_string(), "non-substantive");
    }

    #[test]
    fn test_pitch_only() {
        let a = vec![note(NoteType::Minima, 1, NoteLetter::C), note(NoteType::Minima, 1, NoteLetter::D)];
        let b = vec![note(NoteType::Minima, 1, NoteLetter::C), note(NoteType::Minima, 1, NoteLetter::E)];
        let t = calc_variant_types(&a, &b, &strict());
        assert_eq!(t, VariantTypes::PITCH);
    }

    #[test]
    fn test_rhythm_only() {
        let a = vec![note(NoteType::Semibrevis, 2, NoteLetter::C)];
        let b = vec![note(NoteType::Minima, 1, NoteLetter::C), note(NoteType::Minima, 1, NoteLetter::C)];
        let t = calc_variant_types(&a, &b, &strict());
        assert!(t.contains(VariantTypes::RHYTHM));
        assert!(!t.contains(VariantTypes::PITCH));
    }

    #[test]
    fn test_triple_position_heuristic() {
        // mismatch first appears at cumulative time 3
        let a = vec![
            note(NoteType::Semibrevis, 3, NoteLetter::C),
            note(NoteType::Minima, 1, NoteLetter::D),
        ];
        let b = vec![
            note(NoteType::Semibrevis, 3, NoteLetter::C),
            note(NoteType::Semibrevis, 2, NoteLetter::D),
        ];
        assert!(calc_variant_types(&a, &b, &strict()).contains(VariantTypes::RHYTHM));
        let lenient = CompareOptions::default();
        assert!(lenient.skip_triple_positions);
        assert!(!calc_variant_types(&a, &b, &lenient).contains(VariantTypes::RHYTHM));
    }

    #[test]
    fn test_original_text_position() {
        let a = vec![Event::original_text("Kyrie"), note(NoteType::Minima, 1, NoteLetter::C)];
        let b = vec![note(NoteType::Minima, 1, NoteLetter::C), Event::original_text("Kyrie")];
        assert_eq!(calc_variant_types(&a, &b, &strict()), VariantTypes::ORIGINAL_TEXT);
    }

    #[test]
    fn test_ligature_shape() {
        let a = vec![
            Event::note(NoteEvent::new(NoteType::Brevis, Proportion::whole(4), Pitch::new(NoteLetter::C, 4)).ligated(LigStatus::Recta)),
            note(NoteType::Brevis, 4, NoteLetter::D),
        ];
        let b = vec![note(NoteType::Brevis, 4, NoteLetter::C), note(NoteType::Brevis, 4, NoteLetter::D)];
        assert_eq!(calc_variant_types(&a, &b, &strict()), VariantTypes::LIGATURE);
        assert_eq!(ligature_shapes(&a), vec![vec![LigStatus::Recta, LigStatus::None]]);
    }

    #[test]
    fn test_line_end_and_coloration() {
        let a = vec![note(NoteType::Minima, 1, NoteLetter::C), Event::line_end(false), note(NoteType::Minima, 1, NoteLetter::D)];
        let b = vec![
            note(NoteType::Minima, 1, NoteLetter::C),
            Event::note(NoteEvent::new(NoteType::Minima, Proportion::ONE, Pitch::new(NoteLetter::D, 4)).colored()),
        ];
        let t = calc_variant_types(&a, &b, &strict());
        assert!(t.contains(VariantTypes::LINE_END));
        assert!(t.contains(VariantTypes::COLORATION));
        assert!(!t.contains(VariantTypes::PITCH));
        assert_eq!(t.names(), vec!["line-end", "coloration"]);
    }

    #[test]
    fn test_symmetry() {
        let a = vec![note(NoteType::Minima, 1, NoteLetter::C), Event::original_text("et"), note(NoteType::Minima, 1, NoteLetter::F)];
        let b = vec![note(NoteType::Semibrevis, 2, NoteLetter::C), note(NoteType::Minima, 1, NoteLetter::G)];
        let opts = strict();
        assert_eq!(calc_variant_types(&a, &b, &opts), calc_variant_types(&b, &a, &opts));
    }
}
