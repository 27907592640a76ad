//! Export tree builder
//!
//! Walks swept voices and projects them onto measures. Each measure is one breve of
//! the mensuration in force where it starts; one sounding minim is one quarter note,
//! and written lengths are divided by the proportion in force. Notes and rests that
//! cross a measure boundary are split, notes tied across the split. Clef, key and time
//! attributes are emitted whenever the resolved context changes.

use super::types::*;
use crate::error::ExportError;
use crate::models::clef::ClefType;
use crate::models::events::{Event, EventContext, EventKind, NoteEvent};
use crate::models::mensuration::{Division, Mensuration};
use crate::models::proportion::Proportion;
use crate::models::voice::Piece;
use crate::renderers::musicxml::duration::duration_to_note_type;
use crate::utils::math::lcm;

/// Build the export tree for the default reading of every voice
pub fn build_export_score(piece: &Piece) -> Result<ExportScore, ExportError> {
    let num_voices = piece
        .sections
        .iter()
        .map(|s| s.num_voices())
        .max()
        .unwrap_or(0)
        .max(piece.voices.len());
    let default_version = piece.default_version().map(|v| v.id);

    let mut parts = Vec::new();
    for voice in 0..num_voices {
        let mut events = Vec::new();
        for section in &piece.sections {
            let section_events = match default_version {
                Some(version) => section.events_for_version(voice, version),
                None => section.voice(voice).map(|v| v.events().to_vec()),
            };
            events.extend(section_events.unwrap_or_default());
        }
        if events.iter().all(|e| e.music_time().is_zero()) {
            log::debug!("voice {} has no timed events; not exported", voice);
            continue;
        }
        let label = piece
            .voices
            .get(voice)
            .map_or_else(|| format!("Voice {}", voice + 1), |info| info.name.clone());
        parts.push(build_export_part(&events, format!("P{}", parts.len() + 1), label));
    }

    if parts.is_empty() {
        return Err(ExportError::EmptyScore);
    }
    Ok(ExportScore {
        title: piece.title.clone(),
        composer: piece.composer.clone(),
        parts,
    })
}

/// Build one part from a swept event list
pub fn build_export_part(events: &[Event], part_id: String, label: String) -> ExportPart {
    let divisions = divisions_for(events);
    let mut builder = PartBuilder::new(divisions);
    for event in events {
        builder.push_event(event);
    }
    ExportPart {
        part_id,
        label,
        divisions: divisions as usize,
        measures: builder.finish(),
    }
}

/// Sounding length in minims (= quarters)
fn sounding_length(event: &Event) -> Proportion {
    let written = event.music_time();
    written.checked_div(&event.context.proportion).unwrap_or(written)
}

/// Smallest divisions-per-quarter that expresses every duration as an integer
pub fn divisions_for(events: &[Event]) -> i64 {
    events
        .iter()
        .map(|e| sounding_length(e).reduce().denom())
        .fold(1, lcm)
        .max(1)
}

/// Time signature of one breve under a mensuration
pub fn time_for(mensuration: &Mensuration) -> TimeData {
    let tempus = mensuration.tempus.factor() as u32;
    match mensuration.prolatio {
        Division::Binary => TimeData {
            beats: tempus,
            beat_type: 2,
        },
        Division::Ternary => TimeData {
            beats: tempus * 3,
            beat_type: 4,
        },
    }
}

/// Modern clef shown for a context, if it has a principal clef
pub fn clef_for(ctx: &EventContext) -> Option<ClefData> {
    let modern = ctx.principal_clef()?.modern_equivalent(None);
    let line = u8::try_from(modern.line_space / 2 + 1).ok()?;
    match modern.clef_type {
        ClefType::ModernG => Some(ClefData {
            sign: 'G',
            line,
            octave_change: 0,
        }),
        ClefType::ModernG8 => Some(ClefData {
            sign: 'G',
            line,
            octave_change: -1,
        }),
        ClefType::ModernF => Some(ClefData {
            sign: 'F',
            line,
            octave_change: 0,
        }),
        ClefType::ModernC => Some(ClefData {
            sign: 'C',
            line,
            octave_change: 0,
        }),
        _ => None,
    }
}

/// Sounding pitch: written accidental first, then the key signature
fn pitch_info(note: &NoteEvent, ctx: &EventContext) -> PitchInfo {
    let alter = note
        .accidental
        .or_else(|| ctx.key_signature.accidental_for(note.pitch.letter))
        .map_or(0, |a| a.semitone_offset());
    PitchInfo {
        step: note.pitch.letter.to_char(),
        alter,
        octave: note.pitch.octave,
    }
}

struct PartBuilder {
    divisions: i64,
    measures: Vec<ExportMeasure>,
    current: Option<ExportMeasure>,
    clef: Option<ClefData>,
    key_fifths: Option<i8>,
    time: Option<TimeData>,
    pending_tie_stop: bool,
    in_word: bool,
}

/// Position of a segment within a split value
#[derive(Clone, Copy)]
struct Segment {
    duration: usize,
    first: bool,
    last: bool,
}

impl PartBuilder {
    fn new(divisions: i64) -> Self {
        Self {
            divisions,
            measures: Vec::new(),
            current: None,
            clef: None,
            key_fifths: None,
            time: None,
            pending_tie_stop: false,
            in_word: false,
        }
    }

    fn to_divisions(&self, quarters: Proportion) -> usize {
        let reduced = quarters.reduce();
        usize::try_from(reduced.numer() * self.divisions / reduced.denom()).unwrap_or(0)
    }

    fn note_type(&self, duration: usize) -> (Option<String>, usize) {
        match duration_to_note_type(Proportion::new(duration as i64, self.divisions)) {
            Some((name, dots)) => (Some(name.to_string()), dots),
            None => (None, 0),
        }
    }

    fn open_measure(&mut self, ctx: &EventContext) -> &mut ExportMeasure {
        let number = self.measures.len() + 1;
        let length = self.to_divisions(ctx.mensuration.breve_length()).max(1);
        self.current.get_or_insert_with(|| ExportMeasure::new(number, length))
    }

    fn close_measure_if_full(&mut self) {
        if self.current.as_ref().map_or(false, |m| m.filled() >= m.length) {
            if let Some(measure) = self.current.take() {
                self.measures.push(measure);
            }
        }
    }

    /// Emit attributes for whatever changed since the last emission
    fn sync_attributes(&mut self, ctx: &EventContext) {
        let mut attributes = AttributesData::default();
        let clef = clef_for(ctx);
        if clef.is_some() && clef != self.clef {
            attributes.clef = clef;
            self.clef = clef;
        }
        let fifths = ctx.key_signature.fifths();
        if self.key_fifths != Some(fifths) {
            attributes.key_fifths = Some(fifths);
            self.key_fifths = Some(fifths);
        }
        let time = time_for(&ctx.mensuration);
        if self.time != Some(time) {
            attributes.time = Some(time);
            self.time = Some(time);
        }
        if !attributes.is_empty() {
            self.open_measure(ctx).events.push(ExportEvent::Attributes(attributes));
        }
    }

    /// Split `total` divisions across measure boundaries
    fn place(&mut self, ctx: &EventContext, total: usize, mut emit: impl FnMut(&Self, Segment) -> Vec<ExportEvent>) {
        let mut remaining = total;
        let mut first = true;
        while remaining > 0 {
            self.open_measure(ctx);
            self.sync_attributes(ctx);
            let room = self
                .current
                .as_ref()
                .map_or(remaining, |m| m.length.saturating_sub(m.filled()).max(1));
            let take = remaining.min(room);
            remaining -= take;
            let items = emit(
                self,
                Segment {
                    duration: take,
                    first,
                    last: remaining == 0,
                },
            );
            self.open_measure(ctx).events.extend(items);
            self.close_measure_if_full();
            first = false;
        }
    }

    fn push_event(&mut self, event: &Event) {
        let total = self.to_divisions(sounding_length(event));
        if total == 0 {
            return;
        }
        let ctx = &event.context;
        let notes = event.notes();

        if notes.is_empty() {
            if matches!(event.kind, EventKind::Rest(_) | EventKind::Lacuna { .. } | EventKind::Multi(_)) {
                self.pending_tie_stop = false;
                self.place(ctx, total, |builder, seg| {
                    let (note_type, dots) = builder.note_type(seg.duration);
                    vec![ExportEvent::Rest(RestData {
                        duration: seg.duration,
                        note_type,
                        dots,
                    })]
                });
            }
            return;
        }

        let tie_in = std::mem::take(&mut self.pending_tie_stop);
        let tie_out = notes.iter().any(|n| n.tie);
        let lyric = notes.iter().find_map(|n| n.text.as_ref()).map(|text| {
            let syllabic = match (self.in_word, text.word_end) {
                (false, true) => Syllabic::Single,
                (false, false) => Syllabic::Begin,
                (true, false) => Syllabic::Middle,
                (true, true) => Syllabic::End,
            };
            self.in_word = !text.word_end;
            LyricData {
                syllable: text.syllable.clone(),
                syllabic,
            }
        });

        self.place(ctx, total, |builder, seg| {
            let (note_type, dots) = builder.note_type(seg.duration);
            notes
                .iter()
                .enumerate()
                .map(|(i, note)| {
                    ExportEvent::Note(NoteData {
                        pitch: pitch_info(note, ctx),
                        duration: seg.duration,
                        note_type: note_type.clone(),
                        dots,
                        chord: i > 0,
                        tie_start: !seg.last || tie_out,
                        tie_stop: !seg.first || tie_in,
                        lyric: if seg.first && i == 0 { lyric.clone() } else { None },
                        colored: note.colored,
                        fermata: note.corona && seg.last,
                    })
                })
                .collect()
        });
        self.pending_tie_stop = tie_out;
    }

    fn finish(mut self) -> Vec<ExportMeasure> {
        if let Some(measure) = self.current.take() {
            if !measure.is_empty() {
                self.measures.push(measure);
            }
        }
        self.measures
    }
}
