//! MusicXML emitter - consumes the export tree and emits a score-partwise 3.1 document

use crate::error::ExportError;
use crate::ir::types::*;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

const DOCTYPE: &str = r#"score-partwise PUBLIC "-//Recordare//DTD MusicXML 3.1 Partwise//EN" "http://www.musicxml.org/dtds/partwise.dtd""#;

/// Thin wrapper mapping writer errors into `ExportError`
struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), ExportError> {
        self.writer
            .write_event(event)
            .map_err(|e| ExportError::Xml(e.to_string()))
    }

    fn start(&mut self, name: &str) -> Result<(), ExportError> {
        self.write(Event::Start(BytesStart::new(name)))
    }

    fn start_with(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), ExportError> {
        let element = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.write(Event::Start(element))
    }

    fn end(&mut self, name: &str) -> Result<(), ExportError> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), ExportError> {
        let element = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.write(Event::Empty(element))
    }

    /// `<name>text</name>`, text escaped
    fn text_element(&mut self, name: &str, text: &str) -> Result<(), ExportError> {
        self.start(name)?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn finish(self) -> Result<String, ExportError> {
        Ok(String::from_utf8(self.writer.into_inner())?)
    }
}

/// Emit a complete MusicXML document
pub fn emit_musicxml(score: &ExportScore) -> Result<String, ExportError> {
    if score.parts.is_empty() {
        return Err(ExportError::EmptyScore);
    }
    let mut out = XmlOut::new();
    out.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    out.write(Event::DocType(BytesText::from_escaped(DOCTYPE)))?;
    out.start_with("score-partwise", &[("version", "3.1")])?;

    if !score.title.is_empty() {
        out.text_element("movement-title", &score.title)?;
    }
    if !score.composer.is_empty() {
        out.start("identification")?;
        out.start_with("creator", &[("type", "composer")])?;
        out.write(Event::Text(BytesText::new(&score.composer)))?;
        out.end("creator")?;
        out.end("identification")?;
    }

    out.start("part-list")?;
    for part in &score.parts {
        out.start_with("score-part", &[("id", part.part_id.as_str())])?;
        out.text_element("part-name", &part.label)?;
        out.end("score-part")?;
    }
    out.end("part-list")?;

    for part in &score.parts {
        emit_part(&mut out, part)?;
    }

    out.end("score-partwise")?;
    let xml = out.finish()?;
    log::debug!("emitted MusicXML: {} parts, {} bytes", score.parts.len(), xml.len());
    Ok(xml)
}

fn emit_part(out: &mut XmlOut, part: &ExportPart) -> Result<(), ExportError> {
    out.start_with("part", &[("id", part.part_id.as_str())])?;
    for (i, measure) in part.measures.iter().enumerate() {
        let number = measure.number.to_string();
        out.start_with("measure", &[("number", number.as_str())])?;
        if i == 0 {
            // divisions go with the first attributes block
            let first_attributes = match measure.events.first() {
                Some(ExportEvent::Attributes(a)) => Some(a),
                _ => None,
            };
            emit_attributes(out, first_attributes, Some(part.divisions))?;
        }
        for (j, event) in measure.events.iter().enumerate() {
            match event {
                ExportEvent::Attributes(_) if i == 0 && j == 0 => {}
                ExportEvent::Attributes(a) => emit_attributes(out, Some(a), None)?,
                ExportEvent::Note(note) => emit_note(out, note)?,
                ExportEvent::Rest(rest) => emit_rest(out, rest)?,
            }
        }
        if !measure.validate() {
            log::debug!(
                "part {} measure {} holds {} of {} divisions",
                part.part_id,
                measure.number,
                measure.filled(),
                measure.length
            );
        }
        out.end("measure")?;
    }
    out.end("part")
}

fn emit_attributes(out: &mut XmlOut, attributes: Option<&AttributesData>, divisions: Option<usize>) -> Result<(), ExportError> {
    out.start("attributes")?;
    if let Some(divisions) = divisions {
        out.text_element("divisions", &divisions.to_string())?;
    }
    if let Some(attributes) = attributes {
        if let Some(fifths) = attributes.key_fifths {
            out.start("key")?;
            out.text_element("fifths", &fifths.to_string())?;
            out.end("key")?;
        }
        if let Some(time) = attributes.time {
            out.start("time")?;
            out.text_element("beats", &time.beats.to_string())?;
            out.text_element("beat-type", &time.beat_type.to_string())?;
            out.end("time")?;
        }
        if let Some(clef) = attributes.clef {
            out.start("clef")?;
            out.text_element("sign", &clef.sign.to_string())?;
            out.text_element("line", &clef.line.to_string())?;
            if clef.octave_change != 0 {
                out.text_element("clef-octave-change", &clef.octave_change.to_string())?;
            }
            out.end("clef")?;
        }
    }
    out.end("attributes")
}

fn emit_note(out: &mut XmlOut, note: &NoteData) -> Result<(), ExportError> {
    out.start("note")?;
    if note.chord {
        out.empty("chord", &[])?;
    }
    out.start("pitch")?;
    out.text_element("step", &note.pitch.step.to_string())?;
    if note.pitch.alter != 0 {
        out.text_element("alter", &note.pitch.alter.to_string())?;
    }
    out.text_element("octave", &note.pitch.octave.to_string())?;
    out.end("pitch")?;
    out.text_element("duration", &note.duration.to_string())?;
    if note.tie_stop {
        out.empty("tie", &[("type", "stop")])?;
    }
    if note.tie_start {
        out.empty("tie", &[("type", "start")])?;
    }
    emit_type_and_dots(out, note.note_type.as_deref(), note.dots)?;
    if note.colored {
        out.empty("notehead", &[("filled", "yes")])?;
    }

    if note.tie_start || note.tie_stop || note.fermata {
        out.start("notations")?;
        if note.tie_stop {
            out.empty("tied", &[("type", "stop")])?;
        }
        if note.tie_start {
            out.empty("tied", &[("type", "start")])?;
        }
        if note.fermata {
            out.empty("fermata", &[])?;
        }
        out.end("notations")?;
    }

    if let Some(lyric) = &note.lyric {
        out.start_with("lyric", &[("number", "1")])?;
        out.text_element("syllabic", lyric.syllabic.as_str())?;
        out.text_element("text", &lyric.syllable)?;
        out.end("lyric")?;
    }
    out.end("note")
}

fn emit_rest(out: &mut XmlOut, rest: &RestData) -> Result<(), ExportError> {
    out.start("note")?;
    out.empty("rest", &[])?;
    out.text_element("duration", &rest.duration.to_string())?;
    emit_type_and_dots(out, rest.note_type.as_deref(), rest.dots)?;
    out.end("note")
}

fn emit_type_and_dots(out: &mut XmlOut, note_type: Option<&str>, dots: usize) -> Result<(), ExportError> {
    if let Some(note_type) = note_type {
        out.text_element("type", note_type)?;
        for _ in 0..dots {
            out.empty("dot", &[])?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_score() -> ExportScore {
        let mut measure = ExportMeasure::new(1, 4);
        measure.events.push(ExportEvent::Attributes(AttributesData {
            clef: Some(ClefData {
                sign: 'G',
                line: 2,
                octave_change: -1,
            }),
            key_fifths: Some(-1),
            time: Some(TimeData { beats: 2, beat_type: 2 }),
        }));
        measure.events.push(ExportEvent::Note(NoteData {
            pitch: PitchInfo {
                step: 'B',
                alter: -1,
                octave: 3,
            },
            duration: 3,
            note_type: Some("half".to_string()),
            dots: 1,
            chord: false,
            tie_start: false,
            tie_stop: false,
            lyric: Some(LyricData {
                syllable: "A&men".to_string(),
                syllabic: Syllabic::Single,
            }),
            colored: false,
            fermata: true,
        }));
        measure.events.push(ExportEvent::Rest(RestData {
            duration: 1,
            note_type: Some("quarter".to_string()),
            dots: 0,
        }));
        ExportScore {
            title: "Missa".to_string(),
            composer: "Anon.".to_string(),
            parts: vec![ExportPart {
                part_id: "P1".to_string(),
                label: "Tenor".to_string(),
                divisions: 1,
                measures: vec![measure],
            }],
        }
    }

    #[test]
    fn test_document_shape() {
        let xml = emit_musicxml(&sample_score()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<score-partwise version=\"3.1\">"));
        assert!(xml.contains("<movement-title>Missa</movement-title>"));
        assert!(xml.contains("<part-name>Tenor</part-name>"));
        assert!(xml.contains("<divisions>1</divisions>"));
        assert!(xml.contains("<clef-octave-change>-1</clef-octave-change>"));
        assert!(xml.contains("<fermata/>"));
        assert!(xml.contains("<dot/>"));
    }

    #[test]
    fn test_lyric_text_is_escaped() {
        let xml = emit_musicxml(&sample_score()).unwrap();
        assert!(xml.contains("A&amp;men"));
    }

    #[test]
    fn test_first_attributes_merged_with_divisions() {
        let xml = emit_musicxml(&sample_score()).unwrap();
        assert_eq!(xml.matches("<attributes>").count(), 1);
    }

    #[test]
    fn test_empty_score_rejected() {
        let score = ExportScore {
            title: String::new(),
            composer: String::new(),
            parts: Vec::new(),
        };
        assert!(matches!(emit_musicxml(&score), Err(ExportError::EmptyScore)));
    }
}
