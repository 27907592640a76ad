// Ligature grouping, staff justification and incipit alignment

use mensural_engine::config::{FlowMode, LayoutConfig};
use mensural_engine::context::ContextSweep;
use mensural_engine::error::Diagnostic;
use mensural_engine::models::{
    Clef, ClefType, Event, EventContext, LigStatus, MusicSection, NoteEvent, NoteLetter, NoteType, Piece, Pitch,
    Proportion, VoiceEvents, VoiceInfo,
};
use mensural_engine::renderers::grouping::{group_events, GroupType};
use mensural_engine::renderers::{PartRenderer, TableMetrics};

fn brevis(letter: NoteLetter, lig: LigStatus) -> Event {
    Event::note(NoteEvent::new(NoteType::Brevis, Proportion::whole(4), Pitch::new(letter, 4)).ligated(lig))
}

fn minim(letter: NoteLetter) -> Event {
    Event::note(NoteEvent::new(NoteType::Minima, Proportion::ONE, Pitch::new(letter, 4)))
}

fn swept(voice: usize, events: Vec<Event>) -> VoiceEvents {
    let mut v = VoiceEvents::new(voice, events);
    v.sweep(&ContextSweep::new(), EventContext::default());
    v
}

#[test]
fn test_three_note_ligature_is_one_group() {
    let events = vec![
        brevis(NoteLetter::C, LigStatus::Recta),
        brevis(NoteLetter::D, LigStatus::Recta),
        brevis(NoteLetter::E, LigStatus::None),
    ];
    let grouping = group_events(&events);
    assert!(grouping.diagnostics.is_empty());
    assert_eq!(grouping.groups.len(), 1);
    let group = grouping.groups[0];
    assert_eq!((group.first, group.last), (0, 2));
    assert_eq!(group.group_type, GroupType::Ligature);
}

#[test]
fn test_unterminated_ligature_renders() {
    let voice = swept(
        0,
        vec![brevis(NoteLetter::C, LigStatus::Recta), Event::line_end(false)],
    );
    let metrics = TableMetrics::default();
    let config = LayoutConfig::default();
    let rendered = PartRenderer::new(&metrics, &config).render_voice(&voice, 0);
    assert_eq!(rendered.staves.len(), 1);
    assert!(rendered.staves[0].event(0).is_some());
}

#[test]
fn test_justified_staff_fills_width() {
    let mut events = vec![Event::clef(Clef::principal(ClefType::C, 4))];
    events.extend((0..8).map(|_| minim(NoteLetter::D)));
    events.push(Event::line_end(false));
    events.extend((0..3).map(|_| minim(NoteLetter::E)));
    let voice = swept(0, events);

    let metrics = TableMetrics::default();
    let config = LayoutConfig {
        staff_width: 300.0,
        ..LayoutConfig::default()
    };
    let rendered = PartRenderer::new(&metrics, &config).render_voice(&voice, 0);
    assert_eq!(rendered.staves.len(), 2);

    // clef 14 + 8 minims of 10 + line end 0, across 10 slots
    let first = &rendered.staves[0];
    let used: f32 = first.layout.groups.iter().map(|g| g.width + g.padding).sum();
    assert!((used - 300.0).abs() < 1e-3);

    // the last staff keeps the default padding
    let last = &rendered.staves[1];
    assert!(last.layout.groups.iter().all(|g| g.padding <= config.default_padding));
    assert!(last.total_x_size() < 300.0);
}

#[test]
fn test_auto_flow_splits_long_voice() {
    let events: Vec<Event> = (0..30).map(|_| minim(NoteLetter::F)).collect();
    let voice = swept(0, events);
    let metrics = TableMetrics::default();
    let config = LayoutConfig {
        flow: FlowMode::AutoFlow,
        groups_per_staff: 10,
        ..LayoutConfig::default()
    };
    let rendered = PartRenderer::new(&metrics, &config).render_voice(&voice, 0);
    assert_eq!(rendered.staves.len(), 3);
    assert!(rendered.staves.iter().all(|s| s.layout.groups.len() == 10));
}

#[test]
fn test_incipits_aligned_to_widest() {
    // widths 120, 150 and 100 with zero padding
    let metrics = TableMetrics::uniform(10.0);
    let config = LayoutConfig {
        min_padding: 0.0,
        default_padding: 0.0,
        ..LayoutConfig::default()
    };
    let voices: Vec<VoiceEvents> = [12usize, 15, 10]
        .iter()
        .enumerate()
        .map(|(v, &n)| {
            let mut events: Vec<Event> = (0..n).map(|_| minim(NoteLetter::G)).collect();
            events.push(Event::ellipsis());
            events.extend((0..4).map(|_| minim(NoteLetter::A)));
            swept(v, events)
        })
        .collect();
    let refs: Vec<&VoiceEvents> = voices.iter().collect();
    let rendered = PartRenderer::new(&metrics, &config).justify_incipits(&refs, 0);

    let paddings: Vec<f32> = rendered
        .iter()
        .zip([12usize, 15, 10])
        .map(|(voice, n)| {
            let staff = &voice.staves[0];
            assert_eq!(staff.incipit_width, Some(150.0));
            let span: f32 = staff.layout.groups[..n].iter().map(|g| g.width + g.padding).sum();
            assert!((span - 150.0).abs() < 1e-3);
            assert_eq!(staff.event(n).map(|e| e.x), Some(150.0));
            staff.layout.groups[0].padding
        })
        .collect();

    assert_eq!(paddings[1], 0.0);
    assert!(paddings[0] > 0.0);
    assert!(paddings[2] > paddings[0]);
    assert!(rendered.iter().all(|v| v.diagnostics.is_empty()));
}

#[test]
fn test_short_incipit_keeps_padding_bounds() {
    let metrics = TableMetrics::default();
    let config = LayoutConfig::default();
    let voices: Vec<VoiceEvents> = [1usize, 20]
        .iter()
        .enumerate()
        .map(|(v, &n)| {
            let mut events: Vec<Event> = (0..n).map(|_| minim(NoteLetter::C)).collect();
            events.push(Event::ellipsis());
            events.extend((0..2).map(|_| minim(NoteLetter::D)));
            swept(v, events)
        })
        .collect();
    let refs: Vec<&VoiceEvents> = voices.iter().collect();
    let rendered = PartRenderer::new(&metrics, &config).justify_incipits(&refs, 0);

    for (voice, n) in rendered.iter().zip([1usize, 20]) {
        let staff = &voice.staves[0];
        assert!(!staff.is_last);
        assert_eq!(staff.incipit_width, Some(400.0));
        assert_eq!(staff.event(n).map(|e| e.x), Some(400.0));
        // only the gap before the ellipsis may grow past the range
        let groups = &staff.layout.groups;
        assert!(groups[..n - 1].iter().all(|g| g.padding <= config.max_padding));
        assert!(groups[n..].iter().all(|g| g.padding <= config.max_padding));
    }
    assert_eq!(rendered[0].staves[0].layout.groups[0].padding, 390.0);
}

#[test]
fn test_inverted_padding_config_still_renders() {
    let events: Vec<Event> = (0..12).map(|_| minim(NoteLetter::E)).collect();
    let voice = swept(0, events);
    let metrics = TableMetrics::default();
    let config = LayoutConfig {
        min_padding: 50.0,
        max_padding: 10.0,
        flow: FlowMode::AutoFlow,
        groups_per_staff: 5,
        ..LayoutConfig::default()
    };
    let rendered = PartRenderer::new(&metrics, &config).render_voice(&voice, 0);
    assert_eq!(rendered.staves.len(), 3);
    for staff in &rendered.staves {
        assert!(staff.layout.groups.iter().all(|g| (10.0..=50.0).contains(&g.padding)));
    }
}

#[test]
fn test_piece_display_list() {
    let mut piece = Piece::new("Kyrie", "Anon.");
    piece.add_voice(VoiceInfo::new("Cantus"));
    piece.add_voice(VoiceInfo::new("Tenor"));
    let mut section = MusicSection::new(2);
    section.set_voice(VoiceEvents::new(
        0,
        vec![Event::clef(Clef::principal(ClefType::C, 0)), minim(NoteLetter::C), minim(NoteLetter::D)],
    ));
    section.set_voice(VoiceEvents::new(
        1,
        vec![Event::clef(Clef::principal(ClefType::C, 4)), brevis(NoteLetter::A, LigStatus::Recta)],
    ));
    piece.sections.push(section);
    let diagnostics = piece.sweep_all(&ContextSweep::new());
    assert_eq!(diagnostics, vec![Diagnostic::UnterminatedLigature { index: 1 }]);

    let metrics = TableMetrics::default();
    let config = LayoutConfig::default();
    let list = PartRenderer::new(&metrics, &config).render_piece(&piece);
    assert_eq!(list.voices.len(), 2);
    assert_eq!(list.title, "Kyrie");

    let json = list.to_json().expect("display list serializes");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    assert_eq!(value["voices"][1]["voice"], 1);
}
