//! Integration tests — parse the sample files in the sheetmusic/ directory.

use rhythmlib::{parse_file, RemixError, Score};
use std::path::PathBuf;

/// Get the path to the sheetmusic directory (relative to the crate root).
fn sheetmusic_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("sheetmusic")
}

// ─── Uncompressed MusicXML (.musicxml) ──────────────────────────────

#[test]
fn parse_clap_patterns_musicxml() {
    let path = sheetmusic_dir().join("clap-patterns.musicxml");
    let score = parse_file(&path).expect("Failed to parse clap-patterns.musicxml");

    assert_score_clap_patterns(&score);
}

fn assert_score_clap_patterns(score: &Score) {
    // Metadata
    assert_eq!(score.title.as_deref(), Some("Clap Patterns"));
    assert_eq!(score.composer.as_deref(), Some("Trad."));
    assert_eq!(score.version.as_deref(), Some("4.0"));
    assert_eq!(score.software.as_deref(), Some("MuseScore 4.2.1"));

    // Parts
    assert_eq!(score.parts.len(), 1);
    let part = &score.parts[0];
    assert_eq!(part.id, "P1");
    assert_eq!(part.name, "Claps");
    assert_eq!(part.abbreviation.as_deref(), Some("Cl."));
    assert_eq!(part.midi_channel, Some(10));

    // Measures: five one-beat patterns
    assert_eq!(part.measures.len(), 5);

    let m0 = &part.measures[0];
    assert_eq!(m0.number, 1);
    assert!(m0.new_system, "First measure carries a new-system print hint");

    let attrs = m0
        .attributes
        .as_ref()
        .expect("First measure should have attributes");
    assert_eq!(attrs.divisions, Some(4));

    let time = attrs.time.as_ref().expect("Should have time signature");
    assert_eq!(time.beats, 1);
    assert_eq!(time.beat_type, 4);

    let clef = &attrs.clefs[0];
    assert_eq!(clef.sign, "G");
    assert_eq!(clef.line, 2);

    // The source staff is a single rhythm line
    assert_eq!(attrs.staff_lines(), Some(1));

    // Tempo direction on the first measure
    let tempo = m0
        .directions
        .iter()
        .find_map(|d| d.sound_tempo)
        .expect("Should have a tempo direction");
    assert!((tempo - 120.0).abs() < f64::EPSILON);
    assert!(m0
        .directions
        .iter()
        .any(|d| d.words.as_deref() == Some("Steady")));

    // One quarter in measure 1, beamed sixteenths in measure 3
    assert_eq!(m0.notes.len(), 1);
    assert_eq!(m0.notes[0].note_type.as_deref(), Some("quarter"));
    assert_eq!(m0.notes[0].pitch.as_ref().map(|p| p.to_midi()), Some(71));

    let m2 = &part.measures[2];
    assert_eq!(m2.notes.len(), 4);
    assert!(m2
        .notes
        .iter()
        .all(|n| n.note_type.as_deref() == Some("16th")));
    assert_eq!(m2.notes[0].beams.len(), 2);
    assert_eq!(m2.notes[0].beams[0].beam_type, "begin");
    assert_eq!(m2.notes[3].beams[1].beam_type, "end");

    // Rest in the last pattern, and a final barline
    let m4 = &part.measures[4];
    assert!(m4.notes[0].rest);
    assert_eq!(m4.barlines[0].bar_style.as_deref(), Some("light-heavy"));
}

// ─── Compressed MXL (.mxl) ──────────────────────────────────────────

#[test]
fn parse_clap_patterns_mxl() {
    let path = sheetmusic_dir().join("clap-patterns.mxl");
    let score = parse_file(&path).expect("Failed to parse clap-patterns.mxl");

    assert_score_clap_patterns(&score);
}

// ─── Minimal file (attributes only on the first measure) ────────────

#[test]
fn parse_bare_patterns_musicxml() {
    let path = sheetmusic_dir().join("bare-patterns.musicxml");
    let score = parse_file(&path).expect("Failed to parse bare-patterns.musicxml");

    assert!(score.title.is_none());
    assert_eq!(score.measure_count(), 2);

    let part = &score.parts[0];
    let attrs = part.measures[0]
        .attributes
        .as_ref()
        .expect("First measure should have attributes");
    assert_eq!(attrs.divisions, Some(2));
    assert!(attrs.time.is_none());
    assert!(attrs.clefs.is_empty());

    // Second measure declares nothing of its own
    assert!(part.measures[1].attributes.is_none());
    assert!(part.measures[1].notes[0].rest);
}

// ─── Auto-detection ─────────────────────────────────────────────────

#[test]
fn auto_detect_format() {
    let musicxml_path = sheetmusic_dir().join("clap-patterns.musicxml");
    let data = std::fs::read(&musicxml_path).unwrap();
    let score = rhythmlib::parse_bytes(&data, None).expect("Should auto-detect musicxml");
    assert_eq!(score.title.as_deref(), Some("Clap Patterns"));

    let mxl_path = sheetmusic_dir().join("clap-patterns.mxl");
    let data = std::fs::read(&mxl_path).unwrap();
    let score = rhythmlib::parse_bytes(&data, None).expect("Should auto-detect mxl");
    assert_eq!(score.title.as_deref(), Some("Clap Patterns"));
}

// ─── Error paths ────────────────────────────────────────────────────

#[test]
fn missing_file_reports_path() {
    let err = parse_file(sheetmusic_dir().join("does-not-exist.musicxml")).unwrap_err();
    match err {
        RemixError::Read { ref path, .. } => assert!(path.contains("does-not-exist")),
        other => panic!("expected Read error, got {other:?}"),
    }
    assert!(!err.is_advisory());
}

#[test]
fn non_partwise_root_is_rejected() {
    let xml = r#"<?xml version="1.0"?><score-timewise version="4.0"></score-timewise>"#;
    let err = rhythmlib::parse_musicxml(xml).unwrap_err();
    assert!(matches!(err, RemixError::UnsupportedRoot(_)));
}

// ─── JSON serialization ─────────────────────────────────────────────

#[test]
fn score_to_json_roundtrip() {
    let path = sheetmusic_dir().join("clap-patterns.musicxml");
    let score = parse_file(&path).unwrap();
    let json = rhythmlib::score_to_json(&score).expect("Should serialize to JSON");

    let deserialized: Score = serde_json::from_str(&json).expect("Should deserialize from JSON");
    assert_eq!(deserialized.title, score.title);
    assert_eq!(deserialized.composer, score.composer);
    assert_eq!(deserialized.parts.len(), score.parts.len());
}
