//! MusicXML parser — converts MusicXML text into the Score data model.

use roxmltree::{Document, Node};

use crate::error::RemixError;
use crate::model::*;

/// Parse a MusicXML string into a Score.
pub fn parse_musicxml(xml: &str) -> Result<Score, RemixError> {
    // MusicXML files include a DOCTYPE declaration, so we must allow DTDs
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = Document::parse_with_options(xml, options)
        .map_err(|e| RemixError::Parse(e.to_string()))?;
    let root = doc.root_element();

    // Verify this is a score-partwise document
    if root.tag_name().name() != "score-partwise" {
        return Err(RemixError::UnsupportedRoot(
            root.tag_name().name().to_string(),
        ));
    }

    let mut score = Score::new();
    score.version = root.attribute("version").map(String::from);

    for child in root.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "work" => parse_work(&child, &mut score),
            "identification" => parse_identification(&child, &mut score),
            "defaults" => score.defaults = Some(parse_defaults(&child)),
            "credit" => parse_credit(&child, &mut score),
            "part-list" => parse_part_list(&child, &mut score),
            "part" => parse_part(&child, &mut score),
            _ => {}
        }
    }

    Ok(score)
}

// ─── Work ────────────────────────────────────────────────────────────

fn parse_work(node: &Node, score: &mut Score) {
    for child in node.children().filter(|n| n.is_element()) {
        if child.tag_name().name() == "work-title" {
            // Only use work-title as a fallback; <credit type="title"> takes priority.
            if score.title.is_none() {
                score.title = child.text().map(|t| t.trim().to_string());
            }
        }
    }
}

// ─── Identification ──────────────────────────────────────────────────

fn parse_identification(node: &Node, score: &mut Score) {
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "creator" => {
                let creator_type = child.attribute("type").unwrap_or("");
                let text = child.text().map(|t| t.trim().to_string());
                match creator_type {
                    "composer" => {
                        if score.composer.is_none() {
                            score.composer = text;
                        }
                    }
                    "arranger" => score.arranger = text,
                    _ => {}
                }
            }
            "encoding" => {
                for enc_child in child.children().filter(|n| n.is_element()) {
                    if enc_child.tag_name().name() == "software" {
                        score.software = enc_child.text().map(|t| t.trim().to_string());
                    }
                }
            }
            _ => {}
        }
    }
}

// ─── Defaults ────────────────────────────────────────────────────────

fn parse_defaults(node: &Node) -> Defaults {
    let mut defaults = Defaults {
        millimeters: None,
        tenths: None,
        page_height: None,
        page_width: None,
        left_margin: None,
        right_margin: None,
        top_margin: None,
        bottom_margin: None,
    };

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "scaling" => {
                for sc in child.children().filter(|n| n.is_element()) {
                    match sc.tag_name().name() {
                        "millimeters" => defaults.millimeters = parse_f64(&sc),
                        "tenths" => defaults.tenths = parse_f64(&sc),
                        _ => {}
                    }
                }
            }
            "page-layout" => {
                for pl in child.children().filter(|n| n.is_element()) {
                    match pl.tag_name().name() {
                        "page-height" => defaults.page_height = parse_f64(&pl),
                        "page-width" => defaults.page_width = parse_f64(&pl),
                        "page-margins" => {
                            for pm in pl.children().filter(|n| n.is_element()) {
                                match pm.tag_name().name() {
                                    "left-margin" => defaults.left_margin = parse_f64(&pm),
                                    "right-margin" => defaults.right_margin = parse_f64(&pm),
                                    "top-margin" => defaults.top_margin = parse_f64(&pm),
                                    "bottom-margin" => defaults.bottom_margin = parse_f64(&pm),
                                    _ => {}
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    defaults
}

// ─── Credits ─────────────────────────────────────────────────────────

fn parse_credit(node: &Node, score: &mut Score) {
    let mut credit_type = String::new();
    let mut credit_text = String::new();

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "credit-type" => {
                credit_type = child.text().unwrap_or("").trim().to_string();
            }
            "credit-words" => {
                let text = child.text().unwrap_or("").trim();
                if !text.is_empty() {
                    if !credit_text.is_empty() {
                        credit_text.push('\n');
                    }
                    credit_text.push_str(text);
                }
            }
            _ => {}
        }
    }

    // <credit> values are the primary source for title and composer;
    // <work-title> and <creator type="composer"> are fallbacks.
    match credit_type.as_str() {
        "title" => {
            if !credit_text.is_empty() {
                score.title = Some(credit_text);
            }
        }
        "subtitle" => score.subtitle = Some(credit_text),
        "composer" => {
            if !credit_text.is_empty() {
                score.composer = Some(credit_text);
            }
        }
        _ => {}
    }
}

// ─── Part List ───────────────────────────────────────────────────────

fn parse_part_list(node: &Node, score: &mut Score) {
    for child in node.children().filter(|n| n.is_element()) {
        if child.tag_name().name() == "score-part" {
            let id = child.attribute("id").unwrap_or("").to_string();
            let mut part = Part {
                id,
                name: String::new(),
                abbreviation: None,
                midi_program: None,
                midi_channel: None,
                measures: Vec::new(),
            };

            for sp_child in child.children().filter(|n| n.is_element()) {
                match sp_child.tag_name().name() {
                    "part-name" => {
                        part.name = sp_child.text().unwrap_or("").trim().to_string();
                    }
                    "part-abbreviation" => {
                        part.abbreviation = sp_child.text().map(|t| t.trim().to_string());
                    }
                    "midi-instrument" => {
                        for midi in sp_child.children().filter(|n| n.is_element()) {
                            match midi.tag_name().name() {
                                "midi-channel" => part.midi_channel = parse_i32(&midi),
                                "midi-program" => part.midi_program = parse_i32(&midi),
                                _ => {}
                            }
                        }
                    }
                    _ => {}
                }
            }

            score.parts.push(part);
        }
    }
}

// ─── Part (measures) ─────────────────────────────────────────────────

fn parse_part(node: &Node, score: &mut Score) {
    let part_id = node.attribute("id").unwrap_or("").to_string();

    // Find the matching part from the part-list
    let part = match score.parts.iter_mut().find(|p| p.id == part_id) {
        Some(p) => p,
        None => return,
    };

    for child in node.children().filter(|n| n.is_element()) {
        if child.tag_name().name() == "measure" {
            part.measures.push(parse_measure(&child));
        }
    }
}

// ─── Measure ─────────────────────────────────────────────────────────

fn parse_measure(node: &Node) -> Measure {
    let number = node
        .attribute("number")
        .and_then(|n| n.parse::<i32>().ok())
        .unwrap_or(0);

    let mut measure = Measure::empty(number);
    measure.implicit = node.attribute("implicit") == Some("yes");

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "attributes" => measure.attributes = Some(parse_attributes(&child)),
            "note" => measure.notes.push(parse_note(&child)),
            "harmony" => measure.harmonies.push(parse_harmony(&child)),
            "barline" => measure.barlines.push(parse_barline(&child)),
            "direction" => {
                if let Some(dir) = parse_direction(&child) {
                    measure.directions.push(dir);
                }
            }
            "sound" => {
                // <sound> can appear directly in <measure> (not inside <direction>)
                if let Some(tempo) = child.attribute("tempo").and_then(|t| t.parse::<f64>().ok()) {
                    measure.directions.push(Direction {
                        placement: Some("above".to_string()),
                        words: None,
                        sound_tempo: Some(tempo),
                    });
                }
            }
            "print" => {
                if child.attribute("new-system") == Some("yes") {
                    measure.new_system = true;
                }
                if child.attribute("new-page") == Some("yes") {
                    measure.new_page = true;
                }
            }
            _ => {}
        }
    }

    measure
}

// ─── Attributes ──────────────────────────────────────────────────────

fn parse_attributes(node: &Node) -> Attributes {
    let mut attrs = Attributes::default();

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "divisions" => attrs.divisions = parse_i32(&child),
            "key" => attrs.key = Some(parse_key(&child)),
            "time" => attrs.time = Some(parse_time(&child)),
            "staves" => attrs.staves = parse_i32(&child),
            "clef" => attrs.clefs.push(parse_clef(&child)),
            "staff-details" => attrs.staff_details.push(parse_staff_details(&child)),
            _ => {}
        }
    }

    attrs
}

fn parse_key(node: &Node) -> Key {
    let mut key = Key {
        fifths: 0,
        mode: None,
    };
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "fifths" => key.fifths = parse_i32(&child).unwrap_or(0),
            "mode" => key.mode = child.text().map(|t| t.trim().to_string()),
            _ => {}
        }
    }
    key
}

fn parse_time(node: &Node) -> TimeSignature {
    let mut ts = TimeSignature {
        beats: 4,
        beat_type: 4,
    };
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "beats" => ts.beats = parse_i32(&child).unwrap_or(4),
            "beat-type" => ts.beat_type = parse_i32(&child).unwrap_or(4),
            _ => {}
        }
    }
    ts
}

fn parse_clef(node: &Node) -> Clef {
    let number = node
        .attribute("number")
        .and_then(|n| n.parse::<i32>().ok())
        .unwrap_or(1);
    let mut clef = Clef {
        number,
        sign: "G".to_string(),
        line: 2,
        octave_change: None,
    };
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "sign" => {
                clef.sign = child.text().unwrap_or("G").trim().to_string();
            }
            "line" => clef.line = parse_i32(&child).unwrap_or(2),
            "clef-octave-change" => clef.octave_change = parse_i32(&child),
            _ => {}
        }
    }
    clef
}

fn parse_staff_details(node: &Node) -> StaffDetails {
    let number = node
        .attribute("number")
        .and_then(|n| n.parse::<i32>().ok())
        .unwrap_or(1);
    let mut details = StaffDetails {
        number,
        staff_lines: None,
    };
    for child in node.children().filter(|n| n.is_element()) {
        if child.tag_name().name() == "staff-lines" {
            details.staff_lines = parse_i32(&child);
        }
    }
    details
}

// ─── Note ────────────────────────────────────────────────────────────

fn parse_note(node: &Node) -> Note {
    let mut note = Note::default();

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "pitch" => note.pitch = Some(parse_pitch(&child)),
            "duration" => note.duration = parse_i32(&child).unwrap_or(0),
            "voice" => note.voice = parse_i32(&child),
            "staff" => note.staff = parse_i32(&child),
            "type" => {
                note.note_type = child.text().map(|t| t.trim().to_string());
            }
            "stem" => {
                note.stem = child.text().map(|t| t.trim().to_string());
            }
            "beam" => {
                let number = child
                    .attribute("number")
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(1);
                let beam_type = child.text().unwrap_or("").trim().to_string();
                note.beams.push(Beam { number, beam_type });
            }
            "rest" => {
                note.rest = true;
                if child.attribute("measure") == Some("yes") {
                    note.measure_rest = true;
                }
            }
            "grace" => note.grace = true,
            "chord" => note.chord = true,
            "dot" => note.dots += 1,
            "accidental" => {
                note.accidental = child.text().map(|t| t.trim().to_string());
            }
            "time-modification" => {
                let mut tm = TimeModification {
                    actual_notes: 1,
                    normal_notes: 1,
                };
                for tc in child.children().filter(|n| n.is_element()) {
                    match tc.tag_name().name() {
                        "actual-notes" => tm.actual_notes = parse_i32(&tc).unwrap_or(1),
                        "normal-notes" => tm.normal_notes = parse_i32(&tc).unwrap_or(1),
                        _ => {}
                    }
                }
                note.time_modification = Some(tm);
            }
            "tie" => match child.attribute("type") {
                Some("start") => note.tie_start = true,
                Some("stop") => note.tie_stop = true,
                _ => {}
            },
            _ => {}
        }
    }

    note
}

fn parse_pitch(node: &Node) -> Pitch {
    let mut pitch = Pitch {
        step: "C".to_string(),
        octave: 4,
        alter: None,
    };
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "step" => {
                pitch.step = child.text().unwrap_or("C").trim().to_string();
            }
            "octave" => pitch.octave = parse_i32(&child).unwrap_or(4),
            "alter" => pitch.alter = parse_f64(&child),
            _ => {}
        }
    }
    pitch
}

// ─── Harmony ─────────────────────────────────────────────────────────

fn parse_harmony(node: &Node) -> Harmony {
    let mut root = HarmonyRoot {
        step: "C".to_string(),
        alter: None,
    };
    let mut kind = "major".to_string();
    let mut bass = None;

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "root" => {
                for rc in child.children().filter(|n| n.is_element()) {
                    match rc.tag_name().name() {
                        "root-step" => {
                            root.step = rc.text().unwrap_or("C").trim().to_string();
                        }
                        "root-alter" => root.alter = parse_f64(&rc),
                        _ => {}
                    }
                }
            }
            "kind" => {
                kind = child.text().unwrap_or("major").trim().to_string();
            }
            "bass" => {
                let mut b = HarmonyRoot {
                    step: "C".to_string(),
                    alter: None,
                };
                for bc in child.children().filter(|n| n.is_element()) {
                    match bc.tag_name().name() {
                        "bass-step" => {
                            b.step = bc.text().unwrap_or("C").trim().to_string();
                        }
                        "bass-alter" => b.alter = parse_f64(&bc),
                        _ => {}
                    }
                }
                bass = Some(b);
            }
            _ => {}
        }
    }

    Harmony { root, kind, bass }
}

// ─── Barline ─────────────────────────────────────────────────────────

fn parse_barline(node: &Node) -> Barline {
    let location = node.attribute("location").unwrap_or("right").to_string();
    let mut barline = Barline {
        location,
        bar_style: None,
        repeat: None,
    };

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "bar-style" => {
                barline.bar_style = child.text().map(|t| t.trim().to_string());
            }
            "repeat" => {
                barline.repeat = child.attribute("direction").map(String::from);
            }
            _ => {}
        }
    }

    barline
}

// ─── Direction ───────────────────────────────────────────────────────

fn parse_direction(node: &Node) -> Option<Direction> {
    let placement = node.attribute("placement").map(String::from);
    let mut words = None;
    let mut sound_tempo = None;

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "direction-type" => {
                for dt_child in child.children().filter(|n| n.is_element()) {
                    if dt_child.tag_name().name() == "words" {
                        words = dt_child.text().map(|t| t.trim().to_string());
                    }
                }
            }
            "sound" => {
                if let Some(tempo) = child.attribute("tempo").and_then(|t| t.parse::<f64>().ok()) {
                    sound_tempo = Some(tempo);
                }
            }
            _ => {}
        }
    }

    if words.is_some() || sound_tempo.is_some() {
        Some(Direction {
            placement,
            words,
            sound_tempo,
        })
    } else {
        None
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn parse_i32(node: &Node) -> Option<i32> {
    node.text()?.trim().parse().ok()
}

fn parse_f64(node: &Node) -> Option<f64> {
    node.text()?.trim().parse().ok()
}
