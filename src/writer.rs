//! MusicXML writer — serializes a Score back into a standalone
//! `score-partwise` document string.
//!
//! The output always begins with an XML declaration and round-trips
//! through [`crate::parser::parse_musicxml`].

use crate::model::*;

/// The declaration every serialized document begins with.
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

/// Prepend an XML declaration when the string lacks one.
pub fn ensure_declaration(xml: &str) -> String {
    if xml.trim_start().starts_with("<?xml") {
        xml.to_string()
    } else {
        format!("{XML_DECLARATION}\n{xml}")
    }
}

/// Serialize a Score into a complete MusicXML string.
pub fn score_to_musicxml(score: &Score) -> String {
    let mut w = XmlWriter::new();

    let version = score.version.as_deref().unwrap_or("4.0");
    w.open_with(
        "score-partwise",
        &[("version", version)],
    );

    if let Some(ref title) = score.title {
        w.open("work");
        w.leaf("work-title", title);
        w.close("work");
    }

    write_identification(&mut w, score);

    if let Some(ref defaults) = score.defaults {
        write_defaults(&mut w, defaults);
    }

    w.open("part-list");
    for part in &score.parts {
        w.open_with("score-part", &[("id", &part.id)]);
        w.leaf("part-name", &part.name);
        if let Some(ref abbr) = part.abbreviation {
            w.leaf("part-abbreviation", abbr);
        }
        if part.midi_channel.is_some() || part.midi_program.is_some() {
            let instrument_id = format!("{}-I1", part.id);
            w.open_with("midi-instrument", &[("id", &instrument_id)]);
            if let Some(ch) = part.midi_channel {
                w.leaf("midi-channel", &ch.to_string());
            }
            if let Some(prog) = part.midi_program {
                w.leaf("midi-program", &prog.to_string());
            }
            w.close("midi-instrument");
        }
        w.close("score-part");
    }
    w.close("part-list");

    for part in &score.parts {
        w.open_with("part", &[("id", &part.id)]);
        for measure in &part.measures {
            write_measure(&mut w, measure);
        }
        w.close("part");
    }

    w.close("score-partwise");
    w.finish()
}

fn write_identification(w: &mut XmlWriter, score: &Score) {
    let has_creator = score.composer.is_some() || score.arranger.is_some();
    if !has_creator && score.software.is_none() {
        return;
    }
    w.open("identification");
    if let Some(ref composer) = score.composer {
        w.leaf_with("creator", &[("type", "composer")], composer);
    }
    if let Some(ref arranger) = score.arranger {
        w.leaf_with("creator", &[("type", "arranger")], arranger);
    }
    if let Some(ref software) = score.software {
        w.open("encoding");
        w.leaf("software", software);
        w.close("encoding");
    }
    w.close("identification");
}

fn write_defaults(w: &mut XmlWriter, defaults: &Defaults) {
    w.open("defaults");
    if defaults.millimeters.is_some() || defaults.tenths.is_some() {
        w.open("scaling");
        if let Some(mm) = defaults.millimeters {
            w.leaf("millimeters", &format_number(mm));
        }
        if let Some(t) = defaults.tenths {
            w.leaf("tenths", &format_number(t));
        }
        w.close("scaling");
    }
    let has_page = defaults.page_height.is_some() || defaults.page_width.is_some();
    let has_margins = defaults.left_margin.is_some()
        || defaults.right_margin.is_some()
        || defaults.top_margin.is_some()
        || defaults.bottom_margin.is_some();
    if has_page || has_margins {
        w.open("page-layout");
        if let Some(h) = defaults.page_height {
            w.leaf("page-height", &format_number(h));
        }
        if let Some(pw) = defaults.page_width {
            w.leaf("page-width", &format_number(pw));
        }
        if has_margins {
            w.open_with("page-margins", &[("type", "both")]);
            if let Some(m) = defaults.left_margin {
                w.leaf("left-margin", &format_number(m));
            }
            if let Some(m) = defaults.right_margin {
                w.leaf("right-margin", &format_number(m));
            }
            if let Some(m) = defaults.top_margin {
                w.leaf("top-margin", &format_number(m));
            }
            if let Some(m) = defaults.bottom_margin {
                w.leaf("bottom-margin", &format_number(m));
            }
            w.close("page-margins");
        }
        w.close("page-layout");
    }
    w.close("defaults");
}

fn write_measure(w: &mut XmlWriter, measure: &Measure) {
    let number = measure.number.to_string();
    let mut attrs: Vec<(&str, &str)> = vec![("number", &number)];
    if measure.implicit {
        attrs.push(("implicit", "yes"));
    }
    w.open_with("measure", &attrs);

    if measure.new_system || measure.new_page {
        let mut print_attrs: Vec<(&str, &str)> = Vec::new();
        if measure.new_system {
            print_attrs.push(("new-system", "yes"));
        }
        if measure.new_page {
            print_attrs.push(("new-page", "yes"));
        }
        w.empty_with("print", &print_attrs);
    }

    if let Some(ref a) = measure.attributes {
        write_attributes(w, a);
    }

    for direction in &measure.directions {
        write_direction(w, direction);
    }

    for harmony in &measure.harmonies {
        write_harmony(w, harmony);
    }

    for note in &measure.notes {
        write_note(w, note);
    }

    for barline in &measure.barlines {
        write_barline(w, barline);
    }

    w.close("measure");
}

fn write_attributes(w: &mut XmlWriter, a: &Attributes) {
    w.open("attributes");
    if let Some(d) = a.divisions {
        w.leaf("divisions", &d.to_string());
    }
    if let Some(ref key) = a.key {
        w.open("key");
        w.leaf("fifths", &key.fifths.to_string());
        if let Some(ref mode) = key.mode {
            w.leaf("mode", mode);
        }
        w.close("key");
    }
    if let Some(ref time) = a.time {
        w.open("time");
        w.leaf("beats", &time.beats.to_string());
        w.leaf("beat-type", &time.beat_type.to_string());
        w.close("time");
    }
    if let Some(staves) = a.staves {
        w.leaf("staves", &staves.to_string());
    }
    for clef in &a.clefs {
        let number = clef.number.to_string();
        w.open_with("clef", &[("number", &number)]);
        w.leaf("sign", &clef.sign);
        w.leaf("line", &clef.line.to_string());
        if let Some(oc) = clef.octave_change {
            w.leaf("clef-octave-change", &oc.to_string());
        }
        w.close("clef");
    }
    for details in &a.staff_details {
        let number = details.number.to_string();
        w.open_with("staff-details", &[("number", &number)]);
        if let Some(lines) = details.staff_lines {
            w.leaf("staff-lines", &lines.to_string());
        }
        w.close("staff-details");
    }
    w.close("attributes");
}

fn write_note(w: &mut XmlWriter, note: &Note) {
    w.open("note");
    if note.grace {
        w.empty("grace");
    }
    if note.chord {
        w.empty("chord");
    }
    if let Some(ref pitch) = note.pitch {
        w.open("pitch");
        w.leaf("step", &pitch.step);
        if let Some(alter) = pitch.alter {
            w.leaf("alter", &format_number(alter));
        }
        w.leaf("octave", &pitch.octave.to_string());
        w.close("pitch");
    } else if note.rest {
        if note.measure_rest {
            w.empty_with("rest", &[("measure", "yes")]);
        } else {
            w.empty("rest");
        }
    }
    // Grace notes carry no duration in MusicXML
    if !note.grace {
        w.leaf("duration", &note.duration.to_string());
    }
    if note.tie_start {
        w.empty_with("tie", &[("type", "start")]);
    }
    if note.tie_stop {
        w.empty_with("tie", &[("type", "stop")]);
    }
    if let Some(voice) = note.voice {
        w.leaf("voice", &voice.to_string());
    }
    if let Some(ref t) = note.note_type {
        w.leaf("type", t);
    }
    for _ in 0..note.dots {
        w.empty("dot");
    }
    if let Some(ref acc) = note.accidental {
        w.leaf("accidental", acc);
    }
    if let Some(ref tm) = note.time_modification {
        w.open("time-modification");
        w.leaf("actual-notes", &tm.actual_notes.to_string());
        w.leaf("normal-notes", &tm.normal_notes.to_string());
        w.close("time-modification");
    }
    if let Some(ref stem) = note.stem {
        w.leaf("stem", stem);
    }
    if let Some(staff) = note.staff {
        w.leaf("staff", &staff.to_string());
    }
    for beam in &note.beams {
        let number = beam.number.to_string();
        w.leaf_with("beam", &[("number", &number)], &beam.beam_type);
    }
    w.close("note");
}

fn write_harmony(w: &mut XmlWriter, harmony: &Harmony) {
    w.open("harmony");
    w.open("root");
    w.leaf("root-step", &harmony.root.step);
    if let Some(alter) = harmony.root.alter {
        w.leaf("root-alter", &format_number(alter));
    }
    w.close("root");
    w.leaf("kind", &harmony.kind);
    if let Some(ref bass) = harmony.bass {
        w.open("bass");
        w.leaf("bass-step", &bass.step);
        if let Some(alter) = bass.alter {
            w.leaf("bass-alter", &format_number(alter));
        }
        w.close("bass");
    }
    w.close("harmony");
}

fn write_direction(w: &mut XmlWriter, direction: &Direction) {
    match direction.placement {
        Some(ref placement) => w.open_with("direction", &[("placement", placement)]),
        None => w.open("direction"),
    }
    if let Some(ref words) = direction.words {
        w.open("direction-type");
        w.leaf("words", words);
        w.close("direction-type");
    }
    if let Some(tempo) = direction.sound_tempo {
        let tempo = format_number(tempo);
        w.empty_with("sound", &[("tempo", &tempo)]);
    }
    w.close("direction");
}

fn write_barline(w: &mut XmlWriter, barline: &Barline) {
    w.open_with("barline", &[("location", &barline.location)]);
    if let Some(ref style) = barline.bar_style {
        w.leaf("bar-style", style);
    }
    if let Some(ref direction) = barline.repeat {
        w.empty_with("repeat", &[("direction", direction)]);
    }
    w.close("barline");
}

/// Format a float without a trailing ".0" when it is integral, the way
/// MusicXML files typically write alter/tempo/layout values.
fn format_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

// ═══════════════════════════════════════════════════════════════════════
// XmlWriter
// ═══════════════════════════════════════════════════════════════════════

struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    fn new() -> Self {
        let mut out = String::new();
        out.push_str(XML_DECLARATION);
        out.push('\n');
        Self { out, depth: 0 }
    }

    fn finish(self) -> String {
        self.out
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    fn open(&mut self, tag: &str) {
        self.open_with(tag, &[]);
    }

    fn open_with(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        self.push_attrs(attrs);
        self.out.push_str(">\n");
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth -= 1;
        self.indent();
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push_str(">\n");
    }

    fn leaf(&mut self, tag: &str, text: &str) {
        self.leaf_with(tag, &[], text);
    }

    fn leaf_with(&mut self, tag: &str, attrs: &[(&str, &str)], text: &str) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        self.push_attrs(attrs);
        self.out.push('>');
        self.out.push_str(&escape(text));
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push_str(">\n");
    }

    fn empty(&mut self, tag: &str) {
        self.empty_with(tag, &[]);
    }

    fn empty_with(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        self.push_attrs(attrs);
        self.out.push_str("/>\n");
    }

    fn push_attrs(&mut self, attrs: &[(&str, &str)]) {
        for (name, value) in attrs {
            self.out.push(' ');
            self.out.push_str(name);
            self.out.push_str("=\"");
            self.out.push_str(&escape(value));
            self.out.push('"');
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_musicxml;

    fn tiny_score() -> Score {
        let mut score = Score::new();
        score.title = Some("Clap & Tap".to_string());
        score.version = Some("4.0".to_string());

        let mut measure = Measure::empty(1);
        let mut attrs = Attributes::default();
        attrs.divisions = Some(4);
        attrs.set_quarter_time(1);
        attrs.set_staff_lines(5);
        measure.attributes = Some(attrs);
        measure.notes.push(Note {
            pitch: Some(Pitch {
                step: "C".to_string(),
                octave: 5,
                alter: None,
            }),
            duration: 4,
            voice: Some(1),
            note_type: Some("quarter".to_string()),
            ..Note::default()
        });

        score.parts.push(Part {
            id: "P1".to_string(),
            name: "Percussion".to_string(),
            abbreviation: None,
            midi_program: None,
            midi_channel: None,
            measures: vec![measure],
        });
        score
    }

    #[test]
    fn output_starts_with_declaration() {
        let xml = score_to_musicxml(&tiny_score());
        assert!(xml.starts_with("<?xml version=\"1.0\""));
    }

    #[test]
    fn ensure_declaration_prepends_once() {
        let with = ensure_declaration("<score-partwise/>");
        assert!(with.starts_with("<?xml"));
        assert_eq!(ensure_declaration(&with), with);
    }

    #[test]
    fn title_ampersand_is_escaped() {
        let xml = score_to_musicxml(&tiny_score());
        assert!(xml.contains("Clap &amp; Tap"));
        assert!(!xml.contains("Clap & Tap"));
    }

    #[test]
    fn roundtrip_preserves_structure() {
        let original = tiny_score();
        let xml = score_to_musicxml(&original);
        let reparsed = parse_musicxml(&xml).unwrap();

        assert_eq!(reparsed.title, original.title);
        assert_eq!(reparsed.parts.len(), 1);
        let measure = &reparsed.parts[0].measures[0];
        assert_eq!(measure.number, 1);
        let attrs = measure.attributes.as_ref().unwrap();
        assert_eq!(
            attrs.time,
            Some(TimeSignature {
                beats: 1,
                beat_type: 4
            })
        );
        assert_eq!(attrs.staff_lines(), Some(5));
        assert_eq!(measure.notes.len(), 1);
        assert_eq!(measure.notes[0].duration, 4);
    }
}
