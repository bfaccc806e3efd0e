//! Notation engraver — draws a score as a single horizontal system of SVG.
//!
//! The engraver mirrors a notation front end's boundary: construct it with
//! an [`EngraverOptions`] record, [`Engraver::load`] a serialized MusicXML
//! string, then [`Engraver::render`] to get the drawing. Layout is
//! deliberately simple — one system, spacing proportional to duration —
//! which is all the one-measure scores this library produces need.

mod options;
mod svg;

pub use options::{Backend, EngraverOptions, FingeringPosition};

use crate::error::RemixError;
use crate::model::*;
use crate::parser::parse_musicxml;
use svg::{empty_svg, SvgBuilder};

// ── Layout constants (SVG user units) ───────────────────────────────
const PAGE_MARGIN_LEFT: f64 = 50.0;
const PAGE_MARGIN_RIGHT: f64 = 30.0;
const PAGE_MARGIN_TOP: f64 = 30.0;
const HEADER_HEIGHT: f64 = 56.0;
const STAFF_LINE_SPACING: f64 = 10.0;
const STAFF_BOTTOM_PAD: f64 = 60.0;
const CLEF_SPACE: f64 = 32.0;
const TIME_SIG_SPACE: f64 = 24.0;
const PER_BEAT_WIDTH: f64 = 55.0;
const MIN_MEASURE_WIDTH: f64 = 38.0;
const NOTEHEAD_RX: f64 = 5.5;
const NOTEHEAD_RY: f64 = 4.0;
const STEM_LENGTH: f64 = 30.0;

const NOTE_COLOR: &str = "#1a1a1a";
const STAFF_COLOR: &str = "#555555";
const BARLINE_COLOR: &str = "#333333";
const HEADER_COLOR: &str = "#1a1a1a";

/// Stateful render boundary: options at construction, XML via `load`,
/// drawing via `render`.
#[derive(Debug, Default)]
pub struct Engraver {
    options: EngraverOptions,
    score: Option<Score>,
}

impl Engraver {
    pub fn new(options: EngraverOptions) -> Self {
        Self {
            options,
            score: None,
        }
    }

    pub fn options(&self) -> &EngraverOptions {
        &self.options
    }

    /// Parse and hold a MusicXML string for the next `render` call.
    pub fn load(&mut self, xml: &str) -> Result<(), RemixError> {
        self.score = Some(parse_musicxml(xml)?);
        Ok(())
    }

    /// Hold an already-parsed score for the next `render` call.
    pub fn load_score(&mut self, score: Score) {
        self.score = Some(score);
    }

    /// Draw the loaded score.
    pub fn render(&self) -> Result<String, RemixError> {
        let score = self
            .score
            .as_ref()
            .ok_or_else(|| RemixError::Render("no score loaded".to_string()))?;
        Ok(engrave(score, &self.options))
    }
}

/// Draw a score directly, without the load/render dance.
pub fn engrave(score: &Score, options: &EngraverOptions) -> String {
    let part = match score.parts.first() {
        Some(p) => p,
        None => return empty_svg("No parts in score"),
    };
    if part.measures.is_empty() {
        return empty_svg("No measures to engrave");
    }

    let opening = part.measures.iter().find_map(|m| m.attributes.as_ref());
    let staff_lines = opening.and_then(|a| a.staff_lines()).unwrap_or(5).max(1);
    let clef = opening.and_then(|a| a.clefs.iter().find(|c| c.number == 1));
    let time = opening.and_then(|a| a.time.as_ref());
    let divisions = opening.and_then(|a| a.divisions).unwrap_or(1).max(1) as f64;

    let staff_height = (staff_lines - 1) as f64 * STAFF_LINE_SPACING;

    let draws_header = (options.draw_title && score.title.is_some())
        || (options.draw_subtitle && score.subtitle.is_some())
        || (options.draw_composer && score.composer.is_some());
    let header_height = if draws_header { HEADER_HEIGHT } else { 12.0 };
    let staff_y = PAGE_MARGIN_TOP + header_height;

    // ── Horizontal layout: prefix + one slot per measure ────────────
    let prefix_width = CLEF_SPACE + if time.is_some() { TIME_SIG_SPACE } else { 0.0 };
    let measure_widths: Vec<f64> = part
        .measures
        .iter()
        .map(|m| {
            let beats = measure_quarter_beats(m, divisions);
            (beats * PER_BEAT_WIDTH * options.spacing_factor)
                .max(MIN_MEASURE_WIDTH)
                .min(options.max_system_width)
        })
        .collect();

    let system_width: f64 = prefix_width + measure_widths.iter().sum::<f64>();
    let total_width = PAGE_MARGIN_LEFT + system_width + PAGE_MARGIN_RIGHT;
    let total_height = staff_y + staff_height + STAFF_BOTTOM_PAD;

    let scale = match options.fit_page_width {
        Some(w) if w > 0.0 => w / total_width,
        _ => options.zoom,
    };

    let font = if options.bravura_font {
        "'Bravura Text', 'Georgia', serif"
    } else {
        "'Georgia', 'Times New Roman', serif"
    };

    let mut svg = SvgBuilder::new(total_width, total_height, scale);
    svg.rect(0.0, 0.0, total_width, total_height, "white");

    if draws_header {
        render_header(&mut svg, score, options, total_width);
    }

    if options.draw_part_names && !part.name.is_empty() {
        svg.text(
            PAGE_MARGIN_LEFT - 8.0,
            staff_y + staff_height / 2.0 + 4.0,
            &part.name,
            11.0,
            "normal",
            HEADER_COLOR,
            "end",
        );
    } else if options.draw_part_abbreviations {
        if let Some(ref abbr) = part.abbreviation {
            svg.text(
                PAGE_MARGIN_LEFT - 8.0,
                staff_y + staff_height / 2.0 + 4.0,
                abbr,
                11.0,
                "normal",
                HEADER_COLOR,
                "end",
            );
        }
    }

    // Staff lines across the whole system
    let staff_x1 = PAGE_MARGIN_LEFT;
    let staff_x2 = PAGE_MARGIN_LEFT + system_width;
    for i in 0..staff_lines {
        let y = staff_y + i as f64 * STAFF_LINE_SPACING;
        svg.line(staff_x1, y, staff_x2, y, STAFF_COLOR, 0.8);
    }

    render_clef(&mut svg, staff_x1 + 6.0, staff_y, staff_height, clef);
    if let Some(time) = time {
        render_time_signature(
            &mut svg,
            staff_x1 + CLEF_SPACE,
            staff_y,
            staff_height,
            time,
        );
    }

    // Leading barline
    svg.line(
        staff_x1,
        staff_y,
        staff_x1,
        staff_y + staff_height,
        BARLINE_COLOR,
        1.0,
    );

    let mut mx = staff_x1 + prefix_width;
    for (measure, &mw) in part.measures.iter().zip(&measure_widths) {
        if options.draw_measure_numbers {
            svg.text(
                mx + 2.0,
                staff_y - 8.0,
                &measure.number.to_string(),
                9.0,
                "normal",
                STAFF_COLOR,
                "start",
            );
        }

        render_measure_text(&mut svg, measure, options, mx, staff_y);
        render_notes(
            &mut svg, measure, clef, divisions, mx, mw, staff_y, staff_height, staff_lines,
        );
        render_closing_barline(&mut svg, measure, mx + mw, staff_y, staff_height);

        mx += mw;
    }

    svg.build(font)
}

// ─── Header ──────────────────────────────────────────────────────────

fn render_header(svg: &mut SvgBuilder, score: &Score, options: &EngraverOptions, width: f64) {
    let center_x = width / 2.0;
    if options.draw_title {
        if let Some(ref title) = score.title {
            svg.text(
                center_x,
                PAGE_MARGIN_TOP + 16.0,
                title,
                20.0,
                "bold",
                HEADER_COLOR,
                "middle",
            );
        }
    }
    if options.draw_subtitle {
        if let Some(ref subtitle) = score.subtitle {
            svg.text(
                center_x,
                PAGE_MARGIN_TOP + 34.0,
                subtitle,
                13.0,
                "normal",
                HEADER_COLOR,
                "middle",
            );
        }
    }
    if options.draw_composer {
        if let Some(ref composer) = score.composer {
            let label = match (&score.arranger, options.draw_lyricist) {
                (Some(arranger), true) => format!("{composer} / arr. {arranger}"),
                _ => composer.clone(),
            };
            svg.text(
                width - PAGE_MARGIN_RIGHT,
                PAGE_MARGIN_TOP + 44.0,
                &label,
                11.0,
                "normal",
                HEADER_COLOR,
                "end",
            );
        }
    }
}

// ─── Clef and time signature ────────────────────────────────────────

fn render_clef(svg: &mut SvgBuilder, x: f64, staff_y: f64, staff_height: f64, clef: Option<&Clef>) {
    let (sign, line) = clef.map_or(("G", 2), |c| (c.sign.as_str(), c.line));
    match sign {
        "G" => {
            svg.text(x, staff_y + staff_height - 2.0, "\u{1D11E}", 42.0, "normal", NOTE_COLOR, "start");
        }
        "F" => {
            svg.text(x, staff_y + STAFF_LINE_SPACING * 2.4, "\u{1D122}", 32.0, "normal", NOTE_COLOR, "start");
        }
        "C" => {
            let line_y = staff_y + staff_height - (line - 1) as f64 * STAFF_LINE_SPACING;
            svg.text(x, line_y + 10.0, "\u{1D121}", 32.0, "normal", NOTE_COLOR, "start");
        }
        // Percussion and unpitched signs: two vertical bars on the middle
        // of the staff.
        _ => {
            let mid = staff_y + staff_height / 2.0;
            svg.rect(x + 6.0, mid - 8.0, 3.0, 16.0, NOTE_COLOR);
            svg.rect(x + 12.0, mid - 8.0, 3.0, 16.0, NOTE_COLOR);
        }
    }
}

fn render_time_signature(
    svg: &mut SvgBuilder,
    x: f64,
    staff_y: f64,
    staff_height: f64,
    time: &TimeSignature,
) {
    let mid = staff_y + staff_height / 2.0;
    svg.text(x, mid - 1.0, &time.beats.to_string(), 18.0, "bold", NOTE_COLOR, "start");
    svg.text(x, mid + 16.0, &time.beat_type.to_string(), 18.0, "bold", NOTE_COLOR, "start");
}

// ─── Measure content ────────────────────────────────────────────────

/// Nominal quarter-note beats in a measure, from summed durations.
fn measure_quarter_beats(measure: &Measure, divisions: f64) -> f64 {
    let total: i32 = measure
        .notes
        .iter()
        .filter(|n| !n.chord && !n.grace)
        .map(|n| n.duration)
        .sum();
    (total as f64 / divisions).max(1.0)
}

fn render_measure_text(
    svg: &mut SvgBuilder,
    measure: &Measure,
    options: &EngraverOptions,
    mx: f64,
    staff_y: f64,
) {
    for direction in &measure.directions {
        if options.draw_metronome_marks {
            if let Some(tempo) = direction.sound_tempo {
                svg.text(
                    mx,
                    staff_y - 16.0,
                    &format!("\u{2669} = {}", tempo as i32),
                    12.0,
                    "bold",
                    NOTE_COLOR,
                    "start",
                );
            }
        }
        if options.draw_words || options.draw_directions {
            if let Some(ref words) = direction.words {
                let below = direction.placement.as_deref() == Some("below");
                let y = if below { staff_y + 58.0 } else { staff_y - 16.0 };
                svg.text(mx + 4.0, y, words, 12.0, "normal", NOTE_COLOR, "start");
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn render_notes(
    svg: &mut SvgBuilder,
    measure: &Measure,
    clef: Option<&Clef>,
    divisions: f64,
    mx: f64,
    mw: f64,
    staff_y: f64,
    staff_height: f64,
    staff_lines: i32,
) {
    let total: f64 = measure
        .notes
        .iter()
        .filter(|n| !n.chord && !n.grace)
        .map(|n| n.duration as f64)
        .sum::<f64>()
        .max(divisions);

    let content_x = mx + 6.0;
    let content_w = mw - 12.0;
    let mid_y = staff_y + staff_height / 2.0;

    let mut elapsed = 0.0;
    let mut last_x = content_x;
    for note in &measure.notes {
        let x = if note.chord {
            last_x
        } else {
            content_x + (elapsed / total) * content_w
        };
        if !note.chord && !note.grace {
            elapsed += note.duration as f64;
        }
        last_x = x;

        if note.rest {
            render_rest(svg, note, x, mid_y);
            continue;
        }

        let y = note
            .pitch
            .as_ref()
            .map(|p| pitch_y(p, clef, staff_y, staff_height))
            .unwrap_or(mid_y);

        render_ledger_lines(svg, x, y, staff_y, staff_height, staff_lines);

        let filled = !matches!(note.note_type.as_deref(), Some("whole") | Some("half"));
        svg.notehead(x, y, NOTEHEAD_RX, NOTEHEAD_RY, filled, NOTE_COLOR);

        if note.note_type.as_deref() != Some("whole") {
            let stem_up = match note.stem.as_deref() {
                Some("down") => false,
                Some(_) => true,
                None => y >= mid_y,
            };
            let (sx, sy1, sy2) = if stem_up {
                (x + NOTEHEAD_RX - 0.6, y - 2.0, y - STEM_LENGTH)
            } else {
                (x - NOTEHEAD_RX + 0.6, y + 2.0, y + STEM_LENGTH)
            };
            svg.line(sx, sy1, sx, sy2, NOTE_COLOR, 1.2);

            // Unbeamed flags; beamed groups get their flag count from the
            // beam lines instead.
            if note.beams.is_empty() {
                let flags = flag_count(note.note_type.as_deref());
                for f in 0..flags {
                    let fy = sy2 + f as f64 * 6.0 * if stem_up { 1.0 } else { -1.0 };
                    let dir = if stem_up { 1.0 } else { -1.0 };
                    svg.path(
                        &format!(
                            "M{:.1},{:.1} q6,{:.1} 3,{:.1}",
                            sx,
                            fy,
                            7.0 * dir,
                            14.0 * dir
                        ),
                        "none",
                        NOTE_COLOR,
                        1.6,
                    );
                }
            }
        }

        for d in 0..note.dots {
            svg.circle(x + NOTEHEAD_RX + 3.5 + d as f64 * 4.0, y - 3.0, 1.4, NOTE_COLOR);
        }
    }

    render_beams(svg, measure, clef, content_x, content_w, staff_y, staff_height, total);
}

/// Straight beam segments over consecutive beamed notes.
#[allow(clippy::too_many_arguments)]
fn render_beams(
    svg: &mut SvgBuilder,
    measure: &Measure,
    clef: Option<&Clef>,
    content_x: f64,
    content_w: f64,
    staff_y: f64,
    staff_height: f64,
    total: f64,
) {
    let mut elapsed = 0.0;
    let mut group: Vec<(f64, f64, f64)> = Vec::new(); // (x, stem tip y, stem direction)
    let mut levels = 1;

    for note in &measure.notes {
        let x = content_x + (elapsed / total) * content_w;
        if !note.chord && !note.grace {
            elapsed += note.duration as f64;
        }
        if note.rest || note.chord {
            continue;
        }

        let begins = note.beams.iter().any(|b| b.beam_type == "begin");
        let ends = note.beams.iter().any(|b| b.beam_type == "end");
        let in_beam = !note.beams.is_empty();

        if begins {
            group.clear();
            levels = 1;
        }
        if in_beam {
            levels = levels.max(note.beams.len());
            let y = note
                .pitch
                .as_ref()
                .map(|p| pitch_y(p, clef, staff_y, staff_height))
                .unwrap_or(staff_y + staff_height / 2.0);
            let stem_up = match note.stem.as_deref() {
                Some("down") => false,
                Some(_) => true,
                None => y >= staff_y + staff_height / 2.0,
            };
            if stem_up {
                group.push((x + NOTEHEAD_RX - 0.6, y - STEM_LENGTH, 1.0));
            } else {
                group.push((x - NOTEHEAD_RX + 0.6, y + STEM_LENGTH, -1.0));
            }
        }
        if ends && group.len() >= 2 {
            let (x1, y1, dir) = group[0];
            let (x2, y2, _) = group[group.len() - 1];
            // Beam levels stack back toward the notehead
            for level in 0..levels {
                let off = level as f64 * 6.0 * dir;
                svg.line(x1, y1 + off, x2, y2 + off, NOTE_COLOR, 4.0);
            }
            group.clear();
        }
    }
}

fn render_rest(svg: &mut SvgBuilder, note: &Note, x: f64, mid_y: f64) {
    let glyph = match note.note_type.as_deref() {
        _ if note.measure_rest => "\u{1D13B}",
        Some("whole") => "\u{1D13B}",
        Some("half") => "\u{1D13C}",
        Some("eighth") => "\u{1D13E}",
        Some("16th") => "\u{1D13F}",
        Some("32nd") => "\u{1D140}",
        _ => "\u{1D13D}",
    };
    svg.text(x, mid_y + 4.0, glyph, 26.0, "normal", NOTE_COLOR, "middle");
    for d in 0..note.dots {
        svg.circle(x + 7.0 + d as f64 * 4.0, mid_y - 2.0, 1.4, NOTE_COLOR);
    }
}

fn render_closing_barline(svg: &mut SvgBuilder, measure: &Measure, x: f64, staff_y: f64, staff_height: f64) {
    let style = measure
        .barlines
        .iter()
        .find(|b| b.location == "right")
        .and_then(|b| b.bar_style.as_deref());
    match style {
        Some("light-heavy") => {
            svg.line(x - 4.0, staff_y, x - 4.0, staff_y + staff_height, BARLINE_COLOR, 1.0);
            svg.line(x, staff_y, x, staff_y + staff_height, BARLINE_COLOR, 3.0);
        }
        Some("light-light") => {
            svg.line(x - 3.0, staff_y, x - 3.0, staff_y + staff_height, BARLINE_COLOR, 1.0);
            svg.line(x, staff_y, x, staff_y + staff_height, BARLINE_COLOR, 1.0);
        }
        _ => {
            svg.line(x, staff_y, x, staff_y + staff_height, BARLINE_COLOR, 1.0);
        }
    }
}

// ─── Pitch geometry ─────────────────────────────────────────────────

/// Diatonic index: C0 = 0, one step per letter name.
fn diatonic(pitch: &Pitch) -> i32 {
    let step = match pitch.step.as_str() {
        "C" => 0,
        "D" => 1,
        "E" => 2,
        "F" => 3,
        "G" => 4,
        "A" => 5,
        "B" => 6,
        _ => 0,
    };
    pitch.octave * 7 + step
}

/// Vertical position of a pitch for the given clef. Staff lines are two
/// diatonic steps apart; the clef fixes which pitch sits on its line.
fn pitch_y(pitch: &Pitch, clef: Option<&Clef>, staff_y: f64, staff_height: f64) -> f64 {
    let (sign, line, octave_change) =
        clef.map_or(("G", 2, 0), |c| (c.sign.as_str(), c.line, c.octave_change.unwrap_or(0)));

    let reference = match sign {
        "G" => diatonic(&Pitch { step: "G".into(), octave: 4, alter: None }),
        "F" => diatonic(&Pitch { step: "F".into(), octave: 3, alter: None }),
        "C" => diatonic(&Pitch { step: "C".into(), octave: 4, alter: None }),
        // Percussion: treat like treble so drum maps land on the staff
        _ => diatonic(&Pitch { step: "G".into(), octave: 4, alter: None }),
    } + octave_change * 7;

    let bottom_line = reference - (line - 1) * 2;
    let half_space = STAFF_LINE_SPACING / 2.0;
    let bottom_y = staff_y + staff_height;
    bottom_y - (diatonic(pitch) - bottom_line) as f64 * half_space
}

fn render_ledger_lines(
    svg: &mut SvgBuilder,
    x: f64,
    y: f64,
    staff_y: f64,
    staff_height: f64,
    staff_lines: i32,
) {
    if staff_lines < 2 {
        return;
    }
    let mut ly = staff_y - STAFF_LINE_SPACING;
    while y <= ly + 1.0 {
        svg.line(x - 9.0, ly, x + 9.0, ly, STAFF_COLOR, 0.8);
        ly -= STAFF_LINE_SPACING;
    }
    let mut ly = staff_y + staff_height + STAFF_LINE_SPACING;
    while y >= ly - 1.0 {
        svg.line(x - 9.0, ly, x + 9.0, ly, STAFF_COLOR, 0.8);
        ly += STAFF_LINE_SPACING;
    }
}

fn flag_count(note_type: Option<&str>) -> u32 {
    match note_type {
        Some("eighth") => 1,
        Some("16th") => 2,
        Some("32nd") => 3,
        Some("64th") => 4,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_note_score(staff_lines: Option<i32>) -> Score {
        let mut score = Score::new();
        score.title = Some("Test".to_string());
        let mut measure = Measure::empty(1);
        let mut attrs = Attributes {
            divisions: Some(1),
            ..Attributes::default()
        };
        attrs.set_quarter_time(1);
        if let Some(lines) = staff_lines {
            attrs.set_staff_lines(lines);
        }
        measure.attributes = Some(attrs);
        measure.notes.push(Note {
            duration: 1,
            note_type: Some("quarter".to_string()),
            pitch: Some(Pitch {
                step: "B".to_string(),
                octave: 4,
                alter: None,
            }),
            ..Note::default()
        });
        score.parts.push(Part {
            id: "P1".to_string(),
            name: "Perc".to_string(),
            abbreviation: None,
            midi_program: None,
            midi_channel: None,
            measures: vec![measure],
        });
        score
    }

    #[test]
    fn empty_score_yields_placeholder() {
        let svg = engrave(&Score::new(), &EngraverOptions::default());
        assert!(svg.contains("No parts in score"));
    }

    #[test]
    fn draws_declared_staff_line_count() {
        let five = engrave(&one_note_score(Some(5)), &EngraverOptions::default());
        let one = engrave(&one_note_score(Some(1)), &EngraverOptions::default());
        let count = |s: &str| s.matches("<line").count();
        assert!(count(&five) > count(&one));
    }

    #[test]
    fn zoom_scales_output_dimensions() {
        let mut options = EngraverOptions::default();
        options.zoom = 1.0;
        let full = engrave(&one_note_score(None), &options);
        options.zoom = 0.5;
        let half = engrave(&one_note_score(None), &options);
        // Same viewBox, different rendered width/height
        assert_ne!(full, half);
        assert!(full.contains("viewBox"));
    }

    #[test]
    fn title_visibility_follows_options() {
        let mut options = EngraverOptions::default();
        options.draw_title = true;
        let with_title = engrave(&one_note_score(None), &options);
        assert!(with_title.contains(">Test</text>"));

        options.draw_title = false;
        options.draw_subtitle = false;
        options.draw_composer = false;
        let without = engrave(&one_note_score(None), &options);
        assert!(!without.contains(">Test</text>"));
    }

    #[test]
    fn load_then_render_roundtrip() {
        let xml = crate::writer::score_to_musicxml(&one_note_score(Some(5)));
        let mut engraver = Engraver::new(EngraverOptions::preview());
        engraver.load(&xml).unwrap();
        let svg = engraver.render().unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("ellipse"));
    }

    #[test]
    fn render_without_load_is_an_error() {
        let engraver = Engraver::new(EngraverOptions::default());
        let err = engraver.render().unwrap_err();
        assert!(matches!(err, RemixError::Render(_)));
    }

    #[test]
    fn load_rejects_malformed_xml() {
        let mut engraver = Engraver::new(EngraverOptions::default());
        assert!(engraver.load("<score-partwise><unclosed>").is_err());
    }
}
