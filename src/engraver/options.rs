//! Engraver configuration record.
//!
//! The option set mirrors what a notation front end toggles per canvas:
//! which text elements to draw, zoom and spacing, and the system width cap.

use serde::{Deserialize, Serialize};

/// Rendering backend. Only vector graphics output is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backend {
    Svg,
}

/// Where fingering numbers are placed relative to the note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FingeringPosition {
    Auto,
    Left,
    Right,
    Above,
    Below,
}

/// Full option record handed to the engraver alongside the score.
///
/// The single-system layout reads the header/text visibility toggles
/// (`draw_title` through `draw_measure_numbers`), `bravura_font`, `zoom`,
/// `spacing_factor`, `max_system_width`, and `fit_page_width`. The
/// remaining fields (`auto_resize`, `backend`, `draw_dynamics`,
/// `draw_expressions`, `draw_fingerings`, `fingering_position`,
/// `small_wavy_line`, `single_horizontal_staffline`) describe elements the
/// layout has no content for and are carried for embedders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngraverOptions {
    /// Re-fit output when the host surface resizes (a hint for embedders;
    /// the SVG itself is static).
    pub auto_resize: bool,
    pub backend: Backend,

    // Visibility toggles, one per notation element.
    pub draw_title: bool,
    pub draw_subtitle: bool,
    pub draw_composer: bool,
    pub draw_lyricist: bool,
    pub draw_metronome_marks: bool,
    pub draw_dynamics: bool,
    pub draw_expressions: bool,
    pub draw_words: bool,
    pub draw_directions: bool,
    pub draw_part_names: bool,
    pub draw_part_abbreviations: bool,
    pub draw_measure_numbers: bool,
    pub draw_fingerings: bool,

    pub fingering_position: FingeringPosition,
    /// Use the Bravura music font for glyphs where available.
    pub bravura_font: bool,
    /// Draw long wavy lines from repeated small segments.
    pub small_wavy_line: bool,
    /// Lay all measures out on one horizontal system.
    pub single_horizontal_staffline: bool,

    /// Output scale factor.
    pub zoom: f64,
    /// Horizontal note spacing multiplier.
    pub spacing_factor: f64,
    /// Upper bound on a single measure's width, in user units.
    pub max_system_width: f64,
    /// When set, scale the finished system to exactly this page width.
    pub fit_page_width: Option<f64>,
}

impl Default for EngraverOptions {
    /// The combined-result canvas configuration: compact zoom, narrow
    /// measures, subtitle and composer shown but no title.
    fn default() -> Self {
        Self {
            auto_resize: true,
            backend: Backend::Svg,
            draw_title: false,
            draw_subtitle: true,
            draw_composer: true,
            draw_lyricist: true,
            draw_metronome_marks: false,
            draw_dynamics: false,
            draw_expressions: false,
            draw_words: false,
            draw_directions: false,
            draw_part_names: true,
            draw_part_abbreviations: true,
            draw_measure_numbers: false,
            draw_fingerings: false,
            fingering_position: FingeringPosition::Auto,
            bravura_font: true,
            small_wavy_line: false,
            single_horizontal_staffline: true,
            zoom: 0.5,
            spacing_factor: 0.8,
            max_system_width: 200.0,
            fit_page_width: None,
        }
    }
}

impl EngraverOptions {
    /// Configuration for previewing a single fragment: no header text,
    /// larger zoom, wider system allowance, no auto-resize.
    pub fn preview() -> Self {
        Self {
            auto_resize: false,
            draw_subtitle: false,
            draw_composer: false,
            draw_lyricist: false,
            zoom: 0.8,
            max_system_width: 500.0,
            ..Self::default()
        }
    }
}
