//! Data model for a parsed MusicXML score.
//!
//! These structures capture the information the remixer needs: enough of
//! each measure to clone it into a standalone fragment, recombine fragment
//! content into a new measure, and write the result back out as MusicXML.
//! They are plain owned values — extraction and composition build new trees
//! instead of mutating a shared document.

use serde::{Deserialize, Serialize};

/// A complete musical score parsed from MusicXML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Score {
    /// Title of the piece
    pub title: Option<String>,
    /// Subtitle
    pub subtitle: Option<String>,
    /// Composer name
    pub composer: Option<String>,
    /// Arranger name
    pub arranger: Option<String>,
    /// MusicXML version (e.g., "3.1", "4.0")
    pub version: Option<String>,
    /// Software that created the file
    pub software: Option<String>,
    /// Page layout defaults
    pub defaults: Option<Defaults>,
    /// Musical parts (instruments)
    pub parts: Vec<Part>,
}

/// Page layout and scaling defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Scaling: millimeters per tenths
    pub millimeters: Option<f64>,
    pub tenths: Option<f64>,
    /// Page dimensions in tenths
    pub page_height: Option<f64>,
    pub page_width: Option<f64>,
    /// Page margins in tenths
    pub left_margin: Option<f64>,
    pub right_margin: Option<f64>,
    pub top_margin: Option<f64>,
    pub bottom_margin: Option<f64>,
}

/// A musical part (one instrument or voice).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// Part identifier (e.g., "P1")
    pub id: String,
    /// Part name (e.g., "Percussion")
    pub name: String,
    /// Abbreviated name (e.g., "Perc.")
    pub abbreviation: Option<String>,
    /// MIDI program number
    pub midi_program: Option<i32>,
    /// MIDI channel
    pub midi_channel: Option<i32>,
    /// Ordered list of measures
    pub measures: Vec<Measure>,
}

/// A single measure (bar) of music.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measure {
    /// Measure number
    pub number: i32,
    /// Whether this is an implicit measure (e.g., pickup/anacrusis)
    pub implicit: bool,
    /// Attributes (key, time, clef, staff details) — only present when they change
    pub attributes: Option<Attributes>,
    /// Notes and rests in this measure
    pub notes: Vec<Note>,
    /// Chord symbols
    pub harmonies: Vec<Harmony>,
    /// Tempo / text directions
    pub directions: Vec<Direction>,
    /// Barlines (repeat signs, double bars, etc.)
    pub barlines: Vec<Barline>,
    /// Layout hint decoded from `<print new-system="yes">`
    pub new_system: bool,
    /// Layout hint decoded from `<print new-page="yes">`
    pub new_page: bool,
}

impl Measure {
    /// An empty measure with the given number and no content.
    pub fn empty(number: i32) -> Self {
        Self {
            number,
            implicit: false,
            attributes: None,
            notes: Vec::new(),
            harmonies: Vec::new(),
            directions: Vec::new(),
            barlines: Vec::new(),
            new_system: false,
            new_page: false,
        }
    }
}

/// Musical attributes that may change at the start of a measure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attributes {
    /// Divisions per quarter note (duration resolution)
    pub divisions: Option<i32>,
    /// Key signature
    pub key: Option<Key>,
    /// Time signature
    pub time: Option<TimeSignature>,
    /// Number of staves in this part
    pub staves: Option<i32>,
    /// Clef(s) — one per staff
    pub clefs: Vec<Clef>,
    /// Per-staff details (line counts)
    pub staff_details: Vec<StaffDetails>,
}

impl Attributes {
    /// Set the time signature to `beats`/4, synthesizing `<time>` if absent.
    pub fn set_quarter_time(&mut self, beats: i32) {
        match self.time {
            Some(ref mut time) => {
                time.beats = beats;
                time.beat_type = 4;
            }
            None => {
                self.time = Some(TimeSignature { beats, beat_type: 4 });
            }
        }
    }

    /// Set the line count for staff 1, synthesizing `<staff-details>` if absent.
    pub fn set_staff_lines(&mut self, lines: i32) {
        match self.staff_details.iter_mut().find(|sd| sd.number == 1) {
            Some(sd) => sd.staff_lines = Some(lines),
            None => self.staff_details.push(StaffDetails {
                number: 1,
                staff_lines: Some(lines),
            }),
        }
    }

    /// Force a treble (G, line 2) clef on staff 1, synthesizing it if absent.
    pub fn set_treble_clef(&mut self) {
        match self.clefs.iter_mut().find(|c| c.number == 1) {
            Some(clef) => {
                clef.sign = "G".to_string();
                clef.line = 2;
            }
            None => self.clefs.push(Clef {
                number: 1,
                sign: "G".to_string(),
                line: 2,
                octave_change: None,
            }),
        }
    }

    /// Declared line count for staff 1, if any.
    pub fn staff_lines(&self) -> Option<i32> {
        self.staff_details
            .iter()
            .find(|sd| sd.number == 1)
            .and_then(|sd| sd.staff_lines)
    }
}

/// Key signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Key {
    /// Number of sharps (positive) or flats (negative)
    pub fifths: i32,
    /// Mode (e.g., "major", "minor")
    pub mode: Option<String>,
}

/// Time signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    /// Numerator (e.g., 3 in 3/4)
    pub beats: i32,
    /// Denominator (e.g., 4 in 3/4)
    pub beat_type: i32,
}

/// Clef definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clef {
    /// Staff number this clef belongs to (1-based; defaults to 1)
    pub number: i32,
    /// Clef sign: "G" (treble), "F" (bass), "C" (alto/tenor), "percussion"
    pub sign: String,
    /// Staff line the clef sits on
    pub line: i32,
    /// Octave transposition
    pub octave_change: Option<i32>,
}

/// Per-staff details, chiefly the declared number of staff lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffDetails {
    /// Staff number (1-based; defaults to 1)
    pub number: i32,
    /// Declared line count (5 = standard staff, 1 = rhythm line)
    pub staff_lines: Option<i32>,
}

/// A single note or rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Note {
    /// Pitch (None if this is a rest)
    pub pitch: Option<Pitch>,
    /// Whether this is a rest
    pub rest: bool,
    /// Whether the rest spans the whole measure
    pub measure_rest: bool,
    /// Whether this note is part of a chord with the previous note
    pub chord: bool,
    /// Whether this is a grace note
    pub grace: bool,
    /// Duration in divisions
    pub duration: i32,
    /// Voice number (for multi-voice writing)
    pub voice: Option<i32>,
    /// Note type: "whole", "half", "quarter", "eighth", "16th", "32nd"
    pub note_type: Option<String>,
    /// Number of augmentation dots
    pub dots: u32,
    /// Accidental: "sharp", "flat", "natural", …
    pub accidental: Option<String>,
    /// Tuplet ratio (e.g., 3:2 for a triplet)
    pub time_modification: Option<TimeModification>,
    /// Stem direction: "up" or "down"
    pub stem: Option<String>,
    /// Beam information
    pub beams: Vec<Beam>,
    /// Tie start/stop flags
    pub tie_start: bool,
    pub tie_stop: bool,
    /// Staff number (1-based; for multi-staff parts)
    pub staff: Option<i32>,
}

/// Pitch of a note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pitch {
    /// Note name: A, B, C, D, E, F, G
    pub step: String,
    /// Octave number (middle C = C4)
    pub octave: i32,
    /// Chromatic alteration: -1.0 = flat, 1.0 = sharp
    pub alter: Option<f64>,
}

/// Tuplet ratio: `actual_notes` in the time of `normal_notes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeModification {
    pub actual_notes: i32,
    pub normal_notes: i32,
}

/// Beam grouping information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beam {
    /// Beam level (1 = eighth-note beam, 2 = sixteenth-note beam, etc.)
    pub number: i32,
    /// Beam type: "begin", "continue", "end"
    pub beam_type: String,
}

/// A chord symbol (harmony).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Harmony {
    /// Root note
    pub root: HarmonyRoot,
    /// Chord quality: "major", "minor", "dominant", etc.
    pub kind: String,
    /// Bass note (for slash chords)
    pub bass: Option<HarmonyRoot>,
}

/// Root or bass note of a harmony.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarmonyRoot {
    /// Note name: A–G
    pub step: String,
    /// Alteration: -1 = flat, 1 = sharp
    pub alter: Option<f64>,
}

/// A tempo or text direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Direction {
    /// Placement relative to the staff: "above" or "below"
    pub placement: Option<String>,
    /// Direction text (e.g., "Clap", "Tap")
    pub words: Option<String>,
    /// Tempo in quarter notes per minute from `<sound tempo>`
    pub sound_tempo: Option<f64>,
}

/// A barline (may include repeat signs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Barline {
    /// Location: "left", "right", "middle"
    pub location: String,
    /// Visual style: "regular", "light-light", "light-heavy", etc.
    pub bar_style: Option<String>,
    /// Repeat sign direction: "forward" or "backward"
    pub repeat: Option<String>,
}

impl Score {
    /// Create a new empty score.
    pub fn new() -> Self {
        Self {
            title: None,
            subtitle: None,
            composer: None,
            arranger: None,
            version: None,
            software: None,
            defaults: None,
            parts: Vec::new(),
        }
    }

    /// Get the number of measures in the first part.
    pub fn measure_count(&self) -> usize {
        self.parts.first().map_or(0, |p| p.measures.len())
    }

    /// A copy of this score's structural skeleton: metadata, defaults, and
    /// part list, with every part's measure sequence emptied. Extraction and
    /// composition both start from this.
    pub fn skeleton(&self) -> Score {
        let mut out = self.clone();
        for part in &mut out.parts {
            part.measures.clear();
        }
        out
    }
}

impl Default for Score {
    fn default() -> Self {
        Self::new()
    }
}

impl Pitch {
    /// Convert pitch to MIDI note number. Middle C (C4) = 60.
    pub fn to_midi(&self) -> i32 {
        let step_semitone = match self.step.as_str() {
            "C" => 0,
            "D" => 2,
            "E" => 4,
            "F" => 5,
            "G" => 7,
            "A" => 9,
            "B" => 11,
            _ => 0,
        };
        let alter = self.alter.unwrap_or(0.0) as i32;
        (self.octave + 1) * 12 + step_semitone + alter
    }
}
