//! Measure recombination — builds a single measure of a requested beat
//! count by sampling one-beat fragments uniformly at random, with
//! replacement.
//!
//! Sampling goes through the [`BeatPicker`] trait so callers (and tests)
//! can swap the random source. Production code uses [`UniformPicker`];
//! a composition is intentionally nondeterministic across calls — rerunning
//! it is how the user generates variation.

use crate::error::RemixError;
use crate::fragment::{fragment_attributes, Fragment, FragmentPool};
use crate::model::{Measure, Score};

/// A source of fragment choices for the composer.
pub trait BeatPicker {
    /// Pick an index into a pool of `pool_size` fragments. `pool_size` is
    /// always at least 1; returned values are reduced modulo `pool_size`.
    fn pick(&mut self, pool_size: usize) -> usize;
}

/// Uniform, unseeded random picker.
#[derive(Debug, Default)]
pub struct UniformPicker;

impl BeatPicker for UniformPicker {
    fn pick(&mut self, pool_size: usize) -> usize {
        fastrand::usize(..pool_size)
    }
}

/// Replays a fixed sequence of indices, cycling when exhausted. Lets tests
/// assert the exact composed output.
#[derive(Debug)]
pub struct SequencePicker {
    sequence: Vec<usize>,
    position: usize,
}

impl SequencePicker {
    pub fn new(sequence: Vec<usize>) -> Self {
        Self {
            sequence,
            position: 0,
        }
    }
}

impl BeatPicker for SequencePicker {
    fn pick(&mut self, pool_size: usize) -> usize {
        if self.sequence.is_empty() {
            return 0;
        }
        let value = self.sequence[self.position % self.sequence.len()];
        self.position += 1;
        value % pool_size
    }
}

/// Settings for one composition run.
#[derive(Debug, Clone)]
pub struct ComposeOptions {
    /// Number of beats in the composed measure (the time signature
    /// numerator; the beat unit is fixed at quarter notes).
    pub beats: i32,
    /// Force a treble (G, line 2) clef on the composed measure,
    /// synthesizing one if the template had none.
    pub force_treble_clef: bool,
}

impl ComposeOptions {
    pub fn new(beats: i32) -> Self {
        Self {
            beats,
            force_treble_clef: false,
        }
    }
}

/// Compose a single measure of `options.beats` beats from the selected
/// fragments.
///
/// The first selected fragment serves as the structural template: its
/// metadata, part list, and attributes are cloned, the time signature is
/// overridden to `beats`/4, and the staff line count to 5. The measure
/// content is then filled by `beats` uniform draws (with replacement) from
/// the selection, copying everything except attributes and layout hints.
///
/// Fails with [`RemixError::InvalidBeatCount`] when `beats < 1` and
/// [`RemixError::EmptySelection`] when no selected index resolves to a
/// fragment. Neither the pool nor the template is mutated.
pub fn compose_measure(
    pool: &FragmentPool,
    selection: &[usize],
    options: &ComposeOptions,
    picker: &mut dyn BeatPicker,
) -> Result<Score, RemixError> {
    if options.beats < 1 {
        return Err(RemixError::InvalidBeatCount(options.beats));
    }

    let selected = pool.select(selection);
    if selected.is_empty() {
        return Err(RemixError::EmptySelection);
    }

    let template = selected[0];
    let mut composed = template.score().skeleton();

    let mut measure = Measure::empty(1);

    let mut attrs = fragment_attributes(template).cloned().unwrap_or_default();
    attrs.set_quarter_time(options.beats);
    attrs.set_staff_lines(5);
    if options.force_treble_clef {
        attrs.set_treble_clef();
    }
    measure.attributes = Some(attrs);

    for _ in 0..options.beats {
        let choice = picker.pick(selected.len()) % selected.len();
        append_fragment_content(&mut measure, selected[choice]);
    }

    // The skeleton retains the template's single part; the composed
    // measure becomes its only measure.
    composed
        .parts
        .first_mut()
        .ok_or(RemixError::EmptySelection)?
        .measures
        .push(measure);

    Ok(composed)
}

/// Compose from every fragment in the pool with the production random
/// source.
pub fn compose_from_pool(
    pool: &FragmentPool,
    options: &ComposeOptions,
) -> Result<Score, RemixError> {
    let all = pool.all_indices();
    compose_measure(pool, &all, options, &mut UniformPicker)
}

/// Copy one fragment's measure content into `measure`, excluding the
/// attributes block and layout hints.
fn append_fragment_content(measure: &mut Measure, fragment: &Fragment) {
    let source = match fragment
        .score()
        .parts
        .first()
        .and_then(|p| p.measures.first())
    {
        Some(m) => m,
        None => return,
    };

    measure.notes.extend(source.notes.iter().cloned());
    measure.harmonies.extend(source.harmonies.iter().cloned());
    measure.directions.extend(source.directions.iter().cloned());
    measure.barlines.extend(source.barlines.iter().cloned());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::extract_fragments;
    use crate::model::*;

    /// Reference score with three one-beat measures: a quarter note, two
    /// eighths, and a quarter rest.
    fn sample_pool() -> FragmentPool {
        let mut score = Score::new();
        score.title = Some("Patterns".to_string());

        let note = |duration: i32, note_type: &str, rest: bool| Note {
            duration,
            note_type: Some(note_type.to_string()),
            rest,
            pitch: (!rest).then(|| Pitch {
                step: "C".to_string(),
                octave: 5,
                alter: None,
            }),
            ..Note::default()
        };

        let mut first = Measure::empty(1);
        let mut attrs = Attributes {
            divisions: Some(4),
            ..Attributes::default()
        };
        attrs.set_quarter_time(1);
        first.attributes = Some(attrs);
        first.notes.push(note(4, "quarter", false));

        let mut second = Measure::empty(2);
        second.notes.push(note(2, "eighth", false));
        second.notes.push(note(2, "eighth", false));

        let mut third = Measure::empty(3);
        third.notes.push(note(4, "quarter", true));

        score.parts.push(Part {
            id: "P1".to_string(),
            name: "Percussion".to_string(),
            abbreviation: None,
            midi_program: None,
            midi_channel: None,
            measures: vec![first, second, third],
        });

        extract_fragments(&score).unwrap()
    }

    fn composed_measure(score: &Score) -> &Measure {
        &score.parts[0].measures[0]
    }

    #[test]
    fn draws_exactly_n_groups_in_sampled_order() {
        let pool = sample_pool();
        let mut picker = SequencePicker::new(vec![0, 1, 2, 1]);
        let composed = compose_measure(
            &pool,
            &[0, 1, 2],
            &ComposeOptions::new(4),
            &mut picker,
        )
        .unwrap();

        let measure = composed_measure(&composed);
        // quarter (1) + eighths (2) + rest (1) + eighths (2)
        assert_eq!(measure.notes.len(), 6);
        assert_eq!(measure.notes[0].note_type.as_deref(), Some("quarter"));
        assert_eq!(measure.notes[1].note_type.as_deref(), Some("eighth"));
        assert_eq!(measure.notes[3].note_type.as_deref(), Some("quarter"));
        assert!(measure.notes[3].rest);
        assert_eq!(measure.notes[4].note_type.as_deref(), Some("eighth"));
    }

    #[test]
    fn time_signature_matches_requested_beats() {
        let pool = sample_pool();
        for beats in [1, 3, 4, 7] {
            let composed = compose_measure(
                &pool,
                &[0, 1],
                &ComposeOptions::new(beats),
                &mut SequencePicker::new(vec![0]),
            )
            .unwrap();
            let attrs = composed_measure(&composed).attributes.as_ref().unwrap();
            assert_eq!(
                attrs.time,
                Some(TimeSignature {
                    beats,
                    beat_type: 4
                })
            );
        }
    }

    #[test]
    fn staff_lines_are_always_five() {
        let pool = sample_pool();
        let composed = compose_measure(
            &pool,
            &[1],
            &ComposeOptions::new(2),
            &mut SequencePicker::new(vec![0]),
        )
        .unwrap();
        let attrs = composed_measure(&composed).attributes.as_ref().unwrap();
        assert_eq!(attrs.staff_lines(), Some(5));
    }

    #[test]
    fn attributes_appear_only_once() {
        let pool = sample_pool();
        let composed = compose_measure(
            &pool,
            &[0, 1, 2],
            &ComposeOptions::new(8),
            &mut SequencePicker::new(vec![0, 1, 2]),
        )
        .unwrap();
        assert_eq!(composed.parts[0].measures.len(), 1);
        assert!(composed_measure(&composed).attributes.is_some());
    }

    #[test]
    fn single_fragment_pool_repeats_it() {
        let pool = sample_pool();
        let composed = compose_measure(
            &pool,
            &[1],
            &ComposeOptions::new(3),
            &mut UniformPicker,
        )
        .unwrap();
        // Fragment 1 holds two eighths; three draws of it = six notes.
        let measure = composed_measure(&composed);
        assert_eq!(measure.notes.len(), 6);
        assert!(measure
            .notes
            .iter()
            .all(|n| n.note_type.as_deref() == Some("eighth")));
    }

    #[test]
    fn invalid_beat_count_is_rejected() {
        let pool = sample_pool();
        for beats in [0, -1, -42] {
            let err = compose_measure(
                &pool,
                &[0],
                &ComposeOptions::new(beats),
                &mut UniformPicker,
            )
            .unwrap_err();
            assert!(matches!(err, RemixError::InvalidBeatCount(b) if b == beats));
        }
    }

    #[test]
    fn empty_selection_is_advisory() {
        let pool = sample_pool();
        let err = compose_measure(&pool, &[], &ComposeOptions::new(4), &mut UniformPicker)
            .unwrap_err();
        assert!(matches!(err, RemixError::EmptySelection));
        assert!(err.is_advisory());
    }

    #[test]
    fn out_of_range_selection_only_is_empty() {
        let pool = sample_pool();
        let err = compose_measure(
            &pool,
            &[17, 99],
            &ComposeOptions::new(4),
            &mut UniformPicker,
        )
        .unwrap_err();
        assert!(matches!(err, RemixError::EmptySelection));
    }

    #[test]
    fn forced_treble_clef_is_synthesized() {
        let pool = sample_pool();
        let options = ComposeOptions {
            beats: 2,
            force_treble_clef: true,
        };
        let composed =
            compose_measure(&pool, &[0], &options, &mut SequencePicker::new(vec![0]))
                .unwrap();
        let attrs = composed_measure(&composed).attributes.as_ref().unwrap();
        let clef = attrs.clefs.iter().find(|c| c.number == 1).unwrap();
        assert_eq!(clef.sign, "G");
        assert_eq!(clef.line, 2);
    }

    #[test]
    fn pool_is_untouched_by_composition() {
        let pool = sample_pool();
        let before: Vec<usize> = pool.iter().map(|f| f.score().measure_count()).collect();
        let _ = compose_measure(
            &pool,
            &[0, 1, 2],
            &ComposeOptions::new(6),
            &mut UniformPicker,
        )
        .unwrap();
        let after: Vec<usize> = pool.iter().map(|f| f.score().measure_count()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn uniform_picker_stays_in_range() {
        let mut picker = UniformPicker;
        for _ in 0..200 {
            assert!(picker.pick(3) < 3);
        }
    }
}
