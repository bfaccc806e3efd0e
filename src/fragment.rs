//! Fragment extraction — splits a reference score into an ordered pool of
//! one-beat measures, each restorable to a standalone, renderable document.
//!
//! The pool is immutable once built: re-extracting from the same source
//! yields a content-equal pool, so callers can hold one per loaded score
//! and compose from it any number of times.

use crate::error::RemixError;
use crate::model::{Attributes, Score};
use crate::writer::score_to_musicxml;

/// One extracted measure, wrapped into a minimal standalone score that
/// carries the reference's identification, defaults, and part list.
#[derive(Debug, Clone)]
pub struct Fragment {
    index: usize,
    score: Score,
}

impl Fragment {
    /// Position of this fragment in extraction order (0-based).
    pub fn index(&self) -> usize {
        self.index
    }

    /// The standalone single-measure score.
    pub fn score(&self) -> &Score {
        &self.score
    }

    /// Serialize the fragment to a MusicXML string (e.g., for previewing
    /// it on its own).
    pub fn to_musicxml(&self) -> String {
        score_to_musicxml(&self.score)
    }
}

/// An ordered, immutable pool of extracted fragments.
#[derive(Debug, Clone)]
pub struct FragmentPool {
    fragments: Vec<Fragment>,
}

impl FragmentPool {
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Fragment> {
        self.fragments.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter()
    }

    /// Resolve a set of selected indices to fragments, in the order given.
    /// Indices that don't exist in the pool are skipped.
    pub fn select(&self, indices: &[usize]) -> Vec<&Fragment> {
        indices.iter().filter_map(|&i| self.get(i)).collect()
    }

    /// Every index in the pool, in extraction order.
    pub fn all_indices(&self) -> Vec<usize> {
        (0..self.fragments.len()).collect()
    }
}

/// Split the first part of `source` into one fragment per measure.
///
/// Each fragment's measure is renumbered 1, its attributes are rewritten to
/// declare a 1/4 time signature and a 5-line staff (synthesized when the
/// measure carried neither), and layout hints are dropped. The source score
/// is only read, never mutated.
///
/// Returns [`RemixError::EmptyScore`] when the source has no measures.
pub fn extract_fragments(source: &Score) -> Result<FragmentPool, RemixError> {
    let part = source.parts.first().ok_or(RemixError::EmptyScore)?;
    if part.measures.is_empty() {
        return Err(RemixError::EmptyScore);
    }

    // Measures after the first usually carry no attributes of their own;
    // fall back to the part's opening attributes so every fragment is
    // renderable standalone (divisions, key, clef).
    let opening_attributes = part
        .measures
        .iter()
        .find_map(|m| m.attributes.as_ref());

    let fragments = part
        .measures
        .iter()
        .enumerate()
        .map(|(index, measure)| {
            let mut standalone = source.skeleton();
            standalone.parts.truncate(1);

            let mut fragment_measure = measure.clone();
            fragment_measure.number = 1;
            fragment_measure.new_system = false;
            fragment_measure.new_page = false;

            let mut attrs = fragment_measure
                .attributes
                .take()
                .or_else(|| opening_attributes.cloned())
                .unwrap_or_default();
            attrs.set_quarter_time(1);
            attrs.set_staff_lines(5);
            fragment_measure.attributes = Some(attrs);

            standalone.parts[0].measures.push(fragment_measure);

            Fragment {
                index,
                score: standalone,
            }
        })
        .collect();

    Ok(FragmentPool { fragments })
}

/// The attributes block of a fragment's sole measure.
///
/// Extraction guarantees every fragment has one; this is a convenience for
/// the composer, which derives the composed measure's attributes from its
/// template fragment.
pub(crate) fn fragment_attributes(fragment: &Fragment) -> Option<&Attributes> {
    fragment
        .score
        .parts
        .first()
        .and_then(|p| p.measures.first())
        .and_then(|m| m.attributes.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    fn three_measure_source() -> Score {
        let mut score = Score::new();
        score.title = Some("Reference".to_string());

        let mut first = Measure::empty(1);
        let mut attrs = Attributes {
            divisions: Some(4),
            ..Attributes::default()
        };
        attrs.set_quarter_time(1);
        first.attributes = Some(attrs);
        first.new_system = true;
        first.notes.push(Note {
            duration: 4,
            note_type: Some("quarter".to_string()),
            rest: false,
            pitch: Some(Pitch {
                step: "C".to_string(),
                octave: 5,
                alter: None,
            }),
            ..Note::default()
        });

        let mut second = Measure::empty(2);
        for _ in 0..2 {
            second.notes.push(Note {
                duration: 2,
                note_type: Some("eighth".to_string()),
                pitch: Some(Pitch {
                    step: "C".to_string(),
                    octave: 5,
                    alter: None,
                }),
                ..Note::default()
            });
        }

        let mut third = Measure::empty(3);
        third.notes.push(Note {
            duration: 4,
            rest: true,
            note_type: Some("quarter".to_string()),
            ..Note::default()
        });

        score.parts.push(Part {
            id: "P1".to_string(),
            name: "Percussion".to_string(),
            abbreviation: None,
            midi_program: None,
            midi_channel: None,
            measures: vec![first, second, third],
        });
        score
    }

    #[test]
    fn extracts_one_fragment_per_measure() {
        let pool = extract_fragments(&three_measure_source()).unwrap();
        assert_eq!(pool.len(), 3);
        for (i, fragment) in pool.iter().enumerate() {
            assert_eq!(fragment.index(), i);
            assert_eq!(fragment.score().measure_count(), 1);
            assert_eq!(fragment.score().parts[0].measures[0].number, 1);
        }
    }

    #[test]
    fn rewrites_time_and_staff_lines() {
        let pool = extract_fragments(&three_measure_source()).unwrap();
        for fragment in pool.iter() {
            let attrs = fragment_attributes(fragment).expect("fragment attributes");
            assert_eq!(
                attrs.time,
                Some(TimeSignature {
                    beats: 1,
                    beat_type: 4
                })
            );
            assert_eq!(attrs.staff_lines(), Some(5));
        }
    }

    #[test]
    fn synthesizes_attributes_from_opening_measure() {
        // Measures 2 and 3 carry no attributes; their fragments inherit the
        // opening divisions.
        let pool = extract_fragments(&three_measure_source()).unwrap();
        let attrs = fragment_attributes(pool.get(1).unwrap()).unwrap();
        assert_eq!(attrs.divisions, Some(4));
    }

    #[test]
    fn drops_layout_hints() {
        let pool = extract_fragments(&three_measure_source()).unwrap();
        let measure = &pool.get(0).unwrap().score().parts[0].measures[0];
        assert!(!measure.new_system);
        assert!(!measure.new_page);
    }

    #[test]
    fn source_is_not_mutated() {
        let source = three_measure_source();
        let _ = extract_fragments(&source).unwrap();
        assert!(source.parts[0].measures[0].new_system);
        assert!(source.parts[0].measures[1].attributes.is_none());
    }

    #[test]
    fn empty_source_is_an_error() {
        let mut score = three_measure_source();
        score.parts[0].measures.clear();
        let err = extract_fragments(&score).unwrap_err();
        assert!(matches!(err, RemixError::EmptyScore));
        assert!(err.is_advisory());
    }

    #[test]
    fn select_skips_unknown_indices() {
        let pool = extract_fragments(&three_measure_source()).unwrap();
        let picked = pool.select(&[2, 9, 0]);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].index(), 2);
        assert_eq!(picked[1].index(), 0);
    }
}
