//! Horizontal span plan: a score-wide x position for every event onset.
//!
//! Onsets are collected per measure index across all parts so simultaneous
//! events share one x position, which keeps staves and parts aligned.

use crate::model::*;

use super::metrics::*;

/// Horizontal layout of one measure (shared by all parts).
#[derive(Clone, Debug, PartialEq)]
pub struct MeasureSpan {
    /// x of the measure's left edge within the part.
    pub x: f64,
    pub width: f64,
    /// Space reserved for clef/key/time at the start of the measure.
    pub prefix: f64,
    /// `(onset in quarter notes, x relative to the measure)`, sorted by onset.
    pub onsets: Vec<(f64, f64)>,
}

impl MeasureSpan {
    /// x (relative to the measure) of the slot closest to `onset`.
    pub fn x_at(&self, onset: f64) -> f64 {
        let mut best_x = self.onsets.first().map_or(self.width / 2.0, |o| o.1);
        let mut best_dist = f64::MAX;
        for &(bt, x) in &self.onsets {
            let dist = (bt - onset).abs();
            if dist < best_dist {
                best_dist = dist;
                best_x = x;
            }
        }
        best_x
    }

    /// First x after the prefix, where events may start.
    pub fn content_start(&self) -> f64 {
        MEASURE_PADDING + self.prefix
    }
}

/// Span plan for the whole score.
#[derive(Clone, Debug, Default)]
pub struct SpanPlan {
    measures: Vec<MeasureSpan>,
}

impl SpanPlan {
    /// Compute spans for every measure index of `score`.
    ///
    /// With `natural_spacing` a slot's width follows the time until the next
    /// onset; otherwise every slot gets the same width.
    pub fn build(score: &Score, natural_spacing: bool) -> Self {
        let measure_count = score.parts.iter().map(|p| p.measures.len()).max().unwrap_or(0);
        let mut divisions: Vec<i32> = vec![1; score.parts.len()];
        let mut measures = Vec::with_capacity(measure_count);
        let mut x = 0.0;

        for mi in 0..measure_count {
            let mut events: Vec<(f64, f64)> = Vec::new(); // (onset, duration)
            let mut lyric_widths: Vec<(f64, f64)> = Vec::new(); // (onset, width)
            let mut prefix: f64 = 0.0;

            for (pidx, part) in score.parts.iter().enumerate() {
                let Some(measure) = part.measures.get(mi) else {
                    continue;
                };
                if let Some(ref attrs) = measure.attributes {
                    if let Some(d) = attrs.divisions {
                        divisions[pidx] = d.max(1);
                    }
                    prefix = prefix.max(prefix_width(attrs));
                }
                let div = divisions[pidx] as f64;
                let onsets = note_onsets(&measure.notes, divisions[pidx]);
                for (note, &onset) in measure.notes.iter().zip(&onsets) {
                    if note.grace {
                        continue;
                    }
                    events.push((onset, note.duration as f64 / div));
                    if let Some(w) = note.lyrics.iter().map(|l| text_width(&l.text)).reduce(f64::max) {
                        lyric_widths.push((onset, w));
                    }
                }
            }

            let mut unique: Vec<f64> = Vec::new();
            for &(onset, _) in &events {
                if !unique.iter().any(|&u| (u - onset).abs() < 0.001) {
                    unique.push(onset);
                }
            }
            unique.sort_by(|a, b| a.total_cmp(b));

            let mut onsets = Vec::with_capacity(unique.len());
            let mut cursor = MEASURE_PADDING + prefix;
            for (i, &onset) in unique.iter().enumerate() {
                let span = match unique.get(i + 1) {
                    Some(&next) => next - onset,
                    None => shortest_from(&events, onset),
                };
                let mut slot = if natural_spacing {
                    (span * QUARTER_WIDTH).max(MIN_EVENT_WIDTH)
                } else {
                    QUARTER_WIDTH
                };
                for &(lo, w) in &lyric_widths {
                    if (lo - onset).abs() < 0.001 {
                        slot = slot.max(w + MIN_EVENT_WIDTH / 4.0);
                    }
                }
                onsets.push((onset, cursor + NOTE_WIDTH));
                cursor += slot;
            }

            let width = if onsets.is_empty() {
                EMPTY_MEASURE_WIDTH.max(MEASURE_PADDING * 2.0 + prefix)
            } else {
                cursor + MEASURE_PADDING
            };
            measures.push(MeasureSpan {
                x,
                width,
                prefix,
                onsets,
            });
            x += width;
        }

        Self { measures }
    }

    pub fn measure(&self, index: usize) -> Option<&MeasureSpan> {
        self.measures.get(index)
    }

    pub fn len(&self) -> usize {
        self.measures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    /// Total width of all measures.
    pub fn width(&self) -> f64 {
        self.measures.last().map_or(0.0, |m| m.x + m.width)
    }
}

/// Onset (in quarter notes from the start of the measure) of every note,
/// tracking time per voice; chord members share the previous onset.
pub fn note_onsets(notes: &[Note], divisions: i32) -> Vec<f64> {
    use std::collections::HashMap;
    let mut voice_times: HashMap<i32, f64> = HashMap::new();
    let mut last_onset = 0.0;
    let mut onsets = Vec::with_capacity(notes.len());

    for note in notes {
        if note.chord {
            onsets.push(last_onset);
            continue;
        }
        let current = voice_times.entry(note.voice.unwrap_or(1)).or_insert(0.0);
        last_onset = *current;
        onsets.push(*current);
        if !note.grace {
            *current += note.duration as f64 / divisions.max(1) as f64;
        }
    }

    onsets
}

/// Width of the clef/key/time block a measure's attributes need.
pub fn prefix_width(attrs: &Attributes) -> f64 {
    let mut w = 0.0;
    if !attrs.clefs.is_empty() {
        w += CLEF_SPACE;
    }
    if let Some(ref key) = attrs.key {
        if key.fifths != 0 {
            w += key.fifths.unsigned_abs() as f64 * KEY_ACCIDENTAL_SPACE + 4.0;
        }
    }
    if attrs.time.is_some() {
        w += TIME_SIG_SPACE;
    }
    w
}

fn shortest_from(events: &[(f64, f64)], onset: f64) -> f64 {
    events
        .iter()
        .filter(|(o, _)| (o - onset).abs() < 0.001)
        .map(|&(_, d)| d)
        .filter(|&d| d > 0.0)
        .reduce(f64::min)
        .unwrap_or(1.0)
}
