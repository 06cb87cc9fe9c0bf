//! Top-down construction of the geometry tree.
//!
//! Score → parts (stacked vertically) → measures → chords → note heads and
//! their stems, accidentals, dots and marks. Directions and spanners are
//! children of the part because they may cross measure boundaries.

use std::collections::HashMap;

use kurbo::{Point, Rect, Size, Vec2};

use crate::model::*;

use super::kind::GeometryKind;
use super::metrics::*;
use super::spans::{note_onsets, MeasureSpan, SpanPlan};
use super::tree::{ChordData, GeometryData, GeometryId, GeometryNode, GeometryTree, NoteData};

const LYRIC_OFFSET: f64 = 36.0;
const MIN_BEAMED_STEM: f64 = 18.0;
const MAX_BEAM_SLOPE: f64 = 0.5;
const BEAM_LEVEL_GAP: f64 = 3.0;

/// Builds the [`GeometryTree`] of a score.
pub struct TreeBuilder<'a> {
    score: &'a Score,
    spans: SpanPlan,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(score: &'a Score, natural_spacing: bool) -> Self {
        Self {
            score,
            spans: SpanPlan::build(score, natural_spacing),
        }
    }

    pub fn spans(&self) -> &SpanPlan {
        &self.spans
    }

    pub fn build(&self) -> GeometryTree {
        let mut tree = GeometryTree::new(GeometryNode::new(GeometryKind::Score, GeometryData::Empty));
        let root = tree.root();
        let mut y = 0.0;

        for (index, part) in self.score.parts.iter().enumerate() {
            let metrics = PartMetrics::new(part.staves());
            let part_node = GeometryNode::new(
                GeometryKind::Part,
                GeometryData::Part {
                    index,
                    staves: metrics.staves,
                },
            )
            .at(Point::new(0.0, y))
            .with_size(Size::new(self.spans.width(), metrics.height()));
            let id = tree.add(root, part_node);

            PartBuilder::new(&mut tree, id, metrics, &self.spans).build(part);
            y += metrics.height();
        }

        tree.fit_to_children(root);
        tree
    }
}

/// Something positioned at one onset of a measure.
enum Event {
    /// Indices of the chord's notes in `Measure::notes`.
    Chord(Vec<usize>),
    Rest(usize),
}

struct OpenWedge {
    x: f64,
    staff: i32,
    placement: Placement,
    wedge_type: WedgeType,
    spread: f64,
}

struct OpenShift {
    x: f64,
    staff: i32,
    shift_type: OctaveShiftType,
    size: i32,
}

/// Running state while one part is laid out measure by measure.
struct PartBuilder<'t> {
    tree: &'t mut GeometryTree,
    part: GeometryId,
    metrics: PartMetrics,
    spans: &'t SpanPlan,
    divisions: i32,
    clefs: HashMap<i32, Clef>,
    key: Key,
    wedges: HashMap<i32, OpenWedge>,
    shift: Option<OpenShift>,
}

impl<'t> PartBuilder<'t> {
    fn new(tree: &'t mut GeometryTree, part: GeometryId, metrics: PartMetrics, spans: &'t SpanPlan) -> Self {
        Self {
            tree,
            part,
            metrics,
            spans,
            divisions: 1,
            clefs: HashMap::new(),
            key: Key::default(),
            wedges: HashMap::new(),
            shift: None,
        }
    }

    fn build(mut self, part: &Part) {
        let spans = self.spans;
        for (index, measure) in part.measures.iter().enumerate() {
            let Some(span) = spans.measure(index) else {
                continue;
            };
            self.build_measure(index, measure, span);
        }

        // Spanners never closed run to the end of the part.
        let end = spans.width();
        let mut open: Vec<(i32, OpenWedge)> = std::mem::take(&mut self.wedges).into_iter().collect();
        open.sort_by_key(|(number, _)| *number);
        for (_, wedge) in open {
            self.add_wedge(wedge, end);
        }
        if let Some(shift) = self.shift.take() {
            self.add_octave_shift(shift, end);
        }
    }

    fn build_measure(&mut self, index: usize, measure: &Measure, span: &MeasureSpan) {
        let node = GeometryNode::new(
            GeometryKind::Measure,
            GeometryData::Measure {
                index,
                number: measure.number,
            },
        )
        .at(Point::new(span.x, 0.0))
        .with_size(Size::new(span.width, self.metrics.height()));
        let id = self.tree.add(self.part, node);

        if let Some(ref attrs) = measure.attributes {
            self.build_attributes(id, attrs);
        }

        let onsets = note_onsets(&measure.notes, self.divisions);
        let events = group_events(&measure.notes);
        let directions = self.stem_directions(measure, &events);
        let beams = self.beam_lines(measure, &events, &directions, &onsets, span);

        for (ei, event) in events.iter().enumerate() {
            match event {
                Event::Chord(indices) => {
                    let x = span.x_at(onsets[indices[0]]);
                    let tip = beams.tips.get(&ei).copied();
                    self.build_chord(id, measure, indices, x, directions[ei], tip);
                }
                Event::Rest(i) => {
                    let note = &measure.notes[*i];
                    let x = if note.measure_rest || note.note_type.is_none() {
                        span.width / 2.0
                    } else {
                        span.x_at(onsets[*i])
                    };
                    self.build_rest(id, note, x);
                }
            }
        }

        for beam in beams.lines {
            self.tree.add(id, beam);
        }

        self.build_barline(id, measure, span);

        for direction in &measure.directions {
            let x = match onsets.get(direction.note_index) {
                Some(&onset) => span.x + span.x_at(onset),
                None => span.x + span.width - MEASURE_PADDING,
            };
            self.build_direction(direction, x);
        }
    }

    // ── Attributes ──────────────────────────────────────────────────

    fn build_attributes(&mut self, measure: GeometryId, attrs: &Attributes) {
        if let Some(d) = attrs.divisions {
            self.divisions = d.max(1);
        }
        for clef in &attrs.clefs {
            self.clefs.insert(clef.number, clef.clone());
        }
        if let Some(ref key) = attrs.key {
            self.key = key.clone();
        }

        for staff in 1..=self.metrics.staves {
            let origin = self.metrics.staff_origin(staff);
            let mut x = MEASURE_PADDING;

            if !attrs.clefs.is_empty() {
                if let Some(clef) = attrs.clefs.iter().find(|c| c.number == staff) {
                    let frame = Rect::new(
                        x,
                        origin - STAFF_LINE_SPACING,
                        x + CLEF_WIDTH,
                        origin + STAFF_HEIGHT + STAFF_LINE_SPACING,
                    );
                    self.tree.add(
                        measure,
                        GeometryNode::new(GeometryKind::Clef, GeometryData::Clef(clef.clone())).with_frame(frame),
                    );
                }
                x += CLEF_SPACE;
            }

            if let Some(ref key) = attrs.key {
                if key.fifths != 0 {
                    let width = key.fifths.unsigned_abs() as f64 * KEY_ACCIDENTAL_SPACE;
                    let frame = Rect::new(x, origin, x + width, origin + STAFF_HEIGHT);
                    self.tree.add(
                        measure,
                        GeometryNode::new(GeometryKind::Key, GeometryData::Key(key.clone())).with_frame(frame),
                    );
                    x += width + 4.0;
                }
            }

            if let Some(ref time) = attrs.time {
                let frame = Rect::new(x, origin, x + TIME_SIG_WIDTH, origin + STAFF_HEIGHT);
                self.tree.add(
                    measure,
                    GeometryNode::new(GeometryKind::TimeSignature, GeometryData::TimeSignature(time.clone()))
                        .with_frame(frame),
                );
            }
        }
    }

    // ── Stems and beams ─────────────────────────────────────────────

    /// Staff-relative y of each note head of a chord.
    fn note_ys(&self, measure: &Measure, indices: &[usize]) -> Vec<f64> {
        indices
            .iter()
            .map(|&i| {
                let note = &measure.notes[i];
                note.pitch
                    .as_ref()
                    .map_or(STAFF_HEIGHT / 2.0, |p| pitch_to_staff_y(p, self.clefs.get(&note.staff())))
            })
            .collect()
    }

    /// Stem direction per event; beamed chords share their group's direction.
    fn stem_directions(&self, measure: &Measure, events: &[Event]) -> Vec<Stem> {
        let mut directions: Vec<Stem> = events
            .iter()
            .map(|event| match event {
                Event::Chord(indices) => {
                    let first = &measure.notes[indices[0]];
                    if first.is_whole() {
                        Stem::None
                    } else {
                        infer_stem(first.stem, &self.note_ys(measure, indices))
                    }
                }
                Event::Rest(_) => Stem::None,
            })
            .collect();

        for group in beam_groups(measure, events) {
            let first = chord_notes(&events[group[0]]);
            let ys: Vec<f64> = group
                .iter()
                .flat_map(|&ei| self.note_ys(measure, chord_notes(&events[ei])))
                .collect();
            let direction = infer_stem(measure.notes[first[0]].stem, &ys);
            for &ei in &group {
                directions[ei] = direction;
            }
        }
        directions
    }

    fn beam_lines(
        &self,
        measure: &Measure,
        events: &[Event],
        directions: &[Stem],
        onsets: &[f64],
        span: &MeasureSpan,
    ) -> BeamLayout {
        let mut layout = BeamLayout::default();

        for group in beam_groups(measure, events) {
            let stem = directions[group[0]];
            if !matches!(stem, Stem::Up | Stem::Down) {
                continue;
            }
            let up = stem == Stem::Up;
            let staff = measure.notes[chord_notes(&events[group[0]])[0]].staff();
            let origin = self.metrics.staff_origin(staff);

            // (event, stem x in measure space, staff-relative head y nearest the tip, natural tip)
            let stems: Vec<(usize, f64, f64, f64)> = group
                .iter()
                .map(|&ei| {
                    let indices = chord_notes(&events[ei]);
                    let ys = self.note_ys(measure, indices);
                    let x = span.x_at(onsets[indices[0]]) + stem_offset(stem) + STEM_NO_FLAG_WIDTH / 2.0;
                    let (head, tip) = if up {
                        let head = ys.iter().copied().fold(f64::MAX, f64::min);
                        (head, head - STEM_LENGTH)
                    } else {
                        let head = ys.iter().copied().fold(f64::MIN, f64::max);
                        (head, head + STEM_LENGTH)
                    };
                    (ei, x, head, tip)
                })
                .collect();

            let (Some(first), Some(last)) = (stems.first(), stems.last()) else {
                continue;
            };
            let dx = last.1 - first.1;
            let slope = if dx.abs() > 0.1 {
                ((last.3 - first.3) / dx).clamp(-MAX_BEAM_SLOPE, MAX_BEAM_SLOPE)
            } else {
                0.0
            };
            let beam_y = |x: f64| first.3 + slope * (x - first.1);

            let mut shift = 0.0_f64;
            for &(_, x, head, _) in &stems {
                let length = (head - (beam_y(x) + shift)).abs();
                if length < MIN_BEAMED_STEM {
                    shift += if up {
                        -(MIN_BEAMED_STEM - length)
                    } else {
                        MIN_BEAMED_STEM - length
                    };
                }
            }

            for &(ei, x, _, _) in &stems {
                layout.tips.insert(ei, beam_y(x) + shift);
            }

            let levels = group
                .iter()
                .flat_map(|&ei| chord_notes(&events[ei]).iter())
                .flat_map(|&i| measure.notes[i].beams.iter().map(|b| b.number))
                .max()
                .unwrap_or(1)
                .max(1) as usize;
            let start = Point::new(first.1, origin + beam_y(first.1) + shift);
            let stop = Point::new(last.1, origin + beam_y(last.1) + shift);
            let depth = BEAM_THICKNESS * levels as f64 + BEAM_LEVEL_GAP * (levels - 1) as f64;
            let mut frame = Rect::from_points(start, stop);
            if up {
                frame.y1 += depth;
            } else {
                frame.y0 -= depth;
            }
            layout.lines.push(
                GeometryNode::new(GeometryKind::Beam, GeometryData::Beam { start, stop, levels }).with_frame(frame),
            );
        }
        layout
    }

    // ── Chords and rests ────────────────────────────────────────────

    fn build_chord(
        &mut self,
        measure_id: GeometryId,
        measure: &Measure,
        indices: &[usize],
        x: f64,
        stem: Stem,
        beam_tip: Option<f64>,
    ) {
        let staff = measure.notes[indices[0]].staff();
        let origin = self.metrics.staff_origin(staff);
        let chord = self.tree.add(
            measure_id,
            GeometryNode::new(
                GeometryKind::Chord,
                GeometryData::Chord(ChordData {
                    staff,
                    stem: None,
                    stem_direction: None,
                }),
            )
            .at(Point::new(x, origin)),
        );

        let ys = self.note_ys(measure, indices);
        let top = ys.iter().copied().fold(f64::MAX, f64::min);
        let bottom = ys.iter().copied().fold(f64::MIN, f64::max);

        for (&i, &y) in indices.iter().zip(&ys) {
            let note = &measure.notes[i];
            self.tree.add(
                chord,
                GeometryNode::new(
                    GeometryKind::Note,
                    GeometryData::Note(NoteData {
                        note: note.clone(),
                        stem,
                    }),
                )
                .at(Point::new(0.0, y))
                .with_size(Size::new(NOTE_WIDTH, NOTE_HEIGHT))
                .with_anchor(Vec2::new(NOTE_WIDTH / 2.0, NOTE_HEIGHT / 2.0)),
            );

            if let Some(text) = accidental_for(note, &self.key) {
                let x1 = -NOTE_WIDTH / 2.0 - ACCIDENTAL_GAP;
                let frame = Rect::new(
                    x1 - ACCIDENTAL_WIDTH,
                    y - ACCIDENTAL_HEIGHT / 2.0,
                    x1,
                    y + ACCIDENTAL_HEIGHT / 2.0,
                );
                self.tree.add(
                    chord,
                    GeometryNode::new(GeometryKind::Accidental, GeometryData::Accidental(text)).with_frame(frame),
                );
            }

            // Dots sit in a space, never on a line.
            let on_line = (y / STAFF_LINE_SPACING).fract().abs() < 0.01;
            let dot_y = if on_line { y - STAFF_LINE_SPACING / 2.0 } else { y };
            for d in 0..note.dots {
                let x0 = NOTE_WIDTH / 2.0 + DOT_GAP + d as f64 * (DOT_SIZE + DOT_GAP);
                let frame = Rect::new(x0, dot_y - DOT_SIZE / 2.0, x0 + DOT_SIZE, dot_y + DOT_SIZE / 2.0);
                self.tree
                    .add(chord, GeometryNode::new(GeometryKind::Dot, GeometryData::Dot).with_frame(frame));
            }
        }

        let first = &measure.notes[indices[0]];
        let mut extent = (top - NOTE_HEIGHT / 2.0, bottom + NOTE_HEIGHT / 2.0);

        if matches!(stem, Stem::Up | Stem::Down) {
            let flags = if beam_tip.is_some() { 0 } else { first.flag_count() };
            let extra = match flags {
                2 => 4.0,
                3 => 9.0,
                4 => 13.0,
                _ => 0.0,
            };
            let width = if flags > 0 { STEM_FLAG_WIDTH } else { STEM_NO_FLAG_WIDTH };
            let x0 = stem_offset(stem);
            let frame = if stem == Stem::Up {
                let tip = beam_tip.unwrap_or(top - STEM_LENGTH - extra);
                Rect::new(x0, tip, x0 + width, bottom)
            } else {
                let tip = beam_tip.unwrap_or(bottom + STEM_LENGTH + extra);
                Rect::new(x0, top, x0 + width, tip)
            };
            extent = (extent.0.min(frame.min_y()), extent.1.max(frame.max_y()));

            let stem_id = self.tree.add(
                chord,
                GeometryNode::new(GeometryKind::Stem, GeometryData::Stem { direction: stem, flags }).with_frame(frame),
            );
            if let GeometryData::Chord(data) = self.tree.data_mut(chord) {
                data.stem = Some(stem_id);
                data.stem_direction = Some(stem);
            }
        }

        self.build_marks(chord, measure, indices, stem, extent);
        self.tree.fit_to_children(chord);

        for &i in indices {
            self.build_lyrics(measure_id, &measure.notes[i], x);
        }
    }

    /// Articulations, fermatas and ornaments stacked outward from the chord.
    fn build_marks(&mut self, chord: GeometryId, measure: &Measure, indices: &[usize], stem: Stem, extent: (f64, f64)) {
        let (mut above, mut below) = (extent.0 - MARK_GAP, extent.1 + MARK_GAP);
        let default_side = if stem == Stem::Up {
            Placement::Below
        } else {
            Placement::Above
        };

        let mut place = |tree: &mut GeometryTree, node: GeometryNode, size: Size, placement: Placement| {
            let x0 = -size.width / 2.0;
            let frame = match placement {
                Placement::Above => {
                    let frame = Rect::new(x0, above - size.height, x0 + size.width, above);
                    above = frame.min_y() - MARK_GAP;
                    frame
                }
                Placement::Below => {
                    let frame = Rect::new(x0, below, x0 + size.width, below + size.height);
                    below = frame.max_y() + MARK_GAP;
                    frame
                }
            };
            tree.add(chord, node.with_frame(frame));
        };

        for &i in indices {
            let notations = &measure.notes[i].notations;
            for articulation in &notations.articulations {
                place(
                    self.tree,
                    GeometryNode::new(
                        GeometryKind::Articulation,
                        GeometryData::Articulation(articulation.articulation_type),
                    ),
                    Size::new(ARTICULATION_SIZE, ARTICULATION_SIZE),
                    articulation.placement.unwrap_or(default_side),
                );
            }
            if let Some(ref fermata) = notations.fermata {
                place(
                    self.tree,
                    GeometryNode::new(
                        GeometryKind::Fermata,
                        GeometryData::Fermata {
                            inverted: fermata.inverted,
                        },
                    ),
                    Size::new(FERMATA_WIDTH, FERMATA_HEIGHT),
                    if fermata.inverted {
                        Placement::Below
                    } else {
                        Placement::Above
                    },
                );
            }
            for ornament in &notations.ornaments {
                place(
                    self.tree,
                    GeometryNode::new(GeometryKind::Ornament, GeometryData::Ornament(ornament.ornament_type)),
                    Size::new(ORNAMENT_WIDTH, ORNAMENT_HEIGHT),
                    ornament.placement.unwrap_or(Placement::Above),
                );
            }
        }
    }

    fn build_rest(&mut self, measure: GeometryId, note: &Note, x: f64) {
        let origin = self.metrics.staff_origin(note.staff());
        self.tree.add(
            measure,
            GeometryNode::new(GeometryKind::Rest, GeometryData::Rest(note.clone()))
                .at(Point::new(x, origin + STAFF_HEIGHT / 2.0))
                .with_size(Size::new(REST_WIDTH, REST_HEIGHT))
                .with_anchor(Vec2::new(REST_WIDTH / 2.0, REST_HEIGHT / 2.0)),
        );
    }

    fn build_lyrics(&mut self, measure: GeometryId, note: &Note, x: f64) {
        let origin = self.metrics.staff_origin(note.staff());
        for lyric in &note.lyrics {
            let width = text_width(&lyric.text);
            let y = origin + STAFF_HEIGHT + LYRIC_OFFSET + (lyric.number.max(1) - 1) as f64 * LYRIC_LINE_HEIGHT;
            self.tree.add(
                measure,
                GeometryNode::new(GeometryKind::Lyric, GeometryData::Text(lyric.text.clone()))
                    .with_frame(Rect::new(x - width / 2.0, y, x + width / 2.0, y + TEXT_HEIGHT)),
            );
        }
    }

    // ── Barlines and endings ────────────────────────────────────────

    fn build_barline(&mut self, measure_id: GeometryId, measure: &Measure, span: &MeasureSpan) {
        let top = self.metrics.staff_origin(1);
        let bottom = self.metrics.staff_origin(self.metrics.staves) + STAFF_HEIGHT;
        let style = measure
            .barlines
            .iter()
            .find(|b| b.location == "right")
            .and_then(|b| b.bar_style.clone());
        self.tree.add(
            measure_id,
            GeometryNode::new(GeometryKind::Barline, GeometryData::Barline(style))
                .with_frame(Rect::new(span.width - 1.0, top, span.width, bottom)),
        );

        for ending in measure.barlines.iter().filter_map(|b| b.ending.as_ref()) {
            if ending.ending_type != "start" {
                continue;
            }
            let y1 = top - DIRECTION_GAP;
            self.tree.add(
                measure_id,
                GeometryNode::new(GeometryKind::Ending, GeometryData::Ending(ending.number.clone()))
                    .with_frame(Rect::new(0.0, y1 - ENDING_HEIGHT, span.width, y1)),
            );
        }
    }

    // ── Directions ──────────────────────────────────────────────────

    /// Frame of a direction of `size` at `x` beside `staff`.
    fn direction_frame(&self, staff: i32, placement: Placement, x: f64, size: Size) -> Rect {
        let origin = self.metrics.staff_origin(staff);
        match placement {
            Placement::Above => Rect::new(
                x,
                origin - DIRECTION_GAP - size.height,
                x + size.width,
                origin - DIRECTION_GAP,
            ),
            Placement::Below => {
                let y0 = origin + STAFF_HEIGHT + DIRECTION_GAP;
                Rect::new(x, y0, x + size.width, y0 + size.height)
            }
        }
    }

    fn add_direction(&mut self, kind: GeometryKind, data: GeometryData, frame: Rect) {
        self.tree.add(self.part, GeometryNode::new(kind, data).with_frame(frame));
    }

    fn build_direction(&mut self, direction: &Direction, x: f64) {
        let staff = direction.staff.unwrap_or(1);
        match direction.direction_type {
            DirectionType::Words(ref text) => {
                let placement = direction.placement.unwrap_or(Placement::Above);
                let size = Size::new(text_width(text), TEXT_HEIGHT);
                let frame = self.direction_frame(staff, placement, x, size);
                self.add_direction(GeometryKind::Words, GeometryData::Text(text.clone()), frame);
            }
            DirectionType::Segno | DirectionType::Coda => {
                let kind = if direction.direction_type == DirectionType::Segno {
                    GeometryKind::Segno
                } else {
                    GeometryKind::Coda
                };
                let placement = direction.placement.unwrap_or(Placement::Above);
                let frame = self.direction_frame(staff, placement, x, Size::new(SIGN_WIDTH, SIGN_HEIGHT));
                self.add_direction(kind, GeometryData::Empty, frame);
            }
            DirectionType::Pedal(pedal_type) => {
                if pedal_type == PedalType::Continue {
                    return;
                }
                let placement = direction.placement.unwrap_or(Placement::Below);
                let frame = self.direction_frame(staff, placement, x, Size::new(PEDAL_WIDTH, PEDAL_HEIGHT));
                self.add_direction(GeometryKind::Pedal, GeometryData::Pedal(pedal_type), frame);
            }
            DirectionType::OctaveShift { shift_type, size } => match shift_type {
                OctaveShiftType::Up | OctaveShiftType::Down => {
                    if let Some(open) = self.shift.take() {
                        self.add_octave_shift(open, x);
                    }
                    self.shift = Some(OpenShift {
                        x,
                        staff,
                        shift_type,
                        size,
                    });
                }
                OctaveShiftType::Stop => match self.shift.take() {
                    Some(open) => self.add_octave_shift(open, x),
                    None => log::warn!("dropping octave-shift stop without a matching start"),
                },
                OctaveShiftType::Continue => {}
            },
            DirectionType::Wedge {
                wedge_type,
                number,
                spread,
            } => match wedge_type {
                WedgeType::Crescendo | WedgeType::Diminuendo => {
                    let open = OpenWedge {
                        x,
                        staff,
                        placement: direction.placement.unwrap_or(Placement::Below),
                        wedge_type,
                        spread,
                    };
                    if let Some(previous) = self.wedges.insert(number, open) {
                        self.add_wedge(previous, x);
                    }
                }
                WedgeType::Stop => match self.wedges.remove(&number) {
                    Some(open) => self.add_wedge(open, x),
                    None => log::warn!("dropping wedge stop without a matching start (number {number})"),
                },
                WedgeType::Continue => {}
            },
        }
    }

    fn add_wedge(&mut self, wedge: OpenWedge, stop_x: f64) {
        let spread = if wedge.spread > 0.0 { wedge.spread } else { STAFF_LINE_SPACING * 1.5 };
        let width = (stop_x - wedge.x).max(MIN_EVENT_WIDTH);
        let frame = self.direction_frame(
            wedge.staff,
            wedge.placement,
            wedge.x,
            Size::new(width, spread + 2.0 * WEDGE_LINE_WIDTH),
        );
        self.add_direction(
            GeometryKind::SpanDirection,
            GeometryData::Wedge {
                wedge_type: wedge.wedge_type,
                spread,
            },
            frame,
        );
    }

    fn add_octave_shift(&mut self, shift: OpenShift, stop_x: f64) {
        // type="down" shifts the written notes down, so the line is drawn above (8va).
        let placement = if shift.shift_type == OctaveShiftType::Down {
            Placement::Above
        } else {
            Placement::Below
        };
        let width = (stop_x - shift.x).max(MIN_EVENT_WIDTH);
        let frame = self.direction_frame(shift.staff, placement, shift.x, Size::new(width, OCTAVE_SHIFT_HEIGHT));
        self.add_direction(
            GeometryKind::OctaveShift,
            GeometryData::OctaveShift {
                shift_type: shift.shift_type,
                size: shift.size,
            },
            frame,
        );
    }
}

#[derive(Default)]
struct BeamLayout {
    /// Staff-relative stem tip y per beamed event.
    tips: HashMap<usize, f64>,
    lines: Vec<GeometryNode>,
}

/// Group a measure's notes into chords and rests; grace notes are skipped.
fn group_events(notes: &[Note]) -> Vec<Event> {
    let mut events: Vec<Event> = Vec::new();
    for (i, note) in notes.iter().enumerate() {
        if note.grace {
            continue;
        }
        if note.rest {
            events.push(Event::Rest(i));
            continue;
        }
        if note.chord {
            if let Some(Event::Chord(indices)) = events.last_mut() {
                indices.push(i);
                continue;
            }
        }
        events.push(Event::Chord(vec![i]));
    }
    events
}

fn chord_notes(event: &Event) -> &[usize] {
    match event {
        Event::Chord(indices) => indices,
        Event::Rest(_) => &[],
    }
}

/// Level-1 beam groups (event indices), tracked separately per staff and voice.
fn beam_groups(measure: &Measure, events: &[Event]) -> Vec<Vec<usize>> {
    let mut groups = Vec::new();
    let mut current: HashMap<(i32, i32), Vec<usize>> = HashMap::new();

    for (ei, event) in events.iter().enumerate() {
        let Event::Chord(indices) = event else {
            continue;
        };
        let note = &measure.notes[indices[0]];
        let key = (note.staff(), note.voice.unwrap_or(1));
        let Some(beam) = note.beams.iter().find(|b| b.number == 1) else {
            continue;
        };
        match beam.beam_type {
            BeamType::Begin => {
                current.insert(key, vec![ei]);
            }
            BeamType::Continue => current.entry(key).or_default().push(ei),
            BeamType::End => {
                let mut group = current.remove(&key).unwrap_or_default();
                group.push(ei);
                if group.len() >= 2 {
                    groups.push(group);
                }
            }
            BeamType::ForwardHook | BeamType::BackwardHook => {}
        }
    }
    groups
}

/// Explicit stem, or up when the heads sit on or below the middle line on average.
fn infer_stem(explicit: Option<Stem>, ys: &[f64]) -> Stem {
    match explicit {
        Some(Stem::Double) => Stem::Up,
        Some(stem) => stem,
        None => {
            let average = ys.iter().sum::<f64>() / ys.len().max(1) as f64;
            if average >= STAFF_HEIGHT / 2.0 {
                Stem::Up
            } else {
                Stem::Down
            }
        }
    }
}

/// Left edge of the stem relative to the note head center.
fn stem_offset(stem: Stem) -> f64 {
    if stem == Stem::Up {
        NOTE_WIDTH / 2.0 - STEM_NO_FLAG_WIDTH
    } else {
        -NOTE_WIDTH / 2.0
    }
}

/// Accidental shown in front of a note head, if any.
pub(crate) fn accidental_for(note: &Note, key: &Key) -> Option<String> {
    if let Some(ref accidental) = note.accidental {
        return Some(accidental.clone());
    }
    let pitch = note.pitch.as_ref()?;
    let alter = pitch.alter.unwrap_or(0.0).round() as i32;
    if alter == key.alter(pitch.step) {
        return None;
    }
    let name = match alter {
        2 => "double-sharp",
        1 => "sharp",
        0 => "natural",
        -1 => "flat",
        -2 => "flat-flat",
        _ => return None,
    };
    Some(name.to_string())
}
