//! Tie and slur synthesis.
//!
//! Runs over a finished part geometry, pairs start/stop markers in document
//! order and emits one [`TieGeometry`] per matched pair. Matching state lives
//! only for the duration of one [`TieSynthesizer::build`] call.

use std::collections::HashMap;

use kurbo::{Point, Rect, Vec2};

use crate::model::{BeamType, Placement, StartStop, Stem};

use super::kind::GeometryKind;
use super::metrics::{PartMetrics, STAFF_HEIGHT, STEM_NO_FLAG_WIDTH};
use super::tree::{GeometryData, GeometryId, GeometryTree, GeometryVisitor};

/// Gap between a curve endpoint and the note it attaches to.
pub const TIE_SPACING: f64 = 2.0;

const CURVE_HEIGHT_FACTOR: f64 = 0.15;
const CURVE_MIN_HEIGHT: f64 = 5.0;
const CURVE_MAX_HEIGHT: f64 = 25.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveKind {
    Tie,
    Slur,
}

/// A tie or slur curve between two note geometries.
///
/// Endpoints are expressed in the owning part's space. Built once by the
/// synthesizer and never modified afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct TieGeometry {
    kind: CurveKind,
    start: Point,
    stop: Point,
    placement: Option<Placement>,
}

impl TieGeometry {
    pub fn new(kind: CurveKind, start: Point, stop: Point, placement: Option<Placement>) -> Self {
        Self {
            kind,
            start,
            stop,
            placement,
        }
    }

    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    pub fn start_location(&self) -> Point {
        self.start
    }

    pub fn stop_location(&self) -> Point {
        self.stop
    }

    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    /// Bulge of the curve away from the chord line.
    pub fn height(&self) -> f64 {
        let dx = (self.stop.x - self.start.x).abs();
        (dx * CURVE_HEIGHT_FACTOR).clamp(CURVE_MIN_HEIGHT, CURVE_MAX_HEIGHT)
    }

    /// Signed y direction of the bulge: -1 above, +1 below.
    pub fn direction(&self) -> f64 {
        match self.placement {
            Some(Placement::Below) => 1.0,
            _ => -1.0,
        }
    }

    /// Bezier control points of the curve's center line.
    pub fn control_points(&self) -> (Point, Point) {
        let dx = self.stop.x - self.start.x;
        let mid_y = (self.start.y + self.stop.y) / 2.0;
        let bulge = mid_y + self.direction() * self.height();
        (
            Point::new(self.start.x + dx * 0.25, bulge),
            Point::new(self.start.x + dx * 0.75, bulge),
        )
    }

    /// Bounding box of the curve in the part's space.
    pub fn bounds(&self) -> Rect {
        let chord = Rect::from_points(self.start, self.stop);
        // A cubic with both control points at the bulge reaches 3/4 of it.
        let reach = Vec2::new(0.0, self.direction() * self.height() * 0.75);
        chord.union(chord + reach)
    }
}

/// Placement for a curve whose source data does not specify one.
///
/// `start_y` and `stop_y` are the endpoints' offsets from the top line of
/// their staves: notes in the upper half get curves above.
pub fn infer_placement(start_y: f64, stop_y: f64) -> Placement {
    let average = (start_y + stop_y) / 2.0;
    if average < STAFF_HEIGHT / 2.0 {
        Placement::Above
    } else {
        Placement::Below
    }
}

/// Builds the tie and slur geometries of one part.
pub struct TieSynthesizer<'a> {
    tree: &'a GeometryTree,
    part: GeometryId,
    metrics: PartMetrics,
}

impl<'a> TieSynthesizer<'a> {
    pub fn new(tree: &'a GeometryTree, part: GeometryId) -> Self {
        let staves = match tree.node(part).data() {
            GeometryData::Part { staves, .. } => *staves,
            _ => 1,
        };
        Self {
            tree,
            part,
            metrics: PartMetrics::new(staves),
        }
    }

    /// Match every start/stop pair below the part and build their curves,
    /// in the order the stops are reached.
    pub fn build(&self) -> Vec<TieGeometry> {
        let mut state = MatchState {
            synth: self,
            open_ties: HashMap::new(),
            open_slurs: HashMap::new(),
            curves: Vec::new(),
        };
        self.tree.walk(self.part, &mut state);

        if !state.open_ties.is_empty() || !state.open_slurs.is_empty() {
            log::debug!(
                "{} tie(s) and {} slur(s) left open at the end of the part",
                state.open_ties.len(),
                state.open_slurs.len()
            );
        }
        state.curves
    }

    fn build_tie(&self, start: GeometryId, stop: GeometryId, placement: Option<Placement>) -> TieGeometry {
        let placement = placement.unwrap_or_else(|| self.inferred_placement(start, stop));
        let start_frame = self.tree.frame(start);
        let stop_frame = self.tree.frame(stop);

        let (start_y, stop_y) = match placement {
            Placement::Below => (start_frame.max_y(), stop_frame.max_y()),
            Placement::Above => (start_frame.min_y(), stop_frame.min_y()),
        };
        let start_point = Point::new(start_frame.max_x(), start_y);
        let stop_point = Point::new(stop_frame.min_x(), stop_y);

        TieGeometry::new(
            CurveKind::Tie,
            self.to_part(start, start_point),
            self.to_part(stop, stop_point),
            Some(placement),
        )
    }

    fn build_slur(&self, start: GeometryId, stop: GeometryId, placement: Option<Placement>) -> TieGeometry {
        let placement = placement.unwrap_or_else(|| self.inferred_placement(start, stop));

        let mut start_point = self.tree.node(start).location() + Vec2::new(TIE_SPACING, 0.0);
        let mut stop_point = self.tree.node(stop).location() - Vec2::new(TIE_SPACING, 0.0);
        start_point.y = self.notes_edge(start, placement);
        stop_point.y = self.notes_edge(stop, placement);

        // Route around beams that continue past the endpoint
        let note = self.note_data(start);
        if note.is_some_and(|(beam, _)| beam.is_some_and(|b| b != BeamType::End)) {
            if let Some(p) = self.stem_endpoint(start, placement) {
                start_point = p;
            }
        }
        let note = self.note_data(stop);
        if note.is_some_and(|(beam, _)| beam.is_some_and(|b| b != BeamType::Begin)) {
            if let Some(p) = self.stem_endpoint(stop, placement) {
                stop_point = p;
            }
        }

        TieGeometry::new(
            CurveKind::Slur,
            self.to_part(start, start_point),
            self.to_part(stop, stop_point),
            Some(placement),
        )
    }

    /// First beam type and resolved stem of a note geometry.
    fn note_data(&self, note: GeometryId) -> Option<(Option<BeamType>, Stem)> {
        self.tree
            .node(note)
            .note()
            .map(|data| (data.note.first_beam(), data.stem))
    }

    /// y of the chord's note block edge on the placement side, in the chord's space.
    fn notes_edge(&self, note: GeometryId, placement: Placement) -> f64 {
        let frame = self
            .tree
            .parent(note)
            .filter(|&p| self.tree.kind(p) == GeometryKind::Chord)
            .and_then(|chord| self.tree.notes_frame(chord))
            .unwrap_or_else(|| self.tree.frame(note));
        match placement {
            Placement::Below => frame.max_y() + TIE_SPACING,
            Placement::Above => frame.min_y() - TIE_SPACING,
        }
    }

    /// Endpoint at the tip of the stem when the stem points toward the curve.
    fn stem_endpoint(&self, note: GeometryId, placement: Placement) -> Option<Point> {
        let (_, stem) = self.note_data(note)?;
        let chord = self.tree.parent(note)?;
        let stem_frame = self.tree.frame(self.tree.stem_of(chord)?);
        match (placement, stem) {
            (Placement::Below, Stem::Down) => Some(Point::new(
                stem_frame.min_x() + STEM_NO_FLAG_WIDTH,
                stem_frame.max_y() + 2.0 * TIE_SPACING,
            )),
            (Placement::Above, Stem::Up) => Some(Point::new(
                stem_frame.max_x() - STEM_NO_FLAG_WIDTH,
                stem_frame.min_y() - 2.0 * TIE_SPACING,
            )),
            _ => None,
        }
    }

    fn inferred_placement(&self, start: GeometryId, stop: GeometryId) -> Placement {
        infer_placement(self.staff_y(start), self.staff_y(stop))
    }

    /// Offset of a note's location from the top line of its staff.
    fn staff_y(&self, note: GeometryId) -> f64 {
        let staff = self.tree.node(note).note().map_or(1, |data| data.note.staff());
        let location = self.to_part(note, self.tree.node(note).location());
        location.y - self.metrics.staff_origin(staff)
    }

    /// Convert a point in the space `note` lives in (its parent's) to the part's space.
    fn to_part(&self, note: GeometryId, point: Point) -> Point {
        match self.tree.parent(note) {
            Some(parent) => self.tree.convert_from_geometry(self.part, point, parent),
            None => point,
        }
    }
}

/// Transient open-marker maps for one synthesis pass.
struct MatchState<'s, 'a> {
    synth: &'s TieSynthesizer<'a>,
    /// (staff, pitch value) → open tie start
    open_ties: HashMap<(i32, i32), (GeometryId, Option<Placement>)>,
    /// (staff, slur number) → open slur start
    open_slurs: HashMap<(i32, i32), (GeometryId, Option<Placement>)>,
    curves: Vec<TieGeometry>,
}

impl GeometryVisitor for MatchState<'_, '_> {
    fn visit_note(&mut self, tree: &GeometryTree, id: GeometryId) {
        let Some(data) = tree.node(id).note() else {
            return;
        };
        let note = &data.note;
        let staff = note.staff();

        // Stops before starts, so a note that ends one tie and starts the
        // next never connects to itself.
        if let Some(pitch) = note.pitch.as_ref().map(|p| p.value()) {
            let key = (staff, pitch);
            for tie in ordered(&note.notations.ties, |t| t.tie_type) {
                match tie.tie_type {
                    StartStop::Start => {
                        self.open_ties.insert(key, (id, tie.placement));
                    }
                    StartStop::Stop => match self.open_ties.remove(&key) {
                        Some((start, start_placement)) => {
                            let placement = start_placement.or(tie.placement);
                            self.curves.push(self.synth.build_tie(start, id, placement));
                        }
                        None => log::warn!(
                            "dropping tie stop without a matching start (staff {staff}, pitch {pitch})"
                        ),
                    },
                    StartStop::Continue => {}
                }
            }
        }

        for slur in ordered(&note.notations.slurs, |s| s.slur_type) {
            let key = (staff, slur.number);
            match slur.slur_type {
                StartStop::Start => {
                    self.open_slurs.insert(key, (id, slur.placement));
                }
                StartStop::Stop => match self.open_slurs.remove(&key) {
                    Some((start, start_placement)) => {
                        let placement = start_placement.or(slur.placement);
                        self.curves.push(self.synth.build_slur(start, id, placement));
                    }
                    None => log::warn!(
                        "dropping slur stop without a matching start (staff {staff}, number {})",
                        slur.number
                    ),
                },
                StartStop::Continue => {}
            }
        }
    }
}

/// Markers with stops first, otherwise in document order.
fn ordered<T>(markers: &[T], marker_type: impl Fn(&T) -> StartStop) -> Vec<&T> {
    let mut sorted: Vec<&T> = markers.iter().collect();
    sorted.sort_by_key(|m| u8::from(marker_type(m) != StartStop::Stop));
    sorted
}
