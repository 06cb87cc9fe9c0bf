//! Vertical collision resolution.
//!
//! For each colliding pair one side stays fixed and the other is pushed
//! vertically next to it. Which side moves is decided by the kind tables in
//! [`GeometryKind`]: immovable kinds never move, otherwise the lower
//! priority number stays and equal priorities keep the narrower symbol.

use std::collections::HashMap;

use kurbo::{Rect, Size};
use serde::Serialize;

use crate::geometry::{GeometryData, GeometryId, GeometryKind, GeometryTree, PartMetrics};
use crate::model::Stem;

use super::{CollisionIndex, CollisionPair};

/// Maximum number of times a single geometry is repositioned in one pass.
pub const MAX_RETRIES: usize = 10;

/// Gap left between a moved geometry and the one it was moved away from.
const MARGIN: f64 = 1.0;

/// Outcome of one resolution pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResolveReport {
    pub pairs_examined: usize,
    pub moves: usize,
    /// Geometries that used up their retry budget.
    #[serde(skip)]
    pub exhausted: Vec<GeometryId>,
}

/// Resolves the vertical collisions of one part in place.
pub struct VerticalResolver<'a> {
    tree: &'a mut GeometryTree,
    part: GeometryId,
    metrics: PartMetrics,
    retries: HashMap<GeometryId, usize>,
}

impl<'a> VerticalResolver<'a> {
    pub fn new(tree: &'a mut GeometryTree, part: GeometryId) -> Self {
        let staves = match tree.node(part).data() {
            GeometryData::Part { staves, .. } => *staves,
            _ => 1,
        };
        Self {
            tree,
            part,
            metrics: PartMetrics::new(staves),
            retries: HashMap::new(),
        }
    }

    /// How often `id` has been repositioned so far.
    pub fn retries(&self, id: GeometryId) -> usize {
        self.retries.get(&id).copied().unwrap_or(0)
    }

    /// Work through every collision of the part until the queue drains.
    pub fn resolve(&mut self) -> ResolveReport {
        let mut index = CollisionIndex::new(self.tree, self.part);
        let mut report = ResolveReport::default();
        log::debug!(
            "resolving {} collision(s) among {} candidates",
            index.len(),
            index.candidates().len()
        );

        while let Some(pair) = index.pop() {
            report.pairs_examined += 1;
            let Some(moved) = self.resolve_pair(&pair) else {
                continue;
            };
            report.moves += 1;

            // The old relationships of the mover are stale now.
            index.invalidate(moved);
            if self.retries(moved) < MAX_RETRIES {
                index.recheck(self.tree, moved);
            } else if !report.exhausted.contains(&moved) {
                log::debug!("geometry {} reached the retry limit", moved.index());
                report.exhausted.push(moved);
            }
        }

        report
    }

    /// Resolve a single pair. Returns the geometry that was moved, if any.
    pub fn resolve_pair(&mut self, pair: &CollisionPair) -> Option<GeometryId> {
        let (fixed, mover) = self.order(pair.first, pair.second)?;
        if self.retries(mover) >= MAX_RETRIES {
            return None;
        }

        let fixed_frame = self.tree.root_frame(fixed);
        let mover_frame = self.tree.root_frame(mover);

        let y = if self.tree.kind(fixed) == GeometryKind::Note && self.tree.kind(mover) == GeometryKind::Rest {
            self.rest_position(fixed, fixed_frame, mover_frame)
                .or_else(|| self.general_position(fixed_frame, mover_frame))?
        } else {
            self.general_position(fixed_frame, mover_frame)?
        };

        let target = Rect::from_origin_size((mover_frame.x0, y), Size::new(mover_frame.width(), mover_frame.height()));
        let parent = self.tree.parent(mover)?;
        let local = self.tree.convert_rect_from_root(parent, target);
        self.tree.set_frame(mover, local);
        *self.retries.entry(mover).or_insert(0) += 1;
        Some(mover)
    }

    /// `(fixed, mover)` for a pair, or `None` when neither may move.
    fn order(&self, a: GeometryId, b: GeometryId) -> Option<(GeometryId, GeometryId)> {
        let (ka, kb) = (self.tree.kind(a), self.tree.kind(b));
        match (ka.is_immovable(), kb.is_immovable()) {
            (true, true) => None,
            (true, false) => Some((a, b)),
            (false, true) => Some((b, a)),
            (false, false) => {
                let pa = ka.collision_priority().unwrap_or(u8::MAX);
                let pb = kb.collision_priority().unwrap_or(u8::MAX);
                if pa != pb {
                    return Some(if pa < pb { (a, b) } else { (b, a) });
                }
                let wa = self.tree.frame(a).width();
                let wb = self.tree.frame(b).width();
                Some(if wb < wa { (b, a) } else { (a, b) })
            }
        }
    }

    /// A rest colliding with a note goes to the side of the note away
    /// from the stem, regardless of the staff bounds. Notes without a
    /// single stem direction give no answer here.
    fn rest_position(&self, note: GeometryId, note_frame: Rect, rest_frame: Rect) -> Option<f64> {
        let stem = self.tree.node(note).note().map_or(Stem::None, |data| data.stem);
        match stem {
            Stem::Up => Some(note_frame.max_y() + MARGIN),
            Stem::Down => Some(note_frame.min_y() - rest_frame.height() - MARGIN),
            Stem::None | Stem::Double => None,
        }
    }

    /// Symbols outside the staff block are pushed further out, next to the
    /// fixed symbol; symbols inside it are left alone.
    fn general_position(&self, fixed: Rect, mover: Rect) -> Option<f64> {
        let offset = self.tree.root_offset(self.part).y;
        let top = offset + self.metrics.top_boundary();
        let bottom = offset + self.metrics.bottom_boundary();

        if mover.min_y() <= top {
            Some(fixed.min_y() - mover.height() - MARGIN)
        } else if mover.max_y() >= bottom {
            Some(fixed.max_y() + MARGIN)
        } else {
            None
        }
    }
}
