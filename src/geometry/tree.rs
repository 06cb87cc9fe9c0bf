//! Arena-backed geometry tree.
//!
//! Nodes live in a single `Vec` and are addressed by [`GeometryId`]. Each
//! node stores the id of its parent; the parent index is only used to walk
//! up the frame chain, ownership stays with the arena. Nodes are never
//! removed or reparented once added.
//!
//! A node's local coordinate space has its origin at the node's `location`
//! (expressed in the parent's space). Its `frame` is the box of `size` whose
//! origin sits at `location - anchor`, so the anchor is the offset of the
//! location point inside the frame.

use kurbo::{Point, Rect, Size, Vec2};

use crate::model::{
    ArticulationType, Clef, Key, Note, OctaveShiftType, OrnamentType, PedalType, Stem,
    TimeSignature, WedgeType,
};

use super::kind::{GeometryKind, Role};
use super::tie::TieGeometry;

/// Stable handle to a node of a [`GeometryTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(u32);

impl GeometryId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind-specific payload of a geometry.
#[derive(Clone, Debug)]
pub enum GeometryData {
    Empty,
    Part { index: usize, staves: i32 },
    Measure { index: usize, number: i32 },
    Chord(ChordData),
    Note(NoteData),
    Rest(Note),
    Stem { direction: Stem, flags: usize },
    /// Beam endpoints (at the stem tips) in the owning measure's space.
    Beam { start: Point, stop: Point, levels: usize },
    Accidental(String),
    Dot,
    Tie(TieGeometry),
    Clef(Clef),
    Key(Key),
    TimeSignature(TimeSignature),
    Articulation(ArticulationType),
    Fermata { inverted: bool },
    Ornament(OrnamentType),
    Text(String),
    Wedge { wedge_type: WedgeType, spread: f64 },
    Pedal(PedalType),
    OctaveShift { shift_type: OctaveShiftType, size: i32 },
    Ending(String),
    Barline(Option<String>),
}

#[derive(Clone, Debug, Default)]
pub struct ChordData {
    pub staff: i32,
    pub stem: Option<GeometryId>,
    pub stem_direction: Option<Stem>,
}

#[derive(Clone, Debug)]
pub struct NoteData {
    pub note: Note,
    /// Stem direction after inference (`Stem::None` for stemless notes).
    pub stem: Stem,
}

/// One node of the tree.
#[derive(Clone, Debug)]
pub struct GeometryNode {
    kind: GeometryKind,
    parent: Option<GeometryId>,
    children: Vec<GeometryId>,
    location: Point,
    anchor: Vec2,
    size: Size,
    data: GeometryData,
}

impl GeometryNode {
    pub fn new(kind: GeometryKind, data: GeometryData) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            location: Point::ORIGIN,
            anchor: Vec2::ZERO,
            size: Size::ZERO,
            data,
        }
    }

    pub fn at(mut self, location: Point) -> Self {
        self.location = location;
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn with_anchor(mut self, anchor: Vec2) -> Self {
        self.anchor = anchor;
        self
    }

    /// Place the node so that its frame is `frame` (anchor at the frame origin).
    pub fn with_frame(mut self, frame: Rect) -> Self {
        self.anchor = Vec2::ZERO;
        self.location = frame.origin();
        self.size = frame.size();
        self
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn parent(&self) -> Option<GeometryId> {
        self.parent
    }

    pub fn children(&self) -> &[GeometryId] {
        &self.children
    }

    pub fn location(&self) -> Point {
        self.location
    }

    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn data(&self) -> &GeometryData {
        &self.data
    }

    /// Bounding box in the parent's coordinate space.
    pub fn frame(&self) -> Rect {
        Rect::from_origin_size(self.location - self.anchor, self.size)
    }

    pub fn note(&self) -> Option<&NoteData> {
        match &self.data {
            GeometryData::Note(data) => Some(data),
            _ => None,
        }
    }

    pub fn chord(&self) -> Option<&ChordData> {
        match &self.data {
            GeometryData::Chord(data) => Some(data),
            _ => None,
        }
    }

    pub fn tie(&self) -> Option<&TieGeometry> {
        match &self.data {
            GeometryData::Tie(tie) => Some(tie),
            _ => None,
        }
    }
}

/// Callbacks for [`GeometryTree::walk`].
pub trait GeometryVisitor {
    fn visit_note(&mut self, tree: &GeometryTree, note: GeometryId);

    fn visit_leaf(&mut self, _tree: &GeometryTree, _leaf: GeometryId) {}
}

/// The laid-out score.
#[derive(Clone, Debug)]
pub struct GeometryTree {
    nodes: Vec<GeometryNode>,
}

impl GeometryTree {
    /// Create a tree holding only its root.
    pub fn new(root: GeometryNode) -> Self {
        Self { nodes: vec![root] }
    }

    pub fn root(&self) -> GeometryId {
        GeometryId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append `node` as the last child of `parent`.
    pub fn add(&mut self, parent: GeometryId, mut node: GeometryNode) -> GeometryId {
        let id = GeometryId(self.nodes.len() as u32);
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn node(&self, id: GeometryId) -> &GeometryNode {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: GeometryId) -> GeometryKind {
        self.node(id).kind
    }

    pub fn parent(&self, id: GeometryId) -> Option<GeometryId> {
        self.node(id).parent
    }

    pub fn children(&self, id: GeometryId) -> &[GeometryId] {
        &self.node(id).children
    }

    pub fn frame(&self, id: GeometryId) -> Rect {
        self.node(id).frame()
    }

    pub fn ids(&self) -> impl Iterator<Item = GeometryId> {
        (0..self.nodes.len() as u32).map(GeometryId)
    }

    pub(crate) fn data_mut(&mut self, id: GeometryId) -> &mut GeometryData {
        &mut self.nodes[id.index()].data
    }

    pub fn set_location(&mut self, id: GeometryId, location: Point) {
        self.nodes[id.index()].location = location;
    }

    /// Move and resize `id` so that its frame (in the parent's space) becomes `frame`.
    pub fn set_frame(&mut self, id: GeometryId, frame: Rect) {
        let node = &mut self.nodes[id.index()];
        node.location = frame.origin() + node.anchor;
        node.size = frame.size();
    }

    /// Union of the children's frames in `id`'s local space.
    pub fn children_frame(&self, id: GeometryId) -> Option<Rect> {
        self.union_of(self.children(id).iter().copied())
    }

    /// Union of the frames of the chord's note heads, in the chord's space.
    /// Recomputed on every call so it follows any repositioning.
    pub fn notes_frame(&self, chord: GeometryId) -> Option<Rect> {
        self.union_of(
            self.children(chord)
                .iter()
                .copied()
                .filter(|&c| self.kind(c) == GeometryKind::Note),
        )
    }

    /// Stem geometry of a chord, if it has one.
    pub fn stem_of(&self, chord: GeometryId) -> Option<GeometryId> {
        self.node(chord).chord().and_then(|c| c.stem)
    }

    /// Resize `id` to cover its children, keeping its location.
    pub fn fit_to_children(&mut self, id: GeometryId) {
        let bounds = self.children_frame(id).unwrap_or(Rect::ZERO);
        let node = &mut self.nodes[id.index()];
        node.size = bounds.size();
        node.anchor = -bounds.origin().to_vec2();
    }

    /// Resize `id` to cover every geometry below it, not only its direct
    /// children. Locations are kept.
    pub fn fit_to_descendants(&mut self, id: GeometryId) {
        let bounds = self
            .descendants(id)
            .into_iter()
            .filter_map(|d| {
                let parent = self.parent(d)?;
                Some(self.convert_rect_from_geometry(id, self.frame(d), parent))
            })
            .reduce(|acc, f| acc.union(f))
            .unwrap_or(Rect::ZERO);
        let node = &mut self.nodes[id.index()];
        node.size = bounds.size();
        node.anchor = -bounds.origin().to_vec2();
    }

    fn union_of(&self, ids: impl Iterator<Item = GeometryId>) -> Option<Rect> {
        ids.map(|c| self.frame(c)).reduce(|acc, f| acc.union(f))
    }

    // ── Coordinate conversion ─────────────────────────────────────────

    /// Offset of `id`'s local space from the root's local space.
    pub fn root_offset(&self, id: GeometryId) -> Vec2 {
        let mut offset = Vec2::ZERO;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            offset += self.node(current).location.to_vec2();
            current = parent;
        }
        offset
    }

    /// Convert a point from `id`'s local space to the root space.
    pub fn convert_to_root(&self, id: GeometryId, point: Point) -> Point {
        point + self.root_offset(id)
    }

    /// Convert a point from the root space to `id`'s local space.
    pub fn convert_from_root(&self, id: GeometryId, point: Point) -> Point {
        point - self.root_offset(id)
    }

    pub fn convert_rect_to_root(&self, id: GeometryId, rect: Rect) -> Rect {
        rect + self.root_offset(id)
    }

    pub fn convert_rect_from_root(&self, id: GeometryId, rect: Rect) -> Rect {
        rect - self.root_offset(id)
    }

    /// Convert a point expressed in `from`'s local space into `into`'s local space.
    pub fn convert_from_geometry(&self, into: GeometryId, point: Point, from: GeometryId) -> Point {
        point + (self.root_offset(from) - self.root_offset(into))
    }

    /// Convert a rect expressed in `from`'s local space into `into`'s local space.
    pub fn convert_rect_from_geometry(&self, into: GeometryId, rect: Rect, from: GeometryId) -> Rect {
        rect + (self.root_offset(from) - self.root_offset(into))
    }

    /// Frame of `id` in the root space.
    pub fn root_frame(&self, id: GeometryId) -> Rect {
        match self.parent(id) {
            Some(parent) => self.convert_rect_to_root(parent, self.frame(id)),
            None => self.frame(id),
        }
    }

    // ── Traversal ─────────────────────────────────────────────────────

    /// Whether `ancestor` is a proper ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: GeometryId, id: GeometryId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Nearest ancestor (or `id` itself) of the given kind.
    pub fn ancestor_of_kind(&self, id: GeometryId, kind: GeometryKind) -> Option<GeometryId> {
        let mut current = Some(id);
        while let Some(c) = current {
            if self.kind(c) == kind {
                return Some(c);
            }
            current = self.parent(c);
        }
        None
    }

    /// All proper descendants of `id` in document (pre-)order.
    pub fn descendants(&self, id: GeometryId) -> Vec<GeometryId> {
        let mut out = Vec::new();
        let mut stack: Vec<GeometryId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Depth-first walk below `id` in document order, descending into
    /// containers and handing note heads and other leaves to `visitor`.
    pub fn walk<V: GeometryVisitor + ?Sized>(&self, id: GeometryId, visitor: &mut V) {
        for &child in self.children(id) {
            match self.kind(child).role() {
                Role::Container => self.walk(child, visitor),
                Role::Note => visitor.visit_note(self, child),
                Role::Leaf => visitor.visit_leaf(self, child),
            }
        }
    }
}
