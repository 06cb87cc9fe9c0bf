//! Geometry kinds and the static tables keyed by them.
//!
//! Every geometry carries a [`GeometryKind`] tag. Traversal role, collision
//! priority and immovability are looked up from that tag, never from the
//! geometry's payload.

/// The concrete kind of a geometry node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Score,
    Part,
    Measure,
    Chord,
    Note,
    Rest,
    Stem,
    Beam,
    Accidental,
    Dot,
    Tie,
    Clef,
    Key,
    TimeSignature,
    Articulation,
    Fermata,
    Ornament,
    Lyric,
    SpanDirection,
    Pedal,
    OctaveShift,
    Ending,
    Coda,
    Segno,
    Words,
    Barline,
}

/// How a traversal treats a geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Holds other geometries (score, part, measure, chord).
    Container,
    /// A note head: the leaf that ties and slurs attach to.
    Note,
    /// Any other leaf.
    Leaf,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 26] = [
        GeometryKind::Score,
        GeometryKind::Part,
        GeometryKind::Measure,
        GeometryKind::Chord,
        GeometryKind::Note,
        GeometryKind::Rest,
        GeometryKind::Stem,
        GeometryKind::Beam,
        GeometryKind::Accidental,
        GeometryKind::Dot,
        GeometryKind::Tie,
        GeometryKind::Clef,
        GeometryKind::Key,
        GeometryKind::TimeSignature,
        GeometryKind::Articulation,
        GeometryKind::Fermata,
        GeometryKind::Ornament,
        GeometryKind::Lyric,
        GeometryKind::SpanDirection,
        GeometryKind::Pedal,
        GeometryKind::OctaveShift,
        GeometryKind::Ending,
        GeometryKind::Coda,
        GeometryKind::Segno,
        GeometryKind::Words,
        GeometryKind::Barline,
    ];

    pub const fn role(self) -> Role {
        match self {
            GeometryKind::Score | GeometryKind::Part | GeometryKind::Measure | GeometryKind::Chord => {
                Role::Container
            }
            GeometryKind::Note => Role::Note,
            _ => Role::Leaf,
        }
    }

    /// Vertical collision priority. Lower numbers are less likely to be
    /// moved. `None` for kinds that take no part in collision resolution.
    pub const fn collision_priority(self) -> Option<u8> {
        Some(match self {
            GeometryKind::Clef | GeometryKind::Key | GeometryKind::TimeSignature => 0,
            GeometryKind::Note
            | GeometryKind::Dot
            | GeometryKind::Accidental
            | GeometryKind::Stem
            | GeometryKind::Beam
            | GeometryKind::Tie
            | GeometryKind::Ending => 1,
            GeometryKind::Lyric => 2,
            GeometryKind::Articulation | GeometryKind::Fermata => 3,
            GeometryKind::Rest => 4,
            GeometryKind::SpanDirection => 5,
            GeometryKind::Ornament => 6,
            GeometryKind::OctaveShift | GeometryKind::Pedal => 7,
            GeometryKind::Segno | GeometryKind::Coda => 8,
            GeometryKind::Words => 9,
            GeometryKind::Score
            | GeometryKind::Part
            | GeometryKind::Measure
            | GeometryKind::Chord
            | GeometryKind::Barline => return None,
        })
    }

    /// Kinds the vertical resolver never repositions: moving them would
    /// change what the score means.
    pub const fn is_immovable(self) -> bool {
        matches!(
            self,
            GeometryKind::Clef
                | GeometryKind::Key
                | GeometryKind::TimeSignature
                | GeometryKind::Note
                | GeometryKind::Dot
                | GeometryKind::Accidental
                | GeometryKind::Stem
                | GeometryKind::Beam
                | GeometryKind::Tie
                | GeometryKind::Ending
                | GeometryKind::Lyric
        )
    }

    /// Whether geometries of this kind are candidates for collision detection.
    pub const fn collides(self) -> bool {
        self.collision_priority().is_some()
    }
}
