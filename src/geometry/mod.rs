//! Positioned layout of a score.
//!
//! The [`TreeBuilder`] turns a parsed [`Score`](crate::model::Score) into a
//! [`GeometryTree`]; the [`TieSynthesizer`] then connects tied and slurred
//! notes with curve geometries.

pub mod builder;
pub mod kind;
pub mod metrics;
pub mod spans;
pub mod tie;
pub mod tree;

pub use builder::TreeBuilder;
pub use kind::{GeometryKind, Role};
pub use metrics::PartMetrics;
pub use spans::{MeasureSpan, SpanPlan};
pub use tie::{infer_placement, CurveKind, TieGeometry, TieSynthesizer, TIE_SPACING};
pub use tree::{ChordData, GeometryData, GeometryId, GeometryNode, GeometryTree, GeometryVisitor, NoteData};
