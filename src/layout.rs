//! The layout pipeline: build the tree, add ties and slurs, resolve collisions.

use crate::collision::{ResolveReport, VerticalResolver};
use crate::geometry::{
    GeometryData, GeometryId, GeometryKind, GeometryNode, GeometryTree, SpanPlan, TieGeometry, TieSynthesizer,
    TreeBuilder,
};
use crate::model::Score;
use crate::options::LayoutOptions;

/// Layout results for one part.
#[derive(Clone, Debug)]
pub struct PartLayout {
    pub part: GeometryId,
    /// Attached tie and slur geometries, in the order their stops were reached.
    pub ties: Vec<GeometryId>,
    pub report: ResolveReport,
}

/// A fully laid-out score.
#[derive(Clone, Debug)]
pub struct ScoreLayout {
    pub tree: GeometryTree,
    pub spans: SpanPlan,
    pub parts: Vec<PartLayout>,
}

impl ScoreLayout {
    /// Tie and slur curves of the part at `index`.
    pub fn ties(&self, index: usize) -> Vec<&TieGeometry> {
        self.parts
            .get(index)
            .map(|p| p.ties.iter().filter_map(|&id| self.tree.node(id).tie()).collect())
            .unwrap_or_default()
    }
}

/// Lay out `score`. Never fails: notation that cannot be matched or
/// collisions that do not settle only degrade the result.
pub fn layout_score(score: &Score, options: &LayoutOptions) -> ScoreLayout {
    let builder = TreeBuilder::new(score, options.natural_spacing);
    let mut tree = builder.build();
    let part_ids: Vec<GeometryId> = tree
        .children(tree.root())
        .iter()
        .copied()
        .filter(|&id| tree.kind(id) == GeometryKind::Part)
        .collect();

    let mut parts = Vec::with_capacity(part_ids.len());
    for part in part_ids {
        let ties = synthesize_ties(&mut tree, part);
        let report = if options.resolve_collisions {
            VerticalResolver::new(&mut tree, part).resolve()
        } else {
            ResolveReport::default()
        };
        log::debug!(
            "part {}: {} curve(s), {} pair(s) examined, {} move(s)",
            part.index(),
            ties.len(),
            report.pairs_examined,
            report.moves
        );
        parts.push(PartLayout { part, ties, report });
    }
    // Curves and moved symbols may reach past the part frames.
    let root = tree.root();
    tree.fit_to_descendants(root);

    ScoreLayout {
        tree,
        spans: builder.spans().clone(),
        parts,
    }
}

/// Build the ties and slurs of `part` and attach them to it as `Tie`
/// geometries framed by their curve bounds.
pub fn synthesize_ties(tree: &mut GeometryTree, part: GeometryId) -> Vec<GeometryId> {
    let curves = TieSynthesizer::new(tree, part).build();
    curves
        .into_iter()
        .map(|curve| {
            let frame = curve.bounds();
            tree.add(
                part,
                GeometryNode::new(GeometryKind::Tie, GeometryData::Tie(curve)).with_frame(frame),
            )
        })
        .collect()
}
