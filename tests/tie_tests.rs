mod common;

use kurbo::Point;
use pretty_assertions::assert_eq;
use scorelayout::geometry::{
    infer_placement, CurveKind, GeometryId, GeometryKind, GeometryTree, TieGeometry, TieSynthesizer, TreeBuilder,
};
use scorelayout::{layout_score, parse_musicxml, LayoutOptions, Placement};

use common::*;

fn tree_for(measures: &str) -> (GeometryTree, GeometryId) {
    let score = parse_musicxml(&single_part(measures)).expect("fixture parses");
    let tree = TreeBuilder::new(&score, true).build();
    let part = parts(&tree)[0];
    (tree, part)
}

fn curves(measures: &str) -> (GeometryTree, GeometryId, Vec<TieGeometry>) {
    let (tree, part) = tree_for(measures);
    let curves = TieSynthesizer::new(&tree, part).build();
    (tree, part, curves)
}

/// Location of a note head in the part's space.
fn head_in_part(tree: &GeometryTree, part: GeometryId, note: GeometryId) -> Point {
    let chord = tree.parent(note).expect("note has a chord");
    tree.convert_from_geometry(part, tree.node(note).location(), chord)
}

fn one_measure(notes: &[String]) -> String {
    measure(1, &format!("{TREBLE_ATTRS}{}", notes.concat()))
}

#[test]
fn tie_connects_facing_edges_of_note_heads() {
    let (tree, part, curves) = curves(&one_measure(&[note("C", 4, &tied("start")), note("C", 4, &tied("stop"))]));
    let notes = of_kind(&tree, part, GeometryKind::Note);

    assert_eq!(curves.len(), 1);
    let tie = &curves[0];
    let start = frame_in(&tree, part, notes[0]);
    let stop = frame_in(&tree, part, notes[1]);

    assert_eq!(tie.kind(), CurveKind::Tie);
    // Middle C sits low on the staff, so the tie goes below.
    assert_eq!(tie.placement(), Some(Placement::Below));
    assert_eq!(tie.start_location(), Point::new(start.max_x(), start.max_y()));
    assert_eq!(tie.stop_location(), Point::new(stop.min_x(), stop.max_y()));
}

#[test]
fn explicit_tie_placement_wins() {
    let start = note("C", 4, r#"<notations><tied type="start" placement="above"/></notations>"#);
    let (tree, part, curves) = curves(&one_measure(&[start, note("C", 4, &tied("stop"))]));
    let notes = of_kind(&tree, part, GeometryKind::Note);

    assert_eq!(curves[0].placement(), Some(Placement::Above));
    assert_eq!(curves[0].start_location().y, frame_in(&tree, part, notes[0]).min_y());
}

#[test]
fn tie_crosses_barlines() {
    let first = measure(1, &format!("{TREBLE_ATTRS}{}", note_typed("G", 4, 4, "whole", &tied("start"))));
    let second = measure(2, &note_typed("G", 4, 4, "whole", &tied("stop")));
    let (_, _, curves) = curves(&format!("{first}{second}"));

    assert_eq!(curves.len(), 1);
    assert!(curves[0].stop_location().x > curves[0].start_location().x);
}

#[test]
fn last_tie_start_wins() {
    let (tree, part, curves) = curves(&one_measure(&[
        note("E", 4, &tied("start")),
        note("E", 4, &tied("start")),
        note("E", 4, &tied("stop")),
    ]));
    let notes = of_kind(&tree, part, GeometryKind::Note);

    assert_eq!(curves.len(), 1);
    assert_eq!(curves[0].start_location().x, frame_in(&tree, part, notes[1]).max_x());
}

#[test]
fn note_may_end_one_tie_and_start_the_next() {
    let both = r#"<tie type="stop"/><tie type="start"/>"#;
    let (_, _, curves) = curves(&one_measure(&[
        note("A", 4, &tied("start")),
        note("A", 4, both),
        note("A", 4, &tied("stop")),
    ]));

    assert_eq!(curves.len(), 2);
    assert!(curves[0].stop_location().x < curves[1].start_location().x);
}

#[test]
fn unmatched_markers_produce_nothing() {
    // stop without start, start without stop, and a stop on a different pitch
    let (_, _, curves) = curves(&one_measure(&[
        note("C", 5, &tied("stop")),
        note("D", 5, &tied("start")),
        note("E", 5, &tied("stop")),
    ]));
    assert!(curves.is_empty());
}

#[test]
fn ties_do_not_match_across_staves() {
    let attrs = "<attributes><divisions>1</divisions><staves>2</staves>\
<clef number=\"1\"><sign>G</sign><line>2</line></clef>\
<clef number=\"2\"><sign>G</sign><line>2</line></clef></attributes>";
    let upper = "<note><pitch><step>C</step><octave>5</octave></pitch><duration>1</duration>\
<voice>1</voice><type>quarter</type><staff>1</staff><notations><tied type=\"start\"/></notations></note>";
    let lower = "<note><pitch><step>C</step><octave>5</octave></pitch><duration>1</duration>\
<voice>2</voice><type>quarter</type><staff>2</staff><notations><tied type=\"stop\"/></notations></note>";
    let (_, _, curves) = curves(&measure(1, &format!("{attrs}{upper}{lower}")));

    assert!(curves.is_empty());
}

#[test]
fn slur_endpoints_sit_beside_the_note_block() {
    let (tree, part, curves) = curves(&one_measure(&[note("E", 5, &slur("start", 1)), note("F", 5, &slur("stop", 1))]));
    let notes = of_kind(&tree, part, GeometryKind::Note);
    let chords: Vec<GeometryId> = notes.iter().map(|&n| tree.parent(n).expect("chord")).collect();

    assert_eq!(curves.len(), 1);
    let slur = &curves[0];
    assert_eq!(slur.kind(), CurveKind::Slur);
    // High notes: the slur goes above.
    assert_eq!(slur.placement(), Some(Placement::Above));

    let start_top = tree.notes_frame(chords[0]).expect("notes").min_y();
    let stop_top = tree.notes_frame(chords[1]).expect("notes").min_y();
    let expected_start = tree.convert_from_geometry(part, Point::new(2.0, start_top - 2.0), chords[0]);
    let expected_stop = tree.convert_from_geometry(part, Point::new(-2.0, stop_top - 2.0), chords[1]);
    assert_eq!(slur.start_location(), expected_start);
    assert_eq!(slur.stop_location(), expected_stop);
    assert_eq!(slur.start_location().x, head_in_part(&tree, part, notes[0]).x + 2.0);
}

#[test]
fn slurs_with_different_numbers_are_independent() {
    let (tree, part, curves) = curves(&one_measure(&[
        note("G", 4, &slur("start", 1)),
        note("A", 4, &slur("start", 2)),
        note("B", 4, &slur("stop", 1)),
        note("C", 5, &slur("stop", 2)),
    ]));
    let heads: Vec<Point> = of_kind(&tree, part, GeometryKind::Note)
        .into_iter()
        .map(|n| head_in_part(&tree, part, n))
        .collect();

    assert_eq!(curves.len(), 2);
    assert_eq!(curves[0].start_location().x, heads[0].x + 2.0);
    assert_eq!(curves[0].stop_location().x, heads[2].x - 2.0);
    assert_eq!(curves[1].start_location().x, heads[1].x + 2.0);
    assert_eq!(curves[1].stop_location().x, heads[3].x - 2.0);
}

#[test]
fn slur_on_beamed_notes_starts_at_the_stem_tip() {
    let attrs = TREBLE_ATTRS.replace("<divisions>1</divisions>", "<divisions>2</divisions>");
    let start = note_typed(
        "C",
        4,
        1,
        "eighth",
        r#"<beam number="1">begin</beam><notations><slur type="start" placement="above"/></notations>"#,
    );
    let stop = note_typed(
        "D",
        4,
        1,
        "eighth",
        r#"<beam number="1">end</beam><notations><slur type="stop"/></notations>"#,
    );
    let (tree, part, curves) = curves(&measure(1, &format!("{attrs}{start}{stop}")));
    let chords = of_kind(&tree, part, GeometryKind::Chord);
    let stem = tree.stem_of(chords[0]).expect("beamed note has a stem");
    let stem_frame = tree.frame(stem);

    assert_eq!(curves.len(), 1);
    let expected = tree.convert_from_geometry(
        part,
        Point::new(stem_frame.max_x() - 1.0, stem_frame.min_y() - 4.0),
        chords[0],
    );
    assert_eq!(curves[0].start_location(), expected);
}

#[test]
fn slur_below_down_stems_ends_under_the_stem_tip() {
    let attrs = TREBLE_ATTRS.replace("<divisions>1</divisions>", "<divisions>2</divisions>");
    let start = note_typed(
        "E",
        5,
        1,
        "eighth",
        r#"<stem>down</stem><beam number="1">begin</beam><notations><slur type="start" placement="below"/></notations>"#,
    );
    let stop = note_typed(
        "F",
        5,
        1,
        "eighth",
        r#"<stem>down</stem><beam number="1">end</beam><notations><slur type="stop"/></notations>"#,
    );
    let (tree, part, curves) = curves(&measure(1, &format!("{attrs}{start}{stop}")));
    let chords = of_kind(&tree, part, GeometryKind::Chord);
    let tip = |chord: GeometryId| {
        let stem = tree.frame(tree.stem_of(chord).expect("beamed note has a stem"));
        tree.convert_from_geometry(part, Point::new(stem.min_x() + 1.0, stem.max_y() + 4.0), chord)
    };

    assert_eq!(curves.len(), 1);
    assert_eq!(curves[0].placement(), Some(Placement::Below));
    // The beam continues into the stop note, so its end is routed around the stem.
    assert_eq!(curves[0].stop_location(), tip(chords[1]));
    assert_eq!(curves[0].start_location(), tip(chords[0]));
}

#[test]
fn synthesis_is_repeatable() {
    let (tree, part) = tree_for(&one_measure(&[
        note("C", 5, &slur("start", 1)),
        note("C", 5, &tied("start")),
        note("C", 5, &format!("<tie type=\"stop\"/>{}", slur("stop", 1))),
    ]));
    let first = TieSynthesizer::new(&tree, part).build();
    let second = TieSynthesizer::new(&tree, part).build();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[test]
fn placement_inference_uses_the_middle_line() {
    assert_eq!(infer_placement(10.0, 10.0), Placement::Above);
    assert_eq!(infer_placement(30.0, 5.0), Placement::Above);
    assert_eq!(infer_placement(20.0, 20.0), Placement::Below);
    assert_eq!(infer_placement(45.0, 50.0), Placement::Below);
}

#[test]
fn layout_attaches_curves_to_their_part() {
    let score = parse_musicxml(&single_part(&one_measure(&[
        note("C", 4, &tied("start")),
        note("C", 4, &tied("stop")),
    ])))
    .expect("fixture parses");
    let layout = layout_score(&score, &LayoutOptions::default());
    let part = &layout.parts[0];

    assert_eq!(part.ties.len(), 1);
    let id = part.ties[0];
    assert_eq!(layout.tree.kind(id), GeometryKind::Tie);
    assert_eq!(layout.tree.parent(id), Some(part.part));
    let curve = layout.ties(0)[0];
    assert_eq!(layout.tree.frame(id), curve.bounds());
}

#[test]
fn layout_bounds_cover_curves_outside_the_part() {
    // A tie between two very high notes arches far above the part's own frame.
    let score = parse_musicxml(&single_part(&one_measure(&[
        note("C", 9, &tied("start")),
        note("C", 9, &tied("stop")),
    ])))
    .expect("fixture parses");
    let layout = layout_score(&score, &LayoutOptions::default());
    let tree = &layout.tree;
    let bounds = tree.root_frame(tree.root());

    let tie = layout.parts[0].ties[0];
    assert!(tree.root_frame(tie).min_y() < tree.root_frame(layout.parts[0].part).min_y());
    for id in tree.ids() {
        let frame = tree.root_frame(id);
        let inside = frame.x0 >= bounds.x0 - 1e-9
            && frame.y0 >= bounds.y0 - 1e-9
            && frame.x1 <= bounds.x1 + 1e-9
            && frame.y1 <= bounds.y1 + 1e-9;
        assert!(inside, "{:?} {frame:?} sticks out of {bounds:?}", tree.kind(id));
    }
}
