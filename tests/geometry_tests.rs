mod common;

use kurbo::{Point, Rect, Size, Vec2};
use pretty_assertions::assert_eq;
use scorelayout::geometry::{
    GeometryData, GeometryId, GeometryKind, GeometryNode, GeometryTree, GeometryVisitor, NoteData, Role, SpanPlan,
    TreeBuilder,
};
use scorelayout::{parse_musicxml, Note, Score, Stem};

use common::*;

fn build(xml: &str) -> (Score, GeometryTree) {
    let score = parse_musicxml(xml).expect("fixture parses");
    let tree = TreeBuilder::new(&score, true).build();
    (score, tree)
}

fn note_data(tree: &GeometryTree, id: GeometryId) -> &NoteData {
    tree.node(id).note().expect("note geometry")
}

// ─── Tree primitives ─────────────────────────────────────────────────

fn nested_tree() -> (GeometryTree, GeometryId, GeometryId) {
    let mut tree = GeometryTree::new(GeometryNode::new(GeometryKind::Score, GeometryData::Empty));
    let outer = tree.add(
        tree.root(),
        GeometryNode::new(GeometryKind::Measure, GeometryData::Empty)
            .at(Point::new(10.0, 20.0))
            .with_size(Size::new(100.0, 50.0)),
    );
    let inner = tree.add(
        outer,
        GeometryNode::new(GeometryKind::Chord, GeometryData::Empty)
            .at(Point::new(5.0, 5.0))
            .with_size(Size::new(10.0, 10.0)),
    );
    (tree, outer, inner)
}

#[test]
fn converts_points_between_spaces() {
    let (tree, outer, inner) = nested_tree();
    let p = Point::new(1.0, 2.0);

    assert_eq!(tree.convert_to_root(inner, p), Point::new(16.0, 27.0));
    assert_eq!(tree.convert_from_root(inner, Point::new(16.0, 27.0)), p);
    assert_eq!(tree.convert_from_geometry(outer, p, inner), Point::new(6.0, 7.0));
    assert_eq!(tree.convert_from_geometry(inner, Point::new(6.0, 7.0), outer), p);
    assert_eq!(tree.root_frame(inner), Rect::new(15.0, 25.0, 25.0, 35.0));
}

#[test]
fn frame_is_offset_by_anchor() {
    let mut tree = GeometryTree::new(GeometryNode::new(GeometryKind::Score, GeometryData::Empty));
    let id = tree.add(
        tree.root(),
        GeometryNode::new(GeometryKind::Rest, GeometryData::Empty)
            .at(Point::new(50.0, 50.0))
            .with_size(Size::new(10.0, 28.0))
            .with_anchor(Vec2::new(5.0, 14.0)),
    );
    assert_eq!(tree.frame(id), Rect::new(45.0, 36.0, 55.0, 64.0));

    tree.set_frame(id, Rect::new(45.0, 70.0, 55.0, 98.0));
    assert_eq!(tree.node(id).location(), Point::new(50.0, 84.0));
    assert_eq!(tree.frame(id), Rect::new(45.0, 70.0, 55.0, 98.0));
}

#[test]
fn fit_to_children_keeps_location() {
    let (mut tree, outer, inner) = nested_tree();
    tree.add(
        inner,
        GeometryNode::new(GeometryKind::Dot, GeometryData::Dot).with_frame(Rect::new(-3.0, -2.0, 4.0, 6.0)),
    );
    tree.fit_to_children(inner);

    assert_eq!(tree.node(inner).location(), Point::new(5.0, 5.0));
    assert_eq!(tree.frame(inner), Rect::new(2.0, 3.0, 9.0, 11.0));
    assert!(tree.is_ancestor(outer, inner));
    assert!(!tree.is_ancestor(inner, outer));
}

#[test]
fn notes_frame_follows_repositioned_notes() {
    let (mut tree, _, chord) = nested_tree();
    let head = |y: f64| {
        GeometryNode::new(
            GeometryKind::Note,
            GeometryData::Note(NoteData {
                note: Note::default(),
                stem: Stem::Up,
            }),
        )
        .at(Point::new(0.0, y))
        .with_size(Size::new(11.0, 10.0))
        .with_anchor(Vec2::new(5.5, 5.0))
    };
    let low = tree.add(chord, head(30.0));
    tree.add(chord, head(20.0));
    assert_eq!(tree.notes_frame(chord), Some(Rect::new(-5.5, 15.0, 5.5, 35.0)));

    tree.set_location(low, Point::new(0.0, 50.0));
    assert_eq!(tree.notes_frame(chord), Some(Rect::new(-5.5, 15.0, 5.5, 55.0)));
}

#[test]
fn kind_tables() {
    assert_eq!(GeometryKind::Chord.role(), Role::Container);
    assert_eq!(GeometryKind::Note.role(), Role::Note);
    assert_eq!(GeometryKind::Rest.role(), Role::Leaf);

    assert_eq!(GeometryKind::Clef.collision_priority(), Some(0));
    assert_eq!(GeometryKind::Tie.collision_priority(), Some(1));
    assert_eq!(GeometryKind::Lyric.collision_priority(), Some(2));
    assert_eq!(GeometryKind::Rest.collision_priority(), Some(4));
    assert_eq!(GeometryKind::Words.collision_priority(), Some(9));
    assert_eq!(GeometryKind::Barline.collision_priority(), None);

    let immovable: Vec<GeometryKind> = GeometryKind::ALL.into_iter().filter(|k| k.is_immovable()).collect();
    assert_eq!(immovable.len(), 11);
    assert!(!GeometryKind::Rest.is_immovable());
    assert!(!GeometryKind::Part.collides());
}

// ─── Builder ─────────────────────────────────────────────────────────

#[test]
fn parts_are_stacked_below_each_other() {
    let xml = r#"<score-partwise version="4.0">
  <part-list>
    <score-part id="P1"><part-name>Upper</part-name></score-part>
    <score-part id="P2"><part-name>Lower</part-name></score-part>
  </part-list>
  <part id="P1"><measure number="1"><note><rest measure="yes"/><duration>4</duration></note></measure></part>
  <part id="P2"><measure number="1"><note><rest measure="yes"/><duration>4</duration></note></measure></part>
</score-partwise>"#;
    let (_, tree) = build(xml);
    let parts = parts(&tree);

    assert_eq!(parts.len(), 2);
    assert_eq!(tree.node(parts[0]).location(), Point::new(0.0, 0.0));
    assert_eq!(tree.node(parts[1]).location(), Point::new(0.0, 200.0));
    assert_eq!(tree.root_frame(tree.root()).height(), 400.0);
}

#[test]
fn simultaneous_onsets_share_x_across_parts() {
    let upper = (0..4).map(|_| note("C", 5, "")).collect::<String>();
    let lower = format!("{}{}", note_typed("C", 4, 2, "half", ""), note_typed("E", 4, 2, "half", ""));
    let xml = format!(
        r#"<score-partwise version="4.0">
  <part-list>
    <score-part id="P1"><part-name>Upper</part-name></score-part>
    <score-part id="P2"><part-name>Lower</part-name></score-part>
  </part-list>
  <part id="P1">{}</part>
  <part id="P2">{}</part>
</score-partwise>"#,
        measure(1, &format!("{TREBLE_ATTRS}{upper}")),
        measure(1, &format!("{TREBLE_ATTRS}{lower}")),
    );
    let (_, tree) = build(&xml);
    let parts = parts(&tree);
    let upper_chords = of_kind(&tree, parts[0], GeometryKind::Chord);
    let lower_chords = of_kind(&tree, parts[1], GeometryKind::Chord);

    assert_eq!(upper_chords.len(), 4);
    assert_eq!(lower_chords.len(), 2);
    assert_eq!(tree.root_offset(upper_chords[0]).x, tree.root_offset(lower_chords[0]).x);
    assert_eq!(tree.root_offset(upper_chords[2]).x, tree.root_offset(lower_chords[1]).x);
}

#[test]
fn uniform_spacing_ignores_durations() {
    let content = format!(
        "{TREBLE_ATTRS}{}{}{}",
        note_typed("C", 4, 2, "half", ""),
        note("D", 4, ""),
        note("E", 4, "")
    );
    let score = parse_musicxml(&single_part(&measure(1, &content))).expect("fixture parses");

    let natural = SpanPlan::build(&score, true);
    let slots = &natural.measure(0).expect("measure span").onsets;
    assert_eq!(slots[1].1 - slots[0].1, 80.0);
    assert_eq!(slots[2].1 - slots[1].1, 40.0);

    let uniform = SpanPlan::build(&score, false);
    let slots = &uniform.measure(0).expect("measure span").onsets;
    assert_eq!(slots[1].1 - slots[0].1, 40.0);
    assert_eq!(slots[2].1 - slots[1].1, 40.0);
}

#[test]
fn stems_are_inferred_from_head_positions() {
    let content = format!(
        "{TREBLE_ATTRS}{}{}{}{}",
        note("C", 4, ""),
        note("B", 4, ""),
        note("E", 5, ""),
        note("C", 4, "<stem>down</stem>")
    );
    let (_, tree) = build(&single_part(&measure(1, &content)));
    let notes = of_kind(&tree, tree.root(), GeometryKind::Note);
    let stems: Vec<Stem> = notes.iter().map(|&n| note_data(&tree, n).stem).collect();

    assert_eq!(stems, vec![Stem::Up, Stem::Up, Stem::Down, Stem::Down]);
}

#[test]
fn stem_frame_spans_from_head_to_tip() {
    let content = format!("{TREBLE_ATTRS}{}", note("C", 4, ""));
    let (_, tree) = build(&single_part(&measure(1, &content)));
    let chord = of_kind(&tree, tree.root(), GeometryKind::Chord)[0];
    let stem = tree.stem_of(chord).expect("quarter note has a stem");

    // C4 sits on the first ledger line below a treble staff.
    assert_eq!(tree.frame(stem), Rect::new(4.5, 20.0, 5.5, 50.0));
    assert_eq!(tree.node(chord).chord().and_then(|c| c.stem_direction), Some(Stem::Up));
}

#[test]
fn whole_notes_and_rests_have_no_stem() {
    let content = format!("{TREBLE_ATTRS}{}", note_typed("G", 4, 4, "whole", ""));
    let (_, tree) = build(&single_part(&format!("{}{}", measure(1, &content), measure(2, &rest(4, "whole")))));

    assert!(of_kind(&tree, tree.root(), GeometryKind::Stem).is_empty());
    assert_eq!(of_kind(&tree, tree.root(), GeometryKind::Rest).len(), 1);
}

#[test]
fn beamed_notes_share_a_direction() {
    let content = format!(
        "{TREBLE_ATTRS}{}{}",
        note_typed("C", 4, 1, "eighth", r#"<beam number="1">begin</beam>"#),
        note_typed("A", 5, 1, "eighth", r#"<beam number="1">end</beam>"#),
    );
    let xml = single_part(&measure(1, &content.replace("<divisions>1</divisions>", "<divisions>2</divisions>")));
    let (_, tree) = build(&xml);
    let notes = of_kind(&tree, tree.root(), GeometryKind::Note);

    assert_eq!(note_data(&tree, notes[0]).stem, note_data(&tree, notes[1]).stem);
    assert_eq!(of_kind(&tree, tree.root(), GeometryKind::Beam).len(), 1);
    // Beamed stems carry no flags.
    for stem in of_kind(&tree, tree.root(), GeometryKind::Stem) {
        assert!(matches!(tree.node(stem).data(), GeometryData::Stem { flags: 0, .. }));
    }
}

#[test]
fn accidentals_respect_the_key_signature() {
    let attrs = "<attributes><divisions>1</divisions><key><fifths>1</fifths></key>\
<clef><sign>G</sign><line>2</line></clef></attributes>";
    let f_sharp = "<note><pitch><step>F</step><alter>1</alter><octave>4</octave></pitch>\
<duration>1</duration><voice>1</voice><type>quarter</type></note>";
    let content = format!("{attrs}{f_sharp}{}", note("F", 4, ""));
    let (_, tree) = build(&single_part(&measure(1, &content)));

    let accidentals = of_kind(&tree, tree.root(), GeometryKind::Accidental);
    assert_eq!(accidentals.len(), 1);
    match tree.node(accidentals[0]).data() {
        GeometryData::Accidental(text) => assert_eq!(text, "natural"),
        other => panic!("unexpected payload {other:?}"),
    }
}

#[test]
fn grace_notes_are_skipped() {
    let grace = "<note><grace/><pitch><step>D</step><octave>5</octave></pitch><voice>1</voice><type>eighth</type></note>";
    let content = format!("{TREBLE_ATTRS}{grace}{}", note("C", 5, ""));
    let (_, tree) = build(&single_part(&measure(1, &content)));

    assert_eq!(of_kind(&tree, tree.root(), GeometryKind::Note).len(), 1);
}

#[test]
fn chord_members_share_one_chord() {
    let content = format!("{TREBLE_ATTRS}{}{}", note("C", 4, ""), note("E", 4, "<chord/>"));
    let (_, tree) = build(&single_part(&measure(1, &content)));

    let chords = of_kind(&tree, tree.root(), GeometryKind::Chord);
    assert_eq!(chords.len(), 1);
    assert_eq!(of_kind(&tree, chords[0], GeometryKind::Note).len(), 2);
    assert_eq!(tree.notes_frame(chords[0]), Some(Rect::new(-5.5, 35.0, 5.5, 55.0)));
}

#[test]
fn directions_and_spanners_hang_off_the_part() {
    let wedge = |kind: &str| {
        format!(r#"<direction placement="below"><direction-type><wedge type="{kind}"/></direction-type></direction>"#)
    };
    let content = format!(
        "{TREBLE_ATTRS}{}{}{}{}{}",
        wedge("crescendo"),
        note("C", 5, ""),
        note("D", 5, ""),
        wedge("stop"),
        note("E", 5, ""),
    );
    let stray = measure(2, &format!("{}{}", wedge("stop"), rest(4, "whole")));
    let (_, tree) = build(&single_part(&format!("{}{stray}", measure(1, &content))));
    let part = parts(&tree)[0];

    let wedges: Vec<GeometryId> = tree
        .children(part)
        .iter()
        .copied()
        .filter(|&c| tree.kind(c) == GeometryKind::SpanDirection)
        .collect();
    assert_eq!(wedges.len(), 1);
    let frame = tree.frame(wedges[0]);
    // Below the staff, from the first note's slot to the third's.
    assert_eq!(frame.min_y(), 130.0);
    // Default spread of 15 plus one line width on each side.
    assert_eq!(frame.height(), 17.0);
    assert!(frame.width() > 0.0);
}

#[test]
fn walk_visits_notes_in_document_order() {
    struct Collect(Vec<i32>);
    impl GeometryVisitor for Collect {
        fn visit_note(&mut self, tree: &GeometryTree, note: GeometryId) {
            if let Some(pitch) = tree.node(note).note().and_then(|d| d.note.pitch.as_ref()) {
                self.0.push(pitch.value());
            }
        }
    }

    let content = format!("{TREBLE_ATTRS}{}{}{}", note("E", 4, ""), note("D", 4, ""), note("C", 4, ""));
    let (_, tree) = build(&single_part(&measure(1, &content)));
    let mut visitor = Collect(Vec::new());
    tree.walk(tree.root(), &mut visitor);

    assert_eq!(visitor.0, vec![64, 62, 60]);
}
