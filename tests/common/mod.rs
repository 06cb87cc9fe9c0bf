//! Inline MusicXML fixtures and tree helpers shared by the integration tests.

#![allow(dead_code)]

use scorelayout::geometry::{GeometryId, GeometryKind, GeometryTree};

/// Standard opening attributes: 1 division per quarter, C major, 4/4, treble clef.
pub const TREBLE_ATTRS: &str = "<attributes><divisions>1</divisions>\
<key><fifths>0</fifths></key>\
<time><beats>4</beats><beat-type>4</beat-type></time>\
<clef><sign>G</sign><line>2</line></clef></attributes>";

/// Wrap measure elements into a one-part `score-partwise` document.
pub fn single_part(measures: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<score-partwise version="4.0">
  <work><work-title>Fixture</work-title></work>
  <identification><creator type="composer">Tester</creator></identification>
  <part-list><score-part id="P1"><part-name>Piano</part-name></score-part></part-list>
  <part id="P1">{measures}</part>
</score-partwise>"#
    )
}

/// A measure with the given number and content.
pub fn measure(number: i32, content: &str) -> String {
    format!(r#"<measure number="{number}">{content}</measure>"#)
}

/// A quarter note with `extra` child elements (stem, beam, notations, ...).
pub fn note(step: &str, octave: i32, extra: &str) -> String {
    note_typed(step, octave, 1, "quarter", extra)
}

pub fn note_typed(step: &str, octave: i32, duration: i32, note_type: &str, extra: &str) -> String {
    format!(
        "<note><pitch><step>{step}</step><octave>{octave}</octave></pitch>\
<duration>{duration}</duration><voice>1</voice><type>{note_type}</type>{extra}</note>"
    )
}

pub fn rest(duration: i32, note_type: &str) -> String {
    format!("<note><rest/><duration>{duration}</duration><voice>1</voice><type>{note_type}</type></note>")
}

pub fn tied(kind: &str) -> String {
    format!(r#"<notations><tied type="{kind}"/></notations>"#)
}

pub fn slur(kind: &str, number: i32) -> String {
    format!(r#"<notations><slur type="{kind}" number="{number}"/></notations>"#)
}

/// Part geometries directly below the root.
pub fn parts(tree: &GeometryTree) -> Vec<GeometryId> {
    tree.children(tree.root())
        .iter()
        .copied()
        .filter(|&id| tree.kind(id) == GeometryKind::Part)
        .collect()
}

/// Descendants of `id` of the given kind, in document order.
pub fn of_kind(tree: &GeometryTree, id: GeometryId, kind: GeometryKind) -> Vec<GeometryId> {
    tree.descendants(id)
        .into_iter()
        .filter(|&d| tree.kind(d) == kind)
        .collect()
}

/// Frame of `id` expressed in the space of `into`.
pub fn frame_in(tree: &GeometryTree, into: GeometryId, id: GeometryId) -> kurbo::Rect {
    let parent = tree.parent(id).expect("geometry has a parent");
    tree.convert_rect_from_geometry(into, tree.frame(id), parent)
}
