mod common;

use std::ffi::{CStr, CString};

use pretty_assertions::assert_eq;
use scorelayout::{
    parse_file, render_bytes_to_svg, render_file_to_svg, render_score_to_svg, scorelayout_free_string,
    scorelayout_render_bytes, Error, LayoutOptions, Score,
};

use common::*;

fn fixture_path() -> String {
    format!("{}/tests/fixtures/tied_melody.musicxml", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn renders_fixture_to_svg() {
    let svg = render_file_to_svg(fixture_path(), &LayoutOptions::default()).expect("fixture renders");

    assert!(svg.starts_with("<svg"));
    assert!(svg.trim_end().ends_with("</svg>"));
    assert!(svg.contains("Tied Melody"));
    assert!(svg.contains("cantabile"));
    assert!(svg.contains(">Lo<"));
    assert!(svg.contains("<ellipse"), "note heads are drawn");
    assert!(svg.contains("<path"), "ties and slurs are drawn");
}

#[test]
fn page_width_scales_the_drawing() {
    let score = parse_file(fixture_path()).expect("fixture parses");
    let natural = render_score_to_svg(&score, &LayoutOptions::default());
    let scaled = render_score_to_svg(&score, &LayoutOptions::default().with_page_width(Some(400.0)));

    assert!(scaled.contains(r#"width="400.0""#));
    // The viewBox, and so the drawing itself, does not change.
    let view_box = |svg: &str| svg.split("viewBox=\"").nth(1).and_then(|s| s.split('"').next()).map(String::from);
    assert_eq!(view_box(&natural), view_box(&scaled));
}

#[test]
fn empty_score_renders_placeholder() {
    let svg = render_score_to_svg(&Score::new(), &LayoutOptions::default());
    assert!(svg.contains("No parts in score"));
}

#[test]
fn text_is_escaped() {
    let xml = single_part(&measure(1, &format!("{TREBLE_ATTRS}{}", note("C", 5, ""))))
        .replace("<work-title>Fixture</work-title>", "<work-title>Salt &amp; Pepper</work-title>");
    let svg = render_bytes_to_svg(xml.as_bytes(), Some("musicxml"), &LayoutOptions::default()).expect("renders");
    assert!(svg.contains("Salt &amp; Pepper"));
}

#[test]
fn invalid_bytes_are_reported() {
    let err = render_bytes_to_svg(b"<not-a-score/>", Some("xml"), &LayoutOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)), "got {err}");
}

#[test]
fn options_parse_from_partial_json() {
    let options = LayoutOptions::from_json(r#"{"resolve_collisions": false}"#).expect("valid options");
    assert_eq!(
        options,
        LayoutOptions {
            resolve_collisions: false,
            ..LayoutOptions::default()
        }
    );

    let options = LayoutOptions::from_json(r#"{"page_width": 600.0, "natural_spacing": false}"#).expect("valid");
    assert_eq!(options.page_width, Some(600.0));
    assert!(!options.natural_spacing);

    let err = LayoutOptions::from_json("{not json").unwrap_err();
    assert!(matches!(err, Error::Json(_)), "got {err}");
}

#[test]
fn non_positive_page_width_means_natural() {
    assert_eq!(LayoutOptions::default().with_page_width(Some(0.0)).page_width, None);
    assert_eq!(LayoutOptions::default().with_page_width(Some(-5.0)).page_width, None);
    assert_eq!(LayoutOptions::default().with_page_width(Some(320.0)).page_width, Some(320.0));
}

#[test]
fn c_api_round_trip() {
    let xml = single_part(&measure(1, &format!("{TREBLE_ATTRS}{}", note("G", 4, ""))));
    let ext = CString::new("musicxml").expect("no interior nul");

    let ptr = unsafe { scorelayout_render_bytes(xml.as_ptr(), xml.len(), ext.as_ptr(), 0.0) };
    assert!(!ptr.is_null());
    let svg = unsafe { CStr::from_ptr(ptr) }.to_str().expect("utf-8").to_owned();
    unsafe { scorelayout_free_string(ptr) };
    assert!(svg.contains("<svg"));

    let garbage = b"garbage";
    let ptr = unsafe { scorelayout_render_bytes(garbage.as_ptr(), garbage.len(), std::ptr::null(), 0.0) };
    assert!(ptr.is_null());
}
