//! Drawing constants for the SVG backend (all in SVG user units).

// ── Page & margins ──────────────────────────────────────────────────
pub(super) const PAGE_MARGIN_LEFT: f64 = 50.0;
pub(super) const PAGE_MARGIN_RIGHT: f64 = 30.0;
pub(super) const PAGE_MARGIN_TOP: f64 = 30.0;
pub(super) const PAGE_MARGIN_BOTTOM: f64 = 30.0;
pub(super) const HEADER_HEIGHT: f64 = 70.0; // space for title + composer

// ── Glyph dimensions ────────────────────────────────────────────────
pub(super) const NOTEHEAD_RX: f64 = 5.5; // notehead ellipse x-radius
pub(super) const NOTEHEAD_RY: f64 = 4.0; // notehead ellipse y-radius
pub(super) const STEM_STROKE: f64 = 1.2;
pub(super) const BARLINE_WIDTH: f64 = 1.0;
pub(super) const STAFF_LINE_WIDTH: f64 = 0.8;
pub(super) const LEDGER_LINE_WIDTH: f64 = 0.8;
pub(super) const LEDGER_LINE_EXTEND: f64 = 5.0;

// ── Curves ──────────────────────────────────────────────────────────
pub(super) const CURVE_ENDPOINT_THICKNESS: f64 = 0.5;
pub(super) const CURVE_MID_THICKNESS: f64 = 1.5;

// ── Colors ──────────────────────────────────────────────────────────
pub(super) const NOTE_COLOR: &str = "#1a1a1a";
pub(super) const STAFF_COLOR: &str = "#555555";
pub(super) const BARLINE_COLOR: &str = "#333333";
pub(super) const HEADER_COLOR: &str = "#1a1a1a";
pub(super) const REST_COLOR: &str = "#1a1a1a";
pub(super) const DIRECTION_COLOR: &str = "#1a1a1a";
