//! Accumulates SVG elements and produces the final document string.

use std::fmt::Write;

use super::constants::*;

const SERIF_STACK: &str = "'Georgia', 'Times New Roman', serif";

pub(super) struct SvgBuilder {
    body: String,
    /// Extent of the drawing in user units.
    width: f64,
    height: f64,
    /// Rendered width; the drawing is scaled to fit.
    page_width: f64,
}

impl SvgBuilder {
    pub(super) fn new(width: f64, height: f64, page_width: Option<f64>) -> Self {
        Self {
            body: String::new(),
            width,
            height,
            page_width: page_width.unwrap_or(width),
        }
    }

    /// Appends one indented element line. Writing into a `String` cannot fail.
    fn push(&mut self, element: std::fmt::Arguments) {
        let _ = writeln!(self.body, "  {element}");
    }

    pub(super) fn build(self) -> String {
        let page_height = if self.width > 0.0 {
            self.height * self.page_width / self.width
        } else {
            self.height
        };
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {:.1} {:.1}\" width=\"{:.1}\" height=\"{:.1}\" \
             style=\"font-family: {SERIF_STACK};\">\n{}</svg>\n",
            self.width, self.height, self.page_width, page_height, self.body
        )
    }

    pub(super) fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: &str, width: f64) {
        self.push(format_args!(
            r#"<line x1="{x1:.1}" y1="{y1:.1}" x2="{x2:.1}" y2="{y2:.1}" stroke="{color}" stroke-width="{width:.1}" stroke-linecap="round"/>"#
        ));
    }

    pub(super) fn dashed_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: &str, width: f64) {
        self.push(format_args!(
            r#"<line x1="{x1:.1}" y1="{y1:.1}" x2="{x2:.1}" y2="{y2:.1}" stroke="{color}" stroke-width="{width:.1}" stroke-dasharray="4,3"/>"#
        ));
    }

    pub(super) fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str) {
        self.push(format_args!(
            r#"<rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" fill="{fill}"/>"#
        ));
    }

    pub(super) fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str) {
        self.push(format_args!(r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="{r:.1}" fill="{fill}"/>"#));
    }

    pub(super) fn text(&mut self, x: f64, y: f64, content: &str, size: f64, weight: &str, fill: &str, anchor: &str) {
        let content = escape(content);
        self.push(format_args!(
            r#"<text x="{x:.1}" y="{y:.1}" font-size="{size:.0}" font-weight="{weight}" fill="{fill}" text-anchor="{anchor}">{content}</text>"#
        ));
    }

    /// Left-aligned italic text, used for directions.
    pub(super) fn italic_text(&mut self, x: f64, y: f64, content: &str, size: f64, fill: &str) {
        let content = escape(content);
        self.push(format_args!(
            r#"<text x="{x:.1}" y="{y:.1}" font-family="Times New Roman, Times, serif" font-size="{size:.0}" font-style="italic" fill="{fill}" text-anchor="start">{content}</text>"#
        ));
    }

    pub(super) fn path(&mut self, d: &str, fill: &str, stroke: &str, stroke_width: f64) {
        self.push(format_args!(
            r#"<path d="{d}" fill="{fill}" stroke="{stroke}" stroke-width="{stroke_width:.1}" stroke-linecap="round"/>"#
        ));
    }

    /// Tilted oval head; open heads are stroked inside the filled outline.
    pub(super) fn notehead(&mut self, cx: f64, cy: f64, filled: bool) {
        let (rx, ry, paint) = if filled {
            (NOTEHEAD_RX, NOTEHEAD_RY, format!(r#"fill="{NOTE_COLOR}" stroke="none""#))
        } else {
            const RIM: f64 = 2.0;
            (
                NOTEHEAD_RX - RIM / 2.0,
                NOTEHEAD_RY - RIM / 2.0,
                format!(r#"fill="none" stroke="{NOTE_COLOR}" stroke-width="{RIM:.1}""#),
            )
        };
        self.push(format_args!(
            r#"<ellipse cx="{cx:.1}" cy="{cy:.1}" rx="{rx:.1}" ry="{ry:.1}" {paint} transform="rotate(-15,{cx:.1},{cy:.1})"/>"#
        ));
    }

    /// A filled parallelogram of the given thickness centred on the segment.
    pub(super) fn beam_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, thickness: f64) {
        let length = (x2 - x1).hypot(y2 - y1).max(0.1);
        let scale = thickness / 2.0 / length;
        let (ox, oy) = ((y1 - y2) * scale, (x2 - x1) * scale);
        let corners = [(x1 + ox, y1 + oy), (x2 + ox, y2 + oy), (x2 - ox, y2 - oy), (x1 - ox, y1 - oy)];

        let mut d = String::new();
        for (i, (x, y)) in corners.iter().enumerate() {
            let _ = write!(d, "{}{x:.1},{y:.1} ", if i == 0 { 'M' } else { 'L' });
        }
        d.push('Z');
        self.push(format_args!(r#"<path d="{d}" fill="{NOTE_COLOR}"/>"#));
    }
}

fn escape(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// A small standalone document carrying only `message`.
pub(super) fn empty_svg(message: &str) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 400 100\">\
         <text x=\"200\" y=\"50\" text-anchor=\"middle\" font-size=\"14\" fill=\"gray\">{}</text>\
         </svg>\n",
        escape(message)
    )
}
