//! MusicXML score layout with tie and slur synthesis and vertical
//! collision resolution.
//!
//! Plain `.musicxml` and zipped `.mxl` scores are read into a [`Score`].
//! [`layout_score`] places every symbol in a [`GeometryTree`], joins tied
//! and slurred notes with curves and pushes overlapping symbols apart; the
//! result can be drawn as SVG.
//!
//! ```no_run
//! use scorelayout::{layout_score, parse_file, LayoutOptions};
//! let score = parse_file("song.mxl").unwrap();
//! let layout = layout_score(&score, &LayoutOptions::default());
//! println!("Geometries: {}", layout.tree.len());
//! println!("Curves in first part: {}", layout.ties(0).len());
//! ```

pub mod collision;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod mxl;
pub mod options;
pub mod parser;
pub mod renderer;

#[cfg(target_os = "android")]
pub mod android;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;

pub use error::{Error, Result};
pub use geometry::{GeometryKind, GeometryTree, TieGeometry};
pub use layout::{layout_score, PartLayout, ScoreLayout};
pub use model::*;
pub use mxl::parse_mxl;
pub use options::LayoutOptions;
pub use parser::parse_musicxml;
pub use renderer::render_score_to_svg;

/// Container formats a score can arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Xml,
    Archive,
}

impl SourceFormat {
    fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "mxl" => Some(Self::Archive),
            "musicxml" | "xml" => Some(Self::Xml),
            _ => None,
        }
    }

    /// Markup starts with `<` once leading whitespace is skipped; anything
    /// else is handed to the archive reader.
    fn sniff(data: &[u8]) -> Self {
        match data.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'<') => Self::Xml,
            _ => Self::Archive,
        }
    }
}

/// Reads and parses the score at `path`.
///
/// `.mxl` files are read as compressed archives, `.musicxml` and `.xml` as
/// plain markup. Other extensions are sniffed from the content.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Score> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    let extension = path.extension().and_then(|e| e.to_str());
    parse_bytes(&data, extension)
}

/// Parses an in-memory score. `extension` is a format hint without the dot.
pub fn parse_bytes(data: &[u8], extension: Option<&str>) -> Result<Score> {
    let format = extension
        .and_then(SourceFormat::from_extension)
        .unwrap_or_else(|| SourceFormat::sniff(data));
    log::debug!("parsing {} bytes as {format:?}", data.len());

    match format {
        SourceFormat::Archive => parse_mxl(data),
        SourceFormat::Xml => {
            let text = std::str::from_utf8(data).map_err(|e| Error::Xml(format!("score is not UTF-8: {e}")))?;
            parse_musicxml(text)
        }
    }
}

/// Pretty-printed JSON form of a parsed score.
pub fn score_to_json(score: &Score) -> Result<String> {
    Ok(serde_json::to_string_pretty(score)?)
}

pub fn render_file_to_svg<P: AsRef<Path>>(path: P, options: &LayoutOptions) -> Result<String> {
    parse_file(path).map(|score| render_score_to_svg(&score, options))
}

pub fn render_bytes_to_svg(data: &[u8], extension: Option<&str>, options: &LayoutOptions) -> Result<String> {
    parse_bytes(data, extension).map(|score| render_score_to_svg(&score, options))
}

// ---------------------------------------------------------------------------
// C ABI. Every returned string is owned by the caller and released with
// `scorelayout_free_string`; failures come back as null.
// ---------------------------------------------------------------------------

fn svg_to_c(result: Result<String>) -> *mut c_char {
    let svg = match result {
        Ok(svg) => svg,
        Err(e) => {
            log::warn!("render failed: {e}");
            return std::ptr::null_mut();
        }
    };
    match CString::new(svg) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            log::warn!("svg holds an interior nul at {}", e.nul_position());
            std::ptr::null_mut()
        }
    }
}

/// Borrows a nul-terminated UTF-8 string, or `None` for null and invalid text.
///
/// # Safety
/// A non-null `ptr` must point to a nul-terminated string that outlives `'a`.
unsafe fn borrow_c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Renders the score at `path`. A `page_width` of 0 keeps the natural width.
///
/// # Safety
/// `path` must be null or a nul-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn scorelayout_render_file(path: *const c_char, page_width: f64) -> *mut c_char {
    let Some(path) = (unsafe { borrow_c_str(path) }) else {
        return std::ptr::null_mut();
    };
    let options = LayoutOptions::default().with_page_width(Some(page_width));
    svg_to_c(render_file_to_svg(path, &options))
}

/// Renders `len` bytes of score data. `extension` is an optional format hint.
///
/// # Safety
/// `data` must be valid for `len` bytes; `extension` must be null or a
/// nul-terminated string.
#[no_mangle]
pub unsafe extern "C" fn scorelayout_render_bytes(
    data: *const u8,
    len: usize,
    extension: *const c_char,
    page_width: f64,
) -> *mut c_char {
    if data.is_null() || len == 0 {
        return std::ptr::null_mut();
    }
    let bytes = unsafe { std::slice::from_raw_parts(data, len) };
    let hint = unsafe { borrow_c_str(extension) };
    let options = LayoutOptions::default().with_page_width(Some(page_width));
    svg_to_c(render_bytes_to_svg(bytes, hint, &options))
}

/// Releases a string handed out by this library. Null is ignored.
///
/// # Safety
/// `ptr` must be null or a pointer previously returned from this library
/// that has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn scorelayout_free_string(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr) });
}
