//! Layout configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Options controlling [`layout_score`](crate::layout::layout_score) and the SVG backend.
///
/// Every field has a default, so partial JSON such as
/// `{"resolve_collisions": false}` is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Slot widths follow note durations; `false` spaces every onset evenly.
    pub natural_spacing: bool,
    /// Run the vertical collision resolver after ties are synthesized.
    pub resolve_collisions: bool,
    /// SVG width in user units; the drawing is scaled to fit. `None` keeps
    /// the natural width of the layout.
    pub page_width: Option<f64>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            natural_spacing: true,
            resolve_collisions: true,
            page_width: None,
        }
    }
}

impl LayoutOptions {
    /// Parse options from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Options with `page_width` set, treating non-positive widths as unset
    /// (the FFI passes 0.0 for "default").
    pub fn with_page_width(mut self, page_width: Option<f64>) -> Self {
        self.page_width = page_width.filter(|w| *w > 0.0);
        self
    }
}
