//! Panel detection contract
//!
//! Detection itself runs in a hosted vision service. This module defines the
//! interface the reader calls, the request prompt and response schema sent to
//! such a service, and parsing of its JSON answer.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;

use super::{Panel, PanelBox};
use crate::error::Result;

/// Instruction sent alongside the page image
pub const PANEL_PROMPT: &str = "Analyze this comic book page. Identify all individual panels. \
Return their bounding box coordinates as percentages (0-100). Order them in the logical reading \
order (usually left-to-right, top-to-bottom, but respect the comic's flow).";

/// JSON schema the service is asked to answer with
pub const PANEL_RESPONSE_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "panels": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "order": { "type": "integer", "description": "The reading order of the panel, starting at 1" },
          "ymin": { "type": "number", "description": "Top Y coordinate percentage (0-100)" },
          "xmin": { "type": "number", "description": "Left X coordinate percentage (0-100)" },
          "ymax": { "type": "number", "description": "Bottom Y coordinate percentage (0-100)" },
          "xmax": { "type": "number", "description": "Right X coordinate percentage (0-100)" },
          "description": { "type": "string", "description": "Short description of the panel content" }
        },
        "required": ["order", "ymin", "xmin", "ymax", "xmax"]
      }
    }
  },
  "required": ["panels"]
}"#;

/// Supplies panels for a page image.
///
/// Implementations return panels already in reading order and an empty list
/// when nothing could be detected or the service failed.
pub trait PanelDetector {
    fn analyze(&self, page_data_uri: &str) -> Vec<Panel>;
}

impl<F> PanelDetector for F
where
    F: Fn(&str) -> Vec<Panel>,
{
    fn analyze(&self, page_data_uri: &str) -> Vec<Panel> {
        self(page_data_uri)
    }
}

/// Detector that never finds panels
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDetector;

impl PanelDetector for NullDetector {
    fn analyze(&self, _page_data_uri: &str) -> Vec<Panel> {
        Vec::new()
    }
}

/// Serves a saved service response from disk, whatever the page
#[derive(Clone, Debug)]
pub struct JsonFileDetector {
    path: PathBuf,
}

impl JsonFileDetector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file, surfacing errors instead of degrading
    pub fn load(&self) -> Result<Vec<Panel>> {
        let text = std::fs::read_to_string(&self.path)?;
        try_parse_panel_response(&text)
    }
}

impl PanelDetector for JsonFileDetector {
    fn analyze(&self, _page_data_uri: &str) -> Vec<Panel> {
        match self.load() {
            Ok(panels) => panels,
            Err(e) => {
                warn!("Panel analysis failed for {:?}: {e}", self.path);
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct PanelResponse {
    panels: Vec<RawPanel>,
}

#[derive(Debug, Deserialize)]
struct RawPanel {
    order: u32,
    ymin: f32,
    xmin: f32,
    ymax: f32,
    xmax: f32,
    #[serde(default)]
    description: Option<String>,
}

/// Parse a service response, assigning positional ids.
///
/// Malformed boxes are logged and kept; the transform calculator treats them
/// as the full page.
pub fn try_parse_panel_response(text: &str) -> Result<Vec<Panel>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let response: PanelResponse = serde_json::from_str(text)?;
    let panels: Vec<Panel> = response
        .panels
        .into_iter()
        .enumerate()
        .map(|(position, raw)| {
            let bounds = PanelBox::new(raw.xmin, raw.ymin, raw.xmax, raw.ymax);
            if let Err(e) = bounds.validate() {
                warn!("Panel {position} (order {}): {e}", raw.order);
            }
            let mut panel = Panel::new(position, raw.order, bounds);
            panel.description = raw.description.filter(|d| !d.trim().is_empty());
            panel
        })
        .collect();

    debug!("Parsed {} panels", panels.len());
    Ok(panels)
}

/// Parse a service response; any failure yields no panels
pub fn parse_panel_response(text: &str) -> Vec<Panel> {
    try_parse_panel_response(text).unwrap_or_else(|e| {
        warn!("Discarding unreadable panel response: {e}");
        Vec::new()
    })
}
