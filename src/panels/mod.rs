//! Comic panels: bounding boxes, viewport transforms and panel navigation

mod detect;
mod navigation;
mod transform;

pub use detect::{
    JsonFileDetector, NullDetector, PANEL_PROMPT, PANEL_RESPONSE_SCHEMA, PanelDetector,
    parse_panel_response, try_parse_panel_response,
};
pub use navigation::{Command, Effect, NavState, PanelNavigator};
pub use transform::{
    MAX_PADDING, MAX_SCALE, MIN_PADDING, PADDING_FACTOR, Size, Transform, clamp_padding,
    compute_transform, compute_transform_with_padding,
};

use crate::error::{Error, Result};

/// Panel bounding box in percent of the page image (0..=100 on both axes)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PanelBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

/// Axis-aligned rectangle in pixels of the rendered image
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl PixelRect {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }
}

impl PanelBox {
    #[must_use]
    pub const fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Width in percent; negative for an inverted box
    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    /// Height in percent; negative for an inverted box
    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }

    /// Check `min <= max` on both axes and that every edge lies in 0..=100
    pub fn validate(&self) -> Result<()> {
        let edges = [self.xmin, self.ymin, self.xmax, self.ymax];
        let in_range = edges
            .iter()
            .all(|v| v.is_finite() && (0.0..=100.0).contains(v));
        if in_range && self.xmin <= self.xmax && self.ymin <= self.ymax {
            Ok(())
        } else {
            Err(Error::MalformedPanelBox {
                xmin: self.xmin,
                ymin: self.ymin,
                xmax: self.xmax,
                ymax: self.ymax,
            })
        }
    }

    /// Convert to pixels of an image displayed at `width` x `height`
    pub fn to_pixels(&self, width: f32, height: f32) -> PixelRect {
        PixelRect {
            left: self.xmin / 100.0 * width,
            top: self.ymin / 100.0 * height,
            right: self.xmax / 100.0 * width,
            bottom: self.ymax / 100.0 * height,
        }
    }
}

/// A detected comic panel
#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    /// Positional id, `panel-<array index>`
    pub id: String,
    /// 1-based reading order as reported by the detector
    pub order: u32,
    pub bounds: PanelBox,
    pub description: Option<String>,
}

impl Panel {
    pub fn new(position: usize, order: u32, bounds: PanelBox) -> Self {
        Self {
            id: panel_id(position),
            order,
            bounds,
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

pub fn panel_id(position: usize) -> String {
    format!("panel-{position}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_box_passes() {
        assert!(PanelBox::new(0.0, 0.0, 100.0, 100.0).validate().is_ok());
        assert!(PanelBox::new(10.0, 20.0, 10.0, 20.0).validate().is_ok());
    }

    #[test]
    fn inverted_box_is_malformed() {
        let err = PanelBox::new(60.0, 0.0, 40.0, 50.0).validate().unwrap_err();
        assert!(matches!(err, Error::MalformedPanelBox { xmin, xmax, .. } if xmin == 60.0 && xmax == 40.0));
    }

    #[test]
    fn out_of_range_box_is_malformed() {
        assert!(PanelBox::new(-1.0, 0.0, 50.0, 50.0).validate().is_err());
        assert!(PanelBox::new(0.0, 0.0, 50.0, 100.5).validate().is_err());
        assert!(PanelBox::new(0.0, f32::NAN, 50.0, 50.0).validate().is_err());
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-3,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn pixels_scale_with_rendered_size() {
        let rect = PanelBox::new(10.0, 20.0, 60.0, 70.0).to_pixels(800.0, 1200.0);
        assert_close(rect.left, 80.0);
        assert_close(rect.top, 240.0);
        assert_close(rect.width(), 400.0);
        assert_close(rect.height(), 600.0);
        let (cx, cy) = rect.center();
        assert_close(cx, 280.0);
        assert_close(cy, 540.0);
    }

    #[test]
    fn panel_ids_are_positional() {
        let panel = Panel::new(2, 7, PanelBox::default()).with_description("splash");
        assert_eq!(panel.id, "panel-2");
        assert_eq!(panel.order, 7);
        assert_eq!(panel.description.as_deref(), Some("splash"));
    }
}
