//! Viewport transform that centers and fills the screen with one panel
//!
//! The transform is applied to an image that is already centered in the
//! viewport and scaled around its own center, so the translation is the
//! panel-to-image center delta multiplied by the scale.

use super::PanelBox;

/// Fraction of the viewport a focused panel fills, leaving a margin
pub const PADDING_FACTOR: f32 = 0.85;
/// Smallest accepted padding factor
pub const MIN_PADDING: f32 = 0.85;
/// Largest accepted padding factor
pub const MAX_PADDING: f32 = 0.95;
/// Hard ceiling on panel zoom to bound pixelation
pub const MAX_SCALE: f32 = 5.0;

/// Width and height in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True once both dimensions are known, positive and finite
    pub fn is_measured(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// Scale plus translation, in viewport pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub scale: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl Transform {
    /// Full page: no zoom, no offset
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    fn is_finite(&self) -> bool {
        self.scale.is_finite() && self.translate_x.is_finite() && self.translate_y.is_finite()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Transform for `panel` using the default [`PADDING_FACTOR`]
pub fn compute_transform(panel: Option<&PanelBox>, rendered: Size, viewport: Size) -> Transform {
    compute_transform_with_padding(panel, rendered, viewport, PADDING_FACTOR)
}

/// Transform that brings `panel` to the viewport center at the largest
/// scale that fits it, times `padding`, capped at [`MAX_SCALE`].
///
/// Returns [`Transform::IDENTITY`] for the full-page state, for unmeasured
/// image or viewport sizes, and for degenerate boxes (`max <= min`). Never
/// returns a non-finite value.
pub fn compute_transform_with_padding(
    panel: Option<&PanelBox>,
    rendered: Size,
    viewport: Size,
    padding: f32,
) -> Transform {
    let Some(panel) = panel else {
        return Transform::IDENTITY;
    };
    if !rendered.is_measured() || !viewport.is_measured() {
        return Transform::IDENTITY;
    }

    let rect = panel.to_pixels(rendered.width, rendered.height);
    let panel_width = rect.width();
    let panel_height = rect.height();
    // also rejects NaN
    if !(panel_width > 0.0 && panel_height > 0.0) {
        return Transform::IDENTITY;
    }

    let scale_x = viewport.width / panel_width;
    let scale_y = viewport.height / panel_height;
    let scale = (scale_x.min(scale_y) * clamp_padding(padding)).min(MAX_SCALE);

    let (panel_cx, panel_cy) = rect.center();
    let (image_cx, image_cy) = rendered.center();

    let transform = Transform {
        scale,
        translate_x: (image_cx - panel_cx) * scale,
        translate_y: (image_cy - panel_cy) * scale,
    };

    if transform.is_finite() {
        transform
    } else {
        Transform::IDENTITY
    }
}

/// Clamp padding to the accepted range, handling NaN/Inf
pub fn clamp_padding(padding: f32) -> f32 {
    if padding.is_finite() {
        padding.clamp(MIN_PADDING, MAX_PADDING)
    } else {
        PADDING_FACTOR
    }
}
