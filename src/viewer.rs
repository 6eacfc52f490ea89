//! Reader state: page cursor, manual zoom/pan and smart panel viewing
//!
//! Everything here is plain state with no rendering attached. A front end
//! feeds user input in and reads transforms and labels back out.

use log::{debug, warn};

use crate::comic::Page;
use crate::panels::{
    Command, Effect, NavState, PADDING_FACTOR, Panel, PanelBox, PanelDetector, PanelNavigator,
    Size, Transform, compute_transform_with_padding,
};

/// Shown when detection returned no panels
pub const NO_PANELS_MESSAGE: &str = "Could not detect panels. Switching to full view.";
/// Shown when the detector itself failed
pub const ANALYSIS_FAILED_MESSAGE: &str =
    "Analysis failed. Check your API key or internet connection.";

/// Free zoom and pan over a page image
#[derive(Clone, Debug, PartialEq)]
pub struct ManualViewer {
    scale: f32,
    position: (f32, f32),
    /// Pointer position minus image position when the drag started
    drag_origin: Option<(f32, f32)>,
    image: Option<String>,
}

impl Default for ManualViewer {
    fn default() -> Self {
        Self {
            scale: 1.0,
            position: (0.0, 0.0),
            drag_origin: None,
            image: None,
        }
    }
}

impl ManualViewer {
    pub const MIN_SCALE: f32 = 0.5;
    pub const MAX_SCALE: f32 = 5.0;
    /// Button zoom step
    pub const ZOOM_STEP: f32 = 0.5;
    /// Scale change per wheel delta unit
    pub const WHEEL_RATE: f32 = -0.01;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn position(&self) -> (f32, f32) {
        self.position
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_origin.is_some()
    }

    pub fn zoom_in(&mut self) {
        self.scale = clamp_scale(self.scale + Self::ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.scale = clamp_scale(self.scale - Self::ZOOM_STEP);
    }

    /// Wheel zoom, only while a modifier (ctrl/meta) is held.
    /// Returns whether the event was consumed.
    pub fn wheel(&mut self, delta_y: f32, modifier: bool) -> bool {
        if !modifier {
            return false;
        }
        self.scale = clamp_scale(self.scale + delta_y * Self::WHEEL_RATE);
        true
    }

    pub fn begin_drag(&mut self, x: f32, y: f32) {
        self.drag_origin = Some((x - self.position.0, y - self.position.1));
    }

    pub fn drag_to(&mut self, x: f32, y: f32) {
        if let Some((ox, oy)) = self.drag_origin {
            self.position = (x - ox, y - oy);
        }
    }

    pub fn end_drag(&mut self) {
        self.drag_origin = None;
    }

    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.position = (0.0, 0.0);
        self.drag_origin = None;
    }

    /// Switch to another image; the view resets only if it actually changed
    pub fn set_image(&mut self, data_uri: &str) {
        if self.image.as_deref() != Some(data_uri) {
            self.image = Some(data_uri.to_string());
            self.reset();
        }
    }

    pub fn transform(&self) -> Transform {
        Transform {
            scale: self.scale,
            translate_x: self.position.0,
            translate_y: self.position.1,
        }
    }
}

fn clamp_scale(scale: f32) -> f32 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(ManualViewer::MIN_SCALE, ManualViewer::MAX_SCALE)
}

/// Rectangle for the detection debug overlay
#[derive(Clone, Debug, PartialEq)]
pub struct DebugBox {
    pub bounds: PanelBox,
    pub order: u32,
    pub focused: bool,
}

/// Guided panel-by-panel view of one page
#[derive(Clone, Debug)]
pub struct SmartViewer {
    panels: Vec<Panel>,
    nav: PanelNavigator,
    loading: bool,
    error: Option<String>,
    show_debug: bool,
    padding: f32,
}

impl Default for SmartViewer {
    fn default() -> Self {
        Self::with_padding(PADDING_FACTOR)
    }
}

impl SmartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Viewer whose focused panels fill `padding` of the viewport
    pub fn with_padding(padding: f32) -> Self {
        Self {
            panels: Vec::new(),
            nav: PanelNavigator::default(),
            loading: false,
            error: None,
            show_debug: false,
            padding,
        }
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn state(&self) -> NavState {
        self.nav.state()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn show_debug(&self) -> bool {
        self.show_debug
    }

    /// Forget the previous page's panels
    pub fn reset(&mut self) {
        self.panels.clear();
        self.error = None;
        self.loading = false;
        let _ = self.nav.apply(Command::SetPanelCount(0));
    }

    pub fn begin_analysis(&mut self) {
        self.reset();
        self.loading = true;
    }

    pub fn finish_analysis(&mut self, panels: Vec<Panel>) {
        self.loading = false;
        if panels.is_empty() {
            warn!("No panels detected");
            self.error = Some(NO_PANELS_MESSAGE.to_string());
        } else {
            debug!("Detected {} panels", panels.len());
            self.error = None;
        }
        let _ = self.nav.apply(Command::SetPanelCount(panels.len()));
        self.panels = panels;
    }

    pub fn fail_analysis(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.panels.clear();
        self.error = Some(message.into());
        let _ = self.nav.apply(Command::SetPanelCount(0));
    }

    /// Run a detector synchronously over a page
    pub fn analyze(&mut self, detector: &dyn PanelDetector, page: &Page) {
        self.begin_analysis();
        let panels = detector.analyze(&page.data);
        self.finish_analysis(panels);
    }

    pub fn next(&mut self) -> Vec<Effect> {
        self.nav.next()
    }

    pub fn prev(&mut self) -> Vec<Effect> {
        self.nav.prev()
    }

    pub fn full_page(&mut self) -> Vec<Effect> {
        self.nav.jump_to_full_page()
    }

    pub fn toggle_debug(&mut self) {
        self.show_debug = !self.show_debug;
    }

    pub fn current_panel(&self) -> Option<&Panel> {
        self.nav.current().and_then(|i| self.panels.get(i))
    }

    /// Transform for the focused panel, identity on the full page
    pub fn transform(&self, rendered: Size, viewport: Size) -> Transform {
        compute_transform_with_padding(
            self.current_panel().map(|p| &p.bounds),
            rendered,
            viewport,
            self.padding,
        )
    }

    pub fn status_label(&self) -> String {
        if self.loading {
            return "Analyzing...".to_string();
        }
        if self.error.is_some() {
            return "Error".to_string();
        }
        match self.nav.current() {
            Some(i) => format!("Panel {}/{}", i + 1, self.panels.len()),
            None => "Full Page".to_string(),
        }
    }

    pub fn current_description(&self) -> Option<&str> {
        self.current_panel().and_then(|p| p.description.as_deref())
    }

    /// Overlay rectangles; empty unless debug display is on
    pub fn debug_boxes(&self) -> Vec<DebugBox> {
        if !self.show_debug {
            return Vec::new();
        }
        let focused = self.nav.current();
        self.panels
            .iter()
            .enumerate()
            .map(|(i, panel)| DebugBox {
                bounds: panel.bounds,
                order: panel.order,
                focused: focused == Some(i),
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReaderMode {
    #[default]
    Manual,
    Smart,
}

/// Page cursor over an extracted comic plus both viewers.
///
/// With a detector attached and auto-analysis on, every page shown in smart
/// mode is analyzed as soon as it becomes current.
pub struct Reader {
    pages: Vec<Page>,
    current: usize,
    mode: ReaderMode,
    manual: ManualViewer,
    smart: SmartViewer,
    detector: Option<Box<dyn PanelDetector>>,
    auto_analyze: bool,
}

impl std::fmt::Debug for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("pages", &self.pages.len())
            .field("current", &self.current)
            .field("mode", &self.mode)
            .field("manual", &self.manual)
            .field("smart", &self.smart)
            .field("detector", &self.detector.is_some())
            .field("auto_analyze", &self.auto_analyze)
            .finish()
    }
}

impl Reader {
    pub fn new(pages: Vec<Page>) -> Self {
        Self::with_viewers(pages, SmartViewer::default())
    }

    pub fn with_viewers(pages: Vec<Page>, smart: SmartViewer) -> Self {
        let mut reader = Self {
            pages,
            current: 0,
            mode: ReaderMode::default(),
            manual: ManualViewer::default(),
            smart,
            detector: None,
            auto_analyze: false,
        };
        reader.on_page_changed();
        reader
    }

    /// Attach the detector used for automatic analysis
    #[must_use]
    pub fn with_detector(mut self, detector: Box<dyn PanelDetector>, auto_analyze: bool) -> Self {
        self.detector = Some(detector);
        self.auto_analyze = auto_analyze;
        self.maybe_auto_analyze();
        self
    }

    pub fn auto_analyze(&self) -> bool {
        self.auto_analyze
    }

    pub fn set_auto_analyze(&mut self, enabled: bool) {
        self.auto_analyze = enabled;
        self.maybe_auto_analyze();
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.current)
    }

    pub fn mode(&self) -> ReaderMode {
        self.mode
    }

    /// Switch reading mode; entering smart mode may trigger analysis
    pub fn set_mode(&mut self, mode: ReaderMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.maybe_auto_analyze();
    }

    pub fn manual(&self) -> &ManualViewer {
        &self.manual
    }

    pub fn manual_mut(&mut self) -> &mut ManualViewer {
        &mut self.manual
    }

    pub fn smart(&self) -> &SmartViewer {
        &self.smart
    }

    pub fn smart_mut(&mut self) -> &mut SmartViewer {
        &mut self.smart
    }

    /// Returns false on the last page
    pub fn next_page(&mut self) -> bool {
        if self.current + 1 < self.pages.len() {
            self.current += 1;
            self.on_page_changed();
            true
        } else {
            false
        }
    }

    /// Returns false on the first page
    pub fn prev_page(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            self.on_page_changed();
            true
        } else {
            false
        }
    }

    /// Jump to a page, clamped to the valid range
    pub fn go_to(&mut self, index: usize) {
        let target = index.min(self.pages.len().saturating_sub(1));
        if target != self.current {
            self.current = target;
            self.on_page_changed();
        }
    }

    pub fn page_label(&self) -> String {
        if self.pages.is_empty() {
            return "Page 0 of 0".to_string();
        }
        format!("Page {} of {}", self.current + 1, self.pages.len())
    }

    /// Analyze the current page with `detector`, when there is one
    pub fn analyze_current(&mut self, detector: &dyn PanelDetector) {
        if let Some(page) = self.pages.get(self.current) {
            self.smart.analyze(detector, page);
        }
    }

    fn on_page_changed(&mut self) {
        self.smart.reset();
        if let Some(page) = self.pages.get(self.current) {
            self.manual.set_image(&page.data);
        }
        self.maybe_auto_analyze();
    }

    /// Analyze the current page with the attached detector when in smart
    /// mode with auto-analysis on and no result for this page yet
    fn maybe_auto_analyze(&mut self) {
        if self.mode != ReaderMode::Smart || !self.auto_analyze {
            return;
        }
        if !self.smart.panels().is_empty() || self.smart.error().is_some() {
            return;
        }
        if let (Some(detector), Some(page)) =
            (self.detector.as_deref(), self.pages.get(self.current))
        {
            debug!("Auto-analyzing page {}", self.current + 1);
            self.smart.analyze(detector, page);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn page(index: usize) -> Page {
        Page {
            index,
            file_name: format!("p{index}.png"),
            data: format!("data:image/png;base64,{index}"),
        }
    }

    fn three_panels() -> Vec<Panel> {
        vec![
            Panel::new(0, 1, PanelBox::new(0.0, 0.0, 100.0, 50.0)).with_description("Opening shot"),
            Panel::new(1, 2, PanelBox::new(0.0, 50.0, 50.0, 100.0)),
            Panel::new(2, 3, PanelBox::new(50.0, 50.0, 100.0, 100.0)),
        ]
    }

    #[test]
    fn manual_zoom_is_clamped() {
        let mut viewer = ManualViewer::new();
        for _ in 0..20 {
            viewer.zoom_in();
        }
        assert_eq!(viewer.scale(), 5.0);
        for _ in 0..20 {
            viewer.zoom_out();
        }
        assert_eq!(viewer.scale(), 0.5);
    }

    #[test]
    fn wheel_needs_modifier() {
        let mut viewer = ManualViewer::new();
        assert!(!viewer.wheel(-100.0, false));
        assert_eq!(viewer.scale(), 1.0);

        assert!(viewer.wheel(-100.0, true));
        assert!((viewer.scale() - 2.0).abs() < 1e-5);
        viewer.wheel(10_000.0, true);
        assert_eq!(viewer.scale(), 0.5);
    }

    #[test]
    fn drag_moves_relative_to_grab_point() {
        let mut viewer = ManualViewer::new();
        viewer.begin_drag(100.0, 100.0);
        viewer.drag_to(130.0, 90.0);
        assert_eq!(viewer.position(), (30.0, -10.0));
        viewer.end_drag();

        // moves without an active drag are ignored
        viewer.drag_to(500.0, 500.0);
        assert_eq!(viewer.position(), (30.0, -10.0));

        viewer.begin_drag(0.0, 0.0);
        viewer.drag_to(10.0, 10.0);
        assert_eq!(viewer.position(), (40.0, 0.0));
    }

    #[test]
    fn new_image_resets_manual_view() {
        let mut viewer = ManualViewer::new();
        viewer.set_image("data:a");
        viewer.zoom_in();
        viewer.set_image("data:a");
        assert_eq!(viewer.scale(), 1.5);
        viewer.set_image("data:b");
        assert_eq!(viewer.scale(), 1.0);
        assert!(viewer.transform().is_identity());
    }

    #[test]
    fn smart_viewer_walks_panels() {
        let mut viewer = SmartViewer::new();
        viewer.begin_analysis();
        assert_eq!(viewer.status_label(), "Analyzing...");

        viewer.finish_analysis(three_panels());
        assert_eq!(viewer.status_label(), "Full Page");
        assert_eq!(viewer.next(), vec![Effect::FocusPanel(0)]);
        assert_eq!(viewer.status_label(), "Panel 1/3");
        assert_eq!(viewer.current_description(), Some("Opening shot"));

        let _ = viewer.next();
        let _ = viewer.next();
        assert_eq!(viewer.status_label(), "Panel 3/3");
        assert_eq!(viewer.next(), vec![Effect::ShowFullPage]);
        assert_eq!(viewer.current_description(), None);
    }

    #[test]
    fn empty_detection_falls_back_to_full_page() {
        let mut viewer = SmartViewer::new();
        viewer.finish_analysis(Vec::new());
        assert_eq!(viewer.error(), Some(NO_PANELS_MESSAGE));
        assert_eq!(viewer.status_label(), "Error");
        assert!(viewer.next().is_empty());
        let t = viewer.transform(Size::new(100.0, 100.0), Size::new(100.0, 100.0));
        assert!(t.is_identity());
    }

    #[test]
    fn failure_clears_loading() {
        let mut viewer = SmartViewer::new();
        viewer.begin_analysis();
        viewer.fail_analysis(ANALYSIS_FAILED_MESSAGE);
        assert!(!viewer.is_loading());
        assert_eq!(viewer.error(), Some(ANALYSIS_FAILED_MESSAGE));
    }

    #[test]
    fn transform_follows_focus() {
        let mut viewer = SmartViewer::new();
        viewer.finish_analysis(three_panels());
        let rendered = Size::new(1000.0, 1000.0);
        let viewport = Size::new(800.0, 600.0);

        assert!(viewer.transform(rendered, viewport).is_identity());
        let _ = viewer.next();
        let t = viewer.transform(rendered, viewport);
        assert!(t.scale > 0.0);
        assert!(t.translate_y > 0.0);

        let _ = viewer.full_page();
        assert!(viewer.transform(rendered, viewport).is_identity());
    }

    #[test]
    fn debug_boxes_only_when_enabled() {
        let mut viewer = SmartViewer::new();
        viewer.finish_analysis(three_panels());
        assert!(viewer.debug_boxes().is_empty());

        viewer.toggle_debug();
        let _ = viewer.next();
        let boxes = viewer.debug_boxes();
        assert_eq!(boxes.len(), 3);
        assert!(boxes[0].focused);
        assert_eq!(boxes[2].order, 3);
    }

    #[test]
    fn detector_runs_over_current_page() {
        let mut reader = Reader::new(vec![page(0), page(1)]);
        reader.set_mode(ReaderMode::Smart);
        reader.analyze_current(&|_: &str| three_panels());
        assert_eq!(reader.smart().panels().len(), 3);
    }

    #[test]
    fn page_navigation_does_not_wrap() {
        let mut reader = Reader::new((0..3).map(page).collect());
        assert_eq!(reader.page_label(), "Page 1 of 3");
        assert!(!reader.prev_page());
        assert!(reader.next_page());
        assert!(reader.next_page());
        assert!(!reader.next_page());
        assert_eq!(reader.page_label(), "Page 3 of 3");
    }

    #[test]
    fn go_to_clamps() {
        let mut reader = Reader::new((0..5).map(page).collect());
        reader.go_to(99);
        assert_eq!(reader.current_index(), 4);
        reader.go_to(2);
        assert_eq!(reader.current_page().map(|p| p.index), Some(2));

        let mut empty = Reader::new(Vec::new());
        empty.go_to(3);
        assert_eq!(empty.current_index(), 0);
        assert_eq!(empty.page_label(), "Page 0 of 0");
    }

    fn counting_detector(calls: Rc<Cell<usize>>) -> Box<dyn PanelDetector> {
        Box::new(move |_: &str| {
            calls.set(calls.get() + 1);
            three_panels()
        })
    }

    #[test]
    fn smart_mode_analyzes_each_page_automatically() {
        let calls = Rc::new(Cell::new(0));
        let mut reader = Reader::new((0..3).map(page).collect())
            .with_detector(counting_detector(calls.clone()), true);
        assert_eq!(calls.get(), 0);

        reader.set_mode(ReaderMode::Smart);
        assert_eq!(calls.get(), 1);
        assert_eq!(reader.smart().panels().len(), 3);

        reader.next_page();
        assert_eq!(calls.get(), 2);
        assert_eq!(reader.smart().panels().len(), 3);
        assert_eq!(reader.smart().state(), NavState::FullPage);

        reader.set_mode(ReaderMode::Smart);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn auto_analysis_off_or_manual_mode_never_detects() {
        let calls = Rc::new(Cell::new(0));
        let mut reader = Reader::new((0..2).map(page).collect())
            .with_detector(counting_detector(calls.clone()), false);
        reader.set_mode(ReaderMode::Smart);
        reader.next_page();
        assert_eq!(calls.get(), 0);
        assert!(reader.smart().panels().is_empty());

        reader.set_mode(ReaderMode::Manual);
        reader.set_auto_analyze(true);
        reader.prev_page();
        assert_eq!(calls.get(), 0);

        reader.set_mode(ReaderMode::Smart);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn page_change_resets_both_viewers() {
        let mut reader = Reader::new((0..2).map(page).collect());
        reader.smart_mut().finish_analysis(three_panels());
        let _ = reader.smart_mut().next();
        reader.manual_mut().zoom_in();

        reader.next_page();
        assert!(reader.smart().panels().is_empty());
        assert_eq!(reader.smart().state(), NavState::FullPage);
        assert_eq!(reader.manual().scale(), 1.0);
    }
}
