use comikrat::panels::{
    Effect, JsonFileDetector, NavState, PanelDetector, Size, compute_transform,
    parse_panel_response,
};
use comikrat::test_utils::build_zip;
use comikrat::viewer::NO_PANELS_MESSAGE;
use comikrat::{Reader, ReaderMode, extract_pages};

const RESPONSE: &str = r#"{"panels": [
    {"order": 1, "ymin": 0, "xmin": 0, "ymax": 50, "xmax": 50, "description": "Hero arrives"},
    {"order": 2, "ymin": 0, "xmin": 50, "ymax": 50, "xmax": 100},
    {"order": 3, "ymin": 50, "xmin": 0, "ymax": 100, "xmax": 100}
]}"#;

fn reader_with_pages(count: usize) -> Reader {
    let entries: Vec<(String, Vec<u8>)> = (1..=count)
        .map(|i| (format!("{i}.png"), vec![i as u8]))
        .collect();
    let borrowed: Vec<(&str, &[u8])> = entries
        .iter()
        .map(|(n, d)| (n.as_str(), d.as_slice()))
        .collect();
    Reader::new(extract_pages(&build_zip(&borrowed)).unwrap())
}

/// Full walk of a page: every panel in order, then back to the full page
#[test]
fn test_smart_reading_cycle() {
    let mut reader = reader_with_pages(2);
    reader.set_mode(ReaderMode::Smart);
    reader.analyze_current(&|_: &str| parse_panel_response(RESPONSE));

    let rendered = Size::new(1000.0, 1000.0);
    let viewport = Size::new(800.0, 600.0);
    let smart = reader.smart_mut();

    assert_eq!(smart.next(), vec![Effect::FocusPanel(0)]);
    let first = smart.transform(rendered, viewport);
    assert!((first.scale - 1.02).abs() < 1e-3);
    assert!((first.translate_x - 255.0).abs() < 1e-2);
    assert_eq!(smart.current_description(), Some("Hero arrives"));

    let _ = smart.next();
    assert_eq!(smart.status_label(), "Panel 2/3");
    let _ = smart.next();
    assert_eq!(smart.next(), vec![Effect::ShowFullPage]);
    assert!(smart.transform(rendered, viewport).is_identity());
}

/// Turning the page drops the old page's panels
#[test]
fn test_page_turn_resets_panels() {
    let mut reader = reader_with_pages(3);
    reader.analyze_current(&|_: &str| parse_panel_response(RESPONSE));
    let _ = reader.smart_mut().next();

    assert!(reader.next_page());
    assert_eq!(reader.page_label(), "Page 2 of 3");
    assert_eq!(reader.smart().state(), NavState::FullPage);
    assert!(reader.smart().panels().is_empty());
}

/// A detector that finds nothing leaves the reader on the full page
#[test]
fn test_undetectable_page() {
    let mut reader = reader_with_pages(1);
    reader.analyze_current(&|_: &str| parse_panel_response("garbage"));
    assert_eq!(reader.smart().error(), Some(NO_PANELS_MESSAGE));
    assert!(reader.smart_mut().next().is_empty());
}

/// Saved responses on disk drive the same flow
#[test]
fn test_json_file_detector() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("panels.json");
    std::fs::write(&path, RESPONSE).unwrap();

    let detector = JsonFileDetector::new(&path);
    let panels = detector.analyze("data:image/png;base64,AA==");
    assert_eq!(panels.len(), 3);
    let t = compute_transform(
        Some(&panels[2].bounds),
        Size::new(1000.0, 1000.0),
        Size::new(800.0, 600.0),
    );
    // wide bottom strip: width-limited, 800/1000 * 0.85
    assert!((t.scale - 0.68).abs() < 1e-3);
    assert!(t.translate_x.abs() < 1e-3);
    assert!(t.translate_y < 0.0);
}
