use comikrat::data_uri::DataUri;
use comikrat::extract::{ExtractionService, SourceHint, extract_pages, extract_pages_with_hint};
use comikrat::test_utils::{build_zip, zip_with_oversized_entry};
use comikrat::{Error, extract_file};

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Pages come back in natural order with indices matching their position
#[test]
fn test_cbz_pages_in_reading_order() {
    let blob = build_zip(&[
        ("Issue 1/page10.png", png(2, 2).as_slice()),
        ("Issue 1/page2.png", &png(2, 2)),
        ("Issue 1/page1.png", &png(2, 2)),
        ("Issue 1/ComicInfo.xml", b"<ComicInfo/>"),
    ]);

    let pages = extract_pages(&blob).unwrap();
    let names: Vec<&str> = pages.iter().map(|p| p.file_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Issue 1/page1.png", "Issue 1/page2.png", "Issue 1/page10.png"]
    );
    for (i, page) in pages.iter().enumerate() {
        assert_eq!(page.index, i);
    }
}

/// Decoded page payloads are the original image bytes
#[test]
fn test_page_payload_is_loadable_image() {
    let original = png(7, 5);
    let blob = build_zip(&[("cover.png", original.as_slice())]);

    let pages = extract_pages(&blob).unwrap();
    let bytes = DataUri::parse(&pages[0].data).unwrap().decode().unwrap();
    assert_eq!(bytes, original);
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (7, 5));
}

/// Extracting the same blob twice yields the same pages
#[test]
fn test_extraction_is_deterministic() {
    let blob = build_zip(&[("b.jpg", b"b".as_slice()), ("a.jpg", b"a"), ("c.gif", b"c")]);
    assert_eq!(extract_pages(&blob).unwrap(), extract_pages(&blob).unwrap());
}

/// An archive with only non-image entries fails as empty, not as a bad format
#[test]
fn test_archive_without_pages() {
    let blob = build_zip(&[("readme.txt", b"hi".as_slice()), ("art/", b"")]);
    let err = extract_pages(&blob).unwrap_err();
    assert!(matches!(err, Error::EmptyArchive));
    assert!(err.is_extraction_failure());
}

/// A renamed text file is an unsupported format
#[test]
fn test_garbage_cbz() {
    let hint = SourceHint::new().with_file_name("fake.cbz");
    let err = extract_pages_with_hint(b"just some text", &hint).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat { .. }));
}

/// Files on disk are read and extracted using their name as a hint
#[test]
fn test_extract_file_from_disk() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("volume.cdz");
    std::fs::write(&path, build_zip(&[("01.webp", b"RIFF".as_slice())])).unwrap();

    let pages = extract_file(&path).unwrap();
    assert_eq!(pages.len(), 1);
    assert!(pages[0].data.starts_with("data:image/webp;base64,"));

    assert!(matches!(
        extract_file(&tmp.path().join("missing.cbz")),
        Err(Error::Io(_))
    ));
}

/// Background workers answer every submission with its own id
#[test]
fn test_service_tags_responses() {
    let mut service = ExtractionService::with_workers(2);
    let good = service.submit(
        build_zip(&[("1.png", b"x".as_slice())]),
        SourceHint::new().with_file_name("good.cbz"),
    );
    let bad = service.submit(b"nope".to_vec(), SourceHint::new());
    assert_eq!(service.latest_request(), Some(bad));

    let mut seen = Vec::new();
    for _ in 0..2 {
        let response = service
            .recv_timeout(std::time::Duration::from_secs(10))
            .expect("worker did not answer");
        seen.push((response.id(), response.into_result().is_ok()));
    }
    seen.sort();
    assert_eq!(seen, vec![(good, true), (bad, false)]);
}

/// An entry lying about its size fails the request instead of killing a worker
#[test]
fn test_service_survives_forged_entry_size() {
    let mut service = ExtractionService::with_workers(1);
    let forged = service.submit(zip_with_oversized_entry(), SourceHint::new());
    let response = service.wait_for(forged).expect("worker did not answer");
    assert!(matches!(
        response.into_result(),
        Err(Error::UnsupportedFormat { .. })
    ));

    // the single worker is still alive
    let next = service.submit(build_zip(&[("1.png", b"x".as_slice())]), SourceHint::new());
    let response = service
        .recv_timeout(std::time::Duration::from_secs(10))
        .expect("worker did not answer");
    assert_eq!(response.id(), next);
    assert!(response.into_result().is_ok());
}
