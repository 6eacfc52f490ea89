pub mod comic;
pub mod data_uri;
pub mod error;
pub mod export;
pub mod extract;
pub mod library;
pub mod natural_sort;
pub mod panels;
pub mod panic_handler;
pub mod settings;
pub mod viewer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use comic::{Comic, Page};
pub use error::{Error, Result};
pub use extract::{SourceHint, extract_file, extract_pages, extract_pages_with_hint};
pub use library::ComicLibrary;
pub use panels::{Panel, PanelBox, PanelDetector, Size, Transform, compute_transform};
pub use viewer::{ManualViewer, Reader, ReaderMode, SmartViewer};
