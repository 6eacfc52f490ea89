use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::{error, info};
use simplelog::{Config, LevelFilter, WriteLogger};

use comikrat::data_uri::DataUri;
use comikrat::export::export_pages;
use comikrat::library::{ComicLibrary, resolve_library_dir, resolve_log_path};
use comikrat::panels::{
    JsonFileDetector, NavState, PanelNavigator, Size, compute_transform_with_padding,
};
use comikrat::{Page, Reader, ReaderMode, SmartViewer, extract_file, panic_handler, settings};

#[derive(Parser)]
#[command(name = "comikrat", version, about = "Comic archive reader with panel navigation")]
struct Cli {
    /// Log level (off, error, warn, info, debug, trace); defaults to the config value
    #[arg(long, global = true)]
    log_level: Option<LevelFilter>,

    /// Library directory; defaults to the config value or the data directory
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a .cbz, .cdz, .zip or .pdf file into the library
    Import { file: PathBuf },
    /// List imported comics, newest first
    List,
    /// Remove a comic from the library
    Delete { id: String },
    /// Print the pages of a file or imported comic
    Pages { source: String },
    /// Write the page images of a file or imported comic to a directory
    Export { source: String, dir: PathBuf },
    /// Walk the panels of a saved detection response and print each transform
    Panels {
        response: PathBuf,
        /// Displayed image size, e.g. 1000x1500
        #[arg(long, value_parser = parse_size, default_value = "1000x1500")]
        rendered: Size,
        /// Viewport size, e.g. 1280x800
        #[arg(long, value_parser = parse_size, default_value = "1280x800")]
        viewport: Size,
    },
    /// Page through a comic in smart mode, detecting panels from a saved response
    Read {
        source: String,
        /// Saved detection response used for every page
        #[arg(long)]
        panels: PathBuf,
    },
    /// Show or change persistent settings
    Config {
        /// Default log level
        #[arg(long)]
        set_log_level: Option<LevelFilter>,
        /// Panel padding factor, clamped to 0.85..=0.95
        #[arg(long)]
        set_panel_padding: Option<f32>,
        /// Analyze each page as it is shown in smart mode
        #[arg(long)]
        set_auto_analyze: Option<bool>,
        /// Library directory
        #[arg(long)]
        set_library_dir: Option<PathBuf>,
    },
}

fn parse_size(s: &str) -> std::result::Result<Size, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let width: f32 = w.trim().parse().map_err(|e| format!("bad width {w:?}: {e}"))?;
    let height: f32 = h.trim().parse().map_err(|e| format!("bad height {h:?}: {e}"))?;
    Ok(Size::new(width, height))
}

fn main() {
    panic_handler::initialize_panic_handler();
    let cli = Cli::parse();

    // the logger must exist before settings load so their warnings are kept
    if let Err(e) = init_logging() {
        eprintln!("Logging disabled: {e:#}");
    }
    log::set_max_level(cli.log_level.unwrap_or(LevelFilter::Warn));
    settings::load_settings();
    log::set_max_level(resolve_log_level(cli.log_level, &settings::get_log_level()));
    info!("Starting comikrat {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli) {
        error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Install the file logger; the effective level is set afterwards through
/// `log::set_max_level`
fn init_logging() -> Result<()> {
    let path = resolve_log_path()
        .or_else(|_| std::env::current_dir().map(|d| d.join("comikrat.log")))?;
    let file = File::create(&path).with_context(|| format!("Failed to create {path:?}"))?;
    WriteLogger::init(LevelFilter::Trace, Config::default(), file)?;
    Ok(())
}

/// Command line level first, then the configured one, then `Info`
fn resolve_log_level(cli: Option<LevelFilter>, configured: &str) -> LevelFilter {
    cli.unwrap_or_else(|| configured.trim().parse().unwrap_or(LevelFilter::Info))
}

fn run(cli: Cli) -> Result<()> {
    let library_dir = cli.library.or_else(settings::get_library_dir);
    match cli.command {
        Commands::Import { file } => {
            let mut library = open_library(library_dir.as_deref())?;
            let (comic, pages) = library.import(&file)?;
            println!("Imported {} ({} pages) as {}", comic.name, pages.len(), comic.id);
        }
        Commands::List => {
            let library = open_library(library_dir.as_deref())?;
            if library.is_empty() {
                println!("Library is empty");
            }
            for comic in library.list() {
                println!(
                    "{}  {}  {}",
                    comic.id,
                    comic.timestamp.format("%Y-%m-%d %H:%M"),
                    comic.name
                );
            }
        }
        Commands::Delete { id } => {
            let mut library = open_library(library_dir.as_deref())?;
            let Some(comic) = library.find(&id).cloned() else {
                bail!("No comic matches {id}");
            };
            library.delete(&comic.id)?;
            println!("Deleted {}", comic.name);
        }
        Commands::Pages { source } => {
            let pages = load_pages(&source, library_dir.as_deref())?;
            for page in &pages {
                let uri = DataUri::parse(&page.data)?;
                let bytes = uri.decode()?.len();
                println!("{:>4}  {}  {}  {bytes}", page.index, page.file_name, uri.mime);
            }
        }
        Commands::Export { source, dir } => {
            let pages = load_pages(&source, library_dir.as_deref())?;
            let written = export_pages(&pages, &dir)?;
            println!("Wrote {} pages to {}", written.len(), dir.display());
        }
        Commands::Panels {
            response,
            rendered,
            viewport,
        } => print_panel_walk(&response, rendered, viewport)?,
        Commands::Read { source, panels } => {
            let pages = load_pages(&source, library_dir.as_deref())?;
            read_in_smart_mode(pages, panels)?;
        }
        Commands::Config {
            set_log_level,
            set_panel_padding,
            set_auto_analyze,
            set_library_dir,
        } => {
            if let Some(level) = set_log_level {
                settings::set_log_level(&level.to_string().to_lowercase());
            }
            if let Some(padding) = set_panel_padding {
                settings::set_panel_padding(padding);
            }
            if let Some(enabled) = set_auto_analyze {
                settings::set_auto_analyze(enabled);
            }
            if let Some(dir) = set_library_dir {
                settings::set_library_dir(Some(dir));
            }
            print_settings();
        }
    }
    Ok(())
}

fn print_settings() {
    let current = settings::current();
    let library = current
        .library_dir
        .as_ref()
        .map_or_else(|| "(default)".to_string(), |d| d.display().to_string());
    println!("log_level      {}", current.log_level);
    println!("panel_padding  {:.2}", current.panel_padding);
    println!("auto_analyze   {}", current.auto_analyze);
    println!("library_dir    {library}");
}

/// Show every page in smart mode, reporting what the reader ends up with
fn read_in_smart_mode(pages: Vec<Page>, response: PathBuf) -> Result<()> {
    if pages.is_empty() {
        bail!("Nothing to read");
    }
    let auto = settings::is_auto_analyze();
    let detector = JsonFileDetector::new(response);
    let mut reader = Reader::with_viewers(
        pages,
        SmartViewer::with_padding(settings::get_panel_padding()),
    )
    .with_detector(Box::new(detector.clone()), auto);
    reader.set_mode(ReaderMode::Smart);

    loop {
        if !auto {
            reader.analyze_current(&detector);
        }
        println!("{}  {}", reader.page_label(), reader.smart().status_label());
        if !reader.next_page() {
            break;
        }
    }
    Ok(())
}

fn open_library(dir: Option<&Path>) -> Result<ComicLibrary> {
    let dir = resolve_library_dir(dir)?;
    ComicLibrary::open(&dir)
}

/// Pages of a file on disk, or of an imported comic when no such file exists
fn load_pages(source: &str, library_dir: Option<&Path>) -> Result<Vec<Page>> {
    let path = Path::new(source);
    if path.is_file() {
        return extract_file(path).with_context(|| format!("Failed to extract {source}"));
    }
    let library = open_library(library_dir)?;
    let Some(comic) = library.find(source) else {
        bail!("{source} is neither a file nor an imported comic");
    };
    library.pages(&comic.id)
}

fn print_panel_walk(response: &Path, rendered: Size, viewport: Size) -> Result<()> {
    let panels = JsonFileDetector::new(response)
        .load()
        .with_context(|| format!("Failed to load panels from {response:?}"))?;
    if panels.is_empty() {
        println!("No panels detected");
        return Ok(());
    }

    let padding = settings::get_panel_padding();
    let mut nav = PanelNavigator::new(panels.len());
    // one full cycle: each panel, then back to the full page
    for _ in 0..=panels.len() {
        let _ = nav.next();
        let bounds = nav.current().and_then(|i| panels.get(i)).map(|p| &p.bounds);
        let t = compute_transform_with_padding(bounds, rendered, viewport, padding);
        let label = match nav.state() {
            NavState::FullPage => "Full Page".to_string(),
            NavState::OnPanel(i) => format!("Panel {}/{}", i + 1, panels.len()),
        };
        let description = nav
            .current()
            .and_then(|i| panels[i].description.as_deref())
            .unwrap_or("");
        println!(
            "{label:<12} scale {:.3}  translate ({:.1}, {:.1})  {description}",
            t.scale, t.translate_x, t.translate_y
        );
    }
    Ok(())
}
