use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::comic::{Comic, Page};
use crate::extract::{SourceHint, extract_pages_with_hint};

const APP_NAME: &str = "comikrat";
const INDEX_FILENAME: &str = "library.json";
const BLOB_DIR: &str = "blobs";
const BLOB_EXTENSION: &str = "blob";

#[derive(Debug, Default, Serialize, Deserialize)]
struct LibraryIndex {
    #[serde(default)]
    comics: Vec<Comic>,
}

/// Imported comics: a JSON index plus one raw blob file per comic.
///
/// An ephemeral library keeps blobs in memory and never touches disk.
#[derive(Debug)]
pub struct ComicLibrary {
    root: Option<PathBuf>,
    index: LibraryIndex,
    memory_blobs: HashMap<String, Vec<u8>>,
}

/// Default library location under the platform data directory
pub fn default_library_dir() -> Result<PathBuf> {
    Ok(dirs::data_dir()
        .context("Could not determine data directory")?
        .join(APP_NAME))
}

/// Library directory from an optional override, relative paths resolved
/// against the current directory
pub fn resolve_library_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    match override_dir {
        Some(dir) if dir.is_absolute() => Ok(dir.to_path_buf()),
        Some(dir) => Ok(std::env::current_dir()
            .context("Failed to get current directory")?
            .join(dir)),
        None => default_library_dir(),
    }
}

/// Log file path. Uses `state_dir` where the platform has one, else `cache_dir`.
pub fn resolve_log_path() -> Result<PathBuf> {
    let base = dirs::state_dir()
        .or_else(dirs::cache_dir)
        .context("Could not determine state or cache directory")?;

    let log_dir = base.join(APP_NAME);
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {log_dir:?}"))?;

    Ok(log_dir.join("comikrat.log"))
}

impl ComicLibrary {
    pub fn ephemeral() -> Self {
        Self {
            root: None,
            index: LibraryIndex::default(),
            memory_blobs: HashMap::new(),
        }
    }

    /// Open (creating if needed) the library stored in `dir`
    pub fn open(dir: &Path) -> Result<Self> {
        let blob_dir = dir.join(BLOB_DIR);
        fs::create_dir_all(&blob_dir)
            .with_context(|| format!("Failed to create library directory: {blob_dir:?}"))?;

        let index_path = dir.join(INDEX_FILENAME);
        let index = if index_path.exists() {
            let content = fs::read_to_string(&index_path)
                .with_context(|| format!("Failed to read {index_path:?}"))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {index_path:?}"))?
        } else {
            LibraryIndex::default()
        };
        debug!(
            "Opened library at {dir:?} with {} comics",
            index.comics.len()
        );

        Ok(Self {
            root: Some(dir.to_path_buf()),
            index,
            memory_blobs: HashMap::new(),
        })
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn len(&self) -> usize {
        self.index.comics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.comics.is_empty()
    }

    /// Import a comic file. Returns the stored record and its pages.
    pub fn import(&mut self, path: &Path) -> Result<(Comic, Vec<Page>)> {
        let blob = fs::read(path).with_context(|| format!("Failed to read {path:?}"))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        self.import_bytes(&name, blob)
    }

    /// Extract `blob`, then store it under a fresh id. Nothing is stored when
    /// extraction fails.
    pub fn import_bytes(&mut self, source_name: &str, blob: Vec<u8>) -> Result<(Comic, Vec<Page>)> {
        let hint = SourceHint::new().with_file_name(source_name);
        let pages = extract_pages_with_hint(&blob, &hint)
            .with_context(|| format!("Failed to extract pages from {source_name}"))?;

        let cover = pages.first().map(|p| p.data.clone());
        let comic = Comic::new(source_name, blob, cover);
        let record = self.add(comic)?;
        info!(
            "Imported {source_name} as {} ({} pages)",
            record.id,
            pages.len()
        );
        Ok((record, pages))
    }

    /// Store a comic with its blob; returns the index record (blob not loaded)
    pub fn add(&mut self, mut comic: Comic) -> Result<Comic> {
        if self.get(&comic.id).is_some() {
            bail!("Comic {} already exists", comic.id);
        }

        let blob = std::mem::take(&mut comic.blob);
        match self.blob_path(&comic.id) {
            Some(path) => fs::write(&path, &blob)
                .with_context(|| format!("Failed to write comic data to {path:?}"))?,
            None => {
                self.memory_blobs.insert(comic.id.clone(), blob);
            }
        }

        self.index.comics.push(comic.clone());
        if let Err(e) = self.save() {
            self.remove_blob(&comic.id);
            self.index.comics.retain(|c| c.id != comic.id);
            return Err(e);
        }
        Ok(comic)
    }

    /// All comics, newest first
    pub fn list(&self) -> Vec<&Comic> {
        let mut comics: Vec<&Comic> = self.index.comics.iter().collect();
        comics.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        comics
    }

    pub fn get(&self, id: &str) -> Option<&Comic> {
        self.index.comics.iter().find(|c| c.id == id)
    }

    /// Look a comic up by full id or unambiguous id prefix
    pub fn find(&self, key: &str) -> Option<&Comic> {
        if let Some(comic) = self.get(key) {
            return Some(comic);
        }
        if key.is_empty() {
            return None;
        }
        let mut matches = self.index.comics.iter().filter(|c| c.id.starts_with(key));
        match (matches.next(), matches.next()) {
            (Some(comic), None) => Some(comic),
            _ => None,
        }
    }

    pub fn load_blob(&self, id: &str) -> Result<Vec<u8>> {
        if self.get(id).is_none() {
            bail!("No comic with id {id}");
        }
        match self.blob_path(id) {
            Some(path) => {
                fs::read(&path).with_context(|| format!("Failed to read comic data {path:?}"))
            }
            None => self
                .memory_blobs
                .get(id)
                .cloned()
                .ok_or_else(|| anyhow!("Comic data for {id} is missing")),
        }
    }

    /// Comic record with its blob filled in
    pub fn load(&self, id: &str) -> Result<Comic> {
        let mut comic = self
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("No comic with id {id}"))?;
        comic.blob = self.load_blob(id)?;
        Ok(comic)
    }

    /// Re-extract a stored comic's pages
    pub fn pages(&self, id: &str) -> Result<Vec<Page>> {
        let comic = self.load(id)?;
        let hint = SourceHint::new().with_file_name(comic.source_name.clone());
        Ok(extract_pages_with_hint(&comic.blob, &hint)?)
    }

    /// Remove a comic and its blob. Returns false if the id was unknown.
    ///
    /// The index is written before the blob goes, so a failed save leaves the
    /// comic listed and loadable.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let Some(position) = self.index.comics.iter().position(|c| c.id == id) else {
            return Ok(false);
        };
        let comic = self.index.comics.remove(position);
        if let Err(e) = self.save() {
            self.index.comics.insert(position, comic);
            return Err(e);
        }
        self.remove_blob(id);
        info!("Deleted comic {id}");
        Ok(true)
    }

    pub fn save(&self) -> Result<()> {
        let Some(root) = &self.root else {
            return Ok(());
        };
        let path = root.join(INDEX_FILENAME);
        let content = serde_json::to_string_pretty(&self.index)?;
        fs::write(&path, content).with_context(|| format!("Failed to save {path:?}"))?;
        Ok(())
    }

    fn blob_path(&self, id: &str) -> Option<PathBuf> {
        self.root
            .as_ref()
            .map(|root| root.join(BLOB_DIR).join(format!("{id}.{BLOB_EXTENSION}")))
    }

    fn remove_blob(&mut self, id: &str) {
        match self.blob_path(id) {
            Some(path) => {
                if let Err(e) = fs::remove_file(&path) {
                    warn!("Failed to remove comic data {path:?}: {e}");
                }
            }
            None => {
                self.memory_blobs.remove(id);
            }
        }
    }
}
