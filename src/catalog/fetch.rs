use std::path::{Path, PathBuf};

use lofty::file::TaggedFileExt;
use lofty::tag::Accessor;
use serde::Deserialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::CatalogSettings;
use crate::error::CatalogError;
use crate::media::MediaClient;

use super::model::{Track, TrackDuration, TrackId};

/// Something that can produce the full track list.
///
/// Durations are left `Pending`; they are filled in later by the prober.
pub trait CatalogSource: Send + Sync {
    fn fetch(&self) -> Result<Vec<Track>, CatalogError>;

    /// Short human-readable origin, shown in the status line.
    fn describe(&self) -> String;
}

/// Pick a source for `location`: an `http(s)://` endpoint or a local directory.
pub fn source_for(
    location: &str,
    settings: &CatalogSettings,
    client: &MediaClient,
) -> Box<dyn CatalogSource> {
    if crate::media::is_remote(location) {
        Box::new(HttpCatalog::new(location.to_string(), client.clone()))
    } else {
        Box::new(DirCatalog::new(PathBuf::from(location), settings.clone()))
    }
}

#[derive(Deserialize)]
struct CatalogResponse {
    data: Vec<SongRecord>,
}

#[derive(Deserialize)]
struct SongRecord {
    id: TrackId,
    name: String,
    #[serde(default)]
    artist: String,
    url: String,
    #[serde(default)]
    cover: Option<String>,
    #[serde(default)]
    accent: Option<String>,
    #[serde(default)]
    top_track: bool,
}

impl From<SongRecord> for Track {
    fn from(r: SongRecord) -> Self {
        Track {
            id: r.id,
            name: r.name,
            artist: r.artist,
            media_url: r.url,
            cover_ref: r.cover,
            accent_color: r.accent,
            is_top_track: r.top_track,
            duration: TrackDuration::Pending,
        }
    }
}

fn parse_catalog(body: CatalogResponse) -> Vec<Track> {
    body.data.into_iter().map(Track::from).collect()
}

/// Catalog served as JSON over HTTP (`{ "data": [ ... ] }`).
pub struct HttpCatalog {
    url: String,
    client: MediaClient,
}

impl HttpCatalog {
    pub fn new(url: String, client: MediaClient) -> Self {
        Self { url, client }
    }
}

impl CatalogSource for HttpCatalog {
    fn fetch(&self) -> Result<Vec<Track>, CatalogError> {
        debug!(url = %self.url, "fetching catalog");
        let body: CatalogResponse = self
            .client
            .http()
            .get(&self.url)
            .send()?
            .error_for_status()?
            .json()?;
        let tracks = parse_catalog(body);
        info!(count = tracks.len(), "catalog fetched");
        Ok(tracks)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Catalog built by scanning a local directory for audio files.
pub struct DirCatalog {
    dir: PathBuf,
    settings: CatalogSettings,
}

impl DirCatalog {
    pub fn new(dir: PathBuf, settings: CatalogSettings) -> Self {
        Self { dir, settings }
    }
}

impl CatalogSource for DirCatalog {
    fn fetch(&self) -> Result<Vec<Track>, CatalogError> {
        if !self.dir.is_dir() {
            return Err(CatalogError::MissingDirectory(self.dir.display().to_string()));
        }
        let tracks = scan(&self.dir, &self.settings);
        info!(count = tracks.len(), dir = %self.dir.display(), "directory scanned");
        Ok(tracks)
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

fn is_audio_file(path: &Path, settings: &CatalogSettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn scan(dir: &Path, settings: &CatalogSettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !path.is_file()
            || (!settings.include_hidden && is_hidden(path))
            || !is_audio_file(path, settings)
        {
            continue;
        }

        let mut name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        let mut artist = String::new();

        // Only tags here; the playable length comes from the prober like any other source.
        if let Ok(tagged) = lofty::read_from_path(path) {
            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                if let Some(v) = tag.title().filter(|v| !v.trim().is_empty()) {
                    name = v.trim().to_string();
                }
                if let Some(v) = tag.artist().filter(|v| !v.trim().is_empty()) {
                    artist = v.trim().to_string();
                }
            }
        }

        let location = path.to_string_lossy().into_owned();
        tracks.push(Track {
            id: TrackId(location.clone()),
            name,
            artist,
            media_url: location,
            cover_ref: None,
            accent_color: None,
            is_top_track: false,
            duration: TrackDuration::Pending,
        });
    }

    tracks.sort_by(|a, b| a.display().to_lowercase().cmp(&b.display().to_lowercase()));
    tracks
}
