use std::time::Duration;

use tracing::{debug, trace};

use crate::error::ProbeError;

use super::filter::{matches_query, matches_tab};
use super::model::{Tab, Track, TrackDuration, TrackId};

/// Identifies one catalog refresh. Results tagged with an older value are stale.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct CatalogGeneration(u64);

/// Holds the full track list. Replaced wholesale on every refresh.
#[derive(Debug, Default)]
pub struct CatalogStore {
    tracks: Vec<Track>,
    generation: CatalogGeneration,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new refresh; anything still in flight for the previous one becomes stale.
    pub fn begin_refresh(&mut self) -> CatalogGeneration {
        self.generation = CatalogGeneration(self.generation.0 + 1);
        self.generation
    }

    pub fn generation(&self) -> CatalogGeneration {
        self.generation
    }

    /// Atomically replace the track set. Returns `false` (and leaves the store
    /// untouched) when `generation` has been superseded.
    pub fn replace(&mut self, generation: CatalogGeneration, tracks: Vec<Track>) -> bool {
        if generation != self.generation {
            debug!(?generation, current = ?self.generation, "dropping stale catalog");
            return false;
        }
        self.tracks = tracks;
        true
    }

    /// Record a probe result. Each track's duration is filled at most once and
    /// results for a replaced catalog are dropped. Returns the updated track.
    pub fn apply_duration(
        &mut self,
        generation: CatalogGeneration,
        id: &TrackId,
        result: Result<Duration, ProbeError>,
    ) -> Option<&Track> {
        if generation != self.generation {
            trace!(%id, "dropping stale probe result");
            return None;
        }
        let track = self.tracks.iter_mut().find(|t| &t.id == id)?;
        if track.duration != TrackDuration::Pending {
            return None;
        }
        track.duration = match result {
            Ok(d) => TrackDuration::Known(d),
            Err(e) => {
                debug!(%id, error = %e, "duration probe failed");
                TrackDuration::Unknown
            }
        };
        Some(track)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn index_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    pub fn find(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| &t.id == id)
    }

    /// Lazy projection of the tracks visible under `tab` and `query`.
    pub fn filtered<'a>(&'a self, tab: Tab, query: &'a str) -> FilteredView<'a> {
        FilteredView {
            inner: self.tracks.iter().enumerate(),
            tab,
            query,
        }
    }
}

/// Read-only iterator over `(catalog index, track)` pairs passing the active filters.
pub struct FilteredView<'a> {
    inner: std::iter::Enumerate<std::slice::Iter<'a, Track>>,
    tab: Tab,
    query: &'a str,
}

impl<'a> Iterator for FilteredView<'a> {
    type Item = (usize, &'a Track);

    fn next(&mut self) -> Option<Self::Item> {
        let (tab, query) = (self.tab, self.query);
        self.inner
            .by_ref()
            .find(|(_, t)| matches_tab(t, tab) && matches_query(t, query))
    }
}
