//! View state for the TUI: active tab, search query, cursor and overlays.
//!
//! Playback itself lives in the session; `App` only decides what is shown and
//! where the cursor sits. Indices always refer to positions in the catalog.

use crate::catalog::{CatalogStore, Tab, Track, TrackId};

/// The main application view model.
#[derive(Debug, Default)]
pub struct App {
    pub tab: Tab,
    pub selected: usize,

    pub search_mode: bool,
    pub search_query: String,

    /// Cursor jumps to the playing track when it changes.
    pub follow_playback: bool,
    pub metadata_window: bool,

    /// A catalog fetch is in flight.
    pub loading: bool,
    /// One-line message shown in the footer (fetch failures, empty results).
    pub status: Option<String>,
}

impl App {
    pub fn new(tab: Tab) -> Self {
        Self {
            tab,
            follow_playback: true,
            ..Self::default()
        }
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    /// Catalog indices visible under the active tab and search query, in catalog order.
    pub fn display_indices(&self, catalog: &CatalogStore) -> Vec<usize> {
        catalog
            .filtered(self.tab, &self.search_query)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn selected_track<'a>(&self, catalog: &'a CatalogStore) -> Option<&'a Track> {
        if self.display_indices(catalog).contains(&self.selected) {
            catalog.get(self.selected)
        } else {
            None
        }
    }

    /// Next visible index after `current`, wrapping to the first.
    pub fn next_in_view_from(&self, catalog: &CatalogStore, current: usize) -> Option<usize> {
        let display = self.display_indices(catalog);
        if display.is_empty() {
            return None;
        }

        match display.iter().position(|&i| i == current) {
            Some(p) => Some(display[(p + 1) % display.len()]),
            None => Some(display[0]),
        }
    }

    /// Previous visible index before `current`, wrapping to the last.
    pub fn prev_in_view_from(&self, catalog: &CatalogStore, current: usize) -> Option<usize> {
        let display = self.display_indices(catalog);
        if display.is_empty() {
            return None;
        }

        match display.iter().position(|&i| i == current) {
            Some(0) | None => Some(display[display.len() - 1]),
            Some(p) => Some(display[p - 1]),
        }
    }

    pub fn next(&mut self, catalog: &CatalogStore) {
        if let Some(next) = self.next_in_view_from(catalog, self.selected) {
            self.selected = next;
        }
    }

    pub fn prev(&mut self, catalog: &CatalogStore) {
        if let Some(prev) = self.prev_in_view_from(catalog, self.selected) {
            self.selected = prev;
        }
    }

    pub fn set_selected(&mut self, catalog: &CatalogStore, idx: usize) {
        self.selected = idx;
        self.ensure_selected_visible(catalog);
    }

    /// Flip between the two tabs. The caller refetches the catalog.
    pub fn switch_tab(&mut self, catalog: &CatalogStore) {
        self.tab = self.tab.toggled();
        self.ensure_selected_visible(catalog);
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    /// Move the cursor onto the playing track if following and it is visible.
    pub fn follow(&mut self, catalog: &CatalogStore, playing: Option<&TrackId>) {
        if !self.follow_playback {
            return;
        }
        let Some(idx) = playing.and_then(|id| catalog.index_of(id)) else {
            return;
        };
        if self.display_indices(catalog).contains(&idx) {
            self.selected = idx;
        }
    }

    pub fn enter_search_mode(&mut self, catalog: &CatalogStore) {
        self.search_mode = true;
        self.follow_playback_off();
        self.ensure_selected_visible(catalog);
    }

    pub fn exit_search_mode(&mut self) {
        self.search_mode = false;
    }

    pub fn clear_search(&mut self, catalog: &CatalogStore) {
        self.search_query.clear();
        self.search_mode = false;
        self.ensure_selected_visible(catalog);
    }

    pub fn push_search_char(&mut self, catalog: &CatalogStore, c: char) {
        self.search_query.push(c);
        self.ensure_selected_visible(catalog);
    }

    pub fn pop_search_char(&mut self, catalog: &CatalogStore) {
        self.search_query.pop();
        self.ensure_selected_visible(catalog);
    }

    /// Keep `selected` inside the current view, falling back to the first visible row.
    pub fn ensure_selected_visible(&mut self, catalog: &CatalogStore) {
        let display = self.display_indices(catalog);
        match display.first() {
            None => self.selected = 0,
            Some(&first) if !display.contains(&self.selected) => self.selected = first,
            Some(_) => {}
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }
}
