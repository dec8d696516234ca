use super::*;
use crate::catalog::{CatalogStore, Tab, Track, TrackDuration, TrackId};

fn t(id: &str, name: &str, artist: &str, top: bool) -> Track {
    Track {
        id: TrackId::new(id),
        name: name.into(),
        artist: artist.into(),
        media_url: format!("https://media.test/{id}.mp3"),
        cover_ref: None,
        accent_color: None,
        is_top_track: top,
        duration: TrackDuration::Pending,
    }
}

fn catalog(tracks: Vec<Track>) -> CatalogStore {
    let mut store = CatalogStore::new();
    let generation = store.begin_refresh();
    store.replace(generation, tracks);
    store
}

fn sample() -> CatalogStore {
    catalog(vec![
        t("1", "Alpha", "Northern", true),
        t("2", "Beta", "Southern", false),
        t("3", "Gamma", "Northern", true),
        t("4", "Delta", "Eastern", false),
    ])
}

#[test]
fn display_indices_follow_tab() {
    let store = sample();
    let mut app = App::new(Tab::ForYou);
    assert_eq!(app.display_indices(&store), vec![0, 1, 2, 3]);

    app.switch_tab(&store);
    assert_eq!(app.tab, Tab::TopTracks);
    assert_eq!(app.display_indices(&store), vec![0, 2]);
}

#[test]
fn search_matches_name_or_artist_case_insensitively() {
    let store = sample();
    let mut app = App::new(Tab::ForYou);

    for c in "NORTH".chars() {
        app.push_search_char(&store, c);
    }
    assert_eq!(app.display_indices(&store), vec![0, 2]);

    app.clear_search(&store);
    app.push_search_char(&store, 'e');
    app.push_search_char(&store, 'l');
    assert_eq!(app.display_indices(&store), vec![3]);
}

#[test]
fn blank_query_shows_everything() {
    let store = sample();
    let mut app = App::new(Tab::ForYou);
    app.search_query = "   ".into();
    assert_eq!(app.display_indices(&store).len(), 4);
}

#[test]
fn search_and_tab_combine() {
    let store = sample();
    let mut app = App::new(Tab::TopTracks);
    app.search_query = "gam".into();
    assert_eq!(app.display_indices(&store), vec![2]);

    app.search_query = "beta".into();
    assert!(app.display_indices(&store).is_empty());
}

#[test]
fn cursor_wraps_within_view() {
    let store = sample();
    let mut app = App::new(Tab::TopTracks);
    app.set_selected(&store, 0);

    app.next(&store);
    assert_eq!(app.selected, 2);
    app.next(&store);
    assert_eq!(app.selected, 0);
    app.prev(&store);
    assert_eq!(app.selected, 2);
}

#[test]
fn hidden_selection_snaps_to_first_visible() {
    let store = sample();
    let mut app = App::new(Tab::ForYou);
    app.set_selected(&store, 1);

    app.switch_tab(&store);
    assert_eq!(app.selected, 0);

    let empty = CatalogStore::new();
    app.ensure_selected_visible(&empty);
    assert_eq!(app.selected, 0);
    assert!(app.selected_track(&empty).is_none());
}

#[test]
fn in_view_helpers_handle_off_view_cursor() {
    let store = sample();
    let app = App::new(Tab::TopTracks);

    assert_eq!(app.next_in_view_from(&store, 1), Some(0));
    assert_eq!(app.prev_in_view_from(&store, 1), Some(2));
    assert_eq!(app.next_in_view_from(&CatalogStore::new(), 0), None);
}

#[test]
fn follow_moves_cursor_only_when_enabled_and_visible() {
    let store = sample();
    let mut app = App::new(Tab::TopTracks);

    app.follow(&store, Some(&TrackId::new("3")));
    assert_eq!(app.selected, 2);

    // Beta is not a top track.
    app.follow(&store, Some(&TrackId::new("2")));
    assert_eq!(app.selected, 2);

    app.enter_search_mode(&store);
    assert!(!app.follow_playback);
    app.follow(&store, Some(&TrackId::new("1")));
    assert_eq!(app.selected, 2);
}

#[test]
fn selected_track_resolves_through_catalog() {
    let store = sample();
    let mut app = App::new(Tab::ForYou);
    app.set_selected(&store, 3);
    assert_eq!(app.selected_track(&store).map(|t| t.name.as_str()), Some("Delta"));
}
