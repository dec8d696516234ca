use std::time::Duration;

use super::filter::{matches_query, matches_tab};
use super::*;
use crate::error::ProbeError;

fn t(id: &str, name: &str, artist: &str, top: bool) -> Track {
    Track {
        id: TrackId::new(id),
        name: name.into(),
        artist: artist.into(),
        media_url: format!("https://cdn.test/{id}.mp3"),
        cover_ref: None,
        accent_color: None,
        is_top_track: top,
        duration: TrackDuration::Pending,
    }
}

fn loaded_store() -> (CatalogStore, CatalogGeneration) {
    let mut store = CatalogStore::new();
    let generation = store.begin_refresh();
    assert!(store.replace(
        generation,
        vec![
            t("1", "Colors", "William King", true),
            t("2", "Bloom", "Ava Stone", false),
            t("3", "Kingdom", "Rae", true),
        ],
    ));
    (store, generation)
}

#[test]
fn matches_query_is_case_insensitive_on_name_or_artist() {
    let track = t("1", "Colors", "William King", false);
    assert!(matches_query(&track, "col"));
    assert!(matches_query(&track, "KING"));
    assert!(matches_query(&track, ""));
    assert!(matches_query(&track, "   "));
    assert!(!matches_query(&track, "bloom"));
}

#[test]
fn matches_tab_limits_top_tracks() {
    assert!(matches_tab(&t("1", "a", "b", false), Tab::ForYou));
    assert!(!matches_tab(&t("1", "a", "b", false), Tab::TopTracks));
    assert!(matches_tab(&t("1", "a", "b", true), Tab::TopTracks));
}

#[test]
fn filtered_view_applies_tab_and_query_and_keeps_catalog_indices() {
    let (store, _) = loaded_store();

    let all: Vec<usize> = store.filtered(Tab::ForYou, "").map(|(i, _)| i).collect();
    assert_eq!(all, vec![0, 1, 2]);

    let top: Vec<usize> = store.filtered(Tab::TopTracks, "").map(|(i, _)| i).collect();
    assert_eq!(top, vec![0, 2]);

    let king: Vec<usize> = store.filtered(Tab::ForYou, "king").map(|(i, _)| i).collect();
    assert_eq!(king, vec![0, 2]);

    let top_bloom = store.filtered(Tab::TopTracks, "bloom").count();
    assert_eq!(top_bloom, 0);
}

#[test]
fn replace_with_stale_generation_is_dropped() {
    let mut store = CatalogStore::new();
    let old = store.begin_refresh();
    let new = store.begin_refresh();

    assert!(!store.replace(old, vec![t("1", "Old", "", false)]));
    assert!(store.is_empty());

    assert!(store.replace(new, vec![t("2", "New", "", false)]));
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(0).unwrap().name, "New");
}

#[test]
fn apply_duration_fills_each_track_once() {
    let (mut store, generation) = loaded_store();
    let id = TrackId::new("2");

    let updated = store.apply_duration(generation, &id, Ok(Duration::from_secs(200)));
    assert_eq!(
        updated.map(|t| t.duration),
        Some(TrackDuration::Known(Duration::from_secs(200)))
    );

    // A second result for the same track is ignored.
    assert!(store
        .apply_duration(generation, &id, Ok(Duration::from_secs(5)))
        .is_none());
    assert_eq!(
        store.find(&id).unwrap().duration,
        TrackDuration::Known(Duration::from_secs(200))
    );
}

#[test]
fn failed_probe_marks_duration_unknown() {
    let (mut store, generation) = loaded_store();
    let id = TrackId::new("1");
    let err = ProbeError::MediaUnreadable("garbage".into());
    store.apply_duration(generation, &id, Err(err));
    assert_eq!(store.find(&id).unwrap().duration, TrackDuration::Unknown);
    assert!(store.find(&id).unwrap().duration.as_secs_f64().is_nan());
}

#[test]
fn probe_results_for_a_replaced_catalog_are_dropped() {
    let (mut store, old) = loaded_store();
    let new = store.begin_refresh();
    assert!(store.replace(new, vec![t("1", "Colors", "William King", true)]));

    let id = TrackId::new("1");
    assert!(store
        .apply_duration(old, &id, Ok(Duration::from_secs(10)))
        .is_none());
    assert_eq!(store.find(&id).unwrap().duration, TrackDuration::Pending);
}

#[test]
fn cover_url_joins_base_and_passes_absolute_urls() {
    let mut track = t("1", "Colors", "William King", false);
    assert_eq!(track.cover_url("https://cdn.test/assets/"), None);

    track.cover_ref = Some("abc".into());
    assert_eq!(
        track.cover_url("https://cdn.test/assets/").as_deref(),
        Some("https://cdn.test/assets/abc")
    );

    track.cover_ref = Some("https://img.test/x.png".into());
    assert_eq!(
        track.cover_url("https://cdn.test/assets/").as_deref(),
        Some("https://img.test/x.png")
    );
}

#[test]
fn index_of_and_tab_toggle() {
    let (store, _) = loaded_store();
    assert_eq!(store.index_of(&TrackId::new("3")), Some(2));
    assert_eq!(store.index_of(&TrackId::new("9")), None);
    assert_eq!(Tab::ForYou.toggled(), Tab::TopTracks);
    assert_eq!(Tab::TopTracks.toggled().title(), "For You");
}
