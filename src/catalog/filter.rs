use super::model::{Tab, Track};

/// Whether `track` belongs on `tab`.
pub fn matches_tab(track: &Track, tab: Tab) -> bool {
    match tab {
        Tab::ForYou => true,
        Tab::TopTracks => track.is_top_track,
    }
}

/// Case-insensitive substring match on name or artist. A blank query matches everything.
pub fn matches_query(track: &Track, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    track.name.to_lowercase().contains(&query) || track.artist.to_lowercase().contains(&query)
}
