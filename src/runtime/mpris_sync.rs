use crate::catalog::Track;
use crate::mpris::MprisHandle;
use crate::session::PlaybackState;

pub fn update_mpris(
    mpris: &MprisHandle,
    snapshot: &PlaybackState,
    current: Option<&Track>,
    cover_base_url: &str,
) {
    mpris.set_track_metadata(current, snapshot.duration_secs, cover_base_url);
    mpris.set_playback(snapshot);
    mpris.notify();
}
