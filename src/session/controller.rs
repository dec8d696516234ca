use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::audio::{AudioOutput, DeviceEvent, DeviceEventKind, Generation};
use crate::catalog::{CatalogGeneration, CatalogStore, Track, TrackDuration, TrackId};
use crate::error::{AudioError, PlaybackErrorKind, ProbeError};

use super::state::{PlaybackState, SessionStatus};

/// A user intent, from keys, mouse, or media keys.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    SelectTrack(TrackId),
    TogglePlayPause,
    Play,
    Pause,
    NextTrack,
    PrevTrack,
    Seek(f64),
    SeekBy(f64),
    SetVolume(f32),
    NudgeVolume(f32),
    ToggleMute,
    SetVolumeGestureActive(bool),
    VolumeGestureDelta(f32),
}

/// Owns "what is playing, where, how loud" and keeps it in step with the device.
///
/// The session is the sole holder of the output device. Every track load bumps
/// a [`Generation`]; device events from an older generation are dropped, so a
/// late event for a superseded track can never touch the current state.
pub struct PlaybackSession<O: AudioOutput> {
    output: O,
    catalog: CatalogStore,
    state: PlaybackState,
    current: Option<Track>,
    generation: Generation,
    // Pause requested while the load is still unconfirmed.
    pending_pause: bool,
    subscribers: Vec<Sender<PlaybackState>>,
    published: PlaybackState,
}

impl<O: AudioOutput> PlaybackSession<O> {
    pub fn new(output: O, initial_volume: f32) -> Self {
        let state = PlaybackState::new(initial_volume);
        let mut session = Self {
            output,
            catalog: CatalogStore::new(),
            published: state.clone(),
            state,
            current: None,
            generation: Generation::default(),
            pending_pause: false,
            subscribers: Vec::new(),
        };
        session.push_volume();
        session
    }

    pub fn snapshot(&self) -> &PlaybackState {
        &self.state
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Receive a snapshot now and after every state change.
    pub fn subscribe(&mut self) -> Receiver<PlaybackState> {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(self.state.clone());
        self.subscribers.push(tx);
        rx
    }

    pub fn dispatch(&mut self, intent: Intent) {
        match intent {
            Intent::SelectTrack(id) => self.select_track(&id),
            Intent::TogglePlayPause => self.toggle_play_pause(),
            Intent::Play => {
                if !self.state.is_playing {
                    self.toggle_play_pause();
                }
            }
            Intent::Pause => {
                if self.state.is_playing {
                    self.toggle_play_pause();
                }
            }
            Intent::NextTrack => self.next_track(),
            Intent::PrevTrack => self.prev_track(),
            Intent::Seek(seconds) => self.seek(seconds),
            Intent::SeekBy(delta) => self.seek(self.state.position_secs + delta),
            Intent::SetVolume(volume) => self.set_volume(volume),
            Intent::NudgeVolume(delta) => self.set_volume(self.state.volume + delta),
            Intent::ToggleMute => self.toggle_mute(),
            Intent::SetVolumeGestureActive(active) => self.set_volume_gesture_active(active),
            Intent::VolumeGestureDelta(delta) => self.apply_volume_gesture_delta(delta),
        }
    }

    pub fn select_track(&mut self, id: &TrackId) {
        let Some(track) = self.catalog.find(id).cloned() else {
            warn!(%id, "select: no such track");
            return;
        };
        self.load(track, 0.0);
        self.publish();
    }

    pub fn toggle_play_pause(&mut self) {
        match self.state.status {
            SessionStatus::Idle => {
                debug!("play/pause with nothing selected");
                return;
            }
            SessionStatus::Loading => {
                // Forwarded in issue order; the device applies it after the load.
                self.pending_pause = !self.pending_pause;
                self.state.is_playing = !self.pending_pause;
                let sent = if self.pending_pause {
                    self.output.pause()
                } else {
                    self.output.resume()
                };
                if let Err(e) = sent {
                    self.reject(&e);
                }
            }
            SessionStatus::Playing => {
                self.state.status = SessionStatus::Paused;
                self.state.is_playing = false;
                if let Err(e) = self.output.pause() {
                    self.reject(&e);
                }
            }
            SessionStatus::Paused if self.state.last_error.is_some() => {
                // The device has nothing loaded after a failure; retry from where we were.
                if let Some(track) = self.current.clone() {
                    info!(id = %track.id, "retrying playback");
                    self.load(track, self.state.position_secs);
                }
            }
            SessionStatus::Paused => match self.output.resume() {
                Ok(()) => {
                    self.state.status = SessionStatus::Playing;
                    self.state.is_playing = true;
                }
                Err(e) => self.reject(&e),
            },
        }
        self.publish();
    }

    pub fn next_track(&mut self) {
        self.advance(true);
        self.publish();
    }

    pub fn prev_track(&mut self) {
        self.advance(false);
        self.publish();
    }

    /// Jump to `seconds`, clamped to `[0, duration]`. The position updates
    /// immediately and is reconciled by the next progress event.
    pub fn seek(&mut self, seconds: f64) {
        if self.current.is_none() || seconds.is_nan() {
            return;
        }
        let upper = self.state.duration_secs.unwrap_or(f64::INFINITY);
        let target = seconds.clamp(0.0, upper);
        if !target.is_finite() {
            return;
        }
        if target != seconds {
            debug!(seconds, target, "seek clamped");
        }
        if let Err(e) = self.output.seek(offset(target)) {
            warn!(error = %e, "seek not delivered");
        }
        self.state.position_secs = target;
        self.publish();
    }

    /// Set the intended volume. Zero mutes and keeps the previous level for unmute.
    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        if volume == 0.0 {
            self.state.is_muted = true;
        } else {
            self.state.volume = volume;
            self.state.is_muted = false;
        }
        self.push_volume();
        self.publish();
    }

    pub fn toggle_mute(&mut self) {
        self.state.is_muted = !self.state.is_muted;
        self.push_volume();
        self.publish();
    }

    pub fn set_volume_gesture_active(&mut self, active: bool) {
        self.state.is_volume_gesture_active = active;
        self.publish();
    }

    /// Add `delta` to the stored volume while gesture mode is armed. A muted
    /// session unmutes from its previous level.
    pub fn apply_volume_gesture_delta(&mut self, delta: f32) {
        if !self.state.is_volume_gesture_active {
            trace!(delta, "gesture delta while disarmed");
            return;
        }
        self.set_volume(self.state.volume + delta);
    }

    /// Apply every event the device has queued. Returns how many were read.
    pub fn pump_device_events(&mut self) -> usize {
        let mut count = 0;
        while let Some(event) = self.output.try_recv_event() {
            self.apply_event(event);
            count += 1;
        }
        if count > 0 {
            self.publish();
        }
        count
    }

    pub fn begin_catalog_refresh(&mut self) -> CatalogGeneration {
        self.catalog.begin_refresh()
    }

    /// Swap in a freshly fetched track list. Stale generations are ignored.
    pub fn replace_catalog(&mut self, generation: CatalogGeneration, tracks: Vec<Track>) -> bool {
        if !self.catalog.replace(generation, tracks) {
            return false;
        }
        self.sync_current_duration();
        self.publish();
        true
    }

    pub fn apply_probe(
        &mut self,
        generation: CatalogGeneration,
        id: &TrackId,
        result: Result<Duration, ProbeError>,
    ) {
        if self.catalog.apply_duration(generation, id, result).is_none() {
            return;
        }
        self.sync_current_duration();
        self.publish();
    }

    /// Release the device and detach subscribers.
    pub fn shutdown(mut self, fade_out: Duration) {
        self.output.shutdown(fade_out);
        self.subscribers.clear();
    }

    fn load(&mut self, track: Track, start_secs: f64) {
        self.generation = self.generation.next();
        self.pending_pause = false;

        self.state.current_track_id = Some(track.id.clone());
        self.state.status = SessionStatus::Loading;
        self.state.is_playing = true;
        self.state.position_secs = start_secs;
        self.state.duration_secs = track.duration.known().map(|d| d.as_secs_f64());
        self.state.last_error = None;

        debug!(id = %track.id, generation = ?self.generation, "loading track");
        let sent = self.output.load_and_play(
            &track.media_url,
            offset(start_secs),
            self.generation,
        );
        self.current = Some(track);
        if let Err(e) = sent {
            self.reject(&e);
        }
    }

    fn advance(&mut self, forward: bool) {
        let n = self.catalog.len();
        if n == 0 {
            debug!("navigation on an empty catalog");
            return;
        }

        let current = self
            .state
            .current_track_id
            .as_ref()
            .and_then(|id| self.catalog.index_of(id));
        let index = match (current, forward) {
            (Some(i), true) => (i + 1) % n,
            (Some(i), false) => (i + n - 1) % n,
            (None, true) => 0,
            (None, false) => n - 1,
        };

        if let Some(track) = self.catalog.get(index).cloned() {
            self.load(track, 0.0);
        }
    }

    fn apply_event(&mut self, event: DeviceEvent) {
        if event.generation != self.generation {
            trace!(event = ?event.kind, "dropping event for a superseded track");
            return;
        }

        match event.kind {
            DeviceEventKind::Started => {
                if self.state.status == SessionStatus::Loading {
                    if self.pending_pause {
                        self.state.status = SessionStatus::Paused;
                        self.state.is_playing = false;
                    } else {
                        self.state.status = SessionStatus::Playing;
                        self.state.is_playing = true;
                    }
                    self.pending_pause = false;
                }
            }
            DeviceEventKind::Progress { position, duration } => {
                if let Some(d) = duration {
                    self.state.duration_secs = Some(d.as_secs_f64());
                }
                let mut position = position.as_secs_f64();
                if let Some(d) = self.state.duration_secs {
                    position = position.min(d);
                }
                self.state.position_secs = position;
            }
            DeviceEventKind::Ended => self.on_ended(),
            DeviceEventKind::Error(kind) => {
                warn!(error = kind.label(), "device reported an error");
                self.fail(kind);
            }
        }
    }

    fn on_ended(&mut self) {
        let n = self.catalog.len();
        let current = self
            .state
            .current_track_id
            .as_ref()
            .and_then(|id| self.catalog.index_of(id));

        // A lone track restarts from zero and waits instead of looping.
        if n == 0 || (n == 1 && current == Some(0)) {
            if let Some(track) = self.current.clone() {
                self.load(track, 0.0);
                if self.state.status == SessionStatus::Loading {
                    self.pending_pause = true;
                    self.state.is_playing = false;
                    if let Err(e) = self.output.pause() {
                        self.reject(&e);
                    }
                }
            }
            return;
        }

        self.advance(true);
    }

    fn reject(&mut self, error: &AudioError) {
        warn!(%error, "device refused command");
        self.fail(PlaybackErrorKind::PlaybackRejected);
    }

    fn fail(&mut self, kind: PlaybackErrorKind) {
        self.state.last_error = Some(kind);
        self.state.status = if self.current.is_some() {
            SessionStatus::Paused
        } else {
            SessionStatus::Idle
        };
        self.state.is_playing = false;
        self.pending_pause = false;
    }

    fn sync_current_duration(&mut self) {
        let Some(current) = self.current.as_mut() else {
            return;
        };
        if current.duration == TrackDuration::Pending {
            if let Some(track) = self.catalog.find(&current.id) {
                current.duration = track.duration;
            }
        }
        if self.state.duration_secs.is_none() {
            if let Some(d) = current.duration.known() {
                let d = d.as_secs_f64();
                self.state.duration_secs = Some(d);
                self.state.position_secs = self.state.position_secs.min(d);
            }
        }
    }

    fn push_volume(&mut self) {
        if let Err(e) = self.output.set_volume(self.state.effective_volume()) {
            warn!(error = %e, "volume not delivered");
        }
    }

    fn publish(&mut self) {
        if self.state == self.published {
            return;
        }
        self.published = self.state.clone();
        let snapshot = &self.published;
        self.subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}

/// Device offset for a position in seconds, saturating past what `Duration` holds.
fn offset(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
