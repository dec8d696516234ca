use std::collections::HashMap;
use std::sync::{
    Arc, Mutex,
    mpsc::{self, Receiver, Sender},
};

use async_io::block_on;
use tracing::{debug, warn};
use zbus::{Connection, interface, object_server::InterfaceRef};
use zvariant::{ObjectPath, OwnedValue, Value};

use crate::catalog::Track;
use crate::session::{PlaybackState, SessionStatus};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.spindle";

/// Media-key commands relayed to the event loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
}

#[derive(Debug)]
struct SharedState {
    status: &'static str,
    title: Option<String>,
    artist: Vec<String>,
    art_url: Option<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<ObjectPath<'static>>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            status: "Stopped",
            title: None,
            artist: Vec::new(),
            art_url: None,
            url: None,
            length_micros: None,
            track_id: None,
        }
    }
}

/// MPRIS `PlaybackStatus` for a session snapshot.
fn status_of(state: &PlaybackState) -> &'static str {
    match state.status {
        SessionStatus::Idle => "Stopped",
        SessionStatus::Playing => "Playing",
        SessionStatus::Loading if state.is_playing => "Playing",
        SessionStatus::Loading | SessionStatus::Paused => "Paused",
    }
}

/// Object path for a track id. Path elements only allow `[A-Za-z0-9_]`.
fn track_object_path(id: &str) -> Option<ObjectPath<'static>> {
    let mut element: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if element.is_empty() {
        element.push('_');
    }
    ObjectPath::try_from(format!("{OBJECT_PATH}/track/{element}")).ok()
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    pub fn set_playback(&self, playback: &PlaybackState) {
        if let Ok(mut s) = self.state.lock() {
            s.status = status_of(playback);
        }
    }

    /// Replace the exported metadata. `duration_secs` wins over the catalog's
    /// duration when the device has reported one.
    pub fn set_track_metadata(
        &self,
        track: Option<&Track>,
        duration_secs: Option<f64>,
        cover_base_url: &str,
    ) {
        let Ok(mut s) = self.state.lock() else {
            return;
        };
        let Some(track) = track else {
            let status = s.status;
            *s = SharedState {
                status,
                ..SharedState::default()
            };
            return;
        };

        s.title = Some(track.name.clone());
        s.artist = match track.artist.trim() {
            "" => Vec::new(),
            artist => vec![artist.to_string()],
        };
        s.art_url = track.cover_url(cover_base_url);
        s.url = Some(track.media_url.clone());
        s.length_micros = duration_secs
            .or_else(|| track.duration.known().map(|d| d.as_secs_f64()))
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| (d * 1_000_000.0) as i64);
        s.track_id = track_object_path(track.id.as_str());
    }

    /// Ask the service to emit `PropertiesChanged`.
    pub fn notify(&self) {
        let _ = self.notify.send(());
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "spindle"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["http".to_string(), "https".to_string(), "file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

fn insert_value(map: &mut HashMap<String, OwnedValue>, key: &str, value: Value<'_>) {
    if let Ok(v) = OwnedValue::try_from(value) {
        map.insert(key.to_string(), v);
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        self.state.lock().map_or("Stopped", |s| s.status)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        if let Some(id) = &s.track_id {
            insert_value(&mut map, "mpris:trackid", Value::from(id.clone()));
        }
        insert_value(
            &mut map,
            "xesam:title",
            Value::from(s.title.clone().unwrap_or_default()),
        );
        if !s.artist.is_empty() {
            insert_value(&mut map, "xesam:artist", Value::from(s.artist.clone()));
        }
        if let Some(art) = &s.art_url {
            insert_value(&mut map, "mpris:artUrl", Value::from(art.clone()));
        }
        if let Some(url) = &s.url {
            insert_value(&mut map, "xesam:url", Value::from(url.clone()));
        }
        if let Some(length) = s.length_micros {
            insert_value(&mut map, "mpris:length", Value::from(length));
        }
        map
    }
}

async fn emit_changes(player: &InterfaceRef<PlayerIface>) -> zbus::Result<()> {
    let emitter = player.signal_emitter();
    let iface = player.get().await;
    iface.playback_status_changed(emitter).await?;
    iface.metadata_changed(emitter).await
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify: Receiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    let player = object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;

    debug!(name = BUS_NAME, "mpris service registered");

    // The connection runs its own executor; this thread only relays change notices.
    while notify.recv().is_ok() {
        while notify.try_recv().is_ok() {}
        if let Err(e) = emit_changes(&player).await {
            debug!(error = %e, "mpris change signal failed");
        }
    }
    Ok(())
}

pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        if let Err(e) = block_on(serve(tx, state_for_thread, notify_rx)) {
            warn!(error = %e, "mpris unavailable");
        }
    });

    MprisHandle {
        state,
        notify: notify_tx,
    }
}
