use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::AudioOutput;
use crate::config;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::runtime::mpris_sync::update_mpris;
use crate::runtime::refresh::CatalogRefresher;
use crate::session::{Intent, PlaybackSession, PlaybackState, SessionStatus};
use crate::ui::{self, HitAreas};

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Snapshots published by the session since the last iteration.
    pub snapshots: mpsc::Receiver<PlaybackState>,
    /// Clickable regions from the most recent draw.
    pub hits: HitAreas,
}

impl EventLoopState {
    pub fn new(snapshots: mpsc::Receiver<PlaybackState>) -> Self {
        Self {
            snapshots,
            hits: HitAreas::default(),
        }
    }
}

/// Collaborators the loop drives.
pub struct Context<'a, O: AudioOutput> {
    pub settings: &'a config::Settings,
    pub app: &'a mut App,
    pub session: &'a mut PlaybackSession<O>,
    pub refresher: &'a mut CatalogRefresher,
    pub mpris: &'a MprisHandle,
}

/// Main terminal event loop: handles input, drawing, device events, catalog
/// refreshes and MPRIS. Returns `Ok(())` when shutdown is requested.
pub fn run<O: AudioOutput>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    cx: &mut Context<'_, O>,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        cx.session.pump_device_events();
        cx.refresher.drain(cx.session, cx.app);

        // Keep MPRIS and the cursor in step with every published change,
        // including auto-advance and media-key driven ones.
        if state.snapshots.try_iter().last().is_some() {
            let snapshot = cx.session.snapshot();
            cx.app
                .follow(cx.session.catalog(), snapshot.current_track_id.as_ref());
            update_mpris(
                cx.mpris,
                snapshot,
                cx.session.current_track(),
                &cx.settings.catalog.cover_base_url,
            );
        }

        let hits = &mut state.hits;
        terminal.draw(|f| {
            *hits = ui::draw(
                f,
                cx.app,
                cx.session.catalog(),
                cx.session.snapshot(),
                cx.session.current_track(),
                cx.settings,
            );
        })?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, cx) {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key_event(key, cx) {
                        break;
                    }
                }
                Event::Mouse(mouse) => handle_mouse_event(mouse, cx, &state.hits),
                _ => {}
            }
        }
    }

    Ok(())
}

/// Start the highlighted track when nothing is loaded, otherwise toggle.
fn play_or_toggle<O: AudioOutput>(cx: &mut Context<'_, O>) {
    if cx.session.snapshot().status == SessionStatus::Idle {
        play_selected(cx);
    } else {
        cx.session.dispatch(Intent::TogglePlayPause);
    }
}

fn play_selected<O: AudioOutput>(cx: &mut Context<'_, O>) {
    let Some(id) = cx
        .app
        .selected_track(cx.session.catalog())
        .map(|t| t.id.clone())
    else {
        return;
    };

    let snapshot = cx.session.snapshot();
    let already_playing = snapshot.is_playing && snapshot.current_track_id.as_ref() == Some(&id);
    cx.app.follow_playback_on();
    if !already_playing {
        cx.session.dispatch(Intent::SelectTrack(id));
    }
}

fn refresh<O: AudioOutput>(cx: &mut Context<'_, O>) {
    cx.refresher.start(cx.session, cx.app);
}

fn handle_control_cmd<O: AudioOutput>(cmd: ControlCmd, cx: &mut Context<'_, O>) -> bool {
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => {
            if cx.session.snapshot().status == SessionStatus::Idle {
                play_selected(cx);
            } else {
                cx.session.dispatch(Intent::Play);
            }
        }
        ControlCmd::Pause | ControlCmd::Stop => cx.session.dispatch(Intent::Pause),
        ControlCmd::PlayPause => play_or_toggle(cx),
        ControlCmd::Next => {
            cx.app.follow_playback_on();
            cx.session.dispatch(Intent::NextTrack);
        }
        ControlCmd::Prev => {
            cx.app.follow_playback_on();
            cx.session.dispatch(Intent::PrevTrack);
        }
    }
    false
}

fn handle_key_event<O: AudioOutput>(key: KeyEvent, cx: &mut Context<'_, O>) -> bool {
    let catalog = cx.session.catalog();

    if cx.app.search_mode {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => cx.app.clear_search(catalog),
            KeyCode::Backspace => cx.app.pop_search_char(catalog),
            KeyCode::Char('j') | KeyCode::Char('n') if ctrl => cx.app.next(catalog),
            KeyCode::Char('k') | KeyCode::Char('p') if ctrl => cx.app.prev(catalog),
            KeyCode::Down => cx.app.next(catalog),
            KeyCode::Up => cx.app.prev(catalog),
            KeyCode::Char(c) if !c.is_control() => cx.app.push_search_char(catalog, c),
            KeyCode::Enter => {
                if !cx.app.display_indices(catalog).is_empty() {
                    cx.app.exit_search_mode();
                    play_selected(cx);
                }
            }
            _ => {}
        }
        return false;
    }

    let scrub = cx.settings.controls.scrub_seconds as f64;
    let volume_step = cx.settings.controls.volume_step;
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('/') => cx.app.enter_search_mode(catalog),
        KeyCode::Esc => cx.app.clear_search(catalog),
        KeyCode::Char('j') | KeyCode::Down => {
            cx.app.follow_playback_off();
            cx.app.next(catalog);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            cx.app.follow_playback_off();
            cx.app.prev(catalog);
        }
        KeyCode::Enter => play_selected(cx),
        KeyCode::Char('p') | KeyCode::Char(' ') => play_or_toggle(cx),
        KeyCode::Char('l') => {
            cx.app.follow_playback_on();
            cx.session.dispatch(Intent::NextTrack);
        }
        KeyCode::Char('h') => {
            cx.app.follow_playback_on();
            cx.session.dispatch(Intent::PrevTrack);
        }
        KeyCode::Char('L') => cx.session.dispatch(Intent::SeekBy(scrub)),
        KeyCode::Char('H') => cx.session.dispatch(Intent::SeekBy(-scrub)),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            cx.session.dispatch(Intent::NudgeVolume(volume_step))
        }
        KeyCode::Char('-') => cx.session.dispatch(Intent::NudgeVolume(-volume_step)),
        KeyCode::Char('m') => cx.session.dispatch(Intent::ToggleMute),
        KeyCode::Tab => {
            cx.app.switch_tab(catalog);
            refresh(cx);
        }
        KeyCode::Char('r') => refresh(cx),
        KeyCode::Char('K') => cx.app.toggle_metadata_window(),
        _ => {}
    }

    false
}

fn handle_mouse_event<O: AudioOutput>(mouse: MouseEvent, cx: &mut Context<'_, O>, hits: &HitAreas) {
    let (column, row) = (mouse.column, mouse.row);

    // Hovering the volume bar arms gesture mode; leaving it disarms.
    let over_volume = hits.over_volume(column, row);
    if over_volume != cx.session.snapshot().is_volume_gesture_active {
        cx.session
            .dispatch(Intent::SetVolumeGestureActive(over_volume));
    }

    let step = cx.settings.controls.gesture_step;
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(idx) = hits.row_at(column, row) {
                cx.app.set_selected(cx.session.catalog(), idx);
                play_selected(cx);
            } else if let Some(ratio) = hits.progress_at(column, row) {
                if let Some(duration) = cx.session.snapshot().duration_secs {
                    cx.session.dispatch(Intent::Seek(ratio * duration));
                }
            } else if let Some(ratio) = hits.volume_at(column, row) {
                cx.session.dispatch(Intent::SetVolume(ratio as f32));
            }
        }
        MouseEventKind::ScrollUp if over_volume => {
            cx.session.dispatch(Intent::VolumeGestureDelta(step))
        }
        MouseEventKind::ScrollDown if over_volume => {
            cx.session.dispatch(Intent::VolumeGestureDelta(-step))
        }
        MouseEventKind::ScrollUp => {
            cx.app.follow_playback_off();
            cx.app.prev(cx.session.catalog());
        }
        MouseEventKind::ScrollDown => {
            cx.app.follow_playback_off();
            cx.app.next(cx.session.catalog());
        }
        _ => {}
    }
}
