use std::env;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::audio::RodioOutput;
use crate::catalog::{self, Tab};
use crate::config::TabSetting;
use crate::media::MediaClient;
use crate::mpris::ControlCmd;
use crate::probe::{DurationProbe, LoftyProber};
use crate::session::PlaybackSession;

mod event_loop;
mod logging;
mod mpris_sync;
mod refresh;
mod settings;

use refresh::CatalogRefresher;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (mut settings, config_warning) = settings::load_settings();

    // A positional argument overrides the configured catalog location.
    if let Some(location) = env::args().nth(1) {
        settings.catalog.source = location;
    }

    match logging::init(&settings.logging) {
        Ok(path) => info!(path = %path.display(), "spindle starting"),
        Err(e) => eprintln!("spindle: logging disabled: {e}"),
    }
    if let Some(message) = config_warning {
        warn!("{message}");
    }

    let client = MediaClient::new(Duration::from_secs(settings.catalog.request_timeout_secs))?;
    let source = catalog::source_for(&settings.catalog.source, &settings.catalog, &client);
    let prober: Arc<dyn DurationProbe> = Arc::new(LoftyProber::new(client.clone()));
    let mut refresher = CatalogRefresher::new(source, prober);
    info!(source = %refresher.describe(), "catalog source");

    let output = RodioOutput::new(client, &settings.audio);
    let mut session = PlaybackSession::new(output, settings.audio.initial_volume);
    let snapshots = session.subscribe();

    let mut app = App::new(match settings.ui.start_tab {
        TabSetting::ForYou => Tab::ForYou,
        TabSetting::TopTracks => Tab::TopTracks,
    });

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);

    refresher.start(&mut session, &mut app);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::new(snapshots);
        let mut cx = event_loop::Context {
            settings: &settings,
            app: &mut app,
            session: &mut session,
            refresher: &mut refresher,
            mpris: &mpris,
        };
        event_loop::run(&mut terminal, &mut cx, &control_rx, &mut state)
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    session.shutdown(Duration::from_millis(settings.audio.quit_fade_out_ms));
    info!("spindle stopped");

    run_result
}
