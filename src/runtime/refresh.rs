use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::{debug, info, warn};

use crate::app::App;
use crate::audio::AudioOutput;
use crate::catalog::{CatalogGeneration, CatalogSource, Track, TrackDuration};
use crate::error::CatalogError;
use crate::probe::{DurationProbe, ProbeBatch, ProbeOutcome};
use crate::session::PlaybackSession;

struct Fetched {
    generation: CatalogGeneration,
    result: Result<Vec<Track>, CatalogError>,
}

/// Runs catalog fetches and duration probes off the event loop.
pub struct CatalogRefresher {
    source: Arc<dyn CatalogSource>,
    prober: Arc<dyn DurationProbe>,
    fetch_tx: Sender<Fetched>,
    fetch_rx: Receiver<Fetched>,
    probe_tx: Sender<ProbeOutcome>,
    probe_rx: Receiver<ProbeOutcome>,
    batch: Option<ProbeBatch>,
}

impl CatalogRefresher {
    pub fn new(source: Box<dyn CatalogSource>, prober: Arc<dyn DurationProbe>) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::channel();
        let (probe_tx, probe_rx) = mpsc::channel();
        Self {
            source: Arc::from(source),
            prober,
            fetch_tx,
            fetch_rx,
            probe_tx,
            probe_rx,
            batch: None,
        }
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    /// Begin a refresh on the session's catalog. Probes still running for the
    /// previous generation are cancelled.
    pub fn start<O: AudioOutput>(&mut self, session: &mut PlaybackSession<O>, app: &mut App) {
        if let Some(batch) = self.batch.take() {
            debug!(generation = ?batch.generation(), "cancelling outstanding probes");
        }
        let generation = session.begin_catalog_refresh();
        app.loading = true;
        app.set_status(format!("loading {}", self.source.describe()));

        let source = Arc::clone(&self.source);
        let tx = self.fetch_tx.clone();
        thread::spawn(move || {
            let result = source.fetch();
            let _ = tx.send(Fetched { generation, result });
        });
    }

    /// Apply whatever finished since the last call. Returns `true` if anything changed.
    pub fn drain<O: AudioOutput>(&mut self, session: &mut PlaybackSession<O>, app: &mut App) -> bool {
        let mut changed = false;

        while let Ok(Fetched { generation, result }) = self.fetch_rx.try_recv() {
            if generation != session.catalog().generation() {
                continue;
            }
            app.loading = false;
            changed = true;

            let tracks = match result {
                Ok(tracks) => tracks,
                Err(e) => {
                    warn!(error = %e, "catalog fetch failed");
                    app.set_status(format!("catalog unavailable: {e}"));
                    continue;
                }
            };

            let targets: Vec<_> = tracks
                .iter()
                .filter(|t| t.duration == TrackDuration::Pending)
                .map(|t| (t.id.clone(), t.media_url.clone()))
                .collect();
            let count = tracks.len();

            if session.replace_catalog(generation, tracks) {
                info!(count, "catalog loaded");
                if count == 0 {
                    app.set_status("catalog is empty");
                } else {
                    app.clear_status();
                }
                app.ensure_selected_visible(session.catalog());
                app.follow(session.catalog(), session.snapshot().current_track_id.as_ref());
                self.batch = Some(ProbeBatch::spawn(
                    generation,
                    targets,
                    Arc::clone(&self.prober),
                    self.probe_tx.clone(),
                ));
            }
        }

        while let Ok(outcome) = self.probe_rx.try_recv() {
            session.apply_probe(outcome.generation, &outcome.id, outcome.result);
            changed = true;
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{DeviceEvent, Generation};
    use crate::catalog::{Tab, TrackId};
    use crate::error::{AudioError, ProbeError};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    struct NullOutput;

    impl AudioOutput for NullOutput {
        fn load_and_play(&mut self, _: &str, _: Duration, _: Generation) -> Result<(), AudioError> {
            Ok(())
        }
        fn pause(&mut self) -> Result<(), AudioError> {
            Ok(())
        }
        fn resume(&mut self) -> Result<(), AudioError> {
            Ok(())
        }
        fn seek(&mut self, _: Duration) -> Result<(), AudioError> {
            Ok(())
        }
        fn set_volume(&mut self, _: f32) -> Result<(), AudioError> {
            Ok(())
        }
        fn try_recv_event(&mut self) -> Option<DeviceEvent> {
            None
        }
        fn shutdown(&mut self, _: Duration) {}
    }

    struct ListSource {
        batches: Mutex<Vec<Result<Vec<Track>, CatalogError>>>,
    }

    impl CatalogSource for ListSource {
        fn fetch(&self) -> Result<Vec<Track>, CatalogError> {
            let mut batches = self.batches.lock().unwrap();
            if batches.is_empty() {
                Ok(Vec::new())
            } else {
                batches.remove(0)
            }
        }

        fn describe(&self) -> String {
            "test list".to_string()
        }
    }

    struct LengthOfUrl;

    impl DurationProbe for LengthOfUrl {
        fn probe(&self, media_url: &str) -> Result<Duration, ProbeError> {
            if media_url.ends_with("bad") {
                return Err(ProbeError::MediaUnreadable(media_url.to_string()));
            }
            Ok(Duration::from_secs(media_url.len() as u64))
        }
    }

    fn track(id: &str, url: &str) -> Track {
        Track {
            id: TrackId::new(id),
            name: id.to_string(),
            artist: String::new(),
            media_url: url.to_string(),
            cover_ref: None,
            accent_color: None,
            is_top_track: false,
            duration: TrackDuration::Pending,
        }
    }

    fn drain_until<F>(
        refresher: &mut CatalogRefresher,
        session: &mut PlaybackSession<NullOutput>,
        app: &mut App,
        done: F,
    ) where
        F: Fn(&PlaybackSession<NullOutput>, &App) -> bool,
    {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(session, app) {
            assert!(Instant::now() < deadline, "refresh did not settle");
            refresher.drain(session, app);
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn fetch_replaces_catalog_and_probes_fill_durations() {
        let source = ListSource {
            batches: Mutex::new(vec![Ok(vec![track("a", "abcd"), track("b", "x.bad")])]),
        };
        let mut refresher = CatalogRefresher::new(Box::new(source), Arc::new(LengthOfUrl));
        let mut session = PlaybackSession::new(NullOutput, 1.0);
        let mut app = App::new(Tab::ForYou);

        refresher.start(&mut session, &mut app);
        assert!(app.loading);

        drain_until(&mut refresher, &mut session, &mut app, |s, _| {
            s.catalog()
                .filtered(Tab::ForYou, "")
                .all(|(_, t)| t.duration != TrackDuration::Pending)
                && !s.catalog().is_empty()
        });

        let catalog = session.catalog();
        assert_eq!(
            catalog.find(&TrackId::new("a")).map(|t| t.duration),
            Some(TrackDuration::Known(Duration::from_secs(4)))
        );
        assert_eq!(
            catalog.find(&TrackId::new("b")).map(|t| t.duration),
            Some(TrackDuration::Unknown)
        );
        assert!(!app.loading);
        assert_eq!(app.status, None);
    }

    #[test]
    fn superseded_fetch_is_ignored() {
        let source = ListSource {
            batches: Mutex::new(vec![
                Ok(vec![track("old", "old")]),
                Ok(vec![track("new", "new")]),
            ]),
        };
        let mut refresher = CatalogRefresher::new(Box::new(source), Arc::new(LengthOfUrl));
        let mut session = PlaybackSession::new(NullOutput, 1.0);
        let mut app = App::new(Tab::ForYou);

        refresher.start(&mut session, &mut app);
        // Let the first fetch land in the channel before superseding it.
        thread::sleep(Duration::from_millis(50));
        refresher.start(&mut session, &mut app);

        drain_until(&mut refresher, &mut session, &mut app, |s, _| !s.catalog().is_empty());
        assert_eq!(session.catalog().len(), 1);
        assert!(session.catalog().find(&TrackId::new("new")).is_some());
    }

    #[test]
    fn failed_fetch_surfaces_status() {
        let source = ListSource {
            batches: Mutex::new(vec![Err(CatalogError::MissingDirectory("/nope".into()))]),
        };
        let mut refresher = CatalogRefresher::new(Box::new(source), Arc::new(LengthOfUrl));
        let mut session = PlaybackSession::new(NullOutput, 1.0);
        let mut app = App::new(Tab::ForYou);

        refresher.start(&mut session, &mut app);
        drain_until(&mut refresher, &mut session, &mut app, |_, a| !a.loading);

        assert!(session.catalog().is_empty());
        assert!(app.status.as_deref().unwrap_or_default().contains("/nope"));
    }
}
