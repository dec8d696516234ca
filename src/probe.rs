//! Duration probing.
//!
//! A probe decodes a track's container metadata in its own context (lofty over
//! an in-memory copy of the media), never touching the output device. The
//! catalog refresh fans out one probe per track; results come back over a
//! channel tagged with the catalog generation they were started for.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use lofty::file::AudioFile;
use lofty::probe::Probe;
use tracing::trace;

use crate::catalog::{CatalogGeneration, TrackId};
use crate::error::ProbeError;
use crate::media::MediaClient;

/// Learns the playable length behind a media URL.
pub trait DurationProbe: Send + Sync {
    fn probe(&self, media_url: &str) -> Result<Duration, ProbeError>;
}

/// Probe backed by lofty's container parsers.
pub struct LoftyProber {
    client: MediaClient,
}

impl LoftyProber {
    pub fn new(client: MediaClient) -> Self {
        Self { client }
    }
}

impl DurationProbe for LoftyProber {
    fn probe(&self, media_url: &str) -> Result<Duration, ProbeError> {
        let bytes = self.client.fetch(media_url)?;
        duration_of(&bytes)
    }
}

/// Read the container's reported duration from `bytes`.
pub fn duration_of(bytes: &[u8]) -> Result<Duration, ProbeError> {
    let unreadable = |e: lofty::error::LoftyError| ProbeError::MediaUnreadable(e.to_string());
    let tagged = Probe::new(Cursor::new(bytes))
        .guess_file_type()
        .map_err(|e| ProbeError::MediaUnreadable(e.to_string()))?
        .read()
        .map_err(unreadable)?;

    let duration = tagged.properties().duration();
    if duration.is_zero() {
        return Err(ProbeError::MediaUnreadable("no playable length".to_string()));
    }
    Ok(duration)
}

/// One finished probe.
#[derive(Debug)]
pub struct ProbeOutcome {
    pub generation: CatalogGeneration,
    pub id: TrackId,
    pub result: Result<Duration, ProbeError>,
}

/// A set of in-flight probes for one catalog generation.
///
/// Dropping or cancelling the batch stops probes that have not started and
/// suppresses results from the ones that are still running.
pub struct ProbeBatch {
    generation: CatalogGeneration,
    cancelled: Arc<AtomicBool>,
}

impl ProbeBatch {
    pub fn spawn(
        generation: CatalogGeneration,
        targets: Vec<(TrackId, String)>,
        prober: Arc<dyn DurationProbe>,
        tx: Sender<ProbeOutcome>,
    ) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));

        for (id, url) in targets {
            let prober = Arc::clone(&prober);
            let cancelled = Arc::clone(&cancelled);
            let tx = tx.clone();
            thread::spawn(move || {
                if cancelled.load(Ordering::Acquire) {
                    return;
                }
                let result = prober.probe(&url);
                if cancelled.load(Ordering::Acquire) {
                    trace!(%id, "probe finished after cancel");
                    return;
                }
                let _ = tx.send(ProbeOutcome {
                    generation,
                    id,
                    result,
                });
            });
        }

        Self {
            generation,
            cancelled,
        }
    }

    pub fn generation(&self) -> CatalogGeneration {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

impl Drop for ProbeBatch {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogStore;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::mpsc;

    struct FakeProbe {
        lengths: HashMap<String, u64>,
        gate: Mutex<Option<mpsc::Receiver<()>>>,
    }

    impl FakeProbe {
        fn new(lengths: &[(&str, u64)]) -> Self {
            Self {
                lengths: lengths.iter().map(|(u, s)| (u.to_string(), *s)).collect(),
                gate: Mutex::new(None),
            }
        }
    }

    impl DurationProbe for FakeProbe {
        fn probe(&self, media_url: &str) -> Result<Duration, ProbeError> {
            if let Some(gate) = self.gate.lock().unwrap().as_ref() {
                let _ = gate.recv();
            }
            self.lengths
                .get(media_url)
                .map(|s| Duration::from_secs(*s))
                .ok_or_else(|| ProbeError::MediaUnreadable(media_url.to_string()))
        }
    }

    fn generation() -> CatalogGeneration {
        CatalogStore::new().begin_refresh()
    }

    #[test]
    fn batch_reports_every_track_tagged_with_its_generation() {
        let probe = Arc::new(FakeProbe::new(&[("a.mp3", 60), ("b.mp3", 125)]));
        let (tx, rx) = mpsc::channel();
        let generation = generation();

        let batch = ProbeBatch::spawn(
            generation,
            vec![
                (TrackId::new("a"), "a.mp3".into()),
                (TrackId::new("b"), "b.mp3".into()),
                (TrackId::new("c"), "broken.mp3".into()),
            ],
            probe,
            tx,
        );
        assert_eq!(batch.generation(), generation);

        let mut outcomes: Vec<ProbeOutcome> = (0..3)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        outcomes.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));

        assert!(outcomes.iter().all(|o| o.generation == generation));
        assert_eq!(outcomes[0].result.as_ref().unwrap(), &Duration::from_secs(60));
        assert_eq!(outcomes[1].result.as_ref().unwrap(), &Duration::from_secs(125));
        assert!(matches!(
            outcomes[2].result,
            Err(ProbeError::MediaUnreadable(_))
        ));
    }

    #[test]
    fn cancelled_batch_discards_late_results() {
        let (gate_tx, gate_rx) = mpsc::channel();
        let probe = FakeProbe::new(&[("a.mp3", 60)]);
        *probe.gate.lock().unwrap() = Some(gate_rx);

        let (tx, rx) = mpsc::channel();
        let batch = ProbeBatch::spawn(
            generation(),
            vec![(TrackId::new("a"), "a.mp3".into())],
            Arc::new(probe),
            tx,
        );

        batch.cancel();
        let _ = gate_tx.send(());

        // The worker drops its sender without reporting.
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(5)),
            Err(mpsc::RecvTimeoutError::Disconnected)
        ));
    }

    #[test]
    fn duration_of_rejects_non_media_bytes() {
        assert!(matches!(
            duration_of(b"definitely not audio"),
            Err(ProbeError::MediaUnreadable(_))
        ));
    }
}
