use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, warn};

use crate::error::PlaybackErrorKind;
use crate::media::MediaClient;

use super::sink::create_sink_at;
use super::types::{DeviceCmd, DeviceEvent, DeviceEventKind, Generation};

/// The source currently held by the device.
struct Loaded {
    generation: Generation,
    media: Arc<[u8]>,
    sink: Sink,
    duration: Option<Duration>,
}

/// State owned by the audio thread.
struct Deck {
    stream: Option<OutputStream>,
    client: MediaClient,
    events: Sender<DeviceEvent>,
    loaded: Option<Loaded>,
    // Last requested load; used for errors raised while nothing is loaded.
    generation: Generation,
    volume: f32,
    paused: bool,

    // Track start time and accumulated elapsed when paused.
    started_at: Option<Instant>,
    accumulated: Duration,

    progress_interval: Duration,
    last_progress: Instant,
}

impl Deck {
    fn new(
        stream: Option<OutputStream>,
        client: MediaClient,
        events: Sender<DeviceEvent>,
        volume: f32,
        progress_interval: Duration,
    ) -> Self {
        Self {
            stream,
            client,
            events,
            loaded: None,
            generation: Generation::default(),
            volume: volume.clamp(0.0, 1.0),
            paused: true,
            started_at: None,
            accumulated: Duration::ZERO,
            progress_interval,
            last_progress: Instant::now(),
        }
    }

    fn emit(&self, generation: Generation, kind: DeviceEventKind) {
        let _ = self.events.send(DeviceEvent { generation, kind });
    }

    fn elapsed(&self) -> Duration {
        self.accumulated
            .saturating_add(self.started_at.map_or(Duration::ZERO, |st| st.elapsed()))
    }

    fn load_and_play(&mut self, media_url: &str, start: Duration, generation: Generation) {
        self.stop();
        self.generation = generation;

        let Some(stream) = self.stream.as_ref() else {
            self.emit(generation, DeviceEventKind::Error(PlaybackErrorKind::PlaybackRejected));
            return;
        };

        let media = match self.client.fetch(media_url) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "failed to load media");
                self.emit(generation, DeviceEventKind::Error(PlaybackErrorKind::MediaUnreadable));
                return;
            }
        };

        let (sink, duration) = match create_sink_at(stream, &media, start, self.volume) {
            Ok(v) => v,
            Err(kind) => {
                warn!(media_url, "failed to decode media");
                self.emit(generation, DeviceEventKind::Error(kind));
                return;
            }
        };

        sink.play();
        self.loaded = Some(Loaded {
            generation,
            media,
            sink,
            duration,
        });
        self.paused = false;
        self.started_at = Some(Instant::now());
        self.accumulated = duration.map_or(start, |d| start.min(d));

        debug!(media_url, ?generation, "playback started");
        self.emit(generation, DeviceEventKind::Started);
        self.report_progress();
    }

    fn stop(&mut self) {
        if let Some(loaded) = self.loaded.take() {
            loaded.sink.stop();
        }
        self.paused = true;
        self.started_at = None;
        self.accumulated = Duration::ZERO;
    }

    fn pause(&mut self) {
        let Some(loaded) = self.loaded.as_ref() else {
            return;
        };
        if self.paused {
            return;
        }
        loaded.sink.pause();
        if let Some(st) = self.started_at.take() {
            self.accumulated = self.accumulated.saturating_add(st.elapsed());
        }
        self.paused = true;
    }

    fn resume(&mut self) {
        match self.loaded.as_ref() {
            None => {
                self.emit(
                    self.generation,
                    DeviceEventKind::Error(PlaybackErrorKind::PlaybackRejected),
                );
            }
            Some(loaded) if self.paused => {
                loaded.sink.play();
                self.started_at = Some(Instant::now());
                self.paused = false;
            }
            Some(_) => {}
        }
    }

    // Scrubbing: rebuild the current sink and skip into the buffer.
    // This uses `Source::skip_duration` (works for common formats).
    fn seek(&mut self, position: Duration) {
        let (Some(stream), Some(loaded)) = (self.stream.as_ref(), self.loaded.as_mut()) else {
            return;
        };

        let target = loaded.duration.map_or(position, |d| position.min(d));
        loaded.sink.stop();

        match create_sink_at(stream, &loaded.media, target, self.volume) {
            Ok((sink, _)) => {
                if self.paused {
                    self.started_at = None;
                } else {
                    sink.play();
                    self.started_at = Some(Instant::now());
                }
                loaded.sink = sink;
                self.accumulated = target;
                self.report_progress();
            }
            Err(kind) => {
                let generation = loaded.generation;
                self.stop();
                self.emit(generation, DeviceEventKind::Error(kind));
            }
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(loaded) = self.loaded.as_ref() {
            loaded.sink.set_volume(self.volume);
        }
    }

    fn report_progress(&mut self) {
        let Some(loaded) = self.loaded.as_ref() else {
            return;
        };
        let elapsed = self.elapsed();
        let position = loaded.duration.map_or(elapsed, |d| elapsed.min(d));
        self.emit(
            loaded.generation,
            DeviceEventKind::Progress {
                position,
                duration: loaded.duration,
            },
        );
        self.last_progress = Instant::now();
    }

    /// Periodic work: detect end of track and report progress.
    fn tick(&mut self) {
        let Some(loaded) = self.loaded.as_ref() else {
            return;
        };
        if self.paused {
            return;
        }
        if loaded.sink.empty() {
            let generation = loaded.generation;
            self.stop();
            self.emit(generation, DeviceEventKind::Ended);
        } else if self.last_progress.elapsed() >= self.progress_interval {
            self.report_progress();
        }
    }

    fn quit(&mut self, fade_out_ms: u64) {
        if let Some(loaded) = self.loaded.as_ref() {
            // Fade out gently before stopping.
            if !self.paused {
                fade_out_sink(&loaded.sink, self.volume, fade_out_ms);
            }
            loaded.sink.stop();
        }
        self.loaded = None;
    }
}

fn fade_out_sink(sink: &Sink, from: f32, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(from * (1.0 - t));
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}

pub(super) fn spawn_audio_thread(
    rx: Receiver<DeviceCmd>,
    events: Sender<DeviceEvent>,
    client: MediaClient,
    initial_volume: f32,
    progress_interval: Duration,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
                // but noisy for a TUI app.
                stream.log_on_drop(false);
                Some(stream)
            }
            Err(e) => {
                // Keep serving commands so every load resolves to a visible error.
                warn!(error = %e, "no audio output device");
                None
            }
        };

        let mut deck = Deck::new(stream, client, events, initial_volume, progress_interval);

        loop {
            match rx.recv_timeout(progress_interval) {
                Ok(cmd) => match cmd {
                    DeviceCmd::LoadAndPlay {
                        media_url,
                        start,
                        generation,
                    } => deck.load_and_play(&media_url, start, generation),
                    DeviceCmd::Pause => deck.pause(),
                    DeviceCmd::Resume => deck.resume(),
                    DeviceCmd::Seek(position) => deck.seek(position),
                    DeviceCmd::SetVolume(volume) => deck.set_volume(volume),
                    DeviceCmd::Quit { fade_out_ms } => {
                        deck.quit(fade_out_ms);
                        break;
                    }
                },
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            deck.tick();
        }
    })
}
