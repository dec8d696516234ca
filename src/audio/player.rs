use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::AudioSettings;
use crate::error::AudioError;
use crate::media::MediaClient;

use super::output::AudioOutput;
use super::thread::spawn_audio_thread;
use super::types::{DeviceCmd, DeviceEvent, Generation};

/// Handle to the rodio-backed audio thread.
pub struct RodioOutput {
    tx: Sender<DeviceCmd>,
    events: Receiver<DeviceEvent>,
    join: Option<JoinHandle<()>>,
}

impl RodioOutput {
    pub fn new(client: MediaClient, audio_settings: &AudioSettings) -> Self {
        let (tx, rx) = mpsc::channel::<DeviceCmd>();
        let (event_tx, events) = mpsc::channel::<DeviceEvent>();

        let join = spawn_audio_thread(
            rx,
            event_tx,
            client,
            audio_settings.initial_volume,
            Duration::from_millis(audio_settings.progress_interval_ms.max(1)),
        );

        Self {
            tx,
            events,
            join: Some(join),
        }
    }

    fn send(&self, cmd: DeviceCmd) -> Result<(), AudioError> {
        self.tx.send(cmd).map_err(|_| AudioError::Disconnected)
    }
}

impl AudioOutput for RodioOutput {
    fn load_and_play(
        &mut self,
        media_url: &str,
        start: Duration,
        generation: Generation,
    ) -> Result<(), AudioError> {
        self.send(DeviceCmd::LoadAndPlay {
            media_url: media_url.to_string(),
            start,
            generation,
        })
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        self.send(DeviceCmd::Pause)
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.send(DeviceCmd::Resume)
    }

    fn seek(&mut self, position: Duration) -> Result<(), AudioError> {
        self.send(DeviceCmd::Seek(position))
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
        self.send(DeviceCmd::SetVolume(volume))
    }

    fn try_recv_event(&mut self) -> Option<DeviceEvent> {
        self.events.try_recv().ok()
    }

    fn shutdown(&mut self, fade_out: Duration) {
        let _ = self.send(DeviceCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.shutdown(Duration::ZERO);
        }
    }
}
