use std::time::Duration;

use crate::error::AudioError;

use super::types::{DeviceEvent, Generation};

/// Control surface of the single audio output device.
///
/// The playback session is the only holder; nothing else drives the device.
/// Calls return once the command is queued. Outcomes arrive later as
/// [`DeviceEvent`]s tagged with the generation passed to `load_and_play`.
pub trait AudioOutput {
    /// Stop whatever is playing, load `media_url`, seek to `start` and play.
    fn load_and_play(
        &mut self,
        media_url: &str,
        start: Duration,
        generation: Generation,
    ) -> Result<(), AudioError>;

    /// No-op when already paused.
    fn pause(&mut self) -> Result<(), AudioError>;

    /// No-op when already playing.
    fn resume(&mut self) -> Result<(), AudioError>;

    /// Jump to `position`, clamped to the loaded source's length.
    fn seek(&mut self, position: Duration) -> Result<(), AudioError>;

    /// `volume` in `[0, 1]`, applied immediately.
    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError>;

    /// Next pending event, if any. Never blocks.
    fn try_recv_event(&mut self) -> Option<DeviceEvent>;

    /// Fade out, stop, and release the device.
    fn shutdown(&mut self, fade_out: Duration);
}
