use std::time::Duration;

use crate::error::PlaybackErrorKind;

/// Identifies one `load_and_play` request. Bumped by the session on every
/// track switch; events carrying an older value belong to a superseded track.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

/// Commands understood by the audio thread, applied in the order they were sent.
#[derive(Debug)]
pub enum DeviceCmd {
    LoadAndPlay {
        media_url: String,
        start: Duration,
        generation: Generation,
    },
    Pause,
    Resume,
    Seek(Duration),
    SetVolume(f32),
    Quit {
        fade_out_ms: u64,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeviceEventKind {
    /// The source is loaded and audible.
    Started,
    Progress {
        position: Duration,
        duration: Option<Duration>,
    },
    Ended,
    Error(PlaybackErrorKind),
}

/// An event from the output device, tagged with the load it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceEvent {
    pub generation: Generation,
    pub kind: DeviceEventKind,
}
