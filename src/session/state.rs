use crate::catalog::TrackId;
use crate::error::PlaybackErrorKind;

/// Where the session is in its load/play cycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionStatus {
    /// No track selected yet.
    #[default]
    Idle,
    /// Load requested, device has not confirmed playback.
    Loading,
    Playing,
    Paused,
}

/// Render-ready snapshot of the playback session.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackState {
    pub current_track_id: Option<TrackId>,
    pub status: SessionStatus,
    pub is_playing: bool,
    pub position_secs: f64,
    /// `None` until the length is known.
    pub duration_secs: Option<f64>,
    /// Last user-intended volume; kept while muted.
    pub volume: f32,
    pub is_muted: bool,
    pub is_volume_gesture_active: bool,
    pub last_error: Option<PlaybackErrorKind>,
}

impl PlaybackState {
    pub fn new(volume: f32) -> Self {
        // A silent start is a muted start; the audible level falls back to full.
        let (volume, is_muted) = if volume > 0.0 {
            (volume.min(1.0), false)
        } else {
            (1.0, true)
        };
        Self {
            current_track_id: None,
            status: SessionStatus::Idle,
            is_playing: false,
            position_secs: 0.0,
            duration_secs: None,
            volume,
            is_muted,
            is_volume_gesture_active: false,
            last_error: None,
        }
    }

    /// Volume actually sent to the device.
    pub fn effective_volume(&self) -> f32 {
        if self.is_muted { 0.0 } else { self.volume }
    }

    /// Playback progress in `[0, 1]`, or 0 when the length is unknown.
    pub fn progress_ratio(&self) -> f64 {
        match self.duration_secs {
            Some(d) if d > 0.0 => (self.position_secs / d).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(1.0)
    }
}
