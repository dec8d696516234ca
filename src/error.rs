//! Error types shared across the player.
//!
//! Each boundary (media fetch, duration probe, catalog fetch, audio device)
//! has its own enum. None of them reach the UI directly: the playback session
//! projects device failures onto [`PlaybackErrorKind`] and keeps going.

use thiserror::Error;

/// The failure kinds that are visible in the playback snapshot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlaybackErrorKind {
    /// The media could not be fetched or decoded.
    MediaUnreadable,
    /// The output device refused to start or resume playback.
    PlaybackRejected,
}

impl PlaybackErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::MediaUnreadable => "media unreadable",
            Self::PlaybackRejected => "playback rejected",
        }
    }
}

/// Errors while resolving a media URL to bytes.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("http request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("media at {0} is empty")]
    Empty(String),
}

/// Errors from a duration probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("unreadable media: {0}")]
    MediaUnreadable(String),
}

/// Errors from a catalog source.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog directory {0} does not exist")]
    MissingDirectory(String),
}

/// Errors returned synchronously by an audio output.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio thread is gone")]
    Disconnected,
}
