//! Utilities for creating `rodio` sinks from in-memory media.
//!
//! The helper here encapsulates decoding a buffer and preparing a paused
//! `Sink` at the requested start position.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use crate::error::PlaybackErrorKind;

/// Create a paused `Sink` over `media` that starts playback at `start_at`.
///
/// Also returns the total length when the decoder knows it.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    media: &Arc<[u8]>,
    start_at: Duration,
    volume: f32,
) -> Result<(Sink, Option<Duration>), PlaybackErrorKind> {
    let decoder = Decoder::new(Cursor::new(Arc::clone(media)))
        .map_err(|_| PlaybackErrorKind::MediaUnreadable)?;
    let total = decoder.total_duration();

    // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
    let source = decoder.skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.set_volume(volume);
    sink.append(source);
    sink.pause();
    Ok((sink, total))
}
