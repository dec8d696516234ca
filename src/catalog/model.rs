use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// Identity key of a catalog entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Catalog endpoints hand out numeric ids; local scans use paths.
impl<'de> Deserialize<'de> for TrackId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Num(u64),
            Str(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Num(n) => TrackId(n.to_string()),
            RawId::Str(s) => TrackId(s),
        })
    }
}

/// Playable length of a track as learned by the duration prober.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TrackDuration {
    /// No probe result yet.
    #[default]
    Pending,
    Known(Duration),
    /// The probe failed; the track is still playable.
    Unknown,
}

impl TrackDuration {
    pub fn known(self) -> Option<Duration> {
        match self {
            Self::Known(d) => Some(d),
            _ => None,
        }
    }

    /// Seconds, or NaN when the length is not known (renders as `0:00`).
    pub fn as_secs_f64(self) -> f64 {
        self.known().map_or(f64::NAN, |d| d.as_secs_f64())
    }
}

/// One playable catalog entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub artist: String,
    pub media_url: String,
    pub cover_ref: Option<String>,
    pub accent_color: Option<String>,
    pub is_top_track: bool,
    pub duration: TrackDuration,
}

impl Track {
    /// Compose the artwork URL from the configured asset prefix.
    pub fn cover_url(&self, base: &str) -> Option<String> {
        let cover = self.cover_ref.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
        if cover.starts_with("http://") || cover.starts_with("https://") {
            return Some(cover.to_string());
        }
        Some(format!("{}{}", base, cover))
    }

    /// `artist - name`, or just the name when the artist is blank.
    pub fn display(&self) -> String {
        let artist = self.artist.trim();
        if artist.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", artist, self.name)
        }
    }
}

/// The list tabs offered above the track list.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    ForYou,
    TopTracks,
}

impl Tab {
    pub fn title(self) -> &'static str {
        match self {
            Tab::ForYou => "For You",
            Tab::TopTracks => "Top Tracks",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Tab::ForYou => Tab::TopTracks,
            Tab::TopTracks => Tab::ForYou,
        }
    }
}
