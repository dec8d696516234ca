//! Resolve media URLs to in-memory byte buffers.
//!
//! Both the duration prober and the audio thread decode from memory, so a
//! remote track is downloaded once per load and seeking never touches the
//! network again.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::error::MediaError;

/// Shared, cheaply cloneable handle for fetching media.
#[derive(Clone, Debug)]
pub struct MediaClient {
    http: Client,
}

impl MediaClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Fetch the whole resource behind `url`.
    ///
    /// `http(s)://` goes over the network, `file://` and bare paths are read from disk.
    pub fn fetch(&self, url: &str) -> Result<Arc<[u8]>, MediaError> {
        let bytes: Vec<u8> = if is_remote(url) {
            debug!(url, "downloading media");
            let http_err = |source| MediaError::Http {
                url: url.to_string(),
                source,
            };
            self.http
                .get(url)
                .send()
                .and_then(|r| r.error_for_status())
                .and_then(|r| r.bytes())
                .map_err(http_err)?
                .to_vec()
        } else {
            let path = local_path(url);
            std::fs::read(path).map_err(|source| MediaError::Io {
                path: path.display().to_string(),
                source,
            })?
        };

        if bytes.is_empty() {
            return Err(MediaError::Empty(url.to_string()));
        }
        Ok(bytes.into())
    }
}

pub fn is_remote(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn local_path(url: &str) -> &Path {
    Path::new(url.strip_prefix("file://").unwrap_or(url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn client() -> MediaClient {
        MediaClient::new(Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn is_remote_matches_http_schemes_case_insensitive() {
        assert!(is_remote("https://cdn.test/a.mp3"));
        assert!(is_remote("HTTP://cdn.test/a.mp3"));
        assert!(!is_remote("file:///tmp/a.mp3"));
        assert!(!is_remote("/tmp/a.mp3"));
    }

    #[test]
    fn fetch_reads_plain_paths_and_file_urls() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        fs::write(&path, b"abc").unwrap();

        let c = client();
        assert_eq!(&*c.fetch(path.to_str().unwrap()).unwrap(), b"abc");
        let url = format!("file://{}", path.display());
        assert_eq!(&*c.fetch(&url).unwrap(), b"abc");
    }

    #[test]
    fn fetch_reports_missing_and_empty_files() {
        let dir = tempdir().unwrap();
        let c = client();

        let missing = dir.path().join("missing.mp3");
        assert!(matches!(
            c.fetch(missing.to_str().unwrap()),
            Err(MediaError::Io { .. })
        ));

        let empty = dir.path().join("empty.mp3");
        fs::write(&empty, b"").unwrap();
        assert!(matches!(
            c.fetch(empty.to_str().unwrap()),
            Err(MediaError::Empty(_))
        ));
    }
}
