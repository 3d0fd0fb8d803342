//! Filesystem-backed region source for native builds.
//!
//! Each read runs on its own thread so that a batch of requests is in flight
//! at once, as with browser fetches.

use super::{GeoSource, LoadError};
use futures_channel::oneshot;
use std::path::PathBuf;

/// Reads region documents relative to an asset root directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl GeoSource for FileSource {
    async fn fetch_text(&self, path: &str) -> Result<String, LoadError> {
        let full_path = self.root.join(path);
        let display = full_path.display().to_string();
        let (sender, receiver) = oneshot::channel();

        std::thread::spawn(move || {
            let _ = sender.send(std::fs::read_to_string(&full_path));
        });

        match receiver.await {
            Ok(result) => result.map_err(|e| LoadError::Io(format!("{}: {}", display, e))),
            Err(oneshot::Canceled) => Err(LoadError::Io(format!("{}: reader exited", display))),
        }
    }
}
