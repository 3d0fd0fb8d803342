//! Region document loading.
//!
//! All regions are requested at once and awaited together; the caller only
//! ever sees the complete, ordered result list. A region that fails to load
//! is logged and left absent. There are no retries.

mod channel;
#[cfg(not(target_arch = "wasm32"))]
mod file;
#[cfg(target_arch = "wasm32")]
mod http;

pub use channel::LoadChannel;
#[cfg(not(target_arch = "wasm32"))]
pub use file::FileSource;
#[cfg(target_arch = "wasm32")]
pub use http::HttpSource;

use crate::geo::RegionDocument;
use futures_util::future::join_all;
use std::future::Future;
use std::time::Duration;

/// Errors that can occur while loading one region.
// Request/Network/Body come from browser fetches and Io from local files, so
// each target build leaves some variants unconstructed.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The request could not be constructed.
    Request(String),
    /// The request was sent but no response arrived.
    Network(String),
    /// The server answered with a non-success status.
    Status(u16),
    /// The response body could not be read.
    Body(String),
    /// A local file could not be read.
    Io(String),
    /// The body was not a valid region document.
    Parse(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Request(msg) => write!(f, "Request failed: {}", msg),
            LoadError::Network(msg) => write!(f, "Network error: {}", msg),
            LoadError::Status(code) => write!(f, "HTTP error: {}", code),
            LoadError::Body(msg) => write!(f, "Failed to read response: {}", msg),
            LoadError::Io(msg) => write!(f, "I/O error: {}", msg),
            LoadError::Parse(msg) => write!(f, "Failed to parse GeoJSON: {}", msg),
        }
    }
}

impl std::error::Error for LoadError {}

/// Where region documents come from.
///
/// Note: no `Send` bound, since browser fetches are tied to the JS thread.
pub trait GeoSource {
    /// Retrieves the raw text stored at `path`.
    fn fetch_text(&self, path: &str) -> impl Future<Output = Result<String, LoadError>>;
}

/// Everything the loader produced, in request order.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    /// One entry per requested region; `None` where loading failed
    pub documents: Vec<Option<RegionDocument>>,
    /// Wall time from first request until the last one settled
    pub elapsed: Duration,
}

impl LoadOutcome {
    pub fn loaded_count(&self) -> usize {
        self.documents.iter().filter(|d| d.is_some()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.documents.len() - self.loaded_count()
    }
}

/// Fetches and parses one region, logging and returning `None` on failure.
async fn fetch_region<S: GeoSource>(source: &S, path: String) -> Option<RegionDocument> {
    let result = match source.fetch_text(&path).await {
        Ok(text) => RegionDocument::from_json(&text).map_err(|e| LoadError::Parse(e.to_string())),
        Err(e) => Err(e),
    };

    match result {
        Ok(document) => Some(document),
        Err(e) => {
            log::error!("Error fetching {}: {}", path, e);
            None
        }
    }
}

/// Requests every path concurrently and waits for all of them to settle.
///
/// The result has one entry per path, in the order given.
pub async fn fetch_all<S: GeoSource>(source: &S, paths: Vec<String>) -> Vec<Option<RegionDocument>> {
    join_all(paths.into_iter().map(|path| fetch_region(source, path))).await
}

/// Runs [`fetch_all`] and records how long it took.
pub async fn load_regions<S: GeoSource>(source: &S, paths: Vec<String>) -> LoadOutcome {
    let requested = paths.len();
    let start = web_time::Instant::now();

    let documents = fetch_all(source, paths).await;
    let elapsed = start.elapsed();

    let outcome = LoadOutcome { documents, elapsed };
    log::info!(
        "Loaded {}/{} region documents in {:.0} ms",
        outcome.loaded_count(),
        requested,
        elapsed.as_secs_f64() * 1000.0
    );

    outcome
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geo::{assemble_outlines, OutlineBuilder};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    pub(crate) const POLYGON: &str = r#"{ "features": [{ "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] } }] }"#;

    /// Yields to the executor a fixed number of times before completing.
    struct Yield(usize);

    impl Future for Yield {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.0 == 0 {
                Poll::Ready(())
            } else {
                self.0 -= 1;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    /// In-memory source; each entry is (delay in polls, response).
    #[derive(Default)]
    pub(crate) struct MemorySource {
        entries: HashMap<String, (usize, Result<String, LoadError>)>,
        completed: RefCell<Vec<String>>,
    }

    impl MemorySource {
        pub(crate) fn with(mut self, path: &str, delay: usize, response: Result<&str, LoadError>) -> Self {
            self.entries
                .insert(path.to_string(), (delay, response.map(str::to_string)));
            self
        }
    }

    impl GeoSource for MemorySource {
        async fn fetch_text(&self, path: &str) -> Result<String, LoadError> {
            let (delay, response) = self
                .entries
                .get(path)
                .cloned()
                .unwrap_or((0, Err(LoadError::Status(404))));
            Yield(delay).await;
            self.completed.borrow_mut().push(path.to_string());
            response
        }
    }

    fn paths(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_all_present() {
        let source = MemorySource::default()
            .with("a", 0, Ok(POLYGON))
            .with("b", 0, Ok(POLYGON));

        let outcome = pollster::block_on(load_regions(&source, paths(&["a", "b"])));
        assert_eq!(outcome.documents.len(), 2);
        assert_eq!(outcome.loaded_count(), 2);
        assert_eq!(outcome.failed_count(), 0);
    }

    #[test]
    fn test_order_preserved_despite_completion_order() {
        let source = MemorySource::default()
            .with("slow", 5, Ok(POLYGON))
            .with("missing", 3, Err(LoadError::Status(404)))
            .with("fast", 0, Ok(POLYGON));

        let documents = pollster::block_on(fetch_all(&source, paths(&["slow", "missing", "fast"])));

        assert_eq!(*source.completed.borrow(), vec!["fast", "missing", "slow"]);
        assert!(documents[0].is_some());
        assert!(documents[1].is_none());
        assert!(documents[2].is_some());
    }

    #[test]
    fn test_one_failure_among_many() {
        let source = MemorySource::default()
            .with("a", 1, Ok(POLYGON))
            .with("b", 0, Err(LoadError::Network("connection reset".to_string())))
            .with("c", 2, Ok(POLYGON))
            .with("d", 0, Ok(POLYGON));

        let documents = pollster::block_on(fetch_all(&source, paths(&["a", "b", "c", "d"])));
        assert_eq!(documents.len(), 4);
        assert_eq!(documents.iter().filter(|d| d.is_none()).count(), 1);

        let builder = OutlineBuilder::default();
        let mut projected = 0;
        let batches = assemble_outlines(&documents, |doc| {
            projected += 1;
            builder.build_or_skip(doc)
        })
        .unwrap();
        assert_eq!(projected, 3);
        assert_eq!(batches.len(), 3);
    }

    #[test]
    fn test_parse_failure_is_absent() {
        let source = MemorySource::default()
            .with("html", 0, Ok("<!doctype html><p>Not found</p>"))
            .with("ok", 0, Ok(POLYGON));

        let documents = pollster::block_on(fetch_all(&source, paths(&["html", "ok"])));
        assert!(documents[0].is_none());
        assert!(documents[1].is_some());
    }

    #[test]
    fn test_all_failures_skip_projection() {
        let source = MemorySource::default();
        let documents = pollster::block_on(fetch_all(&source, paths(&["x", "y", "z"])));

        assert_eq!(documents.len(), 3);
        assert!(documents.iter().all(Option::is_none));

        let mut projected = 0;
        let result = assemble_outlines(&documents, |_| {
            projected += 1;
            Vec::new()
        });
        assert!(result.is_none());
        assert_eq!(projected, 0);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(LoadError::Status(503).to_string(), "HTTP error: 503");
        assert_eq!(
            LoadError::Parse("expected value".to_string()).to_string(),
            "Failed to parse GeoJSON: expected value"
        );
    }
}
