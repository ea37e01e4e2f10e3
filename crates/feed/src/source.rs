//! Event snapshot sources.
//!
//! A source produces one complete, already-normalized event catalog per
//! fetch. Implementations:
//! - Inline (static payload parsed once at startup, no network)
//! - Remote HTTP (GeoJSON endpoint, USGS-compatible schema)
//! - In-memory (scripted outcomes for tests)
//!
//! New sources can be added by implementing the `EventSource` trait.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use catalog::{Event, FeatureCollection, normalize};

/// Error type for feed operations.
#[derive(Debug)]
pub struct FeedError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl FeedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A source of complete event snapshots.
///
/// Implementations must be `Send + Sync` for use across async tasks.
/// Methods return boxed futures for dyn-compatibility.
pub trait EventSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetches one complete snapshot, normalized into canonical events.
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<Event>, FeedError>>;
}

/// Static snapshot configured at startup; never touches the network.
pub struct InlineSource {
    name: String,
    events: Vec<Event>,
}

impl InlineSource {
    /// Parses and normalizes the payload once. A payload that is not valid
    /// JSON is a startup configuration problem, not a runtime one.
    pub fn from_payload(name: impl Into<String>, payload: &str) -> Result<Self, FeedError> {
        let collection: FeatureCollection = serde_json::from_str(payload)
            .map_err(|e| FeedError::with_source("Inline snapshot is not valid JSON", e))?;
        Ok(Self {
            name: name.into(),
            events: normalize(&collection),
        })
    }
}

impl EventSource for InlineSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> BoxFuture<'_, Result<Vec<Event>, FeedError>> {
        Box::pin(async move { Ok(self.events.clone()) })
    }
}

/// Remote GeoJSON endpoint (USGS-compatible `features` schema).
pub struct HttpSource {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl EventSource for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> BoxFuture<'_, Result<Vec<Event>, FeedError>> {
        Box::pin(async move {
            let resp = self
                .client
                .get(&self.url)
                .send()
                .await
                .map_err(|e| FeedError::with_source("Feed request failed", e))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(FeedError::new(format!("Upstream HTTP {status}")));
            }

            let collection: FeatureCollection = resp
                .json()
                .await
                .map_err(|e| FeedError::with_source("Feed body was not parsable GeoJSON", e))?;

            Ok(normalize(&collection))
        })
    }
}

/// In-memory source with scripted outcomes, for tests.
///
/// Each `fetch` pops the next scripted response; an exhausted script fails.
pub struct MemorySource {
    name: String,
    responses: Mutex<VecDeque<Result<Vec<Event>, FeedError>>>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            responses: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_ok(&self, events: Vec<Event>) {
        self.responses.lock().unwrap().push_back(Ok(events));
    }

    pub fn push_err(&self, message: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(FeedError::new(message)));
    }
}

impl EventSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> BoxFuture<'_, Result<Vec<Event>, FeedError>> {
        Box::pin(async move {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FeedError::new("MemorySource script exhausted")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{EventSource, InlineSource, MemorySource};

    const PAYLOAD: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "id": "us1",
            "geometry": { "type": "Point", "coordinates": [10.0, 20.0, 5.0] },
            "properties": { "time": 1000, "mag": 4.0, "net": "us", "title": "M 4.0" }
        }]
    }"#;

    #[tokio::test]
    async fn inline_source_normalizes_once_and_replays() {
        let source = InlineSource::from_payload("inline", PAYLOAD).unwrap();
        let first = source.fetch().await.unwrap();
        let second = source.fetch().await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, "us1");
        assert_eq!(first, second);
    }

    #[test]
    fn inline_source_rejects_non_json_payloads() {
        assert!(InlineSource::from_payload("inline", "not json").is_err());
    }

    #[tokio::test]
    async fn memory_source_pops_scripted_outcomes() {
        let source = MemorySource::new("mem");
        source.push_ok(Vec::new());
        source.push_err("boom");

        assert!(source.fetch().await.is_ok());
        assert!(source.fetch().await.is_err());
        assert!(source.fetch().await.is_err());
    }
}
