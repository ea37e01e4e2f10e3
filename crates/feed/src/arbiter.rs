use std::time::Duration;

use catalog::Event;
use tracing::{debug, warn};

use crate::source::{EventSource, FeedError, HttpSource, InlineSource};

/// How the session sources its snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedConfig {
    /// Static GeoJSON payload. When present it wins over the remote
    /// endpoint and is fetched exactly once.
    pub inline_payload: Option<String>,
    pub remote_url: Option<String>,
    pub poll_interval: Option<Duration>,
}

/// Decides, once per refresh opportunity, where the next snapshot comes
/// from and whether polling continues.
///
/// Inline snapshot: normalized once, never re-polled. Remote endpoint: one
/// fetch per refresh, re-scheduled every `poll_interval`. Neither: every
/// refresh yields an empty catalog. Playback state is not this type's
/// concern; a swap must leave it untouched.
pub struct SnapshotArbiter {
    source: Option<Box<dyn EventSource>>,
    poll_interval: Option<Duration>,
}

impl SnapshotArbiter {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

    pub fn from_config(config: &FeedConfig) -> Result<Self, FeedError> {
        if let Some(payload) = &config.inline_payload {
            let source = InlineSource::from_payload("inline snapshot", payload)?;
            return Ok(Self {
                source: Some(Box::new(source)),
                poll_interval: None,
            });
        }

        if let Some(url) = &config.remote_url {
            return Ok(Self {
                source: Some(Box::new(HttpSource::new("remote feed", url))),
                poll_interval: Some(
                    config.poll_interval.unwrap_or(Self::DEFAULT_POLL_INTERVAL),
                ),
            });
        }

        Ok(Self {
            source: None,
            poll_interval: None,
        })
    }

    /// For tests and embedding: poll an arbitrary source.
    pub fn polling(source: Box<dyn EventSource>, interval: Duration) -> Self {
        Self {
            source: Some(source),
            poll_interval: Some(interval),
        }
    }

    /// `None` means "do not schedule another refresh".
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval
    }

    /// One refresh decision.
    ///
    /// A failure is reported here and returned; the caller keeps its
    /// previous snapshot in place and lets the next scheduled refresh retry.
    pub async fn refresh(&self) -> Result<Vec<Event>, FeedError> {
        let Some(source) = &self.source else {
            return Ok(Vec::new());
        };

        match source.fetch().await {
            Ok(events) => {
                debug!(
                    source = source.name(),
                    count = events.len(),
                    "feed refresh succeeded"
                );
                Ok(events)
            }
            Err(err) => {
                warn!(source = source.name(), error = %err, "feed refresh failed");
                Err(err)
            }
        }
    }
}
