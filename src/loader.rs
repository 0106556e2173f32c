//! The load coordinator: one fetch→parse→normalize pipeline per URL, with
//! result caching and in-flight deduplication.
//!
//! [`NewsLoader`] is the lifecycle boundary between the pipeline and its
//! consumers. A consumer that is torn down and rebuilt (the screen-rotation
//! case) calls [`NewsLoader::cached`] or [`NewsLoader::load`] again and gets
//! the previous result without a second network call; two consumers racing
//! on a cold URL share a single fetch. Dropping the future returned by
//! `load` detaches that consumer only — the spawned pipeline always runs to
//! completion and its result is cached for whoever attaches next.

use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::feed::{parse_feed, FetchError, Fetcher, ParseError};
use crate::model::Story;

/// Feed URLs the cache keeps results for before evicting the least
/// recently used entry. Entries are never evicted by time.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

/// A completed load: the full story list, or the failure that ended it.
///
/// `Arc` so one cached result is shared with every subscriber without
/// copying. Failures are cached exactly like successes — a consumer must
/// [`NewsLoader::invalidate`] to retry a failing URL.
pub type LoadResult = Result<Arc<[Story]>, LoadError>;

/// Classification of a failed load, flattened across the fetch and parse
/// stages so one cloneable value can be cached and broadcast.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The request URL never reached the network.
    #[error("invalid request URL")]
    InvalidUrl,
    /// Connect or read deadline elapsed.
    #[error("request timed out")]
    Timeout,
    /// Transport failure, carried as text (the underlying source error is
    /// not cloneable).
    #[error("network failure: {0}")]
    Network(String),
    /// Non-200 response status.
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded the size limit.
    #[error("response too large")]
    ResponseTooLarge,
    /// The response body did not match the expected envelope shape.
    #[error("malformed feed response: {0}")]
    MalformedTopLevel(String),
}

impl From<FetchError> for LoadError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::InvalidUrl => LoadError::InvalidUrl,
            FetchError::Timeout => LoadError::Timeout,
            FetchError::Network(source) => LoadError::Network(source.to_string()),
            FetchError::HttpStatus(code) => LoadError::HttpStatus(code),
            FetchError::ResponseTooLarge => LoadError::ResponseTooLarge,
        }
    }
}

impl From<ParseError> for LoadError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::MalformedTopLevel(detail) => LoadError::MalformedTopLevel(detail),
        }
    }
}

/// Coordinates feed loads across consumers.
///
/// Cloning is cheap and every clone shares the same cache and in-flight
/// table, so one loader instance can serve any number of concurrent
/// consumers.
#[derive(Clone)]
pub struct NewsLoader {
    fetcher: Fetcher,
    state: Arc<Mutex<LoaderState>>,
}

struct LoaderState {
    /// Most recent completed result per URL. The single writer is the
    /// pipeline task at completion; all access goes through the mutex so
    /// no reader can observe a half-written entry.
    cache: LruCache<String, LoadResult>,
    /// URLs with a pipeline currently running. Presence here is the
    /// in-flight flag: a second load for the same URL subscribes to the
    /// existing channel instead of fetching again.
    in_flight: HashMap<String, InFlight>,
    next_flight_id: u64,
}

struct InFlight {
    tx: broadcast::Sender<LoadResult>,
    /// Identifies this particular flight. `invalidate` removes the table
    /// entry; a completion whose id no longer matches knows its result is
    /// stale and must not be cached.
    id: u64,
}

impl NewsLoader {
    /// Loader with the standard fetch deadlines and cache capacity.
    pub fn new() -> Result<Self, LoadError> {
        Ok(Self::with_fetcher(Fetcher::new()?, DEFAULT_CACHE_CAPACITY))
    }

    /// Loader configured from the application [`Config`].
    pub fn from_config(config: &Config) -> Result<Self, LoadError> {
        Ok(Self::with_fetcher(Fetcher::new()?, config.cache_capacity))
    }

    /// Loader with an injected fetcher and cache capacity. A capacity of
    /// zero is clamped to one.
    pub fn with_fetcher(fetcher: Fetcher, cache_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            fetcher,
            state: Arc::new(Mutex::new(LoaderState {
                cache: LruCache::new(capacity),
                in_flight: HashMap::new(),
                next_flight_id: 0,
            })),
        }
    }

    /// The attach fast path: the cached result for `url`, if any, with no
    /// network I/O. This is what lets a rebuilt consumer pick up where its
    /// predecessor left off.
    pub fn cached(&self, url: &str) -> Option<LoadResult> {
        let mut state = self.lock_state();
        state.cache.get(url).cloned()
    }

    /// Load the feed at `url`.
    ///
    /// Resolution order: the cached result if one exists; otherwise the
    /// in-flight load for this URL if one is running (no duplicate fetch);
    /// otherwise a fresh pipeline spawned on the background executor. The
    /// caller suspends on a completion channel and never blocks on network
    /// I/O itself.
    ///
    /// Dropping the returned future detaches this consumer: no completion
    /// notification fires for it, but the pipeline is not cancelled and its
    /// result is still cached for a future attach.
    pub async fn load(&self, url: &str) -> LoadResult {
        let mut rx = {
            let mut state = self.lock_state();

            if let Some(result) = state.cache.get(url) {
                tracing::debug!(url = %url, "serving cached feed result");
                return result.clone();
            }

            if let Some(flight) = state.in_flight.get(url) {
                tracing::debug!(url = %url, "joining in-flight feed load");
                flight.tx.subscribe()
            } else {
                let (tx, rx) = broadcast::channel(1);
                let id = state.next_flight_id;
                state.next_flight_id += 1;
                state.in_flight.insert(
                    url.to_owned(),
                    InFlight {
                        tx: tx.clone(),
                        id,
                    },
                );
                self.spawn_pipeline(url.to_owned(), tx, id);
                rx
            }
        };

        match rx.recv().await {
            Ok(result) => result,
            // The pipeline sends exactly once on every path; a closed
            // channel means the runtime tore the task down mid-flight.
            Err(_) => Err(LoadError::Network(
                "load task dropped before completion".to_string(),
            )),
        }
    }

    /// Clear the cache entry for `url`, forcing the next load to fetch.
    ///
    /// An in-flight load for this URL is not aborted: its result is still
    /// delivered to current subscribers, but discarded on arrival instead
    /// of being cached.
    pub fn invalidate(&self, url: &str) {
        let mut state = self.lock_state();
        let had_entry = state.cache.pop(url).is_some();
        let was_in_flight = state.in_flight.remove(url).is_some();
        if had_entry || was_in_flight {
            tracing::info!(url = %url, in_flight = was_in_flight, "feed cache entry invalidated");
        }
    }

    /// Clear every cache entry (pull-to-refresh across all URLs).
    pub fn invalidate_all(&self) {
        let mut state = self.lock_state();
        state.cache.clear();
        state.in_flight.clear();
        tracing::info!("feed cache cleared");
    }

    fn spawn_pipeline(&self, url: String, tx: broadcast::Sender<LoadResult>, id: u64) {
        let fetcher = self.fetcher.clone();
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            let result = run_pipeline(&fetcher, &url).await;

            let mut state = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let current = state.in_flight.get(&url).map(|f| f.id) == Some(id);
            if current {
                state.in_flight.remove(&url);
                state.cache.put(url.clone(), result.clone());
            } else {
                tracing::debug!(url = %url, "discarding stale feed result after invalidation");
            }

            // Send while the lock is held: subscribers registered under the
            // same lock, so every attached consumer either receives this
            // send or already sees the cache entry.
            let subscribers = tx.send(result).unwrap_or(0);
            tracing::debug!(url = %url, subscribers = subscribers, "feed load complete");
        });
    }

    fn lock_state(&self) -> MutexGuard<'_, LoaderState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One unit of work: fetch the body, extract wire records, normalize each
/// record's display date, assemble the final story list.
async fn run_pipeline(fetcher: &Fetcher, url: &str) -> LoadResult {
    let body = fetcher.fetch(url).await.map_err(LoadError::from)?;
    let raw = parse_feed(&body).map_err(LoadError::from)?;

    let stories: Arc<[Story]> = raw.into_iter().map(Story::from_raw).collect();
    tracing::info!(url = %url, stories = stories.len(), "feed loaded");
    Ok(stories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fetch_error_conversion() {
        assert_eq!(
            LoadError::from(FetchError::InvalidUrl),
            LoadError::InvalidUrl
        );
        assert_eq!(LoadError::from(FetchError::Timeout), LoadError::Timeout);
        assert_eq!(
            LoadError::from(FetchError::HttpStatus(503)),
            LoadError::HttpStatus(503)
        );
        assert_eq!(
            LoadError::from(FetchError::ResponseTooLarge),
            LoadError::ResponseTooLarge
        );
    }

    #[test]
    fn test_parse_error_conversion() {
        assert_eq!(
            LoadError::from(ParseError::MalformedTopLevel("bad".to_string())),
            LoadError::MalformedTopLevel("bad".to_string())
        );
    }

    #[tokio::test]
    async fn test_cached_is_empty_on_fresh_loader() {
        let loader = NewsLoader::new().unwrap();
        assert!(loader.cached("https://example.com/feed").is_none());
    }

    #[tokio::test]
    async fn test_invalidate_unknown_url_is_noop() {
        let loader = NewsLoader::new().unwrap();
        loader.invalidate("https://example.com/feed");
        loader.invalidate_all();
    }

    #[tokio::test]
    async fn test_invalid_url_load_fails_and_is_cached() {
        let loader = NewsLoader::new().unwrap();
        let err = loader.load("not a url").await.unwrap_err();
        assert_eq!(err, LoadError::InvalidUrl);

        // The failure is cached like any other completed result
        let cached = loader.cached("not a url").expect("failure should be cached");
        assert_eq!(cached.unwrap_err(), LoadError::InvalidUrl);
    }

    #[tokio::test]
    async fn test_zero_capacity_clamped() {
        let loader = NewsLoader::with_fetcher(Fetcher::new().unwrap(), 0);
        let _ = loader.load("still not a url").await;
        assert!(loader.cached("still not a url").is_some());
    }
}
