//! Lifecycle-aware news feed loader.
//!
//! `headlines` fetches one page of a JSON news feed, normalizes each entry
//! into an immutable [`Story`], and serves the result set through
//! [`NewsLoader`] — a coordinator that deduplicates concurrent requests per
//! URL and caches the last completed result so a consumer that is torn down
//! and rebuilt never re-issues the network call.
//!
//! The pipeline is fetch → parse → normalize:
//!
//! - [`Fetcher`] issues a single bounded-timeout GET (15s connect, 10s read)
//! - [`parse_feed`] extracts `{"response": {"results": [...]}}` into wire
//!   records, all-or-nothing
//! - [`format_display`] turns each publication timestamp into a short
//!   display date, degrading per item instead of failing the batch
//!
//! # Example
//!
//! ```ignore
//! use headlines::{Config, NewsLoader};
//!
//! let config = Config::load(&config_path)?;
//! let loader = NewsLoader::from_config(&config)?;
//! let url = config.query_url()?;
//!
//! match loader.load(&url).await {
//!     Ok(stories) => render(&stories),
//!     Err(e) => render_error(&e),
//! }
//!
//! // Pull-to-refresh: drop the cached result, then load again.
//! loader.invalidate(&url);
//! ```

mod config;
mod feed;
mod loader;
mod model;

pub use config::{Config, ConfigError, API_KEY_ENV};
pub use feed::{
    format_display, parse_feed, FetchError, Fetcher, ParseError, CONNECT_TIMEOUT, READ_TIMEOUT,
};
pub use loader::{LoadError, LoadResult, NewsLoader, DEFAULT_CACHE_CAPACITY};
pub use model::{RawStory, Story};
