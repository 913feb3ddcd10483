//! Network side of quarry: a retrying HTTP fetcher and the [`Scraper`]
//! builder that feeds fetched pages into schema extraction.

pub mod error;
pub mod fetch;
pub mod scraper;

pub use error::{FetchError, Result, ScrapeError};
pub use fetch::{ClientPool, FetchOptions, Fetcher, HeaderMap, Method, Response, backoff_delay};
pub use scraper::Scraper;
