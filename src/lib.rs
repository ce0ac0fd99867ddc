//! Client for resolving Apify actor input schemas.
//!
//! The registry is inconsistent about where an actor's input schema lives:
//! sometimes it is declared on the latest published version, sometimes it is
//! embedded on the actor record itself, sometimes it only exists rendered
//! into the actor's public store page, and sometimes all that remains is a
//! recorded example invocation. [`ActorsClient::input_schema`] walks those
//! sources in order of trustworthiness and returns the first usable schema,
//! or the canonical empty object when every source comes up dry.
// Allow large error types - refactoring to Box<Error> would be a breaking change
#![allow(clippy::result_large_err)]

/// Default registry API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.apify.com/v2";

/// Default base URL for public actor store pages.
pub const DEFAULT_DOCS_BASE_URL: &str = "https://apify.com";

/// Default User-Agent sent on registry API calls.
pub(crate) const DEFAULT_CLIENT_HEADER: &str = concat!("apify-schema/", env!("CARGO_PKG_VERSION"));

/// Browser-like User-Agent for store-page fetches; the store varies its
/// response shape by client.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default connection timeout (5 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Default request timeout (30 seconds). The store-page fetch targets an
/// uncontrolled origin, so every network call stays bounded.
pub const DEFAULT_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

#[cfg(feature = "blocking")]
mod blocking;
mod client;
mod errors;
mod extract;
mod http;
#[cfg(feature = "mock")]
mod mock;
mod resolve;
mod scrape;
mod types;

#[cfg(feature = "blocking")]
pub use blocking::{BlockingActorsClient, BlockingClient, BlockingConfig};
pub use client::{ActorsClient, Client, Config};
pub use errors::{APIError, Error, Result, TransportError, TransportErrorKind};
#[cfg(feature = "mock")]
pub use mock::{fixtures, MockActorsClient, MockClient, MockConfig};
pub use types::{
    ActorMetadata, ActorRef, ActorSummary, ExampleRunInput, Field, PropertySchema, Schema,
    VersionRecord,
};
