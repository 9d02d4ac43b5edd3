//! Source adapter contract + one adapter per covered municipality.
//!
//! Every adapter owns the quirks of exactly one source: which page to
//! fetch, which markup to trust, which columns map onto [`RawRecord`].
//! Fetching is separated from parsing so the parsers run against plain
//! strings in tests. The orchestrator consumes adapters only through
//! [`SourceAdapter`] and the fixed-order [`registry`].

mod boston;
mod cambridge;
mod concord;
mod detail;
mod html;
mod newton;
mod quincy;
mod somerville;
mod worcester;

pub use boston::BostonAdapter;
pub use cambridge::CambridgeAdapter;
pub use concord::ConcordAdapter;
pub use newton::NewtonAdapter;
pub use quincy::QuincyAdapter;
pub use somerville::SomervilleAdapter;
pub use worcester::WorcesterAdapter;

use async_trait::async_trait;
use munibid_core::{City, RawRecord, Status};
use munibid_storage::{FetchError, HttpFetcher};
use thiserror::Error;

pub const CRATE_NAME: &str = "munibid-adapters";

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("{0}")]
    Message(String),
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source_id(&self) -> &'static str;
    fn city(&self) -> City;
    fn source_type(&self) -> &'static str;

    /// Status for records whose source shows no due date at all. Sources
    /// disagree on what an empty deadline means; each adapter states its
    /// own policy instead of the pipeline guessing.
    fn missing_due_status(&self) -> Status {
        Status::Open
    }

    /// Fetch and extract this source's current postings. An empty vec is
    /// a valid outcome; an error means the listing itself was unusable
    /// and the orchestrator moves on without this source.
    async fn scrape(&self, http: &HttpFetcher) -> Result<Vec<RawRecord>, AdapterError>;
}

/// All adapters in their fixed invocation order. The orchestrator never
/// builds adapters any other way.
pub fn registry() -> Vec<Box<dyn SourceAdapter>> {
    vec![
        Box::new(SomervilleAdapter::default()),
        Box::new(CambridgeAdapter::default()),
        Box::new(QuincyAdapter::default()),
        Box::new(BostonAdapter::default()),
        Box::new(WorcesterAdapter::default()),
        Box::new(ConcordAdapter::default()),
        Box::new(NewtonAdapter::default()),
    ]
}
