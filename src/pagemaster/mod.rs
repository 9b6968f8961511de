//! Cursor pagination module
//!
//! # Overview
//!
//! [`PageMaster`] turns the query string of an inbound request into one
//! bounded, `_id`-descending range query against a document collection and
//! hands back an opaque continuation token for the next page.
//!
//! ```rust,ignore
//! use api_util::pagemaster::{PageConfig, PageMaster, PageSource};
//!
//! async fn list(source: PageSource, store: Arc<dyn DocumentStore>) -> Result<Response> {
//!     let mut page = PageMaster::new(
//!         PageConfig::new()
//!             .collection("events")
//!             .source(source)
//!             .store(store),
//!     )?;
//!     let docs = page.find_page().await?;
//!     Ok(viewer::send_page(&docs, page.next_token()))
//! }
//! ```
//!
//! Clients pass the `next` token back verbatim as `?from=` to get the
//! following page. An empty token means the last page was reached.

mod master;
mod types;

pub use master::PageMaster;
pub use types::{
    cancel_pair, CancelHandle, CancelSignal, PageConfig, PageSource, DEFAULT_PAGE_SIZE,
    DEFAULT_QUERY_TIMEOUT, FROM_PARAM, MAX_PAGE_SIZE, PAGE_SIZE_PARAM,
};

#[cfg(test)]
mod tests;
