//! Error handling for espejo operations.
//!
//! All public APIs return `Result<T, Error>`. Failures are either
//! prevented up front (identifier validation) or surfaced to the caller
//! unchanged (transport errors); there is no retry or compensation
//! logic anywhere in the crate.

use thiserror::Error;

/// Result type for espejo operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while mirroring or synchronizing a graph.
#[derive(Debug, Error)]
pub enum Error {
    /// A name failed the identifier grammar check.
    ///
    /// Raised at `add_node` time, before any network interaction, so the
    /// caller can fix the offending data and retry the single add.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Invalid argument or operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Requested resource was not found.
    ///
    /// Returned by the catalog lookups when an index is still out of
    /// range after a refresh from the remote store.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The transport collaborator failed.
    ///
    /// Propagated unchanged from the connection; espejo performs no
    /// retries and no partial-failure bookkeeping.
    #[error("transport error: {0}")]
    Transport(String),

    /// A raw reply did not decode into the expected shape.
    #[error("malformed reply: {0}")]
    Response(String),
}
