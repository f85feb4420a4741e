//! Error taxonomy for an ingestion run.
//!
//! Every variant is fatal: the run unwinds on first error, with no retry
//! and no cleanup of collections populated by earlier stages. Downstream
//! consumers must tolerate (or discard) that partial state.

use crate::config::ConfigError;
use shopgraph_client::{PaginateError, TransportError};
use shopgraph_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("protocol violation: {0}")]
    Protocol(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<PaginateError> for SourceError {
    fn from(err: PaginateError) -> Self {
        match err {
            PaginateError::Transport(e) => SourceError::Transport(e),
            PaginateError::Protocol(message) => SourceError::Protocol(message),
        }
    }
}
