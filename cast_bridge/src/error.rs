use crate::link::RemoteLinkState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("malformed custom message: {0}")]
    Envelope(#[from] serde_json::Error),
    #[error("unrecognized action: {0}")]
    UnrecognizedAction(String),
    #[error("missing field for action: {0}")]
    MissingField(&'static str),
    #[error("unusable peer address {address:?}: {reason}")]
    Address { address: String, reason: String },
    #[error("remote link transport: {0}")]
    Transport(String),
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("remote link not open (state: {0:?})")]
    NotOpen(RemoteLinkState),
    #[error("outbound queue full")]
    Backpressure,
    #[error("serialize failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("audio chunk is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} not found in repository")]
    NotFound(String),
    #[error("content repository unavailable: {0}")]
    RepositoryUnavailable(String),
}
