//! The network seam between the content service and a content API.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::application::normalize::ShapeError;
use crate::domain::resources::ResourceKey;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("content API answered status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode response body: {0}")]
    Decode(String),
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

impl FetchError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Status { .. } => "status",
            FetchError::Decode(_) | FetchError::Shape(_) => "malformed",
        }
    }
}

/// Issues one request for a resource and returns the decoded JSON body.
///
/// Implementations make a single attempt; retries and fallbacks belong to
/// the caller.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, resource: &ResourceKey) -> Result<Value, FetchError>;
}
