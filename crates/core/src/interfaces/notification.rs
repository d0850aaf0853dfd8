use std::fmt;
use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Handle of something the gateway has posted (a message id, a URL, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PostingRef(pub String);

impl PostingRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors raised by a notification gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The remote platform could not be reached
    #[error("Gateway unreachable: {0}")]
    Unreachable(String),

    /// The platform refused the request
    #[error("Gateway rejected request: {0}")]
    Rejected(String),

    /// The posting reference is unknown to the platform
    #[error("Unknown posting: {0}")]
    UnknownPosting(PostingRef),
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Outbound notifications. Content is plain text; rendering it for a given
/// platform is the adapter's business.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Post to the public announcement feed
    async fn announce(&self, text: &str) -> GatewayResult<()>;

    /// Privately message a single host
    async fn direct_message(&self, host_id: &str, text: &str) -> GatewayResult<()>;

    /// Alert the staff feed
    async fn alert_staff(&self, text: &str) -> GatewayResult<()>;

    /// Publish a new proposal and return where it lives
    async fn post_proposal(&self, number: u64, content: &str) -> GatewayResult<PostingRef>;

    /// Publish a new official rule and return where it lives
    async fn post_official_rule(&self, number: u64, content: &str) -> GatewayResult<PostingRef>;

    /// Replace the content of an existing posting
    async fn update_posting(&self, posting: &PostingRef, content: &str) -> GatewayResult<()>;

    /// Attach approve / disapprove / no-opinion controls to a posting
    async fn enable_voting_controls(&self, posting: &PostingRef) -> GatewayResult<()>;

    /// Strip voting controls from a posting
    async fn disable_voting_controls(&self, posting: &PostingRef) -> GatewayResult<()>;
}
