// Ports shared by every feature that talks to the chat platform.
//
// The core never sees serenity types. Ids are plain u64 snowflakes and
// platform failures are reduced to the few cases the handlers react to.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Platform error: {0}")]
    Other(String),
}

/// Errors raised by the JSON-backed stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ============================================================================
// SHARED VIEWS
// ============================================================================

/// Kinds of guild resources that are looked up by name and created on a miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Role,
    TextChannel,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Role => write!(f, "role"),
            ResourceKind::TextChannel => write!(f, "text channel"),
        }
    }
}

/// A guild channel as the handlers see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: u64,
    pub name: String,
    pub position: u16,
}

// ============================================================================
// AUTHORIZATION
// ============================================================================

/// Permission checks used to gate moderator and storyteller commands.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Whether the user holds the moderator role in the home guild.
    async fn authorize_mod(&self, user_id: u64) -> Result<bool, PlatformError>;

    /// Whether the user storytells the given game (moderators always pass).
    async fn authorize_st(&self, user_id: u64, game: &str) -> Result<bool, PlatformError>;
}
