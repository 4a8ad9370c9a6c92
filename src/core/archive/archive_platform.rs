// Platform ports for the archive feature.
//
// The serenity adapter in `infra/platform` implements all of these; tests
// implement them with in-memory recorders.

use super::archive_models::{ActiveThread, ArchivedMessage, RenderedPost, ThreadInfo, ThreadVisibility};
use crate::core::ports::{Authorizer, ChannelRef, PlatformError, ResourceKind};
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

/// Why a post to the destination failed.
#[derive(Debug, Error)]
pub enum PostError {
    /// Rejected before sending because the files exceed the upload limit.
    #[error("Attachments exceed the upload limit")]
    AttachmentsTooLarge,

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Post failed: {0}")]
    Other(String),
}

impl PostError {
    pub fn is_payload_too_large(&self) -> bool {
        matches!(
            self,
            PostError::AttachmentsTooLarge | PostError::Http { status: 413, .. }
        )
    }
}

/// Oldest-first, unbounded message history. Restartable only by asking the
/// platform for a fresh stream.
pub type HistoryStream<'a> = BoxStream<'a, Result<ArchivedMessage, PlatformError>>;

/// Anything that can receive re-posted history (channels and threads alike).
#[async_trait]
pub trait MessagePoster: Send + Sync {
    /// Post a rendered message, uploading its attachments.
    async fn post_rendered(&self, channel_id: u64, post: &RenderedPost) -> Result<(), PostError>;

    async fn post_text(&self, channel_id: u64, text: &str) -> Result<(), PostError>;
}

/// Everything the off-server archive and ClaimRole need from the platform.
#[async_trait]
pub trait ArchivePlatform: MessagePoster + Authorizer {
    /// Whether the bot can reach the guild at all.
    async fn guild_exists(&self, guild_id: u64) -> Result<bool, PlatformError>;

    /// Returns the channel id when it belongs to the guild.
    async fn find_channel(&self, guild_id: u64, channel_id: u64)
        -> Result<Option<u64>, PlatformError>;

    /// Look a role or text channel up by name, creating it on a miss.
    async fn get_or_create(
        &self,
        guild_id: u64,
        kind: ResourceKind,
        name: &str,
    ) -> Result<u64, PlatformError>;

    /// Fails with `PlatformError::NotFound` when the user is not in the guild.
    async fn add_member_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), PlatformError>;

    /// Threads under a channel, active and archived.
    async fn list_threads(&self, channel_id: u64) -> Result<Vec<ThreadInfo>, PlatformError>;

    /// Private threads get a 3-day auto-archive and are invitable.
    async fn create_thread(
        &self,
        channel_id: u64,
        name: &str,
        visibility: ThreadVisibility,
    ) -> Result<u64, PlatformError>;

    fn history(&self, channel_id: u64) -> HistoryStream<'_>;

    /// Let the role manage threads in the channel.
    async fn grant_thread_management(
        &self,
        channel_id: u64,
        role_id: u64,
    ) -> Result<(), PlatformError>;
}

/// What the daily refresh sweep needs from the home guild.
#[async_trait]
pub trait ThreadSweepPlatform: Send + Sync {
    async fn category_channels(&self, category_id: u64) -> Result<Vec<ChannelRef>, PlatformError>;

    async fn active_threads(&self) -> Result<Vec<ActiveThread>, PlatformError>;

    async fn set_auto_archive(&self, thread_id: u64, minutes: u16) -> Result<(), PlatformError>;
}
