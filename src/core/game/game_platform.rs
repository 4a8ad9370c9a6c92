use super::game_models::{ChannelEdit, GameResources, MemberRef};
use crate::core::ports::{Authorizer, ChannelRef, PlatformError, StoreError};
use async_trait::async_trait;

/// What the game lifecycle commands need from the home guild.
#[async_trait]
pub trait GamePlatform: Authorizer {
    /// Resolve the game's channels and roles, `NotFound` if any is missing.
    async fn game_resources(&self, game: &str) -> Result<GameResources, PlatformError>;

    /// Allow or deny @everyone viewing the channel.
    async fn set_everyone_can_view(&self, channel_id: u64, visible: bool)
        -> Result<(), PlatformError>;

    async fn send_message(&self, channel_id: u64, text: &str) -> Result<(), PlatformError>;

    async fn role_members(&self, role_id: u64) -> Result<Vec<MemberRef>, PlatformError>;

    async fn remove_member_role(&self, user_id: u64, role_id: u64) -> Result<(), PlatformError>;

    /// Duplicate a channel (name, topic, permissions, category) and return
    /// the copy.
    async fn clone_channel(&self, channel_id: u64) -> Result<ChannelRef, PlatformError>;

    /// Channels in the category, ordered by position (top first).
    async fn category_channels(&self, category_id: u64) -> Result<Vec<ChannelRef>, PlatformError>;

    async fn delete_channel(&self, channel_id: u64) -> Result<(), PlatformError>;

    async fn edit_channel(&self, channel_id: u64, edit: ChannelEdit) -> Result<(), PlatformError>;
}

/// The seating-chart state kept by the town square component.
///
/// Only removal is needed here; the town square owns the rest of the
/// lifecycle.
#[async_trait]
pub trait TownSquareStore: Send + Sync {
    /// Returns whether the game had a town square.
    async fn remove_game(&self, game: &str) -> Result<bool, StoreError>;
}
