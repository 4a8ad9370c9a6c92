// Game service - kibitz visibility and the end-of-game lifecycle.
//
// Every command is gated on the invoker storytelling the game (or being a
// moderator). A denied command touches nothing.

use super::game_models::{
    archived_channel_name, kibitz_announcement, ArchivedGame, ChannelEdit, EndedGame, GameNaming,
    ARCHIVE_CATEGORY_CAPACITY,
};
use super::game_platform::{GamePlatform, TownSquareStore};
use crate::core::ports::{PlatformError, StoreError};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("You are not the current ST for game {0}")]
    NotAuthorized(String),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct GameSettings {
    pub naming: GameNaming,
    pub archive_category_id: u64,
    pub feedback_form_url: String,
}

pub struct GameService<P: GamePlatform> {
    platform: Arc<P>,
    town_squares: Option<Arc<dyn TownSquareStore>>,
    settings: GameSettings,
}

impl<P: GamePlatform> GameService<P> {
    pub fn new(platform: Arc<P>, settings: GameSettings) -> Self {
        Self {
            platform,
            town_squares: None,
            settings,
        }
    }

    /// Let EndGame clear the game's seating chart.
    pub fn with_town_squares(mut self, store: Arc<dyn TownSquareStore>) -> Self {
        self.town_squares = Some(store);
        self
    }

    async fn ensure_storyteller(&self, invoker: u64, game: &str) -> Result<(), GameError> {
        if self.platform.authorize_st(invoker, game).await? {
            Ok(())
        } else {
            Err(GameError::NotAuthorized(game.to_string()))
        }
    }

    /// Show the kibitz channel to everyone and announce it in `announce_in`.
    pub async fn open_kibitz(
        &self,
        invoker: u64,
        game: &str,
        announce_in: u64,
    ) -> Result<(), GameError> {
        self.ensure_storyteller(invoker, game).await?;
        let resources = self.platform.game_resources(game).await?;

        self.platform
            .set_everyone_can_view(resources.kibitz_channel_id, true)
            .await?;
        let announcement = kibitz_announcement(
            resources.game_role_id,
            &self.settings.feedback_form_url,
            false,
        );
        self.platform.send_message(announce_in, &announcement).await?;

        tracing::info!(game, "Kibitz opened");
        Ok(())
    }

    pub async fn close_kibitz(&self, invoker: u64, game: &str) -> Result<(), GameError> {
        self.ensure_storyteller(invoker, game).await?;
        let resources = self.platform.game_resources(game).await?;

        self.platform
            .set_everyone_can_view(resources.kibitz_channel_id, false)
            .await?;

        tracing::info!(game, "Kibitz closed");
        Ok(())
    }

    /// Announce the end, strip game and kibitz roles from every human, drop
    /// the town square and open kibitz.
    pub async fn end_game(
        &self,
        invoker: u64,
        game: &str,
        announce_in: u64,
    ) -> Result<EndedGame, GameError> {
        self.ensure_storyteller(invoker, game).await?;
        let resources = self.platform.game_resources(game).await?;

        let announcement = kibitz_announcement(
            resources.game_role_id,
            &self.settings.feedback_form_url,
            true,
        );
        self.platform.send_message(announce_in, &announcement).await?;

        let mut members = self.platform.role_members(resources.game_role_id).await?;
        members.extend(self.platform.role_members(resources.kibitz_role_id).await?);

        let mut seen = HashSet::new();
        let mut ended = EndedGame::default();
        for member in members {
            if member.bot || !seen.insert(member.id) {
                continue;
            }
            self.platform
                .remove_member_role(member.id, resources.kibitz_role_id)
                .await?;
            self.platform
                .remove_member_role(member.id, resources.game_role_id)
                .await?;
            ended.members_cleared += 1;
        }

        if let Some(town_squares) = &self.town_squares {
            ended.town_square_removed = town_squares.remove_game(game).await?;
        }

        self.platform
            .set_everyone_can_view(resources.kibitz_channel_id, true)
            .await?;

        tracing::info!(
            game,
            members = ended.members_cleared,
            town_square = ended.town_square_removed,
            "Game ended"
        );
        Ok(ended)
    }

    /// Move the game channel into the archive category and put a fresh copy
    /// in its place.
    pub async fn archive_game(
        &self,
        invoker: u64,
        game: &str,
        now: DateTime<Utc>,
    ) -> Result<ArchivedGame, GameError> {
        self.ensure_storyteller(invoker, game).await?;
        let resources = self.platform.game_resources(game).await?;
        let game_channel = resources.game_channel;

        let replacement = self.platform.clone_channel(game_channel.id).await?;

        let mut archived = self
            .platform
            .category_channels(self.settings.archive_category_id)
            .await?;
        let mut evicted = Vec::new();
        while archived.len() >= ARCHIVE_CATEGORY_CAPACITY {
            let Some(oldest) = archived.pop() else { break };
            self.platform.delete_channel(oldest.id).await?;
            evicted.push(oldest.id);
        }

        self.platform
            .edit_channel(
                game_channel.id,
                ChannelEdit {
                    name: Some(archived_channel_name(&game_channel.name, now)),
                    category_id: Some(self.settings.archive_category_id),
                    topic: Some(String::new()),
                    ..Default::default()
                },
            )
            .await?;

        self.platform
            .edit_channel(
                replacement.id,
                ChannelEdit {
                    name: Some(self.settings.naming.game_channel(game)),
                    position: Some(game_channel.position),
                    topic: Some(String::new()),
                    ..Default::default()
                },
            )
            .await?;

        self.platform
            .set_everyone_can_view(resources.kibitz_channel_id, false)
            .await?;

        tracing::info!(
            game,
            archived = game_channel.id,
            replacement = replacement.id,
            evicted = evicted.len(),
            "Game channel archived"
        );

        Ok(ArchivedGame {
            archived_channel_id: game_channel.id,
            replacement_channel_id: replacement.id,
            evicted_channel_ids: evicted,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
