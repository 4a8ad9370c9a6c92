// Serenity-backed implementation of every platform port.
//
// All calls go through the HTTP client. Member and channel listings are
// fetched fresh so the handlers never hold cache references across awaits.

use super::history_pages::history_stream;
use super::platform_error;
use crate::core::archive::{
    ActiveThread, ArchivePlatform, HistoryStream, MessagePoster, PostError, RenderedPost,
    ThreadInfo, ThreadSweepPlatform, ThreadVisibility,
};
use crate::core::game::{ChannelEdit, GameNaming, GamePlatform, GameResources, MemberRef};
use crate::core::ports::{Authorizer, ChannelRef, PlatformError, ResourceKind};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::collections::HashMap;
use std::sync::Arc;

/// Discord's default upload limit for servers without boosts.
pub const DEFAULT_UPLOAD_LIMIT_BYTES: u64 = 8 * 1024 * 1024;

const MEMBER_PAGE_SIZE: u64 = 1000;
const ARCHIVED_THREAD_PAGE_SIZE: u64 = 100;
const PRIVATE_THREAD_REASON: &str = "Private Thread";

#[derive(Debug, Clone)]
pub struct PlatformSettings {
    pub home_guild_id: u64,
    pub mod_role_id: u64,
    pub naming: GameNaming,
    pub upload_limit_bytes: u64,
}

pub struct SerenityPlatform {
    http: Arc<serenity::Http>,
    settings: PlatformSettings,
}

impl SerenityPlatform {
    pub fn new(http: Arc<serenity::Http>, settings: PlatformSettings) -> Self {
        Self { http, settings }
    }

    fn home(&self) -> serenity::GuildId {
        serenity::GuildId::new(self.settings.home_guild_id)
    }

    /// Roles the user holds in the home guild, `None` when not a member.
    async fn home_roles(&self, user_id: u64) -> Result<Option<Vec<serenity::RoleId>>, PlatformError> {
        match self
            .http
            .get_member(self.home(), serenity::UserId::new(user_id))
            .await
        {
            Ok(member) => Ok(Some(member.roles)),
            Err(err) => match platform_error(err) {
                PlatformError::Http { status: 404, .. } => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn guild_channel(&self, channel_id: u64) -> Result<serenity::GuildChannel, PlatformError> {
        let channel = serenity::ChannelId::new(channel_id)
            .to_channel(&*self.http)
            .await
            .map_err(platform_error)?;
        channel
            .guild()
            .ok_or_else(|| PlatformError::NotFound(format!("guild channel {channel_id}")))
    }

    async fn guild_channels(
        &self,
        guild_id: serenity::GuildId,
    ) -> Result<HashMap<serenity::ChannelId, serenity::GuildChannel>, PlatformError> {
        guild_id.channels(&*self.http).await.map_err(platform_error)
    }

    async fn guild_roles(
        &self,
        guild_id: serenity::GuildId,
    ) -> Result<HashMap<serenity::RoleId, serenity::Role>, PlatformError> {
        guild_id.roles(&*self.http).await.map_err(platform_error)
    }

    async fn role_named(&self, guild_id: serenity::GuildId, name: &str) -> Result<u64, PlatformError> {
        self.guild_roles(guild_id)
            .await?
            .values()
            .find(|r| r.name == name)
            .map(|r| r.id.get())
            .ok_or_else(|| PlatformError::NotFound(format!("role {name}")))
    }

    async fn home_channels_in(&self, category_id: u64) -> Result<Vec<ChannelRef>, PlatformError> {
        let category = serenity::ChannelId::new(category_id);
        let mut channels: Vec<_> = self
            .guild_channels(self.home())
            .await?
            .into_values()
            .filter(|c| c.parent_id == Some(category))
            .collect();
        channels.sort_by_key(|c| (c.position, c.id));

        Ok(channels.into_iter().map(channel_ref).collect())
    }

    async fn set_view_permission(&self, channel_id: u64, visible: bool) -> Result<(), PlatformError> {
        let channel = self.guild_channel(channel_id).await?;
        let everyone =
            serenity::PermissionOverwriteType::Role(serenity::RoleId::new(self.settings.home_guild_id));

        // Keep whatever else the @everyone overwrite already says.
        let (mut allow, mut deny) = channel
            .permission_overwrites
            .iter()
            .find(|o| o.kind == everyone)
            .map(|o| (o.allow, o.deny))
            .unwrap_or((serenity::Permissions::empty(), serenity::Permissions::empty()));
        if visible {
            allow.insert(serenity::Permissions::VIEW_CHANNEL);
            deny.remove(serenity::Permissions::VIEW_CHANNEL);
        } else {
            allow.remove(serenity::Permissions::VIEW_CHANNEL);
            deny.insert(serenity::Permissions::VIEW_CHANNEL);
        }

        channel
            .id
            .create_permission(
                &*self.http,
                serenity::PermissionOverwrite {
                    allow,
                    deny,
                    kind: everyone,
                },
            )
            .await
            .map_err(platform_error)
    }

    async fn edit_auto_archive(&self, thread_id: u64, minutes: u16) -> Result<(), PlatformError> {
        serenity::ChannelId::new(thread_id)
            .edit_thread(
                &*self.http,
                serenity::EditThread::new()
                    .auto_archive_duration(serenity::AutoArchiveDuration::from(minutes)),
            )
            .await
            .map_err(platform_error)?;
        Ok(())
    }

    async fn send_text(&self, channel_id: u64, text: &str) -> Result<(), serenity::Error> {
        serenity::ChannelId::new(channel_id)
            .say(&*self.http, text)
            .await?;
        Ok(())
    }
}

fn channel_ref(channel: serenity::GuildChannel) -> ChannelRef {
    ChannelRef {
        id: channel.id.get(),
        name: channel.name,
        position: channel.position,
    }
}

fn thread_info(thread: &serenity::GuildChannel) -> ThreadInfo {
    ThreadInfo {
        id: thread.id.get(),
        name: thread.name.clone(),
        visibility: if thread.kind == serenity::ChannelType::PrivateThread {
            ThreadVisibility::Private
        } else {
            ThreadVisibility::Public
        },
    }
}

fn post_error(err: serenity::Error) -> PostError {
    match platform_error(err) {
        PlatformError::Http { status, message } => PostError::Http { status, message },
        other => PostError::Other(other.to_string()),
    }
}

// ============================================================================
// AUTHORIZATION
// ============================================================================

#[async_trait]
impl Authorizer for SerenityPlatform {
    async fn authorize_mod(&self, user_id: u64) -> Result<bool, PlatformError> {
        let mod_role = serenity::RoleId::new(self.settings.mod_role_id);
        Ok(self
            .home_roles(user_id)
            .await?
            .is_some_and(|roles| roles.contains(&mod_role)))
    }

    async fn authorize_st(&self, user_id: u64, game: &str) -> Result<bool, PlatformError> {
        let Some(roles) = self.home_roles(user_id).await? else {
            return Ok(false);
        };
        if roles.contains(&serenity::RoleId::new(self.settings.mod_role_id)) {
            return Ok(true);
        }

        let st_role = self.settings.naming.st_role(game);
        let guild_roles = self.guild_roles(self.home()).await?;
        Ok(roles
            .iter()
            .filter_map(|id| guild_roles.get(id))
            .any(|role| role.name == st_role))
    }
}

// ============================================================================
// ARCHIVE
// ============================================================================

#[async_trait]
impl MessagePoster for SerenityPlatform {
    async fn post_rendered(&self, channel_id: u64, post: &RenderedPost) -> Result<(), PostError> {
        if post.total_attachment_size() > self.settings.upload_limit_bytes {
            return Err(PostError::AttachmentsTooLarge);
        }

        let mut files = Vec::with_capacity(post.attachments.len());
        for attachment in &post.attachments {
            files.push(
                serenity::CreateAttachment::url(&*self.http, &attachment.url)
                    .await
                    .map_err(post_error)?,
            );
        }

        let mut author = serenity::CreateEmbedAuthor::new(&post.author_line);
        if let Some(icon_url) = &post.icon_url {
            author = author.icon_url(icon_url);
        }
        let mut embed = serenity::CreateEmbed::new().author(author);
        if !post.description.is_empty() {
            embed = embed.description(&post.description);
        }
        if let Some(footer) = &post.footer {
            embed = embed.footer(serenity::CreateEmbedFooter::new(footer));
        }

        serenity::ChannelId::new(channel_id)
            .send_message(
                &*self.http,
                serenity::CreateMessage::new().embed(embed).add_files(files),
            )
            .await
            .map_err(post_error)?;
        Ok(())
    }

    async fn post_text(&self, channel_id: u64, text: &str) -> Result<(), PostError> {
        self.send_text(channel_id, text).await.map_err(post_error)
    }
}

#[async_trait]
impl ArchivePlatform for SerenityPlatform {
    async fn guild_exists(&self, guild_id: u64) -> Result<bool, PlatformError> {
        match serenity::GuildId::new(guild_id)
            .to_partial_guild(&*self.http)
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => match platform_error(err) {
                PlatformError::Http {
                    status: 403 | 404, ..
                } => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn find_channel(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> Result<Option<u64>, PlatformError> {
        match self.guild_channel(channel_id).await {
            Ok(channel) if channel.guild_id.get() == guild_id => Ok(Some(channel_id)),
            Ok(_) | Err(PlatformError::NotFound(_)) => Ok(None),
            Err(PlatformError::Http {
                status: 403 | 404, ..
            }) => Ok(None),
            Err(other) => Err(other),
        }
    }

    async fn get_or_create(
        &self,
        guild_id: u64,
        kind: ResourceKind,
        name: &str,
    ) -> Result<u64, PlatformError> {
        let guild = serenity::GuildId::new(guild_id);
        match kind {
            ResourceKind::Role => {
                if let Some(role) = self.guild_roles(guild).await?.values().find(|r| r.name == name) {
                    return Ok(role.id.get());
                }
                let role = guild
                    .create_role(&*self.http, serenity::EditRole::new().name(name))
                    .await
                    .map_err(platform_error)?;
                tracing::info!(guild_id, name, "Created role");
                Ok(role.id.get())
            }
            ResourceKind::TextChannel => {
                if let Some(channel) = self
                    .guild_channels(guild)
                    .await?
                    .values()
                    .find(|c| c.kind == serenity::ChannelType::Text && c.name == name)
                {
                    return Ok(channel.id.get());
                }
                let channel = guild
                    .create_channel(
                        &*self.http,
                        serenity::CreateChannel::new(name).kind(serenity::ChannelType::Text),
                    )
                    .await
                    .map_err(platform_error)?;
                tracing::info!(guild_id, name, "Created text channel");
                Ok(channel.id.get())
            }
        }
    }

    async fn add_member_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), PlatformError> {
        let result = self
            .http
            .add_member_role(
                serenity::GuildId::new(guild_id),
                serenity::UserId::new(user_id),
                serenity::RoleId::new(role_id),
                None,
            )
            .await;

        match result.map_err(platform_error) {
            Err(PlatformError::Http { status: 404, .. }) => {
                Err(PlatformError::NotFound(format!("member {user_id}")))
            }
            other => other,
        }
    }

    async fn list_threads(&self, channel_id: u64) -> Result<Vec<ThreadInfo>, PlatformError> {
        let channel = self.guild_channel(channel_id).await?;

        let active = channel
            .guild_id
            .get_active_threads(&*self.http)
            .await
            .map_err(platform_error)?;
        let public = channel
            .id
            .get_archived_public_threads(&*self.http, None, Some(ARCHIVED_THREAD_PAGE_SIZE))
            .await
            .map_err(platform_error)?;
        let private = channel
            .id
            .get_archived_private_threads(&*self.http, None, Some(ARCHIVED_THREAD_PAGE_SIZE))
            .await
            .map_err(platform_error)?;

        let mut threads: Vec<ThreadInfo> = Vec::new();
        for thread in active
            .threads
            .iter()
            .filter(|t| t.parent_id == Some(channel.id))
            .chain(public.threads.iter())
            .chain(private.threads.iter())
        {
            if !threads.iter().any(|t| t.id == thread.id.get()) {
                threads.push(thread_info(thread));
            }
        }
        Ok(threads)
    }

    async fn create_thread(
        &self,
        channel_id: u64,
        name: &str,
        visibility: ThreadVisibility,
    ) -> Result<u64, PlatformError> {
        let builder = match visibility {
            ThreadVisibility::Public => {
                serenity::CreateThread::new(name).kind(serenity::ChannelType::PublicThread)
            }
            ThreadVisibility::Private => serenity::CreateThread::new(name)
                .kind(serenity::ChannelType::PrivateThread)
                .auto_archive_duration(serenity::AutoArchiveDuration::ThreeDays)
                .invitable(true)
                .audit_log_reason(PRIVATE_THREAD_REASON),
        };

        let thread = serenity::ChannelId::new(channel_id)
            .create_thread(&*self.http, builder)
            .await
            .map_err(platform_error)?;
        Ok(thread.id.get())
    }

    fn history(&self, channel_id: u64) -> HistoryStream<'_> {
        history_stream(&self.http, serenity::ChannelId::new(channel_id))
    }

    async fn grant_thread_management(
        &self,
        channel_id: u64,
        role_id: u64,
    ) -> Result<(), PlatformError> {
        serenity::ChannelId::new(channel_id)
            .create_permission(
                &*self.http,
                serenity::PermissionOverwrite {
                    allow: serenity::Permissions::MANAGE_THREADS,
                    deny: serenity::Permissions::empty(),
                    kind: serenity::PermissionOverwriteType::Role(serenity::RoleId::new(role_id)),
                },
            )
            .await
            .map_err(platform_error)
    }
}

// ============================================================================
// GAMES
// ============================================================================

#[async_trait]
impl GamePlatform for SerenityPlatform {
    async fn game_resources(&self, game: &str) -> Result<GameResources, PlatformError> {
        let naming = &self.settings.naming;
        let channels = self.guild_channels(self.home()).await?;
        let find_channel = |name: String| {
            channels
                .values()
                .find(|c| c.kind == serenity::ChannelType::Text && c.name == name)
                .cloned()
                .ok_or(PlatformError::NotFound(format!("channel {name}")))
        };

        let game_channel = find_channel(naming.game_channel(game))?;
        let kibitz_channel = find_channel(naming.kibitz_channel(game))?;

        Ok(GameResources {
            game_channel: channel_ref(game_channel),
            kibitz_channel_id: kibitz_channel.id.get(),
            game_role_id: self.role_named(self.home(), &naming.game_role(game)).await?,
            kibitz_role_id: self.role_named(self.home(), &naming.kibitz_role(game)).await?,
        })
    }

    async fn set_everyone_can_view(
        &self,
        channel_id: u64,
        visible: bool,
    ) -> Result<(), PlatformError> {
        self.set_view_permission(channel_id, visible).await
    }

    async fn send_message(&self, channel_id: u64, text: &str) -> Result<(), PlatformError> {
        self.send_text(channel_id, text).await.map_err(platform_error)
    }

    async fn role_members(&self, role_id: u64) -> Result<Vec<MemberRef>, PlatformError> {
        let role = serenity::RoleId::new(role_id);
        let mut holders = Vec::new();
        let mut after = None;

        loop {
            let page = self
                .http
                .get_guild_members(self.home(), Some(MEMBER_PAGE_SIZE), after)
                .await
                .map_err(platform_error)?;
            let full_page = page.len() as u64 == MEMBER_PAGE_SIZE;
            after = page.last().map(|m| m.user.id.get());

            holders.extend(page.iter().filter(|m| m.roles.contains(&role)).map(|m| MemberRef {
                id: m.user.id.get(),
                bot: m.user.bot,
            }));

            if !full_page {
                return Ok(holders);
            }
        }
    }

    async fn remove_member_role(&self, user_id: u64, role_id: u64) -> Result<(), PlatformError> {
        self.http
            .remove_member_role(
                self.home(),
                serenity::UserId::new(user_id),
                serenity::RoleId::new(role_id),
                None,
            )
            .await
            .map_err(platform_error)
    }

    async fn clone_channel(&self, channel_id: u64) -> Result<ChannelRef, PlatformError> {
        let original = self.guild_channel(channel_id).await?;

        let mut builder = serenity::CreateChannel::new(original.name.clone())
            .kind(original.kind)
            .nsfw(original.nsfw)
            .permissions(original.permission_overwrites.clone());
        if let Some(topic) = &original.topic {
            builder = builder.topic(topic.clone());
        }
        if let Some(category) = original.parent_id {
            builder = builder.category(category);
        }
        if let Some(rate_limit) = original.rate_limit_per_user {
            builder = builder.rate_limit_per_user(rate_limit);
        }

        let copy = original
            .guild_id
            .create_channel(&*self.http, builder)
            .await
            .map_err(platform_error)?;
        Ok(channel_ref(copy))
    }

    async fn category_channels(&self, category_id: u64) -> Result<Vec<ChannelRef>, PlatformError> {
        self.home_channels_in(category_id).await
    }

    async fn delete_channel(&self, channel_id: u64) -> Result<(), PlatformError> {
        serenity::ChannelId::new(channel_id)
            .delete(&*self.http)
            .await
            .map_err(platform_error)?;
        Ok(())
    }

    async fn edit_channel(&self, channel_id: u64, edit: ChannelEdit) -> Result<(), PlatformError> {
        let mut builder = serenity::EditChannel::new();
        if let Some(name) = edit.name {
            builder = builder.name(name);
        }
        if let Some(category_id) = edit.category_id {
            builder = builder.category(Some(serenity::ChannelId::new(category_id)));
        }
        if let Some(position) = edit.position {
            builder = builder.position(position);
        }
        if let Some(topic) = edit.topic {
            builder = builder.topic(topic);
        }

        serenity::ChannelId::new(channel_id)
            .edit(&*self.http, builder)
            .await
            .map_err(platform_error)?;
        Ok(())
    }
}

// ============================================================================
// THREAD REFRESH
// ============================================================================

#[async_trait]
impl ThreadSweepPlatform for SerenityPlatform {
    async fn category_channels(&self, category_id: u64) -> Result<Vec<ChannelRef>, PlatformError> {
        self.home_channels_in(category_id).await
    }

    async fn active_threads(&self) -> Result<Vec<ActiveThread>, PlatformError> {
        let active = self
            .home()
            .get_active_threads(&*self.http)
            .await
            .map_err(platform_error)?;

        Ok(active
            .threads
            .iter()
            .filter_map(|thread| {
                thread.parent_id.map(|parent| ActiveThread {
                    parent_id: parent.get(),
                    thread: thread_info(thread),
                })
            })
            .collect())
    }

    async fn set_auto_archive(&self, thread_id: u64, minutes: u16) -> Result<(), PlatformError> {
        self.edit_auto_archive(thread_id, minutes).await
    }
}
