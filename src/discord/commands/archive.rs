// Archive commands - thread preferences, ClaimRole and OffServerArchive.
//
// This layer is thin: pull ids out of Discord types, call the archive
// service, turn the outcome into reactions and DMs.

use crate::core::archive::{ArchiveError, OffServerArchiveRequest, ThreadVisibility, ToggleOutcome};
use crate::discord::{bot_log, feedback, Context, Error};
use poise::serenity_prelude as serenity;

const THREAD_ONLY: &str = "This command can only be used in a thread.";

/// The thread the command was run in: (parent channel, thread, visibility).
async fn thread_context(ctx: Context<'_>) -> Option<(u64, u64, ThreadVisibility)> {
    let channel = ctx.guild_channel().await?;
    let visibility = thread_visibility(channel.kind)?;
    Some((channel.parent_id?.get(), channel.id.get(), visibility))
}

fn thread_visibility(kind: serenity::ChannelType) -> Option<ThreadVisibility> {
    match kind {
        serenity::ChannelType::PrivateThread => Some(ThreadVisibility::Private),
        serenity::ChannelType::PublicThread => Some(ThreadVisibility::Public),
        _ => None,
    }
}

async fn conclude_toggle(
    ctx: Context<'_>,
    command: &str,
    result: Result<ToggleOutcome, ArchiveError>,
) -> Result<(), Error> {
    let outcome = match result {
        Ok(toggle) => {
            if let Some(notice) = toggle.notice() {
                feedback::dm(ctx, notice).await;
            }
            feedback::finish(ctx).await;
            Ok(())
        }
        Err(err) => {
            feedback::fail(ctx).await;
            Err(err.into())
        }
    };

    bot_log::log(ctx, &bot_log::command_line(ctx.author().display_name(), command)).await;
    outcome
}

/// Include this thread in the off-server archive.
///
/// Private threads are archived publicly once included.
#[poise::command(prefix_command, guild_only, rename = "IncludeInArchive")]
pub async fn include_in_archive(ctx: Context<'_>) -> Result<(), Error> {
    let Some((channel_id, thread_id, visibility)) = thread_context(ctx).await else {
        feedback::deny(ctx, THREAD_ONLY).await;
        return Ok(());
    };

    feedback::start(ctx).await;
    let result = ctx
        .data()
        .archive
        .include_thread(channel_id, thread_id, visibility)
        .await;
    conclude_toggle(ctx, "IncludeInArchive", result).await
}

/// Leave this thread out of the off-server archive.
#[poise::command(prefix_command, guild_only, rename = "ExcludeFromArchive")]
pub async fn exclude_from_archive(ctx: Context<'_>) -> Result<(), Error> {
    let Some((channel_id, thread_id, visibility)) = thread_context(ctx).await else {
        feedback::deny(ctx, THREAD_ONLY).await;
        return Ok(());
    };

    feedback::start(ctx).await;
    let result = ctx
        .data()
        .archive
        .exclude_thread(channel_id, thread_id, visibility)
        .await;
    conclude_toggle(ctx, "ExcludeFromArchive", result).await
}

/// Get your personal role on the archive server.
#[poise::command(prefix_command, rename = "ClaimRole")]
pub async fn claim_role(ctx: Context<'_>) -> Result<(), Error> {
    feedback::start(ctx).await;

    let outcome = match ctx.data().archive.claim_role(ctx.author().id.get()).await {
        Ok(_) => {
            feedback::finish(ctx).await;
            Ok(())
        }
        Err(err @ ArchiveError::NotArchiveMember) => {
            feedback::deny(ctx, &err.to_string()).await;
            Ok(())
        }
        Err(err) => {
            feedback::fail(ctx).await;
            Err(err.into())
        }
    };

    bot_log::log(ctx, &bot_log::command_line(ctx.author().display_name(), "ClaimRole")).await;
    outcome
}

/// Copy this channel and its threads to another server.
///
/// Attachments may not be preserved if they are too large. Also creates a
/// discussion thread at the end.
#[poise::command(prefix_command, guild_only, rename = "OffServerArchive")]
pub async fn off_server_archive(
    ctx: Context<'_>,
    #[description = "Server to archive into"] archive_server_id: u64,
    #[description = "Storyteller of the game"] st: serenity::Member,
    #[description = "Existing channel to archive into"] archive_channel_id: Option<u64>,
) -> Result<(), Error> {
    // Refuse before the hourglass goes up.
    match ctx.data().archive.may_archive(ctx.author().id.get()).await {
        Ok(true) => {}
        Ok(false) => {
            feedback::deny(ctx, &ArchiveError::PermissionDenied.to_string()).await;
            return Ok(());
        }
        Err(err) => {
            feedback::fail(ctx).await;
            return Err(err.into());
        }
    }

    feedback::start(ctx).await;

    let source_channel_name = ctx
        .guild_channel()
        .await
        .map(|c| c.name)
        .unwrap_or_else(|| ctx.channel_id().get().to_string());
    let request = OffServerArchiveRequest {
        invoker_id: ctx.author().id.get(),
        source_channel_id: ctx.channel_id().get(),
        source_channel_name,
        destination_guild_id: archive_server_id,
        // 0 is how the command has always spelled "no channel".
        destination_channel_id: archive_channel_id.filter(|id| *id != 0),
        storyteller_id: st.user.id.get(),
        storyteller_name: st.display_name().to_string(),
    };

    match ctx.data().archive.archive_off_server(&request).await {
        Ok(report) => {
            feedback::finish(ctx).await;
            bot_log::log(
                ctx,
                &bot_log::command_line(ctx.author().display_name(), "OffServerArchive"),
            )
            .await;
            tracing::info!(
                channel = %report.channel_name,
                errors = report.errors,
                threads_copied = report.threads_copied,
                threads_skipped = report.threads_skipped,
                threads_failed = report.threads_failed.len(),
                "Off-server archive finished"
            );
            feedback::dm(ctx, &report.completion_message()).await;
            Ok(())
        }
        Err(err @ (ArchiveError::PermissionDenied | ArchiveError::GuildNotFound(_))) => {
            feedback::deny(ctx, &err.to_string()).await;
            Ok(())
        }
        Err(err) => {
            feedback::fail(ctx).await;
            Err(err.into())
        }
    }
}
