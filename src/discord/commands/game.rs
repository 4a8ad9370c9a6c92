// Game commands - kibitz visibility and end-of-game cleanup.
//
// Only the game's storyteller (or a moderator) may run these. Every run is
// written to the bot log, allowed or not.

use crate::core::game::GameError;
use crate::discord::{bot_log, feedback, Context, Error};
use chrono::Utc;
use poise::serenity_prelude::Mentionable;

/// Turn the service outcome into reactions, then log the invocation.
async fn conclude<T>(
    ctx: Context<'_>,
    command: &str,
    preposition: &str,
    game_number: &str,
    result: Result<T, GameError>,
) -> Result<(), Error> {
    let outcome = match result {
        Ok(_) => {
            feedback::finish(ctx).await;
            Ok(())
        }
        Err(err @ GameError::NotAuthorized(_)) => {
            feedback::deny(ctx, &err.to_string()).await;
            Ok(())
        }
        Err(err) => {
            tracing::error!(command, game = game_number, error = %err, "Game command failed");
            feedback::fail(ctx).await;
            Err(err.into())
        }
    };

    let who = ctx.author().mention().to_string();
    bot_log::log(
        ctx,
        &bot_log::game_command_line(&who, command, preposition, game_number),
    )
    .await;
    outcome
}

/// Open kibitz for a game and invite players to leave feedback.
#[poise::command(prefix_command, guild_only, rename = "OpenKibitz")]
pub async fn open_kibitz(
    ctx: Context<'_>,
    #[description = "Game number"] game_number: String,
) -> Result<(), Error> {
    feedback::start(ctx).await;
    let result = ctx
        .data()
        .games
        .open_kibitz(ctx.author().id.get(), &game_number, ctx.channel_id().get())
        .await;
    conclude(ctx, "OpenKibitz", "on", &game_number, result).await
}

/// Hide a game's kibitz channel again.
#[poise::command(prefix_command, guild_only, rename = "CloseKibitz")]
pub async fn close_kibitz(
    ctx: Context<'_>,
    #[description = "Game number"] game_number: String,
) -> Result<(), Error> {
    feedback::start(ctx).await;
    let result = ctx
        .data()
        .games
        .close_kibitz(ctx.author().id.get(), &game_number)
        .await;
    conclude(ctx, "CloseKibitz", "on", &game_number, result).await
}

/// End a game: clear its roles and town square and open kibitz.
#[poise::command(prefix_command, guild_only, rename = "EndGame")]
pub async fn end_game(
    ctx: Context<'_>,
    #[description = "Game number"] game_number: String,
) -> Result<(), Error> {
    feedback::start(ctx).await;
    let result = ctx
        .data()
        .games
        .end_game(ctx.author().id.get(), &game_number, ctx.channel_id().get())
        .await;
    conclude(ctx, "EndGame", "on", &game_number, result).await
}

/// Move a game channel into the archive category and replace it with a
/// fresh copy.
#[poise::command(prefix_command, guild_only, rename = "ArchiveGame")]
pub async fn archive_game(
    ctx: Context<'_>,
    #[description = "Game number"] game_number: String,
) -> Result<(), Error> {
    feedback::start(ctx).await;
    let result = ctx
        .data()
        .games
        .archive_game(ctx.author().id.get(), &game_number, Utc::now())
        .await;
    conclude(ctx, "ArchiveGame", "for", &game_number, result).await
}
