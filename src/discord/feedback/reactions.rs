// Processing feedback on the invoking message.
//
// ⌛ while a command runs, ✅ when it is done, ❌ when it was denied or
// failed. Reasons for a denial go to the invoker by DM.

use crate::discord::Context;
use poise::serenity_prelude as serenity;

const PROCESSING: char = '⌛';
const DONE: char = '✅';
const DENIED: char = '❌';

fn invoking_message<'a>(ctx: Context<'a>) -> Option<&'a serenity::Message> {
    match ctx {
        poise::Context::Prefix(prefix) => Some(prefix.msg),
        poise::Context::Application(_) => None,
    }
}

async fn react(ctx: Context<'_>, emoji: char) {
    if let Some(msg) = invoking_message(ctx) {
        if let Err(err) = msg.react(ctx.http(), emoji).await {
            tracing::warn!(message_id = msg.id.get(), error = %err, "Failed to add reaction");
        }
    }
}

async fn clear_processing(ctx: Context<'_>) {
    if let Some(msg) = invoking_message(ctx) {
        if let Err(err) = msg.delete_reaction(ctx.http(), None, PROCESSING).await {
            tracing::warn!(message_id = msg.id.get(), error = %err, "Failed to remove reaction");
        }
    }
}

pub async fn start(ctx: Context<'_>) {
    react(ctx, PROCESSING).await;
}

pub async fn finish(ctx: Context<'_>) {
    clear_processing(ctx).await;
    react(ctx, DONE).await;
}

/// Mark the command as failed without telling the invoker why.
pub async fn fail(ctx: Context<'_>) {
    clear_processing(ctx).await;
    react(ctx, DENIED).await;
}

/// Mark the command as denied and DM the reason.
pub async fn deny(ctx: Context<'_>, reason: &str) {
    fail(ctx).await;
    dm(ctx, reason).await;
}

pub async fn dm(ctx: Context<'_>, text: &str) {
    let author = ctx.author();
    if let Err(err) = author
        .direct_message(ctx.http(), serenity::CreateMessage::new().content(text))
        .await
    {
        tracing::warn!(user_id = author.id.get(), error = %err, "Failed to DM user");
    }
}
