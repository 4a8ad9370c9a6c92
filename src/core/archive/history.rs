// History copy - re-posts a channel's messages into an archive destination.
//
// Each message becomes an embed carrying the author and timestamp, the text,
// the attachments and a footer summarising reactions. Oversized attachments
// degrade the post to text-only; any other failure is counted and replaced
// by a plain notice so the copy keeps going.

use super::archive_models::{ArchivedMessage, RenderedPost};
use super::archive_platform::{MessagePoster, PostError};
use crate::core::ports::PlatformError;
use futures::{Stream, StreamExt};
use thiserror::Error;

pub const ATTACHMENT_TOO_LARGE_NOTE: &str = "Error: Attachment file was too large.";

/// Turn a historical message into the post that represents it.
pub fn render_message(message: ArchivedMessage) -> RenderedPost {
    let mut footer: Option<String> = None;
    for reaction in &message.reactions {
        let pair = format!("{} - {}, ", reaction.emoji, reaction.users.join(", "));
        footer = Some(match footer {
            Some(existing) if !existing.is_empty() => format!("{existing} {pair}"),
            _ => pair,
        });
    }

    RenderedPost {
        author_line: format!("{} at {}", message.author, message.created_at),
        icon_url: message.avatar_url,
        description: message.content,
        footer,
        attachments: message.attachments,
    }
}

/// The text-only fallback used when the attachments were rejected.
fn without_attachments(post: &RenderedPost) -> RenderedPost {
    let footer = match &post.footer {
        Some(existing) => format!("{existing}\n{ATTACHMENT_TOO_LARGE_NOTE}"),
        None => ATTACHMENT_TOO_LARGE_NOTE.to_string(),
    };

    RenderedPost {
        footer: Some(footer),
        attachments: Vec::new(),
        ..post.clone()
    }
}

fn unknown_issue_notice(err: &PostError) -> String {
    match err {
        PostError::Http { status, message } => format!(
            "Error: this message caused an unknown issue: {} - {}",
            status, message
        ),
        other => format!("Error: this message caused an unknown issue: {}", other),
    }
}

/// Reading the history failed partway. `errors` counts the messages that
/// had already failed to post before the read broke off.
#[derive(Debug, Error)]
#[error("History read failed after {errors} unarchived messages: {source}")]
pub struct CopyAborted {
    pub errors: usize,
    #[source]
    pub source: PlatformError,
}

/// Copy every message of `history` into `destination`, oldest first.
///
/// Returns how many messages could not be archived. Only a failure to read
/// the history itself is returned as an error, carrying the count so far.
pub async fn copy_history<P, H>(
    poster: &P,
    destination: u64,
    mut history: H,
) -> Result<usize, CopyAborted>
where
    P: MessagePoster + ?Sized,
    H: Stream<Item = Result<ArchivedMessage, PlatformError>> + Unpin + Send,
{
    let mut errors = 0;

    while let Some(message) = history.next().await {
        let message = message.map_err(|source| CopyAborted { errors, source })?;
        let post = render_message(message);

        match poster.post_rendered(destination, &post).await {
            Ok(()) => {}
            Err(err) if err.is_payload_too_large() => {
                tracing::debug!(
                    destination,
                    size = post.total_attachment_size(),
                    "Attachments too large, posting text only"
                );
                if let Err(retry_err) = poster
                    .post_rendered(destination, &without_attachments(&post))
                    .await
                {
                    tracing::warn!(destination, error = %retry_err, "Text-only fallback failed");
                    errors += 1;
                }
            }
            Err(err) => {
                errors += 1;
                tracing::warn!(destination, error = %err, "Failed to archive message");
                if let Err(notice_err) = poster
                    .post_text(destination, &unknown_issue_notice(&err))
                    .await
                {
                    tracing::warn!(destination, error = %notice_err, "Failed to post error notice");
                }
            }
        }
    }

    Ok(errors)
}

// ============================================================================
// TESTS
// ============================================================================
