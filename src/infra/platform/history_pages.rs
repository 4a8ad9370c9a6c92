// Oldest-first message history built from the platform's 100-message pages.

use super::platform_error;
use crate::core::archive::{ArchivedAttachment, ArchivedMessage, ArchivedReaction, HistoryStream};
use crate::core::ports::PlatformError;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use poise::serenity_prelude as serenity;

const PAGE_SIZE: u8 = 100;

/// Stream a channel's history from its first message onwards.
///
/// Pages are fetched lazily; a failed fetch is yielded once and ends the
/// stream.
pub fn history_stream(http: &serenity::Http, channel_id: serenity::ChannelId) -> HistoryStream<'_> {
    let start = Some(serenity::MessageId::new(1));

    stream::unfold(start, move |cursor| async move {
        let after = cursor?;
        let mut page = match channel_id
            .messages(http, serenity::GetMessages::new().after(after).limit(PAGE_SIZE))
            .await
        {
            Ok(page) => page,
            Err(err) => return Some((vec![Err(platform_error(err))], None)),
        };
        page.sort_by_key(|m| m.id);

        let next = if page.len() < PAGE_SIZE as usize {
            None
        } else {
            page.last().map(|m| m.id)
        };

        let mut converted = Vec::with_capacity(page.len());
        for message in &page {
            converted.push(archived_message(http, message).await);
        }
        Some((converted, next))
    })
    .flat_map(stream::iter)
    .boxed()
}

async fn archived_message(
    http: &serenity::Http,
    message: &serenity::Message,
) -> Result<ArchivedMessage, PlatformError> {
    let mut reactions = Vec::with_capacity(message.reactions.len());
    for reaction in &message.reactions {
        let users = reaction_users(http, message, &reaction.reaction_type).await?;
        reactions.push(ArchivedReaction {
            emoji: reaction.reaction_type.to_string(),
            users,
        });
    }

    Ok(ArchivedMessage {
        author: message.author.tag(),
        avatar_url: Some(message.author.face()),
        created_at: parse_created_at(&message.timestamp.to_string())?,
        content: message.content.clone(),
        attachments: message
            .attachments
            .iter()
            .map(|a| ArchivedAttachment {
                filename: a.filename.clone(),
                url: a.url.clone(),
                size: u64::from(a.size),
            })
            .collect(),
        reactions,
    })
}

/// Message timestamps render as RFC 3339 with sub-second digits.
fn parse_created_at(raw: &str) -> Result<DateTime<Utc>, PlatformError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| PlatformError::Other(format!("bad message timestamp {raw:?}: {err}")))
}

async fn reaction_users(
    http: &serenity::Http,
    message: &serenity::Message,
    reaction_type: &serenity::ReactionType,
) -> Result<Vec<String>, PlatformError> {
    let mut names = Vec::new();
    let mut after: Option<serenity::UserId> = None;

    loop {
        let users = message
            .reaction_users(http, reaction_type.clone(), Some(PAGE_SIZE), after)
            .await
            .map_err(platform_error)?;
        let full_page = users.len() == PAGE_SIZE as usize;
        after = users.last().map(|u| u.id);
        names.extend(users.into_iter().map(|u| u.name));

        if !full_page {
            return Ok(names);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_created_at_keeps_fractional_seconds() {
        let created = parse_created_at("2024-03-01T19:45:12.345678+00:00").unwrap();

        assert_eq!(created.nanosecond(), 345_678_000);
        assert_eq!(
            created.with_nanosecond(0),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 19, 45, 12).unwrap())
        );
    }

    #[test]
    fn test_created_at_rejects_garbage() {
        let err = parse_created_at("yesterday").unwrap_err();

        assert!(matches!(err, PlatformError::Other(msg) if msg.contains("yesterday")));
    }
}
