// The bot log: every command run ends up here and, when configured, in the
// moderators' log channel.

use crate::discord::Context;
use poise::serenity_prelude as serenity;

pub async fn log(ctx: Context<'_>, line: &str) {
    tracing::info!(target: "bot_log", "{}", line);

    let Some(channel_id) = ctx.data().log_channel_id else {
        return;
    };
    if let Err(err) = serenity::ChannelId::new(channel_id)
        .say(ctx.http(), line)
        .await
    {
        tracing::warn!(channel_id, error = %err, "Failed to write to the log channel");
    }
}

/// `"{who} has run the {command} Command"`
pub fn command_line(who: &str, command: &str) -> String {
    format!("{} has run the {} Command", who, command)
}

/// `"{who} has run the {command} Command on Game {game}"`
pub fn game_command_line(who: &str, command: &str, preposition: &str, game: &str) -> String {
    format!("{} {} Game {}", command_line(who, command), preposition, game)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_lines() {
        assert_eq!(
            command_line("Ivy", "ClaimRole"),
            "Ivy has run the ClaimRole Command"
        );
        assert_eq!(
            game_command_line("<@1>", "OpenKibitz", "on", "4"),
            "<@1> has run the OpenKibitz Command on Game 4"
        );
        assert_eq!(
            game_command_line("<@1>", "ArchiveGame", "for", "4"),
            "<@1> has run the ArchiveGame Command for Game 4"
        );
    }
}
