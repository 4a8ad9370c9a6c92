// Game domain models - naming conventions and results of lifecycle commands.

use crate::core::ports::ChannelRef;
use chrono::{DateTime, Utc};

/// How many channels the archive category holds before the oldest is evicted.
pub const ARCHIVE_CATEGORY_CAPACITY: usize = 50;

pub const DEFAULT_FEEDBACK_FORM_URL: &str = "https://forms.gle/HqNfMv1pte8vo5j59";

/// Name templates for the per-game channels and roles. `{n}` is replaced by
/// the game number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameNaming {
    pub game_channel: String,
    pub kibitz_channel: String,
    pub game_role: String,
    pub kibitz_role: String,
    pub st_role: String,
}

impl Default for GameNaming {
    fn default() -> Self {
        Self {
            game_channel: "text-game-{n}".to_string(),
            kibitz_channel: "kibitz-game-{n}".to_string(),
            game_role: "game{n}".to_string(),
            kibitz_role: "kibitz{n}".to_string(),
            st_role: "st{n}".to_string(),
        }
    }
}

impl GameNaming {
    pub fn game_channel(&self, game: &str) -> String {
        self.game_channel.replace("{n}", game)
    }

    pub fn kibitz_channel(&self, game: &str) -> String {
        self.kibitz_channel.replace("{n}", game)
    }

    pub fn game_role(&self, game: &str) -> String {
        self.game_role.replace("{n}", game)
    }

    pub fn kibitz_role(&self, game: &str) -> String {
        self.kibitz_role.replace("{n}", game)
    }

    pub fn st_role(&self, game: &str) -> String {
        self.st_role.replace("{n}", game)
    }
}

/// The channels and roles belonging to one numbered game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResources {
    pub game_channel: ChannelRef,
    pub kibitz_channel_id: u64,
    pub game_role_id: u64,
    pub kibitz_role_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberRef {
    pub id: u64,
    pub bot: bool,
}

/// Partial channel update; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelEdit {
    pub name: Option<String>,
    pub category_id: Option<u64>,
    pub position: Option<u16>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndedGame {
    pub members_cleared: usize,
    pub town_square_removed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchivedGame {
    pub archived_channel_id: u64,
    pub replacement_channel_id: u64,
    pub evicted_channel_ids: Vec<u64>,
}

/// `"{name} Archived on Fri, 01 Mar 2024 18 30 00 "` - the trailing space is
/// part of the historical format.
pub fn archived_channel_name(name: &str, now: DateTime<Utc>) -> String {
    format!("{} Archived on {}", name, now.format("%a, %d %b %Y %H %M %S "))
}

/// The announcement posted when kibitz opens.
pub fn kibitz_announcement(game_role_id: u64, feedback_form_url: &str, ending: bool) -> String {
    let opening = if ending {
        "Kibitz is now being opened."
    } else {
        "Kibitz is now being opened - remove your game role to access it."
    };
    format!(
        "<@&{}> {} Remember to give your ST(s) any feedback you may have!\nFeedback form: {}",
        game_role_id, opening, feedback_form_url
    )
}
