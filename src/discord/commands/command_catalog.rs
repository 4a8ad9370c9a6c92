// Discord commands module.
// Each feature gets its own command file.

pub mod archive;

pub mod game;

use crate::core::archive::ArchiveService;
use crate::core::game::GameService;
use crate::infra::archive::JsonThreadListStore;
use crate::infra::platform::SerenityPlatform;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command.
pub struct Data {
    pub archive: Arc<ArchiveService<JsonThreadListStore, SerenityPlatform>>,
    pub games: Arc<GameService<SerenityPlatform>>,
    pub log_channel_id: Option<u64>,
}

/// Every text command the bot answers to.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        archive::include_in_archive(),
        archive::exclude_from_archive(),
        archive::claim_role(),
        archive::off_server_archive(),
        game::open_kibitz(),
        game::close_kibitz(),
        game::end_game(),
        game::archive_game(),
    ]
}
