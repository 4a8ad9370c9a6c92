// Discord layer - text commands and the feedback they give.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "feedback/reactions.rs"]
pub mod feedback;

#[path = "feedback/bot_log.rs"]
pub mod bot_log;

pub use commands::{Context, Data, Error};
