// Core game module - kibitz visibility and end-of-game cleanup.

pub mod game_models;
pub mod game_platform;
pub mod game_service;

pub use game_models::*;
pub use game_platform::{GamePlatform, TownSquareStore};
pub use game_service::{GameError, GameService, GameSettings};
