// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "archive/mod.rs"]
pub mod archive;

#[path = "game/mod.rs"]
pub mod game;

#[path = "platform/mod.rs"]
pub mod platform;
