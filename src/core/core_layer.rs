// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "ports/platform_ports.rs"]
pub mod ports;

#[path = "archive/mod.rs"]
pub mod archive;

#[path = "game/mod.rs"]
pub mod game;
