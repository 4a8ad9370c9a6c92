// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (JSON stores, the serenity adapter)
// - `discord/` = Discord-specific adapters (commands, feedback)
//
// This file's job is to:
// 1. Load configuration
// 2. Open the stores and wire the services together
// 3. Set up the Discord framework
// 4. Start the daily thread refresh

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::BotConfig;
use crate::core::archive::{
    ArchiveService, ArchiveSettings, ThreadListStore, ThreadRefreshService, REFRESH_INTERVAL,
};
use crate::core::game::{GameService, GameSettings};
use crate::discord::Data;
use crate::infra::archive::JsonThreadListStore;
use crate::infra::game::JsonTownSquareStore;
use crate::infra::platform::{PlatformSettings, SerenityPlatform};
use poise::serenity_prelude as serenity;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = BotConfig::from_env().expect("Invalid bot configuration");

    std::fs::create_dir_all(&config.data_dir).expect("Failed to create data directory");
    let thread_store = JsonThreadListStore::open(config.thread_store_path())
        .expect("Failed to load thread preferences");
    match thread_store.all_threads().await {
        Ok(tracked) => tracing::info!(channels = tracked.len(), "Thread preferences loaded"),
        Err(err) => tracing::warn!("Failed to read thread preferences: {}", err),
    }
    let town_squares = Arc::new(
        JsonTownSquareStore::open(config.town_square_path())
            .expect("Failed to load town square state"),
    );

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read text commands
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let token = config.token.clone();
    let prefix = config.command_prefix.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: discord::commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix),
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, _framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up");

                // ============================================================
                // DEPENDENCY INJECTION
                // ============================================================
                // The platform adapter needs the HTTP client, which only
                // exists once the framework is up.

                let platform = Arc::new(SerenityPlatform::new(
                    ctx.http.clone(),
                    PlatformSettings {
                        home_guild_id: config.home_guild_id,
                        mod_role_id: config.mod_role_id,
                        naming: config.naming.clone(),
                        upload_limit_bytes: config.upload_limit_bytes,
                    },
                ));

                let archive = Arc::new(ArchiveService::new(
                    thread_store,
                    Arc::clone(&platform),
                    ArchiveSettings {
                        privileged_user_ids: config.privileged_user_ids.clone(),
                        archive_guild_id: config.archive_guild_id,
                    },
                ));

                let games = Arc::new(
                    GameService::new(
                        Arc::clone(&platform),
                        GameSettings {
                            naming: config.naming.clone(),
                            archive_category_id: config.archive_category_id,
                            feedback_form_url: config.feedback_form_url.clone(),
                        },
                    )
                    .with_town_squares(town_squares),
                );

                // Daily sweep that keeps game threads from auto-archiving.
                let refresh = ThreadRefreshService::new(
                    Arc::clone(&platform),
                    config.thread_refresh.clone(),
                );
                tokio::spawn(async move {
                    use tokio::time::sleep;

                    loop {
                        tracing::info!("Thread refresh sweep starting");
                        match refresh.sweep().await {
                            Ok(report) => tracing::info!(
                                refreshed = report.refreshed,
                                failed = report.failed,
                                "Thread refresh sweep completed"
                            ),
                            Err(err) => tracing::warn!("Thread refresh sweep failed: {}", err),
                        }

                        sleep(REFRESH_INTERVAL).await;
                    }
                });

                tracing::info!(prefix = %config.command_prefix, "Bot is ready");

                Ok(Data {
                    archive,
                    games,
                    log_channel_id: config.log_channel_id,
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
