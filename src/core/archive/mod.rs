// Core archive module - thread preferences, history copy, off-server
// archive and the thread refresh sweep.

pub mod archive_models;
pub mod archive_platform;
pub mod archive_service;
pub mod archive_store;
pub mod history;
pub mod thread_refresh;

pub use archive_models::*;
pub use archive_platform::{
    ArchivePlatform, HistoryStream, MessagePoster, PostError, ThreadSweepPlatform,
};
pub use archive_service::{ArchiveError, ArchiveService, ArchiveSettings};
pub use archive_store::ThreadListStore;
pub use history::CopyAborted;
pub use thread_refresh::{ThreadRefreshService, REFRESH_INTERVAL};
