use super::archive_models::ThreadList;
use crate::core::ports::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Persistence for per-channel thread preferences.
///
/// Implementations write the whole mapping after every mutation.
#[async_trait]
pub trait ThreadListStore: Send + Sync {
    async fn get_threads(&self, channel_id: u64) -> Result<Option<ThreadList>, StoreError>;
    async fn save_threads(&self, channel_id: u64, threads: ThreadList) -> Result<(), StoreError>;
    /// Returns whether a record existed.
    async fn remove_threads(&self, channel_id: u64) -> Result<bool, StoreError>;
    async fn all_threads(&self) -> Result<HashMap<u64, ThreadList>, StoreError>;
}
