use crate::core::archive::{ThreadList, ThreadListStore};
use crate::core::ports::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Thread preferences kept in a single pretty-printed JSON file keyed by
/// channel id.
pub struct JsonThreadListStore {
    path: PathBuf,
    cache: RwLock<HashMap<u64, ThreadList>>,
}

impl JsonThreadListStore {
    /// Load the file, creating it as `{}` when it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let map = if path.exists() {
            let file = std::fs::File::open(&path)?;
            serde_json::from_reader(file)?
        } else {
            create_parent(&path)?;
            std::fs::write(&path, "{}")?;
            HashMap::new()
        };

        Ok(Self {
            path,
            cache: RwLock::new(map),
        })
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let cache = self.cache.read().await;
        let file = std::fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(file, &*cache)?;
        Ok(())
    }
}

fn create_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[async_trait]
impl ThreadListStore for JsonThreadListStore {
    async fn get_threads(&self, channel_id: u64) -> Result<Option<ThreadList>, StoreError> {
        let cache = self.cache.read().await;
        Ok(cache.get(&channel_id).cloned())
    }

    async fn save_threads(&self, channel_id: u64, threads: ThreadList) -> Result<(), StoreError> {
        let mut cache = self.cache.write().await;
        cache.insert(channel_id, threads);
        drop(cache); // Release lock before persisting
        self.persist().await
    }

    async fn remove_threads(&self, channel_id: u64) -> Result<bool, StoreError> {
        let mut cache = self.cache.write().await;
        let existed = cache.remove(&channel_id).is_some();
        drop(cache);
        if existed {
            self.persist().await?;
        }
        Ok(existed)
    }

    async fn all_threads(&self) -> Result<HashMap<u64, ThreadList>, StoreError> {
        let cache = self.cache.read().await;
        Ok(cache.clone())
    }
}
