use crate::core::game::TownSquareStore;
use crate::core::ports::StoreError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// The town square's seating charts, keyed by game number.
///
/// Entries are kept as opaque JSON since the town square owns their shape.
/// The file is written compact, the way the town square writes it.
pub struct JsonTownSquareStore {
    path: PathBuf,
    cache: RwLock<HashMap<String, Value>>,
}

impl JsonTownSquareStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let map = if path.exists() {
            let file = std::fs::File::open(&path)?;
            serde_json::from_reader(file)?
        } else {
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
        serde_json::to_writer(file, &*cache)?;
        Ok(())
    }
}

#[async_trait]
impl TownSquareStore for JsonTownSquareStore {
    async fn remove_game(&self, game: &str) -> Result<bool, StoreError> {
        let mut cache = self.cache.write().await;
        let existed = cache.remove(game).is_some();
        drop(cache);
        if existed {
            self.persist().await?;
        }
        Ok(existed)
    }
}
