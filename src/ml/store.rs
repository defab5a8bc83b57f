//! Flat-file persistence for the trained model pair

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{info, warn};
use uuid::Uuid;

use super::{MlError, MlResult, ModelPair};

/// Holds the current model pair in memory, backed by a JSON file.
///
/// The file is read lazily on first use and replaced atomically on save, so
/// a reader never observes a half-written pair. Disk access is serialized so
/// the cached pair and the file always hold the same model.
pub struct ModelStore {
    path: PathBuf,
    current: RwLock<Option<Arc<ModelPair>>>,
    disk: Mutex<()>,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(None),
            disk: Mutex::new(()),
        }
    }

    /// True when a pair is cached or a model file exists on disk
    pub fn is_available(&self) -> bool {
        self.cached().is_some() || self.path.exists()
    }

    /// Return the current pair, reading it from disk if not cached
    pub fn load(&self) -> MlResult<Arc<ModelPair>> {
        if let Some(pair) = self.cached() {
            return Ok(pair);
        }

        let _disk = self.disk.lock().unwrap_or_else(|e| e.into_inner());
        // A save may have landed while we waited
        if let Some(pair) = self.cached() {
            return Ok(pair);
        }

        if !self.path.exists() {
            warn!(path = %self.path.display(), "Model file not found. Please train the model first.");
            return Err(MlError::NotTrained {
                path: self.path.clone(),
            });
        }

        let raw = fs::read_to_string(&self.path)?;
        let pair: Arc<ModelPair> = Arc::new(serde_json::from_str(&raw)?);
        info!(model_id = %pair.id, path = %self.path.display(), "Loaded model pair from disk");

        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::clone(&pair));
        Ok(pair)
    }

    /// Persist `pair` and make it the current model
    pub fn save(&self, pair: ModelPair) -> MlResult<Arc<ModelPair>> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let bytes = serde_json::to_vec(&pair)?;
        let tmp = self.path.with_extension(format!("json.tmp.{}", Uuid::new_v4()));
        let pair = Arc::new(pair);

        let _disk = self.disk.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = fs::write(&tmp, &bytes).and_then(|_| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::clone(&pair));
        drop(guard);

        info!(model_id = %pair.id, path = %self.path.display(), "Models trained and saved successfully");
        Ok(pair)
    }

    fn cached(&self) -> Option<Arc<ModelPair>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_donations;
    use crate::ml::TrainingParams;
    use chrono::NaiveDate;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("donorcast-store-{}", uuid::Uuid::new_v4()))
            .join("model.json")
    }

    fn small_pair() -> ModelPair {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let records = generate_donations(25, today, Some(1));
        let params = TrainingParams {
            iterations: 5,
            max_depth: 3,
            shrinkage: 0.3,
        };
        ModelPair::train(&records, params, today).unwrap()
    }

    #[test]
    fn test_load_without_file_is_not_trained() {
        let store = ModelStore::new(scratch_path());
        assert!(!store.is_available());
        assert!(matches!(store.load(), Err(MlError::NotTrained { .. })));
    }

    #[test]
    fn test_save_then_reload_from_disk() {
        let path = scratch_path();
        let saved = ModelStore::new(&path).save(small_pair()).unwrap();
        assert!(path.exists());

        // Fresh store has nothing cached and must read the file
        let store = ModelStore::new(&path);
        assert!(store.is_available());
        let loaded = store.load().unwrap();
        assert_eq!(loaded.id, saved.id);
        assert_eq!(loaded.schema, saved.schema);

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_concurrent_saves_keep_cache_and_file_in_sync() {
        let path = scratch_path();
        let store = Arc::new(ModelStore::new(&path));
        let pairs: Vec<ModelPair> = (0..4).map(|_| small_pair()).collect();

        for _round in 0..10 {
            let handles: Vec<_> = pairs
                .iter()
                .map(|p| serde_json::to_string(p).unwrap())
                .map(|json| {
                    let store = Arc::clone(&store);
                    std::thread::spawn(move || {
                        let pair: ModelPair = serde_json::from_str(&json).unwrap();
                        store.save(pair).map(|_| ())
                    })
                })
                .collect();

            for handle in handles {
                assert!(handle.join().unwrap().is_ok(), "concurrent save failed");
            }

            let cached = store.load().unwrap();
            let on_disk = ModelStore::new(&path).load().unwrap();
            assert_eq!(cached.id, on_disk.id);
        }

        let leftovers = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter(|entry| entry.as_ref().unwrap().path() != path)
            .count();
        assert_eq!(leftovers, 0, "temp files left behind");

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_save_replaces_cached_pair() {
        let path = scratch_path();
        let store = ModelStore::new(&path);
        let first = store.save(small_pair()).unwrap();
        let second = store.save(small_pair()).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.load().unwrap().id, second.id);

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }
}
