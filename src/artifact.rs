//! Persisted model artifacts, one named slot per backend

use crate::error::{ForecastError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Debug;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

/// Directory of artifact slots. Slots handed out for the same name share one
/// read/write lock, so concurrent train and forecast calls on a backend do
/// not race at the storage layer.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    locks: Arc<Mutex<HashMap<String, Arc<RwLock<()>>>>>,
}

impl ArtifactStore {
    /// Create a store rooted at the given directory
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The storage slot for one backend
    pub fn slot(&self, name: &str) -> ArtifactSlot {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let lock = locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone();

        ArtifactSlot {
            name: name.to_string(),
            path: self.root.join(format!("{}.json", name)),
            lock,
        }
    }
}

/// One named storage slot: save overwrites, load of an absent slot is a
/// `MissingArtifact` error.
#[derive(Debug, Clone)]
pub struct ArtifactSlot {
    name: String,
    path: PathBuf,
    lock: Arc<RwLock<()>>,
}

impl ArtifactSlot {
    /// The slot name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a trained artifact is currently stored
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Persist a trained artifact, overwriting any prior one
    pub fn save<T: Serialize>(&self, artifact: &T) -> Result<()> {
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        serde_json::to_writer(BufWriter::new(file), artifact)?;
        Ok(())
    }

    /// Load the stored artifact
    pub fn load<T: DeserializeOwned>(&self) -> Result<T> {
        let _guard = self.lock.read().unwrap_or_else(|e| e.into_inner());
        if !self.path.exists() {
            return Err(ForecastError::MissingArtifact(format!(
                "No trained model stored for '{}'",
                self.name
            )));
        }
        let file = File::open(&self.path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}
