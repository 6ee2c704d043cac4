//! File-backed credential slot.
//!
//! The payload is kept under a single `creds` key so the file can grow other
//! entries later without breaking readers. Writes go through a temporary file
//! in the same directory and are renamed into place.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::application::credentials::{CredentialSlot, StoreError};

const SLOT_KEY: &str = "creds";

#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialSlot for FileCredentialStore {
    fn load(&self) -> Result<Option<Value>, StoreError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let document: Value = serde_json::from_slice(&raw)
            .map_err(|err| StoreError::Corrupt(format!("{}: {err}", self.path.display())))?;
        match document {
            Value::Object(mut map) => Ok(map.remove(SLOT_KEY).filter(|value| !value.is_null())),
            _ => Err(StoreError::Corrupt(format!(
                "{}: expected a JSON object",
                self.path.display()
            ))),
        }
    }

    fn save(&self, payload: &Value) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut document = Map::new();
        document.insert(SLOT_KEY.to_string(), payload.clone());
        let body = serde_json::to_vec_pretty(&Value::Object(document))
            .map_err(|err| StoreError::Corrupt(err.to_string()))?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&body)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| StoreError::Io(err.error))?;

        debug!(path = %self.path.display(), "credentials written");
        Ok(())
    }
}
