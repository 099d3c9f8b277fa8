//! Session store for state handed between booking steps.
//!
//! The store is a small key to JSON-document map scoped to one booking session. It is the only
//! state that outlives a single step: the selection is written when leaving the test selector,
//! the bill when leaving confirmation, and the questionnaire record when it is submitted.
//!
//! Two backends are provided:
//! - [`MemoryStore`] for a session that lives inside one process
//! - [`FileStore`] for a session spread over several CLI invocations, one file per key:
//!
//! ```text
//! <store_dir>/
//!   selectedTests.json
//!   currentBill.json
//!   questionnaireAnswers.json
//! ```

use crate::constants::STORE_FILE_EXTENSION;
use crate::{BookingError, BookingResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Keys of the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    SelectedTests,
    CurrentBill,
    QuestionnaireAnswers,
}

impl StoreKey {
    pub const ALL: [StoreKey; 3] = [
        StoreKey::SelectedTests,
        StoreKey::CurrentBill,
        StoreKey::QuestionnaireAnswers,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::SelectedTests => "selectedTests",
            StoreKey::CurrentBill => "currentBill",
            StoreKey::QuestionnaireAnswers => "questionnaireAnswers",
        }
    }
}

/// Raw access to session entries.
pub trait SessionStore {
    /// Returns the stored document, or `None` if the key was never written or was removed.
    fn read(&self, key: StoreKey) -> BookingResult<Option<String>>;

    /// Stores a document, replacing any previous value.
    fn write(&mut self, key: StoreKey, value: String) -> BookingResult<()>;

    /// Removes an entry. Removing a missing entry is not an error.
    fn remove(&mut self, key: StoreKey) -> BookingResult<()>;

    /// Removes every entry.
    fn clear(&mut self) -> BookingResult<()> {
        for key in StoreKey::ALL {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// Reads and deserializes an entry.
///
/// Deserialization goes through `serde_path_to_error` so a damaged entry reports the field that
/// failed (for example `patientInfo.email`).
pub fn load<T, S>(store: &S, key: StoreKey) -> BookingResult<Option<T>>
where
    T: DeserializeOwned,
    S: SessionStore + ?Sized,
{
    let Some(raw) = store.read(key)? else {
        tracing::debug!("session entry {} is empty", key.as_str());
        return Ok(None);
    };

    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    match serde_path_to_error::deserialize::<_, T>(&mut deserializer) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            let path = err.path().to_string();
            let path = if path.is_empty() || path == "." {
                "<root>".to_string()
            } else {
                path
            };
            Err(BookingError::Deserialization {
                key: key.as_str(),
                path,
                source: err.into_inner(),
            })
        }
    }
}

/// Serializes and writes an entry.
pub fn save<T, S>(store: &mut S, key: StoreKey, value: &T) -> BookingResult<()>
where
    T: Serialize + ?Sized,
    S: SessionStore + ?Sized,
{
    let json = serde_json::to_string_pretty(value).map_err(|source| {
        BookingError::Serialization {
            key: key.as_str(),
            source,
        }
    })?;
    tracing::debug!("writing session entry {}", key.as_str());
    store.write(key, json)
}

/// In-process session store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<StoreKey, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn read(&self, key: StoreKey) -> BookingResult<Option<String>> {
        Ok(self.entries.get(&key).cloned())
    }

    fn write(&mut self, key: StoreKey, value: String) -> BookingResult<()> {
        self.entries.insert(key, value);
        Ok(())
    }

    fn remove(&mut self, key: StoreKey) -> BookingResult<()> {
        self.entries.remove(&key);
        Ok(())
    }
}

/// Session store backed by one JSON file per key.
///
/// The directory is created on first write, so constructing a store never touches the disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: StoreKey) -> PathBuf {
        self.dir
            .join(format!("{}.{}", key.as_str(), STORE_FILE_EXTENSION))
    }
}

impl SessionStore for FileStore {
    fn read(&self, key: StoreKey) -> BookingResult<Option<String>> {
        match fs::read_to_string(self.entry_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BookingError::FileRead(e)),
        }
    }

    fn write(&mut self, key: StoreKey, value: String) -> BookingResult<()> {
        fs::create_dir_all(&self.dir).map_err(BookingError::StoreDirCreation)?;
        fs::write(self.entry_path(key), value).map_err(BookingError::FileWrite)
    }

    fn remove(&mut self, key: StoreKey) -> BookingResult<()> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BookingError::FileRemove(e)),
        }
    }
}
