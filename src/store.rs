//! Locally persisted user state: continue-watching history, My List,
//! reminders and the theme preference.
//!
//! Everything is read once when the store is opened. Every mutation is
//! written through to the backend before the call returns.

use anyhow::{bail, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::models::{MediaItem, MediaKind, UserListEntry};

pub const CONTINUE_WATCHING_LIMIT: usize = 20;
const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListName {
    ContinueWatching,
    MyList,
    Reminders,
}

impl ListName {
    pub const ALL: [ListName; 3] = [
        ListName::ContinueWatching,
        ListName::MyList,
        ListName::Reminders,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ListName::ContinueWatching => "continueWatching",
            ListName::MyList => "myList",
            ListName::Reminders => "reminders",
        }
    }
}

/// Persisted as the bare string `light` or `dark`. Anything else reads as dark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    fn from_raw(raw: &str) -> Self {
        if raw.trim() == "light" {
            Theme::Light
        } else {
            Theme::Dark
        }
    }
}

/// Raw key-value persistence underneath the store.
pub trait PreferenceBackend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl PreferenceBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path(key);
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, value)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        debug!("Saved {}", path.display());
        Ok(())
    }
}

/// In-process backend for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: &str, value: &str) -> Self {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        self
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }
}

impl PreferenceBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Lists {
    continue_watching: Vec<UserListEntry>,
    my_list: Vec<UserListEntry>,
    reminders: Vec<UserListEntry>,
    theme: Theme,
}

impl Lists {
    fn get(&self, list: ListName) -> &Vec<UserListEntry> {
        match list {
            ListName::ContinueWatching => &self.continue_watching,
            ListName::MyList => &self.my_list,
            ListName::Reminders => &self.reminders,
        }
    }

    fn get_mut(&mut self, list: ListName) -> &mut Vec<UserListEntry> {
        match list {
            ListName::ContinueWatching => &mut self.continue_watching,
            ListName::MyList => &mut self.my_list,
            ListName::Reminders => &mut self.reminders,
        }
    }
}

pub struct PreferenceStore {
    backend: Box<dyn PreferenceBackend>,
    lists: Mutex<Lists>,
}

impl PreferenceStore {
    /// Reads every persisted key. Missing or malformed values start empty.
    pub fn open(backend: impl PreferenceBackend + 'static) -> Self {
        let mut lists = Lists::default();
        for list in ListName::ALL {
            *lists.get_mut(list) = read_or_default(&backend, list.key());
        }
        lists.continue_watching.truncate(CONTINUE_WATCHING_LIMIT);
        lists.theme = read_raw(&backend, THEME_KEY)
            .map(|raw| Theme::from_raw(&raw))
            .unwrap_or_default();
        Self {
            backend: Box::new(backend),
            lists: Mutex::new(lists),
        }
    }

    pub fn in_memory() -> Self {
        Self::open(MemoryBackend::new())
    }

    pub fn load(&self, list: ListName) -> Vec<UserListEntry> {
        lock(&self.lists).get(list).clone()
    }

    pub fn contains(&self, list: ListName, id: i64, kind: MediaKind) -> bool {
        lock(&self.lists).get(list).iter().any(|e| e.matches(id, kind))
    }

    /// Moves `item` to the front of continue-watching, keeping the most
    /// recent `CONTINUE_WATCHING_LIMIT` entries.
    pub fn record_watch(&self, item: &MediaItem) -> Result<()> {
        let mut lists = lock(&self.lists);
        let mut next = lists.get(ListName::ContinueWatching).clone();
        next.retain(|e| !e.matches(item.id, item.kind));
        next.insert(0, UserListEntry::from(item));
        next.truncate(CONTINUE_WATCHING_LIMIT);
        self.persist(ListName::ContinueWatching.key(), &next)?;
        *lists.get_mut(ListName::ContinueWatching) = next;
        Ok(())
    }

    /// Removes `item` if present, otherwise inserts it at the front.
    /// Returns whether the item is a member afterwards. Continue-watching is
    /// only written through `record_watch`.
    pub fn toggle_list_membership(&self, list: ListName, item: &MediaItem) -> Result<bool> {
        if list == ListName::ContinueWatching {
            bail!("continueWatching cannot be toggled, use record_watch");
        }
        let mut lists = lock(&self.lists);
        let mut next = lists.get(list).clone();
        let before = next.len();
        next.retain(|e| !e.matches(item.id, item.kind));
        let member = next.len() == before;
        if member {
            next.insert(0, UserListEntry::from(item));
        }
        self.persist(list.key(), &next)?;
        *lists.get_mut(list) = next;
        Ok(member)
    }

    pub fn clear(&self, list: ListName) -> Result<()> {
        let mut lists = lock(&self.lists);
        self.persist(list.key(), &Vec::<UserListEntry>::new())?;
        lists.get_mut(list).clear();
        Ok(())
    }

    pub fn theme(&self) -> Theme {
        lock(&self.lists).theme
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        let mut lists = lock(&self.lists);
        self.backend
            .write(THEME_KEY, theme.as_str())
            .with_context(|| format!("Failed to persist '{}'", THEME_KEY))?;
        lists.theme = theme;
        Ok(())
    }

    fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let encoded = serde_json::to_string(value).context("Failed to encode preference")?;
        self.backend
            .write(key, &encoded)
            .with_context(|| format!("Failed to persist '{}'", key))
    }
}

fn read_raw(backend: &dyn PreferenceBackend, key: &str) -> Option<String> {
    match backend.read(key) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Could not read '{}', starting empty: {:#}", key, e);
            None
        }
    }
}

fn read_or_default<T: DeserializeOwned + Default>(
    backend: &dyn PreferenceBackend,
    key: &str,
) -> T {
    let Some(raw) = read_raw(backend, key) else {
        return T::default();
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring malformed '{}': {}", key, e);
            T::default()
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
