//! Per-device session: which group this device is in, and under what nickname.
//!
//! The session is local and non-authoritative. It is read once at startup,
//! written when a group is created, joined or renamed into, and cleared when
//! the user switches groups or the group turns out to be gone.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::{Error, Result};

pub const GROUP_ID_KEY: &str = "group_id";
pub const NICKNAME_KEY: &str = "nickname";

/// Persisted key-value storage provided by the device.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn delete(&mut self, key: &str) -> Result<()>;
}

/// Key-value store kept in a TOML file, rewritten on every change.
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileKeyValueStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    /// `session.toml` in the platform config directory.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "homepage").ok_or_else(|| {
            Error::Config("could not determine config directory, is $HOME set?".to_string())
        })?;
        Ok(dirs.config_dir().join("session.toml"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&self.entries)?;
        fs::write(&self.path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}

/// Non-persistent store, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

pub struct Session {
    kv: Box<dyn KeyValueStore>,
    group_id: Option<String>,
    nickname: Option<String>,
}

impl Session {
    /// Reads whatever a previous run left behind.
    pub fn load(kv: Box<dyn KeyValueStore>) -> Result<Self> {
        let group_id = kv.get(GROUP_ID_KEY)?;
        let nickname = kv.get(NICKNAME_KEY)?;
        Ok(Self {
            kv,
            group_id,
            nickname,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            kv: Box::new(MemoryKeyValueStore::default()),
            group_id: None,
            nickname: None,
        }
    }

    #[must_use]
    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    #[must_use]
    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    pub fn set_group_id(&mut self, group_id: &str) -> Result<()> {
        self.kv.set(GROUP_ID_KEY, group_id)?;
        self.group_id = Some(group_id.to_string());
        Ok(())
    }

    pub fn clear_group_id(&mut self) -> Result<()> {
        self.kv.delete(GROUP_ID_KEY)?;
        self.group_id = None;
        Ok(())
    }

    pub fn set_nickname(&mut self, nickname: &str) -> Result<()> {
        self.kv.set(NICKNAME_KEY, nickname)?;
        self.nickname = Some(nickname.to_string());
        Ok(())
    }

    pub fn clear_nickname(&mut self) -> Result<()> {
        self.kv.delete(NICKNAME_KEY)?;
        self.nickname = None;
        Ok(())
    }
}
