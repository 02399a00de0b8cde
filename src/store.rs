use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::limits::MAX_STORE_KEY_LEN;

pub const BOOKINGS_KEY: &str = "bookings";
pub const GALLERY_KEY: &str = "gallery";
pub const ADMIN_KEY: &str = "admin";

/// Whole-blob key-value storage. Values are opaque strings (JSON here).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> io::Result<Option<String>>;
    async fn put(&self, key: &str, value: &str) -> io::Result<()>;
}

fn check_key(key: &str) -> io::Result<()> {
    if key.is_empty() || key.len() > MAX_STORE_KEY_LEN {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "bad store key length"));
    }
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "bad store key characters"));
    }
    Ok(())
}

// ── File store ───────────────────────────────────────────────────

/// One `<key>.json` file per key under a data directory.
///
/// Writes go to `<key>.json.tmp`, are fsynced, then renamed over the live
/// file, so a crash mid-write leaves the previous value intact.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (or create) the data directory.
    pub async fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        check_key(key)?;
        match fs::read_to_string(self.path_for(key)).await {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn put(&self, key: &str, value: &str) -> io::Result<()> {
        check_key(key)?;
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        let result = write_then_rename(&tmp_path, &path, value).await;
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path).await;
        }
        result
    }
}

async fn write_then_rename(tmp_path: &Path, path: &Path, value: &str) -> io::Result<()> {
    let mut file = fs::File::create(tmp_path).await?;
    file.write_all(value.as_bytes()).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(tmp_path, path).await
}

// ── Memory store ─────────────────────────────────────────────────

/// Process-lifetime store. Backs the admin session flag.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        check_key(key)?;
        Ok(self.entries.get(key).map(|e| e.value().clone()))
    }

    async fn put(&self, key: &str, value: &str) -> io::Result<()> {
        check_key(key)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ── JSON helpers ─────────────────────────────────────────────────

/// Load a JSON value, falling back to `default` when the key is missing,
/// unreadable, or holds something that does not parse.
pub async fn load_json_or<T, F>(store: &dyn KeyValueStore, key: &str, default: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    let raw = match store.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return default(),
        Err(e) => {
            tracing::error!("error reading {key} from store: {e}");
            return default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("error parsing stored {key}, using defaults: {e}");
            default()
        }
    }
}

pub async fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> io::Result<()> {
    let json = serde_json::to_string(value).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    store.put(key, &json).await
}
