use crate::config::{CACHE_KEY, CACHE_TTL};
use crate::error::CacheError;
use crate::models::{CacheBlob, CacheEntry, RateSnapshot};
use chrono::Utc;
use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing::{debug, warn};

/// Key-value slot holding the serialized cache blob.
pub trait CacheBackend: Send + Sync {
    /// Returns `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> io::Result<Option<String>>;
    fn save(&self, blob: &str) -> io::Result<()>;
}

/// Stores the blob as `{dir}/rates_cache_v1.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", CACHE_KEY))
    }
}

impl CacheBackend for FileBackend {
    fn load(&self) -> io::Result<Option<String>> {
        let file = match File::open(self.path()) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let mut contents = String::new();
        BufReader::new(file).read_to_string(&mut contents)?;
        Ok(Some(contents))
    }

    fn save(&self, blob: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let file = File::create(self.path())?;
        let mut writer = BufWriter::new(file);
        writer.write_all(blob.as_bytes())?;
        writer.flush()
    }
}

/// In-process backend, used where nothing should touch the disk.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    blob: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }

    pub fn blob(&self) -> Option<String> {
        self.blob.lock().ok().and_then(|blob| blob.clone())
    }
}

impl CacheBackend for MemoryBackend {
    fn load(&self) -> io::Result<Option<String>> {
        self.blob
            .lock()
            .map(|blob| blob.clone())
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory cache lock poisoned"))
    }

    fn save(&self, blob: &str) -> io::Result<()> {
        let mut slot = self
            .blob
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory cache lock poisoned"))?;
        *slot = Some(blob.to_string());
        Ok(())
    }
}

/// Rate snapshots keyed by base currency, valid for a fixed TTL.
///
/// Every failure in here is absorbed: unreadable or corrupt blobs read as a
/// miss, failed writes are logged and dropped.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            ttl: CACHE_TTL,
        }
    }

    pub fn get(&self, base: &str) -> Option<RateSnapshot> {
        self.get_at(base, Utc::now().timestamp_millis())
    }

    pub fn set(&self, base: &str, data: &RateSnapshot) {
        self.set_at(base, data, Utc::now().timestamp_millis())
    }

    /// Looks up `base` as of `now_ms`. An entry is fresh while
    /// `now_ms - ts <= ttl`.
    pub fn get_at(&self, base: &str, now_ms: i64) -> Option<RateSnapshot> {
        let blob = self.load_or_empty();
        let value = blob.get(base)?;

        let entry: CacheEntry = match serde_json::from_value(value.clone()) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("ignoring malformed cache entry for {}: {}", base, e);
                return None;
            }
        };

        let age = now_ms.saturating_sub(entry.ts);
        if age > self.ttl.as_millis() as i64 {
            debug!("cache entry for {} expired ({} ms old)", base, age);
            return None;
        }
        Some(entry.data)
    }

    pub fn set_at(&self, base: &str, data: &RateSnapshot, now_ms: i64) {
        if let Err(e) = self.try_set(base, data, now_ms) {
            warn!("{}", e);
        }
    }

    fn try_set(&self, base: &str, data: &RateSnapshot, now_ms: i64) -> Result<(), CacheError> {
        let mut blob = self.load_or_empty();
        let entry = CacheEntry {
            ts: now_ms,
            data: data.clone(),
        };
        let value = serde_json::to_value(&entry).map_err(|e| CacheError::Write(e.to_string()))?;
        blob.insert(base.to_string(), value);

        let text = serde_json::to_string(&blob).map_err(|e| CacheError::Write(e.to_string()))?;
        self.backend
            .save(&text)
            .map_err(|e| CacheError::Write(e.to_string()))
    }

    fn load_or_empty(&self) -> CacheBlob {
        match self.load_blob() {
            Ok(blob) => blob,
            Err(e) => {
                warn!("{}; treating cache as empty", e);
                CacheBlob::new()
            }
        }
    }

    fn load_blob(&self) -> Result<CacheBlob, CacheError> {
        let text = self
            .backend
            .load()
            .map_err(|e| CacheError::Read(e.to_string()))?;
        match text {
            Some(text) => serde_json::from_str(&text).map_err(|e| CacheError::Read(e.to_string())),
            None => Ok(CacheBlob::new()),
        }
    }
}
