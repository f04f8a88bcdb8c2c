//! The endpoint cache: merge rules, selection, and JSON persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::{CacheRow, CachedDevice, DeviceUpdate, Endpoint, SelectedDevice};
use crate::protocol_constants::{CACHE_FILE_NAME, STATE_DIR_NAME};

/// Errors from cache persistence and lookup.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The home directory could not be determined.
    #[error("cannot determine home directory")]
    NoHomeDir,

    /// Reading or writing the cache file failed.
    #[error("cache I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache file exists but is not valid JSON for the store.
    #[error("corrupt cache file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing the store failed.
    #[error("failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    /// No device at this index, or the device has no playable endpoint.
    #[error("invalid cache index: {0}")]
    InvalidIndex(i64),
}

/// Convenient Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Default cache file location: `~/.renderctl/devices.json`.
pub fn default_cache_path() -> CacheResult<PathBuf> {
    let home = dirs::home_dir().ok_or(CacheError::NoHomeDir)?;
    Ok(home.join(STATE_DIR_NAME).join(CACHE_FILE_NAME))
}

/// All cached devices, keyed by IP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheStore {
    devices: BTreeMap<String, CachedDevice>,
}

impl CacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn get(&self, ip: &str) -> Option<&CachedDevice> {
        self.devices.get(ip)
    }

    /// Merges one observation of `ip` into the store.
    ///
    /// - the device is created on first sight
    /// - vendor is only set while empty
    /// - identity is replaced by any new value
    /// - the endpoint (when the update names one) is created or updated;
    ///   its `seen_at` never moves backwards, and connection manager URL,
    ///   actions and media are only overwritten by non-empty values
    pub fn merge(&mut self, ip: &str, update: DeviceUpdate, now: DateTime<Utc>) {
        let device = self.devices.entry(ip.to_string()).or_default();

        if device.vendor.is_none() {
            device.vendor = update.vendor;
        }
        if update.identity.is_some() {
            device.identity = update.identity;
        }

        if update.control_url.is_empty() {
            return;
        }

        let endpoint = device
            .endpoints
            .entry(update.control_url.clone())
            .or_insert_with(|| Endpoint {
                control_url: update.control_url.clone(),
                conn_mgr_url: String::new(),
                actions: BTreeMap::new(),
                media: BTreeMap::new(),
                seen_at: now,
            });

        endpoint.seen_at = endpoint.seen_at.max(now);

        if !update.conn_mgr_url.is_empty() {
            endpoint.conn_mgr_url = update.conn_mgr_url;
        }
        if !update.validated_actions.is_empty() {
            endpoint.actions = update
                .validated_actions
                .into_iter()
                .map(|name| (name, true))
                .collect();
        }
        if !update.media.is_empty() {
            endpoint.media = update.media;
        }
    }

    /// Primary endpoint of `ip`, if the device is cached and playable.
    pub fn primary_endpoint(&self, ip: &str) -> Option<&Endpoint> {
        self.devices.get(ip).and_then(CachedDevice::primary_endpoint)
    }

    /// Picks the device at `index` in IP order.
    ///
    /// # Errors
    /// `InvalidIndex` if out of range or the device has no playable endpoint.
    pub fn select(&self, index: i64) -> CacheResult<SelectedDevice> {
        let (ip, device) = usize::try_from(index)
            .ok()
            .and_then(|i| self.devices.iter().nth(i))
            .ok_or(CacheError::InvalidIndex(index))?;

        let primary = device
            .primary_endpoint()
            .ok_or(CacheError::InvalidIndex(index))?;

        Ok(SelectedDevice {
            ip: ip.clone(),
            vendor: device.vendor.unwrap_or_default(),
            control_url: primary.control_url.clone(),
            conn_mgr_url: primary.conn_mgr_url.clone(),
            identity: device.identity.clone(),
        })
    }

    /// Device at `index` in IP order, for detail views.
    pub fn device_at(&self, index: i64) -> CacheResult<(&String, &CachedDevice)> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.devices.iter().nth(i))
            .ok_or(CacheError::InvalidIndex(index))
    }

    /// One summary row per device, in IP order.
    pub fn rows(&self) -> Vec<CacheRow> {
        self.devices
            .iter()
            .enumerate()
            .map(|(index, (ip, device))| {
                let primary = device.primary_endpoint();
                CacheRow {
                    index,
                    ip: ip.clone(),
                    vendor: device.vendor,
                    friendly_name: device
                        .identity
                        .as_ref()
                        .map(|i| i.friendly_name.clone())
                        .filter(|n| !n.is_empty()),
                    control_url: primary.map(|ep| ep.control_url.clone()),
                    conn_mgr_url: primary
                        .map(|ep| ep.conn_mgr_url.clone())
                        .filter(|u| !u.is_empty()),
                }
            })
            .collect()
    }

    /// Removes one device. Returns false if it was not cached.
    pub fn remove(&mut self, ip: &str) -> bool {
        self.devices.remove(ip).is_some()
    }

    /// Removes every device.
    pub fn clear(&mut self) {
        self.devices.clear();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────────

    /// Loads the store from `path`. A missing file is an empty store.
    pub fn load(path: &Path) -> CacheResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("[Cache] No cache file at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&contents).map_err(|source| CacheError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Saves the store to `path`.
    ///
    /// Writes `<path>.tmp` and renames it over the target so a crash never
    /// leaves a half-written cache. The parent directory is created with
    /// mode 0700 on Unix.
    pub fn save(&self, path: &Path) -> CacheResult<()> {
        let io_err = |source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_private_dir(parent).map_err(io_err)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        let mut temp_path = path.as_os_str().to_owned();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        std::fs::write(&temp_path, contents).map_err(io_err)?;
        std::fs::rename(&temp_path, path).map_err(io_err)?;

        log::debug!("[Cache] Saved {} device(s) to {}", self.len(), path.display());
        Ok(())
    }
}

/// Creates `dir` and any missing parents, owner-only on Unix.
pub(crate) fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(dir)
    }
    #[cfg(not(unix))]
    {
        std::fs::create_dir_all(dir)
    }
}
