//! Persistent endpoint cache.
//!
//! One JSON file maps device IP → vendor, identity and known AVTransport
//! endpoints. Records are only changed through [`CacheStore::merge`] and the
//! forget operations; nothing expires on its own.

mod models;
mod store;

use std::path::Path;

use crate::confirm::Confirm;

pub use models::{CacheRow, CachedDevice, DeviceUpdate, Endpoint, SelectedDevice};
pub use store::{default_cache_path, CacheError, CacheResult, CacheStore};

pub(crate) use store::create_private_dir;

/// What to remove from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForgetTarget {
    Ip(String),
    All,
}

/// Result of a forget request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForgetOutcome {
    /// The device was removed.
    Removed,
    /// Every device was removed; carries how many there were.
    Cleared(usize),
    /// The IP was not cached. Nothing was written.
    NotCached,
    /// The user said no. Nothing was written.
    Declined,
}

/// Removes one device or all devices from the cache file at `path`.
///
/// Asks `confirm` first unless `assume_yes` is set. Forgetting everything
/// always leaves a valid, empty cache file behind.
pub fn forget(
    path: &Path,
    target: &ForgetTarget,
    confirm: &dyn Confirm,
    assume_yes: bool,
) -> CacheResult<ForgetOutcome> {
    let mut store = CacheStore::load(path)?;

    let question = match target {
        ForgetTarget::Ip(ip) => {
            if store.get(ip).is_none() {
                log::info!("[Cache] {} is not cached, nothing to forget", ip);
                return Ok(ForgetOutcome::NotCached);
            }
            format!("Forget cached device {}?", ip)
        }
        ForgetTarget::All => format!("Delete ALL {} cached devices?", store.len()),
    };

    if !assume_yes && !confirm.confirm(&question) {
        log::info!("[Cache] Forget declined");
        return Ok(ForgetOutcome::Declined);
    }

    let outcome = match target {
        ForgetTarget::Ip(ip) => {
            store.remove(ip);
            log::info!("[Cache] Forgot {}", ip);
            ForgetOutcome::Removed
        }
        ForgetTarget::All => {
            let count = store.len();
            store.clear();
            log::info!("[Cache] Forgot all {} device(s)", count);
            ForgetOutcome::Cleared(count)
        }
    };

    store.save(path)?;
    Ok(outcome)
}
