//! The process's own persistent UUID.
//!
//! Used to skip our own SSDP announcements when another renderctl component
//! on this host advertises itself.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::cache::create_private_dir;
use crate::protocol_constants::{SELF_UUID_FILE_NAME, STATE_DIR_NAME};

/// Default location: `~/.renderctl/server_uuid`.
pub fn default_self_uuid_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(STATE_DIR_NAME).join(SELF_UUID_FILE_NAME))
}

/// Reads the UUID at `path`, creating it with a fresh v4 value when missing.
///
/// The file is created owner-only (0600) and its directory 0700 on Unix.
pub fn load_or_create_self_uuid(path: &Path) -> std::io::Result<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let value = contents.trim();
            if !value.is_empty() {
                return Ok(value.to_string());
            }
            log::warn!("[SelfId] {} is empty, regenerating", path.display());
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_private_dir(parent)?;
    }

    let value = Uuid::new_v4().to_string();
    write_private_file(path, &value)?;
    log::info!("[SelfId] Created self UUID {}", value);
    Ok(value)
}

/// UDN form of a self UUID as it appears in device descriptors.
pub fn self_udn(uuid: &str) -> String {
    format!("uuid:{}", uuid)
}

fn write_private_file(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())
}
