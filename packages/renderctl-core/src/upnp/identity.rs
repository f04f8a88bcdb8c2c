//! Identity enrichment by probing well-known descriptor paths.
//!
//! Some renderers announce a LOCATION whose descriptor lacks friendly
//! names, or are found by the direct probe with no LOCATION at all. This
//! walks a fixed list of descriptor paths used by common TV stacks and
//! takes the first one that parses as a device descriptor.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tokio::time::Instant;

use super::discovery::parse_device_description;
use super::soap::http_get_text;
use super::types::Identity;

/// Descriptor paths, most common first.
pub const IDENTITY_PATHS: &[&str] = &[
    // generic
    "/device.xml",
    "/rootDesc.xml",
    "/description.xml",
    "/desc.xml",
    // UPnP common
    "/upnp/device.xml",
    "/upnp/devicedesc.xml",
    "/upnp/description.xml",
    "/upnp/desc.xml",
    // DMR / MediaRenderer
    "/dmr/device.xml",
    "/dmr/description.xml",
    "/dmr/desc.xml",
    "/MediaRenderer/device.xml",
    "/MediaRenderer/description.xml",
    "/MediaRenderer/desc.xml",
    // Samsung
    "/smp/device.xml",
    "/smp/description.xml",
    "/smp/desc.xml",
    "/AllShare/device.xml",
    "/AllShare/description.xml",
    // LG / webOS
    "/webos/device.xml",
    "/webos/description.xml",
    "/webos/desc.xml",
    // Sony / Android TV
    "/sony/device.xml",
    "/sony/description.xml",
    "/AV/device.xml",
    "/AV/description.xml",
    // Chromecast style
    "/setup/eureka_info",
    "/ssdp/device-desc.xml",
    // last resort
    "/renderer/device.xml",
    "/renderer/description.xml",
];

/// Errors from identity probing.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Every path was tried and none returned a device descriptor.
    #[error("no device descriptor found under {0}")]
    NotFound(String),

    /// The overall budget ran out before a descriptor was found.
    #[error("identity probing timed out after {0:?}")]
    Timeout(Duration),
}

/// Probes `base_url` + each of [`IDENTITY_PATHS`] in order.
///
/// `budget` is one deadline shared by all requests; each GET gets whatever
/// remains of it.
pub async fn enrich_identity(
    client: &Client,
    base_url: &str,
    budget: Duration,
) -> Result<Identity, IdentityError> {
    probe_identity_paths(client, base_url, IDENTITY_PATHS, budget).await
}

pub(crate) async fn probe_identity_paths(
    client: &Client,
    base_url: &str,
    paths: &[&str],
    budget: Duration,
) -> Result<Identity, IdentityError> {
    let base_url = base_url.trim_end_matches('/');
    let deadline = Instant::now() + budget;

    log::info!("[Identity] Probing {} descriptor path(s) under {}", paths.len(), base_url);

    for (i, path) in paths.iter().enumerate() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            log::info!("[Identity] Budget exhausted after {} path(s)", i);
            return Err(IdentityError::Timeout(budget));
        }

        let url = format!("{}{}", base_url, path);
        log::debug!("[Identity] [{}/{}] {}", i + 1, paths.len(), url);

        let body = match http_get_text(client, &url, remaining).await {
            Ok(body) => body,
            Err(e) => {
                log::trace!("[Identity] {}: {}", url, e);
                continue;
            }
        };

        match parse_device_description(&body) {
            Some(desc) => {
                log::info!(
                    "[Identity] Descriptor found at {} ({})",
                    url,
                    desc.identity.friendly_name
                );
                return Ok(desc.identity);
            }
            None => log::debug!("[Identity] {} is not a device descriptor", url),
        }
    }

    if Instant::now() >= deadline {
        return Err(IdentityError::Timeout(budget));
    }
    Err(IdentityError::NotFound(base_url.to_string()))
}
