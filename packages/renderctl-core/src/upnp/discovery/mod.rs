//! Renderer discovery: SSDP, descriptor fetch and vendor classification.
//!
//! [`discover_renderers`] is the end-to-end entry point. It listens for
//! announcements, filters them with [`looks_like_tv`], fetches descriptors,
//! and falls back to an active M-SEARCH when nothing usable was announced.

pub mod description;
pub mod ssdp;
pub mod types;

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;

use crate::protocol_constants::{SOAP_TIMEOUT_SECS, SSDP_ACTIVE_SEARCH_SECS};
use crate::upnp::types::DetectedTv;
use crate::upnp::utils::contains_ignore_ascii_case;

pub use description::{fetch_and_detect, parse_device_description, DeviceDescription};
pub use ssdp::{listen_notify, looks_like_tv, search};
pub use types::{DiscoveryError, DiscoveryResult, SsdpEntry, SsdpSource};

/// LOCATION marker of Samsung's auxiliary "nservice" descriptor, which
/// describes no renderer services.
const SKIPPED_LOCATION_MARKER: &str = "nservice";

/// Filters SSDP entries down to unique LOCATIONs worth a descriptor fetch.
///
/// Every rejection is logged with its reason.
pub fn select_candidates(entries: &[SsdpEntry], source: SsdpSource) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut locations = Vec::new();

    for entry in entries {
        if entry.location.is_empty() {
            log::debug!("[{}] Skipping {}: no LOCATION", source, entry.usn);
            continue;
        }
        if !looks_like_tv(entry) {
            log::debug!(
                "[{}] Skipping {}: not a TV (USN={}, SERVER={})",
                source,
                entry.location,
                entry.usn,
                entry.server
            );
            continue;
        }
        if contains_ignore_ascii_case(&entry.location, SKIPPED_LOCATION_MARKER) {
            log::debug!("[{}] Skipping {}: auxiliary descriptor", source, entry.location);
            continue;
        }
        if seen.insert(entry.location.clone()) {
            locations.push(entry.location.clone());
        }
    }

    locations
}

/// Fetches every candidate descriptor concurrently, keeping those that parse.
pub async fn fetch_candidates(client: &Client, locations: &[String]) -> Vec<DetectedTv> {
    let timeout = Duration::from_secs(SOAP_TIMEOUT_SECS);
    let fetches = locations
        .iter()
        .map(|location| fetch_and_detect(client, location, timeout));

    futures::future::join_all(fetches)
        .await
        .into_iter()
        .filter_map(|result| match result {
            Ok(tv) => Some(tv),
            Err(e) => {
                log::warn!("[Discovery] {}", e);
                None
            }
        })
        .collect()
}

/// Discovers renderers end to end.
///
/// Passive listen for `listen_window` on the interface owning `local_ip`;
/// if no candidate survives descriptor fetch, an active search runs as a
/// fallback. A failing passive listen (bad interface, port in use) also
/// falls through to the active search.
pub async fn discover_renderers(
    client: &Client,
    local_ip: &str,
    listen_window: Duration,
) -> DiscoveryResult<Vec<DetectedTv>> {
    match listen_notify(local_ip, listen_window).await {
        Ok(entries) => {
            let locations = select_candidates(&entries, SsdpSource::Notify);
            let tvs = fetch_candidates(client, &locations).await;
            if !tvs.is_empty() {
                log::info!("[Discovery] {} TV(s) from NOTIFY", tvs.len());
                return Ok(tvs);
            }
            log::info!("[Discovery] No usable TV from NOTIFY, trying active search");
        }
        Err(e) => {
            log::warn!("[Discovery] Passive listen failed ({}), trying active search", e);
        }
    }

    let entries = search(Duration::from_secs(SSDP_ACTIVE_SEARCH_SECS)).await?;
    let locations = select_candidates(&entries, SsdpSource::Search);
    let tvs = fetch_candidates(client, &locations).await;
    log::info!("[Discovery] {} TV(s) from M-SEARCH", tvs.len());
    Ok(tvs)
}
