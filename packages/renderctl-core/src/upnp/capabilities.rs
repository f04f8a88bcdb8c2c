//! Capability enrichment: advertised actions, live validation, supported media.

use std::collections::BTreeMap;
use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use reqwest::Client;

use super::services::UpnpService;
use super::soap::{http_get_text, SoapRequestBuilder, SoapResult};
use super::types::Capabilities;
use super::utils::extract_xml_text;
use crate::protocol_constants::SOAP_TIMEOUT_SECS;

/// Read-only AVTransport actions used to prove a control URL works.
pub const VALIDATION_ACTIONS: &[&str] = &["GetTransportInfo", "GetMediaInfo", "GetPositionInfo"];

/// Extracts action names from an SCPD `<actionList>`.
///
/// Only `<name>` elements that are direct children of `<action>` count;
/// argument names inside `<argumentList>` and state variable names are
/// skipped.
pub fn parse_scpd_actions(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut actions = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local = e.local_name().as_ref().to_vec();
                let in_action = path.last().is_some_and(|p| p.as_slice() == b"action")
                    && path.len() >= 2
                    && path[path.len() - 2].as_slice() == b"actionList";
                if local.as_slice() == b"name" && in_action {
                    if let Ok(text) = reader.read_text(e.name()) {
                        let name = text.trim();
                        if !name.is_empty() {
                            actions.push(name.to_string());
                        }
                    }
                } else {
                    path.push(local);
                }
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::trace!("[Capabilities] Error parsing SCPD: {:?}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    actions
}

/// Groups a `Sink` protocol-info list into MIME type → DLNA profiles.
///
/// Each entry is `protocol:network:mime:profile`; entries with fewer than
/// four parts are dropped. Profiles keep the renderer's order. The profile
/// part may itself contain colons and is kept whole.
pub fn parse_protocol_info(sink: &str) -> BTreeMap<String, Vec<String>> {
    let mut media: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in sink.split(',') {
        let parts: Vec<&str> = entry.trim().splitn(4, ':').collect();
        if parts.len() < 4 {
            continue;
        }
        media
            .entry(parts[2].to_string())
            .or_default()
            .push(parts[3].to_string());
    }
    media
}

/// Fetches the AVTransport SCPD and returns its advertised actions.
pub async fn fetch_advertised_actions(client: &Client, scpd_url: &str) -> SoapResult<Vec<String>> {
    let xml = http_get_text(client, scpd_url, Duration::from_secs(SOAP_TIMEOUT_SECS)).await?;
    Ok(parse_scpd_actions(&xml))
}

/// Calls each validation action against the control URL.
///
/// An action validates when it answers HTTP 200 without a SOAP fault.
pub async fn validate_actions(client: &Client, control_url: &str) -> BTreeMap<String, bool> {
    let mut results = BTreeMap::new();
    for action in VALIDATION_ACTIONS {
        let ok = match SoapRequestBuilder::new(client, control_url)
            .service(UpnpService::AVTransport)
            .action(action)
            .instance_id()
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                log::debug!("[Capabilities] {} failed on {}: {}", action, control_url, e);
                false
            }
        };
        results.insert((*action).to_string(), ok);
    }
    results
}

/// Queries ConnectionManager `GetProtocolInfo` and parses `Sink`.
pub async fn fetch_media(
    client: &Client,
    conn_mgr_url: &str,
) -> SoapResult<BTreeMap<String, Vec<String>>> {
    let body = SoapRequestBuilder::new(client, conn_mgr_url)
        .service(UpnpService::ConnectionManager)
        .action("GetProtocolInfo")
        .send()
        .await?;
    let sink = extract_xml_text(&body, "Sink").unwrap_or_default();
    Ok(parse_protocol_info(&sink))
}

/// Builds the capability record for one endpoint.
///
/// SCPD and protocol-info failures are logged and leave their part empty;
/// live validation always runs.
pub async fn enrich_capabilities(
    client: &Client,
    scpd_url: &str,
    control_url: &str,
    conn_mgr_url: &str,
) -> Capabilities {
    let mut caps = Capabilities::default();

    if !scpd_url.is_empty() {
        match fetch_advertised_actions(client, scpd_url).await {
            Ok(actions) => {
                log::debug!(
                    "[Capabilities] {} advertised action(s) at {}",
                    actions.len(),
                    scpd_url
                );
                for action in actions {
                    caps.actions.insert(action, false);
                }
            }
            Err(e) => log::warn!("[Capabilities] SCPD fetch failed for {}: {}", scpd_url, e),
        }
    }

    // Live results win over advertised entries
    caps.actions.extend(validate_actions(client, control_url).await);

    if !conn_mgr_url.is_empty() {
        match fetch_media(client, conn_mgr_url).await {
            Ok(media) => caps.media = media,
            Err(e) => log::warn!(
                "[Capabilities] GetProtocolInfo failed for {}: {}",
                conn_mgr_url,
                e
            ),
        }
    }

    log::info!(
        "[Capabilities] {}: {} validated action(s), {} media type(s)",
        control_url,
        caps.validated_actions().len(),
        caps.media.len()
    );
    caps
}
