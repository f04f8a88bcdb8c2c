//! AVTransport playback commands and the ordered play sequence.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

use super::didl::metadata_for_vendor;
use super::services::UpnpService;
use super::soap::{SoapError, SoapRequestBuilder, SoapResult};
use super::traits::AvTransportControl;
use super::types::Target;
use super::vendor::Vendor;
use crate::protocol_constants::PLAYBACK_SETTLE_MS;

/// A playback command that must succeed failed.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The renderer refused or never answered SetAVTransportURI.
    #[error("SetAVTransportURI failed: {0}")]
    SetUri(#[source] SoapError),

    /// The renderer refused or never answered Play.
    #[error("Play failed: {0}")]
    Play(#[source] SoapError),
}

/// Sends Stop to an AVTransport control URL.
pub async fn stop(client: &Client, control_url: &str) -> SoapResult<()> {
    SoapRequestBuilder::new(client, control_url)
        .service(UpnpService::AVTransport)
        .action("Stop")
        .instance_id()
        .send()
        .await?;
    Ok(())
}

/// Loads a media URI with optional `CurrentURIMetaData`.
pub async fn set_av_transport_uri(
    client: &Client,
    control_url: &str,
    uri: &str,
    metadata: &str,
) -> SoapResult<()> {
    SoapRequestBuilder::new(client, control_url)
        .service(UpnpService::AVTransport)
        .action("SetAVTransportURI")
        .instance_id()
        .arg("CurrentURI", uri)
        .arg("CurrentURIMetaData", metadata)
        .send()
        .await?;
    Ok(())
}

/// Sends Play with Speed=1.
pub async fn play(client: &Client, control_url: &str) -> SoapResult<()> {
    SoapRequestBuilder::new(client, control_url)
        .service(UpnpService::AVTransport)
        .action("Play")
        .instance_id()
        .arg("Speed", "1")
        .send()
        .await?;
    Ok(())
}

/// Runs the playback sequence against a resolved target.
///
/// Stop → settle → SetAVTransportURI → Play. Stop failures are logged and
/// ignored (an idle renderer often faults on Stop); the other two are fatal.
pub async fn play_target(
    control: &dyn AvTransportControl,
    target: &Target,
    vendor: Vendor,
) -> Result<(), PlaybackError> {
    log::info!("[Playback] Stop: {}", target.control_url);
    if let Err(e) = control.stop(&target.control_url).await {
        log::warn!("[Playback] Stop failed (ignored): {}", e);
    }

    tokio::time::sleep(Duration::from_millis(PLAYBACK_SETTLE_MS)).await;

    let metadata = metadata_for_vendor(vendor, &target.media_url);
    log::info!(
        "[Playback] SetAVTransportURI: uri={}, vendor={}, metadata={} bytes",
        target.media_url,
        vendor,
        metadata.len()
    );
    control
        .set_av_transport_uri(&target.control_url, &target.media_url, &metadata)
        .await
        .map_err(PlaybackError::SetUri)?;

    log::info!("[Playback] SetAVTransportURI succeeded, sending Play");
    control
        .play(&target.control_url)
        .await
        .map_err(PlaybackError::Play)?;

    log::info!("[Playback] Play succeeded");
    Ok(())
}
