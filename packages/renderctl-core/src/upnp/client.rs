//! Concrete network client implementing the renderer traits.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::discovery::{discover_renderers, DiscoveryResult};
use super::playback;
use super::soap::{http_client, SoapResult};
use super::traits::{AvTransportControl, RendererDiscovery};
use super::types::DetectedTv;

/// Talks to real renderers over the network.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct UpnpClient {
    http: Client,
}

impl UpnpClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: http_client(),
        }
    }

    /// The HTTP client used for SOAP and descriptor requests.
    #[must_use]
    pub fn http(&self) -> &Client {
        &self.http
    }
}

impl Default for UpnpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AvTransportControl for UpnpClient {
    async fn stop(&self, control_url: &str) -> SoapResult<()> {
        playback::stop(&self.http, control_url).await
    }

    async fn set_av_transport_uri(
        &self,
        control_url: &str,
        uri: &str,
        metadata: &str,
    ) -> SoapResult<()> {
        playback::set_av_transport_uri(&self.http, control_url, uri, metadata).await
    }

    async fn play(&self, control_url: &str) -> SoapResult<()> {
        playback::play(&self.http, control_url).await
    }
}

#[async_trait]
impl RendererDiscovery for UpnpClient {
    async fn discover_tvs(
        &self,
        local_ip: &str,
        timeout: Duration,
    ) -> DiscoveryResult<Vec<DetectedTv>> {
        discover_renderers(&self.http, local_ip, timeout).await
    }
}
