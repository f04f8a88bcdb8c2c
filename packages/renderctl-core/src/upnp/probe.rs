//! Direct AVTransport probing for renderers that never answer SSDP.
//!
//! Tries every port × path combination with a GetTransportInfo call. Any
//! HTTP answer of 200 or 500 means something speaks AVTransport there.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tokio::time::Instant;

use super::services::UpnpService;
use super::soap::SoapRequestBuilder;
use super::utils::build_control_url;
use crate::protocol_constants::SOAP_PROBE_TIMEOUT_SECS;

/// Ports renderers commonly expose AVTransport on.
pub const PROBE_PORTS: &[u16] = &[
    9197, // Samsung DMR
    7678, // Samsung AllShare
    8187,
    9119,
    8080,
];

/// Control paths renderers commonly expose AVTransport on.
pub const PROBE_PATHS: &[&str] = &[
    "/dmr/upnp/control/AVTransport1",
    "/upnp/control/AVTransport",
    "/MediaRenderer/AVTransport/Control",
    "/AVTransport/control",
];

/// Extra ports tried by a deep search, after [`PROBE_PORTS`].
pub const DEEP_PROBE_PORTS: &[u16] = &[80, 49152, 49153, 52235, 55000, 1400, 8008, 8200];

/// Extra paths tried by a deep search, after [`PROBE_PATHS`].
pub const DEEP_PROBE_PATHS: &[&str] = &[
    "/AVTransport/Control",
    "/upnp/control/avtransport1",
    "/MediaRenderer/AVTransport/control",
    "/dmr/control/AVTransport",
];

/// Errors from direct probing.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No target IP was configured.
    #[error("probe requires a target IP")]
    MissingIp,

    /// Every combination was tried without a hit.
    #[error("no AVTransport endpoint found on {0}")]
    NotFound(String),

    /// The overall budget ran out.
    #[error("AVTransport probe of {ip} timed out after {budget:?}")]
    Timeout { ip: String, budget: Duration },
}

/// Ports and paths to try, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbePlan {
    pub ports: Vec<u16>,
    pub paths: Vec<String>,
}

impl ProbePlan {
    /// The standard lists, extended with the deep-search lists when `deep`.
    #[must_use]
    pub fn standard(deep: bool) -> Self {
        let mut ports = PROBE_PORTS.to_vec();
        let mut paths: Vec<String> = PROBE_PATHS.iter().map(|p| (*p).to_string()).collect();
        if deep {
            ports.extend_from_slice(DEEP_PROBE_PORTS);
            paths.extend(DEEP_PROBE_PATHS.iter().map(|p| (*p).to_string()));
        }
        Self { ports, paths }
    }

    /// Control URLs in the order they are tried (ports outer, paths inner).
    pub fn control_urls(&self, ip: &str) -> Vec<String> {
        self.ports
            .iter()
            .flat_map(|port| {
                self.paths
                    .iter()
                    .map(move |path| build_control_url(ip, &port.to_string(), path))
            })
            .collect()
    }
}

/// Probes `ip` and returns the first control URL that answers.
///
/// The budget is checked before each attempt; each attempt's timeout is
/// the probe timeout clamped to what remains.
pub async fn probe_avtransport(
    client: &Client,
    ip: &str,
    plan: &ProbePlan,
    budget: Duration,
) -> Result<String, ProbeError> {
    if ip.trim().is_empty() {
        return Err(ProbeError::MissingIp);
    }

    let deadline = Instant::now() + budget;
    let urls = plan.control_urls(ip);
    log::info!("[Probe] Probing {} candidate(s) on {} (budget {:?})", urls.len(), ip, budget);

    for url in &urls {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            log::warn!("[Probe] Budget exhausted on {}", ip);
            return Err(ProbeError::Timeout {
                ip: ip.to_string(),
                budget,
            });
        }

        let attempt_timeout = remaining.min(Duration::from_secs(SOAP_PROBE_TIMEOUT_SECS));
        let status = SoapRequestBuilder::new(client, url)
            .service(UpnpService::AVTransport)
            .action("GetTransportInfo")
            .instance_id()
            .timeout(attempt_timeout)
            .send_for_status()
            .await;

        match status {
            Ok(code @ (200 | 500)) => {
                log::info!("[Probe] Hit: {} (HTTP {})", url, code);
                return Ok(url.clone());
            }
            Ok(code) => log::debug!("[Probe] {} -> HTTP {}", url, code),
            Err(e) => log::debug!("[Probe] {} -> {}", url, e),
        }
    }

    Err(ProbeError::NotFound(ip.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upnp::test_fixtures::{spawn_fake_renderer, unused_port, FakeRenderer};

    #[test]
    fn standard_plan_orders_ports_outer() {
        let plan = ProbePlan::standard(false);
        let urls = plan.control_urls("10.0.0.5");
        assert_eq!(urls.len(), 20);
        assert_eq!(urls[0], "http://10.0.0.5:9197/dmr/upnp/control/AVTransport1");
        assert_eq!(urls[1], "http://10.0.0.5:9197/upnp/control/AVTransport");
        assert_eq!(urls[4], "http://10.0.0.5:7678/dmr/upnp/control/AVTransport1");
    }

    #[test]
    fn deep_plan_appends_after_base_lists() {
        let plan = ProbePlan::standard(true);
        assert_eq!(plan.ports.len(), 13);
        assert_eq!(plan.paths.len(), 8);
        assert_eq!(&plan.ports[..5], PROBE_PORTS);
        assert_eq!(plan.ports[5], 80);
        assert_eq!(plan.paths[4], "/AVTransport/Control");
    }

    #[tokio::test]
    async fn probe_hits_fake_renderer() {
        let renderer = spawn_fake_renderer(FakeRenderer::default()).await;
        let dead_port = unused_port().await;
        let client = Client::new();
        let plan = ProbePlan {
            ports: vec![dead_port, renderer.port()],
            paths: vec!["/nope".into(), "/upnp/control/AVTransport1".into()],
        };

        let url = probe_avtransport(&client, "127.0.0.1", &plan, Duration::from_secs(8))
            .await
            .unwrap();

        assert_eq!(url, renderer.av_transport_url());
    }

    #[tokio::test]
    async fn http_500_counts_as_hit() {
        let renderer = spawn_fake_renderer(FakeRenderer {
            fail_actions: vec!["GetTransportInfo".into()],
            ..FakeRenderer::default()
        })
        .await;
        let client = Client::new();
        let plan = ProbePlan {
            ports: vec![renderer.port()],
            paths: vec!["/upnp/control/AVTransport1".into()],
        };

        let url = probe_avtransport(&client, "127.0.0.1", &plan, Duration::from_secs(8)).await;
        assert!(url.is_ok());
    }

    #[tokio::test]
    async fn exhausted_plan_is_not_found() {
        let port = unused_port().await;
        let client = Client::new();
        let plan = ProbePlan {
            ports: vec![port],
            paths: vec!["/a".into(), "/b".into()],
        };

        let err = probe_avtransport(&client, "127.0.0.1", &plan, Duration::from_secs(8))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::NotFound(_)));
    }

    #[tokio::test]
    async fn slow_endpoints_respect_budget() {
        let renderer = spawn_fake_renderer(FakeRenderer {
            response_delay: Some(Duration::from_secs(5)),
            ..FakeRenderer::default()
        })
        .await;
        let client = Client::new();

        let start = std::time::Instant::now();
        let err = probe_avtransport(
            &client,
            "127.0.0.1",
            &ProbePlan {
                ports: vec![renderer.port()],
                paths: vec!["/x".into(), "/y".into(), "/z".into()],
            },
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ProbeError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn empty_ip_is_rejected() {
        let client = Client::new();
        let plan = ProbePlan::standard(false);
        let err = probe_avtransport(&client, " ", &plan, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::MissingIp));
    }
}
