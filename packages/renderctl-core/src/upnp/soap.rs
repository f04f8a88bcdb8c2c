//! Low-level SOAP/HTTP transport for UPnP renderers.
//!
//! This module handles SOAP envelope building, timed HTTP POST/GET and
//! SOAP fault detection. Every call takes an absolute control URL, because
//! renderers publish their own control paths.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

use super::services::UpnpService;
use super::utils::{escape_xml, extract_xml_text};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during SOAP operations with a renderer.
#[derive(Debug, Error)]
pub enum SoapError {
    /// HTTP request to the renderer failed (connect, read, or timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Renderer returned a non-success HTTP status without a SOAP fault.
    #[error("HTTP error {0}: {1}")]
    HttpStatus(u16, String),

    /// Renderer returned a SOAP fault response.
    #[error("SOAP fault: {0}")]
    Fault(String),

    /// Failed to parse the response body.
    #[error("Failed to parse SOAP response")]
    Parse,
}

/// Convenient Result alias for SOAP operations.
pub type SoapResult<T> = Result<T, SoapError>;

impl SoapError {
    /// Returns true if the request was abandoned because its timeout elapsed.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, SoapError::Http(e) if e.is_timeout())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Client
// ─────────────────────────────────────────────────────────────────────────────

/// Builds the shared HTTP client.
///
/// Per-request timeouts are applied by the callers, so the client itself
/// carries none. Falls back to a default client if the builder fails.
pub fn http_client() -> Client {
    Client::builder()
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("[SOAP] Failed to build HTTP client: {}, using default", e);
            Client::new()
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// SOAP Request/Response
// ─────────────────────────────────────────────────────────────────────────────

/// Builds a SOAP 1.1 envelope around a single action element.
///
/// The envelope is a single line with no whitespace before the root element,
/// since some renderer firmwares reject anything else.
pub fn build_envelope(service: UpnpService, action: &str, args: &[(&str, &str)]) -> String {
    let mut body = format!(
        r#"<?xml version="1.0" encoding="utf-8"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{} xmlns:u="{}">"#,
        action,
        service.urn()
    );

    for (k, v) in args {
        body.push_str(&format!("<{k}>{}</{k}>", escape_xml(v)));
    }

    body.push_str(&format!(r#"</u:{}></s:Body></s:Envelope>"#, action));
    body
}

/// POSTs a SOAP envelope and returns the raw HTTP status and body.
///
/// No status or fault interpretation happens here. The direct probe uses
/// this because a 500 answer still proves an AVTransport endpoint exists.
pub async fn post_soap(
    client: &Client,
    control_url: &str,
    service: UpnpService,
    action: &str,
    args: &[(&str, &str)],
    timeout: Duration,
) -> SoapResult<(u16, String)> {
    let body = build_envelope(service, action, args);

    log::debug!("[SOAP] {} -> {} (body: {} bytes)", action, control_url, body.len());
    log::trace!("[SOAP] Request body: {}", body);

    let start = std::time::Instant::now();
    let res = client
        .post(control_url)
        .header("Content-Type", "text/xml; charset=utf-8")
        .header("SOAPAction", service.soap_action(action))
        .body(body)
        .timeout(timeout)
        .send()
        .await;

    log::debug!(
        "[SOAP] {} completed in {:?}: {:?}",
        action,
        start.elapsed(),
        res.as_ref().map(|r| r.status())
    );

    let res = res?;
    let status = res.status().as_u16();
    let text = res.text().await?;
    Ok((status, text))
}

/// Sends a SOAP request to a renderer's control URL.
///
/// # Arguments
/// * `client` - The HTTP client to use for the request
/// * `control_url` - Absolute control URL of the service
/// * `service` - The UPnP service the action belongs to
/// * `action` - The SOAP action name (e.g., "Play", "Stop")
/// * `args` - Key-value pairs for action arguments (order is preserved)
/// * `timeout` - Per-request timeout
///
/// # Returns
/// The response body on success, or a `SoapError` if the request fails
/// or the renderer returns a SOAP fault.
pub async fn send_soap_request(
    client: &Client,
    control_url: &str,
    service: UpnpService,
    action: &str,
    args: &[(&str, &str)],
    timeout: Duration,
) -> SoapResult<String> {
    let (status, response_text) =
        post_soap(client, control_url, service, action, args, timeout).await?;

    // SOAP faults usually arrive with a 500 status, so check them first
    if is_soap_fault(&response_text) {
        let fault_msg = extract_fault_string(&response_text)
            .unwrap_or_else(|| "Unknown SOAP fault".to_string());
        return Err(SoapError::Fault(fault_msg));
    }

    if !(200..300).contains(&status) {
        return Err(SoapError::HttpStatus(status, response_text));
    }

    Ok(response_text)
}

/// GETs a document (device descriptor, SCPD) and returns its body.
///
/// Any status other than 200 is an error.
pub async fn http_get_text(client: &Client, url: &str, timeout: Duration) -> SoapResult<String> {
    log::debug!("[HTTP] GET {}", url);

    let res = client.get(url).timeout(timeout).send().await?;
    let status = res.status();
    let text = res.text().await?;

    if status.as_u16() != 200 {
        return Err(SoapError::HttpStatus(status.as_u16(), text));
    }
    Ok(text)
}

/// Returns true if the body carries a SOAP Fault element, whatever its prefix.
fn is_soap_fault(xml: &str) -> bool {
    xml.contains(":Fault>") || xml.contains("<Fault>")
}

/// Extracts the most specific fault message available.
///
/// UPnP errors carry `errorCode`/`errorDescription` in the fault detail,
/// which is more useful than the generic "UPnPError" faultstring.
fn extract_fault_string(xml: &str) -> Option<String> {
    let code = extract_xml_text(xml, "errorCode");
    let description = extract_xml_text(xml, "errorDescription");
    match (code, description) {
        (Some(code), Some(desc)) => Some(format!("{} ({})", desc, code)),
        (Some(code), None) => Some(format!("UPnP error {}", code)),
        _ => extract_xml_text(xml, "faultstring"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SOAP Request Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for constructing and sending SOAP requests to a renderer.
///
/// # Example
/// ```ignore
/// let response = SoapRequestBuilder::new(&client, "http://10.0.0.5:9197/dmr/upnp/control/AVTransport1")
///     .service(UpnpService::AVTransport)
///     .action("Play")
///     .instance_id()
///     .arg("Speed", "1")
///     .send()
///     .await?;
/// ```
pub struct SoapRequestBuilder<'a> {
    client: &'a Client,
    control_url: &'a str,
    service: Option<UpnpService>,
    action: Option<&'a str>,
    args: Vec<(&'a str, String)>,
    timeout: Duration,
}

impl<'a> SoapRequestBuilder<'a> {
    /// Creates a new SOAP request builder with the default command timeout.
    #[must_use]
    pub fn new(client: &'a Client, control_url: &'a str) -> Self {
        Self {
            client,
            control_url,
            service: None,
            action: None,
            args: Vec::new(),
            timeout: Duration::from_secs(crate::protocol_constants::SOAP_TIMEOUT_SECS),
        }
    }

    /// Sets the UPnP service for this request.
    #[must_use]
    pub fn service(mut self, service: UpnpService) -> Self {
        self.service = Some(service);
        self
    }

    /// Sets the SOAP action name.
    #[must_use]
    pub fn action(mut self, action: &'a str) -> Self {
        self.action = Some(action);
        self
    }

    /// Adds an argument to the SOAP request.
    ///
    /// Arguments are included in the SOAP body in the order they are added.
    #[must_use]
    pub fn arg(mut self, key: &'a str, value: impl Into<String>) -> Self {
        self.args.push((key, value.into()));
        self
    }

    /// Adds the standard InstanceID="0" argument used by AVTransport actions.
    #[must_use]
    pub fn instance_id(self) -> Self {
        self.arg("InstanceID", "0")
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn parts(&self) -> SoapResult<(UpnpService, &'a str, Vec<(&str, &str)>)> {
        let service = self
            .service
            .ok_or_else(|| SoapError::Fault("SoapRequestBuilder: service not set".into()))?;
        let action = self
            .action
            .ok_or_else(|| SoapError::Fault("SoapRequestBuilder: action not set".into()))?;
        let args = self.args.iter().map(|(k, v)| (*k, v.as_str())).collect();
        Ok((service, action, args))
    }

    /// Sends the SOAP request and returns the response body.
    ///
    /// # Errors
    /// Returns `SoapError` if the service or action is not set, or if the
    /// request fails.
    pub async fn send(self) -> SoapResult<String> {
        let (service, action, args) = self.parts()?;
        send_soap_request(self.client, self.control_url, service, action, &args, self.timeout).await
    }

    /// Sends the SOAP request and returns only the HTTP status code.
    pub async fn send_for_status(self) -> SoapResult<u16> {
        let (service, action, args) = self.parts()?;
        let (status, _) =
            post_soap(self.client, self.control_url, service, action, &args, self.timeout).await?;
        Ok(status)
    }

    /// Returns the request parts without sending (for testing).
    #[cfg(test)]
    pub fn into_parts(self) -> Option<(UpnpService, &'a str, Vec<(&'a str, String)>, Duration)> {
        let service = self.service?;
        let action = self.action?;
        Some((service, action, self.args, self.timeout))
    }
}
