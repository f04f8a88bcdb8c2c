//! Local network context: which address renderers reach us on.
//!
//! The local IP picks the interface for passive SSDP listening and forms the
//! media URL handed to the TV. It comes from configuration, or is detected.

/// Trait for detecting the local IP address.
///
/// Different environments may need different detection strategies.
/// This trait allows injecting the appropriate detector.
pub trait IpDetector: Send + Sync {
    /// Detects the local IP address.
    fn detect(&self) -> Result<String, NetworkError>;
}

/// Default IP detector using the system's network interfaces.
#[derive(Debug, Clone, Default)]
pub struct LocalIpDetector;

impl LocalIpDetector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl IpDetector for LocalIpDetector {
    fn detect(&self) -> Result<String, NetworkError> {
        local_ip_address::local_ip()
            .map(|ip| ip.to_string())
            .map_err(|e| NetworkError::Detection(e.to_string()))
    }
}

/// Errors that can occur while determining the local address.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// Could not detect local IP address.
    #[error("Failed to detect local IP: {0}")]
    Detection(String),
}

/// Returns `configured` when set, otherwise asks `detector`.
pub fn resolve_local_ip(
    configured: &str,
    detector: &dyn IpDetector,
) -> Result<String, NetworkError> {
    let configured = configured.trim();
    if !configured.is_empty() {
        return Ok(configured.to_string());
    }
    let ip = detector.detect()?;
    log::info!("[Network] Detected local IP {}", ip);
    Ok(ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDetector(Option<&'static str>);

    impl IpDetector for FixedDetector {
        fn detect(&self) -> Result<String, NetworkError> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| NetworkError::Detection("no route".into()))
        }
    }

    #[test]
    fn configured_ip_wins() {
        let ip = resolve_local_ip(" 192.168.1.10 ", &FixedDetector(Some("10.0.0.2"))).unwrap();
        assert_eq!(ip, "192.168.1.10");
    }

    #[test]
    fn falls_back_to_detection() {
        assert_eq!(
            resolve_local_ip("", &FixedDetector(Some("10.0.0.2"))).unwrap(),
            "10.0.0.2"
        );
        assert!(resolve_local_ip("", &FixedDetector(None)).is_err());
    }
}
