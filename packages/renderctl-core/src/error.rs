//! Centralized error types for the renderctl core library.
//!
//! Each component defines its own `thiserror` enum. This module gives every
//! one of them a machine-readable code and folds them into [`RenderError`],
//! the taxonomy front-ends report against.

use thiserror::Error;

use crate::cache::CacheError;
use crate::resolve::ResolveError;
use crate::upnp::discovery::DiscoveryError;
use crate::upnp::identity::IdentityError;
use crate::upnp::playback::PlaybackError;
use crate::upnp::probe::ProbeError;
use crate::upnp::soap::SoapError;

/// Trait for error types that provide machine-readable error codes.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;
}

impl ErrorCode for SoapError {
    fn code(&self) -> &'static str {
        match self {
            e if e.is_timeout() => "network_timeout",
            Self::Http(_) => "http_request_failed",
            Self::HttpStatus(_, _) => "http_error_status",
            Self::Fault(_) => "soap_fault",
            Self::Parse => "soap_parse_error",
        }
    }
}

impl ErrorCode for DiscoveryError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidLocalIp(_) => "invalid_local_ip",
            Self::InterfaceNotFound(_) => "interface_not_found",
            Self::SocketBind(_) => "socket_bind_failed",
            Self::JoinMulticast { .. } => "multicast_join_failed",
            Self::SendSearch(_) => "ssdp_send_failed",
            Self::DescriptorFetch { .. } => "descriptor_fetch_failed",
            Self::MalformedDescriptor { .. } => "malformed_descriptor",
        }
    }
}

impl ErrorCode for CacheError {
    fn code(&self) -> &'static str {
        match self {
            Self::NoHomeDir => "no_home_dir",
            Self::Io { .. } => "cache_io_failed",
            Self::Corrupt { .. } => "cache_corrupt",
            Self::Serialize(_) => "cache_serialize_failed",
            Self::InvalidIndex(_) => "invalid_cache_index",
        }
    }
}

impl ErrorCode for ProbeError {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingIp => "probe_missing_ip",
            Self::NotFound(_) => "avtransport_not_found",
            Self::Timeout { .. } => "probe_timeout",
        }
    }
}

impl ErrorCode for IdentityError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "descriptor_not_found",
            Self::Timeout(_) => "identity_timeout",
        }
    }
}

impl ErrorCode for PlaybackError {
    fn code(&self) -> &'static str {
        match self {
            Self::SetUri(_) => "set_uri_failed",
            Self::Play(_) => "play_failed",
        }
    }
}

impl ErrorCode for ResolveError {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingMediaUrl => "missing_media_url",
            Self::MissingManualTarget => "missing_manual_target",
            Self::Cache(e) => e.code(),
            Self::Probe(e) => e.code(),
            Self::Playback(e) => e.code(),
        }
    }
}

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A bounded network operation ran out of time.
    #[error("Network timeout: {0}")]
    NetworkTimeout(String),

    /// No renderer or endpoint matched.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A device answered with something unusable.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The cache file could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The user declined a confirmation.
    #[error("Declined: {0}")]
    UserDeclined(String),

    /// SetAVTransportURI or Play failed.
    #[error("Playback command failed: {0}")]
    PlaybackCommand(String),

    /// Socket or interface setup for discovery failed.
    #[error("Discovery failed: {0}")]
    Discovery(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RenderError {
    /// Returns a machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NetworkTimeout(_) => "network_timeout",
            Self::NotFound(_) => "not_found",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Persistence(_) => "persistence_error",
            Self::UserDeclined(_) => "user_declined",
            Self::PlaybackCommand(_) => "playback_command_failed",
            Self::Discovery(_) => "discovery_failed",
            Self::Configuration(_) => "configuration_error",
        }
    }

    /// True for errors that end the run; a decline only skips a step.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::UserDeclined(_))
    }
}

/// Convenient Result alias for application-wide operations.
pub type RenderResult<T> = Result<T, RenderError>;

impl From<SoapError> for RenderError {
    fn from(err: SoapError) -> Self {
        match err {
            e if e.is_timeout() => Self::NetworkTimeout(e.to_string()),
            e @ (SoapError::Parse | SoapError::Fault(_)) => Self::MalformedResponse(e.to_string()),
            e => Self::NotFound(e.to_string()),
        }
    }
}

impl From<DiscoveryError> for RenderError {
    fn from(err: DiscoveryError) -> Self {
        match err {
            e @ DiscoveryError::MalformedDescriptor { .. } => {
                Self::MalformedResponse(e.to_string())
            }
            e @ DiscoveryError::DescriptorFetch { .. } => Self::NotFound(e.to_string()),
            e => Self::Discovery(e.to_string()),
        }
    }
}

impl From<CacheError> for RenderError {
    fn from(err: CacheError) -> Self {
        match err {
            e @ CacheError::InvalidIndex(_) => Self::NotFound(e.to_string()),
            e => Self::Persistence(e.to_string()),
        }
    }
}

impl From<ProbeError> for RenderError {
    fn from(err: ProbeError) -> Self {
        match err {
            e @ ProbeError::Timeout { .. } => Self::NetworkTimeout(e.to_string()),
            e @ ProbeError::NotFound(_) => Self::NotFound(e.to_string()),
            e @ ProbeError::MissingIp => Self::Configuration(e.to_string()),
        }
    }
}

impl From<IdentityError> for RenderError {
    fn from(err: IdentityError) -> Self {
        match err {
            e @ IdentityError::Timeout(_) => Self::NetworkTimeout(e.to_string()),
            e @ IdentityError::NotFound(_) => Self::NotFound(e.to_string()),
        }
    }
}

impl From<PlaybackError> for RenderError {
    fn from(err: PlaybackError) -> Self {
        Self::PlaybackCommand(err.to_string())
    }
}

impl From<ResolveError> for RenderError {
    fn from(err: ResolveError) -> Self {
        match err {
            e @ (ResolveError::MissingMediaUrl | ResolveError::MissingManualTarget) => {
                Self::Configuration(e.to_string())
            }
            ResolveError::Cache(e) => e.into(),
            ResolveError::Probe(e) => e.into(),
            ResolveError::Playback(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn probe_errors_map_to_taxonomy() {
        let timeout: RenderError = ProbeError::Timeout {
            ip: "10.0.0.5".into(),
            budget: Duration::from_secs(1),
        }
        .into();
        assert_eq!(timeout.code(), "network_timeout");

        let missing: RenderError = ProbeError::NotFound("10.0.0.5".into()).into();
        assert_eq!(missing.code(), "not_found");
    }

    #[test]
    fn cache_errors_are_persistence_except_bad_index() {
        let io: RenderError = CacheError::Io {
            path: "/tmp/x".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        assert_eq!(io.code(), "persistence_error");

        let index: RenderError = CacheError::InvalidIndex(4).into();
        assert_eq!(index.code(), "not_found");
    }

    #[test]
    fn resolve_error_codes_pass_through() {
        let err = ResolveError::Probe(ProbeError::MissingIp);
        assert_eq!(err.code(), "probe_missing_ip");
        let render: RenderError = err.into();
        assert_eq!(render.code(), "configuration_error");
    }

    #[test]
    fn soap_fault_is_malformed_response() {
        let err = SoapError::Fault("401 Invalid Action".into());
        assert_eq!(err.code(), "soap_fault");
        let render: RenderError = err.into();
        assert_eq!(render.code(), "malformed_response");
    }

    #[test]
    fn only_declines_are_non_fatal() {
        assert!(!RenderError::UserDeclined("cache".into()).is_fatal());
        assert!(RenderError::PlaybackCommand("x".into()).is_fatal());
    }
}
