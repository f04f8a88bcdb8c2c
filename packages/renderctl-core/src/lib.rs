//! renderctl core - UPnP/DLNA renderer discovery, resolution and caching.
//!
//! This crate finds smart TVs on the local network, works out how to drive
//! their AVTransport service, remembers what worked, and sends the playback
//! command sequence. The `renderctl` binary is a thin front-end over it.
//!
//! # Architecture
//!
//! - [`upnp`]: SSDP discovery, descriptors, capability and identity
//!   enrichment, direct probing, SOAP transport and playback
//! - [`cache`]: Persistent endpoint cache (one JSON file)
//! - [`resolve`]: The `TrySSDP → TryCache → TryProbe` orchestrator
//! - [`config`]: The configuration record and its field table
//! - [`confirm`]: Yes/no confirmation capability
//! - [`context`]: Local IP detection
//! - [`self_identity`]: This host's persistent UUID
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! - [`RendererDiscovery`](upnp::RendererDiscovery): Finding renderers
//! - [`AvTransportControl`](upnp::AvTransportControl): Playback commands
//! - [`Confirm`](confirm::Confirm): Asking the user
//! - [`IpDetector`](context::IpDetector): Local IP detection
//!
//! [`UpnpClient`] implements the first two over the network.

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod config;
pub mod confirm;
pub mod context;
pub mod error;
pub mod protocol_constants;
pub mod resolve;
pub mod self_identity;
pub mod upnp;

// Re-export commonly used types at the crate root
pub use cache::{
    default_cache_path, forget, CacheError, CacheRow, CacheStore, CachedDevice, Endpoint,
    ForgetOutcome, ForgetTarget,
};
pub use config::{Config, ConfigField, Mode, FIELDS};
pub use confirm::{Confirm, PresetConfirm, StdinConfirm};
pub use context::{resolve_local_ip, IpDetector, LocalIpDetector, NetworkError};
pub use error::{ErrorCode, RenderError, RenderResult};
pub use resolve::{EnrichedDevice, ResolveError, ResolvedPlan, Resolver, Stage};
pub use self_identity::{default_self_uuid_path, load_or_create_self_uuid};

// Re-export UPnP types
pub use upnp::discovery::{DiscoveryError, DiscoveryResult};
pub use upnp::soap::{SoapError, SoapResult};
pub use upnp::{
    AvTransportControl, Capabilities, DetectedTv, Identity, RendererDiscovery, Target,
    UpnpClient, Vendor,
};
