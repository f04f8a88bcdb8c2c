//! UPnP/DLNA renderer discovery, enrichment and control.
//!
//! # Module Structure
//!
//! - `types` - Domain types (targets, detected TVs, identity, capabilities)
//! - `services` - UPnP service definitions (URNs, SOAPAction values)
//! - `vendor` - Manufacturer → vendor classification
//! - `traits` - Trait abstractions for testability
//! - `client` - `UpnpClient` concrete trait implementation
//! - `discovery` - SSDP listen/search and descriptor fetch
//! - `capabilities` - SCPD actions, live validation, protocol info
//! - `identity` - Descriptor path probing for friendly names
//! - `probe` - Direct AVTransport port/path probing
//! - `didl` - Per-vendor DIDL-Lite metadata
//! - `playback` - Stop / SetAVTransportURI / Play sequence
//! - `soap` - Low-level SOAP/HTTP transport
//! - `utils` - Shared XML, URL and string helpers

pub mod capabilities;
pub mod client;
pub(crate) mod didl;
pub mod discovery;
pub mod identity;
pub mod playback;
pub mod probe;
pub mod services;
pub mod soap;
pub mod traits;
pub mod types;
pub mod utils;
pub mod vendor;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use client::UpnpClient;
pub use services::UpnpService;
pub use traits::{AvTransportControl, RendererDiscovery};
pub use types::{Capabilities, DetectedTv, Identity, Target};
pub use vendor::Vendor;
