//! Fixed protocol constants that should NOT be changed.
//!
//! These values are defined by external specifications (UPnP, SSDP, SOAP) or
//! encode renderer quirks observed in the field. Changing them changes which
//! devices can be found and driven.

// ─────────────────────────────────────────────────────────────────────────────
// SSDP
// ─────────────────────────────────────────────────────────────────────────────

/// Standard SSDP multicast group address and port (protocol specification).
pub const SSDP_MULTICAST_ADDR: &str = "239.255.255.250:1900";

/// SSDP multicast group IPv4 address.
pub const SSDP_MULTICAST_IP: [u8; 4] = [239, 255, 255, 250];

/// SSDP port.
pub const SSDP_PORT: u16 = 1900;

/// MX value sent with every M-SEARCH (max response delay in seconds).
pub const SSDP_MX: u64 = 3;

/// Pause after each M-SEARCH before the next query is sent (milliseconds).
///
/// Samsung renderers ignore queries that arrive in a rapid burst.
pub const SSDP_SEARCH_SETTLE_MS: u64 = 500;

/// Window for the active-search fallback that runs when passive listening
/// yields no usable renderer (seconds).
pub const SSDP_ACTIVE_SEARCH_SECS: u64 = 3;

/// Receive buffer size for SSDP datagrams.
pub const SSDP_RECV_BUFFER: usize = 8192;

// ─────────────────────────────────────────────────────────────────────────────
// HTTP/SOAP
// ─────────────────────────────────────────────────────────────────────────────

/// Timeout for probe SOAP calls (seconds).
pub const SOAP_PROBE_TIMEOUT_SECS: u64 = 2;

/// Timeout for playback and enrichment SOAP calls and descriptor GETs (seconds).
pub const SOAP_TIMEOUT_SECS: u64 = 5;

/// Delay between Stop and SetAVTransportURI (milliseconds).
///
/// Some renderers drop a SetAVTransportURI that arrives while the Stop
/// transition is still in progress.
pub const PLAYBACK_SETTLE_MS: u64 = 150;

/// Overall budget for the direct AVTransport probe (seconds).
pub const PROBE_BUDGET_SECS: u64 = 8;

/// Overall budget for identity descriptor probing per device (seconds).
pub const IDENTITY_BUDGET_SECS: u64 = 3;

// ─────────────────────────────────────────────────────────────────────────────
// Application Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Application name, used for the cache/state directory and DIDL-Lite titles.
pub const APP_NAME: &str = "renderctl";

/// State directory under the user's home directory.
pub const STATE_DIR_NAME: &str = ".renderctl";

/// Cache file name inside the state directory.
pub const CACHE_FILE_NAME: &str = "devices.json";

/// Self identity file name inside the state directory.
pub const SELF_UUID_FILE_NAME: &str = "server_uuid";
