//! SSDP passive listening, active search, and TV classification.
//!
//! # Modes
//!
//! - **Passive**: join 239.255.255.250:1900 on the interface that owns the
//!   local IP and collect NOTIFY (`ssdp:alive` / `ssdp:byebye`) messages.
//! - **Active**: send one M-SEARCH per search target in priority order,
//!   pausing between queries, then keep collecting replies for the window.
//!
//! Both modes are bounded by wall-clock time, never by packet count.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use local_ip_address::list_afinet_netifas;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::time::{timeout, Instant};

use super::types::{is_skipped_interface, DiscoveryError, DiscoveryResult, SsdpEntry, SsdpSource};
use crate::protocol_constants::{
    SSDP_MULTICAST_ADDR, SSDP_MULTICAST_IP, SSDP_MX, SSDP_PORT, SSDP_RECV_BUFFER,
    SSDP_SEARCH_SETTLE_MS,
};
use crate::upnp::utils::{
    contains_any_ignore_ascii_case, contains_ignore_ascii_case, starts_with_ignore_ascii_case,
};

/// M-SEARCH targets, most specific first. Renderers that only answer one of
/// these still show up; `ssdp:all` is the broad fallback.
pub const SEARCH_TARGETS: &[&str] = &[
    "urn:schemas-upnp-org:device:MediaRenderer:1",
    "urn:schemas-upnp-org:device:MediaRenderer:2",
    "urn:schemas-upnp-org:service:AVTransport:1",
    "urn:schemas-upnp-org:service:RenderingControl:1",
    "urn:schemas-upnp-org:service:ConnectionManager:1",
    "urn:dial-multiscreen-org:service:dial:1",
    "urn:schemas-upnp-org:device:MediaServer:1",
    "ssdp:all",
];

// ─────────────────────────────────────────────────────────────────────────────
// Message Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Builds an M-SEARCH message for one search target.
fn build_msearch_message(search_target: &str, mx: u64) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: {}\r\n\
         ST: {}\r\n\r\n",
        SSDP_MULTICAST_ADDR, mx, search_target
    )
}

/// Parses the headers of an SSDP message.
///
/// Header names are matched case-insensitively and split at the first colon,
/// so URLs in values keep their own colons.
pub fn parse_ssdp_message(message: &str) -> SsdpEntry {
    let mut entry = SsdpEntry::default();
    for line in message.lines().skip(1) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        match name.trim().to_ascii_uppercase().as_str() {
            "LOCATION" => entry.location = value,
            "SERVER" => entry.server = value,
            "USN" => entry.usn = value,
            "ST" | "NT" => entry.target = value,
            "NTS" => entry.nts = value,
            _ => {}
        }
    }
    entry
}

/// Returns true for a NOTIFY carrying `ssdp:alive` or `ssdp:byebye`.
fn is_presence_notify(message: &str, entry: &SsdpEntry) -> bool {
    starts_with_ignore_ascii_case(message.trim_start(), "NOTIFY")
        && (contains_ignore_ascii_case(&entry.nts, "ssdp:alive")
            || contains_ignore_ascii_case(&entry.nts, "ssdp:byebye"))
}

/// Decides whether an SSDP entry is worth a descriptor fetch.
///
/// Rejections are checked before acceptances, so a gateway that also
/// advertises a media renderer is still rejected.
pub fn looks_like_tv(entry: &SsdpEntry) -> bool {
    let usn = entry.usn.as_str();
    let server = entry.server.as_str();
    let location = entry.location.as_str();

    // Routers and other network infrastructure
    if contains_any_ignore_ascii_case(usn, &["internetgatewaydevice", "wan", "igd"])
        || contains_any_ignore_ascii_case(location, &["igd", "wps"])
    {
        return false;
    }

    if contains_any_ignore_ascii_case(usn, &["mediarenderer", "avtransport", "renderingcontrol"]) {
        return true;
    }

    if contains_any_ignore_ascii_case(server, &["samsung", "lg", "sony", "philips", "panasonic"]) {
        return true;
    }

    // DIAL / Android TV style
    if contains_any_ignore_ascii_case(usn, &["mdx", "dial"]) {
        return true;
    }

    contains_ignore_ascii_case(usn, "upnp:rootdevice")
        && contains_any_ignore_ascii_case(server, &["tv", "dlna", "mediarenderer"])
}

// ─────────────────────────────────────────────────────────────────────────────
// Sockets
// ─────────────────────────────────────────────────────────────────────────────

/// Finds the IPv4 address of the usable interface that owns `local_ip`.
///
/// The interface must be non-loopback and not virtual. Whether it is up and
/// multicast capable shows when the multicast join is attempted.
pub fn resolve_interface(local_ip: &str) -> DiscoveryResult<Ipv4Addr> {
    let ip: Ipv4Addr = local_ip
        .trim()
        .parse()
        .map_err(|_| DiscoveryError::InvalidLocalIp(local_ip.to_string()))?;

    if ip.is_loopback() || ip.is_unspecified() {
        return Err(DiscoveryError::InterfaceNotFound(local_ip.to_string()));
    }

    let interfaces = list_afinet_netifas().unwrap_or_else(|e| {
        log::warn!("[SSDP] Failed to list network interfaces: {}", e);
        Vec::new()
    });

    interfaces
        .into_iter()
        .find(|(name, addr)| !is_skipped_interface(name) && *addr == IpAddr::V4(ip))
        .map(|(name, _)| {
            log::debug!("[SSDP] Using interface {} ({})", name, ip);
            ip
        })
        .ok_or_else(|| DiscoveryError::InterfaceNotFound(local_ip.to_string()))
}

/// Creates a UDP socket with the options SSDP needs.
///
/// - SO_REUSEADDR (and SO_REUSEPORT on Unix) so other SSDP stacks on the
///   host can share port 1900
/// - Multicast TTL of 4 per UPnP 1.0
fn create_socket(bind_addr: SocketAddr) -> DiscoveryResult<Socket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(DiscoveryError::SocketBind)?;

    if let Err(e) = socket.set_reuse_address(true) {
        log::warn!("[SSDP] Failed to set SO_REUSEADDR on {}: {}", bind_addr, e);
    }

    #[cfg(unix)]
    if let Err(e) = socket.set_reuse_port(true) {
        log::warn!("[SSDP] Failed to set SO_REUSEPORT on {}: {}", bind_addr, e);
    }

    if let Err(e) = socket.set_multicast_ttl_v4(4) {
        log::warn!("[SSDP] Failed to set multicast TTL on {}: {}", bind_addr, e);
    }

    socket
        .set_nonblocking(true)
        .map_err(DiscoveryError::SocketBind)?;
    socket
        .bind(&bind_addr.into())
        .map_err(DiscoveryError::SocketBind)?;

    Ok(socket)
}

fn into_tokio(socket: Socket) -> DiscoveryResult<UdpSocket> {
    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket).map_err(DiscoveryError::SocketBind)
}

/// Socket bound to the SSDP port and joined to the multicast group on `iface_ip`.
fn create_listen_socket(iface_ip: Ipv4Addr) -> DiscoveryResult<UdpSocket> {
    let socket = create_socket(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), SSDP_PORT))?;
    let group = Ipv4Addr::from(SSDP_MULTICAST_IP);
    socket
        .join_multicast_v4(&group, &iface_ip)
        .map_err(|source| DiscoveryError::JoinMulticast {
            ip: iface_ip.to_string(),
            source,
        })?;
    into_tokio(socket)
}

// ─────────────────────────────────────────────────────────────────────────────
// Receive Loop
// ─────────────────────────────────────────────────────────────────────────────

/// Receives SSDP messages until `deadline`, passing each parsed entry to `sink`.
async fn collect_until<F>(socket: &UdpSocket, deadline: Instant, source: SsdpSource, mut sink: F)
where
    F: FnMut(&str, SsdpEntry),
{
    let mut buf = vec![0u8; SSDP_RECV_BUFFER];
    while Instant::now() < deadline {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match timeout(remaining, socket.recv_from(&mut buf)).await {
            Ok(Ok((amt, src))) => {
                let message = String::from_utf8_lossy(&buf[..amt]);
                let entry = parse_ssdp_message(&message);
                log::trace!(
                    "[{}] From {}: LOCATION={} SERVER={} USN={}",
                    source,
                    src,
                    entry.location,
                    entry.server,
                    entry.usn
                );
                sink(&message, entry);
            }
            Ok(Err(e)) => {
                log::warn!("[{}] Socket recv error: {}", source, e);
            }
            Err(_) => break, // Deadline
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Listens for NOTIFY announcements for `window` on the interface owning `local_ip`.
///
/// Entries are deduplicated by USN and NTS, in arrival order.
pub async fn listen_notify(local_ip: &str, window: Duration) -> DiscoveryResult<Vec<SsdpEntry>> {
    let iface_ip = resolve_interface(local_ip)?;
    let socket = create_listen_socket(iface_ip)?;

    log::info!(
        "[{}] Listening on {} for {:?}",
        SsdpSource::Notify,
        iface_ip,
        window
    );

    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    collect_until(&socket, Instant::now() + window, SsdpSource::Notify, |message, entry| {
        if !is_presence_notify(message, &entry) {
            return;
        }
        if entry.location.is_empty() && entry.usn.is_empty() {
            return;
        }
        if seen.insert((entry.usn.clone(), entry.nts.clone())) {
            log::debug!("[{}] Device: {} ({})", SsdpSource::Notify, entry.location, entry.nts);
            entries.push(entry);
        }
    })
    .await;

    log::info!(
        "[{}] Finished: {} announcement(s)",
        SsdpSource::Notify,
        entries.len()
    );
    Ok(entries)
}

/// Sends every search target and collects replies, deduplicated by LOCATION.
///
/// Each query is followed by a settle pause (renderers ignore bursts) during
/// which replies are already collected. After the last query, replies are
/// collected for `window`.
pub async fn search(window: Duration) -> DiscoveryResult<Vec<SsdpEntry>> {
    let socket = into_tokio(create_socket(SocketAddr::new(
        IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        0,
    ))?)?;
    let target: SocketAddr = (Ipv4Addr::from(SSDP_MULTICAST_IP), SSDP_PORT).into();

    log::info!(
        "[{}] Sending {} queries, then collecting for {:?}",
        SsdpSource::Search,
        SEARCH_TARGETS.len(),
        window
    );

    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    let mut accept = |_: &str, entry: SsdpEntry| {
        if entry.location.is_empty() && entry.usn.is_empty() {
            return;
        }
        if seen.insert(entry.location.clone()) {
            log::debug!("[{}] Response: {}", SsdpSource::Search, entry.location);
            entries.push(entry);
        }
    };

    let mut sent = 0usize;
    for st in SEARCH_TARGETS {
        log::debug!("[{}] ST: {}", SsdpSource::Search, st);
        let msg = build_msearch_message(st, SSDP_MX);
        match socket.send_to(msg.as_bytes(), target).await {
            Ok(_) => sent += 1,
            Err(e) => log::warn!("[{}] Failed to send ST {}: {}", SsdpSource::Search, st, e),
        }
        let settle = Instant::now() + Duration::from_millis(SSDP_SEARCH_SETTLE_MS);
        collect_until(&socket, settle, SsdpSource::Search, &mut accept).await;
    }

    if sent == 0 {
        return Err(DiscoveryError::SendSearch(std::io::Error::new(
            std::io::ErrorKind::Other,
            "no M-SEARCH could be sent",
        )));
    }

    collect_until(&socket, Instant::now() + window, SsdpSource::Search, &mut accept).await;

    log::info!(
        "[{}] Finished: {} unique device(s)",
        SsdpSource::Search,
        entries.len()
    );
    Ok(entries)
}
