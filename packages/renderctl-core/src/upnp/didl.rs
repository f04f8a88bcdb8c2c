//! Per-vendor `CurrentURIMetaData` for SetAVTransportURI.
//!
//! Samsung and unknown renderers play best with no metadata at all. LG
//! refuses to start video without a DIDL-Lite item, and Sony/Philips want
//! DLNA flags or a profile in `protocolInfo`. The strings returned here are
//! raw XML; the SOAP layer escapes them when they are embedded.

use super::utils::escape_xml;
use super::vendor::Vendor;
use crate::protocol_constants::APP_NAME;

type MetadataBuilder = fn(&str) -> String;

/// Vendor → metadata builder. Vendors without an entry send no metadata.
const METADATA_BUILDERS: &[(Vendor, MetadataBuilder)] = &[
    (Vendor::Lg, lg_metadata),
    (Vendor::Sony, sony_metadata),
    (Vendor::Philips, philips_metadata),
];

/// Returns the `CurrentURIMetaData` value for `vendor`, or an empty string.
pub(crate) fn metadata_for_vendor(vendor: Vendor, media_url: &str) -> String {
    METADATA_BUILDERS
        .iter()
        .find(|(v, _)| *v == vendor)
        .map(|(_, build)| build(media_url))
        .unwrap_or_default()
}

fn didl_item(media_url: &str, protocol_info: &str) -> String {
    let mut didl = String::from(
        r#"<?xml version="1.0" encoding="utf-8"?><DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/">"#,
    );
    didl.push_str(r#"<item id="0" parentID="0" restricted="1">"#);
    didl.push_str(&format!("<dc:title>{}</dc:title>", escape_xml(APP_NAME)));
    didl.push_str("<upnp:class>object.item.videoItem.movie</upnp:class>");
    didl.push_str(&format!(
        r#"<res protocolInfo="{}">{}</res>"#,
        protocol_info,
        escape_xml(media_url)
    ));
    didl.push_str("</item></DIDL-Lite>");
    didl
}

fn lg_metadata(media_url: &str) -> String {
    didl_item(media_url, "http-get:*:video/mp4:*")
}

fn sony_metadata(media_url: &str) -> String {
    didl_item(
        media_url,
        "http-get:*:video/mp4:DLNA.ORG_OP=01;DLNA.ORG_CI=0;DLNA.ORG_FLAGS=01700000000000000000000000000000",
    )
}

fn philips_metadata(media_url: &str) -> String {
    didl_item(media_url, "http-get:*:video/mp4:DLNA.ORG_PN=AVC_MP4_BL_CIF15_AAC_520")
}
