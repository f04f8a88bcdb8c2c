//! UPnP device descriptor fetching and parsing.

use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use reqwest::Client;
use url::Url;

use super::types::{DiscoveryError, DiscoveryResult};
use crate::upnp::services::UpnpService;
use crate::upnp::soap::http_get_text;
use crate::upnp::types::{DetectedTv, Identity};
use crate::upnp::utils::absolutize_url;
use crate::upnp::vendor::Vendor;

/// One `<service>` entry from a descriptor's service list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceEntry {
    pub service_type: String,
    pub control_url: String,
    pub scpd_url: String,
}

/// The parts of a device descriptor we use.
///
/// Identity fields come from the root `<device>`; services are collected
/// from the root device and any embedded devices, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDescription {
    pub identity: Identity,
    pub services: Vec<ServiceEntry>,
}

impl DeviceDescription {
    /// Service whose `serviceType` contains the service's marker.
    ///
    /// When a descriptor lists the same service more than once, the last
    /// entry in document order wins.
    pub fn find_service(&self, service: UpnpService) -> Option<&ServiceEntry> {
        let marker = service.service_type_marker();
        self.services
            .iter()
            .rev()
            .find(|s| s.service_type.contains(marker))
    }
}

fn read_field(reader: &mut Reader<&[u8]>, e: &quick_xml::events::BytesStart<'_>) -> String {
    reader
        .read_text(e.name())
        .map(|t| html_escape::decode_html_entities(&t).trim().to_string())
        .unwrap_or_default()
}

/// Parses a device descriptor.
///
/// Returns None if the document has no `<device>` element (HTML error
/// pages, SCPDs, empty bodies).
pub fn parse_device_description(xml: &str) -> Option<DeviceDescription> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut desc = DeviceDescription::default();
    let mut device_depth = 0usize;
    let mut saw_device = false;
    let mut current_service: Option<ServiceEntry> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local_name = e.local_name();
                match local_name.as_ref() {
                    b"device" => {
                        device_depth += 1;
                        saw_device = true;
                    }
                    b"service" => current_service = Some(ServiceEntry::default()),
                    b"serviceType" | b"controlURL" | b"SCPDURL" if current_service.is_some() => {
                        let value = read_field(&mut reader, e);
                        if let Some(service) = current_service.as_mut() {
                            match local_name.as_ref() {
                                b"serviceType" => service.service_type = value,
                                b"controlURL" => service.control_url = value,
                                _ => service.scpd_url = value,
                            }
                        }
                    }
                    name if device_depth == 1 && current_service.is_none() => {
                        let identity = &mut desc.identity;
                        let slot = match name {
                            b"friendlyName" => Some(&mut identity.friendly_name),
                            b"manufacturer" => Some(&mut identity.manufacturer),
                            b"modelName" => Some(&mut identity.model_name),
                            b"modelNumber" => Some(&mut identity.model_number),
                            b"UDN" => Some(&mut identity.udn),
                            b"presentationURL" => Some(&mut identity.presentation_url),
                            _ => None,
                        };
                        if let Some(slot) = slot {
                            *slot = read_field(&mut reader, e);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"device" => device_depth = device_depth.saturating_sub(1),
                b"service" => {
                    if let Some(service) = current_service.take() {
                        desc.services.push(service);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::trace!("[Descriptor] Error parsing device description: {:?}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    saw_device.then_some(desc)
}

/// Builds a [`DetectedTv`] from a parsed descriptor and the LOCATION it came from.
pub fn detect_tv(location: &str, desc: &DeviceDescription) -> DiscoveryResult<DetectedTv> {
    let url = Url::parse(location)
        .ok()
        .filter(|url| url.has_host())
        .ok_or_else(|| DiscoveryError::MalformedDescriptor {
            location: location.to_string(),
            reason: "LOCATION is not an absolute URL".into(),
        })?;
    let origin = url.origin().ascii_serialization();
    let host = url
        .host_str()
        .unwrap_or_default()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string();

    let av = desc.find_service(UpnpService::AVTransport);
    let cm = desc.find_service(UpnpService::ConnectionManager);
    let resolve =
        |path: Option<&str>| path.map_or_else(String::new, |p| absolutize_url(&origin, p));

    let tv = DetectedTv {
        ip: host,
        port: url.port_or_known_default().unwrap_or(80),
        vendor: Vendor::from_manufacturer(&desc.identity.manufacturer),
        control_url: resolve(av.map(|s| s.control_url.as_str())),
        av_transport_scpd_url: resolve(av.map(|s| s.scpd_url.as_str())),
        conn_mgr_control_url: resolve(cm.map(|s| s.control_url.as_str())),
        udn: desc.identity.udn.clone(),
        location: location.to_string(),
    };

    log::info!("[Descriptor] {} vendor={} udn={}", location, tv.vendor, tv.udn);
    log::info!("[Descriptor]   AVTransport control : {}", tv.control_url);
    log::info!("[Descriptor]   AVTransport SCPD    : {}", tv.av_transport_scpd_url);
    log::info!("[Descriptor]   ConnMgr control     : {}", tv.conn_mgr_control_url);

    Ok(tv)
}

/// Fetches the descriptor at `location` and classifies the device.
pub async fn fetch_and_detect(
    client: &Client,
    location: &str,
    timeout: Duration,
) -> DiscoveryResult<DetectedTv> {
    let xml = http_get_text(client, location, timeout)
        .await
        .map_err(|source| DiscoveryError::DescriptorFetch {
            location: location.to_string(),
            source,
        })?;

    let desc = parse_device_description(&xml).ok_or_else(|| DiscoveryError::MalformedDescriptor {
        location: location.to_string(),
        reason: "no <device> element".into(),
    })?;

    detect_tv(location, &desc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upnp::test_fixtures::{spawn_fake_renderer, FakeRenderer, CONN_MGR_PATH, SCPD_PATH};

    const EMBEDDED: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <device>
    <deviceType>urn:schemas-upnp-org:device:MediaRenderer:1</deviceType>
    <friendlyName>Sony Bravia &amp; Co</friendlyName>
    <manufacturer>Sony Corporation</manufacturer>
    <modelName>KD-55X85J</modelName>
    <UDN>uuid:root-udn</UDN>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:ConnectionManager:1</serviceType>
        <controlURL>/sony/upnp/control/ConnectionManager</controlURL>
        <SCPDURL>/sony/cm.xml</SCPDURL>
      </service>
    </serviceList>
    <deviceList>
      <device>
        <friendlyName>Embedded</friendlyName>
        <UDN>uuid:embedded-udn</UDN>
        <serviceList>
          <service>
            <serviceType>urn:schemas-upnp-org:service:AVTransport:1</serviceType>
            <controlURL>http://10.0.0.9:52323/upnp/control/AVTransport</controlURL>
            <SCPDURL>sony/avt.xml</SCPDURL>
          </service>
        </serviceList>
      </device>
    </deviceList>
  </device>
</root>"#;

    #[test]
    fn parses_root_identity_and_all_services() {
        let desc = parse_device_description(EMBEDDED).expect("descriptor");
        assert_eq!(desc.identity.friendly_name, "Sony Bravia & Co");
        assert_eq!(desc.identity.manufacturer, "Sony Corporation");
        assert_eq!(desc.identity.udn, "uuid:root-udn");
        assert_eq!(desc.services.len(), 2);
        assert!(desc.find_service(UpnpService::AVTransport).is_some());
        assert!(desc.find_service(UpnpService::RenderingControl).is_none());
    }

    #[test]
    fn detect_tv_absolutizes_and_defaults_port() {
        let desc = parse_device_description(EMBEDDED).unwrap();
        let tv = detect_tv("http://10.0.0.9/sony/desc.xml", &desc).unwrap();
        assert_eq!(tv.ip, "10.0.0.9");
        assert_eq!(tv.port, 80);
        assert_eq!(tv.vendor, Vendor::Sony);
        assert_eq!(tv.control_url, "http://10.0.0.9:52323/upnp/control/AVTransport");
        assert_eq!(tv.av_transport_scpd_url, "http://10.0.0.9/sony/avt.xml");
        assert_eq!(
            tv.conn_mgr_control_url,
            "http://10.0.0.9/sony/upnp/control/ConnectionManager"
        );
    }

    #[test]
    fn missing_service_leaves_url_empty() {
        let xml = "<root><device><manufacturer>Acme</manufacturer></device></root>";
        let desc = parse_device_description(xml).unwrap();
        let tv = detect_tv("http://10.0.0.3:8080/d.xml", &desc).unwrap();
        assert_eq!(tv.vendor, Vendor::Generic);
        assert_eq!(tv.port, 8080);
        assert!(tv.control_url.is_empty());
        assert!(tv.conn_mgr_control_url.is_empty());
    }

    #[test]
    fn detect_tv_accepts_empty_port() {
        let desc = parse_device_description(EMBEDDED).unwrap();
        let tv = detect_tv("http://192.168.1.20:/dmr.xml", &desc).unwrap();
        assert_eq!(tv.ip, "192.168.1.20");
        assert_eq!(tv.port, 80);
        assert_eq!(tv.av_transport_scpd_url, "http://192.168.1.20/sony/avt.xml");
    }

    #[test]
    fn detect_tv_handles_ipv6_and_rejects_relative() {
        let desc = parse_device_description(EMBEDDED).unwrap();
        let tv = detect_tv("http://[fe80::1]:7676/desc.xml", &desc).unwrap();
        assert_eq!(tv.ip, "fe80::1");
        assert_eq!(tv.port, 7676);
        assert_eq!(tv.av_transport_scpd_url, "http://[fe80::1]:7676/sony/avt.xml");

        assert!(matches!(
            detect_tv("/desc.xml", &desc),
            Err(DiscoveryError::MalformedDescriptor { .. })
        ));
    }

    #[test]
    fn duplicate_service_last_entry_wins() {
        let xml = r#"<root><device><serviceList>
            <service>
              <serviceType>urn:schemas-upnp-org:service:AVTransport:1</serviceType>
              <controlURL>/first</controlURL>
            </service>
            <service>
              <serviceType>urn:schemas-upnp-org:service:AVTransport:1</serviceType>
              <controlURL>/second</controlURL>
            </service>
        </serviceList></device></root>"#;
        let desc = parse_device_description(xml).unwrap();
        let tv = detect_tv("http://10.0.0.4:9197/d.xml", &desc).unwrap();
        assert_eq!(tv.control_url, "http://10.0.0.4:9197/second");
    }

    #[test]
    fn non_descriptor_documents_are_rejected() {
        assert!(parse_device_description("<html><body>404</body></html>").is_none());
        assert!(parse_device_description("").is_none());
    }

    #[tokio::test]
    async fn fetch_and_detect_against_fake_renderer() {
        let renderer = spawn_fake_renderer(FakeRenderer::default()).await;
        let client = Client::new();

        let tv = fetch_and_detect(&client, &renderer.description_url(), Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(tv.vendor, Vendor::Samsung);
        assert_eq!(tv.ip, "127.0.0.1");
        assert_eq!(tv.port, renderer.port());
        assert_eq!(tv.control_url, renderer.av_transport_url());
        assert_eq!(tv.av_transport_scpd_url, format!("{}{}", renderer.base_url(), SCPD_PATH));
        assert_eq!(tv.conn_mgr_control_url, format!("{}{}", renderer.base_url(), CONN_MGR_PATH));
        assert_eq!(tv.udn, "uuid:0a1b2c3d-0000-1000-8000-00aabbccddee");
    }

    #[tokio::test]
    async fn fetch_and_detect_reports_http_failure() {
        let renderer = spawn_fake_renderer(FakeRenderer::default()).await;
        let client = Client::new();

        let err = fetch_and_detect(
            &client,
            &format!("{}/nope.xml", renderer.base_url()),
            Duration::from_secs(2),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DiscoveryError::DescriptorFetch { .. }));
    }
}
