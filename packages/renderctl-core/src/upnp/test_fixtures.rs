//! Shared test fixtures: an in-process fake media renderer.
//!
//! The fake serves a device descriptor, an AVTransport SCPD and SOAP control
//! endpoints over real HTTP on 127.0.0.1, and records every SOAP call so
//! tests can assert on ordering and headers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use parking_lot::Mutex;

/// Path of the AVTransport SCPD served by the fake.
pub const SCPD_PATH: &str = "/AVTransport/scpd.xml";

/// Path of the ConnectionManager control endpoint served by the fake.
pub const CONN_MGR_PATH: &str = "/upnp/control/ConnectionManager1";

/// Behaviour of a fake renderer.
#[derive(Debug, Clone)]
pub struct FakeRenderer {
    pub manufacturer: String,
    pub friendly_name: String,
    pub model_name: String,
    pub udn: String,
    /// Path the device descriptor is served at.
    pub description_path: String,
    /// AVTransport control path, as published in the descriptor.
    pub av_control_path: String,
    /// Action names listed in the SCPD.
    pub scpd_actions: Vec<String>,
    /// Serve the SCPD at all.
    pub serve_scpd: bool,
    /// Actions answered with HTTP 500 and a SOAP fault.
    pub fail_actions: Vec<String>,
    /// Value of `Sink` in GetProtocolInfo; None answers with a fault.
    pub protocol_info_sink: Option<String>,
    /// Delay before every response.
    pub response_delay: Option<Duration>,
}

impl Default for FakeRenderer {
    fn default() -> Self {
        Self {
            manufacturer: "Samsung Electronics".into(),
            friendly_name: "[TV] Living Room".into(),
            model_name: "UE55RU7400".into(),
            udn: "uuid:0a1b2c3d-0000-1000-8000-00aabbccddee".into(),
            description_path: "/dmr/description.xml".into(),
            av_control_path: "/upnp/control/AVTransport1".into(),
            scpd_actions: vec![
                "SetAVTransportURI".into(),
                "Play".into(),
                "Stop".into(),
                "GetTransportInfo".into(),
            ],
            serve_scpd: true,
            fail_actions: Vec::new(),
            protocol_info_sink: Some(
                "http-get:*:video/mp4:DLNA.ORG_PN=AVC_MP4,http-get:*:video/mp4:*,http-get:*:audio/mpeg:*"
                    .into(),
            ),
            response_delay: None,
        }
    }
}

/// A SOAP call received by the fake.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub action: String,
    pub soap_action: String,
    pub content_type: String,
    pub body: String,
}

struct Shared {
    config: FakeRenderer,
    calls: Mutex<Vec<RecordedCall>>,
}

/// Handle to a running fake renderer.
pub struct RendererHandle {
    addr: SocketAddr,
    shared: Arc<Shared>,
}

impl RendererHandle {
    pub fn ip(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn description_url(&self) -> String {
        format!("{}{}", self.base_url(), self.shared.config.description_path)
    }

    pub fn av_transport_url(&self) -> String {
        format!("{}{}", self.base_url(), self.shared.config.av_control_path)
    }

    pub fn conn_mgr_url(&self) -> String {
        format!("{}{}", self.base_url(), CONN_MGR_PATH)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.shared.calls.lock().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.action).collect()
    }
}

/// Starts a fake renderer on an ephemeral localhost port.
pub async fn spawn_fake_renderer(config: FakeRenderer) -> RendererHandle {
    let shared = Arc::new(Shared {
        config,
        calls: Mutex::new(Vec::new()),
    });
    let app = Router::new().fallback(handle).with_state(Arc::clone(&shared));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake renderer");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    RendererHandle { addr, shared }
}

/// Returns a localhost port with nothing listening on it.
pub async fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}

async fn handle(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let config = &shared.config;
    if let Some(delay) = config.response_delay {
        tokio::time::sleep(delay).await;
    }
    let path = uri.path().to_string();

    if method == Method::GET {
        if path == config.description_path {
            return xml(StatusCode::OK, device_description(config));
        }
        if path == SCPD_PATH && config.serve_scpd {
            return xml(StatusCode::OK, scpd(&config.scpd_actions));
        }
        return (StatusCode::NOT_FOUND, "<html><body>Not Found</body></html>").into_response();
    }

    if method != Method::POST || (path != config.av_control_path && path != CONN_MGR_PATH) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let soap_action = header_str("soapaction");
    let action = soap_action
        .trim_matches('"')
        .rsplit('#')
        .next()
        .unwrap_or_default()
        .to_string();

    shared.calls.lock().push(RecordedCall {
        path: path.clone(),
        action: action.clone(),
        soap_action,
        content_type: header_str("content-type"),
        body,
    });

    if config.fail_actions.iter().any(|a| *a == action) {
        return xml(StatusCode::INTERNAL_SERVER_ERROR, fault(401, "Invalid Action"));
    }

    let inner = match action.as_str() {
        "GetTransportInfo" => "<CurrentTransportState>STOPPED</CurrentTransportState><CurrentTransportStatus>OK</CurrentTransportStatus><CurrentSpeed>1</CurrentSpeed>".to_string(),
        "GetMediaInfo" => "<NrTracks>0</NrTracks><CurrentURI></CurrentURI>".to_string(),
        "GetPositionInfo" => "<Track>0</Track><RelTime>00:00:00</RelTime>".to_string(),
        "GetProtocolInfo" => match &config.protocol_info_sink {
            Some(sink) => format!("<Source></Source><Sink>{}</Sink>", sink),
            None => return xml(StatusCode::INTERNAL_SERVER_ERROR, fault(501, "Action Failed")),
        },
        _ => String::new(),
    };
    let service = if path == CONN_MGR_PATH {
        "ConnectionManager"
    } else {
        "AVTransport"
    };
    xml(
        StatusCode::OK,
        format!(
            r#"<?xml version="1.0"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:{action}Response xmlns:u="urn:schemas-upnp-org:service:{service}:1">{inner}</u:{action}Response></s:Body></s:Envelope>"#
        ),
    )
}

fn xml(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "text/xml; charset=\"utf-8\"")], body).into_response()
}

fn fault(code: u16, description: &str) -> String {
    format!(
        r#"<?xml version="1.0"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>{code}</errorCode><errorDescription>{description}</errorDescription></UPnPError></detail></s:Fault></s:Body></s:Envelope>"#
    )
}

fn device_description(config: &FakeRenderer) -> String {
    format!(
        r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <device>
    <deviceType>urn:schemas-upnp-org:device:MediaRenderer:1</deviceType>
    <friendlyName>{friendly}</friendlyName>
    <manufacturer>{manufacturer}</manufacturer>
    <modelName>{model}</modelName>
    <modelNumber>AllShare1.0</modelNumber>
    <UDN>{udn}</UDN>
    <presentationURL>/</presentationURL>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:RenderingControl:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:RenderingControl</serviceId>
        <controlURL>/upnp/control/RenderingControl1</controlURL>
        <SCPDURL>/RenderingControl/scpd.xml</SCPDURL>
      </service>
      <service>
        <serviceType>urn:schemas-upnp-org:service:ConnectionManager:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:ConnectionManager</serviceId>
        <controlURL>{cm}</controlURL>
        <SCPDURL>/ConnectionManager/scpd.xml</SCPDURL>
      </service>
      <service>
        <serviceType>urn:schemas-upnp-org:service:AVTransport:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:AVTransport</serviceId>
        <controlURL>{av}</controlURL>
        <SCPDURL>{scpd}</SCPDURL>
      </service>
    </serviceList>
  </device>
</root>"#,
        friendly = config.friendly_name,
        manufacturer = config.manufacturer,
        model = config.model_name,
        udn = config.udn,
        cm = CONN_MGR_PATH,
        av = config.av_control_path,
        scpd = SCPD_PATH.trim_start_matches('/'),
    )
}

fn scpd(actions: &[String]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0"?><scpd xmlns="urn:schemas-upnp-org:service-1-0"><actionList>"#,
    );
    for action in actions {
        body.push_str(&format!(
            "<action><name>{action}</name><argumentList><argument><name>InstanceID</name><direction>in</direction></argument></argumentList></action>"
        ));
    }
    body.push_str("</actionList><serviceStateTable><stateVariable><name>TransportState</name></stateVariable></serviceStateTable></scpd>");
    body
}
