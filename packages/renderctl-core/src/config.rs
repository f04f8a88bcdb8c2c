//! The configuration record consumed by resolution and playback.
//!
//! Front-ends fill a [`Config`] from a file, the environment and the command
//! line, then hand it to the resolver. Fields can also be edited by name
//! through the [`FIELDS`] table.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::upnp::utils::build_control_url;
use crate::upnp::Vendor;

/// How the playback target is found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// SSDP, then cache, then direct probe.
    #[default]
    Auto,
    /// Use target ip/port/path as given.
    Manual,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Auto => "auto",
            Mode::Manual => "manual",
        })
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Mode::Auto),
            "manual" => Ok(Mode::Manual),
            other => Err(format!("unknown mode '{}' (expected auto or manual)", other)),
        }
    }
}

/// Configuration for one renderctl invocation.
///
/// All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Resolution
    pub mode: Mode,

    /// Stop after resolving the target; send no playback commands.
    pub probe_only: bool,

    /// Allow resolving from the endpoint cache.
    pub use_cache: bool,

    /// Cached device index to play on (-1 = none).
    pub select_cache: i64,

    /// Extend the direct probe with extra ports and paths.
    pub deep_search: bool,

    /// Passive SSDP listen window (seconds).
    pub ssdp_timeout_secs: u64,

    // Target
    pub target_ip: String,
    pub target_port: String,
    pub target_path: String,

    /// Overrides the vendor reported by the device.
    pub vendor: Option<Vendor>,

    // Local side
    /// IP of the interface facing the TV network.
    pub local_ip: String,

    /// File name served by the external media server.
    pub media_file: String,

    /// Full media URL. Derived from local_ip, serve_port and media_file when empty.
    pub media_url: String,

    pub serve_port: u16,

    /// Answer yes to every confirmation.
    pub assume_yes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Auto,
            probe_only: false,
            use_cache: true,
            select_cache: -1,
            deep_search: false,
            ssdp_timeout_secs: 60,
            target_ip: String::new(),
            target_port: String::new(),
            target_path: String::new(),
            vendor: None,
            local_ip: String::new(),
            media_file: String::new(),
            media_url: String::new(),
            serve_port: 8000,
            assume_yes: false,
        }
    }
}

impl Config {
    pub fn ssdp_timeout(&self) -> Duration {
        Duration::from_secs(self.ssdp_timeout_secs)
    }

    /// The media URL handed to the renderer.
    ///
    /// `media_url` wins; otherwise `http://<local_ip>:<serve_port>/<media_file>`
    /// when both local IP and file are known.
    pub fn resolved_media_url(&self) -> Option<String> {
        if !self.media_url.is_empty() {
            return Some(self.media_url.clone());
        }
        if self.local_ip.is_empty() || self.media_file.is_empty() {
            return None;
        }
        let file = std::path::Path::new(&self.media_file)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.media_file.clone());
        Some(format!(
            "http://{}:{}/{}",
            self.local_ip,
            self.serve_port,
            file.trim_start_matches('/')
        ))
    }

    /// Control URL built from target ip/port/path, for manual mode.
    pub fn manual_control_url(&self) -> Option<String> {
        if self.target_ip.is_empty() || self.target_port.is_empty() {
            return None;
        }
        Some(build_control_url(
            &self.target_ip,
            &self.target_port,
            &self.target_path,
        ))
    }

    /// Sets a field by its identifier (`--set key=value`).
    pub fn set_field(&mut self, identifier: &str, value: &str) -> Result<(), String> {
        let field = find_field(identifier)?;
        (field.set)(self, value)
    }

    /// Current value of a field as text.
    pub fn get_field(&self, identifier: &str) -> Result<String, String> {
        let field = find_field(identifier)?;
        Ok((field.get)(self))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Field table
// ─────────────────────────────────────────────────────────────────────────────

/// Named accessor pair for one [`Config`] field.
pub struct ConfigField {
    pub identifier: &'static str,
    pub get: fn(&Config) -> String,
    pub set: fn(&mut Config, &str) -> Result<(), String>,
}

impl fmt::Debug for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigField")
            .field("identifier", &self.identifier)
            .finish()
    }
}

fn find_field(identifier: &str) -> Result<&'static ConfigField, String> {
    FIELDS
        .iter()
        .find(|f| f.identifier == identifier)
        .ok_or_else(|| format!("unknown config field '{}'", identifier))
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(format!("invalid boolean '{}'", other)),
    }
}

fn parse_num<T: FromStr>(value: &str) -> Result<T, String>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| format!("invalid number '{}': {}", value, e))
}

/// Every editable field, in display order.
pub static FIELDS: &[ConfigField] = &[
    ConfigField {
        identifier: "mode",
        get: |c| c.mode.to_string(),
        set: |c, v| {
            c.mode = v.parse()?;
            Ok(())
        },
    },
    ConfigField {
        identifier: "probe_only",
        get: |c| c.probe_only.to_string(),
        set: |c, v| {
            c.probe_only = parse_bool(v)?;
            Ok(())
        },
    },
    ConfigField {
        identifier: "use_cache",
        get: |c| c.use_cache.to_string(),
        set: |c, v| {
            c.use_cache = parse_bool(v)?;
            Ok(())
        },
    },
    ConfigField {
        identifier: "select_cache",
        get: |c| c.select_cache.to_string(),
        set: |c, v| {
            c.select_cache = parse_num(v)?;
            Ok(())
        },
    },
    ConfigField {
        identifier: "deep_search",
        get: |c| c.deep_search.to_string(),
        set: |c, v| {
            c.deep_search = parse_bool(v)?;
            Ok(())
        },
    },
    ConfigField {
        identifier: "ssdp_timeout_secs",
        get: |c| c.ssdp_timeout_secs.to_string(),
        set: |c, v| {
            c.ssdp_timeout_secs = parse_num(v)?;
            Ok(())
        },
    },
    ConfigField {
        identifier: "target_ip",
        get: |c| c.target_ip.clone(),
        set: |c, v| {
            c.target_ip = v.trim().to_string();
            Ok(())
        },
    },
    ConfigField {
        identifier: "target_port",
        get: |c| c.target_port.clone(),
        set: |c, v| {
            let v = v.trim();
            if !v.is_empty() {
                parse_num::<u16>(v)?;
            }
            c.target_port = v.to_string();
            Ok(())
        },
    },
    ConfigField {
        identifier: "target_path",
        get: |c| c.target_path.clone(),
        set: |c, v| {
            c.target_path = v.trim().to_string();
            Ok(())
        },
    },
    ConfigField {
        identifier: "vendor",
        get: |c| c.vendor.map(|v| v.to_string()).unwrap_or_default(),
        set: |c, v| {
            c.vendor = if v.trim().is_empty() {
                None
            } else {
                Some(v.parse()?)
            };
            Ok(())
        },
    },
    ConfigField {
        identifier: "local_ip",
        get: |c| c.local_ip.clone(),
        set: |c, v| {
            c.local_ip = v.trim().to_string();
            Ok(())
        },
    },
    ConfigField {
        identifier: "media_file",
        get: |c| c.media_file.clone(),
        set: |c, v| {
            c.media_file = v.to_string();
            Ok(())
        },
    },
    ConfigField {
        identifier: "media_url",
        get: |c| c.media_url.clone(),
        set: |c, v| {
            c.media_url = v.trim().to_string();
            Ok(())
        },
    },
    ConfigField {
        identifier: "serve_port",
        get: |c| c.serve_port.to_string(),
        set: |c, v| {
            c.serve_port = parse_num(v)?;
            Ok(())
        },
    },
    ConfigField {
        identifier: "assume_yes",
        get: |c| c.assume_yes.to_string(),
        set: |c, v| {
            c.assume_yes = parse_bool(v)?;
            Ok(())
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.mode, Mode::Auto);
        assert!(c.use_cache);
        assert_eq!(c.select_cache, -1);
        assert_eq!(c.ssdp_timeout(), Duration::from_secs(60));
        assert_eq!(c.serve_port, 8000);
    }

    #[test]
    fn set_and_get_by_identifier() {
        let mut c = Config::default();
        c.set_field("mode", "manual").unwrap();
        c.set_field("target_ip", " 10.0.0.5 ").unwrap();
        c.set_field("target_port", "9197").unwrap();
        c.set_field("deep_search", "yes").unwrap();
        c.set_field("vendor", "LG").unwrap();
        c.set_field("select_cache", "2").unwrap();

        assert_eq!(c.mode, Mode::Manual);
        assert_eq!(c.get_field("target_ip").unwrap(), "10.0.0.5");
        assert!(c.deep_search);
        assert_eq!(c.vendor, Some(Vendor::Lg));
        assert_eq!(c.get_field("select_cache").unwrap(), "2");
    }

    #[test]
    fn bad_values_are_rejected() {
        let mut c = Config::default();
        assert!(c.set_field("nope", "1").is_err());
        assert!(c.set_field("use_cache", "maybe").is_err());
        assert!(c.set_field("serve_port", "99999").is_err());
        assert!(c.set_field("target_port", "abc").is_err());
        assert!(c.set_field("mode", "fast").is_err());
        assert!(c.use_cache);
    }

    #[test]
    fn every_field_round_trips_through_its_getter() {
        let mut c = Config::default();
        for field in FIELDS {
            let value = (field.get)(&c);
            (field.set)(&mut c, &value).unwrap();
        }
        assert_eq!(c, Config::default());
    }

    #[test]
    fn media_url_derivation() {
        let mut c = Config {
            local_ip: "192.168.1.10".into(),
            media_file: "/home/me/videos/movie.mp4".into(),
            ..Config::default()
        };
        assert_eq!(
            c.resolved_media_url().as_deref(),
            Some("http://192.168.1.10:8000/movie.mp4")
        );

        c.media_url = "http://nas/clip.mkv".into();
        assert_eq!(c.resolved_media_url().as_deref(), Some("http://nas/clip.mkv"));

        assert_eq!(Config::default().resolved_media_url(), None);
    }

    #[test]
    fn manual_control_url_adds_leading_slash() {
        let c = Config {
            target_ip: "10.0.0.5".into(),
            target_port: "9197".into(),
            target_path: "dmr/upnp/control/AVTransport1".into(),
            ..Config::default()
        };
        assert_eq!(
            c.manual_control_url().as_deref(),
            Some("http://10.0.0.5:9197/dmr/upnp/control/AVTransport1")
        );
        assert_eq!(Config::default().manual_control_url(), None);
    }

    #[test]
    fn deserializes_partial_yaml_like_json() {
        let c: Config = serde_json::from_str(r#"{"mode":"manual","vendor":"sony"}"#).unwrap();
        assert_eq!(c.mode, Mode::Manual);
        assert_eq!(c.vendor, Some(Vendor::Sony));
        assert_eq!(c.serve_port, 8000);
    }
}
