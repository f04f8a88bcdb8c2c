//! Resolution orchestrator.
//!
//! Turns a [`Config`] into a [`ResolvedPlan`] by walking
//! `TrySSDP → TryCache → TryProbe`, stopping at the first stage that yields
//! a playable endpoint. Manual mode and an explicit cache index bypass the
//! walk.
//!
//! Every stage reports through the log with its name and endpoint, so a
//! failed run shows exactly which fallbacks were tried.

mod plan;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use thiserror::Error;
use url::Url;

use crate::cache::{CacheError, CacheStore, DeviceUpdate};
use crate::config::{Config, Mode};
use crate::confirm::Confirm;
use crate::protocol_constants::{IDENTITY_BUDGET_SECS, PROBE_BUDGET_SECS};
use crate::self_identity::self_udn;
use crate::upnp::capabilities::{enrich_capabilities, validate_actions};
use crate::upnp::identity::enrich_identity;
use crate::upnp::playback::{play_target, PlaybackError};
use crate::upnp::probe::{probe_avtransport, ProbeError, ProbePlan};
use crate::upnp::{
    AvTransportControl, Capabilities, DetectedTv, RendererDiscovery, Target, Vendor,
};

pub use plan::{EnrichedDevice, ResolvedPlan, Stage};

/// Errors that end resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No media URL could be built and playback was requested.
    #[error("no media URL: set media_url, or local_ip and media_file")]
    MissingMediaUrl,

    /// Manual mode without a target IP and port.
    #[error("manual mode requires target_ip and target_port")]
    MissingManualTarget,

    /// The cache could not be read or written.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The direct probe, the last stage, failed.
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// A fatal playback command failed.
    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// Convenient Result alias for resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Walks the resolution stages against the network and the cache file.
pub struct Resolver {
    http: Client,
    discovery: Arc<dyn RendererDiscovery>,
    confirm: Arc<dyn Confirm>,
    cache_path: PathBuf,
    self_udn: Option<String>,
    probe_budget: Duration,
    identity_budget: Duration,
    probe_plan: Option<ProbePlan>,
}

impl Resolver {
    pub fn new(
        http: Client,
        discovery: Arc<dyn RendererDiscovery>,
        confirm: Arc<dyn Confirm>,
        cache_path: PathBuf,
    ) -> Self {
        Self {
            http,
            discovery,
            confirm,
            cache_path,
            self_udn: None,
            probe_budget: Duration::from_secs(PROBE_BUDGET_SECS),
            identity_budget: Duration::from_secs(IDENTITY_BUDGET_SECS),
            probe_plan: None,
        }
    }

    /// Devices announcing `uuid:<self_uuid>` are ignored during discovery.
    #[must_use]
    pub fn with_self_uuid(mut self, self_uuid: Option<String>) -> Self {
        self.self_udn = self_uuid.map(|u| self_udn(&u));
        self
    }

    #[must_use]
    pub fn with_probe_budget(mut self, budget: Duration) -> Self {
        self.probe_budget = budget;
        self
    }

    #[must_use]
    pub fn with_identity_budget(mut self, budget: Duration) -> Self {
        self.identity_budget = budget;
        self
    }

    /// Replaces the standard probe ports and paths.
    #[must_use]
    pub fn with_probe_plan(mut self, plan: ProbePlan) -> Self {
        self.probe_plan = Some(plan);
        self
    }

    /// Resolves the target and, unless `probe_only`, plays it.
    pub async fn execute(
        &self,
        config: &Config,
        control: &dyn AvTransportControl,
    ) -> ResolveResult<ResolvedPlan> {
        let plan = self.resolve(config).await?;

        if config.probe_only {
            log::info!(
                "[Resolve] Probe only: resolved {} via {}, no playback",
                plan.target.control_url,
                plan.stage
            );
            return Ok(plan);
        }

        play_target(control, &plan.target, plan.vendor).await?;
        Ok(plan)
    }

    /// Resolves a playback target without sending any playback command.
    pub async fn resolve(&self, config: &Config) -> ResolveResult<ResolvedPlan> {
        let media_url = match config.resolved_media_url() {
            Some(url) => url,
            None if config.probe_only => String::new(),
            None => return Err(ResolveError::MissingMediaUrl),
        };

        if config.mode == Mode::Manual {
            let control_url = config
                .manual_control_url()
                .ok_or(ResolveError::MissingManualTarget)?;
            log::info!("[Resolve] Manual target {}", control_url);
            return Ok(ResolvedPlan {
                target: Target {
                    control_url,
                    media_url,
                },
                vendor: config.vendor.unwrap_or_default(),
                conn_mgr_url: String::new(),
                stage: Stage::Manual,
                identity: None,
            });
        }

        if config.select_cache >= 0 {
            let store = CacheStore::load(&self.cache_path)?;
            let selected = store.select(config.select_cache)?;
            log::info!(
                "[Resolve] Cache index {} -> {} ({})",
                config.select_cache,
                selected.ip,
                selected.control_url
            );
            return Ok(ResolvedPlan {
                target: Target {
                    control_url: selected.control_url,
                    media_url,
                },
                vendor: config.vendor.unwrap_or(selected.vendor),
                conn_mgr_url: selected.conn_mgr_url,
                stage: Stage::CacheIndex,
                identity: selected.identity,
            });
        }

        log::info!("[Resolve] Stage {}", Stage::Ssdp);
        if let Some(plan) = self.try_ssdp(config, &media_url).await? {
            return Ok(plan);
        }

        if config.use_cache {
            log::info!("[Resolve] Stage {}", Stage::Cache);
            if let Some(plan) = self.try_cache(config, &media_url)? {
                return Ok(plan);
            }
        }

        log::info!("[Resolve] Stage {}", Stage::Probe);
        self.try_probe(config, &media_url)
            .await
            .inspect_err(|e| log::error!("[Resolve] Failed: {}", e))
    }

    /// Discovers, enriches and caches every renderer on the network.
    ///
    /// The device announcing our own UUID is skipped. Returns the enriched
    /// devices in IP order; none of them is selected for playback.
    pub async fn scan(&self, config: &Config) -> ResolveResult<Vec<EnrichedDevice>> {
        if config.local_ip.is_empty() {
            log::warn!("[Resolve] No local IP configured, skipping SSDP");
            return Ok(Vec::new());
        }

        let tvs = match self
            .discovery
            .discover_tvs(&config.local_ip, config.ssdp_timeout())
            .await
        {
            Ok(tvs) => tvs,
            Err(e) => {
                log::warn!("[Resolve] SSDP discovery failed: {}", e);
                return Ok(Vec::new());
            }
        };

        let tvs: Vec<DetectedTv> = tvs
            .into_iter()
            .filter(|tv| {
                let is_self = self.self_udn.as_deref() == Some(tv.udn.as_str());
                if is_self {
                    log::info!("[Resolve] Ignoring self announcement ({})", tv.udn);
                }
                !is_self
            })
            .collect();

        let mut devices: Vec<EnrichedDevice> =
            futures::future::join_all(tvs.into_iter().map(|tv| self.enrich(tv))).await;
        devices.sort_by(|a, b| a.tv.ip.cmp(&b.tv.ip));

        if caching_enabled(config) && !devices.is_empty() {
            let mut store = CacheStore::load(&self.cache_path)?;
            let now = Utc::now();
            for device in &devices {
                log::info!(
                    "[Cache] Storing {} {} ({}, {} validated action(s))",
                    device.tv.ip,
                    device.tv.control_url,
                    device.tv.vendor,
                    device.capabilities.validated_actions().len()
                );
                store.merge(&device.tv.ip, device.to_update(), now);
            }
            store.save(&self.cache_path)?;
        }

        Ok(devices)
    }

    async fn enrich(&self, tv: DetectedTv) -> EnrichedDevice {
        let capabilities = if tv.control_url.is_empty() {
            log::warn!("[Resolve] {} advertises no AVTransport service", tv.location);
            Capabilities::default()
        } else {
            enrich_capabilities(
                &self.http,
                &tv.av_transport_scpd_url,
                &tv.control_url,
                &tv.conn_mgr_control_url,
            )
            .await
        };

        let base_url = format!("http://{}:{}", tv.ip, tv.port);
        let identity = match enrich_identity(&self.http, &base_url, self.identity_budget).await {
            Ok(identity) => Some(identity),
            Err(e) => {
                log::info!("[Resolve] Identity for {}: {}", tv.ip, e);
                None
            }
        };

        EnrichedDevice {
            tv,
            capabilities,
            identity,
        }
    }

    async fn try_ssdp(
        &self,
        config: &Config,
        media_url: &str,
    ) -> ResolveResult<Option<ResolvedPlan>> {
        let devices = self.scan(config).await?;
        if devices.is_empty() {
            log::info!("[Resolve] {} yielded no renderer, falling back", Stage::Ssdp);
            return Ok(None);
        }

        let candidates: Vec<&EnrichedDevice> = devices
            .iter()
            .filter(|d| d.is_playable())
            .filter(|d| config.target_ip.is_empty() || d.tv.ip == config.target_ip)
            .collect();

        for device in candidates {
            let question = format!(
                "Play on {} ({}, {})?",
                device.display_name(),
                device.tv.ip,
                device.tv.control_url
            );
            if !config.assume_yes && !self.confirm.confirm(&question) {
                continue;
            }

            log::info!(
                "[Resolve] {} selected {} ({})",
                Stage::Ssdp,
                device.tv.ip,
                device.tv.control_url
            );
            return Ok(Some(ResolvedPlan {
                target: Target {
                    control_url: device.tv.control_url.clone(),
                    media_url: media_url.to_string(),
                },
                vendor: config.vendor.unwrap_or(device.tv.vendor),
                conn_mgr_url: device.tv.conn_mgr_control_url.clone(),
                stage: Stage::Ssdp,
                identity: device.identity.clone(),
            }));
        }

        log::info!(
            "[Resolve] {} cached {} device(s) but none was selected, falling back",
            Stage::Ssdp,
            devices.len()
        );
        Ok(None)
    }

    fn try_cache(&self, config: &Config, media_url: &str) -> ResolveResult<Option<ResolvedPlan>> {
        if config.target_ip.is_empty() {
            log::info!("[Resolve] {} skipped: no target IP", Stage::Cache);
            return Ok(None);
        }

        let store = CacheStore::load(&self.cache_path)?;
        let Some(device) = store.get(&config.target_ip) else {
            log::info!("[Resolve] {} miss for {}", Stage::Cache, config.target_ip);
            return Ok(None);
        };
        let Some(endpoint) = device.primary_endpoint() else {
            log::info!(
                "[Resolve] {} has no playable endpoint for {}",
                Stage::Cache,
                config.target_ip
            );
            return Ok(None);
        };

        let vendor = device.vendor.unwrap_or_default();
        log::info!(
            "[Resolve] Cached device {} vendor={} control={}",
            config.target_ip,
            vendor,
            endpoint.control_url
        );

        if !config.assume_yes && !self.confirm.confirm("Use cached AVTransport endpoint?") {
            log::info!("[Resolve] {} declined", Stage::Cache);
            return Ok(None);
        }

        Ok(Some(ResolvedPlan {
            target: Target {
                control_url: endpoint.control_url.clone(),
                media_url: media_url.to_string(),
            },
            vendor: config.vendor.unwrap_or(vendor),
            conn_mgr_url: endpoint.conn_mgr_url.clone(),
            stage: Stage::Cache,
            identity: device.identity.clone(),
        }))
    }

    async fn try_probe(&self, config: &Config, media_url: &str) -> ResolveResult<ResolvedPlan> {
        let ip = config.target_ip.as_str();
        let plan = self
            .probe_plan
            .clone()
            .unwrap_or_else(|| ProbePlan::standard(config.deep_search));

        let control_url = probe_avtransport(&self.http, ip, &plan, self.probe_budget).await?;

        let actions = validate_actions(&self.http, &control_url).await;
        let validated: Vec<String> = actions
            .into_iter()
            .filter(|(_, ok)| *ok)
            .map(|(name, _)| name)
            .collect();

        let origin = Url::parse(&control_url)
            .map(|url| url.origin().ascii_serialization())
            .unwrap_or_else(|_| format!("http://{}", ip));
        let identity = match enrich_identity(&self.http, &origin, self.identity_budget).await {
            Ok(identity) => Some(identity),
            Err(e) => {
                log::info!("[Resolve] Identity for {}: {}", ip, e);
                None
            }
        };

        let vendor = config
            .vendor
            .or_else(|| {
                identity
                    .as_ref()
                    .filter(|i| !i.manufacturer.is_empty())
                    .map(|i| Vendor::from_manufacturer(&i.manufacturer))
            })
            .unwrap_or_default();

        log::info!(
            "[Resolve] {} found {} ({} validated action(s))",
            Stage::Probe,
            control_url,
            validated.len()
        );

        if caching_enabled(config) {
            let question = format!("Cache probed endpoint {}?", control_url);
            if config.assume_yes || self.confirm.confirm(&question) {
                let mut store = CacheStore::load(&self.cache_path)?;
                store.merge(
                    ip,
                    DeviceUpdate {
                        vendor: Some(vendor),
                        identity: identity.clone(),
                        control_url: control_url.clone(),
                        conn_mgr_url: String::new(),
                        validated_actions: validated,
                        media: BTreeMap::new(),
                    },
                    Utc::now(),
                );
                store.save(&self.cache_path)?;
            } else {
                log::info!("[Resolve] Not caching {}", control_url);
            }
        }

        Ok(ResolvedPlan {
            target: Target {
                control_url,
                media_url: media_url.to_string(),
            },
            vendor,
            conn_mgr_url: String::new(),
            stage: Stage::Probe,
            identity,
        })
    }
}

/// The cache is written only when enabled and no cached index was chosen.
fn caching_enabled(config: &Config) -> bool {
    config.use_cache && config.select_cache < 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::PresetConfirm;
    use crate::upnp::discovery::{fetch_and_detect, DiscoveryResult};
    use crate::upnp::soap::{http_client, SoapResult};
    use crate::upnp::test_fixtures::{
        spawn_fake_renderer, unused_port, FakeRenderer, RendererHandle,
    };
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    struct FixedDiscovery(Vec<DetectedTv>);

    #[async_trait]
    impl RendererDiscovery for FixedDiscovery {
        async fn discover_tvs(&self, _: &str, _: Duration) -> DiscoveryResult<Vec<DetectedTv>> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AvTransportControl for RecordingTransport {
        async fn stop(&self, url: &str) -> SoapResult<()> {
            self.calls.lock().push(format!("Stop {}", url));
            Ok(())
        }

        async fn set_av_transport_uri(&self, url: &str, uri: &str, _: &str) -> SoapResult<()> {
            self.calls.lock().push(format!("SetAVTransportURI {} {}", url, uri));
            Ok(())
        }

        async fn play(&self, url: &str) -> SoapResult<()> {
            self.calls.lock().push(format!("Play {}", url));
            Ok(())
        }
    }

    fn config() -> Config {
        Config {
            local_ip: "127.0.0.1".into(),
            media_url: "http://127.0.0.1:8000/movie.mp4".into(),
            ssdp_timeout_secs: 1,
            ..Config::default()
        }
    }

    fn resolver(
        dir: &TempDir,
        tvs: Vec<DetectedTv>,
        answer: bool,
    ) -> (Resolver, Arc<PresetConfirm>) {
        let confirm = Arc::new(PresetConfirm::new(answer));
        let resolver = Resolver::new(
            http_client(),
            Arc::new(FixedDiscovery(tvs)),
            confirm.clone(),
            dir.path().join("devices.json"),
        )
        .with_identity_budget(Duration::from_secs(2));
        (resolver, confirm)
    }

    async fn detected(renderer: &RendererHandle) -> DetectedTv {
        fetch_and_detect(&http_client(), &renderer.description_url(), Duration::from_secs(5))
            .await
            .unwrap()
    }

    fn probe_plan_for(renderer: &RendererHandle) -> ProbePlan {
        ProbePlan {
            ports: vec![renderer.port()],
            paths: vec!["/upnp/control/AVTransport1".into()],
        }
    }

    #[tokio::test]
    async fn ssdp_stage_caches_and_selects_renderer() {
        let renderer = spawn_fake_renderer(FakeRenderer::default()).await;
        let dir = TempDir::new().unwrap();
        let (resolver, confirm) = resolver(&dir, vec![detected(&renderer).await], true);

        let plan = resolver.resolve(&config()).await.unwrap();
        assert_eq!(plan.stage, Stage::Ssdp);
        assert_eq!(plan.target.control_url, renderer.av_transport_url());
        assert_eq!(plan.vendor, Vendor::Samsung);
        assert_eq!(plan.conn_mgr_url, renderer.conn_mgr_url());
        assert_eq!(confirm.asked().len(), 1);

        let store = CacheStore::load(&dir.path().join("devices.json")).unwrap();
        let primary = store.primary_endpoint(&renderer.ip()).unwrap();
        assert_eq!(primary.control_url, renderer.av_transport_url());
        assert_eq!(
            primary.action_names(),
            vec!["GetMediaInfo", "GetPositionInfo", "GetTransportInfo"]
        );
        assert_eq!(primary.media["video/mp4"], vec!["DLNA.ORG_PN=AVC_MP4", "*"]);
    }

    #[tokio::test]
    async fn self_announcement_is_ignored() {
        let renderer = spawn_fake_renderer(FakeRenderer {
            udn: "uuid:1111-self".into(),
            ..FakeRenderer::default()
        })
        .await;
        let dir = TempDir::new().unwrap();
        let (resolver, _) = resolver(&dir, vec![detected(&renderer).await], true);
        let resolver = resolver
            .with_self_uuid(Some("1111-self".into()))
            .with_probe_budget(Duration::from_secs(1));

        let devices = resolver.scan(&config()).await.unwrap();
        assert!(devices.is_empty());
        assert!(!dir.path().join("devices.json").exists());

        // No SSDP result, no cache, no target IP: the probe has nothing to try
        let err = resolver.resolve(&config()).await.unwrap_err();
        assert!(matches!(err, ResolveError::Probe(ProbeError::MissingIp)));
    }

    #[tokio::test]
    async fn cache_stage_injects_cached_urls_after_confirmation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("devices.json");
        let mut store = CacheStore::new();
        store.merge(
            "10.0.0.5",
            DeviceUpdate {
                vendor: Some(Vendor::Lg),
                control_url: "http://10.0.0.5:1234/ctl".into(),
                conn_mgr_url: "http://10.0.0.5:1234/cm".into(),
                validated_actions: vec![
                    "GetMediaInfo".into(),
                    "GetPositionInfo".into(),
                    "GetTransportInfo".into(),
                ],
                ..DeviceUpdate::default()
            },
            Utc::now(),
        );
        store.save(&path).unwrap();

        let (resolver, confirm) = resolver(&dir, Vec::new(), true);
        let plan = resolver
            .resolve(&Config {
                target_ip: "10.0.0.5".into(),
                ..config()
            })
            .await
            .unwrap();

        assert_eq!(plan.stage, Stage::Cache);
        assert_eq!(plan.target.control_url, "http://10.0.0.5:1234/ctl");
        assert_eq!(plan.conn_mgr_url, "http://10.0.0.5:1234/cm");
        assert_eq!(plan.vendor, Vendor::Lg);
        assert_eq!(confirm.asked(), vec!["Use cached AVTransport endpoint?"]);
    }

    #[tokio::test]
    async fn select_cache_index_bypasses_network() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("devices.json");
        let mut store = CacheStore::new();
        store.merge(
            "10.0.0.5",
            DeviceUpdate {
                vendor: Some(Vendor::Sony),
                control_url: "http://10.0.0.5:1234/ctl".into(),
                validated_actions: vec!["GetTransportInfo".into()],
                ..DeviceUpdate::default()
            },
            Utc::now(),
        );
        store.save(&path).unwrap();

        let (resolver, confirm) = resolver(&dir, Vec::new(), false);
        let plan = resolver
            .resolve(&Config {
                select_cache: 0,
                ..config()
            })
            .await
            .unwrap();
        assert_eq!(plan.stage, Stage::CacheIndex);
        assert_eq!(plan.vendor, Vendor::Sony);
        assert!(confirm.asked().is_empty());

        let err = resolver
            .resolve(&Config {
                select_cache: 3,
                ..config()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Cache(CacheError::InvalidIndex(3))));
    }

    #[tokio::test]
    async fn probe_stage_validates_and_caches_after_confirmation() {
        let renderer = spawn_fake_renderer(FakeRenderer::default()).await;
        let dir = TempDir::new().unwrap();
        let (resolver, confirm) = resolver(&dir, Vec::new(), true);
        let resolver = resolver.with_probe_plan(probe_plan_for(&renderer));

        let plan = resolver
            .resolve(&Config {
                target_ip: renderer.ip(),
                ..config()
            })
            .await
            .unwrap();

        assert_eq!(plan.stage, Stage::Probe);
        assert_eq!(plan.target.control_url, renderer.av_transport_url());
        assert_eq!(plan.vendor, Vendor::Samsung);
        assert_eq!(
            plan.identity.as_ref().map(|i| i.friendly_name.as_str()),
            Some("[TV] Living Room")
        );
        assert!(confirm.asked().iter().any(|q| q.starts_with("Cache probed endpoint")));

        let store = CacheStore::load(&dir.path().join("devices.json")).unwrap();
        assert!(store.primary_endpoint(&renderer.ip()).is_some());
    }

    #[tokio::test]
    async fn declined_probe_cache_still_resolves() {
        let renderer = spawn_fake_renderer(FakeRenderer::default()).await;
        let dir = TempDir::new().unwrap();
        let (resolver, _) = resolver(&dir, Vec::new(), false);
        let resolver = resolver.with_probe_plan(probe_plan_for(&renderer));

        let plan = resolver
            .resolve(&Config {
                target_ip: renderer.ip(),
                ..config()
            })
            .await
            .unwrap();
        assert_eq!(plan.stage, Stage::Probe);
        assert!(!dir.path().join("devices.json").exists());
    }

    #[tokio::test]
    async fn unreachable_probe_fails_within_budget() {
        let port = unused_port().await;
        let dir = TempDir::new().unwrap();
        let (resolver, _) = resolver(&dir, Vec::new(), true);
        let resolver = resolver
            .with_probe_budget(Duration::from_secs(1))
            .with_probe_plan(ProbePlan {
                ports: vec![port],
                paths: vec!["/a".into(), "/b".into()],
            });

        let started = std::time::Instant::now();
        let err = resolver
            .resolve(&Config {
                target_ip: "127.0.0.1".into(),
                ..config()
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ResolveError::Probe(ProbeError::NotFound(_) | ProbeError::Timeout { .. })
        ));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn manual_mode_builds_control_url() {
        let dir = TempDir::new().unwrap();
        let (resolver, _) = resolver(&dir, Vec::new(), true);

        let plan = resolver
            .resolve(&Config {
                mode: Mode::Manual,
                target_ip: "10.0.0.5".into(),
                target_port: "9197".into(),
                target_path: "dmr/upnp/control/AVTransport1".into(),
                vendor: Some(Vendor::Philips),
                ..config()
            })
            .await
            .unwrap();
        assert_eq!(plan.stage, Stage::Manual);
        assert_eq!(
            plan.target.control_url,
            "http://10.0.0.5:9197/dmr/upnp/control/AVTransport1"
        );
        assert_eq!(plan.vendor, Vendor::Philips);

        let err = resolver
            .resolve(&Config {
                mode: Mode::Manual,
                ..config()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingManualTarget));
    }

    #[tokio::test]
    async fn missing_media_url_only_matters_for_playback() {
        let dir = TempDir::new().unwrap();
        let (resolver, _) = resolver(&dir, Vec::new(), true);
        let manual = Config {
            mode: Mode::Manual,
            target_ip: "10.0.0.5".into(),
            target_port: "80".into(),
            media_url: String::new(),
            local_ip: String::new(),
            ..Config::default()
        };

        assert!(matches!(
            resolver.resolve(&manual).await,
            Err(ResolveError::MissingMediaUrl)
        ));

        let plan = resolver
            .resolve(&Config {
                probe_only: true,
                ..manual
            })
            .await
            .unwrap();
        assert!(plan.target.media_url.is_empty());
    }

    #[tokio::test]
    async fn execute_plays_unless_probe_only() {
        let dir = TempDir::new().unwrap();
        let (resolver, _) = resolver(&dir, Vec::new(), true);
        let manual = Config {
            mode: Mode::Manual,
            target_ip: "10.0.0.5".into(),
            target_port: "9197".into(),
            target_path: "/ctl".into(),
            ..config()
        };

        let transport = RecordingTransport::default();
        resolver
            .execute(
                &Config {
                    probe_only: true,
                    ..manual.clone()
                },
                &transport,
            )
            .await
            .unwrap();
        assert!(transport.calls.lock().is_empty());

        resolver.execute(&manual, &transport).await.unwrap();
        let calls = transport.calls.lock().clone();
        assert_eq!(
            calls,
            vec![
                "Stop http://10.0.0.5:9197/ctl".to_string(),
                "SetAVTransportURI http://10.0.0.5:9197/ctl http://127.0.0.1:8000/movie.mp4"
                    .to_string(),
                "Play http://10.0.0.5:9197/ctl".to_string(),
            ]
        );
    }

    #[test]
    fn caching_disabled_for_explicit_index() {
        let mut c = Config::default();
        assert!(caching_enabled(&c));
        c.select_cache = 1;
        assert!(!caching_enabled(&c));
        c.select_cache = -1;
        c.use_cache = false;
        assert!(!caching_enabled(&c));
    }
}
