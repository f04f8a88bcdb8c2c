//! renderctl - find a TV on the local network and play a media URL on it.
//!
//! This binary is a thin front-end over `renderctl-core`: it loads the
//! configuration record, applies overrides, initializes logging and runs one
//! command. Serving the media file is left to an external HTTP server.

mod config;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use renderctl_core::{
    default_cache_path, default_self_uuid_path, forget, load_or_create_self_uuid,
    resolve_local_ip, CacheStore, Confirm, ForgetOutcome, ForgetTarget, LocalIpDetector,
    RenderError, Resolver, StdinConfirm, UpnpClient, Vendor,
};
use tokio::signal;

use crate::config::AppConfig;

/// renderctl - discover UPnP/DLNA TVs and drive their AVTransport service.
#[derive(Parser, Debug)]
#[command(name = "renderctl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "RENDERCTL_LOG_LEVEL", global = true)]
    log_level: log::LevelFilter,

    /// Cache file (overrides config file).
    #[arg(long, value_name = "FILE", env = "RENDERCTL_CACHE_FILE", global = true)]
    cache_file: Option<PathBuf>,

    /// Set any configuration field, e.g. `--set deep_search=true`.
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    sets: Vec<String>,

    /// Answer yes to every confirmation.
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

/// Target selection shared by `play` and `probe`.
#[derive(clap::Args, Debug, Default)]
struct TargetArgs {
    /// TV IP address.
    #[arg(short = 't', long)]
    target_ip: Option<String>,

    /// TV SOAP port (manual mode).
    #[arg(long)]
    target_port: Option<u16>,

    /// TV SOAP control path (manual mode).
    #[arg(long)]
    target_path: Option<String>,

    /// Skip resolution and use ip/port/path as given.
    #[arg(long)]
    manual: bool,

    /// TV vendor (samsung, lg, sony, philips, generic).
    #[arg(long)]
    vendor: Option<Vendor>,

    /// Local IP facing the TV network (detected when omitted).
    #[arg(long)]
    local_ip: Option<String>,

    /// Play on the cached device at this index (see `cache list`).
    #[arg(short = 's', long)]
    select: Option<i64>,

    /// Probe extra ports and paths.
    #[arg(long)]
    deep: bool,

    /// Never read or write the endpoint cache.
    #[arg(long)]
    no_cache: bool,

    /// Passive SSDP listen window in seconds.
    #[arg(long, value_name = "SECS")]
    ssdp_timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a TV and play media on it.
    Play {
        #[command(flatten)]
        target: TargetArgs,

        /// Media URL the TV should fetch.
        #[arg(long, conflicts_with = "file")]
        url: Option<String>,

        /// File name served by the local media server.
        #[arg(short, long)]
        file: Option<String>,

        /// Port of the local media server.
        #[arg(long)]
        serve_port: Option<u16>,
    },

    /// Resolve a TV without playing anything.
    Probe {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Discover, enrich and cache every TV on the network.
    Scan {
        /// Local IP facing the TV network (detected when omitted).
        #[arg(long)]
        local_ip: Option<String>,

        /// Passive SSDP listen window in seconds.
        #[arg(long, value_name = "SECS")]
        ssdp_timeout: Option<u64>,
    },

    /// Inspect or edit the endpoint cache.
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// List cached devices.
    List,

    /// Show one cached device in detail.
    Show {
        /// Index from `cache list`.
        index: i64,
    },

    /// Forget a cached device, or `all`. Asks per device when omitted.
    Forget {
        /// Device IP or `all`.
        target: Option<String>,
    },
}

impl TargetArgs {
    fn apply(self, config: &mut renderctl_core::Config) {
        if let Some(ip) = self.target_ip {
            config.target_ip = ip;
        }
        if let Some(port) = self.target_port {
            config.target_port = port.to_string();
        }
        if let Some(path) = self.target_path {
            config.target_path = path;
        }
        if self.manual {
            config.mode = renderctl_core::Mode::Manual;
        }
        if self.vendor.is_some() {
            config.vendor = self.vendor;
        }
        if let Some(ip) = self.local_ip {
            config.local_ip = ip;
        }
        if let Some(index) = self.select {
            config.select_cache = index;
        }
        if self.deep {
            config.deep_search = true;
        }
        if self.no_cache {
            config.use_cache = false;
        }
        if let Some(secs) = self.ssdp_timeout {
            config.ssdp_timeout_secs = secs;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::debug!("renderctl v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    config.apply_sets(&args.sets)?;
    if args.yes {
        config.core.assume_yes = true;
    }

    let cache_path = match args.cache_file.or(config.cache_file.take()) {
        Some(path) => path,
        None => default_cache_path().context("Failed to locate the cache file")?,
    };

    tokio::select! {
        result = run(args.command, config, cache_path) => result,
        _ = shutdown_signal() => {
            log::warn!("Interrupted");
            anyhow::bail!("interrupted")
        }
    }
}

async fn run(command: Command, mut config: AppConfig, cache_path: PathBuf) -> Result<()> {
    let confirm: Arc<dyn Confirm> = Arc::new(StdinConfirm::new());

    match command {
        Command::Play {
            target,
            url,
            file,
            serve_port,
        } => {
            target.apply(&mut config.core);
            if let Some(url) = url {
                config.core.media_url = url;
            }
            if let Some(file) = file {
                config.core.media_file = file;
            }
            if let Some(port) = serve_port {
                config.core.serve_port = port;
            }
            fill_local_ip(&mut config.core);

            let client = UpnpClient::new();
            let resolver = build_resolver(&client, confirm, cache_path);
            let plan = resolver
                .execute(&config.core, &client)
                .await
                .map_err(RenderError::from)
                .context("Playback failed")?;
            output::print_plan(&plan);
        }

        Command::Probe { target } => {
            target.apply(&mut config.core);
            config.core.probe_only = true;
            fill_local_ip(&mut config.core);

            let client = UpnpClient::new();
            let resolver = build_resolver(&client, confirm, cache_path);
            let plan = resolver
                .execute(&config.core, &client)
                .await
                .map_err(RenderError::from)
                .context("Probe failed")?;
            output::print_plan(&plan);
        }

        Command::Scan {
            local_ip,
            ssdp_timeout,
        } => {
            if let Some(ip) = local_ip {
                config.core.local_ip = ip;
            }
            if let Some(secs) = ssdp_timeout {
                config.core.ssdp_timeout_secs = secs;
            }
            fill_local_ip(&mut config.core);

            let client = UpnpClient::new();
            let resolver = build_resolver(&client, confirm, cache_path);
            let devices = resolver
                .scan(&config.core)
                .await
                .map_err(RenderError::from)
                .context("Scan failed")?;
            output::print_scan(&devices);
        }

        Command::Cache { command } => {
            run_cache(command, &config.core, confirm.as_ref(), &cache_path)?;
        }
    }

    Ok(())
}

fn run_cache(
    command: CacheCommand,
    config: &renderctl_core::Config,
    confirm: &dyn Confirm,
    cache_path: &std::path::Path,
) -> Result<()> {
    match command {
        CacheCommand::List => {
            let store = CacheStore::load(cache_path).map_err(RenderError::from)?;
            output::print_rows(&store.rows());
        }

        CacheCommand::Show { index } => {
            let store = CacheStore::load(cache_path).map_err(RenderError::from)?;
            let (ip, device) = store.device_at(index).map_err(RenderError::from)?;
            output::print_device(ip, device);
        }

        CacheCommand::Forget { target: Some(target) } => {
            let target = if target.eq_ignore_ascii_case("all") {
                ForgetTarget::All
            } else {
                ForgetTarget::Ip(target)
            };
            let outcome = forget(cache_path, &target, confirm, config.assume_yes)
                .map_err(RenderError::from)?;
            report_forget(&target, outcome);
        }

        CacheCommand::Forget { target: None } => {
            let store = CacheStore::load(cache_path).map_err(RenderError::from)?;
            let rows = store.rows();
            if rows.is_empty() {
                println!("Cache is empty");
                return Ok(());
            }
            output::print_rows(&rows);
            for row in rows {
                let target = ForgetTarget::Ip(row.ip);
                let outcome = forget(cache_path, &target, confirm, config.assume_yes)
                    .map_err(RenderError::from)?;
                report_forget(&target, outcome);
            }
        }
    }
    Ok(())
}

fn report_forget(target: &ForgetTarget, outcome: ForgetOutcome) {
    let what = match target {
        ForgetTarget::Ip(ip) => ip.as_str(),
        ForgetTarget::All => "all devices",
    };
    match outcome {
        ForgetOutcome::Removed => println!("Forgot {}", what),
        ForgetOutcome::Cleared(n) => println!("Forgot {} device(s)", n),
        ForgetOutcome::NotCached => println!("{} is not cached", what),
        ForgetOutcome::Declined => {
            let declined = RenderError::UserDeclined(format!("forget {}", what));
            log::info!("{} ({})", declined, declined.code());
            println!("Kept {}", what);
        }
    }
}

fn build_resolver(client: &UpnpClient, confirm: Arc<dyn Confirm>, cache_path: PathBuf) -> Resolver {
    let self_uuid = default_self_uuid_path().and_then(|path| {
        load_or_create_self_uuid(&path)
            .inspect_err(|e| log::warn!("Self UUID unavailable, not filtering self: {}", e))
            .ok()
    });

    Resolver::new(
        client.http().clone(),
        Arc::new(client.clone()),
        confirm,
        cache_path,
    )
    .with_self_uuid(self_uuid)
}

fn fill_local_ip(config: &mut renderctl_core::Config) {
    match resolve_local_ip(&config.local_ip, &LocalIpDetector::new()) {
        Ok(ip) => config.local_ip = ip,
        Err(e) => log::warn!("{}; SSDP listening is disabled", e),
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
