//! Human-readable output for the terminal.

use renderctl_core::{CacheRow, CachedDevice, EnrichedDevice, ResolvedPlan};

const NA: &str = "n/a";

pub fn print_plan(plan: &ResolvedPlan) {
    println!("Resolved via {}", plan.stage);
    println!(" ControlURL: {}", plan.target.control_url);
    println!(" ConnMgr   : {}", or_na(&plan.conn_mgr_url));
    println!(" Vendor    : {}", plan.vendor);
    if let Some(identity) = &plan.identity {
        println!(" Name      : {}", or_na(&identity.friendly_name));
        println!(" Model     : {}", or_na(&identity.model_name));
    }
    if !plan.target.media_url.is_empty() {
        println!(" Media     : {}", plan.target.media_url);
    }
}

pub fn print_scan(devices: &[EnrichedDevice]) {
    if devices.is_empty() {
        println!("No TVs found");
        return;
    }
    for device in devices {
        println!(
            "{}  {}  {}  {}  actions={}  media={}",
            device.tv.ip,
            device.tv.vendor,
            device.display_name(),
            or_na(&device.tv.control_url),
            device.capabilities.validated_actions().len(),
            device.capabilities.media.len()
        );
    }
}

pub fn format_row(row: &CacheRow) -> String {
    format!(
        "[{}] {}  {}  {}  control={}  connmgr={}",
        row.index,
        row.ip,
        row.vendor.map_or_else(|| NA.to_string(), |v| v.to_string()),
        row.friendly_name.as_deref().unwrap_or(NA),
        row.control_url.as_deref().unwrap_or(NA),
        row.conn_mgr_url.as_deref().unwrap_or(NA),
    )
}

pub fn print_rows(rows: &[CacheRow]) {
    if rows.is_empty() {
        println!("Cache is empty");
        return;
    }
    for row in rows {
        println!("{}", format_row(row));
    }
}

pub fn format_device(ip: &str, device: &CachedDevice) -> String {
    let mut out = String::new();
    out.push_str(&format!("IP      : {}\n", ip));
    out.push_str(&format!(
        "Vendor  : {}\n",
        device.vendor.map_or_else(|| NA.to_string(), |v| v.to_string())
    ));

    match &device.identity {
        Some(identity) if !identity.is_empty() => {
            out.push_str("Identity:\n");
            for (key, value) in identity.fields() {
                out.push_str(&format!("  {:<14}: {}\n", key, value));
            }
        }
        _ => out.push_str(&format!("Identity: {}\n", NA)),
    }

    out.push_str("Endpoints:\n");
    for endpoint in device.endpoints.values() {
        out.push_str(&format!("  {}\n", endpoint.control_url));
        out.push_str(&format!("    playable: {}\n", endpoint.is_playable()));
        out.push_str(&format!("    connmgr : {}\n", or_na(&endpoint.conn_mgr_url)));
        let actions = endpoint.action_names();
        out.push_str(&format!(
            "    actions : {}\n",
            if actions.is_empty() {
                NA.to_string()
            } else {
                actions.join(", ")
            }
        ));
        if endpoint.media.is_empty() {
            out.push_str(&format!("    media   : {}\n", NA));
        } else {
            out.push_str("    media   :\n");
            for (mime, profiles) in &endpoint.media {
                out.push_str(&format!("      {} [{}]\n", mime, profiles.join(", ")));
            }
        }
        out.push_str(&format!("    seen_at : {}\n", endpoint.seen_at.to_rfc3339()));
    }
    out
}

pub fn print_device(ip: &str, device: &CachedDevice) {
    print!("{}", format_device(ip, device));
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        NA
    } else {
        value
    }
}
