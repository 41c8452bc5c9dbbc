//! Wires config, HTTP client and controller together.

use crate::config::Config;
use anyhow::{Context, Result};
use attempt_sync_client::{discover_base_url, HttpAttemptApi, SystemInfo};
use attempt_sync_core::{AttemptController, ControllerOptions, ProfileCatalog, ProfileVariant};
use std::sync::Arc;
use tracing::{info, warn};

/// Used when neither the local config nor the backend names a profile.
pub const FALLBACK_PROFILE: &str = "claude-code";

pub async fn resolve_base_url(config: &Config) -> String {
    match &config.base_url {
        Some(base_url) => base_url.clone(),
        None => discover_base_url().await,
    }
}

/// Backend info, needed only for what the local config leaves unset.
/// Variant pre-selection degrades gracefully, so failures only warn.
pub async fn load_system_info(config: &Config, api: &HttpAttemptApi) -> Option<SystemInfo> {
    if config.profiles_path.is_some() && config.default_profile.is_some() {
        return None;
    }
    match api.fetch_system_info().await {
        Ok(info) => {
            info!("Loaded {} profiles from backend", info.catalog.profiles.len());
            Some(info)
        }
        Err(e) => {
            warn!("Could not fetch backend info: {}", e);
            None
        }
    }
}

/// Local profiles file when configured, otherwise the backend's catalog.
pub fn resolve_catalog(config: &Config, info: Option<&SystemInfo>) -> ProfileCatalog {
    if let Some(path) = &config.profiles_path {
        return ProfileCatalog::load(path);
    }
    info.map(|info| info.catalog.clone()).unwrap_or_default()
}

/// Local config, then the backend's configured profile, then [`FALLBACK_PROFILE`].
pub fn resolve_default_profile(config: &Config, info: Option<&SystemInfo>) -> ProfileVariant {
    config
        .default_profile
        .clone()
        .or_else(|| info.and_then(|info| info.config.profile.clone()))
        .unwrap_or_else(|| ProfileVariant::new(FALLBACK_PROFILE))
}

pub async fn build_controller(config: &Config) -> Result<Arc<AttemptController<HttpAttemptApi>>> {
    config.validate().context("Invalid configuration")?;

    let base_url = resolve_base_url(config).await;
    let api = HttpAttemptApi::new(base_url.clone(), config.request_timeout())
        .context("Failed to build HTTP client")?;
    info!("Using backend at {}", base_url);

    let system_info = load_system_info(config, &api).await;
    let default_profile = resolve_default_profile(config, system_info.as_ref());
    info!("Default follow-up profile: {}", default_profile.profile);

    let options = ControllerOptions {
        poll_interval: config.poll_interval(),
        default_profile: Some(default_profile),
        catalog: resolve_catalog(config, system_info.as_ref()),
    };
    Ok(Arc::new(AttemptController::new(Arc::new(api), options)))
}
