//! Environment-driven configuration.
//!
//! Every knob has a sensible default; `from_env` overlays the
//! `TOASTWAY_*` variables on top. Unset or unparseable values fall back
//! to the default rather than failing startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DEFAULT_TITLE: &str = "TOASTWAY_DEFAULT_TITLE";
pub const ENV_DEFAULT_LOGO: &str = "TOASTWAY_DEFAULT_LOGO";
pub const ENV_MEDIA_DIR: &str = "TOASTWAY_MEDIA_DIR";
pub const ENV_MEDIA_TIMEOUT_SECS: &str = "TOASTWAY_MEDIA_TIMEOUT_SECS";
pub const ENV_MEDIA_REFRESH: &str = "TOASTWAY_MEDIA_REFRESH";
pub const ENV_SPOOL_DIR: &str = "TOASTWAY_SPOOL_DIR";

fn truthy(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "on")
}

/// Defaults applied by [`crate::content::ToastBuilder::build`] when the
/// caller leaves a slot empty.
#[derive(Debug, Clone)]
pub struct ContentDefaults {
    /// Text line substituted when the body has no text at all.
    pub title: String,
    /// Logo substituted when no logo image was supplied. `None` leaves
    /// the slot empty.
    pub logo: Option<PathBuf>,
}

impl Default for ContentDefaults {
    fn default() -> Self {
        Self {
            title: "Notification".to_string(),
            logo: None,
        }
    }
}

impl ContentDefaults {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(title) = env::var(ENV_DEFAULT_TITLE) {
            if !title.trim().is_empty() {
                cfg.title = title;
            }
        }
        if let Ok(logo) = env::var(ENV_DEFAULT_LOGO) {
            if !logo.trim().is_empty() {
                cfg.logo = Some(PathBuf::from(logo));
            }
        }
        cfg
    }
}

/// Settings for the remote-media cache.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory cached downloads land in. Created on demand.
    pub cache_dir: PathBuf,
    /// Per-request timeout for remote fetches.
    pub http_timeout: Duration,
    /// When set, every build re-fetches remote media even when cached.
    pub force_refresh: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cache_dir: env::temp_dir().join("toastway-media"),
            http_timeout: Duration::from_secs(10),
            force_refresh: false,
        }
    }
}

impl MediaConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(dir) = env::var(ENV_MEDIA_DIR) {
            if !dir.trim().is_empty() {
                cfg.cache_dir = PathBuf::from(dir);
            }
        }
        if let Ok(raw) = env::var(ENV_MEDIA_TIMEOUT_SECS) {
            if let Ok(secs) = raw.trim().parse::<u64>() {
                cfg.http_timeout = Duration::from_secs(secs);
            }
        }
        if let Ok(raw) = env::var(ENV_MEDIA_REFRESH) {
            cfg.force_refresh = truthy(&raw);
        }
        cfg
    }
}

/// Settings for the file-backed spool host.
#[derive(Debug, Clone)]
pub struct SpoolConfig {
    pub dir: PathBuf,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            dir: env::temp_dir().join("toastway-spool"),
        }
    }
}

impl SpoolConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(dir) = env::var(ENV_SPOOL_DIR) {
            if !dir.trim().is_empty() {
                cfg.dir = PathBuf::from(dir);
            }
        }
        cfg
    }
}
