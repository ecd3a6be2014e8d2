//! Configuration management for Figura Server

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::geometry::POINTS_PER_INCH;
use crate::raster::FillColor;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub render: RenderConfig,
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
}

/// Where artifacts are written and how they are addressed
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Flat directory holding every generated file
    pub root: PathBuf,
    /// URL path the root is served under
    pub url_prefix: String,
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Resolution pages are rasterized at
    pub dpi: f32,
    /// Color painted over redacted regions
    pub fill: FillColor,
    /// White border added around stored figures and captions
    pub figure_padding: u32,
}

impl RenderConfig {
    /// Raster scale relative to native points
    pub fn scale(&self) -> f32 {
        self.dpi / POINTS_PER_INCH
    }
}

#[derive(Debug, Clone)]
pub struct RetentionConfig {
    pub root: PathBuf,
    /// Artifacts older than this are expired
    pub threshold: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

const DEFAULT_ROOT: &str = "static";
const DEFAULT_DPI: f32 = 96.0;
const DEFAULT_PADDING: u32 = 10;
const DEFAULT_RETENTION_SECS: u64 = 60;

impl Default for Config {
    fn default() -> Self {
        let root = PathBuf::from(DEFAULT_ROOT);
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                cors_origins: Vec::new(),
            },
            storage: StorageConfig {
                root: root.clone(),
                url_prefix: format!("/{DEFAULT_ROOT}"),
            },
            render: RenderConfig {
                dpi: DEFAULT_DPI,
                fill: FillColor::BLACK,
                figure_padding: DEFAULT_PADDING,
            },
            retention: RetentionConfig {
                root,
                threshold: Duration::from_secs(DEFAULT_RETENTION_SECS),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build from any variable source; unset variables take their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let root = lookup("TEMPFILE_ROOT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage.root);
        let url_prefix = lookup("ARTIFACT_URL_PREFIX")
            .unwrap_or_else(|| format!("/{}", root.to_string_lossy()));

        let dpi: f32 = parse_var(&lookup, "RENDER_DPI", DEFAULT_DPI)?;
        if !dpi.is_finite() || dpi <= 0.0 {
            return Err(ConfigError::Invalid {
                var: "RENDER_DPI",
                value: dpi.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let fill = match lookup("REDACTION_FILL") {
            Some(value) => value.parse().map_err(|e: crate::raster::ParseColorError| {
                ConfigError::Invalid {
                    var: "REDACTION_FILL",
                    value,
                    reason: e.to_string(),
                }
            })?,
            None => FillColor::BLACK,
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var(&lookup, "SERVER_PORT", defaults.server.port)?,
                cors_origins,
            },
            storage: StorageConfig {
                root: root.clone(),
                url_prefix: normalize_prefix(&url_prefix),
            },
            render: RenderConfig {
                dpi,
                fill,
                figure_padding: parse_var(&lookup, "FIGURE_PADDING_PX", DEFAULT_PADDING)?,
            },
            retention: RetentionConfig {
                root,
                threshold: Duration::from_secs(parse_var(
                    &lookup,
                    "FILE_RETENTION_TIME",
                    DEFAULT_RETENTION_SECS,
                )?),
            },
        })
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

/// `static/`, `/static` and `static` all become `/static`; the root becomes ``
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
