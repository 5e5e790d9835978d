//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::domain::provider::Provider;
use crate::domain::resources::ResourceKey;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "folio";
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:1337";
const DEFAULT_DATASET: &str = "production";
const DEFAULT_API_VERSION: &str = "2024-03-19";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PAGE_SIZE: u64 = 100;
const DEFAULT_TTL_SECS: u64 = 300;
const DEFAULT_MAX_ENTRIES: u64 = 64;
const DEFAULT_PLACEHOLDER: &str = "images/placeholder.jpg";
const DEFAULT_IMAGE_WIDTH: u64 = 1920;
const DEFAULT_IMAGE_QUALITY: u64 = 80;

/// Command-line arguments for the `folio` binary.
#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Cached portfolio content client")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FOLIO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Fetch one or more resources and print them as JSON.
    Fetch(FetchArgs),
    /// Print every project grouped by category.
    Categories,
    /// Print a single item.
    Show(ShowArgs),
}

#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    /// Resources to fetch: `main`, `projects`, or any collection name.
    #[arg(value_name = "RESOURCE", required = true, num_args = 1..)]
    pub resources: Vec<ResourceKey>,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Item identifier, numeric or text.
    #[arg(value_name = "ID")]
    pub id: String,

    /// Resource to search.
    #[arg(long, value_name = "RESOURCE", default_value = "projects")]
    pub resource: ResourceKey,

    /// Flattened slide index; reports the section that contains it.
    #[arg(long, value_name = "INDEX")]
    pub slide: Option<usize>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the content API provider (strapi|sanity).
    #[arg(long = "provider", value_name = "PROVIDER", global = true)]
    pub provider: Option<String>,

    /// Override the content API base URL.
    #[arg(long = "base-url", value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Override the cache time-to-live.
    #[arg(long = "ttl-seconds", value_name = "SECONDS", global = true)]
    pub ttl_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub cache: CacheSettings,
    pub images: ImageSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub provider: Provider,
    pub base_url: Url,
    pub token: Option<String>,
    pub dataset: String,
    pub api_version: String,
    pub timeout: Duration,
    pub page_size: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub max_entries: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub placeholder: String,
    pub optimize: bool,
    pub width: NonZeroU32,
    pub quality: u8,
    pub preferred_format: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("FOLIO").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    api: RawApiSettings,
    cache: RawCacheSettings,
    images: RawImageSettings,
    logging: RawLoggingSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(provider) = overrides.provider.as_ref() {
            self.api.provider = Some(provider.clone());
        }
        if let Some(url) = overrides.base_url.as_ref() {
            self.api.base_url = Some(url.clone());
        }
        if let Some(ttl) = overrides.ttl_seconds {
            self.cache.ttl_seconds = Some(ttl);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            api,
            cache,
            images,
            logging,
        } = raw;

        Ok(Self {
            api: build_api_settings(api)?,
            cache: build_cache_settings(cache)?,
            images: build_image_settings(images)?,
            logging: build_logging_settings(logging)?,
        })
    }
}

fn build_api_settings(api: RawApiSettings) -> Result<ApiSettings, LoadError> {
    let provider = match api.provider {
        Some(value) => Provider::from_str(&value)
            .map_err(|reason| LoadError::invalid("api.provider", reason))?,
        None => Provider::Strapi,
    };

    let raw_url = api.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base_url = Url::parse(raw_url.trim()).map_err(|err| {
        LoadError::invalid("api.base_url", format!("invalid URL `{raw_url}`: {err}"))
    })?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "api.base_url",
            "scheme must be http or https",
        ));
    }

    let token = api.token.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let dataset = non_empty_string(api.dataset, DEFAULT_DATASET, "api.dataset")?;
    let api_version = non_empty_string(api.api_version, DEFAULT_API_VERSION, "api.api_version")?;

    let timeout_seconds = api.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_seconds == 0 {
        return Err(LoadError::invalid(
            "api.timeout_seconds",
            "must be greater than zero",
        ));
    }

    let page_size = non_zero_u32(api.page_size.unwrap_or(DEFAULT_PAGE_SIZE), "api.page_size")?;

    Ok(ApiSettings {
        provider,
        base_url,
        token,
        dataset,
        api_version,
        timeout: Duration::from_secs(timeout_seconds),
        page_size,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let ttl = Duration::from_secs(cache.ttl_seconds.unwrap_or(DEFAULT_TTL_SECS));

    let max_entries_value = cache.max_entries.unwrap_or(DEFAULT_MAX_ENTRIES);
    let max_entries = usize::try_from(max_entries_value)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| LoadError::invalid("cache.max_entries", "must be greater than zero"))?;

    Ok(CacheSettings { ttl, max_entries })
}

fn build_image_settings(images: RawImageSettings) -> Result<ImageSettings, LoadError> {
    let placeholder = non_empty_string(
        images.placeholder,
        DEFAULT_PLACEHOLDER,
        "images.placeholder",
    )?;
    let width = non_zero_u32(images.width.unwrap_or(DEFAULT_IMAGE_WIDTH), "images.width")?;

    let quality_value = images.quality.unwrap_or(DEFAULT_IMAGE_QUALITY);
    let quality = u8::try_from(quality_value)
        .ok()
        .filter(|quality| (1..=100).contains(quality))
        .ok_or_else(|| LoadError::invalid("images.quality", "must be between 1 and 100"))?;

    let preferred_format = images.preferred_format.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    Ok(ImageSettings {
        placeholder,
        optimize: images.optimize.unwrap_or(true),
        width,
        quality,
        preferred_format,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    provider: Option<String>,
    base_url: Option<String>,
    token: Option<String>,
    dataset: Option<String>,
    api_version: Option<String>,
    timeout_seconds: Option<u64>,
    page_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    ttl_seconds: Option<u64>,
    max_entries: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawImageSettings {
    placeholder: Option<String>,
    optimize: Option<bool>,
    width: Option<u64>,
    quality: Option<u64>,
    preferred_format: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

fn non_empty_string(
    value: Option<String>,
    default: &str,
    key: &'static str,
) -> Result<String, LoadError> {
    match value {
        None => Ok(default.to_string()),
        Some(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(LoadError::invalid(key, "must not be empty"));
            }
            Ok(trimmed.to_string())
        }
    }
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
