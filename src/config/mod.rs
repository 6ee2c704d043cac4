//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroU32, path::PathBuf, str::FromStr};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::bootstrap::ScanConfig;
use crate::infra::imgbb::DEFAULT_ENDPOINT as DEFAULT_IMAGE_HOST_ENDPOINT;

mod cli;

pub use cli::*;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "postdeck";
const DEFAULT_REST_PATH: &str = "rest/v1";
const DEFAULT_TABLE: &str = "posts";
const DEFAULT_PAGE_SIZE: u64 = 10;
const DEFAULT_SCANNER_FPS: u64 = 10;
const DEFAULT_QRBOX_SIDE: u32 = 240;
const CREDENTIALS_FILE_NAME: &str = "credentials.json";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub credentials: CredentialSettings,
    pub data_store: DataStoreSettings,
    pub image_host: ImageHostSettings,
    pub scanner: ScannerSettings,
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

#[derive(Debug, Clone)]
pub struct CredentialSettings {
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DataStoreSettings {
    pub rest_path: String,
    pub table: String,
    pub page_size: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct ImageHostSettings {
    pub endpoint: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ScannerSettings {
    pub fps: NonZeroU32,
    pub qrbox_width: u32,
    pub qrbox_height: u32,
}

impl ScannerSettings {
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            fps: self.fps,
            qrbox_width: self.qrbox_width,
            qrbox_height: self.qrbox_height,
        }
    }
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

    builder = builder.add_source(Environment::with_prefix("POSTDECK").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_cli_overrides(cli);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    credentials: RawCredentialSettings,
    data_store: RawDataStoreSettings,
    image_host: RawImageHostSettings,
    scanner: RawScannerSettings,
}

impl RawSettings {
    fn apply_cli_overrides(&mut self, cli: &CliArgs) {
        if let Some(level) = cli.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = cli.log_json {
            self.logging.json = Some(json);
        }
        if let Some(path) = cli.credentials_file.as_ref() {
            self.credentials.path = Some(path.clone());
        }
        if let Some(size) = cli.page_size {
            self.data_store.page_size = Some(u64::from(size));
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            credentials,
            data_store,
            image_host,
            scanner,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            credentials: build_credential_settings(credentials)?,
            data_store: build_data_store_settings(data_store)?,
            image_host: build_image_host_settings(image_host)?,
            scanner: build_scanner_settings(scanner)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::WARN,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_credential_settings(
    credentials: RawCredentialSettings,
) -> Result<CredentialSettings, LoadError> {
    let path = match credentials.path {
        Some(path) if !path.as_os_str().is_empty() => path,
        _ => dirs::config_dir()
            .map(|dir| dir.join("postdeck").join(CREDENTIALS_FILE_NAME))
            .ok_or_else(|| {
                LoadError::invalid(
                    "credentials.path",
                    "no platform config directory; set a credentials file explicitly",
                )
            })?,
    };
    Ok(CredentialSettings { path })
}

fn build_data_store_settings(
    data_store: RawDataStoreSettings,
) -> Result<DataStoreSettings, LoadError> {
    let rest_path = non_blank(data_store.rest_path).unwrap_or_else(|| DEFAULT_REST_PATH.into());
    let table = non_blank(data_store.table).unwrap_or_else(|| DEFAULT_TABLE.into());
    if table.contains('/') {
        return Err(LoadError::invalid(
            "data_store.table",
            "must be a single path segment",
        ));
    }
    let page_size = non_zero_u32(
        data_store.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        "data_store.page_size",
    )?;

    Ok(DataStoreSettings {
        rest_path,
        table,
        page_size,
    })
}

fn build_image_host_settings(
    image_host: RawImageHostSettings,
) -> Result<ImageHostSettings, LoadError> {
    let endpoint =
        non_blank(image_host.endpoint).unwrap_or_else(|| DEFAULT_IMAGE_HOST_ENDPOINT.into());
    url::Url::parse(&endpoint)
        .map_err(|err| LoadError::invalid("image_host.endpoint", err.to_string()))?;
    Ok(ImageHostSettings { endpoint })
}

fn build_scanner_settings(scanner: RawScannerSettings) -> Result<ScannerSettings, LoadError> {
    let fps = non_zero_u32(scanner.fps.unwrap_or(DEFAULT_SCANNER_FPS), "scanner.fps")?;
    let qrbox_width = scanner.qrbox_width.unwrap_or(DEFAULT_QRBOX_SIDE);
    let qrbox_height = scanner.qrbox_height.unwrap_or(DEFAULT_QRBOX_SIDE);
    if qrbox_width == 0 || qrbox_height == 0 {
        return Err(LoadError::invalid(
            "scanner.qrbox",
            "scan box dimensions must be greater than zero",
        ));
    }

    Ok(ScannerSettings {
        fps,
        qrbox_width,
        qrbox_height,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCredentialSettings {
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDataStoreSettings {
    rest_path: Option<String>,
    table: Option<String>,
    page_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawImageHostSettings {
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawScannerSettings {
    fps: Option<u64>,
    qrbox_width: Option<u32>,
    qrbox_height: Option<u32>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
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

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
