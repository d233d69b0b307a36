use crate::model::attendance::{ShiftPolicy, parse_clock};
use anyhow::{Context, Result, bail};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    /// `None` => in-memory repositories
    pub database_url: Option<String>,
    pub api_prefix: String,
    pub log_dir: String,

    // Rate limiting
    pub rate_api_per_min: u32,
    pub rate_upload_per_min: u32,

    // Terminals
    pub device_timeout: Duration,
    pub log_sync_interval: Duration,
    pub directory_sync_interval: Duration,
    pub user_info_batch_width: usize,

    pub shift: ShiftPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "0.0.0.0:3001".to_string(),
            database_url: None,
            api_prefix: "/api".to_string(),
            log_dir: "logs".to_string(),
            rate_api_per_min: 1000,
            rate_upload_per_min: 600,
            device_timeout: Duration::from_secs(15),
            log_sync_interval: Duration::from_secs(300),
            directory_sync_interval: Duration::ZERO,
            user_info_batch_width: 5,
            shift: ShiftPolicy::default(),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

fn clock(key: &str, default: u32) -> Result<u32> {
    match var(key) {
        Some(raw) => parse_clock(&raw).with_context(|| format!("{key} must be HH:MM, got {raw:?}")),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let defaults = Config::default();

        let shift = ShiftPolicy {
            work_start: clock("WORK_START", defaults.shift.work_start)?,
            work_end: clock("WORK_END", defaults.shift.work_end)?,
            early_arrival_credit_cap_minutes: parsed(
                "EARLY_ARRIVAL_CREDIT_CAP_MINUTES",
                defaults.shift.early_arrival_credit_cap_minutes,
            )?,
        };
        if shift.work_start >= shift.work_end {
            bail!("WORK_START must be before WORK_END");
        }

        let timeout_secs: u64 = parsed("DEVICE_TIMEOUT_SECS", defaults.device_timeout.as_secs())?;

        Ok(Self {
            server_addr: var("SERVER_ADDR").unwrap_or(defaults.server_addr),
            database_url: var("DATABASE_URL"),
            api_prefix: var("API_PREFIX").unwrap_or(defaults.api_prefix),
            log_dir: var("LOG_DIR").unwrap_or(defaults.log_dir),

            rate_api_per_min: parsed("RATE_API_PER_MIN", defaults.rate_api_per_min)?,
            rate_upload_per_min: parsed("RATE_UPLOAD_PER_MIN", defaults.rate_upload_per_min)?,

            device_timeout: Duration::from_secs(timeout_secs.clamp(1, 60)),
            log_sync_interval: Duration::from_secs(parsed(
                "LOG_SYNC_INTERVAL_SECS",
                defaults.log_sync_interval.as_secs(),
            )?),
            directory_sync_interval: Duration::from_secs(parsed(
                "DIRECTORY_SYNC_INTERVAL_SECS",
                defaults.directory_sync_interval.as_secs(),
            )?),
            user_info_batch_width: parsed("USER_INFO_BATCH_WIDTH", defaults.user_info_batch_width)?
                .max(1),

            shift,
        })
    }
}
