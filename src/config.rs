use std::env;
use std::str::FromStr;

use anyhow::{Context, anyhow, bail};
use dotenvy::dotenv;
use strum::{AsRefStr, Display, EnumString};

/// Upper bound for the default report window, about ten years.
const MAX_REPORT_WINDOW_DAYS: i64 = 3650;

/// Where rows are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum DataStoreKind {
    Mysql,
    Memory,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub data_store: DataStoreKind,
    /// Required for the MySQL store only.
    pub database_url: Option<String>,
    pub jwt_secret: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub report_window_days: i64,

    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let data_store = parse::<DataStoreKind>("DATA_STORE", &or_default("DATA_STORE", "mysql"))?;
        let database_url = lookup("DATABASE_URL");
        if data_store == DataStoreKind::Mysql && database_url.is_none() {
            bail!("DATABASE_URL must be set when DATA_STORE=mysql");
        }

        let report_window_days: i64 =
            parse("REPORT_WINDOW_DAYS", &or_default("REPORT_WINDOW_DAYS", "30"))?;
        if !(0..=MAX_REPORT_WINDOW_DAYS).contains(&report_window_days) {
            bail!("REPORT_WINDOW_DAYS must be between 0 and {MAX_REPORT_WINDOW_DAYS}");
        }

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            data_store,
            database_url,
            jwt_secret: required("JWT_SECRET")?,
            rate_protected_per_min: parse(
                "RATE_PROTECTED_PER_MIN",
                &or_default("RATE_PROTECTED_PER_MIN", "1000"),
            )?,
            api_prefix: or_default("API_PREFIX", "/api"),
            report_window_days,
            log_dir: or_default("LOG_DIR", "logs"),
            log_level: parse("LOG_LEVEL", &or_default("LOG_LEVEL", "debug"))?,
        })
    }
}

fn parse<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("invalid value {raw:?} for {key}"))
}
