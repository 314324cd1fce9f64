use crate::model::holiday::Region;
use crate::model::role::Role;
use anyhow::{Context, Result, bail};
use dotenvy::dotenv;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum StorageBackend {
    Mysql,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    // Calendar and leave accounting
    pub privileged_roles: Vec<Role>,
    pub default_region: Region,
    pub hours_per_working_day: Decimal,
    pub category_cache_ttl: Duration,

    pub log_dir: String,
    pub log_level: String,
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
}

fn parse_roles(raw: &str) -> Result<Vec<Role>> {
    raw.split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(|role| {
            Role::from_str(&role.to_lowercase())
                .with_context(|| format!("PRIVILEGED_ROLES contains unknown role '{}'", role))
        })
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let storage_backend: StorageBackend = parsed(&lookup, "STORAGE_BACKEND", "mysql")?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if storage_backend == StorageBackend::Mysql && database_url.is_none() {
            bail!("DATABASE_URL must be set when STORAGE_BACKEND=mysql");
        }

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .context("JWT_SECRET must be set")?;

        let privileged_roles =
            parse_roles(&lookup("PRIVILEGED_ROLES").unwrap_or_else(|| "office,boss".to_string()))?;

        let hours_per_working_day: Decimal = parsed(&lookup, "HOURS_PER_WORKING_DAY", "8")?;
        if hours_per_working_day <= Decimal::ZERO {
            bail!("HOURS_PER_WORKING_DAY must be positive");
        }

        Ok(Self {
            server_addr: lookup("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            storage_backend,
            database_url,
            jwt_secret,
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            rate_protected_per_min: parsed(&lookup, "RATE_PROTECTED_PER_MIN", "1000")?,
            privileged_roles,
            default_region: Region::new(
                &lookup("DEFAULT_REGION")
                    .unwrap_or_else(|| "GERMANY_BADEN_WUERTTEMBERG".to_string()),
            ),
            hours_per_working_day,
            category_cache_ttl: Duration::from_secs(parsed(
                &lookup,
                "CATEGORY_CACHE_TTL_SECS",
                "300",
            )?),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}
