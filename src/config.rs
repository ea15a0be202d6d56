use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    // Employee display cache
    pub employee_cache_capacity: u64,
    pub employee_cache_ttl: Duration,

    pub log_dir: String,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn optional<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            rate_protected_per_min: optional("RATE_PROTECTED_PER_MIN", 1000)?,

            employee_cache_capacity: optional("EMPLOYEE_CACHE_CAPACITY", 10_000)?,
            employee_cache_ttl: Duration::from_secs(optional("EMPLOYEE_CACHE_TTL_SECS", 300)?),

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: "mysql://unused".into(),
            jwt_secret: jwt_secret.into(),
            server_addr: "127.0.0.1:0".into(),
            api_prefix: "/api".into(),
            rate_protected_per_min: 1000,
            employee_cache_capacity: 100,
            employee_cache_ttl: Duration::from_secs(60),
            log_dir: "logs".into(),
        }
    }
}
