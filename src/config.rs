use std::time::Duration;

use anyhow::Context;
use jsonwebtoken::Algorithm;

use crate::auth::password::PASSWORD_WORK_FACTOR;

pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://hoques-portfolio.web.app";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the service on the in-memory stores.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub allowed_origins: Vec<String>,
    pub password_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = std::env::var("PORT")
            .or_else(|_| std::env::var("APP_PORT"))
            .unwrap_or_else(|_| "5000".into())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let algorithm = match std::env::var("JWT_ALGORITHM") {
            Ok(raw) => parse_hmac_algorithm(&raw)?,
            Err(_) => Algorithm::HS256,
        };
        let ttl = std::env::var("JWT_EXPIRES_IN")
            .or_else(|_| std::env::var("EXPIRES_IN"))
            .unwrap_or_else(|_| "1h".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is required")?,
            algorithm,
            ttl: parse_duration(&ttl).with_context(|| format!("invalid JWT_EXPIRES_IN {ttl:?}"))?,
        };

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .map(|v| split_origins(&v))
            .unwrap_or_else(|_| vec![DEFAULT_ALLOWED_ORIGIN.to_string()]);

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            jwt,
            allowed_origins,
            password_cost: std::env::var("PASSWORD_HASH_COST")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(PASSWORD_WORK_FACTOR),
        })
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

/// Tokens are signed with a shared secret, so only the HMAC family is accepted.
fn parse_hmac_algorithm(raw: &str) -> anyhow::Result<Algorithm> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => anyhow::bail!("unsupported JWT_ALGORITHM {other:?}; expected HS256, HS384 or HS512"),
    }
}

/// Parses token lifetimes such as `3600`, `90s`, `15m`, `1h`, `7d` or `2 days`.
/// A bare number is a count of seconds.
pub fn parse_duration(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let value: u64 = digits
        .parse()
        .with_context(|| format!("missing amount in duration {raw:?}"))?;

    let secs_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => {
            return Ok(Duration::from_millis(value))
        }
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 60 * 60,
        "d" | "day" | "days" => 24 * 60 * 60,
        "w" | "week" | "weeks" => 7 * 24 * 60 * 60,
        other => anyhow::bail!("unknown duration unit {other:?}"),
    };
    let secs = value
        .checked_mul(secs_per_unit)
        .with_context(|| format!("duration {raw:?} overflows"))?;
    Ok(Duration::from_secs(secs))
}
