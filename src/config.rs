use anyhow::{Context, Result, anyhow};
use chrono::FixedOffset;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Service configuration sourced from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: Url,
    pub bind_addr: String,
    pub port: u16,
    pub slot_capacity: u32,
    pub reference_offset: FixedOffset,
    pub revalidate: Duration,
    pub session_idle: Duration,
    pub max_sessions: u64,
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_base = lookup("BOOKING_API").ok_or_else(|| anyhow!("BOOKING_API is not set"))?;
        let api_base = Url::parse(&raw_base).with_context(|| format!("parse BOOKING_API: {raw_base}"))?;

        let offset: String = try_load(&lookup, "REFERENCE_TZ_OFFSET", "+07:00")?;

        Ok(Self {
            api_base,
            bind_addr: try_load(&lookup, "BIND_ADDR", "0.0.0.0")?,
            port: try_load(&lookup, "PORT", "80")?,
            slot_capacity: try_load(&lookup, "SLOT_CAPACITY", "5")?,
            reference_offset: parse_offset(&offset)
                .with_context(|| format!("parse REFERENCE_TZ_OFFSET: {offset}"))?,
            revalidate: Duration::from_secs(try_load(&lookup, "REVALIDATE_SECS", "60")?),
            session_idle: Duration::from_secs(try_load(&lookup, "SESSION_IDLE_SECS", "1800")?),
            max_sessions: try_load(&lookup, "MAX_SESSIONS", "10000")?,
            upstream_timeout: Duration::from_secs(try_load(&lookup, "UPSTREAM_TIMEOUT_SECS", "30")?),
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim()
        .parse()
        .map_err(|e| anyhow!("invalid {key} value {raw:?}: {e}"))
}

/// `+07:00`, `-0330` or `Z`
fn parse_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(|| anyhow!("offset out of range"));
    }

    let (sign, rest) = match raw.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(anyhow!("offset must start with + or -")),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(anyhow!("offset must look like +HH:MM"));
    }

    let hours: i32 = digits[..2].parse()?;
    let minutes: i32 = digits[2..].parse()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| anyhow!("offset out of range"))
}
