//! on-disk representation of connection parameters
//!
//! Every field is optional here; presence is checked when converting into
//! [`ConnectionParams`](crate::ConnectionParams).
use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, de};
use tracing::debug;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub root_path: Option<String>,
    #[serde(default)]
    pub session: Session,
}

impl Params {
    /// attempts to decode the file first as JSON, then YAML
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to find config at {}", path.display()))?;
        Self::parse_str(contents)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    /// attempts to decode the string first as JSON, then YAML
    pub fn parse_str<S: AsRef<str>>(s: S) -> Result<Self> {
        let s = s.as_ref();
        let raw: Params = match serde_json::from_str(s) {
            Ok(raw) => raw,
            Err(json_err) => serde_yaml::from_str(s).with_context(|| {
                format!("config is neither valid JSON ({json_err}) nor valid YAML")
            })?,
        };
        debug!(?raw);
        Ok(raw)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    #[serde(default, deserialize_with = "deserialize_optional_duration")]
    pub session_timeout: Option<Duration>,
    #[serde(default, deserialize_with = "deserialize_optional_duration")]
    pub connection_timeout: Option<Duration>,
    #[serde(default)]
    pub retry: Retry,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Retry {
    #[serde(default, deserialize_with = "deserialize_optional_duration")]
    pub base_sleep: Option<Duration>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_optional_duration")]
    pub max_sleep: Option<Duration>,
}

/// Parse a duration string with an optional unit.
/// Accepts: "1500", "1500ms", "15s", "2m". A bare number is milliseconds.
pub(crate) fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("empty duration string");
    }

    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (num, unit) = s.split_at(end);
    let num = num.parse::<u64>().context("invalid number")?;

    match unit.trim() {
        "" | "ms" => Ok(Duration::from_millis(num)),
        "s" => Ok(Duration::from_secs(num)),
        "m" => num
            .checked_mul(60)
            .map(Duration::from_secs)
            .context("duration value overflow"),
        other => anyhow::bail!("unknown time unit '{other}', only 'ms', 's' or 'm' are supported"),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireDuration {
    Millis(u64),
    String(String),
}

impl WireDuration {
    fn into_duration<E: de::Error>(self) -> Result<Duration, E> {
        match self {
            WireDuration::Millis(ms) => Ok(Duration::from_millis(ms)),
            WireDuration::String(s) => parse_duration(&s).map_err(E::custom),
        }
    }
}

fn deserialize_optional_duration<'de, D>(de: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<WireDuration>::deserialize(de)?
        .map(WireDuration::into_duration)
        .transpose()
}
