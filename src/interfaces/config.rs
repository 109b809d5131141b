use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;

use crate::application::usecases::{RunSettings, DEFAULT_MAX_BODY_CHARS};
use crate::domain::{InvalidRecordPolicy, MarkerStyle};
use crate::infrastructure::http_feed_source::DEFAULT_FEED_URL;
use crate::infrastructure::smtp_notifier::SmtpSettings;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub feed: FeedCfg,
    #[serde(default)]
    pub invalid_records: InvalidRecordPolicy,
    #[serde(default)]
    pub storage: StorageCfg,
    #[serde(default)]
    pub notification: NotificationCfg,
}

#[derive(Debug, Deserialize)]
pub struct FeedCfg {
    #[serde(default = "default_feed_url")]
    pub url: String,
    #[serde(default = "default_envelope_key")]
    pub envelope_key: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for FeedCfg {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            envelope_key: default_envelope_key(),
            timeout_seconds: default_timeout(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum StorageCfg {
    #[serde(rename = "fs")]
    Fs { root: String },

    #[serde(rename = "sqlite")]
    Sqlite { url: String },

    #[serde(rename = "memory")]
    Memory,
}

impl Default for StorageCfg {
    fn default() -> Self {
        StorageCfg::Fs {
            root: "./state".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NotificationCfg {
    #[serde(default)]
    pub marker_style: MarkerStyle,
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
    #[serde(default = "default_subject_tag")]
    pub subject_tag: String,
    #[serde(default = "default_max_body_chars")]
    pub max_body_chars: usize,
    #[serde(default = "default_part_delay")]
    pub part_delay_seconds: u64,
    pub smtp: Option<SmtpSettings>,
}

impl Default for NotificationCfg {
    fn default() -> Self {
        Self {
            marker_style: MarkerStyle::default(),
            subject_prefix: default_subject_prefix(),
            subject_tag: default_subject_tag(),
            max_body_chars: default_max_body_chars(),
            part_delay_seconds: default_part_delay(),
            smtp: None,
        }
    }
}

fn default_poll_interval() -> u64 {
    900
}
fn default_timezone() -> String {
    "Europe/Berlin".to_string()
}
fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}
fn default_envelope_key() -> String {
    "index".to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_subject_prefix() -> String {
    "PolDatenbank".to_string()
}
fn default_subject_tag() -> String {
    "#polizeistressiupdates".to_string()
}
fn default_max_body_chars() -> usize {
    DEFAULT_MAX_BODY_CHARS
}
fn default_part_delay() -> u64 {
    10
}

impl Config {
    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        let raw = expand_env(raw);
        let cfg: Config = serde_yaml::from_str(&raw)?;
        Ok(cfg)
    }

    pub fn timezone(&self) -> anyhow::Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("unknown timezone {:?}: {e}", self.timezone))
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed.timeout_seconds)
    }

    pub fn part_delay(&self) -> Duration {
        Duration::from_secs(self.notification.part_delay_seconds)
    }

    pub fn to_run_settings(&self) -> anyhow::Result<RunSettings> {
        Ok(RunSettings {
            envelope_key: self.feed.envelope_key.clone(),
            invalid_records: self.invalid_records,
            marker_style: self.notification.marker_style,
            timezone: self.timezone()?,
            subject_prefix: self.notification.subject_prefix.clone(),
            subject_tag: self.notification.subject_tag.clone(),
        })
    }
}

/// very small ${VAR} expansion to keep config simple
fn expand_env(s: &str) -> String {
    let mut out = s.to_string();
    for (k, v) in std::env::vars() {
        out = out.replace(&format!("${{{}}}", k), &v);
    }
    out
}
