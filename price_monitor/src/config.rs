use alert_engine::{ChangeAlertRule, PriceAlertRule};
use connectors_common::endpoints::SYMBOL_PLACEHOLDER;
use connectors_common::ApiEndpoints;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// One day.
pub const MAX_CHECK_INTERVAL_SECONDS: u64 = 86_400;
/// One year.
pub const MAX_ALERT_COOLDOWN_MINUTES: i64 = 525_600;
pub const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 300;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyCfg {
    #[serde(rename = "NtfyUrl")]
    pub ntfy_url: String,
    #[serde(rename = "NtfyTopic", default)]
    pub ntfy_topic: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorCfg {
    #[serde(rename = "CheckIntervalSeconds")]
    pub check_interval_seconds: u64,
    #[serde(rename = "AlertCooldownMinutes")]
    pub alert_cooldown_minutes: i64,
    #[serde(rename = "RequestTimeoutSeconds")]
    pub request_timeout_seconds: u64,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        MonitorCfg {
            check_interval_seconds: 60,
            alert_cooldown_minutes: 30,
            request_timeout_seconds: 10,
        }
    }
}

/// Conversions clamp to the validated ranges, so an unvalidated value cannot
/// overflow a timer.
impl MonitorCfg {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds.min(MAX_CHECK_INTERVAL_SECONDS))
    }

    pub fn alert_cooldown(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.alert_cooldown_minutes.clamp(0, MAX_ALERT_COOLDOWN_MINUTES))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.min(MAX_REQUEST_TIMEOUT_SECONDS))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "Api", default)]
    pub api: ApiEndpoints,
    #[serde(rename = "Notify")]
    pub notify: NotifyCfg,
    #[serde(rename = "Monitor", default)]
    pub monitor: MonitorCfg,
    #[serde(rename = "PriceAlertRules", default)]
    pub price_alert_rules: Vec<PriceAlertRule>,
    #[serde(rename = "ChangeAlertRules", default)]
    pub change_alert_rules: Vec<ChangeAlertRule>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        let m = &self.monitor;
        if m.check_interval_seconds == 0 || m.check_interval_seconds > MAX_CHECK_INTERVAL_SECONDS {
            return invalid(format!(
                "CheckIntervalSeconds must be between 1 and {}",
                MAX_CHECK_INTERVAL_SECONDS
            ));
        }
        if !(0..=MAX_ALERT_COOLDOWN_MINUTES).contains(&m.alert_cooldown_minutes) {
            return invalid(format!(
                "AlertCooldownMinutes must be between 0 and {}",
                MAX_ALERT_COOLDOWN_MINUTES
            ));
        }
        if m.request_timeout_seconds == 0 || m.request_timeout_seconds > MAX_REQUEST_TIMEOUT_SECONDS {
            return invalid(format!(
                "RequestTimeoutSeconds must be between 1 and {}",
                MAX_REQUEST_TIMEOUT_SECONDS
            ));
        }
        if self.notify.ntfy_url.trim().is_empty() {
            return invalid("NtfyUrl is empty".to_string());
        }

        let urls = [
            ("BinanceUrl", &self.api.binance_url),
            ("BinanceKlineUrl", &self.api.binance_kline_url),
            ("BybitUrl", &self.api.bybit_url),
            ("BybitKlineUrl", &self.api.bybit_kline_url),
        ];
        for (name, url) in urls {
            if url.trim().is_empty() {
                return invalid(format!("{} is empty", name));
            }
        }
        let templates = [
            ("CoinbaseUrlTemplate", &self.api.coinbase_url_template),
            ("KrakenUrlTemplate", &self.api.kraken_url_template),
        ];
        for (name, template) in templates {
            if !template.contains(SYMBOL_PLACEHOLDER) {
                return invalid(format!("{} has no {} placeholder", name, SYMBOL_PLACEHOLDER));
            }
        }

        for rule in &self.price_alert_rules {
            if rule.symbol.trim().is_empty() {
                return invalid("price alert rule with empty Symbol".to_string());
            }
            if !rule.threshold.is_finite() || rule.threshold <= 0.0 {
                return invalid(format!("{} Threshold must be a positive number", rule.symbol));
            }
        }
        for rule in &self.change_alert_rules {
            if rule.symbol.trim().is_empty() {
                return invalid("change alert rule with empty Symbol".to_string());
            }
            if !rule.change_percent.is_finite() || rule.change_percent <= 0.0 {
                return invalid(format!("{} ChangePercent must be a positive number", rule.symbol));
            }
        }
        Ok(())
    }

    /// Base assets referenced by any rule, sorted and deduplicated.
    pub fn monitored_symbols(&self) -> Vec<String> {
        self.price_alert_rules
            .iter()
            .map(|r| r.symbol.clone())
            .chain(self.change_alert_rules.iter().map(|r| r.symbol.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
