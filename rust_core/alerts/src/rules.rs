use connectors_common::types::Period;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "<", alias = "below")]
    Below,
    #[serde(rename = ">", alias = "above")]
    Above,
}

impl Comparison {
    /// Strict: a price sitting exactly on the threshold never triggers.
    pub fn crossed(&self, price: f64, threshold: f64) -> bool {
        match self {
            Comparison::Below => price < threshold,
            Comparison::Above => price > threshold,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Below => "<",
            Comparison::Above => ">",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Comparison::Below => "fell below",
            Comparison::Above => "rose above",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlertRule {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Threshold")]
    pub threshold: f64,
    #[serde(rename = "Comparison")]
    pub comparison: Comparison,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeAlertRule {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    /// Percent, e.g. `5.0` for 5 %.
    #[serde(rename = "ChangePercent")]
    pub change_percent: f64,
    #[serde(rename = "Period")]
    pub period: Period,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Price,
    Change,
}

impl AlertKind {
    pub fn emoji(&self) -> &'static str {
        match self {
            AlertKind::Price => "💰",
            AlertKind::Change => "📈",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub symbol: String,
    pub kind: AlertKind,
    pub current_price: f64,
    pub message: String,
}

impl fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}\nCurrent: ${:.2}",
            self.kind.emoji(),
            self.symbol,
            self.message,
            self.current_price
        )
    }
}
