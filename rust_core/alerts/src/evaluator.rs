use crate::cooldown::CooldownTracker;
use crate::rules::{AlertEvent, AlertKind, ChangeAlertRule, PriceAlertRule};
use chrono::{DateTime, Utc};
use connectors_common::types::{symbol_key, PriceSnapshot};
use connectors_common::BasePriceLookup;
use log::warn;

/// Simple relative change in percent. `None` when the base is not positive.
pub fn change_percent(current: f64, base: f64) -> Option<f64> {
    if base <= 0.0 {
        return None;
    }
    Some((current - base) / base * 100.0)
}

pub fn check_price_alerts(rules: &[PriceAlertRule], prices: &PriceSnapshot) -> Vec<AlertEvent> {
    let mut triggered = Vec::new();
    for rule in rules {
        let key = symbol_key(&rule.symbol);
        let price = match prices.get(&key) {
            Some(p) => *p,
            None => {
                warn!("{} missing from snapshot", key);
                continue;
            }
        };
        if rule.comparison.crossed(price, rule.threshold) {
            triggered.push(AlertEvent {
                symbol: rule.symbol.clone(),
                kind: AlertKind::Price,
                current_price: price,
                message: format!("{} ${:.2}", rule.comparison.describe(), rule.threshold),
            });
        }
    }
    triggered
}

/// Evaluates change rules against base prices from `lookup`.
///
/// A rule that fires claims its cooldown key right here, before anything is
/// sent, so a failed delivery still counts as fired for this window.
pub async fn check_change_alerts(
    rules: &[ChangeAlertRule],
    prices: &PriceSnapshot,
    lookup: &dyn BasePriceLookup,
    cooldown: &CooldownTracker,
    now: DateTime<Utc>,
) -> Vec<AlertEvent> {
    let mut triggered = Vec::new();
    for rule in rules {
        let key = symbol_key(&rule.symbol);
        let current = match prices.get(&key) {
            Some(p) => *p,
            None => continue,
        };
        let base = match lookup.base_price(&rule.symbol, rule.period).await {
            Ok(p) => p,
            Err(e) => {
                warn!("no {} base price for {}: {}", rule.period, rule.symbol, e);
                continue;
            }
        };
        let change = match change_percent(current, base) {
            Some(c) => c,
            None => continue,
        };
        if change.abs() < rule.change_percent {
            continue;
        }
        let alert_key = format!("{}_{}", key, rule.period);
        if !cooldown.try_acquire(&alert_key, now) {
            continue;
        }
        let direction = if change > 0.0 { "up" } else { "down" };
        triggered.push(AlertEvent {
            symbol: rule.symbol.clone(),
            kind: AlertKind::Change,
            current_price: current,
            message: format!(
                "{} {} {:.2}% (from ${:.2} to ${:.2})",
                rule.period,
                direction,
                change.abs(),
                base,
                current
            ),
        });
    }
    triggered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Comparison;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use connectors_common::types::Period;
    use connectors_common::ConnectorError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Fixed base prices; counts lookups so tests can see what was asked.
    #[derive(Default)]
    struct FixedBases {
        bases: HashMap<(String, Period), f64>,
        calls: Mutex<usize>,
    }

    impl FixedBases {
        fn with(mut self, symbol: &str, period: Period, price: f64) -> Self {
            self.bases.insert((symbol.to_string(), period), price);
            self
        }
    }

    #[async_trait]
    impl BasePriceLookup for FixedBases {
        async fn base_price(&self, symbol: &str, period: Period) -> Result<f64, ConnectorError> {
            *self.calls.lock().unwrap() += 1;
            self.bases
                .get(&(symbol.to_string(), period))
                .copied()
                .ok_or_else(|| ConnectorError::Exhausted(format!("{} {}", symbol, period)))
        }
    }

    fn snapshot(pairs: &[(&str, f64)]) -> PriceSnapshot {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn below(symbol: &str, threshold: f64) -> PriceAlertRule {
        PriceAlertRule { symbol: symbol.to_string(), threshold, comparison: Comparison::Below }
    }

    fn above(symbol: &str, threshold: f64) -> PriceAlertRule {
        PriceAlertRule { symbol: symbol.to_string(), threshold, comparison: Comparison::Above }
    }

    fn eth_daily(pct: f64) -> ChangeAlertRule {
        ChangeAlertRule { symbol: "ETH".to_string(), change_percent: pct, period: Period::Daily }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_change_percent() {
        assert_eq!(change_percent(210.0, 200.0), Some(5.0));
        assert_eq!(change_percent(190.0, 200.0), Some(-5.0));
        assert_eq!(change_percent(1.0, 0.0), None);
        assert_eq!(change_percent(1.0, -3.0), None);
    }

    #[test]
    fn test_below_rule_is_strict() {
        let rules = [below("BTC", 60000.0)];
        assert_eq!(check_price_alerts(&rules, &snapshot(&[("BTCUSDT", 59000.0)])).len(), 1);
        assert!(check_price_alerts(&rules, &snapshot(&[("BTCUSDT", 60000.0)])).is_empty());
        assert!(check_price_alerts(&rules, &snapshot(&[("BTCUSDT", 61000.0)])).is_empty());
    }

    #[test]
    fn test_above_rule_is_strict() {
        let rules = [above("BTC", 70000.0)];
        let fired = check_price_alerts(&rules, &snapshot(&[("BTCUSDT", 70001.0)]));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].message, "rose above $70000.00");
        assert!(check_price_alerts(&rules, &snapshot(&[("BTCUSDT", 70000.0)])).is_empty());
    }

    #[test]
    fn test_price_rule_message_and_fields() {
        let prices = snapshot(&[("BTCUSDT", 100.0)]);
        assert!(check_price_alerts(&[below("BTC", 100.0)], &prices).is_empty());

        let fired = check_price_alerts(&[below("BTC", 101.0)], &prices);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].symbol, "BTC");
        assert_eq!(fired[0].kind, AlertKind::Price);
        assert_eq!(fired[0].current_price, 100.0);
        assert_eq!(fired[0].message, "fell below $101.00");
        assert!(fired[0].to_string().contains("$100.00"));
    }

    #[test]
    fn test_missing_symbol_skips_only_that_rule() {
        let rules = [below("DOGE", 1.0), below("BTC", 101.0)];
        let fired = check_price_alerts(&rules, &snapshot(&[("BTCUSDT", 100.0)]));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].symbol, "BTC");
    }

    #[tokio::test]
    async fn test_change_threshold_is_inclusive() {
        let bases = FixedBases::default().with("ETH", Period::Daily, 200.0);
        let cooldown = CooldownTracker::new(Duration::minutes(5));
        let fired = check_change_alerts(&[eth_daily(5.0)], &snapshot(&[("ETHUSDT", 210.0)]), &bases, &cooldown, t0()).await;
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].kind, AlertKind::Change);
        assert_eq!(fired[0].message, "daily up 5.00% (from $200.00 to $210.00)");
        assert_eq!(cooldown.last_fired("ETHUSDT_daily"), Some(t0()));
    }

    #[tokio::test]
    async fn test_change_below_threshold_does_not_fire() {
        let bases = FixedBases::default().with("ETH", Period::Daily, 200.0);
        let cooldown = CooldownTracker::new(Duration::minutes(5));
        let fired = check_change_alerts(&[eth_daily(5.0)], &snapshot(&[("ETHUSDT", 209.0)]), &bases, &cooldown, t0()).await;
        assert!(fired.is_empty());
        assert_eq!(cooldown.last_fired("ETHUSDT_daily"), None);
    }

    #[tokio::test]
    async fn test_drop_uses_absolute_value() {
        let bases = FixedBases::default().with("ETH", Period::FifteenMinutes, 200.0);
        let cooldown = CooldownTracker::new(Duration::minutes(5));
        let rule = ChangeAlertRule { symbol: "ETH".to_string(), change_percent: 2.0, period: Period::FifteenMinutes };
        let fired = check_change_alerts(&[rule], &snapshot(&[("ETHUSDT", 190.0)]), &bases, &cooldown, t0()).await;
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].message, "15m down 5.00% (from $200.00 to $190.00)");
        assert!(cooldown.last_fired("ETHUSDT_15m").is_some());
    }

    #[tokio::test]
    async fn test_change_cooldown_per_key() {
        let bases = FixedBases::default().with("ETH", Period::Daily, 200.0);
        let cooldown = CooldownTracker::new(Duration::minutes(5));
        let rules = [eth_daily(5.0)];
        let prices = snapshot(&[("ETHUSDT", 220.0)]);

        assert_eq!(check_change_alerts(&rules, &prices, &bases, &cooldown, t0()).await.len(), 1);
        let again = check_change_alerts(&rules, &prices, &bases, &cooldown, t0() + Duration::seconds(1)).await;
        assert!(again.is_empty());
        let later = check_change_alerts(&rules, &prices, &bases, &cooldown, t0() + Duration::minutes(6)).await;
        assert_eq!(later.len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_failure_skips_rule() {
        let bases = FixedBases::default();
        let cooldown = CooldownTracker::new(Duration::minutes(5));
        let fired = check_change_alerts(&[eth_daily(0.1)], &snapshot(&[("ETHUSDT", 5000.0)]), &bases, &cooldown, t0()).await;
        assert!(fired.is_empty());
        assert_eq!(*bases.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_zero_base_is_guarded() {
        let bases = FixedBases::default().with("ETH", Period::Daily, 0.0);
        let cooldown = CooldownTracker::new(Duration::minutes(5));
        let fired = check_change_alerts(&[eth_daily(1.0)], &snapshot(&[("ETHUSDT", 10.0)]), &bases, &cooldown, t0()).await;
        assert!(fired.is_empty());
    }

    #[tokio::test]
    async fn test_missing_current_price_skips_lookup() {
        let bases = FixedBases::default().with("ETH", Period::Daily, 200.0);
        let cooldown = CooldownTracker::new(Duration::minutes(5));
        let fired = check_change_alerts(&[eth_daily(1.0)], &snapshot(&[("BTCUSDT", 1.0)]), &bases, &cooldown, t0()).await;
        assert!(fired.is_empty());
        assert_eq!(*bases.calls.lock().unwrap(), 0);
    }
}
