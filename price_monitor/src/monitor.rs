use crate::config::Config;
use crate::notifier::{Notifier, NtfyNotifier};
use aggregator::{HistoricalResolver, PriceAggregator, PriceSource};
use alert_engine::{
    change_percent, check_change_alerts, check_price_alerts, AlertEvent, CooldownTracker, PriceAlertGate,
};
use chrono::{DateTime, Utc};
use connectors_common::types::{symbol_key, Period, PriceSnapshot};
use connectors_common::HttpTransport;
use log::{error, info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// What happened to one batch of alerts during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Nothing,
    Sent,
    Suppressed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct TickReport {
    pub source: Option<PriceSource>,
    pub price_alerts: Vec<AlertEvent>,
    pub price_delivery: Delivery,
    pub change_alerts: Vec<AlertEvent>,
    pub change_delivery: Delivery,
}

impl TickReport {
    fn no_data() -> Self {
        TickReport {
            source: None,
            price_alerts: Vec::new(),
            price_delivery: Delivery::Nothing,
            change_alerts: Vec::new(),
            change_delivery: Delivery::Nothing,
        }
    }
}

/// Everything one monitoring loop owns: rules, sources, notifier and cooldown state.
pub struct Monitor {
    config: Config,
    symbols: Vec<String>,
    aggregator: PriceAggregator,
    resolver: HistoricalResolver,
    notifier: Box<dyn Notifier>,
    change_cooldown: CooldownTracker,
    price_gate: PriceAlertGate,
}

impl Monitor {
    pub fn new(config: Config, transport: Arc<dyn HttpTransport>) -> Self {
        let notifier = NtfyNotifier::new(transport.clone(), &config.notify.ntfy_url);
        Self::with_notifier(config, transport, Box::new(notifier))
    }

    pub fn with_notifier(config: Config, transport: Arc<dyn HttpTransport>, notifier: Box<dyn Notifier>) -> Self {
        let cooldown = config.monitor.alert_cooldown();
        Monitor {
            symbols: config.monitored_symbols(),
            aggregator: PriceAggregator::new(transport.clone(), config.api.clone()),
            resolver: HistoricalResolver::new(transport, config.api.clone()),
            notifier,
            change_cooldown: CooldownTracker::new(cooldown),
            price_gate: PriceAlertGate::new(cooldown),
            config,
        }
    }

    pub fn change_cooldown(&self) -> &CooldownTracker {
        &self.change_cooldown
    }

    pub fn log_rules(&self) {
        info!("push topic: {}", self.config.notify.ntfy_topic);
        info!("check interval: {:?}", self.config.monitor.check_interval());
        info!("price alert rules:");
        for rule in &self.config.price_alert_rules {
            info!("  - {} {} ${:.2}", rule.symbol, rule.comparison.as_str(), rule.threshold);
        }
        info!("change alert rules:");
        for rule in &self.config.change_alert_rules {
            info!("  - {} {} change beyond {:.1}%", rule.symbol, rule.period, rule.change_percent);
        }
    }

    /// One pass of fetch, evaluate, notify, log. Never fails; every problem is
    /// logged and degrades to skipping that piece of work.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickReport {
        let snapshot = match self.aggregator.get_all_prices(&self.symbols).await {
            Some(s) => s,
            None => return TickReport::no_data(),
        };
        let prices = &snapshot.prices;

        let price_alerts = check_price_alerts(&self.config.price_alert_rules, prices);
        let change_alerts = check_change_alerts(
            &self.config.change_alert_rules,
            prices,
            &self.resolver,
            &self.change_cooldown,
            now,
        )
        .await;

        let price_delivery = self.deliver_price_alerts(&price_alerts, now).await;

        // change alerts already claimed their cooldown keys; a failed send is not retried
        let change_delivery = if change_alerts.is_empty() {
            Delivery::Nothing
        } else {
            match self.notifier.send(&change_alerts).await {
                Ok(()) => {
                    info!("sent {} change alert(s)", change_alerts.len());
                    Delivery::Sent
                }
                Err(e) => {
                    error!("sending change alerts failed: {}", e);
                    Delivery::Failed
                }
            }
        };

        info!("{}", self.price_summary(prices).await);

        TickReport {
            source: Some(snapshot.source),
            price_alerts,
            price_delivery,
            change_alerts,
            change_delivery,
        }
    }

    async fn deliver_price_alerts(&self, alerts: &[AlertEvent], now: DateTime<Utc>) -> Delivery {
        if alerts.is_empty() {
            return Delivery::Nothing;
        }
        if let Some(remaining) = self.price_gate.remaining(now) {
            info!("price alerts cooling down, {}s left", remaining.num_seconds());
            return Delivery::Suppressed;
        }
        match self.notifier.send(alerts).await {
            Ok(()) => {
                self.price_gate.mark_sent(now);
                info!("sent {} price alert(s)", alerts.len());
                Delivery::Sent
            }
            Err(e) => {
                error!("sending price alerts failed: {}", e);
                Delivery::Failed
            }
        }
    }

    /// One line per monitored symbol with its daily and 15m change where known.
    pub async fn price_summary(&self, prices: &PriceSnapshot) -> String {
        let mut parts = Vec::new();
        for symbol in &self.symbols {
            let price = match prices.get(&symbol_key(symbol)) {
                Some(p) => *p,
                None => continue,
            };
            let daily = self
                .resolver
                .get_historical_price(symbol, Period::Daily)
                .await
                .ok()
                .and_then(|base| change_percent(price, base));
            let quarter = self
                .resolver
                .get_historical_price(symbol, Period::FifteenMinutes)
                .await
                .ok()
                .and_then(|base| change_percent(price, base));
            parts.push(match (daily, quarter) {
                (Some(d), Some(q)) => format!("{}: ${:.2} {}{:.2}%(daily) {:.2}%(15m)", symbol, price, arrow(d), d, q),
                (Some(d), None) => format!("{}: ${:.2} {}{:.2}%", symbol, price, arrow(d), d),
                _ => format!("{}: ${:.2}", symbol, price),
            });
        }
        parts.join(" | ")
    }

    /// Ticks every `CheckIntervalSeconds` until `shutdown` resolves. A tick that
    /// overruns delays the next one instead of overlapping it.
    pub async fn run<F: Future<Output = ()>>(&self, shutdown: F) {
        let period = self.config.monitor.check_interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.tick(Utc::now()).await;
                    if report.source.is_none() {
                        warn!("no price data this tick");
                    }
                }
                _ = &mut shutdown => {
                    info!("shutting down monitor");
                    break;
                }
            }
        }
    }
}

fn arrow(change: f64) -> &'static str {
    if change > 0.0 {
        "↑"
    } else if change < 0.0 {
        "↓"
    } else {
        "→"
    }
}
