pub mod cooldown;
pub mod evaluator;
pub mod rules;

pub use cooldown::{CooldownTracker, PriceAlertGate};
pub use evaluator::{change_percent, check_change_alerts, check_price_alerts};
pub use rules::{AlertEvent, AlertKind, ChangeAlertRule, Comparison, PriceAlertRule};
