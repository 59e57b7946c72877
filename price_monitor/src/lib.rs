pub mod config;
pub mod monitor;
pub mod notifier;

pub use config::{Config, ConfigError};
pub use monitor::{Delivery, Monitor, TickReport};
pub use notifier::{Notifier, NotifyError, NtfyNotifier};
