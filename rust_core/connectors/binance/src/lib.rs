pub mod rest;

pub const NAME: &str = "Binance";
