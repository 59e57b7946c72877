pub mod rest;

pub const NAME: &str = "Bybit";
