pub mod lottery_service;

pub use lottery_service::{LotteryReport, LotteryService};
