//! Battery monitor core: episode tracking, the decision engine and the poll
//! loop that drives notifications and emergency shutdown.

pub mod config;
pub mod engine;
pub mod environment;
pub mod runtime;
pub mod types;

pub use battmon_notify as notify;
