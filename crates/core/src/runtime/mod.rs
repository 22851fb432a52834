mod scheduler;
mod shutdown;

pub use scheduler::{NOTIFY_TIMEOUT, POLL_INTERVAL, Runtime, TickReport};
pub use shutdown::ShutdownGuard;
