//! Background jobs driven by `tokio-cron-scheduler`.

pub mod log_retention;
pub mod scheduler;

pub use log_retention::LogRetentionJob;
pub use scheduler::JobScheduler;
