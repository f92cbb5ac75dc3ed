//! Run orchestration for the OI/MC alert service.
//!
//! [`JobRunner`] performs one check inside a failure boundary;
//! [`AlertScheduler`] triggers it every `interval_secs` and handles shutdown.

pub mod runner;
pub mod scheduler;

#[cfg(test)]
mod test_support;

pub use runner::JobRunner;
pub use scheduler::AlertScheduler;
