//! Alert delivery channels.
//!
//! [`TelegramNotifier`] posts to a chat through the Bot API; [`LogNotifier`]
//! only logs the message.

pub mod log_notifier;
pub mod telegram;

pub use log_notifier::LogNotifier;
pub use telegram::{TelegramNotifier, TELEGRAM_API_URL};
