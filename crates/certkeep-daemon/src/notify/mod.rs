//! Expiry notifications: picking what is due, delivering it, scheduling the
//! daily sweep.

pub mod selector;
pub mod sender;
pub mod sweep;

pub use selector::{DueNotification, EXPIRY_THRESHOLDS_DAYS, due_notifications};
pub use sender::{DeliveryError, MessageSender, TelegramClient};
pub use sweep::{SweepReport, run_sweep, spawn_daily_sweep};
