pub mod event_monitor;
pub mod notifier;
pub mod signal_monitor;
pub mod telegram_service;
