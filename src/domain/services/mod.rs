pub mod channel_registry;
pub mod notification_dispatcher;
pub mod recurrence;
pub mod reminder_scheduler;
pub mod reservation_engine;
pub mod retry;
pub mod schedule_service;
pub mod settings_service;
pub mod template;
