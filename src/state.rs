use std::sync::Arc;

use crate::config::Config;
use crate::domain::ports::{
    CustomerRepository, NotificationLogRepository, ReminderDefinitionRepository, ReservationRepository,
    ScheduleRepository, SettingsRepository,
};
use crate::domain::services::{
    channel_registry::ChannelRegistry,
    notification_dispatcher::NotificationDispatcher,
    reminder_scheduler::ReminderScheduler,
    reservation_engine::ReservationEngine,
    retry::RetryPolicy,
    schedule_service::ScheduleService,
    settings_service::SettingsService,
};
use crate::infra::memory::MemoryStore;

/// One storage backend, as a set of ports.
#[derive(Clone)]
pub struct Repositories {
    pub schedules: Arc<dyn ScheduleRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
    pub reminders: Arc<dyn ReminderDefinitionRepository>,
    pub notifications: Arc<dyn NotificationLogRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Repositories {
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            schedules: store.clone(),
            customers: store.clone(),
            reservations: store.clone(),
            reminders: store.clone(),
            notifications: store.clone(),
            settings: store,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// True when running on placeholder in-memory data.
    pub degraded: bool,
    pub schedule_repo: Arc<dyn ScheduleRepository>,
    pub customer_repo: Arc<dyn CustomerRepository>,
    pub reservation_repo: Arc<dyn ReservationRepository>,
    pub reminder_repo: Arc<dyn ReminderDefinitionRepository>,
    pub notification_repo: Arc<dyn NotificationLogRepository>,
    pub settings_service: Arc<SettingsService>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub schedule_service: Arc<ScheduleService>,
    pub reservation_engine: Arc<ReservationEngine>,
    pub reminder_scheduler: Arc<ReminderScheduler>,
}

impl AppState {
    pub fn new(config: Config, repos: Repositories, channels: ChannelRegistry, degraded: bool) -> Self {
        let settings_service = Arc::new(SettingsService::new(repos.settings.clone()));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            Arc::new(channels),
            repos.notifications.clone(),
            config.channel_timeout,
            RetryPolicy::new(config.channel_max_attempts, config.channel_initial_backoff),
        ));

        let schedule_service = Arc::new(ScheduleService::new(repos.schedules.clone()));
        let reservation_engine = Arc::new(ReservationEngine::new(
            repos.customers.clone(),
            repos.reservations.clone(),
            dispatcher.clone(),
            settings_service.clone(),
        ));
        let reminder_scheduler = Arc::new(ReminderScheduler::new(
            repos.reminders.clone(),
            repos.reservations.clone(),
            dispatcher.clone(),
            settings_service.clone(),
            config.studio_timezone,
            config.send_delay,
            degraded,
        ));

        Self {
            config,
            degraded,
            schedule_repo: repos.schedules,
            customer_repo: repos.customers,
            reservation_repo: repos.reservations,
            reminder_repo: repos.reminders,
            notification_repo: repos.notifications,
            settings_service,
            dispatcher,
            schedule_service,
            reservation_engine,
            reminder_scheduler,
        }
    }
}
