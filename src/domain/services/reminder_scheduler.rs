use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{error, info, info_span, warn, Instrument};

use crate::domain::models::{
    notification::NotificationType,
    reminder::{check_hours_before, ReminderScheduleDefinition},
    reservation::ReservationDetail,
};
use crate::domain::ports::{ReminderDefinitionRepository, ReservationRepository};
use crate::domain::services::notification_dispatcher::{
    idempotency_key, DispatchOutcome, DispatchRequest, NotificationDispatcher,
};
use crate::domain::services::settings_service::SettingsService;
use crate::domain::services::template::reservation_vars;
use crate::error::AppError;

/// Offsets at or above this many hours match on calendar day.
const DAY_GRANULARITY_HOURS: f64 = 24.0;

/// Class starts targeted by one reminder definition at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub enum ReminderWindow {
    /// Every class on this studio-local date.
    Day(NaiveDate),
    /// Classes starting in `[start, end)`.
    Span { start: DateTime<Utc>, end: DateTime<Utc> },
}

impl ReminderWindow {
    /// `None` when `hours_before` is out of range or the target overflows.
    pub fn for_offset(as_of: DateTime<Utc>, hours_before: f64, tz: Tz) -> Option<Self> {
        check_hours_before("hoursBefore", hours_before).ok()?;
        let offset = Duration::try_milliseconds((hours_before * 3_600_000.0).round() as i64)?;
        let target = as_of.checked_add_signed(offset)?;
        if hours_before >= DAY_GRANULARITY_HOURS {
            Some(ReminderWindow::Day(target.with_timezone(&tz).date_naive()))
        } else {
            let end = target.checked_add_signed(Duration::hours(1))?;
            Some(ReminderWindow::Span { start: target, end })
        }
    }

    /// Studio-local dates that can hold a matching class.
    pub fn local_dates(&self, tz: Tz) -> Vec<NaiveDate> {
        match self {
            ReminderWindow::Day(date) => vec![*date],
            ReminderWindow::Span { start, end } => {
                let first = start.with_timezone(&tz).date_naive();
                let last = end.with_timezone(&tz).date_naive();
                if first == last { vec![first] } else { vec![first, last] }
            }
        }
    }

    pub fn contains(&self, date: NaiveDate, start_time: NaiveTime, tz: Tz) -> bool {
        match self {
            ReminderWindow::Day(day) => *day == date,
            ReminderWindow::Span { start, end } => local_to_utc(date, start_time, tz)
                .is_some_and(|class_start| class_start >= *start && class_start < *end),
        }
    }
}

fn local_to_utc(date: NaiveDate, time: NaiveTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRunReport {
    pub processed: u32,
    pub sent: u32,
    pub failed: u32,
    pub skipped: u32,
    /// Studio-local date of `as_of`.
    pub date: Option<NaiveDate>,
    pub degraded: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReminderReport {
    pub reservation_id: String,
    pub message_preview: String,
    pub notification: DispatchOutcome,
    pub degraded: bool,
}

pub struct ReminderScheduler {
    definitions: Arc<dyn ReminderDefinitionRepository>,
    reservations: Arc<dyn ReservationRepository>,
    dispatcher: Arc<NotificationDispatcher>,
    settings: Arc<SettingsService>,
    timezone: Tz,
    send_delay: StdDuration,
    degraded: bool,
    // Overlapping triggers within this process run one after another.
    run_lock: Mutex<()>,
}

impl ReminderScheduler {
    pub fn new(
        definitions: Arc<dyn ReminderDefinitionRepository>,
        reservations: Arc<dyn ReservationRepository>,
        dispatcher: Arc<NotificationDispatcher>,
        settings: Arc<SettingsService>,
        timezone: Tz,
        send_delay: StdDuration,
        degraded: bool,
    ) -> Self {
        Self {
            definitions,
            reservations,
            dispatcher,
            settings,
            timezone,
            send_delay,
            degraded,
            run_lock: Mutex::new(()),
        }
    }

    /// Sends every reminder due at `as_of`. Per-reservation failures are
    /// counted, never propagated; repeated runs for the same window send at
    /// most once per (reservation, definition).
    pub async fn run_due_reminders(&self, as_of: DateTime<Utc>) -> Result<ReminderRunReport, AppError> {
        let span = info_span!("reminder_run", as_of = %as_of, degraded = self.degraded);
        self.run_locked(as_of).instrument(span).await
    }

    async fn run_locked(&self, as_of: DateTime<Utc>) -> Result<ReminderRunReport, AppError> {
        let _guard = self.run_lock.lock().await;

        let mut report = ReminderRunReport {
            date: Some(as_of.with_timezone(&self.timezone).date_naive()),
            degraded: self.degraded,
            ..Default::default()
        };
        if self.degraded {
            warn!("Reminder run operating on placeholder data (degraded mode)");
        }

        let settings = self.settings.load().await?.settings;
        if !settings.reminder.enabled {
            info!("Reminders are disabled in settings; nothing to do");
            return Ok(report);
        }

        let definitions = self.definitions.list_active().await?;
        let mut first_send = true;

        for definition in &definitions {
            let Some(window) = ReminderWindow::for_offset(as_of, definition.hours_before, self.timezone) else {
                error!("Reminder '{}' has an unusable offset of {}h; skipping it", definition.name, definition.hours_before);
                continue;
            };
            let candidates = match self.reservations.list_confirmed_details_on(&window.local_dates(self.timezone)).await {
                Ok(rows) => rows,
                Err(e) => {
                    error!("Could not load reservations for reminder '{}': {:?}", definition.name, e);
                    continue;
                }
            };

            let template = if definition.message_template.trim().is_empty() {
                settings.reminder.template.as_str()
            } else {
                definition.message_template.as_str()
            };

            for detail in candidates.iter().filter(|d| window.contains(d.slot_date, d.start_time, self.timezone)) {
                report.processed += 1;

                if !first_send && !self.send_delay.is_zero() {
                    sleep(self.send_delay).await;
                }

                let outcome = self.send_reminder(detail, definition, template).await;
                if outcome.skipped {
                    report.skipped += 1;
                    continue;
                }
                first_send = false;
                if outcome.success {
                    report.sent += 1;
                } else {
                    report.failed += 1;
                }
            }
        }

        info!(
            processed = report.processed,
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            "Reminder run finished"
        );
        Ok(report)
    }

    async fn send_reminder(&self, detail: &ReservationDetail, definition: &ReminderScheduleDefinition, template: &str) -> DispatchOutcome {
        let variables = reservation_vars(detail);
        let key = idempotency_key(NotificationType::Reminder, &detail.reservation_id, Some(&definition.id));

        self.dispatcher.dispatch(DispatchRequest {
            customer_id: &detail.customer_id,
            recipient: &detail.customer_external_id,
            notification_type: NotificationType::Reminder,
            template,
            variables: &variables,
            reservation_id: Some(&detail.reservation_id),
            definition_id: Some(&definition.id),
            channel: None,
            idempotency_key: Some(key),
        })
            .instrument(info_span!("reminder_send", reservation_id = %detail.reservation_id, definition_id = %definition.id))
            .await
    }

    /// Diagnostic send that bypasses the idempotency ledger. Without a
    /// reservation id, the first confirmed reservation in the window for
    /// `hours_before` is used.
    pub async fn send_test_reminder(
        &self,
        reservation_id: Option<&str>,
        hours_before: f64,
        as_of: DateTime<Utc>,
    ) -> Result<TestReminderReport, AppError> {
        check_hours_before("hoursBeforeClass", hours_before).map_err(AppError::Validation)?;
        if self.degraded {
            warn!("Test reminder operating on placeholder data (degraded mode)");
        }

        let detail = match reservation_id {
            Some(id) => self.reservations.find_detail(id).await?
                .ok_or(AppError::NotFound("Reservation not found".into()))?,
            None => {
                let window = ReminderWindow::for_offset(as_of, hours_before, self.timezone)
                    .ok_or(AppError::Validation("hoursBeforeClass is too far ahead".into()))?;
                self.reservations.list_confirmed_details_on(&window.local_dates(self.timezone)).await?
                    .into_iter()
                    .find(|d| window.contains(d.slot_date, d.start_time, self.timezone))
                    .ok_or(AppError::NotFound(format!(
                        "No confirmed reservation found {} hours ahead", hours_before
                    )))?
            }
        };

        let template = self.settings.load().await?.settings.reminder.template;
        let variables = reservation_vars(&detail);
        let message_preview = crate::domain::services::template::render(&template, &variables);

        let notification = self.dispatcher.dispatch(DispatchRequest {
            customer_id: &detail.customer_id,
            recipient: &detail.customer_external_id,
            notification_type: NotificationType::Reminder,
            template: &template,
            variables: &variables,
            reservation_id: Some(&detail.reservation_id),
            definition_id: None,
            channel: None,
            idempotency_key: None,
        }).await;

        Ok(TestReminderReport {
            reservation_id: detail.reservation_id,
            message_preview,
            notification,
            degraded: self.degraded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_day_window_uses_studio_date() {
        // 20:00 UTC is already the next morning in Taipei.
        let window = ReminderWindow::for_offset(utc(2026, 10, 14, 20, 0), 24.0, chrono_tz::Asia::Taipei).unwrap();
        assert_eq!(window, ReminderWindow::Day(date(2026, 10, 16)));
        assert!(window.contains(date(2026, 10, 16), time(7, 0), chrono_tz::Asia::Taipei));
        assert!(!window.contains(date(2026, 10, 15), time(23, 0), chrono_tz::Asia::Taipei));
    }

    #[test]
    fn test_sub_daily_window_is_one_hour() {
        let tz = chrono_tz::UTC;
        let window = ReminderWindow::for_offset(utc(2026, 10, 14, 8, 0), 2.0, tz).unwrap();
        assert!(window.contains(date(2026, 10, 14), time(10, 0), tz));
        assert!(window.contains(date(2026, 10, 14), time(10, 59), tz));
        assert!(!window.contains(date(2026, 10, 14), time(11, 0), tz));
        assert!(!window.contains(date(2026, 10, 14), time(9, 59), tz));
    }

    #[test]
    fn test_fractional_offset() {
        let tz = chrono_tz::UTC;
        let window = ReminderWindow::for_offset(utc(2026, 10, 14, 8, 0), 1.5, tz).unwrap();
        assert!(window.contains(date(2026, 10, 14), time(9, 30), tz));
        assert!(!window.contains(date(2026, 10, 14), time(9, 0), tz));
    }

    #[test]
    fn test_out_of_range_offset_has_no_window() {
        let as_of = utc(2026, 10, 14, 8, 0);
        assert_eq!(ReminderWindow::for_offset(as_of, 1e300, chrono_tz::UTC), None);
        assert_eq!(ReminderWindow::for_offset(as_of, f64::INFINITY, chrono_tz::UTC), None);
        assert_eq!(ReminderWindow::for_offset(as_of, -2.0, chrono_tz::UTC), None);
        assert_eq!(ReminderWindow::for_offset(DateTime::<Utc>::MAX_UTC, 24.0, chrono_tz::UTC), None);
    }

    #[test]
    fn test_span_across_midnight_touches_two_dates() {
        let tz = chrono_tz::UTC;
        let window = ReminderWindow::for_offset(utc(2026, 10, 14, 22, 30), 1.0, tz).unwrap();
        assert_eq!(window.local_dates(tz), vec![date(2026, 10, 14), date(2026, 10, 15)]);
        assert!(window.contains(date(2026, 10, 15), time(0, 15), tz));
    }
}
