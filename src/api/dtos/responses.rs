use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::models::schedule::{ScheduleSlot, SlotWithCount};
use crate::domain::services::reminder_scheduler::ReminderRunReport;
use crate::domain::services::reservation_engine::ReservationReceipt;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub degraded: bool,
}

#[derive(Serialize)]
pub struct ScheduleResponse {
    pub schedule: ScheduleSlot,
}

#[derive(Serialize)]
pub struct ScheduleDetailResponse {
    pub schedule: SlotWithCount,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringScheduleResponse {
    pub schedules_created: usize,
    pub schedules: Vec<ScheduleSlot>,
    pub skipped_dates: Vec<NaiveDate>,
}

#[derive(Serialize)]
pub struct ReservationCreatedResponse {
    #[serde(flatten)]
    pub receipt: ReservationReceipt,
    pub degraded: bool,
}

#[derive(Serialize)]
pub struct CronResponse {
    pub processed: u32,
    pub successful: u32,
    pub failed: u32,
    pub skipped: u32,
    pub date: Option<NaiveDate>,
    pub degraded: bool,
}

impl From<ReminderRunReport> for CronResponse {
    fn from(report: ReminderRunReport) -> Self {
        Self {
            processed: report.processed,
            successful: report.sent,
            failed: report.failed,
            skipped: report.skipped,
            date: report.date,
            degraded: report.degraded,
        }
    }
}
