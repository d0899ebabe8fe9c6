use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, info_span, Instrument};

use crate::state::AppState;

/// Runs due reminders on a fixed interval until the process exits. The
/// external cron trigger stays the primary path; this loop is opt-in.
pub async fn start_reminder_ticker(state: Arc<AppState>) {
    let Some(period) = state.config.reminder_tick else {
        return;
    };
    info!("Starting in-process reminder ticker every {}s", period.as_secs());

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let span = info_span!("reminder_tick", degraded = state.degraded);
        async {
            match state.reminder_scheduler.run_due_reminders(Utc::now()).await {
                Ok(report) => info!(
                    processed = report.processed,
                    sent = report.sent,
                    failed = report.failed,
                    "Scheduled reminder run finished"
                ),
                Err(e) => error!("Scheduled reminder run failed: {:?}", e),
            }
        }
            .instrument(span)
            .await;
    }
}
