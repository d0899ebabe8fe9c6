use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::models::{
    channel::ChannelKind,
    customer::{Customer, CustomerUpsert},
    notification::NotificationType,
    reservation::{BookingType, Reservation, ReservationStatus},
    settings::MessageSection,
};
use crate::domain::ports::{CustomerRepository, ReservationRepository};
use crate::domain::services::notification_dispatcher::{DispatchOutcome, DispatchRequest, NotificationDispatcher};
use crate::domain::services::settings_service::SettingsService;
use crate::domain::services::template::reservation_vars;
use crate::error::AppError;

const SKIP_DISABLED: &str = "disabled in settings";

pub struct ReserveRequest {
    pub slot_id: String,
    pub customer_external_id: String,
    pub customer_name: String,
    pub phone: Option<String>,
    pub channel: Option<ChannelKind>,
}

#[derive(Debug, Default)]
pub struct ReservationChanges {
    pub status: Option<ReservationStatus>,
    pub booking_type: Option<BookingType>,
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationReceipt {
    pub reservation: Reservation,
    pub customer: Customer,
    pub notification: DispatchOutcome,
    /// Set when the reservation stands but the notification did not go out.
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedReservation {
    pub reservation: Reservation,
    pub notification: Option<DispatchOutcome>,
}

pub struct ReservationEngine {
    customers: Arc<dyn CustomerRepository>,
    reservations: Arc<dyn ReservationRepository>,
    dispatcher: Arc<NotificationDispatcher>,
    settings: Arc<SettingsService>,
}

impl ReservationEngine {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        reservations: Arc<dyn ReservationRepository>,
        dispatcher: Arc<NotificationDispatcher>,
        settings: Arc<SettingsService>,
    ) -> Self {
        Self { customers, reservations, dispatcher, settings }
    }

    /// Books a seat: upsert the customer, then atomically check the slot
    /// and insert. The confirmation is best-effort and never undoes the booking.
    pub async fn reserve(&self, req: ReserveRequest) -> Result<ReservationReceipt, AppError> {
        if req.slot_id.trim().is_empty() {
            return Err(AppError::Validation("scheduleId is required".into()));
        }
        if req.customer_external_id.trim().is_empty() {
            return Err(AppError::Validation("lineId is required".into()));
        }
        if req.customer_name.trim().is_empty() {
            return Err(AppError::Validation("customerName is required".into()));
        }

        let customer = self.customers.upsert_by_external_id(&CustomerUpsert {
            external_id: req.customer_external_id.trim().to_string(),
            name: req.customer_name.trim().to_string(),
            phone: req.phone.filter(|p| !p.trim().is_empty()),
        }).await?;

        let reservation = self.reservations
            .reserve(&Reservation::new(req.slot_id.clone(), customer.id.clone()))
            .await?;
        info!("Reservation {} confirmed for slot {} (customer {})", reservation.id, reservation.slot_id, customer.id);

        let notification = self.notify(
            &reservation, &customer, NotificationType::BookingConfirmation, req.channel,
        ).await;
        let warning = notification_warning(&notification);
        if let Some(w) = &warning {
            warn!("Reservation {} stands but confirmation was not delivered: {}", reservation.id, w);
        }

        Ok(ReservationReceipt { reservation, customer, notification, warning })
    }

    pub async fn get(&self, id: &str) -> Result<Reservation, AppError> {
        self.reservations.find_by_id(id).await?
            .ok_or(AppError::NotFound("Reservation not found".into()))
    }

    pub async fn update(&self, id: &str, changes: ReservationChanges) -> Result<UpdatedReservation, AppError> {
        let current = self.get(id).await?;
        let mut updated = current.clone();

        if let Some(status) = changes.status {
            updated.status = status.as_str().to_string();
        }
        if let Some(booking_type) = changes.booking_type {
            updated.booking_type = booking_type.as_str().to_string();
        }
        if changes.cancellation_reason.is_some() {
            updated.cancellation_reason = changes.cancellation_reason;
        }
        updated.updated_at = chrono::Utc::now();

        let reactivate = current.is_cancelled() && !updated.is_cancelled();
        let saved = self.reservations.update(&updated, reactivate).await?;
        info!("Reservation {} updated: {} -> {}", saved.id, current.status, saved.status);

        let notification = if !current.is_cancelled() && saved.is_cancelled() {
            match self.customers.find_by_id(&saved.customer_id).await? {
                Some(customer) => Some(self.notify(&saved, &customer, NotificationType::Cancellation, None).await),
                None => {
                    warn!("Customer {} of reservation {} no longer exists", saved.customer_id, saved.id);
                    None
                }
            }
        } else {
            None
        };

        Ok(UpdatedReservation { reservation: saved, notification })
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.reservations.delete(id).await?;
        info!("Reservation {} removed", id);
        Ok(())
    }

    async fn notify(
        &self,
        reservation: &Reservation,
        customer: &Customer,
        notification_type: NotificationType,
        channel: Option<ChannelKind>,
    ) -> DispatchOutcome {
        let settings = match self.settings.load().await {
            Ok(loaded) => loaded.settings,
            Err(e) => {
                warn!("Could not load notification settings: {:?}", e);
                return DispatchOutcome::skipped("notification settings unavailable");
            }
        };
        let section: &MessageSection = match notification_type {
            NotificationType::BookingConfirmation => &settings.booking_confirmation,
            NotificationType::Cancellation => &settings.cancellation,
            NotificationType::Reminder => &settings.reminder,
        };
        if !section.enabled {
            return DispatchOutcome::skipped(SKIP_DISABLED);
        }

        let detail = match self.reservations.find_detail(&reservation.id).await {
            Ok(Some(detail)) => detail,
            Ok(None) => return DispatchOutcome::skipped("reservation details unavailable"),
            Err(e) => {
                warn!("Could not load details for reservation {}: {:?}", reservation.id, e);
                return DispatchOutcome::skipped("reservation details unavailable");
            }
        };
        let variables = reservation_vars(&detail);

        self.dispatcher.dispatch(DispatchRequest {
            customer_id: &customer.id,
            recipient: &customer.external_id,
            notification_type,
            template: &section.template,
            variables: &variables,
            reservation_id: Some(&reservation.id),
            definition_id: None,
            channel,
            idempotency_key: None,
        }).await
    }
}

fn notification_warning(outcome: &DispatchOutcome) -> Option<String> {
    if outcome.success {
        return None;
    }
    match (&outcome.error, outcome.skipped) {
        // A section that is switched off is not a delivery problem.
        (Some(reason), true) if reason == SKIP_DISABLED => None,
        (Some(reason), _) => Some(format!("Reservation confirmed, but the notification failed: {}", reason)),
        (None, _) => Some("Reservation confirmed, but the notification failed".to_string()),
    }
}
