use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::invoice::{self, Entity as Invoice, InvoiceStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Terminal statuses accepted from the payment provider. Anything else is
/// rejected without touching the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Approved,
    Rejected,
    Cancelled,
}

/// Confirmation delivered by the external payment provider.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentEvent {
    /// Correlation token issued when the payment session was created
    pub preference_id: String,
    /// Provider status string; recognized values are approved, rejected
    /// and cancelled
    pub status: String,
    /// Amount the provider settled; must equal the invoice total on
    /// approval
    pub amount: Decimal,
}

/// Result of applying one confirmation to one invoice.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentOutcome {
    pub invoice_id: Uuid,
    pub paid: bool,
    pub status: InvoiceStatus,
}

/// Applies external payment confirmations to invoices with exactly-once
/// semantics: the paid flip is a guarded UPDATE keyed on the current
/// pending state, so concurrent deliveries resolve to one winner and
/// conflicts for the rest.
#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DbPool>,
    events: EventSender,
}

impl PaymentService {
    pub fn new(db: Arc<DbPool>, events: EventSender) -> Self {
        Self { db, events }
    }

    /// Webhook entry point: the provider only knows the preference id,
    /// so resolve the invoice first and then reconcile it.
    #[instrument(skip(self, event), fields(preference_id = %event.preference_id))]
    pub async fn reconcile_by_preference(
        &self,
        event: PaymentEvent,
    ) -> Result<PaymentOutcome, ServiceError> {
        let invoice = Invoice::find()
            .filter(invoice::Column::PreferenceId.eq(event.preference_id.clone()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "No invoice for preference_id {}",
                    event.preference_id
                ))
            })?;

        self.reconcile(invoice.id, event).await
    }

    #[instrument(skip(self, event), fields(invoice_id = %invoice_id, status = %event.status))]
    pub async fn reconcile(
        &self,
        invoice_id: Uuid,
        event: PaymentEvent,
    ) -> Result<PaymentOutcome, ServiceError> {
        let db = &*self.db;

        let invoice = Invoice::find_by_id(invoice_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Invoice with ID {invoice_id} not found"))
            })?;

        // Terminal invoices reject duplicates outright; redelivered
        // confirmations must not be reapplied.
        if invoice.payment_status != InvoiceStatus::Pending {
            warn!(%invoice_id, current = ?invoice.payment_status, "duplicate payment confirmation rejected");
            return Err(ServiceError::Conflict(format!(
                "Invoice {invoice_id} already settled as {:?}",
                invoice.payment_status
            )));
        }

        if event.preference_id != invoice.preference_id {
            return Err(ServiceError::ValidationError(format!(
                "preference_id {} does not match invoice {invoice_id}",
                event.preference_id
            )));
        }

        let status = PaymentStatus::from_str(&event.status)
            .map_err(|_| ServiceError::UnsupportedStatus(event.status.clone()))?;

        match status {
            PaymentStatus::Approved => {
                if event.amount != invoice.total {
                    return Err(ServiceError::ValidationError(format!(
                        "settled amount {} does not match invoice total {}",
                        event.amount, invoice.total
                    )));
                }
                self.settle(invoice_id, InvoiceStatus::Paid, true).await?;
                self.events.send(Event::InvoicePaid { invoice_id }).await;
                info!(%invoice_id, "invoice marked paid");
                Ok(PaymentOutcome {
                    invoice_id,
                    paid: true,
                    status: InvoiceStatus::Paid,
                })
            }
            PaymentStatus::Rejected | PaymentStatus::Cancelled => {
                self.settle(invoice_id, InvoiceStatus::Failed, false).await?;
                self.events
                    .send(Event::PaymentFailed {
                        invoice_id,
                        status: status.to_string(),
                    })
                    .await;
                info!(%invoice_id, %status, "payment failure recorded");
                Ok(PaymentOutcome {
                    invoice_id,
                    paid: false,
                    status: InvoiceStatus::Failed,
                })
            }
        }
    }

    /// Compare-and-set on the pending state. Zero rows updated means a
    /// concurrent reconciliation won the race.
    async fn settle(
        &self,
        invoice_id: Uuid,
        to: InvoiceStatus,
        paid: bool,
    ) -> Result<(), ServiceError> {
        let result = Invoice::update_many()
            .set(invoice::ActiveModel {
                paid: Set(paid),
                payment_status: Set(to),
                ..Default::default()
            })
            .filter(invoice::Column::Id.eq(invoice_id))
            .filter(invoice::Column::Paid.eq(false))
            .filter(invoice::Column::PaymentStatus.eq(InvoiceStatus::Pending))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "Invoice {invoice_id} was settled concurrently"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("approved", PaymentStatus::Approved)]
    #[case("rejected", PaymentStatus::Rejected)]
    #[case("cancelled", PaymentStatus::Cancelled)]
    fn recognized_statuses_parse(#[case] raw: &str, #[case] expected: PaymentStatus) {
        assert_eq!(PaymentStatus::from_str(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("in_process")]
    #[case("refunded")]
    #[case("")]
    #[case("APPROVED ")]
    fn unknown_statuses_fail(#[case] raw: &str) {
        assert!(PaymentStatus::from_str(raw).is_err());
    }

    #[test]
    fn status_display_is_lowercase() {
        assert_eq!(PaymentStatus::Approved.to_string(), "approved");
        assert_eq!(PaymentStatus::Cancelled.to_string(), "cancelled");
    }
}
