use std::fmt::Debug;

use chrono::Utc;
use log::*;

use super::transitions::{apply_transition, fetch_order};
use crate::{
    config::WebhookConfig,
    db::traits::OrderStore,
    db_types::{Order, OrderStatusType},
    engine_api::{
        errors::LifecycleError,
        order_objects::{PaymentEvent, PaymentEventOutcome},
    },
    events::{EventProducers, OrderConfirmedEvent},
    helpers::verify_signature,
    lifecycle::LifecycleAction,
};

/// `PaymentApi` reconciles payment-gateway events with orders.
///
/// The gateway may deliver the same event more than once. Handling is idempotent: a success event for an order that
/// is already confirmed, or further along, changes nothing and is not an error. Any error returned from here should
/// be passed back to the gateway as a failed delivery, so that it retries.
pub struct PaymentApi<B> {
    db: B,
    webhook: WebhookConfig,
    producers: EventProducers,
}

impl<B> Debug for PaymentApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi")
    }
}

impl<B> PaymentApi<B> {
    pub fn new(db: B, webhook: WebhookConfig, producers: EventProducers) -> Self {
        Self { db, webhook, producers }
    }
}

/// True once payment has been confirmed, unless the order was cancelled.
fn is_past_payment(status: OrderStatusType) -> bool {
    !matches!(status, OrderStatusType::Pending | OrderStatusType::Cancelled)
}

impl<B> PaymentApi<B>
where B: OrderStore
{
    /// Verifies and handles a signed callback from the payment gateway.
    ///
    /// The payload is a JSON object `{ "type": "...", "intent_id": "..." }`.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<PaymentEventOutcome, LifecycleError> {
        if self.webhook.signature_checks {
            let header = signature_header.ok_or_else(|| {
                warn!("🔐️ Payment callback without a signature header. Rejecting it.");
                LifecycleError::Forbidden("Missing webhook signature".into())
            })?;
            verify_signature(payload, header, self.webhook.secret.reveal(), self.webhook.tolerance, Utc::now())?;
        } else {
            trace!("🔐️ Webhook signature checks are disabled. Accepting the callback.");
        }
        let event = serde_json::from_slice::<PaymentEvent>(payload).map_err(|e| {
            warn!("💳️ Could not parse payment callback: {e}");
            LifecycleError::InvalidRequest(format!("Malformed payment event: {e}"))
        })?;
        self.process_event(event).await
    }

    pub async fn process_event(&self, event: PaymentEvent) -> Result<PaymentEventOutcome, LifecycleError> {
        self.on_payment_event(&event.event_type, &event.intent_id).await
    }

    /// Applies a payment event to the order linked to `intent_id`.
    ///
    /// * Events that are not success events are acknowledged and ignored.
    /// * No order for the intent: [`LifecycleError::OrderNotFound`]. No order is ever created here.
    /// * `pending` order: moved to `confirmed` and `confirmed_at` is set.
    /// * `confirmed` or later: nothing changes.
    /// * `cancelled` order: acknowledged as [`PaymentEventOutcome::NeedsAttention`] and logged at `warn`, so the
    ///   gateway stops redelivering. The order stays cancelled.
    pub async fn on_payment_event(
        &self,
        event_type: &str,
        intent_id: &str,
    ) -> Result<PaymentEventOutcome, LifecycleError> {
        let event = PaymentEvent::new(event_type, intent_id);
        if !event.is_success() {
            debug!("💳️ Ignoring '{event_type}' event for payment intent {intent_id}");
            return Ok(PaymentEventOutcome::Ignored);
        }
        if intent_id.trim().is_empty() {
            return Err(LifecycleError::InvalidRequest("The payment event has no intent id".into()));
        }
        let order = self
            .db
            .fetch_order_by_payment_intent(intent_id)
            .await
            .map_err(|e| {
                error!("🗃️ Could not look up payment intent {intent_id}: {e}");
                LifecycleError::from(e)
            })?
            .ok_or_else(|| {
                warn!("💳️ Payment succeeded for intent {intent_id}, but no order is linked to it");
                LifecycleError::OrderNotFound(format!("payment intent {intent_id}"))
            })?;
        if is_past_payment(order.status) {
            debug!("💳️ Order {} is already {}. Duplicate payment event ignored.", order.order_id, order.status);
            return Ok(PaymentEventOutcome::AlreadyConfirmed(order));
        }
        if order.status == OrderStatusType::Cancelled {
            return Ok(needs_attention(order));
        }
        match apply_transition(&self.db, &order.order_id, LifecycleAction::ConfirmPayment, None).await {
            Ok(applied) => {
                let confirmed = applied.order;
                info!("💳️ Payment for order {} confirmed", confirmed.order_id);
                let event = OrderConfirmedEvent::new(confirmed.clone(), intent_id.to_string());
                self.producers.publish_order_confirmed(event).await;
                Ok(PaymentEventOutcome::Confirmed(confirmed))
            },
            // A concurrent delivery of the same event got there first
            Err(LifecycleError::InvalidTransition { status, .. }) if is_past_payment(status) => {
                let current: Order = fetch_order(&self.db, &order.order_id).await?;
                debug!("💳️ Order {} was confirmed by a concurrent delivery", current.order_id);
                Ok(PaymentEventOutcome::AlreadyConfirmed(current))
            },
            // Cancelled between the lookup and the write
            Err(LifecycleError::InvalidTransition { status: OrderStatusType::Cancelled, .. }) => {
                let current = fetch_order(&self.db, &order.order_id).await?;
                Ok(needs_attention(current))
            },
            Err(e) => Err(e),
        }
    }
}

fn needs_attention(order: Order) -> PaymentEventOutcome {
    warn!(
        "💳️ Payment succeeded for order {}, which is {}. It needs manual attention.",
        order.order_id, order.status
    );
    PaymentEventOutcome::NeedsAttention(order)
}
