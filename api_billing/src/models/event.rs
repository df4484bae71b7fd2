use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use db::models::subscription::SubscriptionStatus;
use serde::{Deserialize, Serialize};
use stripe::{CheckoutSessionMode, Event, EventObject, EventType, Subscription};
use uuid::Uuid;

/// A verified provider event, decoded into the shapes this service acts on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BillingEvent {
    Subscription(SubscriptionEvent),
    CheckoutCompleted(CheckoutCompleted),
    Ignored { event_type: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionChange {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionEvent {
    pub event_id: String,
    pub change: SubscriptionChange,
    /// When the provider created the event; used to discard stale deliveries.
    pub occurred_at: DateTime<Utc>,
    pub subscription: SubscriptionSnapshot,
}

/// The parts of a Stripe subscription that the member projection depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionSnapshot {
    pub id: String,
    pub customer_id: String,
    pub price_id: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<DateTime<Utc>>,
    /// Member id carried in the subscription metadata, when present.
    pub member_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutCompleted {
    pub session_id: String,
    pub mode: String,
}

impl CheckoutCompleted {
    pub fn is_one_off_payment(&self) -> bool {
        self.mode == CheckoutSessionMode::Payment.as_str()
    }
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    (secs > 0)
        .then(|| DateTime::<Utc>::from_timestamp(secs, 0))
        .flatten()
}

impl TryFrom<&Subscription> for SubscriptionSnapshot {
    type Error = AppError;

    fn try_from(subscription: &Subscription) -> Res<Self> {
        let member_id = match subscription.metadata.get("user_id") {
            Some(raw) => match raw.parse::<Uuid>() {
                Ok(id) => Some(id),
                Err(_) => {
                    log::warn!(
                        "[stripe] subscription {} carries a malformed user_id '{}'",
                        subscription.id,
                        raw
                    );
                    None
                }
            },
            None => None,
        };

        Ok(SubscriptionSnapshot {
            id: subscription.id.to_string(),
            customer_id: subscription.customer.id().to_string(),
            price_id: subscription
                .items
                .data
                .first()
                .and_then(|item| item.price.as_ref())
                .map(|price| price.id.to_string()),
            status: subscription.status.to_string().parse()?,
            current_period_end: timestamp(subscription.current_period_end),
            member_id,
        })
    }
}

impl TryFrom<Event> for BillingEvent {
    type Error = AppError;

    fn try_from(event: Event) -> Res<Self> {
        let change = match event.type_ {
            EventType::CustomerSubscriptionCreated => Some(SubscriptionChange::Created),
            EventType::CustomerSubscriptionUpdated => Some(SubscriptionChange::Updated),
            EventType::CustomerSubscriptionDeleted => Some(SubscriptionChange::Deleted),
            _ => None,
        };

        if let Some(change) = change {
            let EventObject::Subscription(object) = &event.data.object else {
                return Err(AppError::Internal(format!(
                    "event {} ({}) does not carry a subscription",
                    event.id, event.type_
                )));
            };
            let subscription: &Subscription = object;
            let occurred_at = timestamp(event.created).ok_or_else(|| {
                AppError::Internal(format!("event {} has no creation time", event.id))
            })?;

            return Ok(BillingEvent::Subscription(SubscriptionEvent {
                event_id: event.id.to_string(),
                change,
                occurred_at,
                subscription: SubscriptionSnapshot::try_from(subscription)?,
            }));
        }

        match (event.type_, event.data.object) {
            (EventType::CheckoutSessionCompleted, EventObject::CheckoutSession(session)) => {
                Ok(BillingEvent::CheckoutCompleted(CheckoutCompleted {
                    session_id: session.id.to_string(),
                    mode: session.mode.as_str().to_string(),
                }))
            }
            (event_type, _) => Ok(BillingEvent::Ignored {
                event_type: event_type.to_string(),
            }),
        }
    }
}
