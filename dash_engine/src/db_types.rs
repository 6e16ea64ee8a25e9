//! Types that are stored in, and read back from, the order store.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use dash_common::Cents;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------     Identifiers       ---------------------------------------------------------
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// The engine-assigned identifier of an order. Immutable once generated.
    OrderId
);
string_id!(
    /// A customer or dasher identity, as issued by the identity provider.
    UserId
);
string_id!(RestaurantId);
string_id!(FoodId);

impl OrderId {
    /// Generates a fresh, random order id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// Created, awaiting payment confirmation from the payment gateway.
    Pending,
    /// Payment has been confirmed. The order is visible to dashers until one claims it.
    Confirmed,
    /// The restaurant has started preparing the food.
    Preparing,
    /// The food is ready for pickup.
    Ready,
    /// The assigned dasher has collected the food.
    PickedUp,
    /// The order has been handed to the customer.
    Delivered,
    /// Cancelled by the customer or restaurant before pickup.
    Cancelled,
}

/// The per-transition timestamp columns on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampField {
    ConfirmedAt,
    ReadyAt,
    PickedUpAt,
    DeliveredAt,
}

impl TimestampField {
    pub fn column(&self) -> &'static str {
        match self {
            TimestampField::ConfirmedAt => "confirmed_at",
            TimestampField::ReadyAt => "ready_at",
            TimestampField::PickedUpAt => "picked_up_at",
            TimestampField::DeliveredAt => "delivered_at",
        }
    }
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 7] = [
        OrderStatusType::Pending,
        OrderStatusType::Confirmed,
        OrderStatusType::Preparing,
        OrderStatusType::Ready,
        OrderStatusType::PickedUp,
        OrderStatusType::Delivered,
        OrderStatusType::Cancelled,
    ];
    /// Statuses in which an assigned dasher is still working on the order.
    pub const ACTIVE_FOR_DASHER: [OrderStatusType; 4] = [
        OrderStatusType::Confirmed,
        OrderStatusType::Preparing,
        OrderStatusType::Ready,
        OrderStatusType::PickedUp,
    ];

    /// The timestamp column that records entry into this status, if there is one. `pending`, `preparing` and
    /// `cancelled` only bump `updated_at`.
    pub fn timestamp_field(&self) -> Option<TimestampField> {
        use OrderStatusType::*;
        match self {
            Confirmed => Some(TimestampField::ConfirmedAt),
            Ready => Some(TimestampField::ReadyAt),
            PickedUp => Some(TimestampField::PickedUpAt),
            Delivered => Some(TimestampField::DeliveredAt),
            Pending | Preparing | Cancelled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Delivered | OrderStatusType::Cancelled)
    }

    /// True for every status from which the order can still be cancelled.
    pub fn is_cancellable(&self) -> bool {
        use OrderStatusType::*;
        matches!(self, Pending | Confirmed | Preparing | Ready)
    }

    pub fn as_str(&self) -> &'static str {
        use OrderStatusType::*;
        match self {
            Pending => "pending",
            Confirmed => "confirmed",
            Preparing => "preparing",
            Ready => "ready",
            PickedUp => "picked_up",
            Delivered => "delivered",
            Cancelled => "cancelled",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatusType::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ConversionError(s.to_string()))
    }
}

//--------------------------------------       LineItem        ---------------------------------------------------------
/// One line of an order, priced from the catalog at the moment the order was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub food_id: FoodId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Cents,
}

impl LineItem {
    /// `unit_price × quantity`, or `None` on overflow.
    pub fn line_total(&self) -> Option<Cents> {
        self.unit_price.checked_mul(i64::from(self.quantity))
    }
}

//--------------------------------------    PriceBreakdown     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: Cents,
    pub delivery_fee: Cents,
    pub dasher_fee: Cents,
    pub total: Cents,
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub customer_id: UserId,
    pub restaurant_id: RestaurantId,
    pub dasher_id: Option<UserId>,
    pub line_items: Vec<LineItem>,
    pub subtotal: Cents,
    pub delivery_fee: Cents,
    pub dasher_fee: Cents,
    pub total: Cents,
    pub status: OrderStatusType,
    pub delivery_address: String,
    pub delivery_instructions: Option<String>,
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn price(&self) -> PriceBreakdown {
        PriceBreakdown {
            subtotal: self.subtotal,
            delivery_fee: self.delivery_fee,
            dasher_fee: self.dasher_fee,
            total: self.total,
        }
    }

    /// Recomputes the subtotal and total from the line-item snapshot and the stored fees, and checks them against the
    /// stored values. Reading the order never changes it, so this can be called any number of times.
    pub fn totals_are_consistent(&self) -> bool {
        let subtotal = self
            .line_items
            .iter()
            .try_fold(Cents::ZERO, |acc, item| item.line_total().and_then(|t| acc.checked_add(t)));
        let total =
            subtotal.and_then(|s| s.checked_add(self.delivery_fee)).and_then(|s| s.checked_add(self.dasher_fee));
        subtotal == Some(self.subtotal) && total == Some(self.total)
    }

    pub fn timestamp(&self, field: TimestampField) -> Option<DateTime<Utc>> {
        match field {
            TimestampField::ConfirmedAt => self.confirmed_at,
            TimestampField::ReadyAt => self.ready_at,
            TimestampField::PickedUpAt => self.picked_up_at,
            TimestampField::DeliveredAt => self.delivered_at,
        }
    }

    pub fn is_claimable(&self) -> bool {
        self.status == OrderStatusType::Confirmed && self.dasher_id.is_none()
    }

    pub fn is_assigned_to(&self, dasher: &UserId) -> bool {
        self.dasher_id.as_ref() == Some(dasher)
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
/// A fully validated and priced order, ready to be written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub customer_id: UserId,
    pub restaurant_id: RestaurantId,
    pub line_items: Vec<LineItem>,
    pub price: PriceBreakdown,
    pub delivery_address: String,
    pub delivery_instructions: Option<String>,
    /// The payment gateway's handle for this order's payment authorization. Written once, at insert.
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
