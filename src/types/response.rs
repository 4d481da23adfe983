//! Typed views over exchange responses.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, TimestampSeconds, serde_as};
use strum_macros::Display;

use crate::types::{OrderFlags, Side, TwapQuantityMode};

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum OrderType {
    Limit,
    Market,
}

/// Exchange-owned lifecycle of an order. The client only ever observes these.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    /// TPSL child waiting for its parent to fill.
    ChildPending,
    ScheduledTwap,
    Placed,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
    Expired,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// `true` once the exchange will not change the order any further.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected | OrderStatus::Expired
        )
    }
}

/// Snapshot of an order as reported by `GET /trade/order`.
#[serde_as]
#[non_exhaustive]
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderState {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub order_id: u64,
    #[serde(default)]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub nonce: Option<u64>,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub status: OrderStatus,
    #[serde(default)]
    pub total_quantity: Option<Decimal>,
    #[serde(default)]
    pub available_quantity: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub trigger_price: Option<Decimal>,
    #[serde(default)]
    pub order_flags: Option<OrderFlags>,
    #[serde(default)]
    pub quantity_mode: Option<TwapQuantityMode>,
    #[serde(default)]
    pub num_orders_total: Option<u32>,
    #[serde(default)]
    pub num_orders_remaining: Option<u32>,
    #[serde(default)]
    #[serde_as(as = "Option<TimestampSeconds<i64>>")]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default)]
    #[serde_as(as = "Option<TimestampSeconds<i64>>")]
    pub finish_time: Option<DateTime<Utc>>,
}

impl OrderState {
    /// Trigger orders stay untriggered until the market crosses the trigger price.
    #[must_use]
    pub fn is_trigger_order(&self) -> bool {
        self.trigger_price.is_some()
    }

    #[must_use]
    pub fn is_twap(&self) -> bool {
        self.quantity_mode.is_some() || self.status == OrderStatus::ScheduledTwap
    }
}

#[serde_as]
#[non_exhaustive]
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub order_id: u64,
}

/// Per-item outcome of a batch, in the same position as the submitted operation.
#[serde_as]
#[non_exhaustive]
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BatchItemResult {
    Rejected {
        #[serde(rename = "errorCode")]
        error_code: i64,
        #[serde(default)]
        message: String,
    },
    Accepted {
        #[serde(default, rename = "orderId")]
        #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
        order_id: Option<u64>,
        #[serde(default)]
        #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
        nonce: Option<u64>,
    },
}

impl BatchItemResult {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, BatchItemResult::Accepted { .. })
    }
}

#[non_exhaustive]
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BatchResponse {
    pub orders: Vec<BatchItemResult>,
}
