//! Value types shared by intents, the encoder and the transport layer.

pub mod exchange;
pub mod response;

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::Result;
use crate::error::Error;

pub use exchange::{ExchangeInfo, FeeConfig, FutureContract, MaintenanceWindow};
pub use response::{
    BatchItemResult, BatchResponse, OrderState, OrderStatus, OrderType, PlaceOrderResponse,
};

/// Order side. `Buy` and `Bid` are the same thing on the wire, as are `Sell` and `Ask`.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Side {
    #[serde(alias = "BUY")]
    Bid,
    #[serde(alias = "SELL")]
    Ask,
}

impl Side {
    #[expect(non_upper_case_globals, reason = "reads as a variant at call sites")]
    pub const Buy: Side = Side::Bid;
    #[expect(non_upper_case_globals, reason = "reads as a variant at call sites")]
    pub const Sell: Side = Side::Ask;

    pub fn parse(value: &str) -> Result<Side> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bid" | "buy" | "long" => Ok(Side::Bid),
            "ask" | "sell" | "short" => Ok(Side::Ask),
            other => Err(Error::validation(format!(
                "invalid side `{other}`; expected one of: buy|bid|sell|ask"
            ))),
        }
    }

    #[must_use]
    pub const fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    pub(crate) const fn code(self) -> u32 {
        match self {
            Side::Ask => 0,
            Side::Bid => 1,
        }
    }
}

impl FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Side::parse(s)
    }
}

/// Execution flags attached to an order.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum OrderFlags {
    PostOnly,
    Ioc,
    ReduceOnly,
}

impl OrderFlags {
    pub(crate) const fn code(self) -> u8 {
        match self {
            OrderFlags::PostOnly => 1,
            OrderFlags::Ioc => 2,
            OrderFlags::ReduceOnly => 3,
        }
    }
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TwapQuantityMode {
    Fixed,
    Random,
}

impl TwapQuantityMode {
    pub(crate) const fn code(self) -> u8 {
        match self {
            TwapQuantityMode::Fixed => 0,
            TwapQuantityMode::Random => 1,
        }
    }
}

/// Server-side slicing of a large order into scheduled child orders.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwapConfig {
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    pub quantity_mode: TwapQuantityMode,
}

impl TwapConfig {
    #[must_use]
    pub const fn new(duration_minutes: u32, quantity_mode: TwapQuantityMode) -> Self {
        Self {
            duration_minutes,
            quantity_mode,
        }
    }
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TpslKind {
    TakeProfit,
    StopLoss,
}

impl TpslKind {
    pub(crate) const fn code(self) -> u8 {
        match self {
            TpslKind::TakeProfit => 1,
            TpslKind::StopLoss => 2,
        }
    }
}

/// One take-profit or stop-loss leg. A leg without a quantity closes whatever the
/// parent order filled.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TpslLeg {
    pub kind: TpslKind,
    pub price: Decimal,
    pub quantity: Option<Decimal>,
}

/// Take-profit / stop-loss legs attached to an entry order, in insertion order.
///
/// ```
/// use hibachi_client_sdk::types::TpslConfig;
/// use rust_decimal_macros::dec;
///
/// let tpsl = TpslConfig::new()
///     .add_take_profit(dec!(165), Some(dec!(0.005)))
///     .add_take_profit(dec!(150), None)
///     .add_stop_loss(dec!(120), None);
/// assert_eq!(tpsl.legs().len(), 3);
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TpslConfig {
    legs: Vec<TpslLeg>,
}

impl TpslConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add_take_profit(self, price: Decimal, quantity: Option<Decimal>) -> Self {
        self.push(TpslKind::TakeProfit, price, quantity)
    }

    #[must_use]
    pub fn add_stop_loss(self, price: Decimal, quantity: Option<Decimal>) -> Self {
        self.push(TpslKind::StopLoss, price, quantity)
    }

    #[must_use]
    pub fn legs(&self) -> &[TpslLeg] {
        &self.legs
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    fn push(mut self, kind: TpslKind, price: Decimal, quantity: Option<Decimal>) -> Self {
        self.legs.push(TpslLeg {
            kind,
            price,
            quantity,
        });
        self
    }
}

/// Reference to an existing order: the exchange-assigned id or the nonce it was placed with.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OrderRef {
    Id(u64),
    Nonce(u64),
}

/// Link from a TPSL child order back to the entry order it protects.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParentLink {
    pub nonce: u64,
    pub kind: TpslKind,
}

/// How the exchange will treat a create intent.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum OrderKind {
    Market,
    Limit,
    TriggerMarket,
    TriggerLimit,
    Twap,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn side_aliases_parse() {
        assert_eq!(Side::parse(" BUY ").expect("buy"), Side::Bid);
        assert_eq!("ask".parse::<Side>().expect("ask"), Side::Ask);
        assert_eq!(Side::Buy, Side::Bid);
        assert_eq!(Side::Sell.opposite(), Side::Bid);
        Side::parse("hold").unwrap_err();
    }

    #[test]
    fn side_wire_names() {
        assert_eq!(serde_json::to_string(&Side::Buy).expect("json"), "\"BID\"");
        let side: Side = serde_json::from_str("\"SELL\"").expect("alias");
        assert_eq!(side, Side::Ask);
        assert_eq!(Side::Bid.to_string(), "BID");
    }

    #[test]
    fn tpsl_builder_keeps_insertion_order() {
        let base = TpslConfig::new().add_take_profit(dec!(110), None);
        let extended = base.clone().add_stop_loss(dec!(90), Some(dec!(0.5)));

        assert_eq!(base.legs().len(), 1, "earlier value is untouched");
        let kinds: Vec<_> = extended.legs().iter().map(|leg| leg.kind).collect();
        assert_eq!(kinds, vec![TpslKind::TakeProfit, TpslKind::StopLoss]);
        assert_eq!(extended.legs()[1].quantity, Some(dec!(0.5)));
    }

    #[test]
    fn twap_config_wire_shape() {
        let json =
            serde_json::to_value(TwapConfig::new(5, TwapQuantityMode::Fixed)).expect("json");
        assert_eq!(json, serde_json::json!({ "duration": 5, "quantityMode": "FIXED" }));
    }
}
