//! Order operations as the caller describes them, before nonces and signatures.

use bon::Builder;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::Result;
use crate::codec::{self, OrderFields};
use crate::error::Error;
use crate::instrument::Instruments;
use crate::types::{OrderFlags, OrderKind, OrderRef, ParentLink, Side, TpslConfig, TwapConfig};

/// Anything that can be laid out as canonical bytes once its state is complete.
pub trait CanonicalPayload {
    fn canonical_bytes(&self, instruments: &Instruments) -> Result<Vec<u8>>;
}

/// A new order.
///
/// No price makes it a market order; a trigger price defers placement until the
/// market crosses it.
#[non_exhaustive]
#[derive(Builder, Clone, Debug, PartialEq)]
#[builder(on(String, into))]
pub struct CreateOrder {
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub max_fees_percent: Decimal,
    pub price: Option<Decimal>,
    pub trigger_price: Option<Decimal>,
    pub creation_deadline: Option<DateTime<Utc>>,
    pub twap: Option<TwapConfig>,
    pub tpsl: Option<TpslConfig>,
    pub flags: Option<OrderFlags>,
    /// Left empty, the request builder assigns a fresh one.
    pub nonce: Option<u64>,
    #[builder(skip)]
    pub(crate) parent: Option<ParentLink>,
}

impl CreateOrder {
    #[must_use]
    pub fn kind(&self) -> OrderKind {
        match (self.price, self.trigger_price, self.twap) {
            (_, _, Some(_)) => OrderKind::Twap,
            (None, None, None) => OrderKind::Market,
            (Some(_), None, None) => OrderKind::Limit,
            (None, Some(_), None) => OrderKind::TriggerMarket,
            (Some(_), Some(_), None) => OrderKind::TriggerLimit,
        }
    }

    #[must_use]
    pub fn parent(&self) -> Option<ParentLink> {
        self.parent
    }

    fn fields(&self) -> Result<OrderFields<'_>> {
        let nonce = self
            .nonce
            .ok_or_else(|| Error::validation("create order has no nonce assigned"))?;
        Ok(OrderFields {
            nonce,
            symbol: &self.symbol,
            side: self.side,
            quantity: self.quantity,
            price: self.price,
            trigger_price: self.trigger_price,
            max_fees_percent: self.max_fees_percent,
            creation_deadline: self.creation_deadline,
            twap: self.twap,
            flags: self.flags,
            parent: self.parent,
        })
    }
}

impl CanonicalPayload for CreateOrder {
    fn canonical_bytes(&self, instruments: &Instruments) -> Result<Vec<u8>> {
        codec::encode_create(instruments, &self.fields()?)
    }
}

/// Replacement state for an existing order.
///
/// The signature covers the complete new state, so symbol, side, quantity and
/// fees are always required, and price / trigger price must be re-supplied to be
/// kept.
#[non_exhaustive]
#[derive(Builder, Clone, Debug, PartialEq)]
#[builder(on(String, into))]
pub struct UpdateOrder {
    pub order_id: Option<u64>,
    pub order_nonce: Option<u64>,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub max_fees_percent: Decimal,
    pub price: Option<Decimal>,
    pub trigger_price: Option<Decimal>,
    pub creation_deadline: Option<DateTime<Utc>>,
    pub flags: Option<OrderFlags>,
    pub nonce: Option<u64>,
}

impl UpdateOrder {
    /// Identity of the order being replaced, preferring the exchange id.
    pub fn target(&self) -> Result<OrderRef> {
        match (self.order_id, self.order_nonce) {
            (Some(id), _) => Ok(OrderRef::Id(id)),
            (None, Some(nonce)) => Ok(OrderRef::Nonce(nonce)),
            (None, None) => Err(Error::validation(
                "update order needs an order_id or order_nonce",
            )),
        }
    }

    fn fields(&self) -> Result<OrderFields<'_>> {
        let nonce = self
            .nonce
            .ok_or_else(|| Error::validation("update order has no nonce assigned"))?;
        Ok(OrderFields {
            nonce,
            symbol: &self.symbol,
            side: self.side,
            quantity: self.quantity,
            price: self.price,
            trigger_price: self.trigger_price,
            max_fees_percent: self.max_fees_percent,
            creation_deadline: self.creation_deadline,
            twap: None,
            flags: self.flags,
            parent: None,
        })
    }
}

impl CanonicalPayload for UpdateOrder {
    fn canonical_bytes(&self, instruments: &Instruments) -> Result<Vec<u8>> {
        self.target()?;
        codec::encode_update(instruments, self.order_id, self.order_nonce, &self.fields()?)
    }
}

/// Fields a caller wants changed on an existing order. Anything left empty is
/// taken from the order's current state when the update is resolved.
#[non_exhaustive]
#[derive(Builder, Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct OrderChanges {
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub trigger_price: Option<Decimal>,
}

/// Cancellation by exchange id, by nonce, or both for cross-checking.
#[non_exhaustive]
#[derive(Builder, Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CancelOrder {
    pub order_id: Option<u64>,
    pub order_nonce: Option<u64>,
}

impl CancelOrder {
    #[must_use]
    pub fn by_id(order_id: u64) -> Self {
        Self {
            order_id: Some(order_id),
            order_nonce: None,
        }
    }

    #[must_use]
    pub fn by_nonce(order_nonce: u64) -> Self {
        Self {
            order_id: None,
            order_nonce: Some(order_nonce),
        }
    }

    fn ensure_identity(self) -> Result<()> {
        if self.order_id.is_none() && self.order_nonce.is_none() {
            return Err(Error::validation(
                "cancel order needs an order_id or order_nonce",
            ));
        }
        Ok(())
    }
}

impl From<OrderRef> for CancelOrder {
    fn from(order: OrderRef) -> Self {
        match order {
            OrderRef::Id(id) => CancelOrder::by_id(id),
            OrderRef::Nonce(nonce) => CancelOrder::by_nonce(nonce),
        }
    }
}

impl CanonicalPayload for CancelOrder {
    fn canonical_bytes(&self, _instruments: &Instruments) -> Result<Vec<u8>> {
        self.ensure_identity()?;
        Ok(codec::encode_cancel(self.order_id, self.order_nonce))
    }
}

/// One entry of a batch.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub enum OrderIntent {
    Create(CreateOrder),
    Update(UpdateOrder),
    Cancel(CancelOrder),
}

impl OrderIntent {
    /// Fails when an update or cancel does not say which order it targets.
    pub fn validate_identity(&self) -> Result<()> {
        match self {
            OrderIntent::Create(_) => Ok(()),
            OrderIntent::Update(update) => update.target().map(|_| ()),
            OrderIntent::Cancel(cancel) => cancel.ensure_identity(),
        }
    }
}

impl CanonicalPayload for OrderIntent {
    fn canonical_bytes(&self, instruments: &Instruments) -> Result<Vec<u8>> {
        match self {
            OrderIntent::Create(create) => create.canonical_bytes(instruments),
            OrderIntent::Update(update) => update.canonical_bytes(instruments),
            OrderIntent::Cancel(cancel) => cancel.canonical_bytes(instruments),
        }
    }
}

impl From<CreateOrder> for OrderIntent {
    fn from(order: CreateOrder) -> Self {
        OrderIntent::Create(order)
    }
}

impl From<UpdateOrder> for OrderIntent {
    fn from(order: UpdateOrder) -> Self {
        OrderIntent::Update(order)
    }
}

impl From<CancelOrder> for OrderIntent {
    fn from(order: CancelOrder) -> Self {
        OrderIntent::Cancel(order)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::codec::{SET, TAG_CREATE, TAG_UPDATE, UNSET};
    use crate::error::Kind;
    use crate::instrument::Instrument;

    fn instruments() -> Instruments {
        Instruments::new([Instrument::builder()
            .id(2)
            .symbol("BTC/USDT-P")
            .underlying_decimals(10)
            .settlement_decimals(6)
            .tick_size(dec!(0.01))
            .step_size(dec!(0.0000000001))
            .build()])
        .expect("valid")
    }

    fn sell(price: Option<Decimal>, trigger_price: Option<Decimal>) -> CreateOrder {
        CreateOrder::builder()
            .symbol("BTC/USDT-P")
            .side(Side::Sell)
            .quantity(dec!(0.001))
            .max_fees_percent(dec!(0.0005))
            .maybe_price(price)
            .maybe_trigger_price(trigger_price)
            .nonce(42)
            .build()
    }

    /// Offset of the price marker: tag, nonce, contract, quantity, side.
    const PRICE_MARKER: usize = 1 + 8 + 4 + 8 + 4;

    #[test]
    fn trigger_without_price_is_trigger_market() {
        let order = sell(None, Some(dec!(85000)));
        assert_eq!(order.kind(), OrderKind::TriggerMarket);

        let bytes = order.canonical_bytes(&instruments()).expect("encode");
        assert_eq!(bytes[0], TAG_CREATE);
        assert_eq!(bytes[PRICE_MARKER], UNSET, "no price");
        assert_eq!(bytes[PRICE_MARKER + 1], SET, "trigger present");
    }

    #[test]
    fn trigger_with_price_is_trigger_limit() {
        let order = sell(Some(dec!(84750)), Some(dec!(85000)));
        assert_eq!(order.kind(), OrderKind::TriggerLimit);

        let bytes = order.canonical_bytes(&instruments()).expect("encode");
        assert_eq!(bytes[PRICE_MARKER], SET, "price present");
        assert_eq!(bytes[PRICE_MARKER + 9], SET, "trigger present");
    }

    #[test]
    fn plain_kinds() {
        assert_eq!(sell(None, None).kind(), OrderKind::Market);
        assert_eq!(sell(Some(dec!(90000)), None).kind(), OrderKind::Limit);
    }

    #[test]
    fn create_without_nonce_is_not_encodable() {
        let mut order = sell(None, None);
        order.nonce = None;
        let err = order.canonical_bytes(&instruments()).unwrap_err();
        assert_eq!(err.kind(), Kind::Validation);
    }

    #[test]
    fn update_requires_identity() {
        let update = UpdateOrder::builder()
            .symbol("BTC/USDT-P")
            .side(Side::Buy)
            .quantity(dec!(0.001))
            .max_fees_percent(dec!(0.0005))
            .price(dec!(60000))
            .nonce(43)
            .build();
        let err = update.canonical_bytes(&instruments()).unwrap_err();
        assert_eq!(err.kind(), Kind::Validation);

        let update = UpdateOrder {
            order_id: Some(9),
            ..update
        };
        let bytes = update.canonical_bytes(&instruments()).expect("encode");
        assert_eq!(&bytes[..2], &[TAG_UPDATE, SET]);
        assert_eq!(update.target().expect("target"), OrderRef::Id(9));
    }

    #[test]
    fn cancel_accepts_either_identity() {
        let instruments = instruments();
        CancelOrder::by_nonce(5)
            .canonical_bytes(&instruments)
            .expect("nonce only");
        CancelOrder::by_id(5)
            .canonical_bytes(&instruments)
            .expect("id only");
        CancelOrder::builder()
            .order_id(5)
            .order_nonce(6)
            .build()
            .canonical_bytes(&instruments)
            .expect("both");

        let err = CancelOrder::default()
            .canonical_bytes(&instruments)
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Validation);
    }
}
