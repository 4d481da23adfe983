use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::types::{OrderFlags, TpslConfig, TwapConfig};

/// Optional per-order settings on top of the required market or limit fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderOverrides {
    pub nonce: Option<u64>,
    pub trigger_price: Option<Decimal>,
    pub creation_deadline: Option<DateTime<Utc>>,
    pub twap: Option<TwapConfig>,
    pub tpsl: Option<TpslConfig>,
    pub flags: Option<OrderFlags>,
}

impl OrderOverrides {
    #[must_use]
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    #[must_use]
    pub fn with_trigger_price(mut self, trigger_price: Decimal) -> Self {
        self.trigger_price = Some(trigger_price);
        self
    }

    #[must_use]
    pub fn with_creation_deadline(mut self, creation_deadline: DateTime<Utc>) -> Self {
        self.creation_deadline = Some(creation_deadline);
        self
    }

    #[must_use]
    pub fn with_twap(mut self, twap: TwapConfig) -> Self {
        self.twap = Some(twap);
        self
    }

    #[must_use]
    pub fn with_tpsl(mut self, tpsl: TpslConfig) -> Self {
        self.tpsl = Some(tpsl);
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: OrderFlags) -> Self {
        self.flags = Some(flags);
        self
    }
}

/// Identity of an order the exchange accepted.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlacedOrder {
    pub nonce: u64,
    pub order_id: Option<u64>,
}
