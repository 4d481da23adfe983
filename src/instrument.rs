//! Per-contract precision metadata used by the encoder.

use std::collections::HashMap;
use std::sync::Arc;

use bon::Builder;
use rust_decimal::Decimal;

use crate::Result;
use crate::error::Error;
use crate::types::{ExchangeInfo, FutureContract};

/// Precision and identity of one tradable contract.
#[non_exhaustive]
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
#[builder(on(String, into))]
pub struct Instrument {
    pub id: u32,
    pub symbol: String,
    pub underlying_decimals: u32,
    pub settlement_decimals: u32,
    pub tick_size: Decimal,
    pub step_size: Decimal,
    pub min_order_size: Option<Decimal>,
    pub min_notional: Option<Decimal>,
}

impl Instrument {
    fn validate(&self) -> Result<()> {
        if self.tick_size <= Decimal::ZERO {
            return Err(Error::validation(format!(
                "{}: tick size must be positive, got {}",
                self.symbol, self.tick_size
            )));
        }
        if self.step_size <= Decimal::ZERO {
            return Err(Error::validation(format!(
                "{}: step size must be positive, got {}",
                self.symbol, self.step_size
            )));
        }
        Ok(())
    }
}

impl From<&FutureContract> for Instrument {
    fn from(contract: &FutureContract) -> Self {
        Self {
            id: contract.id,
            symbol: contract.symbol.clone(),
            underlying_decimals: contract.underlying_decimals,
            settlement_decimals: contract.settlement_decimals,
            tick_size: contract.tick_size,
            step_size: contract.step_size,
            min_order_size: contract.min_order_size,
            min_notional: contract.min_notional,
        }
    }
}

/// Symbol-keyed instrument registry. Cheap to clone.
#[derive(Clone, Debug, Default)]
pub struct Instruments {
    by_symbol: Arc<HashMap<String, Instrument>>,
}

impl Instruments {
    pub fn new<I: IntoIterator<Item = Instrument>>(instruments: I) -> Result<Self> {
        let mut by_symbol = HashMap::new();
        for instrument in instruments {
            instrument.validate()?;
            by_symbol.insert(instrument.symbol.clone(), instrument);
        }
        Ok(Self {
            by_symbol: Arc::new(by_symbol),
        })
    }

    pub fn from_exchange_info(info: &ExchangeInfo) -> Result<Self> {
        Self::new(info.future_contracts.iter().map(Instrument::from))
    }

    pub fn get(&self, symbol: &str) -> Result<&Instrument> {
        self.by_symbol
            .get(symbol)
            .ok_or_else(|| Error::unknown_symbol(symbol))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}
