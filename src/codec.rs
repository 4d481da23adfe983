//! Canonical byte layout signed for every order operation.
//!
//! All integers are big-endian and fields are written in a fixed order. Optional
//! fields are preceded by a marker byte: [`UNSET`] with nothing following, or
//! [`SET`] followed by the value, so a legitimate zero never reads as "absent".
//!
//! | tag  | body |
//! |------|------|
//! | `0x01` create | order fields |
//! | `0x02` update | `opt<order id u64>`, `opt<order nonce u64>`, order fields |
//! | `0x03` cancel | `opt<order id u64>`, `opt<order nonce u64>` |
//! | `0x04` cancel all | `nonce u64` |
//!
//! Order fields: `nonce u64`, `contract id u32`, `quantity u64`, `side u32`,
//! `opt<price u64>`, `opt<trigger price u64>`, `max fees u64`,
//! `opt<creation deadline u64>`, `opt<twap (duration u32, mode u8)>`,
//! `opt<flags u8>`, `opt<parent (nonce u64, kind u8)>`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive as _;

use crate::Result;
use crate::error::Error;
use crate::instrument::{Instrument, Instruments};
use crate::types::{OrderFlags, ParentLink, Side, TwapConfig};

pub const TAG_CREATE: u8 = 0x01;
pub const TAG_UPDATE: u8 = 0x02;
pub const TAG_CANCEL: u8 = 0x03;
pub const TAG_CANCEL_ALL: u8 = 0x04;

pub const UNSET: u8 = 0x00;
pub const SET: u8 = 0x01;

/// Fees are sent with eight implied decimals.
const FEE_DECIMALS: u32 = 8;
/// Prices carry a 32-bit binary fraction on the exchange side.
const PRICE_BINARY_SCALE: u64 = 1 << 32;

/// Converts a quantity into base units of the underlying asset.
pub fn quantity_to_fixed(instrument: &Instrument, quantity: Decimal) -> Result<u64> {
    if quantity <= Decimal::ZERO {
        return Err(Error::encoding(
            "quantity",
            format!("must be positive, got {quantity}"),
        ));
    }
    ensure_multiple("quantity", quantity, instrument.step_size)?;

    let scaled = quantity
        .checked_mul(pow10("quantity", instrument.underlying_decimals)?)
        .ok_or_else(|| Error::encoding("quantity", format!("{quantity} overflows")))?;
    if !scaled.fract().is_zero() {
        return Err(Error::encoding(
            "quantity",
            format!(
                "{quantity} is finer than {} underlying decimals",
                instrument.underlying_decimals
            ),
        ));
    }
    to_u64("quantity", scaled)
}

/// Converts a price into the exchange's fixed-point representation:
/// `trunc(price * 2^32 * 10^(settlement_decimals - underlying_decimals))`.
pub fn price_to_fixed(field: &'static str, instrument: &Instrument, price: Decimal) -> Result<u64> {
    if price <= Decimal::ZERO {
        return Err(Error::encoding(field, format!("must be positive, got {price}")));
    }
    ensure_multiple(field, price, instrument.tick_size)?;

    let overflow = || Error::encoding(field, format!("{price} overflows"));
    let binary = price
        .checked_mul(Decimal::from(PRICE_BINARY_SCALE))
        .ok_or_else(overflow)?;
    let scaled = if instrument.settlement_decimals >= instrument.underlying_decimals {
        let factor = pow10(
            field,
            instrument.settlement_decimals - instrument.underlying_decimals,
        )?;
        binary.checked_mul(factor).ok_or_else(overflow)?
    } else {
        let divisor = pow10(
            field,
            instrument.underlying_decimals - instrument.settlement_decimals,
        )?;
        binary.checked_div(divisor).ok_or_else(overflow)?
    };
    to_u64(field, scaled.trunc())
}

pub fn fees_to_fixed(max_fees_percent: Decimal) -> Result<u64> {
    const FIELD: &str = "max_fees_percent";

    if max_fees_percent.is_sign_negative() {
        return Err(Error::encoding(
            FIELD,
            format!("cannot be negative, got {max_fees_percent}"),
        ));
    }
    if max_fees_percent.normalize().scale() > FEE_DECIMALS {
        return Err(Error::encoding(
            FIELD,
            format!("{max_fees_percent} has more than {FEE_DECIMALS} decimal places"),
        ));
    }
    let scaled = max_fees_percent
        .checked_mul(pow10(FIELD, FEE_DECIMALS)?)
        .ok_or_else(|| Error::encoding(FIELD, format!("{max_fees_percent} overflows")))?;
    to_u64(FIELD, scaled)
}

pub fn deadline_to_fixed(deadline: DateTime<Utc>) -> Result<u64> {
    u64::try_from(deadline.timestamp()).map_err(|e| {
        Error::encoding(
            "creation_deadline",
            format!("{deadline} is before the unix epoch: {e}"),
        )
    })
}

fn ensure_multiple(field: &'static str, value: Decimal, granularity: Decimal) -> Result<()> {
    let remainder = value.checked_rem(granularity).ok_or_else(|| {
        Error::encoding(field, format!("cannot check {value} against {granularity}"))
    })?;
    if remainder.is_zero() {
        Ok(())
    } else {
        Err(Error::encoding(
            field,
            format!("{value} is not a multiple of {granularity}"),
        ))
    }
}

fn pow10(field: &'static str, exp: u32) -> Result<Decimal> {
    10_u64
        .checked_pow(exp)
        .map(Decimal::from)
        .ok_or_else(|| Error::encoding(field, format!("10^{exp} exceeds supported precision")))
}

fn to_u64(field: &'static str, value: Decimal) -> Result<u64> {
    value
        .to_u64()
        .ok_or_else(|| Error::encoding(field, format!("{value} does not fit in u64")))
}

/// Fully resolved state of a create or update, ready to be laid out.
#[derive(Clone, Copy, Debug)]
pub(crate) struct OrderFields<'a> {
    pub nonce: u64,
    pub symbol: &'a str,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub trigger_price: Option<Decimal>,
    pub max_fees_percent: Decimal,
    pub creation_deadline: Option<DateTime<Utc>>,
    pub twap: Option<TwapConfig>,
    pub flags: Option<OrderFlags>,
    pub parent: Option<ParentLink>,
}

pub(crate) fn encode_create(instruments: &Instruments, fields: &OrderFields<'_>) -> Result<Vec<u8>> {
    let mut writer = PayloadWriter::new(TAG_CREATE);
    writer.order_fields(instruments, fields)?;
    Ok(writer.finish())
}

pub(crate) fn encode_update(
    instruments: &Instruments,
    order_id: Option<u64>,
    order_nonce: Option<u64>,
    fields: &OrderFields<'_>,
) -> Result<Vec<u8>> {
    let mut writer = PayloadWriter::new(TAG_UPDATE);
    writer.opt_u64(order_id);
    writer.opt_u64(order_nonce);
    writer.order_fields(instruments, fields)?;
    Ok(writer.finish())
}

pub(crate) fn encode_cancel(order_id: Option<u64>, order_nonce: Option<u64>) -> Vec<u8> {
    let mut writer = PayloadWriter::new(TAG_CANCEL);
    writer.opt_u64(order_id);
    writer.opt_u64(order_nonce);
    writer.finish()
}

pub(crate) fn encode_cancel_all(nonce: u64) -> Vec<u8> {
    let mut writer = PayloadWriter::new(TAG_CANCEL_ALL);
    writer.u64(nonce);
    writer.finish()
}

/// Append-only big-endian writer; one per payload, never shared.
struct PayloadWriter {
    buf: Vec<u8>,
}

impl PayloadWriter {
    fn new(tag: u8) -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.push(tag);
        Self { buf }
    }

    fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn opt_u64(&mut self, value: Option<u64>) {
        match value {
            Some(v) => {
                self.u8(SET);
                self.u64(v);
            }
            None => self.u8(UNSET),
        }
    }

    fn order_fields(&mut self, instruments: &Instruments, fields: &OrderFields<'_>) -> Result<()> {
        let instrument = instruments.get(fields.symbol)?;

        // Convert everything before writing so a failure never leaves a half-built payload.
        let quantity = quantity_to_fixed(instrument, fields.quantity)?;
        let price = fields
            .price
            .map(|p| price_to_fixed("price", instrument, p))
            .transpose()?;
        let trigger_price = fields
            .trigger_price
            .map(|p| price_to_fixed("trigger_price", instrument, p))
            .transpose()?;
        let max_fees = fees_to_fixed(fields.max_fees_percent)?;
        let deadline = fields.creation_deadline.map(deadline_to_fixed).transpose()?;

        self.u64(fields.nonce);
        self.u32(instrument.id);
        self.u64(quantity);
        self.u32(fields.side.code());
        self.opt_u64(price);
        self.opt_u64(trigger_price);
        self.u64(max_fees);
        self.opt_u64(deadline);
        match fields.twap {
            Some(twap) => {
                self.u8(SET);
                self.u32(twap.duration_minutes);
                self.u8(twap.quantity_mode.code());
            }
            None => self.u8(UNSET),
        }
        match fields.flags {
            Some(flags) => {
                self.u8(SET);
                self.u8(flags.code());
            }
            None => self.u8(UNSET),
        }
        match fields.parent {
            Some(parent) => {
                self.u8(SET);
                self.u64(parent.nonce);
                self.u8(parent.kind.code());
            }
            None => self.u8(UNSET),
        }
        Ok(())
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::error::{Encoding, Kind};
    use crate::types::{TpslKind, TwapQuantityMode};

    fn btc() -> Instrument {
        Instrument::builder()
            .id(2)
            .symbol("BTC/USDT-P")
            .underlying_decimals(10)
            .settlement_decimals(6)
            .tick_size(dec!(0.5))
            .step_size(dec!(0.0000000001))
            .build()
    }

    fn instruments() -> Instruments {
        Instruments::new([btc()]).expect("valid instruments")
    }

    fn market_buy() -> OrderFields<'static> {
        OrderFields {
            nonce: 1_714_701_600_000_000,
            symbol: "BTC/USDT-P",
            side: Side::Buy,
            quantity: dec!(0.0001),
            price: None,
            trigger_price: None,
            max_fees_percent: dec!(0.0005),
            creation_deadline: None,
            twap: None,
            flags: None,
            parent: None,
        }
    }

    fn failed_field(err: &Error) -> &'static str {
        assert_eq!(err.kind(), Kind::Encoding);
        err.downcast_ref::<Encoding>().expect("encoding source").field
    }

    #[test]
    fn fixed_point_conversions() {
        let btc = btc();
        assert_eq!(quantity_to_fixed(&btc, dec!(0.0001)).expect("qty"), 1_000_000);
        // 90000 * 2^32 / 10^4
        assert_eq!(
            price_to_fixed("price", &btc, dec!(90000)).expect("price"),
            9 * (1_u64 << 32)
        );
        assert_eq!(fees_to_fixed(dec!(0.0005)).expect("fees"), 50_000);
        assert_eq!(fees_to_fixed(Decimal::ZERO).expect("fees"), 0);
    }

    #[test]
    fn precision_beyond_instrument_is_rejected() {
        let btc = btc();
        let err = price_to_fixed("price", &btc, dec!(90000.25)).unwrap_err();
        assert_eq!(failed_field(&err), "price");

        let err = quantity_to_fixed(&btc, dec!(0.00000000001)).unwrap_err();
        assert_eq!(failed_field(&err), "quantity");

        let err = quantity_to_fixed(&btc, Decimal::ZERO).unwrap_err();
        assert_eq!(failed_field(&err), "quantity");

        let err = fees_to_fixed(dec!(0.000000001)).unwrap_err();
        assert_eq!(failed_field(&err), "max_fees_percent");
    }

    #[test]
    fn market_order_layout() {
        let bytes = encode_create(&instruments(), &market_buy()).expect("encode");

        let mut expected = vec![TAG_CREATE];
        expected.extend_from_slice(&1_714_701_600_000_000_u64.to_be_bytes());
        expected.extend_from_slice(&2_u32.to_be_bytes());
        expected.extend_from_slice(&1_000_000_u64.to_be_bytes());
        expected.extend_from_slice(&1_u32.to_be_bytes());
        expected.push(UNSET); // price
        expected.push(UNSET); // trigger
        expected.extend_from_slice(&50_000_u64.to_be_bytes());
        expected.extend_from_slice(&[UNSET, UNSET, UNSET, UNSET]); // deadline, twap, flags, parent

        assert_eq!(bytes, expected);
    }

    #[test]
    fn linked_twap_child_layout() {
        let fields = OrderFields {
            nonce: 1_714_701_600_000_002,
            side: Side::Sell,
            trigger_price: Some(dec!(90000)),
            twap: Some(TwapConfig::new(5, TwapQuantityMode::Random)),
            flags: Some(OrderFlags::ReduceOnly),
            parent: Some(ParentLink {
                nonce: 1_714_701_600_000_000,
                kind: TpslKind::StopLoss,
            }),
            ..market_buy()
        };
        let bytes = encode_create(&instruments(), &fields).expect("encode");

        let mut expected = vec![TAG_CREATE];
        expected.extend_from_slice(&1_714_701_600_000_002_u64.to_be_bytes());
        expected.extend_from_slice(&2_u32.to_be_bytes());
        expected.extend_from_slice(&1_000_000_u64.to_be_bytes());
        expected.extend_from_slice(&0_u32.to_be_bytes()); // ask
        expected.push(UNSET); // price
        expected.push(SET);
        expected.extend_from_slice(&(9_u64 << 32).to_be_bytes());
        expected.extend_from_slice(&50_000_u64.to_be_bytes());
        expected.push(UNSET); // deadline
        expected.push(SET);
        expected.extend_from_slice(&5_u32.to_be_bytes());
        expected.push(1); // random
        expected.extend_from_slice(&[SET, 3]); // reduce only
        expected.push(SET);
        expected.extend_from_slice(&1_714_701_600_000_000_u64.to_be_bytes());
        expected.push(2); // stop loss

        assert_eq!(bytes, expected);
    }

    #[test]
    fn encoding_is_deterministic() {
        let fields = OrderFields {
            price: Some(dec!(84750)),
            trigger_price: Some(dec!(85000)),
            twap: Some(TwapConfig::new(5, TwapQuantityMode::Random)),
            flags: Some(OrderFlags::ReduceOnly),
            ..market_buy()
        };
        let first = encode_create(&instruments(), &fields).expect("encode");
        let second = encode_create(&instruments(), &fields).expect("encode");
        assert_eq!(first, second);
    }

    #[test]
    fn unset_and_zero_deadline_differ() {
        let unset = encode_create(&instruments(), &market_buy()).expect("encode");
        let zero = encode_create(
            &instruments(),
            &OrderFields {
                creation_deadline: Some(DateTime::<Utc>::UNIX_EPOCH),
                ..market_buy()
            },
        )
        .expect("encode");
        assert_ne!(unset, zero);
        assert_eq!(zero.len(), unset.len() + 8);
    }

    #[test]
    fn unknown_symbol_fails() {
        let fields = OrderFields {
            symbol: "DOGE/USDT-P",
            ..market_buy()
        };
        let err = encode_create(&instruments(), &fields).unwrap_err();
        assert_eq!(failed_field(&err), "symbol");
    }

    #[test]
    fn cancel_layouts() {
        assert_eq!(
            encode_cancel(None, Some(7)),
            vec![TAG_CANCEL, UNSET, SET, 0, 0, 0, 0, 0, 0, 0, 7]
        );
        assert_eq!(
            encode_cancel(Some(7), None),
            vec![TAG_CANCEL, SET, 0, 0, 0, 0, 0, 0, 0, 7, UNSET]
        );
        assert_eq!(encode_cancel_all(1).len(), 9);
    }
}
