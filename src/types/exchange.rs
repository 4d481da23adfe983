//! Exchange metadata returned by `GET /market/exchange-info`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_with::{TimestampSecondsWithFrac, serde_as};

#[non_exhaustive]
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeInfo {
    pub fee_config: FeeConfig,
    pub future_contracts: Vec<FutureContract>,
    #[serde(default)]
    pub instant_withdrawal_limit: Option<InstantWithdrawalLimit>,
    #[serde(default, rename = "maintenanceWindow")]
    pub maintenance_windows: Vec<MaintenanceWindow>,
    #[serde(default)]
    pub status: Option<String>,
}

#[non_exhaustive]
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeeConfig {
    #[serde(default)]
    pub deposit_fees: Option<Decimal>,
    /// `(amount threshold, fee)` tiers for instant withdrawals.
    #[serde(default)]
    pub instant_withdrawal_fees: Vec<(Decimal, Decimal)>,
    pub trade_maker_fee_rate: Decimal,
    pub trade_taker_fee_rate: Decimal,
    #[serde(default)]
    pub transfer_fee_rate: Option<Decimal>,
    #[serde(default)]
    pub withdrawal_fees: Option<Decimal>,
}

#[non_exhaustive]
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstantWithdrawalLimit {
    pub lower_limit: Decimal,
    pub upper_limit: Decimal,
}

/// A perpetual contract listed on the exchange.
#[non_exhaustive]
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FutureContract {
    pub id: u32,
    pub symbol: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub underlying_symbol: Option<String>,
    #[serde(default)]
    pub settlement_symbol: Option<String>,
    pub underlying_decimals: u32,
    pub settlement_decimals: u32,
    pub tick_size: Decimal,
    pub step_size: Decimal,
    #[serde(default)]
    pub min_order_size: Option<Decimal>,
    #[serde(default)]
    pub min_notional: Option<Decimal>,
    #[serde(default)]
    pub initial_margin_rate: Option<Decimal>,
    #[serde(default)]
    pub maintenance_margin_rate: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
}

#[serde_as]
#[non_exhaustive]
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MaintenanceWindow {
    #[serde_as(as = "TimestampSecondsWithFrac<f64>")]
    pub begin: DateTime<Utc>,
    #[serde_as(as = "TimestampSecondsWithFrac<f64>")]
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub note: String,
}

impl MaintenanceWindow {
    #[must_use]
    pub fn new<S: Into<String>>(begin: DateTime<Utc>, end: DateTime<Utc>, note: S) -> Self {
        Self {
            begin,
            end,
            note: note.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn exchange_info_decodes_string_decimals() {
        let raw = serde_json::json!({
            "feeConfig": {
                "depositFees": "0.004",
                "instantWithdrawalFees": [[1000, 0.002], [100, 0.004]],
                "tradeMakerFeeRate": "0.00015",
                "tradeTakerFeeRate": "0.00045",
                "transferFeeRate": "0.00001",
                "withdrawalFees": "0.02"
            },
            "futureContracts": [{
                "id": 2,
                "symbol": "BTC/USDT-P",
                "displayName": "BTC/USDT Perps",
                "underlyingSymbol": "BTC",
                "settlementSymbol": "USDT",
                "underlyingDecimals": 10,
                "settlementDecimals": 6,
                "tickSize": "0.01",
                "stepSize": "0.0000000001",
                "minOrderSize": "0.0000000001",
                "minNotional": "1",
                "status": "LIVE"
            }],
            "maintenanceWindow": [{ "begin": 1750000000, "end": 1750003600.5, "note": "upgrade" }],
            "status": "NORMAL"
        });

        let info: ExchangeInfo = serde_json::from_value(raw).expect("decode");
        let btc = &info.future_contracts[0];
        assert_eq!(btc.tick_size, dec!(0.01));
        assert_eq!(btc.underlying_decimals, 10);
        assert_eq!(info.fee_config.trade_taker_fee_rate, dec!(0.00045));
        assert_eq!(info.fee_config.instant_withdrawal_fees[1], (dec!(100), dec!(0.004)));
        assert_eq!(info.maintenance_windows[0].begin.timestamp(), 1_750_000_000);
    }
}
