#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::sync::Mutex;

use async_trait::async_trait;
use hibachi_client_sdk::error::Error;
use hibachi_client_sdk::types::{ExchangeInfo, OrderRef, OrderState};
use hibachi_client_sdk::{Instrument, Instruments, Result, SignedRequest, Signer, Transport};
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde_json::{Value, json};

pub const ACCOUNT_ID: u64 = 128;
pub const API_KEY: &str = "test-api-key";
pub const ECDSA_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
pub const HMAC_KEY: &str = "dGVzdC1hcGktc2VjcmV0LWZvci1obWFj";

pub fn signer() -> Signer {
    Signer::from_secret(&SecretString::from(ECDSA_KEY)).expect("test key")
}

pub fn instruments() -> Instruments {
    Instruments::new([
        Instrument::builder()
            .id(1)
            .symbol("ETH/USDT-P")
            .underlying_decimals(9)
            .settlement_decimals(6)
            .tick_size(dec!(0.01))
            .step_size(dec!(0.000000001))
            .build(),
        Instrument::builder()
            .id(2)
            .symbol("BTC/USDT-P")
            .underlying_decimals(10)
            .settlement_decimals(6)
            .tick_size(dec!(0.01))
            .step_size(dec!(0.0000000001))
            .min_order_size(dec!(0.0000000001))
            .build(),
        Instrument::builder()
            .id(3)
            .symbol("SOL/USDT-P")
            .underlying_decimals(8)
            .settlement_decimals(6)
            .tick_size(dec!(0.001))
            .step_size(dec!(0.00000001))
            .build(),
    ])
    .expect("valid instruments")
}

pub fn exchange_info_json() -> Value {
    json!({
        "feeConfig": {
            "depositFees": "0.004",
            "instantWithdrawalFees": [[1000, 0.002], [100, 0.004]],
            "tradeMakerFeeRate": "0.00015",
            "tradeTakerFeeRate": "0.00045",
            "transferFeeRate": "0.00001",
            "withdrawalFees": "0.02"
        },
        "futureContracts": [
            {
                "id": 2,
                "symbol": "BTC/USDT-P",
                "underlyingDecimals": 10,
                "settlementDecimals": 6,
                "tickSize": "0.01",
                "stepSize": "0.0000000001",
                "minOrderSize": "0.0000000001",
                "minNotional": "1",
                "status": "LIVE"
            },
            {
                "id": 3,
                "symbol": "SOL/USDT-P",
                "underlyingDecimals": 8,
                "settlementDecimals": 6,
                "tickSize": "0.001",
                "stepSize": "0.00000001",
                "status": "LIVE"
            }
        ],
        "maintenanceWindow": [],
        "status": "NORMAL"
    })
}

pub fn order_state_json(order_id: u64, nonce: u64) -> Value {
    json!({
        "accountId": ACCOUNT_ID,
        "orderId": order_id.to_string(),
        "nonce": nonce,
        "symbol": "SOL/USDT-P",
        "side": "BID",
        "orderType": "LIMIT",
        "status": "PLACED",
        "totalQuantity": "0.02",
        "availableQuantity": "0.015",
        "price": "150.000",
        "orderFlags": "PostOnly",
        "creationTime": 1_714_701_600
    })
}

/// In-memory transport that records what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<SignedRequest>>,
    pub fetched: Mutex<Vec<OrderRef>>,
    pub order: Option<Value>,
    pub response: Value,
}

impl RecordingTransport {
    pub fn answering(response: Value) -> Self {
        Self {
            response,
            ..Self::default()
        }
    }

    pub fn with_order(mut self, order: Value) -> Self {
        self.order = Some(order);
        self
    }

    pub fn sent(&self) -> Vec<SignedRequest> {
        self.sent.lock().expect("lock").clone()
    }

    pub fn fetched(&self) -> Vec<OrderRef> {
        self.fetched.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: &SignedRequest) -> Result<Value> {
        self.sent.lock().expect("lock").push(request.clone());
        Ok(self.response.clone())
    }

    async fn fetch_order(&self, order: &OrderRef) -> Result<OrderState> {
        self.fetched.lock().expect("lock").push(*order);
        let state = self
            .order
            .clone()
            .ok_or_else(|| Error::validation("no order state recorded"))?;
        Ok(serde_json::from_value(state)?)
    }

    async fn exchange_info(&self) -> Result<ExchangeInfo> {
        Ok(serde_json::from_value(exchange_info_json())?)
    }

    async fn pending_orders(&self) -> Result<Vec<OrderState>> {
        Ok(self.order.clone().map_or_else(Vec::new, |order| {
            serde_json::from_value(order).map_or_else(|_| Vec::new(), |state| vec![state])
        }))
    }
}
