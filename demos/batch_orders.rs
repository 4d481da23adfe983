//! Places, modifies and cancels orders in one atomic batch.
//!
//! Reads `HIBACHI_API_KEY`, `HIBACHI_ACCOUNT_ID`, `HIBACHI_PRIVATE_KEY` and optionally
//! `HIBACHI_API_ENDPOINT` / `HIBACHI_DATA_API_ENDPOINT` from the environment.

use std::env;

use hibachi_client_sdk::client::{ClientPolicies, RawClientConfig};
use hibachi_client_sdk::types::{BatchItemResult, Side, TwapConfig, TwapQuantityMode};
use hibachi_client_sdk::{
    CancelOrder, Client, ClientConfig, CreateOrder, OrderIntent, UpdateOrder,
};
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let raw: RawClientConfig = serde_json::from_value(serde_json::json!({
        "api_endpoint": env::var("HIBACHI_API_ENDPOINT").ok(),
        "data_api_endpoint": env::var("HIBACHI_DATA_API_ENDPOINT").ok(),
        "api_key": env::var("HIBACHI_API_KEY")?,
        "account_id": env::var("HIBACHI_ACCOUNT_ID")?,
        "private_key": env::var("HIBACHI_PRIVATE_KEY")?,
    }))?;
    let config = ClientConfig::from_raw(raw, ClientPolicies::default())?;
    let client = Client::bootstrap(config).await?;

    let info = client.exchange_info().await?;
    let max_fees_percent = info.fee_config.trade_taker_fee_rate * dec!(2);

    let open = client.pending_orders().await?;
    tracing::info!(count = open.len(), "pending orders before batch");

    let mut intents: Vec<OrderIntent> = vec![
        CreateOrder::builder()
            .symbol("BTC/USDT-P")
            .side(Side::Buy)
            .quantity(dec!(0.0001))
            .max_fees_percent(max_fees_percent)
            .build()
            .into(),
        CreateOrder::builder()
            .symbol("ETH/USDT-P")
            .side(Side::Sell)
            .quantity(dec!(0.002))
            .price(dec!(4000))
            .max_fees_percent(max_fees_percent)
            .build()
            .into(),
        CreateOrder::builder()
            .symbol("SOL/USDT-P")
            .side(Side::Buy)
            .quantity(dec!(1))
            .twap(TwapConfig::new(10, TwapQuantityMode::Fixed))
            .max_fees_percent(max_fees_percent)
            .build()
            .into(),
    ];

    if let Some(order) = open.first() {
        intents.push(
            UpdateOrder::builder()
                .order_id(order.order_id)
                .symbol(order.symbol.clone())
                .side(order.side)
                .quantity(order.available_quantity.unwrap_or(dec!(0.001)))
                .maybe_price(order.price)
                .maybe_trigger_price(order.trigger_price)
                .max_fees_percent(max_fees_percent)
                .build()
                .into(),
        );
    }
    if let Some(order) = open.get(1) {
        intents.push(CancelOrder::by_id(order.order_id).into());
    }

    let response = client.batch_orders(intents).await?;
    for (position, item) in response.orders.iter().enumerate() {
        match item {
            BatchItemResult::Accepted { order_id, nonce } => {
                tracing::info!(position, ?order_id, ?nonce, "accepted");
            }
            BatchItemResult::Rejected {
                error_code,
                message,
            } => {
                tracing::warn!(position, error_code, %message, "rejected");
            }
            _ => tracing::warn!(position, ?item, "unrecognised batch result"),
        }
    }
    Ok(())
}
