//! Opens a position with attached take-profit and stop-loss legs.

use std::env;

use hibachi_client_sdk::client::OrderOverrides;
use hibachi_client_sdk::types::{OrderRef, Side, TpslConfig};
use hibachi_client_sdk::{Client, ClientConfig};
use rust_decimal_macros::dec;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ClientConfig::production(
        SecretString::from(env::var("HIBACHI_API_KEY")?),
        env::var("HIBACHI_ACCOUNT_ID")?.parse()?,
        Some(SecretString::from(env::var("HIBACHI_PRIVATE_KEY")?)),
    )?;
    let client = Client::bootstrap(config).await?;
    let info = client.exchange_info().await?;
    let max_fees_percent = info.fee_config.trade_taker_fee_rate * dec!(2);

    let entry = dec!(150);
    let quantity = dec!(0.02);

    // Quantities left empty close whatever the entry filled.
    let placed = client
        .place_limit_order(
            "SOL/USDT-P",
            quantity,
            entry,
            Side::Buy,
            max_fees_percent,
            OrderOverrides::default().with_tpsl(
                TpslConfig::new()
                    .add_take_profit(dec!(165), Some(dec!(0.005)))
                    .add_take_profit(dec!(180), None)
                    .add_stop_loss(dec!(135), None),
            ),
        )
        .await?;
    tracing::info!(nonce = placed.nonce, order_id = ?placed.order_id, "entry placed");

    let state = client.order_details(OrderRef::Nonce(placed.nonce)).await?;
    tracing::info!(status = %state.status, "entry status");
    Ok(())
}
