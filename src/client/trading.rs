use reqwest::{Client as ReqwestClient, StatusCode};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::Result;
use crate::client::{ClientConfig, OrderOverrides, PlacedOrder, UpdateFill};
use crate::error::Error;
use crate::instrument::Instruments;
use crate::intent::{CancelOrder, CreateOrder, OrderChanges, OrderIntent, UpdateOrder};
use crate::request::{RequestBuilder, SignedOperation, SignedRequest};
use crate::serde_helpers::deserialize_with_warnings;
use crate::signer::Signer;
use crate::transport::{RestTransport, Transport};
use crate::types::{
    BatchItemResult, BatchResponse, ExchangeInfo, OrderRef, OrderState, PlaceOrderResponse, Side,
};

/// Trading client for one account.
///
/// Signing happens locally and synchronously; the only suspension points are the
/// transport calls. Dropping a returned future after signing discards the signed
/// request, nothing is kept around for a retry.
#[derive(Debug)]
pub struct Client<T: Transport = RestTransport> {
    builder: RequestBuilder,
    transport: T,
    update_fill: UpdateFill,
}

impl Client<RestTransport> {
    /// Creates a REST client, fetching instrument metadata unless the policy fixes it.
    pub async fn bootstrap(config: ClientConfig) -> Result<Self> {
        Self::bootstrap_with_client(config, ReqwestClient::new()).await
    }

    /// Creates a REST client with a custom HTTP client.
    pub async fn bootstrap_with_client(
        config: ClientConfig,
        client: ReqwestClient,
    ) -> Result<Self> {
        let transport = RestTransport::with_client(
            config.api_endpoint.clone(),
            config.data_api_endpoint.clone(),
            config.api_key.clone(),
            config.account_id,
            client,
        );
        Client::bootstrap_with_transport(config, transport).await
    }
}

impl<T: Transport> Client<T> {
    pub async fn bootstrap_with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        let signer = Self::signer_from_config(&config)?;
        let instruments = match config.policies.instruments.into_fixed() {
            Some(instruments) => instruments,
            None => Instruments::from_exchange_info(&transport.exchange_info().await?)?,
        };

        Ok(Self {
            builder: RequestBuilder::new(config.account_id, signer, instruments),
            transport,
            update_fill: config.policies.update_fill,
        })
    }

    /// Creates a client from already known instruments, without any network call.
    pub fn with_transport(
        config: ClientConfig,
        transport: T,
        instruments: Instruments,
    ) -> Result<Self> {
        let signer = Self::signer_from_config(&config)?;
        Ok(Self {
            builder: RequestBuilder::new(config.account_id, signer, instruments),
            transport,
            update_fill: config.policies.update_fill,
        })
    }

    fn signer_from_config(config: &ClientConfig) -> Result<Option<Signer>> {
        config
            .private_key
            .as_ref()
            .map(Signer::from_secret)
            .transpose()
    }

    /// Replaces the instrument set used for encoding.
    #[must_use]
    pub fn with_instruments(mut self, instruments: Instruments) -> Self {
        self.builder.set_instruments(instruments);
        self
    }

    #[must_use]
    pub fn account_id(&self) -> u64 {
        self.builder.account_id()
    }

    #[must_use]
    pub fn instruments(&self) -> &Instruments {
        self.builder.instruments()
    }

    #[must_use]
    pub fn request_builder(&self) -> &RequestBuilder {
        &self.builder
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Re-reads contract metadata from the exchange, e.g. after a new listing.
    pub async fn refresh_instruments(&mut self) -> Result<&Instruments> {
        let info = self.transport.exchange_info().await?;
        let instruments = Instruments::from_exchange_info(&info)?;
        self.builder.set_instruments(instruments);
        Ok(self.builder.instruments())
    }

    pub async fn exchange_info(&self) -> Result<ExchangeInfo> {
        self.transport.exchange_info().await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    pub async fn order_details(&self, order: OrderRef) -> Result<OrderState> {
        self.transport.fetch_order(&order).await
    }

    pub async fn pending_orders(&self) -> Result<Vec<OrderState>> {
        self.transport.pending_orders().await
    }

    /// Places a market order. Setting a trigger price in `overrides` makes it a
    /// trigger market order.
    pub async fn place_market_order(
        &self,
        symbol: &str,
        quantity: Decimal,
        side: Side,
        max_fees_percent: Decimal,
        overrides: OrderOverrides,
    ) -> Result<PlacedOrder> {
        self.place_order(create_order(symbol, quantity, None, side, max_fees_percent, overrides))
            .await
    }

    pub async fn place_limit_order(
        &self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
        side: Side,
        max_fees_percent: Decimal,
        overrides: OrderOverrides,
    ) -> Result<PlacedOrder> {
        self.place_order(create_order(
            symbol,
            quantity,
            Some(price),
            side,
            max_fees_percent,
            overrides,
        ))
        .await
    }

    /// Signs and submits a new order. Orders with TPSL legs go out as one batch
    /// and the returned identity is the parent's.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    pub async fn place_order(&self, order: CreateOrder) -> Result<PlacedOrder> {
        let request = self.builder.sign_create(order)?;
        let nonce = first_nonce(&request)?;
        let response = self.transport.send(&request).await?;

        match request {
            SignedRequest::Batch(_) => {
                let response: BatchResponse = deserialize_with_warnings(response)?;
                let parent = accepted(response)?.into_iter().next();
                let order_id = match parent {
                    Some(BatchItemResult::Accepted { order_id, .. }) => order_id,
                    _ => None,
                };
                Ok(PlacedOrder { nonce, order_id })
            }
            _ => {
                let response: PlaceOrderResponse = deserialize_with_warnings(response)?;
                Ok(PlacedOrder {
                    nonce,
                    order_id: Some(response.order_id),
                })
            }
        }
    }

    /// Changes an existing order.
    ///
    /// Under [`UpdateFill::FetchCurrent`] the order is read first and every field not
    /// in `changes` keeps its current value. Under [`UpdateFill::Explicit`] this
    /// method refuses; build a complete [`UpdateOrder`] and use
    /// [`Client::submit_update`] instead.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    pub async fn update_order(
        &self,
        order: OrderRef,
        changes: OrderChanges,
        max_fees_percent: Decimal,
    ) -> Result<Value> {
        if self.update_fill == UpdateFill::Explicit {
            return Err(Error::validation(
                "update_fill policy is explicit: submit a complete UpdateOrder",
            ));
        }
        let update = self
            .builder
            .resolve_update(&self.transport, order, changes, max_fees_percent)
            .await?;
        self.submit_update(update).await
    }

    /// Signs and submits an update carrying the complete new order state.
    pub async fn submit_update(&self, update: UpdateOrder) -> Result<Value> {
        let request = self.builder.sign_update(update)?;
        self.transport.send(&request).await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    pub async fn cancel_order(&self, cancel: CancelOrder) -> Result<Value> {
        let request = self.builder.sign_cancel(cancel)?;
        self.transport.send(&request).await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    pub async fn cancel_all_orders(&self) -> Result<Value> {
        let request = self.builder.sign_cancel_all()?;
        self.transport.send(&request).await
    }

    /// Signs every intent and submits them as one atomic batch.
    ///
    /// Results are positional: `orders[i]` answers `intents[i]`. Creates with TPSL
    /// legs are refused here; place them with [`Client::place_order`].
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, intents), fields(count = intents.len()), err)
    )]
    pub async fn batch_orders(&self, intents: Vec<OrderIntent>) -> Result<BatchResponse> {
        let request = self.builder.build_batch(intents)?;
        let response = self.transport.send(&request).await?;
        deserialize_with_warnings(response)
    }
}

fn create_order(
    symbol: &str,
    quantity: Decimal,
    price: Option<Decimal>,
    side: Side,
    max_fees_percent: Decimal,
    overrides: OrderOverrides,
) -> CreateOrder {
    CreateOrder::builder()
        .symbol(symbol)
        .side(side)
        .quantity(quantity)
        .max_fees_percent(max_fees_percent)
        .maybe_price(price)
        .maybe_trigger_price(overrides.trigger_price)
        .maybe_creation_deadline(overrides.creation_deadline)
        .maybe_twap(overrides.twap)
        .maybe_tpsl(overrides.tpsl)
        .maybe_flags(overrides.flags)
        .maybe_nonce(overrides.nonce)
        .build()
}

fn first_nonce(request: &SignedRequest) -> Result<u64> {
    let operation = match request {
        SignedRequest::Single { operation, .. } => Some(operation),
        SignedRequest::Batch(envelope) => envelope.orders.first(),
        SignedRequest::CancelAll { body, .. } => return Ok(body.nonce),
    };
    operation
        .and_then(SignedOperation::nonce)
        .ok_or_else(|| Error::validation("signed request carries no nonce"))
}

/// Turns the first rejected batch item into an error tagged with its position.
fn accepted(response: BatchResponse) -> Result<Vec<BatchItemResult>> {
    if let Some((index, BatchItemResult::Rejected { error_code, message })) = response
        .orders
        .iter()
        .enumerate()
        .find(|(_, item)| !item.is_accepted())
    {
        return Err(
            Error::rejection(StatusCode::OK, Some(*error_code), message.clone()).at_index(index),
        );
    }
    Ok(response.orders)
}
