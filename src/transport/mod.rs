//! The seam between signed requests and the network.
//!
//! Nothing in this module decides anything about orders. A [`Transport`] moves a
//! [`SignedRequest`] to the exchange and brings back what the exchange said, and
//! reads the little order state the request builder needs to complete updates.

mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::request::SignedRequest;
use crate::types::{ExchangeInfo, OrderRef, OrderState};

pub use rest::RestTransport;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Submits a signed request and returns the raw response body.
    async fn send(&self, request: &SignedRequest) -> Result<Value>;

    /// Current state of one order of the configured account.
    async fn fetch_order(&self, order: &OrderRef) -> Result<OrderState>;

    async fn exchange_info(&self) -> Result<ExchangeInfo>;

    async fn pending_orders(&self) -> Result<Vec<OrderState>>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &SignedRequest) -> Result<Value> {
        (**self).send(request).await
    }

    async fn fetch_order(&self, order: &OrderRef) -> Result<OrderState> {
        (**self).fetch_order(order).await
    }

    async fn exchange_info(&self) -> Result<ExchangeInfo> {
        (**self).exchange_info().await
    }

    async fn pending_orders(&self) -> Result<Vec<OrderState>> {
        (**self).pending_orders().await
    }
}
