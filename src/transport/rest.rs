use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, Request};
use secrecy::{ExposeSecret as _, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::Result;
use crate::error::Error;
use crate::request::{SignedOperation, SignedRequest};
use crate::serde_helpers::deserialize_with_warnings;
use crate::transport::Transport;
use crate::types::{ExchangeInfo, OrderRef, OrderState};

/// [`Transport`] over the exchange REST API.
///
/// Trading and account endpoints live on the API host; market metadata is read
/// from the data API host. Every request carries the API key in `Authorization`.
#[derive(Clone, Debug)]
pub struct RestTransport {
    api_endpoint: Url,
    data_api_endpoint: Url,
    api_key: SecretString,
    account_id: u64,
    client: ReqwestClient,
}

impl RestTransport {
    #[must_use]
    pub fn new(
        api_endpoint: Url,
        data_api_endpoint: Url,
        api_key: SecretString,
        account_id: u64,
    ) -> Self {
        Self::with_client(
            api_endpoint,
            data_api_endpoint,
            api_key,
            account_id,
            ReqwestClient::new(),
        )
    }

    #[must_use]
    pub fn with_client(
        api_endpoint: Url,
        data_api_endpoint: Url,
        api_key: SecretString,
        account_id: u64,
        client: ReqwestClient,
    ) -> Self {
        Self {
            api_endpoint,
            data_api_endpoint,
            api_key,
            account_id,
            client,
        }
    }

    #[must_use]
    pub fn account_id(&self) -> u64 {
        self.account_id
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.api_endpoint.join(path)?)
    }

    fn data_endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.data_api_endpoint.join(path)?)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut value = HeaderValue::from_str(self.api_key.expose_secret())
            .map_err(|e| Error::validation(format!("api key is not a valid header value: {e}")))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    fn route(request: &SignedRequest) -> (Method, &'static str) {
        match request {
            SignedRequest::Single { operation, .. } => match operation {
                SignedOperation::Place(_) => (Method::POST, "trade/order"),
                SignedOperation::Modify(_) => (Method::PUT, "trade/order"),
                SignedOperation::Cancel(_) => (Method::DELETE, "trade/order"),
            },
            SignedRequest::CancelAll { .. } => (Method::DELETE, "trade/orders"),
            SignedRequest::Batch(_) => (Method::POST, "trade/orders"),
        }
    }
}

#[async_trait]
impl Transport for RestTransport {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, request), fields(account_id = self.account_id), err)
    )]
    async fn send(&self, request: &SignedRequest) -> Result<Value> {
        let (method, path) = Self::route(request);
        let request = self
            .client
            .request(method, self.endpoint(path)?)
            .headers(self.headers()?)
            .json(&request.to_json()?)
            .build()?;

        execute::<Value>(&self.client, request).await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self), fields(account_id = self.account_id), err)
    )]
    async fn fetch_order(&self, order: &OrderRef) -> Result<OrderState> {
        let account_id = self.account_id.to_string();
        let (key, value) = match order {
            OrderRef::Id(id) => ("orderId", id.to_string()),
            OrderRef::Nonce(nonce) => ("nonce", nonce.to_string()),
        };
        let request = self
            .client
            .request(Method::GET, self.endpoint("trade/order")?)
            .headers(self.headers()?)
            .query(&[("accountId", account_id.as_str()), (key, value.as_str())])
            .build()?;

        execute::<OrderState>(&self.client, request).await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn exchange_info(&self) -> Result<ExchangeInfo> {
        let request = self
            .client
            .request(Method::GET, self.data_endpoint("market/exchange-info")?)
            .headers(self.headers()?)
            .build()?;

        execute::<ExchangeInfo>(&self.client, request).await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self), fields(account_id = self.account_id), err)
    )]
    async fn pending_orders(&self) -> Result<Vec<OrderState>> {
        let request = self
            .client
            .request(Method::GET, self.endpoint("trade/orders")?)
            .headers(self.headers()?)
            .query(&[("accountId", self.account_id.to_string())])
            .build()?;

        execute::<Vec<OrderState>>(&self.client, request).await
    }
}

/// Sends `request` and decodes a successful body into `T`.
///
/// An empty success body decodes from `null`. Failures with a JSON body carrying an
/// `errorCode` become [`Kind::Rejection`](crate::error::Kind::Rejection); every
/// other failure is a transport error holding the raw body.
async fn execute<T: DeserializeOwned>(client: &ReqwestClient, request: Request) -> Result<T> {
    let method = request.method().clone();
    let path = request.url().path().to_owned();

    let response = client.execute(request).await?;
    let status_code = response.status();
    let body = response.text().await?;

    if !status_code.is_success() {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            status = %status_code,
            method = %method,
            path = %path,
            body = %body,
            "exchange request failed"
        );
        return Err(failure(status_code, method, path, &body));
    }

    let value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body)?
    };
    deserialize_with_warnings(value)
}

fn failure(status_code: reqwest::StatusCode, method: Method, path: String, body: &str) -> Error {
    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) else {
        return Error::status(status_code, method, path, body);
    };
    let Some(error_code) = fields.get("errorCode").and_then(Value::as_i64) else {
        return Error::status(status_code, method, path, body);
    };
    let message = fields
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or(body);
    Error::rejection(status_code, Some(error_code), message)
}
