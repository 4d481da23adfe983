//! Signed requests as they leave the client.
//!
//! A [`SignedRequest`] is produced by the [`RequestBuilder`] and handed to a
//! [`Transport`](crate::transport::Transport). It owns its signatures and is not
//! meant to outlive the call that sends it: nonces and creation deadlines are
//! time-sensitive, so a request that was not sent is rebuilt, never retried.

mod builder;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use serde_with::{DisplayFromStr, serde_as};

use crate::Result;
use crate::signer::SignedPayload;
use crate::types::{OrderFlags, OrderType, ParentLink, Side, TpslKind, TwapConfig};

pub use builder::RequestBuilder;

fn signature_of<S: Serializer>(
    payload: &SignedPayload,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    payload.signature.serialize(serializer)
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct ParentOrderBody {
    pub nonce: u64,
    pub kind: TpslKind,
}

impl From<ParentLink> for ParentOrderBody {
    fn from(link: ParentLink) -> Self {
        Self {
            nonce: link.nonce,
            kind: link.kind,
        }
    }
}

#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBody {
    pub nonce: u64,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twap_config: Option<TwapConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_deadline: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_flags: Option<OrderFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_order: Option<ParentOrderBody>,
    pub max_fees_percent: Decimal,
    #[serde(rename = "signature", serialize_with = "signature_of")]
    pub payload: SignedPayload,
}

#[serde_as]
#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyBody {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_nonce: Option<u64>,
    pub nonce: u64,
    pub symbol: String,
    pub side: Side,
    pub updated_quantity: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_trigger_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_deadline: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_flags: Option<OrderFlags>,
    pub max_fees_percent: Decimal,
    #[serde(rename = "signature", serialize_with = "signature_of")]
    pub payload: SignedPayload,
}

#[serde_as]
#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBody {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<u64>,
    #[serde(rename = "nonce", skip_serializing_if = "Option::is_none")]
    pub order_nonce: Option<u64>,
    #[serde(rename = "signature", serialize_with = "signature_of")]
    pub payload: SignedPayload,
}

#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
pub struct CancelAllBody {
    pub nonce: u64,
    #[serde(rename = "signature", serialize_with = "signature_of")]
    pub payload: SignedPayload,
}

/// One signed create, update or cancel.
#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SignedOperation {
    Place(PlaceBody),
    Modify(ModifyBody),
    Cancel(CancelBody),
}

impl SignedOperation {
    #[must_use]
    pub fn payload(&self) -> &SignedPayload {
        match self {
            SignedOperation::Place(body) => &body.payload,
            SignedOperation::Modify(body) => &body.payload,
            SignedOperation::Cancel(body) => &body.payload,
        }
    }

    /// Nonce the operation is correlated by, when it has one.
    #[must_use]
    pub fn nonce(&self) -> Option<u64> {
        match self {
            SignedOperation::Place(body) => Some(body.nonce),
            SignedOperation::Modify(body) => Some(body.nonce),
            SignedOperation::Cancel(body) => body.order_nonce,
        }
    }

    fn body_json(&self) -> Result<Value> {
        let value = match self {
            SignedOperation::Place(body) => serde_json::to_value(body)?,
            SignedOperation::Modify(body) => serde_json::to_value(body)?,
            SignedOperation::Cancel(body) => serde_json::to_value(body)?,
        };
        Ok(value)
    }
}

/// Ordered operations applied all-or-nothing by the exchange.
#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEnvelope {
    pub account_id: u64,
    pub orders: Vec<SignedOperation>,
}

impl BatchEnvelope {
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum SignedRequest {
    Single {
        account_id: u64,
        operation: SignedOperation,
    },
    CancelAll {
        account_id: u64,
        body: CancelAllBody,
    },
    Batch(BatchEnvelope),
}

impl SignedRequest {
    /// JSON body as sent over HTTP.
    pub fn to_json(&self) -> Result<Value> {
        match self {
            SignedRequest::Single {
                account_id,
                operation,
            } => with_account(*account_id, operation.body_json()?),
            SignedRequest::CancelAll { account_id, body } => {
                with_account(*account_id, serde_json::to_value(body)?)
            }
            SignedRequest::Batch(envelope) => Ok(serde_json::to_value(envelope)?),
        }
    }

    /// Every signed payload in submission order.
    #[must_use]
    pub fn payloads(&self) -> Vec<&SignedPayload> {
        match self {
            SignedRequest::Single { operation, .. } => vec![operation.payload()],
            SignedRequest::CancelAll { body, .. } => vec![&body.payload],
            SignedRequest::Batch(envelope) => {
                envelope.orders.iter().map(SignedOperation::payload).collect()
            }
        }
    }
}

fn with_account(account_id: u64, body: Value) -> Result<Value> {
    let mut map = match body {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("body".to_owned(), other);
            map
        }
    };
    map.insert("accountId".to_owned(), Value::from(account_id));
    Ok(Value::Object(map))
}
