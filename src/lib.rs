#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod client;
pub mod codec;
pub mod error;
pub mod helpers;
pub mod instrument;
pub mod intent;
pub mod nonce;
pub mod request;
pub(crate) mod serde_helpers;
pub mod signer;
pub mod transport;
pub mod types;

pub use client::{Client, ClientConfig, ClientPolicies, OrderOverrides, PlacedOrder};
pub use error::Error;
pub use instrument::{Instrument, Instruments};
pub use intent::{CancelOrder, CreateOrder, OrderChanges, OrderIntent, UpdateOrder};
pub use request::{RequestBuilder, SignedRequest};
pub use signer::Signer;
pub use transport::{RestTransport, Transport};

pub type Result<T> = std::result::Result<T, Error>;
