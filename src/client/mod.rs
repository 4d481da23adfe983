//! Account-level trading client.
//!
//! [`Client`] ties the request builder to a [`Transport`](crate::transport::Transport):
//! - bootstrap instrument metadata (or take it from the policy)
//! - sign creates, updates, cancels and batches locally
//! - submit them and decode the exchange's answer
//!
//! Everything the client needs is passed in through [`ClientConfig`]; it never
//! reads the environment.

mod config;
mod policy;
mod trading;
mod types;

pub use config::{ClientConfig, DEFAULT_API_URL, DEFAULT_DATA_API_URL, RawClientConfig};
pub use policy::{ClientPolicies, FixedOrFetch, UpdateFill};
pub use trading::Client;
pub use types::{OrderOverrides, PlacedOrder};
