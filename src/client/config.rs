use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use url::Url;

use crate::Result;
use crate::client::policy::{ClientPolicies, UpdateFill};
use crate::error::Error;

pub const DEFAULT_API_URL: &str = "https://api.hibachi.xyz";
pub const DEFAULT_DATA_API_URL: &str = "https://data-api.hibachi.xyz";

/// String-typed settings as they come out of an app-level config file.
///
/// Endpoints fall back to the production hosts when absent.
#[serde_as]
#[non_exhaustive]
#[derive(Clone, Debug, Deserialize)]
pub struct RawClientConfig {
    #[serde(default)]
    pub api_endpoint: Option<String>,
    #[serde(default)]
    pub data_api_endpoint: Option<String>,
    pub api_key: SecretString,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub account_id: u64,
    #[serde(default)]
    pub private_key: Option<SecretString>,
    #[serde(default)]
    pub update_fill: Option<String>,
}

/// Client bootstrap configuration.
///
/// `private_key` is only needed for trading; a client without one can still read
/// exchange metadata and order state.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_endpoint: Url,
    pub data_api_endpoint: Url,
    pub api_key: SecretString,
    pub account_id: u64,
    pub private_key: Option<SecretString>,
    pub policies: ClientPolicies,
}

impl ClientConfig {
    pub fn from_raw(raw: RawClientConfig, mut policies: ClientPolicies) -> Result<Self> {
        let api_endpoint = Url::parse(raw.api_endpoint.as_deref().unwrap_or(DEFAULT_API_URL))?;
        let data_api_endpoint = Url::parse(
            raw.data_api_endpoint
                .as_deref()
                .unwrap_or(DEFAULT_DATA_API_URL),
        )?;
        if let Some(update_fill) = raw.update_fill.as_deref() {
            policies.update_fill = UpdateFill::parse(update_fill)?;
        }

        Self::new(
            api_endpoint,
            data_api_endpoint,
            raw.api_key,
            raw.account_id,
            raw.private_key,
            policies,
        )
    }

    pub fn new(
        api_endpoint: Url,
        data_api_endpoint: Url,
        api_key: SecretString,
        account_id: u64,
        private_key: Option<SecretString>,
        policies: ClientPolicies,
    ) -> Result<Self> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(Error::validation("api_key must not be empty"));
        }
        if account_id == 0 {
            return Err(Error::validation("account_id must be non-zero"));
        }
        let private_key = private_key.filter(|key| !key.expose_secret().trim().is_empty());

        policies.validate()?;

        Ok(Self {
            api_endpoint: base_url("api_endpoint", api_endpoint)?,
            data_api_endpoint: base_url("data_api_endpoint", data_api_endpoint)?,
            api_key,
            account_id,
            private_key,
            policies,
        })
    }

    /// Production endpoints with default policies.
    pub fn production(
        api_key: SecretString,
        account_id: u64,
        private_key: Option<SecretString>,
    ) -> Result<Self> {
        Self::new(
            Url::parse(DEFAULT_API_URL)?,
            Url::parse(DEFAULT_DATA_API_URL)?,
            api_key,
            account_id,
            private_key,
            ClientPolicies::default(),
        )
    }
}

/// Endpoints are joined with relative paths, so they must end in `/`.
fn base_url(field: &str, mut url: Url) -> Result<Url> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::validation(format!(
            "{field} must be an http(s) url, got {url}"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
