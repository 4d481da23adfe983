use std::str::FromStr;

use crate::Result;
use crate::error::Error;
use crate::instrument::Instruments;

/// Policy wrapper for values that can either be supplied up front or read from the
/// exchange when the client starts.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum FixedOrFetch<T> {
    Fixed(T),
    Fetch,
}

impl<T> FixedOrFetch<T> {
    pub(crate) fn into_fixed(self) -> Option<T> {
        match self {
            FixedOrFetch::Fixed(value) => Some(value),
            FixedOrFetch::Fetch => None,
        }
    }
}

impl<T> Default for FixedOrFetch<T> {
    fn default() -> Self {
        FixedOrFetch::Fetch
    }
}

/// How [`Client::update_order`](crate::client::Client::update_order) completes the
/// fields a caller did not change.
///
/// `FetchCurrent` reads the order first and keeps what it holds. `Explicit` never
/// reads: every field of the new state must be given, so a caller that already
/// tracks its orders saves a round trip.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum UpdateFill {
    #[default]
    FetchCurrent,
    Explicit,
}

impl UpdateFill {
    pub fn parse(value: &str) -> Result<UpdateFill> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fetch" | "fetch_current" | "fetchcurrent" => Ok(UpdateFill::FetchCurrent),
            "explicit" | "none" => Ok(UpdateFill::Explicit),
            other => Err(Error::validation(format!(
                "invalid update_fill `{other}`; expected one of: fetch|explicit"
            ))),
        }
    }
}

impl FromStr for UpdateFill {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        UpdateFill::parse(s)
    }
}

/// Defaults used by the client order flow.
#[derive(Clone, Debug, Default)]
pub struct ClientPolicies {
    pub instruments: FixedOrFetch<Instruments>,
    pub update_fill: UpdateFill,
}

impl ClientPolicies {
    #[must_use]
    pub fn with_instruments(mut self, instruments: Instruments) -> Self {
        self.instruments = FixedOrFetch::Fixed(instruments);
        self
    }

    #[must_use]
    pub fn with_update_fill(mut self, update_fill: UpdateFill) -> Self {
        self.update_fill = update_fill;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let FixedOrFetch::Fixed(instruments) = &self.instruments
            && instruments.is_empty()
        {
            return Err(Error::validation(
                "fixed instrument policy needs at least one instrument",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fetch_everything() {
        let policies = ClientPolicies::default();
        assert!(matches!(policies.instruments, FixedOrFetch::Fetch));
        assert_eq!(policies.update_fill, UpdateFill::FetchCurrent);
        policies.validate().expect("defaults are valid");
    }

    #[test]
    fn update_fill_parses_config_strings() {
        assert_eq!(UpdateFill::parse(" Fetch ").expect("fetch"), UpdateFill::FetchCurrent);
        assert_eq!("explicit".parse::<UpdateFill>().expect("explicit"), UpdateFill::Explicit);
        UpdateFill::parse("sometimes").unwrap_err();
    }

    #[test]
    fn empty_fixed_instruments_are_rejected() {
        let policies = ClientPolicies::default().with_instruments(Instruments::default());
        policies.validate().unwrap_err();
    }
}
