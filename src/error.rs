use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

use reqwest::{Method, StatusCode};

/// Broad category of an [`Error`].
///
/// `Encoding`, `Signing` and `Validation` are raised locally, always before
/// anything reaches the network. `Transport` and `Rejection` come from the
/// transport layer and are passed through untouched.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    /// A field is out of range or finer than the instrument allows, or the symbol is unknown.
    Encoding,
    /// Key material is missing or malformed.
    Signing,
    /// An intent is missing required fields, or a config value is invalid.
    Validation,
    /// Network, HTTP or decoding failure.
    Transport,
    /// The exchange understood the request and refused it.
    Rejection,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    index: Option<usize>,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    backtrace: Backtrace,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            index: None,
            source: Some(Box::new(source)),
            backtrace: Backtrace::capture(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Position of the offending intent when the error was raised while building a batch.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    #[must_use]
    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let e = self.source.as_deref()?;
        e.downcast_ref::<E>()
    }

    #[must_use]
    pub(crate) fn at_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn validation<S: Into<String>>(reason: S) -> Self {
        Validation {
            reason: reason.into(),
        }
        .into()
    }

    pub fn encoding<S: Into<String>>(field: &'static str, reason: S) -> Self {
        Encoding {
            field,
            reason: reason.into(),
        }
        .into()
    }

    pub fn unknown_symbol<S: Into<String>>(symbol: S) -> Self {
        Encoding {
            field: "symbol",
            reason: format!("unknown symbol `{}`", symbol.into()),
        }
        .into()
    }

    pub fn signing<S: Into<String>>(reason: S) -> Self {
        Signing {
            reason: reason.into(),
        }
        .into()
    }

    pub fn status<S: Into<String>>(
        status_code: StatusCode,
        method: Method,
        path: String,
        message: S,
    ) -> Self {
        Status {
            status_code,
            method,
            path,
            message: message.into(),
        }
        .into()
    }

    pub fn rejection<S: Into<String>>(
        status_code: StatusCode,
        error_code: Option<i64>,
        message: S,
    ) -> Self {
        Rejection {
            status_code,
            error_code,
            message: message.into(),
        }
        .into()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(index) = self.index {
            write!(f, "batch item {index}: ")?;
        }
        match &self.source {
            Some(src) => write!(f, "{:?}: {}", self.kind, src),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

#[non_exhaustive]
#[derive(Debug)]
pub struct Validation {
    pub reason: String,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid: {}", self.reason)
    }
}

impl StdError for Validation {}

#[non_exhaustive]
#[derive(Debug)]
pub struct Encoding {
    pub field: &'static str,
    pub reason: String,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot encode `{}`: {}", self.field, self.reason)
    }
}

impl StdError for Encoding {}

#[non_exhaustive]
#[derive(Debug)]
pub struct Signing {
    pub reason: String,
}

impl fmt::Display for Signing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signing failed: {}", self.reason)
    }
}

impl StdError for Signing {}

/// Non-success HTTP response that carried no structured exchange error.
#[non_exhaustive]
#[derive(Debug)]
pub struct Status {
    pub status_code: StatusCode,
    pub method: Method,
    pub path: String,
    pub message: String,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error({}) making {} call to {} with {}",
            self.status_code, self.method, self.path, self.message
        )
    }
}

impl StdError for Status {}

/// Business-rule failure reported by the exchange, e.g. a limit price outside the
/// protection band, insufficient balance or a reused nonce.
#[non_exhaustive]
#[derive(Debug)]
pub struct Rejection {
    pub status_code: StatusCode,
    pub error_code: Option<i64>,
    pub message: String,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error_code {
            Some(code) => write!(
                f,
                "exchange rejected request ({}, code {code}): {}",
                self.status_code, self.message
            ),
            None => write!(
                f,
                "exchange rejected request ({}): {}",
                self.status_code, self.message
            ),
        }
    }
}

impl StdError for Rejection {}

impl From<Validation> for Error {
    fn from(err: Validation) -> Self {
        Error::with_source(Kind::Validation, err)
    }
}

impl From<Encoding> for Error {
    fn from(err: Encoding) -> Self {
        Error::with_source(Kind::Encoding, err)
    }
}

impl From<Signing> for Error {
    fn from(err: Signing) -> Self {
        Error::with_source(Kind::Signing, err)
    }
}

impl From<Status> for Error {
    fn from(err: Status) -> Self {
        Error::with_source(Kind::Transport, err)
    }
}

impl From<Rejection> for Error {
    fn from(err: Rejection) -> Self {
        Error::with_source(Kind::Rejection, err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::with_source(Kind::Transport, e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::with_source(Kind::Transport, e)
    }
}

impl From<alloy::signers::Error> for Error {
    fn from(e: alloy::signers::Error) -> Self {
        Error::with_source(Kind::Signing, e)
    }
}
