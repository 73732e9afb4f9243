//! Error types for Grafana MCP core
//!
//! Two families live here:
//! - [`ConfigError`] - the server configuration could not be constructed
//! - [`ToolError`] - a tool handler failed while doing its work
//!
//! Schema validation failures have their own type, [`crate::SchemaError`],
//! because the dispatcher reports them as protocol errors rather than as
//! tool results.

use thiserror::Error;

use crate::backend::BackendError;

/// Result type for configuration construction
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while building a [`crate::ServerConfig`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No backend URL was supplied
    #[error("Grafana URL is required")]
    MissingUrl,

    /// The backend URL did not parse or is not http(s)
    #[error("Invalid Grafana URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// None of the credential forms carries a value
    #[error(
        "No Grafana credentials configured. Set a service account token, an API key, \
         a username and password, or an access token and ID token pair."
    )]
    MissingCredentials,

    /// Only one half of username/password was given
    #[error("Basic auth needs both a username and a password")]
    IncompleteBasicAuth,

    /// Only one half of the on-behalf-of pair was given
    #[error("On-behalf-of auth needs both an access token and an ID token")]
    IncompleteOnBehalfOf,

    /// A client certificate was given without its key, or the reverse
    #[error("TLS client auth needs both a certificate file and a key file")]
    IncompleteTls,

    /// A category tag did not match any known category
    #[error("Unknown tool category: '{0}'")]
    UnknownCategory(String),

    /// A transport name did not match any known transport
    #[error("Unknown transport: '{0}'. Expected stdio, sse or streamable-http.")]
    UnknownTransport(String),
}

/// Errors a tool handler can return
///
/// The dispatcher turns every one of these into a `ToolResult::Error`
/// envelope using the `Display` text, so messages are written for the
/// calling agent to read.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The backend call failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// An argument passed schema validation but is unusable
    #[error("Invalid argument '{field}': {reason}")]
    InvalidArgument { field: String, reason: String },

    /// The backend answered with a payload the tool could not interpret
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl ToolError {
    /// Shorthand for [`ToolError::InvalidArgument`]
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ToolError::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Decode(err.to_string())
    }
}
