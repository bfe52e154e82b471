// Error taxonomy for shield-mcp
//
// ApiError and PaymentError are per-invocation failures and are surfaced to
// the MCP client as tool errors. StartupError aborts the process before the
// stdio loop accepts anything.

use thiserror::Error;

/// Maximum number of characters of a failed response body kept in an ApiError
pub const MAX_ERROR_BODY_CHARS: usize = 200;

/// Non-2xx response from the remote API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Shield API error on {endpoint}: HTTP {status}: {body}")]
pub struct ApiError {
    pub endpoint: String,
    pub status: u16,
    pub body: String,
}

impl ApiError {
    /// Build an ApiError, keeping at most the first 200 characters of the body.
    pub fn new(endpoint: &str, status: u16, body: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            status,
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }
    }
}

/// Payment authorization could not be produced for a 402 challenge
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("invalid payment terms: {0}")]
    InvalidTerms(String),

    #[error("no acceptable payment option for network {network}")]
    NoAcceptableRequirement { network: String },

    #[error("payment of {required} exceeds configured maximum of {limit}")]
    AmountExceedsLimit { required: u128, limit: u128 },

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("request cannot be replayed with payment attached")]
    RequestNotReplayable,
}

/// Failure of a single tool invocation
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("payment failed: {0}")]
    Payment(#[from] PaymentError),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid JSON from {endpoint}: {source}")]
    InvalidResponse {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("tool '{tool}' requires argument '{parameter}'")]
    MissingArgument { tool: String, parameter: String },
}

impl ToolError {
    /// Whether the failure belongs to the dispatcher rather than the invocation
    pub fn is_dispatch_error(&self) -> bool {
        matches!(self, ToolError::UnknownTool(_))
    }
}

/// Fatal error during process initialization
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid API base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("unsupported network '{0}'")]
    UnsupportedNetwork(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
