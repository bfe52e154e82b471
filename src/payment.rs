// x402 payment protocol wire types
//
// A Shield endpoint that wants payment answers 402 with a JSON body listing
// the payment options it accepts. The client picks one, signs an
// authorization for it and retries the same request with the base64-encoded
// payload in the X-PAYMENT header.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PaymentError;

/// HTTP status that carries payment terms
pub const PAYMENT_REQUIRED_STATUS: u16 = 402;

/// Request header carrying the signed payment payload
pub const PAYMENT_HEADER: &str = "x-payment";

/// Response header carrying the settlement receipt
pub const PAYMENT_RESPONSE_HEADER: &str = "x-payment-response";

/// Protocol version spoken by this client
pub const X402_VERSION: u32 = 1;

/// The only payment scheme supported: a fixed-amount token transfer
pub const EXACT_SCHEME: &str = "exact";

/// Body of a 402 response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    pub x402_version: u32,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,
}

impl PaymentRequired {
    pub fn parse(body: &str) -> Result<Self, PaymentError> {
        serde_json::from_str(body).map_err(|e| PaymentError::InvalidTerms(e.to_string()))
    }

    /// First requirement this client can satisfy on `network`
    pub fn select(&self, network: &str) -> Result<&PaymentRequirements, PaymentError> {
        self.accepts
            .iter()
            .find(|req| req.scheme == EXACT_SCHEME && req.network == network)
            .ok_or_else(|| PaymentError::NoAcceptableRequirement {
                network: network.to_string(),
            })
    }
}

/// One accepted way of paying for a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: String,
    /// Amount in atomic units of `asset`, as a decimal string
    pub max_amount_required: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mime_type: String,
    pub pay_to: String,
    #[serde(default = "default_timeout_seconds")]
    pub max_timeout_seconds: u64,
    /// Token contract address
    pub asset: String,
    /// Scheme-specific data; for EVM tokens the EIP-712 domain name and version
    #[serde(default)]
    pub extra: Option<Value>,
}

fn default_timeout_seconds() -> u64 {
    60
}

impl PaymentRequirements {
    pub fn amount(&self) -> Result<u128, PaymentError> {
        self.max_amount_required.trim().parse::<u128>().map_err(|_| {
            PaymentError::InvalidTerms(format!(
                "maxAmountRequired is not an integer: {}",
                self.max_amount_required
            ))
        })
    }

    /// Reject requirements above `limit` atomic units
    pub fn check_limit(&self, limit: u128) -> Result<u128, PaymentError> {
        let required = self.amount()?;
        if required > limit {
            return Err(PaymentError::AmountExceedsLimit { required, limit });
        }
        Ok(required)
    }

    fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.as_ref()?.get(key)?.as_str()
    }

    /// EIP-712 domain name of the token, e.g. "USD Coin"
    pub fn token_name(&self) -> Result<&str, PaymentError> {
        self.extra_str("name")
            .ok_or_else(|| PaymentError::InvalidTerms("missing extra.name".to_string()))
    }

    /// EIP-712 domain version of the token, e.g. "2"
    pub fn token_version(&self) -> Result<&str, PaymentError> {
        self.extra_str("version")
            .ok_or_else(|| PaymentError::InvalidTerms("missing extra.version".to_string()))
    }
}

/// EIP-3009 transferWithAuthorization parameters, all as strings on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    pub from: String,
    pub to: String,
    pub value: String,
    pub valid_after: String,
    pub valid_before: String,
    pub nonce: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactPayload {
    pub signature: String,
    pub authorization: Authorization,
}

/// Signed proof of payment attached to the retried request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: u32,
    pub scheme: String,
    pub network: String,
    pub payload: ExactPayload,
}

impl PaymentPayload {
    /// Base64 JSON encoding used for the X-PAYMENT header
    pub fn to_header_value(&self) -> Result<String, PaymentError> {
        let json = serde_json::to_vec(self).map_err(|e| PaymentError::Signing(e.to_string()))?;
        Ok(general_purpose::STANDARD.encode(json))
    }

    pub fn from_header_value(header: &str) -> Result<Self, PaymentError> {
        let bytes = general_purpose::STANDARD
            .decode(header)
            .map_err(|e| PaymentError::InvalidTerms(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| PaymentError::InvalidTerms(e.to_string()))
    }
}

/// Produces payment authorizations for 402 challenges
///
/// Installed once at startup in paid mode; the payment-aware transport owns it
/// for the lifetime of the process.
#[async_trait]
pub trait PaymentSigner: Send + Sync {
    /// Network identifier this signer pays on, e.g. "base"
    fn network(&self) -> &str;

    /// Sign an authorization satisfying `requirements`
    async fn authorize(
        &self,
        requirements: &PaymentRequirements,
    ) -> Result<PaymentPayload, PaymentError>;
}
