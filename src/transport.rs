// HTTP transports for the Shield API
//
// `HttpTransport` sends a request as-is. `PaymentTransport` wraps another
// transport and handles one round of the x402 protocol:
//
//   send ──> 402? ──no──> return response
//              │
//              yes: parse terms, pick option, sign, attach X-PAYMENT
//              │
//              └──> send once more, return whatever comes back
//
// Which transport is installed is decided once at startup from the operating
// mode; the invoker only sees `Arc<dyn Transport>`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Request};

use crate::error::{PaymentError, ToolError};
use crate::payment::{
    PaymentRequired, PaymentSigner, PAYMENT_HEADER, PAYMENT_REQUIRED_STATUS,
    PAYMENT_RESPONSE_HEADER,
};

/// A fully read HTTP response
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_payment_required(&self) -> bool {
        self.status == PAYMENT_REQUIRED_STATUS
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Sends one HTTP request and reads the whole response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<HttpResponse, ToolError>;
}

/// Plain reqwest transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    pub client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .user_agent(concat!("shield-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<HttpResponse, ToolError> {
        let resp = self.client.execute(request).await?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.text().await?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Transport that pays 402 challenges and retries exactly once
pub struct PaymentTransport {
    inner: Arc<dyn Transport>,
    signer: Arc<dyn PaymentSigner>,
    max_amount: u128,
}

impl PaymentTransport {
    /// `max_amount` caps a single payment, in atomic units of the asset.
    pub fn new(inner: Arc<dyn Transport>, signer: Arc<dyn PaymentSigner>, max_amount: u128) -> Self {
        Self {
            inner,
            signer,
            max_amount,
        }
    }

    async fn authorization_header(&self, challenge: &HttpResponse) -> Result<HeaderValue, PaymentError> {
        let terms = PaymentRequired::parse(&challenge.body)?;
        let requirements = terms.select(self.signer.network())?;
        let amount = requirements.check_limit(self.max_amount)?;

        tracing::info!(
            network = %requirements.network,
            amount = %amount,
            pay_to = %requirements.pay_to,
            resource = %requirements.resource,
            "Paying for request"
        );

        let payload = self.signer.authorize(requirements).await?;
        let header = payload.to_header_value()?;
        HeaderValue::from_str(&header).map_err(|e| PaymentError::Signing(e.to_string()))
    }
}

#[async_trait]
impl Transport for PaymentTransport {
    async fn send(&self, request: Request) -> Result<HttpResponse, ToolError> {
        let mut retry = request.try_clone().ok_or(PaymentError::RequestNotReplayable)?;

        let first = self.inner.send(request).await?;
        if !first.is_payment_required() {
            return Ok(first);
        }

        tracing::debug!(url = %retry.url(), "Received payment challenge");
        let header = self.authorization_header(&first).await?;
        retry.headers_mut().insert(PAYMENT_HEADER, header);

        let second = self.inner.send(retry).await?;
        if let Some(receipt) = second.header(PAYMENT_RESPONSE_HEADER) {
            tracing::debug!(receipt = %receipt, "Payment settled");
        }
        if second.is_payment_required() {
            tracing::warn!("Payment was not accepted after retry");
        }
        Ok(second)
    }
}
