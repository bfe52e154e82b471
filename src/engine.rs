// Shield API invoker
// Builds `{base}/api/{endpoint}?...` URLs and issues GETs through the
// transport chosen at startup.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::{Method, Request};
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::error::{ApiError, StartupError, ToolError};
use crate::models::OperatingMode;
use crate::transport::{HttpTransport, PaymentTransport, Transport};
use crate::wallet::WalletSigner;

/// Build the request URL for an endpoint.
///
/// Parameters are appended in map order, each percent-encoded, followed by
/// `demo=true` when `demo` is set.
pub fn build_url(
    base_url: &str,
    endpoint: &str,
    params: &BTreeMap<String, String>,
    demo: bool,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!(
        "{}/api/{}",
        base_url.trim_end_matches('/'),
        endpoint
    ))?;

    if !params.is_empty() || demo {
        let mut query = url.query_pairs_mut();
        for (key, value) in params {
            query.append_pair(key, value);
        }
        if demo {
            query.append_pair("demo", "true");
        }
    }

    Ok(url)
}

pub struct ApiInvoker {
    base_url: String,
    transport: Arc<dyn Transport>,
    mode: OperatingMode,
}

impl ApiInvoker {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>, mode: OperatingMode) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            mode,
        }
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(
        &self,
        endpoint: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Url, url::ParseError> {
        build_url(&self.base_url, endpoint, params, self.mode.is_demo())
    }

    /// GET an endpoint and return its JSON body as-is.
    pub async fn invoke(
        &self,
        endpoint: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Value, ToolError> {
        let url = self.build_url(endpoint, params)?;
        tracing::debug!(endpoint = %endpoint, url = %url, "Calling Shield API");

        let resp = self.transport.send(Request::new(Method::GET, url)).await?;
        if !resp.is_success() {
            tracing::warn!(endpoint = %endpoint, status = resp.status, "Shield API returned an error");
            return Err(ApiError::new(endpoint, resp.status, &resp.body).into());
        }

        serde_json::from_str(&resp.body).map_err(|source| ToolError::InvalidResponse {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

/// Build the invoker for this process, installing the payment-aware
/// transport when a wallet is configured.
pub fn connect(config: &Config) -> Result<ApiInvoker, StartupError> {
    let http: Arc<dyn Transport> = Arc::new(HttpTransport::new()?);

    let transport: Arc<dyn Transport> = match &config.wallet {
        None => {
            tracing::info!("No wallet configured, running in demo mode (sample data only)");
            http
        }
        Some(wallet) => {
            let signer = WalletSigner::new(&wallet.private_key, &wallet.network)?;
            tracing::info!(
                address = %signer.address(),
                network = %wallet.network,
                max_payment = %config.max_payment,
                "Wallet loaded, x402 payments enabled"
            );
            Arc::new(PaymentTransport::new(http, Arc::new(signer), config.max_payment))
        }
    };

    Ok(ApiInvoker::new(config.base_url.clone(), transport, config.mode()))
}
