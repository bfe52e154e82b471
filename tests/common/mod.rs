// Shared test doubles: a scripted transport and a fake payment signer
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Request;
use serde_json::json;

use shield_mcp::error::{PaymentError, ToolError};
use shield_mcp::payment::{
    Authorization, ExactPayload, PaymentPayload, PaymentRequirements, PaymentSigner,
};
use shield_mcp::transport::{HttpResponse, Transport};

/// What the scripted transport saw for one request
#[derive(Debug, Clone)]
pub struct Recorded {
    pub url: String,
    pub payment: Option<String>,
}

/// Replays canned responses in order and records every request
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<HttpResponse>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<HttpResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: Request) -> Result<HttpResponse, ToolError> {
        self.requests.lock().unwrap().push(Recorded {
            url: request.url().to_string(),
            payment: request
                .headers()
                .get("x-payment")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        });
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| HttpResponse::new(500, "no scripted response left")))
    }
}

/// Signer that returns a fixed payload, or a fixed error
pub struct FakeSigner {
    pub network: String,
    pub fail_with: Option<PaymentError>,
    pub calls: Mutex<usize>,
}

impl FakeSigner {
    pub fn on(network: &str) -> Self {
        Self {
            network: network.to_string(),
            fail_with: None,
            calls: Mutex::new(0),
        }
    }

    pub fn failing(network: &str, err: PaymentError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::on(network)
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl PaymentSigner for FakeSigner {
    fn network(&self) -> &str {
        &self.network
    }

    async fn authorize(
        &self,
        requirements: &PaymentRequirements,
    ) -> Result<PaymentPayload, PaymentError> {
        *self.calls.lock().unwrap() += 1;
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(PaymentPayload {
            x402_version: 1,
            scheme: requirements.scheme.clone(),
            network: requirements.network.clone(),
            payload: ExactPayload {
                signature: "0xfeed".to_string(),
                authorization: Authorization {
                    from: "0x0000000000000000000000000000000000000001".to_string(),
                    to: requirements.pay_to.clone(),
                    value: requirements.max_amount_required.clone(),
                    valid_after: "0".to_string(),
                    valid_before: "60".to_string(),
                    nonce: "0x01".to_string(),
                },
            },
        })
    }
}

/// A 402 response offering `amount` on `network`
pub fn challenge(network: &str, amount: &str) -> HttpResponse {
    let body = json!({
        "x402Version": 1,
        "error": "X-PAYMENT header is required",
        "accepts": [{
            "scheme": "exact",
            "network": network,
            "maxAmountRequired": amount,
            "resource": "https://shield.test/api/check-ip",
            "description": "",
            "mimeType": "application/json",
            "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
            "maxTimeoutSeconds": 60,
            "asset": "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
            "extra": { "name": "USDC", "version": "2" }
        }]
    });
    HttpResponse::new(402, body.to_string())
}

pub fn ok_json(body: serde_json::Value) -> HttpResponse {
    HttpResponse::new(200, body.to_string())
}
