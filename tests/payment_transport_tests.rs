/// Payment-aware transport tests
/// Drives the 402 challenge/retry flow against a scripted inner transport
mod common;

use std::sync::Arc;

use reqwest::{Method, Request};
use serde_json::json;
use url::Url;

use common::{challenge, ok_json, FakeSigner, ScriptedTransport};
use shield_mcp::error::{PaymentError, ToolError};
use shield_mcp::payment::PaymentPayload;
use shield_mcp::transport::{HttpResponse, PaymentTransport, Transport};

fn get(url: &str) -> Request {
    Request::new(Method::GET, Url::parse(url).unwrap())
}

fn paying(script: &ScriptedTransport, signer: Arc<FakeSigner>, max: u128) -> PaymentTransport {
    PaymentTransport::new(Arc::new(script.clone()), signer, max)
}

#[tokio::test]
async fn test_success_passes_through_without_payment() {
    let script = ScriptedTransport::new(vec![ok_json(json!({ "ok": true }))]);
    let signer = Arc::new(FakeSigner::on("base"));
    let transport = paying(&script, signer.clone(), 100_000);

    let resp = transport.send(get("https://shield.test/api/check-ip?ip=1.1.1.1")).await.unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(script.requests().len(), 1);
    assert_eq!(signer.calls(), 0);
}

#[tokio::test]
async fn test_challenge_triggers_exactly_one_paid_retry() {
    let script = ScriptedTransport::new(vec![
        challenge("base", "1000"),
        ok_json(json!({ "verdict": "clean" })),
    ]);
    let signer = Arc::new(FakeSigner::on("base"));
    let transport = paying(&script, signer.clone(), 100_000);

    let resp = transport.send(get("https://shield.test/api/check-ip?ip=1.1.1.1")).await.unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(signer.calls(), 1);
    let requests = script.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].payment.is_none());
    assert_eq!(requests[1].url, requests[0].url);

    let header = requests[1].payment.as_deref().expect("retry carries X-PAYMENT");
    let payload = PaymentPayload::from_header_value(header).unwrap();
    assert_eq!(payload.network, "base");
    assert_eq!(payload.payload.authorization.value, "1000");
}

#[tokio::test]
async fn test_second_challenge_is_final() {
    let script = ScriptedTransport::new(vec![
        challenge("base", "1000"),
        challenge("base", "1000"),
        ok_json(json!({ "never": "reached" })),
    ]);
    let signer = Arc::new(FakeSigner::on("base"));
    let transport = paying(&script, signer.clone(), 100_000);

    let resp = transport.send(get("https://shield.test/api/check-ip?ip=1.1.1.1")).await.unwrap();

    assert_eq!(resp.status, 402);
    assert_eq!(script.requests().len(), 2);
    assert_eq!(signer.calls(), 1);
}

#[tokio::test]
async fn test_non_payment_errors_are_not_retried() {
    let script = ScriptedTransport::new(vec![HttpResponse::new(500, "boom")]);
    let signer = Arc::new(FakeSigner::on("base"));
    let transport = paying(&script, signer.clone(), 100_000);

    let resp = transport.send(get("https://shield.test/api/check-ip")).await.unwrap();

    assert_eq!(resp.status, 500);
    assert_eq!(script.requests().len(), 1);
    assert_eq!(signer.calls(), 0);
}

#[tokio::test]
async fn test_signing_failure_is_payment_error() {
    let script = ScriptedTransport::new(vec![challenge("base", "1000")]);
    let signer = Arc::new(FakeSigner::failing(
        "base",
        PaymentError::Signing("insufficient balance".to_string()),
    ));
    let transport = paying(&script, signer, 100_000);

    let err = transport.send(get("https://shield.test/api/check-ip")).await.unwrap_err();

    assert!(matches!(err, ToolError::Payment(PaymentError::Signing(_))));
    assert_eq!(script.requests().len(), 1);
}

#[tokio::test]
async fn test_wrong_network_is_payment_error() {
    let script = ScriptedTransport::new(vec![challenge("polygon", "1000")]);
    let transport = paying(&script, Arc::new(FakeSigner::on("base")), 100_000);

    let err = transport.send(get("https://shield.test/api/check-ip")).await.unwrap_err();

    assert!(matches!(
        err,
        ToolError::Payment(PaymentError::NoAcceptableRequirement { .. })
    ));
}

#[tokio::test]
async fn test_amount_over_cap_is_refused() {
    let script = ScriptedTransport::new(vec![challenge("base", "250000")]);
    let signer = Arc::new(FakeSigner::on("base"));
    let transport = paying(&script, signer.clone(), 100_000);

    let err = transport.send(get("https://shield.test/api/full-scan")).await.unwrap_err();

    assert!(matches!(
        err,
        ToolError::Payment(PaymentError::AmountExceedsLimit {
            required: 250_000,
            limit: 100_000
        })
    ));
    assert_eq!(signer.calls(), 0);
}

#[tokio::test]
async fn test_unreadable_terms_are_payment_error() {
    let script = ScriptedTransport::new(vec![HttpResponse::new(402, "Payment Required")]);
    let transport = paying(&script, Arc::new(FakeSigner::on("base")), 100_000);

    let err = transport.send(get("https://shield.test/api/check-ip")).await.unwrap_err();

    assert!(matches!(err, ToolError::Payment(PaymentError::InvalidTerms(_))));
}
