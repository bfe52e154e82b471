// EVM wallet signer for x402 "exact" payments
//
// Signs an EIP-3009 transferWithAuthorization message over the token's
// EIP-712 domain. The private key never leaves this module and is never
// logged; the Debug impl only shows the derived address and network.

use std::fmt;

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::{sol, Eip712Domain, SolStruct};
use async_trait::async_trait;
use chrono::Utc;
use k256::ecdsa::SigningKey;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{PaymentError, StartupError};
use crate::payment::{
    Authorization, ExactPayload, PaymentPayload, PaymentRequirements, PaymentSigner,
    EXACT_SCHEME, X402_VERSION,
};

/// Networks a wallet can pay on, with their EVM chain ids
pub const SUPPORTED_NETWORKS: &[(&str, u64)] = &[
    ("base", 8453),
    ("base-sepolia", 84532),
    ("avalanche", 43114),
    ("avalanche-fuji", 43113),
    ("polygon", 137),
    ("polygon-amoy", 80002),
    ("sei", 1329),
    ("sei-testnet", 1328),
    ("iotex", 4689),
];

/// Seconds an authorization is backdated, to absorb clock skew
const VALID_AFTER_SKEW_SECS: u64 = 600;

sol! {
    /// EIP-3009 message, as declared by USDC-style token contracts
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
}

pub fn chain_id(network: &str) -> Option<u64> {
    SUPPORTED_NETWORKS
        .iter()
        .find(|(name, _)| *name == network)
        .map(|(_, id)| *id)
}

pub struct WalletSigner {
    key: SigningKey,
    address: Address,
    network: String,
    chain_id: u64,
}

impl WalletSigner {
    /// Build a signer from a hex private key (with or without `0x`).
    pub fn new(private_key: &SecretString, network: &str) -> Result<Self, StartupError> {
        let chain_id =
            chain_id(network).ok_or_else(|| StartupError::UnsupportedNetwork(network.to_string()))?;

        let raw = private_key.expose_secret().trim();
        let raw = raw.strip_prefix("0x").unwrap_or(raw);
        let bytes = hex::decode(raw)
            .map_err(|_| StartupError::InvalidPrivateKey("not a hex string".to_string()))?;
        if bytes.len() != 32 {
            return Err(StartupError::InvalidPrivateKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| StartupError::InvalidPrivateKey("not a valid secp256k1 scalar".to_string()))?;
        let address = address_of(&key);

        Ok(Self {
            key,
            address,
            network: network.to_string(),
            chain_id,
        })
    }

    /// Checksum-free lowercase `0x` address of the wallet
    pub fn address(&self) -> String {
        format!("0x{}", hex::encode(self.address))
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// EIP-712 digest of the transfer authorization for `requirements`
    pub fn signing_digest(
        &self,
        requirements: &PaymentRequirements,
        valid_after: u64,
        valid_before: u64,
        nonce: [u8; 32],
    ) -> Result<B256, PaymentError> {
        let message = TransferWithAuthorization {
            from: self.address,
            to: parse_address(&requirements.pay_to)?,
            value: U256::from(requirements.amount()?),
            validAfter: U256::from(valid_after),
            validBefore: U256::from(valid_before),
            nonce: B256::from(nonce),
        };
        let domain = token_domain(
            requirements.token_name()?,
            requirements.token_version()?,
            self.chain_id,
            parse_address(&requirements.asset)?,
        );
        Ok(message.eip712_signing_hash(&domain))
    }

    /// Sign an authorization with explicit validity window and nonce.
    pub fn sign_authorization(
        &self,
        requirements: &PaymentRequirements,
        valid_after: u64,
        valid_before: u64,
        nonce: [u8; 32],
    ) -> Result<PaymentPayload, PaymentError> {
        let value = requirements.amount()?;
        let digest = self.signing_digest(requirements, valid_after, valid_before, nonce)?;

        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest.as_slice())
            .map_err(|e| PaymentError::Signing(e.to_string()))?;

        let mut sig = Vec::with_capacity(65);
        sig.extend_from_slice(&signature.to_bytes());
        sig.push(27 + recovery_id.to_byte());

        Ok(PaymentPayload {
            x402_version: X402_VERSION,
            scheme: EXACT_SCHEME.to_string(),
            network: self.network.clone(),
            payload: ExactPayload {
                signature: format!("0x{}", hex::encode(sig)),
                authorization: Authorization {
                    from: self.address(),
                    to: requirements.pay_to.clone(),
                    value: value.to_string(),
                    valid_after: valid_after.to_string(),
                    valid_before: valid_before.to_string(),
                    nonce: format!("0x{}", hex::encode(nonce)),
                },
            },
        })
    }
}

impl fmt::Debug for WalletSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSigner")
            .field("address", &self.address())
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PaymentSigner for WalletSigner {
    fn network(&self) -> &str {
        &self.network
    }

    async fn authorize(
        &self,
        requirements: &PaymentRequirements,
    ) -> Result<PaymentPayload, PaymentError> {
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
        let valid_after = now.saturating_sub(VALID_AFTER_SKEW_SECS);
        let valid_before = now.saturating_add(requirements.max_timeout_seconds);
        let nonce: [u8; 32] = rand::random();

        self.sign_authorization(requirements, valid_after, valid_before, nonce)
    }
}

fn address_of(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    // skip the 0x04 uncompressed-point tag
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

fn parse_address(value: &str) -> Result<Address, PaymentError> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|_| PaymentError::InvalidTerms(format!("bad address {}", value)))
}

fn token_domain(name: &str, version: &str, chain_id: u64, contract: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(name.to_string().into()),
        Some(version.to_string().into()),
        Some(U256::from(chain_id)),
        Some(contract),
        None,
    )
}
