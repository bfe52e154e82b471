// Process configuration for shield-mcp
// Command-line flags with environment fallbacks; `.env` is loaded by main
// before parsing.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;
use url::Url;

use crate::error::StartupError;
use crate::models::OperatingMode;

pub const DEFAULT_API_URL: &str = "https://shield.vainplex.dev";
pub const DEFAULT_NETWORK: &str = "base";
/// 0.10 USDC in atomic units (6 decimals)
pub const DEFAULT_MAX_PAYMENT: u128 = 100_000;

/// Wallet settings; present only in paid mode
#[derive(Debug)]
pub struct WalletConfig {
    pub private_key: SecretString,
    pub network: String,
}

#[derive(Debug)]
pub struct Config {
    pub base_url: String,
    pub wallet: Option<WalletConfig>,
    pub max_payment: u128,
    pub verbose: bool,
}

impl Config {
    /// Demo mode unless a private key was supplied
    pub fn mode(&self) -> OperatingMode {
        match self.wallet {
            Some(_) => OperatingMode::Paid,
            None => OperatingMode::Demo,
        }
    }

    pub fn from_matches(matches: &ArgMatches) -> Result<Self, StartupError> {
        let base_url = matches
            .get_one::<String>("api_url")
            .map(String::as_str)
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();
        Url::parse(&base_url).map_err(|source| StartupError::InvalidBaseUrl {
            url: base_url.clone(),
            source,
        })?;

        let network = matches
            .get_one::<String>("network")
            .cloned()
            .unwrap_or_else(|| DEFAULT_NETWORK.to_string());

        let wallet = matches
            .get_one::<String>("private_key")
            .map(|key| key.trim())
            .filter(|key| !key.is_empty())
            .map(|key| WalletConfig {
                private_key: SecretString::from(key.to_string()),
                network,
            });

        let max_payment = matches
            .get_one::<u128>("max_payment")
            .copied()
            .unwrap_or(DEFAULT_MAX_PAYMENT);

        Ok(Self {
            base_url,
            wallet,
            max_payment,
            verbose: matches.get_flag("verbose"),
        })
    }
}

/// Command-line definition
pub fn cli() -> Command {
    Command::new("shield-mcp")
        .version(env!("CARGO_PKG_VERSION"))
        .about("MCP server for the Shield security-intelligence API")
        .after_help("Runs on stdio. Without a private key every request is sent with demo=true and returns sample data.\n\nEXAMPLES:\n  shield-mcp\n  X402_PRIVATE_KEY=0x... shield-mcp --network base-sepolia --max-payment 50000")
        .arg(Arg::new("api_url")
            .long("api-url")
            .env("SHIELD_API_URL")
            .num_args(1)
            .default_value(DEFAULT_API_URL)
            .help("Base URL of the Shield API"))
        .arg(Arg::new("private_key")
            .long("private-key")
            .env("X402_PRIVATE_KEY")
            .hide_env_values(true)
            .num_args(1)
            .help("Hex EVM private key used to pay x402 challenges (enables paid mode)"))
        .arg(Arg::new("network")
            .long("network")
            .env("X402_NETWORK")
            .num_args(1)
            .default_value(DEFAULT_NETWORK)
            .help("Chain to pay on (base, base-sepolia, avalanche, polygon, ...)"))
        .arg(Arg::new("max_payment")
            .long("max-payment")
            .env("X402_MAX_PAYMENT")
            .num_args(1)
            .value_parser(value_parser!(u128))
            .default_value("100000")
            .help("Maximum amount paid per request, in atomic token units"))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .action(ArgAction::SetTrue)
            .help("Enable debug logging on stderr"))
}
