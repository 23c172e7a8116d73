//! Command-line interface for dna-identity.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::config::WalletBackend;
use crate::session::ChainId;

/// Command-line arguments. Unset options leave the configuration alone.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Host address to bind to.
    pub host: Option<IpAddr>,
    /// Port to listen on.
    pub port: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Ledger contract address.
    pub contract: Option<String>,
    /// Required chain id.
    pub chain_id: Option<ChainId>,
    /// RPC URL offered when adding the network to a wallet.
    pub rpc_url: Option<String>,
    /// Block explorer URL.
    pub explorer_url: Option<String>,
    /// Wallet backend.
    pub wallet: Option<WalletBackend>,
    /// HTTP wallet endpoint.
    pub wallet_url: Option<String>,
    /// API key for authentication (overrides config file).
    pub api_key: Option<String>,
    /// Disable authentication.
    pub no_auth: bool,
    /// Browser origins allowed to call the API (repeatable).
    pub allowed_origins: Vec<String>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('H') | Long("host") => {
                let value: String = parser.value()?.parse()?;
                result.host = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("host", value))?,
                );
            }
            Short('p') | Long("port") => {
                let value: String = parser.value()?.parse()?;
                result.port = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("port", value))?,
                );
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Long("contract") => {
                result.contract = Some(parser.value()?.parse()?);
            }
            Long("chain-id") => {
                let value: String = parser.value()?.parse()?;
                result.chain_id = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("chain-id", value))?,
                );
            }
            Long("rpc-url") => {
                result.rpc_url = Some(parser.value()?.parse()?);
            }
            Long("explorer-url") => {
                result.explorer_url = Some(parser.value()?.parse()?);
            }
            Long("wallet") => {
                let value: String = parser.value()?.parse()?;
                result.wallet = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("wallet", value))?,
                );
            }
            Long("wallet-url") => {
                result.wallet_url = Some(parser.value()?.parse()?);
            }
            Short('k') | Long("api-key") => {
                result.api_key = Some(parser.value()?.parse()?);
            }
            Long("no-auth") => {
                result.no_auth = true;
            }
            Long("allow-origin") => {
                result.allowed_origins.push(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"dna-identity {version}
Wallet session service for DNA identity NFTs

USAGE:
    dna-identity [OPTIONS]

OPTIONS:
    -H, --host <ADDR>          Host address to bind [default: 127.0.0.1]
    -p, --port <PORT>          Port to listen on [default: 3000]
    -c, --config <FILE>        Path to configuration file (JSON)
        --contract <ADDR>      Ledger contract address
        --chain-id <ID>        Required chain id, decimal or 0x-hex [default: 11155111]
        --rpc-url <URL>        RPC URL offered when adding the network
        --explorer-url <URL>   Block explorer URL
        --wallet <BACKEND>     Wallet backend: http, memory [default: http]
        --wallet-url <URL>     HTTP wallet endpoint [default: http://127.0.0.1:8545]
    -k, --api-key <KEY>        API key required as a Bearer token
        --no-auth              Disable authentication
        --allow-origin <URL>   Browser origin allowed to call the API (repeatable)
    -l, --log-level <LVL>      Log level (error, warn, info, debug, trace)
    -h, --help                 Print help
    -V, --version              Print version

ENVIRONMENT VARIABLES:
    DNA_IDENTITY_CONTRACT_ADDRESS      Contract address
    DNA_IDENTITY_REQUIRED_NETWORK_ID   Required chain id
    DNA_IDENTITY_RPC_URL               RPC URL for the add-network fallback
    DNA_IDENTITY_BLOCK_EXPLORER_URL    Block explorer URL
    DNA_IDENTITY_WALLET                Wallet backend
    DNA_IDENTITY_WALLET_URL            HTTP wallet endpoint
    DNA_IDENTITY_HOST                  Host address
    DNA_IDENTITY_PORT                  Port number
    DNA_IDENTITY_API_KEY               API key (enables authentication)
    DNA_IDENTITY_ALLOWED_ORIGINS       Comma-separated browser origins
    DNA_IDENTITY_LOG_LEVEL             Log level
    RUST_LOG                           Alternative log level setting

EXAMPLES:
    # Talk to a wallet bridge on localhost:8545
    dna-identity --contract 0x5FbDB2315678afecb367f032d93F642f64180aa3

    # Demo with the in-process wallet
    dna-identity --wallet memory -p 8080

    # Serve a browser front end, requiring an API key
    dna-identity -k my-secret --allow-origin https://app.example

    # Start with config file
    dna-identity -c /etc/dna-identity/config.json
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("dna-identity {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
