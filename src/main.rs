//! dna-identity binary entry point.

use std::sync::Arc;

use dna_identity::api::{serve_with_shutdown, AppState};
use dna_identity::cli::{self, Args};
use dna_identity::config::{Config, WalletBackend};
use dna_identity::provider::{EventHub, HttpWallet, MemoryWallet, WalletProvider};
use dna_identity::{logging, WalletSession};
use tracing::{info, warn};

fn build_provider(config: &Config) -> dna_identity::Result<(Arc<dyn WalletProvider>, EventHub)> {
    match config.wallet.backend {
        WalletBackend::Http => {
            let wallet = HttpWallet::new(config.wallet.url.clone())?;
            let events = wallet.events();
            info!(url = %config.wallet.url, "using HTTP wallet");
            Ok((Arc::new(wallet), events))
        }
        WalletBackend::Memory => {
            let contract = config.contract.address.parse()?;
            let wallet = MemoryWallet::demo(contract, config.network.required_network_id)?;
            let events = wallet.events();
            info!("using in-memory demo wallet");
            Ok((Arc::new(wallet), events))
        }
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("failed to listen for ctrl-c, shutdown signal disabled");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn load() -> Result<(Args, Config), String> {
    let args = cli::parse_args().map_err(|e| e.to_string())?;
    if args.help || args.version {
        return Ok((args, Config::default()));
    }
    let config = Config::load(&args).map_err(|e| e.to_string())?;
    Ok((args, config))
}

#[tokio::main]
async fn main() -> dna_identity::Result<()> {
    let (args, config) = match load() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Run with --help for usage.");
            std::process::exit(2);
        }
    };

    if args.help {
        cli::print_help();
        return Ok(());
    }
    if args.version {
        cli::print_version();
        return Ok(());
    }

    logging::init_with_filter(config.log_filter()).ok();
    info!("dna-identity v{}", env!("CARGO_PKG_VERSION"));

    let (session_config, server_config) =
        match (config.to_session_config(), config.to_server_config()) {
            (Ok(session), Ok(server)) => (session, server),
            (Err(e), _) | (_, Err(e)) => {
                eprintln!("error: {}", e);
                std::process::exit(2);
            }
        };

    let exposed = server_config
        .host
        .parse::<std::net::IpAddr>()
        .is_ok_and(|ip| !ip.is_loopback());
    if exposed && !server_config.security.auth.enabled {
        warn!(host = %server_config.host, "listening beyond loopback without an API key");
    }

    let (provider, events) = build_provider(&config)?;
    let session = WalletSession::new(session_config, Some(provider));
    let _listener = session.listen();

    match session.initialize().await {
        Ok(snapshot) => info!(state = ?snapshot.state(), "session initialized"),
        Err(e) => warn!(error = %e, "initial wallet sync failed, starting disconnected"),
    }

    let state = AppState::new(session).with_events(events);
    serve_with_shutdown(server_config, state, shutdown_signal()).await
}
