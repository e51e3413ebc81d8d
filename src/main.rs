use clap::Parser;
use std::io::{BufRead, IsTerminal, Write};
use std::process::ExitCode;
use tracing::{info, warn};

use wallet_verification::config::{load_config, Config};
use wallet_verification::errors::AppError;
use wallet_verification::flow::VerificationFlow;
use wallet_verification::models::UiState;
use wallet_verification::service::HttpVerificationService;
use wallet_verification::telemetry::init_telemetry;
use wallet_verification::wallet::KeypairWallet;

/// Prove ownership of a Solana wallet to the Telegram bot backend
#[derive(Parser, Debug)]
#[command(name = "wallet-verify", version)]
struct Cli {
    /// Verification link sent by the bot, carrying `?userId=`
    #[arg(long)]
    url: Option<String>,

    /// Telegram user id, instead of a link
    #[arg(long, conflicts_with = "url")]
    user_id: Option<String>,

    /// Solana CLI keypair file
    #[arg(long)]
    keypair: Option<String>,

    /// Start without a connected wallet
    #[arg(long, conflicts_with = "keypair")]
    no_wallet: bool,

    /// Backend base URL, overrides API_URL
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file if exists
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = load_config().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(2);
    });
    if let Some(api_url) = &cli.api_url {
        config.api.url = api_url.clone();
    }

    init_telemetry(&config.telemetry);

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("{}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli, config: Config) -> Result<ExitCode, AppError> {
    let wallet = connect_wallet(&cli, &config)?;
    let service = HttpVerificationService::new(&config.api)?;
    info!(endpoint = %service.endpoint(), "Verification endpoint configured");

    let mut flow = match &cli.url {
        Some(url) => VerificationFlow::from_page_url(url, wallet, service)
            .map_err(|e| AppError::Startup(format!("invalid verification link: {}", e)))?,
        None => VerificationFlow::new(wallet, service, cli.user_id.clone()),
    };

    println!("{}\n", flow.render());

    loop {
        if flow.begin() {
            println!("{}\n", flow.render());
            flow.complete().await;
        }
        println!("{}\n", flow.render());

        let retry = match flow.state() {
            UiState::Success(_) => return Ok(ExitCode::SUCCESS),
            UiState::Error(_) => prompt_try_again(),
            _ => false,
        };
        if !retry {
            return Ok(ExitCode::FAILURE);
        }

        flow.try_again();
        println!("{}\n", flow.render());
    }
}

/// An explicit `--keypair` must load; the configured default may be absent,
/// which leaves the wallet disconnected.
fn connect_wallet(cli: &Cli, config: &Config) -> Result<KeypairWallet, AppError> {
    if cli.no_wallet {
        return Ok(KeypairWallet::disconnected());
    }
    match &cli.keypair {
        Some(path) => KeypairWallet::connect_file(path),
        None => match KeypairWallet::connect_file(&config.wallet.keypair_path) {
            Ok(wallet) => Ok(wallet),
            Err(e) => {
                warn!(error = %e, "No wallet connected");
                Ok(KeypairWallet::disconnected())
            }
        },
    }
}

fn prompt_try_again() -> bool {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return false;
    }
    print!("Press Enter to try again, or q to quit: ");
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    match stdin.lock().read_line(&mut line) {
        Ok(0) | Err(_) => false,
        Ok(_) => !line.trim().eq_ignore_ascii_case("q"),
    }
}
