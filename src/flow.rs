/// The sign-and-verify state machine behind the verification page
use reqwest::Url;
use tracing::{error, info, warn};

use crate::errors::{VerificationError, WalletError};
use crate::models::{UiState, VerificationRequest, VerificationResponse};
use crate::service::VerificationService;
use crate::wallet::WalletProvider;

pub const TITLE: &str = "Solana Wallet Verification";
pub const SUCCESS_MESSAGE: &str =
    "Address verified successfully! You can now close this window and return to Telegram.";
pub const USER_ID_PARAM: &str = "userId";

pub struct VerificationFlow<W, S> {
    wallet: W,
    service: S,
    user_id: Option<String>,
    state: UiState,
}

impl<W, S> VerificationFlow<W, S>
where
    W: WalletProvider,
    S: VerificationService,
{
    pub fn new(wallet: W, service: S, user_id: Option<String>) -> Self {
        Self {
            wallet,
            service,
            user_id,
            state: UiState::Idle,
        }
    }

    /// Build a flow for the page at `url`, taking the Telegram user from
    /// its `userId` query parameter.
    pub fn from_page_url(url: &str, wallet: W, service: S) -> Result<Self, url::ParseError> {
        let user_id = user_id_from_url(url)?;
        Ok(Self::new(wallet, service, user_id))
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn wallet_mut(&mut self) -> &mut W {
        &mut self.wallet
    }

    /// "Sign & Verify" pressed. Moves to `Verifying` and returns `true` when
    /// there is something for `complete` to do. A press while a submission
    /// is in flight, or after success, changes nothing.
    pub fn begin(&mut self) -> bool {
        if matches!(self.state, UiState::Verifying | UiState::Success(_)) {
            return false;
        }

        if self.wallet.public_key().is_none() {
            let err = VerificationError::WalletNotConnected;
            warn!(kind = err.kind(), "Verification attempted without a wallet");
            self.state = UiState::Error(err.to_string());
            return false;
        }

        self.state = UiState::Verifying;
        info!(user_id = ?self.user_id, "Verifying wallet ownership");
        true
    }

    /// Sign and submit. Only acts in `Verifying`; every failure lands in
    /// `UiState::Error`.
    pub async fn complete(&mut self) -> &UiState {
        if self.state != UiState::Verifying {
            return &self.state;
        }

        self.state = match self.submit().await {
            Ok(response) => {
                info!(
                    server_message = response.message.as_deref().unwrap_or(""),
                    "Address verified"
                );
                UiState::Success(SUCCESS_MESSAGE.to_string())
            }
            Err(err) => {
                error!(kind = err.kind(), error = %err, "Verification error");
                UiState::Error(err.to_string())
            }
        };
        &self.state
    }

    /// `begin` then `complete`, for callers that don't render in between
    pub async fn sign_and_verify(&mut self) -> &UiState {
        if self.begin() {
            self.complete().await;
        }
        &self.state
    }

    async fn submit(&self) -> Result<VerificationResponse, VerificationError> {
        let public_key = self
            .wallet
            .public_key()
            .ok_or(VerificationError::WalletNotConnected)?;
        let user_id = parse_user_id(self.user_id.as_deref())?;

        let message = wallet_auth::build_verification_message(&public_key, user_id);
        let signature = self.wallet.sign_message(message.as_bytes()).await?;
        check_signature(&public_key, message.as_bytes(), &signature)?;

        let request = VerificationRequest {
            user_id,
            message,
            signature: wallet_auth::encode_sig_b64(&signature),
            public_key,
        };
        self.service.verify(&request).await
    }

    /// "Try Again": drop the error and go back to idle
    pub fn try_again(&mut self) {
        if let UiState::Error(_) = self.state {
            self.state = UiState::Idle;
        }
    }

    pub fn render(&self) -> String {
        let body = match &self.state {
            UiState::Verifying => "Verifying your address...".to_string(),
            UiState::Success(message) => message.clone(),
            UiState::Error(message) => format!("Error: {}\n[Try Again]", message),
            UiState::Idle => match self.wallet.public_key() {
                Some(address) => format!(
                    "Connected with wallet: {}\n[Sign & Verify]",
                    shorten_address(&address)
                ),
                None => "Please connect your wallet to verify your address.".to_string(),
            },
        };
        format!("{}\n\n{}", TITLE, body)
    }
}

/// `userId` query parameter of a page URL, if present
pub fn user_id_from_url(url: &str) -> Result<Option<String>, url::ParseError> {
    let url = Url::parse(url)?;
    Ok(url
        .query_pairs()
        .find(|(k, _)| k == USER_ID_PARAM)
        .map(|(_, v)| v.into_owned()))
}

fn parse_user_id(raw: Option<&str>) -> Result<i64, VerificationError> {
    let raw = raw.ok_or_else(|| VerificationError::InvalidUserId("not provided".to_string()))?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| VerificationError::InvalidUserId(raw.to_string()))
}

/// Reject a wallet that hands back a signature its own key doesn't verify
fn check_signature(public_key: &str, message: &[u8], signature: &[u8]) -> Result<(), WalletError> {
    let pubkey = wallet_auth::decode_pubkey_b58(public_key)
        .map_err(|e| WalletError::SigningFailed(e.to_string()))?;
    match wallet_auth::verify_ed25519(&pubkey, message, signature) {
        Ok(true) => Ok(()),
        Ok(false) => Err(WalletError::SigningFailed(
            "wallet returned a signature that does not match its public key".to_string(),
        )),
        Err(e) => Err(WalletError::SigningFailed(e.to_string())),
    }
}

/// `ABCD...WXYZ`
pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    let head: String = chars.iter().take(4).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}...{}", head, tail)
}
