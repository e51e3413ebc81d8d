/// Error handling module
///
/// Every verification failure ends up as user-facing text on the error
/// screen; `AppError` covers the startup path only.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Wallet not connected")]
    NotConnected,
    #[error("{0}")]
    Rejected(String),
    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Please connect your wallet first")]
    WalletNotConnected,
    #[error("Missing or invalid userId: {0}")]
    InvalidUserId(String),
    #[error("{0}")]
    Signing(#[from] WalletError),
    #[error("Network error: {0}")]
    Network(String),
    #[error("{message}")]
    ServerRejected { status: u16, message: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl VerificationError {
    /// Short machine-readable category, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            VerificationError::WalletNotConnected => "wallet_not_connected",
            VerificationError::InvalidUserId(_) => "invalid_user_id",
            VerificationError::Signing(_) => "signing_failed",
            VerificationError::Network(_) => "network_failure",
            VerificationError::ServerRejected { .. } => "server_rejected",
            VerificationError::MalformedResponse(_) => "malformed_response",
        }
    }
}

impl From<reqwest::Error> for VerificationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            VerificationError::MalformedResponse(e.to_string())
        } else {
            VerificationError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("KeypairError: {path}: {reason}")]
    Keypair { path: String, reason: String },
    #[error("HttpClientError: {0}")]
    HttpClient(String),
    #[error("StartupError: {0}")]
    Startup(String),
}
