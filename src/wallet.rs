/// Wallet side of the flow: key discovery and message signing
use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use tracing::{debug, info};

use crate::errors::{AppError, WalletError};

/// What the flow needs from a connected wallet
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Base58 address of the connected account, `None` while disconnected
    fn public_key(&self) -> Option<String>;

    /// Sign `message` as-is and return the raw signature bytes
    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, WalletError>;
}

/// Wallet backed by a Solana CLI keypair file
#[derive(Default)]
pub struct KeypairWallet {
    key: Option<SigningKey>,
}

impl KeypairWallet {
    pub fn disconnected() -> Self {
        Self { key: None }
    }

    pub fn from_signing_key(key: SigningKey) -> Self {
        Self { key: Some(key) }
    }

    /// Load `path` (tilde expanded) and connect with the keypair in it
    pub fn connect_file(path: &str) -> Result<Self, AppError> {
        let expanded = shellexpand::tilde(path).into_owned();
        let body = std::fs::read_to_string(&expanded).map_err(|e| AppError::Keypair {
            path: expanded.clone(),
            reason: e.to_string(),
        })?;
        let key = wallet_auth::keypair_from_json(&body).map_err(|e| AppError::Keypair {
            path: expanded.clone(),
            reason: e.to_string(),
        })?;

        let wallet = Self::from_signing_key(key);
        info!(
            path = %expanded,
            address = %wallet.public_key().unwrap_or_default(),
            "Wallet connected"
        );
        Ok(wallet)
    }

    pub fn disconnect(&mut self) {
        if self.key.take().is_some() {
            info!("Wallet disconnected");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.key.is_some()
    }
}

#[async_trait]
impl WalletProvider for KeypairWallet {
    fn public_key(&self) -> Option<String> {
        self.key
            .as_ref()
            .map(|k| wallet_auth::encode_pubkey_b58(&k.verifying_key().to_bytes()))
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, WalletError> {
        let key = self.key.as_ref().ok_or(WalletError::NotConnected)?;
        debug!(len = message.len(), "Signing message");
        Ok(wallet_auth::sign_raw(key, message).to_vec())
    }
}
