/// Signing utilities for Solana wallet ownership proofs

use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use thiserror::Error;

pub const PUBKEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;
pub const KEYPAIR_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid base58 encoding: {0}")]
    InvalidBase58(String),
    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(String),
    #[error("Invalid public key length: expected 32 bytes, got {0}")]
    InvalidPubkeyLength(usize),
    #[error("Invalid signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),
    #[error("Invalid public key: {0}")]
    InvalidPubkey(String),
    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),
}

/// Decode Solana public key from base58 string
pub fn decode_pubkey_b58(addr: &str) -> Result<[u8; PUBKEY_LEN], AuthError> {
    let bytes = bs58::decode(addr)
        .into_vec()
        .map_err(|e| AuthError::InvalidBase58(e.to_string()))?;

    if bytes.len() != PUBKEY_LEN {
        return Err(AuthError::InvalidPubkeyLength(bytes.len()));
    }

    let mut result = [0u8; PUBKEY_LEN];
    result.copy_from_slice(&bytes);
    Ok(result)
}

/// Encode public key bytes the way Solana addresses are displayed
pub fn encode_pubkey_b58(pubkey: &[u8; PUBKEY_LEN]) -> String {
    bs58::encode(pubkey).into_string()
}

/// Encode raw signature bytes as standard padded base64
pub fn encode_sig_b64(sig: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(sig)
}

/// Decode signature from base64 string
pub fn decode_sig_b64(sig: &str) -> Result<[u8; SIGNATURE_LEN], AuthError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(sig)
        .map_err(|e| AuthError::InvalidBase64(e.to_string()))?;

    if bytes.len() != SIGNATURE_LEN {
        return Err(AuthError::InvalidSignatureLength(bytes.len()));
    }

    let mut result = [0u8; SIGNATURE_LEN];
    result.copy_from_slice(&bytes);
    Ok(result)
}

/// Build the challenge a wallet signs to prove it owns `public_key`
/// on behalf of Telegram user `user_id`.
pub fn build_verification_message(public_key: &str, user_id: i64) -> String {
    format!(
        "Verify ownership of Solana address {} for Telegram user {}",
        public_key, user_id
    )
}

/// Verify Ed25519 signature
pub fn verify_ed25519(pubkey: &[u8; PUBKEY_LEN], message: &[u8], sig: &[u8]) -> Result<bool, AuthError> {
    let verifying_key = VerifyingKey::from_bytes(pubkey)
        .map_err(|e| AuthError::InvalidPubkey(e.to_string()))?;

    let sig: [u8; SIGNATURE_LEN] = sig
        .try_into()
        .map_err(|_| AuthError::InvalidSignatureLength(sig.len()))?;
    let signature = Signature::from_bytes(&sig);

    match verifying_key.verify(message, &signature) {
        Ok(_) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Parse a Solana CLI keypair file body (`[u8; 64]` as a JSON array,
/// secret half first). The public half must match the secret.
pub fn keypair_from_json(json: &str) -> Result<SigningKey, AuthError> {
    let bytes: Vec<u8> = serde_json::from_str(json)
        .map_err(|e| AuthError::InvalidKeypair(e.to_string()))?;

    let bytes: [u8; KEYPAIR_LEN] = bytes.as_slice().try_into().map_err(|_| {
        AuthError::InvalidKeypair(format!("expected {} bytes, got {}", KEYPAIR_LEN, bytes.len()))
    })?;

    SigningKey::from_keypair_bytes(&bytes).map_err(|e| AuthError::InvalidKeypair(e.to_string()))
}

/// Sign `message` directly, with no off-chain message prefix
pub fn sign_raw(key: &SigningKey, message: &[u8]) -> [u8; SIGNATURE_LEN] {
    key.sign(message).to_bytes()
}
