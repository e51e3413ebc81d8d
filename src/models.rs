use serde::{Deserialize, Serialize};

/// Body of `POST {API_URL}/api/verify`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub user_id: i64,
    pub message: String,
    /// Raw Ed25519 signature, standard base64
    pub signature: String,
    /// Base58 wallet address
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UiState {
    #[default]
    Idle,
    Verifying,
    Success(String),
    Error(String),
}
