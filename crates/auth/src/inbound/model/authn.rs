use serde::{Deserialize, Serialize};

// --- Social Login ---

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub provider: String,
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}
