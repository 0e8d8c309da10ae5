use app_core::extractors::AppJson;
use app_core::response::Response;
use axum::debug_handler;
use axum::extract::State;
use axum::response::IntoResponse;

use crate::domain::inout::authn::SocialLoginInput;
use crate::inbound::model::authn::{LoginRequest, LoginResponse};
use crate::inbound::state::AuthState;

#[debug_handler]
pub async fn social_login(State(state): State<AuthState>, AppJson(req): AppJson<LoginRequest>) -> impl IntoResponse {
    state
        .authn
        .social_login(SocialLoginInput {
            email: req.email,
            provider: req.provider,
            access_token: req.access_token,
        })
        .await
        .map(|output| LoginResponse { token: output.token })
        .map(Response::from)
}
