use axum::Router;
use axum::routing::post;

use crate::inbound::http::authn::social_login;
use crate::inbound::state::AuthState;

pub fn create_router(state: AuthState) -> Router {
    Router::new()
        // authentication scope, anonymous access
        .route("/user/login", post(social_login))
        .with_state(state)
}
