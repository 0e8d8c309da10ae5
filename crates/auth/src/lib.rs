mod domain;
mod inbound;
mod outbound;
mod usecase;

use std::sync::Arc;

use app_core::jwt::TokenIssuer;
use app_core::password::Hasher;
use app_core::social::SocialTokenVerifier;
use app_core::uid::Generator;
pub use inbound::router::create_router;
use sea_orm::DatabaseConnection;

use crate::inbound::state::AuthState;
use crate::outbound::orm::AuthORM;
use crate::usecase::authn::AuthnService;

pub struct Dependency {
    pub db: Arc<DatabaseConnection>,
    pub uid: Arc<dyn Generator>,
    pub hasher: Arc<dyn Hasher>,
    pub token: Arc<dyn TokenIssuer>,
    pub verifier: Arc<dyn SocialTokenVerifier>,
}

pub fn new(dep: Dependency) -> AuthState {
    let repo = Arc::new(AuthORM::new(dep.db, dep.uid, dep.hasher));
    let authn_svc = Arc::new(AuthnService::new(dep.verifier, dep.token, repo));

    AuthState::new(authn_svc)
}
