use std::sync::Arc;

use crate::usecase::authn::AuthnUseCase;

#[derive(Clone)]
pub struct AuthState {
    pub authn: Arc<dyn AuthnUseCase>,
}

impl AuthState {
    pub fn new(authn: Arc<dyn AuthnUseCase>) -> Self {
        Self { authn }
    }
}
