use app_core::error::AppError;
use async_trait::async_trait;

use crate::domain::entity::user::User;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait AuthRepository: Send + Sync {
    /// Returns the user registered under `email`, creating one if absent.
    ///
    /// A freshly created user carries `username = email`, the given
    /// `provider`, the default role, and a placeholder credential. The store's
    /// unique email constraint arbitrates concurrent first logins; the losing
    /// insert surfaces as [`AppError::RegistrationFailed`].
    ///
    /// An existing user is returned as stored — the caller is responsible for
    /// checking that its provider matches the login attempt.
    async fn find_or_create_social_user(&self, email: &str, provider: &str) -> Result<User, AppError>;
}
