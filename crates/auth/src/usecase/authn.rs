use std::sync::Arc;

use app_core::error::AppError;
use app_core::jwt::TokenIssuer;
use app_core::social::{SocialProvider, SocialTokenVerifier};
use async_trait::async_trait;
use validator::Validate;

use crate::domain::inout::authn::{SocialLoginInput, SocialLoginOutput};
use crate::outbound::repository::AuthRepository;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait AuthnUseCase: Send + Sync {
    async fn social_login(&self, input: SocialLoginInput) -> Result<SocialLoginOutput, AppError>;
}

#[derive(Clone)]
pub struct AuthnService {
    verifier: Arc<dyn SocialTokenVerifier>,
    token: Arc<dyn TokenIssuer>,
    repo: Arc<dyn AuthRepository>,
}

impl AuthnService {
    pub fn new(
        verifier: Arc<dyn SocialTokenVerifier>,
        token: Arc<dyn TokenIssuer>,
        repo: Arc<dyn AuthRepository>,
    ) -> Self {
        Self { verifier, token, repo }
    }
}

#[async_trait]
impl AuthnUseCase for AuthnService {
    /// The social login pipeline: validate, verify the provider token,
    /// reconcile the account, enforce the one-provider-per-account rule,
    /// issue a session token.
    ///
    /// A verification failure is final — reconciliation is never attempted
    /// for a token that did not check out. A registration failure propagates
    /// as-is rather than echoing the earlier verification success.
    async fn social_login(&self, input: SocialLoginInput) -> Result<SocialLoginOutput, AppError> {
        input.validate()?;

        let provider: SocialProvider = input.provider.parse()?;

        self.verifier.verify(provider, &input.access_token).await?;

        let user = self.repo.find_or_create_social_user(&input.email, &input.provider).await?;

        if user.provider != input.provider {
            return Err(AppError::ProviderMismatch {
                registered: user.provider,
                attempted: input.provider,
            });
        }

        let token = self.token.issue_session_token(&user.email, &user.roles)?;

        Ok(SocialLoginOutput { token })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use app_core::jwt::{DEFAULT_SESSION_TTL_SECS, JwtConfig, JwtService, MockTokenIssuer};
    use app_core::social::{MockSocialTokenVerifier, SocialError};
    use chrono::Utc;
    use mockall::predicate::eq;

    use super::*;
    use crate::domain::entity::user::User;
    use crate::outbound::repository::MockAuthRepository;

    fn stored_user(email: &str, provider: &str, roles: Vec<String>) -> User {
        User {
            id: 1,
            email: email.to_string(),
            username: email.to_string(),
            provider: provider.to_string(),
            roles,
            created_at: Utc::now(),
        }
    }

    fn login_input(email: &str, provider: &str, access_token: &str) -> SocialLoginInput {
        SocialLoginInput {
            email: email.to_string(),
            provider: provider.to_string(),
            access_token: access_token.to_string(),
        }
    }

    fn real_issuer() -> Arc<dyn TokenIssuer> {
        Arc::new(
            JwtService::new(JwtConfig {
                secret: "a-long-enough-test-signing-secret".to_string(),
                issuer: "auth-gateway".to_string(),
                audience: "auth-gateway-clients".to_string(),
                ttl_secs: DEFAULT_SESSION_TTL_SECS,
            })
            .unwrap(),
        )
    }

    fn accepting_verifier() -> MockSocialTokenVerifier {
        let mut verifier = MockSocialTokenVerifier::new();
        verifier
            .expect_verify()
            .returning(|_, _| Box::pin(async { Ok(()) }));
        verifier
    }

    #[tokio::test]
    async fn test_new_email_creates_user_and_returns_token_with_claims() {
        let issuer = real_issuer();

        let mut repo = MockAuthRepository::new();
        repo.expect_find_or_create_social_user()
            .with(eq("a@x.com"), eq("google"))
            .times(1)
            .returning(|email, provider| {
                let user = stored_user(email, provider, vec!["User".to_string()]);
                Box::pin(async move { Ok(user) })
            });

        let service = AuthnService::new(Arc::new(accepting_verifier()), issuer.clone(), Arc::new(repo));

        let output = service
            .social_login(login_input("a@x.com", "google", "valid-token"))
            .await
            .unwrap();

        let claims = issuer.decode_session_token(&output.token).unwrap();
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.name, "a@x.com");

        let roles: HashSet<_> = claims.roles.iter().map(String::as_str).collect();
        assert_eq!(roles, HashSet::from(["User"]));
    }

    #[tokio::test]
    async fn test_replay_for_existing_user_issues_token_without_new_roles() {
        let issuer = real_issuer();

        let mut repo = MockAuthRepository::new();
        repo.expect_find_or_create_social_user()
            .with(eq("a@x.com"), eq("google"))
            .times(1)
            .returning(|email, provider| {
                let user = stored_user(email, provider, vec!["User".to_string(), "Admin".to_string()]);
                Box::pin(async move { Ok(user) })
            });

        let service = AuthnService::new(Arc::new(accepting_verifier()), issuer.clone(), Arc::new(repo));

        let output = service
            .social_login(login_input("a@x.com", "google", "valid-token"))
            .await
            .unwrap();

        let claims = issuer.decode_session_token(&output.token).unwrap();
        let roles: HashSet<_> = claims.roles.iter().map(String::as_str).collect();
        assert_eq!(roles, HashSet::from(["User", "Admin"]));
    }

    #[tokio::test]
    async fn test_provider_mismatch_is_rejected_without_issuing_a_token() {
        // Account first registered through another provider; the google
        // login verifies fine but must not be allowed in.
        let mut repo = MockAuthRepository::new();
        repo.expect_find_or_create_social_user()
            .with(eq("a@x.com"), eq("google"))
            .times(1)
            .returning(|email, _| {
                let user = stored_user(email, "facebook", vec!["User".to_string()]);
                Box::pin(async move { Ok(user) })
            });

        let mut token = MockTokenIssuer::new();
        token.expect_issue_session_token().times(0);

        let service = AuthnService::new(Arc::new(accepting_verifier()), Arc::new(token), Arc::new(repo));

        let err = service
            .social_login(login_input("a@x.com", "google", "valid-token"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::ProviderMismatch { ref registered, ref attempted }
                if registered == "facebook" && attempted == "google"
        ));
    }

    #[tokio::test]
    async fn test_unsupported_provider_never_touches_verifier_or_store() {
        let mut verifier = MockSocialTokenVerifier::new();
        verifier.expect_verify().times(0);

        let mut repo = MockAuthRepository::new();
        repo.expect_find_or_create_social_user().times(0);

        let mut token = MockTokenIssuer::new();
        token.expect_issue_session_token().times(0);

        let service = AuthnService::new(Arc::new(verifier), Arc::new(token), Arc::new(repo));

        let err = service
            .social_login(login_input("a@x.com", "facebook", "valid-token"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Social(SocialError::UnsupportedProvider(ref name)) if name == "facebook"
        ));
    }

    #[tokio::test]
    async fn test_invalid_token_stops_before_reconciliation() {
        let mut verifier = MockSocialTokenVerifier::new();
        verifier
            .expect_verify()
            .with(eq(SocialProvider::Google), eq("tampered-token"))
            .times(1)
            .returning(|provider, _| {
                Box::pin(async move { Err(SocialError::InvalidToken(provider)) })
            });

        let mut repo = MockAuthRepository::new();
        repo.expect_find_or_create_social_user().times(0);

        let mut token = MockTokenIssuer::new();
        token.expect_issue_session_token().times(0);

        let service = AuthnService::new(Arc::new(verifier), Arc::new(token), Arc::new(repo));

        let err = service
            .social_login(login_input("a@x.com", "google", "tampered-token"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Social(SocialError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_registration_failure_propagates_instead_of_stale_success() {
        let mut repo = MockAuthRepository::new();
        repo.expect_find_or_create_social_user()
            .times(1)
            .returning(|email, _| {
                let email = email.to_string();
                Box::pin(async move {
                    Err(AppError::RegistrationFailed {
                        email,
                        reasons: vec!["duplicate key value violates unique constraint".to_string()],
                    })
                })
            });

        let mut token = MockTokenIssuer::new();
        token.expect_issue_session_token().times(0);

        let service = AuthnService::new(Arc::new(accepting_verifier()), Arc::new(token), Arc::new(repo));

        let err = service
            .social_login(login_input("a@x.com", "google", "valid-token"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::RegistrationFailed { ref email, ref reasons }
                if email == "a@x.com" && !reasons.is_empty()
        ));
    }

    #[tokio::test]
    async fn test_empty_fields_fail_validation_before_any_collaborator() {
        let mut verifier = MockSocialTokenVerifier::new();
        verifier.expect_verify().times(0);

        let mut repo = MockAuthRepository::new();
        repo.expect_find_or_create_social_user().times(0);

        let mut token = MockTokenIssuer::new();
        token.expect_issue_session_token().times(0);

        let service = AuthnService::new(Arc::new(verifier), Arc::new(token), Arc::new(repo));

        let err = service
            .social_login(login_input("", "google", "valid-token"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }
}
