use validator::Validate;

// ╔════════════════════════════╗
// ║       Social Login         ║
// ╚════════════════════════════╝

/// The validated input for one social login attempt. All three fields are
/// required; the access token is whatever opaque value the client obtained
/// from the provider.
#[derive(Debug, Validate)]
pub struct SocialLoginInput {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub provider: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub access_token: String,
}

#[derive(Debug)]
pub struct SocialLoginOutput {
    /// The locally-signed session token.
    pub token: String,
}
