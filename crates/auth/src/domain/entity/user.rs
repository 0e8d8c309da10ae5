use chrono::{DateTime, Utc};

/// A local account reconciled from an external social identity.
///
/// `provider` records the identity provider that first registered the
/// account and never changes afterwards; a login attempt through a different
/// provider is rejected upstream.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub provider: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
