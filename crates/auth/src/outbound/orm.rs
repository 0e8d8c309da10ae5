use std::sync::Arc;

use app_core::error::AppError;
use app_core::password::{Hasher, generate_placeholder_secret};
use app_core::uid::Generator;
use app_orm::prelude::{Roles, UserCredentials, UserRoles, Users};
use app_orm::{roles, user_credentials, user_roles, users};
use async_trait::async_trait;
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, TransactionTrait,
};

use super::repository::AuthRepository;
use crate::domain::entity::user::User;

/// The role every socially-registered account starts with.
const DEFAULT_ROLE: &str = "User";

/// `AuthORM` is the data access layer for the identity store.
///
/// It maps SeaORM models to domain entities and owns the find-or-create
/// reconciliation of external identities to local accounts.
pub struct AuthORM {
    db: Arc<DatabaseConnection>,
    uid: Arc<dyn Generator>,
    hasher: Arc<dyn Hasher>,
}

impl AuthORM {
    pub fn new(db: Arc<DatabaseConnection>, uid: Arc<dyn Generator>, hasher: Arc<dyn Hasher>) -> Self {
        Self { db, uid, hasher }
    }

    /// Converts a `users::Model` into a `User` domain entity.
    fn to_user(&self, model: users::Model, roles: Vec<String>) -> User {
        User {
            id: model.id,
            email: model.email,
            username: model.username,
            provider: model.provider,
            roles,
            created_at: model.created_at.into(),
        }
    }

    /// Collects the role names assigned to a user, in store return order.
    async fn find_role_names(&self, user_id: i64) -> Result<Vec<String>, AppError> {
        let assignments = UserRoles::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await?;

        let role_ids: Vec<i64> = assignments.iter().map(|a| a.role_id).collect();
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = Roles::find()
            .filter(roles::Column::Id.is_in(role_ids))
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(|m| m.name).collect())
    }

    /// Ensures a role row named `name` exists, returning its ID.
    ///
    /// `candidate_id` is used only if the role has to be inserted.
    async fn ensure_role<C>(&self, db: &C, candidate_id: i64, name: &str) -> Result<i64, DbErr>
    where
        C: ConnectionTrait + Send + Sync,
    {
        if let Some(role) = Roles::find().filter(roles::Column::Name.eq(name)).one(db).await? {
            return Ok(role.id);
        }

        let model = roles::ActiveModel {
            id: ActiveValue::Set(candidate_id),
            name: ActiveValue::Set(name.to_string()),
        };
        Roles::insert(model).exec(db).await?;

        Ok(candidate_id)
    }

    /// Registers a brand-new social account: the user row, a placeholder
    /// credential, and the default role assignment, in one transaction.
    async fn create_social_user(&self, email: &str, provider: &str) -> Result<User, AppError> {
        let user_id = self.uid.generate()?;
        let role_candidate_id = self.uid.generate()?;
        let hashed_secret = self.hasher.hash(&generate_placeholder_secret())?;

        self.persist_new_user(user_id, role_candidate_id, email, provider, hashed_secret)
            .await
            .map_err(|err| {
                tracing::warn!(email, error = %err, "social user registration rejected by the store");
                AppError::RegistrationFailed { email: email.to_string(), reasons: vec![err.to_string()] }
            })
    }

    async fn persist_new_user(
        &self,
        user_id: i64,
        role_candidate_id: i64,
        email: &str,
        provider: &str,
        hashed_secret: String,
    ) -> Result<User, DbErr> {
        let txn = self.db.begin().await?;

        let user_model = users::ActiveModel {
            id: ActiveValue::Set(user_id),
            email: ActiveValue::Set(email.to_string()),
            username: ActiveValue::Set(email.to_string()),
            provider: ActiveValue::Set(provider.to_string()),
            ..Default::default()
        };
        let user_model = Users::insert(user_model).exec_with_returning(&txn).await?;

        let cred_model = user_credentials::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            hashed_secret: ActiveValue::Set(hashed_secret),
            ..Default::default()
        };
        UserCredentials::insert(cred_model).exec(&txn).await?;

        let role_id = self.ensure_role(&txn, role_candidate_id, DEFAULT_ROLE).await?;
        let assignment = user_roles::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            role_id: ActiveValue::Set(role_id),
        };
        UserRoles::insert(assignment).exec(&txn).await?;

        txn.commit().await?;

        Ok(self.to_user(user_model, vec![DEFAULT_ROLE.to_string()]))
    }
}

#[async_trait]
impl AuthRepository for AuthORM {
    async fn find_or_create_social_user(&self, email: &str, provider: &str) -> Result<User, AppError> {
        if let Some(model) = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await?
        {
            let roles = self.find_role_names(model.id).await?;
            return Ok(self.to_user(model, roles));
        }

        self.create_social_user(email, provider).await
    }
}
