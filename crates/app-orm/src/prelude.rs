pub use super::roles::Entity as Roles;
pub use super::user_credentials::Entity as UserCredentials;
pub use super::user_roles::Entity as UserRoles;
pub use super::users::Entity as Users;
