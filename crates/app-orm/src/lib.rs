//! SeaORM entity definitions for the identity store.

pub mod prelude;

pub mod roles;
pub mod user_credentials;
pub mod user_roles;
pub mod users;
