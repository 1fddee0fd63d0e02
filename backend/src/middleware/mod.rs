//! Request middleware

pub mod auth;

pub use auth::{
    auth_middleware, require_admin, AuthUser, CurrentUser, SESSION_ID_KEY, SESSION_USER_ID_KEY,
};
