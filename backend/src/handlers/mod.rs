//! HTTP request handlers

pub mod auth;
pub mod board;
pub mod car;
pub mod catalog;
pub mod comment;
pub mod health;
pub mod meeting;
pub mod notification;
pub mod upload;
pub mod user;
pub mod workspace;

pub use auth::*;
pub use board::*;
pub use car::*;
pub use catalog::*;
pub use comment::*;
pub use health::*;
pub use meeting::*;
pub use notification::*;
pub use upload::*;
pub use user::*;
pub use workspace::*;
