//! Domain models for the Taskboard platform

mod board;
mod car;
mod cart;
mod meeting;
mod notification;
mod partner;
mod product;
mod user;
mod workspace;

pub use board::*;
pub use car::*;
pub use cart::*;
pub use meeting::*;
pub use notification::*;
pub use partner::*;
pub use product::*;
pub use user::*;
pub use workspace::*;
