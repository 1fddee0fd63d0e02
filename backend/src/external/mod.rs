//! External API integrations

pub mod cloudinary;
pub mod mailer;
pub mod zego;

pub use cloudinary::{CloudinaryClient, UploadFile};
pub use mailer::Mailer;
pub use zego::ZegoTokenIssuer;
