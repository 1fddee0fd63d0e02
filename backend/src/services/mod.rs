//! Business logic services for the Taskboard Platform

pub mod access;
pub mod activity;
pub mod auth;
pub mod board;
pub mod car;
pub mod card;
pub mod cart;
pub mod category;
pub mod comment;
pub mod invite;
pub mod lock;
pub mod meeting;
pub mod notification;
pub mod partner;
pub mod product;
pub mod upload;
pub mod user;
pub mod wishlist;
pub mod workspace;

pub use auth::AuthService;
pub use board::BoardService;
pub use car::CarService;
pub use card::CardService;
pub use cart::CartService;
pub use category::CategoryService;
pub use comment::CommentService;
pub use invite::InviteService;
pub use lock::LockService;
pub use meeting::MeetingService;
pub use notification::NotificationService;
pub use partner::PartnerService;
pub use product::ProductService;
pub use upload::UploadService;
pub use user::UserService;
pub use wishlist::WishlistService;
pub use workspace::WorkspaceService;
