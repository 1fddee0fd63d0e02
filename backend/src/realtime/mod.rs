//! Real-time fan-out of board, workspace and user events

pub mod hub;
pub mod socket;

pub use hub::RealtimeHub;
pub use socket::ws_handler;
