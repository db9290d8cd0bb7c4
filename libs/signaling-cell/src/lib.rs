pub mod handlers;
pub mod models;
pub mod relay;
pub mod router;

pub use models::*;
pub use relay::RoomRegistry;
pub use router::signaling_routes;
