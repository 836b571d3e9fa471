pub mod dto;
mod groups;
pub mod response;
mod router;

pub use groups::groups_router;
pub use router::{AppState, create_router};
