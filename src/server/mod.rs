mod admin;
pub mod dto;
mod editor;
mod form;
mod reports;
pub mod response;
mod router;
mod session;

pub use router::{AppState, create_router};
