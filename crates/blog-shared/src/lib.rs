pub mod api;
pub mod models;
pub mod thread;

pub use models::*;
